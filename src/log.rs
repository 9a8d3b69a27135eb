//! Initialisation of the program logger.
//!
//! Messages go to the terminal, coloured by level when the output is a terminal, and optionally to
//! log files. The log level can be set with the `CASE_COMBINER_LOG_LEVEL` environment variable.
use anyhow::{Context, Result, bail};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::Path;
use std::sync::OnceLock;

/// A flag indicating whether the logger has been initialised
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// The default log level for the program.
///
/// Used as a fallback if the user hasn't specified something else with the
/// `CASE_COMBINER_LOG_LEVEL` environment variable or the settings.toml file.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// The environment variable which overrides the log level from the settings file
const LOG_LEVEL_ENV_VAR: &str = "CASE_COMBINER_LOG_LEVEL";

/// The file name for the log file containing messages about combinations which ran normally
const LOG_INFO_FILE_NAME: &str = "case_combiner_info.log";

/// The file name for the log file containing warnings and error messages
const LOG_ERROR_FILE_NAME: &str = "case_combiner_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger using the `fern` logging library with colourised output.
///
/// The user can specify their preferred logging level via the `settings.toml` file (defaulting to
/// `info` if not present) or with the `CASE_COMBINER_LOG_LEVEL` environment variable. If both are
/// provided, the environment variable takes precedence.
///
/// Possible log level options are:
///
/// * `off`
/// * `error`
/// * `warn`
/// * `info`
/// * `debug`
/// * `trace`
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_path`: The location to save log files (if Some, log files will be created)
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    let log_level = choose_log_level(env::var(LOG_LEVEL_ENV_VAR).ok(), log_level_from_settings);
    let log_level = parse_log_level(&log_level)?;

    let mut dispatch = terminal_dispatch(log_level);
    if let Some(log_file_path) = log_file_path {
        dispatch = dispatch.chain(file_dispatch(log_file_path, log_level)?);
    }

    dispatch.apply().context("Logger already initialised")?;
    LOGGER_INIT.get_or_init(|| ());

    Ok(())
}

/// The log level name to use: the environment variable, then settings, then the default
fn choose_log_level(from_env: Option<String>, from_settings: Option<&str>) -> String {
    from_env.unwrap_or_else(|| from_settings.unwrap_or(DEFAULT_LOG_LEVEL).to_string())
}

/// Messages below warnings go to stdout and the rest to stderr, coloured only on a terminal
fn terminal_dispatch(log_level: LevelFilter) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);
    let colour_stdout = io::stdout().is_terminal();
    let colour_stderr = io::stderr().is_terminal();

    let stdout = Dispatch::new()
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .format(move |out, message, record| {
            write_log_colour(out, message, record, colour_stdout, &colours);
        })
        .level(log_level)
        .chain(io::stdout());
    let stderr = Dispatch::new()
        .format(move |out, message, record| {
            write_log_colour(out, message, record, colour_stderr, &colours);
        })
        .level(log_level.min(LevelFilter::Warn))
        .chain(io::stderr());

    Dispatch::new().chain(stdout).chain(stderr)
}

/// Plain-text log files in `dir`: one for ordinary messages (at least `info`), one for warnings
/// and errors
fn file_dispatch(dir: &Path, log_level: LevelFilter) -> Result<Dispatch> {
    let create = |file_name: &str| {
        let file_path = dir.join(file_name);
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&file_path)
            .with_context(|| format!("Could not create log file {}", file_path.display()))
    };

    let info_file = Dispatch::new()
        .filter(|metadata| metadata.level() > LevelFilter::Warn)
        .format(write_log_plain)
        .level(log_level.max(LevelFilter::Info))
        .chain(create(LOG_INFO_FILE_NAME)?);
    let error_file = Dispatch::new()
        .format(write_log_plain)
        .level(LevelFilter::Warn)
        .chain(create(LOG_ERROR_FILE_NAME)?);

    Ok(Dispatch::new().chain(info_file).chain(error_file))
}

/// Convert a log level name to a [`LevelFilter`], ignoring case
fn parse_log_level(log_level: &str) -> Result<LevelFilter> {
    let level = match log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        unknown => bail!("Unknown log level: {unknown}"),
    };

    Ok(level)
}

/// Write a message to the log with a timestamp, its level and where it came from
fn write_log<T: Display>(out: FormatCallback, level: T, target: &str, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}

/// Write to the log with no colours
fn write_log_plain(out: FormatCallback, message: &Arguments, record: &Record) {
    write_log(out, record.level(), record.target(), message);
}

/// Write to the log with optional colours
fn write_log_colour(
    out: FormatCallback,
    message: &Arguments,
    record: &Record,
    use_colour: bool,
    colours: &ColoredLevelConfig,
) {
    // Format output with or without colour based on `use_colour`
    if use_colour {
        write_log(out, colours.color(record.level()), record.target(), message);
    } else {
        write_log_plain(out, message, record);
    }
}
