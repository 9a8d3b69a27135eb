//! Combining the simulated results of several cases into a single target case.
//!
//! A project holds a number of cases, each a configuration of a power generation or storage
//! technology together with a financial model. Several cases can be combined into a target case:
//! each is simulated under the same degradation and inflation assumptions, and their nameplate
//! capacities, hourly generation profiles, installed costs and fixed operating costs are summed
//! and written to the target. See [`combine::combine_cases`].
#![warn(missing_docs)]
use anyhow::{Context, Result};
use std::path::PathBuf;

pub mod case;
pub mod combine;
pub mod contingency;
pub mod costs;
pub mod error;
mod id;
pub mod input;
pub mod log;
pub mod overrides;
pub mod profile;
pub mod project;
pub mod settings;
pub mod simulation;
pub mod units;
pub mod variable;

#[cfg(test)]
mod fixture;

/// Get the directory holding the program's configuration files (e.g. `settings.toml`)
pub fn get_config_dir() -> Result<PathBuf> {
    let mut path = dirs::config_dir().context("Could not find the user's config directory")?;
    path.push("case-combiner");

    Ok(path)
}
