//! Normalisation of generation profiles to a single year of hourly values.
//!
//! Simulations report generation at different resolutions: a single annual figure, one value per
//! hour for one year, one value per hour over the whole analysis period, or one value per block of
//! several hours. Before profiles can be summed they are all converted to an [`HourlyProfile`].
use crate::error::CombineError;
use crate::units::Energy;
use anyhow::Result;
use log::debug;
use std::iter;

/// The number of hours in a (non-leap) year
pub const HOURS_PER_YEAR: usize = 8760;

/// One year of hourly generation. Always holds exactly [`HOURS_PER_YEAR`] values.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyProfile(Vec<f64>);

impl Default for HourlyProfile {
    fn default() -> Self {
        Self::constant(0.0)
    }
}

impl HourlyProfile {
    /// A profile with the same value in every hour
    pub fn constant(value: f64) -> Self {
        Self(vec![value; HOURS_PER_YEAR])
    }

    /// The hourly values
    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// Total generation over the year
    pub fn total(&self) -> Energy {
        Energy(self.0.iter().sum())
    }

    /// Add another profile to this one, hour by hour
    pub fn add(&mut self, other: &HourlyProfile) {
        for (total, value) in self.0.iter_mut().zip(&other.0) {
            *total += value;
        }
    }

    /// Consume the profile, returning the hourly values
    pub fn into_vec(self) -> Vec<f64> {
        self.0
    }
}

/// How a raw generation profile was interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    /// No time series was available; annual energy is spread evenly over the year
    Constant,
    /// The simulation ran over the whole analysis period; only the first year is used
    Lifetime,
    /// Each value covers a block of several consecutive hours
    MultiHour {
        /// The number of hours covered by each value
        hours_per_step: usize,
    },
    /// One value per hour
    Hourly,
}

/// Convert a case's raw generation profile to one year of hourly values.
///
/// # Arguments
///
/// * `case` - The name of the case, for error messages
/// * `raw` - The generation values reported by the simulation
/// * `annual_energy` - The case's annual energy, used if `raw` has at most one value
/// * `analysis_period` - The case's analysis period in years, if its financial model has one
///
/// # Returns
///
/// The normalised profile and how `raw` was interpreted, or an error if the resolution is not
/// supported.
pub fn normalise_profile(
    case: &str,
    raw: &[f64],
    annual_energy: Energy,
    analysis_period: Option<u32>,
) -> Result<(HourlyProfile, ProfileKind)> {
    let len = raw.len();
    // Profiles are only bounded when the case has an analysis period
    let period_len = analysis_period
        .filter(|years| *years > 0)
        .map(|years| (years, HOURS_PER_YEAR * years as usize));

    let (profile, kind) = match period_len {
        _ if len <= 1 => (
            HourlyProfile::constant(annual_energy.value() / HOURS_PER_YEAR as f64),
            ProfileKind::Constant,
        ),
        Some((years, period_len)) if years > 1 && len == period_len => {
            (first_year(raw), ProfileKind::Lifetime)
        }
        Some((years, period_len)) if len > period_len => {
            return Err(CombineError::SubhourlyUnsupported {
                case: case.to_string(),
                len,
                analysis_period: years,
            }
            .into());
        }
        _ if HOURS_PER_YEAR.is_multiple_of(len) && HOURS_PER_YEAR / len > 1 => {
            let hours_per_step = HOURS_PER_YEAR / len;
            (
                HourlyProfile(
                    raw.iter()
                        .flat_map(|value| iter::repeat_n(*value, hours_per_step))
                        .collect(),
                ),
                ProfileKind::MultiHour { hours_per_step },
            )
        }
        _ if len >= HOURS_PER_YEAR => (first_year(raw), ProfileKind::Hourly),
        _ => {
            return Err(CombineError::UnsupportedProfileLength {
                case: case.to_string(),
                len,
            }
            .into());
        }
    };

    debug!("Generation profile for case {case} ({len} values) interpreted as {kind:?}");

    Ok((profile, kind))
}

/// The first year of hourly values in `raw`, which must have at least [`HOURS_PER_YEAR`] values
fn first_year(raw: &[f64]) -> HourlyProfile {
    HourlyProfile(raw[..HOURS_PER_YEAR].to_vec())
}
