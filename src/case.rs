//! Cases are individually simulated technology and financing configurations within a project.
use crate::id::define_id_type;
use crate::variable::VariableStore;
use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Deserializer};
use std::fmt;

define_id_type! {CaseID}

/// Technology name for cases which report first-year output rather than annual energy
pub const GEOTHERMAL_POWER: &str = "Geothermal Power";

/// Technology name for generic battery cases
pub const GENERIC_BATTERY: &str = "Generic Battery";

/// The financial model used to evaluate a case.
///
/// This decides which variables hold the analysis period and inflation rate and how the case's
/// costs are rolled up when combining cases.
#[derive(Debug, Clone, PartialEq, Eq, strum::EnumString)]
pub enum FinancialModelKind {
    /// No financial model
    #[strum(serialize = "None")]
    None,
    /// The system is owned and financed by a third party
    #[strum(serialize = "Third Party")]
    ThirdParty,
    /// Levelised cost of energy calculator
    #[strum(serialize = "LCOE Calculator")]
    LcoeCalculator,
    /// Levelised cost of hydrogen calculator
    #[strum(serialize = "LCOH Calculator")]
    LcohCalculator,
    /// Any cash-flow based financial model (e.g. "Single Owner"), holding its name
    #[strum(default)]
    Standard(String),
}

impl fmt::Display for FinancialModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::ThirdParty => write!(f, "Third Party"),
            Self::LcoeCalculator => write!(f, "LCOE Calculator"),
            Self::LcohCalculator => write!(f, "LCOH Calculator"),
            Self::Standard(name) => write!(f, "{name}"),
        }
    }
}

impl<'de> Deserialize<'de> for FinancialModelKind {
    fn deserialize<D>(deserialiser: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserialiser)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl FinancialModelKind {
    /// Whether this is one of the LCOE/LCOH calculators
    pub fn is_cost_calculator(&self) -> bool {
        matches!(self, Self::LcoeCalculator | Self::LcohCalculator)
    }

    /// Whether the model has a degradation input which can be overridden
    pub fn uses_degradation(&self) -> bool {
        !matches!(
            self,
            Self::None | Self::LcoeCalculator | Self::LcohCalculator
        )
    }

    /// Whether the combined costs may be written to a target case using this model
    pub fn allows_cost_overwrite(&self) -> bool {
        !matches!(self, Self::None | Self::ThirdParty)
    }

    /// The name of the variable holding the analysis period in years, if any
    pub fn analysis_period_var(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::LcoeCalculator | Self::LcohCalculator => Some("c_lifetime"),
            Self::ThirdParty | Self::Standard(_) => Some("analysis_period"),
        }
    }

    /// The name of the variable holding the inflation rate, if any
    pub fn inflation_var(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::LcoeCalculator | Self::LcohCalculator => Some("c_inflation"),
            Self::ThirdParty | Self::Standard(_) => Some("inflation_rate"),
        }
    }
}

/// A simulation configuration within a project
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Case {
    /// Unique name of the case within the project
    pub name: CaseID,
    /// The name of the technology being modelled (e.g. "Photovoltaic")
    pub technology: String,
    /// The financial model used by the case
    pub financing: FinancialModelKind,
    /// The case's input variables
    #[serde(default)]
    pub inputs: VariableStore,
}

impl Case {
    /// Create a new case with no inputs
    pub fn new(name: &str, technology: &str, financing: FinancialModelKind) -> Self {
        Self {
            name: name.into(),
            technology: technology.to_string(),
            financing,
            inputs: VariableStore::new(),
        }
    }

    /// Add an input to the case, returning the modified case
    pub fn with_input<V: Into<crate::variable::VarValue>>(mut self, name: &str, value: V) -> Self {
        self.inputs.set(name, value);
        self
    }

    /// Get a numeric input, failing if it is missing
    pub fn get_number(&self, name: &str) -> Result<f64> {
        self.inputs
            .get_number(name)
            .with_context(|| format!("Invalid input for case {}", self.name))
    }

    /// The name of the simulation output holding this case's annual energy
    pub fn annual_energy_output(&self) -> &'static str {
        if self.technology == GEOTHERMAL_POWER {
            "first_year_output"
        } else {
            "annual_energy"
        }
    }

    /// The analysis period in years, or `None` if the financial model has none
    pub fn analysis_period(&self) -> Result<Option<u32>> {
        let Some(var) = self.financing.analysis_period_var() else {
            return Ok(None);
        };

        let years = self.get_number(var)?;
        ensure!(
            years >= 0.0 && years.fract() == 0.0 && years <= f64::from(u32::MAX),
            "Analysis period for case {} must be a whole number of years, got {years}",
            self.name
        );

        Ok(Some(years as u32))
    }

    /// The inflation rate, or `None` if the financial model has none
    pub fn inflation_rate(&self) -> Result<Option<f64>> {
        self.financing
            .inflation_var()
            .map(|var| self.get_number(var))
            .transpose()
    }
}
