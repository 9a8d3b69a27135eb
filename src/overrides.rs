//! Temporary replacement of a case's degradation and inflation inputs.
//!
//! When cases are combined, every case is simulated with the same degradation and inflation
//! assumptions. The case's own values are put back as soon as its simulation results have been
//! used, however the combination of that case ends: [`apply_overrides`] returns an
//! [`OverrideGuard`] which restores the original values when dropped.
use crate::case::Case;
use crate::variable::VarValue;
use anyhow::{Context, Result};
use log::debug;
use std::ops::Deref;

/// The degradation input of cases with a cash-flow financial model
pub const DEGRADATION_VAR: &str = "degradation";

/// The degradation input of generic battery cases
const GENERIC_DEGRADATION_VAR: &str = "generic_degradation";

/// An annual degradation rate, either the same every year or a schedule by year
#[derive(Debug, Clone, PartialEq)]
pub enum DegradationSchedule {
    /// A single rate (%/year) applying to every year
    Rate(f64),
    /// One rate (%/year) for each year of the analysis period
    Schedule(Vec<f64>),
}

impl Default for DegradationSchedule {
    fn default() -> Self {
        Self::Rate(0.0)
    }
}

impl DegradationSchedule {
    /// The degradation defined on the target case, used as the default override.
    ///
    /// Generic battery cases hold this in `generic_degradation`, other cases in `degradation`.
    /// Cases with neither (e.g. those using an LCOE calculator) give a rate of zero.
    pub fn from_target(case: &Case) -> Self {
        [GENERIC_DEGRADATION_VAR, DEGRADATION_VAR]
            .into_iter()
            .find_map(|name| case.inputs.get(name).and_then(VarValue::cells))
            .map(|cells| match cells.len() {
                0 => Self::default(),
                1 => Self::Rate(cells[0]),
                _ => Self::Schedule(cells),
            })
            .unwrap_or_default()
    }

    fn to_value(&self) -> VarValue {
        match self {
            Self::Rate(rate) => VarValue::Number(*rate),
            Self::Schedule(rates) => VarValue::Array(rates.clone()),
        }
    }
}

/// The values applied to each case for the duration of its simulation
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParameterOverrides {
    /// Degradation applied to cases with a cash-flow financial model
    pub degradation: DegradationSchedule,
    /// Inflation rate applied to every case with a financial model
    pub inflation_rate: f64,
}

/// Holds a case whose inputs have been overridden, restoring the original inputs on drop
#[derive(Debug)]
pub struct OverrideGuard<'a> {
    case: &'a mut Case,
    degradation: Option<VarValue>,
    inflation: Option<(&'static str, VarValue)>,
}

/// Override the degradation and inflation inputs of `case`.
///
/// Degradation is only overridden for cash-flow financial models and inflation for any model other
/// than `None`. The original values are captured exactly as stored, so a scalar stays a scalar and
/// a schedule stays a schedule when restored.
///
/// Nothing is changed if an input to be overridden is missing.
pub fn apply_overrides<'a>(
    case: &'a mut Case,
    overrides: &ParameterOverrides,
) -> Result<OverrideGuard<'a>> {
    let degradation = if case.financing.uses_degradation() {
        Some(capture(case, DEGRADATION_VAR)?)
    } else {
        None
    };
    let inflation = match case.financing.inflation_var() {
        Some(name) => Some((name, capture(case, name)?)),
        None => None,
    };

    if degradation.is_some() {
        case.inputs.set(DEGRADATION_VAR, overrides.degradation.to_value());
    }
    if let Some((name, _)) = &inflation {
        case.inputs.set(name, overrides.inflation_rate);
    }
    debug!("Applied degradation and inflation overrides to case {}", case.name);

    Ok(OverrideGuard {
        case,
        degradation,
        inflation,
    })
}

fn capture(case: &Case, name: &str) -> Result<VarValue> {
    case.inputs
        .get(name)
        .cloned()
        .with_context(|| format!("Case {} has no {name} input to override", case.name))
}

impl OverrideGuard<'_> {
    /// Put the original inputs back now rather than when the guard goes out of scope
    pub fn restore(self) {
        drop(self);
    }
}

impl Deref for OverrideGuard<'_> {
    type Target = Case;

    fn deref(&self) -> &Case {
        self.case
    }
}

impl Drop for OverrideGuard<'_> {
    fn drop(&mut self) {
        if let Some(degradation) = self.degradation.take() {
            self.case.inputs.set(DEGRADATION_VAR, degradation);
        }
        if let Some((name, inflation)) = self.inflation.take() {
            self.case.inputs.set(name, inflation);
        }
        debug!("Restored degradation and inflation inputs of case {}", self.case.name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::case::FinancialModelKind;
    use crate::fixture::{lcoe_case, standard_case};
    use rstest::rstest;

    fn overrides() -> ParameterOverrides {
        ParameterOverrides {
            degradation: DegradationSchedule::Schedule(vec![0.7, 0.8, 0.9]),
            inflation_rate: 2.5,
        }
    }

    #[rstest]
    #[case(VarValue::Number(0.5))]
    #[case(VarValue::Array(vec![0.5]))]
    #[case(VarValue::Array(vec![0.5, 0.6, 0.7]))]
    fn test_apply_then_restore_is_identical(#[case] degradation: VarValue) {
        let mut case = standard_case("PV", 100.0).with_input(DEGRADATION_VAR, degradation);
        let before = case.clone();

        let guard = apply_overrides(&mut case, &overrides()).unwrap();
        assert_eq!(
            guard.inputs.get(DEGRADATION_VAR),
            Some(&VarValue::Array(vec![0.7, 0.8, 0.9]))
        );
        assert_eq!(guard.inputs.get_number("inflation_rate").unwrap(), 2.5);
        guard.restore();

        assert_eq!(case, before);
    }

    #[test]
    fn test_scalar_override_stays_scalar() {
        let mut case = standard_case("PV", 100.0);
        let overrides = ParameterOverrides {
            degradation: DegradationSchedule::Rate(0.3),
            inflation_rate: 1.0,
        };
        let guard = apply_overrides(&mut case, &overrides).unwrap();
        assert_eq!(guard.inputs.get(DEGRADATION_VAR), Some(&VarValue::Number(0.3)));
    }

    #[test]
    fn test_calculator_overrides_inflation_only() {
        let mut case = lcoe_case("Geo", 5.0, 0.01);
        let before = case.clone();
        {
            let guard = apply_overrides(&mut case, &overrides()).unwrap();
            assert!(!guard.inputs.contains(DEGRADATION_VAR));
            assert_eq!(guard.inputs.get_number("c_inflation").unwrap(), 2.5);
        }
        assert_eq!(case, before);
    }

    #[test]
    fn test_no_financial_model_is_untouched() {
        let mut case = Case::new("Wind", "Wind Power", FinancialModelKind::None)
            .with_input(DEGRADATION_VAR, 0.5)
            .with_input("inflation_rate", 3.0);
        let before = case.clone();
        let guard = apply_overrides(&mut case, &overrides()).unwrap();
        assert_eq!(*guard, before);
    }

    #[test]
    fn test_restored_on_early_return() {
        fn fail_while_overridden(case: &mut Case) -> Result<()> {
            let _guard = apply_overrides(case, &overrides())?;
            anyhow::bail!("simulation failed");
        }

        let mut case = standard_case("PV", 100.0);
        let before = case.clone();
        assert!(fail_while_overridden(&mut case).is_err());
        assert_eq!(case, before);
    }

    #[test]
    fn test_missing_input_changes_nothing() {
        let mut case = standard_case("PV", 100.0);
        case.inputs = case
            .inputs
            .iter()
            .filter(|(name, _)| *name != "inflation_rate")
            .map(|(name, value)| (name, value.clone()))
            .collect();
        let before = case.clone();
        assert!(apply_overrides(&mut case, &overrides()).is_err());
        assert_eq!(case, before);
    }

    #[rstest]
    #[case(&[], DegradationSchedule::Rate(0.0))]
    #[case(&[(GENERIC_DEGRADATION_VAR, VarValue::Array(vec![1.0]))], DegradationSchedule::Rate(1.0))]
    #[case(&[(DEGRADATION_VAR, VarValue::Number(0.5))], DegradationSchedule::Rate(0.5))]
    #[case(
        &[(GENERIC_DEGRADATION_VAR, VarValue::Array(vec![1.0, 2.0])), (DEGRADATION_VAR, VarValue::Number(0.5))],
        DegradationSchedule::Schedule(vec![1.0, 2.0])
    )]
    fn test_degradation_from_target(
        #[case] inputs: &[(&str, VarValue)],
        #[case] expected: DegradationSchedule,
    ) {
        let mut case = Case::new("Generic", "Generic System", FinancialModelKind::LcoeCalculator);
        case.inputs = inputs.iter().cloned().collect();
        assert_eq!(DegradationSchedule::from_target(&case), expected);
    }
}
