//! Fixtures for tests

use crate::case::{Case, FinancialModelKind};
use crate::simulation::SimulationOutputs;
use crate::variable::{VarValue, VariableStore};
use rstest::fixture;
use std::iter;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A case with a cash-flow financial model and a five-year analysis period
pub fn standard_case(name: &str, nameplate: f64) -> Case {
    Case::new(
        name,
        "Photovoltaic",
        FinancialModelKind::Standard("Single Owner".into()),
    )
    .with_input("system_capacity", nameplate)
    .with_input("analysis_period", 5.0)
    .with_input("inflation_rate", 2.0)
    .with_input("degradation", vec![0.5])
    .with_input("total_installed_cost", 1000.0)
}

/// A case using the LCOE calculator with a five-year lifetime
pub fn lcoe_case(name: &str, fixed_operating_cost: f64, variable_operating_cost: f64) -> Case {
    Case::new(name, "Geothermal Power", FinancialModelKind::LcoeCalculator)
        .with_input("system_capacity", 1.0)
        .with_input("c_lifetime", 5.0)
        .with_input("c_inflation", 2.0)
        .with_input("capital_cost", 100.0)
        .with_input("fixed_operating_cost", fixed_operating_cost)
        .with_input("variable_operating_cost", variable_operating_cost)
}

/// Cash flow outputs with the same fixed operating cost in each year.
///
/// As with real simulation outputs, each cash flow starts with a value for year zero.
pub fn cash_flow_outputs(years: u32, annual_cost: f64) -> VariableStore {
    let len = years as usize + 1;
    let fixed = iter::once(0.0)
        .chain(iter::repeat_n(annual_cost, len - 1))
        .collect::<Vec<_>>();

    [
        ("cf_om_fixed_expense", VarValue::Array(fixed)),
        ("cf_om_capacity_expense", VarValue::Array(vec![0.0; len])),
        ("cf_om_production_expense", VarValue::Array(vec![0.0; len])),
        ("cf_om_fuel_expense", VarValue::Array(vec![0.0; len])),
    ]
    .into_iter()
    .collect()
}

/// Outputs of a simulation with a constant generation profile and no costs
pub fn energy_outputs(annual_energy: f64) -> SimulationOutputs {
    SimulationOutputs {
        messages: Vec::new(),
        values: [
            ("annual_energy", VarValue::Number(annual_energy)),
            ("first_year_output", VarValue::Number(annual_energy)),
            ("gen", VarValue::Array(vec![annual_energy / 8760.0])),
        ]
        .into_iter()
        .collect(),
    }
}

/// Outputs of a five-year simulation of a case with a cash-flow financial model
pub fn cash_flow_case_outputs(annual_energy: f64, annual_cost: f64) -> SimulationOutputs {
    let mut outputs = energy_outputs(annual_energy);
    for (name, value) in cash_flow_outputs(5, annual_cost).iter() {
        outputs.values.set(name, value.clone());
    }
    outputs
}

#[fixture]
pub fn generic_target() -> Case {
    Case::new(
        "Generic",
        "Generic System",
        FinancialModelKind::Standard("Single Owner".into()),
    )
    .with_input("system_capacity", 0.0)
    .with_input("analysis_period", 5.0)
    .with_input("inflation_rate", 2.5)
    .with_input("degradation", vec![0.0])
    .with_input("spec_mode", 0.0)
    .with_input("derate", 4.0)
    .with_input("heat_rate", 10.0)
    .with_input("fixed_plant_input", 0.0)
    .with_input("om_fixed", vec![0.0])
    .with_input("om_fixed_escal", 1.0)
}
