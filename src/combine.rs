//! Combining the simulated results of several cases into a target case.
//!
//! Each selected case is simulated in turn with the combination's degradation and inflation
//! assumptions, and its generation profile and costs are added to a running total. Only once
//! every case has been processed successfully are the totals written to the target case, so a
//! failure part-way through leaves the project as it was.
use crate::case::{Case, CaseID, FinancialModelKind, GENERIC_BATTERY};
use crate::costs::{CostAggregator, FixedCostSchedule};
use crate::error::CombineError;
use crate::overrides::{DegradationSchedule, ParameterOverrides, apply_overrides};
use crate::profile::{HourlyProfile, normalise_profile};
use crate::project::Project;
use crate::settings::Settings;
use crate::simulation::Simulator;
use crate::units::{Capacity, Energy, Money};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::{info, warn};

/// Value of `spec_mode` which tells the target case to use the combined generation profile
const COMBINED_PROFILE_SPEC_MODE: f64 = 2.0;

/// Installation cost line items of the target which are zeroed when costs are overwritten
const ZEROED_INSTALLATION_COSTS: [&str; 7] = [
    "genericsys.cost.per_watt",
    "genericsys.cost.contingency_percent",
    "genericsys.cost.epc.percent",
    "genericsys.cost.epc.fixed",
    "genericsys.cost.plm.percent",
    "genericsys.cost.plm.fixed",
    "genericsys.cost.sales_tax.percent",
];

/// Operating cost escalation rates of the target which are zeroed when costs are overwritten
const ZEROED_ESCALATION_RATES: [&str; 3] =
    ["om_fixed_escal", "om_capacity_escal", "om_production_escal"];

/// Options chosen by the user for a combination
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CombineOptions {
    /// Whether to replace the target's installation and operating costs with the combined costs
    pub overwrite_costs: bool,
    /// Degradation applied to every case while it is simulated
    pub degradation: DegradationSchedule,
}

impl CombineOptions {
    /// Options using the program settings and the given degradation
    pub fn from_settings(settings: &Settings, degradation: DegradationSchedule) -> Self {
        Self {
            overwrite_costs: settings.overwrite_costs,
            degradation,
        }
    }
}

/// The totals written to the target case by a successful combination
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationOutcome {
    /// Sum of the nameplate capacities of the combined cases
    pub nameplate: Capacity,
    /// Sum of the annual energy of the combined cases
    pub annual_energy: Energy,
    /// Sum of the installed costs of the combined cases
    pub total_installed_cost: Money,
    /// Combined fixed operating cost by year, or a single value if constant
    pub fixed_costs: FixedCostSchedule,
    /// Whether any simulation produced notices the user should review
    pub had_notices: bool,
    /// Whether any combined case declared a contingency
    pub had_contingency: bool,
}

/// The result of a combination in the form presented to the user
#[derive(Debug, Clone, PartialEq)]
pub struct CombinationResult {
    /// Whether the combination completed
    pub success: bool,
    /// Why the combination failed, if it did
    pub error_message: Option<String>,
    /// Whether any simulation produced notices
    pub had_notices: bool,
    /// Whether any combined case declared a contingency
    pub had_contingency: bool,
}

impl From<&Result<CombinationOutcome>> for CombinationResult {
    fn from(result: &Result<CombinationOutcome>) -> Self {
        match result {
            Ok(outcome) => Self {
                success: true,
                error_message: None,
                had_notices: outcome.had_notices,
                had_contingency: outcome.had_contingency,
            },
            Err(err) => Self {
                success: false,
                error_message: Some(format!("{err:#}")),
                had_notices: false,
                had_contingency: false,
            },
        }
    }
}

/// Running totals over the cases combined so far
#[derive(Debug)]
struct Aggregation {
    nameplate: Capacity,
    profile: HourlyProfile,
    annual_energy: Energy,
    costs: CostAggregator,
    has_notices: bool,
}

impl Aggregation {
    fn new(analysis_period: u32) -> Self {
        Self {
            nameplate: Capacity(0.0),
            profile: HourlyProfile::default(),
            annual_energy: Energy(0.0),
            costs: CostAggregator::new(analysis_period),
            has_notices: false,
        }
    }

    /// Simulate a case with the overrides applied and add its results to the totals.
    ///
    /// The case's own inputs are restored before returning, whether or not this succeeds.
    fn add_case<S: Simulator>(
        &mut self,
        case: &mut Case,
        overrides: &ParameterOverrides,
        simulator: &mut S,
    ) -> Result<()> {
        let case = apply_overrides(case, overrides)?;
        let outputs = simulator
            .run(&case)
            .map_err(|failure| CombineError::SimulationFailure {
                case: case.name.to_string(),
                message: failure.messages.into_iter().next().unwrap_or_default(),
            })?;

        for message in &outputs.messages {
            warn!("Case {}: {message}", case.name);
        }
        self.has_notices |= !outputs.messages.is_empty();

        let nameplate = Capacity(case.get_number("system_capacity")?);
        let annual_energy = Energy(
            outputs
                .values
                .get_number(case.annual_energy_output())
                .with_context(|| format!("Invalid output for case {}", case.name))?,
        );
        let raw_profile = outputs
            .values
            .get_cells("gen")
            .with_context(|| format!("Invalid output for case {}", case.name))?
            .unwrap_or_default();
        let (profile, _) =
            normalise_profile(&case.name.0, &raw_profile, annual_energy, case.analysis_period()?)?;

        self.annual_energy += annual_energy;
        self.costs.add_case(&case, &outputs.values, self.annual_energy)?;
        self.nameplate += nameplate;
        self.profile.add(&profile);
        info!(
            "Combined case {}: nameplate capacity {}, annual energy {}",
            case.name,
            nameplate.value(),
            annual_energy.value()
        );

        case.restore();

        Ok(())
    }
}

/// Check the selection before anything is simulated
fn check_selection(project: &Project, target: &str, selection: &[CaseID]) -> Result<()> {
    ensure!(
        selection.len() >= 2,
        CombineError::InsufficientSelection {
            count: selection.len()
        }
    );

    for name in selection {
        ensure!(
            &*name.0 != target,
            CombineError::TargetSelected {
                case: target.to_string()
            }
        );
        ensure!(
            project.get(&name.0).is_some(),
            CombineError::UnknownCase {
                case: name.to_string()
            }
        );
    }

    if let Some(name) = selection.iter().duplicates().next() {
        return Err(CombineError::DuplicateCase {
            case: name.to_string(),
        }
        .into());
    }

    Ok(())
}

/// Combine the selected cases of a project into the target case.
///
/// Cases are simulated one at a time in the order given. The target's analysis period and
/// inflation rate apply to every case, along with the degradation in `options`. If this succeeds,
/// the target's nameplate capacity and generation profile (and, if requested, its costs) are
/// replaced by the combined values and the target is recalculated.
///
/// # Arguments
///
/// * `project` - The project containing the cases
/// * `target` - The name of the case receiving the combined results
/// * `selection` - The names of the cases to combine, in order
/// * `options` - Options chosen by the user
/// * `simulator` - Runs the simulation of each case
///
/// # Returns
///
/// The combined totals, or an error. Errors listed in [`CombineError`] can be identified with
/// `downcast_ref`. On error, no case in the project is modified.
pub fn combine_cases<S: Simulator>(
    project: &mut Project,
    target: &str,
    selection: &[CaseID],
    options: &CombineOptions,
    simulator: &mut S,
) -> Result<CombinationOutcome> {
    let target_case = project.get(target).ok_or_else(|| CombineError::UnknownCase {
        case: target.to_string(),
    })?;
    check_selection(project, target, selection)?;

    let target_financing = target_case.financing.clone();
    let target_technology = target_case.technology.clone();
    let overrides = ParameterOverrides {
        degradation: options.degradation.clone(),
        inflation_rate: target_case.inflation_rate()?.unwrap_or(0.0),
    };
    let mut aggregation = Aggregation::new(target_case.analysis_period()?.unwrap_or(0));

    info!("Combining {} cases into case {target}", selection.len());
    for name in selection {
        let case = project
            .get_mut(&name.0)
            .with_context(|| format!("Unknown case: {name}"))?;
        aggregation.add_case(case, &overrides, simulator)?;
    }

    let has_contingency = aggregation.costs.has_contingency();
    let (total_installed_cost, fixed_costs) = aggregation.costs.finish();
    ensure!(
        !target_financing.is_cost_calculator() || fixed_costs.as_scalar().is_some(),
        CombineError::CostScheduleInconsistent {
            financing: target_financing
        }
    );

    let outcome = CombinationOutcome {
        nameplate: aggregation.nameplate,
        annual_energy: aggregation.annual_energy,
        total_installed_cost,
        fixed_costs,
        had_notices: aggregation.has_notices,
        had_contingency: has_contingency,
    };

    let target_case = project
        .get_mut(target)
        .with_context(|| format!("Unknown case: {target}"))?;
    write_to_target(target_case, &outcome, aggregation.profile, options.overwrite_costs);
    simulator
        .recalculate(target_case)
        .with_context(|| format!("Failed to recalculate case {target}"))?;
    info!("Cases combined into case {target}");

    if outcome.had_notices {
        warn!(
            "At least one of the combined cases generated notices. Review them before using the \
            combined results."
        );
    }
    if outcome.had_contingency
        && target_technology == GENERIC_BATTERY
        && target_financing != FinancialModelKind::ThirdParty
    {
        warn!(
            "At least one of the combined cases has a contingency specified. Check that \
            contingency is not double-counted in the installation costs of case {target}."
        );
    }

    Ok(outcome)
}

/// Write the combined results to the target case
fn write_to_target(
    target: &mut Case,
    outcome: &CombinationOutcome,
    profile: HourlyProfile,
    overwrite_costs: bool,
) {
    let inputs = &mut target.inputs;

    inputs.set("system_capacity_combined", outcome.nameplate.value());
    inputs.set("system_capacity", outcome.nameplate.value());
    inputs.set("spec_mode", COMBINED_PROFILE_SPEC_MODE);
    // Losses and fuel costs are already included in the combined profile and costs
    inputs.set("derate", 0.0);
    inputs.set("heat_rate", 0.0);
    inputs.set("energy_output_array", profile.into_vec());

    if !overwrite_costs {
        return;
    }

    if target.financing.is_cost_calculator() {
        if let Some(fixed_cost) = outcome.fixed_costs.as_scalar() {
            inputs.set("fixed_operating_cost", fixed_cost.value());
        }
    }

    if !target.financing.allows_cost_overwrite() {
        return;
    }

    inputs.set("fixed_plant_input", outcome.total_installed_cost.value());
    for name in ZEROED_INSTALLATION_COSTS {
        inputs.set(name, 0.0);
    }

    // Escalation is already included in each year's combined fixed cost
    inputs.set("om_fixed", outcome.fixed_costs.to_vec());
    inputs.set("om_capacity", vec![0.0]);
    inputs.set("om_production", vec![0.0]);
    for name in ZEROED_ESCALATION_RATES {
        inputs.set(name, 0.0);
    }
    if inputs.contains("om_fuel_cost") {
        inputs.set("om_fuel_cost", vec![0.0]);
        inputs.set("om_fuel_cost_escal", 0.0);
    }
    if inputs.contains("om_replacement_cost1") {
        inputs.set("om_replacement_cost1", vec![0.0]);
        inputs.set("om_replacement_cost_escal", 0.0);
    }
}
