//! Roll-up of installed and operating costs across combined cases.
//!
//! How a case contributes depends on its financial model:
//!
//! * LCOE/LCOH calculators give a capital cost and a fixed plus variable operating cost, the same in
//!   every year.
//! * Cases with no financial model, or owned by a third party, contribute nothing.
//! * Cash-flow models contribute their total installed cost and, for each year, the sum of all
//!   operating expenses in their cash flow. Escalation, capacity and production based costs and
//!   fuel are therefore already included in the combined fixed cost for that year.
use crate::case::{Case, FinancialModelKind};
use crate::contingency::has_contingency;
use crate::units::{Energy, Money, MoneyPerEnergy};
use crate::variable::VariableStore;
use anyhow::{Context, Result};
use itertools::Itertools;
use log::debug;

/// Combined fixed operating cost for each year of the analysis period
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCostSchedule(Vec<Money>);

impl FixedCostSchedule {
    /// A schedule of zero costs
    pub fn zeros(years: u32) -> Self {
        Self(vec![Money(0.0); years as usize])
    }

    /// The cost for each year
    pub fn values(&self) -> &[Money] {
        &self.0
    }

    /// Reduce the schedule to a single value if the cost is the same in every year.
    ///
    /// An empty schedule becomes a single zero.
    pub fn collapse(self) -> Self {
        if self.0.iter().all_equal() {
            Self(vec![self.0.first().copied().unwrap_or_default()])
        } else {
            self
        }
    }

    /// The single annual cost, if the schedule has one value
    pub fn as_scalar(&self) -> Option<Money> {
        match self.0.as_slice() {
            [value] => Some(*value),
            _ => None,
        }
    }

    /// The schedule as plain numbers
    pub fn to_vec(&self) -> Vec<f64> {
        self.0.iter().map(|cost| cost.value()).collect()
    }
}

/// A cash-flow output of a simulation. Index zero holds "year zero".
#[derive(Debug)]
struct CashFlow {
    name: &'static str,
    values: Vec<f64>,
}

impl CashFlow {
    /// Read a cash flow which must be present
    fn required(outputs: &VariableStore, name: &'static str) -> Result<Self> {
        Self::optional(outputs, name)?
            .with_context(|| format!("Simulation output {name} not found"))
    }

    /// Read a cash flow which may be absent
    fn optional(outputs: &VariableStore, name: &'static str) -> Result<Option<Self>> {
        Ok(outputs
            .get_cells(name)?
            .map(|values| Self { name, values }))
    }

    /// The value for the given analysis year (counting from zero)
    fn year(&self, year: usize) -> Result<f64> {
        self.values.get(year + 1).copied().with_context(|| {
            format!(
                "Cash flow {} has no value for analysis year {}",
                self.name,
                year + 1
            )
        })
    }
}

/// Contribution of an optional cash flow, which is zero if absent
fn optional_year(cash_flow: Option<&CashFlow>, year: usize) -> Result<f64> {
    cash_flow.map_or(Ok(0.0), |cash_flow| cash_flow.year(year))
}

/// Operating costs of a subsystem (e.g. a battery) which may or may not be present
#[derive(Debug)]
struct SubsystemCashFlows {
    fixed: Option<CashFlow>,
    capacity: Option<CashFlow>,
    production: Option<CashFlow>,
    replacement: Option<CashFlow>,
}

impl SubsystemCashFlows {
    fn from_outputs(outputs: &VariableStore, names: [&'static str; 4]) -> Result<Self> {
        let [fixed, capacity, production, replacement] = names;
        Ok(Self {
            fixed: CashFlow::optional(outputs, fixed)?,
            capacity: CashFlow::optional(outputs, capacity)?,
            production: CashFlow::optional(outputs, production)?,
            replacement: CashFlow::optional(outputs, replacement)?,
        })
    }

    fn year(&self, year: usize) -> Result<f64> {
        [
            &self.fixed,
            &self.capacity,
            &self.production,
            &self.replacement,
        ]
        .into_iter()
        .map(|cash_flow| optional_year(cash_flow.as_ref(), year))
        .sum()
    }
}

/// All operating expenses reported in a case's cash flow
#[derive(Debug)]
struct OperatingCashFlows {
    fixed: CashFlow,
    capacity: CashFlow,
    production: CashFlow,
    fuel: CashFlow,
    alternate_fuels: [Option<CashFlow>; 2],
    /// Battery storage
    secondary: SubsystemCashFlows,
    /// Fuel cell
    tertiary: SubsystemCashFlows,
}

impl OperatingCashFlows {
    fn from_outputs(outputs: &VariableStore) -> Result<Self> {
        Ok(Self {
            fixed: CashFlow::required(outputs, "cf_om_fixed_expense")?,
            capacity: CashFlow::required(outputs, "cf_om_capacity_expense")?,
            production: CashFlow::required(outputs, "cf_om_production_expense")?,
            fuel: CashFlow::required(outputs, "cf_om_fuel_expense")?,
            alternate_fuels: [
                CashFlow::optional(outputs, "cf_om_opt_fuel_1_expense")?,
                CashFlow::optional(outputs, "cf_om_opt_fuel_2_expense")?,
            ],
            secondary: SubsystemCashFlows::from_outputs(
                outputs,
                [
                    "cf_om_fixed1_expense",
                    "cf_om_capacity1_expense",
                    "cf_om_production1_expense",
                    "cf_battery_replacement_cost",
                ],
            )?,
            tertiary: SubsystemCashFlows::from_outputs(
                outputs,
                [
                    "cf_om_fixed2_expense",
                    "cf_om_capacity2_expense",
                    "cf_om_production2_expense",
                    "cf_fuelcell_replacement_cost",
                ],
            )?,
        })
    }

    /// Total operating expense in the given analysis year (counting from zero)
    fn year(&self, year: usize) -> Result<Money> {
        let mut total = self.fixed.year(year)?
            + self.capacity.year(year)?
            + self.production.year(year)?
            + self.fuel.year(year)?;
        for fuel in &self.alternate_fuels {
            total += optional_year(fuel.as_ref(), year)?;
        }
        total += self.secondary.year(year)?;
        total += self.tertiary.year(year)?;

        Ok(Money(total))
    }
}

/// Accumulates costs over the cases being combined
#[derive(Debug, Clone, PartialEq)]
pub struct CostAggregator {
    total_installed_cost: Money,
    fixed_costs: FixedCostSchedule,
    has_contingency: bool,
}

impl CostAggregator {
    /// Create an aggregator for an analysis period of the given number of years
    pub fn new(analysis_period: u32) -> Self {
        Self {
            total_installed_cost: Money(0.0),
            fixed_costs: FixedCostSchedule::zeros(analysis_period),
            has_contingency: false,
        }
    }

    /// The total installed cost of the cases added so far
    pub fn total_installed_cost(&self) -> Money {
        self.total_installed_cost
    }

    /// Whether any case added so far declared a contingency
    pub fn has_contingency(&self) -> bool {
        self.has_contingency
    }

    /// Add the costs of a simulated case.
    ///
    /// # Arguments
    ///
    /// * `case` - The case, with its inputs as simulated
    /// * `outputs` - The outputs of the case's simulation
    /// * `cumulative_energy` - Annual energy of all cases added so far, including this one
    pub fn add_case(
        &mut self,
        case: &Case,
        outputs: &VariableStore,
        cumulative_energy: Energy,
    ) -> Result<()> {
        let years = self.fixed_costs.0.len();
        match &case.financing {
            FinancialModelKind::LcoeCalculator | FinancialModelKind::LcohCalculator => {
                let installed_cost = Money(case.get_number("capital_cost")?);
                let fixed = Money(case.get_number("fixed_operating_cost")?);
                let variable = MoneyPerEnergy(case.get_number("variable_operating_cost")?);
                let annual_cost = fixed + variable * cumulative_energy;
                debug!(
                    "Case {}: installed cost {}, annual operating cost {}",
                    case.name,
                    installed_cost.value(),
                    annual_cost.value()
                );

                self.total_installed_cost += installed_cost;
                for cost in &mut self.fixed_costs.0 {
                    *cost += annual_cost;
                }
            }
            FinancialModelKind::None | FinancialModelKind::ThirdParty => {
                debug!("Case {} contributes no costs", case.name);
            }
            FinancialModelKind::Standard(_) if years > 0 => {
                let installed_cost = Money(case.get_number("total_installed_cost")?);
                let cash_flows = OperatingCashFlows::from_outputs(outputs)
                    .with_context(|| format!("Invalid cash flow for case {}", case.name))?;
                debug!(
                    "Case {}: installed cost {}",
                    case.name,
                    installed_cost.value()
                );

                self.total_installed_cost += installed_cost;
                self.has_contingency |= has_contingency(outputs);
                for (year, cost) in self.fixed_costs.0.iter_mut().enumerate() {
                    *cost += cash_flows
                        .year(year)
                        .with_context(|| format!("Invalid cash flow for case {}", case.name))?;
                }
            }
            FinancialModelKind::Standard(_) => {}
        }

        Ok(())
    }

    /// The total installed cost and the fixed cost schedule, collapsed to a single value if the
    /// cost is the same in every year
    pub fn finish(self) -> (Money, FixedCostSchedule) {
        (self.total_installed_cost, self.fixed_costs.collapse())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, cash_flow_outputs, lcoe_case, standard_case};
    use crate::variable::VarValue;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(vec![20.0, 20.0, 20.0], vec![20.0])]
    #[case(vec![20.0, 21.0, 20.0], vec![20.0, 21.0, 20.0])]
    #[case(vec![5.0], vec![5.0])]
    #[case(vec![], vec![0.0])]
    fn test_collapse(#[case] schedule: Vec<f64>, #[case] expected: Vec<f64>) {
        let schedule = FixedCostSchedule(schedule.into_iter().map(Money).collect());
        assert_eq!(schedule.collapse().to_vec(), expected);
    }

    #[test]
    fn test_two_standard_cases() {
        let mut aggregator = CostAggregator::new(5);
        for (name, installed_cost) in [("PV", 1000.0), ("Wind", 2000.0)] {
            let case = standard_case(name, 100.0).with_input("total_installed_cost", installed_cost);
            aggregator
                .add_case(&case, &cash_flow_outputs(5, 10.0), Energy(0.0))
                .unwrap();
        }

        let (installed_cost, schedule) = aggregator.finish();
        assert_eq!(installed_cost, Money(3000.0));
        assert_eq!(schedule.to_vec(), [20.0]);
    }

    #[test]
    fn test_cash_flow_skips_year_zero() {
        let mut outputs = cash_flow_outputs(3, 0.0);
        outputs.set("cf_om_fixed_expense", vec![99.0, 1.0, 2.0, 3.0]);

        let mut aggregator = CostAggregator::new(3);
        aggregator
            .add_case(&standard_case("PV", 1.0), &outputs, Energy(0.0))
            .unwrap();
        assert_eq!(aggregator.finish().1.to_vec(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_optional_cash_flows() {
        let mut outputs = cash_flow_outputs(2, 1.0);
        for name in [
            "cf_om_opt_fuel_1_expense",
            "cf_om_opt_fuel_2_expense",
            "cf_om_fixed1_expense",
            "cf_om_capacity1_expense",
            "cf_om_production1_expense",
            "cf_battery_replacement_cost",
            "cf_om_fixed2_expense",
            "cf_om_capacity2_expense",
            "cf_om_production2_expense",
            "cf_fuelcell_replacement_cost",
        ] {
            outputs.set(name, vec![0.0, 1.0, 1.0]);
        }

        let mut aggregator = CostAggregator::new(2);
        aggregator
            .add_case(&standard_case("PV", 1.0), &outputs, Energy(0.0))
            .unwrap();

        // Fixed cost of 1.0 plus 10 optional cash flows of 1.0 each
        assert_eq!(aggregator.finish().1.to_vec(), [11.0]);
    }

    #[test]
    fn test_missing_required_cash_flow() {
        let outputs: VariableStore = [("cf_om_fixed_expense", VarValue::Array(vec![0.0, 1.0]))]
            .into_iter()
            .collect();
        let mut aggregator = CostAggregator::new(1);
        assert_error!(
            aggregator.add_case(&standard_case("PV", 1.0), &outputs, Energy(0.0)),
            "Invalid cash flow for case PV"
        );
    }

    #[test]
    fn test_short_cash_flow() {
        let mut aggregator = CostAggregator::new(5);
        let error = aggregator
            .add_case(
                &standard_case("PV", 1.0),
                &cash_flow_outputs(3, 1.0),
                Energy(0.0),
            )
            .unwrap_err();
        assert_eq!(
            error.root_cause().to_string(),
            "Cash flow cf_om_fixed_expense has no value for analysis year 4"
        );
    }

    #[rstest]
    #[case(FinancialModelKind::LcoeCalculator)]
    #[case(FinancialModelKind::LcohCalculator)]
    fn test_cost_calculator_case(#[case] financing: FinancialModelKind) {
        let mut aggregator = CostAggregator::new(3);
        let mut case = lcoe_case("Geo", 5.0, 0.01).with_input("capital_cost", 500.0);
        case.financing = financing;
        aggregator
            .add_case(&case, &VariableStore::new(), Energy(1000.0))
            .unwrap();

        let (installed_cost, schedule) = aggregator.finish();
        assert_eq!(installed_cost, Money(500.0));
        assert_approx_eq!(Money, schedule.as_scalar().unwrap(), Money(15.0));
    }

    #[test]
    fn test_lcoe_uses_cumulative_energy() {
        let mut aggregator = CostAggregator::new(2);
        let case = lcoe_case("Geo", 5.0, 0.01);
        aggregator
            .add_case(&case, &VariableStore::new(), Energy(1000.0))
            .unwrap();
        aggregator
            .add_case(&case, &VariableStore::new(), Energy(3000.0))
            .unwrap();

        // (5 + 0.01 * 1000) + (5 + 0.01 * 3000)
        let schedule = aggregator.finish().1;
        assert_approx_eq!(Money, schedule.as_scalar().unwrap(), Money(50.0));
    }

    #[rstest]
    #[case(FinancialModelKind::None)]
    #[case(FinancialModelKind::ThirdParty)]
    fn test_no_cost_contribution(#[case] financing: FinancialModelKind) {
        let mut case = standard_case("PV", 1.0).with_input("total_installed_cost", 1e6);
        case.financing = financing;
        let mut aggregator = CostAggregator::new(3);
        aggregator
            .add_case(&case, &cash_flow_outputs(3, 10.0), Energy(1000.0))
            .unwrap();

        let (installed_cost, schedule) = aggregator.finish();
        assert_eq!(installed_cost, Money(0.0));
        assert_eq!(schedule.to_vec(), [0.0]);
    }

    #[test]
    fn test_standard_case_without_analysis_period() {
        let mut aggregator = CostAggregator::new(0);
        aggregator
            .add_case(&standard_case("PV", 1.0), &VariableStore::new(), Energy(0.0))
            .unwrap();
        assert_eq!(aggregator.total_installed_cost(), Money(0.0));
    }

    #[test]
    fn test_contingency_detected_for_standard_case() {
        let mut outputs = cash_flow_outputs(1, 0.0);
        outputs.set("contingency_rate", 3.0);
        let mut aggregator = CostAggregator::new(1);
        aggregator
            .add_case(&standard_case("PV", 1.0), &outputs, Energy(0.0))
            .unwrap();
        assert!(aggregator.has_contingency());
    }
}
