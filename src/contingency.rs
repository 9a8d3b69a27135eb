//! Detection of contingency costs in simulated cases.
//!
//! Some technologies include a contingency allowance in their installed cost. When such cases are
//! combined into a case which also applies a contingency, the allowance may be counted twice, so
//! the user is warned.
use crate::variable::{VarValue, VariableStore};

/// Names under which technologies report a contingency allowance
const CONTINGENCY_OUTPUTS: [&str; 10] = [
    "contingency_rate",
    "contingency_percent",
    "csp.dtr.cost.contingency_percent",
    "csp.pt.cost.contingency_percent",
    "csp.mslf.cost.contingency_percent",
    "csp.lf.cost.contingency_percent",
    "csp.gss.cost.contingency_percent",
    "csp.tr.cost.contingency_percent",
    "biopwr.cost.contingency_percent",
    "geotherm.cost.contingency_percent",
];

/// Whether any known contingency output is present with a value greater than zero
pub fn has_contingency(outputs: &VariableStore) -> bool {
    CONTINGENCY_OUTPUTS
        .iter()
        .filter_map(|name| outputs.get(name).and_then(VarValue::as_number))
        .any(|value| value > f64::EPSILON)
}
