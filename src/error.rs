//! Errors which abort a combination run.
//!
//! These are carried inside [`anyhow::Error`]; callers that need to tell them apart can use
//! `error.downcast_ref::<CombineError>()`.
use crate::case::FinancialModelKind;

/// A condition which stops cases from being combined
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum CombineError {
    /// Fewer than two cases were selected. Nothing is modified.
    #[display("Not enough cases selected ({count}). Choose at least two cases to combine.")]
    InsufficientSelection {
        /// How many cases were selected
        count: usize,
    },
    /// A selected case is not in the project
    #[display("Unknown case: {case}")]
    UnknownCase {
        /// The name of the case
        case: String,
    },
    /// The target case was also selected for combination
    #[display("Case {case} receives the combined results and cannot be one of the combined cases")]
    TargetSelected {
        /// The name of the target case
        case: String,
    },
    /// A case was selected more than once
    #[display("Case {case} is selected more than once")]
    DuplicateCase {
        /// The name of the repeated case
        case: String,
    },
    /// A case's simulation failed
    #[display("Error in {case}: {message}")]
    SimulationFailure {
        /// The name of the case which failed
        case: String,
        /// The first message reported by the simulation
        message: String,
    },
    /// A case produced output at a finer resolution than hourly
    #[display(
        "The subhourly simulation for case {case} is not supported ({len} values for an analysis \
        period of {analysis_period} years)"
    )]
    SubhourlyUnsupported {
        /// The name of the case
        case: String,
        /// The number of values in the case's generation profile
        len: usize,
        /// The case's analysis period in years
        analysis_period: u32,
    },
    /// A case produced fewer than 8760 values which cannot be spread evenly over the year
    #[display("Generation profile for case {case} has {len} values, which is not a whole-hour resolution")]
    UnsupportedProfileLength {
        /// The name of the case
        case: String,
        /// The number of values in the case's generation profile
        len: usize,
    },
    /// The target's financial model needs a single fixed operating cost, but the combined
    /// schedule varies from year to year
    #[display(
        "Single annualised fixed operating costs must be used with the {financing}. Check O&M \
        inputs in the combined cases."
    )]
    CostScheduleInconsistent {
        /// The target case's financial model
        financing: FinancialModelKind,
    },
}
