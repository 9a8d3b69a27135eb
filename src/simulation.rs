//! The interface to the simulation engine which produces each case's results.
//!
//! The engine itself is external. Cases are handed to it explicitly; it returns the named outputs
//! of a successful run, or the messages explaining why the run failed.
use crate::case::Case;
use crate::input::read_toml;
use crate::overrides::DEGRADATION_VAR;
use crate::variable::{VarValue, VariableStore};
use anyhow::Result;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;

/// The results of a successful simulation
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationOutputs {
    /// Notices and warnings generated while simulating
    #[serde(default)]
    pub messages: Vec<String>,
    /// The named outputs
    #[serde(default)]
    pub values: VariableStore,
}

/// A simulation which did not complete
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationFailure {
    /// The messages returned by the simulation, most important first
    pub messages: Vec<String>,
}

/// Runs simulations of cases
pub trait Simulator {
    /// Simulate a case with its current inputs
    fn run(&mut self, case: &Case) -> Result<SimulationOutputs, SimulationFailure>;

    /// Recompute a case's derived values after its inputs have been changed.
    ///
    /// Called on the target case once the combined results have been written to it.
    fn recalculate(&mut self, _case: &mut Case) -> Result<()> {
        Ok(())
    }
}

/// The inputs a case had while it was being simulated
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedRun {
    /// The name of the case
    pub case: String,
    /// The case's degradation input, if any
    pub degradation: Option<VarValue>,
    /// The case's inflation rate input, if any
    pub inflation: Option<VarValue>,
}

/// A result stored ahead of time for a case
#[derive(Debug, Clone, PartialEq, Deserialize)]
struct RecordedRun {
    #[serde(default)]
    messages: Vec<String>,
    /// If present, the run fails with this message
    error: Option<String>,
    #[serde(default)]
    outputs: VariableStore,
}

/// A [`Simulator`] which replays results recorded from earlier simulations.
///
/// This lets cases which have already been simulated be combined without running the simulation
/// engine again. Each run also records the inputs the case had at that moment.
#[derive(Debug, Default)]
pub struct RecordedSimulator {
    results: IndexMap<String, RecordedRun>,
    observed: Vec<ObservedRun>,
    recalculated: Vec<String>,
}

impl RecordedSimulator {
    /// Create a simulator with no recorded results
    pub fn new() -> Self {
        Self::default()
    }

    /// Read recorded results from a TOML file with one table per case.
    ///
    /// Each table may contain `messages`, an `error` message for runs which failed, and an
    /// `outputs` table of named values.
    pub fn from_path(file_path: &Path) -> Result<Self> {
        let results = read_toml(file_path)?;
        Ok(Self {
            results,
            ..Self::default()
        })
    }

    /// Record the outputs of a successful run of the named case
    pub fn insert_outputs(&mut self, case: &str, outputs: SimulationOutputs) {
        self.results.insert(
            case.to_string(),
            RecordedRun {
                messages: outputs.messages,
                error: None,
                outputs: outputs.values,
            },
        );
    }

    /// Record a failed run of the named case
    pub fn insert_failure(&mut self, case: &str, message: &str) {
        self.results.insert(
            case.to_string(),
            RecordedRun {
                messages: Vec::new(),
                error: Some(message.to_string()),
                outputs: VariableStore::new(),
            },
        );
    }

    /// The runs performed so far, in order
    pub fn observed_runs(&self) -> &[ObservedRun] {
        &self.observed
    }

    /// The names of the cases recalculated so far, in order
    pub fn recalculated(&self) -> &[String] {
        &self.recalculated
    }
}

impl Simulator for RecordedSimulator {
    fn run(&mut self, case: &Case) -> Result<SimulationOutputs, SimulationFailure> {
        let inflation = case
            .financing
            .inflation_var()
            .and_then(|name| case.inputs.get(name))
            .cloned();
        self.observed.push(ObservedRun {
            case: case.name.to_string(),
            degradation: case.inputs.get(DEGRADATION_VAR).cloned(),
            inflation,
        });

        let Some(run) = self.results.get(&*case.name.0) else {
            return Err(SimulationFailure {
                messages: vec![format!("No recorded results for case {}", case.name)],
            });
        };

        if let Some(error) = &run.error {
            return Err(SimulationFailure {
                messages: std::iter::once(error.clone())
                    .chain(run.messages.iter().cloned())
                    .collect(),
            });
        }

        Ok(SimulationOutputs {
            messages: run.messages.clone(),
            values: run.outputs.clone(),
        })
    }

    fn recalculate(&mut self, case: &mut Case) -> Result<()> {
        self.recalculated.push(case.name.to_string());
        Ok(())
    }
}
