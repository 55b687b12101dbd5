//! The boundary between the training driver and the numerical solver

use crate::core::{Parameter, Problem, Result};
use std::fmt;
use std::path::Path;

/// Destination for the solver's own diagnostic text
#[derive(Default)]
pub enum OutputSink {
    /// Print to standard output
    #[default]
    Stdout,
    /// Discard everything (quiet mode)
    Silent,
    /// Hand every message to a callback
    Custom(Box<dyn Fn(&str)>),
}

impl OutputSink {
    /// Emit one message; messages carry their own line breaks
    pub fn emit(&self, message: &str) {
        match self {
            OutputSink::Stdout => print!("{message}"),
            OutputSink::Silent => {}
            OutputSink::Custom(f) => f(message),
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputSink::Stdout => f.write_str("Stdout"),
            OutputSink::Silent => f.write_str("Silent"),
            OutputSink::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Operations the training pipeline needs from a solver
pub trait SolverBackend {
    /// Trained artifact produced by [`SolverBackend::train`]
    type Model;

    /// Check that the parameter set fits the dataset.
    /// Returns a human-readable message when it does not.
    fn check_parameter(&self, problem: &Problem, param: &Parameter) -> Option<String>;

    /// Fit a model on the whole dataset
    fn train(&self, problem: &Problem, param: &Parameter) -> Result<Self::Model>;

    /// One out-of-fold prediction per sample
    fn cross_validate(
        &self,
        problem: &Problem,
        param: &Parameter,
        nr_fold: usize,
    ) -> Result<Vec<f64>>;

    /// Persist a trained model
    fn save_model(&self, path: &Path, model: &Self::Model) -> Result<()>;

    /// Redirect or suppress the solver's diagnostic output
    fn set_output_sink(&mut self, sink: OutputSink);
}
