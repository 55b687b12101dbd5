//! Cross-validation metrics
//!
//! Compares out-of-fold predictions against the true labels: accuracy for
//! classification families, mean squared error and squared correlation
//! coefficient for regression.

use crate::core::{Parameter, Problem, Result, SVMError, SolverBackend, SvmType};
use log::info;
use std::fmt;

/// Result of a cross-validation run
#[derive(Debug, Clone, PartialEq)]
pub enum CrossValidationReport {
    Classification {
        /// Percentage of exactly matching predictions
        accuracy: f64,
        correct: usize,
        total: usize,
    },
    Regression {
        mean_squared_error: f64,
        /// NaN or infinite when predictions or labels are constant
        squared_correlation: f64,
    },
}

impl fmt::Display for CrossValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrossValidationReport::Classification { accuracy, .. } => {
                writeln!(f, "Cross Validation Accuracy = {accuracy}%")
            }
            CrossValidationReport::Regression {
                mean_squared_error,
                squared_correlation,
            } => {
                writeln!(f, "Cross Validation Mean squared error = {mean_squared_error}")?;
                writeln!(
                    f,
                    "Cross Validation Squared correlation coefficient = {squared_correlation}"
                )
            }
        }
    }
}

/// Run k-fold cross-validation through the backend and score it
pub fn cross_validate<B: SolverBackend>(
    backend: &B,
    problem: &Problem,
    param: &Parameter,
    nr_fold: usize,
) -> Result<CrossValidationReport> {
    info!("Running {nr_fold}-fold cross validation on {} samples", problem.len());
    let predictions = backend.cross_validate(problem, param, nr_fold)?;
    evaluate(param.svm_type, problem.labels(), &predictions)
}

/// Score predictions against labels for the given model family
pub fn evaluate(
    svm_type: SvmType,
    labels: &[f64],
    predictions: &[f64],
) -> Result<CrossValidationReport> {
    if labels.len() != predictions.len() {
        return Err(SVMError::DimensionMismatch {
            expected: labels.len(),
            actual: predictions.len(),
        });
    }

    if svm_type.is_regression() {
        Ok(regression_metrics(labels, predictions))
    } else {
        Ok(classification_accuracy(labels, predictions))
    }
}

/// 100 * (exact matches) / n
pub fn classification_accuracy(labels: &[f64], predictions: &[f64]) -> CrossValidationReport {
    let correct = predictions
        .iter()
        .zip(labels)
        .filter(|(pred, actual)| pred == actual)
        .count();
    let total = labels.len();

    CrossValidationReport::Classification {
        accuracy: 100.0 * correct as f64 / total as f64,
        correct,
        total,
    }
}

/// Mean squared error and squared correlation coefficient
///
/// r² = (nΣvy − ΣvΣy)² / ((nΣv² − (Σv)²)(nΣy² − (Σy)²)). A zero denominator
/// is not guarded and yields NaN or infinity.
pub fn regression_metrics(labels: &[f64], predictions: &[f64]) -> CrossValidationReport {
    let mut sums = RunningSums::default();
    for (&v, &y) in predictions.iter().zip(labels) {
        sums.add(v, y);
    }

    let n = sums.n;
    let numerator = n * sums.vy - sums.v * sums.y;
    let denominator = (n * sums.vv - sums.v * sums.v) * (n * sums.yy - sums.y * sums.y);

    CrossValidationReport::Regression {
        mean_squared_error: sums.squared_error / n,
        squared_correlation: (numerator * numerator) / denominator,
    }
}

#[derive(Debug, Default)]
struct RunningSums {
    n: f64,
    squared_error: f64,
    v: f64,
    y: f64,
    vv: f64,
    yy: f64,
    vy: f64,
}

impl RunningSums {
    fn add(&mut self, v: f64, y: f64) {
        self.n += 1.0;
        self.squared_error += (v - y) * (v - y);
        self.v += v;
        self.y += y;
        self.vv += v * v;
        self.yy += y * y;
        self.vy += v * y;
    }
}
