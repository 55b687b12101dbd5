//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)
//! where γ (gamma) is a hyperparameter that controls the kernel width.

use crate::kernel::Kernel;

/// RBF (Radial Basis Function) kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// The gamma parameter controls the "reach" of each training example:
/// - High gamma: close points have high influence (potential overfitting)
/// - Low gamma: distant points have influence (potential underfitting)
#[derive(Debug, Clone, Copy)]
pub struct RBFKernel {
    gamma: f64,
}

impl RBFKernel {
    pub fn new(gamma: f64) -> Self {
        Self { gamma }
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (-self.gamma * squared_distance(x, y)).exp()
    }
}

/// Squared Euclidean distance between two dense rows
///
/// The tail of the longer row is compared against implicit zeros.
pub fn squared_distance(x: &[f64], y: &[f64]) -> f64 {
    let common = x.len().min(y.len());
    let overlap: f64 = x[..common]
        .iter()
        .zip(&y[..common])
        .map(|(a, b)| (a - b) * (a - b))
        .sum();
    let tail: f64 = x[common..]
        .iter()
        .chain(&y[common..])
        .map(|v| v * v)
        .sum();
    overlap + tail
}
