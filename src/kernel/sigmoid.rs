//! Sigmoid (Tanh) Kernel Implementation
//!
//! K(x, y) = tanh(γ * <x, y> + r)
//!
//! The kernel is not positive semi-definite for every (γ, r), so the solver
//! must cope with non-positive curvature.

use crate::kernel::linear::dot;
use crate::kernel::Kernel;

/// Sigmoid (Hyperbolic Tangent) kernel
#[derive(Debug, Clone, Copy)]
pub struct SigmoidKernel {
    pub gamma: f64,
    pub coef0: f64,
}

impl SigmoidKernel {
    pub fn new(gamma: f64, coef0: f64) -> Self {
        Self { gamma, coef0 }
    }
}

impl Kernel for SigmoidKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (self.gamma * dot(x, y) + self.coef0).tanh()
    }
}
