//! Polynomial Kernel Implementation
//!
//! K(x, y) = (γ * <x, y> + r)^d
//!
//! Where:
//! - γ (gamma): scaling factor for the dot product
//! - r (coef0): independent term in the polynomial
//! - d (degree): degree of the polynomial

use crate::kernel::linear::dot;
use crate::kernel::Kernel;

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone, Copy)]
pub struct PolynomialKernel {
    pub gamma: f64,
    pub coef0: f64,
    pub degree: i32,
}

impl PolynomialKernel {
    pub fn new(degree: i32, gamma: f64, coef0: f64) -> Self {
        Self {
            gamma,
            coef0,
            degree,
        }
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &[f64], y: &[f64]) -> f64 {
        (self.gamma * dot(x, y) + self.coef0).powi(self.degree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polynomial_quadratic() {
        let kernel = PolynomialKernel::new(2, 1.0, 1.0);
        // (1*(1*3 + 2*4) + 1)^2 = 12^2
        assert_eq!(kernel.compute(&[1.0, 2.0], &[3.0, 4.0]), 144.0);
    }

    #[test]
    fn test_polynomial_degree_zero() {
        let kernel = PolynomialKernel::new(0, 0.5, 3.0);
        assert_eq!(kernel.compute(&[1.0], &[7.0]), 1.0);
    }
}
