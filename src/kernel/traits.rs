//! Kernel trait definition

/// Kernel function trait
///
/// Operates on dense feature rows. Rows of different length are compared as
/// if the shorter one were padded with zeros.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &[f64], y: &[f64]) -> f64;
}
