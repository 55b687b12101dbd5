//! Kernel functions for SVM

pub mod linear;
pub mod polynomial;
pub mod precomputed;
pub mod rbf;
pub mod sigmoid;
pub mod traits;

pub use self::linear::*;
pub use self::polynomial::*;
pub use self::precomputed::*;
pub use self::rbf::*;
pub use self::sigmoid::*;
pub use self::traits::*;

use crate::core::{KernelType, Parameter};

/// Build the kernel selected by a parameter set
pub fn from_parameter(param: &Parameter) -> Box<dyn Kernel> {
    match param.kernel_type {
        KernelType::Linear => Box::new(LinearKernel::new()),
        KernelType::Polynomial => Box::new(PolynomialKernel::new(
            param.degree,
            param.gamma,
            param.coef0,
        )),
        KernelType::Rbf => Box::new(RBFKernel::new(param.gamma)),
        KernelType::Sigmoid => Box::new(SigmoidKernel::new(param.gamma, param.coef0)),
        KernelType::Precomputed => Box::new(PrecomputedKernel),
    }
}
