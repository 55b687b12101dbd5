//! Hyperparameters for a single training run

use crate::core::ConfigError;
use serde::{Deserialize, Serialize};

/// Model family trained by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SvmType {
    /// C-SVC (multi-class classification)
    CSvc,
    /// nu-SVC (multi-class classification)
    NuSvc,
    /// One-class SVM (distribution estimation)
    OneClass,
    /// epsilon-SVR (regression)
    EpsilonSvr,
    /// nu-SVR (regression)
    NuSvr,
}

impl SvmType {
    /// Map the numeric `-s` code to a model family
    pub fn from_code(code: i32) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(SvmType::CSvc),
            1 => Ok(SvmType::NuSvc),
            2 => Ok(SvmType::OneClass),
            3 => Ok(SvmType::EpsilonSvr),
            4 => Ok(SvmType::NuSvr),
            other => Err(ConfigError::UnknownSvmType(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            SvmType::CSvc => 0,
            SvmType::NuSvc => 1,
            SvmType::OneClass => 2,
            SvmType::EpsilonSvr => 3,
            SvmType::NuSvr => 4,
        }
    }

    /// True for epsilon-SVR and nu-SVR
    pub fn is_regression(self) -> bool {
        matches!(self, SvmType::EpsilonSvr | SvmType::NuSvr)
    }

    /// True for C-SVC and nu-SVC
    pub fn is_classification(self) -> bool {
        matches!(self, SvmType::CSvc | SvmType::NuSvc)
    }
}

/// Kernel family used by the solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelType {
    /// u'*v
    Linear,
    /// (gamma*u'*v + coef0)^degree
    Polynomial,
    /// exp(-gamma*|u-v|^2)
    Rbf,
    /// tanh(gamma*u'*v + coef0)
    Sigmoid,
    /// Kernel values supplied in the training set file
    Precomputed,
}

impl KernelType {
    /// Map the numeric `-t` code to a kernel family
    pub fn from_code(code: i32) -> Result<Self, ConfigError> {
        match code {
            0 => Ok(KernelType::Linear),
            1 => Ok(KernelType::Polynomial),
            2 => Ok(KernelType::Rbf),
            3 => Ok(KernelType::Sigmoid),
            4 => Ok(KernelType::Precomputed),
            other => Err(ConfigError::UnknownKernelType(other)),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            KernelType::Linear => 0,
            KernelType::Polynomial => 1,
            KernelType::Rbf => 2,
            KernelType::Sigmoid => 3,
            KernelType::Precomputed => 4,
        }
    }

    /// Whether gamma participates in this kernel
    pub fn uses_gamma(self) -> bool {
        matches!(
            self,
            KernelType::Polynomial | KernelType::Rbf | KernelType::Sigmoid
        )
    }
}

/// Per-class cost multiplier: C of class `label` becomes `weight * C`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeight {
    pub label: i32,
    pub weight: f64,
}

/// The hyperparameter set handed to the solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub svm_type: SvmType,
    pub kernel_type: KernelType,
    pub degree: i32,
    /// 0 means "derive from the data" until resolved
    pub gamma: f64,
    pub coef0: f64,
    /// Kernel cache size in MB
    pub cache_size: f64,
    /// Tolerance of the termination criterion
    pub eps: f64,
    pub c: f64,
    pub nu: f64,
    /// Epsilon in the loss function of epsilon-SVR
    pub p: f64,
    pub shrinking: bool,
    pub probability: bool,
    /// Append-only, in command-line order
    pub weights: Vec<ClassWeight>,
}

impl Default for Parameter {
    fn default() -> Self {
        Self {
            svm_type: SvmType::CSvc,
            kernel_type: KernelType::Rbf,
            degree: 3,
            gamma: 0.0,
            coef0: 0.0,
            cache_size: 100.0,
            eps: 1e-3,
            c: 1.0,
            nu: 0.5,
            p: 0.1,
            shrinking: true,
            probability: false,
            weights: Vec::new(),
        }
    }
}

impl Parameter {
    /// Resolve the sentinel gamma of 0 to `1 / sample_count`
    ///
    /// An explicit gamma, or an empty dataset, leaves the value untouched.
    pub fn with_default_gamma(self, sample_count: usize) -> Self {
        if self.gamma == 0.0 && sample_count > 0 {
            Self {
                gamma: 1.0 / sample_count as f64,
                ..self
            }
        } else {
            self
        }
    }

    /// Class ids of the weight entries, in insertion order
    pub fn weight_labels(&self) -> Vec<i32> {
        self.weights.iter().map(|w| w.label).collect()
    }

    /// Weight values, parallel to [`Parameter::weight_labels`]
    pub fn weight_values(&self) -> Vec<f64> {
        self.weights.iter().map(|w| w.weight).collect()
    }
}
