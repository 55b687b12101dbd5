//! Command-line driver for training Support Vector Machines
//!
//! Parses libsvm-style training options, loads a delimited dataset, then
//! either trains and saves a model or runs k-fold cross-validation. The
//! numerical work sits behind the [`SolverBackend`] trait; [`SmoBackend`]
//! is the bundled implementation.

pub mod backend;
pub mod cache;
pub mod config;
pub mod core;
pub mod data;
pub mod evaluation;
pub mod kernel;
pub mod model;
pub mod persistence;
pub mod pipeline;
pub mod solver;

// Re-export main types for convenience
pub use crate::backend::SmoBackend;
pub use crate::cache::{CacheStats, KernelCache};
pub use crate::config::{TrainOption, TrainingOptions};
pub use crate::core::error::*;
pub use crate::core::param::*;
pub use crate::core::traits::*;
pub use crate::core::types::*;
pub use crate::data::DelimitedReader;
pub use crate::evaluation::CrossValidationReport;
pub use crate::kernel::Kernel;
pub use crate::model::SvmModel;
pub use crate::pipeline::{PipelineOutcome, PipelineState, TrainingPipeline};

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
