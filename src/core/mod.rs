//! Core types and traits for the training driver

pub mod error;
pub mod param;
pub mod traits;
pub mod types;

pub use self::error::*;
pub use self::param::*;
pub use self::traits::*;
pub use self::types::*;
