//! SVM solver implementations
//!
//! Decomposition solver for the dual problems of all supported SVM types,
//! working on kernel columns served through an LRU cache.

pub mod formulations;
pub mod qmatrix;
pub mod smo;

pub use self::formulations::*;
pub use self::qmatrix::*;
pub use self::smo::*;
