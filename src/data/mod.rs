//! Dataset loading
//!
//! Turns a delimited text file into an in-memory [`Problem`](crate::core::Problem).

pub mod delimited;

pub use self::delimited::*;
