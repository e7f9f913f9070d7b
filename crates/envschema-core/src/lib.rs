//! # envschema-core
//!
//! Shared vocabulary for the envschema workspace: the unified error type and
//! the immutable environment snapshot every resolution reads from.

pub mod env;
pub mod error;

pub use env::EnvSnapshot;
pub use error::{EnvschemaError, Result};
