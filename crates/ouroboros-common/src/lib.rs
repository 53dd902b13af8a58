//! Common utilities for ouroboros
//!
//! This crate provides the error type shared by the ouroboros data-access crates.

pub mod error;

pub use error::{DataAccessError, ExecutionErrorKind, Result};
