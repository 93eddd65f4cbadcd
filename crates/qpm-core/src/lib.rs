//! # qpm-core
//!
//! Core types and utilities shared across all qpm crates.
//!
//! This crate provides:
//! - `Version` and `Constraint` with exact, caret and tilde matching
//! - `PackageName`, `DependencySpec`, `ResolvedPackage` and the ordered `LockSet`
//! - `QpmError` for unified error handling
//! - SHA-256 integrity computation and verification
//!
//! ## Architecture
//!
//! - `types`: core data types
//! - `error`: error types and result aliases
//! - `utils`: integrity helpers

pub mod error;
pub mod types;
pub mod utils;

pub use error::{QpmError, QpmResult};
pub use types::{
    Constraint, ConstraintOp, DependencySpec, LockSet, PackageName, ResolvedPackage, Version,
    VersionError,
};
