//! Local package store for qpm
//!
//! Installed archives live at `<root>/@scope/name/<version>.qll`. Writes are
//! staged in a temporary file next to their destination and only persisted
//! once the content matches the locked integrity string.

pub mod store;

// Re-export main types
pub use store::{PackageStatus, PackageStore, StagedArtifact, VerifyReport, ARTIFACT_EXTENSION};

use qpm_core::error::QpmError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, QpmError>;
