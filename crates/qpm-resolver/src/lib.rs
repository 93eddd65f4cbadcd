//! Dependency resolution for qpm
//!
//! Resolution walks the dependency graph breadth-first, querying a
//! [`VersionIndexProvider`](qpm_registry::VersionIndexProvider) once per
//! package and keeping a single version of each. The first constraint to
//! reach a package decides its version; later incompatible constraints are a
//! hard conflict.

pub mod resolve;
pub mod semver;

// Re-export main types
pub use resolve::{Resolution, ResolveOptions, Resolver};
pub use semver::{find_max_satisfying, Selection, VersionSelector};

use qpm_core::error::QpmError;

/// Result type for resolver operations
pub type ResolverResult<T> = Result<T, QpmError>;
