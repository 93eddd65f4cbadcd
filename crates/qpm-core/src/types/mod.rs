//! Core data types for qpm package management.
//!
//! - Versions and constraints
//! - Package names and resolved packages
//! - Dependency specifications and the lock set

pub mod constraint;
pub mod dependency;
pub mod lock;
pub mod package;
pub mod version;

pub use constraint::{satisfies, Constraint, ConstraintOp};
pub use dependency::DependencySpec;
pub use lock::LockSet;
pub use package::{source_locator, PackageName, PackageNameError, ResolvedPackage};
pub use version::{Version, VersionError};
