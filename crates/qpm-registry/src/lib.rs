//! qpm registry client
//!
//! This crate provides the HTTP client for the qpm registry (version indexes,
//! archive upload and download, deletion, listing) with connection pooling
//! and retry logic, the [`VersionIndexProvider`] abstraction the resolver
//! queries, and a deterministic in-memory registry.

pub mod api;
pub mod client;
pub mod memory;
pub mod provider;

// Re-export main types
pub use api::{
    DeleteResponse, DownloadSummary, ErrorResponse, PackageListResponse, PackageMetadata,
    PackageSummary, UploadResponse, VersionIndex, VersionIndexEntry,
};
pub use client::{RegistryClient, RetryConfig};
pub use memory::InMemoryRegistry;
pub use provider::VersionIndexProvider;

use qpm_core::error::QpmError;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, QpmError>;
