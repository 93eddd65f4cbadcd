//! Error types and result aliases for qpm operations.
//!
//! Every crate in the workspace reports failures through [`QpmError`]. Each
//! variant carries the structured fields (package, constraint, expected vs
//! actual values, available alternatives) needed to render a precise
//! diagnostic without re-running anything.

use thiserror::Error;

use crate::types::VersionError;

/// Unified error type for all qpm operations
#[derive(Error, Debug)]
pub enum QpmError {
    // Version and constraint errors
    #[error("Invalid version format: '{input}'")]
    InvalidVersionFormat {
        input: String,
        #[source]
        source: VersionError,
    },

    #[error("Invalid version constraint: '{constraint}'")]
    InvalidConstraintFormat {
        constraint: String,
        #[source]
        source: Option<VersionError>,
    },

    // Manifest errors
    #[error("Manifest must contain a non-empty '{field}' field")]
    ManifestMissingField { field: String },

    #[error("Invalid dependency '{package}: {constraint}': {reason}")]
    InvalidDependencySpec {
        package: String,
        constraint: String,
        reason: String,
    },

    #[error("Failed to parse {file}: {message} at line {line}, column {column}")]
    ManifestParse {
        file: String,
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Failed to parse JSON: {message}")]
    JsonParse { message: String },

    #[error("Configuration field '{field}' is invalid: {reason}")]
    ConfigValidation { field: String, reason: String },

    // Resolution errors
    #[error("Conflict: {package} requires version {constraint} but {existing} is already resolved")]
    ResolutionConflict {
        package: String,
        constraint: String,
        existing: String,
    },

    #[error("No versions found for package: {package}")]
    NoVersionsAvailable { package: String },

    #[error(
        "No version of {package} satisfies constraint {constraint} (available: {})",
        .available.join(", ")
    )]
    NoSatisfyingVersion {
        package: String,
        constraint: String,
        available: Vec<String>,
    },

    #[error("Failed to fetch package index for {package}")]
    ResolutionFailure {
        package: String,
        #[source]
        source: Box<QpmError>,
    },

    #[error("Dependency resolution was cancelled")]
    Cancelled,

    // Lock file errors
    #[error("Malformed lock file: {message}")]
    MalformedLockFile { message: String },

    // Integrity errors
    #[error("Integrity verification failed for {subject}: expected {expected}, got {actual}")]
    IntegrityMismatch {
        subject: String,
        expected: String,
        actual: String,
    },

    // Registry errors
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("Registry returned status {status}: {message}")]
    Registry {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Authentication required: {message}")]
    Authentication { message: String },

    // IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for qpm operations
pub type QpmResult<T> = Result<T, QpmError>;

impl QpmError {
    /// Create a network error from any error type
    pub fn network<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an IO error from std::io::Error
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Wrap a collaborator failure as a resolution failure for `package`
    pub fn resolution_failure(package: impl Into<String>, source: QpmError) -> Self {
        Self::ResolutionFailure {
            package: package.into(),
            source: Box::new(source),
        }
    }

    /// Check if this error is transient and worth retrying
    pub fn is_recoverable(&self) -> bool {
        match self {
            QpmError::Network { .. } | QpmError::Io { .. } => true,
            QpmError::Registry { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Get a user-friendly suggestion for fixing this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            QpmError::PackageNotFound { .. } => {
                Some("Check the package name spelling; names have the form scope/name")
            },
            QpmError::Network { .. } => Some("Check your internet connection and try again"),
            QpmError::ResolutionConflict { .. } => {
                Some("Align the constraints on this package so a single version satisfies all of them")
            },
            QpmError::NoSatisfyingVersion { .. } => {
                Some("Relax the version constraint or pick one of the available versions")
            },
            QpmError::ManifestMissingField { .. }
            | QpmError::InvalidDependencySpec { .. }
            | QpmError::ManifestParse { .. } => {
                Some("Fix qilletni_info.yml and run the command again")
            },
            QpmError::MalformedLockFile { .. } => {
                Some("Delete qilletni.lock and run 'qpm lock' to regenerate it")
            },
            QpmError::IntegrityMismatch { .. } => {
                Some("Run 'qpm install' to re-download the affected package")
            },
            QpmError::Authentication { .. } => {
                Some("Set QPM_TOKEN or add a token to ~/.qilletni/config.json")
            },
            _ => None,
        }
    }
}

impl From<VersionError> for QpmError {
    fn from(source: VersionError) -> Self {
        QpmError::InvalidVersionFormat {
            input: source.input().to_string(),
            source,
        }
    }
}
