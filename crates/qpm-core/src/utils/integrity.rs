//! SHA-256 integrity strings (`sha256-<base64>`) for package artifacts.
//!
//! Files and readers are hashed in fixed 8 KiB chunks so large archives are
//! never held in memory. Verification compares the recomputed string against
//! the expected one byte for byte.

use crate::error::{QpmError, QpmResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Prefix of every integrity string
pub const INTEGRITY_PREFIX: &str = "sha256-";

/// Read size used when streaming
pub const CHUNK_SIZE: usize = 8192;

const DIGEST_LEN: usize = 32;

/// Incremental integrity computation for data that arrives in pieces
#[derive(Debug, Clone, Default)]
pub struct IntegrityHasher {
    hasher: Sha256,
}

impl IntegrityHasher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    /// Finish and format as an integrity string
    pub fn finish(self) -> String {
        format!("{}{}", INTEGRITY_PREFIX, STANDARD.encode(self.hasher.finalize()))
    }
}

/// Compute the integrity string of a byte slice
pub fn compute_integrity(data: &[u8]) -> String {
    let mut hasher = IntegrityHasher::new();
    hasher.update(data);
    hasher.finish()
}

/// Compute the integrity string of everything `reader` yields
pub fn compute_integrity_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = IntegrityHasher::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finish())
}

/// Compute the integrity string of a file
pub fn compute_file_integrity(path: &Path) -> QpmResult<String> {
    let file = File::open(path)
        .map_err(|e| QpmError::io(format!("Failed to open file: {}", path.display()), e))?;
    compute_integrity_reader(file)
        .map_err(|e| QpmError::io(format!("Failed to read file: {}", path.display()), e))
}

/// Verify data against an expected integrity string
pub fn verify_integrity(data: &[u8], expected: &str, subject: &str) -> QpmResult<()> {
    check(compute_integrity(data), expected, subject)
}

/// Verify a file against an expected integrity string
pub fn verify_file_integrity(path: &Path, expected: &str) -> QpmResult<()> {
    check(compute_file_integrity(path)?, expected, &path.display().to_string())
}

fn check(actual: String, expected: &str, subject: &str) -> QpmResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(QpmError::IntegrityMismatch {
            subject: subject.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

/// Check that a string is a well-formed SHA-256 integrity string
pub fn is_valid_integrity(integrity: &str) -> bool {
    integrity
        .strip_prefix(INTEGRITY_PREFIX)
        .and_then(|encoded| STANDARD.decode(encoded).ok())
        .map_or(false, |digest| digest.len() == DIGEST_LEN)
}
