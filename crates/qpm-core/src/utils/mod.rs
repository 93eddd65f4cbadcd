//! Utility functions shared across qpm crates.

pub mod integrity;

pub use integrity::{
    compute_file_integrity, compute_integrity, compute_integrity_reader, is_valid_integrity,
    verify_file_integrity, verify_integrity, IntegrityHasher,
};
