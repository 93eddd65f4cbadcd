//! qpm benchmarking suite
//!
//! Benchmarks for resolution, integrity hashing and manifest/lock file
//! parsing, with shared fixtures in [`common`].

pub mod common;

pub use common::*;
