//! Common utilities for benchmarks

use criterion::Criterion;
use pprof::criterion::{Output, PProfProfiler};
use qpm_core::types::{DependencySpec, LockSet, PackageName, ResolvedPackage, Version};
use qpm_core::utils::compute_integrity;
use qpm_registry::InMemoryRegistry;

/// Configure criterion with flamegraph profiling support
pub fn criterion_config() -> Criterion {
    Criterion::default()
        .warm_up_time(std::time::Duration::from_secs(2))
        .measurement_time(std::time::Duration::from_secs(5))
        .sample_size(50)
        .with_profiler(PProfProfiler::new(100, Output::Flamegraph(None)))
}

fn layer_name(layer: usize, index: usize) -> String {
    format!("bench/l{}-p{}", layer, index)
}

/// Registry with `layers` rows of `width` packages
///
/// Every package in a row depends on every package in the next row, so the
/// resolver sees many compatible duplicate constraints. Each package offers
/// `versions` minor versions of major 1.
pub fn layered_registry(
    layers: usize,
    width: usize,
    versions: usize,
) -> (InMemoryRegistry, Vec<DependencySpec>) {
    let mut registry = InMemoryRegistry::new();

    for layer in 0..layers {
        let next: Vec<(String, String)> = if layer + 1 < layers {
            (0..width)
                .map(|i| (layer_name(layer + 1, i), "^1.0.0".to_string()))
                .collect()
        } else {
            Vec::new()
        };
        let deps: Vec<(&str, &str)> = next
            .iter()
            .map(|(name, constraint)| (name.as_str(), constraint.as_str()))
            .collect();

        for index in 0..width {
            for minor in 0..versions {
                registry
                    .publish(&layer_name(layer, index), &format!("1.{}.0", minor), &deps)
                    .expect("fixture names are valid");
            }
        }
    }

    let roots = (0..width)
        .map(|i| DependencySpec::parse(&layer_name(0, i), "^1.0.0").expect("valid root"))
        .collect();
    (registry, roots)
}

/// `count` version strings spread over a few majors and minors
pub fn version_list(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| format!("{}.{}.{}", i % 3, (i / 3) % 10, i / 30))
        .collect()
}

/// Lock set of `count` packages, each depending on the previous one
pub fn chained_lock_set(count: usize) -> LockSet {
    (0..count)
        .map(|i| {
            let name = PackageName::parse(&format!("bench/pkg{}", i)).expect("valid name");
            let version = Version::new(1, i as u64, 0);
            let mut package = ResolvedPackage::new(
                name,
                version,
                compute_integrity(format!("archive {}", i).as_bytes()),
            );
            package.size = Some(1024 + i as u64);
            if i > 0 {
                let dep = PackageName::parse(&format!("bench/pkg{}", i - 1)).expect("valid name");
                package.dependencies.insert(dep, format!("^1.{}.0", i - 1));
            }
            package
        })
        .collect()
}

/// Manifest text with `count` dependencies
pub fn manifest_content(count: usize) -> String {
    let mut content = String::from("name: bench/app\nversion: 1.0.0\ndependencies:\n");
    for i in 0..count {
        content.push_str(&format!("  bench/dep{}: ^{}.{}.0\n", i, i % 4, i % 7));
    }
    content
}

/// Deterministic pseudo-random test content
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i.wrapping_mul(31) % 251) as u8).collect()
}
