//! Unit tests for the breadth-first resolver

use super::*;

use std::sync::Arc;

use proptest::prelude::*;
use qpm_registry::InMemoryRegistry;

fn dep(name: &str, constraint: &str) -> DependencySpec {
    DependencySpec::parse(name, constraint).unwrap()
}

fn keys(resolution: &Resolution) -> Vec<String> {
    resolution.lock_set.keys().map(str::to_string).collect()
}

fn postgres_registry() -> InMemoryRegistry {
    let mut registry = InMemoryRegistry::new();
    registry
        .publish("alice/postgres", "1.0.0", &[])
        .unwrap()
        .publish("alice/postgres", "1.5.0", &[("alice/jsonutil", "~2.1.0")])
        .unwrap()
        .publish("alice/postgres", "2.0.0", &[("alice/jsonutil", "^2.2.0")])
        .unwrap()
        .publish("alice/jsonutil", "2.0.0", &[])
        .unwrap()
        .publish("alice/jsonutil", "2.1.0", &[])
        .unwrap()
        .publish("alice/jsonutil", "2.1.4", &[])
        .unwrap()
        .publish("alice/jsonutil", "2.2.0", &[])
        .unwrap();
    registry
}

#[tokio::test]
async fn test_resolves_transitive_dependencies() {
    let registry = postgres_registry();
    let resolver = Resolver::new(&registry);

    let resolution = resolver
        .resolve(vec![dep("@alice/postgres", "^1.0.0")])
        .await
        .unwrap();

    assert_eq!(
        keys(&resolution),
        vec!["alice/postgres@1.5.0", "alice/jsonutil@2.1.4"]
    );
    assert_eq!(resolution.root_count, 1);
    assert_eq!(resolution.fetch_count, 2);

    let postgres = resolution.lock_set.get("alice/postgres@1.5.0").unwrap();
    assert_eq!(postgres.source, "alice/postgres/1.5.0");
    assert_eq!(postgres.size, Some(b"qll archive alice/postgres@1.5.0".len() as u64));
    let dep = PackageName::parse("alice/jsonutil").unwrap();
    assert_eq!(postgres.dependencies[&dep], "~2.1.0");
    assert!(resolution.lock_set.is_closed());
}

#[tokio::test]
async fn test_resolve_manifest() {
    let registry = postgres_registry();
    let resolver = Resolver::new(&registry);
    let manifest = Manifest::new("alice/app", "0.1.0")
        .with_dependency(dep("alice/postgres", "^2.0.0"));

    let resolution = resolver.resolve_manifest(&manifest).await.unwrap();
    assert_eq!(
        keys(&resolution),
        vec!["alice/postgres@2.0.0", "alice/jsonutil@2.2.0"]
    );
}

#[tokio::test]
async fn test_empty_roots() {
    let registry = InMemoryRegistry::new();
    let resolution = Resolver::new(&registry).resolve(Vec::new()).await.unwrap();

    assert!(resolution.lock_set.is_empty());
    assert_eq!(resolution.fetch_count, 0);
    assert_eq!(registry.fetch_count(), 0);
}

#[tokio::test]
async fn test_conflict_is_detected_deterministically() {
    let mut registry = InMemoryRegistry::new();
    registry
        .publish("a/x", "1.0.0", &[])
        .unwrap()
        .publish("a/x", "2.0.0", &[])
        .unwrap();
    let resolver = Resolver::new(&registry);

    for _ in 0..3 {
        let err = resolver
            .resolve(vec![dep("a/x", "^1.0.0"), dep("a/x", "2.0.0")])
            .await
            .unwrap_err();
        match err {
            QpmError::ResolutionConflict {
                package,
                constraint,
                existing,
            } => {
                assert_eq!(package, "a/x");
                assert_eq!(constraint, "2.0.0");
                assert_eq!(existing, "1.0.0");
            },
            other => panic!("expected conflict, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_transitive_conflict() {
    let mut registry = InMemoryRegistry::new();
    registry
        .publish("a/app", "1.0.0", &[("a/lib", "^1.0.0"), ("a/other", "^1.0.0")])
        .unwrap()
        .publish("a/other", "1.0.0", &[("a/lib", "^2.0.0")])
        .unwrap()
        .publish("a/lib", "1.0.0", &[])
        .unwrap()
        .publish("a/lib", "2.0.0", &[])
        .unwrap();

    let err = Resolver::new(&registry)
        .resolve(vec![dep("a/app", "1.0.0")])
        .await
        .unwrap_err();
    assert!(matches!(err, QpmError::ResolutionConflict { ref package, .. } if package == "a/lib"));
}

#[tokio::test]
async fn test_compatible_duplicate_is_not_refetched() {
    let registry = postgres_registry();
    let resolver = Resolver::new(&registry);

    let resolution = resolver
        .resolve(vec![
            dep("alice/jsonutil", "~2.1.0"),
            dep("alice/jsonutil", "^2.0.0"),
        ])
        .await
        .unwrap();

    assert_eq!(keys(&resolution), vec!["alice/jsonutil@2.1.4"]);
    assert_eq!(resolution.fetch_count, 1);
    assert_eq!(registry.fetch_count(), 1);
}

#[tokio::test]
async fn test_diamond_resolves_shared_dependency_once() {
    let mut registry = InMemoryRegistry::new();
    registry
        .publish("d/top", "1.0.0", &[("d/left", "^1.0.0"), ("d/right", "^1.0.0")])
        .unwrap()
        .publish("d/left", "1.0.0", &[("d/base", "^1.2.0")])
        .unwrap()
        .publish("d/right", "1.0.0", &[("d/base", "~1.3.0")])
        .unwrap()
        .publish("d/base", "1.2.0", &[])
        .unwrap()
        .publish("d/base", "1.3.1", &[])
        .unwrap();

    let resolution = Resolver::new(&registry)
        .resolve(vec![dep("d/top", "^1.0.0")])
        .await
        .unwrap();

    assert_eq!(
        keys(&resolution),
        vec!["d/top@1.0.0", "d/left@1.0.0", "d/right@1.0.0", "d/base@1.3.1"]
    );
    assert_eq!(registry.fetch_count(), 4);
}

#[tokio::test]
async fn test_cycles_terminate() {
    let mut registry = InMemoryRegistry::new();
    registry
        .publish("c/x", "1.0.0", &[("c/y", "^1.0.0")])
        .unwrap()
        .publish("c/y", "1.0.0", &[("c/x", "^1.0.0")])
        .unwrap();

    let resolution = Resolver::new(&registry)
        .resolve(vec![dep("c/x", "^1.0.0")])
        .await
        .unwrap();
    assert_eq!(keys(&resolution), vec!["c/x@1.0.0", "c/y@1.0.0"]);
    assert!(resolution.lock_set.is_closed());
}

#[tokio::test]
async fn test_no_versions_available() {
    let mut registry = InMemoryRegistry::new();
    registry.publish_empty("a/ghost").unwrap();

    let err = Resolver::new(&registry)
        .resolve(vec![dep("a/ghost", "^1.0.0")])
        .await
        .unwrap_err();
    assert!(matches!(err, QpmError::NoVersionsAvailable { ref package } if package == "a/ghost"));
}

#[tokio::test]
async fn test_no_satisfying_version_lists_available() {
    let registry = postgres_registry();

    let err = Resolver::new(&registry)
        .resolve(vec![dep("alice/jsonutil", "^3.0.0")])
        .await
        .unwrap_err();
    match err {
        QpmError::NoSatisfyingVersion {
            package,
            constraint,
            available,
        } => {
            assert_eq!(package, "alice/jsonutil");
            assert_eq!(constraint, "^3.0.0");
            assert_eq!(available, vec!["2.0.0", "2.1.0", "2.1.4", "2.2.0"]);
        },
        other => panic!("expected NoSatisfyingVersion, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unknown_package_is_a_resolution_failure() {
    let registry = InMemoryRegistry::new();

    let err = Resolver::new(&registry)
        .resolve(vec![dep("a/missing", "1.0.0")])
        .await
        .unwrap_err();
    match err {
        QpmError::ResolutionFailure { package, source } => {
            assert_eq!(package, "a/missing");
            assert!(matches!(*source, QpmError::PackageNotFound { .. }));
        },
        other => panic!("expected ResolutionFailure, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_dependency_in_index() {
    let mut registry = InMemoryRegistry::new();
    registry
        .publish("a/app", "1.0.0", &[("not-scoped", "^1.0.0")])
        .unwrap();

    let err = Resolver::new(&registry)
        .resolve(vec![dep("a/app", "1.0.0")])
        .await
        .unwrap_err();
    assert!(matches!(err, QpmError::InvalidDependencySpec { ref package, .. } if package == "not-scoped"));
}

#[tokio::test]
async fn test_bad_version_in_index() {
    let mut registry = InMemoryRegistry::new();
    registry
        .publish("a/app", "1.0.0", &[])
        .unwrap()
        .publish("a/app", "one.two", &[])
        .unwrap();

    let err = Resolver::new(&registry)
        .resolve(vec![dep("a/app", "^1.0.0")])
        .await
        .unwrap_err();
    assert!(matches!(err, QpmError::InvalidVersionFormat { .. }));
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let registry = postgres_registry();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = Resolver::new(&registry)
        .resolve_with_cancel(vec![dep("alice/postgres", "^1.0.0")], &cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, QpmError::Cancelled));
    assert_eq!(registry.fetch_count(), 0);
}

#[tokio::test]
async fn test_cancelled_during_fetch() {
    let registry = Arc::new(postgres_registry().with_latency(Duration::from_secs(30)));
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let err = Resolver::new(Arc::clone(&registry))
        .resolve_with_cancel(vec![dep("alice/postgres", "^1.0.0")], &cancel)
        .await
        .unwrap_err();

    assert!(matches!(err, QpmError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(10));
}

#[tokio::test]
async fn test_fetch_timeout() {
    let registry = postgres_registry().with_latency(Duration::from_secs(30));
    let resolver = Resolver::with_options(
        &registry,
        ResolveOptions {
            fetch_timeout: Duration::from_millis(20),
        },
    );

    let err = resolver
        .resolve(vec![dep("alice/postgres", "^1.0.0")])
        .await
        .unwrap_err();
    match err {
        QpmError::ResolutionFailure { package, source } => {
            assert_eq!(package, "alice/postgres");
            assert!(matches!(*source, QpmError::Network { .. }));
        },
        other => panic!("expected ResolutionFailure, got {other:?}"),
    }
}

/// A small registry where package `i` only depends on packages after it
fn arb_registry() -> impl Strategy<Value = Vec<Vec<((u64, u64, u64), Vec<(usize, u64)>)>>> {
    let version = (0u64..3, 0u64..3, 0u64..3);
    let deps = prop::collection::vec((0usize..4, 0u64..3), 0..3);
    prop::collection::vec(prop::collection::vec((version, deps), 1..4), 1..5)
}

fn package_name(i: usize) -> String {
    format!("prop/pkg{i}")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_resolution_is_single_version_and_consistent(
        packages in arb_registry(),
        root_major in 0u64..3,
    ) {
        let count = packages.len();
        let mut registry = InMemoryRegistry::new();
        for (i, versions) in packages.iter().enumerate() {
            for ((major, minor, patch), deps) in versions {
                let deps: Vec<(String, String)> = deps
                    .iter()
                    .filter(|(target, _)| *target > i && *target < count)
                    .map(|(target, m)| (package_name(*target), format!("^{m}.0.0")))
                    .collect();
                let deps: Vec<(&str, &str)> = deps
                    .iter()
                    .map(|(n, c)| (n.as_str(), c.as_str()))
                    .collect();
                registry
                    .publish(&package_name(i), &format!("{major}.{minor}.{patch}"), &deps)
                    .unwrap();
            }
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let root = dep(&package_name(0), &format!("^{root_major}.0.0"));
        let result = runtime.block_on(Resolver::new(&registry).resolve(vec![root.clone()]));

        if let Ok(resolution) = result {
            let lock = &resolution.lock_set;
            prop_assert!(lock.is_closed());

            let mut names: Vec<_> = lock.iter().map(|p| p.name.to_string()).collect();
            names.sort();
            names.dedup();
            prop_assert_eq!(names.len(), lock.len());

            let root_pkg = lock.get_by_name(&root.name).unwrap();
            prop_assert!(root.parsed_constraint().unwrap().matches(&root_pkg.version));

            for package in lock {
                for (dep, constraint) in &package.dependencies {
                    let resolved = lock.get_by_name(dep).unwrap();
                    let constraint = Constraint::parse(constraint).unwrap();
                    prop_assert!(constraint.matches(&resolved.version));
                }
            }
        }
    }
}
