//! The lock set: resolved packages keyed by `name@version`, in resolution order.

use super::{PackageName, ResolvedPackage};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Insertion-ordered set of resolved packages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSet {
    entries: IndexMap<String, ResolvedPackage>,
    by_name: HashMap<PackageName, String>,
}

impl LockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a package under its key, returning any entry it replaced
    pub fn insert(&mut self, package: ResolvedPackage) -> Option<ResolvedPackage> {
        let key = package.key();
        self.by_name.insert(package.name.clone(), key.clone());
        self.entries.insert(key, package)
    }

    /// Look up an entry by `name@version`
    pub fn get(&self, key: &str) -> Option<&ResolvedPackage> {
        self.entries.get(key)
    }

    /// Look up the entry resolved for a package name
    pub fn get_by_name(&self, name: &PackageName) -> Option<&ResolvedPackage> {
        self.by_name.get(name).and_then(|key| self.entries.get(key))
    }

    pub fn contains_name(&self, name: &PackageName) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in resolution order
    pub fn iter(&self) -> impl Iterator<Item = &ResolvedPackage> {
        self.entries.values()
    }

    /// Keys in resolution order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Dependency edges that point outside the set, as `(dependent key, missing name)`
    pub fn missing_dependencies(&self) -> Vec<(String, PackageName)> {
        self.entries
            .iter()
            .flat_map(|(key, pkg)| {
                pkg.dependencies
                    .keys()
                    .filter(|dep| !self.contains_name(dep))
                    .map(move |dep| (key.clone(), dep.clone()))
            })
            .collect()
    }

    /// Every dependency of every entry is itself present
    pub fn is_closed(&self) -> bool {
        self.missing_dependencies().is_empty()
    }
}

impl<'a> IntoIterator for &'a LockSet {
    type Item = &'a ResolvedPackage;
    type IntoIter = indexmap::map::Values<'a, String, ResolvedPackage>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl FromIterator<ResolvedPackage> for LockSet {
    fn from_iter<I: IntoIterator<Item = ResolvedPackage>>(iter: I) -> Self {
        let mut set = LockSet::new();
        for package in iter {
            set.insert(package);
        }
        set
    }
}
