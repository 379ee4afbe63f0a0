use std::collections::HashMap;

use crate::model::package::{Package, PackageId};

/// The host's record of installed packages.
pub trait InstalledRepository {
    fn has_package(&self, package: &Package) -> bool;
    fn add_package(&mut self, package: Package);
    fn remove_package(&mut self, package: &Package);
}

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    packages: HashMap<PackageId, Package>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

impl InstalledRepository for InMemoryRepository {
    fn has_package(&self, package: &Package) -> bool {
        self.packages
            .get(&package.id())
            .is_some_and(|installed| installed.version == package.version)
    }

    fn add_package(&mut self, package: Package) {
        self.packages.insert(package.id(), package);
    }

    fn remove_package(&mut self, package: &Package) {
        self.packages.remove(&package.id());
    }
}

/// For hosts that keep no package index: every package counts as recorded,
/// so presence is decided by its install directory alone.
#[derive(Debug, Default)]
pub struct UntrackedRepository;

impl InstalledRepository for UntrackedRepository {
    fn has_package(&self, _package: &Package) -> bool {
        true
    }

    fn add_package(&mut self, _package: Package) {}

    fn remove_package(&mut self, _package: &Package) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_tracks_name_and_version() {
        let mut repo = InMemoryRepository::new();
        let v1 = Package::new("acme/foo", "1.0.0", "wordpress-muplugin");
        let v2 = Package::new("acme/foo", "2.0.0", "wordpress-muplugin");

        assert!(!repo.has_package(&v1));
        repo.add_package(v1.clone());
        assert!(repo.has_package(&v1));
        assert!(!repo.has_package(&v2));

        repo.add_package(v2.clone());
        assert_eq!(repo.len(), 1);
        assert!(repo.has_package(&v2));

        repo.remove_package(&v2);
        assert!(repo.is_empty());
    }
}
