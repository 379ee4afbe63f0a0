use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::model::package::Package;
use crate::plugin::entry::{EntryFileLocation, EntryResolver};
use crate::plugin::error::InstallerError;
use crate::plugin::filesystem::Filesystem;
use crate::plugin::io::Io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    Copy,
    Unlink,
}

/// Result of synchronizing one entry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub action: SyncAction,
    pub location: EntryFileLocation,
    pub succeeded: bool,
}

impl SyncOutcome {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.succeeded { "OK" } else { "FAILED" };
        match self.action {
            SyncAction::Copy => write!(
                f,
                "    Copying {} to {} - {status}",
                self.location.source.display(),
                self.location.destination.display()
            ),
            SyncAction::Unlink => write!(
                f,
                "    Removing {} - {status}",
                self.location.destination.display()
            ),
        }
    }
}

/// Copies and removes must-use entry files for a package.
///
/// Entries are resolved fresh on every call. A failure stops the operation
/// at that entry; files already copied or removed stay as they are.
#[derive(Clone)]
pub struct SyncManager {
    filesystem: Filesystem,
    resolver: EntryResolver,
    io: Rc<dyn Io>,
}

impl SyncManager {
    pub fn new(resolver: EntryResolver, io: Rc<dyn Io>) -> Self {
        Self {
            filesystem: Filesystem,
            resolver,
            io,
        }
    }

    pub fn entries(&self, package: &Package, install_dir: &Path) -> Vec<EntryFileLocation> {
        self.resolver.resolve(package, install_dir)
    }

    pub fn install_entries(
        &self,
        package: &Package,
        install_dir: &Path,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        let mut outcomes = Vec::new();

        for location in self.entries(package, install_dir) {
            let copied = self
                .filesystem
                .copy_file(&location.source, &location.destination);
            let outcome = self.report(SyncAction::Copy, location, copied);

            if !copied {
                return Err(InstallerError::CopyFailure {
                    entry: outcome.location.source,
                    destination: outcome.location.destination,
                });
            }

            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    pub fn uninstall_entries(
        &self,
        package: &Package,
        install_dir: &Path,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        let mut outcomes = Vec::new();

        for location in self.entries(package, install_dir) {
            let unlinked = self.filesystem.unlink_file(&location.destination);
            let outcome = self.report(SyncAction::Unlink, location, unlinked);

            if !unlinked {
                return Err(InstallerError::UnlinkFailure {
                    destination: outcome.location.destination,
                });
            }

            outcomes.push(outcome);
        }

        Ok(outcomes)
    }

    /// Remove the initial package's entries, then copy the target's.
    /// A failed removal aborts before anything is copied.
    pub fn update_entries(
        &self,
        initial: &Package,
        initial_dir: &Path,
        target: &Package,
        target_dir: &Path,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        let mut outcomes = self.uninstall_entries(initial, initial_dir)?;
        outcomes.extend(self.install_entries(target, target_dir)?);
        Ok(outcomes)
    }

    /// Whether every resolved entry destination exists right now.
    pub fn entries_present(&self, package: &Package, install_dir: &Path) -> bool {
        self.entries(package, install_dir)
            .iter()
            .all(|location| self.filesystem.exists(&location.destination))
    }

    fn report(&self, action: SyncAction, location: EntryFileLocation, succeeded: bool) -> SyncOutcome {
        let outcome = SyncOutcome {
            action,
            location,
            succeeded,
        };

        if succeeded {
            tracing::info!("{}", outcome.message().trim_start());
        } else {
            tracing::warn!("{}", outcome.message().trim_start());
        }
        self.io.notice(&outcome.message());

        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::entry::ENTRY_EXTRA_KEY;
    use crate::plugin::io::BufferedIo;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn header(name: &str) -> String {
        format!("<?php\n/*\n * Plugin Name: {name}\n */\n")
    }

    fn setup() -> (TempDir, PathBuf, Rc<BufferedIo>, SyncManager) {
        let root = tempfile::tempdir().unwrap();
        let install_dir = root.path().join("mu-plugins/foo");
        fs::create_dir_all(&install_dir).unwrap();
        let io = Rc::new(BufferedIo::default());
        let sync = SyncManager::new(EntryResolver::default(), io.clone());
        (root, install_dir, io, sync)
    }

    fn muplugin() -> Package {
        Package::new("acme/foo", "1.0.0", "wordpress-muplugin")
    }

    #[test]
    fn install_then_uninstall_round_trip() {
        let (_root, dir, io, sync) = setup();
        fs::write(dir.join("foo.php"), header("Foo")).unwrap();
        let dest = dir.parent().unwrap().join("foo.php");

        let installed = sync.install_entries(&muplugin(), &dir).unwrap();
        assert_eq!(installed.len(), 1);
        assert!(dest.is_file());
        assert!(sync.entries_present(&muplugin(), &dir));

        let removed = sync.uninstall_entries(&muplugin(), &dir).unwrap();
        assert_eq!(removed[0].action, SyncAction::Unlink);
        assert!(!dest.exists());
        assert!(!sync.entries_present(&muplugin(), &dir));

        let lines = io.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("Copying") && lines[0].ends_with("OK"));
        assert!(lines[1].contains("Removing") && lines[1].ends_with("OK"));
    }

    #[test]
    fn install_stops_at_first_failed_copy() {
        let (_root, dir, io, _sync) = setup();
        fs::write(dir.join("a.php"), header("A")).unwrap();

        let package = muplugin().with_extra(
            ENTRY_EXTRA_KEY,
            toml::Value::Array(vec!["a.php".into(), "missing.php".into()]),
        );
        let trusting = SyncManager::new(EntryResolver::new(true), io.clone());

        let err = trusting.install_entries(&package, &dir).unwrap_err();
        match err {
            InstallerError::CopyFailure { entry, destination } => {
                assert_eq!(entry, dir.join("missing.php"));
                assert_eq!(destination, dir.parent().unwrap().join("missing.php"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // no rollback of earlier copies
        assert!(dir.parent().unwrap().join("a.php").is_file());
        assert!(io.lines().last().unwrap().ends_with("FAILED"));
    }

    #[test]
    fn uninstall_of_missing_destination_fails() {
        let (_root, dir, _io, sync) = setup();
        fs::write(dir.join("foo.php"), header("Foo")).unwrap();

        let err = sync.uninstall_entries(&muplugin(), &dir).unwrap_err();
        assert!(matches!(err, InstallerError::UnlinkFailure { .. }));
        assert!(err.to_string().contains("foo.php"));
    }

    #[test]
    fn update_swaps_entry_files() {
        let (root, old_dir, _io, sync) = setup();
        fs::write(old_dir.join("a.php"), header("A")).unwrap();
        let new_dir = root.path().join("mu-plugins/bar");
        fs::create_dir_all(&new_dir).unwrap();
        fs::write(new_dir.join("b.php"), header("B")).unwrap();

        let old = muplugin();
        let new = Package::new("acme/bar", "2.0.0", "wordpress-muplugin");
        sync.install_entries(&old, &old_dir).unwrap();

        sync.update_entries(&old, &old_dir, &new, &new_dir).unwrap();

        let mu = root.path().join("mu-plugins");
        assert!(!mu.join("a.php").exists());
        assert!(mu.join("b.php").is_file());
    }

    #[test]
    fn update_aborts_when_removal_fails() {
        let (root, old_dir, _io, sync) = setup();
        fs::write(old_dir.join("a.php"), header("A")).unwrap();
        let new_dir = root.path().join("mu-plugins/bar");
        fs::create_dir_all(&new_dir).unwrap();
        fs::write(new_dir.join("b.php"), header("B")).unwrap();

        let old = muplugin();
        let new = Package::new("acme/bar", "2.0.0", "wordpress-muplugin");

        let err = sync.update_entries(&old, &old_dir, &new, &new_dir).unwrap_err();
        assert!(matches!(err, InstallerError::UnlinkFailure { .. }));
        assert!(!root.path().join("mu-plugins/b.php").exists());
    }

    #[test]
    fn no_entries_is_a_noop() {
        let (_root, dir, io, sync) = setup();
        fs::write(dir.join("readme.txt"), "nothing here").unwrap();

        assert!(sync.install_entries(&muplugin(), &dir).unwrap().is_empty());
        assert!(sync.entries_present(&muplugin(), &dir));
        assert!(io.lines().is_empty());
    }

    #[test]
    fn uninstall_after_sources_are_gone() {
        // Trusted declarations are removed by name; revalidated ones resolve to
        // nothing once the sources are gone, leaving the copies orphaned.
        for (trust, removed) in [(true, true), (false, false)] {
            let (root, install_dir, _io, _) = setup();
            let sync = SyncManager::new(EntryResolver::new(trust), Rc::new(BufferedIo::default()));
            fs::write(install_dir.join("foo.php"), header("Foo")).unwrap();
            let package = muplugin().with_extra(ENTRY_EXTRA_KEY, "foo.php");
            let dest = root.path().join("mu-plugins/foo.php");

            sync.install_entries(&package, &install_dir).unwrap();
            assert!(dest.is_file());

            fs::remove_dir_all(&install_dir).unwrap();
            let outcomes = sync.uninstall_entries(&package, &install_dir).unwrap();

            assert_eq!(outcomes.len(), usize::from(removed), "trust={trust}");
            assert_eq!(dest.exists(), !removed, "trust={trust}");
        }
    }
}
