use std::fmt;

use crate::model::package::Package;
use crate::plugin::error::InstallerError;
use crate::plugin::installer::PACKAGE_TYPE;
use crate::plugin::manager::InstallationManager;
use crate::plugin::sync::SyncManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageEventKind {
    PostPackageInstall,
    PrePackageUpdate,
    PostPackageUpdate,
    PrePackageUninstall,
}

impl PackageEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PostPackageInstall => "post-package-install",
            Self::PrePackageUpdate => "pre-package-update",
            Self::PostPackageUpdate => "post-package-update",
            Self::PrePackageUninstall => "pre-package-uninstall",
        }
    }
}

impl fmt::Display for PackageEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A lifecycle event dispatched by the host package manager.
#[derive(Debug, Clone, Copy)]
pub enum PackageEvent<'a> {
    PostPackageInstall(&'a Package),
    PrePackageUpdate {
        initial: &'a Package,
        target: &'a Package,
    },
    PostPackageUpdate {
        initial: &'a Package,
        target: &'a Package,
    },
    PrePackageUninstall(&'a Package),
}

impl PackageEvent<'_> {
    pub fn kind(&self) -> PackageEventKind {
        match self {
            Self::PostPackageInstall(_) => PackageEventKind::PostPackageInstall,
            Self::PrePackageUpdate { .. } => PackageEventKind::PrePackageUpdate,
            Self::PostPackageUpdate { .. } => PackageEventKind::PostPackageUpdate,
            Self::PrePackageUninstall(_) => PackageEventKind::PrePackageUninstall,
        }
    }
}

/// Entry file synchronization driven by lifecycle events instead of a
/// dedicated installer. Packages of other types are ignored.
#[derive(Clone)]
pub struct LifecycleHooks {
    sync: SyncManager,
}

impl LifecycleHooks {
    pub fn new(sync: SyncManager) -> Self {
        Self { sync }
    }

    /// Events this handler listens to, each with its priority.
    pub fn subscribed_events() -> [(PackageEventKind, i32); 4] {
        [
            (PackageEventKind::PostPackageInstall, 0),
            (PackageEventKind::PrePackageUpdate, 0),
            (PackageEventKind::PostPackageUpdate, 0),
            (PackageEventKind::PrePackageUninstall, 0),
        ]
    }

    /// Returns `Ok(false)` when the package was not ours to handle.
    pub fn handle(
        &self,
        manager: &InstallationManager,
        event: &PackageEvent<'_>,
    ) -> Result<bool, InstallerError> {
        tracing::debug!("dispatching {}", event.kind());

        match *event {
            PackageEvent::PostPackageInstall(package) => {
                self.on_post_package_install(manager, package)
            }
            PackageEvent::PrePackageUpdate { initial, .. } => {
                self.on_pre_package_update(manager, initial)
            }
            PackageEvent::PostPackageUpdate { target, .. } => {
                self.on_post_package_update(manager, target)
            }
            PackageEvent::PrePackageUninstall(package) => {
                self.on_pre_package_uninstall(manager, package)
            }
        }
    }

    pub fn on_post_package_install(
        &self,
        manager: &InstallationManager,
        package: &Package,
    ) -> Result<bool, InstallerError> {
        self.manage(manager, package, true)
    }

    pub fn on_pre_package_update(
        &self,
        manager: &InstallationManager,
        initial: &Package,
    ) -> Result<bool, InstallerError> {
        self.manage(manager, initial, false)
    }

    pub fn on_post_package_update(
        &self,
        manager: &InstallationManager,
        target: &Package,
    ) -> Result<bool, InstallerError> {
        self.manage(manager, target, true)
    }

    pub fn on_pre_package_uninstall(
        &self,
        manager: &InstallationManager,
        package: &Package,
    ) -> Result<bool, InstallerError> {
        self.manage(manager, package, false)
    }

    fn manage(
        &self,
        manager: &InstallationManager,
        package: &Package,
        install: bool,
    ) -> Result<bool, InstallerError> {
        if package.package_type != PACKAGE_TYPE {
            return Ok(false);
        }

        let install_dir = manager.install_path(package)?;
        if install {
            self.sync.install_entries(package, &install_dir)?;
        } else {
            self.sync.uninstall_entries(package, &install_dir)?;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::config::AppConfig;
    use crate::plugin::entry::{ENTRY_EXTRA_KEY, EntryResolver};
    use crate::plugin::io::NullIo;
    use crate::plugin::registrar::MustUsePlugins;
    use std::collections::HashSet;
    use std::fs;
    use std::rc::Rc;

    fn setup(web_root: &std::path::Path) -> (InstallationManager, LifecycleHooks) {
        let mut config = AppConfig::default();
        config.general.web_root = web_root.to_string_lossy().into_owned();

        let mut manager = InstallationManager::new();
        MustUsePlugins::activate(&mut manager, &config, Rc::new(NullIo));
        let hooks = LifecycleHooks::new(SyncManager::new(EntryResolver::default(), Rc::new(NullIo)));
        (manager, hooks)
    }

    #[test]
    fn subscribes_to_exactly_four_events() {
        let events: HashSet<_> = LifecycleHooks::subscribed_events()
            .into_iter()
            .map(|(kind, priority)| {
                assert_eq!(priority, 0);
                kind.as_str()
            })
            .collect();

        assert_eq!(events.len(), 4);
        assert!(events.contains("post-package-install"));
        assert!(events.contains("pre-package-update"));
        assert!(events.contains("post-package-update"));
        assert!(events.contains("pre-package-uninstall"));
    }

    #[test]
    fn other_package_types_are_skipped() {
        let root = tempfile::tempdir().unwrap();
        let (manager, hooks) = setup(root.path());
        let library = Package::new("acme/lib", "1.0.0", "library");

        for event in [
            PackageEvent::PostPackageInstall(&library),
            PackageEvent::PrePackageUninstall(&library),
        ] {
            assert!(!hooks.handle(&manager, &event).unwrap());
        }
    }

    #[test]
    fn hooks_drive_full_lifecycle() {
        let root = tempfile::tempdir().unwrap();
        let mu = root.path().join("mu-plugins");
        let (manager, hooks) = setup(root.path());

        let old_dir = mu.join("foo");
        fs::create_dir_all(&old_dir).unwrap();
        fs::write(old_dir.join("a.php"), "<?php\n// Plugin Name: A\n").unwrap();
        let new_dir = mu.join("foo-next");
        fs::create_dir_all(&new_dir).unwrap();
        fs::write(new_dir.join("b.php"), "<?php\n// Plugin Name: B\n").unwrap();

        let old = Package::new("acme/foo", "1.0.0", PACKAGE_TYPE)
            .with_extra(ENTRY_EXTRA_KEY, "a.php");
        let new = Package::new("acme/foo", "2.0.0", PACKAGE_TYPE)
            .with_extra("installer-name", "foo-next");

        assert!(hooks.handle(&manager, &PackageEvent::PostPackageInstall(&old)).unwrap());
        assert!(mu.join("a.php").is_file());

        let update = [
            PackageEvent::PrePackageUpdate {
                initial: &old,
                target: &new,
            },
            PackageEvent::PostPackageUpdate {
                initial: &old,
                target: &new,
            },
        ];
        for event in &update {
            assert!(hooks.handle(&manager, event).unwrap());
        }
        assert!(!mu.join("a.php").exists());
        assert!(mu.join("b.php").is_file());

        assert!(hooks.handle(&manager, &PackageEvent::PrePackageUninstall(&new)).unwrap());
        assert!(!mu.join("b.php").exists());
    }

    #[test]
    fn failed_removal_surfaces_error() {
        let root = tempfile::tempdir().unwrap();
        let (manager, hooks) = setup(root.path());
        let dir = root.path().join("mu-plugins/foo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("foo.php"), "<?php\n// Plugin Name: Foo\n").unwrap();
        let package = Package::new("acme/foo", "1.0.0", PACKAGE_TYPE);

        let err = hooks
            .on_pre_package_uninstall(&manager, &package)
            .unwrap_err();
        assert!(matches!(err, InstallerError::UnlinkFailure { .. }));
    }
}
