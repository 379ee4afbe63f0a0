use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use crate::model::config::AppConfig;
use crate::model::package::Package;
use crate::plugin::entry::EntryResolver;
use crate::plugin::error::InstallerError;
use crate::plugin::files::PackageFiles;
use crate::plugin::filesystem::Filesystem;
use crate::plugin::io::Io;
use crate::plugin::repository::InstalledRepository;
use crate::plugin::sync::{SyncManager, SyncOutcome};

/// Package type handled by [`MustUsePluginInstaller`].
pub const PACKAGE_TYPE: &str = "wordpress-muplugin";

/// Package metadata key overriding the install directory name.
pub const INSTALLER_NAME_KEY: &str = "installer-name";

/// An installer the host selects by package type.
pub trait Installer {
    fn supports(&self, package_type: &str) -> bool;

    fn install_path(&self, package: &Package) -> Result<PathBuf, InstallerError>;

    fn is_installed(&self, repo: &dyn InstalledRepository, package: &Package) -> bool;

    fn install(
        &self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError>;

    fn update(
        &self,
        repo: &mut dyn InstalledRepository,
        initial: &Package,
        target: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError>;

    fn uninstall(
        &self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError>;
}

/// Installs `wordpress-muplugin` packages under the mu-plugins directory and
/// keeps their entry files copied one level up.
#[derive(Clone)]
pub struct MustUsePluginInstaller {
    mu_plugins_path: PathBuf,
    filesystem: Filesystem,
    files: PackageFiles,
    sync: SyncManager,
}

impl MustUsePluginInstaller {
    pub fn new(config: &AppConfig, io: Rc<dyn Io>) -> Self {
        let resolver = EntryResolver::new(config.installer.trust_declared_entries);
        Self {
            mu_plugins_path: config.mu_plugins_path(),
            filesystem: Filesystem,
            files: PackageFiles,
            sync: SyncManager::new(resolver, io),
        }
    }

    pub fn sync(&self) -> &SyncManager {
        &self.sync
    }

    fn ensure_supported(&self, package: &Package) -> Result<(), InstallerError> {
        if self.supports(&package.package_type) {
            return Ok(());
        }

        Err(InstallerError::UnsupportedPackageType {
            package: package.name.clone(),
            package_type: package.package_type.clone(),
        })
    }
}

impl Installer for MustUsePluginInstaller {
    fn supports(&self, package_type: &str) -> bool {
        package_type == PACKAGE_TYPE
    }

    /// `<web-root>/<mu-plugins-dir>/<name>/`, where `name` is the package
    /// short name unless `extra.installer-name` says otherwise.
    fn install_path(&self, package: &Package) -> Result<PathBuf, InstallerError> {
        self.ensure_supported(package)?;

        let name = package
            .extra(INSTALLER_NAME_KEY)
            .and_then(toml::Value::as_str)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| package.short_name());

        if !is_single_dir_name(name) {
            return Err(InstallerError::InvalidInstallName {
                package: package.name.clone(),
                name: name.to_string(),
            });
        }

        Ok(self.mu_plugins_path.join(name))
    }

    fn is_installed(&self, repo: &dyn InstalledRepository, package: &Package) -> bool {
        if !repo.has_package(package) {
            return false;
        }

        let Ok(install_dir) = self.install_path(package) else {
            return false;
        };

        self.filesystem.is_readable(&install_dir)
            && self.sync.entries_present(package, &install_dir)
    }

    fn install(
        &self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        let install_dir = self.install_path(package)?;
        tracing::debug!("installing {} into {}", package.name, install_dir.display());

        self.files.place(package, &install_dir)?;
        repo.add_package(package.clone());
        self.sync.install_entries(package, &install_dir)
    }

    fn update(
        &self,
        repo: &mut dyn InstalledRepository,
        initial: &Package,
        target: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        let initial_dir = self.install_path(initial)?;
        let target_dir = self.install_path(target)?;
        tracing::debug!(
            "updating {} to {}",
            initial.pretty_string(),
            target.pretty_string()
        );

        // The initial entries are resolved while its files are still in place.
        let mut outcomes = self.sync.uninstall_entries(initial, &initial_dir)?;

        if initial_dir != target_dir {
            self.files.remove(initial, &initial_dir)?;
        }
        self.files.place(target, &target_dir)?;

        repo.remove_package(initial);
        repo.add_package(target.clone());

        outcomes.extend(self.sync.install_entries(target, &target_dir)?);
        Ok(outcomes)
    }

    fn uninstall(
        &self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        let install_dir = self.install_path(package)?;
        tracing::debug!("uninstalling {}", package.name);

        let outcomes = self.sync.uninstall_entries(package, &install_dir)?;
        self.files.remove(package, &install_dir)?;
        repo.remove_package(package);
        Ok(outcomes)
    }
}

fn is_single_dir_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
