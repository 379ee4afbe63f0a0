use std::path::PathBuf;

use crate::model::package::Package;
use crate::plugin::error::InstallerError;
use crate::plugin::installer::Installer;
use crate::plugin::repository::InstalledRepository;
use crate::plugin::sync::SyncOutcome;

/// Host-side registry that routes packages to the installer for their type.
#[derive(Default)]
pub struct InstallationManager {
    installers: Vec<Box<dyn Installer>>,
}

impl InstallationManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations take precedence over earlier ones.
    pub fn add_installer(&mut self, installer: Box<dyn Installer>) {
        self.installers.insert(0, installer);
    }

    pub fn installer_count(&self) -> usize {
        self.installers.len()
    }

    pub fn supports(&self, package_type: &str) -> bool {
        self.installers
            .iter()
            .any(|installer| installer.supports(package_type))
    }

    pub fn installer_for(&self, package: &Package) -> Result<&dyn Installer, InstallerError> {
        self.installers
            .iter()
            .find(|installer| installer.supports(&package.package_type))
            .map(|installer| &**installer)
            .ok_or_else(|| InstallerError::UnsupportedPackageType {
                package: package.name.clone(),
                package_type: package.package_type.clone(),
            })
    }

    pub fn install_path(&self, package: &Package) -> Result<PathBuf, InstallerError> {
        self.installer_for(package)?.install_path(package)
    }

    pub fn is_installed(&self, repo: &dyn InstalledRepository, package: &Package) -> bool {
        self.installer_for(package)
            .map(|installer| installer.is_installed(repo, package))
            .unwrap_or(false)
    }

    pub fn install(
        &self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        self.installer_for(package)?.install(repo, package)
    }

    /// A type change hands the initial package to its own installer for
    /// removal and the target to the new type's installer.
    pub fn update(
        &self,
        repo: &mut dyn InstalledRepository,
        initial: &Package,
        target: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        if initial.package_type == target.package_type {
            return self.installer_for(target)?.update(repo, initial, target);
        }

        let target_installer = self.installer_for(target)?;
        let mut outcomes = self.installer_for(initial)?.uninstall(repo, initial)?;
        outcomes.extend(target_installer.install(repo, target)?);
        Ok(outcomes)
    }

    pub fn uninstall(
        &self,
        repo: &mut dyn InstalledRepository,
        package: &Package,
    ) -> Result<Vec<SyncOutcome>, InstallerError> {
        self.installer_for(package)?.uninstall(repo, package)
    }
}
