use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;

use crate::model::config::{AppConfig, Dispatch};
use crate::model::package::Package;
use crate::msg::Msg;
use crate::plugin::MustUsePlugins;
use crate::plugin::entry::EntryResolver;
use crate::plugin::error::InstallerError;
use crate::plugin::files::PackageFiles;
use crate::plugin::hooks::{LifecycleHooks, PackageEvent};
use crate::plugin::io::Io;
use crate::plugin::manager::InstallationManager;
use crate::plugin::repository::InstalledRepository;
use crate::plugin::sync::SyncManager;

pub struct App {
    pub config: AppConfig,
    manager: InstallationManager,
    hooks: LifecycleHooks,
    sync: SyncManager,
    files: PackageFiles,
    repository: Box<dyn InstalledRepository>,
    io: Rc<dyn Io>,
}

impl App {
    pub fn new(
        config: AppConfig,
        repository: Box<dyn InstalledRepository>,
        io: Rc<dyn Io>,
    ) -> Self {
        let mut manager = InstallationManager::new();
        MustUsePlugins::activate(&mut manager, &config, io.clone());

        let resolver = EntryResolver::new(config.installer.trust_declared_entries);
        let sync = SyncManager::new(resolver, io.clone());

        Self {
            config,
            manager,
            hooks: LifecycleHooks::new(sync.clone()),
            sync,
            files: PackageFiles,
            repository,
            io,
        }
    }

    pub fn dispatch(&self) -> Dispatch {
        self.config.installer.dispatch
    }

    pub fn manager(&self) -> &InstallationManager {
        &self.manager
    }

    pub fn is_installed(&self, package: &Package) -> bool {
        self.manager.is_installed(self.repository.as_ref(), package)
    }

    pub fn update(&mut self, msg: Msg) -> Result<()> {
        match msg {
            Msg::Install(package) => {
                let result = self.install(&package);
                self.finish(&package, result)
            }
            Msg::Update { initial, target } => {
                let result = self.upgrade(&initial, &target);
                self.finish(&target, result)
            }
            Msg::Uninstall(package) => {
                let result = self.uninstall(&package);
                self.finish(&package, result)
            }
            Msg::Status(package) => {
                let state = if self.is_installed(&package) {
                    "installed"
                } else {
                    "not installed"
                };
                self.io
                    .notice(&format!("{}: {state}", package.pretty_string()));
                Ok(())
            }
            Msg::ListEntries(package) => {
                let install_dir = self.manager.install_path(&package)?;
                let entries = self.sync.entries(&package, &install_dir);

                if entries.is_empty() {
                    self.io
                        .notice(&format!("{}: no entry files", package.pretty_string()));
                }
                for entry in entries {
                    self.io.notice(&format!(
                        "{} -> {}",
                        entry.source.display(),
                        entry.destination.display()
                    ));
                }
                Ok(())
            }
            Msg::InstallPath(package) => {
                let install_dir = self.manager.install_path(&package)?;
                self.io.notice(&install_dir.display().to_string());
                Ok(())
            }
        }
    }

    fn install(&mut self, package: &Package) -> Result<(), InstallerError> {
        match self.dispatch() {
            Dispatch::Installer => {
                self.manager.install(self.repository.as_mut(), package)?;
            }
            Dispatch::Hooks => {
                self.place_files(package)?;
                self.repository.add_package(package.clone());
                self.handle_event(PackageEvent::PostPackageInstall(package))?;
            }
        }

        Ok(())
    }

    fn upgrade(&mut self, initial: &Package, target: &Package) -> Result<(), InstallerError> {
        match self.dispatch() {
            Dispatch::Installer => {
                self.manager
                    .update(self.repository.as_mut(), initial, target)?;
            }
            Dispatch::Hooks => {
                self.handle_event(PackageEvent::PrePackageUpdate { initial, target })?;
                if initial.dist.is_some()
                    && self.install_dir(initial)? != self.install_dir(target)?
                {
                    self.remove_files(initial)?;
                }
                self.place_files(target)?;
                self.repository.remove_package(initial);
                self.repository.add_package(target.clone());
                self.handle_event(PackageEvent::PostPackageUpdate { initial, target })?;
            }
        }

        Ok(())
    }

    fn uninstall(&mut self, package: &Package) -> Result<(), InstallerError> {
        match self.dispatch() {
            Dispatch::Installer => {
                self.manager.uninstall(self.repository.as_mut(), package)?;
            }
            Dispatch::Hooks => {
                self.handle_event(PackageEvent::PrePackageUninstall(package))?;
                self.remove_files(package)?;
                self.repository.remove_package(package);
            }
        }

        Ok(())
    }

    fn install_dir(&self, package: &Package) -> Result<PathBuf, InstallerError> {
        self.manager.install_path(package)
    }

    /// Host side of the hooks dispatch: package files land before the
    /// post-install/post-update hooks and leave after the pre-uninstall hook.
    fn place_files(&self, package: &Package) -> Result<(), InstallerError> {
        if package.dist.is_some() {
            self.files.place(package, &self.install_dir(package)?)?;
        }
        Ok(())
    }

    fn remove_files(&self, package: &Package) -> Result<(), InstallerError> {
        if package.dist.is_some() {
            self.files.remove(package, &self.install_dir(package)?)?;
        }
        Ok(())
    }

    fn handle_event(&self, event: PackageEvent<'_>) -> Result<(), InstallerError> {
        let handled = self.hooks.handle(&self.manager, &event)?;
        if !handled {
            tracing::debug!("{}: not a must-use plugin package", event.kind());
        }
        Ok(())
    }

    /// Unsupported packages are reported and skipped; other errors propagate.
    fn finish(&self, package: &Package, result: Result<(), InstallerError>) -> Result<()> {
        match result {
            Ok(()) => Ok(()),
            Err(err) if !err.is_fatal() => {
                tracing::info!("skipping {}: {err}", package.name);
                self.io.write_error(&format!("skipping: {err}"));
                Ok(())
            }
            Err(err) => {
                self.io.write_error(&err.to_string());
                Err(err.into())
            }
        }
    }
}
