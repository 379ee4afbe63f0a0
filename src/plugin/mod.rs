pub mod entry;
pub mod error;
pub mod files;
pub mod filesystem;
pub mod hooks;
pub mod installer;
pub mod io;
pub mod manager;
pub mod registrar;
pub mod repository;
pub mod sync;

pub use error::InstallerError;
pub use installer::{Installer, MustUsePluginInstaller, PACKAGE_TYPE};
pub use manager::InstallationManager;
pub use registrar::MustUsePlugins;
