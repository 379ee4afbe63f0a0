use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    /// No installer handles this package type; the package is skipped.
    #[error("package {package} has unsupported type `{package_type}`")]
    UnsupportedPackageType {
        package: String,
        package_type: String,
    },

    #[error("cannot copy {} to {}", .entry.display(), .destination.display())]
    CopyFailure { entry: PathBuf, destination: PathBuf },

    #[error("cannot unlink {}", .destination.display())]
    UnlinkFailure { destination: PathBuf },

    /// `installer-name` (or the package short name) is not a single directory name.
    #[error("package {package} has invalid install name `{name}`")]
    InvalidInstallName { package: String, name: String },

    #[error("cannot place package files in {}", .install_dir.display())]
    PackageFiles {
        install_dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl InstallerError {
    /// Whether the error should stop the current lifecycle operation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::UnsupportedPackageType { .. })
    }
}
