use std::fs;
use std::io;
use std::path::Path;

use ignore::WalkBuilder;

use crate::model::package::Package;
use crate::plugin::error::InstallerError;

/// Places and removes a package's unpacked contents in its install directory.
///
/// Only packages that carry a `dist` directory are managed. For the others the
/// host owns the install directory and both calls do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageFiles;

impl PackageFiles {
    /// Replace `install_dir` with a copy of the package's `dist` directory.
    /// Returns whether anything was placed.
    pub fn place(&self, package: &Package, install_dir: &Path) -> Result<bool, InstallerError> {
        let Some(dist) = package.dist.as_deref() else {
            return Ok(false);
        };
        if same_dir(dist, install_dir) {
            return Ok(false);
        }

        tracing::debug!(
            "placing {} from {} into {}",
            package.pretty_string(),
            dist.display(),
            install_dir.display()
        );
        replace_dir(dist, install_dir).map_err(|source| InstallerError::PackageFiles {
            install_dir: install_dir.to_path_buf(),
            source,
        })?;

        Ok(true)
    }

    /// Delete an install directory previously filled by [`PackageFiles::place`].
    pub fn remove(&self, package: &Package, install_dir: &Path) -> Result<bool, InstallerError> {
        let Some(dist) = package.dist.as_deref() else {
            return Ok(false);
        };
        if same_dir(dist, install_dir) || !install_dir.exists() {
            return Ok(false);
        }

        tracing::debug!("removing {}", install_dir.display());
        fs::remove_dir_all(install_dir).map_err(|source| InstallerError::PackageFiles {
            install_dir: install_dir.to_path_buf(),
            source,
        })?;

        Ok(true)
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn replace_dir(dist: &Path, install_dir: &Path) -> io::Result<()> {
    if !dist.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", dist.display()),
        ));
    }

    if install_dir.exists() {
        fs::remove_dir_all(install_dir)?;
    }
    fs::create_dir_all(install_dir)?;

    // Parents are yielded before their children.
    for entry in WalkBuilder::new(dist)
        .standard_filters(false)
        .follow_links(true)
        .build()
    {
        let entry = entry.map_err(io::Error::other)?;
        let Ok(relative) = entry.path().strip_prefix(dist) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = install_dir.join(relative);
        match entry.file_type() {
            Some(kind) if kind.is_dir() => fs::create_dir_all(&target)?,
            Some(_) => {
                fs::copy(entry.path(), &target)?;
            }
            None => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn muplugin() -> Package {
        Package::new("acme/foo", "1.0.0", "wordpress-muplugin")
    }

    #[test]
    fn place_replaces_previous_contents() {
        let root = tempfile::tempdir().unwrap();
        let dist = root.path().join("dist");
        fs::create_dir_all(dist.join("includes")).unwrap();
        fs::write(dist.join("foo.php"), "<?php\n").unwrap();
        fs::write(dist.join(".hidden"), "").unwrap();
        fs::write(dist.join("includes/lib.php"), "<?php\n").unwrap();

        let install_dir = root.path().join("mu-plugins/foo");
        fs::create_dir_all(&install_dir).unwrap();
        fs::write(install_dir.join("stale.php"), "<?php\n").unwrap();

        let package = muplugin().with_dist(&dist);
        assert!(PackageFiles.place(&package, &install_dir).unwrap());

        assert!(install_dir.join("foo.php").is_file());
        assert!(install_dir.join(".hidden").is_file());
        assert!(install_dir.join("includes/lib.php").is_file());
        assert!(!install_dir.join("stale.php").exists());

        assert!(PackageFiles.remove(&package, &install_dir).unwrap());
        assert!(!install_dir.exists());
        assert!(dist.join("foo.php").is_file());
    }

    #[test]
    fn packages_without_dist_are_left_to_the_host() {
        let root = tempfile::tempdir().unwrap();
        let install_dir = root.path().join("mu-plugins/foo");
        fs::create_dir_all(&install_dir).unwrap();
        fs::write(install_dir.join("foo.php"), "<?php\n").unwrap();

        assert!(!PackageFiles.place(&muplugin(), &install_dir).unwrap());
        assert!(!PackageFiles.remove(&muplugin(), &install_dir).unwrap());
        assert!(install_dir.join("foo.php").is_file());
    }

    #[test]
    fn dist_already_in_place_is_kept() {
        let root = tempfile::tempdir().unwrap();
        let install_dir = root.path().join("mu-plugins/foo");
        fs::create_dir_all(&install_dir).unwrap();
        fs::write(install_dir.join("foo.php"), "<?php\n").unwrap();
        let package = muplugin().with_dist(&install_dir);

        assert!(!PackageFiles.place(&package, &install_dir).unwrap());
        assert!(!PackageFiles.remove(&package, &install_dir).unwrap());
        assert!(install_dir.join("foo.php").is_file());
    }

    #[test]
    fn missing_dist_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let package = muplugin().with_dist(root.path().join("nope"));

        let err = PackageFiles
            .place(&package, &root.path().join("mu-plugins/foo"))
            .unwrap_err();
        assert!(matches!(err, InstallerError::PackageFiles { .. }));
    }
}
