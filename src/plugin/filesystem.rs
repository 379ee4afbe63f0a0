use std::fs;
use std::path::Path;

/// Filesystem predicates and actions used while synchronizing entry files.
///
/// Every call hits the filesystem directly; nothing is cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct Filesystem;

impl Filesystem {
    pub fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    pub fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    pub fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    pub fn is_readable(&self, path: &Path) -> bool {
        if path.is_dir() {
            fs::read_dir(path).is_ok()
        } else {
            fs::File::open(path).is_ok()
        }
    }

    /// Write access for the current user. The mode must carry a write bit
    /// and, on unix, `access(2)` must grant `W_OK` for the effective ids.
    pub fn is_writable(&self, path: &Path) -> bool {
        let mode_allows = fs::metadata(path)
            .map(|metadata| !metadata.permissions().readonly())
            .unwrap_or(false);

        mode_allows && access_allows_write(path)
    }

    /// Whether `path` can be written: the path itself when it exists,
    /// otherwise its parent directory.
    pub fn can_write(&self, path: &Path) -> bool {
        if self.exists(path) {
            return self.is_writable(path);
        }

        match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => self.is_writable(Path::new(".")),
            Some(parent) => self.is_dir(parent) && self.is_writable(parent),
            None => false,
        }
    }

    pub fn copy_file(&self, src: &Path, dest: &Path) -> bool {
        if !(self.is_file(src) && self.is_readable(src) && self.can_write(dest)) {
            return false;
        }

        match fs::copy(src, dest) {
            Ok(_) => true,
            Err(err) => {
                tracing::warn!("copy {} -> {} failed: {err}", src.display(), dest.display());
                false
            }
        }
    }

    pub fn unlink_file(&self, path: &Path) -> bool {
        if !self.is_file(path) {
            return false;
        }

        match fs::remove_file(path) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!("unlink {} failed: {err}", path.display());
                false
            }
        }
    }
}

#[cfg(unix)]
fn access_allows_write(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};

    match access(path, AccessFlags::W_OK) {
        Ok(()) => true,
        Err(errno) => {
            tracing::trace!("{} not writable: {errno}", path.display());
            false
        }
    }
}

#[cfg(not(unix))]
fn access_allows_write(_path: &Path) -> bool {
    true
}
