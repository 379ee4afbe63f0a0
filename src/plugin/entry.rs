use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use ignore::WalkBuilder;
use regex::Regex;

use crate::model::package::Package;

/// Package metadata key holding explicitly declared entry files.
pub const ENTRY_EXTRA_KEY: &str = "wordpress-muplugin-entry";

/// Extension of files considered during auto-discovery.
pub const SOURCE_EXTENSION: &str = "php";

/// Bytes read from the start of a file when looking for a plugin header.
pub const HEADER_SCAN_BYTES: u64 = 8192;

static PLUGIN_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?mi)^[ \t/*#@]*Plugin Name:(.*)$").expect("valid plugin header regex")
});

/// One entry file to synchronize: `source` lives in the package install
/// directory, `destination` one level above it with the same file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFileLocation {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl EntryFileLocation {
    pub fn for_source(source: PathBuf) -> Self {
        let destination = destination_for(&source);
        Self {
            source,
            destination,
        }
    }
}

/// `dirname(dirname(source))/basename(source)`.
pub fn destination_for(source: &Path) -> PathBuf {
    let base = source
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new(""));

    match source.file_name() {
        Some(name) => base.join(name),
        None => base.to_path_buf(),
    }
}

/// Whether the start of `path` carries a `Plugin Name:` header with a value.
pub fn looks_like_plugin(path: &Path) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };

    let mut chunk = Vec::new();
    if file.take(HEADER_SCAN_BYTES).read_to_end(&mut chunk).is_err() {
        return false;
    }

    header_has_plugin_name(&String::from_utf8_lossy(&chunk))
}

fn header_has_plugin_name(chunk: &str) -> bool {
    let normalized = chunk.replace('\r', "\n");

    PLUGIN_HEADER_RE
        .captures_iter(&normalized)
        .filter_map(|caps| caps.get(1))
        .any(|value| !value.as_str().trim().is_empty())
}

/// Whether a declared entry name stays inside the install directory: relative,
/// with no `..`, root or drive prefix components.
pub fn is_contained_name(name: &str) -> bool {
    let mut normal = false;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(_) => normal = true,
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    normal
}

/// Decides which files of a package are must-use entry points.
#[derive(Debug, Clone, Default)]
pub struct EntryResolver {
    trust_declared: bool,
}

impl EntryResolver {
    pub fn new(trust_declared: bool) -> Self {
        Self { trust_declared }
    }

    /// Entry files declared in the package metadata, normalized to a list.
    pub fn declared_entries(package: &Package) -> Vec<String> {
        match package.extra(ENTRY_EXTRA_KEY) {
            Some(toml::Value::String(name)) if !name.is_empty() => vec![name.clone()],
            Some(toml::Value::Array(names)) => names
                .iter()
                .filter_map(toml::Value::as_str)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Top-level files with the plugin source extension, in enumeration order.
    pub fn discover(install_dir: &Path) -> Vec<String> {
        WalkBuilder::new(install_dir)
            .standard_filters(false)
            .hidden(true)
            .follow_links(true)
            .max_depth(Some(1))
            .build()
            .flatten()
            .filter(|entry| entry.depth() == 1)
            .filter(|entry| entry.file_type().is_some_and(|kind| kind.is_file()))
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext == SOURCE_EXTENSION)
            })
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .collect()
    }

    pub fn resolve(&self, package: &Package, install_dir: &Path) -> Vec<EntryFileLocation> {
        let declared = Self::declared_entries(package);
        let explicit = !declared.is_empty();
        let candidates = if explicit {
            declared
        } else {
            Self::discover(install_dir)
        };

        let mut locations: Vec<EntryFileLocation> = Vec::with_capacity(candidates.len());
        for name in candidates {
            if !is_contained_name(&name) {
                tracing::debug!(
                    "{}: skipping entry {name:?}, outside the install directory",
                    package.name
                );
                continue;
            }
            let source = install_dir.join(&name);

            let trusted = explicit && self.trust_declared;
            if !trusted && !looks_like_plugin(&source) {
                tracing::debug!(
                    "{}: skipping {}, no plugin header",
                    package.name,
                    source.display()
                );
                continue;
            }

            if locations.iter().any(|location| location.source == source) {
                continue;
            }

            locations.push(EntryFileLocation::for_source(source));
        }

        locations
    }
}
