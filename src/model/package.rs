use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageId(pub String);

impl PackageId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A package descriptor as handed over by the host package manager.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Package {
    pub name: String,
    pub version: String,
    #[serde(rename = "type", default = "default_package_type")]
    pub package_type: String,
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
    /// Unpacked package contents. When set, the installer places them in the
    /// install directory itself; otherwise the host already has.
    #[serde(default)]
    pub dist: Option<PathBuf>,
}

fn default_package_type() -> String {
    "library".to_string()
}

impl Package {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        package_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            package_type: package_type.into(),
            extra: HashMap::new(),
            dist: None,
        }
    }

    pub fn with_dist(mut self, dist: impl Into<PathBuf>) -> Self {
        self.dist = Some(dist.into());
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Read a package manifest (`name`, `version`, `type`, `dist`, `[extra]`)
    /// from a TOML file. A relative `dist` is taken from the manifest's directory.
    pub fn from_manifest(path: &Path) -> Result<Self> {
        let raw =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;

        let mut package = toml::from_str::<Package>(&raw)
            .with_context(|| format!("parsing {}", path.display()))?;
        if let Some(dist) = package.dist.take() {
            let base = path.parent().unwrap_or(Path::new(""));
            package.dist = Some(base.join(dist));
        }

        Ok(package)
    }

    pub fn id(&self) -> PackageId {
        PackageId::new(&self.name)
    }

    /// Name without the vendor prefix: `acme/cache` → `cache`.
    pub fn short_name(&self) -> &str {
        self.name
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .unwrap_or(self.name.as_str())
    }

    pub fn extra(&self, key: &str) -> Option<&toml::Value> {
        self.extra.get(key)
    }

    pub fn pretty_string(&self) -> String {
        format!("{} ({})", self.name, self.version)
    }
}
