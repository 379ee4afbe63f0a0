use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub installer: InstallerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneralConfig {
    pub web_root: String,
    pub mu_plugins_dir: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstallerConfig {
    /// Skip the plugin header check for entries named in package metadata.
    pub trust_declared_entries: bool,
    pub dispatch: Dispatch,
}

/// How the host drives entry file synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dispatch {
    /// Through the registered installer (install/update/uninstall).
    #[default]
    Installer,
    /// Through the four package lifecycle hooks.
    Hooks,
}

const DEFAULTS: &str = include_str!("../../config/default.toml");

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig {
                web_root: "wp-content".to_string(),
                mu_plugins_dir: "mu-plugins".to_string(),
                log_level: "info".to_string(),
            },
            installer: InstallerConfig {
                trust_declared_entries: false,
                dispatch: Dispatch::Installer,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration with layering: defaults → user config.
    ///
    /// An explicit `path` replaces the per-user config location and must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let user_path = match path {
            Some(path) => Some(path.to_path_buf()),
            None => directories::ProjectDirs::from("", "", "muplug")
                .map(|dirs| dirs.config_dir().join("config.toml"))
                .filter(|candidate| candidate.exists()),
        };

        let user = match user_path {
            Some(user_path) => Some(
                fs::read_to_string(&user_path)
                    .with_context(|| format!("reading {}", user_path.display()))?,
            ),
            None => None,
        };

        let mut config = Self::from_layers(user.as_deref())?;
        config.expand_home()?;
        Ok(config)
    }

    /// Merge an optional user TOML document over the embedded defaults.
    pub fn from_layers(user: Option<&str>) -> Result<Self> {
        let mut merged: toml::Value = toml::from_str(DEFAULTS)?;

        if let Some(user) = user {
            let overlay: toml::Value = toml::from_str(user)?;
            merge(&mut merged, overlay);
        }

        Ok(merged.try_into::<Self>()?)
    }

    pub fn web_root(&self) -> PathBuf {
        PathBuf::from(&self.general.web_root)
    }

    pub fn mu_plugins_path(&self) -> PathBuf {
        self.web_root().join(&self.general.mu_plugins_dir)
    }

    fn expand_home(&mut self) -> Result<()> {
        if self.general.web_root.starts_with('~') {
            let home = dirs_home().ok_or_else(|| anyhow!("cannot determine home directory"))?;
            self.general.web_root = self
                .general
                .web_root
                .replacen('~', &home.to_string_lossy(), 1);
        }

        Ok(())
    }
}

fn merge(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
