use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wp_muplugin_installer::model::config::Dispatch;
use wp_muplugin_installer::plugin::io::ConsoleIo;
use wp_muplugin_installer::plugin::repository::UntrackedRepository;
use wp_muplugin_installer::{App, AppConfig, Msg, Package};

#[derive(Parser)]
#[command(name = "muplug")]
#[command(about = "Install WordPress must-use plugin entry files")]
#[command(version)]
struct Cli {
    /// Config file (defaults to the per-user config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override general.web_root
    #[arg(long, global = true)]
    web_root: Option<String>,

    /// Synchronize through the lifecycle hooks instead of the installer
    #[arg(long, global = true)]
    hooks: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Copy a package's entry files into the mu-plugins directory
    Install {
        /// Package manifest (TOML)
        package: PathBuf,
    },

    /// Replace the entry files of one package version with another's
    Update {
        /// Manifest of the installed version
        initial: PathBuf,
        /// Manifest of the new version
        target: PathBuf,
    },

    /// Remove a package's entry files from the mu-plugins directory
    Uninstall {
        /// Package manifest (TOML)
        package: PathBuf,
    },

    /// Report whether the package and all its entry files are in place
    Status {
        /// Package manifest (TOML)
        package: PathBuf,
    },

    /// List resolved entry files and where they are copied to
    Entries {
        /// Package manifest (TOML)
        package: PathBuf,
    },

    /// Print the package install directory
    InstallPath {
        /// Package manifest (TOML)
        package: PathBuf,
    },
}

impl Commands {
    fn into_msg(self) -> Result<Msg> {
        Ok(match self {
            Commands::Install { package } => Msg::Install(Package::from_manifest(&package)?),
            Commands::Update { initial, target } => Msg::Update {
                initial: Package::from_manifest(&initial)?,
                target: Package::from_manifest(&target)?,
            },
            Commands::Uninstall { package } => Msg::Uninstall(Package::from_manifest(&package)?),
            Commands::Status { package } => Msg::Status(Package::from_manifest(&package)?),
            Commands::Entries { package } => Msg::ListEntries(Package::from_manifest(&package)?),
            Commands::InstallPath { package } => {
                Msg::InstallPath(Package::from_manifest(&package)?)
            }
        })
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match AppConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("muplug error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize logging to file (never stdout)
    let log_dir = directories::ProjectDirs::from("", "", "muplug")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("muplug"));
    let _guard = match std::fs::create_dir_all(&log_dir) {
        Ok(()) => {
            let file_appender = tracing_appender::rolling::daily(&log_dir, "muplug.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!(
                    "muplug={0},wp_muplugin_installer={0}",
                    config.general.log_level
                ))
            });
            tracing_subscriber::fmt()
                .with_writer(non_blocking)
                .with_env_filter(filter)
                .init();
            Some(guard)
        }
        Err(e) => {
            eprintln!("muplug: logging disabled, cannot create {}: {e}", log_dir.display());
            None
        }
    };

    if let Some(web_root) = cli.web_root {
        config.general.web_root = web_root;
    }
    if cli.hooks {
        config.installer.dispatch = Dispatch::Hooks;
    }

    tracing::info!("muplug starting");

    if let Err(e) = run(cli.command, config) {
        tracing::error!("{e:#}");
        eprintln!("muplug error: {e:#}");
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

fn run(command: Commands, config: AppConfig) -> Result<()> {
    let msg = command.into_msg()?;
    let mut app = App::new(config, Box::new(UntrackedRepository), Rc::new(ConsoleIo));
    app.update(msg)
}
