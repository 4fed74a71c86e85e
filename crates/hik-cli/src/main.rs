//! hikctl: drive a Hikvision camera through the vendor HCNetSDK.
//!
//! Each command opens a session, performs one operation and tears the
//! session down again.

mod config;
mod orchestrator;
mod output;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use orchestrator::{Operation, Orchestrator};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "hikctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    format: OutputFormat,

    #[command(flatten)]
    device: DeviceArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
struct DeviceArgs {
    /// Device configuration file (TOML or JSON)
    #[arg(short, long, env = "HIK_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Directory holding the SDK library and its components
    #[arg(long, global = true)]
    lib_dir: Option<PathBuf>,

    /// Device address
    #[arg(long, global = true)]
    ip: Option<String>,

    #[arg(short, long, global = true)]
    username: Option<String>,

    #[arg(long, env = "HIK_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,

    /// SDK service port [default: 8000]
    #[arg(long, global = true)]
    port: Option<u16>,

    /// Channel number [default: 1]
    #[arg(long, global = true)]
    channel: Option<i32>,

    /// Log session steps at TRACE instead of DEBUG
    #[arg(long, global = true)]
    no_debug: bool,
}

impl DeviceArgs {
    fn overrides(&self) -> config::Overrides {
        config::Overrides {
            lib_dir: self.lib_dir.clone(),
            ip: self.ip.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            port: self.port,
            channel: self.channel,
            debug: self.no_debug.then_some(false),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Capture a JPEG picture
    Snapshot {
        /// Where to write the picture
        path: PathBuf,
    },

    /// Read or change the optical zoom level
    Zoom {
        #[command(subcommand)]
        action: ZoomAction,
    },

    /// Log in and print the device information
    Info,

    /// Validate the device configuration without contacting the device
    CheckConfig,
}

#[derive(Subcommand)]
enum ZoomAction {
    /// Print the current zoom level
    Get,
    /// Set the zoom level
    Set {
        level: f32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    tracing::info!("Loading device configuration");
    let config = config::load_config(cli.device.config.as_deref(), &cli.device.overrides())?;

    let operation = match cli.command {
        Commands::Snapshot { path } => Operation::Snapshot { path },
        Commands::Zoom { action: ZoomAction::Get } => Operation::GetZoom,
        Commands::Zoom { action: ZoomAction::Set { level } } => Operation::SetZoom { level },
        Commands::Info => Operation::Info,
        Commands::CheckConfig => {
            println!(
                "Configuration OK: {}@{}:{} channel {} (SDK in {})",
                config.username,
                config.ip,
                config.port,
                config.channel,
                config.lib_dir.display()
            );
            return Ok(());
        }
    };

    let report = Orchestrator::new(config).run(operation)?;
    output::print_report(&report, cli.format)?;

    if !report.is_ok() {
        anyhow::bail!("{} did not succeed ({:?})", report.operation, report.status);
    }
    Ok(())
}
