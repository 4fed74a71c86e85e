//! Device configuration loading and validation.

use anyhow::{Context, Result};
use hik_ffi::loader::native_sdk_file_name;
use hik_types::SessionConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Field overrides taken from the command line.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub lib_dir: Option<PathBuf>,
    pub ip: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub port: Option<u16>,
    pub channel: Option<i32>,
    pub debug: Option<bool>,
}

/// Partially specified device file; missing fields may come from flags.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DeviceFile {
    lib_dir: Option<PathBuf>,
    ip: Option<String>,
    username: Option<String>,
    password: Option<String>,
    port: Option<u16>,
    channel: Option<i32>,
    debug: Option<bool>,
}

/// Load a device file (TOML, or JSON for `.json`), apply overrides and
/// validate the result.
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<SessionConfig> {
    let file = match path {
        Some(path) => read_device_file(path)?,
        None => DeviceFile::default(),
    };

    let config = merge(file, overrides)?;
    validate_config(&config)?;
    Ok(config)
}

fn read_device_file(path: &Path) -> Result<DeviceFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let file = if path.extension().map_or(false, |e| e == "json") {
        serde_json::from_str(&content)
            .with_context(|| "Failed to parse config as JSON")?
    } else {
        // Assume TOML
        toml::from_str(&content)
            .with_context(|| "Failed to parse config as TOML")?
    };

    Ok(file)
}

fn merge(file: DeviceFile, overrides: &Overrides) -> Result<SessionConfig> {
    fn required<T>(value: Option<T>, name: &str) -> Result<T> {
        value.with_context(|| {
            format!("Missing '{name}': set it in the config file or pass --{}", name.replace('_', "-"))
        })
    }

    let lib_dir = required(overrides.lib_dir.clone().or(file.lib_dir), "lib_dir")?;
    let ip = required(overrides.ip.clone().or(file.ip), "ip")?;
    let username = required(overrides.username.clone().or(file.username), "username")?;
    let password = required(overrides.password.clone().or(file.password), "password")?;

    let mut config = SessionConfig::new(lib_dir, ip, username, password);
    if let Some(port) = overrides.port.or(file.port) {
        config = config.with_port(port);
    }
    if let Some(channel) = overrides.channel.or(file.channel) {
        config = config.with_channel(channel);
    }
    if let Some(debug) = overrides.debug.or(file.debug) {
        config = config.with_debug(debug);
    }
    Ok(config)
}

/// Validate configuration.
pub fn validate_config(config: &SessionConfig) -> Result<()> {
    config.validate()?;

    if !config.lib_dir.is_dir() {
        anyhow::bail!("SDK directory not found: {:?}", config.lib_dir);
    }

    let library = config.lib_dir.join(native_sdk_file_name());
    if !library.exists() {
        anyhow::bail!("SDK library not found: {:?}", library);
    }

    Ok(())
}
