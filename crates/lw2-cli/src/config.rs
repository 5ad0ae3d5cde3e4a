//! Config file loading and command-line overrides

use anyhow::{Context, Result};
use lw2_core::DeviceConfig;
use serde::Deserialize;
use std::path::Path;

/// Layout of the `--config` TOML file
///
/// ```toml
/// [device]
/// host = "192.168.0.100"
/// port = 10001
/// input_count = 8
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub device: DeviceConfig,
}

impl FileConfig {
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("Invalid config file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text)
    }
}

/// Flags that win over the file
#[derive(Debug, Default)]
pub struct Overrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub inputs: Option<u32>,
}

pub fn resolve(file: Option<FileConfig>, overrides: Overrides) -> DeviceConfig {
    let mut config = file.map(|f| f.device).unwrap_or_default();
    if let Some(host) = overrides.host {
        config.host = host;
    }
    if let Some(port) = overrides.port {
        config.port = port;
    }
    if let Some(inputs) = overrides.inputs {
        config.input_count = inputs;
    }
    config
}
