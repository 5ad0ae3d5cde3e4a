//! Device configuration
//!
//! The output count is always learned from the device; only the input count
//! has to be supplied because the topology announcement does not carry it.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};

use crate::{Error, Result, DEFAULT_INPUT_COUNT, DEFAULT_PORT, MAX_INPUT_COUNT};

/// Connection and topology settings for one device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Device IP address; empty means not configured
    pub host: String,
    /// TCP port
    pub port: u16,
    /// Number of inputs the device has
    pub input_count: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            input_count: DEFAULT_INPUT_COUNT,
        }
    }
}

impl DeviceConfig {
    /// Create a config for `host` with default port and input count
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Default::default()
        }
    }

    /// Set the input count
    pub fn with_input_count(mut self, input_count: u32) -> Self {
        self.input_count = input_count;
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Whether a host has been entered at all
    pub fn is_configured(&self) -> bool {
        !self.host.trim().is_empty()
    }

    /// Check the host is an IP literal and the input count is in range
    pub fn validate(&self) -> Result<()> {
        if !self.is_configured() {
            return Err(Error::NotConfigured);
        }
        self.ip()?;
        if self.input_count > MAX_INPUT_COUNT {
            return Err(Error::InputCountOutOfRange(self.input_count));
        }
        Ok(())
    }

    /// Parsed device address
    pub fn ip(&self) -> Result<IpAddr> {
        self.host
            .trim()
            .parse()
            .map_err(|_| Error::InvalidHost(self.host.clone()))
    }

    /// Socket address to connect to
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(SocketAddr::new(self.ip()?, self.port))
    }
}
