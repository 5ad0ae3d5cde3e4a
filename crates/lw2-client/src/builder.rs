//! Client builder pattern

use lw2_core::DeviceConfig;
use lw2_transport::TcpConfig;
use std::time::Duration;

use crate::client::DEFAULT_EVENT_CAPACITY;
use crate::{Lw2Client, Result};

/// Builder for [`Lw2Client`]
pub struct Lw2ClientBuilder {
    config: DeviceConfig,
    tcp: TcpConfig,
    event_capacity: usize,
}

impl Lw2ClientBuilder {
    /// Create a new builder for the device at `host`
    pub fn new(host: &str) -> Self {
        Self {
            config: DeviceConfig::new(host),
            tcp: TcpConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Start from an existing device configuration
    pub fn from_config(config: DeviceConfig) -> Self {
        Self {
            config,
            tcp: TcpConfig::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Set the device port
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the number of inputs on the device
    pub fn input_count(mut self, input_count: u32) -> Self {
        self.config.input_count = input_count;
        self
    }

    /// Set TCP keepalive interval in seconds (0 disables it)
    pub fn keepalive(mut self, secs: u64) -> Self {
        self.tcp.keepalive_secs = secs;
        self
    }

    /// Set the connect timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.tcp.connect_timeout = timeout;
        self
    }

    /// Set how many notifications a slow subscriber may lag behind
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Validate and build without connecting
    pub fn build(self) -> Result<Lw2Client> {
        self.config.validate()?;
        Ok(Lw2Client::with_options(self.config, self.tcp, self.event_capacity))
    }

    /// Build and connect
    pub async fn connect(self) -> Result<Lw2Client> {
        let client = self.build()?;
        client.connect().await?;
        Ok(client)
    }
}
