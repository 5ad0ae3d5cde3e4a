//! LW2 Client Library
//!
//! Keeps one TCP session to an LW2 matrix switcher, tracks its topology,
//! names, crosspoints and presets, and sends routing and preset commands.
//!
//! # Example
//!
//! ```ignore
//! use lw2_client::Lw2Client;
//!
//! #[tokio::main]
//! async fn main() -> lw2_client::Result<()> {
//!     let client = Lw2Client::builder("192.168.0.100")
//!         .input_count(8)
//!         .connect()
//!         .await?;
//!
//!     let mut events = client.subscribe();
//!     while let Ok(event) = events.recv().await {
//!         println!("{:?}", event);
//!     }
//!
//!     client.route(3, 1).await;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod client;
pub mod error;

pub use builder::Lw2ClientBuilder;
pub use client::Lw2Client;
pub use error::{ClientError, Result};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::builder::Lw2ClientBuilder;
    pub use crate::client::Lw2Client;
    pub use crate::error::{ClientError, Result};
    pub use lw2_core::{Command, ConnectionStatus, DeviceConfig, DeviceEvent, DeviceState};
}
