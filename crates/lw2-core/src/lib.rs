//! LW2 Core
//!
//! Protocol primitives for the legacy LW2 matrix-switcher control protocol.
//!
//! This crate provides:
//! - CRLF line framing over a raw byte stream ([`LineFramer`])
//! - Response classification and command encoding ([`codec`], [`Response`], [`Command`])
//! - The device state cache ([`DeviceState`])
//! - The preset-count discovery handshake ([`PresetDiscovery`])
//! - A sans-IO engine tying them together ([`Engine`])
//!
//! Nothing here touches a socket; the client crate drives the engine from a TCP session.

pub mod codec;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod framer;
pub mod state;
pub mod types;

pub use codec::{decode_line, encode};
pub use config::DeviceConfig;
pub use discovery::{DiscoveryOutcome, PresetDiscovery, PROBE_SEQUENCE};
pub use engine::{Engine, EngineOutput};
pub use error::{Error, Result};
pub use framer::LineFramer;
pub use state::{CrosspointMap, DeviceState, Endpoint, PresetSlot};
pub use types::*;

/// TCP port LW2 devices listen on
pub const DEFAULT_PORT: u16 = 10001;

/// Line terminator used in both directions
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Input count assumed when none is configured
pub const DEFAULT_INPUT_COUNT: u32 = 40;

/// Upper bound accepted for the configured input count
pub const MAX_INPUT_COUNT: u32 = 100;

/// Name reports past the known outputs grow the list only up to this index
pub const MAX_OUTPUT_COUNT: u32 = 100;

/// Largest preset count discovery can report; also caps preset name growth
pub const MAX_PRESET_COUNT: u32 = 64;
