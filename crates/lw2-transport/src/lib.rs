//! LW2 Transport Layer
//!
//! Byte-stream transports for talking to LW2 devices. Transports move raw
//! chunks only; line framing happens above them.

pub mod error;
pub mod traits;

#[cfg(feature = "tcp")]
pub mod tcp;

pub use error::{Result, TransportError};
pub use traits::{Transport, TransportEvent, TransportReceiver, TransportSender};

#[cfg(feature = "tcp")]
pub use tcp::{TcpConfig, TcpReceiver, TcpSender, TcpTransport};
