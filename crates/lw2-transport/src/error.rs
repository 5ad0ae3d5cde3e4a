//! Transport error types

use std::net::SocketAddr;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TransportError>;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("could not connect to {addr}: {reason}")]
    ConnectionFailed { addr: SocketAddr, reason: String },

    #[error("timed out connecting to {0}")]
    ConnectTimeout(SocketAddr),

    #[error("not connected")]
    NotConnected,

    /// The connection task has exited and nothing drains the write queue
    #[error("write queue closed")]
    QueueClosed,
}
