//! Transport trait definitions
//!
//! A transport moves bytes to and from one device. It knows nothing about
//! lines or commands.

use async_trait::async_trait;
use bytes::Bytes;
use std::net::SocketAddr;

use crate::error::Result;

/// What a transport reports to its receiver, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Socket is up; always the first event
    Connected,
    /// Bytes as read from the socket; may hold part of a line or several lines
    Data(Bytes),
    /// Read or write failed; `Closed` follows
    Error(String),
    /// Socket is gone; always the last event. `reason` is `None` when the
    /// peer closed cleanly.
    Closed { reason: Option<String> },
}

/// Write side of a connection
#[async_trait]
pub trait TransportSender: Send + Sync {
    /// Queue bytes for the socket. They are written verbatim and in call order.
    async fn send(&self, data: Bytes) -> Result<()>;

    fn is_connected(&self) -> bool;

    /// Shut the socket. Bytes already queued are still written.
    async fn close(&self) -> Result<()>;
}

/// Read side of a connection
#[async_trait]
pub trait TransportReceiver: Send {
    /// Next event, or `None` once the connection task has gone
    async fn recv(&mut self) -> Option<TransportEvent>;
}

/// Something that can open a connection to a device
#[async_trait]
pub trait Transport: Send + Sync {
    type Sender: TransportSender;
    type Receiver: TransportReceiver;

    async fn connect(&self, addr: SocketAddr) -> Result<(Self::Sender, Self::Receiver)>;
}
