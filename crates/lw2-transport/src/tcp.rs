//! TCP transport implementation
//!
//! Plain TCP byte stream. Outgoing buffers are written verbatim and incoming
//! reads are forwarded as they arrive; message boundaries are the caller's
//! business.

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Notify};
use tracing::{debug, error, info};

use crate::error::{Result, TransportError};
use crate::traits::{Transport, TransportEvent, TransportReceiver, TransportSender};

/// Default channel buffer size for TCP connections
const DEFAULT_CHANNEL_BUFFER_SIZE: usize = 1000;

/// TCP configuration
#[derive(Debug, Clone)]
pub struct TcpConfig {
    /// Read buffer size
    pub read_buffer_size: usize,
    /// Keep-alive interval in seconds (0 = disabled)
    pub keepalive_secs: u64,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for TcpConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 4096,
            keepalive_secs: 30,
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// TCP transport
pub struct TcpTransport {
    config: TcpConfig,
}

impl TcpTransport {
    pub fn new() -> Self {
        Self {
            config: TcpConfig::default(),
        }
    }

    pub fn with_config(config: TcpConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TcpConfig {
        &self.config
    }
}

impl Default for TcpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Sender = TcpSender;
    type Receiver = TcpReceiver;

    async fn connect(&self, addr: SocketAddr) -> Result<(TcpSender, TcpReceiver)> {
        info!("Connecting to TCP: {}", addr);

        let stream = tokio::time::timeout(self.config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| TransportError::ConnectTimeout(addr))?
            .map_err(|e| TransportError::ConnectionFailed {
                addr,
                reason: e.to_string(),
            })?;

        if self.config.keepalive_secs > 0 {
            let socket = socket2::SockRef::from(&stream);
            let keepalive = socket2::TcpKeepalive::new()
                .with_time(Duration::from_secs(self.config.keepalive_secs));
            let _ = socket.set_tcp_keepalive(&keepalive);
        }
        let _ = stream.set_nodelay(true);

        let connected = Arc::new(Mutex::new(true));
        let shutdown = Arc::new(Notify::new());
        let (outgoing_tx, outgoing_rx) = mpsc::channel::<Bytes>(DEFAULT_CHANNEL_BUFFER_SIZE);
        let (incoming_tx, incoming_rx) =
            mpsc::channel::<TransportEvent>(DEFAULT_CHANNEL_BUFFER_SIZE);

        let sender = TcpSender {
            tx: outgoing_tx,
            connected: connected.clone(),
            shutdown: shutdown.clone(),
        };
        let receiver = TcpReceiver { rx: incoming_rx };

        let _ = incoming_tx.send(TransportEvent::Connected).await;

        let read_buffer_size = self.config.read_buffer_size;
        tokio::spawn(async move {
            let (reader, writer) = stream.into_split();
            run_tcp_io_loop(
                reader,
                writer,
                outgoing_rx,
                incoming_tx,
                read_buffer_size,
                connected,
                shutdown,
            )
            .await;
        });

        info!("TCP connected to {}", addr);
        Ok((sender, receiver))
    }
}

/// IO loop owning both halves of the socket
async fn run_tcp_io_loop(
    mut reader: OwnedReadHalf,
    mut writer: OwnedWriteHalf,
    mut outgoing_rx: mpsc::Receiver<Bytes>,
    incoming_tx: mpsc::Sender<TransportEvent>,
    read_buffer_size: usize,
    connected: Arc<Mutex<bool>>,
    shutdown: Arc<Notify>,
) {
    let mut read_buf = BytesMut::with_capacity(read_buffer_size);

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                debug!("TCP connection closed locally");
                flush_queued(&mut writer, &mut outgoing_rx).await;
                let _ = writer.shutdown().await;
                let _ = incoming_tx.send(TransportEvent::Closed {
                    reason: Some("closed".to_string()),
                }).await;
                break;
            }

            outgoing = outgoing_rx.recv() => {
                let Some(data) = outgoing else {
                    debug!("TCP sender dropped");
                    let _ = writer.shutdown().await;
                    break;
                };
                if let Err(e) = writer.write_all(&data).await {
                    error!("TCP write error: {}", e);
                    let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                    let _ = incoming_tx.send(TransportEvent::Closed {
                        reason: Some(e.to_string()),
                    }).await;
                    break;
                }
            }

            result = reader.read_buf(&mut read_buf) => {
                match result {
                    Ok(0) => {
                        debug!("TCP connection closed by peer");
                        let _ = incoming_tx.send(TransportEvent::Closed { reason: None }).await;
                        break;
                    }
                    Ok(_) => {
                        let data = read_buf.split().freeze();
                        if incoming_tx.send(TransportEvent::Data(data)).await.is_err() {
                            debug!("TCP receiver dropped");
                            flush_queued(&mut writer, &mut outgoing_rx).await;
                            let _ = writer.shutdown().await;
                            break;
                        }
                        read_buf.reserve(read_buffer_size);
                    }
                    Err(e) => {
                        error!("TCP read error: {}", e);
                        let _ = incoming_tx.send(TransportEvent::Error(e.to_string())).await;
                        let _ = incoming_tx.send(TransportEvent::Closed {
                            reason: Some(e.to_string()),
                        }).await;
                        break;
                    }
                }
            }
        }
    }

    *connected.lock() = false;
}

/// Write whatever was queued before the loop stopped reading
async fn flush_queued(writer: &mut OwnedWriteHalf, outgoing_rx: &mut mpsc::Receiver<Bytes>) {
    while let Ok(data) = outgoing_rx.try_recv() {
        if writer.write_all(&data).await.is_err() {
            break;
        }
    }
}

/// TCP sender for writing bytes
pub struct TcpSender {
    tx: mpsc::Sender<Bytes>,
    connected: Arc<Mutex<bool>>,
    shutdown: Arc<Notify>,
}

#[async_trait]
impl TransportSender for TcpSender {
    async fn send(&self, data: Bytes) -> Result<()> {
        if !*self.connected.lock() {
            return Err(TransportError::NotConnected);
        }

        self.tx
            .send(data)
            .await
            .map_err(|_| TransportError::QueueClosed)
    }

    fn is_connected(&self) -> bool {
        *self.connected.lock()
    }

    async fn close(&self) -> Result<()> {
        *self.connected.lock() = false;
        self.shutdown.notify_one();
        Ok(())
    }
}

/// TCP receiver for reading events
pub struct TcpReceiver {
    rx: mpsc::Receiver<TransportEvent>,
}

#[async_trait]
impl TransportReceiver for TcpReceiver {
    async fn recv(&mut self) -> Option<TransportEvent> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_config_default() {
        let config = TcpConfig::default();
        assert_eq!(config.read_buffer_size, 4096);
        assert_eq!(config.keepalive_secs, 30);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = TcpTransport::new().connect(addr).await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed { addr: a, .. }) if a == addr));
    }
}
