//! Main LW2 client implementation

use parking_lot::{Mutex, RwLock};
use lw2_core::{
    codec, Command, ConnectionStatus, DeviceConfig, DeviceEvent, DeviceState, Endpoint, Engine,
    EngineOutput, LineFramer, PresetSlot,
};
use lw2_transport::{
    TcpConfig, TcpReceiver, TcpSender, TcpTransport, Transport, TransportEvent,
    TransportReceiver, TransportSender,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace};

use crate::builder::Lw2ClientBuilder;
use crate::error::Result;

/// Default capacity of the change-notification channel
pub(crate) const DEFAULT_EVENT_CAPACITY: usize = 256;

/// A live socket and the task reading from it
struct Session {
    sender: Arc<TcpSender>,
    task: JoinHandle<()>,
}

/// Client for one LW2 device
pub struct Lw2Client {
    config: RwLock<DeviceConfig>,
    tcp: TcpConfig,

    /// Protocol engine and device state; only the session task mutates it
    engine: Arc<RwLock<Engine>>,

    /// Connection status for display
    status: Arc<RwLock<ConnectionStatus>>,

    /// Current session, if any
    session: Mutex<Option<Session>>,

    /// Change notifications
    events: broadcast::Sender<DeviceEvent>,
}

impl Lw2Client {
    /// Create a client with default transport settings (use builder for more options)
    pub fn new(config: DeviceConfig) -> Self {
        Self::with_options(config, TcpConfig::default(), DEFAULT_EVENT_CAPACITY)
    }

    pub(crate) fn with_options(config: DeviceConfig, tcp: TcpConfig, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            engine: Arc::new(RwLock::new(Engine::new(config.input_count))),
            config: RwLock::new(config),
            tcp,
            status: Arc::new(RwLock::new(ConnectionStatus::Unknown)),
            session: Mutex::new(None),
            events,
        }
    }

    /// Create a builder
    pub fn builder(host: &str) -> Lw2ClientBuilder {
        Lw2ClientBuilder::new(host)
    }

    /// Open the session. Any existing socket is closed first. With no host
    /// configured this does nothing.
    pub async fn connect(&self) -> Result<()> {
        self.close().await;

        let config = self.config.read().clone();
        if !config.is_configured() {
            debug!("No host configured, not connecting");
            return Ok(());
        }
        config.validate()?;
        let addr = config.socket_addr()?;

        self.engine.write().set_input_count(config.input_count);
        set_status(&self.status, &self.events, ConnectionStatus::Connecting);

        let (sender, receiver) = match TcpTransport::with_config(self.tcp.clone()).connect(addr).await {
            Ok(pair) => pair,
            Err(e) => {
                error!("Network error: {}", e);
                set_status(&self.status, &self.events, ConnectionStatus::Error(e.to_string()));
                return Err(e.into());
            }
        };

        let sender = Arc::new(sender);
        let task = tokio::spawn(run_session(
            config.host.clone(),
            sender.clone(),
            receiver,
            self.engine.clone(),
            self.status.clone(),
            self.events.clone(),
        ));

        *self.session.lock() = Some(Session { sender, task });
        Ok(())
    }

    /// Replace the configuration and reconnect. The old socket, its partial
    /// line buffer and any unfinished preset discovery are discarded.
    pub async fn reconfigure(&self, config: DeviceConfig) -> Result<()> {
        *self.config.write() = config;
        self.connect().await
    }

    /// Close the session, if any
    pub async fn close(&self) {
        let session = self.session.lock().take();
        let Some(session) = session else {
            return;
        };

        // Stop the reader first so the local close is never seen as a fault.
        session.task.abort();
        let _ = session.task.await;
        let _ = session.sender.close().await;

        self.engine.write().on_disconnected();
        set_status(&self.status, &self.events, ConnectionStatus::Unknown);
        debug!("Session closed");
    }

    /// Check if a socket is currently connected
    pub fn is_connected(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .map(|s| s.sender.is_connected())
            .unwrap_or(false)
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.read().clone()
    }

    pub fn config(&self) -> DeviceConfig {
        self.config.read().clone()
    }

    /// Subscribe to change notifications
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the device state
    pub fn state(&self) -> DeviceState {
        self.engine.read().state().clone()
    }

    /// Read the device state in place
    pub fn with_state<R>(&self, f: impl FnOnce(&DeviceState) -> R) -> R {
        f(self.engine.read().state())
    }

    /// Is `output` currently routed from `input`?
    pub fn is_routed(&self, output: u32, input: u32) -> bool {
        self.with_state(|s| s.is_routed(output, input))
    }

    pub fn inputs(&self) -> Vec<Endpoint> {
        self.with_state(|s| s.inputs().to_vec())
    }

    pub fn outputs(&self) -> Vec<Endpoint> {
        self.with_state(|s| s.outputs().to_vec())
    }

    pub fn presets(&self) -> Vec<PresetSlot> {
        self.with_state(|s| s.presets().to_vec())
    }

    pub fn preset_count(&self) -> u32 {
        self.with_state(|s| s.preset_count())
    }

    /// Whether the preset discovery handshake is still running
    pub fn is_discovering(&self) -> bool {
        self.engine.read().is_discovering()
    }

    /// Send pre-encoded command text; the line terminator is appended.
    /// Silently dropped when no socket is connected.
    pub async fn send_command(&self, text: &str) {
        self.send(Command::Raw(text.to_string())).await
    }

    /// Send a command. Silently dropped when no socket is connected.
    pub async fn send(&self, command: Command) {
        let sender = self.session.lock().as_ref().map(|s| s.sender.clone());
        let Some(sender) = sender.filter(|s| s.is_connected()) else {
            debug!("Not connected, dropping {}", command);
            return;
        };

        debug!("sending {} to {}", command, self.config.read().host);
        if let Err(e) = sender.send(codec::encode(&command)).await {
            debug!("Send of {} failed: {}", command, e);
        }
    }

    /// Route `input` to `output`
    pub async fn route(&self, input: u32, output: u32) {
        self.send(Command::Route { input, output }).await
    }

    pub async fn load_preset(&self, preset: u32) {
        self.send(Command::LoadPreset(preset)).await
    }

    pub async fn save_preset(&self, preset: u32) {
        self.send(Command::SavePreset(preset)).await
    }

    /// Ask the device for every input, output and preset name again
    pub async fn query_names(&self) {
        let commands = {
            let engine = self.engine.read();
            let mut commands = engine.name_queries();
            commands.extend(engine.preset_queries());
            commands
        };
        for command in commands {
            self.send(command).await;
        }
    }
}

impl Drop for Lw2Client {
    fn drop(&mut self) {
        if let Some(session) = self.session.get_mut().take() {
            session.task.abort();
        }
    }
}

/// Inbound processing for one socket: strictly in arrival order, one chunk at a time
async fn run_session(
    host: String,
    sender: Arc<TcpSender>,
    mut receiver: TcpReceiver,
    engine: Arc<RwLock<Engine>>,
    status: Arc<RwLock<ConnectionStatus>>,
    events: broadcast::Sender<DeviceEvent>,
) {
    let mut framer = LineFramer::new();

    while let Some(event) = receiver.recv().await {
        match event {
            TransportEvent::Connected => {
                info!("Connected to {}", host);
                let output = engine.write().on_connected();
                set_status(&status, &events, ConnectionStatus::Ok);
                dispatch(&sender, &events, output).await;
            }
            TransportEvent::Data(data) => {
                for line in framer.feed(&data) {
                    trace!("received {:?}", line);
                    let output = engine.write().handle_line(&line);
                    dispatch(&sender, &events, output).await;
                }
            }
            TransportEvent::Error(e) => {
                error!("Network error: {}", e);
                set_status(&status, &events, ConnectionStatus::Error(e));
            }
            TransportEvent::Closed { reason } => {
                info!("Disconnected from {}", host);
                engine.write().on_disconnected();
                if !matches!(*status.read(), ConnectionStatus::Error(_)) {
                    let reason = reason.unwrap_or_else(|| "connection closed".to_string());
                    set_status(&status, &events, ConnectionStatus::Error(reason));
                }
                break;
            }
        }
    }
}

/// Publish notifications, then write follow-up commands as a single buffer
async fn dispatch(
    sender: &TcpSender,
    events: &broadcast::Sender<DeviceEvent>,
    output: EngineOutput,
) {
    for event in output.events {
        log_event(&event);
        let _ = events.send(event);
    }

    if output.commands.is_empty() {
        return;
    }
    for command in &output.commands {
        trace!("queueing {}", command);
    }
    if let Err(e) = sender.send(codec::encode_all(&output.commands)).await {
        debug!("Dropped {} commands: {}", output.commands.len(), e);
    }
}

fn log_event(event: &DeviceEvent) {
    match event {
        DeviceEvent::Identity { banner } => info!("Connected to {}", banner),
        DeviceEvent::PresetsDiscovered { count: 0 } => debug!("Found no presets on device"),
        DeviceEvent::PresetsDiscovered { count } => {
            debug!("Detected {} presets on LW2 device", count)
        }
        DeviceEvent::TopologyChanged { inputs, outputs } => {
            debug!("Topology: {} inputs, {} outputs", inputs, outputs)
        }
        other => trace!("{:?}", other),
    }
}

fn set_status(
    status: &RwLock<ConnectionStatus>,
    events: &broadcast::Sender<DeviceEvent>,
    new: ConnectionStatus,
) {
    {
        let mut current = status.write();
        if *current == new {
            return;
        }
        *current = new.clone();
    }
    let _ = events.send(DeviceEvent::StatusChanged { status: new });
}
