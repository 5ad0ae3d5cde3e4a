//! Common test helpers and utilities for LW2 tests
//!
//! This crate provides:
//! - Condition-based waiting (no hardcoded sleeps)
//! - A scripted mock LW2 matrix switcher listening on a local TCP port

use lw2_core::LineFramer;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Default test timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default condition check interval
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(10);

// ============================================================================
// Condition-Based Waiting
// ============================================================================

/// Wait for a condition with timeout - condition-based, not time-based
pub async fn wait_for<F>(check: F, max_wait: Duration) -> bool
where
    F: Fn() -> bool,
{
    let start = Instant::now();
    while start.elapsed() < max_wait {
        if check() {
            return true;
        }
        tokio::time::sleep(DEFAULT_CHECK_INTERVAL).await;
    }
    check()
}

// ============================================================================
// Mock Matrix
// ============================================================================

/// What the mock device looks like
#[derive(Debug, Clone)]
pub struct MockMatrixConfig {
    /// Banner sent in reply to `{i}`
    pub identity: String,
    /// Routed input per output; its length is the output count
    pub routes: Vec<u32>,
    /// Number of inputs that answer name queries
    pub input_count: u32,
    /// Number of presets; queries past it get `ERR04`
    pub preset_count: u32,
    pub input_names: HashMap<u32, String>,
    pub output_names: HashMap<u32, String>,
    pub preset_names: HashMap<u32, String>,
    /// Write replies a few bytes at a time to split lines across reads
    pub dribble: bool,
}

impl Default for MockMatrixConfig {
    fn default() -> Self {
        Self {
            identity: "MX8x8DVI-Mock".to_string(),
            routes: vec![1, 2, 0],
            input_count: 3,
            preset_count: 16,
            input_names: HashMap::new(),
            output_names: HashMap::new(),
            preset_names: HashMap::new(),
            dribble: false,
        }
    }
}

#[derive(Debug, Clone)]
enum Control {
    Push(String),
    Drop,
}

struct MockState {
    config: MockMatrixConfig,
    received: Vec<String>,
    connections: usize,
}

/// A fake LW2 device that answers the commands a client sends
pub struct MockMatrix {
    addr: SocketAddr,
    state: Arc<Mutex<MockState>>,
    control: broadcast::Sender<Control>,
    handle: JoinHandle<()>,
}

impl MockMatrix {
    /// Start with the default 3-output, 16-preset device
    pub async fn start() -> Self {
        Self::start_with_config(MockMatrixConfig::default()).await
    }

    pub async fn start_with_config(config: MockMatrixConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock matrix");
        let addr = listener.local_addr().expect("mock matrix addr");

        let state = Arc::new(Mutex::new(MockState {
            config,
            received: Vec::new(),
            connections: 0,
        }));
        let (control, _) = broadcast::channel(64);

        let accept_state = state.clone();
        let accept_control = control.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accept_state.lock().connections += 1;
                tokio::spawn(serve(
                    stream,
                    accept_state.clone(),
                    accept_control.subscribe(),
                ));
            }
        });

        Self {
            addr,
            state,
            control,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> String {
        self.addr.ip().to_string()
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Command lines received so far, across all connections
    pub fn received(&self) -> Vec<String> {
        self.state.lock().received.clone()
    }

    /// How many received lines equal `line`
    pub fn count_received(&self, line: &str) -> usize {
        self.state.lock().received.iter().filter(|l| *l == line).count()
    }

    /// Number of connections accepted so far
    pub fn connections(&self) -> usize {
        self.state.lock().connections
    }

    /// Current routed input of `output`
    pub fn route_of(&self, output: u32) -> Option<u32> {
        let index = (output as usize).checked_sub(1)?;
        self.state.lock().config.routes.get(index).copied()
    }

    /// Send an unsolicited line to every connected client
    pub fn push_line(&self, line: &str) {
        let _ = self.control.send(Control::Push(line.to_string()));
    }

    /// Close every open connection from the device side
    pub fn drop_connections(&self) {
        let _ = self.control.send(Control::Drop);
    }

    /// Wait until `line` has been received at least `count` times
    pub async fn wait_for_received(&self, line: &str, count: usize) -> bool {
        wait_for(|| self.count_received(line) >= count, DEFAULT_TIMEOUT).await
    }
}

impl Drop for MockMatrix {
    fn drop(&mut self) {
        self.handle.abort();
        let _ = self.control.send(Control::Drop);
    }
}

async fn serve(
    mut stream: TcpStream,
    state: Arc<Mutex<MockState>>,
    mut control: broadcast::Receiver<Control>,
) {
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; 1024];

    loop {
        tokio::select! {
            msg = control.recv() => {
                match msg {
                    Ok(Control::Push(line)) => {
                        let dribble = state.lock().config.dribble;
                        if write_lines(&mut stream, &[line], dribble).await.is_err() {
                            break;
                        }
                    }
                    Ok(Control::Drop) | Err(_) => break,
                }
            }

            result = stream.read(&mut buf) => {
                let n = match result {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                let (replies, dribble) = {
                    let mut state = state.lock();
                    let mut replies = Vec::new();
                    for line in framer.feed(&buf[..n]) {
                        state.received.push(line.clone());
                        replies.extend(reply_to(&mut state.config, &line));
                    }
                    (replies, state.config.dribble)
                };
                if write_lines(&mut stream, &replies, dribble).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn write_lines(stream: &mut TcpStream, lines: &[String], dribble: bool) -> std::io::Result<()> {
    let mut out = Vec::new();
    for line in lines {
        out.extend_from_slice(line.as_bytes());
        out.extend_from_slice(b"\r\n");
    }
    if dribble {
        for chunk in out.chunks(3) {
            stream.write_all(chunk).await?;
            stream.flush().await?;
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        Ok(())
    } else {
        stream.write_all(&out).await
    }
}

/// Device behavior for one command line
fn reply_to(config: &mut MockMatrixConfig, line: &str) -> Vec<String> {
    let Some(body) = line.strip_prefix('{').and_then(|l| l.strip_suffix('}')) else {
        return vec!["(ERR01)".to_string()];
    };

    if body == "i" {
        return vec![format!("(i: {})", config.identity)];
    }
    if body == "VC" {
        let routes: String = config.routes.iter().map(|r| format!("{} ", r)).collect();
        return vec![format!("(ALL {})", routes)];
    }
    if let Some((kind, index)) = parse_name_query(body) {
        return vec![name_reply(config, kind, index)];
    }
    if let Some((input, output)) = body.split_once('@') {
        if let (Ok(input), Ok(output)) = (input.parse::<u32>(), output.parse::<u32>()) {
            if output >= 1 && (output as usize) <= config.routes.len() {
                config.routes[output as usize - 1] = input;
                return vec![format!("(O{} I{})", output, input)];
            }
        }
        return vec!["(ERR02)".to_string()];
    }
    if let Some(n) = body.strip_prefix('%') {
        return vec![format!("(LPR{})", n)];
    }
    if let Some(n) = body.strip_prefix('$') {
        return vec![format!("(SPR{})", n)];
    }
    vec!["(ERR01)".to_string()]
}

fn parse_name_query(body: &str) -> Option<(char, u32)> {
    let rest = body.strip_suffix("=?")?;
    let (tag, index) = rest.split_once('#')?;
    let kind = match tag.to_ascii_lowercase().as_str() {
        "iname" => 'I',
        "oname" => 'O',
        "pname" => 'P',
        _ => return None,
    };
    Some((kind, index.parse().ok()?))
}

fn name_reply(config: &MockMatrixConfig, kind: char, index: u32) -> String {
    let (count, names, default) = match kind {
        'I' => (config.input_count, &config.input_names, format!("Input {}", index)),
        'O' => (
            config.routes.len() as u32,
            &config.output_names,
            format!("Output {}", index),
        ),
        _ => (config.preset_count, &config.preset_names, String::new()),
    };
    if index == 0 || index > count {
        return "(ERR04)".to_string();
    }
    let name = names.get(&index).cloned().unwrap_or(default);
    format!("({}NAME#{}={})", kind, index, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_to_queries() {
        let mut config = MockMatrixConfig::default();
        config.preset_names.insert(2, "Lecture".to_string());

        assert_eq!(reply_to(&mut config, "{VC}"), vec!["(ALL 1 2 0 )"]);
        assert_eq!(reply_to(&mut config, "{pname#64=?}"), vec!["(ERR04)"]);
        assert_eq!(reply_to(&mut config, "{pname#16=?}"), vec!["(PNAME#16=)"]);
        assert_eq!(reply_to(&mut config, "{pname#2=?}"), vec!["(PNAME#2=Lecture)"]);
        assert_eq!(reply_to(&mut config, "{iname#1=?}"), vec!["(INAME#1=Input 1)"]);
        assert_eq!(reply_to(&mut config, "{3@2}"), vec!["(O2 I3)"]);
        assert_eq!(config.routes, vec![1, 3, 0]);
    }
}
