//! Protocol types: inbound responses, outbound commands, notifications

use serde::{Deserialize, Serialize};
use std::fmt;

/// A classified inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `(ALL ...)`: routed input per output, in output order; 0 means nothing routed
    Topology(Vec<u32>),
    /// A line containing `ERR04`: the queried index does not exist
    ErrorCode,
    /// `(INAME#n=text)`
    InputName { index: u32, name: String },
    /// `(ONAME#n=text)`
    OutputName { index: u32, name: String },
    /// `(PNAME#n=text)`
    PresetName { index: u32, name: String },
    /// `(On Im)`
    Crosspoint { output: u32, input: u32 },
    /// `(i: text)` device banner
    Identity(String),
    /// Anything else
    Unrecognized,
}

/// An outbound command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `{i}`
    Identify,
    /// `{VC}`, answered with a topology announcement
    ViewConnections,
    /// `{iname#n=?}`
    QueryInputName(u32),
    /// `{oname#n=?}`
    QueryOutputName(u32),
    /// `{pname#n=?}`
    QueryPresetName(u32),
    /// `{in@out}`
    Route { input: u32, output: u32 },
    /// `{%n}`
    LoadPreset(u32),
    /// `{$n}`
    SavePreset(u32),
    /// Pre-encoded command text, sent as-is
    Raw(String),
}

impl fmt::Display for Command {
    /// Wire text without the line terminator
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Identify => f.write_str("{i}"),
            Command::ViewConnections => f.write_str("{VC}"),
            Command::QueryInputName(n) => write!(f, "{{iname#{}=?}}", n),
            Command::QueryOutputName(n) => write!(f, "{{oname#{}=?}}", n),
            Command::QueryPresetName(n) => write!(f, "{{pname#{}=?}}", n),
            Command::Route { input, output } => write!(f, "{{{}@{}}}", input, output),
            Command::LoadPreset(n) => write!(f, "{{%{}}}", n),
            Command::SavePreset(n) => write!(f, "{{${}}}", n),
            Command::Raw(text) => f.write_str(text),
        }
    }
}

/// Session connection status, for external display
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum ConnectionStatus {
    #[default]
    Unknown,
    Connecting,
    Ok,
    Error(String),
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Unknown => f.write_str("unknown"),
            ConnectionStatus::Connecting => f.write_str("connecting"),
            ConnectionStatus::Ok => f.write_str("ok"),
            ConnectionStatus::Error(msg) => write!(f, "error: {}", msg),
        }
    }
}

/// Change notification for whoever presents the device state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeviceEvent {
    /// Endpoint sets were replaced; option lists and presets need rebuilding
    TopologyChanged { inputs: u32, outputs: u32 },
    InputNameChanged { index: u32, name: String },
    OutputNameChanged { index: u32, name: String },
    PresetNameChanged { index: u32, name: String },
    CrosspointChanged { output: u32, input: u32 },
    /// Discovery finished; `count` is 0 when every probe was refused
    PresetsDiscovered { count: u32 },
    Identity { banner: String },
    StatusChanged { status: ConnectionStatus },
}
