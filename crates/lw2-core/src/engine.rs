//! Sans-IO protocol engine
//!
//! Applies classified lines to the [`DeviceState`], runs the preset discovery
//! handshake and produces the commands and notifications that follow from each
//! line. The caller owns the socket: it writes `commands` in order and
//! forwards `events` to whoever renders the state.

use crate::codec::decode_line;
use crate::discovery::{DiscoveryOutcome, PresetDiscovery};
use crate::state::DeviceState;
use crate::types::{Command, DeviceEvent, Response};
use crate::DEFAULT_INPUT_COUNT;

/// Result of feeding the engine one stimulus
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EngineOutput {
    /// Commands to write to the device, in order
    pub commands: Vec<Command>,
    /// Notifications to publish
    pub events: Vec<DeviceEvent>,
}

impl EngineOutput {
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.events.is_empty()
    }

    fn event(event: DeviceEvent) -> Self {
        Self {
            commands: Vec::new(),
            events: vec![event],
        }
    }
}

/// Protocol state for one device session
#[derive(Debug)]
pub struct Engine {
    state: DeviceState,
    discovery: Option<PresetDiscovery>,
    input_count: u32,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_COUNT)
    }
}

impl Engine {
    pub fn new(input_count: u32) -> Self {
        Self {
            state: DeviceState::new(),
            discovery: None,
            input_count,
        }
    }

    pub fn state(&self) -> &DeviceState {
        &self.state
    }

    pub fn input_count(&self) -> u32 {
        self.input_count
    }

    /// Takes effect at the next topology announcement
    pub fn set_input_count(&mut self, input_count: u32) {
        self.input_count = input_count;
    }

    pub fn is_discovering(&self) -> bool {
        self.discovery.is_some()
    }

    /// Index of the outstanding discovery probe, if any
    pub fn discovery_probe(&self) -> Option<u32> {
        self.discovery.as_ref().map(PresetDiscovery::probe_value)
    }

    /// Socket connected: greet the device and start preset discovery
    pub fn on_connected(&mut self) -> EngineOutput {
        self.state.clear_presets();
        let (discovery, probe) = PresetDiscovery::start();
        self.discovery = Some(discovery);

        EngineOutput {
            commands: vec![
                Command::Identify,
                Command::ViewConnections,
                Command::QueryPresetName(probe),
            ],
            events: Vec::new(),
        }
    }

    /// Socket gone: a half-finished handshake must not survive into the next session
    pub fn on_disconnected(&mut self) {
        self.discovery = None;
    }

    /// Classify and apply one framed line
    pub fn handle_line(&mut self, line: &str) -> EngineOutput {
        self.apply(decode_line(line))
    }

    /// Apply an already classified response
    pub fn apply(&mut self, response: Response) -> EngineOutput {
        match response {
            Response::Topology(routes) => self.on_topology(&routes),
            Response::ErrorCode => self.on_error_code(),
            Response::InputName { index, name } => {
                if !self.state.set_input_name(index, &name) {
                    return EngineOutput::default();
                }
                EngineOutput::event(DeviceEvent::InputNameChanged { index, name })
            }
            Response::OutputName { index, name } => {
                if !self.state.set_output_name(index, &name) {
                    return EngineOutput::default();
                }
                EngineOutput::event(DeviceEvent::OutputNameChanged { index, name })
            }
            Response::PresetName { index, name } => self.on_preset_name(index, name),
            Response::Crosspoint { output, input } => {
                self.state.set_crosspoint(output, input);
                EngineOutput::event(DeviceEvent::CrosspointChanged { output, input })
            }
            Response::Identity(banner) => {
                self.state.set_identity(&banner);
                EngineOutput::event(DeviceEvent::Identity { banner })
            }
            Response::Unrecognized => EngineOutput::default(),
        }
    }

    /// Name queries for every known input and output
    pub fn name_queries(&self) -> Vec<Command> {
        let inputs = self.state.inputs().iter().map(|e| Command::QueryInputName(e.index));
        let outputs = self.state.outputs().iter().map(|e| Command::QueryOutputName(e.index));
        inputs.chain(outputs).collect()
    }

    /// Name queries for every known preset
    pub fn preset_queries(&self) -> Vec<Command> {
        self.state
            .presets()
            .iter()
            .map(|p| Command::QueryPresetName(p.index))
            .collect()
    }

    fn on_topology(&mut self, routes: &[u32]) -> EngineOutput {
        self.state.apply_topology(routes, self.input_count);
        EngineOutput {
            commands: self.name_queries(),
            events: vec![DeviceEvent::TopologyChanged {
                inputs: self.state.inputs().len() as u32,
                outputs: self.state.outputs().len() as u32,
            }],
        }
    }

    fn on_error_code(&mut self) -> EngineOutput {
        let Some(discovery) = self.discovery.as_mut() else {
            return EngineOutput::default();
        };

        match discovery.on_error() {
            DiscoveryOutcome::Probe(index) => EngineOutput {
                commands: vec![Command::QueryPresetName(index)],
                events: Vec::new(),
            },
            DiscoveryOutcome::Exhausted => self.finish_discovery(0),
        }
    }

    fn on_preset_name(&mut self, index: u32, name: String) -> EngineOutput {
        if let Some(discovery) = self.discovery.take() {
            let count = discovery.on_preset_name(index);
            return self.finish_discovery(count);
        }

        if !self.state.set_preset_name(index, &name) {
            return EngineOutput::default();
        }
        EngineOutput::event(DeviceEvent::PresetNameChanged { index, name })
    }

    fn finish_discovery(&mut self, count: u32) -> EngineOutput {
        self.discovery = None;
        self.state.reset_presets(count);
        EngineOutput {
            commands: self.preset_queries(),
            events: vec![DeviceEvent::PresetsDiscovered { count }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connect_greets_and_probes() {
        let mut engine = Engine::new(4);
        let out = engine.on_connected();
        assert_eq!(
            out.commands,
            vec![
                Command::Identify,
                Command::ViewConnections,
                Command::QueryPresetName(64)
            ]
        );
        assert_eq!(engine.discovery_probe(), Some(64));
    }

    #[test]
    fn test_disconnect_discards_discovery() {
        let mut engine = Engine::new(4);
        engine.on_connected();
        engine.handle_line("ERR04");
        assert_eq!(engine.discovery_probe(), Some(32));

        engine.on_disconnected();
        assert!(!engine.is_discovering());
        assert!(engine.handle_line("ERR04").is_empty());
    }

    #[test]
    fn test_other_error_codes_do_not_advance() {
        let mut engine = Engine::new(4);
        engine.on_connected();
        assert!(engine.handle_line("(ERR01)").is_empty());
        assert_eq!(engine.discovery_probe(), Some(64));
    }
}
