//! Preset discovery handshake tests, driven through the engine

use lw2_core::{Command, DeviceEvent, Engine};

fn connected() -> Engine {
    let mut engine = Engine::new(4);
    engine.on_connected();
    engine
}

#[test]
fn test_found_after_two_refusals() {
    let mut engine = connected();

    let out = engine.handle_line("ERR04");
    assert_eq!(out.commands, vec![Command::QueryPresetName(32)]);

    let out = engine.handle_line("ERR04");
    assert_eq!(out.commands, vec![Command::QueryPresetName(16)]);

    let out = engine.handle_line("(PNAME#16=Room A)");
    assert_eq!(out.events, vec![DeviceEvent::PresetsDiscovered { count: 16 }]);
    assert_eq!(out.commands.len(), 16);
    assert_eq!(out.commands[0], Command::QueryPresetName(1));
    assert_eq!(out.commands[15], Command::QueryPresetName(16));

    assert!(!engine.is_discovering());
    assert_eq!(engine.state().preset_count(), 16);
    // The probe answer itself is not taken as a name.
    assert_eq!(engine.state().preset_name(16), "Preset 16");

    // A later refusal is not a discovery signal.
    assert!(engine.handle_line("ERR04").is_empty());
    assert_eq!(engine.state().preset_count(), 16);
}

#[test]
fn test_all_probes_refused() {
    let mut engine = connected();

    assert_eq!(engine.handle_line("ERR04").commands, vec![Command::QueryPresetName(32)]);
    assert_eq!(engine.handle_line("ERR04").commands, vec![Command::QueryPresetName(16)]);
    assert_eq!(engine.handle_line("ERR04").commands, vec![Command::QueryPresetName(8)]);

    let out = engine.handle_line("ERR04");
    assert!(out.commands.is_empty());
    assert_eq!(out.events, vec![DeviceEvent::PresetsDiscovered { count: 0 }]);
    assert_eq!(engine.state().preset_count(), 0);
    assert!(!engine.is_discovering());

    assert!(engine.handle_line("ERR04").is_empty());
}

#[test]
fn test_first_probe_answered() {
    let mut engine = connected();
    let out = engine.handle_line("(PNAME#64=)");
    assert_eq!(out.events, vec![DeviceEvent::PresetsDiscovered { count: 64 }]);
    assert_eq!(out.commands.len(), 64);
}

#[test]
fn test_spontaneous_name_report_ends_handshake() {
    // Replies are positional; an unrelated report during the window is taken
    // as the probe answer.
    let mut engine = connected();
    let out = engine.handle_line("(PNAME#3=Stage)");
    assert_eq!(out.events, vec![DeviceEvent::PresetsDiscovered { count: 3 }]);
    assert_eq!(engine.state().preset_count(), 3);
}

#[test]
fn test_names_fill_in_after_discovery() {
    let mut engine = connected();
    engine.handle_line("(PNAME#8=)");

    let out = engine.handle_line("(PNAME#2=Lecture)");
    assert_eq!(
        out.events,
        vec![DeviceEvent::PresetNameChanged {
            index: 2,
            name: "Lecture".to_string()
        }]
    );
    assert_eq!(engine.state().presets()[1].label(), "Preset 2: Lecture");
}

#[test]
fn test_reconnect_restarts_discovery() {
    let mut engine = connected();
    engine.handle_line("(PNAME#16=)");
    assert_eq!(engine.state().preset_count(), 16);

    engine.on_disconnected();
    let out = engine.on_connected();
    assert_eq!(out.commands.last(), Some(&Command::QueryPresetName(64)));
    assert_eq!(engine.state().preset_count(), 0);
    assert_eq!(engine.discovery_probe(), Some(64));
}

#[test]
fn test_error_without_handshake_ignored() {
    let mut engine = Engine::new(4);
    assert!(engine.handle_line("ERR04").is_empty());
    assert!(!engine.is_discovering());
}

#[test]
fn test_oversized_answer_is_capped() {
    let mut engine = connected();

    let out = engine.handle_line("(PNAME#5000000=x)");
    assert_eq!(out.events, vec![DeviceEvent::PresetsDiscovered { count: 64 }]);
    assert_eq!(out.commands.len(), 64);
    assert_eq!(engine.state().preset_count(), 64);
}
