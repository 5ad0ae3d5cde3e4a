//! Engine tests: line application, follow-up commands and notifications

use lw2_core::{Command, DeviceEvent, Engine};

#[test]
fn test_topology_announcement() {
    let mut engine = Engine::new(3);
    let out = engine.handle_line("(ALL 1 2 0 )");

    assert_eq!(
        out.events,
        vec![DeviceEvent::TopologyChanged {
            inputs: 3,
            outputs: 3
        }]
    );
    assert_eq!(
        out.commands,
        vec![
            Command::QueryInputName(1),
            Command::QueryInputName(2),
            Command::QueryInputName(3),
            Command::QueryOutputName(1),
            Command::QueryOutputName(2),
            Command::QueryOutputName(3),
        ]
    );

    let state = engine.state();
    assert!(state.is_routed(1, 1));
    assert!(state.is_routed(2, 2));
    assert_eq!(state.crosspoints().entry(3), Some(0));
}

#[test]
fn test_crosspoint_change() {
    let mut engine = Engine::new(3);
    engine.handle_line("(ALL 1 2 0 )");

    let out = engine.handle_line("(O2 I5)");
    assert_eq!(
        out.events,
        vec![DeviceEvent::CrosspointChanged { output: 2, input: 5 }]
    );
    assert!(out.commands.is_empty());

    let state = engine.state();
    assert!(state.is_routed(2, 5));
    assert!(!state.is_routed(2, 2));
    let xpt: Vec<_> = state.crosspoints().iter().collect();
    assert_eq!(xpt, vec![(1, 1), (2, 5), (3, 0)]);
}

#[test]
fn test_name_reports() {
    let mut engine = Engine::new(2);
    engine.handle_line("(ALL 1 1)");

    let out = engine.handle_line("(INAME#2=Laptop)");
    assert_eq!(
        out.events,
        vec![DeviceEvent::InputNameChanged {
            index: 2,
            name: "Laptop".to_string()
        }]
    );

    engine.handle_line("(ONAME#1=Projector)");
    assert_eq!(engine.state().input_name(2), "Laptop");
    assert_eq!(engine.state().output_name(1), "Projector");
}

#[test]
fn test_zero_index_name_ignored() {
    let mut engine = Engine::new(2);
    assert!(engine.handle_line("(INAME#0=Nothing)").is_empty());
}

#[test]
fn test_identity() {
    let mut engine = Engine::new(2);
    let out = engine.handle_line("(i: MX8x8DVI)");
    assert_eq!(
        out.events,
        vec![DeviceEvent::Identity {
            banner: "MX8x8DVI".to_string()
        }]
    );
    assert_eq!(engine.state().identity(), Some("MX8x8DVI"));
}

#[test]
fn test_unrecognized_is_noop() {
    let mut engine = Engine::new(2);
    engine.handle_line("(ALL 1 2)");
    assert!(engine.handle_line("(SOMETHING NEW)").is_empty());
    assert!(engine.handle_line("garbage").is_empty());
    assert_eq!(engine.state().outputs().len(), 2);
}

#[test]
fn test_input_count_change_applies_on_next_topology() {
    let mut engine = Engine::new(2);
    engine.handle_line("(ALL 1 2)");
    engine.set_input_count(4);
    assert_eq!(engine.state().inputs().len(), 2);

    engine.handle_line("(ALL 1 2)");
    assert_eq!(engine.state().inputs().len(), 4);
}

#[test]
fn test_topology_during_discovery_leaves_handshake_alone() {
    let mut engine = Engine::new(2);
    engine.on_connected();
    engine.handle_line("(ALL 1 2)");
    assert_eq!(engine.discovery_probe(), Some(64));
}

#[test]
fn test_oversized_name_index_ignored() {
    let mut engine = Engine::new(2);
    engine.handle_line("(ALL 1 1)");

    assert!(engine.handle_line("(INAME#5000000=x)").is_empty());
    assert!(engine.handle_line("(ONAME#4294967295=x)").is_empty());
    assert_eq!(engine.state().inputs().len(), 2);
    assert_eq!(engine.state().outputs().len(), 2);
}

#[test]
fn test_name_with_error_text_is_applied() {
    let mut engine = Engine::new(2);
    engine.handle_line("(ALL 1 1)");

    let out = engine.handle_line("(INAME#1=Camera ERR12)");
    assert_eq!(
        out.events,
        vec![DeviceEvent::InputNameChanged {
            index: 1,
            name: "Camera ERR12".to_string()
        }]
    );
    assert_eq!(engine.state().input_name(1), "Camera ERR12");
}
