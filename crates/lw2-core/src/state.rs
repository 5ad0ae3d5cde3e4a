//! Device state cache
//!
//! Endpoints and presets are 1-based on the wire and stored densely; a name
//! report for an index past the end grows the list with default-named slots,
//! but never past the per-kind limit in the crate root.
//! The crosspoint map is keyed by output index and only ever holds outputs the
//! device itself reported.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::{MAX_INPUT_COUNT, MAX_OUTPUT_COUNT, MAX_PRESET_COUNT};

/// An input or output port
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    /// 1-based port index
    pub index: u32,
    /// Display name
    pub name: String,
}

impl Endpoint {
    pub fn input(index: u32) -> Self {
        Self {
            index,
            name: default_input_name(index),
        }
    }

    pub fn output(index: u32) -> Self {
        Self {
            index,
            name: default_output_name(index),
        }
    }
}

/// A stored preset slot on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresetSlot {
    /// 1-based preset index
    pub index: u32,
    /// Display name
    pub name: String,
}

impl PresetSlot {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            name: default_preset_name(index),
        }
    }

    /// Option-list label, e.g. `Preset 3: Stage`
    pub fn label(&self) -> String {
        format!("Preset {}: {}", self.index, self.name)
    }
}

pub fn default_input_name(index: u32) -> String {
    format!("Input {}", index)
}

pub fn default_output_name(index: u32) -> String {
    format!("Output {}", index)
}

pub fn default_preset_name(index: u32) -> String {
    format!("Preset {}", index)
}

/// Output index → routed input index, 0 meaning nothing committed yet
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrosspointMap(BTreeMap<u32, u32>);

impl CrosspointMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a topology announcement (first entry is output 1)
    pub fn from_routes(routes: &[u32]) -> Self {
        Self(
            routes
                .iter()
                .zip(1u32..)
                .map(|(&input, output)| (output, input))
                .collect(),
        )
    }

    /// Routed input of `output`; `None` when unknown or nothing routed
    pub fn get(&self, output: u32) -> Option<u32> {
        self.0.get(&output).copied().filter(|&input| input != 0)
    }

    /// Raw entry including the 0 placeholder
    pub fn entry(&self, output: u32) -> Option<u32> {
        self.0.get(&output).copied()
    }

    /// Record a crosspoint, overwriting whatever was there
    pub fn set(&mut self, output: u32, input: u32) {
        self.0.insert(output, input);
    }

    pub fn is_routed(&self, output: u32, input: u32) -> bool {
        self.get(output) == Some(input)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Iterate `(output, input)` in output order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.0.iter().map(|(&o, &i)| (o, i))
    }
}

/// Everything known about the connected device
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceState {
    inputs: Vec<Endpoint>,
    outputs: Vec<Endpoint>,
    presets: Vec<PresetSlot>,
    crosspoints: CrosspointMap,
    identity: Option<String>,
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the endpoint sets and crosspoints from a topology announcement.
    /// All names go back to their defaults.
    pub fn apply_topology(&mut self, routes: &[u32], input_count: u32) {
        self.outputs = (1..=routes.len() as u32).map(Endpoint::output).collect();
        self.inputs = (1..=input_count).map(Endpoint::input).collect();
        self.crosspoints = CrosspointMap::from_routes(routes);
    }

    /// Returns false for index 0, which has no slot, and for an index past
    /// both the current list and [`MAX_INPUT_COUNT`]
    pub fn set_input_name(&mut self, index: u32, name: &str) -> bool {
        set_name(&mut self.inputs, index, MAX_INPUT_COUNT, name, Endpoint::input, |e| &mut e.name)
    }

    pub fn set_output_name(&mut self, index: u32, name: &str) -> bool {
        set_name(&mut self.outputs, index, MAX_OUTPUT_COUNT, name, Endpoint::output, |e| &mut e.name)
    }

    pub fn set_preset_name(&mut self, index: u32, name: &str) -> bool {
        set_name(&mut self.presets, index, MAX_PRESET_COUNT, name, PresetSlot::new, |p| &mut p.name)
    }

    pub fn set_crosspoint(&mut self, output: u32, input: u32) {
        self.crosspoints.set(output, input);
    }

    /// Replace the preset list with `count` default-named slots
    pub fn reset_presets(&mut self, count: u32) {
        self.presets = (1..=count).map(PresetSlot::new).collect();
    }

    pub fn clear_presets(&mut self) {
        self.presets.clear();
    }

    pub fn set_identity(&mut self, banner: &str) {
        self.identity = Some(banner.to_string());
    }

    pub fn inputs(&self) -> &[Endpoint] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Endpoint] {
        &self.outputs
    }

    pub fn presets(&self) -> &[PresetSlot] {
        &self.presets
    }

    pub fn preset_count(&self) -> u32 {
        self.presets.len() as u32
    }

    pub fn crosspoints(&self) -> &CrosspointMap {
        &self.crosspoints
    }

    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Is `output` currently routed from `input`?
    pub fn is_routed(&self, output: u32, input: u32) -> bool {
        self.crosspoints.is_routed(output, input)
    }

    pub fn input_name(&self, index: u32) -> String {
        lookup(&self.inputs, index, |e| &e.name).unwrap_or_else(|| default_input_name(index))
    }

    pub fn output_name(&self, index: u32) -> String {
        lookup(&self.outputs, index, |e| &e.name).unwrap_or_else(|| default_output_name(index))
    }

    pub fn preset_name(&self, index: u32) -> String {
        lookup(&self.presets, index, |p| &p.name).unwrap_or_else(|| default_preset_name(index))
    }

    /// `input_N` / `output_N` / `preset_N` → display name, for text substitution
    /// on a control surface
    pub fn variables(&self) -> Vec<(String, String)> {
        let inputs = self
            .inputs
            .iter()
            .map(|e| (format!("input_{}", e.index), e.name.clone()));
        let outputs = self
            .outputs
            .iter()
            .map(|e| (format!("output_{}", e.index), e.name.clone()));
        let presets = self
            .presets
            .iter()
            .map(|p| (format!("preset_{}", p.index), p.name.clone()));
        inputs.chain(outputs).chain(presets).collect()
    }
}

/// Existing slots are always writable; new ones are only created up to `limit`
fn set_name<T>(
    list: &mut Vec<T>,
    index: u32,
    limit: u32,
    name: &str,
    make: impl Fn(u32) -> T,
    name_of: impl Fn(&mut T) -> &mut String,
) -> bool {
    if index == 0 || (index as usize > list.len() && index > limit) {
        return false;
    }
    while list.len() < index as usize {
        let next = list.len() as u32 + 1;
        list.push(make(next));
    }
    *name_of(&mut list[index as usize - 1]) = name.to_string();
    true
}

fn lookup<T>(list: &[T], index: u32, name_of: impl Fn(&T) -> &String) -> Option<String> {
    let slot = (index as usize).checked_sub(1)?;
    list.get(slot).map(|item| name_of(item).clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_index_rejected() {
        let mut state = DeviceState::new();
        assert!(!state.set_input_name(0, "Nope"));
        assert!(state.inputs().is_empty());
    }

    #[test]
    fn test_existing_slot_past_limit_is_writable() {
        let mut state = DeviceState::new();
        let routes = vec![1; MAX_OUTPUT_COUNT as usize + 5];
        state.apply_topology(&routes, 2);

        assert!(state.set_output_name(MAX_OUTPUT_COUNT + 5, "Far"));
        assert!(!state.set_output_name(MAX_OUTPUT_COUNT + 6, "Farther"));
        assert_eq!(state.outputs().len(), MAX_OUTPUT_COUNT as usize + 5);
    }

    #[test]
    fn test_preset_label() {
        let mut slot = PresetSlot::new(3);
        assert_eq!(slot.label(), "Preset 3: Preset 3");
        slot.name = "Stage".to_string();
        assert_eq!(slot.label(), "Preset 3: Stage");
    }

    #[test]
    fn test_crosspoint_zero_is_unrouted() {
        let map = CrosspointMap::from_routes(&[0]);
        assert_eq!(map.entry(1), Some(0));
        assert_eq!(map.get(1), None);
        assert!(!map.is_routed(1, 0));
    }
}
