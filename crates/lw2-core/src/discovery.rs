//! Preset-count discovery handshake
//!
//! LW2 has no "how many presets" query. A name query past the last preset is
//! answered with `ERR04`, one at or below it with a name report. Probing
//! 64, 32, 16, 8 in turn and taking the index of the first name report that
//! comes back bounds the preset table in at most four round trips.
//!
//! The result is approximate: a device with, say, 20 presets answers the 64
//! and 32 probes with errors and the 16 probe with a name, so it is recorded as
//! having 16. Replies are not correlated with probes either; any name report
//! that arrives while a probe is outstanding ends the handshake with its index,
//! capped at the first probe.

use crate::MAX_PRESET_COUNT;

/// Probe indices, in the order they are tried
pub const PROBE_SEQUENCE: [u32; 4] = [MAX_PRESET_COUNT, 32, 16, 8];

/// What to do after the outstanding probe was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    /// Send a name query for this index and keep waiting
    Probe(u32),
    /// Every probe was refused; the device has no presets
    Exhausted,
}

/// In-flight handshake state; exists only between connect and a terminal outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetDiscovery {
    step: usize,
}

impl PresetDiscovery {
    /// Start probing; returns the handshake and the first index to query
    pub fn start() -> (Self, u32) {
        (Self { step: 0 }, PROBE_SEQUENCE[0])
    }

    /// Index of the outstanding probe
    pub fn probe_value(&self) -> u32 {
        PROBE_SEQUENCE[self.step]
    }

    /// The outstanding probe was refused
    pub fn on_error(&mut self) -> DiscoveryOutcome {
        if self.step + 1 < PROBE_SEQUENCE.len() {
            self.step += 1;
            DiscoveryOutcome::Probe(self.probe_value())
        } else {
            DiscoveryOutcome::Exhausted
        }
    }

    /// A preset name report arrived; ends the handshake and returns the preset
    /// count, which is the reported index up to [`MAX_PRESET_COUNT`]
    pub fn on_preset_name(self, index: u32) -> u32 {
        index.min(MAX_PRESET_COUNT)
    }
}
