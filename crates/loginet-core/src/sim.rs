//! Simulation bookkeeping types.

use crate::fixed::Ticks;

// ---------------------------------------------------------------------------
// Simulation state
// ---------------------------------------------------------------------------

/// Mutable simulation state tracked by the network.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimState {
    /// Completed ticks. Incremented once per successful tick.
    pub tick: Ticks,
}

impl SimState {
    /// Create a new simulation state starting at tick 0.
    pub fn new() -> Self {
        Self::default()
    }
}

// ---------------------------------------------------------------------------
// Tick results
// ---------------------------------------------------------------------------

/// What happened during a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickResult {
    /// The tick that just completed (1-based).
    pub tick: Ticks,
    /// Units manufactured across all producers.
    pub produced: u64,
    /// Shipments handed to delay lines, including empty ones.
    pub shipments: u64,
    /// Units placed in transit.
    pub shipped: u64,
}

/// Aggregate of several ticks run through `Network::advance`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvanceResult {
    pub ticks_run: u64,
    pub produced: u64,
    pub shipped: u64,
}

impl AdvanceResult {
    pub(crate) fn absorb(&mut self, tick: &TickResult) {
        self.ticks_run += 1;
        self.produced += tick.produced;
        self.shipped += tick.shipped;
    }
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// Running FNV-1a (64-bit) digest over network state, used to compare two
/// runs tick by tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash {
    state: u64,
}

impl StateHash {
    pub fn new() -> Self {
        Self { state: 0xcbf2_9ce4_8422_2325 }
    }

    fn mix(&mut self, bytes: &[u8]) {
        self.state = bytes.iter().fold(self.state, |acc, &b| {
            (acc ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
        });
    }

    pub fn write_u32(&mut self, v: u32) {
        self.mix(&v.to_le_bytes());
    }

    pub fn write_u64(&mut self, v: u64) {
        self.mix(&v.to_le_bytes());
    }

    pub fn finish(self) -> u64 {
        self.state
    }
}
