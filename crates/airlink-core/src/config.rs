//! Link layer configuration

use crate::packet::NodeAddress;
use serde::{Deserialize, Serialize};

/// Configuration for a link-layer instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    /// This node's address, used for inbound filtering and outbound
    /// source-stamping
    pub address: NodeAddress,
    /// Acknowledgment window in receive ticks
    pub ack_timeout_ticks: u8,
    /// Maximum frames drained per receive tick (fairness bound)
    pub max_frames_per_tick: u8,
}

impl LinkConfig {
    /// Default acknowledgment window
    pub const DEFAULT_ACK_TIMEOUT_TICKS: u8 = 10;

    /// Default per-tick drain bound
    pub const DEFAULT_MAX_FRAMES_PER_TICK: u8 = 5;

    /// Create a configuration for the given node address with defaults
    pub fn new(address: NodeAddress) -> Self {
        Self {
            address,
            ack_timeout_ticks: Self::DEFAULT_ACK_TIMEOUT_TICKS,
            max_frames_per_tick: Self::DEFAULT_MAX_FRAMES_PER_TICK,
        }
    }

    /// Set the acknowledgment window in ticks
    pub fn with_ack_timeout_ticks(mut self, ticks: u8) -> Self {
        self.ack_timeout_ticks = ticks;
        self
    }

    /// Set the per-tick drain fairness bound
    pub fn with_max_frames_per_tick(mut self, frames: u8) -> Self {
        self.max_frames_per_tick = frames;
        self
    }
}
