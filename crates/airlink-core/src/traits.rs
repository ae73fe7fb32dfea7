//! Core link-layer traits and error types
//!
//! The [`Transceiver`] trait is the boundary between the protocol logic
//! and the physical radio. Register access, SPI transfers and pin control
//! all live behind it; the link layer only ever asks the questions below.

use crate::packet::Packet;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by link-layer operations
///
/// The taxonomy is deliberately small and non-fatal: every failure is a
/// returned outcome the caller can act on. Foreign, stale or undecodable
/// frames are expected channel noise and never produce an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A send is already outstanding, or the radio is mid-transmission
    #[error("link busy: a send transaction is already outstanding")]
    Busy,

    /// No matching acknowledgment arrived within the deadline
    #[error("acknowledgment timeout")]
    AckTimeout,
}

/// Result type for link operations
pub type LinkResult<T> = Result<T, LinkError>;

/// Capability interface consumed from the physical radio
///
/// The radio is polled, never interrupt-driven: the link layer calls
/// these methods from its tick routines. Implementations are expected to
/// return to receive mode autonomously once a transmission completes
/// (after which [`Transceiver::transmit_in_progress`] reports `false`).
///
/// All methods take `&mut self`: register-level radios mutate state on
/// every access (status reads clear flags, FIFO reads pop data).
pub trait Transceiver {
    /// Check whether a received frame is buffered and ready to read
    fn has_incoming_frame(&mut self) -> bool;

    /// Pull one buffered frame, clearing the hardware's new-data indicator
    ///
    /// Returns `None` if nothing is buffered after all.
    fn receive_frame(&mut self) -> Option<[u8; Packet::WIRE_SIZE]>;

    /// Carrier sense: is another transmitter active on the channel?
    fn channel_busy(&mut self) -> bool;

    /// Queue a frame and start sending it
    fn begin_transmit(&mut self, frame: &[u8; Packet::WIRE_SIZE]);

    /// Check whether a transmission is still in flight
    fn transmit_in_progress(&mut self) -> bool;

    /// Power the radio up into receive mode
    fn power_up(&mut self);

    /// Power the radio down
    fn power_down(&mut self);
}

/// Counters for link operation
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LinkStats {
    /// Frames pulled from the radio
    pub frames_rx: u64,
    /// Frames addressed to another node, discarded
    pub frames_ignored: u64,
    /// Frames that failed to decode
    pub frames_invalid: u64,
    /// Data frames transmitted
    pub data_tx: u64,
    /// Data frames delivered to the caller
    pub data_delivered: u64,
    /// Acknowledgments staged in response to received data
    pub acks_staged: u64,
    /// Acknowledgments transmitted
    pub acks_tx: u64,
    /// Acknowledgments that resolved an outstanding transaction
    pub acks_matched: u64,
    /// Stale or foreign acknowledgments discarded
    pub acks_stale: u64,
    /// Transmit attempts deferred because carrier was detected
    pub tx_deferred: u64,
    /// Transactions that timed out waiting for an acknowledgment
    pub ack_timeouts: u64,
}
