//! Link-layer send/receive state machine
//!
//! Implements the poll-driven reliability core: address filtering,
//! acknowledgment generation and matching, carrier-sense collision
//! avoidance, and timeout bookkeeping for the single outstanding send
//! transaction.
//!
//! ## Cooperative scheduling contract
//!
//! Two routines share this state and must be driven by an external
//! scheduler on different cadences:
//!
//! - [`LinkState::tick_receive`] — fast cadence (~50 ms target). Advances
//!   the logical clock and drains buffered inbound frames up to a
//!   fairness bound.
//! - [`LinkState::tick_transmit`] — main-loop cadence. Makes at most one
//!   carrier-sense-gated transmission attempt and detects ack timeouts.
//!
//! Execution is single-threaded and lock-free at this level; mutual
//! exclusion comes from the caller never running the two routines
//! concurrently. [`crate::node::LinkNode`] wraps this state in a mutex
//! for threaded drivers.

use crate::config::LinkConfig;
use crate::packet::{Packet, PacketType};
use crate::traits::{LinkError, LinkResult, LinkStats, Transceiver};
use tracing::{debug, trace};

/// Logical clock tick, incremented once per receive tick; wraps silently
pub type Tick = u16;

/// Lifecycle of the single send transaction slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// No transaction outstanding
    Idle,
    /// Queued, not yet attempted
    Pending,
    /// Deferred because carrier was detected; retry scheduled
    WaitingForChannel,
    /// Frame sent, awaiting matching acknowledgment
    WaitingForAck,
    /// Matching acknowledgment received
    Succeeded,
    /// Acknowledgment window elapsed
    TimedOut,
}

/// Terminal result of a send transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// A matching acknowledgment arrived in time
    Delivered,
    /// No matching acknowledgment within the deadline
    TimedOut,
}

/// The link-layer protocol state machine
///
/// Holds the logical clock, the single-slot send transaction, the staged
/// acknowledgment and the pending inbound packet. All buffers are
/// fixed-size and reused; nothing allocates on the hot path.
#[derive(Debug)]
pub struct LinkState {
    config: LinkConfig,
    /// Logical clock, +1 per receive tick
    timer: Tick,
    /// Per-device sequence counter stamped into outgoing data frames
    sequence: u8,
    send_state: SendState,
    /// Outgoing packet, held for the duration of the transaction
    outgoing: Option<Packet>,
    /// Tick at which a WaitingForAck transaction times out
    ack_deadline: Tick,
    /// Tick at which a WaitingForChannel transaction retries
    retry_at: Tick,
    /// At most one pending outbound acknowledgment
    staged_ack: Option<Packet>,
    /// Most recently received data frame not yet consumed by the caller
    inbound: Option<Packet>,
    stats: LinkStats,
}

impl LinkState {
    /// Create a new link state machine
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            timer: 0,
            sequence: 0,
            send_state: SendState::Idle,
            outgoing: None,
            ack_deadline: 0,
            retry_at: 0,
            staged_ack: None,
            inbound: None,
            stats: LinkStats::default(),
        }
    }

    /// Wraparound-safe deadline check on the logical clock
    ///
    /// True once `now` has reached or passed `deadline`, tolerating ticks
    /// where the transmit routine was not invoked. Plain equality would
    /// miss the deadline forever in that case.
    fn deadline_reached(now: Tick, deadline: Tick) -> bool {
        now.wrapping_sub(deadline) as i16 >= 0
    }

    /// Receive drainer: invoke once per tick (~50 ms target)
    ///
    /// Increments the logical clock, then drains buffered inbound frames
    /// while the pending-inbound slot is empty, up to
    /// [`LinkConfig::max_frames_per_tick`] frames. The cap bounds time
    /// spent here per invocation; a burst of traffic cannot starve the
    /// caller's other duties. Remaining frames wait for the next tick,
    /// absorbed by the transceiver's internal queue.
    pub fn tick_receive<T: Transceiver>(&mut self, radio: &mut T) {
        self.timer = self.timer.wrapping_add(1);

        let mut drained = 0;
        while drained < self.config.max_frames_per_tick
            && self.inbound.is_none()
            && radio.has_incoming_frame()
        {
            let Some(raw) = radio.receive_frame() else {
                break;
            };
            drained += 1;
            self.stats.frames_rx += 1;

            let Some(packet) = Packet::from_bytes(&raw) else {
                self.stats.frames_invalid += 1;
                trace!("dropping undecodable frame");
                continue;
            };

            if !packet.is_for(self.config.address) {
                // Not for us: shared channel, silent discard
                self.stats.frames_ignored += 1;
                trace!(receiver = %packet.receiver, "ignoring frame for another node");
                continue;
            }

            if packet.packet_type.is_ack() {
                self.handle_ack(packet);
            } else {
                self.handle_data(packet);
            }
        }
    }

    fn handle_ack(&mut self, packet: Packet) {
        let matched = self.send_state == SendState::WaitingForAck
            && self
                .outgoing
                .is_some_and(|out| out.counter == packet.counter);

        if matched {
            debug!(counter = packet.counter, "ack matched, send succeeded");
            self.send_state = SendState::Succeeded;
            self.stats.acks_matched += 1;

            // An ack-response carries payload for the caller; deliver it
            // through the inbound slot when there is room.
            if packet.packet_type == PacketType::AckResponse && self.inbound.is_none() {
                self.inbound = Some(packet);
            }
        } else {
            // Stale or foreign ack: duplicate delivery, or arrived after a
            // local timeout. Expected channel noise, not an error.
            self.stats.acks_stale += 1;
            trace!(counter = packet.counter, "discarding stale ack");
        }
    }

    fn handle_data(&mut self, packet: Packet) {
        // Acks are unicast back to the true sender, never multicast
        self.staged_ack = Some(Packet::ack_for(&packet, self.config.address));
        self.stats.acks_staged += 1;
        trace!(
            sender = %packet.sender,
            counter = packet.counter,
            "data frame accepted, ack staged"
        );
        self.inbound = Some(packet);
    }

    /// Transmit attempter: invoke from the main control loop
    ///
    /// Makes at most one carrier-sense-gated transmission attempt per
    /// invocation. A detected carrier defers the transaction with a
    /// jittered retry tick derived from the clock's low bits; no RNG is
    /// involved. A staged acknowledgment goes out ahead of the data frame
    /// in the same burst, or standalone when no data transaction is
    /// eligible. Independently, an elapsed acknowledgment window moves
    /// the transaction to [`SendState::TimedOut`].
    pub fn tick_transmit<T: Transceiver>(&mut self, radio: &mut T) {
        let data_eligible = match self.send_state {
            SendState::Pending => true,
            SendState::WaitingForChannel => Self::deadline_reached(self.timer, self.retry_at),
            _ => false,
        };

        if data_eligible {
            if radio.channel_busy() {
                // Someone else is transmitting: back off until a retry
                // tick derived from the clock's low bits.
                self.send_state = SendState::WaitingForChannel;
                self.retry_at = self
                    .timer
                    .wrapping_add(1)
                    .wrapping_add(self.timer & 0xFC);
                self.stats.tx_deferred += 1;
                trace!(retry_at = self.retry_at, "carrier detected, deferring");
            } else {
                self.flush_staged_ack(radio);
                if let Some(packet) = self.outgoing {
                    radio.begin_transmit(&packet.to_bytes());
                    Self::wait_transmit_done(radio);
                    self.stats.data_tx += 1;
                    self.send_state = SendState::WaitingForAck;
                    self.ack_deadline = self
                        .timer
                        .wrapping_add(Tick::from(self.config.ack_timeout_ticks));
                    debug!(
                        counter = packet.counter,
                        deadline = self.ack_deadline,
                        "data frame sent, awaiting ack"
                    );
                }
            }
        } else if self.staged_ack.is_some() && !radio.channel_busy() {
            // Nothing of our own to send: flush the pending ack standalone
            // so receivers that never transmit data still get acked.
            self.flush_staged_ack(radio);
        }

        if self.send_state == SendState::WaitingForAck
            && Self::deadline_reached(self.timer, self.ack_deadline)
        {
            debug!("ack window elapsed, send timed out");
            self.send_state = SendState::TimedOut;
            self.stats.ack_timeouts += 1;
        }
    }

    fn flush_staged_ack<T: Transceiver>(&mut self, radio: &mut T) {
        if let Some(ack) = self.staged_ack.take() {
            radio.begin_transmit(&ack.to_bytes());
            Self::wait_transmit_done(radio);
            self.stats.acks_tx += 1;
        }
    }

    /// Block until the radio finishes sending; it re-enters receive mode
    /// on its own once done.
    fn wait_transmit_done<T: Transceiver>(radio: &mut T) {
        while radio.transmit_in_progress() {
            std::hint::spin_loop();
        }
    }

    /// Submit a packet for transmission
    ///
    /// Stamps the packet with this node's address and a freshly
    /// incremented sequence counter, and moves the transaction slot to
    /// [`SendState::Pending`]. Fails with [`LinkError::Busy`] while
    /// another transaction is outstanding; at most one send can be in
    /// flight, a second is rejected rather than queued.
    ///
    /// The tick routines never leave the transceiver mid-transmission
    /// (attempts block until the frame is out), so an idle transaction
    /// slot implies the radio is clear for the next frame.
    pub fn submit(&mut self, mut packet: Packet) -> LinkResult<()> {
        if self.send_state != SendState::Idle {
            return Err(LinkError::Busy);
        }
        self.sequence = self.sequence.wrapping_add(1);
        packet.counter = self.sequence;
        packet.sender = self.config.address;
        debug!(receiver = %packet.receiver, counter = packet.counter, "send submitted");
        self.outgoing = Some(packet);
        self.send_state = SendState::Pending;
        Ok(())
    }

    /// Consume a terminal transaction result, freeing the slot
    ///
    /// Returns `None` while the transaction is still in flight (or the
    /// slot is idle). On `Some`, the slot has been reset to
    /// [`SendState::Idle`] and the next submit is accepted.
    pub fn take_outcome(&mut self) -> Option<SendOutcome> {
        let outcome = match self.send_state {
            SendState::Succeeded => SendOutcome::Delivered,
            SendState::TimedOut => SendOutcome::TimedOut,
            _ => return None,
        };
        self.send_state = SendState::Idle;
        self.outgoing = None;
        Some(outcome)
    }

    /// Take the oldest unread received packet, if any. Non-blocking.
    pub fn take_received(&mut self) -> Option<Packet> {
        let packet = self.inbound.take();
        if packet.is_some() {
            self.stats.data_delivered += 1;
        }
        packet
    }

    /// Current state of the send transaction slot
    pub fn send_state(&self) -> SendState {
        self.send_state
    }

    /// Current logical clock value
    pub fn tick(&self) -> Tick {
        self.timer
    }

    /// Operation counters
    pub fn stats(&self) -> LinkStats {
        self.stats
    }

    /// This node's configuration
    pub fn config(&self) -> &LinkConfig {
        &self.config
    }
}
