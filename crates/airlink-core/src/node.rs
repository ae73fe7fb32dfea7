//! Threaded front-end over the link state machine
//!
//! [`LinkState`] relies on single-threaded execution for mutual
//! exclusion. [`LinkNode`] wraps it in a mutex and pairs it with the
//! radio so the tick routines can run on a driver thread while callers
//! block in [`LinkHandle::send`] on a condvar — the cooperative
//! busy-wait of the polled original, rendered for a preemptive target.
//!
//! Progress of a blocked `send` depends entirely on the tick routines
//! being invoked: never call it from the thread that drives them.

use crate::config::LinkConfig;
use crate::link::{LinkState, SendOutcome, SendState};
use crate::packet::Packet;
use crate::traits::{LinkError, LinkResult, LinkStats, Transceiver};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::debug;

struct Shared {
    state: Mutex<LinkState>,
    tx_done: Condvar,
}

impl Shared {
    fn lock_state(&self) -> MutexGuard<'_, LinkState> {
        // A panic mid-tick leaves no torn protocol state worth rejecting
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A link-layer node: the radio plus the shared protocol state
///
/// Owns the transceiver. The tick methods are the scheduling contract:
/// [`LinkNode::tick_receive`] on a fast periodic cadence (~50 ms target),
/// [`LinkNode::tick_transmit`] from the driving loop at any cadence.
pub struct LinkNode<T: Transceiver> {
    radio: T,
    shared: Arc<Shared>,
}

impl<T: Transceiver> LinkNode<T> {
    /// Create a node, powering the radio up into receive mode
    pub fn new(mut radio: T, config: LinkConfig) -> Self {
        radio.power_up();
        Self {
            radio,
            shared: Arc::new(Shared {
                state: Mutex::new(LinkState::new(config)),
                tx_done: Condvar::new(),
            }),
        }
    }

    /// Get a cloneable application-facing handle
    pub fn handle(&self) -> LinkHandle {
        LinkHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Drive inbound processing and the logical clock. Invoke periodically.
    pub fn tick_receive(&mut self) {
        let mut state = self.shared.lock_state();
        state.tick_receive(&mut self.radio);
        let terminal = matches!(
            state.send_state(),
            SendState::Succeeded | SendState::TimedOut
        );
        drop(state);
        if terminal {
            self.shared.tx_done.notify_all();
        }
    }

    /// Drive outbound attempts and timeout detection. Invoke from the
    /// main control loop.
    pub fn tick_transmit(&mut self) {
        let mut state = self.shared.lock_state();
        state.tick_transmit(&mut self.radio);
        let terminal = matches!(
            state.send_state(),
            SendState::Succeeded | SendState::TimedOut
        );
        drop(state);
        if terminal {
            self.shared.tx_done.notify_all();
        }
    }

    /// Power the radio down
    pub fn power_down(&mut self) {
        self.radio.power_down();
    }
}

/// Cloneable application-facing handle to a [`LinkNode`]
///
/// Safe to use from any thread except the one driving the node's ticks.
#[derive(Clone)]
pub struct LinkHandle {
    shared: Arc<Shared>,
}

impl LinkHandle {
    /// Send a packet and block until the transaction resolves
    ///
    /// Stamps the packet and waits for the matching acknowledgment.
    /// Returns [`LinkError::Busy`] immediately if another send is
    /// outstanding, [`LinkError::AckTimeout`] if the acknowledgment
    /// window elapses. There is no cancellation and no automatic
    /// resubmission; retrying after a timeout is the caller's decision.
    pub fn send(&self, packet: Packet) -> LinkResult<()> {
        let mut state = self.shared.lock_state();
        state.submit(packet)?;
        loop {
            if let Some(outcome) = state.take_outcome() {
                debug!(?outcome, "send resolved");
                return match outcome {
                    SendOutcome::Delivered => Ok(()),
                    SendOutcome::TimedOut => Err(LinkError::AckTimeout),
                };
            }
            state = self
                .shared
                .tx_done
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Submit a packet without blocking
    ///
    /// Poll [`LinkHandle::poll_outcome`] for the result.
    pub fn try_send(&self, packet: Packet) -> LinkResult<()> {
        self.shared.lock_state().submit(packet)
    }

    /// Consume the terminal result of a [`LinkHandle::try_send`], if the
    /// transaction has resolved. Frees the send slot.
    pub fn poll_outcome(&self) -> Option<SendOutcome> {
        self.shared.lock_state().take_outcome()
    }

    /// Take the oldest unread received packet, if any. Non-blocking.
    pub fn recv(&self) -> Option<Packet> {
        self.shared.lock_state().take_received()
    }

    /// Snapshot of the node's operation counters
    pub fn stats(&self) -> LinkStats {
        self.shared.lock_state().stats()
    }
}
