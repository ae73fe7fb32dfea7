//! Shared-air channel simulation
//!
//! An in-memory broadcast medium for exercising the protocol without
//! hardware: every frame transmitted by one attached radio lands in the
//! inbox of every other powered radio. Test hooks force the carrier-sense
//! result and frame loss.

use crate::packet::Packet;
use crate::traits::Transceiver;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct AirInner {
    inboxes: Vec<VecDeque<[u8; Packet::WIRE_SIZE]>>,
    powered: Vec<bool>,
    /// Forced carrier-sense result
    carrier: bool,
    /// When set, transmitted frames vanish in the air
    loss: bool,
    frames_sent: u64,
}

/// A simulated shared half-duplex channel
#[derive(Debug, Clone, Default)]
pub struct SharedAir {
    inner: Arc<Mutex<AirInner>>,
}

impl SharedAir {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AirInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a new radio to the medium
    pub fn attach(&self) -> SimRadio {
        let mut inner = self.lock();
        inner.inboxes.push(VecDeque::new());
        inner.powered.push(false);
        SimRadio {
            air: Arc::clone(&self.inner),
            index: inner.inboxes.len() - 1,
        }
    }

    /// Force the carrier-sense result seen by every attached radio
    pub fn set_carrier(&self, busy: bool) {
        self.lock().carrier = busy;
    }

    /// Make the air lossy: transmitted frames are not delivered
    pub fn set_loss(&self, lossy: bool) {
        self.lock().loss = lossy;
    }

    /// Total frames transmitted onto the medium (delivered or lost)
    pub fn frames_sent(&self) -> u64 {
        self.lock().frames_sent
    }
}

/// A radio attached to a [`SharedAir`], implementing [`Transceiver`]
#[derive(Debug)]
pub struct SimRadio {
    air: Arc<Mutex<AirInner>>,
    index: usize,
}

impl SimRadio {
    fn lock(&self) -> MutexGuard<'_, AirInner> {
        self.air.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transceiver for SimRadio {
    fn has_incoming_frame(&mut self) -> bool {
        let inner = self.lock();
        inner.powered[self.index] && !inner.inboxes[self.index].is_empty()
    }

    fn receive_frame(&mut self) -> Option<[u8; Packet::WIRE_SIZE]> {
        let mut inner = self.lock();
        if !inner.powered[self.index] {
            return None;
        }
        inner.inboxes[self.index].pop_front()
    }

    fn channel_busy(&mut self) -> bool {
        self.lock().carrier
    }

    fn begin_transmit(&mut self, frame: &[u8; Packet::WIRE_SIZE]) {
        let mut inner = self.lock();
        inner.frames_sent += 1;
        if inner.loss {
            return;
        }
        // Broadcast medium: everyone but the sender hears the frame.
        // Address filtering is the link layer's job, not the air's.
        for i in 0..inner.inboxes.len() {
            if i != self.index && inner.powered[i] {
                inner.inboxes[i].push_back(*frame);
            }
        }
    }

    fn transmit_in_progress(&mut self) -> bool {
        // Delivery is instantaneous in simulation
        false
    }

    fn power_up(&mut self) {
        self.lock().powered[self.index] = true;
    }

    fn power_down(&mut self) {
        self.lock().powered[self.index] = false;
    }
}
