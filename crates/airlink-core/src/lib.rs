//! # airlink — polled link-layer reliability protocol
//!
//! This crate implements addressed, acknowledged, retried packet delivery
//! between nodes sharing one half-duplex radio channel that is accessed
//! through periodic polling rather than interrupts. It provides carrier
//! sense collision avoidance and multicast support; the physical radio
//! (registers, SPI, pins) lives behind the [`Transceiver`] trait.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Application                             │
//! │        send (blocking)  /  recv (non-blocking)              │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 LinkNode / LinkHandle                       │
//! │        (mutex-guarded state, condvar completion)            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       LinkState                             │
//! │  ┌──────────────┐  ┌───────────────┐  ┌─────────────────┐   │
//! │  │ tick_receive │  │ tick_transmit │  │ send transaction│   │
//! │  │ (drain+ack)  │  │ (CSMA + retry)│  │ (single slot)   │   │
//! │  └──────────────┘  └───────────────┘  └─────────────────┘   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Transceiver trait                         │
//! │  has_incoming_frame │ channel_busy │ begin_transmit │ ...   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use airlink_core::{LinkConfig, LinkNode, NodeAddress, Packet, SharedAir};
//!
//! // Two nodes on a simulated shared channel
//! let air = SharedAir::new();
//! let mut alpha = LinkNode::new(air.attach(), LinkConfig::new(NodeAddress::from_u16(1)));
//! let mut beta = LinkNode::new(air.attach(), LinkConfig::new(NodeAddress::from_u16(2)));
//!
//! let sender = alpha.handle();
//! sender.try_send(Packet::data(NodeAddress::from_u16(2), b"hello")).unwrap();
//!
//! // Ticks are normally driven by a scheduler; here by hand
//! alpha.tick_transmit();
//! beta.tick_receive();
//! beta.tick_transmit();
//! alpha.tick_receive();
//!
//! assert!(sender.poll_outcome().is_some());
//! assert!(beta.handle().recv().is_some());
//! ```

pub mod config;
pub mod link;
pub mod node;
pub mod packet;
pub mod sim;
pub mod traits;

// Re-export main types
pub use config::LinkConfig;
pub use link::{LinkState, SendOutcome, SendState, Tick};
pub use node::{LinkHandle, LinkNode};
pub use packet::{NodeAddress, Packet, PacketType};
pub use sim::{SharedAir, SimRadio};
pub use traits::{LinkError, LinkResult, LinkStats, Transceiver};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::LinkConfig;
    pub use crate::link::{SendOutcome, SendState};
    pub use crate::node::{LinkHandle, LinkNode};
    pub use crate::packet::{NodeAddress, Packet, PacketType};
    pub use crate::traits::{LinkError, LinkResult, Transceiver};
}
