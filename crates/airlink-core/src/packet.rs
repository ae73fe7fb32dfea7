//! Link-layer packet types and framing
//!
//! Every frame on the air has the same fixed size, matching the radio's
//! configured payload length. There is no variable-length framing.
//!
//! ## Wire layout (32 bytes)
//!
//! ```text
//! ┌────────────┬────────────┬───────────┬───────────┬──────────────┐
//! │ Sender (2B)│ Recv (2B)  │ Counter   │ Type (1B) │ Payload      │
//! │            │            │   (1B)    │           │   (26B)      │
//! └────────────┴────────────┴───────────┴───────────┴──────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Node address - 16-bit identifier assigned once at setup
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeAddress(u16);

impl NodeAddress {
    /// Multicast address, matched by every receiver (all 0xFF)
    pub const MULTICAST: NodeAddress = NodeAddress(0xFFFF);

    /// Unknown/unset address
    pub const UNSET: NodeAddress = NodeAddress(0x0000);

    /// Create a NodeAddress from a u16
    pub fn from_u16(value: u16) -> Self {
        NodeAddress(value)
    }

    /// Convert to u16
    pub fn to_u16(&self) -> u16 {
        self.0
    }

    /// Get the big-endian wire bytes
    pub fn to_be_bytes(&self) -> [u8; 2] {
        self.0.to_be_bytes()
    }

    /// Decode from big-endian wire bytes
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        NodeAddress(u16::from_be_bytes(bytes))
    }

    /// Check if this is the multicast address
    pub fn is_multicast(&self) -> bool {
        *self == Self::MULTICAST
    }
}

impl fmt::Debug for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeAddress({:04x})", self.0)
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}", self.0)
    }
}

impl From<u16> for NodeAddress {
    fn from(value: u16) -> Self {
        NodeAddress(value)
    }
}

/// Packet types carried in the frame's type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum PacketType {
    /// Application data
    Data = 0,
    /// Acknowledgment of a received data frame
    Ack = 1,
    /// Acknowledgment carrying a response payload
    AckResponse = 2,
}

impl PacketType {
    /// Create from byte value; unknown values are a decode failure
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(PacketType::Data),
            1 => Some(PacketType::Ack),
            2 => Some(PacketType::AckResponse),
            _ => None,
        }
    }

    /// Check if this is an acknowledgment type (Ack or AckResponse)
    pub fn is_ack(&self) -> bool {
        matches!(self, PacketType::Ack | PacketType::AckResponse)
    }
}

/// A complete link-layer packet
///
/// Fixed-size POD: the encoded form always occupies [`Packet::WIRE_SIZE`]
/// bytes, the radio's configured payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Sending node's address (stamped on submit)
    pub sender: NodeAddress,
    /// Destination address (may be [`NodeAddress::MULTICAST`])
    pub receiver: NodeAddress,
    /// Per-sender sequence counter, wraps
    pub counter: u8,
    /// Type tag
    pub packet_type: PacketType,
    /// Fixed-size payload block
    pub payload: [u8; Packet::PAYLOAD_LEN],
}

impl Packet {
    /// Encoded frame size in bytes (nRF24-class radios cap frames at 32)
    pub const WIRE_SIZE: usize = 32;

    /// Fixed payload size in bytes
    pub const PAYLOAD_LEN: usize = Self::WIRE_SIZE - 6;

    /// Create a data packet for the given destination
    ///
    /// The payload is copied into the fixed-size block, zero-padded or
    /// truncated to [`Packet::PAYLOAD_LEN`]. Sender and counter are
    /// stamped later, when the packet is submitted for transmission.
    pub fn data(receiver: NodeAddress, payload: &[u8]) -> Self {
        let mut block = [0u8; Self::PAYLOAD_LEN];
        let n = payload.len().min(Self::PAYLOAD_LEN);
        block[..n].copy_from_slice(&payload[..n]);
        Self {
            sender: NodeAddress::UNSET,
            receiver,
            counter: 0,
            packet_type: PacketType::Data,
            payload: block,
        }
    }

    /// Create the acknowledgment for a received data packet
    ///
    /// Acks are always unicast back to the original sender and echo the
    /// data frame's counter. `own_address` is stamped as the ack's sender
    /// so that multicast data is answered from the real receiver, not the
    /// multicast address.
    pub fn ack_for(data: &Packet, own_address: NodeAddress) -> Self {
        Self {
            sender: own_address,
            receiver: data.sender,
            counter: data.counter,
            packet_type: PacketType::Ack,
            payload: [0u8; Self::PAYLOAD_LEN],
        }
    }

    /// Check if this packet is addressed to the given node (or multicast)
    pub fn is_for(&self, address: NodeAddress) -> bool {
        self.receiver == address || self.receiver.is_multicast()
    }

    /// Serialize to the fixed wire form
    pub fn to_bytes(&self) -> [u8; Self::WIRE_SIZE] {
        let mut bytes = [0u8; Self::WIRE_SIZE];
        bytes[0..2].copy_from_slice(&self.sender.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.receiver.to_be_bytes());
        bytes[4] = self.counter;
        bytes[5] = self.packet_type as u8;
        bytes[6..].copy_from_slice(&self.payload);
        bytes
    }

    /// Deserialize from wire bytes
    ///
    /// Returns `None` for short frames or unknown type tags; such frames
    /// are channel noise and are discarded by the receive path.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::WIRE_SIZE {
            return None;
        }
        let packet_type = PacketType::from_byte(bytes[5])?;
        let mut payload = [0u8; Self::PAYLOAD_LEN];
        payload.copy_from_slice(&bytes[6..Self::WIRE_SIZE]);
        Some(Self {
            sender: NodeAddress::from_be_bytes([bytes[0], bytes[1]]),
            receiver: NodeAddress::from_be_bytes([bytes[2], bytes[3]]),
            counter: bytes[4],
            packet_type,
            payload,
        })
    }
}
