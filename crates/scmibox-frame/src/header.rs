//! Packed 32-bit message header.
//!
//! ```text
//!  31    28 27          18 17          10 9            0
//! ┌────────┬──────────────┬──────────────┬──────────────┐
//! │ unused │ sequence     │ protocol id  │ message id   │
//! └────────┴──────────────┴──────────────┴──────────────┘
//! ```

use std::fmt;

const MESSAGE_ID_SHIFT: u32 = 0;
const MESSAGE_ID_MASK: u32 = 0x3FF;
const PROTOCOL_ID_SHIFT: u32 = 10;
const PROTOCOL_ID_MASK: u32 = 0xFF;
const SEQUENCE_SHIFT: u32 = 18;

/// Sequence tokens are 10 bits wide.
pub const SEQUENCE_MASK: u16 = 0x3FF;

/// Identifies one command: which protocol, which operation, which exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub protocol_id: u8,
    pub message_id: u8,
    /// Caller-chosen token echoed back by the firmware. Only the low 10 bits
    /// are transmitted.
    pub sequence: u16,
}

impl MessageHeader {
    pub fn new(protocol_id: u8, message_id: u8, sequence: u16) -> Self {
        Self {
            protocol_id,
            message_id,
            sequence: sequence & SEQUENCE_MASK,
        }
    }

    /// Pack into the wire word.
    pub fn pack(&self) -> u32 {
        ((u32::from(self.message_id) & MESSAGE_ID_MASK) << MESSAGE_ID_SHIFT)
            | ((u32::from(self.protocol_id) & PROTOCOL_ID_MASK) << PROTOCOL_ID_SHIFT)
            | (u32::from(self.sequence & SEQUENCE_MASK) << SEQUENCE_SHIFT)
    }

    /// Unpack a wire word. Bits outside the defined fields are ignored.
    pub fn unpack(word: u32) -> Self {
        Self {
            message_id: ((word >> MESSAGE_ID_SHIFT) & MESSAGE_ID_MASK) as u8,
            protocol_id: ((word >> PROTOCOL_ID_SHIFT) & PROTOCOL_ID_MASK) as u8,
            sequence: ((word >> SEQUENCE_SHIFT) as u16) & SEQUENCE_MASK,
        }
    }
}

impl fmt::Display for MessageHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "proto={:#04x} msg={:#04x} seq={}",
            self.protocol_id, self.message_id, self.sequence
        )
    }
}
