//! Mailbox message framing.
//!
//! Every request placed in the shared channel is framed as:
//! - a 4-byte length (bytes that follow, header included)
//! - a 4-byte packed header carrying message id, protocol id and sequence token
//! - zero or more 32-bit payload words
//!
//! Responses reuse the same framing; their first payload word is the status.

pub mod codec;
pub mod error;
pub mod header;

pub use codec::{
    decode_response, encode_message, response_word_count, EncodedMessage, Response, HEADER_SIZE,
};
pub use error::{FrameError, Result};
pub use header::{MessageHeader, SEQUENCE_MASK};
