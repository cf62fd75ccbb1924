use scmibox_shmem::{Channel, SharedRegion};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::header::MessageHeader;

/// Size of the packed header word counted by the length field.
pub const HEADER_SIZE: usize = 4;

const WORD_SIZE: usize = 4;

/// A request ready to be copied into the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage<'a> {
    /// Value for the length field (header + payload bytes).
    pub length: u32,
    /// Packed header word.
    pub header: u32,
    /// Payload words, in wire order.
    pub payload: &'a [u32],
}

/// Encode a request for a channel whose payload area holds `capacity` words.
///
/// Wire format, starting at the length field:
/// ```text
/// ┌──────────────┬──────────────┬──────────────────────────┐
/// │ Length (4B)  │ Header (4B)  │ Payload (4B × n)         │
/// │ 4 + 4n       │ packed ids   │                          │
/// └──────────────┴──────────────┴──────────────────────────┘
/// ```
pub fn encode_message<'a>(
    header: MessageHeader,
    payload: &'a [u32],
    capacity: usize,
) -> Result<EncodedMessage<'a>> {
    if payload.len() > capacity {
        return Err(FrameError::PayloadTooLarge {
            words: payload.len(),
            max: capacity,
        });
    }
    Ok(EncodedMessage {
        length: (HEADER_SIZE + payload.len() * WORD_SIZE) as u32,
        header: header.pack(),
        payload,
    })
}

/// A decoded response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Header word found in the channel after completion.
    pub header: MessageHeader,
    /// First payload word; zero means success.
    pub status: i32,
    /// Response words, status first, clamped to the caller's capacity.
    pub words: Vec<u32>,
}

/// Number of response words to read for a reported `length` field.
///
/// Lengths shorter than a header yield zero words.
pub fn response_word_count(length: u32, capacity: usize) -> usize {
    let reported = (length as usize).saturating_sub(HEADER_SIZE) / WORD_SIZE;
    reported.min(capacity)
}

/// Decode the response currently held by `channel`.
///
/// At most `capacity` words are copied out, and never more than the payload
/// area holds, whatever length the firmware reports.
pub fn decode_response<R: SharedRegion>(channel: &Channel<R>, capacity: usize) -> Result<Response> {
    let length = channel.length();
    let header = MessageHeader::unpack(channel.header());
    let status = channel.payload_word(0)? as i32;

    let count = response_word_count(length, capacity.min(channel.payload_capacity()));
    let words = (0..count)
        .map(|index| channel.payload_word(index))
        .collect::<scmibox_shmem::Result<Vec<_>>>()?;

    trace!(length, count, status, %header, "response decoded");

    Ok(Response {
        header,
        status,
        words,
    })
}

#[cfg(test)]
mod tests {
    use scmibox_shmem::HeapRegion;

    use super::*;

    fn channel_with_response(length: u32, words: &[u32]) -> Channel<HeapRegion> {
        let mut channel = Channel::new(HeapRegion::new(0x100)).unwrap();
        channel.set_length(length);
        channel.set_header(MessageHeader::new(0x14, 0x06, 5).pack());
        for (index, word) in words.iter().enumerate() {
            channel.set_payload_word(index, *word).unwrap();
        }
        channel
    }

    #[test]
    fn encode_sets_length_and_header() {
        let payload = [30, 1];
        let msg = encode_message(MessageHeader::new(0x14, 0x07, 0), &payload, 25).unwrap();
        assert_eq!(msg.length, 12);
        assert_eq!(msg.header, 0x5007);
        assert_eq!(msg.payload, &payload);
    }

    #[test]
    fn encode_empty_payload() {
        let msg = encode_message(MessageHeader::new(0x10, 0x00, 0), &[], 25).unwrap();
        assert_eq!(msg.length, HEADER_SIZE as u32);
        assert!(msg.payload.is_empty());
    }

    #[test]
    fn encode_rejects_oversized_payload() {
        let payload = [0u32; 26];
        let err = encode_message(MessageHeader::new(0x14, 0x07, 0), &payload, 25).unwrap_err();
        assert!(matches!(
            err,
            FrameError::PayloadTooLarge { words: 26, max: 25 }
        ));
    }

    #[test]
    fn decode_reads_status_and_words() {
        let channel = channel_with_response(16, &[0, 0x4000_0000, 0x1]);
        let response = decode_response(&channel, 4).unwrap();
        assert_eq!(response.status, 0);
        assert_eq!(response.words, vec![0, 0x4000_0000, 0x1]);
        assert_eq!(response.header, MessageHeader::new(0x14, 0x06, 5));
    }

    #[test]
    fn decode_clamps_to_caller_capacity() {
        // Firmware claims 24 words; the caller only has room for 2.
        let channel = channel_with_response(4 + 24 * 4, &[0, 7, 8, 9]);
        let response = decode_response(&channel, 2).unwrap();
        assert_eq!(response.words, vec![0, 7]);
    }

    #[test]
    fn decode_clamps_to_payload_area() {
        let channel = channel_with_response(u32::MAX, &[0]);
        let response = decode_response(&channel, usize::MAX).unwrap();
        assert_eq!(response.words.len(), channel.payload_capacity());
    }

    #[test]
    fn decode_negative_status() {
        let channel = channel_with_response(8, &[(-2i32) as u32]);
        let response = decode_response(&channel, 4).unwrap();
        assert_eq!(response.status, -2);
    }

    #[test]
    fn short_length_yields_no_words_but_keeps_status() {
        let channel = channel_with_response(0, &[2]);
        let response = decode_response(&channel, 4).unwrap();
        assert_eq!(response.status, 2);
        assert!(response.words.is_empty());
    }

    #[test]
    fn word_count_arithmetic() {
        assert_eq!(response_word_count(4, 8), 0);
        assert_eq!(response_word_count(8, 8), 1);
        assert_eq!(response_word_count(16, 8), 3);
        assert_eq!(response_word_count(18, 8), 3);
        assert_eq!(response_word_count(400, 8), 8);
        assert_eq!(response_word_count(2, 8), 0);
    }
}
