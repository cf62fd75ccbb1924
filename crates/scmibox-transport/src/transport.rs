use scmibox_frame::{
    decode_response, encode_message, EncodedMessage, MessageHeader, Response, SEQUENCE_MASK,
};
use scmibox_shmem::{Channel, ChannelFlags, ChannelStatus, SharedRegion};
use tracing::{debug, trace, warn};

use crate::config::TransportConfig;
use crate::error::{Result, TransportError};
use crate::poll::poll_until;

/// Where an exchange currently stands.
///
/// Callers only ever observe [`ExchangeState::Idle`]: `send` runs the whole
/// cycle synchronously and returns to idle on success and on error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeState {
    Idle,
    WaitFree,
    Sending,
    WaitResponse,
    Complete,
}

/// Every channel field, read without disturbing the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSnapshot {
    pub status: ChannelStatus,
    pub flags: ChannelFlags,
    pub length: u32,
    pub header: MessageHeader,
    pub first_word: u32,
    pub payload_capacity: usize,
}

/// Exclusive owner of a mailbox channel.
///
/// Exchanges take `&mut self`; share a transport between threads only behind
/// an external lock.
#[derive(Debug)]
pub struct Transport<R> {
    channel: Channel<R>,
    config: TransportConfig,
    state: ExchangeState,
    next_sequence: u16,
    /// The doorbell was rung; the ready bit it raises (possibly late) is
    /// still to be cleared.
    ack_pending: bool,
}

impl<R: SharedRegion> Transport<R> {
    /// Create a transport with the reference timeouts.
    pub fn new(channel: Channel<R>) -> Self {
        Self::with_config(channel, TransportConfig::default())
    }

    /// Create a transport with explicit timeouts.
    pub fn with_config(channel: Channel<R>, config: TransportConfig) -> Self {
        Self {
            channel,
            config,
            state: ExchangeState::Idle,
            next_sequence: 0,
            ack_pending: false,
        }
    }

    /// Send one command and wait for its response.
    ///
    /// The sequence token is taken from a rolling 10-bit counter. At most
    /// `response_capacity` response words (status included) are returned.
    /// A non-zero status is not an error here; see [`check_status`].
    pub fn send(
        &mut self,
        protocol_id: u8,
        message_id: u8,
        payload: &[u32],
        response_capacity: usize,
    ) -> Result<Response> {
        let sequence = self.next_sequence;
        self.next_sequence = (self.next_sequence + 1) & SEQUENCE_MASK;
        let header = MessageHeader::new(protocol_id, message_id, sequence);
        self.send_with_sequence(header, payload, response_capacity)
    }

    /// Send one command with a caller-chosen header.
    pub fn send_with_sequence(
        &mut self,
        header: MessageHeader,
        payload: &[u32],
        response_capacity: usize,
    ) -> Result<Response> {
        let encoded = encode_message(header, payload, self.channel.payload_capacity())?;
        let result = self.exchange(header, &encoded, response_capacity);
        self.enter(ExchangeState::Idle);
        result
    }

    fn exchange(
        &mut self,
        header: MessageHeader,
        encoded: &EncodedMessage<'_>,
        response_capacity: usize,
    ) -> Result<Response> {
        if self.ack_pending {
            let status = self.channel.status();
            self.channel.set_status(status - ChannelStatus::SIGNALED);
            self.ack_pending = false;
            trace!("previous response acknowledged");
        }

        self.enter(ExchangeState::WaitFree);
        let policy = self.config.free_wait;
        let channel = &self.channel;
        let polls = poll_until(&policy, || {
            !channel.status().contains(ChannelStatus::SIGNALED)
        })
        .ok_or_else(|| {
            debug!(%header, "channel busy timeout");
            TransportError::ChannelBusyTimeout {
                polls: policy.max_polls.max(1),
                ceiling: policy.ceiling(),
            }
        })?;
        trace!(polls, "channel free");

        // Length and header must be complete before the doorbell: the remote
        // side may start processing as soon as it observes the ring.
        self.enter(ExchangeState::Sending);
        self.channel.set_flags(ChannelFlags::empty());
        self.channel.set_length(encoded.length);
        self.channel.set_header(encoded.header);
        for (index, word) in encoded.payload.iter().enumerate() {
            self.channel.set_payload_word(index, *word)?;
        }
        self.channel.ring_doorbell();

        self.enter(ExchangeState::WaitResponse);
        let policy = self.config.response_wait;
        let channel = &self.channel;
        let polls = poll_until(&policy, || {
            channel.status().contains(ChannelStatus::SIGNALED)
        });
        // The request is outstanding either way; a late ready bit must be
        // acknowledged by the next send rather than read as busy.
        self.ack_pending = true;
        let Some(polls) = polls else {
            debug!(%header, "response timeout");
            return Err(TransportError::ResponseTimeout {
                polls: policy.max_polls.max(1),
                ceiling: policy.ceiling(),
            });
        };
        self.enter(ExchangeState::Complete);

        let response = decode_response(&self.channel, response_capacity)?;
        if response.header.sequence != header.sequence {
            warn!(
                sent = header.sequence,
                received = response.header.sequence,
                "response sequence token mismatch"
            );
        }
        debug!(
            %header,
            polls,
            status = response.status,
            words = response.words.len(),
            "exchange complete"
        );
        Ok(response)
    }

    fn enter(&mut self, state: ExchangeState) {
        trace!(from = ?self.state, to = ?state, "exchange state");
        self.state = state;
    }

    /// Current exchange state.
    pub fn state(&self) -> ExchangeState {
        self.state
    }

    /// Read every channel field.
    pub fn snapshot(&self) -> Result<ChannelSnapshot> {
        Ok(ChannelSnapshot {
            status: self.channel.status(),
            flags: self.channel.flags(),
            length: self.channel.length(),
            header: MessageHeader::unpack(self.channel.header()),
            first_word: self.channel.payload_word(0)?,
            payload_capacity: self.channel.payload_capacity(),
        })
    }

    /// Borrow the channel.
    pub fn channel(&self) -> &Channel<R> {
        &self.channel
    }

    /// Current timeout configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Consume the transport and return the channel.
    pub fn into_channel(self) -> Channel<R> {
        self.channel
    }
}

/// Turn a non-zero response status into [`TransportError::Firmware`].
pub fn check_status(response: Response) -> Result<Response> {
    if response.status != 0 {
        return Err(TransportError::Firmware {
            status: response.status,
        });
    }
    Ok(response)
}
