//! In-process stand-in for the remote firmware.
//!
//! [`SimulatedFirmware`] is a [`SharedRegion`] that reacts to the doorbell the
//! way the system control processor does: it reads the request out of the
//! channel, hands it to a handler and posts the handler's response words with
//! the status bit set.

use std::fmt;

use scmibox_frame::{response_word_count, MessageHeader, HEADER_SIZE};
use scmibox_shmem::{ChannelLayout, ChannelStatus, HeapRegion, SharedRegion, DOORBELL_RING};
use tracing::trace;

/// A request as seen by the simulated firmware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimRequest {
    pub header: MessageHeader,
    pub flags: u32,
    pub payload: Vec<u32>,
}

/// Produces response words (status first), or `None` to never answer.
pub type SimHandler = Box<dyn FnMut(&SimRequest) -> Option<Vec<u32>> + Send>;

/// A heap-backed channel region with a scripted remote side.
pub struct SimulatedFirmware {
    memory: HeapRegion,
    layout: ChannelLayout,
    handler: SimHandler,
    requests: Vec<SimRequest>,
}

impl SimulatedFirmware {
    /// Simulate a region of `size` bytes using the reference layout.
    pub fn new<H>(size: usize, handler: H) -> Self
    where
        H: FnMut(&SimRequest) -> Option<Vec<u32>> + Send + 'static,
    {
        Self::with_layout(size, ChannelLayout::default(), handler)
    }

    /// Simulate a region with an explicit layout.
    pub fn with_layout<H>(size: usize, layout: ChannelLayout, handler: H) -> Self
    where
        H: FnMut(&SimRequest) -> Option<Vec<u32>> + Send + 'static,
    {
        Self {
            memory: HeapRegion::new(size),
            layout,
            handler: Box::new(handler),
            requests: Vec::new(),
        }
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> &[SimRequest] {
        &self.requests
    }

    fn capacity(&self) -> usize {
        self.layout.payload_capacity(self.memory.size())
    }

    fn respond(&mut self) {
        let length = self.memory.read_u32(self.layout.length);
        let header = MessageHeader::unpack(self.memory.read_u32(self.layout.header));
        let count = response_word_count(length, self.capacity());
        let payload = (0..count)
            .map(|index| self.memory.read_u32(self.layout.payload_word_offset(index)))
            .collect();
        let request = SimRequest {
            header,
            flags: self.memory.read_u32(self.layout.flags),
            payload,
        };
        trace!(
            header = %request.header,
            words = request.payload.len(),
            "simulated firmware request"
        );

        let reply = (self.handler)(&request);
        self.requests.push(request);
        self.memory.write_u32(self.layout.doorbell, 0);

        let Some(mut words) = reply else {
            return;
        };
        words.truncate(self.capacity());
        for (index, word) in words.iter().enumerate() {
            self.memory
                .write_u32(self.layout.payload_word_offset(index), *word);
        }
        self.memory
            .write_u32(self.layout.length, (HEADER_SIZE + words.len() * 4) as u32);
        let status = self.memory.read_u32(self.layout.status) | ChannelStatus::SIGNALED.bits();
        self.memory.write_u32(self.layout.status, status);
    }
}

impl SharedRegion for SimulatedFirmware {
    fn size(&self) -> usize {
        self.memory.size()
    }

    fn read_u32(&self, offset: usize) -> u32 {
        self.memory.read_u32(offset)
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        self.memory.write_u32(offset, value);
        if offset == self.layout.doorbell && value == DOORBELL_RING {
            self.respond();
        }
    }
}

impl fmt::Debug for SimulatedFirmware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulatedFirmware")
            .field("size", &self.memory.size())
            .field("requests", &self.requests.len())
            .finish()
    }
}
