use std::sync::atomic::{fence, Ordering};

use bitflags::bitflags;
use tracing::trace;

use crate::error::{Result, ShmemError};
use crate::layout::ChannelLayout;
use crate::region::SharedRegion;

/// Value written to the doorbell to signal the remote side.
pub const DOORBELL_RING: u32 = 1;

bitflags! {
    /// Channel-status word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChannelStatus: u32 {
        /// Set while the channel is busy, and again once a response is ready.
        const SIGNALED = 1 << 0;
    }
}

bitflags! {
    /// Request flags word.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ChannelFlags: u32 {
        /// Ask the remote side to raise a completion interrupt.
        const INTR_ON_COMPLETION = 1 << 0;
    }
}

/// A mailbox channel: a shared region viewed through a validated layout.
///
/// All access goes through per-field accessors; callers never see raw offsets.
#[derive(Debug)]
pub struct Channel<R> {
    region: R,
    layout: ChannelLayout,
    payload_capacity: usize,
}

impl<R: SharedRegion> Channel<R> {
    /// Bind a region using the reference layout.
    pub fn new(region: R) -> Result<Self> {
        Self::with_layout(region, ChannelLayout::default())
    }

    /// Bind a region using an explicit layout.
    pub fn with_layout(region: R, layout: ChannelLayout) -> Result<Self> {
        let size = region.size();
        layout.validate(size)?;
        Ok(Self {
            region,
            layout,
            payload_capacity: layout.payload_capacity(size),
        })
    }

    pub fn status(&self) -> ChannelStatus {
        ChannelStatus::from_bits_retain(self.region.read_u32(self.layout.status))
    }

    pub fn set_status(&mut self, status: ChannelStatus) {
        self.region.write_u32(self.layout.status, status.bits());
    }

    pub fn flags(&self) -> ChannelFlags {
        ChannelFlags::from_bits_retain(self.region.read_u32(self.layout.flags))
    }

    pub fn set_flags(&mut self, flags: ChannelFlags) {
        self.region.write_u32(self.layout.flags, flags.bits());
    }

    /// Length field: bytes following it, header included.
    pub fn length(&self) -> u32 {
        self.region.read_u32(self.layout.length)
    }

    pub fn set_length(&mut self, length: u32) {
        self.region.write_u32(self.layout.length, length);
    }

    pub fn header(&self) -> u32 {
        self.region.read_u32(self.layout.header)
    }

    pub fn set_header(&mut self, header: u32) {
        self.region.write_u32(self.layout.header, header);
    }

    /// Read payload word `index`.
    pub fn payload_word(&self, index: usize) -> Result<u32> {
        self.check_payload_index(index)?;
        Ok(self
            .region
            .read_u32(self.layout.payload_word_offset(index)))
    }

    /// Write payload word `index`.
    pub fn set_payload_word(&mut self, index: usize, value: u32) -> Result<()> {
        self.check_payload_index(index)?;
        self.region
            .write_u32(self.layout.payload_word_offset(index), value);
        Ok(())
    }

    /// Signal the remote side.
    ///
    /// All earlier stores are fenced so they are visible before the doorbell.
    pub fn ring_doorbell(&mut self) {
        fence(Ordering::SeqCst);
        self.region.write_u32(self.layout.doorbell, DOORBELL_RING);
        trace!("doorbell rung");
    }

    /// Payload area size in 32-bit words.
    pub fn payload_capacity(&self) -> usize {
        self.payload_capacity
    }

    pub fn layout(&self) -> &ChannelLayout {
        &self.layout
    }

    /// Borrow the backing region.
    pub fn region(&self) -> &R {
        &self.region
    }

    /// Mutably borrow the backing region.
    pub fn region_mut(&mut self) -> &mut R {
        &mut self.region
    }

    /// Consume the channel and return the backing region.
    pub fn into_inner(self) -> R {
        self.region
    }

    fn check_payload_index(&self, index: usize) -> Result<()> {
        if index >= self.payload_capacity {
            return Err(ShmemError::PayloadIndexOutOfRange {
                index,
                capacity: self.payload_capacity,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{DOORBELL_OFFSET, HEADER_OFFSET, LENGTH_OFFSET, PAYLOAD_OFFSET};
    use crate::region::HeapRegion;

    #[test]
    fn fields_land_on_reference_offsets() {
        let mut channel = Channel::new(HeapRegion::new(0x100)).unwrap();
        channel.set_length(12);
        channel.set_header(0x5007);
        channel.set_payload_word(0, 30).unwrap();
        channel.set_payload_word(1, 1).unwrap();
        channel.ring_doorbell();

        let region = channel.region();
        assert_eq!(region.read_u32(LENGTH_OFFSET), 12);
        assert_eq!(region.read_u32(HEADER_OFFSET), 0x5007);
        assert_eq!(region.read_u32(PAYLOAD_OFFSET), 30);
        assert_eq!(region.read_u32(PAYLOAD_OFFSET + 4), 1);
        assert_eq!(region.read_u32(DOORBELL_OFFSET), DOORBELL_RING);
    }

    #[test]
    fn status_bits_roundtrip() {
        let mut channel = Channel::new(HeapRegion::new(0x100)).unwrap();
        assert!(channel.status().is_empty());
        channel.set_status(ChannelStatus::SIGNALED);
        assert!(channel.status().contains(ChannelStatus::SIGNALED));

        // Unknown bits written by firmware are retained.
        channel.region_mut().write_u32(0x04, 0x8000_0001);
        assert_eq!(channel.status().bits(), 0x8000_0001);
    }

    #[test]
    fn payload_index_bounded_by_doorbell() {
        let mut channel = Channel::new(HeapRegion::new(0x100)).unwrap();
        assert_eq!(channel.payload_capacity(), 25);
        channel.set_payload_word(24, 0xAA).unwrap();
        let err = channel.set_payload_word(25, 0xBB).unwrap_err();
        assert!(matches!(
            err,
            ShmemError::PayloadIndexOutOfRange {
                index: 25,
                capacity: 25
            }
        ));
        assert_eq!(channel.region().read_u32(DOORBELL_OFFSET), 0);
    }

    #[test]
    fn undersized_region_rejected() {
        assert!(Channel::new(HeapRegion::new(0x40)).is_err());
    }
}
