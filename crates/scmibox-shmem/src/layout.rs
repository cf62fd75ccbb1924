//! Shared-memory field layout.
//!
//! Offsets are bytes from the channel base. The reference layout matches the
//! firmware on the target SoC and must be reproduced bit-exact:
//!
//! ```text
//! 0x00 reserved       0x10 flags    0x18 header    0x80 doorbell
//! 0x04 channel_status 0x14 length   0x1C payload...
//! ```

use std::fmt;

use crate::error::{Result, ShmemError};

/// Every field is a single 32-bit word.
pub const FIELD_WIDTH: usize = 4;

/// Reference channel-status offset.
pub const STATUS_OFFSET: usize = 0x04;
/// Reference flags offset.
pub const FLAGS_OFFSET: usize = 0x10;
/// Reference length offset.
pub const LENGTH_OFFSET: usize = 0x14;
/// Reference header offset.
pub const HEADER_OFFSET: usize = 0x18;
/// Reference payload offset.
pub const PAYLOAD_OFFSET: usize = 0x1C;
/// Reference doorbell offset.
pub const DOORBELL_OFFSET: usize = 0x80;

/// Names a channel field in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Status,
    Flags,
    Length,
    Header,
    Payload,
    Doorbell,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Status => "channel_status",
            Field::Flags => "flags",
            Field::Length => "length",
            Field::Header => "header",
            Field::Payload => "payload",
            Field::Doorbell => "doorbell",
        };
        f.write_str(name)
    }
}

/// Byte offsets of each channel field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLayout {
    pub status: usize,
    pub flags: usize,
    pub length: usize,
    pub header: usize,
    pub payload: usize,
    pub doorbell: usize,
}

impl Default for ChannelLayout {
    fn default() -> Self {
        Self {
            status: STATUS_OFFSET,
            flags: FLAGS_OFFSET,
            length: LENGTH_OFFSET,
            header: HEADER_OFFSET,
            payload: PAYLOAD_OFFSET,
            doorbell: DOORBELL_OFFSET,
        }
    }
}

impl ChannelLayout {
    fn fields(&self) -> [(Field, usize); 6] {
        [
            (Field::Status, self.status),
            (Field::Flags, self.flags),
            (Field::Length, self.length),
            (Field::Header, self.header),
            (Field::Payload, self.payload),
            (Field::Doorbell, self.doorbell),
        ]
    }

    /// Check that every field is aligned and fits in a region of `size` bytes.
    pub fn validate(&self, size: usize) -> Result<()> {
        if size < FIELD_WIDTH {
            return Err(ShmemError::RegionTooSmall { size });
        }
        for (field, offset) in self.fields() {
            if offset % FIELD_WIDTH != 0 {
                return Err(ShmemError::Misaligned { field, offset });
            }
            if offset.checked_add(FIELD_WIDTH).is_none_or(|end| end > size) {
                return Err(ShmemError::FieldOutOfBounds {
                    field,
                    offset,
                    size,
                });
            }
        }
        Ok(())
    }

    /// Number of payload words that fit before the next field or the region end.
    ///
    /// The payload area is open-ended in the wire format, so it stops at the
    /// nearest field placed after it (the doorbell in the reference layout).
    pub fn payload_capacity(&self, size: usize) -> usize {
        let end = self
            .fields()
            .iter()
            .map(|&(_, offset)| offset)
            .filter(|&offset| offset > self.payload)
            .min()
            .unwrap_or(size)
            .min(size);
        end.saturating_sub(self.payload) / FIELD_WIDTH
    }

    /// Byte offset of payload word `index`.
    pub fn payload_word_offset(&self, index: usize) -> usize {
        self.payload + index * FIELD_WIDTH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_layout_fits_reference_region() {
        let layout = ChannelLayout::default();
        layout.validate(0x100).unwrap();
        // (0x80 - 0x1C) / 4
        assert_eq!(layout.payload_capacity(0x100), 25);
    }

    #[test]
    fn doorbell_beyond_region_rejected() {
        let err = ChannelLayout::default().validate(0x80).unwrap_err();
        assert!(matches!(
            err,
            ShmemError::FieldOutOfBounds {
                field: Field::Doorbell,
                ..
            }
        ));
    }

    #[test]
    fn misaligned_field_rejected() {
        let layout = ChannelLayout {
            header: 0x19,
            ..ChannelLayout::default()
        };
        let err = layout.validate(0x100).unwrap_err();
        assert!(matches!(
            err,
            ShmemError::Misaligned {
                field: Field::Header,
                offset: 0x19
            }
        ));
    }

    #[test]
    fn payload_runs_to_region_end_when_last() {
        let layout = ChannelLayout {
            doorbell: 0x0C,
            ..ChannelLayout::default()
        };
        assert_eq!(layout.payload_capacity(0x40), (0x40 - 0x1C) / 4);
    }

    #[test]
    fn tiny_region_rejected() {
        assert!(matches!(
            ChannelLayout::default().validate(2),
            Err(ShmemError::RegionTooSmall { size: 2 })
        ));
    }
}
