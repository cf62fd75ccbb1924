use bytes::{Buf, BufMut, BytesMut};

use crate::layout::FIELD_WIDTH;

/// Memory shared with the remote processor, addressed in 32-bit words.
///
/// Callers must keep `offset + 4 <= size()` and `offset` 4-byte aligned.
/// [`Channel`](crate::Channel) validates its layout once up front so the
/// accessors never hand out an unchecked offset.
pub trait SharedRegion {
    /// Size of the region in bytes.
    fn size(&self) -> usize;

    /// Load the 32-bit word at `offset`.
    fn read_u32(&self, offset: usize) -> u32;

    /// Store a 32-bit word at `offset`.
    fn write_u32(&mut self, offset: usize, value: u32);
}

impl<R: SharedRegion + ?Sized> SharedRegion for Box<R> {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn read_u32(&self, offset: usize) -> u32 {
        (**self).read_u32(offset)
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        (**self).write_u32(offset, value)
    }
}

/// A zero-initialised in-process region, little-endian like the target.
#[derive(Debug, Clone)]
pub struct HeapRegion {
    buf: BytesMut,
}

impl HeapRegion {
    /// Allocate a zeroed region of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            buf: BytesMut::zeroed(size),
        }
    }

    /// Raw contents of the region.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

impl SharedRegion for HeapRegion {
    fn size(&self) -> usize {
        self.buf.len()
    }

    fn read_u32(&self, offset: usize) -> u32 {
        let mut word = &self.buf[offset..offset + FIELD_WIDTH];
        word.get_u32_le()
    }

    fn write_u32(&mut self, offset: usize, value: u32) {
        let mut word = &mut self.buf[offset..offset + FIELD_WIDTH];
        word.put_u32_le(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heap_region_is_zeroed() {
        let region = HeapRegion::new(0x100);
        assert_eq!(region.size(), 0x100);
        assert!(region.as_bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn heap_region_stores_little_endian() {
        let mut region = HeapRegion::new(16);
        region.write_u32(4, 0x1122_3344);
        assert_eq!(&region.as_bytes()[4..8], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(region.read_u32(4), 0x1122_3344);
        assert_eq!(region.read_u32(0), 0);
    }

    #[test]
    fn boxed_region_forwards() {
        let mut region: Box<dyn SharedRegion> = Box::new(HeapRegion::new(8));
        region.write_u32(4, 7);
        assert_eq!(region.read_u32(4), 7);
        assert_eq!(region.size(), 8);
    }
}
