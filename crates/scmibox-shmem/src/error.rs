use std::path::PathBuf;

use crate::layout::Field;

/// Errors that can occur while mapping or addressing the shared channel.
#[derive(Debug, thiserror::Error)]
pub enum ShmemError {
    /// The shared-memory region could not be mapped.
    #[error("failed to map {size:#x} bytes at {base:#x} via {path}: {source}")]
    MapFailed {
        path: PathBuf,
        base: u64,
        size: usize,
        source: std::io::Error,
    },

    /// A layout field does not fit inside the region.
    #[error("{field} field at {offset:#x} exceeds region size {size:#x}")]
    FieldOutOfBounds {
        field: Field,
        offset: usize,
        size: usize,
    },

    /// A layout field is not 32-bit aligned.
    #[error("{field} field at {offset:#x} is not 4-byte aligned")]
    Misaligned { field: Field, offset: usize },

    /// A payload word index lies beyond the payload area.
    #[error("payload word {index} out of range (capacity {capacity} words)")]
    PayloadIndexOutOfRange { index: usize, capacity: usize },

    /// The requested region size cannot hold any field.
    #[error("region size {size:#x} is too small")]
    RegionTooSmall { size: usize },
}

pub type Result<T> = std::result::Result<T, ShmemError>;
