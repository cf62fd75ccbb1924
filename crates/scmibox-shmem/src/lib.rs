//! Shared-memory mailbox channel access.
//!
//! This is the lowest layer of scmibox. It owns the memory region that is
//! shared with the system control processor and exposes it only through
//! typed, bounds-checked field accessors:
//! - [`SharedRegion`] abstracts the backing memory (a `/dev/mem` mapping or an
//!   in-process buffer)
//! - [`ChannelLayout`] describes where each field lives
//! - [`Channel`] binds the two together
//!
//! Everything else builds on top of the [`Channel`] type provided here.

pub mod channel;
pub mod error;
pub mod layout;
pub mod region;

#[cfg(unix)]
pub mod mapped;

pub use channel::{Channel, ChannelFlags, ChannelStatus, DOORBELL_RING};
pub use error::{Result, ShmemError};
pub use layout::{ChannelLayout, Field, FIELD_WIDTH};
pub use region::{HeapRegion, SharedRegion};

#[cfg(unix)]
pub use mapped::MappedRegion;
