//! GPU clock bring-up over a firmware shared-memory mailbox.
//!
//! scmibox talks to the system control processor through a single
//! shared-memory channel: write a request, ring the doorbell, poll for the
//! response. On top of that transport it enables a fixed list of GPU clocks
//! and reads their rates back.
//!
//! # Crate Structure
//!
//! - [`shmem`]: Shared-memory region mapping and typed channel fields
//! - [`frame`]: Header packing and response decoding
//! - [`transport`]: Doorbell-synchronised request/response exchange
//! - [`clock`]: Clock enable sequencer

/// Re-export shared-memory types.
pub mod shmem {
    pub use scmibox_shmem::*;
}

/// Re-export frame types.
pub mod frame {
    pub use scmibox_frame::*;
}

/// Re-export transport types.
pub mod transport {
    pub use scmibox_transport::*;
}

/// Re-export clock sequencer types.
pub mod clock {
    pub use scmibox_clock::*;
}
