//! GPU clock bring-up through the firmware clock protocol.
//!
//! A [`ClockSequencer`] borrows a [`Transport`](scmibox_transport::Transport)
//! and walks a fixed list of [`ClockDescriptor`]s: one configure pass, then one
//! rate-read pass. Each clock is independent; a failed command is logged and
//! recorded, and the sequence moves on.

pub mod descriptor;
pub mod error;
pub mod protocol;
pub mod sequencer;

pub use descriptor::{find_clock, resolve_clocks, ClockDescriptor, GPU_CLOCKS};
pub use error::{ClockError, Result};
pub use sequencer::{
    decode_rate, ClockOutcome, ClockSequencer, Command, SequenceReport, SequencerConfig,
};
