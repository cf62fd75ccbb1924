use std::time::Duration;

/// Errors that can occur during a mailbox exchange.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Channel field access failed.
    #[error("channel error: {0}")]
    Shmem(#[from] scmibox_shmem::ShmemError),

    /// Message encoding/decoding failed.
    #[error("frame error: {0}")]
    Frame(#[from] scmibox_frame::FrameError),

    /// The channel stayed busy for the whole free-wait window.
    #[error("channel busy timeout after {polls} polls ({ceiling:?})")]
    ChannelBusyTimeout { polls: u32, ceiling: Duration },

    /// The firmware did not post a response within the response window.
    #[error("response timeout after {polls} polls ({ceiling:?})")]
    ResponseTimeout { polls: u32, ceiling: Duration },

    /// The firmware answered with a non-zero status word.
    #[error("firmware returned status {status}")]
    Firmware { status: i32 },
}

impl TransportError {
    /// True for failures confined to a single command.
    ///
    /// Timeouts and firmware status codes leave the channel usable for the
    /// next command; anything else points at a mapping or programming error.
    pub fn is_per_command(&self) -> bool {
        matches!(
            self,
            TransportError::ChannelBusyTimeout { .. }
                | TransportError::ResponseTimeout { .. }
                | TransportError::Firmware { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TransportError>;
