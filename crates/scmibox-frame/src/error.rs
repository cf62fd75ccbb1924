/// Errors that can occur during message encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload does not fit in the channel's payload area.
    #[error("payload too large ({words} words, max {max})")]
    PayloadTooLarge { words: usize, max: usize },

    /// A channel field could not be accessed.
    #[error("channel access error: {0}")]
    Shmem(#[from] scmibox_shmem::ShmemError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
