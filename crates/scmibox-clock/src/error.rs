/// Errors that abort a clock sequence.
///
/// Per-command timeouts and firmware status codes are not errors at this
/// level; they are recorded in the [`ClockOutcome`](crate::ClockOutcome).
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// A transport failure that leaves the channel unusable.
    #[error("transport error: {0}")]
    Transport(#[from] scmibox_transport::TransportError),

    /// The clock id is not in the known clock list.
    #[error("unknown clock id {0}")]
    UnknownClock(u32),
}

pub type Result<T> = std::result::Result<T, ClockError>;
