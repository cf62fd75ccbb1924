use std::fmt;
use std::io;

use scmibox_clock::ClockError;
use scmibox_frame::FrameError;
use scmibox_shmem::ShmemError;
use scmibox_transport::TransportError;

pub const SUCCESS: i32 = 0;
/// One or more clock commands failed; the rest of the sequence ran.
pub const FAILURE: i32 = 1;
/// The shared channel could not be mapped or laid out.
pub const MAP_FAILED: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn shmem_error(context: &str, err: ShmemError) -> CliError {
    let code = match &err {
        ShmemError::MapFailed { source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            PERMISSION_DENIED
        }
        ShmemError::MapFailed { .. }
        | ShmemError::FieldOutOfBounds { .. }
        | ShmemError::Misaligned { .. }
        | ShmemError::RegionTooSmall { .. } => MAP_FAILED,
        ShmemError::PayloadIndexOutOfRange { .. } => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Shmem(err) => shmem_error(context, err),
        FrameError::PayloadTooLarge { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::Shmem(err) => shmem_error(context, err),
        TransportError::Frame(err) => frame_error(context, err),
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

pub fn clock_error(context: &str, err: ClockError) -> CliError {
    match err {
        ClockError::Transport(err) => transport_error(context, err),
        ClockError::UnknownClock(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}
