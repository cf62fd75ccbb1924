//! Request/response exchange over a shared-memory mailbox channel.
//!
//! One [`Transport`] owns one [`Channel`](scmibox_shmem::Channel) and performs
//! strictly sequential exchanges with the remote firmware:
//! wait for the channel to be free, write the request, ring the doorbell,
//! wait for the response, decode it.
//!
//! There are no interrupts and no retries. Completion is observed by
//! polling, bounded by the two [`PollPolicy`] windows in [`TransportConfig`].

pub mod config;
pub mod error;
pub mod poll;
pub mod sim;
pub mod transport;

pub use config::{PollPolicy, TransportConfig};
pub use error::{Result, TransportError};
pub use poll::poll_until;
pub use sim::{SimRequest, SimulatedFirmware};
pub use transport::{check_status, ChannelSnapshot, ExchangeState, Transport};
