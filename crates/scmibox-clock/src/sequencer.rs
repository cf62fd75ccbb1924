use std::time::Duration;

use scmibox_frame::Response;
use scmibox_shmem::SharedRegion;
use scmibox_transport::{check_status, Transport, TransportError};
use serde::Serialize;
use tracing::{info, warn};

use crate::descriptor::{ClockDescriptor, GPU_CLOCKS};
use crate::error::Result;
use crate::protocol::{
    CLOCK_CONFIG_SET, CLOCK_RATE_GET, CONFIG_ENABLE, PROTOCOL_CLOCK, RESPONSE_WORDS,
};

/// Default pause after each configure command.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_micros(100);

/// Tunables for a clock sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerConfig {
    /// Firmware turnaround time left after each configure command.
    pub settle_delay: Duration,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            settle_delay: DEFAULT_SETTLE_DELAY,
        }
    }
}

/// Which clock command an outcome belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Enable,
    Disable,
    RateGet,
}

impl Command {
    pub fn as_str(self) -> &'static str {
        match self {
            Command::Enable => "enable",
            Command::Disable => "disable",
            Command::RateGet => "rate_get",
        }
    }
}

/// Result of one clock command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClockOutcome {
    pub clock_id: u32,
    pub name: &'static str,
    pub command: Command,
    /// Firmware status, when a response arrived.
    pub status: Option<i32>,
    /// Decoded rate, rate reads only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_hz: Option<u64>,
    /// Transport failure confined to this command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClockOutcome {
    fn new(clock: ClockDescriptor, command: Command) -> Self {
        Self {
            clock_id: clock.id,
            name: clock.name,
            command,
            status: None,
            rate_hz: None,
            error: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.status == Some(0)
    }
}

/// Everything a full sequence did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SequenceReport {
    pub configure: Vec<ClockOutcome>,
    pub rates: Vec<ClockOutcome>,
}

impl SequenceReport {
    pub fn all_succeeded(&self) -> bool {
        self.outcomes().all(ClockOutcome::succeeded)
    }

    /// Configure outcomes followed by rate outcomes.
    pub fn outcomes(&self) -> impl Iterator<Item = &ClockOutcome> {
        self.configure.iter().chain(self.rates.iter())
    }
}

/// Combine `[status, low, high]` response words into a rate in Hz.
pub fn decode_rate(words: &[u32]) -> Option<u64> {
    match words {
        [_, low, high, ..] => Some((u64::from(*high) << 32) | u64::from(*low)),
        _ => None,
    }
}

/// Drives clock commands through a borrowed transport.
pub struct ClockSequencer<'t, R> {
    transport: &'t mut Transport<R>,
    clocks: Vec<ClockDescriptor>,
    config: SequencerConfig,
}

impl<'t, R: SharedRegion> ClockSequencer<'t, R> {
    /// Sequence all [`GPU_CLOCKS`] with default tunables.
    pub fn new(transport: &'t mut Transport<R>) -> Self {
        Self {
            transport,
            clocks: GPU_CLOCKS.to_vec(),
            config: SequencerConfig::default(),
        }
    }

    /// Restrict the sequence to `clocks`, in the given order.
    pub fn with_clocks(mut self, clocks: Vec<ClockDescriptor>) -> Self {
        self.clocks = clocks;
        self
    }

    pub fn with_config(mut self, config: SequencerConfig) -> Self {
        self.config = config;
        self
    }

    /// Clocks this sequencer will drive, in order.
    pub fn clocks(&self) -> &[ClockDescriptor] {
        &self.clocks
    }

    /// Enable every clock, then read back every rate.
    pub fn run(&mut self) -> Result<SequenceReport> {
        let configure = self.configure_all(true)?;
        let rates = self.read_rates()?;
        Ok(SequenceReport { configure, rates })
    }

    /// Configure every clock in list order, pausing after each command.
    pub fn configure_all(&mut self, enable: bool) -> Result<Vec<ClockOutcome>> {
        let clocks = self.clocks.clone();
        let mut outcomes = Vec::with_capacity(clocks.len());
        for clock in clocks {
            outcomes.push(self.configure(clock, enable)?);
            if !self.config.settle_delay.is_zero() {
                std::thread::sleep(self.config.settle_delay);
            }
        }
        Ok(outcomes)
    }

    /// Read the rate of every clock in list order.
    pub fn read_rates(&mut self) -> Result<Vec<ClockOutcome>> {
        let clocks = self.clocks.clone();
        clocks
            .into_iter()
            .map(|clock| self.read_rate(clock))
            .collect()
    }

    /// Send `CLOCK_CONFIG_SET` for one clock.
    pub fn configure(&mut self, clock: ClockDescriptor, enable: bool) -> Result<ClockOutcome> {
        let command = if enable {
            Command::Enable
        } else {
            Command::Disable
        };
        let attributes = if enable { CONFIG_ENABLE } else { 0 };
        let result = self
            .transport
            .send(
                PROTOCOL_CLOCK,
                CLOCK_CONFIG_SET,
                &[clock.id, attributes],
                RESPONSE_WORDS,
            )
            .and_then(check_status);

        let mut outcome = ClockOutcome::new(clock, command);
        match isolate(result)? {
            Ok(response) => {
                outcome.status = Some(response.status);
                info!(
                    clock = clock.id,
                    name = clock.name,
                    command = command.as_str(),
                    "clock configured"
                );
            }
            Err(TransportError::Firmware { status }) => {
                outcome.status = Some(status);
                warn!(
                    clock = clock.id,
                    name = clock.name,
                    command = command.as_str(),
                    status,
                    "clock configure failed"
                );
            }
            Err(err) => {
                warn!(
                    clock = clock.id,
                    name = clock.name,
                    error = %err,
                    "clock configure failed"
                );
                outcome.error = Some(err.to_string());
            }
        }
        Ok(outcome)
    }

    /// Send `CLOCK_RATE_GET` for one clock.
    pub fn read_rate(&mut self, clock: ClockDescriptor) -> Result<ClockOutcome> {
        let result = self
            .transport
            .send(PROTOCOL_CLOCK, CLOCK_RATE_GET, &[clock.id], RESPONSE_WORDS)
            .and_then(check_status);

        let mut outcome = ClockOutcome::new(clock, Command::RateGet);
        match isolate(result)? {
            Ok(response) => {
                outcome.status = Some(response.status);
                outcome.rate_hz = decode_rate(&response.words);
                match outcome.rate_hz {
                    Some(rate_hz) => {
                        info!(clock = clock.id, name = clock.name, rate_hz, "clock rate")
                    }
                    None => info!(
                        clock = clock.id,
                        name = clock.name,
                        words = response.words.len(),
                        "clock rate unavailable"
                    ),
                }
            }
            Err(TransportError::Firmware { status }) => {
                outcome.status = Some(status);
                info!(
                    clock = clock.id,
                    name = clock.name,
                    status,
                    "clock rate unavailable"
                );
            }
            Err(err) => {
                warn!(
                    clock = clock.id,
                    name = clock.name,
                    error = %err,
                    "clock rate read failed"
                );
                outcome.error = Some(err.to_string());
            }
        }
        Ok(outcome)
    }
}

/// Split per-command failures from ones that must abort the sequence.
fn isolate(
    result: scmibox_transport::Result<Response>,
) -> Result<std::result::Result<Response, TransportError>> {
    match result {
        Ok(response) => Ok(Ok(response)),
        Err(err) if err.is_per_command() => Ok(Err(err)),
        Err(err) => Err(err.into()),
    }
}
