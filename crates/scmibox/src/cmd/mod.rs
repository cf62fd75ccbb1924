use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use scmibox_clock::protocol::{CLOCK_CONFIG_SET, CLOCK_RATE_GET, PROTOCOL_CLOCK};
use scmibox_shmem::{Channel, SharedRegion};
use scmibox_transport::config::{
    DEFAULT_FREE_WAIT_POLLS, DEFAULT_POLL_INTERVAL, DEFAULT_RESPONSE_WAIT_POLLS,
};
use scmibox_transport::{PollPolicy, SimRequest, SimulatedFirmware, Transport, TransportConfig};
use tracing::info;

use crate::exit::{shmem_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod enable;
pub mod rates;
pub mod status;
pub mod version;

/// Reference mailbox region.
const DEFAULT_SHMEM_BASE: &str = "0x06590000";
const DEFAULT_SHMEM_SIZE: &str = "0x100";

/// Status word the simulator returns for commands it does not implement.
const SIM_NOT_SUPPORTED: i32 = -1;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enable the GPU clocks, then read back their rates.
    Enable(RunArgs),
    /// Disable the GPU clocks.
    Disable(RunArgs),
    /// Read the GPU clock rates without reconfiguring.
    Rates(RunArgs),
    /// Print the channel fields without sending anything.
    Status(StatusArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Enable(args) => enable::run(args, true, format),
        Command::Disable(args) => enable::run(args, false, format),
        Command::Rates(args) => rates::run(args, format),
        Command::Status(args) => status::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

/// `enable` with every option at its default (environment included).
///
/// A malformed environment value is a usage error.
pub fn default_command() -> CliResult<Command> {
    #[derive(Parser)]
    struct Defaults {
        #[command(flatten)]
        run: RunArgs,
    }
    Defaults::try_parse_from(["scmibox"])
        .map(|defaults| Command::Enable(defaults.run))
        .map_err(|err| usage_error(&err))
}

/// Turn a clap parse failure into a usage exit.
pub fn usage_error(err: &clap::Error) -> CliError {
    let rendered = err.to_string();
    let message = rendered
        .lines()
        .next()
        .unwrap_or_default()
        .trim_start_matches("error: ");
    CliError::new(USAGE, message)
}

/// Where the channel lives and how long to wait on it.
#[derive(Args, Debug, Clone)]
pub struct ChannelArgs {
    /// Memory device used to map the shared region.
    #[arg(long, env = "SCMIBOX_MEM_DEVICE", default_value = "/dev/mem")]
    pub device: PathBuf,
    /// Physical base address of the shared region (hex with 0x prefix, or decimal).
    #[arg(long, env = "SCMIBOX_SHMEM_BASE", default_value = DEFAULT_SHMEM_BASE, value_parser = parse_u64)]
    pub shmem_base: u64,
    /// Size of the shared region in bytes.
    #[arg(long, env = "SCMIBOX_SHMEM_SIZE", default_value = DEFAULT_SHMEM_SIZE, value_parser = parse_usize)]
    pub shmem_size: usize,
    /// Sleep between status polls (e.g. 10us, 1ms).
    #[arg(long, default_value = "10us", value_parser = parse_duration)]
    pub poll_interval: Duration,
    /// Polls allowed for the channel to become free.
    #[arg(long, default_value_t = DEFAULT_FREE_WAIT_POLLS)]
    pub free_wait_polls: u32,
    /// Polls allowed for the response to arrive.
    #[arg(long, default_value_t = DEFAULT_RESPONSE_WAIT_POLLS)]
    pub response_wait_polls: u32,
    /// Talk to an in-process firmware simulator instead of real memory.
    #[arg(long)]
    pub simulate: bool,
}

impl ChannelArgs {
    fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            free_wait: PollPolicy::new(self.poll_interval, self.free_wait_polls),
            response_wait: PollPolicy::new(self.poll_interval, self.response_wait_polls),
        }
    }
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
    /// Restrict to these clock ids (comma-separated). Default: all GPU clocks.
    #[arg(long, value_delimiter = ',')]
    pub clocks: Option<Vec<u32>>,
    /// Pause after each configure command (e.g. 100us).
    #[arg(long, default_value = "100us", value_parser = parse_duration)]
    pub settle_delay: Duration,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub channel: ChannelArgs,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub type CliTransport = Transport<Box<dyn SharedRegion>>;

/// Map (or simulate) the channel and wrap it in a transport.
pub fn open_transport(args: &ChannelArgs) -> CliResult<CliTransport> {
    let region: Box<dyn SharedRegion> = if args.simulate {
        info!(size = args.shmem_size, "using simulated firmware");
        Box::new(simulated_firmware(args.shmem_size))
    } else {
        map_region(args)?
    };

    let channel =
        Channel::new(region).map_err(|err| shmem_error("invalid channel layout", err))?;
    info!(
        chan_status = format_args!("{:#x}", channel.status().bits()),
        payload_words = channel.payload_capacity(),
        "channel ready"
    );

    let transport = Transport::with_config(channel, args.transport_config());
    let interval = transport.config().free_wait.interval;
    if interval != DEFAULT_POLL_INTERVAL {
        info!(?interval, "custom poll interval");
    }
    Ok(transport)
}

#[cfg(unix)]
fn map_region(args: &ChannelArgs) -> CliResult<Box<dyn SharedRegion>> {
    let region = scmibox_shmem::MappedRegion::map(&args.device, args.shmem_base, args.shmem_size)
        .map_err(|err| shmem_error("failed to open channel", err))?;
    Ok(Box::new(region))
}

#[cfg(not(unix))]
fn map_region(_args: &ChannelArgs) -> CliResult<Box<dyn SharedRegion>> {
    Err(CliError::new(
        crate::exit::MAP_FAILED,
        "mapping physical memory is only supported on unix hosts; use --simulate",
    ))
}

/// Firmware stand-in answering the clock protocol with fixed rates.
fn simulated_firmware(size: usize) -> SimulatedFirmware {
    SimulatedFirmware::new(size, |req: &SimRequest| {
        let header = req.header;
        match (header.protocol_id, header.message_id, req.payload.first()) {
            (PROTOCOL_CLOCK, CLOCK_CONFIG_SET, Some(_)) => Some(vec![0]),
            (PROTOCOL_CLOCK, CLOCK_RATE_GET, Some(&clock_id)) => {
                let rate = simulated_rate(clock_id);
                Some(vec![0, rate as u32, (rate >> 32) as u32])
            }
            _ => Some(vec![SIM_NOT_SUPPORTED as u32]),
        }
    })
}

fn simulated_rate(clock_id: u32) -> u64 {
    match clock_id {
        30 => 400_000_000,
        272 => 200_000_000,
        230 | 231 => 1_600_000_000,
        _ => 800_000_000,
    }
}

fn parse_u64(input: &str) -> Result<u64, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => input.replace('_', "").parse(),
    };
    parsed.map_err(|_| format!("invalid number: {input}"))
}

fn parse_usize(input: &str) -> Result<usize, String> {
    let value = parse_u64(input)?;
    usize::try_from(value).map_err(|_| format!("value too large: {input}"))
}

/// Parse `10us`, `5ms`, `2s` or a bare number of microseconds.
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("us") {
        (num, "us")
    } else if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "us")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    match unit {
        "us" => Ok(Duration::from_micros(value)),
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        _ => Err(format!("unsupported duration unit: {unit}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_duration("5ms").unwrap(), Duration::from_millis(5));
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("7").unwrap(), Duration::from_micros(7));
        assert_eq!(parse_duration("0us").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("fast").is_err());
        assert!(parse_duration("-1ms").is_err());
    }

    #[test]
    fn parse_numbers_hex_and_decimal() {
        assert_eq!(parse_u64("0x06590000").unwrap(), 0x0659_0000);
        assert_eq!(parse_u64("0X8438_0000").unwrap(), 0x8438_0000);
        assert_eq!(parse_u64("256").unwrap(), 256);
        assert!(parse_u64("0xG").is_err());
        assert_eq!(parse_usize("0x100").unwrap(), 0x100);
    }

    #[test]
    fn default_command_uses_reference_region() {
        let Ok(Command::Enable(args)) = default_command() else {
            panic!("default should be enable");
        };
        // Environment overrides are not set in the test harness.
        if std::env::var_os("SCMIBOX_SHMEM_BASE").is_none() {
            assert_eq!(args.channel.shmem_base, 0x0659_0000);
        }
        assert_eq!(args.channel.free_wait_polls, DEFAULT_FREE_WAIT_POLLS);
        assert_eq!(args.channel.response_wait_polls, DEFAULT_RESPONSE_WAIT_POLLS);
        assert_eq!(args.settle_delay, Duration::from_micros(100));
        assert!(args.clocks.is_none());
    }

    #[test]
    fn malformed_value_is_usage_error() {
        #[derive(Parser, Debug)]
        struct ChannelOnly {
            #[command(flatten)]
            channel: ChannelArgs,
        }

        let err = ChannelOnly::try_parse_from(["scmibox", "--shmem-base", "zz"]).unwrap_err();
        let cli = usage_error(&err);
        assert_eq!(cli.code, USAGE);
        assert!(cli.message.contains("zz"), "message: {}", cli.message);
        assert!(!cli.message.starts_with("error:"));
    }

    #[test]
    fn simulated_firmware_reports_rates() {
        let args = ChannelArgs {
            device: PathBuf::from("/dev/null"),
            shmem_base: 0,
            shmem_size: 0x100,
            poll_interval: Duration::ZERO,
            free_wait_polls: 4,
            response_wait_polls: 4,
            simulate: true,
        };
        let mut transport = open_transport(&args).unwrap();
        let response = transport
            .send(PROTOCOL_CLOCK, CLOCK_RATE_GET, &[272], 4)
            .unwrap();
        assert_eq!(response.words, vec![0, 200_000_000, 0]);

        let response = transport.send(0x10, 0x00, &[], 4).unwrap();
        assert_eq!(response.status, SIM_NOT_SUPPORTED);
    }
}
