use crate::cmd::{open_transport, StatusArgs};
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_snapshot, OutputFormat};

/// Read the channel fields without touching the doorbell.
pub fn run(args: StatusArgs, format: OutputFormat) -> CliResult<i32> {
    let transport = open_transport(&args.channel)?;
    let snapshot = transport
        .snapshot()
        .map_err(|err| transport_error("failed to read channel", err))?;
    print_snapshot(&snapshot, format);
    Ok(SUCCESS)
}
