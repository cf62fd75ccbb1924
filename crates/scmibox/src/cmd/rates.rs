use scmibox_clock::{ClockSequencer, SequenceReport};

use crate::cmd::enable::{finish, selected_clocks};
use crate::cmd::{open_transport, RunArgs};
use crate::exit::{clock_error, CliResult};
use crate::output::OutputFormat;

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let clocks = selected_clocks(&args)?;
    let mut transport = open_transport(&args.channel)?;
    let rates = ClockSequencer::new(&mut transport)
        .with_clocks(clocks)
        .read_rates()
        .map_err(|err| clock_error("rate query failed", err))?;

    finish(
        &SequenceReport {
            configure: Vec::new(),
            rates,
        },
        format,
    )
}
