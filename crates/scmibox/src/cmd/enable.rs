use scmibox_clock::{
    resolve_clocks, ClockDescriptor, ClockSequencer, SequenceReport, SequencerConfig, GPU_CLOCKS,
};
use tracing::info;

use crate::cmd::{open_transport, RunArgs};
use crate::exit::{clock_error, CliResult, FAILURE, SUCCESS};
use crate::output::{print_report, OutputFormat};

/// Configure the selected clocks. Enabling also reads back every rate.
pub fn run(args: RunArgs, enable: bool, format: OutputFormat) -> CliResult<i32> {
    let clocks = selected_clocks(&args)?;
    let mut transport = open_transport(&args.channel)?;
    let mut sequencer = ClockSequencer::new(&mut transport)
        .with_clocks(clocks)
        .with_config(SequencerConfig {
            settle_delay: args.settle_delay,
        });
    info!(
        clocks = sequencer.clocks().len(),
        enable,
        "starting clock sequence"
    );

    let result = if enable {
        sequencer.run()
    } else {
        sequencer.configure_all(false).map(|configure| SequenceReport {
            configure,
            rates: Vec::new(),
        })
    };
    let context = if enable { "enable failed" } else { "disable failed" };
    let report = result.map_err(|err| clock_error(context, err))?;

    finish(&report, format)
}

pub(crate) fn selected_clocks(args: &RunArgs) -> CliResult<Vec<ClockDescriptor>> {
    match &args.clocks {
        Some(ids) => resolve_clocks(ids).map_err(|err| clock_error("invalid --clocks", err)),
        None => Ok(GPU_CLOCKS.to_vec()),
    }
}

pub(crate) fn finish(report: &SequenceReport, format: OutputFormat) -> CliResult<i32> {
    print_report(report, format);
    let failed = report.outcomes().filter(|o| !o.succeeded()).count();
    info!(
        commands = report.outcomes().count(),
        failed,
        "clock sequence complete"
    );
    Ok(if failed == 0 { SUCCESS } else { FAILURE })
}
