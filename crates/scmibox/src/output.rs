use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use scmibox_clock::{ClockOutcome, SequenceReport};
use scmibox_transport::ChannelSnapshot;
use serde::Serialize;

const REPORT_SCHEMA: &str = "https://schemas.3leaps.dev/scmibox/cli/v1/clock-report.schema.json";
const STATUS_SCHEMA: &str = "https://schemas.3leaps.dev/scmibox/cli/v1/channel-status.schema.json";

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ReportOutput<'a> {
    schema_id: &'static str,
    #[serde(flatten)]
    report: &'a SequenceReport,
    overall: &'static str,
}

pub fn print_report(report: &SequenceReport, format: OutputFormat) {
    let overall = if report.all_succeeded() {
        "pass"
    } else {
        "fail"
    };

    match format {
        OutputFormat::Json => {
            let out = ReportOutput {
                schema_id: REPORT_SCHEMA,
                report,
                overall,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["CLOCK", "NAME", "COMMAND", "STATUS", "RATE (Hz)", "ERROR"]);
            for outcome in report.outcomes() {
                table.add_row(vec![
                    outcome.clock_id.to_string(),
                    outcome.name.to_string(),
                    outcome.command.as_str().to_string(),
                    status_text(outcome),
                    outcome
                        .rate_hz
                        .map(|rate| rate.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    outcome.error.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for outcome in report.outcomes() {
                let mut line = format!(
                    "clock {} ({}) {} status={}",
                    outcome.clock_id,
                    outcome.name,
                    outcome.command.as_str(),
                    status_text(outcome)
                );
                if let Some(rate) = outcome.rate_hz {
                    line.push_str(&format!(" rate={rate} Hz"));
                }
                if let Some(error) = &outcome.error {
                    line.push_str(&format!(" error=\"{error}\""));
                }
                println!("{line}");
            }
            println!("result: {overall}");
        }
        OutputFormat::Raw => {
            println!("{overall}");
        }
    }
}

#[derive(Serialize)]
struct StatusOutput {
    schema_id: &'static str,
    channel_status: u32,
    busy_or_ready: bool,
    flags: u32,
    length: u32,
    protocol_id: u8,
    message_id: u8,
    sequence: u16,
    first_word: u32,
    payload_capacity: usize,
}

impl From<&ChannelSnapshot> for StatusOutput {
    fn from(snapshot: &ChannelSnapshot) -> Self {
        Self {
            schema_id: STATUS_SCHEMA,
            channel_status: snapshot.status.bits(),
            busy_or_ready: snapshot
                .status
                .contains(scmibox_shmem::ChannelStatus::SIGNALED),
            flags: snapshot.flags.bits(),
            length: snapshot.length,
            protocol_id: snapshot.header.protocol_id,
            message_id: snapshot.header.message_id,
            sequence: snapshot.header.sequence,
            first_word: snapshot.first_word,
            payload_capacity: snapshot.payload_capacity,
        }
    }
}

pub fn print_snapshot(snapshot: &ChannelSnapshot, format: OutputFormat) {
    let out = StatusOutput::from(snapshot);
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["channel_status".to_string(), format!("{:#010x}", out.channel_status)])
                .add_row(vec!["flags".to_string(), format!("{:#010x}", out.flags)])
                .add_row(vec!["length".to_string(), out.length.to_string()])
                .add_row(vec!["header".to_string(), snapshot.header.to_string()])
                .add_row(vec!["payload[0]".to_string(), format!("{:#010x}", out.first_word)])
                .add_row(vec!["payload capacity".to_string(), format!("{} words", out.payload_capacity)]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "chan_status={:#x} flags={:#x} length={} {} payload[0]={:#x}",
                out.channel_status, out.flags, out.length, snapshot.header, out.first_word
            );
        }
        OutputFormat::Raw => {
            println!("{:#x}", out.channel_status);
        }
    }
}

fn status_text(outcome: &ClockOutcome) -> String {
    match outcome.status {
        Some(status) => status.to_string(),
        None => "-".to_string(),
    }
}
