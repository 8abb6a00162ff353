//! Output formatting.
//!
//! Successful connects and `--dump` lines go to stdout; everything else
//! (logs, counts, diagnostics) goes to stderr.

use std::io::{self, Write};

use serde::Serialize;

use amidipersist_config::format_rule_line;
use amidipersist_core::{
    ConnectionOutcome, ConnectionRule, DeviceAddress, DeviceName, GraphSnapshot, PassReport,
};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Operator notices ─────────────────────────────────────────────────

pub const LAYOUT_CHANGE_NOTICE: &str = "Alsa midi layout change detected.  Refreshing connections.";

pub fn loaded_line(count: usize) -> String {
    format!("{count} connection request(s) loaded")
}

pub fn print_loaded(count: usize) {
    println!("{}", loaded_line(count));
}

// ── Connect reporting ────────────────────────────────────────────────

pub fn connected_line(outcome: &ConnectionOutcome) -> String {
    format!("Connected {outcome}")
}

/// Stdout lines for one pass. Passes after the first were triggered by a
/// topology change and lead with the layout-change notice.
pub fn report_lines(report: &PassReport) -> Vec<String> {
    let notice = (report.generation > 1).then(|| LAYOUT_CHANGE_NOTICE.to_owned());
    notice
        .into_iter()
        .chain(report.connected().map(connected_line))
        .collect()
}

pub fn print_report(report: &PassReport) {
    let mut stdout = io::stdout().lock();
    for line in report_lines(report) {
        let _ = writeln!(stdout, "{line}");
    }
}

// ── Dump ─────────────────────────────────────────────────────────────

/// One existing subscription, by name and address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpEntry {
    pub source: DeviceName,
    pub source_addr: DeviceAddress,
    pub dest: DeviceName,
    pub dest_addr: DeviceAddress,
}

impl DumpEntry {
    pub fn as_rule(&self) -> ConnectionRule {
        ConnectionRule::new(self.source.clone(), self.dest.clone())
    }
}

/// Every subscription in `snapshot`, ordered by source then destination.
pub fn dump_entries(snapshot: &GraphSnapshot) -> Vec<DumpEntry> {
    snapshot
        .subscriptions()
        .map(|(src, dst)| DumpEntry {
            source: snapshot.display_name(src),
            source_addr: src,
            dest: snapshot.display_name(dst),
            dest_addr: dst,
        })
        .collect()
}

pub fn render_dump(format: OutputFormat, entries: &[DumpEntry]) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Plain => entries
            .iter()
            .map(|e| format_rule_line(&e.as_rule()))
            .collect::<Vec<_>>()
            .join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(entries)?,
    })
}

/// Write rendered output followed by a newline, unless it is empty.
pub fn write_output(out: &mut impl Write, output: &str) -> io::Result<()> {
    if output.is_empty() {
        return Ok(());
    }
    writeln!(out, "{output}")
}
