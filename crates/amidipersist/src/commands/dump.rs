//! `--dump`: list existing subscriptions as rules-file lines.

use std::io::{self, Write};

use amidipersist_core::{DeviceGraph, GraphSnapshot};

use crate::cli::OutputFormat;
use crate::config::RunConfig;
use crate::error::CliError;
use crate::output;

pub fn handle(cfg: &RunConfig, format: OutputFormat) -> Result<(), CliError> {
    let graph = amidipersist_seq::open_graph(&cfg.client_name)?;
    dump(
        &graph,
        format,
        &mut io::stdout().lock(),
        &mut io::stderr().lock(),
    )?;
    Ok(())
}

/// Write the count header to `err` and the entries to `out`. Returns the count.
pub fn dump<G: DeviceGraph + ?Sized>(
    graph: &G,
    format: OutputFormat,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<usize, CliError> {
    let snapshot = GraphSnapshot::build(graph, 1);
    let entries = output::dump_entries(&snapshot);

    writeln!(err, "{} connections:", entries.len())?;
    output::write_output(out, &output::render_dump(format, &entries)?)?;
    Ok(entries.len())
}
