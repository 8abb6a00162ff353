//! Clap derive structures for the `amidipersist` CLI.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// amidipersist -- keep named ALSA MIDI connections alive
#[derive(Debug, Parser)]
#[command(
    name = "amidipersist",
    version,
    about = "Keep named ALSA sequencer connections alive across device replugs",
    long_about = "Reads connection rules of the form\n\n    \
        srcClient:srcPort:dstClient:dstPort\n\n\
        one per line (`\\:` escapes a colon, `#` starts a comment), connects\n\
        every matching port pair and reconnects whenever devices reappear."
)]
pub struct Cli {
    /// Rules file [default: ./amidipersist.connections]
    #[arg(long, short = 'f', value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Run a single pass and exit instead of watching for changes
    #[arg(long)]
    pub once: bool,

    /// Print the current subscriptions as rules-file lines and exit; wins over --once
    #[arg(long)]
    pub dump: bool,

    /// Output format for --dump
    #[arg(long, short = 'o', value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Reserved; accepted for compatibility and currently has no effect
    #[arg(long)]
    pub lax: bool,

    /// Quiet period after a topology change before reconnecting
    #[arg(long, value_name = "MS")]
    pub settle_ms: Option<u64>,

    /// Sequencer client name to register under
    #[arg(long, value_name = "NAME")]
    pub client_name: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Escaped rules-file lines, one per subscription
    Plain,
    /// Pretty-printed JSON array
    Json,
}
