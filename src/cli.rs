//! Command line interface for the `wiretether` console client.
//!
//! Shared with `build.rs`, which renders the man page from it, so it only
//! depends on `clap`.

use clap::Parser;

/// Command line arguments for the `wiretether` binary.
#[derive(Debug, Parser)]
#[command(
    name = "wiretether",
    version,
    about = "Keep a framed TCP connection to a device open and relay it to the console"
)]
pub struct Cli {
    /// Remote host name or address.
    pub host: String,

    /// Remote port.
    #[arg(value_parser = clap::value_parser!(u16).range(1..))]
    pub port: u16,

    /// Frame delimiter as hexadecimal bytes.
    #[arg(short, long, default_value = "0d0a")]
    pub delimiter: String,

    /// Text encoding: ascii, utf-8 or iso-8859-1.
    #[arg(short, long, default_value = "ascii")]
    pub encoding: String,

    /// Pause between socket polls, in milliseconds.
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_ms: u64,

    /// Period of the reachability check, in milliseconds.
    #[arg(long, default_value_t = 5000, value_parser = clap::value_parser!(u64).range(1000..))]
    pub liveness_ms: u64,

    /// Discard frames the device had buffered before the connection opened.
    #[arg(long)]
    pub skip_first_burst: bool,

    /// Trim surrounding whitespace from received text.
    #[arg(long)]
    pub auto_trim: bool,
}
