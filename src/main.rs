//! Console client relaying a `wiretether` connection.
//!
//! Prints connection changes and received data, and sends every line read
//! from standard input as a framed message until EOF or Ctrl-C.

mod cli;

use std::{io, time::Duration};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use wiretether::{ClientConfig, TetherClient, TextEncoding};

fn client_config(cli: &cli::Cli) -> Result<ClientConfig, wiretether::ConfigError> {
    let encoding: TextEncoding = cli.encoding.parse()?;
    ClientConfig::builder()
        .conn_data(cli.host.as_str(), cli.port)?
        .encoding(encoding)
        .delimiter_hex(&cli.delimiter)?
        .poll_interval(Duration::from_millis(cli.poll_ms))?
        .liveness_interval(Duration::from_millis(cli.liveness_ms))?
        .skip_first_burst(cli.skip_first_burst)
        .auto_trim(cli.auto_trim)
        .build()
}

/// Make the first connection attempt. A failure is reported and the relay
/// keeps running, so typed lines are still accepted.
async fn open(client: &TetherClient) -> bool {
    match client.connect().await {
        Ok(()) => true,
        Err(error) => {
            eprintln!("Connect failed: {error}");
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with relayed data.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let client = TetherClient::builder(client_config(&cli)?)
        .on_connected(|| println!("Connected"))
        .on_disconnected(|| println!("Disconnected"))
        .on_frame(|message| println!("Received: {}", message.text()))
        .on_burst(|message| println!("Received undelimited: {}", message.text()))
        .build();
    open(&client).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => {
                    if let Err(error) = client.write_framed(&line).await {
                        tracing::warn!(%error, "failed to send line");
                    }
                }
                None => break,
            },
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
        }
    }

    client.shutdown();
    Ok(())
}
