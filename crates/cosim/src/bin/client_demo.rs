//! Minimal demo client: connects to a running demo server and polls the
//! step/lifecycle loop until terminated.

use anyhow::Context;
use clap::Parser;
use cosim::prelude::*;
use cosim_core::channel::socket_channel::SocketChannel;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
struct Args {
    /// Address to connect to, e.g. 127.0.0.1:8900
    #[arg(long, default_value = "127.0.0.1:8900")]
    connect: String,

    /// Server name to request.
    #[arg(long, default_value = "Demo")]
    server_name: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let addr: SocketAddr = args.connect.parse().context("parsing --connect address")?;
    let channel = SocketChannel::connect(addr, Duration::from_secs(5)).context("connecting")?;
    let config = ClientConfig {
        server_name: args.server_name,
        client_name: "demo-client".to_string(),
        client_mode: 0,
    };
    let mut client = CoSimClient::connect(channel, config)?;
    info!(version = client.negotiated_version(), "connected");

    let callbacks = Callbacks::default();
    loop {
        let pending = client.poll_command(&callbacks)?;
        let done = matches!(pending, PendingCommand::Terminate { .. });
        client.finish_command(&pending, &callbacks)?;
        if done {
            break;
        }
    }

    client.disconnect();
    Ok(())
}
