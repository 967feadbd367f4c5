//! Minimal demo server: binds a socket channel, accepts one client, and
//! steps the simulation clock forward at a fixed step size until the
//! client disconnects.

use anyhow::Context;
use clap::Parser;
use cosim::prelude::*;
use cosim_core::channel::socket_channel::SocketChannelServer;
use tracing::{info, warn};

#[derive(Parser)]
struct Args {
    /// Address to bind, e.g. 127.0.0.1:8900
    #[arg(long, default_value = "127.0.0.1:8900")]
    bind: String,

    /// Server name clients must dial in to.
    #[arg(long, default_value = "Demo")]
    server_name: String,

    /// Simulation step size in nanoseconds.
    #[arg(long, default_value_t = 1_000_000)]
    step_size: i64,

    /// Number of steps to run before terminating.
    #[arg(long, default_value_t = 100)]
    steps: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let listener = SocketChannelServer::bind(&args.bind).context("binding channel server")?;
    info!(bind = %args.bind, "listening");

    let config = ServerConfig {
        server_name: args.server_name,
        step_size: args.step_size,
        ..Default::default()
    };
    let mut server = CoSimServer::new(listener, config);

    let mut client = loop {
        if let Some(client) = server.try_accept()? {
            break client;
        }
        std::thread::sleep(std::time::Duration::from_millis(10));
    };
    info!("client connected");

    let callbacks = Callbacks::default();
    client.start(&callbacks)?;

    let mut simulation_time: i64 = 0;
    for step in 0..args.steps {
        match client.step(simulation_time, &callbacks) {
            Ok((next_time, command)) => {
                simulation_time = next_time;
                if command == Command::Terminate {
                    warn!(step, "client requested termination");
                    break;
                }
            }
            Err(err) => {
                warn!(step, %err, "step failed, ending session");
                break;
            }
        }
    }

    client.terminate(simulation_time, TerminateReason::Finished, &callbacks)?;
    client.disconnect();
    Ok(())
}
