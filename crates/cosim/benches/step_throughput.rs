//! Step throughput benchmark: how many simulated steps per second can the
//! server drive over a loopback socket channel with an otherwise-empty
//! signal/bus catalog.

use cosim::prelude::*;
use cosim_core::channel::socket_channel::{SocketChannel, SocketChannelServer};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::net::SocketAddr;
use std::time::Duration;

const STEP_COUNTS: &[u32] = &[100, 1_000];

fn step_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("step_throughput/socket");
    group.measurement_time(Duration::from_secs(5));
    group.sample_size(20);

    for &steps in STEP_COUNTS {
        group.bench_with_input(BenchmarkId::new("steps", steps), &steps, |b, &steps| {
            b.iter_batched(
                || {
                    let server_listener = SocketChannelServer::bind("127.0.0.1:0").unwrap();
                    let port = server_listener.local_port().unwrap();
                    let mut server = CoSimServer::new(
                        server_listener,
                        ServerConfig { server_name: "Bench".to_string(), step_size: 1_000, ..Default::default() },
                    );

                    let client_handle = std::thread::spawn(move || {
                        let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
                        let channel = SocketChannel::connect(addr, Duration::from_secs(2)).unwrap();
                        let mut client = CoSimClient::connect(
                            channel,
                            ClientConfig {
                                server_name: "Bench".to_string(),
                                client_name: "bench-client".to_string(),
                                client_mode: 0,
                            },
                        )
                        .unwrap();
                        let callbacks = Callbacks::default();
                        loop {
                            let pending = client.poll_command(&callbacks).unwrap();
                            let done = matches!(pending, PendingCommand::Terminate { .. });
                            client.finish_command(&pending, &callbacks).unwrap();
                            if done {
                                break;
                            }
                        }
                    });

                    let mut connected = loop {
                        if let Some(c) = server.try_accept().unwrap() {
                            break c;
                        }
                    };
                    let callbacks = Callbacks::default();
                    connected.start(&callbacks).unwrap();
                    (connected, callbacks, client_handle, steps)
                },
                |(mut connected, callbacks, client_handle, steps)| {
                    let mut simulation_time = 0i64;
                    for _ in 0..steps {
                        let (next_time, _command) = connected.step(simulation_time, &callbacks).unwrap();
                        simulation_time = next_time;
                    }
                    connected.terminate(simulation_time, TerminateReason::Finished, &callbacks).unwrap();
                    client_handle.join().unwrap();
                },
                criterion::BatchSize::PerIteration,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, step_throughput);
criterion_main!(benches);
