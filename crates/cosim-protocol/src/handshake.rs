//! Connect/ConnectOk handshake, grounded on `CoSimClient::Connect` /
//! `CoSimServer::HandleConnect`. Runs to completion on the calling thread
//! before either side starts its background loops.

use crate::codec::{
    decode_connect, decode_connect_ok, decode_error, encode_connect, encode_connect_ok,
    encode_error, read_frame_kind, ConnectOk, ConnectRequest,
};
use crate::frame_kind::FrameKind;
use crate::version::{negotiate, CURRENT_PROTOCOL_VERSION};
use cosim_core::channel::{Channel, ChannelReader, ChannelWriter};
use cosim_core::error::{Error, Result};

/// Sent by the client; the server replies with the negotiated `ConnectOk`
/// payload.
pub fn perform_client_handshake<C: Channel>(
    channel: &mut C,
    request: ConnectRequest,
) -> Result<ConnectOk> {
    encode_connect(channel.writer().writer(), &request)?;
    channel.writer().end_write()?;

    channel.reader().begin_read()?;
    let kind = read_frame_kind(channel.reader().reader())?;
    let result = match kind {
        FrameKind::ConnectOk => decode_connect_ok(channel.reader().reader()),
        FrameKind::Error => {
            let message = decode_error(channel.reader().reader())?;
            Err(Error::protocol(format!("server rejected connect: {message}")))
        }
        other => Err(Error::protocol(format!("unexpected frame {other:?} during handshake"))),
    };
    channel.reader().reader().end_read().ok();
    result
}

/// Outcome the server-side handler decides after inspecting the client's
/// `Connect` request: either accept with a computed `ConnectOk`, or reject
/// with a message that becomes an `Error` frame.
pub enum HandshakeDecision {
    Accept(ConnectOk),
    Reject(String),
}

pub fn perform_server_handshake<C: Channel>(
    channel: &mut C,
    decide: impl FnOnce(&ConnectRequest) -> HandshakeDecision,
) -> Result<ConnectRequest> {
    channel.reader().begin_read()?;
    let kind = read_frame_kind(channel.reader().reader())?;
    if kind != FrameKind::Connect {
        channel.reader().reader().end_read().ok();
        return Err(Error::protocol(format!("expected Connect, got {kind:?}")));
    }
    let request = decode_connect(channel.reader().reader())?;
    channel.reader().reader().end_read()?;

    match decide(&request) {
        HandshakeDecision::Accept(mut ok) => {
            ok.negotiated_version = negotiate(request.protocol_version, CURRENT_PROTOCOL_VERSION);
            encode_connect_ok(channel.writer().writer(), &ok)?;
            channel.writer().end_write()?;
            Ok(request)
        }
        HandshakeDecision::Reject(message) => {
            encode_error(channel.writer().writer(), &message)?;
            channel.writer().end_write()?;
            Err(Error::protocol(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosim_core::channel::local_channel::{LocalChannel, LocalChannelServer};
    use cosim_core::channel::ChannelServer;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn client_and_server_agree_on_negotiated_version() {
        let base = format!("handshake-test-{}", std::process::id());
        let server_base = base.clone();
        let server_handle = thread::spawn(move || {
            let mut server = LocalChannelServer::create(&server_base).unwrap();
            let mut channel = loop {
                if let Some(c) = server.try_accept().unwrap() {
                    break c;
                }
                thread::sleep(Duration::from_millis(5));
            };
            perform_server_handshake(&mut channel, |req| {
                assert_eq!(req.client_name, "client-a");
                HandshakeDecision::Accept(ConnectOk {
                    negotiated_version: 0,
                    step_size: 1_000_000,
                    ..Default::default()
                })
            })
            .unwrap();
        });

        thread::sleep(Duration::from_millis(20));
        let mut client = LocalChannel::open(&base, true).unwrap();
        let ok = perform_client_handshake(
            &mut client,
            ConnectRequest {
                protocol_version: CURRENT_PROTOCOL_VERSION,
                client_mode: 0,
                server_name: "server-a".to_string(),
                client_name: "client-a".to_string(),
            },
        )
        .unwrap();
        assert_eq!(ok.negotiated_version, CURRENT_PROTOCOL_VERSION);
        server_handle.join().unwrap();
    }
}
