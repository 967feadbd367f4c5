//! Server-side session coordinator, grounded on `CoSimServer`: owns a
//! `ChannelServer`, accepts one connection per client, runs the handshake,
//! and drives the per-step command loop from this side's clock.

use crate::buffers::SessionBuffers;
use crate::callbacks::Callbacks;
use cosim_core::channel::{Channel, ChannelReader, ChannelServer, ChannelWriter};
use cosim_core::error::{Error, Result};
use cosim_protocol::codec::{
    decode_ping_ok, decode_step_ok_header, encode_lifecycle, encode_ping, encode_step_header,
    encode_terminate, read_frame_kind, ConnectOk,
};
use cosim_protocol::frame_kind::FrameKind;
use cosim_protocol::handshake::{perform_server_handshake, HandshakeDecision};
use cosim_protocol::types::{
    CanController, Command, EthController, FrController, IoSignal, LinController, TerminateReason,
};
use cosim_protocol::version::{negotiate, CURRENT_PROTOCOL_VERSION};

/// Server-declared I/O and bus catalog, mirrors `CoSimServerConfig`.
#[derive(Clone, Default)]
pub struct ServerConfig {
    pub server_name: String,
    pub step_size: i64,
    pub incoming_signals: Vec<IoSignal>,
    pub outgoing_signals: Vec<IoSignal>,
    pub can_controllers: Vec<CanController>,
    pub eth_controllers: Vec<EthController>,
    pub lin_controllers: Vec<LinController>,
    pub fr_controllers: Vec<FrController>,
}

pub struct CoSimServer<S: ChannelServer> {
    listener: S,
    config: ServerConfig,
}

impl<S: ChannelServer> CoSimServer<S> {
    pub fn new(listener: S, config: ServerConfig) -> Self {
        Self { listener, config }
    }

    pub fn local_port(&self) -> Result<u16> {
        self.listener.local_port()
    }

    /// Non-blocking: accept and handshake one pending connection, if any.
    pub fn try_accept(&mut self) -> Result<Option<ConnectedClient<S::Channel>>> {
        let Some(mut channel) = self.listener.try_accept()? else {
            return Ok(None);
        };

        let mut ok = ConnectOk {
            negotiated_version: 0,
            client_mode: 0,
            step_size: self.config.step_size,
            simulation_state: 0,
            incoming_signals: self.config.incoming_signals.clone(),
            outgoing_signals: self.config.outgoing_signals.clone(),
            can_controllers: self.config.can_controllers.clone(),
            eth_controllers: self.config.eth_controllers.clone(),
            lin_controllers: self.config.lin_controllers.clone(),
            fr_controllers: self.config.fr_controllers.clone(),
        };
        let server_name = self.config.server_name.clone();
        let accept_template = ok.clone();

        let request = perform_server_handshake(&mut channel, move |req| {
            if req.server_name != server_name {
                return HandshakeDecision::Reject(format!("unknown server name '{}'", req.server_name));
            }
            let mut accepted = accept_template;
            accepted.client_mode = req.client_mode;
            HandshakeDecision::Accept(accepted)
        })?;

        ok.negotiated_version = negotiate(request.protocol_version, CURRENT_PROTOCOL_VERSION);
        let buffers = SessionBuffers::from_connect_ok_as_server(&ok)?;

        Ok(Some(ConnectedClient {
            channel,
            buffers,
            negotiated_version: ok.negotiated_version,
            running: false,
        }))
    }
}

/// One accepted, handshaked client connection, ready to be driven through
/// the simulation lifecycle.
pub struct ConnectedClient<C: Channel> {
    channel: C,
    buffers: SessionBuffers,
    negotiated_version: u32,
    running: bool,
}

impl<C: Channel> ConnectedClient<C> {
    fn send_lifecycle(&mut self, kind: FrameKind) -> Result<()> {
        encode_lifecycle(self.channel.writer().writer(), kind)?;
        self.channel.writer().end_write()?;
        self.channel.reader().begin_read()?;
        let reply = read_frame_kind(self.channel.reader().reader())?;
        self.channel.reader().reader().end_read().ok();
        if reply == FrameKind::Ok {
            Ok(())
        } else {
            Err(Error::protocol(format!("client rejected lifecycle command with {reply:?}")))
        }
    }

    pub fn start(&mut self, callbacks: &Callbacks) -> Result<()> {
        self.send_lifecycle(FrameKind::Start)?;
        self.running = true;
        callbacks.fire_started();
        Ok(())
    }

    pub fn stop(&mut self, callbacks: &Callbacks) -> Result<()> {
        self.send_lifecycle(FrameKind::Stop)?;
        self.running = false;
        callbacks.fire_stopped();
        Ok(())
    }

    pub fn pause(&mut self, callbacks: &Callbacks) -> Result<()> {
        self.send_lifecycle(FrameKind::Pause)?;
        callbacks.fire_paused();
        Ok(())
    }

    pub fn continue_simulation(&mut self, callbacks: &Callbacks) -> Result<()> {
        self.send_lifecycle(FrameKind::Continue)?;
        callbacks.fire_continued();
        Ok(())
    }

    /// Send one `Ping`/`PingOk` round trip and report the elapsed time.
    ///
    /// The host is expected to call this on its own idle cadence (e.g. a
    /// 1ms tick, see `cosim_core::config::PING_TICK`) while the session is
    /// not running, rather than this crate spawning a dedicated thread for
    /// it: the channel's reader/writer halves are already independently
    /// owned, but a session-internal ping thread would need its own
    /// synchronization against `step`/lifecycle calls sharing the same
    /// channel, which the caller is better placed to serialize.
    pub fn ping(&mut self) -> Result<std::time::Duration> {
        let sent_at = std::time::Instant::now();
        encode_ping(self.channel.writer().writer(), self.negotiated_version)?;
        self.channel.writer().end_write()?;

        self.channel.reader().begin_read()?;
        let kind = read_frame_kind(self.channel.reader().reader())?;
        if kind != FrameKind::PingOk {
            self.channel.reader().reader().end_read().ok();
            return Err(Error::protocol(format!("expected PingOk, got {kind:?}")));
        }
        decode_ping_ok(self.channel.reader().reader(), self.negotiated_version)?;
        self.channel.reader().reader().end_read()?;
        Ok(sent_at.elapsed())
    }

    pub fn terminate(&mut self, simulation_time: i64, reason: TerminateReason, callbacks: &Callbacks) -> Result<()> {
        let wire_reason = match reason {
            TerminateReason::Finished => 0,
            TerminateReason::Error => 1,
        };
        encode_terminate(self.channel.writer().writer(), simulation_time, wire_reason)?;
        self.channel.writer().end_write()?;
        self.channel.reader().begin_read()?;
        let reply = read_frame_kind(self.channel.reader().reader())?;
        self.channel.reader().reader().end_read().ok();
        self.running = false;
        callbacks.fire_terminated(reason);
        if reply == FrameKind::Ok {
            Ok(())
        } else {
            Err(Error::protocol(format!("client did not acknowledge terminate: {reply:?}")))
        }
    }

    /// Drive the simulation forward by one step: write `Step`, block for
    /// `StepOk`, and run the `begin_step`/`end_step` callbacks around the
    /// buffer deserialize/serialize hooks in the order the session
    /// guarantees.
    pub fn step(&mut self, simulation_time: i64, callbacks: &Callbacks) -> Result<(i64, Command)> {
        callbacks.fire_begin_step(simulation_time);

        encode_step_header(self.channel.writer().writer(), simulation_time)?;
        self.buffers.write_step_payload(self.channel.writer().writer())?;
        self.channel.writer().end_write()?;

        self.channel.reader().begin_read()?;
        let kind = read_frame_kind(self.channel.reader().reader())?;
        if kind != FrameKind::StepOk {
            self.channel.reader().reader().end_read().ok();
            return Err(Error::protocol(format!("expected StepOk, got {kind:?}")));
        }
        let (next_simulation_time, command_bits) = decode_step_ok_header(self.channel.reader().reader())?;
        self.buffers.read_step_payload(self.channel.reader().reader())?;
        self.channel.reader().reader().end_read()?;

        callbacks.fire_end_step(simulation_time);

        let command = decode_command(command_bits);
        Ok((next_simulation_time, command))
    }

    pub fn buffers_mut(&mut self) -> &mut SessionBuffers {
        &mut self.buffers
    }

    pub fn negotiated_version(&self) -> u32 {
        self.negotiated_version
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn disconnect(&mut self) {
        self.channel.disconnect();
        self.running = false;
    }
}

fn decode_command(bits: u32) -> Command {
    match bits {
        1 => Command::Step,
        2 => Command::Start,
        3 => Command::Stop,
        4 => Command::Terminate,
        5 => Command::Pause,
        6 => Command::Continue,
        7 => Command::TerminateFinished,
        8 => Command::Ping,
        _ => Command::None,
    }
}
