//! Client-side session coordinator, grounded on `CoSimClient`: owns one
//! `Channel`, is passive with respect to the simulation clock, and either
//! runs a dedicated callback thread or exposes a polling API.

use crate::buffers::SessionBuffers;
use crate::callbacks::Callbacks;
use cosim_core::channel::{Channel, ChannelReader, ChannelWriter};
use cosim_core::error::{Error, Result};
use cosim_protocol::codec::{
    decode_ping, decode_step_header, decode_terminate, encode_ok, encode_ping_ok,
    encode_step_ok_header, read_frame_kind, ConnectOk, ConnectRequest,
};
use cosim_protocol::frame_kind::FrameKind;
use cosim_protocol::handshake::perform_client_handshake;
use cosim_protocol::types::{Command, TerminateReason};
use cosim_protocol::version::CURRENT_PROTOCOL_VERSION;
use std::thread::JoinHandle;

/// Declares which server this client wants to join and under what name.
#[derive(Clone)]
pub struct ClientConfig {
    pub server_name: String,
    pub client_name: String,
    pub client_mode: u32,
}

pub struct CoSimClient<C: Channel> {
    channel: C,
    buffers: SessionBuffers,
    connect_ok: ConnectOk,
}

impl<C: Channel> CoSimClient<C> {
    /// Perform the handshake against an already-connected channel.
    pub fn connect(mut channel: C, config: ClientConfig) -> Result<Self> {
        let request = ConnectRequest {
            protocol_version: CURRENT_PROTOCOL_VERSION,
            client_mode: config.client_mode,
            server_name: config.server_name,
            client_name: config.client_name,
        };
        let connect_ok = perform_client_handshake(&mut channel, request)?;
        let buffers = SessionBuffers::from_connect_ok_as_client(&connect_ok)?;
        Ok(Self { channel, buffers, connect_ok })
    }

    pub fn negotiated_version(&self) -> u32 {
        self.connect_ok.negotiated_version
    }

    pub fn step_size(&self) -> i64 {
        self.connect_ok.step_size
    }

    pub fn buffers_mut(&mut self) -> &mut SessionBuffers {
        &mut self.buffers
    }

    pub fn disconnect(&mut self) {
        self.channel.disconnect();
    }

    /// Block for the next inbound frame and report which lifecycle or step
    /// command it carries, without yet acknowledging it. Mirrors
    /// `CoSimClient::PollCommand`.
    pub fn poll_command(&mut self, callbacks: &Callbacks) -> Result<PendingCommand> {
        self.channel.reader().begin_read()?;
        let kind = read_frame_kind(self.channel.reader().reader())?;
        match kind {
            FrameKind::Step => {
                let simulation_time = decode_step_header(self.channel.reader().reader())?;
                self.buffers.read_step_payload(self.channel.reader().reader())?;
                self.channel.reader().reader().end_read()?;
                callbacks.fire_begin_step(simulation_time);
                Ok(PendingCommand::Step { simulation_time })
            }
            FrameKind::Start => {
                self.channel.reader().reader().end_read()?;
                callbacks.fire_started();
                Ok(PendingCommand::Start)
            }
            FrameKind::Stop => {
                self.channel.reader().reader().end_read()?;
                callbacks.fire_stopped();
                Ok(PendingCommand::Stop)
            }
            FrameKind::Pause => {
                self.channel.reader().reader().end_read()?;
                callbacks.fire_paused();
                Ok(PendingCommand::Pause)
            }
            FrameKind::Continue => {
                self.channel.reader().reader().end_read()?;
                callbacks.fire_continued();
                Ok(PendingCommand::Continue)
            }
            FrameKind::Ping => {
                decode_ping(self.channel.reader().reader(), self.connect_ok.negotiated_version)?;
                self.channel.reader().reader().end_read()?;
                Ok(PendingCommand::Ping)
            }
            FrameKind::Terminate => {
                let (simulation_time, reason_bits) = decode_terminate(self.channel.reader().reader())?;
                self.channel.reader().reader().end_read()?;
                let reason = if reason_bits == 0 {
                    TerminateReason::Finished
                } else {
                    TerminateReason::Error
                };
                callbacks.fire_terminated(reason);
                Ok(PendingCommand::Terminate { simulation_time, reason })
            }
            other => {
                self.channel.reader().reader().end_read().ok();
                Err(Error::protocol(format!("unexpected frame {other:?} while polling")))
            }
        }
    }

    /// Acknowledge a pending command: `Ok` for lifecycle commands, `StepOk`
    /// for a step. Mirrors `CoSimClient::FinishCommand`.
    pub fn finish_command(&mut self, pending: &PendingCommand, callbacks: &Callbacks) -> Result<()> {
        match pending {
            PendingCommand::Step { simulation_time } => {
                callbacks.fire_end_step(*simulation_time);
                let next_simulation_time = *simulation_time + self.connect_ok.step_size;
                encode_step_ok_header(self.channel.writer().writer(), next_simulation_time, Command::Step as u32)?;
                self.buffers.write_step_payload(self.channel.writer().writer())?;
                self.channel.writer().end_write()
            }
            PendingCommand::Ping => {
                encode_ping_ok(self.channel.writer().writer(), self.connect_ok.negotiated_version, Command::Ping as u32, 0)?;
                self.channel.writer().end_write()
            }
            _ => {
                encode_ok(self.channel.writer().writer())?;
                self.channel.writer().end_write()
            }
        }
    }

    /// Run the poll/finish loop on the current thread until the server
    /// terminates the session, invoking `callbacks` at each transition.
    /// Mirrors `CoSimClient::RunCallbackBasedCoSimulation` without the
    /// dedicated thread; callers that want the thread use
    /// `spawn_callback_loop` below.
    pub fn run_callback_loop(&mut self, callbacks: &Callbacks) -> Result<TerminateReason> {
        loop {
            let pending = self.poll_command(callbacks)?;
            let terminated = matches!(pending, PendingCommand::Terminate { .. });
            self.finish_command(&pending, callbacks)?;
            if let PendingCommand::Terminate { reason, .. } = pending {
                return Ok(reason);
            }
            let _ = terminated;
        }
    }
}

impl<C: Channel + Send + 'static> CoSimClient<C> {
    /// Spawn the callback-based co-simulation loop on its own thread,
    /// mirroring `CoSimClient::RunCallbackBasedCoSimulation`'s dedicated
    /// callback thread. `callbacks` must be shareable across the thread
    /// boundary.
    pub fn spawn_callback_loop(
        mut self,
        callbacks: Callbacks,
    ) -> JoinHandle<Result<TerminateReason>>
    where
        Callbacks: Send + 'static,
    {
        std::thread::Builder::new()
            .name("cosim-client-callback".to_string())
            .spawn(move || self.run_callback_loop(&callbacks))
            .expect("failed to spawn cosim client callback thread")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCommand {
    Step { simulation_time: i64 },
    Start,
    Stop,
    Pause,
    Continue,
    Ping,
    Terminate { simulation_time: i64, reason: TerminateReason },
}
