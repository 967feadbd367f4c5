//! Per-session bundle of I/O and bus buffers, wired together so a single
//! `Step`/`StepOk` frame can carry every sub-payload in the order defined
//! by the wire protocol: I/O signals, then CAN, then Ethernet, then LIN,
//! then (if negotiated) FlexRay.

use cosim_core::channel::frame::{FrameReader, FrameWriter};
use cosim_core::error::Result;
use cosim_io::bus_buffer::RemoteBusBuffer;
use cosim_io::signal_buffer::{IoBuffer, RemoteIoBuffer};
use cosim_protocol::codec::ConnectOk;
use cosim_protocol::types::{CanMessage, EthMessage, FrMessage, LinMessage};
use cosim_protocol::version::supports_flexray;

/// Everything exchanged inside one `Step`/`StepOk` frame, split into the
/// direction this side writes (`outgoing_*`) and the direction it reads
/// (`incoming_*`).
pub struct SessionBuffers {
    pub outgoing_io: RemoteIoBuffer,
    pub incoming_io: RemoteIoBuffer,
    pub can_tx: RemoteBusBuffer<CanMessage>,
    pub can_rx: RemoteBusBuffer<CanMessage>,
    pub eth_tx: RemoteBusBuffer<EthMessage>,
    pub eth_rx: RemoteBusBuffer<EthMessage>,
    pub lin_tx: RemoteBusBuffer<LinMessage>,
    pub lin_rx: RemoteBusBuffer<LinMessage>,
    pub fr_tx: RemoteBusBuffer<FrMessage>,
    pub fr_rx: RemoteBusBuffer<FrMessage>,
    negotiated_version: u32,
}

impl SessionBuffers {
    /// Build for the server side of a negotiated `ConnectOk`:
    /// `outgoing_signals`/`can_controllers`/etc. are the server's own
    /// config, taken as-is.
    pub fn from_connect_ok_as_server(ok: &ConnectOk) -> Result<Self> {
        Self::build(ok, ok.outgoing_signals.clone(), ok.incoming_signals.clone())
    }

    /// Build for the client side: the server's `incoming_signals` are what
    /// the client must produce (server's inbound direction), and the
    /// server's `outgoing_signals` are what the client receives.
    pub fn from_connect_ok_as_client(ok: &ConnectOk) -> Result<Self> {
        Self::build(ok, ok.incoming_signals.clone(), ok.outgoing_signals.clone())
    }

    fn build(ok: &ConnectOk, outgoing_signals: Vec<cosim_protocol::types::IoSignal>, incoming_signals: Vec<cosim_protocol::types::IoSignal>) -> Result<Self> {
        Ok(Self {
            outgoing_io: RemoteIoBuffer::new(outgoing_signals)?,
            incoming_io: RemoteIoBuffer::new(incoming_signals)?,
            can_tx: RemoteBusBuffer::new("CAN", &ok.can_controllers),
            can_rx: RemoteBusBuffer::new("CAN", &ok.can_controllers),
            eth_tx: RemoteBusBuffer::new("Ethernet", &ok.eth_controllers),
            eth_rx: RemoteBusBuffer::new("Ethernet", &ok.eth_controllers),
            lin_tx: RemoteBusBuffer::new("LIN", &ok.lin_controllers),
            lin_rx: RemoteBusBuffer::new("LIN", &ok.lin_controllers),
            fr_tx: RemoteBusBuffer::new("FlexRay", &ok.fr_controllers),
            fr_rx: RemoteBusBuffer::new("FlexRay", &ok.fr_controllers),
            negotiated_version: ok.negotiated_version,
        })
    }

    /// Write this side's outgoing I/O and transmit-bus payloads into a
    /// frame already carrying the `Step`/`StepOk` header.
    pub fn write_step_payload(&mut self, writer: &mut FrameWriter) -> Result<()> {
        self.outgoing_io.serialize(writer)?;
        self.can_tx.serialize(writer)?;
        self.eth_tx.serialize(writer)?;
        self.lin_tx.serialize(writer)?;
        if supports_flexray(self.negotiated_version) {
            self.fr_tx.serialize(writer)?;
        }
        Ok(())
    }

    /// Read the peer's outgoing payload (this side's incoming/receive
    /// buffers) from a frame already past its `Step`/`StepOk` header.
    pub fn read_step_payload(&mut self, reader: &mut FrameReader) -> Result<()> {
        self.incoming_io.deserialize(reader)?;
        self.can_rx.deserialize(reader)?;
        self.eth_rx.deserialize(reader)?;
        self.lin_rx.deserialize(reader)?;
        if supports_flexray(self.negotiated_version) {
            self.fr_rx.deserialize(reader)?;
        }
        Ok(())
    }
}
