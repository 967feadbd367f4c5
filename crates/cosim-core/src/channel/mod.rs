//! Byte channel abstraction: one framing contract (`frame`), two backends
//! (`socket_channel`, `local_channel`).

pub mod frame;
pub mod local_channel;
pub mod socket_channel;

use crate::error::Result;
use frame::{FrameReader, FrameWriter};

/// One direction's worth of framed writes over a backend transport.
///
/// `end_write` is implemented per backend rather than as a trait default:
/// it needs simultaneous access to the staged frame and the `send` call
/// that consumes it, which a `&mut self`-based default method cannot
/// express without aliasing the same buffer mutably.
pub trait ChannelWriter {
    fn writer(&mut self) -> &mut FrameWriter;
    /// Stamp the frame header and flush the staged bytes through the backend.
    fn end_write(&mut self) -> Result<()>;
}

/// One direction's worth of framed reads over a backend transport.
pub trait ChannelReader {
    fn reader(&mut self) -> &mut FrameReader;
    /// Pull more bytes from the backend into `dst`, returning how many.
    fn receive(&mut self, dst: &mut [u8]) -> Result<usize>;
    /// Block until a full frame is staged and ready to decode.
    fn begin_read(&mut self) -> Result<()>;
}

/// A connected channel pair, owning exactly one reader and one writer.
pub trait Channel {
    type Writer: ChannelWriter;
    type Reader: ChannelReader;

    fn writer(&mut self) -> &mut Self::Writer;
    fn reader(&mut self) -> &mut Self::Reader;
    fn remote_address(&self) -> Option<String>;
    fn disconnect(&mut self);
}

/// A listener that hands out connected channels.
pub trait ChannelServer {
    type Channel: Channel;

    fn local_port(&self) -> Result<u16>;
    fn try_accept(&mut self) -> Result<Option<Self::Channel>>;
}
