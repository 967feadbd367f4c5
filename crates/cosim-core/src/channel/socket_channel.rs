//! Remote-mode channel backend: framed reads/writes over a `StreamSocket`.
//!
//! A single TCP connection carries both directions; the reader and writer
//! each hold a cloned file descriptor (`StreamSocket::try_clone`) so a
//! blocking read on one thread never holds up a write from another.

use crate::channel::frame::{FrameReader, FrameWriter};
use crate::channel::{Channel, ChannelReader, ChannelServer, ChannelWriter};
use crate::config::DEFAULT_READ_CHUNK;
use crate::error::Result;
use crate::os::socket::{StreamListener, StreamSocket};
use std::net::SocketAddr;
use std::time::Duration;

pub struct SocketWriter {
    socket: StreamSocket,
    frame: FrameWriter,
}

impl ChannelWriter for SocketWriter {
    fn writer(&mut self) -> &mut FrameWriter {
        &mut self.frame
    }

    fn end_write(&mut self) -> Result<()> {
        let frame = self.frame.finish();
        self.socket.send(frame)
    }
}

pub struct SocketReader {
    socket: StreamSocket,
    frame: FrameReader,
}

impl ChannelReader for SocketReader {
    fn reader(&mut self) -> &mut FrameReader {
        &mut self.frame
    }

    fn receive(&mut self, dst: &mut [u8]) -> Result<usize> {
        let n = dst.len().min(DEFAULT_READ_CHUNK).max(1);
        self.socket.receive(&mut dst[..n])
    }

    fn begin_read(&mut self) -> Result<()> {
        let socket = &mut self.socket;
        self.frame.begin_read(|dst| {
            let n = dst.len().min(DEFAULT_READ_CHUNK).max(1);
            socket.receive(&mut dst[..n])
        })
    }
}

/// A connected socket channel, split into an independently-usable reader
/// and writer over the same underlying connection.
pub struct SocketChannel {
    writer: SocketWriter,
    reader: SocketReader,
    peer: Option<SocketAddr>,
}

impl SocketChannel {
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        let socket = StreamSocket::connect(addr, timeout)?;
        Self::from_stream(socket)
    }

    /// Build a channel from one already-connected/accepted stream, cloning
    /// its file descriptor to split read and write paths.
    pub fn from_stream(socket: StreamSocket) -> Result<Self> {
        let peer = socket.peer_addr().ok();
        let read_socket = socket.try_clone()?;
        Ok(Self {
            writer: SocketWriter { socket, frame: FrameWriter::new() },
            reader: SocketReader { socket: read_socket, frame: FrameReader::new() },
            peer,
        })
    }
}

impl Channel for SocketChannel {
    type Writer = SocketWriter;
    type Reader = SocketReader;

    fn writer(&mut self) -> &mut Self::Writer {
        &mut self.writer
    }

    fn reader(&mut self) -> &mut Self::Reader {
        &mut self.reader
    }

    fn remote_address(&self) -> Option<String> {
        self.peer.map(|a| a.to_string())
    }

    fn disconnect(&mut self) {
        self.writer.socket.shutdown();
        self.reader.socket.shutdown();
    }
}

/// A TCP channel server accepting one connection per `try_accept` call.
pub struct SocketChannelServer {
    listener: StreamListener,
}

impl SocketChannelServer {
    pub fn bind(addr: &str) -> Result<Self> {
        Ok(Self { listener: StreamListener::bind(addr)? })
    }
}

impl ChannelServer for SocketChannelServer {
    type Channel = SocketChannel;

    fn local_port(&self) -> Result<u16> {
        self.listener.local_port()
    }

    fn try_accept(&mut self) -> Result<Option<Self::Channel>> {
        match self.listener.try_accept()? {
            Some(socket) => Ok(Some(SocketChannel::from_stream(socket)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn handshake_over_socket_channel() {
        let mut server = SocketChannelServer::bind("127.0.0.1:0").unwrap();
        let port = server.local_port().unwrap();

        let handle = thread::spawn(move || {
            let mut channel = loop {
                if let Some(c) = server.try_accept().unwrap() {
                    break c;
                }
            };
            channel.reader().begin_read().unwrap();
            let value = channel.reader().reader().read_u32().unwrap();
            channel.reader().reader().end_read().unwrap();
            assert_eq!(value, 99);
        });

        let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
        let mut client = SocketChannel::connect(addr, Duration::from_secs(1)).unwrap();
        client.writer().writer().write_u32(99).unwrap();
        client.writer().end_write().unwrap();
        handle.join().unwrap();
    }
}
