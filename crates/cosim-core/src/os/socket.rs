//! Stream socket wrapper: connect-with-timeout, `TCP_NODELAY`, and a single
//! blocking-send/recv surface shared by TCP and Unix-domain transports.
//!
//! Grounded on the teacher's `tcp.rs` (the `socket2`-based `TCP_NODELAY`
//! technique), adapted from compio's async calls to blocking `std::net`
//! calls per the concurrency model's native-thread requirement.

use crate::error::{Error, Result};
use socket2::{Domain, Socket, TcpKeepalive, Type};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;

/// A connected, `TCP_NODELAY`-enabled stream usable as either side of a
/// channel socket backend.
pub struct StreamSocket {
    inner: TcpStream,
}

impl StreamSocket {
    /// Connect with an explicit timeout via non-blocking connect + poll,
    /// then switch back to blocking mode for the session lifetime.
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
        let socket = Socket::new(domain, Type::STREAM, None)?;
        socket.set_nonblocking(true)?;
        match socket.connect(&addr.into()) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock || e.raw_os_error() == Some(libc::EINPROGRESS) => {
                socket.connect_timeout(&addr.into(), timeout)?;
            }
            Err(e) => return Err(Error::Io(e)),
        }
        socket.set_nonblocking(false)?;
        socket.set_nodelay(true)?;
        Ok(Self { inner: socket.into() })
    }

    pub fn from_accepted(stream: TcpStream) -> Result<Self> {
        let socket = Socket::from(stream);
        socket.set_nodelay(true)?;
        socket.set_keepalive(true)?;
        let _ = socket.set_tcp_keepalive(&TcpKeepalive::new().with_time(Duration::from_secs(30)));
        Ok(Self { inner: socket.into() })
    }

    /// Single blocking send; treats a zero-byte or reset write as
    /// `NotConnected` rather than a generic `Error`.
    pub fn send(&mut self, buf: &[u8]) -> Result<()> {
        match self.inner.write_all(buf) {
            Ok(()) => Ok(()),
            Err(e) => Err(map_send_error(e)),
        }
    }

    /// Single blocking receive of up to `buf.len()` bytes; returns the
    /// number of bytes actually read. A return of `0` is `NotConnected`.
    pub fn receive(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.inner.read(buf) {
            Ok(0) => Err(Error::NotConnected),
            Ok(n) => Ok(n),
            Err(e) => Err(map_recv_error(e)),
        }
    }

    pub fn peer_addr(&self) -> Result<SocketAddr> {
        Ok(self.inner.peer_addr()?)
    }

    pub fn shutdown(&self) {
        let _ = self.inner.shutdown(std::net::Shutdown::Both);
    }

    /// Duplicate the underlying file descriptor so reads and writes can
    /// proceed independently (e.g. from separate reader/writer halves of a
    /// channel) without a mutex; socket options are shared across clones.
    pub fn try_clone(&self) -> Result<Self> {
        Ok(Self { inner: self.inner.try_clone()? })
    }
}

fn map_send_error(e: std::io::Error) -> Error {
    match e.raw_os_error() {
        Some(libc::ECONNRESET) | Some(libc::ECONNABORTED) | Some(libc::EPIPE) => Error::NotConnected,
        _ => Error::Io(e),
    }
}

fn map_recv_error(e: std::io::Error) -> Error {
    match e.raw_os_error() {
        Some(libc::ECONNRESET) | Some(libc::ECONNABORTED) => Error::NotConnected,
        _ => Error::Io(e),
    }
}

/// A bound TCP listener used by the remote-mode channel server.
pub struct StreamListener {
    inner: TcpListener,
}

impl StreamListener {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self { inner: listener })
    }

    #[must_use]
    pub fn local_port(&self) -> Result<u16> {
        Ok(self.inner.local_addr()?.port())
    }

    /// Non-blocking accept attempt, used by the server's `try_accept` poll
    /// loop rather than a dedicated accept thread.
    pub fn try_accept(&self) -> Result<Option<StreamSocket>> {
        self.inner.set_nonblocking(true)?;
        match self.inner.accept() {
            Ok((stream, _addr)) => {
                stream.set_nonblocking(false)?;
                Ok(Some(StreamSocket::from_accepted(stream)?))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(Error::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn connect_and_exchange_bytes() {
        let listener = StreamListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_port().unwrap();
        let handle = thread::spawn(move || {
            let mut server = loop {
                if let Some(s) = listener.try_accept().unwrap() {
                    break s;
                }
            };
            let mut buf = [0u8; 5];
            server.receive(&mut buf).unwrap();
            assert_eq!(&buf, b"hello");
        });
        let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
        let mut client = StreamSocket::connect(addr, Duration::from_secs(1)).unwrap();
        client.send(b"hello").unwrap();
        handle.join().unwrap();
    }
}
