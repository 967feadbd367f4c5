//! Thin TCP client for the well-known port mapper: servers register their
//! listening port under a name with `SetPort`, clients resolve a name to a
//! port with `GetPort`, grounded on `Protocol.cpp`'s `SendGetPort`/
//! `SendSetPort`/`SendUnsetPort` family.

use crate::codec::{
    decode_get_port_ok, encode_get_port, encode_set_port, encode_unset_port, read_frame_kind,
};
use crate::frame_kind::FrameKind;
use cosim_core::channel::socket_channel::SocketChannel;
use cosim_core::channel::{Channel, ChannelReader, ChannelWriter};
use cosim_core::error::{Error, Result};
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_PORT_MAPPER_PORT: u16 = 28000;

pub struct PortMapperClient {
    channel: SocketChannel,
}

impl PortMapperClient {
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self> {
        Ok(Self { channel: SocketChannel::connect(addr, timeout)? })
    }

    pub fn get_port(&mut self, server_name: &str) -> Result<u16> {
        encode_get_port(self.channel.writer().writer(), server_name)?;
        self.channel.writer().end_write()?;

        self.channel.reader().begin_read()?;
        let kind = read_frame_kind(self.channel.reader().reader())?;
        let result = match kind {
            FrameKind::GetPortOk => decode_get_port_ok(self.channel.reader().reader()),
            FrameKind::Error => Err(Error::protocol(format!("server '{server_name}' not registered"))),
            other => Err(Error::protocol(format!("unexpected frame {other:?} from port mapper"))),
        };
        self.channel.reader().reader().end_read().ok();
        result
    }

    pub fn set_port(&mut self, server_name: &str, port: u16) -> Result<()> {
        encode_set_port(self.channel.writer().writer(), server_name, port)?;
        self.channel.writer().end_write()?;
        self.channel.reader().begin_read()?;
        let kind = read_frame_kind(self.channel.reader().reader())?;
        self.channel.reader().reader().end_read().ok();
        if kind == FrameKind::Ok {
            Ok(())
        } else {
            Err(Error::protocol(format!("port mapper rejected SetPort: {kind:?}")))
        }
    }

    pub fn unset_port(&mut self, server_name: &str) -> Result<()> {
        encode_unset_port(self.channel.writer().writer(), server_name)?;
        self.channel.writer().end_write()?;
        self.channel.reader().begin_read()?;
        let kind = read_frame_kind(self.channel.reader().reader())?;
        self.channel.reader().reader().end_read().ok();
        if kind == FrameKind::Ok {
            Ok(())
        } else {
            Err(Error::protocol(format!("port mapper rejected UnsetPort: {kind:?}")))
        }
    }
}
