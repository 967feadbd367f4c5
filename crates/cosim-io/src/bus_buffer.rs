//! Bus message buffers: four parallel specializations (CAN/Ethernet/LIN/
//! FlexRay) over one template, grounded on `BusBuffer.hpp`'s
//! `RemoteBusBuffer`/`LocalBusBuffer`.

use cosim_core::channel::frame::{FrameReader, FrameWriter};
use cosim_core::error::{Error, Result};
use cosim_core::logging::{log, Severity};
use cosim_protocol::types::{
    CanController, CanMessage, CanMessageFlags, EthController, EthMessage, FrController, FrMessage,
    LinController, LinMessage,
};
use std::collections::{HashMap, VecDeque};

/// A fixed-shape bus message that knows how to encode/decode its own body
/// and, for CAN, validate its flag bits.
pub trait BusMessage: Sized {
    fn controller_id(&self) -> u32;
    fn byte_length(&self) -> usize;
    fn max_length() -> usize;
    fn write_body(&self, writer: &mut FrameWriter) -> Result<()>;
    fn read_body(reader: &mut FrameReader) -> Result<Self>;
    fn check_flags(&self) -> Result<()> {
        Ok(())
    }
}

impl BusMessage for CanMessage {
    fn controller_id(&self) -> u32 {
        self.controller_id
    }

    fn byte_length(&self) -> usize {
        self.length as usize
    }

    fn max_length() -> usize {
        cosim_protocol::types::CAN_MESSAGE_MAX_LENGTH
    }

    fn write_body(&self, writer: &mut FrameWriter) -> Result<()> {
        writer.write_i64(self.timestamp)?;
        writer.write_u32(self.controller_id)?;
        writer.write_u32(self.id)?;
        writer.write_u32(self.flags)?;
        writer.write_u16(u16::from(self.length))?;
        writer.write_bytes(&self.data[..self.length as usize])
    }

    fn read_body(reader: &mut FrameReader) -> Result<Self> {
        let timestamp = reader.read_i64()?;
        let controller_id = reader.read_u32()?;
        let id = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let length = reader.read_u16()? as u8;
        if length as usize > Self::max_length() {
            return Err(Error::protocol("CAN message length exceeds maximum"));
        }
        let body = reader.read_bytes(length as usize)?;
        let mut data = [0u8; 64];
        data[..length as usize].copy_from_slice(body);
        Ok(Self { timestamp, controller_id, id, flags, length, data })
    }

    fn check_flags(&self) -> Result<()> {
        if CanMessageFlags(self.flags).is_valid() {
            Ok(())
        } else {
            Err(Error::invalid_argument(format!("invalid CAN message flags {:#x}", self.flags)))
        }
    }
}

impl BusMessage for EthMessage {
    fn controller_id(&self) -> u32 {
        self.controller_id
    }

    fn byte_length(&self) -> usize {
        self.length as usize
    }

    fn max_length() -> usize {
        cosim_protocol::types::ETH_MESSAGE_MAX_LENGTH
    }

    fn write_body(&self, writer: &mut FrameWriter) -> Result<()> {
        writer.write_i64(self.timestamp)?;
        writer.write_u32(self.controller_id)?;
        writer.write_u32(self.flags)?;
        writer.write_u32(u32::from(self.length))?;
        writer.write_bytes(&self.data[..self.length as usize])
    }

    fn read_body(reader: &mut FrameReader) -> Result<Self> {
        let timestamp = reader.read_i64()?;
        let controller_id = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let length = reader.read_u32()?;
        if length as usize > Self::max_length() {
            return Err(Error::protocol("Ethernet message length exceeds maximum"));
        }
        let data = reader.read_bytes(length as usize)?.to_vec();
        Ok(Self { timestamp, controller_id, flags, length: length as u16, data })
    }
}

impl BusMessage for LinMessage {
    fn controller_id(&self) -> u32 {
        self.controller_id
    }

    fn byte_length(&self) -> usize {
        self.length as usize
    }

    fn max_length() -> usize {
        cosim_protocol::types::LIN_MESSAGE_MAX_LENGTH
    }

    fn write_body(&self, writer: &mut FrameWriter) -> Result<()> {
        writer.write_i64(self.timestamp)?;
        writer.write_u32(self.controller_id)?;
        writer.write_u32(self.id)?;
        writer.write_u32(self.flags)?;
        writer.write_u16(u16::from(self.length))?;
        writer.write_bytes(&self.data[..self.length as usize])
    }

    fn read_body(reader: &mut FrameReader) -> Result<Self> {
        let timestamp = reader.read_i64()?;
        let controller_id = reader.read_u32()?;
        let id = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let length = reader.read_u16()? as u8;
        if length as usize > Self::max_length() {
            return Err(Error::protocol("LIN message length exceeds maximum"));
        }
        let body = reader.read_bytes(length as usize)?;
        let mut data = [0u8; 8];
        data[..length as usize].copy_from_slice(body);
        Ok(Self { timestamp, controller_id, id, flags, length, data })
    }
}

impl BusMessage for FrMessage {
    fn controller_id(&self) -> u32 {
        self.controller_id
    }

    fn byte_length(&self) -> usize {
        self.length as usize
    }

    fn max_length() -> usize {
        cosim_protocol::types::FR_MESSAGE_MAX_LENGTH
    }

    fn write_body(&self, writer: &mut FrameWriter) -> Result<()> {
        writer.write_i64(self.timestamp)?;
        writer.write_u32(self.controller_id)?;
        writer.write_u32(self.id)?;
        writer.write_u32(self.flags)?;
        writer.write_u16(u16::from(self.length))?;
        writer.write_bytes(&self.data[..self.length as usize])
    }

    fn read_body(reader: &mut FrameReader) -> Result<Self> {
        let timestamp = reader.read_i64()?;
        let controller_id = reader.read_u32()?;
        let id = reader.read_u32()?;
        let flags = reader.read_u32()?;
        let length = reader.read_u16()? as u8;
        if length as usize > Self::max_length() {
            return Err(Error::protocol("FlexRay message length exceeds maximum"));
        }
        let body = reader.read_bytes(length as usize)?;
        let mut data = [0u8; 254];
        data[..length as usize].copy_from_slice(body);
        Ok(Self { timestamp, controller_id, id, flags, length, data })
    }
}

struct ControllerAccounting {
    queue_size: u32,
    transmit_count: u32,
    receive_count: u32,
    transmit_warned: bool,
    receive_warned: bool,
}

/// A descriptor common to all four controller kinds, used only to build
/// the per-controller accounting table.
pub trait ControllerLike {
    fn id(&self) -> u32;
    fn queue_size(&self) -> u32;
}

impl ControllerLike for CanController {
    fn id(&self) -> u32 {
        self.id
    }
    fn queue_size(&self) -> u32 {
        self.queue_size
    }
}
impl ControllerLike for EthController {
    fn id(&self) -> u32 {
        self.id
    }
    fn queue_size(&self) -> u32 {
        self.queue_size
    }
}
impl ControllerLike for LinController {
    fn id(&self) -> u32 {
        self.id
    }
    fn queue_size(&self) -> u32 {
        self.queue_size
    }
}
impl ControllerLike for FrController {
    fn id(&self) -> u32 {
        self.id
    }
    fn queue_size(&self) -> u32 {
        self.queue_size
    }
}

/// Remote-mode bus buffer: one transmit ring and one receive ring per bus
/// kind, drained to/from the wire every step.
pub struct RemoteBusBuffer<M> {
    label: &'static str,
    controllers: HashMap<u32, ControllerAccounting>,
    transmit: VecDeque<M>,
    receive: VecDeque<M>,
}

impl<M: BusMessage> RemoteBusBuffer<M> {
    pub fn new(label: &'static str, controllers: &[impl ControllerLike]) -> Self {
        let controllers = controllers
            .iter()
            .map(|c| {
                (
                    c.id(),
                    ControllerAccounting {
                        queue_size: c.queue_size(),
                        transmit_count: 0,
                        receive_count: 0,
                        transmit_warned: false,
                        receive_warned: false,
                    },
                )
            })
            .collect();
        Self { label, controllers, transmit: VecDeque::new(), receive: VecDeque::new() }
    }

    /// Stage `message` for transmission. Returns `Full` once the
    /// controller's `queue_size` in-flight messages are already queued.
    pub fn transmit(&mut self, message: M) -> Result<()> {
        if message.byte_length() > M::max_length() {
            return Err(Error::invalid_argument("message length exceeds controller maximum"));
        }
        message.check_flags()?;

        let controller_id = message.controller_id();
        let accounting = self
            .controllers
            .get_mut(&controller_id)
            .ok_or_else(|| Error::invalid_argument(format!("unknown controller id {controller_id}")))?;

        if accounting.transmit_count >= accounting.queue_size {
            if !accounting.transmit_warned {
                accounting.transmit_warned = true;
                log(Severity::Warning, &format!("{} transmit buffer full. Messages are dropped.", self.label));
            }
            return Err(Error::Full);
        }
        accounting.transmit_count += 1;
        self.transmit.push_back(message);
        Ok(())
    }

    /// Pop the oldest received message not yet handed to the caller.
    pub fn receive(&mut self) -> Option<M> {
        let message = self.receive.pop_front()?;
        if let Some(acc) = self.controllers.get_mut(&message.controller_id()) {
            acc.receive_count = acc.receive_count.saturating_sub(1);
        }
        Some(message)
    }

    pub fn serialize(&mut self, writer: &mut FrameWriter) -> Result<()> {
        writer.write_u32(self.transmit.len() as u32)?;
        while let Some(message) = self.transmit.pop_front() {
            message.write_body(writer)?;
        }
        for acc in self.controllers.values_mut() {
            acc.transmit_count = 0;
            acc.transmit_warned = false;
        }
        Ok(())
    }

    pub fn deserialize(&mut self, reader: &mut FrameReader) -> Result<()> {
        let total_count = reader.read_u32()?;
        for _ in 0..total_count {
            let message = M::read_body(reader)?;
            let controller_id = message.controller_id();
            let Some(accounting) = self.controllers.get_mut(&controller_id) else {
                continue;
            };
            if accounting.receive_count >= accounting.queue_size {
                if !accounting.receive_warned {
                    accounting.receive_warned = true;
                    log(Severity::Warning, &format!("{} receive buffer full. Messages are dropped.", self.label));
                }
                continue;
            }
            accounting.receive_count += 1;
            self.receive.push_back(message);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn can_controller(id: u32, queue_size: u32) -> CanController {
        CanController {
            id,
            queue_size,
            bits_per_second: 500_000,
            flexible_data_rate_bits_per_second: 0,
            name: format!("can{id}"),
            channel_name: "CAN1".to_string(),
            cluster_name: "cluster".to_string(),
        }
    }

    fn can_message(controller_id: u32, byte: u8) -> CanMessage {
        let mut data = [0u8; 64];
        data[0] = byte;
        CanMessage { timestamp: 0, controller_id, id: 0x100, flags: 0, length: 1, data }
    }

    #[test]
    fn transmit_returns_full_after_queue_size_messages() {
        let controllers = [can_controller(1, 2)];
        let mut buf = RemoteBusBuffer::<CanMessage>::new("CAN", &controllers);
        buf.transmit(can_message(1, 1)).unwrap();
        buf.transmit(can_message(1, 2)).unwrap();
        let err = buf.transmit(can_message(1, 3));
        assert!(matches!(err, Err(Error::Full)));
    }

    #[test]
    fn invalid_can_flags_are_rejected() {
        let controllers = [can_controller(1, 4)];
        let mut buf = RemoteBusBuffer::<CanMessage>::new("CAN", &controllers);
        let mut msg = can_message(1, 1);
        msg.flags = 1 << 31;
        assert!(buf.transmit(msg).is_err());
    }

    #[test]
    fn serialize_then_deserialize_round_trips() {
        let controllers = [can_controller(1, 4)];
        let mut tx = RemoteBusBuffer::<CanMessage>::new("CAN", &controllers);
        tx.transmit(can_message(1, 42)).unwrap();

        let mut writer = FrameWriter::new();
        tx.serialize(&mut writer).unwrap();
        let frame = writer.finish().to_vec();

        let mut reader = FrameReader::new();
        let mut queue = frame.clone();
        reader
            .begin_read(|dst| {
                let n = dst.len().min(queue.len());
                dst[..n].copy_from_slice(&queue[..n]);
                queue.drain(..n);
                Ok(n)
            })
            .unwrap();

        let mut rx = RemoteBusBuffer::<CanMessage>::new("CAN", &controllers);
        rx.deserialize(&mut reader).unwrap();
        reader.end_read().unwrap();
        let received = rx.receive().unwrap();
        assert_eq!(received.data[0], 42);
    }
}
