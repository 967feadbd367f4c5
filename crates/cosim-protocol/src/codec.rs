//! Frame encode/decode for every wire kind except `Step`/`StepOk`, whose
//! I/O and bus payloads are produced and consumed by the buffer components
//! directly against the same `FrameWriter`/`FrameReader` — the codec here
//! only stamps the frame kind and carries the simulation time.

use crate::frame_kind::FrameKind;
use crate::types::{
    CanController, DataType, EthController, FrController, IoSignal, LinController,
    LinControllerType, SizeKind,
};
use cosim_core::channel::frame::{FrameReader, FrameWriter};
use cosim_core::error::{Error, Result};

pub fn write_string(writer: &mut FrameWriter, s: &str) -> Result<()> {
    if s.len() > u32::MAX as usize {
        return Err(Error::protocol("string too large to encode"));
    }
    writer.write_u32(s.len() as u32)?;
    writer.write_bytes(s.as_bytes())
}

pub fn read_string(reader: &mut FrameReader) -> Result<String> {
    let len = reader.read_u32()? as usize;
    if len > 65536 {
        return Err(Error::protocol("string length exceeds frame limit"));
    }
    let bytes = reader.read_bytes(len)?;
    String::from_utf8(bytes.to_vec()).map_err(|e| Error::protocol(format!("invalid utf8: {e}")))
}

pub fn write_frame_kind(writer: &mut FrameWriter, kind: FrameKind) -> Result<()> {
    writer.write_u32(kind as u32)
}

pub fn read_frame_kind(reader: &mut FrameReader) -> Result<FrameKind> {
    let raw = reader.read_u32()?;
    FrameKind::from_u32(raw).ok_or_else(|| Error::protocol(format!("unknown frame kind {raw}")))
}

fn write_io_signal(writer: &mut FrameWriter, signal: &IoSignal) -> Result<()> {
    writer.write_u32(signal.id)?;
    writer.write_u32(signal.max_length)?;
    writer.write_u32(signal.data_type as u32)?;
    writer.write_u32(signal.size_kind as u32)?;
    write_string(writer, &signal.name)
}

fn read_io_signal(reader: &mut FrameReader) -> Result<IoSignal> {
    let id = reader.read_u32()?;
    let max_length = reader.read_u32()?;
    let data_type = DataType::from_u32(reader.read_u32()?)
        .ok_or_else(|| Error::protocol("unknown data type"))?;
    let size_kind =
        SizeKind::from_u32(reader.read_u32()?).ok_or_else(|| Error::protocol("unknown size kind"))?;
    let name = read_string(reader)?;
    Ok(IoSignal { id, max_length, data_type, size_kind, name })
}

fn write_io_signals(writer: &mut FrameWriter, signals: &[IoSignal]) -> Result<()> {
    writer.write_u32(signals.len() as u32)?;
    for signal in signals {
        write_io_signal(writer, signal)?;
    }
    Ok(())
}

fn read_io_signals(reader: &mut FrameReader) -> Result<Vec<IoSignal>> {
    let count = reader.read_u32()? as usize;
    (0..count).map(|_| read_io_signal(reader)).collect()
}

fn write_can_controller(writer: &mut FrameWriter, c: &CanController) -> Result<()> {
    writer.write_u32(c.id)?;
    writer.write_u32(c.queue_size)?;
    writer.write_u64(c.bits_per_second)?;
    writer.write_u64(c.flexible_data_rate_bits_per_second)?;
    write_string(writer, &c.name)?;
    write_string(writer, &c.channel_name)?;
    write_string(writer, &c.cluster_name)
}

fn read_can_controller(reader: &mut FrameReader) -> Result<CanController> {
    Ok(CanController {
        id: reader.read_u32()?,
        queue_size: reader.read_u32()?,
        bits_per_second: reader.read_u64()?,
        flexible_data_rate_bits_per_second: reader.read_u64()?,
        name: read_string(reader)?,
        channel_name: read_string(reader)?,
        cluster_name: read_string(reader)?,
    })
}

fn write_can_controllers(writer: &mut FrameWriter, controllers: &[CanController]) -> Result<()> {
    writer.write_u32(controllers.len() as u32)?;
    for c in controllers {
        write_can_controller(writer, c)?;
    }
    Ok(())
}

fn read_can_controllers(reader: &mut FrameReader) -> Result<Vec<CanController>> {
    let count = reader.read_u32()? as usize;
    (0..count).map(|_| read_can_controller(reader)).collect()
}

fn write_eth_controller(writer: &mut FrameWriter, c: &EthController) -> Result<()> {
    writer.write_u32(c.id)?;
    writer.write_u32(c.queue_size)?;
    writer.write_u64(c.bits_per_second)?;
    writer.write_bytes(&c.mac_address)?;
    write_string(writer, &c.name)?;
    write_string(writer, &c.channel_name)?;
    write_string(writer, &c.cluster_name)
}

fn read_eth_controller(reader: &mut FrameReader) -> Result<EthController> {
    let id = reader.read_u32()?;
    let queue_size = reader.read_u32()?;
    let bits_per_second = reader.read_u64()?;
    let mac_slice = reader.read_bytes(6)?;
    let mut mac_address = [0u8; 6];
    mac_address.copy_from_slice(mac_slice);
    Ok(EthController {
        id,
        queue_size,
        bits_per_second,
        mac_address,
        name: read_string(reader)?,
        channel_name: read_string(reader)?,
        cluster_name: read_string(reader)?,
    })
}

fn write_eth_controllers(writer: &mut FrameWriter, controllers: &[EthController]) -> Result<()> {
    writer.write_u32(controllers.len() as u32)?;
    for c in controllers {
        write_eth_controller(writer, c)?;
    }
    Ok(())
}

fn read_eth_controllers(reader: &mut FrameReader) -> Result<Vec<EthController>> {
    let count = reader.read_u32()? as usize;
    (0..count).map(|_| read_eth_controller(reader)).collect()
}

fn write_lin_controller(writer: &mut FrameWriter, c: &LinController) -> Result<()> {
    writer.write_u32(c.id)?;
    writer.write_u32(c.queue_size)?;
    writer.write_u64(c.bits_per_second)?;
    writer.write_u32(c.controller_type as u32)?;
    write_string(writer, &c.name)?;
    write_string(writer, &c.channel_name)?;
    write_string(writer, &c.cluster_name)
}

fn read_lin_controller(reader: &mut FrameReader) -> Result<LinController> {
    let id = reader.read_u32()?;
    let queue_size = reader.read_u32()?;
    let bits_per_second = reader.read_u64()?;
    let controller_type = match reader.read_u32()? {
        1 => LinControllerType::Responder,
        2 => LinControllerType::Commander,
        other => return Err(Error::protocol(format!("unknown LIN controller type {other}"))),
    };
    Ok(LinController {
        id,
        queue_size,
        bits_per_second,
        controller_type,
        name: read_string(reader)?,
        channel_name: read_string(reader)?,
        cluster_name: read_string(reader)?,
    })
}

fn write_lin_controllers(writer: &mut FrameWriter, controllers: &[LinController]) -> Result<()> {
    writer.write_u32(controllers.len() as u32)?;
    for c in controllers {
        write_lin_controller(writer, c)?;
    }
    Ok(())
}

fn read_lin_controllers(reader: &mut FrameReader) -> Result<Vec<LinController>> {
    let count = reader.read_u32()? as usize;
    (0..count).map(|_| read_lin_controller(reader)).collect()
}

fn write_fr_controller(writer: &mut FrameWriter, c: &FrController) -> Result<()> {
    writer.write_u32(c.id)?;
    writer.write_u32(c.queue_size)?;
    write_string(writer, &c.name)?;
    write_string(writer, &c.channel_name)?;
    write_string(writer, &c.cluster_name)
}

fn read_fr_controller(reader: &mut FrameReader) -> Result<FrController> {
    Ok(FrController {
        id: reader.read_u32()?,
        queue_size: reader.read_u32()?,
        name: read_string(reader)?,
        channel_name: read_string(reader)?,
        cluster_name: read_string(reader)?,
    })
}

fn write_fr_controllers(writer: &mut FrameWriter, controllers: &[FrController]) -> Result<()> {
    writer.write_u32(controllers.len() as u32)?;
    for c in controllers {
        write_fr_controller(writer, c)?;
    }
    Ok(())
}

fn read_fr_controllers(reader: &mut FrameReader) -> Result<Vec<FrController>> {
    let count = reader.read_u32()? as usize;
    (0..count).map(|_| read_fr_controller(reader)).collect()
}

#[derive(Debug, Clone)]
pub struct ConnectRequest {
    pub protocol_version: u32,
    pub client_mode: u32,
    pub server_name: String,
    pub client_name: String,
}

pub fn encode_connect(writer: &mut FrameWriter, req: &ConnectRequest) -> Result<()> {
    write_frame_kind(writer, FrameKind::Connect)?;
    writer.write_u32(req.protocol_version)?;
    writer.write_u32(req.client_mode)?;
    write_string(writer, &req.server_name)?;
    write_string(writer, &req.client_name)
}

pub fn decode_connect(reader: &mut FrameReader) -> Result<ConnectRequest> {
    Ok(ConnectRequest {
        protocol_version: reader.read_u32()?,
        client_mode: reader.read_u32()?,
        server_name: read_string(reader)?,
        client_name: read_string(reader)?,
    })
}

#[derive(Debug, Clone, Default)]
pub struct ConnectOk {
    pub negotiated_version: u32,
    pub client_mode: u32,
    pub step_size: i64,
    pub simulation_state: u32,
    pub incoming_signals: Vec<IoSignal>,
    pub outgoing_signals: Vec<IoSignal>,
    pub can_controllers: Vec<CanController>,
    pub eth_controllers: Vec<EthController>,
    pub lin_controllers: Vec<LinController>,
    pub fr_controllers: Vec<FrController>,
}

pub fn encode_connect_ok(writer: &mut FrameWriter, ok: &ConnectOk) -> Result<()> {
    write_frame_kind(writer, FrameKind::ConnectOk)?;
    writer.write_u32(ok.negotiated_version)?;
    writer.write_u32(ok.client_mode)?;
    writer.write_i64(ok.step_size)?;
    writer.write_u32(ok.simulation_state)?;
    write_io_signals(writer, &ok.incoming_signals)?;
    write_io_signals(writer, &ok.outgoing_signals)?;
    write_can_controllers(writer, &ok.can_controllers)?;
    write_eth_controllers(writer, &ok.eth_controllers)?;
    write_lin_controllers(writer, &ok.lin_controllers)?;
    if crate::version::supports_flexray(ok.negotiated_version) {
        write_fr_controllers(writer, &ok.fr_controllers)?;
    }
    Ok(())
}

pub fn decode_connect_ok(reader: &mut FrameReader) -> Result<ConnectOk> {
    let negotiated_version = reader.read_u32()?;
    let client_mode = reader.read_u32()?;
    let step_size = reader.read_i64()?;
    let simulation_state = reader.read_u32()?;
    let incoming_signals = read_io_signals(reader)?;
    let outgoing_signals = read_io_signals(reader)?;
    let can_controllers = read_can_controllers(reader)?;
    let eth_controllers = read_eth_controllers(reader)?;
    let lin_controllers = read_lin_controllers(reader)?;
    let fr_controllers = if crate::version::supports_flexray(negotiated_version) {
        read_fr_controllers(reader)?
    } else {
        Vec::new()
    };
    Ok(ConnectOk {
        negotiated_version,
        client_mode,
        step_size,
        simulation_state,
        incoming_signals,
        outgoing_signals,
        can_controllers,
        eth_controllers,
        lin_controllers,
        fr_controllers,
    })
}

pub fn encode_error(writer: &mut FrameWriter, message: &str) -> Result<()> {
    write_frame_kind(writer, FrameKind::Error)?;
    write_string(writer, message)
}

pub fn decode_error(reader: &mut FrameReader) -> Result<String> {
    read_string(reader)
}

pub fn encode_ok(writer: &mut FrameWriter) -> Result<()> {
    write_frame_kind(writer, FrameKind::Ok)
}

pub fn encode_lifecycle(writer: &mut FrameWriter, kind: FrameKind) -> Result<()> {
    debug_assert!(matches!(
        kind,
        FrameKind::Start | FrameKind::Stop | FrameKind::Pause | FrameKind::Continue
    ));
    write_frame_kind(writer, kind)
}

pub fn encode_terminate(writer: &mut FrameWriter, simulation_time: i64, reason: u32) -> Result<()> {
    write_frame_kind(writer, FrameKind::Terminate)?;
    writer.write_i64(simulation_time)?;
    writer.write_u32(reason)
}

pub fn decode_terminate(reader: &mut FrameReader) -> Result<(i64, u32)> {
    Ok((reader.read_i64()?, reader.read_u32()?))
}

pub fn encode_ping(writer: &mut FrameWriter, negotiated_version: u32) -> Result<()> {
    write_frame_kind(writer, FrameKind::Ping)?;
    if crate::version::supports_ping_round_trip(negotiated_version) {
        writer.write_i64(0)?;
    }
    Ok(())
}

pub fn decode_ping(reader: &mut FrameReader, negotiated_version: u32) -> Result<Option<i64>> {
    if crate::version::supports_ping_round_trip(negotiated_version) {
        Ok(Some(reader.read_i64()?))
    } else {
        Ok(None)
    }
}

pub fn encode_ping_ok(writer: &mut FrameWriter, negotiated_version: u32, command: u32, round_trip_ns: i64) -> Result<()> {
    write_frame_kind(writer, FrameKind::PingOk)?;
    writer.write_u32(command)?;
    if crate::version::supports_ping_round_trip(negotiated_version) {
        writer.write_i64(round_trip_ns)?;
    }
    Ok(())
}

pub fn decode_ping_ok(reader: &mut FrameReader, negotiated_version: u32) -> Result<(u32, Option<i64>)> {
    let command = reader.read_u32()?;
    let round_trip_ns = if crate::version::supports_ping_round_trip(negotiated_version) {
        Some(reader.read_i64()?)
    } else {
        None
    };
    Ok((command, round_trip_ns))
}

pub fn encode_step_header(writer: &mut FrameWriter, simulation_time: i64) -> Result<()> {
    write_frame_kind(writer, FrameKind::Step)?;
    writer.write_i64(simulation_time)
}

pub fn decode_step_header(reader: &mut FrameReader) -> Result<i64> {
    reader.read_i64()
}

pub fn encode_get_port(writer: &mut FrameWriter, server_name: &str) -> Result<()> {
    write_frame_kind(writer, FrameKind::GetPort)?;
    write_string(writer, server_name)
}

pub fn decode_get_port(reader: &mut FrameReader) -> Result<String> {
    read_string(reader)
}

pub fn encode_get_port_ok(writer: &mut FrameWriter, port: u16) -> Result<()> {
    write_frame_kind(writer, FrameKind::GetPortOk)?;
    writer.write_u16(port)
}

pub fn decode_get_port_ok(reader: &mut FrameReader) -> Result<u16> {
    reader.read_u16()
}

pub fn encode_set_port(writer: &mut FrameWriter, server_name: &str, port: u16) -> Result<()> {
    write_frame_kind(writer, FrameKind::SetPort)?;
    write_string(writer, server_name)?;
    writer.write_u16(port)
}

pub fn decode_set_port(reader: &mut FrameReader) -> Result<(String, u16)> {
    let server_name = read_string(reader)?;
    let port = reader.read_u16()?;
    Ok((server_name, port))
}

pub fn encode_unset_port(writer: &mut FrameWriter, server_name: &str) -> Result<()> {
    write_frame_kind(writer, FrameKind::UnsetPort)?;
    write_string(writer, server_name)
}

pub fn decode_unset_port(reader: &mut FrameReader) -> Result<String> {
    read_string(reader)
}

pub fn encode_step_ok_header(writer: &mut FrameWriter, next_simulation_time: i64, command: u32) -> Result<()> {
    write_frame_kind(writer, FrameKind::StepOk)?;
    writer.write_i64(next_simulation_time)?;
    writer.write_u32(command)
}

pub fn decode_step_ok_header(reader: &mut FrameReader) -> Result<(i64, u32)> {
    Ok((reader.read_i64()?, reader.read_u32()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_round_trips() {
        let mut writer = FrameWriter::new();
        let req = ConnectRequest {
            protocol_version: 2,
            client_mode: 0,
            server_name: "S".to_string(),
            client_name: "C".to_string(),
        };
        encode_connect(&mut writer, &req).unwrap();
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
        assert_eq!(read_frame_kind(&mut reader).unwrap(), FrameKind::Connect);
        let decoded = decode_connect(&mut reader).unwrap();
        reader.end_read().unwrap();
        assert_eq!(decoded.protocol_version, 2);
        assert_eq!(decoded.server_name, "S");
        assert_eq!(decoded.client_name, "C");
    }

    #[test]
    fn connect_ok_v1_omits_flexray() {
        let mut writer = FrameWriter::new();
        let ok = ConnectOk {
            negotiated_version: 1,
            step_size: 1_000_000,
            ..Default::default()
        };
        encode_connect_ok(&mut writer, &ok).unwrap();
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
        read_frame_kind(&mut reader).unwrap();
        let decoded = decode_connect_ok(&mut reader).unwrap();
        reader.end_read().unwrap();
        assert!(decoded.fr_controllers.is_empty());
    }
}
