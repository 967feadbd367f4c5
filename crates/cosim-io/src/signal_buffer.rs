//! I/O signal buffer: stages a set of signals per direction and coalesces
//! changed ones into (or out of) a single step's frame payload, grounded
//! on `IoBuffer.hpp`'s `RemoteIoBuffer`/`LocalIoBuffer` pair.

use cosim_core::channel::frame::{FrameReader, FrameWriter};
use cosim_core::error::{Error, Result};
use cosim_core::os::shared_memory::SharedMemoryRegion;
use cosim_protocol::types::{IoSignal, SizeKind};
use std::collections::HashMap;

struct SignalSlot {
    descriptor: IoSignal,
    current_length: u32,
    data: Vec<u8>,
    changed: bool,
}

impl SignalSlot {
    fn new(descriptor: IoSignal) -> Self {
        let capacity = descriptor.max_length as usize * descriptor.data_type.size();
        Self {
            current_length: descriptor.max_length,
            data: vec![0u8; capacity],
            descriptor,
            changed: false,
        }
    }

    fn byte_len(&self, length: u32) -> usize {
        length as usize * self.descriptor.data_type.size()
    }
}

fn validate_descriptors(signals: &[IoSignal]) -> Result<()> {
    let mut seen = std::collections::HashSet::new();
    for signal in signals {
        if signal.max_length == 0 {
            return Err(Error::invalid_argument(format!(
                "signal {} has zero max_length",
                signal.id
            )));
        }
        if !seen.insert(signal.id) {
            return Err(Error::invalid_argument(format!("duplicate signal id {}", signal.id)));
        }
    }
    Ok(())
}

/// Common surface both the remote and local implementations expose to
/// application code. `serialize`/`deserialize` are driven by the session
/// coordinator once per step.
pub trait IoBuffer {
    fn write(&mut self, signal_id: u32, length: u32, data: &[u8]) -> Result<()>;
    fn read(&self, signal_id: u32) -> Result<(u32, &[u8])>;
    fn serialize(&mut self, writer: &mut FrameWriter) -> Result<()>;
    fn deserialize(&mut self, reader: &mut FrameReader) -> Result<()>;
}

/// Remote-mode implementation: changed signals are serialized onto the
/// wire every step.
pub struct RemoteIoBuffer {
    slots: HashMap<u32, SignalSlot>,
    changed_order: Vec<u32>,
}

impl RemoteIoBuffer {
    pub fn new(signals: Vec<IoSignal>) -> Result<Self> {
        validate_descriptors(&signals)?;
        let slots = signals.into_iter().map(|s| (s.id, SignalSlot::new(s))).collect();
        Ok(Self { slots, changed_order: Vec::new() })
    }
}

impl IoBuffer for RemoteIoBuffer {
    fn write(&mut self, signal_id: u32, length: u32, data: &[u8]) -> Result<()> {
        let slot = self
            .slots
            .get_mut(&signal_id)
            .ok_or_else(|| Error::invalid_argument(format!("unknown signal id {signal_id}")))?;

        match slot.descriptor.size_kind {
            SizeKind::Fixed if length != slot.descriptor.max_length => {
                return Err(Error::invalid_argument(format!(
                    "signal {signal_id} requires fixed length {}, got {length}",
                    slot.descriptor.max_length
                )));
            }
            SizeKind::Variable if length > slot.descriptor.max_length => {
                return Err(Error::invalid_argument(format!(
                    "signal {signal_id} length {length} exceeds max {}",
                    slot.descriptor.max_length
                )));
            }
            _ => {}
        }

        let byte_len = slot.byte_len(length);
        let length_changed = slot.descriptor.size_kind == SizeKind::Variable && slot.current_length != length;
        let bytes_changed = slot.data[..byte_len] != data[..byte_len];
        let changed = length_changed || bytes_changed;

        slot.current_length = length;
        slot.data[..byte_len].copy_from_slice(&data[..byte_len]);

        if changed && !slot.changed {
            slot.changed = true;
            self.changed_order.push(signal_id);
        }
        Ok(())
    }

    fn read(&self, signal_id: u32) -> Result<(u32, &[u8])> {
        let slot = self
            .slots
            .get(&signal_id)
            .ok_or_else(|| Error::invalid_argument(format!("unknown signal id {signal_id}")))?;
        let byte_len = slot.byte_len(slot.current_length);
        Ok((slot.current_length, &slot.data[..byte_len]))
    }

    fn serialize(&mut self, writer: &mut FrameWriter) -> Result<()> {
        writer.write_u32(self.changed_order.len() as u32)?;
        for &id in &self.changed_order {
            let slot = self.slots.get_mut(&id).expect("changed id always present");
            writer.write_u32(id)?;
            if slot.descriptor.size_kind == SizeKind::Variable {
                writer.write_u32(slot.current_length)?;
            }
            let byte_len = slot.byte_len(slot.current_length);
            writer.write_bytes(&slot.data[..byte_len])?;
            slot.changed = false;
        }
        self.changed_order.clear();
        Ok(())
    }

    fn deserialize(&mut self, reader: &mut FrameReader) -> Result<()> {
        let count = reader.read_u32()?;
        for _ in 0..count {
            let id = reader.read_u32()?;
            let slot = self
                .slots
                .get_mut(&id)
                .ok_or_else(|| Error::protocol(format!("unknown signal id {id} in step payload")))?;
            let length = if slot.descriptor.size_kind == SizeKind::Variable {
                let len = reader.read_u32()?;
                if len > slot.descriptor.max_length {
                    return Err(Error::protocol(format!(
                        "signal {id} length {len} exceeds max {}",
                        slot.descriptor.max_length
                    )));
                }
                len
            } else {
                slot.descriptor.max_length
            };
            let byte_len = slot.byte_len(length);
            let bytes = reader.read_bytes(byte_len)?;
            slot.data[..byte_len].copy_from_slice(bytes);
            slot.current_length = length;
        }
        Ok(())
    }
}

/// Local-mode implementation: a double-buffered slot pair per signal,
/// resident in shared memory so the peer never observes a torn write. Only
/// the list of changed signal ids crosses the channel.
pub struct LocalIoBuffer {
    region: SharedMemoryRegion,
    slots: HashMap<u32, LocalSlotMeta>,
    changed_order: Vec<u32>,
}

struct LocalSlotMeta {
    descriptor: IoSignal,
    offset: usize,
    active: u8,
    changed: bool,
}

impl LocalIoBuffer {
    /// `region` must already be sized via [`Self::region_size`] for `signals`.
    pub fn region_size(signals: &[IoSignal]) -> usize {
        signals
            .iter()
            .map(|s| 2 * (4 + s.max_length as usize * s.data_type.size()))
            .sum()
    }

    pub fn new(name: &str, signals: Vec<IoSignal>) -> Result<Self> {
        validate_descriptors(&signals)?;
        let size = Self::region_size(&signals).max(1);
        let region = SharedMemoryRegion::create_or_open(name, size)?;
        let mut offset = 0usize;
        let mut slots = HashMap::new();
        for descriptor in signals {
            let slot_bytes = 4 + descriptor.max_length as usize * descriptor.data_type.size();
            slots.insert(
                descriptor.id,
                LocalSlotMeta { descriptor, offset, active: 0, changed: false },
            );
            offset += 2 * slot_bytes;
        }
        Ok(Self { region, slots, changed_order: Vec::new() })
    }

    fn slot_span(meta: &LocalSlotMeta, which: u8) -> (usize, usize) {
        let slot_bytes = 4 + meta.descriptor.max_length as usize * meta.descriptor.data_type.size();
        let base = meta.offset + (which as usize) * slot_bytes;
        (base, slot_bytes)
    }
}

impl IoBuffer for LocalIoBuffer {
    fn write(&mut self, signal_id: u32, length: u32, data: &[u8]) -> Result<()> {
        let meta = self
            .slots
            .get_mut(&signal_id)
            .ok_or_else(|| Error::invalid_argument(format!("unknown signal id {signal_id}")))?;

        match meta.descriptor.size_kind {
            SizeKind::Fixed if length != meta.descriptor.max_length => {
                return Err(Error::invalid_argument("fixed-size signal length mismatch"));
            }
            SizeKind::Variable if length > meta.descriptor.max_length => {
                return Err(Error::invalid_argument("variable-size signal length too large"));
            }
            _ => {}
        }

        if !meta.changed {
            meta.active ^= 1;
            meta.changed = true;
            self.changed_order.push(signal_id);
        }

        let (base, slot_bytes) = Self::slot_span(meta, meta.active);
        let byte_len = length as usize * meta.descriptor.data_type.size();
        let region = self.region.as_mut_slice();
        region[base..base + 4].copy_from_slice(&length.to_le_bytes());
        region[base + 4..base + 4 + byte_len].copy_from_slice(&data[..byte_len]);
        let _ = slot_bytes;
        Ok(())
    }

    fn read(&self, signal_id: u32) -> Result<(u32, &[u8])> {
        let meta = self
            .slots
            .get(&signal_id)
            .ok_or_else(|| Error::invalid_argument(format!("unknown signal id {signal_id}")))?;
        let (base, _) = Self::slot_span(meta, meta.active);
        let region = self.region.as_slice();
        let length = u32::from_le_bytes(region[base..base + 4].try_into().unwrap());
        let byte_len = length as usize * meta.descriptor.data_type.size();
        Ok((length, &region[base + 4..base + 4 + byte_len]))
    }

    fn serialize(&mut self, writer: &mut FrameWriter) -> Result<()> {
        writer.write_u32(self.changed_order.len() as u32)?;
        for &id in &self.changed_order {
            writer.write_u32(id)?;
            let meta = self.slots.get_mut(&id).expect("changed id always present");
            meta.changed = false;
        }
        self.changed_order.clear();
        Ok(())
    }

    fn deserialize(&mut self, reader: &mut FrameReader) -> Result<()> {
        let count = reader.read_u32()?;
        for _ in 0..count {
            let id = reader.read_u32()?;
            let meta = self
                .slots
                .get_mut(&id)
                .ok_or_else(|| Error::protocol(format!("unknown signal id {id} in step payload")))?;
            meta.active ^= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosim_protocol::types::{DataType, SizeKind};

    fn signal(id: u32, max_length: u32) -> IoSignal {
        IoSignal { id, max_length, data_type: DataType::UInt8, size_kind: SizeKind::Fixed, name: format!("s{id}") }
    }

    #[test]
    fn remote_write_marks_changed_once_per_step() {
        let mut buf = RemoteIoBuffer::new(vec![signal(1, 4)]).unwrap();
        buf.write(1, 4, &[1, 2, 3, 4]).unwrap();
        buf.write(1, 4, &[9, 9, 9, 9]).unwrap();
        assert_eq!(buf.changed_order, vec![1]);
    }

    #[test]
    fn remote_serialize_round_trips_through_frame() {
        let mut buf = RemoteIoBuffer::new(vec![signal(1, 2), signal(2, 2)]).unwrap();
        buf.write(1, 2, &[5, 6]).unwrap();

        let mut writer = FrameWriter::new();
        buf.serialize(&mut writer).unwrap();
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

        let mut peer = RemoteIoBuffer::new(vec![signal(1, 2), signal(2, 2)]).unwrap();
        peer.deserialize(&mut reader).unwrap();
        reader.end_read().unwrap();
        assert_eq!(peer.read(1).unwrap(), (2, [5u8, 6].as_slice()));
    }

    #[test]
    fn rejects_wrong_fixed_length() {
        let mut buf = RemoteIoBuffer::new(vec![signal(1, 4)]).unwrap();
        assert!(buf.write(1, 2, &[0, 0]).is_err());
    }

    #[test]
    fn rejects_duplicate_descriptor_ids() {
        assert!(RemoteIoBuffer::new(vec![signal(1, 2), signal(1, 2)]).is_err());
    }

    #[test]
    fn rejects_zero_length_descriptor() {
        assert!(RemoteIoBuffer::new(vec![signal(1, 0)]).is_err());
    }
}
