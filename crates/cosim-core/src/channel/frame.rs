//! Framing primitives shared by every channel backend, grounded on
//! `Channel.hpp`'s `BlockWriter`/`BlockReader`/`ChannelWriter`/`ChannelReader`.
//!
//! A frame is a 4-byte little-endian length prefix (header included)
//! followed by a kind-specific body. Writers stage a frame in a fixed
//! `FRAME_BUFFER_SIZE` buffer and flush it through a backend-specific
//! `send`; readers do the inverse through a backend-specific `receive`.

use crate::config::{FRAME_BUFFER_SIZE, HEADER_SIZE};
use crate::error::{Error, Result};

/// Scratch view into a portion of the writer's staging buffer, used for
/// primitive appends within a reserved region.
pub struct BlockWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BlockWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf[self.pos..self.pos + 2].copy_from_slice(&value.to_le_bytes());
        self.pos += 2;
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&value.to_le_bytes());
        self.pos += 4;
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf[self.pos..self.pos + 8].copy_from_slice(&value.to_le_bytes());
        self.pos += 8;
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf[self.pos..self.pos + 8].copy_from_slice(&value.to_le_bytes());
        self.pos += 8;
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf[self.pos..self.pos + bytes.len()].copy_from_slice(bytes);
        self.pos += bytes.len();
    }

    /// Asserts the reserved region was filled exactly, mirroring
    /// `BlockWriter::EndWrite`'s size assertion.
    pub fn end_write(self) {
        assert_eq!(self.pos, self.buf.len(), "block writer left bytes unwritten");
    }
}

pub struct BlockReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> BlockReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn read_u16(&mut self) -> u16 {
        let v = u16::from_le_bytes(self.buf[self.pos..self.pos + 2].try_into().unwrap());
        self.pos += 2;
        v
    }

    pub fn read_u32(&mut self) -> u32 {
        let v = u32::from_le_bytes(self.buf[self.pos..self.pos + 4].try_into().unwrap());
        self.pos += 4;
        v
    }

    pub fn read_u64(&mut self) -> u64 {
        let v = u64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }

    pub fn read_i64(&mut self) -> i64 {
        let v = i64::from_le_bytes(self.buf[self.pos..self.pos + 8].try_into().unwrap());
        self.pos += 8;
        v
    }

    pub fn read_bytes(&mut self, len: usize) -> &'a [u8] {
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        out
    }

    pub fn end_read(self) {
        assert_eq!(self.pos, self.buf.len(), "block reader left bytes unread");
    }
}

/// Backend-agnostic frame writer: stages bytes in a fixed buffer, stamps
/// the length header, and flushes through `send` on `end_write`.
pub struct FrameWriter {
    buffer: Box<[u8; FRAME_BUFFER_SIZE]>,
    write_index: usize,
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self {
            buffer: Box::new([0u8; FRAME_BUFFER_SIZE]),
            write_index: HEADER_SIZE,
        }
    }
}

impl FrameWriter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_capacity(&self, additional: usize) -> Result<()> {
        if self.write_index + additional > FRAME_BUFFER_SIZE {
            return Err(Error::protocol("frame exceeds maximum buffer size"));
        }
        Ok(())
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        self.ensure_capacity(2)?;
        self.buffer[self.write_index..self.write_index + 2].copy_from_slice(&value.to_le_bytes());
        self.write_index += 2;
        Ok(())
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        self.ensure_capacity(4)?;
        self.buffer[self.write_index..self.write_index + 4].copy_from_slice(&value.to_le_bytes());
        self.write_index += 4;
        Ok(())
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        self.ensure_capacity(8)?;
        self.buffer[self.write_index..self.write_index + 8].copy_from_slice(&value.to_le_bytes());
        self.write_index += 8;
        Ok(())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.ensure_capacity(8)?;
        self.buffer[self.write_index..self.write_index + 8].copy_from_slice(&value.to_le_bytes());
        self.write_index += 8;
        Ok(())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.ensure_capacity(bytes.len())?;
        self.buffer[self.write_index..self.write_index + bytes.len()].copy_from_slice(bytes);
        self.write_index += bytes.len();
        Ok(())
    }

    /// Reserve `len` bytes of scratch space for primitive writes via a
    /// `BlockWriter`, mirroring `ChannelWriter::Reserve`.
    pub fn reserve(&mut self, len: usize) -> Result<BlockWriter<'_>> {
        self.ensure_capacity(len)?;
        let start = self.write_index;
        self.write_index += len;
        Ok(BlockWriter::new(&mut self.buffer[start..start + len]))
    }

    /// Stamp the length header over the staged bytes and return the frame
    /// slice to flush. Resets the writer for the next frame.
    pub fn finish(&mut self) -> &[u8] {
        let len = self.write_index as u32;
        self.buffer[0..HEADER_SIZE].copy_from_slice(&len.to_le_bytes());
        self.write_index = HEADER_SIZE;
        &self.buffer[0..len as usize]
    }
}

/// Backend-agnostic frame reader: retains any over-read bytes belonging to
/// the next frame across `begin_read` calls ("frame straddling").
pub struct FrameReader {
    buffer: Box<[u8; FRAME_BUFFER_SIZE]>,
    read_index: usize,
    end_frame_index: usize,
    write_index: usize,
}

impl Default for FrameReader {
    fn default() -> Self {
        Self {
            buffer: Box::new([0u8; FRAME_BUFFER_SIZE]),
            read_index: 0,
            end_frame_index: 0,
            write_index: 0,
        }
    }
}

impl FrameReader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensure at least `n` bytes of the current frame are buffered,
    /// pulling more via `receive` as needed. Implements the straddling
    /// retention: bytes received beyond the current frame's end are kept
    /// for the next `begin_read`.
    pub fn begin_read(
        &mut self,
        mut receive: impl FnMut(&mut [u8]) -> Result<usize>,
    ) -> Result<()> {
        if self.write_index > self.end_frame_index {
            let leftover = self.write_index - self.end_frame_index;
            self.buffer.copy_within(self.end_frame_index..self.write_index, 0);
            self.write_index = leftover;
        } else {
            self.write_index = 0;
        }
        self.read_index = 0;

        while self.write_index < HEADER_SIZE {
            let n = receive(&mut self.buffer[self.write_index..])?;
            self.write_index += n;
        }
        let len = u32::from_le_bytes(self.buffer[0..HEADER_SIZE].try_into().unwrap()) as usize;
        if len > FRAME_BUFFER_SIZE {
            return Err(Error::protocol(format!("frame length {len} exceeds maximum")));
        }
        self.end_frame_index = len;
        while self.write_index < self.end_frame_index {
            let n = receive(&mut self.buffer[self.write_index..])?;
            self.write_index += n;
        }
        self.read_index = HEADER_SIZE;
        Ok(())
    }

    fn remaining(&self) -> usize {
        self.end_frame_index - self.read_index
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        if self.remaining() < 2 {
            return Err(Error::protocol("short frame reading u16"));
        }
        let v = u16::from_le_bytes(self.buffer[self.read_index..self.read_index + 2].try_into().unwrap());
        self.read_index += 2;
        Ok(v)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        if self.remaining() < 4 {
            return Err(Error::protocol("short frame reading u32"));
        }
        let v = u32::from_le_bytes(self.buffer[self.read_index..self.read_index + 4].try_into().unwrap());
        self.read_index += 4;
        Ok(v)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        if self.remaining() < 8 {
            return Err(Error::protocol("short frame reading u64"));
        }
        let v = u64::from_le_bytes(self.buffer[self.read_index..self.read_index + 8].try_into().unwrap());
        self.read_index += 8;
        Ok(v)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        if self.remaining() < 8 {
            return Err(Error::protocol("short frame reading i64"));
        }
        let v = i64::from_le_bytes(self.buffer[self.read_index..self.read_index + 8].try_into().unwrap());
        self.read_index += 8;
        Ok(v)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&[u8]> {
        if self.remaining() < len {
            return Err(Error::protocol("short frame reading bytes"));
        }
        let out = &self.buffer[self.read_index..self.read_index + len];
        self.read_index += len;
        Ok(out)
    }

    /// Asserts the whole frame was consumed, mirroring `ChannelReader`'s
    /// implicit contract that a decoder reads exactly the declared length.
    pub fn end_read(&self) -> Result<()> {
        if self.read_index != self.end_frame_index {
            return Err(Error::protocol(format!(
                "frame decoder consumed {} of {} bytes",
                self.read_index - HEADER_SIZE,
                self.end_frame_index - HEADER_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    fn feed(frames: &[&[u8]]) -> impl FnMut(&mut [u8]) -> Result<usize> {
        let mut queue: VecDeque<u8> = frames.iter().flat_map(|f| f.iter().copied()).collect();
        move |dst: &mut [u8]| {
            let n = dst.len().min(queue.len()).max(1).min(queue.len());
            for slot in dst.iter_mut().take(n) {
                *slot = queue.pop_front().unwrap();
            }
            Ok(n)
        }
    }

    #[test]
    fn write_then_read_single_frame() {
        let mut writer = FrameWriter::new();
        writer.write_u32(7).unwrap();
        writer.write_bytes(b"hi").unwrap();
        let frame = writer.finish().to_vec();

        let mut reader = FrameReader::new();
        reader.begin_read(feed(&[&frame])).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 7);
        assert_eq!(reader.read_bytes(2).unwrap(), b"hi");
        reader.end_read().unwrap();
    }

    #[test]
    fn two_frames_in_one_receive_are_both_decoded() {
        let mut writer = FrameWriter::new();
        writer.write_u32(1).unwrap();
        let frame_a = writer.finish().to_vec();
        writer.write_u32(2).unwrap();
        let frame_b = writer.finish().to_vec();

        let combined: Vec<u8> = frame_a.iter().chain(frame_b.iter()).copied().collect();
        let mut queue: VecDeque<u8> = combined.into_iter().collect();
        let mut recv = move |dst: &mut [u8]| {
            let n = dst.len().min(queue.len());
            for slot in dst.iter_mut().take(n) {
                *slot = queue.pop_front().unwrap();
            }
            Ok(n)
        };

        let mut reader = FrameReader::new();
        reader.begin_read(&mut recv).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 1);
        reader.end_read().unwrap();

        reader.begin_read(&mut recv).unwrap();
        assert_eq!(reader.read_u32().unwrap(), 2);
        reader.end_read().unwrap();
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let mut reader = FrameReader::new();
        let len = (FRAME_BUFFER_SIZE as u32) + 1;
        let mut header = len.to_le_bytes().to_vec();
        header.resize(8, 0);
        let result = reader.begin_read(feed(&[&header]));
        assert!(result.is_err());
    }
}
