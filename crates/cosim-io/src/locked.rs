//! Mutex decorator so client code may share an I/O or bus buffer across
//! threads; server-side instances are assumed to be driven single-
//! threadedly and use the plain buffer directly.

use crate::signal_buffer::IoBuffer;
use cosim_core::channel::frame::{FrameReader, FrameWriter};
use cosim_core::error::Result;
use parking_lot::Mutex;

pub struct Locked<B> {
    inner: Mutex<B>,
}

impl<B> Locked<B> {
    pub fn new(inner: B) -> Self {
        Self { inner: Mutex::new(inner) }
    }
}

// `IoBuffer::read` borrows from `&self`, a shape that cannot be expressed
// through a `MutexGuard` without the guard outliving the call. `Locked`
// therefore exposes its own inherent surface rather than implementing
// `IoBuffer`: every other method delegates directly, and reads take a
// closure instead of returning a borrow.
impl<B: IoBuffer> Locked<B> {
    pub fn write(&mut self, signal_id: u32, length: u32, data: &[u8]) -> Result<()> {
        self.inner.lock().write(signal_id, length, data)
    }

    /// Read a signal's current value under the lock, handing the bytes to
    /// `f` rather than returning a borrow that would have to outlive the
    /// guard.
    pub fn with_read<R>(&self, signal_id: u32, f: impl FnOnce(u32, &[u8]) -> R) -> Result<R> {
        let guard = self.inner.lock();
        let (length, data) = guard.read(signal_id)?;
        Ok(f(length, data))
    }

    pub fn serialize(&mut self, writer: &mut FrameWriter) -> Result<()> {
        self.inner.lock().serialize(writer)
    }

    pub fn deserialize(&mut self, reader: &mut FrameReader) -> Result<()> {
        self.inner.lock().deserialize(reader)
    }
}
