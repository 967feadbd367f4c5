//! Local-mode channel backend: a single-producer/single-consumer byte ring
//! in shared memory per direction, signaled by named events, grounded on
//! the SHM-ring design in §4.2 (and the `other_examples` shared-memory
//! transport's cache-padded-atomics idiom).

#![allow(unsafe_code)]

use crate::channel::frame::{FrameReader, FrameWriter};
use crate::channel::{Channel, ChannelReader, ChannelServer, ChannelWriter};
use crate::config::{is_power_of_two, LIVENESS_GRACE_PERIOD, PIPE_BUFFER_SIZE, SLOW_PATH_WAIT, SPIN_BACKOFF_SCHEDULE};
use crate::error::{Error, Result};
use crate::os::named_event::{NamedEvent, WaitOutcome};
use crate::os::shared_memory::SharedMemoryRegion;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

#[repr(C)]
struct RingHeader {
    writer_pid: AtomicU32,
    _pad0: [u8; 60],
    reader_pid: AtomicU32,
    _pad1: [u8; 60],
    write_idx: AtomicU32,
    _pad2: [u8; 60],
    read_idx: AtomicU32,
    _pad3: [u8; 60],
}

const HEADER_SIZE: usize = std::mem::size_of::<RingHeader>();

/// One direction of the SHM pipe: a byte ring plus the two events that
/// flank it (`new_data` set by the writer, `new_space` set by the reader)
/// and the liveness bookkeeping for the counterpart process.
pub struct Pipe {
    region: SharedMemoryRegion,
    new_data: NamedEvent,
    new_space: NamedEvent,
    is_writer_side: bool,
    own_pid: u32,
    peer_pid_seen: u32,
    start: Instant,
}

impl Pipe {
    fn header(&self) -> &RingHeader {
        unsafe { &*(self.region.as_slice().as_ptr().cast::<RingHeader>()) }
    }

    fn data_ptr(&self) -> *mut u8 {
        unsafe { self.region.as_slice().as_ptr().add(HEADER_SIZE).cast_mut() }
    }

    /// Create (or attach to) a named pipe region. `is_writer_side` selects
    /// which PID slot this process publishes into.
    pub fn create_or_open(name: &str, is_writer_side: bool) -> Result<Self> {
        assert!(is_power_of_two(PIPE_BUFFER_SIZE));
        let region = SharedMemoryRegion::create_or_open(name, HEADER_SIZE + PIPE_BUFFER_SIZE)
            .map_err(|e| Error::protocol(format!("pipe region '{name}': {e}")))?;
        let new_data = NamedEvent::create_or_open(&format!("{name}.NewData"))?;
        let new_space = NamedEvent::create_or_open(&format!("{name}.NewSpace"))?;
        let pipe = Self {
            region,
            new_data,
            new_space,
            is_writer_side,
            own_pid: std::process::id(),
            peer_pid_seen: 0,
            start: Instant::now(),
        };
        if is_writer_side {
            pipe.header().writer_pid.store(pipe.own_pid, Ordering::Release);
        } else {
            pipe.header().reader_pid.store(pipe.own_pid, Ordering::Release);
        }
        Ok(pipe)
    }

    fn peer_pid(&self) -> u32 {
        if self.is_writer_side {
            self.header().reader_pid.load(Ordering::Acquire)
        } else {
            self.header().writer_pid.load(Ordering::Acquire)
        }
    }

    fn peer_alive(&mut self) -> bool {
        let pid = self.peer_pid();
        if pid == 0 {
            return self.start.elapsed() < LIVENESS_GRACE_PERIOD;
        }
        self.peer_pid_seen = pid;
        unsafe { libc::kill(pid as libc::pid_t, 0) == 0 }
    }

    fn available_data(&self) -> u32 {
        self.header()
            .write_idx
            .load(Ordering::Acquire)
            .wrapping_sub(self.header().read_idx.load(Ordering::Acquire))
    }

    fn available_space(&self) -> u32 {
        (PIPE_BUFFER_SIZE as u32) - self.available_data()
    }

    fn mask(index: u32) -> usize {
        (index as usize) & (PIPE_BUFFER_SIZE - 1)
    }

    /// Which event a blocked operation should wait on: the producer waits
    /// on `new_space` becoming available, the consumer on `new_data`.
    fn wait_for(&mut self, which: WaitOn, mut ready: impl FnMut(&Self) -> bool) -> Result<()> {
        if ready(self) {
            return Ok(());
        }
        for &(pauses, iterations) in SPIN_BACKOFF_SCHEDULE {
            for _ in 0..iterations {
                for _ in 0..pauses {
                    std::hint::spin_loop();
                }
                if ready(self) {
                    return Ok(());
                }
            }
        }
        loop {
            if !self.peer_alive() {
                return Err(Error::NotConnected);
            }
            let outcome = match which {
                WaitOn::NewData => self.new_data.wait(SLOW_PATH_WAIT),
                WaitOn::NewSpace => self.new_space.wait(SLOW_PATH_WAIT),
            };
            match outcome {
                WaitOutcome::Signaled | WaitOutcome::Timeout => {
                    if ready(self) {
                        return Ok(());
                    }
                }
                WaitOutcome::Error => return Err(Error::protocol("named event wait failed")),
            }
        }
    }

    /// Write the full contents of `bytes` into the ring, blocking for space.
    pub fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let mut remaining = bytes;
        while !remaining.is_empty() {
            self.wait_for(WaitOn::NewSpace, |this| this.available_space() > 0)?;
            let space = self.available_space() as usize;
            let take = remaining.len().min(space);
            let write_idx = self.header().write_idx.load(Ordering::Acquire);
            let start = Self::mask(write_idx);
            let first_chunk = take.min(PIPE_BUFFER_SIZE - start);
            unsafe {
                std::ptr::copy_nonoverlapping(remaining.as_ptr(), self.data_ptr().add(start), first_chunk);
                if first_chunk < take {
                    std::ptr::copy_nonoverlapping(
                        remaining.as_ptr().add(first_chunk),
                        self.data_ptr(),
                        take - first_chunk,
                    );
                }
            }
            self.header()
                .write_idx
                .store(write_idx.wrapping_add(take as u32), Ordering::Release);
            self.new_data.set().map_err(Error::Io)?;
            remaining = &remaining[take..];
        }
        Ok(())
    }

    /// Read up to `dst.len()` bytes, blocking until at least one is ready.
    pub fn receive(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.wait_for(WaitOn::NewData, |this| this.available_data() > 0)?;
        let available = self.available_data() as usize;
        let take = dst.len().min(available);
        let read_idx = self.header().read_idx.load(Ordering::Acquire);
        let start = Self::mask(read_idx);
        let first_chunk = take.min(PIPE_BUFFER_SIZE - start);
        unsafe {
            std::ptr::copy_nonoverlapping(self.data_ptr().add(start), dst.as_mut_ptr(), first_chunk);
            if first_chunk < take {
                std::ptr::copy_nonoverlapping(self.data_ptr(), dst.as_mut_ptr().add(first_chunk), take - first_chunk);
            }
        }
        self.header()
            .read_idx
            .store(read_idx.wrapping_add(take as u32), Ordering::Release);
        self.new_space.set().map_err(Error::Io)?;
        Ok(take)
    }
}

#[derive(Clone, Copy)]
enum WaitOn {
    NewData,
    NewSpace,
}

pub struct LocalWriter {
    pipe: Pipe,
    frame: FrameWriter,
}

impl ChannelWriter for LocalWriter {
    fn writer(&mut self) -> &mut FrameWriter {
        &mut self.frame
    }

    fn end_write(&mut self) -> Result<()> {
        let frame = self.frame.finish();
        self.pipe.send(frame)
    }
}

pub struct LocalReader {
    pipe: Pipe,
    frame: FrameReader,
}

impl ChannelReader for LocalReader {
    fn reader(&mut self) -> &mut FrameReader {
        &mut self.frame
    }

    fn receive(&mut self, dst: &mut [u8]) -> Result<usize> {
        self.pipe.receive(dst)
    }

    fn begin_read(&mut self) -> Result<()> {
        let pipe = &mut self.pipe;
        self.frame.begin_read(|dst| pipe.receive(dst))
    }
}

pub struct LocalChannel {
    writer: LocalWriter,
    reader: LocalReader,
    base_name: String,
}

impl LocalChannel {
    /// Connect as a client: claims the next connection slot from the
    /// listener's shared counter so `LocalChannelServer::try_accept` can
    /// observe it, then opens that slot's pair of pipes.
    pub fn open(base_name: &str, is_client: bool) -> Result<Self> {
        if !is_client {
            return Self::open_named(base_name, false);
        }
        let counter_region =
            SharedMemoryRegion::create_or_open(&format!("{base_name}.Counter"), 4)?;
        let counter: &AtomicU32 = unsafe { &*(counter_region.as_slice().as_ptr().cast::<AtomicU32>()) };
        let slot = counter.fetch_add(1, Ordering::AcqRel) + 1;
        Self::open_named(&format!("{base_name}.{slot}"), true)
    }

    /// Open a connection whose pipe names are already fully qualified
    /// (used by the server side, which derives the name from its own
    /// counter read rather than incrementing it).
    fn open_named(conn_name: &str, is_client: bool) -> Result<Self> {
        let (write_name, read_name) = if is_client {
            (format!("{conn_name}.ClientToServer"), format!("{conn_name}.ServerToClient"))
        } else {
            (format!("{conn_name}.ServerToClient"), format!("{conn_name}.ClientToServer"))
        };
        let write_pipe = Pipe::create_or_open(&write_name, true)?;
        let read_pipe = Pipe::create_or_open(&read_name, false)?;
        Ok(Self {
            writer: LocalWriter { pipe: write_pipe, frame: FrameWriter::new() },
            reader: LocalReader { pipe: read_pipe, frame: FrameReader::new() },
            base_name: conn_name.to_string(),
        })
    }
}

impl Channel for LocalChannel {
    type Writer = LocalWriter;
    type Reader = LocalReader;

    fn writer(&mut self) -> &mut Self::Writer {
        &mut self.writer
    }

    fn reader(&mut self) -> &mut Self::Reader {
        &mut self.reader
    }

    fn remote_address(&self) -> Option<String> {
        Some(self.base_name.clone())
    }

    fn disconnect(&mut self) {
        self.writer.pipe.header().writer_pid.store(0, Ordering::Release);
    }
}

/// Listener for local-mode connections: a small shared counter region used
/// to derive unique per-connection pipe names.
pub struct LocalChannelServer {
    base_name: String,
    counter_region: SharedMemoryRegion,
    accepted: u32,
}

impl LocalChannelServer {
    pub fn create(base_name: &str) -> Result<Self> {
        let counter_region = SharedMemoryRegion::create_or_open(&format!("{base_name}.Counter"), 4)?;
        Ok(Self { base_name: base_name.to_string(), counter_region, accepted: 0 })
    }

    fn counter(&self) -> &AtomicU32 {
        unsafe { &*(self.counter_region.as_slice().as_ptr().cast::<AtomicU32>()) }
    }
}

impl ChannelServer for LocalChannelServer {
    type Channel = LocalChannel;

    fn local_port(&self) -> Result<u16> {
        Ok(0)
    }

    fn try_accept(&mut self) -> Result<Option<Self::Channel>> {
        let published = self.counter().load(Ordering::Acquire);
        if published <= self.accepted {
            return Ok(None);
        }
        self.accepted += 1;
        let conn_name = format!("{}.{}", self.base_name, self.accepted);
        Ok(Some(LocalChannel::open_named(&conn_name, false)?))
    }
}
