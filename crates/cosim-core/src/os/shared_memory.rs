//! Named shared memory region, backed by the `shared_memory` crate.

#![allow(unsafe_code)]

use crate::error::{Error, Result};
use crate::os::object_name;
use shared_memory::{Shmem, ShmemConf, ShmemError};

pub struct SharedMemoryRegion {
    shmem: Shmem,
}

impl SharedMemoryRegion {
    /// Create the region if it does not already exist, otherwise open it.
    /// Freshly created regions are zero-initialized by the OS.
    pub fn create_or_open(name: &str, size: usize) -> Result<Self> {
        let os_id = object_name("SharedMemory", name);
        match ShmemConf::new().size(size).os_id(&os_id).create() {
            Ok(shmem) => Ok(Self { shmem }),
            Err(ShmemError::MappingIdExists) => Self::try_open_existing(name, size)?
                .ok_or_else(|| Error::protocol("shared memory region vanished between create and open")),
            Err(e) => Err(Error::protocol(format!("shared memory create failed: {e}"))),
        }
    }

    /// Open an existing region; returns `Ok(None)` if it does not exist yet.
    pub fn try_open_existing(name: &str, size: usize) -> Result<Option<Self>> {
        let os_id = object_name("SharedMemory", name);
        match ShmemConf::new().size(size).os_id(&os_id).open() {
            Ok(shmem) => Ok(Some(Self { shmem })),
            Err(ShmemError::MapOpenFailed(_)) | Err(ShmemError::LinkExists) => Ok(None),
            Err(e) => Err(Error::protocol(format!("shared memory open failed: {e}"))),
        }
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.shmem.as_ptr(), self.shmem.len()) }
    }

    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        unsafe { std::slice::from_raw_parts_mut(self.shmem.as_ptr(), self.shmem.len()) }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.shmem.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shmem.len() == 0
    }

    #[must_use]
    pub fn is_owner(&self) -> bool {
        self.shmem.is_owner()
    }
}

// SAFETY: the underlying mapping is shared by contract between exactly the
// two processes that agreed on its name; synchronization of the bytes
// themselves is provided by the ring buffer view's atomics and named events.
unsafe impl Send for SharedMemoryRegion {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_reopen_round_trips_bytes() {
        let name = format!("cosim-test-shm-{}", std::process::id());
        let mut region = SharedMemoryRegion::create_or_open(&name, 4096).unwrap();
        region.as_mut_slice()[0] = 42;
        let reopened = SharedMemoryRegion::try_open_existing(&name, 4096).unwrap().unwrap();
        assert_eq!(reopened.as_slice()[0], 42);
    }
}
