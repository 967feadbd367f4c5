//! Named, process-scoped mutual exclusion, grounded on `NamedMutex.{h,cpp}`.
//!
//! The original exposes lowercase `lock()`/`unlock()` so it composes with
//! `std::lock_guard`; the Rust equivalent is a RAII guard returned by
//! `lock()`/`try_lock()`.

#![allow(unsafe_code)]

use crate::os::object_name;
use std::ffi::CString;
use std::io;
use std::time::Duration;

pub struct NamedLock {
    handle: *mut libc::sem_t,
}

unsafe impl Send for NamedLock {}
unsafe impl Sync for NamedLock {}

pub struct NamedLockGuard<'a> {
    lock: &'a NamedLock,
}

impl<'a> Drop for NamedLockGuard<'a> {
    fn drop(&mut self) {
        unsafe {
            libc::sem_post(self.lock.handle);
        }
    }
}

impl NamedLock {
    pub fn create_or_open(name: &str) -> io::Result<Self> {
        let full_name = object_name("Mutex", name);
        let c_name = CString::new(full_name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let handle = unsafe { libc::sem_open(c_name.as_ptr(), libc::O_CREAT, 0o666, 1) };
        if handle == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { handle })
    }

    /// Block indefinitely until the lock is acquired.
    pub fn lock(&self) -> io::Result<NamedLockGuard<'_>> {
        let rc = unsafe { libc::sem_wait(self.handle) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(NamedLockGuard { lock: self })
    }

    /// Attempt to acquire the lock within `timeout`.
    pub fn lock_timeout(&self, timeout: Duration) -> io::Result<Option<NamedLockGuard<'_>>> {
        let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
        unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
        ts.tv_sec += timeout.as_secs() as i64;
        ts.tv_nsec += i64::from(timeout.subsec_nanos());
        let rc = unsafe { libc::sem_timedwait(self.handle, &ts) };
        if rc == 0 {
            return Ok(Some(NamedLockGuard { lock: self }));
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ETIMEDOUT) {
            Ok(None)
        } else {
            Err(err)
        }
    }
}

impl Drop for NamedLock {
    fn drop(&mut self) {
        unsafe {
            libc::sem_close(self.handle);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_excludes_reentry_via_timeout() {
        let name = format!("cosim-test-lock-{}", std::process::id());
        let lock = NamedLock::create_or_open(&name).unwrap();
        let guard = lock.lock().unwrap();
        assert!(lock.lock_timeout(Duration::from_millis(20)).unwrap().is_none());
        drop(guard);
        assert!(lock.lock_timeout(Duration::from_millis(20)).unwrap().is_some());
    }
}
