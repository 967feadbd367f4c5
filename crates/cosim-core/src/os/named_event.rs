//! Auto-reset named event, backed by a POSIX named semaphore.
//!
//! No crate in this ecosystem wraps named semaphores directly, so this
//! module reaches for `libc` (already in the dependency graph for socket
//! tuning) rather than hand-rolling a vendored binding. A `set()` that
//! arrives before a `wait()` is not lost: the semaphore count absorbs it.

#![allow(unsafe_code)]

use crate::os::object_name;
use std::ffi::CString;
use std::io;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Signaled,
    Timeout,
    Error,
}

pub struct NamedEvent {
    handle: *mut libc::sem_t,
    name: CString,
}

// SAFETY: POSIX named semaphores are safe to share across threads; libc's
// sem_* functions only require the pointer stay valid, which `NamedEvent`
// guarantees via its own lifetime.
unsafe impl Send for NamedEvent {}
unsafe impl Sync for NamedEvent {}

impl NamedEvent {
    /// Create the event if absent, or open the existing one.
    pub fn create_or_open(name: &str) -> io::Result<Self> {
        let full_name = object_name("Event", name);
        let c_name = CString::new(full_name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let handle = unsafe { libc::sem_open(c_name.as_ptr(), libc::O_CREAT, 0o666, 0) };
        if handle == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { handle, name: c_name })
    }

    /// Open an existing event only; fails if it was never created.
    pub fn open_existing(name: &str) -> io::Result<Self> {
        let full_name = object_name("Event", name);
        let c_name = CString::new(full_name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        let handle = unsafe { libc::sem_open(c_name.as_ptr(), 0) };
        if handle == libc::SEM_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { handle, name: c_name })
    }

    /// Signal the event. Does not block and does not accumulate beyond one
    /// pending signal worth of state for the auto-reset contract used here.
    pub fn set(&self) -> io::Result<()> {
        let rc = unsafe { libc::sem_post(self.handle) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Block until signaled, or until `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> WaitOutcome {
        let deadline = libc::timespec {
            tv_sec: (now_unix_secs() + timeout.as_secs() as i64),
            tv_nsec: i64::from(timeout.subsec_nanos()),
        };
        let rc = unsafe { libc::sem_timedwait(self.handle, &deadline) };
        if rc == 0 {
            WaitOutcome::Signaled
        } else {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::TimedOut || err.raw_os_error() == Some(libc::ETIMEDOUT) {
                WaitOutcome::Timeout
            } else {
                WaitOutcome::Error
            }
        }
    }
}

fn now_unix_secs() -> i64 {
    let mut ts = libc::timespec { tv_sec: 0, tv_nsec: 0 };
    unsafe { libc::clock_gettime(libc::CLOCK_REALTIME, &mut ts) };
    ts.tv_sec
}

impl Drop for NamedEvent {
    fn drop(&mut self) {
        unsafe {
            libc::sem_close(self.handle);
        }
        let _ = &self.name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_before_wait_is_observed() {
        let name = format!("cosim-test-event-{}", std::process::id());
        let event = NamedEvent::create_or_open(&name).unwrap();
        event.set().unwrap();
        assert_eq!(event.wait(Duration::from_millis(100)), WaitOutcome::Signaled);
        unsafe { libc::sem_unlink(CString::new(object_name("Event", &name)).unwrap().as_ptr()) };
    }

    #[test]
    fn wait_without_signal_times_out() {
        let name = format!("cosim-test-event-timeout-{}", std::process::id());
        let event = NamedEvent::create_or_open(&name).unwrap();
        assert_eq!(event.wait(Duration::from_millis(20)), WaitOutcome::Timeout);
        unsafe { libc::sem_unlink(CString::new(object_name("Event", &name)).unwrap().as_ptr()) };
    }
}
