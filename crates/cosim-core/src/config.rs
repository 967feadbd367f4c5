//! Buffer sizing and timing constants shared across the transport.
//!
//! Mirrors the teacher crate's `config` module: centralize magic numbers
//! instead of scattering them through call sites.

use std::time::Duration;

/// Maximum size of a single wire frame, header included.
pub const FRAME_BUFFER_SIZE: usize = 65536;

/// Size, per direction, of a local-mode shared-memory ring.
pub const PIPE_BUFFER_SIZE: usize = 65536;

/// Length of the 4-byte frame-length header.
pub const HEADER_SIZE: usize = 4;

/// Default chunk size for a single socket `recv` call.
pub const DEFAULT_READ_CHUNK: usize = 1024;

/// Grace period after startup during which a counterpart PID of zero is not
/// treated as "counterpart crashed".
pub const LIVENESS_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Background ping period while a session is not running.
pub const PING_TICK: Duration = Duration::from_millis(1);

/// Fast-path spin/backoff schedule: (pause_count, iterations) pairs applied
/// in order before falling back to an event wait.
pub const SPIN_BACKOFF_SCHEDULE: &[(u32, u32)] = &[(1, 1000), (4, 1000), (16, 1000)];

/// Poll interval used by the slow-path wait loop.
pub const SLOW_PATH_WAIT: Duration = Duration::from_millis(1);

/// Per-session connection configuration, grounded on `ConnectConfig`.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    pub remote_ip_address: String,
    pub server_name: String,
    pub client_name: String,
    pub remote_port: u16,
    pub local_port: u16,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            remote_ip_address: "127.0.0.1".to_string(),
            server_name: String::new(),
            client_name: String::new(),
            remote_port: 0,
            local_port: 0,
        }
    }
}

#[must_use]
pub const fn is_power_of_two(n: usize) -> bool {
    n != 0 && (n & (n - 1)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_buffer_fits_header_plus_max_payload() {
        assert!(FRAME_BUFFER_SIZE > HEADER_SIZE);
    }

    #[test]
    fn power_of_two_check() {
        assert!(is_power_of_two(PIPE_BUFFER_SIZE));
        assert!(!is_power_of_two(3));
        assert!(!is_power_of_two(0));
    }
}
