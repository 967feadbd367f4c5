//! Error and result taxonomy shared by every transport-level operation.

use std::io;
use thiserror::Error;

/// Closed set of outcomes a transport operation can report.
///
/// `Ok(T)` stands in for the original `Result::Ok`; the remaining variants
/// mirror the session-level taxonomy: a caller either gets its value, or one
/// of these conditions.
#[derive(Error, Debug)]
pub enum Error {
    /// Recoverable protocol or logic error, carrying a log-worthy message.
    #[error("{0}")]
    Protocol(String),

    /// The operation did not complete within its deadline.
    #[error("operation timed out")]
    Timeout,

    /// The peer is gone; the channel is dead.
    #[error("not connected")]
    NotConnected,

    /// Nothing was available to receive.
    #[error("empty")]
    Empty,

    /// A bounded queue is saturated.
    #[error("full")]
    Full,

    /// The caller passed an argument outside the accepted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Underlying OS/IO failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// True for conditions where a caller may sensibly retry the same call.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Timeout | Self::Empty | Self::Full => true,
            Self::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
            ),
            Self::NotConnected | Self::Protocol(_) | Self::InvalidArgument(_) => false,
        }
    }

    #[must_use]
    pub const fn is_connection_error(&self) -> bool {
        matches!(self, Self::NotConnected)
    }
}
