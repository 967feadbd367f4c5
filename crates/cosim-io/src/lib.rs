//! I/O signal and bus message buffers for the co-simulation runtime.
//!
//! - `signal_buffer`: per-direction I/O signal staging (`RemoteIoBuffer`,
//!   `LocalIoBuffer`)
//! - `bus_buffer`: CAN/Ethernet/LIN/FlexRay message staging
//!   (`RemoteBusBuffer`; local-mode SHM ring specialization tracked in
//!   `cosim_core::ring_buffer_view`)
//! - `locked`: client-side mutex decorator shared by both buffer kinds
//!
//! Internal implementation detail of the `cosim` crate.

#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod bus_buffer;
pub mod locked;
pub mod signal_buffer;

pub mod prelude {
    pub use crate::bus_buffer::{BusMessage, ControllerLike, RemoteBusBuffer};
    pub use crate::locked::Locked;
    pub use crate::signal_buffer::{IoBuffer, LocalIoBuffer, RemoteIoBuffer};
}
