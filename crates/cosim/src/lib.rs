//! # cosim
//!
//! Public API surface for a co-simulation transport and coordination
//! runtime: a server drives a shared simulation clock forward one step at a
//! time; clients exchange I/O signals and CAN/Ethernet/LIN/FlexRay bus
//! traffic with it over a reliable framed channel, either remotely
//! (TCP/Unix sockets) or locally (shared memory).
//!
//! ## Architecture
//!
//! - **`cosim-core`**: channel abstraction (`Channel`/`ChannelServer`),
//!   frame codec primitives, shared-memory ring buffers, error and logging
//!   types
//! - **`cosim-protocol`**: wire frame kinds, the typed data model, and the
//!   connect handshake
//! - **`cosim-io`**: I/O signal and bus message buffer implementations
//! - **`cosim`** (this crate): `CoSimServer`/`CoSimClient` session
//!   coordinators built on top of the above
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use cosim::prelude::*;
//! use cosim_core::channel::socket_channel::SocketChannelServer;
//!
//! # fn example() -> cosim_core::error::Result<()> {
//! let listener = SocketChannelServer::bind("127.0.0.1:0")?;
//! let mut server = CoSimServer::new(listener, ServerConfig {
//!     server_name: "Demo".to_string(),
//!     step_size: 1_000_000,
//!     ..Default::default()
//! });
//! if let Some(mut client) = server.try_accept()? {
//!     let callbacks = Callbacks::default();
//!     let (next_time, _command) = client.step(0, &callbacks)?;
//!     let _ = next_time;
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

/// Per-session I/O and bus buffer bundles.
pub mod buffers;
/// Host callback registrations for simulation lifecycle and step events.
pub mod callbacks;
/// Client-side session coordinator.
pub mod client;
/// Port mapper lookups, re-exported from `cosim-protocol`.
pub mod portmapper {
    pub use cosim_protocol::portmapper::*;
}
/// Server-side session coordinator.
pub mod server;

/// Common imports for building a co-simulation server or client.
pub mod prelude {
    pub use crate::buffers::SessionBuffers;
    pub use crate::callbacks::Callbacks;
    pub use crate::client::{ClientConfig, CoSimClient, PendingCommand};
    pub use crate::portmapper::{PortMapperClient, DEFAULT_PORT_MAPPER_PORT};
    pub use crate::server::{CoSimServer, ServerConfig};
    pub use cosim_protocol::types::{Command, TerminateReason};
}
