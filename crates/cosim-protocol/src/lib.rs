//! Wire protocol for the co-simulation runtime.
//!
//! Layers on top of `cosim_core`'s framed channels:
//! - `types`: the data model carried in frame bodies (I/O signals, bus
//!   controller/message descriptors, command and state enums)
//! - `version`: protocol version negotiation
//! - `frame_kind`: the closed set of wire frame kinds
//! - `codec`: encode/decode for every frame kind except `Step`/`StepOk`
//!   payloads, which the I/O and bus buffers serialize directly
//! - `handshake`: the `Connect`/`ConnectOk` exchange
//! - `portmapper`: client for the well-known port mapper service
//!
//! Internal implementation detail of the `cosim` crate; use that crate's
//! public API for application development.

#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod codec;
pub mod frame_kind;
pub mod handshake;
pub mod portmapper;
pub mod types;
pub mod version;

pub mod prelude {
    pub use crate::codec::{ConnectOk, ConnectRequest};
    pub use crate::frame_kind::FrameKind;
    pub use crate::handshake::{perform_client_handshake, perform_server_handshake, HandshakeDecision};
    pub use crate::portmapper::PortMapperClient;
    pub use crate::types::*;
    pub use crate::version::{negotiate, CURRENT_PROTOCOL_VERSION};
}
