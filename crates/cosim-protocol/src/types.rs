//! Data model shared by every frame kind, grounded on `CoSimTypes.h`.

pub const CAN_MESSAGE_MAX_LENGTH: usize = 64;
pub const ETH_MESSAGE_MAX_LENGTH: usize = 9018;
pub const LIN_MESSAGE_MAX_LENGTH: usize = 8;
pub const FR_MESSAGE_MAX_LENGTH: usize = 254;
pub const ETH_ADDRESS_LENGTH: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoSimType {
    Client,
    Server,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionKind {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    None,
    Step,
    Start,
    Stop,
    Terminate,
    Pause,
    Continue,
    TerminateFinished,
    Ping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateReason {
    Finished,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Unloaded,
    Stopped,
    Running,
    Paused,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum DataType {
    Bool = 1,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DataType {
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
        }
    }

    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::Bool,
            2 => Self::Int8,
            3 => Self::Int16,
            4 => Self::Int32,
            5 => Self::Int64,
            6 => Self::UInt8,
            7 => Self::UInt16,
            8 => Self::UInt32,
            9 => Self::UInt64,
            10 => Self::Float32,
            11 => Self::Float64,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SizeKind {
    Fixed = 1,
    Variable = 2,
}

impl SizeKind {
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::Fixed,
            2 => Self::Variable,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone)]
pub struct IoSignal {
    pub id: u32,
    pub max_length: u32,
    pub data_type: DataType,
    pub size_kind: SizeKind,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanMessageFlags(pub u32);

impl CanMessageFlags {
    pub const LOOPBACK: u32 = 1;
    pub const ERROR: u32 = 2;
    pub const DROP: u32 = 4;
    pub const EXTENDED_ID: u32 = 8;
    pub const BIT_RATE_SWITCH: u32 = 16;
    pub const FLEXIBLE_DATA_RATE_FORMAT: u32 = 32;

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & !(Self::LOOPBACK
            | Self::ERROR
            | Self::DROP
            | Self::EXTENDED_ID
            | Self::BIT_RATE_SWITCH
            | Self::FLEXIBLE_DATA_RATE_FORMAT)
            == 0
    }
}

#[derive(Debug, Clone)]
pub struct CanController {
    pub id: u32,
    pub queue_size: u32,
    pub bits_per_second: u64,
    pub flexible_data_rate_bits_per_second: u64,
    pub name: String,
    pub channel_name: String,
    pub cluster_name: String,
}

#[derive(Debug, Clone)]
pub struct CanMessage {
    pub timestamp: i64,
    pub controller_id: u32,
    pub id: u32,
    pub flags: u32,
    pub length: u8,
    pub data: [u8; CAN_MESSAGE_MAX_LENGTH],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthMessageFlags(pub u32);

impl EthMessageFlags {
    pub const LOOPBACK: u32 = 1;
    pub const ERROR: u32 = 2;
    pub const DROP: u32 = 4;
}

#[derive(Debug, Clone)]
pub struct EthController {
    pub id: u32,
    pub queue_size: u32,
    pub bits_per_second: u64,
    pub mac_address: [u8; ETH_ADDRESS_LENGTH],
    pub name: String,
    pub channel_name: String,
    pub cluster_name: String,
}

#[derive(Debug, Clone)]
pub struct EthMessage {
    pub timestamp: i64,
    pub controller_id: u32,
    pub flags: u32,
    pub length: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum LinControllerType {
    Responder = 1,
    Commander = 2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinMessageFlags(pub u32);

impl LinMessageFlags {
    pub const NO_RESPONSE: u32 = 2048;
}

#[derive(Debug, Clone)]
pub struct LinController {
    pub id: u32,
    pub queue_size: u32,
    pub bits_per_second: u64,
    pub controller_type: LinControllerType,
    pub name: String,
    pub channel_name: String,
    pub cluster_name: String,
}

#[derive(Debug, Clone)]
pub struct LinMessage {
    pub timestamp: i64,
    pub controller_id: u32,
    pub id: u32,
    pub flags: u32,
    pub length: u8,
    pub data: [u8; LIN_MESSAGE_MAX_LENGTH],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrMessageFlags(pub u32);

impl FrMessageFlags {
    pub const LOOPBACK: u32 = 1;
    pub const ERROR: u32 = 2;
    pub const DROP: u32 = 4;
    pub const STARTUP: u32 = 8;
    pub const SYNC_FRAME: u32 = 16;
    pub const NULL_FRAME: u32 = 32;
    pub const PAYLOAD_PREAMBLE: u32 = 64;
    pub const TRANSFER_ONCE: u32 = 128;
    pub const CHANNEL_A: u32 = 256;
    pub const CHANNEL_B: u32 = 512;
}

#[derive(Debug, Clone)]
pub struct FrController {
    pub id: u32,
    pub queue_size: u32,
    pub name: String,
    pub channel_name: String,
    pub cluster_name: String,
}

#[derive(Debug, Clone)]
pub struct FrMessage {
    pub timestamp: i64,
    pub controller_id: u32,
    pub id: u32,
    pub flags: u32,
    pub length: u8,
    pub data: [u8; FR_MESSAGE_MAX_LENGTH],
}
