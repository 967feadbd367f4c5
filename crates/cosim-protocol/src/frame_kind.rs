//! The closed set of wire frame kinds, grounded on `CoSimTypes.hpp`'s
//! `FrameKind` enum. Numbering is stable and starts at 1.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum FrameKind {
    Ok = 1,
    Error,
    Connect,
    ConnectOk,
    Ping,
    PingOk,
    Start,
    Stop,
    Terminate,
    Pause,
    Continue,
    Step,
    StepOk,
    GetPort,
    GetPortOk,
    SetPort,
    UnsetPort,
}

impl FrameKind {
    #[must_use]
    pub const fn from_u32(value: u32) -> Option<Self> {
        Some(match value {
            1 => Self::Ok,
            2 => Self::Error,
            3 => Self::Connect,
            4 => Self::ConnectOk,
            5 => Self::Ping,
            6 => Self::PingOk,
            7 => Self::Start,
            8 => Self::Stop,
            9 => Self::Terminate,
            10 => Self::Pause,
            11 => Self::Continue,
            12 => Self::Step,
            13 => Self::StepOk,
            14 => Self::GetPort,
            15 => Self::GetPortOk,
            16 => Self::SetPort,
            17 => Self::UnsetPort,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_numbering_round_trips() {
        for kind in [
            FrameKind::Ok,
            FrameKind::Error,
            FrameKind::Connect,
            FrameKind::ConnectOk,
            FrameKind::Ping,
            FrameKind::PingOk,
            FrameKind::Start,
            FrameKind::Stop,
            FrameKind::Terminate,
            FrameKind::Pause,
            FrameKind::Continue,
            FrameKind::Step,
            FrameKind::StepOk,
            FrameKind::GetPort,
            FrameKind::GetPortOk,
            FrameKind::SetPort,
            FrameKind::UnsetPort,
        ] {
            assert_eq!(FrameKind::from_u32(kind as u32), Some(kind));
        }
    }

    #[test]
    fn unknown_kind_is_none() {
        assert_eq!(FrameKind::from_u32(0), None);
        assert_eq!(FrameKind::from_u32(18), None);
    }
}
