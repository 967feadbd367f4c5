//! Protocol version negotiation.
//!
//! Version 1 lacks FlexRay. Version 2 adds FlexRay to `ConnectOk` and
//! round-trip nanoseconds to `Ping`. Endpoints negotiate the minimum of
//! what each side advertises.

pub const PROTOCOL_VERSION_1: u32 = 1;
pub const PROTOCOL_VERSION_2: u32 = 2;
pub const CURRENT_PROTOCOL_VERSION: u32 = PROTOCOL_VERSION_2;

#[must_use]
pub const fn negotiate(client_version: u32, server_version: u32) -> u32 {
    if client_version < server_version {
        client_version
    } else {
        server_version
    }
}

#[must_use]
pub const fn supports_flexray(negotiated_version: u32) -> bool {
    negotiated_version >= PROTOCOL_VERSION_2
}

#[must_use]
pub const fn supports_ping_round_trip(negotiated_version: u32) -> bool {
    negotiated_version >= PROTOCOL_VERSION_2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negotiation_picks_the_minimum() {
        assert_eq!(negotiate(2, 1), 1);
        assert_eq!(negotiate(1, 2), 1);
        assert_eq!(negotiate(2, 2), 2);
    }

    #[test]
    fn flexray_gated_below_v2() {
        assert!(!supports_flexray(1));
        assert!(supports_flexray(2));
    }
}
