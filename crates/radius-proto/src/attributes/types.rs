/// RADIUS attribute types a Dynamic Authorization Server deals with
///
/// RFC 5176 Section 3 groups them into NAS identification, session
/// identification, authorization and protocol attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AttributeType {
    /// User-Name (1) - RFC 2865
    UserName = 1,
    /// NAS-IP-Address (4) - RFC 2865
    NasIpAddress = 4,
    /// NAS-Port (5) - RFC 2865
    NasPort = 5,
    /// Service-Type (6) - RFC 2865
    ServiceType = 6,
    /// Framed-IP-Address (8) - RFC 2865
    FramedIpAddress = 8,
    /// Filter-Id (11) - RFC 2865
    FilterId = 11,
    /// Reply-Message (18) - RFC 2865
    ReplyMessage = 18,
    /// State (24) - RFC 2865
    State = 24,
    /// Class (25) - RFC 2865
    Class = 25,
    /// Vendor-Specific (26) - RFC 2865
    VendorSpecific = 26,
    /// Session-Timeout (27) - RFC 2865
    SessionTimeout = 27,
    /// Idle-Timeout (28) - RFC 2865
    IdleTimeout = 28,
    /// Called-Station-Id (30) - RFC 2865
    CalledStationId = 30,
    /// Calling-Station-Id (31) - RFC 2865
    CallingStationId = 31,
    /// NAS-Identifier (32) - RFC 2865
    NasIdentifier = 32,
    /// Proxy-State (33) - RFC 2865
    ProxyState = 33,
    /// Acct-Session-Id (44) - RFC 2866
    AcctSessionId = 44,
    /// Acct-Multi-Session-Id (50) - RFC 2866
    AcctMultiSessionId = 50,
    /// Event-Timestamp (55) - RFC 2869
    EventTimestamp = 55,
    /// NAS-Port-Type (61) - RFC 2865
    NasPortType = 61,
    /// Message-Authenticator (80) - RFC 2869
    MessageAuthenticator = 80,
    /// NAS-Port-Id (87) - RFC 2869
    NasPortId = 87,
    /// Chargeable-User-Identity (89) - RFC 4372
    ChargeableUserIdentity = 89,
    /// NAS-IPv6-Address (95) - RFC 3162
    NasIpv6Address = 95,
    /// Error-Cause (101) - RFC 5176
    ErrorCause = 101,
}

impl AttributeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(AttributeType::UserName),
            4 => Some(AttributeType::NasIpAddress),
            5 => Some(AttributeType::NasPort),
            6 => Some(AttributeType::ServiceType),
            8 => Some(AttributeType::FramedIpAddress),
            11 => Some(AttributeType::FilterId),
            18 => Some(AttributeType::ReplyMessage),
            24 => Some(AttributeType::State),
            25 => Some(AttributeType::Class),
            26 => Some(AttributeType::VendorSpecific),
            27 => Some(AttributeType::SessionTimeout),
            28 => Some(AttributeType::IdleTimeout),
            30 => Some(AttributeType::CalledStationId),
            31 => Some(AttributeType::CallingStationId),
            32 => Some(AttributeType::NasIdentifier),
            33 => Some(AttributeType::ProxyState),
            44 => Some(AttributeType::AcctSessionId),
            50 => Some(AttributeType::AcctMultiSessionId),
            55 => Some(AttributeType::EventTimestamp),
            61 => Some(AttributeType::NasPortType),
            80 => Some(AttributeType::MessageAuthenticator),
            87 => Some(AttributeType::NasPortId),
            89 => Some(AttributeType::ChargeableUserIdentity),
            95 => Some(AttributeType::NasIpv6Address),
            101 => Some(AttributeType::ErrorCause),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Session identification attributes (RFC 5176 Section 3)
    pub fn is_session_identification(self) -> bool {
        matches!(
            self,
            AttributeType::UserName
                | AttributeType::NasPort
                | AttributeType::FramedIpAddress
                | AttributeType::CallingStationId
                | AttributeType::AcctSessionId
                | AttributeType::AcctMultiSessionId
                | AttributeType::ChargeableUserIdentity
        )
    }

    /// NAS identification attributes (RFC 5176 Section 3)
    pub fn is_nas_identification(self) -> bool {
        matches!(
            self,
            AttributeType::NasIpAddress
                | AttributeType::NasIdentifier
                | AttributeType::NasIpv6Address
        )
    }

    /// Attributes that belong to the message envelope rather than the session
    pub fn is_protocol(self) -> bool {
        matches!(
            self,
            AttributeType::ProxyState
                | AttributeType::MessageAuthenticator
                | AttributeType::EventTimestamp
                | AttributeType::ErrorCause
                | AttributeType::State
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_known_types() {
        for value in 0..=u8::MAX {
            if let Some(attr_type) = AttributeType::from_u8(value) {
                assert_eq!(attr_type.as_u8(), value);
            }
        }
    }

    #[test]
    fn test_classification() {
        assert!(AttributeType::AcctSessionId.is_session_identification());
        assert!(!AttributeType::AcctSessionId.is_protocol());
        assert!(AttributeType::NasIdentifier.is_nas_identification());
        assert!(AttributeType::MessageAuthenticator.is_protocol());
        assert!(!AttributeType::SessionTimeout.is_session_identification());
    }
}
