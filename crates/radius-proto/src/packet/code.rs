/// RADIUS packet codes handled by a Dynamic Authorization Server (RFC 5176 Section 2.3)
///
/// Codes outside the Disconnect/CoA range decode to [`Code::Unknown`] so that
/// a well-formed, authenticated packet can still reach dispatch and be logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Code {
    /// Disconnect-Request (40)
    DisconnectRequest,
    /// Disconnect-ACK (41)
    DisconnectAck,
    /// Disconnect-NAK (42)
    DisconnectNak,
    /// CoA-Request (43)
    CoaRequest,
    /// CoA-ACK (44)
    CoaAck,
    /// CoA-NAK (45)
    CoaNak,
    /// Any other code octet
    Unknown(u8),
}

impl Code {
    pub fn from_u8(value: u8) -> Self {
        match value {
            40 => Code::DisconnectRequest,
            41 => Code::DisconnectAck,
            42 => Code::DisconnectNak,
            43 => Code::CoaRequest,
            44 => Code::CoaAck,
            45 => Code::CoaNak,
            other => Code::Unknown(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Code::DisconnectRequest => 40,
            Code::DisconnectAck => 41,
            Code::DisconnectNak => 42,
            Code::CoaRequest => 43,
            Code::CoaAck => 44,
            Code::CoaNak => 45,
            Code::Unknown(value) => value,
        }
    }
}
