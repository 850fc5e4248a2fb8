use super::Code;
use crate::attributes::Attribute;
use std::io::{self, Cursor, Read, Write};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Invalid packet length: {0}")]
    InvalidLength(usize),
    #[error("Truncated packet: header claims {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Attribute error: {0}")]
    AttributeError(String),
    #[error("Packet too large: {0} bytes")]
    PacketTooLarge(usize),
}

/// RADIUS Packet structure as defined in RFC 2865 Section 3
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Code      |  Identifier   |            Length             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                                                               |
/// |                         Authenticator                         |
/// |                                                               |
/// |                                                               |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone)]
pub struct Packet {
    /// Packet type (1 byte)
    pub code: Code,
    /// Identifier used to correlate requests and replies (1 byte)
    pub identifier: u8,
    /// Request or Response Authenticator (16 bytes)
    pub authenticator: [u8; 16],
    /// Attributes in wire order
    pub attributes: Vec<Attribute>,
}

impl Packet {
    /// Minimum RADIUS packet size (20 bytes: 1 code + 1 id + 2 length + 16 authenticator)
    pub const MIN_PACKET_SIZE: usize = 20;
    /// Maximum RADIUS packet size (4096 bytes as per RFC 2865)
    pub const MAX_PACKET_SIZE: usize = 4096;

    pub fn new(code: Code, identifier: u8, authenticator: [u8; 16]) -> Self {
        Packet {
            code,
            identifier,
            authenticator,
            attributes: Vec::new(),
        }
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.push(attribute);
    }

    /// Encode packet to bytes
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let mut buffer = Vec::with_capacity(self.length());

        buffer.write_all(&[self.code.as_u8(), self.identifier])?;

        // Length is patched in once the attributes are written
        let length_pos = buffer.len();
        buffer.write_all(&[0, 0])?;

        buffer.write_all(&self.authenticator)?;

        for attr in &self.attributes {
            let attr_bytes = attr.encode()?;
            buffer.write_all(&attr_bytes)?;
        }

        let total_length = buffer.len();
        if total_length > Self::MAX_PACKET_SIZE {
            return Err(PacketError::PacketTooLarge(total_length));
        }

        buffer[length_pos..length_pos + 2].copy_from_slice(&(total_length as u16).to_be_bytes());

        Ok(buffer)
    }

    /// Decode packet from bytes
    ///
    /// Octets past the Length field are treated as padding and ignored
    /// (RFC 2865 Section 3). A buffer shorter than Length is rejected.
    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        if data.len() < Self::MIN_PACKET_SIZE {
            return Err(PacketError::InvalidLength(data.len()));
        }

        let mut cursor = Cursor::new(data);

        let mut head = [0u8; 4];
        cursor.read_exact(&mut head)?;
        let code = Code::from_u8(head[0]);
        let identifier = head[1];
        let length = u16::from_be_bytes([head[2], head[3]]) as usize;

        if !(Self::MIN_PACKET_SIZE..=Self::MAX_PACKET_SIZE).contains(&length) {
            return Err(PacketError::InvalidLength(length));
        }

        if data.len() < length {
            return Err(PacketError::Truncated {
                expected: length,
                actual: data.len(),
            });
        }

        let mut authenticator = [0u8; 16];
        cursor.read_exact(&mut authenticator)?;

        let mut attributes = Vec::new();
        let position = cursor.position() as usize;
        let mut attr_data = &data[position..length];

        while !attr_data.is_empty() {
            let attr = Attribute::decode(attr_data)?;
            let attr_len = attr.encoded_length();
            attributes.push(attr);
            attr_data = &attr_data[attr_len..];
        }

        Ok(Packet {
            code,
            identifier,
            authenticator,
            attributes,
        })
    }

    /// Get the length of the encoded packet
    pub fn length(&self) -> usize {
        Self::MIN_PACKET_SIZE
            + self
                .attributes
                .iter()
                .map(Attribute::encoded_length)
                .sum::<usize>()
    }

    /// Find first attribute by type
    pub fn find_attribute(&self, attr_type: u8) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.attr_type == attr_type)
    }

    /// Find all attributes by type
    pub fn find_all_attributes(&self, attr_type: u8) -> Vec<&Attribute> {
        self.attributes
            .iter()
            .filter(|a| a.attr_type == attr_type)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeType;

    #[test]
    fn test_packet_encode_decode() {
        let mut packet = Packet::new(Code::DisconnectRequest, 42, [1u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice").unwrap());
        let encoded = packet.encode().unwrap();
        assert_eq!(encoded.len(), packet.length());

        let decoded = Packet::decode(&encoded).unwrap();
        assert_eq!(decoded.code, Code::DisconnectRequest);
        assert_eq!(decoded.identifier, 42);
        assert_eq!(decoded.authenticator, [1u8; 16]);
        assert_eq!(decoded.attributes, packet.attributes);
    }

    #[test]
    fn test_packet_min_size() {
        let data = vec![0u8; 19];
        assert!(Packet::decode(&data).is_err());
    }

    #[test]
    fn test_decode_unknown_code() {
        let packet = Packet::new(Code::Unknown(99), 3, [0u8; 16]);
        let decoded = Packet::decode(&packet.encode().unwrap()).unwrap();
        assert_eq!(decoded.code, Code::Unknown(99));
    }

    #[test]
    fn test_decode_truncated() {
        let mut packet = Packet::new(Code::CoaRequest, 1, [0u8; 16]);
        packet.add_attribute(Attribute::string(AttributeType::UserName as u8, "bob").unwrap());
        let encoded = packet.encode().unwrap();

        let err = Packet::decode(&encoded[..encoded.len() - 1]).unwrap_err();
        assert!(matches!(err, PacketError::Truncated { .. }));
    }

    #[test]
    fn test_decode_ignores_padding() {
        let packet = Packet::new(Code::CoaRequest, 9, [2u8; 16]);
        let mut encoded = packet.encode().unwrap();
        encoded.extend_from_slice(&[0xAA; 8]);

        let decoded = Packet::decode(&encoded).unwrap();
        assert!(decoded.attributes.is_empty());
    }

    #[test]
    fn test_decode_bad_attribute_length() {
        let mut encoded = Packet::new(Code::CoaRequest, 1, [0u8; 16]).encode().unwrap();
        // Attribute header claiming length 1
        encoded.extend_from_slice(&[1, 1]);
        let len = encoded.len() as u16;
        encoded[2..4].copy_from_slice(&len.to_be_bytes());

        assert!(Packet::decode(&encoded).is_err());
    }

    #[test]
    fn test_encode_too_large() {
        let mut packet = Packet::new(Code::CoaAck, 1, [0u8; 16]);
        for _ in 0..20 {
            packet.add_attribute(Attribute::new(AttributeType::ProxyState as u8, vec![0u8; 253]).unwrap());
        }
        assert!(matches!(packet.encode(), Err(PacketError::PacketTooLarge(_))));
    }
}
