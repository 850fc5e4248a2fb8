use crate::packet::{Packet, PacketError};

/// MD5 over a packet's header, a substitute authenticator, its attributes and the secret
///
/// This is the construction shared by the Response Authenticator
/// (RFC 2865 Section 3) and the DAS Request Authenticator (RFC 5176 Section 3.5):
///
/// `MD5(Code + Identifier + Length + authenticator + Attributes + Secret)`
fn md5_authenticator(
    packet: &Packet,
    authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    let mut context = md5::Context::new();

    let length = packet.length() as u16;
    context.consume([packet.code.as_u8(), packet.identifier]);
    context.consume(length.to_be_bytes());
    context.consume(authenticator);

    for attr in &packet.attributes {
        context.consume(attr.encode()?);
    }

    context.consume(secret);
    Ok(context.compute().0)
}

/// Calculate a Response Authenticator
///
/// Response Authenticator = MD5(Code + ID + Length + Request Authenticator + Attributes + Secret)
///
/// Used for Disconnect-ACK/NAK and CoA-ACK/NAK replies.
pub fn calculate_response_authenticator(
    packet: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    md5_authenticator(packet, request_authenticator, secret)
}

/// Calculate the Request Authenticator of a Disconnect or CoA request
///
/// Unlike an Access-Request, a DAS request has no random authenticator: it is
/// MD5(Code + ID + Length + 16 zero octets + Attributes + Secret), the same
/// rule RFC 2866 uses for Accounting-Request.
pub fn calculate_das_request_authenticator(
    packet: &Packet,
    secret: &[u8],
) -> Result<[u8; 16], PacketError> {
    md5_authenticator(packet, &[0u8; 16], secret)
}

/// Compare two byte strings without short-circuiting on the first difference
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
