//! Wire-level tests for Disconnect/CoA authentication
//!
//! Packets here are assembled byte by byte rather than through
//! `Packet::encode`, so the authenticator rules are checked against the
//! framing a real Dynamic Authorization Client puts on the wire.

use radius_proto::das::{error_cause, finish_das_response, verify_das_request, verify_das_response};
use radius_proto::message_auth::calculate_message_authenticator;
use radius_proto::{AttributeType, Code, ErrorCause, Packet};

const SECRET: &[u8] = b"xyzzy5461";

/// Build raw request bytes: header, zero authenticator, attributes
fn raw_request(code: u8, identifier: u8, attributes: &[(u8, &[u8])]) -> Vec<u8> {
    let mut bytes = vec![code, identifier, 0, 0];
    bytes.extend_from_slice(&[0u8; 16]);
    for (attr_type, value) in attributes {
        bytes.push(*attr_type);
        bytes.push((value.len() + 2) as u8);
        bytes.extend_from_slice(value);
    }
    let len = bytes.len() as u16;
    bytes[2..4].copy_from_slice(&len.to_be_bytes());
    bytes
}

/// Fill in the Request Authenticator the way RFC 5176 Section 3.5 describes
fn set_request_authenticator(bytes: &mut [u8], secret: &[u8]) {
    let mut data = bytes.to_vec();
    data[4..20].fill(0);
    data.extend_from_slice(secret);
    let digest = md5::compute(&data);
    bytes[4..20].copy_from_slice(&digest.0);
}

#[test]
fn test_hand_built_disconnect_request_verifies() {
    let mut bytes = raw_request(
        40,
        7,
        &[
            (AttributeType::UserName as u8, b"steve"),
            (AttributeType::AcctSessionId as u8, b"4A1B0002"),
        ],
    );
    set_request_authenticator(&mut bytes, SECRET);

    let packet = Packet::decode(&bytes).expect("Failed to decode");
    assert_eq!(packet.code, Code::DisconnectRequest);
    assert_eq!(packet.identifier, 7);
    assert!(verify_das_request(&packet, SECRET).is_ok());
    assert!(verify_das_request(&packet, b"other-secret").is_err());
}

#[test]
fn test_hand_built_message_authenticator_verifies() {
    let mut bytes = raw_request(
        43,
        12,
        &[
            (AttributeType::AcctSessionId as u8, b"4A1B0003"),
            (AttributeType::MessageAuthenticator as u8, &[0u8; 16]),
        ],
    );
    // HMAC over the packet with zero authenticator and zero Message-Authenticator
    let mac = calculate_message_authenticator(&bytes, SECRET);
    let offset = bytes.len() - 16;
    bytes[offset..].copy_from_slice(&mac);
    set_request_authenticator(&mut bytes, SECRET);

    let packet = Packet::decode(&bytes).expect("Failed to decode");
    assert!(verify_das_request(&packet, SECRET).is_ok());

    // Flip one bit of the Message-Authenticator and fix up the Request Authenticator
    bytes[offset] ^= 0x01;
    set_request_authenticator(&mut bytes, SECRET);
    let packet = Packet::decode(&bytes).expect("Failed to decode");
    assert!(verify_das_request(&packet, SECRET).is_err());
}

#[test]
fn test_reply_wire_format() {
    let mut request_bytes = raw_request(40, 99, &[(AttributeType::UserName as u8, b"bob")]);
    set_request_authenticator(&mut request_bytes, SECRET);
    let request = Packet::decode(&request_bytes).expect("Failed to decode");

    let mut reply = Packet::new(Code::DisconnectNak, request.identifier, [0u8; 16]);
    reply.add_attribute(ErrorCause::UnsupportedService.to_attribute().unwrap());
    finish_das_response(&mut reply, SECRET, &request.authenticator).expect("Failed to sign");
    let bytes = reply.encode().expect("Failed to encode");

    // Code, identifier, length
    assert_eq!(bytes[0], 42);
    assert_eq!(bytes[1], 99);
    assert_eq!(u16::from_be_bytes([bytes[2], bytes[3]]) as usize, bytes.len());
    // Error-Cause 405, then Message-Authenticator
    assert_eq!(&bytes[20..26], &[101, 6, 0, 0, 0x01, 0x95]);
    assert_eq!(&bytes[26..28], &[80, 18]);
    assert_eq!(bytes.len(), 44);

    let decoded = Packet::decode(&bytes).expect("Failed to decode reply");
    assert_eq!(error_cause(&decoded), Some(405));
    assert!(verify_das_response(&decoded, &request.authenticator, SECRET).is_ok());
}
