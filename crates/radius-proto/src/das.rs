//! Dynamic Authorization Extensions to RADIUS (RFC 5176)
//!
//! A Dynamic Authorization Server (DAS) receives Disconnect-Request and
//! CoA-Request packets pushed by a Dynamic Authorization Client (usually the
//! AAA server) and answers with an ACK or NAK.
//!
//! Both directions are authenticated with the shared secret:
//!
//! - **Requests** carry `MD5(Code + ID + Length + 16 zero octets + Attributes + Secret)`
//!   as Request Authenticator. An optional Message-Authenticator is HMAC-MD5
//!   over the packet with the Authenticator field zeroed.
//! - **Replies** carry a Message-Authenticator computed with the request's
//!   authenticator in the Authenticator field, then a Response Authenticator
//!   computed the RFC 2865 way.
//!
//! The request check is stateless: the DAS never sent anything the request
//! could be correlated with.
//!
//! # Example
//!
//! ```rust
//! use radius_proto::das::{finish_das_response, sign_das_request, verify_das_request, verify_das_response, ErrorCause};
//! use radius_proto::{Attribute, AttributeType, Code, Packet};
//!
//! let secret = b"testing123";
//!
//! let mut request = Packet::new(Code::DisconnectRequest, 7, [0u8; 16]);
//! request.add_attribute(Attribute::string(AttributeType::UserName as u8, "alice").unwrap());
//! sign_das_request(&mut request, secret).unwrap();
//! assert!(verify_das_request(&request, secret).is_ok());
//!
//! let mut reply = Packet::new(Code::DisconnectNak, request.identifier, [0u8; 16]);
//! reply.add_attribute(ErrorCause::UnsupportedService.to_attribute().unwrap());
//! finish_das_response(&mut reply, secret, &request.authenticator).unwrap();
//! assert!(verify_das_response(&reply, &request.authenticator, secret).is_ok());
//! ```

use crate::attributes::{Attribute, AttributeType};
use crate::auth::{
    calculate_das_request_authenticator, calculate_response_authenticator, constant_time_eq,
};
use crate::message_auth::{calculate_message_authenticator, MESSAGE_AUTHENTICATOR_LENGTH};
use crate::packet::{Packet, PacketError};
use thiserror::Error;

/// Reasons a DAS request or reply fails authentication
#[derive(Error, Debug)]
pub enum DasAuthError {
    #[error("Invalid Request Authenticator")]
    InvalidRequestAuthenticator,
    #[error("Invalid Response Authenticator")]
    InvalidResponseAuthenticator,
    #[error("Invalid Message-Authenticator")]
    InvalidMessageAuthenticator,
    #[error("Multiple Message-Authenticator attributes")]
    MultipleMessageAuthenticators,
    #[error("Packet error: {0}")]
    Packet(#[from] PacketError),
}

/// Error-Cause values (RFC 5176 Section 3.5)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ErrorCause {
    /// Residual Session Context Removed (201)
    ResidualSessionContextRemoved = 201,
    /// Invalid EAP Packet (Ignored) (202)
    InvalidEapPacket = 202,
    /// Unsupported Attribute (401)
    UnsupportedAttribute = 401,
    /// Missing Attribute (402)
    MissingAttribute = 402,
    /// NAS Identification Mismatch (403)
    NasIdentificationMismatch = 403,
    /// Invalid Request (404)
    InvalidRequest = 404,
    /// Unsupported Service (405)
    UnsupportedService = 405,
    /// Unsupported Extension (406)
    UnsupportedExtension = 406,
    /// Invalid Attribute Value (407)
    InvalidAttributeValue = 407,
    /// Administratively Prohibited (501)
    AdministrativelyProhibited = 501,
    /// Request Not Routable (Proxy) (502)
    RequestNotRoutable = 502,
    /// Session Context Not Found (503)
    SessionContextNotFound = 503,
    /// Session Context Not Removable (504)
    SessionContextNotRemovable = 504,
    /// Other Proxy Processing Error (505)
    OtherProxyProcessingError = 505,
    /// Resources Unavailable (506)
    ResourcesUnavailable = 506,
    /// Request Initiated (507)
    RequestInitiated = 507,
    /// Multiple Session Selection Unsupported (508)
    MultipleSessionSelectionUnsupported = 508,
}

impl ErrorCause {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            201 => Some(ErrorCause::ResidualSessionContextRemoved),
            202 => Some(ErrorCause::InvalidEapPacket),
            401 => Some(ErrorCause::UnsupportedAttribute),
            402 => Some(ErrorCause::MissingAttribute),
            403 => Some(ErrorCause::NasIdentificationMismatch),
            404 => Some(ErrorCause::InvalidRequest),
            405 => Some(ErrorCause::UnsupportedService),
            406 => Some(ErrorCause::UnsupportedExtension),
            407 => Some(ErrorCause::InvalidAttributeValue),
            501 => Some(ErrorCause::AdministrativelyProhibited),
            502 => Some(ErrorCause::RequestNotRoutable),
            503 => Some(ErrorCause::SessionContextNotFound),
            504 => Some(ErrorCause::SessionContextNotRemovable),
            505 => Some(ErrorCause::OtherProxyProcessingError),
            506 => Some(ErrorCause::ResourcesUnavailable),
            507 => Some(ErrorCause::RequestInitiated),
            508 => Some(ErrorCause::MultipleSessionSelectionUnsupported),
            _ => None,
        }
    }

    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Build the Error-Cause attribute carrying this value
    pub fn to_attribute(self) -> Result<Attribute, PacketError> {
        Attribute::integer(AttributeType::ErrorCause as u8, self.as_u32())
    }
}

/// Read the Error-Cause attribute of a packet, if present and well formed
pub fn error_cause(packet: &Packet) -> Option<u32> {
    packet
        .find_attribute(AttributeType::ErrorCause as u8)
        .and_then(|attr| attr.as_integer().ok())
}

/// Verify a Disconnect-Request or CoA-Request against the shared secret
///
/// The Request Authenticator must match; a Message-Authenticator, if present,
/// must be unique and valid.
pub fn verify_das_request(packet: &Packet, secret: &[u8]) -> Result<(), DasAuthError> {
    let expected = calculate_das_request_authenticator(packet, secret)?;
    if !constant_time_eq(&packet.authenticator, &expected) {
        return Err(DasAuthError::InvalidRequestAuthenticator);
    }

    verify_message_authenticator_with(packet, &[0u8; 16], secret)
}

/// Sign a Disconnect-Request or CoA-Request (client side)
///
/// Adds a Message-Authenticator, then sets the Request Authenticator.
pub fn sign_das_request(packet: &mut Packet, secret: &[u8]) -> Result<(), PacketError> {
    packet.authenticator = [0u8; 16];
    insert_message_authenticator(packet, secret)?;
    packet.authenticator = calculate_das_request_authenticator(packet, secret)?;
    Ok(())
}

/// Sign a Disconnect/CoA ACK or NAK in place
///
/// Appends a Message-Authenticator computed with the request's authenticator
/// in the Authenticator field, then sets the Response Authenticator. On error
/// the reply is left without a Message-Authenticator.
pub fn finish_das_response(
    reply: &mut Packet,
    secret: &[u8],
    request_authenticator: &[u8; 16],
) -> Result<(), PacketError> {
    reply.authenticator = *request_authenticator;
    insert_message_authenticator(reply, secret)?;
    match calculate_response_authenticator(reply, request_authenticator, secret) {
        Ok(authenticator) => {
            reply.authenticator = authenticator;
            Ok(())
        }
        Err(e) => {
            strip_message_authenticators(reply);
            Err(e)
        }
    }
}

/// Verify a Disconnect/CoA ACK or NAK against the request it answers (client side)
pub fn verify_das_response(
    response: &Packet,
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<(), DasAuthError> {
    let expected = calculate_response_authenticator(response, request_authenticator, secret)?;
    if !constant_time_eq(&response.authenticator, &expected) {
        return Err(DasAuthError::InvalidResponseAuthenticator);
    }

    verify_message_authenticator_with(response, request_authenticator, secret)
}

fn strip_message_authenticators(packet: &mut Packet) {
    packet
        .attributes
        .retain(|a| a.attr_type != AttributeType::MessageAuthenticator as u8);
}

/// Replace any Message-Authenticator with a fresh one computed over the
/// packet as it currently stands (authenticator field included)
fn insert_message_authenticator(packet: &mut Packet, secret: &[u8]) -> Result<(), PacketError> {
    strip_message_authenticators(packet);
    packet.add_attribute(Attribute::new(
        AttributeType::MessageAuthenticator as u8,
        vec![0u8; MESSAGE_AUTHENTICATOR_LENGTH],
    )?);

    let bytes = match packet.encode() {
        Ok(bytes) => bytes,
        Err(e) => {
            strip_message_authenticators(packet);
            return Err(e);
        }
    };

    let mac = calculate_message_authenticator(&bytes, secret);
    if let Some(attr) = packet.attributes.last_mut() {
        attr.value = mac.to_vec();
    }
    Ok(())
}

/// Check the Message-Authenticator (if any) with `authenticator` substituted
/// into the Authenticator field
fn verify_message_authenticator_with(
    packet: &Packet,
    authenticator: &[u8; 16],
    secret: &[u8],
) -> Result<(), DasAuthError> {
    let mut positions = packet
        .attributes
        .iter()
        .enumerate()
        .filter(|(_, a)| a.attr_type == AttributeType::MessageAuthenticator as u8)
        .map(|(i, _)| i);

    let Some(index) = positions.next() else {
        return Ok(());
    };
    if positions.next().is_some() {
        return Err(DasAuthError::MultipleMessageAuthenticators);
    }

    let received = &packet.attributes[index].value;
    if received.len() != MESSAGE_AUTHENTICATOR_LENGTH {
        return Err(DasAuthError::InvalidMessageAuthenticator);
    }

    let mut copy = packet.clone();
    copy.authenticator = *authenticator;
    copy.attributes[index].value = vec![0u8; MESSAGE_AUTHENTICATOR_LENGTH];
    let expected = calculate_message_authenticator(&copy.encode()?, secret);

    if constant_time_eq(received, &expected) {
        Ok(())
    } else {
        Err(DasAuthError::InvalidMessageAuthenticator)
    }
}
