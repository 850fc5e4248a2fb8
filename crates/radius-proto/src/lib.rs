//! RADIUS Protocol Implementation for Dynamic Authorization
//!
//! This crate provides the RADIUS wire codec and the authenticator rules
//! needed by an RFC 5176 Dynamic Authorization Server.
//!
//! # Features
//!
//! - Packet encoding and decoding (RFC 2865 framing)
//! - Disconnect and CoA packet codes, Error-Cause values
//! - Request Authenticator verification and reply signing (RFC 5176 Section 3.5)
//! - HMAC-MD5 Message-Authenticator (RFC 2869)
//!
//! # Example
//!
//! ```rust
//! use radius_proto::{Attribute, AttributeType, Code, Packet};
//! use radius_proto::das::{sign_das_request, verify_das_request};
//!
//! let mut packet = Packet::new(Code::CoaRequest, 1, [0u8; 16]);
//! packet.add_attribute(
//!     Attribute::string(AttributeType::AcctSessionId as u8, "0000002A").unwrap()
//! );
//! sign_das_request(&mut packet, b"secret").unwrap();
//!
//! let bytes = packet.encode().unwrap();
//! let decoded = Packet::decode(&bytes).unwrap();
//! assert!(verify_das_request(&decoded, b"secret").is_ok());
//! ```

pub mod attributes;
pub mod auth;
pub mod das;
pub mod message_auth;
pub mod packet;

pub use attributes::{Attribute, AttributeType};
pub use auth::{calculate_das_request_authenticator, calculate_response_authenticator};
pub use das::{
    finish_das_response, sign_das_request, verify_das_request, verify_das_response, DasAuthError,
    ErrorCause,
};
pub use message_auth::calculate_message_authenticator;
pub use packet::{Code, Packet, PacketError};
