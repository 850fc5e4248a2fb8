//! Message-Authenticator Support (RFC 2869 Section 5.14, RFC 3579 Section 3.2)
//!
//! Message-Authenticator is HMAC-MD5 keyed with the shared secret, computed
//! over the whole packet with the Message-Authenticator value set to zeros.
//! Which value sits in the Authenticator field during the computation depends
//! on the packet; see [`crate::das`] for the Disconnect/CoA rules.

use hmac::{Hmac, Mac};
use md5_digest::Md5;

type HmacMd5 = Hmac<Md5>;

/// Length of the Message-Authenticator value
pub const MESSAGE_AUTHENTICATOR_LENGTH: usize = 16;

/// Calculate Message-Authenticator for a RADIUS packet
///
/// `packet_bytes` must already have the Message-Authenticator value zeroed.
pub fn calculate_message_authenticator(packet_bytes: &[u8], secret: &[u8]) -> [u8; 16] {
    let mut mac = HmacMd5::new_from_slice(secret).expect("HMAC can take key of any size");
    mac.update(packet_bytes);

    let mut output = [0u8; MESSAGE_AUTHENTICATOR_LENGTH];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}
