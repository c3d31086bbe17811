//! Session cookie signatures
//!
//! A signed cookie value is `session_id + "--" + signature`, where the
//! signature is the unpadded URL-safe base64 encoding of
//! HMAC-SHA256(session_id, secret).

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const SEPARATOR: &str = "--";

/// Length of a base64-encoded SHA-256 MAC without padding
const SIGNATURE_LEN: usize = 43;

fn mac_for(value: &str, secret: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(value.as_bytes());
    mac
}

/// Sign a session ID with `secret`
pub fn sign(value: &str, secret: &str) -> String {
    let signature = URL_SAFE_NO_PAD.encode(mac_for(value, secret).finalize().into_bytes());
    format!("{}{}{}", value, SEPARATOR, signature)
}

/// Verify a signed value against one secret, returning the session ID
pub fn unsign(signed_value: &str, secret: &str) -> Option<String> {
    // Both the ID and the signature may contain '-', so split at the fixed signature width.
    let split_at = signed_value.len().checked_sub(SIGNATURE_LEN + SEPARATOR.len())?;
    if !signed_value.is_char_boundary(split_at) {
        return None;
    }
    let (value, rest) = signed_value.split_at(split_at);
    let signature = rest.strip_prefix(SEPARATOR)?;
    let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

    // verify_slice compares in constant time
    mac_for(value, secret)
        .verify_slice(&signature)
        .ok()
        .map(|_| value.to_string())
}

/// Verify a signed value against each secret in turn
///
/// The first secret signs new cookies; older ones stay here while cookies
/// signed with them are still in circulation.
pub fn unsign_with_secrets(signed_value: &str, secrets: &[String]) -> Option<String> {
    secrets
        .iter()
        .find_map(|secret| unsign(signed_value, secret))
}
