//! Shared-access-signature tokens for device hub pushes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::Utc;
use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::Sha256;

use super::BridgeError;

/// Everything except ASCII alphanumerics and `-`, `.`, `_`, `~` is escaped.
const QUOTED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn quote(s: &str) -> String {
    utf8_percent_encode(s, QUOTED).to_string()
}

/// Sign a hub resource URI, valid for `ttl_secs` from now.
///
/// `key` is the base64-encoded shared-access key; `key_name` lands in the
/// token's `skn` field.
pub fn sign_resource(
    resource_uri: &str,
    key: &str,
    key_name: &str,
    ttl_secs: u64,
) -> Result<String, BridgeError> {
    let expiry = Utc::now().timestamp() + ttl_secs as i64;
    sign_with_expiry(resource_uri, key, key_name, expiry)
}

/// Sign with an explicit expiry (unix seconds).
///
/// The signature is HMAC-SHA256 over `urlEncode(resourceUri) + "\n" + expiry`
/// using the base64-decoded key, itself base64-encoded into the token.
pub fn sign_with_expiry(
    resource_uri: &str,
    key: &str,
    key_name: &str,
    expiry: i64,
) -> Result<String, BridgeError> {
    let key_bytes = BASE64
        .decode(key)
        .map_err(|e| BridgeError::Signing(format!("shared-access key is not base64: {e}")))?;
    let quoted_uri = quote(resource_uri);
    let to_sign = format!("{quoted_uri}\n{expiry}");

    let mut mac = Hmac::<Sha256>::new_from_slice(&key_bytes)
        .map_err(|e| BridgeError::Signing(e.to_string()))?;
    mac.update(to_sign.as_bytes());
    let signature = BASE64.encode(mac.finalize().into_bytes());

    Ok(format!(
        "SharedAccessSignature sr={quoted_uri}&sig={}&se={expiry}&skn={key_name}",
        quote(&signature)
    ))
}
