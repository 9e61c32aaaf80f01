//! Request signing.
//!
//! Signature = Base64(HMAC-SHA1(secret, Service + Operation + Timestamp)).

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Timestamp format the service expects.
pub fn timestamp(now: DateTime<Utc>) -> String {
    now.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

pub fn sign(
    secret: &SecretString,
    service: &str,
    operation: &str,
    timestamp: &str,
) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.expose_secret().as_bytes())
        .map_err(|e| Error::Config(format!("unusable secret key: {e}")))?;
    mac.update(service.as_bytes());
    mac.update(operation.as_bytes());
    mac.update(timestamp.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}
