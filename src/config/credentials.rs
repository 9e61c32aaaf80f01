//! Requester credentials.
//!
//! The secret key stays wrapped in [`SecretString`] so it never shows up in
//! `Debug` output or logs; it is only exposed to compute a signature.

pub use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
        }
    }
}
