//! Settings a client is built from.

use std::num::NonZeroU32;
use std::time::Duration;

use reqwest::Url;

use crate::config::{Credentials, Endpoint};
use crate::error::{Error, Result};
use crate::transport::ThrottleConfig;

/// Default per-request timeout of the HTTP transport.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything a client needs to reach one requester endpoint.
///
/// The endpoint is a required argument; there is no implicit sandbox or
/// production default.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    credentials: Credentials,
    endpoint: Endpoint,
    base_url: Option<Url>,
    throttle: ThrottleConfig,
    timeout: Duration,
}

impl ClientConfig {
    pub fn new(credentials: Credentials, endpoint: Endpoint) -> Self {
        Self {
            credentials,
            endpoint,
            base_url: None,
            throttle: ThrottleConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Send requests to `url` instead of the endpoint's URL (local mocks).
    pub fn with_base_url(mut self, url: Url) -> Self {
        self.base_url = Some(url);
        self
    }

    pub fn with_requests_per_second(mut self, rate: NonZeroU32) -> Self {
        self.throttle.requests_per_second = rate;
        self
    }

    pub fn with_throttle(mut self, throttle: ThrottleConfig) -> Self {
        self.throttle = throttle;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    /// The URL requests are posted to.
    pub fn base_url(&self) -> Result<Url> {
        match &self.base_url {
            Some(url) => Ok(url.clone()),
            None => Url::parse(self.endpoint.url())
                .map_err(|e| Error::Config(format!("bad endpoint URL: {e}"))),
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn throttle(&self) -> &ThrottleConfig {
        &self.throttle
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
