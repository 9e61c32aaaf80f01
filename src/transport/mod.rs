//! How a client reaches the requester service.
//!
//! [`HttpTransport`] signs and sends real requests; [`fake::FakeMTurk`]
//! answers in-process with documents of the same shape.

pub mod fake;
pub mod http;
pub mod signing;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{Document, Params};

pub use http::{HttpTransport, ThrottleConfig};

/// Error code the service uses when a caller exceeds its request rate.
pub const SERVICE_UNAVAILABLE: &str = "AWS.ServiceUnavailable";

/// Service name every request is signed for.
pub const SERVICE: &str = "AWSMechanicalTurkRequester";

/// API version requested on every call.
pub const API_VERSION: &str = "2014-08-15";

#[async_trait]
pub trait Transport: Send + Sync {
    /// Invoke `operation` and return the decoded response document.
    ///
    /// Failures of the call as a whole (transport, authentication,
    /// throttling) are errors; per-request validation results are left in
    /// the document for the caller to inspect.
    async fn call(&self, operation: &str, params: &Params) -> Result<Document>;

    /// Short description for logs, e.g. the endpoint URL.
    fn describe(&self) -> String;
}
