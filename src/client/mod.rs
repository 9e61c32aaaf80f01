//! Requester API client.
//!
//! A [`Client`] turns an operation name and parameters into a call on its
//! [`Transport`] and decodes the answer. Typed methods (see the
//! `operations` module) validate the result at the boundary: the result
//! element must be present, `Request.IsValid` must be `True`, and the fields
//! the typed value needs must be there. [`Client::req`] skips all of that and
//! hands back the raw [`Document`].

mod config;
mod operations;

use std::sync::Arc;

use tracing::debug;

pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use reqwest::Url;

use crate::error::{Error, Result};
use crate::model::response::{FromResult, RequestStatus};
use crate::model::{Document, Operation, Params};
use crate::transport::{HttpTransport, Transport};

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("transport", &self.transport.describe())
            .finish()
    }
}

impl Client {
    /// Client over the signed HTTP transport.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    /// Client over any transport, e.g. [`FakeMTurk`](crate::transport::fake::FakeMTurk).
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    /// Invoke any operation by wire name and return the undecoded response.
    ///
    /// Names the client has no typed method for are sent as-is; their
    /// result sits under `"<Name>Result"`.
    pub async fn req(&self, operation: &str, params: impl Into<Params>) -> Result<Document> {
        self.transport.call(operation, &params.into()).await
    }

    /// Invoke `operation` and decode its first result element as `T`.
    ///
    /// # Errors
    ///
    /// [`Error::Rejected`] when the service answered `IsValid = False`,
    /// [`Error::MalformedResponse`] when the answer lacks what `T` needs.
    pub async fn call<T: FromResult>(&self, operation: Operation, params: Params) -> Result<T> {
        let name = operation.as_str();
        let doc = self.transport.call(name, &params).await?;
        let el = doc.result(operation.result_key())?;
        let status = RequestStatus::from_result(name, el)?;
        if !status.is_valid {
            debug!(operation = name, errors = status.errors.len(), "request rejected");
            return Err(Error::Rejected {
                operation: name.to_string(),
                errors: status.errors,
            });
        }
        T::from_result(name, el)
    }
}

/// Build a client for the endpoint named in `config`.
pub fn create_client(config: &ClientConfig) -> Result<Client> {
    Client::new(config)
}

/// Older constructor name, kept so existing callers still build.
#[deprecated(note = "use create_client")]
pub fn connect(config: &ClientConfig) -> Result<Client> {
    create_client(config)
}
