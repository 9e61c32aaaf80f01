//! Signed HTTP transport.
//!
//! Requests are form-encoded POSTs carrying the common parameters
//! (`Service`, `AWSAccessKeyId`, `Version`, `Operation`, `Timestamp`,
//! `Signature`) followed by the flattened operation parameters. Responses
//! are XML documents.
//!
//! Outgoing calls pass through a client-side rate limiter; a throttled
//! answer (HTTP 503 or `AWS.ServiceUnavailable`) is retried with
//! exponential backoff.

use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use opentelemetry::KeyValue;
use reqwest::{StatusCode, Url};
use tracing::{Instrument, debug, warn};

use super::{API_VERSION, SERVICE, SERVICE_UNAVAILABLE, Transport, signing};
use crate::client::ClientConfig;
use crate::config::Credentials;
use crate::error::{Error, Result};
use crate::model::response::ServiceError;
use crate::model::{Document, Params};
use crate::telemetry::{metrics, request};

/// Client-side pacing and retry settings.
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    pub requests_per_second: NonZeroU32,
    /// Retries after the first throttled attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_backoff: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_second: NonZeroU32::new(5).unwrap_or(NonZeroU32::MIN),
            max_retries: 3,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl ThrottleConfig {
    /// Delay before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}

pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    limiter: DefaultDirectRateLimiter,
    throttle: ThrottleConfig,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("mturk-rs/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let throttle = config.throttle().clone();
        Ok(Self {
            http,
            base_url: config.base_url()?,
            credentials: config.credentials().clone(),
            limiter: RateLimiter::direct(Quota::per_second(throttle.requests_per_second)),
            throttle,
        })
    }

    fn form(&self, operation: &str, params: &Params) -> Result<Vec<(String, String)>> {
        let timestamp = signing::timestamp(Utc::now());
        let signature = signing::sign(
            &self.credentials.secret_access_key,
            SERVICE,
            operation,
            &timestamp,
        )?;
        let mut form = vec![
            ("Service".to_string(), SERVICE.to_string()),
            (
                "AWSAccessKeyId".to_string(),
                self.credentials.access_key_id.clone(),
            ),
            ("Version".to_string(), API_VERSION.to_string()),
            ("Operation".to_string(), operation.to_string()),
            ("Timestamp".to_string(), timestamp),
            ("Signature".to_string(), signature),
        ];
        form.extend(params.flatten());
        Ok(form)
    }

    async fn send_once(&self, operation: &str, params: &Params) -> Result<Document> {
        self.limiter.until_ready().await;
        let form = self.form(operation, params)?;
        let response = self
            .http
            .post(self.base_url.clone())
            .form(&form)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(operation, %status, bytes = body.len(), "response received");
        interpret(operation, status, &body)
    }
}

/// Turn a raw HTTP answer into a document or a call-level error.
fn interpret(operation: &str, status: StatusCode, body: &str) -> Result<Document> {
    if status == StatusCode::SERVICE_UNAVAILABLE {
        return Err(Error::Api {
            operation: operation.to_string(),
            code: SERVICE_UNAVAILABLE.to_string(),
            message: "service unavailable".to_string(),
        });
    }
    let doc = match Document::parse(operation, body) {
        Ok(doc) => doc,
        Err(_) if !status.is_success() => {
            return Err(Error::Api {
                operation: operation.to_string(),
                code: format!("HTTP {}", status.as_u16()),
                message: body.chars().take(200).collect(),
            });
        }
        Err(e) => return Err(e),
    };
    if let Some(errors) = doc.errors() {
        let first = ServiceError::from_errors(errors)
            .into_iter()
            .next()
            .unwrap_or_else(|| ServiceError {
                code: format!("HTTP {}", status.as_u16()),
                message: "unspecified error".to_string(),
            });
        return Err(Error::Api {
            operation: operation.to_string(),
            code: first.code,
            message: first.message,
        });
    }
    if !status.is_success() {
        return Err(Error::Api {
            operation: operation.to_string(),
            code: format!("HTTP {}", status.as_u16()),
            message: body.chars().take(200).collect(),
        });
    }
    Ok(doc)
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(&self, operation: &str, params: &Params) -> Result<Document> {
        let span = request::start_request_span(operation, self.base_url.as_str());
        let started = Instant::now();

        let result = async {
            let mut attempt = 0u32;
            loop {
                attempt += 1;
                match self.send_once(operation, params).await {
                    Err(e) if e.is_throttling() && attempt <= self.throttle.max_retries => {
                        let delay = self.throttle.backoff(attempt);
                        warn!(operation, attempt, delay_ms = delay.as_millis() as u64, "throttled, backing off");
                        metrics::retries()
                            .add(1, &[KeyValue::new("operation", operation.to_string())]);
                        tokio::time::sleep(delay).await;
                    }
                    Err(e) if e.is_throttling() => {
                        break (
                            attempt,
                            Err(Error::Throttled {
                                operation: operation.to_string(),
                                attempts: attempt,
                            }),
                        );
                    }
                    other => break (attempt, other),
                }
            }
        }
        .instrument(span.clone())
        .await;

        let (attempts, result) = result;
        request::record_attempts(&span, attempts);
        if let Ok(doc) = &result {
            if let Some(id) = doc.request_id() {
                request::record_request_id(&span, id);
            }
        }
        let outcome = match &result {
            Ok(_) => "ok",
            Err(e) => e.kind(),
        };
        metrics::requests().add(
            1,
            &[
                KeyValue::new("operation", operation.to_string()),
                KeyValue::new("result", outcome),
            ],
        );
        metrics::request_duration_ms().record(
            started.elapsed().as_secs_f64() * 1000.0,
            &[KeyValue::new("operation", operation.to_string())],
        );
        result
    }

    fn describe(&self) -> String {
        self.base_url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_per_retry() {
        let throttle = ThrottleConfig {
            base_backoff: Duration::from_millis(100),
            ..ThrottleConfig::default()
        };
        assert_eq!(throttle.backoff(1), Duration::from_millis(100));
        assert_eq!(throttle.backoff(2), Duration::from_millis(200));
        assert_eq!(throttle.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn service_unavailable_status_is_throttling() {
        let err = interpret("SearchHITs", StatusCode::SERVICE_UNAVAILABLE, "").unwrap_err();
        assert!(err.is_throttling());
    }

    #[test]
    fn top_level_errors_become_api_errors() {
        let body = "<GetHITResponse><OperationRequest><RequestId>r</RequestId><Errors><Error>\
                    <Code>AWS.NotAuthorized</Code><Message>The identity is not authorized.</Message>\
                    </Error></Errors></OperationRequest></GetHITResponse>";
        match interpret("GetHIT", StatusCode::OK, body).unwrap_err() {
            Error::Api { code, message, .. } => {
                assert_eq!(code, "AWS.NotAuthorized");
                assert_eq!(message, "The identity is not authorized.");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn throttling_error_code_in_body_is_retryable() {
        let body = "<Response><Errors><Error><Code>AWS.ServiceUnavailable</Code>\
                    <Message>slow down</Message></Error></Errors></Response>";
        let err = interpret("SearchHITs", StatusCode::OK, body).unwrap_err();
        assert!(err.is_throttling());
    }

    #[test]
    fn non_xml_error_bodies_keep_the_status() {
        match interpret("GetHIT", StatusCode::FORBIDDEN, "denied").unwrap_err() {
            Error::Api { code, .. } => assert_eq!(code, "HTTP 403"),
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn xml_error_pages_without_errors_keep_the_status() {
        let body = "<Error><Reason>gateway</Reason></Error>";
        match interpret("GetHIT", StatusCode::BAD_GATEWAY, body).unwrap_err() {
            Error::Api { code, message, .. } => {
                assert_eq!(code, "HTTP 502");
                assert!(message.contains("gateway"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn default_quota_is_five_per_second() {
        let throttle = ThrottleConfig::default();
        assert_eq!(throttle.requests_per_second.get(), 5);
        assert_eq!(throttle.max_retries, 3);
        assert_eq!(throttle.base_backoff, Duration::from_millis(500));
    }

    #[test]
    fn valid_documents_pass_through() {
        let body = "<GetHITResponse><HIT><Request><IsValid>True</IsValid></Request>\
                    <HITId>H1</HITId></HIT></GetHITResponse>";
        let doc = interpret("GetHIT", StatusCode::OK, body).unwrap();
        assert_eq!(doc.result("HIT").unwrap().child_text("HITId"), Some("H1"));
    }
}
