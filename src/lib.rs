//! # mturk-rs
//!
//! Typed client for the Amazon Mechanical Turk requester API and a
//! conformance suite that walks it through the HIT lifecycle, qualification
//! management and worker operations against the sandbox.
//!
//! Provides a signed, rate-limited HTTP transport, an in-memory fake of the
//! service for offline runs, and OpenTelemetry observability.

pub mod client;
pub mod config;
pub mod error;
pub mod fixture;
pub mod model;
pub mod suite;
pub mod telemetry;
pub mod transport;

#[allow(deprecated)]
pub use client::connect;
pub use client::{Client, ClientConfig, create_client};
pub use error::{Error, Result};
