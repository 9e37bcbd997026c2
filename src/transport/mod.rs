//! The transport seam between the builder and the network.
//!
//! [`RequestBuilder`](crate::RequestBuilder) is pure; everything that
//! touches HTTP goes through a [`Transport`]. Tests substitute their own
//! implementations, real callers use [`http::HttpTransport`].

pub mod http;

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::future::Future;

#[derive(Debug)]
pub enum TransportError {
    /// Network or protocol failure below the API.
    Http(reqwest::Error),
    /// The endpoint answered with a non-2xx status.
    Status(u16),
    /// The endpoint URL did not parse.
    Endpoint(url::ParseError),
}

impl StdError for TransportError {}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http(e) => e.fmt(f),
            Self::Status(code) => f.write_fmt(format_args!("HTTP status {}", code)),
            Self::Endpoint(e) => e.fmt(f),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e)
    }
}

impl From<url::ParseError> for TransportError {
    fn from(e: url::ParseError) -> Self {
        Self::Endpoint(e)
    }
}

/// One HTTP exchange with the configured endpoint: submit the parameter
/// map, hand back the raw response body.
pub trait Transport: Send + Sync {
    fn get(
        &self,
        params: &HashMap<String, String>,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    fn post(
        &self,
        params: &HashMap<String, String>,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}
