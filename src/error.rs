//! Crate-level error type unifying the three failure layers: building a
//! request, moving it over the wire, and interpreting what came back.

use std::error::Error as StdError;
use std::fmt;

use crate::builder::BuildError;
use crate::response::{ApiError, ResponseError};
use crate::transport::TransportError;

#[derive(Debug)]
pub enum Error {
    Build(BuildError),
    Transport(TransportError),
    Response(ResponseError),
    /// A token request came back without the expected token field.
    MissingToken(String),
    /// `action=login` reported anything other than `Success`.
    LoginFailure(String),
}

impl StdError for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Build(e) => e.fmt(f),
            Self::Transport(e) => e.fmt(f),
            Self::Response(e) => e.fmt(f),
            Self::MissingToken(kind) => {
                f.write_fmt(format_args!("API response did not contain a {} token", kind))
            }
            Self::LoginFailure(reason) => {
                f.write_fmt(format_args!("login failed: {}", reason))
            }
        }
    }
}

impl From<BuildError> for Error {
    fn from(e: BuildError) -> Self {
        Self::Build(e)
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

impl From<ResponseError> for Error {
    fn from(e: ResponseError) -> Self {
        Self::Response(e)
    }
}

impl From<ApiError> for Error {
    fn from(e: ApiError) -> Self {
        Self::Response(ResponseError::Api(e))
    }
}

impl Error {
    /// The API-reported error, if that is what this failure is.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Response(ResponseError::Api(e)) => Some(e),
            _ => None,
        }
    }
}
