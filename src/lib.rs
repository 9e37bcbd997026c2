//! # mwaction
//! Fluent client for the MediaWiki action API: an immutable request builder
//! with submodule-aware parameter dispatch, a content/metadata response
//! envelope, and a reqwest transport.
//!
//! ```no_run
//! use mwaction::{HttpTransport, RequestBuilder};
//!
//! # async fn demo() -> Result<(), mwaction::Error> {
//! let transport = HttpTransport::new("https://en.wikipedia.org/w/api.php")?;
//! let envelope = RequestBuilder::query()
//!     .append("list", "search")?
//!     .set("search", "rust language")?
//!     .set("limit", 10)?
//!     .build_response(&transport)
//!     .await?;
//! println!("{:?}", envelope.content());
//! # Ok(())
//! # }
//! ```

pub mod action;
pub mod builder;
pub mod error;
pub mod params;
pub mod response;
pub mod transport;
pub mod types;
mod util;

pub use action::{Action, Verb};
pub use builder::{BuildError, RequestBuilder};
pub use error::Error;
pub use params::Capability;
pub use response::{ApiError, ResponseEnvelope, ResponseError};
pub use transport::http::HttpTransport;
pub use transport::{Transport, TransportError};
pub use types::{AssertType, LoginCredential, SiteProfile};
pub use util::concat_params;
