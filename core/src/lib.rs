//! Synchronous client for the Parllay REST API.
//!
//! # Overview
//! One call maps to one outbound HTTP request: the client resolves the base
//! URL for the current environment, serializes the parameters, attaches the
//! app credentials, sends the request through a `Transport` and turns the
//! response into either a decoded JSON value or an `ApiError`.
//!
//! # Design
//! - `Client::build_request` and `Client::parse_response` are pure; only the
//!   `Transport` touches the network, so the request shape and the error
//!   translation are testable without a server.
//! - `UreqTransport` is the default transport: blocking, fixed timeouts, one
//!   retry with bundled trust anchors when the server certificate is
//!   rejected.
//! - Every failure is an `ApiError` with a `code`, `message` and
//!   `error_type`; configuration problems are reported by `ConfigError` at
//!   construction time.
//!
//! ```no_run
//! use parllay::{ApiRequest, Client, ClientConfig, HttpMethod};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::new(ClientConfig::new("app-id", "app-secret"))?;
//! let me = client.api(&ApiRequest::new("/me"))?;
//! let posted = client.api(
//!     &ApiRequest::new("me/feed")
//!         .with_method(HttpMethod::Post)
//!         .with_param("message", "hello"),
//! )?;
//! # let _ = (me, posted);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

pub use client::Client;
pub use config::{ClientConfig, ConfigError, Credentials, Endpoints, TransportConfig};
pub use error::{ApiError, ErrorEnvelope};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use transport::{Transport, TransportError, Trust, UreqTransport};
pub use types::{ApiRequest, Params};
