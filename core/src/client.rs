//! Parllay API client.
//!
//! # Design
//! A call is split the same way as the transport types: `build_request` turns
//! an `ApiRequest` into an `HttpRequest`, a `Transport` executes it, and
//! `parse_response` turns the `HttpResponse` into a JSON value or an
//! `ApiError`. Building and parsing are pure, so the only I/O is the
//! `Transport::send` call in `execute`.
//!
//! Credentials and the sandbox flag are read when each request is built.
//! Setters take `&mut self`, so they cannot race an in-flight call on the same
//! instance; callers sharing a client across threads own the locking.

use std::fmt;

use serde_json::Value;

use crate::config::{
    ClientConfig, ConfigError, Credentials, Endpoints, APP_ID_HEADER, APP_SECRET_HEADER,
};
use crate::error::{check_envelope, decode_body, ApiError};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::transport::{Transport, Trust, UreqTransport};
use crate::types::{ApiRequest, Params};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Synchronous client for the Parllay REST API.
pub struct Client<T = UreqTransport> {
    credentials: Credentials,
    sandbox: bool,
    endpoints: Endpoints,
    transport: T,
}

impl Client<UreqTransport> {
    /// Build a client with the default ureq transport.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        let transport = UreqTransport::new(&config.transport)?;
        Self::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Self, ConfigError> {
        Ok(Self {
            credentials: config.credentials()?,
            sandbox: config.sandbox,
            endpoints: config.endpoints,
            transport,
        })
    }

    pub fn app_id(&self) -> &str {
        self.credentials.app_id()
    }

    pub fn set_app_id(&mut self, app_id: impl Into<String>) -> Result<(), ConfigError> {
        self.credentials.set_app_id(app_id.into())
    }

    pub fn app_secret(&self) -> &str {
        self.credentials.app_secret()
    }

    pub fn set_app_secret(&mut self, app_secret: impl Into<String>) -> Result<(), ConfigError> {
        self.credentials.set_app_secret(app_secret.into())
    }

    pub fn in_sandbox(&self) -> bool {
        self.sandbox
    }

    pub fn set_sandbox(&mut self, sandbox: bool) {
        self.sandbox = sandbox;
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Base URL for the current environment.
    pub fn base_url(&self) -> &str {
        self.endpoints.base_url(self.sandbox)
    }

    /// Perform one API call and return the decoded response.
    pub fn api(&self, request: &ApiRequest) -> Result<Value, ApiError> {
        let http = self.build_request(request)?;
        tracing::debug!(method = %http.method, path = %request.path, sandbox = self.sandbox, "calling Parllay API");
        let response = self.execute(&http)?;
        self.parse_response(response)
    }

    /// Perform one API call from loosely typed arguments.
    ///
    /// See [`ApiRequest::from_values`] for how the arguments are read. Invalid
    /// arguments fail before anything is sent.
    pub fn api_value(
        &self,
        path: &Value,
        method_or_params: Option<&Value>,
        params: Option<&Value>,
    ) -> Result<Value, ApiError> {
        let request = ApiRequest::from_values(path, method_or_params, params)?;
        self.api(&request)
    }

    pub fn get(&self, path: &str, params: Params) -> Result<Value, ApiError> {
        self.api(&ApiRequest::new(path).with_params(params))
    }

    pub fn post(&self, path: &str, params: Params) -> Result<Value, ApiError> {
        self.api(&ApiRequest::new(path).with_method(HttpMethod::Post).with_params(params))
    }

    /// Resolve the URL, headers and body for `request` without sending it.
    ///
    /// GET and HEAD carry the parameters in the query string, POST as a form
    /// body. Exactly one leading slash is stripped from the path.
    pub fn build_request(&self, request: &ApiRequest) -> Result<HttpRequest, ApiError> {
        let mut url = self.base_url().to_string();
        url.push_str(request.path.strip_prefix('/').unwrap_or(&request.path));

        let params = request.params.normalized();
        let encoded = serde_urlencoded::to_string(&params).map_err(|_| ApiError::invalid_params())?;

        let mut headers = vec![
            (APP_ID_HEADER.to_string(), self.credentials.app_id().to_string()),
            (APP_SECRET_HEADER.to_string(), self.credentials.app_secret().to_string()),
        ];

        let body = match request.method {
            HttpMethod::Get | HttpMethod::Head => {
                if !encoded.is_empty() {
                    url.push('?');
                    url.push_str(&encoded);
                }
                None
            }
            HttpMethod::Post => {
                headers.push(("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()));
                Some(encoded)
            }
        };

        Ok(HttpRequest {
            method: request.method,
            url,
            headers,
            body,
        })
    }

    /// Decode a response body and translate an error envelope.
    pub fn parse_response(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let result = decode_body(&response.body)?;
        check_envelope(result).inspect_err(|err| {
            tracing::debug!(status = response.status, error = %err, "Parllay API returned an error");
        })
    }

    /// Send `request`, retrying once with the bundled trust anchors if the
    /// server certificate was rejected.
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = match self.transport.send(request, Trust::Default) {
            Err(err) if err.is_untrusted_certificate() => {
                tracing::debug!(error = %err, "server certificate rejected, retrying with bundled CA chain");
                self.transport.send(request, Trust::Bundled)
            }
            other => other,
        };
        response.map_err(|err| {
            tracing::debug!(code = err.code, error = %err.message, "transport failed");
            ApiError::from(err)
        })
    }
}

impl<T> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("credentials", &self.credentials)
            .field("sandbox", &self.sandbox)
            .field("endpoints", &self.endpoints)
            .finish_non_exhaustive()
    }
}
