//! HTTP transport types for the Parllay client.
//!
//! # Design
//! Requests and responses are plain data. `Client::build_request` produces an
//! `HttpRequest` and `Client::parse_response` consumes an `HttpResponse`
//! without touching the network; only a `Transport` performs I/O. This keeps
//! URL, header and body construction deterministic and testable on its own.

use std::fmt;

/// HTTP methods accepted by the Parllay API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Head,
}

impl HttpMethod {
    /// Parse a method name case-insensitively.
    ///
    /// Anything other than GET, POST or HEAD falls back to GET rather than
    /// failing; existing callers rely on that leniency.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "POST" => HttpMethod::Post,
            "HEAD" => HttpMethod::Head,
            _ => HttpMethod::Get,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Head => "HEAD",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request: absolute URL, headers and optional form body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

impl HttpRequest {
    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The raw outcome of a request that reached the server.
///
/// The status is informational only: the Parllay API reports failures through
/// the JSON error envelope, so the body is decoded whatever the status. The
/// body is kept as raw bytes; text decoding belongs to the JSON parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(HttpMethod::parse("post"), HttpMethod::Post);
        assert_eq!(HttpMethod::parse("Head"), HttpMethod::Head);
        assert_eq!(HttpMethod::parse("GET"), HttpMethod::Get);
    }

    #[test]
    fn unknown_methods_fall_back_to_get() {
        assert_eq!(HttpMethod::parse("DELETE"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse("put"), HttpMethod::Get);
        assert_eq!(HttpMethod::parse(""), HttpMethod::Get);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "https://api.parllay.com/1.0/me".to_string(),
            headers: vec![("X-Parllay-App-Id".to_string(), "app".to_string())],
            body: None,
        };
        assert_eq!(req.header("x-parllay-app-id"), Some("app"));
        assert_eq!(req.header("x-parllay-app-secret"), None);
    }
}
