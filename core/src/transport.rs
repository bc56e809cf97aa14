//! Blocking HTTP execution.
//!
//! # Design
//! `Transport` is the only seam that performs I/O. `UreqTransport` is the
//! production implementation; tests substitute scripted transports to observe
//! how many requests a call makes and with which trust anchors.
//!
//! Failures are classified with libcurl's error numbers, which is what users
//! of the other Parllay SDKs see in `CurlException` codes.

use std::error::Error as StdError;
use std::io;
use std::path::Path;

use thiserror::Error;
use ureq::tls::{PemItem, RootCerts, TlsConfig};
use ureq::Agent;

use crate::config::{ConfigError, TransportConfig};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Transport error codes, numbered as in libcurl.
pub mod codes {
    pub const URL_MALFORMAT: u32 = 3;
    pub const COULDNT_RESOLVE_HOST: u32 = 6;
    pub const COULDNT_CONNECT: u32 = 7;
    pub const OPERATION_TIMEDOUT: u32 = 28;
    pub const SSL_CONNECT_ERROR: u32 = 35;
    pub const TOO_MANY_REDIRECTS: u32 = 47;
    pub const RECV_ERROR: u32 = 56;
    /// The server certificate does not chain to a trusted root.
    pub const SSL_CACERT: u32 = 60;
}

/// Which root certificates a request is verified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trust {
    /// The roots compiled into the client.
    Default,
    /// The CA chain shipped with the deployment, or the OS verifier.
    Bundled,
}

/// A request that never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (transport error {code})")]
pub struct TransportError {
    pub code: u32,
    pub message: String,
}

impl TransportError {
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn is_untrusted_certificate(&self) -> bool {
        self.code == codes::SSL_CACERT
    }
}

/// Executes one HTTP exchange.
pub trait Transport {
    fn send(&self, request: &HttpRequest, trust: Trust) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest, trust: Trust) -> Result<HttpResponse, TransportError> {
        (**self).send(request, trust)
    }
}

/// `Transport` backed by two blocking ureq agents, one per trust setting.
///
/// Non-2xx statuses are returned as responses, not errors; the Parllay API
/// reports failures in the body.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    default_agent: Agent,
    bundled_agent: Agent,
}

impl UreqTransport {
    pub fn new(config: &TransportConfig) -> Result<Self, ConfigError> {
        let bundled_roots = match &config.ca_chain {
            Some(path) => load_ca_chain(path)?,
            None => RootCerts::PlatformVerifier,
        };
        Ok(Self {
            default_agent: build_agent(config, RootCerts::WebPki),
            bundled_agent: build_agent(config, bundled_roots),
        })
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &HttpRequest, trust: Trust) -> Result<HttpResponse, TransportError> {
        let agent = match trust {
            Trust::Default => &self.default_agent,
            Trust::Bundled => &self.bundled_agent,
        };

        let result = match request.method {
            HttpMethod::Get => with_headers(agent.get(&request.url), &request.headers).call(),
            HttpMethod::Head => with_headers(agent.head(&request.url), &request.headers).call(),
            HttpMethod::Post => {
                let body = request.body.as_deref().unwrap_or_default();
                with_headers(agent.post(&request.url), &request.headers).send(body.as_bytes())
            }
        };

        let mut response = result.map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_vec().map_err(classify)?;
        tracing::trace!(status, bytes = body.len(), ?trust, "received response");

        Ok(HttpResponse { status, body })
    }
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

fn build_agent(config: &TransportConfig, roots: RootCerts) -> Agent {
    Agent::config_builder()
        .timeout_connect(Some(config.connect_timeout))
        .timeout_global(Some(config.timeout))
        .user_agent(config.user_agent.as_str())
        .http_status_as_error(false)
        .tls_config(TlsConfig::builder().root_certs(roots).build())
        .build()
        .new_agent()
}

/// Load every certificate of a PEM chain as trust anchors.
fn load_ca_chain(path: &Path) -> Result<RootCerts, ConfigError> {
    let pem = std::fs::read(path).map_err(|source| ConfigError::CaChainRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut certs = Vec::new();
    for item in ureq::tls::parse_pem(&pem) {
        match item {
            Ok(PemItem::Certificate(cert)) => certs.push(cert.to_owned()),
            Ok(_) => {}
            Err(e) => {
                return Err(ConfigError::CaChainInvalid {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    if certs.is_empty() {
        return Err(ConfigError::CaChainInvalid {
            path: path.to_path_buf(),
            reason: "no certificates found".to_string(),
        });
    }
    tracing::debug!(path = %path.display(), count = certs.len(), "loaded CA chain");
    Ok(RootCerts::new_with_certs(&certs))
}

fn classify(err: ureq::Error) -> TransportError {
    let code = if is_untrusted_certificate(&err) {
        codes::SSL_CACERT
    } else {
        match &err {
            ureq::Error::BadUri(_) => codes::URL_MALFORMAT,
            ureq::Error::HostNotFound => codes::COULDNT_RESOLVE_HOST,
            ureq::Error::ConnectionFailed => codes::COULDNT_CONNECT,
            ureq::Error::Timeout(_) => codes::OPERATION_TIMEDOUT,
            ureq::Error::TooManyRedirects | ureq::Error::RedirectFailed => codes::TOO_MANY_REDIRECTS,
            ureq::Error::Tls(_) | ureq::Error::Rustls(_) => codes::SSL_CONNECT_ERROR,
            ureq::Error::Io(e) => match e.kind() {
                io::ErrorKind::ConnectionRefused => codes::COULDNT_CONNECT,
                io::ErrorKind::TimedOut => codes::OPERATION_TIMEDOUT,
                _ => codes::RECV_ERROR,
            },
            _ => codes::RECV_ERROR,
        }
    };
    TransportError::new(code, err.to_string())
}

/// Rustls errors surface either directly or wrapped in the I/O error of the
/// handshake.
fn is_untrusted_certificate(err: &ureq::Error) -> bool {
    match err {
        ureq::Error::Rustls(e) => is_unknown_issuer(e),
        ureq::Error::Io(e) => e.get_ref().is_some_and(|inner| chain_has_unknown_issuer(inner)),
        _ => false,
    }
}

fn chain_has_unknown_issuer(err: &(dyn StdError + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(tls) = e.downcast_ref::<rustls::Error>() {
            return is_unknown_issuer(tls);
        }
        if let Some(inner) = e.downcast_ref::<io::Error>().and_then(io::Error::get_ref) {
            let inner: &(dyn StdError + 'static) = inner;
            current = Some(inner);
            continue;
        }
        current = e.source();
    }
    false
}

fn is_unknown_issuer(err: &rustls::Error) -> bool {
    matches!(
        err,
        rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_issuer_inside_io_error_is_untrusted() {
        let tls = rustls::Error::InvalidCertificate(rustls::CertificateError::UnknownIssuer);
        let err = ureq::Error::Io(io::Error::new(io::ErrorKind::InvalidData, tls));
        let classified = classify(err);
        assert_eq!(classified.code, codes::SSL_CACERT);
        assert!(classified.is_untrusted_certificate());
    }

    #[test]
    fn other_certificate_errors_are_not_untrusted() {
        let tls = rustls::Error::InvalidCertificate(rustls::CertificateError::Expired);
        let err = ureq::Error::Io(io::Error::new(io::ErrorKind::InvalidData, tls));
        assert!(!is_untrusted_certificate(&err));
    }

    #[test]
    fn io_errors_map_to_curl_codes() {
        let refused = ureq::Error::Io(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert_eq!(classify(refused).code, codes::COULDNT_CONNECT);

        let reset = ureq::Error::Io(io::Error::from(io::ErrorKind::ConnectionReset));
        assert_eq!(classify(reset).code, codes::RECV_ERROR);
    }

    #[test]
    fn named_failures_map_to_curl_codes() {
        assert_eq!(classify(ureq::Error::HostNotFound).code, codes::COULDNT_RESOLVE_HOST);
        assert_eq!(classify(ureq::Error::ConnectionFailed).code, codes::COULDNT_CONNECT);
        assert_eq!(classify(ureq::Error::TooManyRedirects).code, codes::TOO_MANY_REDIRECTS);
    }

    #[test]
    fn missing_ca_chain_fails_construction() {
        let config = TransportConfig {
            ca_chain: Some("/nonexistent/parllay_ca_chain.crt".into()),
            ..TransportConfig::default()
        };
        let err = UreqTransport::new(&config).unwrap_err();
        assert!(matches!(err, ConfigError::CaChainRead { .. }));
    }

    #[test]
    fn ca_chain_fixture_loads() {
        let path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/ca.pem");
        assert!(load_ca_chain(&path).is_ok());

        let config = TransportConfig {
            ca_chain: Some(path),
            ..TransportConfig::default()
        };
        assert!(UreqTransport::new(&config).is_ok());
    }

    #[test]
    fn ca_chain_without_certificates_is_rejected() {
        let path = std::env::temp_dir().join(format!("parllay-empty-chain-{}.pem", std::process::id()));
        std::fs::write(&path, "not a certificate\n").unwrap();
        let config = TransportConfig {
            ca_chain: Some(path.clone()),
            ..TransportConfig::default()
        };
        let err = UreqTransport::new(&config).unwrap_err();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(err, ConfigError::CaChainInvalid { .. }));
    }
}
