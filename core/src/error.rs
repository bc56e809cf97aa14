//! Error types and response translation for the Parllay client.
//!
//! # Design
//! Every failure a caller can see is an `ApiError`, whatever its origin:
//! misuse caught before any I/O, a transport failure, the service's own error
//! envelope, or an undecodable body. All of them expose the same
//! `code` / `message` / `error_type` triple and render the same way, so callers
//! can log or match them uniformly.
//!
//! The service signals application-level failures inside 200-class responses
//! with an `{"error": ...}` envelope whose payload is either a structured
//! object or an arbitrary value. `ErrorEnvelope` is that sum type.

use serde_json::Value;
use thiserror::Error;

use crate::transport::TransportError;

/// Error type reported for caller misuse (bad path or parameters).
pub const USAGE_ERROR_TYPE: &str = "ParllayApiException";

/// Error type reported when the HTTP exchange itself failed.
pub const TRANSPORT_ERROR_TYPE: &str = "CurlException";

/// Error type reported when the response body is not valid JSON.
pub const DECODE_ERROR_TYPE: &str = "JsonException";

/// Error type used when the envelope does not name one.
pub const DEFAULT_ERROR_TYPE: &str = "Exception";

/// Message used when the envelope payload is not an object.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown Error. Check result detail";

/// The first argument of a call was not a path string.
pub const INVALID_PATH: i64 = 101;

/// The parameters of a call were not a mapping.
pub const INVALID_PARAMS: i64 = 102;

/// Errors returned by `Client::api` and friends.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The call was malformed and never left the process.
    #[error("{}", render(USAGE_ERROR_TYPE, .code, .message))]
    Usage { code: i64, message: String },

    /// The request could not be completed at the transport level.
    #[error("{}", render(TRANSPORT_ERROR_TYPE, .code, .message))]
    Transport { code: i64, message: String },

    /// The service answered with an error envelope.
    #[error("{}", render(.error_type, .code, .message))]
    Remote {
        code: i64,
        message: String,
        error_type: String,
        /// The whole decoded response, envelope included.
        result: Value,
    },

    /// The response body was not valid JSON.
    #[error("{}", render(DECODE_ERROR_TYPE, &0, .message))]
    Decode { message: String, body: String },
}

fn render(error_type: &str, code: &i64, message: &str) -> String {
    if *code != 0 {
        format!("{error_type}: {code}: {message}")
    } else {
        format!("{error_type}: {message}")
    }
}

impl ApiError {
    pub(crate) fn invalid_path() -> Self {
        ApiError::Usage {
            code: INVALID_PATH,
            message: "Unavailable call for Parllay SDK, use Path for the first parameter".to_string(),
        }
    }

    pub(crate) fn invalid_params() -> Self {
        ApiError::Usage {
            code: INVALID_PARAMS,
            message: "Unavailable parameters".to_string(),
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            ApiError::Usage { code, .. }
            | ApiError::Transport { code, .. }
            | ApiError::Remote { code, .. } => *code,
            ApiError::Decode { .. } => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Usage { message, .. }
            | ApiError::Transport { message, .. }
            | ApiError::Remote { message, .. }
            | ApiError::Decode { message, .. } => message,
        }
    }

    pub fn error_type(&self) -> &str {
        match self {
            ApiError::Usage { .. } => USAGE_ERROR_TYPE,
            ApiError::Transport { .. } => TRANSPORT_ERROR_TYPE,
            ApiError::Remote { error_type, .. } => error_type,
            ApiError::Decode { .. } => DECODE_ERROR_TYPE,
        }
    }

    /// The decoded response that carried the error envelope, if any.
    pub fn result(&self) -> Option<&Value> {
        match self {
            ApiError::Remote { result, .. } => Some(result),
            _ => None,
        }
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        ApiError::Transport {
            code: i64::from(err.code),
            message: err.message,
        }
    }
}

/// The payload of an `{"error": ...}` envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorEnvelope {
    /// `error` is an object; missing fields take their defaults.
    Structured {
        code: i64,
        message: String,
        error_type: String,
    },
    /// `error` is any other non-null value.
    Opaque(Value),
}

impl ErrorEnvelope {
    /// Extract the envelope from a decoded response.
    ///
    /// Returns `None` unless `result` is an object with a non-null `error` key.
    pub fn detect(result: &Value) -> Option<Self> {
        let error = result.as_object()?.get("error")?;
        match error {
            Value::Null => None,
            Value::Object(fields) => Some(ErrorEnvelope::Structured {
                code: fields.get("code").map(error_code).unwrap_or(0),
                message: match fields.get("message") {
                    None | Some(Value::Null) => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                },
                error_type: fields
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or(DEFAULT_ERROR_TYPE)
                    .to_string(),
            }),
            other => Some(ErrorEnvelope::Opaque(other.clone())),
        }
    }

    /// Turn the envelope into the error returned to the caller.
    pub fn into_error(self, result: Value) -> ApiError {
        match self {
            ErrorEnvelope::Structured {
                code,
                message,
                error_type,
            } => ApiError::Remote {
                code,
                message,
                error_type,
                result,
            },
            ErrorEnvelope::Opaque(_) => ApiError::Remote {
                code: 0,
                message: UNKNOWN_ERROR_MESSAGE.to_string(),
                error_type: DEFAULT_ERROR_TYPE.to_string(),
                result,
            },
        }
    }
}

/// Integer codes may arrive as numbers or numeric strings.
fn error_code(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

/// Decode a raw response body.
///
/// A blank body (HEAD requests, empty replies) decodes to `null`. Anything
/// else must be valid UTF-8 JSON.
pub fn decode_body(body: &[u8]) -> Result<Value, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| ApiError::Decode {
        message: e.to_string(),
        body: String::from_utf8_lossy(body).into_owned(),
    })
}

/// Pass `result` through unless it carries an error envelope.
pub fn check_envelope(result: Value) -> Result<Value, ApiError> {
    match ErrorEnvelope::detect(&result) {
        Some(envelope) => Err(envelope.into_error(result)),
        None => Ok(result),
    }
}
