//! Request descriptions for the Parllay API.
//!
//! # Design
//! `ApiRequest` is the typed form of a call: a path, a method and an ordered
//! parameter list. Callers that hold their arguments as loose JSON values go
//! through `ApiRequest::from_values`, the one place where positional
//! arguments are interpreted and validated.

use serde_json::{Map, Value};

use crate::error::ApiError;
use crate::http::HttpMethod;

/// Insertion-ordered request parameters.
///
/// Values keep their JSON form until the request is built; see
/// [`Params::normalized`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params(Map<String, Value>);

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key`, replacing an existing value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String form of every parameter, in insertion order.
    ///
    /// Strings are used verbatim; every other value is replaced by its
    /// compact JSON serialization.
    pub fn normalized(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect()
    }
}

impl From<Map<String, Value>> for Params {
    fn from(map: Map<String, Value>) -> Self {
        Params(map)
    }
}

impl From<&Map<String, Value>> for Params {
    fn from(map: &Map<String, Value>) -> Self {
        Params(map.clone())
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Params(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// One call against the API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: String,
    pub method: HttpMethod,
    pub params: Params,
}

impl ApiRequest {
    /// A GET request for `path` with no parameters.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: HttpMethod::Get,
            params: Params::new(),
        }
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key, value);
        self
    }

    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    /// Resolve loosely typed call arguments into a request.
    ///
    /// - `path` must be a string, otherwise the call fails with code 101.
    /// - A mapping or list in second position is taken as the parameters
    ///   when the third argument is absent or empty; the method is then GET.
    /// - A string in second position is a method name; unknown names
    ///   (and any other second argument) mean GET.
    /// - Parameters must be a mapping (or absent, null, or an empty list),
    ///   otherwise the call fails with code 102.
    pub fn from_values(
        path: &Value,
        method_or_params: Option<&Value>,
        params: Option<&Value>,
    ) -> Result<Self, ApiError> {
        let Value::String(path) = path else {
            return Err(ApiError::invalid_path());
        };

        let (method, params) = match method_or_params {
            Some(value @ (Value::Object(_) | Value::Array(_))) if is_empty_argument(params) => {
                (HttpMethod::Get, Some(value))
            }
            Some(Value::String(name)) => (HttpMethod::parse(name), params),
            _ => (HttpMethod::Get, params),
        };

        let params = match params {
            None | Some(Value::Null) => Params::new(),
            Some(Value::Object(map)) => Params::from(map),
            Some(Value::Array(items)) if items.is_empty() => Params::new(),
            Some(_) => return Err(ApiError::invalid_params()),
        };

        Ok(Self {
            path: path.clone(),
            method,
            params,
        })
    }
}

fn is_empty_argument(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}
