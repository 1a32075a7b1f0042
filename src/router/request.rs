//! Parsed inbound request as delivered by the transport layer.

use crate::error::AppError;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Delete,
}

impl Verb {
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verb {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(Verb::Get),
            "POST" => Ok(Verb::Post),
            "PUT" => Ok(Verb::Put),
            "DELETE" => Ok(Verb::Delete),
            _ => Err(AppError::BadRequest(format!(
                "unsupported method: {} (expected GET, POST, PUT or DELETE)",
                s
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    pub verb: Verb,
    /// Raw path, possibly with a single `?key=value` suffix.
    pub path: String,
    /// Decoded body fields (POST/PUT).
    pub body: HashMap<String, String>,
}

impl Request {
    pub fn new(verb: Verb, path: impl Into<String>) -> Self {
        Request {
            verb,
            path: path.into(),
            body: HashMap::new(),
        }
    }

    pub fn with_body<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        self
    }

    /// Path used for route matching (query string stripped).
    pub fn route_path(&self) -> &str {
        split_target(&self.path).0
    }

    /// Value of the query string's key=value pair, if any.
    pub fn query_value(&self) -> Option<&str> {
        split_target(&self.path).1
    }
}

/// Split `path?key=value` into the path and the first pair's value.
pub fn split_target(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once('?') {
        None => (raw, None),
        Some((path, query)) => {
            let value = query
                .split('&')
                .next()
                .and_then(|pair| pair.split_once('='))
                .map(|(_, v)| v);
            (path, value)
        }
    }
}
