use std::time::Duration;

use log::warn;
use serde_json::Value;
use thiserror::Error;

use crate::http_client::http_client;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("upstream returned http {0}")]
    Status(u16),
    #[error("malformed json: {0}")]
    Malformed(String),
}

pub trait JsonSource: Send + Sync {
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
    Data(T),
    Empty,
}

impl<T> Fetched<T> {
    pub fn from_result(url: &str, result: Result<T, FetchError>) -> Self {
        match result {
            Ok(data) => Fetched::Data(data),
            Err(err) => {
                warn!("fetch {url} failed, serving empty: {err}");
                Fetched::Empty
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Fetched::Empty)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Fetched::Data(data) => Fetched::Data(f(data)),
            Fetched::Empty => Fetched::Empty,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Fetched::Data(data) => Some(data),
            Fetched::Empty => None,
        }
    }
}

impl<T: Default> Fetched<T> {
    pub fn unwrap_or_default(self) -> T {
        self.into_option().unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct HttpSource {
    timeout: Duration,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl JsonSource for HttpSource {
    fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        let client = http_client(self.timeout)?;
        let resp = client
            .get(url)
            .send()
            .map_err(|err| FetchError::Transport(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = resp
            .text()
            .map_err(|err| FetchError::Transport(format!("failed reading body: {err}")))?;
        parse_body(&body)
    }
}

/// An empty body parses as `null`, the same as an explicit `null`.
pub fn parse_body(raw: &str) -> Result<Value, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(trimmed).map_err(|err| FetchError::Malformed(err.to_string()))
}
