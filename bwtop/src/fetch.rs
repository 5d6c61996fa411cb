//! HTTP client for the agent's manager endpoint.
//!
//! `ureq` is blocking, so each request runs on tokio's blocking pool and the
//! caller just awaits the join handle.

use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::buffer::validate;

pub const DEFAULT_URL: &str = "http://127.0.0.1:3000/manager/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server answered HTTP {0}")]
    Status(u16),
    #[error("malformed payload: {0}")]
    Malformed(String),
}

/// The two operations the dashboard polls.
pub trait ManagerApi: Send + Sync + 'static {
    /// `op=getTrafficData&tf=<count>`: validated samples, oldest first.
    fn traffic_data(&self, count: usize)
        -> impl Future<Output = Result<Vec<f64>, FetchError>> + Send;

    /// `op=getServerInfo`: markup fragment, passed through untouched.
    fn server_info(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpManager {
    base: Url,
    timeout: Duration,
}

impl HttpManager {
    pub fn new(base: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base).map_err(|e| FetchError::Transport(format!("{base}: {e}")))?;
        match base.scheme() {
            "http" | "https" => {}
            other => {
                return Err(FetchError::Transport(format!(
                    "unsupported scheme '{other}' (expected http or https)"
                )))
            }
        }
        Ok(Self {
            base,
            timeout: REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn traffic_url(&self, count: usize) -> Url {
        let mut u = self.base.clone();
        u.query_pairs_mut()
            .clear()
            .append_pair("op", "getTrafficData")
            .append_pair("tf", &count.to_string());
        u
    }

    pub fn server_info_url(&self) -> Url {
        let mut u = self.base.clone();
        u.query_pairs_mut().clear().append_pair("op", "getServerInfo");
        u
    }
}

impl ManagerApi for HttpManager {
    fn traffic_data(
        &self,
        count: usize,
    ) -> impl Future<Output = Result<Vec<f64>, FetchError>> + Send {
        let url = self.traffic_url(count);
        let timeout = self.timeout;
        async move {
            let body = get_text(url, timeout).await?;
            parse_samples(&body)
        }
    }

    fn server_info(&self) -> impl Future<Output = Result<String, FetchError>> + Send {
        let url = self.server_info_url();
        let timeout = self.timeout;
        async move { get_text(url, timeout).await }
    }
}

async fn get_text(url: Url, timeout: Duration) -> Result<String, FetchError> {
    tokio::task::spawn_blocking(move || {
        let resp = ureq::get(url.as_str())
            .timeout(timeout)
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => FetchError::Status(code),
                ureq::Error::Transport(t) => FetchError::Transport(t.to_string()),
            })?;
        resp.into_string()
            .map_err(|e| FetchError::Transport(format!("reading body: {e}")))
    })
    .await
    .map_err(|e| FetchError::Transport(format!("request task failed: {e}")))?
}

/// Parse a traffic payload: a JSON array of finite, non-negative numbers.
pub fn parse_samples(body: &str) -> Result<Vec<f64>, FetchError> {
    let v: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;
    let Value::Array(items) = v else {
        return Err(FetchError::Malformed("expected a JSON array".into()));
    };
    let samples = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_f64()
                .ok_or_else(|| FetchError::Malformed(format!("element {i} is not a number")))
        })
        .collect::<Result<Vec<f64>, _>>()?;
    if samples.is_empty() {
        return Err(FetchError::Malformed("empty array".into()));
    }
    validate(&samples).map_err(|e| FetchError::Malformed(e.to_string()))?;
    Ok(samples)
}
