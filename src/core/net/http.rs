// src/core/net/http.rs

use color_eyre::eyre::{Result, WrapErr};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Proxy, redirect};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::prober::{FailureKind, ProbeError};

/// Response metadata handed to the detection rule evaluator. The body is
/// present only when the caller asked for it.
#[derive(Debug, Clone)]
pub struct HttpProbeData {
    pub status: u16,
    pub requested_url: String,
    pub final_url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
}

/// HTTP client shared by all probes of a scan. Follows redirects and, like
/// the rest of the scanner, accepts invalid certificates: a self-signed
/// endpoint is still an answer.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration, proxy: Option<&str>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .redirect(redirect::Policy::limited(10));
        if let Some(proxy) = proxy {
            builder = builder.proxy(Proxy::all(proxy).wrap_err("invalid proxy URL")?);
        }
        let inner = builder.build().wrap_err("failed to build HTTP client")?;
        Ok(Self { inner })
    }

    /// Performs one HTTP probe. `read_body` controls whether the body is
    /// downloaded; detection rules that only look at the status or final
    /// URL skip it.
    pub async fn probe(
        &self,
        method: Method,
        url: &str,
        user_agent: &str,
        extra_headers: &BTreeMap<String, String>,
        read_body: bool,
    ) -> Result<HttpProbeData, ProbeError> {
        // One map, site-specific headers inserted last: an entry that sets
        // its own User-Agent replaces the randomized one instead of being
        // appended next to it.
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, value);
        }
        for (name, value) in extra_headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(parsed_name), Ok(parsed_value)) => {
                    headers.insert(parsed_name, parsed_value);
                }
                _ => warn!(header = %name, "Skipping invalid request header."),
            }
        }
        let request = self.inner.request(method, url).headers(headers);

        let response = request.send().await.map_err(classify_reqwest_error)?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();

        let body = if read_body {
            Some(response.text().await.map_err(classify_reqwest_error)?)
        } else {
            None
        };

        debug!(url, status, "HTTP probe completed.");
        Ok(HttpProbeData {
            status,
            requested_url: url.to_string(),
            final_url,
            headers,
            body,
        })
    }
}

fn classify_reqwest_error(error: reqwest::Error) -> ProbeError {
    let kind = if error.is_timeout() {
        FailureKind::Timeout
    } else if error.is_builder() || error.is_request() {
        FailureKind::Unexpected
    } else {
        // Connect failures, resets and protocol errors are all transient
        // from the prober's point of view.
        FailureKind::Connection
    };
    ProbeError::new(kind, error.to_string())
}
