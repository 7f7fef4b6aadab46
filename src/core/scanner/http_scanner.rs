// src/core/scanner/http_scanner.rs

use reqwest::Method;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::core::catalog;
use crate::core::models::{HttpFingerprint, HttpResults};
use crate::core::net::http::HttpClient;

/// Fingerprints the web servers behind a domain on both schemes: status,
/// final post-redirect URL, and the Server / X-Powered-By headers.
pub async fn run_http_fingerprint(client: &HttpClient, target: &str) -> HttpResults {
    info!(target, "Fingerprinting HTTP servers.");
    let (http, https) = tokio::join!(
        fingerprint_one(client, format!("http://{target}")),
        fingerprint_one(client, format!("https://{target}")),
    );
    HttpResults { http, https }
}

async fn fingerprint_one(client: &HttpClient, url: String) -> Option<HttpFingerprint> {
    match client
        .probe(
            Method::GET,
            &url,
            catalog::random_user_agent(),
            &BTreeMap::new(),
            false,
        )
        .await
    {
        Ok(data) => Some(HttpFingerprint {
            status: data.status,
            final_url: data.final_url,
            server: data.headers.get("server").cloned(),
            powered_by: data.headers.get("x-powered-by").cloned(),
        }),
        Err(error) => {
            debug!(%url, %error, "HTTP fingerprint probe failed.");
            None
        }
    }
}
