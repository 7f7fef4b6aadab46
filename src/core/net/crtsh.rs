// src/core/net/crtsh.rs

use reqwest::Method;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::core::catalog;
use crate::core::net::http::HttpClient;

/// Passive subdomain discovery through the crt.sh certificate-transparency
/// log. Best-effort: any failure yields an empty list, never an error.
pub async fn query_certificate_log(client: &HttpClient, domain: &str) -> Vec<String> {
    let url = format!("https://crt.sh/?q=%25.{domain}&output=json");
    let data = match client
        .probe(
            Method::GET,
            &url,
            catalog::random_user_agent(),
            &BTreeMap::new(),
            true,
        )
        .await
    {
        Ok(data) => data,
        Err(error) => {
            warn!(domain, %error, "Certificate log query failed.");
            return Vec::new();
        }
    };
    if data.status != 200 {
        warn!(domain, status = data.status, "Certificate log query rejected.");
        return Vec::new();
    }

    let entries: Vec<Value> = match serde_json::from_str(data.body.as_deref().unwrap_or("")) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(domain, %error, "Certificate log answer was not valid JSON.");
            return Vec::new();
        }
    };

    let mut hostnames = Vec::new();
    for entry in &entries {
        // A single log entry can carry several names separated by newlines.
        let Some(name_value) = entry.get("name_value").and_then(Value::as_str) else {
            continue;
        };
        for part in name_value.split('\n') {
            let part = part.trim().trim_start_matches("*.");
            if part.ends_with(domain) && !part.is_empty() {
                hostnames.push(part.to_string());
            }
        }
    }
    debug!(domain, hostnames = hostnames.len(), "Certificate log query finished.");
    hostnames
}
