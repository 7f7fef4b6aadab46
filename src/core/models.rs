// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// --- Username Scan Models ---

/// The semantic classification of a single site probe, derived from its
/// outcome via the site's detection rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Found { url: String, status_code: u16 },
    NotFound,
    Error { reason: String },
}

/// One confirmed account on a third-party site.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FoundAccount {
    pub site: String,
    pub url: String,
    pub status_code: u16,
}

/// Aggregate counters for a username scan, computed once after all
/// outcomes have been collected.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub username: String,
    pub total_checked: usize,
    pub found: usize,
    pub failed: usize,
    /// `found / total_checked` formatted to one decimal, e.g. `"75.0%"`.
    pub success_rate: String,
}

impl ScanSummary {
    pub fn new(username: &str, total_checked: usize, found: usize, failed: usize) -> Self {
        // Guard against an empty catalog: 0/0 is defined as 0.0%, not NaN.
        let rate = if total_checked == 0 {
            0.0
        } else {
            found as f64 / total_checked as f64 * 100.0
        };
        Self {
            username: username.to_string(),
            total_checked,
            found,
            failed,
            success_rate: format!("{:.1}%", rate),
        }
    }
}

/// The full result of a username scan. `failed_sites` lists sites whose
/// probe terminally failed after retries; this is distinct from sites where
/// no account was found. `error` is set only when the batch failed to start
/// (e.g. the catalog could not be loaded), never for per-site failures.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UsernameReport {
    pub accounts: Vec<FoundAccount>,
    pub summary: ScanSummary,
    pub failed_sites: Vec<String>,
    pub error: Option<String>,
}

// --- Port Scan Models ---

/// A parsed summary of an X.509 certificate presented by a TLS endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateSummary {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
    pub is_valid: bool,
}

/// One open port. Closed and filtered ports are never recorded, so `state`
/// is always `"open"`; it is kept in the report for serialization parity
/// with other tooling. `banner` and `tls` are best-effort enrichments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PortResult {
    pub state: String,
    pub service: String,
    pub banner: Option<String>,
    pub tls: Option<CertificateSummary>,
}

/// IP address (as text, for direct JSON serialization) to open ports.
pub type PortMap = BTreeMap<String, BTreeMap<u16, PortResult>>;

// --- Domain Scan Models ---

/// DNS records grouped by record type, plus reverse lookups for every
/// resolved address and a DNSSEC presence flag.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DnsRecords {
    pub records: BTreeMap<String, Vec<String>>,
    pub reverse: BTreeMap<String, Option<String>>,
    pub dnssec_present: bool,
}

/// Confirmed subdomains: the sorted, de-duplicated union of passive
/// certificate-transparency results and brute-forced resolutions.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SubdomainReport {
    pub subdomains: Vec<String>,
    pub passive: usize,
    pub brute_forced: usize,
    pub error: Option<String>,
}

/// HTTP server fingerprint for one scheme.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HttpFingerprint {
    pub status: u16,
    pub final_url: String,
    pub server: Option<String>,
    pub powered_by: Option<String>,
}

/// Fingerprints for both plain HTTP and HTTPS; either side is `None` when
/// the server did not answer on that scheme.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HttpResults {
    pub http: Option<HttpFingerprint>,
    pub https: Option<HttpFingerprint>,
}

/// Headline numbers for a domain scan.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DomainSummary {
    pub a_records: usize,
    pub subdomains: usize,
    pub dnssec: bool,
    pub open_services: usize,
}

/// The combined report for a full domain scan. Plain structured data,
/// suitable for direct JSON serialization by a presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DomainReport {
    pub dns: DnsRecords,
    pub ports: PortMap,
    pub subdomains: SubdomainReport,
    pub tls: Option<CertificateSummary>,
    pub http: HttpResults,
    pub summary: DomainSummary,
    pub error: Option<String>,
}
