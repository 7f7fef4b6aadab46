// src/core/scanner/mod.rs

// This file acts as the public interface for the `scanner` module: it
// declares the per-target scanners and hosts the top-level orchestration
// entry points a CLI or other presentation layer calls into.
pub mod dns_scanner;
pub mod http_scanner;
pub mod port_scanner;
pub mod subdomain_scanner;
pub mod username_scanner;

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::core::models::{DomainReport, DomainSummary, PortMap, ScanSummary, UsernameReport};
use crate::core::net::dns::DnsClient;
use crate::core::net::http::HttpClient;
use crate::core::net::tls;
use self::port_scanner::{DEFAULT_TOP_PORTS, PortScanner};
use self::subdomain_scanner::SubdomainScanner;
use self::username_scanner::UsernameScanner;

/// Knobs shared by every scan type.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub timeout: Duration,
    pub concurrency: usize,
    pub retries: usize,
    pub proxy: Option<String>,
    pub nameserver: Option<IpAddr>,
    pub ports: Vec<u16>,
    pub scan_ports: bool,
    pub wordlist: Option<PathBuf>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            concurrency: 50,
            retries: 2,
            proxy: None,
            nameserver: None,
            ports: DEFAULT_TOP_PORTS.to_vec(),
            scan_ports: true,
            wordlist: None,
        }
    }
}

/// Checks a username across the embedded site catalog.
///
/// Never fails past this boundary: a batch that could not start (bad
/// catalog, bad proxy) comes back as a report with the `error` field set.
pub async fn run_username_scan(username: &str, options: &ScanOptions) -> UsernameReport {
    let scanner = match crate::core::catalog::SiteCatalog::builtin()
        .and_then(|catalog| UsernameScanner::new(catalog, options))
    {
        Ok(scanner) => scanner,
        Err(error) => {
            warn!(%error, "Username scan could not start.");
            return UsernameReport {
                summary: ScanSummary::new(username, 0, 0, 0),
                error: Some(error.to_string()),
                ..Default::default()
            };
        }
    };
    scanner.scan(username).await
}

/// Runs the full domain reconnaissance: DNS records first (their addresses
/// feed the port scan), then ports, subdomains, apex TLS summary and HTTP
/// fingerprint concurrently.
pub async fn run_domain_scan(target: &str, options: &ScanOptions) -> DomainReport {
    info!(target, "Starting domain scan.");
    let http = match HttpClient::new(options.timeout, options.proxy.as_deref()) {
        Ok(client) => client,
        Err(error) => {
            warn!(%error, "Domain scan could not start.");
            return DomainReport {
                error: Some(error.to_string()),
                ..Default::default()
            };
        }
    };
    let dns = DnsClient::new(options.nameserver, options.timeout);

    let dns_records = dns_scanner::run_dns_scan(&dns, target).await;
    let ips = dns_scanner::resolved_ips(&dns_records);

    let port_scanner = PortScanner::new(
        options.concurrency,
        Duration::from_secs(3).min(options.timeout),
    );
    let subdomain_scanner = SubdomainScanner::new(dns.clone(), http.clone(), options.timeout);

    let (ports, subdomains, tls_summary, http_results) = tokio::join!(
        async {
            if options.scan_ports {
                port_scanner.scan(&ips, &options.ports).await
            } else {
                PortMap::new()
            }
        },
        subdomain_scanner.enumerate(target, options.wordlist.as_deref()),
        async { tls::fetch_certificate(target, 443, options.timeout).await.ok() },
        http_scanner::run_http_fingerprint(&http, target),
    );

    let summary = DomainSummary {
        a_records: dns_records.records.get("A").map_or(0, Vec::len),
        subdomains: subdomains.subdomains.len(),
        dnssec: dns_records.dnssec_present,
        open_services: ports.values().map(BTreeMap::len).sum(),
    };
    info!(target, open_services = summary.open_services, "Domain scan finished.");

    DomainReport {
        dns: dns_records,
        ports,
        subdomains,
        tls: tls_summary,
        http: http_results,
        summary,
        error: None,
    }
}
