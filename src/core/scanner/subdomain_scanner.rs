// src/core/scanner/subdomain_scanner.rs

use color_eyre::eyre::{Result, WrapErr};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::core::models::SubdomainReport;
use crate::core::net::crtsh;
use crate::core::net::dns::DnsClient;
use crate::core::net::http::HttpClient;
use crate::core::prober::{ProbeDescriptor, ProbeOutcome, Prober};

/// Brute-force sub-probes are capped tighter than the scan timeout so a
/// wordlist of thousands of candidates cannot stretch total wall-clock
/// time unboundedly.
const BRUTE_PROBE_CAP: Duration = Duration::from_secs(5);

const BRUTE_CONCURRENCY: usize = 64;

/// Per-probe timeout for brute-force resolutions: the scan timeout, capped
/// at five seconds.
pub fn capped_probe_timeout(timeout: Duration) -> Duration {
    timeout.min(BRUTE_PROBE_CAP)
}

/// Sorted, de-duplicated union of passive and brute-forced results.
pub fn merge_subdomains(passive: &[String], brute_forced: &[String]) -> Vec<String> {
    let set: BTreeSet<String> = passive.iter().chain(brute_forced).cloned().collect();
    set.into_iter().collect()
}

/// Discovers subdomains of a target, passively via certificate-transparency
/// logs and actively via wordlist brute-forcing.
pub struct SubdomainScanner {
    dns: DnsClient,
    http: HttpClient,
    timeout: Duration,
}

impl SubdomainScanner {
    pub fn new(dns: DnsClient, http: HttpClient, timeout: Duration) -> Self {
        Self { dns, http, timeout }
    }

    /// Reads a wordlist: one candidate per line, blanks and `#` comments
    /// skipped. An unreadable file is a fatal configuration error.
    pub fn load_wordlist(path: &Path) -> Result<Vec<String>> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("could not read wordlist {}", path.display()))?;
        Ok(raw
            .lines()
            .map(str::trim)
            .filter(|word| !word.is_empty() && !word.starts_with('#'))
            .map(String::from)
            .collect())
    }

    /// Resolves `word.domain` for every candidate word and returns the
    /// FQDNs that resolved to at least one address, de-duplicated, in
    /// sorted order. Cancellable: stops issuing resolutions once `cancel`
    /// fires and returns only what already resolved.
    pub async fn brute(
        &self,
        domain: &str,
        words: &[String],
        cancel: CancellationToken,
    ) -> Vec<String> {
        let candidates: BTreeSet<&str> = words
            .iter()
            .map(String::as_str)
            .filter(|word| !word.is_empty())
            .collect();
        info!(domain, candidates = candidates.len(), "Starting subdomain brute force.");

        let per_probe = capped_probe_timeout(self.timeout);
        let descriptors: Vec<ProbeDescriptor<String>> = candidates
            .into_iter()
            .map(|word| {
                let fqdn = format!("{word}.{domain}");
                let dns = self.dns.clone();
                ProbeDescriptor::new(fqdn.clone(), move || {
                    let dns = dns.clone();
                    let fqdn = fqdn.clone();
                    async move { dns.lookup_ips(&fqdn).await.map(|_| fqdn) }
                })
                .with_timeout(per_probe)
            })
            .collect();

        // A name that does not resolve is an answer: no retries.
        let prober = Prober::new(BRUTE_CONCURRENCY, per_probe, 0);
        let mut rx = prober.run(descriptors, cancel);
        let mut resolved = BTreeSet::new();
        while let Some(event) = rx.recv().await {
            if let ProbeOutcome::Success { payload } = event.outcome {
                debug!(fqdn = %payload, "Subdomain resolved.");
                resolved.insert(payload);
            }
        }
        info!(domain, resolved = resolved.len(), "Subdomain brute force finished.");
        resolved.into_iter().collect()
    }

    /// Full subdomain enumeration: certificate-transparency results plus,
    /// when a wordlist is given, brute-forced resolutions. An unreadable
    /// wordlist aborts the enumeration with an error result rather than
    /// returning partial data.
    pub async fn enumerate(&self, domain: &str, wordlist: Option<&Path>) -> SubdomainReport {
        let words = match wordlist.map(Self::load_wordlist).transpose() {
            Ok(words) => words,
            Err(error) => {
                warn!(domain, %error, "Subdomain enumeration aborted.");
                return SubdomainReport {
                    error: Some(error.to_string()),
                    ..Default::default()
                };
            }
        };

        let passive = crtsh::query_certificate_log(&self.http, domain).await;
        let brute_forced = match &words {
            Some(words) => self.brute(domain, words, CancellationToken::new()).await,
            None => Vec::new(),
        };

        let subdomains = merge_subdomains(&passive, &brute_forced);
        info!(domain, total = subdomains.len(), "Subdomain enumeration finished.");
        SubdomainReport {
            subdomains,
            passive: passive.len(),
            brute_forced: brute_forced.len(),
            error: None,
        }
    }
}
