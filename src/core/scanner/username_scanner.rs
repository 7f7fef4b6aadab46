// src/core/scanner/username_scanner.rs

use reqwest::Method;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::catalog::{self, DetectionRule, SiteCatalog};
use crate::core::models::{FoundAccount, ScanSummary, UsernameReport, Verdict};
use crate::core::net::http::{HttpClient, HttpProbeData};
use crate::core::prober::{ProbeDescriptor, ProbeOutcome, Prober};
use crate::core::rules;
use crate::core::scanner::ScanOptions;

/// Checks one username against every site in the catalog, under the
/// prober's concurrency budget.
pub struct UsernameScanner {
    catalog: SiteCatalog,
    http: HttpClient,
    prober: Prober,
}

/// Derives the semantic verdict for one site probe: the detection rule is
/// applied to successful responses, terminal failures map to `Error`.
pub fn classify(rule: &DetectionRule, outcome: &ProbeOutcome<HttpProbeData>) -> Verdict {
    match outcome {
        ProbeOutcome::Success { payload } => {
            let hit = rules::evaluate(
                rule,
                payload.status,
                payload.body.as_deref(),
                &payload.final_url,
                &payload.requested_url,
            );
            if hit {
                Verdict::Found {
                    url: payload.final_url.clone(),
                    status_code: payload.status,
                }
            } else {
                Verdict::NotFound
            }
        }
        ProbeOutcome::Failure { kind, message } => Verdict::Error {
            reason: format!("{kind}: {message}"),
        },
    }
}

impl UsernameScanner {
    pub fn new(catalog: SiteCatalog, options: &ScanOptions) -> color_eyre::eyre::Result<Self> {
        Ok(Self {
            catalog,
            http: HttpClient::new(options.timeout, options.proxy.as_deref())?,
            prober: Prober::new(options.concurrency, options.timeout, options.retries),
        })
    }

    /// The embedded site catalog with default options.
    pub fn with_defaults() -> color_eyre::eyre::Result<Self> {
        Self::new(SiteCatalog::builtin()?, &ScanOptions::default())
    }

    pub fn catalog(&self) -> &SiteCatalog {
        &self.catalog
    }

    /// Probes every catalog entry for `username` and aggregates the
    /// verdicts. Always returns a report; per-site failures end up in
    /// `failed_sites`, never abort the batch.
    pub async fn scan(&self, username: &str) -> UsernameReport {
        info!(username, sites = self.catalog.len(), "Starting username scan.");

        let descriptors = self.build_descriptors(username);
        let mut rx = self.prober.run(descriptors, CancellationToken::new());

        let mut accounts = Vec::new();
        let mut failed_sites = Vec::new();
        while let Some(event) = rx.recv().await {
            let Some(entry) = self.catalog.get(&event.id) else {
                continue;
            };
            match classify(&entry.rule, &event.outcome) {
                Verdict::Found { url, status_code } => {
                    info!(site = %event.id, %url, "Account found.");
                    accounts.push(FoundAccount {
                        site: event.id,
                        url,
                        status_code,
                    });
                }
                Verdict::NotFound => {
                    debug!(site = %event.id, "No account.");
                }
                Verdict::Error { reason } => {
                    debug!(site = %event.id, %reason, "Site probe failed.");
                    failed_sites.push(event.id);
                }
            }
        }

        accounts.sort_by(|a, b| a.site.cmp(&b.site));
        failed_sites.sort();

        // total_checked is the catalog size regardless of failures.
        let summary = ScanSummary::new(
            username,
            self.catalog.len(),
            accounts.len(),
            failed_sites.len(),
        );
        info!(
            found = summary.found,
            failed = summary.failed,
            success_rate = %summary.success_rate,
            "Username scan finished."
        );
        UsernameReport {
            accounts,
            summary,
            failed_sites,
            error: None,
        }
    }

    fn build_descriptors(&self, username: &str) -> Vec<ProbeDescriptor<HttpProbeData>> {
        self.catalog
            .iter()
            .map(|(site, entry)| {
                let client = self.http.clone();
                let entry = entry.clone();
                let url = entry.probe_url(username);
                ProbeDescriptor::new(site.clone(), move || {
                    let client = client.clone();
                    let entry = entry.clone();
                    let url = url.clone();
                    async move {
                        let method = if entry.head_only {
                            Method::HEAD
                        } else {
                            Method::GET
                        };
                        // HEAD responses carry no body to inspect.
                        let read_body = entry.rule.needs_body() && !entry.head_only;
                        client
                            .probe(
                                method,
                                &url,
                                catalog::random_user_agent(),
                                &entry.headers,
                                read_body,
                            )
                            .await
                    }
                })
            })
            .collect()
    }
}
