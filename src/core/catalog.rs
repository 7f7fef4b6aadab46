// src/core/catalog.rs

use color_eyre::eyre::{Result, WrapErr};
use rand::seq::SliceRandom;
use regex::RegexBuilder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use url::Url;

/// Placeholder substituted with the scanned username in site URL templates.
pub const ACCOUNT_PLACEHOLDER: &str = "{account}";

/// Fixed pool of browser User-Agent strings; one is picked at random per
/// request as a basic anti-fingerprinting measure.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.2 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/119.0 Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_2 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.2 Mobile/15E148 Safari/604.1",
];

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// How to decide, from a completed HTTP response, whether an account
/// exists on a site.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionRule {
    /// Account exists iff the response status is 200. A known-imprecise
    /// heuristic (some sites answer 200 for their "not found" page), kept
    /// for compatibility with the catalogs in the wild.
    #[default]
    StatusCode,
    /// Account exists iff `absence_text` is non-empty and absent from the
    /// response body.
    Message { absence_text: String },
    /// Account exists iff the final post-redirect URL equals the requested
    /// URL exactly. Catches sites that redirect unknown users to a generic
    /// landing page.
    ResponseUrl,
    /// Account exists iff `pattern` matches the body, case-insensitively.
    /// An empty pattern falls back to `StatusCode` behavior.
    Regex { pattern: String },
}

impl DetectionRule {
    /// Only these rules inspect the body; for the rest the download is
    /// skipped to save bandwidth and latency.
    pub fn needs_body(&self) -> bool {
        matches!(
            self,
            DetectionRule::Message { .. } | DetectionRule::Regex { .. }
        )
    }
}

/// One probe template: where to look for an account and how to interpret
/// the answer. Immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteEntry {
    /// URL template containing the `{account}` placeholder.
    pub url: String,
    #[serde(default)]
    pub rule: DetectionRule,
    /// Use a HEAD request instead of GET.
    #[serde(default)]
    pub head_only: bool,
    /// Extra site-specific request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl SiteEntry {
    pub fn probe_url(&self, username: &str) -> String {
        self.url.replace(ACCOUNT_PLACEHOLDER, username)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if !self.url.contains(ACCOUNT_PLACEHOLDER) {
            return Err(format!("url is missing the {ACCOUNT_PLACEHOLDER} placeholder"));
        }
        if let Err(error) = Url::parse(&self.probe_url("probe")) {
            return Err(format!("url does not parse: {error}"));
        }
        if let DetectionRule::Regex { pattern } = &self.rule {
            if !pattern.is_empty() {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|error| format!("invalid pattern: {error}"))?;
            }
        }
        Ok(())
    }
}

static BUILTIN_SITES: &str = include_str!("../../data/sites.json");

/// The static mapping of site name to probe template. Loaded once at
/// scanner construction and read-only thereafter.
#[derive(Debug, Clone, Default)]
pub struct SiteCatalog {
    sites: BTreeMap<String, SiteEntry>,
}

impl SiteCatalog {
    /// The catalog embedded in the crate.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_SITES)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .wrap_err_with(|| format!("could not read site catalog {}", path.display()))?;
        Self::from_json(&raw)
    }

    /// Parses and eagerly validates a catalog. A file that is not valid
    /// JSON is a fatal configuration error; an individual malformed entry
    /// (bad URL template, uncompilable regex) is skipped with a warning so
    /// one bad site never takes the whole catalog down.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: BTreeMap<String, SiteEntry> =
            serde_json::from_str(raw).wrap_err("site catalog is not valid JSON")?;

        let mut sites = BTreeMap::new();
        for (name, entry) in parsed {
            match entry.validate() {
                Ok(()) => {
                    sites.insert(name, entry);
                }
                Err(reason) => {
                    warn!(site = %name, %reason, "Skipping malformed catalog entry.");
                }
            }
        }
        debug!(sites = sites.len(), "Site catalog loaded.");
        Ok(Self { sites })
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn get(&self, site: &str) -> Option<&SiteEntry> {
        self.sites.get(site)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &SiteEntry)> {
        self.sites.iter()
    }
}
