// src/core/net/dns.rs

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::RecordType;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tracing::debug;

use crate::core::prober::{FailureKind, ProbeError};

/// Async DNS client, optionally pinned to a caller-supplied nameserver.
/// Cheap to clone; clones share the underlying resolver.
#[derive(Clone)]
pub struct DnsClient {
    resolver: TokioAsyncResolver,
}

impl DnsClient {
    pub fn new(nameserver: Option<IpAddr>, timeout: Duration) -> Self {
        let config = match nameserver {
            Some(ip) => {
                let mut config = ResolverConfig::new();
                config.add_name_server(NameServerConfig::new(
                    SocketAddr::new(ip, 53),
                    Protocol::Udp,
                ));
                config
            }
            None => ResolverConfig::default(),
        };
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// Resolves A/AAAA addresses for a hostname. A name with no addresses
    /// is a resolution failure, not an empty success.
    pub async fn lookup_ips(&self, host: &str) -> Result<Vec<IpAddr>, ProbeError> {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => {
                let ips: Vec<IpAddr> = lookup.iter().collect();
                if ips.is_empty() {
                    Err(ProbeError::new(
                        FailureKind::Connection,
                        format!("no addresses for {host}"),
                    ))
                } else {
                    Ok(ips)
                }
            }
            Err(error) => Err(classify_resolve_error(host, error)),
        }
    }

    /// Looks up all records of one type, rendered to text. Lookup errors
    /// (including NXDOMAIN) collapse to an empty list; record enumeration
    /// is an overview, not a health check.
    pub async fn lookup_records(&self, name: &str, record_type: RecordType) -> Vec<String> {
        match self.resolver.lookup(name, record_type).await {
            Ok(lookup) => lookup.iter().map(|record| record.to_string()).collect(),
            Err(error) => {
                debug!(name, %record_type, %error, "Record lookup returned nothing.");
                Vec::new()
            }
        }
    }

    /// Best-effort reverse lookup.
    pub async fn reverse(&self, ip: IpAddr) -> Option<String> {
        self.resolver
            .reverse_lookup(ip)
            .await
            .ok()
            .and_then(|lookup| lookup.iter().next().map(|name| name.to_string()))
    }
}

fn classify_resolve_error(host: &str, error: ResolveError) -> ProbeError {
    let kind = match error.kind() {
        ResolveErrorKind::Timeout => FailureKind::Timeout,
        _ => FailureKind::Connection,
    };
    ProbeError::new(kind, format!("resolution of {host} failed: {error}"))
}
