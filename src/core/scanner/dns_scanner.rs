// src/core/scanner/dns_scanner.rs

use hickory_resolver::proto::rr::RecordType;
use std::collections::{BTreeMap, BTreeSet};
use std::net::IpAddr;
use tracing::info;

use crate::core::models::DnsRecords;
use crate::core::net::dns::DnsClient;

/// Record types enumerated for a domain overview. DS and DNSKEY double as
/// the DNSSEC presence check.
const SUPPORTED_RECORD_TYPES: &[RecordType] = &[
    RecordType::A,
    RecordType::AAAA,
    RecordType::CNAME,
    RecordType::MX,
    RecordType::NS,
    RecordType::TXT,
    RecordType::SOA,
    RecordType::CAA,
    RecordType::DS,
    RecordType::DNSKEY,
];

/// Enumerates the common DNS records for a domain, with reverse lookups
/// for every resolved address.
pub async fn run_dns_scan(dns: &DnsClient, target: &str) -> DnsRecords {
    // Query the root domain; record enumeration on "www." is rarely useful.
    let root_target = target.strip_prefix("www.").unwrap_or(target);
    info!(target = %root_target, "Starting DNS record enumeration.");

    let mut records = BTreeMap::new();
    for record_type in SUPPORTED_RECORD_TYPES {
        let values = dns.lookup_records(root_target, *record_type).await;
        if !values.is_empty() {
            records.insert(record_type.to_string(), values);
        }
    }

    let dnssec_present = records.contains_key("DS") || records.contains_key("DNSKEY");

    let mut reverse = BTreeMap::new();
    for key in ["A", "AAAA"] {
        let Some(values) = records.get(key).cloned() else {
            continue;
        };
        for value in values {
            if let Ok(ip) = value.parse::<IpAddr>() {
                reverse.insert(value, dns.reverse(ip).await);
            }
        }
    }

    info!(
        record_types = records.len(),
        dnssec_present,
        "DNS record enumeration finished."
    );
    DnsRecords {
        records,
        reverse,
        dnssec_present,
    }
}

/// The de-duplicated set of addresses from the A and AAAA records.
pub fn resolved_ips(dns: &DnsRecords) -> Vec<IpAddr> {
    let mut ips = BTreeSet::new();
    for key in ["A", "AAAA"] {
        if let Some(values) = dns.records.get(key) {
            ips.extend(values.iter().filter_map(|value| value.parse::<IpAddr>().ok()));
        }
    }
    ips.into_iter().collect()
}
