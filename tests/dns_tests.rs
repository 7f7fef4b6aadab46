use magpie_rs_recon::core::models::DnsRecords;
use magpie_rs_recon::core::scanner::dns_scanner::resolved_ips;
use std::collections::BTreeMap;
use std::net::IpAddr;

fn records_with(a: &[&str], aaaa: &[&str]) -> DnsRecords {
    let mut records = BTreeMap::new();
    if !a.is_empty() {
        records.insert("A".to_string(), a.iter().map(|s| s.to_string()).collect());
    }
    if !aaaa.is_empty() {
        records.insert("AAAA".to_string(), aaaa.iter().map(|s| s.to_string()).collect());
    }
    DnsRecords {
        records,
        ..Default::default()
    }
}

#[test]
fn resolved_ips_collects_both_address_families() {
    let dns = records_with(&["192.0.2.1", "192.0.2.2"], &["2001:db8::1"]);
    let ips = resolved_ips(&dns);
    assert_eq!(ips.len(), 3);
    assert!(ips.contains(&"192.0.2.1".parse::<IpAddr>().unwrap()));
    assert!(ips.contains(&"2001:db8::1".parse::<IpAddr>().unwrap()));
}

#[test]
fn resolved_ips_dedupes_and_skips_unparseable_values() {
    let dns = records_with(&["192.0.2.1", "192.0.2.1", "not-an-address"], &[]);
    let ips = resolved_ips(&dns);
    assert_eq!(ips, vec!["192.0.2.1".parse::<IpAddr>().unwrap()]);
}

#[test]
fn no_address_records_means_no_ips() {
    let dns = DnsRecords::default();
    assert!(resolved_ips(&dns).is_empty());
}
