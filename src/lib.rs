//! magpie-rs-recon — asynchronous OSINT reconnaissance library.
//!
//! Given a domain or a username, the crate gathers public information about
//! it: DNS records, open ports and service banners, TLS certificate data,
//! subdomains, HTTP fingerprints, and account presence across third-party
//! sites. All probing runs through a single bounded concurrent prober so a
//! scan never opens more simultaneous connections than its concurrency
//! budget allows.

pub mod core;
pub mod logging;
