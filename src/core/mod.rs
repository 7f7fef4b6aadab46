// src/core/mod.rs

/// Contains all report and data structures returned by the orchestrators,
/// such as `UsernameReport`, `DomainReport`, `PortResult` and `Verdict`.
pub mod models;

/// The bounded concurrent prober: fans out independent, failure-prone
/// network probes under a concurrency cap and yields outcomes in
/// completion order.
pub mod prober;

/// The static site catalog for username enumeration and its detection-rule
/// schema, loaded once per scanner and read-only thereafter.
pub mod catalog;

/// The detection rule evaluator: classifies a completed HTTP response into
/// found / not-found. Pure functions, no I/O.
pub mod rules;

/// Thin clients over the network collaborators the core consumes: DNS
/// resolution, HTTP fetching, TLS certificate retrieval and the crt.sh
/// certificate-transparency log.
pub mod net;

/// The scan orchestrators for usernames, ports, subdomains and whole
/// domains.
pub mod scanner;
