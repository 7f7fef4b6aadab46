// src/core/net/mod.rs

// Thin clients over the external collaborators the core consumes. Each one
// maps its library's errors onto the shared `FailureKind` taxonomy so the
// prober can tell transient faults from permanent ones.

pub mod crtsh;
pub mod dns;
pub mod http;
pub mod tls;
