// src/core/net/tls.rs

use chrono::{DateTime, Utc};
use native_tls::TlsConnector;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use tokio::task::spawn_blocking;
use tracing::debug;
use x509_parser::prelude::*;

use crate::core::models::CertificateSummary;
use crate::core::prober::{FailureKind, ProbeError};

/// Fetches and summarizes the certificate presented by `host:port`.
///
/// native-tls is blocking, so the handshake runs on the blocking thread
/// pool and the connect/read deadlines bound how long that thread is held.
pub async fn fetch_certificate(
    host: &str,
    port: u16,
    timeout: Duration,
) -> Result<CertificateSummary, ProbeError> {
    debug!(host, port, "Fetching TLS certificate.");
    let host = host.to_string();
    spawn_blocking(move || fetch_blocking(&host, port, timeout))
        .await
        .unwrap_or_else(|error| {
            Err(ProbeError::new(
                FailureKind::Unexpected,
                format!("TLS task panicked: {error}"),
            ))
        })
}

fn fetch_blocking(host: &str, port: u16, timeout: Duration) -> Result<CertificateSummary, ProbeError> {
    // Invalid certs and hostname mismatches are accepted on purpose: the
    // point is to report what the endpoint presents, not to validate it.
    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|error| ProbeError::new(FailureKind::Tls, format!("TlsConnector error: {error}")))?;

    let addr = (host, port)
        .to_socket_addrs()
        .map_err(|error| {
            ProbeError::new(
                FailureKind::Connection,
                format!("address resolution failed: {error}"),
            )
        })?
        .next()
        .ok_or_else(|| {
            ProbeError::new(FailureKind::Connection, format!("{host} did not resolve"))
        })?;

    let stream = TcpStream::connect_timeout(&addr, timeout).map_err(|error| {
        ProbeError::new(
            FailureKind::Connection,
            format!("TCP connection error: {error}"),
        )
    })?;
    let _ = stream.set_read_timeout(Some(timeout));
    let _ = stream.set_write_timeout(Some(timeout));

    let stream = connector.connect(host, stream).map_err(|error| {
        ProbeError::new(FailureKind::Tls, format!("TLS handshake error: {error}"))
    })?;

    let cert = stream
        .peer_certificate()
        .map_err(|error| {
            ProbeError::new(
                FailureKind::Tls,
                format!("could not get peer certificate: {error}"),
            )
        })?
        .ok_or_else(|| {
            ProbeError::new(FailureKind::Tls, "server did not provide a certificate")
        })?;

    let der = cert.to_der().map_err(|error| {
        ProbeError::new(
            FailureKind::Tls,
            format!("could not convert certificate to DER: {error}"),
        )
    })?;
    summarize(&der)
}

/// Parses a DER certificate into the summary the reports carry.
pub fn summarize(der: &[u8]) -> Result<CertificateSummary, ProbeError> {
    let (_, x509) = parse_x509_certificate(der)
        .map_err(|error| ProbeError::new(FailureKind::Tls, format!("X.509 parse error: {error}")))?;

    let validity = x509.validity();
    let not_before = asn1_time_to_utc(&validity.not_before);
    let not_after = asn1_time_to_utc(&validity.not_after);
    let now = Utc::now();

    Ok(CertificateSummary {
        subject: x509.subject().to_string(),
        issuer: x509.issuer().to_string(),
        not_before,
        not_after,
        days_until_expiry: not_after.signed_duration_since(now).num_days(),
        is_valid: now > not_before && now < not_after,
    })
}

fn asn1_time_to_utc(time: &ASN1Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.timestamp(), 0).unwrap_or_default()
}
