// src/core/scanner/port_scanner.rs

use once_cell::sync::Lazy;
use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::core::models::{PortMap, PortResult};
use crate::core::net::tls;
use crate::core::prober::{FailureKind, ProbeDescriptor, ProbeError, ProbeOutcome, Prober};

/// Ports conventionally carrying TLS, worth a certificate summary.
const TLS_PORTS: &[u16] = &[443, 8443];

const BANNER_READ_TIMEOUT: Duration = Duration::from_millis(300);
const BANNER_LIMIT: usize = 1024;

/// Hard cap on the certificate fetch. The per-read socket timeouts do not
/// bound the handshake as a whole, so a peer dripping one byte per read
/// could otherwise hold the probe past its deadline and cost us an open
/// port. Fits inside the headroom the prober deadline leaves over the
/// connect timeout.
const CERT_FETCH_TIMEOUT: Duration = Duration::from_secs(4);

/// The default port list for a domain scan.
pub const DEFAULT_TOP_PORTS: &[u16] = &[
    21, 22, 23, 25, 26, 53, 80, 81, 110, 111, 135, 139, 143, 443, 445, 465, 587, 993, 995, 1025,
    1433, 1434, 1521, 1723, 2082, 2083, 2086, 2087, 2095, 2096, 2222, 2375, 2376, 3000, 3128,
    3306, 3389, 4242, 4243, 4444, 4567, 5000, 5222, 5223, 5432, 5555, 5672, 5900, 5984, 6000,
    6082, 6379, 7000, 7001, 8000, 8008, 8009, 8010, 8080, 8081, 8082, 8083, 8084, 8085, 8086,
    8087, 8088, 8089, 8090, 8091, 8443, 8880, 8888, 9000, 9001, 9042, 9090, 9092, 9160, 9200,
    9300, 10000, 11211, 11214, 11215, 13306, 27017, 27018, 27019, 28017, 49152, 49153, 49154,
    49155, 49156, 49157, 50000, 50030, 50070,
];

/// Well-known service names by port.
static SERVICE_NAMES: Lazy<BTreeMap<u16, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        (21, "FTP"),
        (22, "SSH"),
        (23, "Telnet"),
        (25, "SMTP"),
        (53, "DNS"),
        (80, "HTTP"),
        (110, "POP3"),
        (143, "IMAP"),
        (443, "HTTPS"),
        (445, "SMB"),
        (3306, "MySQL"),
        (3389, "RDP"),
        (5432, "PostgreSQL"),
        (5900, "VNC"),
        (6379, "Redis"),
        (8080, "HTTP-Proxy"),
        (8443, "HTTPS-Alt"),
        (27017, "MongoDB"),
    ])
});

/// Bytes written before the banner read, chosen by well-known port. Ports
/// not listed here get a blind read; chatty protocols (FTP, SSH, SMTP)
/// announce themselves without prompting.
static SERVICE_PROBES: Lazy<BTreeMap<u16, &'static [u8]>> = Lazy::new(|| {
    BTreeMap::from([
        (80, b"GET / HTTP/1.0\r\n\r\n" as &[u8]),
        (443, b"GET / HTTP/1.0\r\n\r\n"),
        (3306, b"\x0a"),
        (5432, b"\x00\x00\x00\x08\x04\xd2\x16\x2f"),
        (6379, b"INFO\r\n"),
        (27017, b"\x41\x00\x00\x00"),
    ])
});

/// TCP connect scanner. A port is open iff the connect succeeds within the
/// timeout; banner and certificate extraction are best-effort enrichments
/// whose failure never downgrades an open port.
#[derive(Debug, Clone)]
pub struct PortScanner {
    pub concurrency: usize,
    pub timeout: Duration,
}

impl Default for PortScanner {
    fn default() -> Self {
        Self {
            concurrency: 100,
            timeout: Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone)]
struct OpenPort {
    ip: IpAddr,
    port: u16,
    result: PortResult,
}

impl PortScanner {
    pub fn new(concurrency: usize, timeout: Duration) -> Self {
        Self {
            concurrency,
            timeout,
        }
    }

    /// Scans every (IP, port) pair and returns only the open ports, keyed
    /// by IP then port. An empty IP set is a valid input and yields an
    /// empty map.
    pub async fn scan(&self, ips: &[IpAddr], ports: &[u16]) -> PortMap {
        let mut map = PortMap::new();
        if ips.is_empty() || ports.is_empty() {
            info!("Nothing to scan: empty IP or port set.");
            return map;
        }

        // One descriptor per unique pair; duplicated input collapses here.
        let mut pairs = BTreeSet::new();
        for &ip in ips {
            for &port in ports {
                pairs.insert((ip, port));
            }
        }
        info!(pairs = pairs.len(), "Starting port scan.");

        let connect_timeout = self.timeout;
        let descriptors: Vec<ProbeDescriptor<OpenPort>> = pairs
            .into_iter()
            .map(|(ip, port)| {
                ProbeDescriptor::new(format!("{ip}:{port}"), move || {
                    probe_port(ip, port, connect_timeout)
                })
            })
            .collect();

        // A closed port is an answer, not a transient fault: retries = 0.
        // The prober deadline leaves headroom over the connect timeout for
        // the banner read and certificate fetch.
        let prober = Prober::new(
            self.concurrency,
            self.timeout + Duration::from_secs(5),
            0,
        );
        let mut rx = prober.run(descriptors, CancellationToken::new());
        while let Some(event) = rx.recv().await {
            match event.outcome {
                ProbeOutcome::Success { payload } => {
                    debug!(ip = %payload.ip, port = payload.port, service = %payload.result.service, "Open port.");
                    map.entry(payload.ip.to_string())
                        .or_default()
                        .insert(payload.port, payload.result);
                }
                // Closed, filtered or timed out; closed ports are not recorded.
                ProbeOutcome::Failure { .. } => {}
            }
        }

        let open: usize = map.values().map(BTreeMap::len).sum();
        info!(open, "Port scan finished.");
        map
    }
}

async fn probe_port(ip: IpAddr, port: u16, timeout: Duration) -> Result<OpenPort, ProbeError> {
    let addr = SocketAddr::new(ip, port);
    let mut stream = time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| {
            ProbeError::new(
                FailureKind::Timeout,
                format!("{addr} did not answer within {:.1}s", timeout.as_secs_f64()),
            )
        })?
        .map_err(|error| {
            ProbeError::new(
                FailureKind::Connection,
                format!("connect to {addr} failed: {error}"),
            )
        })?;

    // The port is open from here on; enrichment failures must not change that.
    let banner = grab_banner(&mut stream, port).await;
    drop(stream);

    let tls = if TLS_PORTS.contains(&port) {
        time::timeout(
            CERT_FETCH_TIMEOUT,
            tls::fetch_certificate(&ip.to_string(), port, timeout),
        )
        .await
        .ok()
        .and_then(Result::ok)
    } else {
        None
    };

    let service = SERVICE_NAMES
        .get(&port)
        .map(|name| name.to_string())
        .or_else(|| banner.clone())
        .unwrap_or_else(|| "unknown".to_string());

    Ok(OpenPort {
        ip,
        port,
        result: PortResult {
            state: "open".to_string(),
            service,
            banner,
            tls,
        },
    })
}

/// Short, best-effort banner read: write the port's probe bytes if it has
/// any, then read whatever the peer offers within a tight deadline.
async fn grab_banner(stream: &mut TcpStream, port: u16) -> Option<String> {
    if let Some(probe) = SERVICE_PROBES.get(&port) {
        let _ = stream.write_all(probe).await;
    }
    let mut buf = vec![0u8; BANNER_LIMIT];
    match time::timeout(BANNER_READ_TIMEOUT, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            buf.truncate(n);
            let text = String::from_utf8_lossy(&buf);
            let banner = text
                .trim_matches(char::from(0))
                .trim()
                .replace(['\r', '\n'], " ");
            if banner.is_empty() { None } else { Some(banner) }
        }
        _ => None,
    }
}
