use magpie_rs_recon::core::scanner::port_scanner::PortScanner;
use std::net::IpAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;

const LOOPBACK: IpAddr = IpAddr::V4(std::net::Ipv4Addr::LOCALHOST);

/// Binds a loopback listener that greets every connection with `banner`
/// and returns the port it landed on.
async fn banner_server(banner: &'static str) -> u16 {
    let listener = TcpListener::bind((LOOPBACK, 0)).await.expect("bind loopback");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(banner.as_bytes()).await;
        }
    });
    port
}

/// A port that was bound and then released, so connects are refused.
async fn closed_port() -> u16 {
    let listener = TcpListener::bind((LOOPBACK, 0)).await.expect("bind loopback");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

#[tokio::test]
async fn open_port_is_reported_with_its_banner() {
    let port = banner_server("SSH-2.0-TestServer\r\n").await;
    let scanner = PortScanner::new(10, Duration::from_secs(2));

    let map = scanner.scan(&[LOOPBACK], &[port]).await;

    let ports = map.get("127.0.0.1").expect("loopback entry");
    let result = ports.get(&port).expect("open port recorded");
    assert_eq!(result.state, "open");
    assert_eq!(result.banner.as_deref(), Some("SSH-2.0-TestServer"));
    // Unknown port number: the banner doubles as the service name.
    assert_eq!(result.service, "SSH-2.0-TestServer");
    assert!(result.tls.is_none());
}

#[tokio::test]
async fn closed_port_is_absent_from_the_map() {
    let open = banner_server("hello\r\n").await;
    let closed = closed_port().await;
    let scanner = PortScanner::new(10, Duration::from_secs(2));

    let map = scanner.scan(&[LOOPBACK], &[open, closed]).await;

    let ports = map.get("127.0.0.1").expect("loopback entry");
    assert!(ports.contains_key(&open));
    assert!(!ports.contains_key(&closed));
}

#[tokio::test]
async fn fully_closed_target_yields_empty_map() {
    let closed = closed_port().await;
    let scanner = PortScanner::new(10, Duration::from_secs(2));

    let map = scanner.scan(&[LOOPBACK], &[closed]).await;
    assert!(map.is_empty());
}

#[tokio::test]
async fn empty_inputs_yield_empty_map() {
    let scanner = PortScanner::new(10, Duration::from_secs(2));
    assert!(scanner.scan(&[], &[80]).await.is_empty());
    assert!(scanner.scan(&[LOOPBACK], &[]).await.is_empty());
}

#[tokio::test]
async fn stalling_tls_peer_does_not_drop_an_open_port() {
    // 8443 is one of the ports that gets certificate enrichment.
    let listener = match TcpListener::bind((LOOPBACK, 8443)).await {
        Ok(listener) => listener,
        // Port already taken on this machine; nothing to verify.
        Err(_) => return,
    };
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                // A TLS record header announcing a 64-byte payload, then one
                // byte at a time, slowly: each read succeeds so the per-read
                // socket timeout never fires and the handshake never ends.
                let _ = stream.write_all(&[0x16, 0x03, 0x03, 0x00, 0x40]).await;
                for _ in 0..8 {
                    tokio::time::sleep(Duration::from_millis(900)).await;
                    if stream.write_all(&[0x00]).await.is_err() {
                        return;
                    }
                }
            });
        }
    });

    let scanner = PortScanner::new(10, Duration::from_secs(2));
    let map = scanner.scan(&[LOOPBACK], &[8443]).await;

    let ports = map.get("127.0.0.1").expect("loopback entry");
    let result = ports
        .get(&8443)
        .expect("the TCP connect succeeded, so the port must stay open");
    assert_eq!(result.state, "open");
    // The enrichment timed out; the open-port fact survives without it.
    assert!(result.tls.is_none());
}

#[tokio::test]
async fn duplicate_inputs_collapse_to_one_probe() {
    let port = banner_server("greeting\r\n").await;
    let scanner = PortScanner::new(10, Duration::from_secs(2));

    let map = scanner
        .scan(&[LOOPBACK, LOOPBACK], &[port, port, port])
        .await;

    assert_eq!(map.len(), 1);
    let ports = map.get("127.0.0.1").unwrap();
    assert_eq!(ports.len(), 1);
    assert!(ports.contains_key(&port));
}
