use magpie_rs_recon::core::net::http::HttpClient;
use reqwest::Method;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Accepts one connection, captures the raw request head, answers 200 and
/// hands the head back through the channel.
async fn capture_server(head_tx: oneshot::Sender<Vec<u8>>) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind loopback");
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let Ok((mut stream, _)) = listener.accept().await else {
            return;
        };
        let mut buf = [0u8; 4096];
        let mut seen = Vec::new();
        loop {
            match stream.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => {
                    seen.extend_from_slice(&buf[..n]);
                    if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                Err(_) => return,
            }
        }
        let _ = stream
            .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
            .await;
        let _ = head_tx.send(seen);
    });
    port
}

fn user_agent_lines(head: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(head)
        .lines()
        .filter(|line| line.to_ascii_lowercase().starts_with("user-agent:"))
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn site_specific_user_agent_replaces_the_default_one() {
    let (head_tx, head_rx) = oneshot::channel();
    let port = capture_server(head_tx).await;

    let client = HttpClient::new(Duration::from_secs(5), None).expect("client builds");
    let mut extra = BTreeMap::new();
    extra.insert("User-Agent".to_string(), "custom-agent/1.0".to_string());
    client
        .probe(
            Method::GET,
            &format!("http://127.0.0.1:{port}/"),
            "Mozilla/5.0 (default)",
            &extra,
            false,
        )
        .await
        .expect("probe succeeds");

    let head = head_rx.await.expect("request head captured");
    let agents = user_agent_lines(&head);
    assert_eq!(agents.len(), 1, "exactly one User-Agent header: {agents:?}");
    assert!(agents[0].contains("custom-agent/1.0"));
    assert!(!agents[0].contains("Mozilla"));
}

#[tokio::test]
async fn default_user_agent_is_sent_exactly_once() {
    let (head_tx, head_rx) = oneshot::channel();
    let port = capture_server(head_tx).await;

    let client = HttpClient::new(Duration::from_secs(5), None).expect("client builds");
    client
        .probe(
            Method::GET,
            &format!("http://127.0.0.1:{port}/"),
            "Mozilla/5.0 (default)",
            &BTreeMap::new(),
            false,
        )
        .await
        .expect("probe succeeds");

    let head = head_rx.await.expect("request head captured");
    let agents = user_agent_lines(&head);
    assert_eq!(agents.len(), 1, "exactly one User-Agent header: {agents:?}");
    assert!(agents[0].contains("Mozilla/5.0 (default)"));
}
