//! Integration tests for the discovery loop against fake servers on
//! loopback.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use salvo_discovery::{DiscoveryConfig, DiscoveryHandle, DiscoveryService};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::sleep;

const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// A fake server that answers every challenge with `reply`.
async fn fake_server(reply: &'static str) -> (u16, JoinHandle<()>) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = socket.local_addr().unwrap().port();
    let defaults = DiscoveryConfig::default();

    let task = tokio::spawn(async move {
        let mut buf = [0u8; 256];
        loop {
            let Ok((len, from)) = socket.recv_from(&mut buf).await else {
                return;
            };
            if &buf[..len] == defaults.challenge.as_bytes() {
                let _ = socket.send_to(reply.as_bytes(), from).await;
            }
        }
    });
    (port, task)
}

fn loopback_config(port: u16) -> DiscoveryConfig {
    DiscoveryConfig {
        port,
        broadcast_addr: LOCALHOST,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        listen_window: Duration::from_millis(100),
        initial_jitter: Duration::ZERO,
        ..DiscoveryConfig::default()
    }
}

async fn start(port: u16) -> (DiscoveryHandle, salvo_notify::Subscription<Vec<IpAddr>>) {
    let mut service = DiscoveryService::bind(loopback_config(port)).await.unwrap();
    let found = service.subscribe();
    (service.start(), found)
}

#[tokio::test]
async fn test_discovery_same_server_across_cycles_notifies_once() {
    let (port, server) = fake_server("I_AM_A_BATTLESHIP_PLUS_PLUS_SERVER").await;
    let (handle, mut found) = start(port).await;

    // Long enough for at least three cycles.
    sleep(Duration::from_millis(350)).await;

    assert_eq!(found.drain(), vec![vec![LOCALHOST]]);
    assert_eq!(handle.servers().await.unwrap(), vec![LOCALHOST]);

    handle.stop().await;
    server.abort();
}

#[tokio::test]
async fn test_discovery_wrong_payload_is_ignored() {
    let (port, server) = fake_server("HELLO").await;
    let (handle, mut found) = start(port).await;

    sleep(Duration::from_millis(250)).await;

    assert!(found.drain().is_empty());
    assert!(handle.servers().await.unwrap().is_empty());

    handle.stop().await;
    server.abort();
}

#[tokio::test]
async fn test_discovery_silent_network_keeps_cycling() {
    // Nobody listens on this port: every window times out.
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = silent.local_addr().unwrap().port();
    drop(silent);

    let (handle, _found) = start(port).await;
    sleep(Duration::from_millis(250)).await;

    assert!(handle.is_running());
    assert!(handle.servers().await.unwrap().is_empty());
    handle.stop().await;
}

#[tokio::test]
async fn test_discovery_reset_reports_server_again() {
    let (port, server) = fake_server("I_AM_A_BATTLESHIP_PLUS_PLUS_SERVER").await;
    let (handle, mut found) = start(port).await;

    sleep(Duration::from_millis(150)).await;
    assert_eq!(found.drain().len(), 1);

    handle.reset().await.unwrap();
    sleep(Duration::from_millis(250)).await;
    assert_eq!(found.drain(), vec![vec![LOCALHOST]]);

    handle.stop().await;
    server.abort();
}

#[tokio::test]
async fn test_discovery_late_subscriber_via_handle() {
    let (port, server) = fake_server("I_AM_A_BATTLESHIP_PLUS_PLUS_SERVER").await;
    let service = DiscoveryService::bind(loopback_config(port)).await.unwrap();
    let handle = service.start();

    let mut late = handle.subscribe().await.unwrap();
    handle.reset().await.unwrap();
    sleep(Duration::from_millis(250)).await;

    assert!(!late.drain().is_empty());

    handle.stop().await;
    server.abort();
}

#[tokio::test]
async fn test_discovery_stop_closes_handle() {
    let (handle, mut found) = start(1).await;
    handle.stop().await;

    assert_eq!(found.recv().await, None);
    assert!(!handle.is_running());
    assert!(handle.servers().await.is_err());
}
