//! Mutual TLS: switches must present a certificate signed by the configured CA

use anyhow::Result;
use network::{OfpChecker, OfpListener, TransportError};
use ofp_e2e_tests::{init_tracing, loopback_config, MockSwitch, MockSwitchConfig, TestPki};
use rustls::ClientConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use types::{Body, Message};

const WAIT: Duration = Duration::from_secs(5);

async fn connect(addr: SocketAddr, client: Arc<ClientConfig>) -> Result<TlsStream<TcpStream>> {
    let tcp = TcpStream::connect(addr).await?;
    let name = rustls::ServerName::try_from("localhost")?;
    Ok(TlsConnector::from(client).connect(name, tcp).await?)
}

#[tokio::test]
async fn test_listener_accepts_certified_client() {
    init_tracing();
    let pki = TestPki::generate().unwrap();
    let listener = OfpListener::bind("127.0.0.1:0", Some(&pki.settings()))
        .await
        .unwrap();

    let client = tokio::spawn(connect(listener.local_addr(), pki.client_config().unwrap()));
    let (stream, _) = listener.accept(WAIT).await.unwrap();
    assert!(stream.is_tls());

    let _client = client.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_listener_rejects_client_without_certificate() {
    init_tracing();
    let pki = TestPki::generate().unwrap();
    let listener = OfpListener::bind("127.0.0.1:0", Some(&pki.settings()))
        .await
        .unwrap();

    let client = tokio::spawn(connect(
        listener.local_addr(),
        pki.anonymous_client_config().unwrap(),
    ));
    let err = listener.accept(WAIT).await.unwrap_err();
    assert!(matches!(err, TransportError::Security { .. }));
    assert_eq!(err.category(), "security");

    // the client side may or may not notice before the socket closes
    let _ = client.await.unwrap();
}

#[tokio::test]
async fn test_start_keeps_accepting_after_rejected_client() {
    init_tracing();
    let pki = TestPki::generate().unwrap();
    let mut config = loopback_config(&[6]);
    config.tls = Some(pki.settings());
    let mut checker = OfpChecker::new(config);
    let addr = checker.listen().await.unwrap();

    let anonymous = MockSwitchConfig::new(9).with_tls(pki.anonymous_client_config().unwrap());
    let _rejected = MockSwitch::connect(addr, anonymous);
    tokio::time::sleep(Duration::from_millis(100)).await;
    let certified = MockSwitchConfig::new(6).with_tls(pki.client_config().unwrap());
    let switch = MockSwitch::connect(addr, certified);

    checker.start(&[6], WAIT).await.unwrap();
    assert_eq!(checker.identifiers(), vec![6]);
    assert!(matches!(
        checker.session(9),
        Err(TransportError::UnknownPeer { dpid: 9 })
    ));

    let sent = checker
        .send_msg(6, Message::barrier_request(), WAIT)
        .await
        .unwrap();
    let (_, reply) = checker
        .recv_msg(
            6,
            Message::new(Body::BarrierReply),
            Some(["msg_type", "xid"].into()),
            sent.xid,
            0,
            WAIT,
        )
        .await
        .unwrap();
    assert_eq!(reply.xid, sent.xid);

    checker.close().await;
    tokio::time::timeout(WAIT, switch.join())
        .await
        .unwrap()
        .unwrap();
}
