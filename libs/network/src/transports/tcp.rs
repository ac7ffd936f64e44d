//! TCP Listener for Switch Connections
//!
//! Binds the controller port and accepts switches under a deadline. When
//! TLS is configured every accepted socket completes the TLS handshake
//! (client certificate required) before it is handed out.

use super::PeerStream;
use crate::{Result, TransportError};
use checker_config::TlsSettings;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

pub struct OfpListener {
    listener: TcpListener,
    local_addr: SocketAddr,
    #[cfg(feature = "tls")]
    acceptor: Option<tokio_rustls::TlsAcceptor>,
}

impl OfpListener {
    /// Bind `addr`, preparing the TLS acceptor when `tls` is set
    pub async fn bind(addr: &str, tls: Option<&TlsSettings>) -> Result<Self> {
        if tls.is_some() && !cfg!(feature = "tls") {
            return Err(TransportError::configuration(
                "TLS configured but the `tls` feature is not enabled",
                Some("tls"),
            ));
        }
        #[cfg(feature = "tls")]
        let acceptor = tls.map(super::tls::build_acceptor).transpose()?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| TransportError::io(format!("Failed to bind TCP listener on {}", addr), e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| TransportError::io("Failed to get local address", e))?;

        info!(%local_addr, tls = tls.is_some(), "Controller listening");
        Ok(Self {
            listener,
            local_addr,
            #[cfg(feature = "tls")]
            acceptor,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Accept one switch connection, failing with `Timeout` after `timeout`
    pub async fn accept(&self, timeout: Duration) -> Result<(PeerStream, SocketAddr)> {
        let (stream, peer_addr) = tokio::time::timeout(timeout, self.listener.accept())
            .await
            .map_err(|_| TransportError::timeout("accept", timeout.as_millis() as u64))?
            .map_err(|e| TransportError::io("Failed to accept TCP connection", e))?;

        // Configure TCP socket
        if let Err(e) = stream.set_nodelay(true) {
            warn!("Failed to set TCP_NODELAY: {}", e);
        }
        debug!(peer = %peer_addr, "Accepted TCP connection");

        #[cfg(feature = "tls")]
        let stream = match &self.acceptor {
            Some(acceptor) => {
                let stream = tokio::time::timeout(timeout, acceptor.accept(stream))
                    .await
                    .map_err(|_| TransportError::timeout("tls handshake", timeout.as_millis() as u64))?
                    .map_err(|e| TransportError::security_with_source("TLS handshake failed", e))?;
                debug!(peer = %peer_addr, "TLS session established");
                PeerStream::Tls(Box::new(stream))
            }
            None => PeerStream::Plain(stream),
        };
        #[cfg(not(feature = "tls"))]
        let stream = PeerStream::Plain(stream);

        Ok((stream, peer_addr))
    }
}
