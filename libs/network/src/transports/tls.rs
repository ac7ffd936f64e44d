//! Server-side TLS with mandatory client certificates
//!
//! Switches must present a certificate signed by one of the CAs in
//! `ca_certs`; connections without one fail the TLS handshake.

use crate::{Result, TransportError};
use checker_config::TlsSettings;
use rustls::server::AllowAnyAuthenticatedClient;
use rustls::{Certificate, PrivateKey, RootCertStore, ServerConfig};
use rustls_pemfile::Item;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;
use tracing::debug;

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).map_err(|e| {
        TransportError::security_with_source(format!("Failed to open {}", path.display()), e)
    })?;
    Ok(BufReader::new(file))
}

fn load_certs(path: &Path) -> Result<Vec<Certificate>> {
    let certs = rustls_pemfile::certs(&mut open(path)?).map_err(|e| {
        TransportError::security_with_source(format!("Invalid PEM in {}", path.display()), e)
    })?;
    if certs.is_empty() {
        return Err(TransportError::security(format!(
            "No certificates found in {}",
            path.display()
        )));
    }
    Ok(certs.into_iter().map(Certificate).collect())
}

fn load_key(path: &Path) -> Result<PrivateKey> {
    let mut reader = open(path)?;
    loop {
        let item = rustls_pemfile::read_one(&mut reader).map_err(|e| {
            TransportError::security_with_source(format!("Invalid PEM in {}", path.display()), e)
        })?;
        match item {
            Some(Item::RSAKey(key)) | Some(Item::PKCS8Key(key)) | Some(Item::ECKey(key)) => {
                return Ok(PrivateKey(key))
            }
            Some(_) => continue,
            None => {
                return Err(TransportError::security(format!(
                    "No private key found in {}",
                    path.display()
                )))
            }
        }
    }
}

/// Build the acceptor used by `OfpListener`
pub fn build_acceptor(settings: &TlsSettings) -> Result<TlsAcceptor> {
    let mut roots = RootCertStore::empty();
    for ca in load_certs(&settings.ca_certs)? {
        roots
            .add(&ca)
            .map_err(|e| TransportError::security_with_source("Invalid CA certificate", e))?;
    }
    let verifier = AllowAnyAuthenticatedClient::new(roots).boxed();

    let config = ServerConfig::builder()
        .with_safe_defaults()
        .with_client_cert_verifier(verifier)
        .with_single_cert(load_certs(&settings.certfile)?, load_key(&settings.keyfile)?)
        .map_err(|e| TransportError::security_with_source("Invalid server certificate or key", e))?;

    debug!(certfile = %settings.certfile.display(), "TLS acceptor ready");
    Ok(TlsAcceptor::from(Arc::new(config)))
}
