//! Throwaway certificate authority for TLS scenarios
//!
//! Issues a server certificate for `localhost` and one client certificate,
//! all signed by a fresh CA. PEM files live in a temporary directory that
//! is removed when the `TestPki` is dropped.

use anyhow::{Context, Result};
use checker_config::TlsSettings;
use rcgen::{
    BasicConstraints, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa, KeyPair,
    KeyUsagePurpose,
};
use rustls::{Certificate, ClientConfig, PrivateKey, RootCertStore};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestPki {
    dir: TempDir,
    ca_der: Vec<u8>,
    client_cert_der: Vec<u8>,
    client_key_der: Vec<u8>,
}

impl TestPki {
    pub fn generate() -> Result<Self> {
        let ca_key = KeyPair::generate()?;
        let mut ca_params = CertificateParams::default();
        ca_params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        ca_params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        ca_params
            .distinguished_name
            .push(DnType::CommonName, "ofcheck test CA");
        let ca = ca_params.self_signed(&ca_key)?;

        let server_key = KeyPair::generate()?;
        let mut server_params = CertificateParams::new(vec!["localhost".to_string()])?;
        server_params
            .distinguished_name
            .push(DnType::CommonName, "ofcheck controller");
        server_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ServerAuth];
        let server = server_params.signed_by(&server_key, &ca, &ca_key)?;

        let client_key = KeyPair::generate()?;
        let mut client_params = CertificateParams::default();
        client_params
            .distinguished_name
            .push(DnType::CommonName, "mock switch");
        client_params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];
        let client = client_params.signed_by(&client_key, &ca, &ca_key)?;

        let dir = tempfile::tempdir().context("Failed to create PKI directory")?;
        fs::write(dir.path().join("ca.pem"), ca.pem())?;
        fs::write(dir.path().join("server.pem"), server.pem())?;
        fs::write(dir.path().join("server.key"), server_key.serialize_pem())?;

        Ok(Self {
            dir,
            ca_der: ca.der().to_vec(),
            client_cert_der: client.der().to_vec(),
            client_key_der: client_key.serialize_der(),
        })
    }

    /// Listener settings: server certificate plus the CA for client verification
    pub fn settings(&self) -> TlsSettings {
        TlsSettings {
            certfile: self.dir.path().join("server.pem"),
            keyfile: self.dir.path().join("server.key"),
            ca_certs: self.dir.path().join("ca.pem"),
        }
    }

    fn roots(&self) -> Result<RootCertStore> {
        let mut roots = RootCertStore::empty();
        roots.add(&Certificate(self.ca_der.clone()))?;
        Ok(roots)
    }

    /// Client that presents the CA-signed switch certificate
    pub fn client_config(&self) -> Result<Arc<ClientConfig>> {
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(self.roots()?)
            .with_client_auth_cert(
                vec![Certificate(self.client_cert_der.clone())],
                PrivateKey(self.client_key_der.clone()),
            )?;
        Ok(Arc::new(config))
    }

    /// Client that trusts the server but has no certificate of its own
    pub fn anonymous_client_config(&self) -> Result<Arc<ClientConfig>> {
        let config = ClientConfig::builder()
            .with_safe_defaults()
            .with_root_certificates(self.roots()?)
            .with_no_client_auth();
        Ok(Arc::new(config))
    }
}
