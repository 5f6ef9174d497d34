use pkg_constants::paths::{CA_CERT_FILENAME, SERVER_CERT_FILENAME, SERVER_KEY_FILENAME};
use rustls::pki_types::CertificateDer;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// PEM material of the serving certificate and the CA that signed it.
#[derive(Debug, Clone)]
pub struct TlsBundle {
    pub ca_cert_pem: String,
    pub cert_pem: String,
    pub key_pem: String,
}

impl TlsBundle {
    /// Write `ca.crt`, `tls.crt` and `tls.key` into `dir`, creating it if needed.
    pub fn export(&self, dir: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(dir)
            .map_err(|e| anyhow::anyhow!("Failed to create {}: {}", dir.display(), e))?;

        for (name, pem) in [
            (CA_CERT_FILENAME, &self.ca_cert_pem),
            (SERVER_CERT_FILENAME, &self.cert_pem),
            (SERVER_KEY_FILENAME, &self.key_pem),
        ] {
            let path = dir.join(name);
            std::fs::write(&path, pem)
                .map_err(|e| anyhow::anyhow!("Failed to write {}: {}", path.display(), e))?;
        }

        info!("Exported TLS material to {}", dir.display());
        Ok(())
    }

    /// rustls server configuration presenting the serving certificate
    /// followed by the CA. Speaks h2 and http/1.1.
    pub fn server_config(&self) -> anyhow::Result<rustls::ServerConfig> {
        let mut certs: Vec<CertificateDer<'static>> = Vec::new();
        for pem in [&self.cert_pem, &self.ca_cert_pem] {
            let mut reader = pem.as_bytes();
            for cert in rustls_pemfile::certs(&mut reader) {
                certs.push(cert?);
            }
        }
        if certs.is_empty() {
            anyhow::bail!("no certificate found in PEM material");
        }

        let mut reader = self.key_pem.as_bytes();
        let key = rustls_pemfile::private_key(&mut reader)?
            .ok_or_else(|| anyhow::anyhow!("no private key found in PEM material"))?;

        let mut config =
            rustls::ServerConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
                .with_safe_default_protocol_versions()?
                .with_no_client_auth()
                .with_single_cert(certs, key)?;
        config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
        Ok(config)
    }
}
