use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, anyhow};
use rustls::ServerConfig;

/// Installs the process wide rustls crypto provider.
///
/// Both the kube client and the webhook listener rely on it. Installing it a
/// second time is a no-op.
pub fn install_crypto_provider() {
    // Fails only when a provider is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();
}

/// Builds the webhook listener TLS configuration from PEM files.
pub fn load_server_tls_config(
    cert_file: &str,
    private_key_file: &str,
) -> anyhow::Result<ServerConfig> {
    let mut cert_reader = BufReader::new(
        File::open(cert_file).with_context(|| format!("failed to open certificate {cert_file}"))?,
    );
    let mut certs = vec![];
    for cert in rustls_pemfile::certs(&mut cert_reader) {
        let cert = cert?;
        certs.push(cert);
    }
    if certs.is_empty() {
        return Err(anyhow!("no certificate found in {cert_file}"));
    }

    let mut key_reader = BufReader::new(
        File::open(private_key_file)
            .with_context(|| format!("failed to open private key {private_key_file}"))?,
    );
    let private_key = rustls_pemfile::private_key(&mut key_reader)?
        .ok_or_else(|| anyhow!("no private key found in {private_key_file}"))?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, private_key)?;

    Ok(config)
}
