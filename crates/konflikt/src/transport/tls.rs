//! TLS acceptor setup from PEM certificate and key files.

use std::path::Path;
use std::sync::Arc;

use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

use super::TransportError;

/// Builds a [`TlsAcceptor`] from PEM files.
///
/// Encrypted private keys are not supported by the rustls PEM loader; a
/// configured passphrase is rejected up front rather than failing with an
/// opaque parse error later.
pub fn acceptor_from_pem(
    cert_path: &Path,
    key_path: &Path,
    passphrase: Option<&str>,
) -> Result<TlsAcceptor, TransportError> {
    if passphrase.is_some_and(|p| !p.is_empty()) {
        return Err(TransportError::Tls(
            "encrypted TLS keys are not supported; decrypt the key first".to_string(),
        ));
    }

    let cert_file = std::fs::read(cert_path)
        .map_err(|e| TransportError::Tls(format!("cannot read {}: {e}", cert_path.display())))?;
    let certs: Vec<CertificateDer<'static>> =
        rustls_pemfile::certs(&mut cert_file.as_slice())
            .collect::<Result<_, _>>()
            .map_err(|e| TransportError::Tls(format!("bad certificate PEM: {e}")))?;
    if certs.is_empty() {
        return Err(TransportError::Tls(format!(
            "no certificates found in {}",
            cert_path.display()
        )));
    }

    let key_file = std::fs::read(key_path)
        .map_err(|e| TransportError::Tls(format!("cannot read {}: {e}", key_path.display())))?;
    let key: PrivateKeyDer<'static> = rustls_pemfile::private_key(&mut key_file.as_slice())
        .map_err(|e| TransportError::Tls(format!("bad private key PEM: {e}")))?
        .ok_or_else(|| {
            TransportError::Tls(format!("no private key found in {}", key_path.display()))
        })?;

    let config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .map_err(|e| TransportError::Tls(format!("invalid certificate/key pair: {e}")))?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
