//! TLS configuration and certificate loading.
//!
//! Credentials are loaded exactly once, when a service is built. The PEM
//! files are parsed up front so that a missing, empty or garbled file is
//! reported with the offending path instead of a generic rustls error.

use std::io;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

/// Failure to turn a certificate/key pair into live transport credentials.
#[derive(Debug, Error)]
pub enum CredentialLoadError {
    /// TLS was requested but one of the paths was left empty.
    #[error("tls is enabled but the {0} path is empty")]
    MissingPath(CredentialKind),

    /// The file does not exist or could not be read.
    #[error("failed to read {kind} file {path:?}: {source}")]
    Read {
        kind: CredentialKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file is not valid PEM.
    #[error("malformed {kind} file {path:?}: {source}")]
    Malformed {
        kind: CredentialKind,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("no certificates found in {path:?}")]
    NoCertificates { path: PathBuf },

    #[error("no private key found in {path:?}")]
    NoPrivateKey { path: PathBuf },

    /// rustls refused the pair (unsupported key type, etc).
    #[error("tls credentials rejected: {0}")]
    Rejected(#[source] io::Error),
}

/// Which half of the credential pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialKind {
    Certificate,
    PrivateKey,
}

impl std::fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialKind::Certificate => write!(f, "certificate"),
            CredentialKind::PrivateKey => write!(f, "private key"),
        }
    }
}

/// Load TLS configuration from certificate and key files.
pub async fn load_credentials(
    cert_path: &Path,
    key_path: &Path,
) -> Result<RustlsConfig, CredentialLoadError> {
    if cert_path.as_os_str().is_empty() {
        return Err(CredentialLoadError::MissingPath(CredentialKind::Certificate));
    }
    if key_path.as_os_str().is_empty() {
        return Err(CredentialLoadError::MissingPath(CredentialKind::PrivateKey));
    }

    let cert_pem = read_pem(CredentialKind::Certificate, cert_path).await?;
    let key_pem = read_pem(CredentialKind::PrivateKey, key_path).await?;

    let certs = rustls_pemfile::certs(&mut cert_pem.as_slice())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| CredentialLoadError::Malformed {
            kind: CredentialKind::Certificate,
            path: cert_path.to_path_buf(),
            source,
        })?;
    if certs.is_empty() {
        return Err(CredentialLoadError::NoCertificates {
            path: cert_path.to_path_buf(),
        });
    }

    let key = rustls_pemfile::private_key(&mut key_pem.as_slice()).map_err(|source| {
        CredentialLoadError::Malformed {
            kind: CredentialKind::PrivateKey,
            path: key_path.to_path_buf(),
            source,
        }
    })?;
    if key.is_none() {
        return Err(CredentialLoadError::NoPrivateKey {
            path: key_path.to_path_buf(),
        });
    }

    let config = RustlsConfig::from_pem(cert_pem, key_pem)
        .await
        .map_err(CredentialLoadError::Rejected)?;

    tracing::debug!(
        cert_path = %cert_path.display(),
        certificates = certs.len(),
        "TLS credentials loaded"
    );

    Ok(config)
}

async fn read_pem(kind: CredentialKind, path: &Path) -> Result<Vec<u8>, CredentialLoadError> {
    tokio::fs::read(path)
        .await
        .map_err(|source| CredentialLoadError::Read {
            kind,
            path: path.to_path_buf(),
            source,
        })
}
