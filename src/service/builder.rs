//! Step-by-step service configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::lifecycle::ShutdownHook;
use crate::net::tls::{load_credentials, CredentialLoadError};
use crate::rpc::TransportServer;
use crate::service::RpcService;

/// Default drain deadline used by `start_and_wait`.
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) type RegisterHandler = Box<dyn FnOnce(&mut TransportServer) + Send + 'static>;

/// Whether traffic is encrypted, and with which credential files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TransportSecurityPolicy {
    #[default]
    Plaintext,
    Encrypted { cert_path: PathBuf, key_path: PathBuf },
}

impl TransportSecurityPolicy {
    pub fn is_encrypted(&self) -> bool {
        matches!(self, TransportSecurityPolicy::Encrypted { .. })
    }
}

/// Accumulates configuration and produces a validated [`RpcService`].
///
/// Settings may be applied in any order. Nothing touches the filesystem
/// until [`build`](Self::build), which either returns a service with live
/// credentials or fails without side effects.
///
/// ```no_run
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// use axum::routing::post;
/// use rpc_service::ServiceBuilder;
///
/// let service = ServiceBuilder::new("greeter")
///     .enable_tls("certs/server.crt", "certs/server.key")
///     .register_handler(|server| {
///         server.add_method("/greeter.v1.Greeter/Hello", post(|| async { "hello" }));
///     })
///     .on_shutdown(|| println!("greeter stopped"))
///     .build()
///     .await?;
///
/// service.start_and_wait(50051).await?;
/// # Ok(())
/// # }
/// ```
pub struct ServiceBuilder {
    name: String,
    security: TransportSecurityPolicy,
    register_handler: RegisterHandler,
    on_shutdown: ShutdownHook,
    drain_timeout: Duration,
}

impl ServiceBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            security: TransportSecurityPolicy::Plaintext,
            register_handler: Box::new(|_| {}),
            on_shutdown: ShutdownHook::none(),
            drain_timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }

    /// Seed a builder from a validated configuration file.
    ///
    /// TLS paths are only carried over when `tls.enabled` is set.
    pub fn from_config(config: &ServiceConfig) -> Self {
        let builder =
            Self::new(config.name.clone()).drain_timeout(config.shutdown.drain_timeout());

        if config.tls.enabled {
            builder.enable_tls(&config.tls.cert_path, &config.tls.key_path)
        } else {
            builder
        }
    }

    /// Encrypt traffic with the given PEM files. Last call wins.
    pub fn enable_tls(mut self, cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        self.security = TransportSecurityPolicy::Encrypted {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        };
        self
    }

    /// Set the callback that attaches request handlers.
    ///
    /// It is invoked once, when the service starts, before any connection is
    /// accepted. Without it the service starts with no methods.
    pub fn register_handler(
        mut self,
        register: impl FnOnce(&mut TransportServer) + Send + 'static,
    ) -> Self {
        self.register_handler = Box::new(register);
        self
    }

    /// Set the cleanup that runs exactly once, after the service has drained.
    pub fn on_shutdown(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_shutdown = ShutdownHook::new(hook);
        self
    }

    /// Deadline for in-flight requests when `start_and_wait` stops the service.
    pub fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout = timeout;
        self
    }

    pub fn security_policy(&self) -> &TransportSecurityPolicy {
        &self.security
    }

    /// Load credentials (if encrypted) and produce a ready service.
    pub async fn build(self) -> Result<RpcService, CredentialLoadError> {
        let credentials = match &self.security {
            TransportSecurityPolicy::Plaintext => None,
            TransportSecurityPolicy::Encrypted {
                cert_path,
                key_path,
            } => Some(load_credentials(cert_path, key_path).await?),
        };

        tracing::debug!(
            service = %self.name,
            tls = credentials.is_some(),
            "Service built"
        );

        Ok(RpcService::new(
            self.name,
            credentials,
            self.register_handler,
            self.on_shutdown,
            self.drain_timeout,
        ))
    }
}

impl std::fmt::Debug for ServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceBuilder")
            .field("name", &self.name)
            .field("security", &self.security)
            .field("on_shutdown", &self.on_shutdown)
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ServiceConfig;
    use crate::lifecycle::ServiceState;
    use crate::net::tls::CredentialKind;

    use super::*;

    #[test]
    fn last_tls_call_wins() {
        let builder = ServiceBuilder::new("svc")
            .enable_tls("a.crt", "a.key")
            .enable_tls("b.crt", "b.key");

        assert_eq!(
            builder.security_policy(),
            &TransportSecurityPolicy::Encrypted {
                cert_path: "b.crt".into(),
                key_path: "b.key".into(),
            }
        );
    }

    #[tokio::test]
    async fn plaintext_build_always_succeeds() {
        let service = ServiceBuilder::new("svc").build().await.unwrap();
        assert_eq!(service.name(), "svc");
        assert!(!service.is_encrypted());
        assert_eq!(service.state(), ServiceState::Ready);
    }

    #[tokio::test]
    async fn disabled_tls_ignores_paths() {
        let mut config = ServiceConfig::default();
        config.tls.enabled = false;
        config.tls.cert_path = "/no/such/cert.pem".into();
        config.tls.key_path = String::new();

        let builder = ServiceBuilder::from_config(&config);
        assert!(!builder.security_policy().is_encrypted());
        assert!(builder.build().await.is_ok());
    }

    #[tokio::test]
    async fn enabled_tls_with_empty_path_fails_build() {
        let mut config = ServiceConfig::default();
        config.tls.enabled = true;
        config.tls.key_path = "/some/key.pem".into();

        let err = ServiceBuilder::from_config(&config)
            .build()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CredentialLoadError::MissingPath(CredentialKind::Certificate)
        ));
    }

    #[test]
    fn from_config_carries_drain_timeout() {
        let mut config = ServiceConfig::default();
        config.shutdown.drain_timeout_secs = 7;
        let builder = ServiceBuilder::from_config(&config);
        assert_eq!(builder.drain_timeout, Duration::from_secs(7));
    }
}
