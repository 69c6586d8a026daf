//! A single RPC service instance and its lifecycle.

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

use crate::lifecycle::shutdown::drain;
use crate::lifecycle::{wait_for_termination, ServiceState, ShutdownHook, StopOutcome};
use crate::net::listener;
use crate::observability::metrics;
use crate::rpc::TransportServer;
use crate::service::builder::RegisterHandler;
use crate::service::ServiceError;

/// How long to wait for the accept loop task to exit once its connections are gone.
const ACCEPT_LOOP_JOIN_GRACE: Duration = Duration::from_secs(1);

/// A built RPC service, owning its transport and listening socket.
///
/// Instances are single-use: `Ready → Listening → Draining → Stopped`.
/// Stopping can be triggered from any clone of the [`ServiceHandle`], from
/// the service itself, or by an OS signal in [`start_and_wait`](Self::start_and_wait);
/// all of them converge on the same drain-then-hook sequence.
pub struct RpcService {
    transport: Option<TransportServer>,
    register_handler: Option<RegisterHandler>,
    credentials: Option<RustlsConfig>,
    drain_timeout: Duration,
    local_addr: Option<SocketAddr>,
    shared: Arc<Shared>,
}

/// Cloneable control handle for a running service.
#[derive(Debug, Clone)]
pub struct ServiceHandle {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    name: String,
    encrypted: bool,
    server: Handle,
    state: watch::Sender<ServiceState>,
    stop_requested: AtomicBool,
    accept_loop: Mutex<Option<JoinHandle<io::Result<()>>>>,
    outcome: OnceLock<StopOutcome>,
    on_shutdown: ShutdownHook,
}

impl RpcService {
    pub(crate) fn new(
        name: String,
        credentials: Option<RustlsConfig>,
        register_handler: RegisterHandler,
        on_shutdown: ShutdownHook,
        drain_timeout: Duration,
    ) -> Self {
        let (state, _) = watch::channel(ServiceState::Ready);

        Self {
            transport: Some(TransportServer::new()),
            register_handler: Some(register_handler),
            drain_timeout,
            local_addr: None,
            shared: Arc::new(Shared {
                name,
                encrypted: credentials.is_some(),
                server: Handle::new(),
                state,
                stop_requested: AtomicBool::new(false),
                accept_loop: Mutex::new(None),
                outcome: OnceLock::new(),
                on_shutdown,
            }),
            credentials,
        }
    }

    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn is_encrypted(&self) -> bool {
        self.shared.encrypted
    }

    pub fn state(&self) -> ServiceState {
        self.shared.state()
    }

    /// Address the service is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Bind `0.0.0.0:port` and start accepting in the background.
    ///
    /// See [`start_async_on`](Self::start_async_on).
    pub fn start_async(&mut self, port: u16) -> Result<SocketAddr, ServiceError> {
        self.start_async_on(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Bind `addr` and start accepting in the background.
    ///
    /// The socket is bound before this returns, so bind failures are
    /// reported here; callers should treat them as fatal. The
    /// handler-registration callback runs once, before the accept loop is
    /// spawned, and never runs if the service was stopped first. A
    /// concurrent stop waits for the callback to return. The loop itself
    /// starts shortly after this returns.
    ///
    /// # Panics
    /// Must be called from within a Tokio runtime.
    pub fn start_async_on(&mut self, addr: SocketAddr) -> Result<SocketAddr, ServiceError> {
        if self.transport.is_none() {
            return Err(ServiceError::AlreadyStarted(self.state()));
        }
        let shared = &self.shared;
        if shared.stop_requested.load(Ordering::SeqCst) {
            return Err(ServiceError::Stopped);
        }

        let (socket, local_addr) = listener::bind(addr).inspect_err(|e| {
            tracing::error!(service = %shared.name, error = %e, "Failed to bind listener");
        })?;

        let (Some(mut transport), Some(register)) =
            (self.transport.take(), self.register_handler.take())
        else {
            return Err(ServiceError::AlreadyStarted(self.state()));
        };

        // The stop path takes the accept loop under the same lock after
        // raising `stop_requested`, so a concurrent stop either waits for
        // the task to exist or prevents registration and spawning entirely.
        let mut accept_loop = shared
            .accept_loop
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if shared.stop_requested.load(Ordering::SeqCst) {
            return Err(ServiceError::Stopped);
        }

        register(&mut transport);
        if transport.is_empty() {
            tracing::info!(service = %shared.name, "No handlers registered, serving an empty API");
        } else {
            tracing::debug!(service = %shared.name, methods = ?transport.methods(), "Handlers registered");
        }
        let app = transport.into_router().into_make_service();

        let span = tracing::info_span!("rpc_service", service = %shared.name);
        let server = shared.server.clone();

        let task = match &self.credentials {
            Some(tls) => tokio::spawn(
                axum_server::from_tcp_rustls(socket, tls.clone())
                    .handle(server)
                    .serve(app)
                    .instrument(span),
            ),
            None => tokio::spawn(
                axum_server::from_tcp(socket)
                    .handle(server)
                    .serve(app)
                    .instrument(span),
            ),
        };
        *accept_loop = Some(task);
        shared.state.send_replace(ServiceState::Listening);
        drop(accept_loop);

        self.local_addr = Some(local_addr);
        metrics::record_started(&shared.name, shared.encrypted);
        tracing::info!(
            service = %shared.name,
            address = %local_addr,
            tls = shared.encrypted,
            "Service started"
        );

        Ok(local_addr)
    }

    /// Start on `0.0.0.0:port` and wait for SIGINT/SIGTERM, then stop gracefully.
    ///
    /// See [`start_and_wait_on`](Self::start_and_wait_on).
    pub async fn start_and_wait(self, port: u16) -> Result<StopOutcome, ServiceError> {
        self.start_and_wait_on(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
            .await
    }

    /// Start on `addr` and wait for SIGINT/SIGTERM, then stop within the
    /// configured drain timeout.
    ///
    /// Also returns if the service is stopped through a [`ServiceHandle`].
    pub async fn start_and_wait_on(self, addr: SocketAddr) -> Result<StopOutcome, ServiceError> {
        self.run_until(addr, wait_for_termination()).await
    }

    /// Like [`start_and_wait`](Self::start_and_wait), with a custom termination event.
    pub async fn start_and_wait_until<F>(
        self,
        port: u16,
        termination: F,
    ) -> Result<StopOutcome, ServiceError>
    where
        F: Future,
    {
        self.run_until(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)), termination)
            .await
    }

    async fn run_until<F>(mut self, addr: SocketAddr, termination: F) -> Result<StopOutcome, ServiceError>
    where
        F: Future,
    {
        self.start_async_on(addr)?;

        // Only the handle is borrowed across awaits; the builder callbacks
        // stored in `self` are `Send` but not `Sync`.
        let handle = self.handle();
        tokio::select! {
            _ = termination => {
                tracing::debug!(service = %handle.name(), "Termination requested");
            }
            () = handle.wait_stopping() => {}
        }

        Ok(handle.stop(self.drain_timeout).await)
    }

    /// Gracefully stop the service. See [`ServiceHandle::stop`].
    pub fn stop(&self, deadline: Duration) -> impl Future<Output = StopOutcome> + Send + 'static {
        let shared = Arc::clone(&self.shared);
        async move { shared.stop(deadline).await }
    }
}

impl std::fmt::Debug for RpcService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcService")
            .field("name", &self.shared.name)
            .field("tls", &self.shared.encrypted)
            .field("state", &self.state())
            .field("local_addr", &self.local_addr)
            .field("drain_timeout", &self.drain_timeout)
            .finish_non_exhaustive()
    }
}

impl ServiceHandle {
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn state(&self) -> ServiceState {
        self.shared.state()
    }

    /// Stop accepting, drain in-flight requests until `deadline`, then run
    /// the shutdown hook. The returned future completing is the "done" signal.
    ///
    /// Safe to call concurrently and repeatedly: the first call performs the
    /// stop, every other call waits for it and returns the same outcome.
    pub async fn stop(&self, deadline: Duration) -> StopOutcome {
        self.shared.stop(deadline).await
    }

    /// Resolve once the service has reached [`ServiceState::Stopped`].
    pub async fn wait_stopped(&self) {
        self.shared.wait_for(ServiceState::Stopped).await;
    }

    /// Resolve once the accept loop is actually accepting, with its address.
    ///
    /// Returns `None` if the loop ended before it started listening.
    pub async fn listening(&self) -> Option<SocketAddr> {
        self.shared.server.listening().await
    }

    async fn wait_stopping(&self) {
        self.shared.wait_for(ServiceState::Draining).await;
    }
}

impl Shared {
    fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// Wait until the state is at least `target`.
    async fn wait_for(&self, target: ServiceState) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|state| *state >= target).await;
    }

    async fn stop(&self, deadline: Duration) -> StopOutcome {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            self.wait_for(ServiceState::Stopped).await;
            return self.outcome.get().copied().unwrap_or(StopOutcome::Drained);
        }

        let accept_loop = {
            let mut accept_loop = self
                .accept_loop
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let task = accept_loop.take();
            if task.is_some() {
                self.state.send_replace(ServiceState::Draining);
            }
            task
        };

        tracing::info!(service = %self.name, deadline = ?deadline, "Stopping service");
        let started = Instant::now();

        let outcome = match accept_loop {
            Some(task) => {
                let outcome = drain(&self.server, deadline).await;
                self.join_accept_loop(task).await;
                outcome
            }
            None => StopOutcome::Drained,
        };
        let drain_duration = started.elapsed();

        if self.on_shutdown.fire() {
            tracing::debug!(service = %self.name, "Shutdown hook completed");
        }

        let _ = self.outcome.set(outcome);
        self.state.send_replace(ServiceState::Stopped);
        metrics::record_stopped(&self.name, outcome, drain_duration);
        tracing::info!(
            service = %self.name,
            outcome = outcome.as_label(),
            elapsed = ?drain_duration,
            "Service stopped"
        );

        outcome
    }

    async fn join_accept_loop(&self, mut task: JoinHandle<io::Result<()>>) {
        match tokio::time::timeout(ACCEPT_LOOP_JOIN_GRACE, &mut task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => {
                tracing::warn!(service = %self.name, error = %e, "Accept loop exited with error");
            }
            Ok(Err(e)) => {
                tracing::error!(service = %self.name, error = %e, "Accept loop task panicked");
            }
            Err(_elapsed) => {
                tracing::warn!(service = %self.name, "Accept loop did not exit in time, aborting");
                self.server.shutdown();
                task.abort();
                let _ = task.await;
            }
        }
    }
}
