//! The transport server handed to handler-registration callbacks.

use axum::http::{StatusCode, Uri};
use axum::routing::MethodRouter;
use axum::Router;
use tower_http::trace::TraceLayer;

/// Live transport server that request handlers attach themselves to.
///
/// A registration callback receives `&mut TransportServer` exactly once,
/// before the service starts accepting connections. Methods are addressed by
/// path (`/package.Service/Method`); anything not registered is answered by
/// the transport with `501 Not Implemented`.
#[derive(Debug, Default)]
pub struct TransportServer {
    router: Router,
    methods: Vec<String>,
    merged: usize,
}

impl TransportServer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a single method.
    ///
    /// A missing leading `/` is added.
    ///
    /// # Panics
    /// Panics if the same path is registered twice (axum route conflict).
    pub fn add_method(&mut self, path: &str, handler: MethodRouter) -> &mut Self {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        self.router = std::mem::take(&mut self.router).route(&path, handler);
        self.methods.push(path);
        self
    }

    /// Attach a pre-built router, e.g. a whole generated service.
    pub fn merge(&mut self, router: Router) -> &mut Self {
        self.router = std::mem::take(&mut self.router).merge(router);
        self.merged += 1;
        self
    }

    /// Paths registered through [`add_method`](Self::add_method).
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// True when nothing has been attached at all.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && self.merged == 0
    }

    pub(crate) fn into_router(self) -> Router {
        self.router
            .fallback(unimplemented_method)
            .layer(TraceLayer::new_for_http())
    }
}

async fn unimplemented_method(uri: Uri) -> (StatusCode, String) {
    tracing::debug!(path = %uri.path(), "Call to unregistered method");
    (
        StatusCode::NOT_IMPLEMENTED,
        format!("unimplemented: {}", uri.path()),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use axum::routing::{get, post};
    use tower::ServiceExt;

    use super::*;

    async fn call(router: Router, path: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(
                Request::post(path)
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn empty_server_answers_unimplemented() {
        let server = TransportServer::new();
        assert!(server.is_empty());

        let (status, body) = call(server.into_router(), "/greeter.v1.Greeter/Hello").await;
        assert_eq!(status, StatusCode::NOT_IMPLEMENTED);
        assert_eq!(body, "unimplemented: /greeter.v1.Greeter/Hello");
    }

    #[tokio::test]
    async fn registered_method_is_dispatched() {
        let mut server = TransportServer::new();
        server.add_method("greeter.v1.Greeter/Hello", post(|| async { "hi" }));
        assert_eq!(server.methods(), ["/greeter.v1.Greeter/Hello"]);

        let router = server.into_router();
        assert_eq!(
            call(router.clone(), "/greeter.v1.Greeter/Hello").await,
            (StatusCode::OK, "hi".to_string())
        );
        assert_eq!(
            call(router, "/greeter.v1.Greeter/Bye").await.0,
            StatusCode::NOT_IMPLEMENTED
        );
    }

    #[tokio::test]
    async fn merged_router_counts_as_registration() {
        let mut server = TransportServer::new();
        server.merge(Router::new().route("/status", get(|| async { "ok" })));
        assert!(!server.is_empty());
        assert!(server.methods().is_empty());
    }
}
