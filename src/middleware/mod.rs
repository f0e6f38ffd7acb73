//! Middleware layer.
//!
//! A middleware stage is any `async fn(Request, Next) -> impl IntoResponse`. It may
//! act before calling [`Next::run`], after it returns, or short-circuit by
//! answering without calling it at all.
//!
//! Stages are installed with [`Router::layer`](crate::Router::layer). Each
//! installation wraps everything installed before it, so the stage installed
//! last sees the request first:
//!
//! ```rust
//! use userbook::{Router, middleware};
//!
//! let app = Router::new()
//!     .layer(middleware::catch_faults)                    // innermost
//!     .layer(middleware::require_bearer("demo-token"))
//!     .layer(middleware::log_requests);                   // outermost
//! ```
//!
//! Built-in stages:
//! - [`catch_faults`] — turns panics and fault responses into a generic 500
//! - [`require_bearer`] — static bearer-token check, 401 otherwise
//! - [`log_requests`] — `Request:` / `Response:` lines through `tracing`

mod auth;
mod catch;
mod log;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;

use crate::handler::{BoxFuture, BoxedHandler, Erased, respond};
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

pub use auth::require_bearer;
pub use catch::catch_faults;
pub use log::log_requests;

/// Internal dispatch interface for stages.
#[doc(hidden)]
pub trait ErasedMiddleware {
    fn call(&self, req: Request, next: Next) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedMiddleware = Arc<dyn ErasedMiddleware + Send + Sync + 'static>;

/// Implemented for every `Fn(Request, Next) -> impl Future<Output = impl IntoResponse>`
/// that is `Send + Sync + 'static`. Sealed.
pub trait Middleware: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_middleware(self) -> BoxedMiddleware;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_middleware(self) -> BoxedMiddleware {
        Arc::new(Erased(self))
    }
}

impl<F, Fut, R> ErasedMiddleware for Erased<F>
where
    F: Fn(Request, Next) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request, next: Next) -> BoxFuture {
        respond((self.0)(req, next))
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

/// The remainder of the chain: every stage inside the current one, then
/// the endpoint handler.
pub struct Next {
    layers: Arc<[BoxedMiddleware]>,
    // Number of stages still to run. They are `layers[..depth]`, outermost last.
    depth: usize,
    endpoint: BoxedHandler,
}

impl Next {
    pub(crate) fn new(layers: Arc<[BoxedMiddleware]>, endpoint: BoxedHandler) -> Self {
        let depth = layers.len();
        Self { layers, depth, endpoint }
    }

    /// Runs the remainder of the chain and returns its response.
    pub async fn run(self, req: Request) -> Response {
        match self.depth.checked_sub(1) {
            Some(depth) => {
                let stage = Arc::clone(&self.layers[depth]);
                stage.call(req, Next { depth, ..self }).await
            }
            None => self.endpoint.call(req).await,
        }
    }
}

// ── Shared helpers ────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

/// `{"error": "<message>"}` with the given status.
pub(crate) fn error_response(status: Status, message: &'static str) -> Response {
    Response::builder()
        .status(status)
        .serialize(&ErrorBody { error: message })
}
