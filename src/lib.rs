//! # userbook
//!
//! A small HTTP service that keeps a list of users in memory and exposes
//! create / read / update / delete over JSON.
//!
//! Every request passes through three middleware stages, outermost first:
//!
//! 1. [`middleware::log_requests`] logs `Request: <method> <path>` and,
//!    after the rest of the chain returns, `Response: <status>`.
//! 2. [`middleware::require_bearer`] answers 401 unless the request carries
//!    `Authorization: Bearer <token>`.
//! 3. [`middleware::catch_faults`] turns panics and unhandled errors into a
//!    generic 500.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use userbook::{Server, users::UserStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), userbook::Error> {
//!     let app = userbook::app(Arc::new(UserStore::seeded()), "demo-token");
//!     Server::bind("0.0.0.0:3000".parse().unwrap()).serve(app).await
//! }
//! ```

mod error;
mod handler;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod config;
pub mod middleware;
pub mod users;

use std::sync::Arc;

pub use error::Error;
pub use handler::Handler;
pub use method::{Method, UnknownMethod};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{Server, serve_with_shutdown};
pub use status::Status;

/// Token the auth stage expects when none is configured.
pub const DEFAULT_TOKEN: &str = "demo-token";

/// Builds the full application: user routes behind the three stages.
pub fn app(store: Arc<users::UserStore>, token: &str) -> Router {
    users::routes(Router::new(), &store)
        .layer(middleware::catch_faults)
        .layer(middleware::require_bearer(token))
        .layer(middleware::log_requests)
}
