//! Handler trait and type erasure.
//!
//! Routes hold handlers of different concrete types in one table, so each
//! handler is boxed behind [`ErasedHandler`]:
//!
//! ```text
//! async fn list_users(req: Request) -> Json<Vec<User>>   ← written by hand
//!        ↓ router.on(Method::Get, "/users", list_users)
//! Arc::new(Erased(list_users))                           ← BoxedHandler
//!        ↓ handler.call(req)
//! respond(list_users(req))                               ← BoxFuture
//! ```
//!
//! Closures work the same way, which is how handlers get at shared state:
//! capture an `Arc` and clone it into each call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A heap-allocated, type-erased future that resolves to a [`Response`].
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` because it appears in the signature of the public
/// [`Handler`] trait.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared by every request on every connection.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler: any
/// `Fn(Request) -> impl Future<Output = impl IntoResponse>` that is
/// `Send + Sync + 'static`.
///
/// Sealed; the blanket impl below is the only implementation.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(Erased(self))
    }
}

/// A plain function stored behind one of the erased dispatch traits.
///
/// Handlers and middleware stages share it; which trait it implements
/// depends on the function's arity.
pub(crate) struct Erased<F>(pub(crate) F);

impl<F, Fut, R> ErasedHandler for Erased<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        respond((self.0)(req))
    }
}

/// Pins `fut` on the heap and converts whatever it resolves to.
pub(crate) fn respond<Fut, R>(fut: Fut) -> BoxFuture
where
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    Box::pin(async move { fut.await.into_response() })
}
