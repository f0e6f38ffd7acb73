use std::sync::Arc;

use tracing::debug;

use super::{Middleware, Next, error_response};
use crate::request::Request;
use crate::status::Status;

/// Bearer-token stage.
///
/// Forwards only requests whose `Authorization` header is exactly
/// `Bearer <token>`. Everything else gets `401 {"error":"Unauthorized"}`
/// and the rest of the chain never runs.
pub fn require_bearer(token: impl Into<String>) -> impl Middleware {
    let expected: Arc<str> = format!("Bearer {}", token.into()).into();

    move |req: Request, next: Next| {
        let expected = Arc::clone(&expected);
        async move {
            let presented = req.header("authorization");
            if presented == Some(&*expected) {
                return next.run(req).await;
            }

            debug!(present = presented.is_some(), "rejecting request without valid token");
            error_response(Status::Unauthorized, "Unauthorized")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::Handler;
    use crate::method::Method;
    use crate::response::Response;

    async fn call(req: Request) -> Response {
        let next = Next::new(
            vec![require_bearer("demo-token").into_boxed_middleware()].into(),
            (|_req: Request| async { Status::NoContent }).into_boxed_handler(),
        );
        next.run(req).await
    }

    fn get() -> Request {
        Request::new(Method::Get, "/users")
    }

    #[tokio::test]
    async fn exact_token_passes() {
        let res = call(get().with_header("Authorization", "Bearer demo-token")).await;
        assert_eq!(res.status_code(), 204);
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let res = call(get()).await;
        assert_eq!(res.status_code(), 401);
        assert_eq!(res.body(), br#"{"error":"Unauthorized"}"#);
        assert_eq!(res.header("content-type"), Some("application/json; charset=utf-8"));
    }

    #[tokio::test]
    async fn near_misses_are_rejected() {
        for value in ["", "demo-token", "bearer demo-token", "Bearer demo-token ", "Bearer other"] {
            let res = call(get().with_header("Authorization", value)).await;
            assert_eq!(res.status_code(), 401, "accepted {value:?}");
        }
    }
}
