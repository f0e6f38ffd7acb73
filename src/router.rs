//! Radix-tree request router with a middleware chain in front.
//!
//! One tree per HTTP method, O(path-length) lookup. Every request, matched
//! or not, goes through the installed middleware before reaching its
//! endpoint, so unrouted requests are authenticated and logged too.
//!
//! Matching is lenient the way browsers and most HTTP stacks expect: one
//! trailing slash is ignored, and literal segments match regardless of ASCII
//! case (`/Users/7` reaches `/users/{id}` with `id = "7"`). Routes are
//! registered in lowercase. Parameter values keep the client's casing.

use std::collections::HashMap;
use std::sync::Arc;

use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::method::Method;
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup and pass it to [`Server::serve`](crate::Server::serve).
pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    layers: Arc<[BoxedMiddleware]>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), layers: Vec::new().into() }
    }

    /// Register a handler for a method + path pair. Path parameters use
    /// `{name}` syntax.
    ///
    /// # Panics
    ///
    /// Panics if the path is malformed, conflicts with an existing route, or
    /// `method` is [`Method::Extension`].
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        assert!(method != Method::Extension, "invalid route `{path}`: extension methods cannot be routed");
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{method} {path}`: {e}"));
        self
    }

    /// Wrap everything installed so far, routes included, in `middleware`.
    pub fn layer(mut self, middleware: impl Middleware) -> Self {
        let mut layers = self.layers.to_vec();
        layers.push(middleware.into_boxed_middleware());
        self.layers = layers.into();
        self
    }

    /// Runs one request through the middleware chain and its endpoint.
    pub async fn call(&self, mut req: Request) -> Response {
        let endpoint = match self.lookup(req.method(), req.path()) {
            Some((handler, params)) => {
                req.set_params(params);
                handler
            }
            None => self.fallback(req.method(), req.path()),
        };

        Next::new(Arc::clone(&self.layers), endpoint).run(req).await
    }

    /// Runs `req` through the middleware chain with an endpoint that answers
    /// `status` and nothing else. For requests the server cannot hand to a
    /// route, such as ones whose body failed to arrive.
    pub(crate) async fn reject(&self, req: Request, status: Status) -> Response {
        let endpoint = (move |_req: Request| async move { status }).into_boxed_handler();
        Next::new(Arc::clone(&self.layers), endpoint).run(req).await
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(BoxedHandler, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let path = route_path(path);

        if let Ok(matched) = tree.at(path) {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Some((Arc::clone(matched.value), params));
        }

        // ASCII lowercasing keeps byte offsets, so each parameter is cut from
        // the original path at the position it matched in the lowered one.
        let lowered = path.to_ascii_lowercase();
        let matched = tree.at(&lowered).ok()?;
        let params = matched.params.iter()
            .map(|(k, v)| {
                let start = v.as_ptr() as usize - lowered.as_ptr() as usize;
                (k.to_owned(), path[start..start + v.len()].to_owned())
            })
            .collect();
        Some((Arc::clone(matched.value), params))
    }

    /// Methods that have a route matching `path`, sorted.
    fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let path = route_path(path);
        let lowered = path.to_ascii_lowercase();
        let mut allowed: Vec<Method> = self.routes.iter()
            .filter(|(_, tree)| tree.at(path).is_ok() || tree.at(&lowered).is_ok())
            .map(|(method, _)| *method)
            .collect();
        allowed.sort();
        allowed
    }

    /// Endpoint for requests no route matches: 405 when the path exists
    /// under another method, 404 otherwise.
    fn fallback(&self, method: Method, path: &str) -> BoxedHandler {
        let allowed = self.allowed_methods(path);
        if allowed.is_empty() || allowed.contains(&method) {
            return (|_req: Request| async { Status::NotFound }).into_boxed_handler();
        }

        let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
        (move |_req: Request| {
            let allow = allow.clone();
            async move {
                Response::builder()
                    .status(Status::MethodNotAllowed)
                    .header("allow", &allow)
                    .no_body()
            }
        })
        .into_boxed_handler()
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

/// `path` without one trailing slash; `/` stays `/`.
fn route_path(path: &str) -> &str {
    match path.strip_suffix('/') {
        Some(trimmed) if !trimmed.is_empty() => trimmed,
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok(_req: Request) -> Response {
        Response::text("ok")
    }

    async fn echo_id(req: Request) -> Response {
        Response::text(req.param("id").unwrap_or("none").to_owned())
    }

    fn router() -> Router {
        Router::new()
            .on(Method::Get, "/users", ok)
            .on(Method::Get, "/users/{id}", echo_id)
            .on(Method::Delete, "/users/{id}", ok)
    }

    #[tokio::test]
    async fn binds_path_params() {
        let res = router().call(Request::new(Method::Get, "/users/42")).await;
        assert_eq!(res.body(), b"42");
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let res = router().call(Request::new(Method::Get, "/nope")).await;
        assert_eq!(res.status_code(), 404);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_allow() {
        let res = router().call(Request::new(Method::Patch, "/users/1")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header("allow"), Some("DELETE, GET"));
    }

    #[tokio::test]
    async fn layers_see_unrouted_requests() {
        async fn stamp(req: Request, next: Next) -> Response {
            let mut res = next.run(req).await;
            res.headers.push(("x-seen".to_owned(), "1".to_owned()));
            res
        }

        let res = router().layer(stamp).call(Request::new(Method::Get, "/nope")).await;
        assert_eq!(res.status_code(), 404);
        assert_eq!(res.header("x-seen"), Some("1"));
    }

    #[tokio::test]
    async fn literal_segments_ignore_case_but_params_keep_it() {
        let res = router().call(Request::new(Method::Get, "/USERS/AbC")).await;
        assert_eq!(res.status_code(), 200);
        assert_eq!(res.body(), b"AbC");
    }

    #[tokio::test]
    async fn one_trailing_slash_is_ignored() {
        let res = router().call(Request::new(Method::Get, "/users/")).await;
        assert_eq!(res.body(), b"ok");

        let res = router().call(Request::new(Method::Get, "/Users/9/")).await;
        assert_eq!(res.body(), b"9");
    }

    #[test]
    fn route_path_trims_only_one_slash() {
        assert_eq!(route_path("/"), "/");
        assert_eq!(route_path("/users/"), "/users");
        assert_eq!(route_path("/users//"), "/users/");
    }

    #[tokio::test]
    async fn extension_methods_get_405_on_known_paths() {
        let res = router().call(Request::from_wire("PROPFIND", "/users")).await;
        assert_eq!(res.status_code(), 405);
        assert_eq!(res.header("allow"), Some("GET"));

        let res = router().call(Request::from_wire("PROPFIND", "/nope")).await;
        assert_eq!(res.status_code(), 404);
    }

    #[tokio::test]
    async fn rejections_pass_through_layers() {
        async fn stamp(req: Request, next: Next) -> Response {
            let mut res = next.run(req).await;
            res.headers.push(("x-seen".to_owned(), "1".to_owned()));
            res
        }

        let res = router()
            .layer(stamp)
            .reject(Request::new(Method::Post, "/users"), Status::BadRequest)
            .await;
        assert_eq!(res.status_code(), 400);
        assert_eq!(res.header("x-seen"), Some("1"));
    }

    #[test]
    #[should_panic(expected = "extension methods cannot be routed")]
    fn extension_routes_panic() {
        let _ = Router::new().on(Method::Extension, "/users", ok);
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_routes_panic() {
        let _ = Router::new()
            .on(Method::Get, "/users", ok)
            .on(Method::Get, "/users", ok);
    }
}
