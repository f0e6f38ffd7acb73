//! End-to-end behaviour of the assembled application, driven in process.

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use tracing_subscriber::fmt::MakeWriter;
use userbook::users::{User, UserStore};
use userbook::{Method, Request, Response, Router, app, middleware};

const AUTH: &str = "Bearer demo-token";

fn fresh() -> (Arc<UserStore>, Router) {
    let store = Arc::new(UserStore::seeded());
    let router = app(Arc::clone(&store), "demo-token");
    (store, router)
}

fn authed(method: Method, path: &str) -> Request {
    Request::new(method, path).with_header("Authorization", AUTH)
}

fn body_json(res: &Response) -> Value {
    serde_json::from_slice(res.body()).expect("response body is JSON")
}

// ── Log capture ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf).lines().map(|l| l.trim().to_owned()).collect()
    }
}

impl io::Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes this thread's `tracing` output into the returned capture until the
/// guard drops. `#[tokio::test]` runs on the current thread, so the whole
/// request is covered.
fn capture_logs() -> (Capture, tracing::subscriber::DefaultGuard) {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(capture.clone())
        .with_ansi(false)
        .without_time()
        .with_level(false)
        .with_target(false)
        .with_max_level(tracing::Level::INFO)
        .finish();
    (capture, tracing::subscriber::set_default(subscriber))
}

// ── Authentication ────────────────────────────────────────────────────────────

#[tokio::test]
async fn requests_without_the_token_never_reach_the_store() {
    let (store, router) = fresh();
    let before = store.list().unwrap();

    let attempts = [
        Request::new(Method::Get, "/users"),
        Request::new(Method::Delete, "/users/1").with_header("Authorization", "Bearer wrong"),
        Request::new(Method::Post, "/users")
            .with_header("Authorization", "demo-token")
            .with_body(r#"{"name":"Mallory","email":"m@x"}"#),
        Request::new(Method::Put, "/users/2")
            .with_header("Authorization", "")
            .with_body(r#"{"name":"Mallory","email":"m@x"}"#),
    ];

    for req in attempts {
        let res = router.call(req).await;
        assert_eq!(res.status_code(), 401);
        assert_eq!(body_json(&res), json!({"error": "Unauthorized"}));
    }

    assert_eq!(store.list().unwrap(), before);
}

#[tokio::test]
async fn unrouted_paths_are_authenticated_too() {
    let (_, router) = fresh();

    let res = router.call(Request::new(Method::Get, "/nope")).await;
    assert_eq!(res.status_code(), 401);

    let res = router.call(authed(Method::Get, "/nope")).await;
    assert_eq!(res.status_code(), 404);
}

#[tokio::test]
async fn extension_methods_are_authenticated_then_refused() {
    let (_, router) = fresh();

    let res = router.call(Request::from_wire("PROPFIND", "/users")).await;
    assert_eq!(res.status_code(), 401);

    let res = router
        .call(Request::from_wire("PROPFIND", "/users").with_header("Authorization", AUTH))
        .await;
    assert_eq!(res.status_code(), 405);
    assert_eq!(res.header("allow"), Some("GET, POST"));
}

#[tokio::test]
async fn extension_methods_are_logged_by_wire_name() {
    let (_, router) = fresh();
    let (logs, _guard) = capture_logs();

    router.call(Request::from_wire("PURGE", "/users/1")).await;

    assert_eq!(logs.lines(), ["Request: PURGE /users/1", "Response: 401"]);
}

// ── Reads ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn fresh_start_serves_alice() {
    let (_, router) = fresh();
    let res = router.call(authed(Method::Get, "/users/1")).await;

    assert_eq!(res.status_code(), 200);
    assert_eq!(res.body(), br#"{"id":1,"name":"Alice","email":"alice@example.com"}"#);
}

#[tokio::test]
async fn missing_user_is_404_with_empty_body() {
    let (_, router) = fresh();
    let res = router.call(authed(Method::Get, "/users/999")).await;

    assert_eq!(res.status_code(), 404);
    assert!(res.body().is_empty());
}

#[tokio::test]
async fn listing_is_stable_without_writes() {
    let (_, router) = fresh();
    let first = router.call(authed(Method::Get, "/users")).await;
    let second = router.call(authed(Method::Get, "/users")).await;

    assert_eq!(first.status_code(), 200);
    assert_eq!(first.body(), second.body());
    assert_eq!(
        body_json(&first),
        json!([
            {"id": 1, "name": "Alice", "email": "alice@example.com"},
            {"id": 2, "name": "Bob", "email": "bob@example.com"},
        ]),
    );
}

#[tokio::test]
async fn routes_ignore_case_and_one_trailing_slash() {
    let (_, router) = fresh();

    for path in ["/Users/1", "/USERS/1", "/users/1/", "/Users/1/"] {
        let res = router.call(authed(Method::Get, path)).await;
        assert_eq!(res.status_code(), 200, "{path}");
        assert_eq!(body_json(&res)["name"], "Alice", "{path}");
    }

    let res = router.call(authed(Method::Get, "/users/")).await;
    assert_eq!(res.status_code(), 200);
    assert_eq!(body_json(&res).as_array().map(Vec::len), Some(2));
}

// ── Create ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn creating_carol_assigns_id_three() {
    let (_, router) = fresh();
    let req = authed(Method::Post, "/users")
        .with_body(r#"{"name":"Carol","email":"carol@x.com"}"#);
    let res = router.call(req).await;

    assert_eq!(res.status_code(), 201);
    assert_eq!(res.header("location"), Some("/users/3"));
    assert_eq!(body_json(&res), json!({"id": 3, "name": "Carol", "email": "carol@x.com"}));

    let res = router.call(authed(Method::Get, "/users/3")).await;
    assert_eq!(res.status_code(), 200);
}

#[tokio::test]
async fn sequential_creates_count_up_from_the_seed() {
    let (_, router) = fresh();

    for expected in 3..8_i64 {
        let req = authed(Method::Post, "/users")
            .with_body(format!(r#"{{"name":"user{expected}","email":"u{expected}@x"}}"#));
        let res = router.call(req).await;
        assert_eq!(body_json(&res)["id"], expected);
    }
}

#[tokio::test]
async fn invalid_creates_are_rejected_and_change_nothing() {
    let (store, router) = fresh();

    let cases = [
        (r#"{"name":"","email":"a@b.c"}"#, "Name is required."),
        (r#"{"name":"   ","email":"a@b.c"}"#, "Name is required."),
        (r#"{"email":"a@b.c"}"#, "Name is required."),
        (r#"{"name":"Carol","email":"carol.example.com"}"#, "Valid email is required."),
        (r#"{"name":"Carol","email":null}"#, "Valid email is required."),
    ];

    for (body, message) in cases {
        let res = router.call(authed(Method::Post, "/users").with_body(body)).await;
        assert_eq!(res.status_code(), 400, "{body}");
        assert_eq!(body_json(&res), json!(message), "{body}");
    }

    assert_eq!(store.len().unwrap(), 2);
}

#[tokio::test]
async fn payload_property_names_bind_in_any_case() {
    let (store, router) = fresh();
    let req = authed(Method::Post, "/Users")
        .with_body(r#"{"Name":"Carol","EMAIL":"carol@x.com"}"#);
    let res = router.call(req).await;

    assert_eq!(res.status_code(), 201);
    assert_eq!(body_json(&res), json!({"id": 3, "name": "Carol", "email": "carol@x.com"}));
    assert_eq!(store.get(3).unwrap(), Some(User::new(3, "Carol", "carol@x.com")));
}

// ── Update ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn update_replaces_fields_but_not_id() {
    let (store, router) = fresh();
    let req = authed(Method::Put, "/users/2")
        .with_body(r#"{"id":42,"name":"Robert","email":"robert@example.com"}"#);
    let res = router.call(req).await;

    assert_eq!(res.status_code(), 200);
    assert_eq!(body_json(&res), json!({"id": 2, "name": "Robert", "email": "robert@example.com"}));
    assert_eq!(store.get(2).unwrap(), Some(User::new(2, "Robert", "robert@example.com")));
    assert_eq!(store.get(42).unwrap(), None);
}

#[tokio::test]
async fn update_of_unknown_user_is_404() {
    let (_, router) = fresh();
    let req = authed(Method::Put, "/users/999").with_body(r#"{"name":"X","email":"x@x"}"#);
    assert_eq!(router.call(req).await.status_code(), 404);
}

// ── Delete ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn delete_removes_once() {
    let (_, router) = fresh();

    let res = router.call(authed(Method::Delete, "/users/1")).await;
    assert_eq!(res.status_code(), 204);
    assert!(res.body().is_empty());

    let res = router.call(authed(Method::Get, "/users/1")).await;
    assert_eq!(res.status_code(), 404);

    let res = router.call(authed(Method::Delete, "/users/1")).await;
    assert_eq!(res.status_code(), 404);
}

// ── Middleware chain ──────────────────────────────────────────────────────────

#[tokio::test]
async fn logging_brackets_authorized_requests() {
    let (_, router) = fresh();
    let (logs, _guard) = capture_logs();

    router.call(authed(Method::Get, "/users/1")).await;

    assert_eq!(logs.lines(), ["Request: GET /users/1", "Response: 200"]);
}

#[tokio::test]
async fn logging_post_line_is_written_for_rejected_requests() {
    let (_, router) = fresh();
    let (logs, _guard) = capture_logs();

    router.call(Request::new(Method::Delete, "/users/2")).await;

    assert_eq!(logs.lines(), ["Request: DELETE /users/2", "Response: 401"]);
}

#[tokio::test]
async fn panicking_handler_yields_generic_500_and_logs_message() {
    async fn explode(_req: Request) -> Response {
        panic!("ledger exploded")
    }

    let router = Router::new()
        .on(Method::Get, "/boom", explode)
        .layer(middleware::catch_faults)
        .layer(middleware::require_bearer("demo-token"))
        .layer(middleware::log_requests);
    let (logs, _guard) = capture_logs();

    let res = router.call(authed(Method::Get, "/boom")).await;

    assert_eq!(res.status_code(), 500);
    assert_eq!(res.header("content-type"), Some("application/json; charset=utf-8"));
    assert_eq!(body_json(&res), json!({"error": "Internal server error."}));
    assert_eq!(
        logs.lines(),
        ["Request: GET /boom", "Unhandled Exception: ledger exploded", "Response: 500"],
    );
}

#[tokio::test]
async fn store_faults_on_list_are_hidden_behind_generic_500() {
    #[derive(Debug, thiserror::Error)]
    #[error("backing list unavailable")]
    struct Unavailable;

    async fn broken_list(_req: Request) -> Result<Response, Unavailable> {
        Err(Unavailable)
    }

    let router = Router::new()
        .on(Method::Get, "/users", broken_list)
        .layer(middleware::catch_faults);
    let res = router.call(Request::new(Method::Get, "/users")).await;

    assert_eq!(res.status_code(), 500);
    assert_eq!(body_json(&res), json!({"error": "Internal server error."}));
}

#[tokio::test]
async fn configured_token_replaces_the_demo_token() {
    let router = app(Arc::new(UserStore::seeded()), "s3cret");

    let res = router.call(authed(Method::Get, "/users")).await;
    assert_eq!(res.status_code(), 401);

    let req = Request::new(Method::Get, "/users").with_header("authorization", "Bearer s3cret");
    assert_eq!(router.call(req).await.status_code(), 200);
}
