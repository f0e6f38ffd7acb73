//! `/users` endpoints.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/users` | 200 + array | — |
//! | GET | `/users/{id}` | 200 + user | 404; 500 problem on store fault |
//! | POST | `/users` | 201 + user, `Location` | 400 |
//! | PUT | `/users/{id}` | 200 + user | 404; 400 |
//! | DELETE | `/users/{id}` | 204 | 404; 500 problem on store fault |
//!
//! Get and delete answer a store fault themselves with a problem document
//! that includes the fault message. List, create and update hand it to the
//! error-catch stage instead, which hides it behind the generic 500.

mod model;
mod store;

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::handler::Handler;
use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Json, Response};
use crate::router::Router;
use crate::status::Status;

pub use model::{User, UserFields, UserId, UserPayload, ValidationError};
pub use store::{StoreError, UserStore};

/// Registers the five user routes on `router`, all sharing `store`.
pub fn routes(router: Router, store: &Arc<UserStore>) -> Router {
    router
        .on(Method::Get,    "/users",      with_store(store, list_users))
        .on(Method::Get,    "/users/{id}", with_store(store, get_user))
        .on(Method::Post,   "/users",      with_store(store, create_user))
        .on(Method::Put,    "/users/{id}", with_store(store, update_user))
        .on(Method::Delete, "/users/{id}", with_store(store, delete_user))
}

/// Adapts `f(store, req)` into a plain handler that owns a handle on `store`.
fn with_store<F, Fut, R>(store: &Arc<UserStore>, f: F) -> impl Handler
where
    F: Fn(Arc<UserStore>, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    let store = Arc::clone(store);
    move |req: Request| f(Arc::clone(&store), req)
}

// ── Handlers ──────────────────────────────────────────────────────────────────

async fn list_users(store: Arc<UserStore>, _req: Request) -> Result<Json<Vec<User>>, StoreError> {
    Ok(Json(store.list()?))
}

async fn get_user(store: Arc<UserStore>, req: Request) -> Response {
    let Some(id) = path_id(&req) else {
        return Response::status(Status::BadRequest);
    };

    match store.get(id) {
        Ok(Some(user)) => Json(user).into_response(),
        Ok(None) => Response::status(Status::NotFound),
        Err(e) => Response::problem(format!("Error retrieving user: {e}")),
    }
}

async fn create_user(store: Arc<UserStore>, req: Request) -> Result<Response, StoreError> {
    let payload = match bind_payload(&req) {
        Ok(payload) => payload,
        Err(rejection) => return Ok(rejection),
    };
    let fields = match payload.validate() {
        Ok(fields) => fields,
        Err(e) => return Ok(bad_request(e)),
    };

    let user = store.insert(fields)?;
    debug!(id = user.id, "user created");

    Ok(Response::builder()
        .status(Status::Created)
        .header("location", &format!("/users/{}", user.id))
        .serialize(&user))
}

async fn update_user(store: Arc<UserStore>, req: Request) -> Result<Response, StoreError> {
    let payload = match bind_payload(&req) {
        Ok(payload) => payload,
        Err(rejection) => return Ok(rejection),
    };
    let Some(id) = path_id(&req) else {
        return Ok(Response::status(Status::BadRequest));
    };

    // Existence is checked before the payload, under the same lock as the write.
    let outcome = store.modify(id, |user| {
        payload.validate().map(|fields| {
            user.apply(fields);
            user.clone()
        })
    })?;

    Ok(match outcome {
        None => Response::status(Status::NotFound),
        Some(Err(e)) => bad_request(e),
        Some(Ok(user)) => Json(user).into_response(),
    })
}

async fn delete_user(store: Arc<UserStore>, req: Request) -> Response {
    let Some(id) = path_id(&req) else {
        return Response::status(Status::BadRequest);
    };

    match store.remove(id) {
        Ok(Some(user)) => {
            debug!(id = user.id, "user deleted");
            Response::status(Status::NoContent)
        }
        Ok(None) => Response::status(Status::NotFound),
        Err(e) => Response::problem(format!("Error deleting user: {e}")),
    }
}

// ── Binding helpers ───────────────────────────────────────────────────────────

/// The `{id}` segment as an integer.
fn path_id(req: &Request) -> Option<UserId> {
    req.param("id")?.parse().ok()
}

/// Decodes the JSON body. Empty or malformed bodies get a bare 400.
fn bind_payload(req: &Request) -> Result<UserPayload, Response> {
    req.json::<UserPayload>().map_err(|e| {
        debug!("rejecting user payload: {e}");
        Response::status(Status::BadRequest)
    })
}

/// 400 whose body is the validation message as a JSON string.
fn bad_request(e: ValidationError) -> Response {
    Response::builder()
        .status(Status::BadRequest)
        .serialize(&e.to_string())
}
