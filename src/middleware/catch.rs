use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::error;

use super::{Next, error_response};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// Error-catch stage.
///
/// Runs the rest of the chain and answers `500 {"error":"Internal server
/// error."}` if it panicked or produced a fault response. The fault message
/// only goes to the log; the client never sees it.
pub async fn catch_faults(req: Request, next: Next) -> Response {
    let outcome = AssertUnwindSafe(next.run(req)).catch_unwind().await;

    let message = match outcome {
        Ok(mut response) => match response.take_fault() {
            Some(message) => message,
            None => return response,
        },
        Err(payload) => panic_message(&*payload),
    };

    error!("Unhandled Exception: {message}");
    error_response(Status::InternalServerError, "Internal server error.")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "handler panicked".to_owned()
    }
}
