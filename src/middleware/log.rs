use tracing::info;

use super::Next;
use crate::request::Request;
use crate::response::Response;

/// Request-logging stage.
///
/// One line before the rest of the chain runs and one after it returns,
/// whatever it answered (401s included).
pub async fn log_requests(req: Request, next: Next) -> Response {
    info!("Request: {} {}", req.method_name(), req.path());
    let response = next.run(req).await;
    info!("Response: {}", response.status_code());
    response
}
