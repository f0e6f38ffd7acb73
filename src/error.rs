//! Infrastructure errors.
//!
//! Request-level failures (401, 404, 400, 500) are [`Response`](crate::Response)
//! values. This type only covers the server itself failing to come up.

use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read listener address: {0}")]
    LocalAddr(#[source] std::io::Error),
}
