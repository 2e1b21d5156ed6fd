//! Errors the transaction handler needs structured context for when
//! logging. None of these propagate past the transaction that creates
//! them; every per-transaction failure just closes that one connection.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("connect to {host}:{port} failed: {source}")]
    Io {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
