//! Library surface for the forwarding HTTP/1.0 caching proxy: the LRU cache
//! engine, the absolute-URI parser, the request translator, the error
//! responder, and the per-connection transaction handler. `main.rs` is the
//! thin accept-loop/process-wiring binary built on top of these.

pub mod cache;
pub mod error;
pub mod errors;
pub mod transaction;
pub mod translator;
pub mod uri;

pub use cache::{CacheStore, Lease, MAX_CACHE_SIZE, MAX_OBJECT_SIZE};
