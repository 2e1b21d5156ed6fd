//! Drives one client connection end to end: read the request, look up the
//! cache, and on a miss connect upstream, forward, relay, and admit. Every
//! exit path closes the client socket by dropping it. No timeouts, no
//! cancellation: a transaction runs until EOF or a read/write error.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::cache::CacheStore;
use crate::error::ConnectError;
use crate::errors;
use crate::translator::{build_upstream_request, ClientHeader};
use crate::uri::parse_absolute_uri;

/// Chunk size for relaying the upstream response.
const RELAY_CHUNK: usize = 8192;

/// Cap on the client request head while scanning for the blank line that
/// ends it, against a client that never sends one.
const MAX_REQUEST_HEAD: usize = 64 * 1024;

pub async fn handle(mut client: TcpStream, cache: Arc<CacheStore>) {
    let Some(request) = read_request_head(&mut client).await else {
        return;
    };

    let (method, uri, headers) = match parse_request(&request) {
        Some(parsed) => parsed,
        None => {
            debug!("malformed request line");
            respond(&mut client, errors::bad_request()).await;
            return;
        }
    };

    if method != "GET" {
        debug!(method, "unsupported method");
        respond(&mut client, errors::not_implemented(&method)).await;
        return;
    }

    let key = Bytes::from(uri.clone().into_bytes());

    if let Some(lease) = cache.lookup(&key).await {
        info!(uri, "cache hit");
        let write_result = client.write_all(lease.bytes()).await;
        cache.release(lease).await;
        if let Err(err) = write_result {
            debug!(%err, "client write failed during cache hit");
        }
        return;
    }
    debug!(uri, "cache miss");

    let Some(parsed) = parse_absolute_uri(&uri) else {
        warn!(uri, "could not parse absolute-URI, closing");
        return;
    };

    let mut upstream = match connect(&parsed.host, parsed.port).await {
        Ok(stream) => stream,
        Err(err) => {
            warn!(%err, "upstream connect failed, closing");
            return;
        }
    };

    let request_bytes = build_upstream_request(&parsed.path, &parsed.host, &headers);
    if let Err(err) = upstream.write_all(&request_bytes).await {
        debug!(%err, "failed to forward request upstream");
        return;
    }

    let Some((admissible_bytes, client_write_failed)) =
        relay(&mut upstream, &mut client).await
    else {
        // Upstream read failed mid-stream. Bytes already sent stay sent; nothing is admitted.
        return;
    };

    if client_write_failed {
        return;
    }

    if let Some(bytes) = admissible_bytes {
        cache.admit(key, bytes).await;
        info!(uri, "admitted to cache");
    }
}

/// Reads until the request head (request line + headers) is complete.
/// Returns `None` on EOF, read error, or exceeding the cap; all three just
/// close the connection silently.
async fn read_request_head(client: &mut TcpStream) -> Option<BytesMut> {
    let mut buffer = BytesMut::with_capacity(RELAY_CHUNK);
    loop {
        if buffer.windows(4).any(|w| w == b"\r\n\r\n") {
            return Some(buffer);
        }
        if buffer.len() >= MAX_REQUEST_HEAD {
            debug!("request head exceeded safety cap, closing");
            return None;
        }
        match client.read_buf(&mut buffer).await {
            Ok(0) => return None,
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
}

/// Returns method, request-target, and header lines.
fn parse_request(data: &[u8]) -> Option<(String, String, Vec<ClientHeader>)> {
    let mut raw_headers = [httparse::EMPTY_HEADER; 64];
    let mut req = httparse::Request::new(&mut raw_headers);

    match req.parse(data) {
        Ok(httparse::Status::Complete(_)) => {
            let method = req.method?.to_string();
            let uri = req.path?.to_string();
            // HTTP/1.x only; httparse itself rejects anything else.
            req.version?;
            let headers = req.headers.iter().map(ClientHeader::from_httparse).collect();
            Some((method, uri, headers))
        }
        _ => None,
    }
}

async fn connect(host: &str, port: u16) -> Result<TcpStream, ConnectError> {
    TcpStream::connect((host, port))
        .await
        .map_err(|source| ConnectError::Io {
            host: host.to_string(),
            port,
            source,
        })
}

/// Relays the upstream response to the client while buffering up to
/// `MAX_OBJECT_SIZE` bytes for a possible cache admission. `None` means the
/// upstream read failed mid-stream; otherwise `(admissible_bytes,
/// client_write_failed)`.
async fn relay(
    upstream: &mut TcpStream,
    client: &mut TcpStream,
) -> Option<(Option<Bytes>, bool)> {
    let mut admission_buffer = BytesMut::new();
    let mut total = 0usize;
    let mut admissible = true;
    let mut chunk = [0u8; RELAY_CHUNK];

    loop {
        let n = match upstream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) => {
                debug!(%err, "upstream read failed mid-stream");
                return None;
            }
        };

        if let Err(err) = client.write_all(&chunk[..n]).await {
            debug!(%err, "client write failed during relay");
            return Some((None, true));
        }

        total += n;
        if admissible {
            if total <= crate::cache::MAX_OBJECT_SIZE {
                admission_buffer.extend_from_slice(&chunk[..n]);
            } else {
                admissible = false;
                admission_buffer.clear();
            }
        }
    }

    let bytes = if admissible && total > 0 {
        Some(admission_buffer.freeze())
    } else {
        None
    };
    Some((bytes, false))
}

async fn respond(client: &mut TcpStream, body: Option<Vec<u8>>) {
    if let Some(body) = body {
        if let Err(err) = client.write_all(&body).await {
            debug!(%err, "failed to write error response");
        }
    }
}
