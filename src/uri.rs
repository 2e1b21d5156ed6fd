//! Parses the absolute-URI request-target clients send to the proxy:
//! `http://host[:port]/path[?query]`.

#[derive(Debug, PartialEq, Eq)]
pub struct AbsoluteUri {
    pub host: String,
    pub port: u16,
    /// Path plus query string, always starting with `/`.
    pub path: String,
}

const DEFAULT_PORT: u16 = 80;

/// Parses an absolute-URI request-target. Returns `None` on anything that
/// isn't a well-formed `http://host[:port][/path][?query]`.
pub fn parse_absolute_uri(uri: &str) -> Option<AbsoluteUri> {
    let rest = uri.strip_prefix("http://")?;
    if rest.is_empty() {
        return None;
    }

    let (authority, path) = match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, "/"),
    };
    if authority.is_empty() {
        return None;
    }

    let (host, port) = match authority.rfind(':') {
        Some(idx) => {
            let host = &authority[..idx];
            let port_str = &authority[idx + 1..];
            if host.is_empty() || port_str.is_empty() {
                return None;
            }
            let port = port_str.parse::<u16>().ok()?;
            (host, port)
        }
        None => (authority, DEFAULT_PORT),
    };

    Some(AbsoluteUri {
        host: host.to_string(),
        port,
        path: if path.is_empty() {
            "/".to_string()
        } else {
            path.to_string()
        },
    })
}
