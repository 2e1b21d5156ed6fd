//! Builds the sanitised upstream request from the client's parsed
//! request-target and header lines.

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:3.10.0) Gecko/20191101 Firefox/63.0.1";

/// One client-supplied header line, split for the exclusion check below.
#[derive(Debug, Clone)]
pub struct ClientHeader {
    pub name: String,
    pub value: String,
}

impl ClientHeader {
    pub fn from_httparse(header: &httparse::Header<'_>) -> Self {
        Self {
            name: header.name.to_string(),
            value: String::from_utf8_lossy(header.value).trim().to_string(),
        }
    }

    /// Whether this header's name case-insensitively contains one of the
    /// four names the translator always overrides.
    fn is_overridden(&self) -> bool {
        ["host", "connection", "proxy-connection", "user-agent"]
            .iter()
            .any(|overridden| self.name.to_ascii_lowercase().contains(overridden))
    }
}

/// Builds `GET <path> HTTP/1.0\r\n<headers>\r\n`.
pub fn build_upstream_request(path: &str, host: &str, client_headers: &[ClientHeader]) -> Vec<u8> {
    let mut req = String::new();
    req.push_str("GET ");
    req.push_str(path);
    req.push_str(" HTTP/1.0\r\n");

    if let Some(client_host) = client_headers.iter().find(|h| h.name.eq_ignore_ascii_case("host")) {
        req.push_str(&client_host.name);
        req.push_str(": ");
        req.push_str(&client_host.value);
        req.push_str("\r\n");
    } else {
        req.push_str("Host: ");
        req.push_str(host);
        req.push_str("\r\n");
    }

    req.push_str("User-Agent: ");
    req.push_str(USER_AGENT);
    req.push_str("\r\n");
    req.push_str("Connection: close\r\n");
    req.push_str("Proxy-Connection: close\r\n");

    for header in client_headers {
        if header.is_overridden() {
            continue;
        }
        req.push_str(&header.name);
        req.push_str(": ");
        req.push_str(&header.value);
        req.push_str("\r\n");
    }

    req.push_str("\r\n");
    req.into_bytes()
}
