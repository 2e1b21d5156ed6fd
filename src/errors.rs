//! Renders the fixed HTML error page written back to the client for
//! malformed requests and unsupported methods.

/// Hard cap on the rendered response. Past this, render gives up silently
/// instead of writing a truncated body.
const MAXBUF: usize = 8192;

/// Renders `HTTP/1.0 <code> <short>\r\n...` with an HTML body embedding
/// `short` and `long`. Returns `None` if it would exceed `MAXBUF`.
pub fn render(code: u16, short: &str, long: &str) -> Option<Vec<u8>> {
    let body = format!(
        "<html><head><title>RustyProxy Error</title></head>\
         <body>\n<h1>{code} {short}</h1>\n<p>{long}</p>\n\
         <hr><em>RustyProxy</em>\n</body></html>\n",
    );

    let mut response = format!(
        "HTTP/1.0 {code} {short}\r\n\
         Content-Type: text/html\r\n\
         Content-Length: {}\r\n\r\n",
        body.len()
    );
    response.push_str(&body);

    if response.len() > MAXBUF {
        return None;
    }
    Some(response.into_bytes())
}

/// The request line failed to parse.
pub fn bad_request() -> Option<Vec<u8>> {
    render(
        400,
        "Bad Request",
        "RustyProxy could not understand the request.",
    )
}

/// Any method other than GET.
pub fn not_implemented(method: &str) -> Option<Vec<u8>> {
    render(
        501,
        "Not Implemented",
        &format!("RustyProxy does not implement the {method} method."),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_has_status_line_and_body() {
        let response = bad_request().unwrap();
        let response = String::from_utf8(response).unwrap();
        assert!(response.starts_with("HTTP/1.0 400 Bad Request\r\n"));
        assert!(response.contains("Content-Type: text/html\r\n"));
        assert!(response.contains("400"));
        assert!(response.contains("Bad Request"));
    }

    #[test]
    fn not_implemented_embeds_method_and_status() {
        let response = not_implemented("POST").unwrap();
        let response = String::from_utf8(response).unwrap();
        assert!(response.contains("501 Not Implemented"));
        assert!(response.contains("POST"));
    }

    #[test]
    fn content_length_matches_body() {
        let response = render(400, "Bad Request", "x").unwrap();
        let response = String::from_utf8(response).unwrap();
        let header_end = response.find("\r\n\r\n").unwrap() + 4;
        let body = &response[header_end..];
        let cl_line = response
            .lines()
            .find(|l| l.starts_with("Content-Length:"))
            .unwrap();
        let declared: usize = cl_line.trim_start_matches("Content-Length: ").trim().parse().unwrap();
        assert_eq!(declared, body.len());
    }

    #[test]
    fn overflow_returns_none() {
        let long = "x".repeat(MAXBUF * 2);
        assert!(render(400, "Bad Request", &long).is_none());
    }
}
