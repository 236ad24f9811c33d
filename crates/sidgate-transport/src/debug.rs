//! Request dump endpoint.

use std::fmt::Write as _;

use axum::{
    Form,
    body::{Body, to_bytes},
    extract::{FromRequest, Multipart, Query, Request},
    http::{
        self,
        header::{CONTENT_TYPE, HOST},
    },
};

/// Largest body the dump will read.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Echo everything known about the request back as plain text.
pub async fn debug_handler(request: Request) -> String {
    let (parts, body) = request.into_parts();
    let mut out = String::new();

    let _ = writeln!(out, "Method: {}", parts.method);
    let host = parts
        .headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| parts.uri.host())
        .unwrap_or_default();
    let _ = writeln!(out, "Host: {host}");

    out.push_str("Header:\n");
    for name in parts.headers.keys() {
        let values: Vec<&str> = parts
            .headers
            .get_all(name)
            .iter()
            .map(|v| v.to_str().unwrap_or("<binary>"))
            .collect();
        let _ = writeln!(out, "  {name}: {}", values.join(","));
    }

    let _ = writeln!(out, "URL: {}", parts.uri);
    let _ = writeln!(out, "URL.Path: {}", parts.uri.path());
    out.push_str("URL.Query():\n");
    if let Ok(Query(pairs)) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri) {
        for (key, value) in pairs {
            let _ = writeln!(out, "  {key}: {value}");
        }
    }

    let content_type = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = writeln!(out, "ERROR {e}");
            return out;
        }
    };
    let _ = writeln!(out, "ContentLength: {}", bytes.len());

    let request = http::Request::from_parts(parts, Body::from(bytes));
    if content_type.starts_with("multipart/form-data") {
        out.push_str("Form (multipart):\n");
        dump_multipart(request, &mut out).await;
    } else if content_type.starts_with("application/x-www-form-urlencoded") {
        out.push_str("Form (urlencoded):\n");
        match Form::<Vec<(String, String)>>::from_request(request, &()).await {
            Ok(Form(pairs)) => {
                for (key, value) in pairs {
                    let _ = writeln!(out, "  {key}: {value}");
                }
            }
            Err(e) => {
                let _ = writeln!(out, "ERROR {e}");
            }
        }
    }

    out
}

async fn dump_multipart(request: Request, out: &mut String) {
    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(e) => {
            let _ = writeln!(out, "ERROR {e}");
            return;
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                let _ = writeln!(out, "ERROR {e}");
                break;
            }
        };

        let _ = writeln!(out, "  FormName: {}", field.name().unwrap_or_default());
        let _ = writeln!(out, "  FileName: {}", field.file_name().unwrap_or_default());
        out.push_str("  Header:\n");
        for (name, value) in field.headers() {
            let _ = writeln!(out, "    {name}: {}", value.to_str().unwrap_or("<binary>"));
        }
        if let Ok(data) = field.bytes().await {
            let _ = writeln!(out, "  Size: {} bytes", data.len());
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::*;

    #[tokio::test]
    async fn test_dumps_query_and_headers() {
        let request = http::Request::builder()
            .method(Method::GET)
            .uri("/app/test?x=1&y=two")
            .header(HOST, "example.com")
            .header("x-probe", "a")
            .body(Body::empty())
            .unwrap();

        let out = debug_handler(request).await;
        assert!(out.starts_with("Method: GET\nHost: example.com\n"));
        assert!(out.contains("  x-probe: a\n"));
        assert!(out.contains("URL.Path: /app/test\n"));
        assert!(out.contains("URL.Query():\n  x: 1\n  y: two\n"));
        assert!(out.contains("ContentLength: 0\n"));
    }

    #[tokio::test]
    async fn test_dumps_urlencoded_form() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/app/test")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("name=alice&role=admin"))
            .unwrap();

        let out = debug_handler(request).await;
        assert!(out.contains("ContentLength: 21\n"));
        assert!(out.contains("Form (urlencoded):\n  name: alice\n  role: admin\n"));
    }

    #[tokio::test]
    async fn test_dumps_multipart_form() {
        let body = "--XYZ\r\n\
                    Content-Disposition: form-data; name=\"upload\"; filename=\"a.txt\"\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    hello\r\n\
                    --XYZ--\r\n";
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("/app/test")
            .header(CONTENT_TYPE, "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))
            .unwrap();

        let out = debug_handler(request).await;
        assert!(out.contains("Form (multipart):\n"));
        assert!(out.contains("  FormName: upload\n"));
        assert!(out.contains("  FileName: a.txt\n"));
        assert!(out.contains("  Size: 5 bytes\n"));
    }
}
