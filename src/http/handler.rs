//! Endpoint handlers.
//!
//! Each handler turns a parsed [`Request`] into a [`Response`]. Handler
//! failures never escape as errors: they are mapped to a status code so
//! the connection stays usable.

use super::parser::Request;
use super::response::{Response, StatusCode};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{self, Write};
use std::path::Path;
use tracing::{debug, warn};

const TEXT_PLAIN: &str = "text/plain";
const OCTET_STREAM: &str = "application/octet-stream";
const GZIP: &str = "gzip";

/// `/`
pub fn root() -> Response {
    Response::empty(StatusCode::Ok)
}

/// `/user-agent`: reflect the `User-Agent` header, empty if absent.
pub fn user_agent(request: &Request) -> Response {
    let agent = request.header("User-Agent").unwrap_or_default();
    Response::ok(TEXT_PLAIN, agent.to_string())
}

/// `/echo/<text>`: reflect `text`, gzip-compressed when the client accepts it.
pub fn echo(request: &Request, text: &str) -> Response {
    if !accepts_gzip(request) {
        return Response::ok(TEXT_PLAIN, text.to_string());
    }

    match gzip(text.as_bytes()) {
        Ok(compressed) => Response::encoded(TEXT_PLAIN, GZIP, compressed.into()),
        Err(e) => {
            warn!(error = %e, "gzip compression failed");
            Response::empty(StatusCode::InternalServerError)
        }
    }
}

/// True if `Accept-Encoding` lists `gzip` among its comma-separated tokens.
fn accepts_gzip(request: &Request) -> bool {
    request.header("Accept-Encoding").is_some_and(|value| {
        value
            .split(',')
            .any(|token| token.trim().eq_ignore_ascii_case(GZIP))
    })
}

/// Compress `data` into a gzip member.
pub fn gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// `GET /files/<name>`: serve the file from the root directory.
pub async fn read_file(root: Option<&Path>, name: &str) -> Response {
    let Some(root) = root else {
        debug!(file = name, "No directory configured for /files");
        return Response::empty(StatusCode::NotFound);
    };

    let path = root.join(name);
    match tokio::fs::read(&path).await {
        Ok(contents) => Response::ok(OCTET_STREAM, contents),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Failed to read file");
            Response::empty(StatusCode::NotFound)
        }
    }
}

/// `POST /files/<name>`: store the request body under the root directory.
pub async fn write_file(root: Option<&Path>, name: &str, request: &Request) -> Response {
    let declared = request
        .header("Content-Length")
        .and_then(|value| value.trim().parse::<usize>().ok());
    if declared != Some(request.body.len()) {
        debug!(?declared, actual = request.body.len(), "Invalid Content-Length for upload");
        return Response::empty(StatusCode::BadRequest);
    }

    let Some(root) = root else {
        warn!(file = name, "No directory configured for /files");
        return Response::empty(StatusCode::InternalServerError);
    };

    let path = root.join(name);
    match tokio::fs::write(&path, &request.body).await {
        Ok(()) => Response::empty(StatusCode::Created),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to write file");
            Response::empty(StatusCode::InternalServerError)
        }
    }
}
