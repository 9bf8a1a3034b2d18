//! HTTP/1.1 request framing and parsing.
//!
//! Framing answers "is there a whole request at the front of this buffer,
//! and how long is it?" using only the header/body delimiter and the
//! `Content-Length` header. Parsing then turns exactly one framed request
//! into a [`Request`].

use bytes::Bytes;
use memchr::memmem;
use std::collections::HashMap;
use std::fmt;

/// Separator between the head (request line + headers) and the body.
pub const HEAD_DELIMITER: &[u8] = b"\r\n\r\n";

/// Header line terminator.
const CRLF: &str = "\r\n";

/// Header consulted by the framer for the body length.
const CONTENT_LENGTH: &str = "Content-Length";

/// Result of framing the front of a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame {
    /// No complete request yet; more bytes must arrive.
    Incomplete,
    /// One complete request occupies `[0, head_len + 4 + body_len)`.
    Complete {
        /// Bytes before the `\r\n\r\n` delimiter.
        head_len: usize,
        /// Body length declared by `Content-Length` (0 if absent).
        body_len: usize,
    },
}

impl Frame {
    /// Total bytes occupied by a complete request.
    ///
    /// `None` for [`Frame::Incomplete`], or if the length does not fit in
    /// `usize`.
    pub fn total_len(&self) -> Option<usize> {
        match *self {
            Frame::Incomplete => None,
            Frame::Complete { head_len, body_len } => head_len
                .checked_add(HEAD_DELIMITER.len())
                .and_then(|n| n.checked_add(body_len)),
        }
    }
}

/// Fatal framing error; the connection cannot be resynchronised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// `Content-Length` value is not a non-negative integer.
    InvalidContentLength(String),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::InvalidContentLength(value) => {
                write!(f, "invalid Content-Length value '{value}'")
            }
        }
    }
}

impl std::error::Error for FrameError {}

/// Fatal request parse error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Request head is not valid UTF-8.
    InvalidEncoding,
    /// Request line is not `METHOD SP PATH SP VERSION`.
    MalformedRequestLine(String),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::InvalidEncoding => write!(f, "request head is not valid UTF-8"),
            ParseError::MalformedRequestLine(line) => {
                write!(f, "malformed request line '{line}'")
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// A parsed HTTP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub path: String,
    pub version: String,
    /// Header names are case-sensitive; a repeated name keeps the last value.
    pub headers: HashMap<String, String>,
    pub body: Bytes,
}

impl Request {
    /// Look up a header by its exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Determine whether `input` starts with a complete request.
///
/// The head is scanned only once the delimiter is present, and nothing is
/// consumed here: the caller takes `total_len()` bytes after a
/// [`Frame::Complete`] and calls again for the next pipelined request.
pub fn frame(input: &[u8]) -> Result<Frame, FrameError> {
    let head_len = match memmem::find(input, HEAD_DELIMITER) {
        Some(pos) => pos,
        None => return Ok(Frame::Incomplete),
    };

    let body_len = content_length(&input[..head_len])?.unwrap_or(0);
    let frame = Frame::Complete { head_len, body_len };

    // A declared length that overflows can never be satisfied
    let total = frame
        .total_len()
        .ok_or_else(|| FrameError::InvalidContentLength(body_len.to_string()))?;

    if input.len() >= total {
        Ok(frame)
    } else {
        Ok(Frame::Incomplete)
    }
}

/// Extract the declared body length from a request head.
fn content_length(head: &[u8]) -> Result<Option<usize>, FrameError> {
    // Skip the request line
    for line in head.split(|&b| b == b'\n').skip(1) {
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        let Some(value) = line
            .strip_prefix(CONTENT_LENGTH.as_bytes())
            .and_then(|rest| rest.strip_prefix(b":"))
        else {
            continue;
        };

        let value = std::str::from_utf8(value)
            .map_err(|_| FrameError::InvalidContentLength(String::from_utf8_lossy(value).into()))?
            .trim();

        return value
            .parse::<usize>()
            .map(Some)
            .map_err(|_| FrameError::InvalidContentLength(value.to_string()));
    }

    Ok(None)
}

/// Parse one framed request.
///
/// `raw` must be exactly one request as reported by [`frame`], and
/// `head_len` the head length from that frame.
pub fn parse_request(raw: Bytes, head_len: usize) -> Result<Request, ParseError> {
    let head = std::str::from_utf8(&raw[..head_len]).map_err(|_| ParseError::InvalidEncoding)?;
    let mut lines = head.split(CRLF);

    let request_line = lines.next().unwrap_or_default();
    let tokens: Vec<&str> = request_line.split(' ').collect();
    let [method, path, version] = tokens[..] else {
        return Err(ParseError::MalformedRequestLine(request_line.to_string()));
    };
    if method.is_empty() || path.is_empty() || version.is_empty() {
        return Err(ParseError::MalformedRequestLine(request_line.to_string()));
    }

    let headers = lines
        .filter_map(|line| line.split_once(": "))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    Ok(Request {
        method: method.to_string(),
        path: path.to_string(),
        version: version.to_string(),
        headers,
        body: raw.slice(head_len + HEAD_DELIMITER.len()..),
    })
}
