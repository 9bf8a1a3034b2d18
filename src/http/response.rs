//! HTTP response construction and wire encoding.

use bytes::{BufMut, Bytes, BytesMut};

/// Response status codes produced by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    Created,
    BadRequest,
    NotFound,
    InternalServerError,
}

impl StatusCode {
    pub fn code(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::Created => 201,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::InternalServerError => 500,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::Created => "Created",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
        }
    }
}

/// An HTTP response; headers are written in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl Response {
    /// Response with no headers and no body.
    pub fn empty(status: StatusCode) -> Self {
        Response {
            status,
            headers: Vec::new(),
            body: Bytes::new(),
        }
    }

    /// 200 response carrying `body` as `content_type`.
    pub fn ok(content_type: &'static str, body: impl Into<Bytes>) -> Self {
        Self::empty(StatusCode::Ok).with_body(content_type, None, body.into())
    }

    /// 200 response whose body has already been encoded with `encoding`.
    pub fn encoded(content_type: &'static str, encoding: &'static str, body: Bytes) -> Self {
        Self::empty(StatusCode::Ok).with_body(content_type, Some(encoding), body)
    }

    /// Attach a body; `Content-Length` always reflects the bytes written.
    fn with_body(
        mut self,
        content_type: &'static str,
        encoding: Option<&'static str>,
        body: Bytes,
    ) -> Self {
        self.headers.push(("Content-Type", content_type.to_string()));
        if let Some(encoding) = encoding {
            self.headers.push(("Content-Encoding", encoding.to_string()));
        }
        self.headers.push(("Content-Length", body.len().to_string()));
        self.body = body;
        self
    }

    /// Look up a header value by name.
    #[cfg(test)]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find_map(|(k, v)| (*k == name).then_some(v.as_str()))
    }

    /// Serialize to wire format.
    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(64 + self.body.len());

        out.put_slice(
            format!("HTTP/1.1 {} {}\r\n", self.status.code(), self.status.reason()).as_bytes(),
        );
        for (name, value) in &self.headers {
            out.put_slice(name.as_bytes());
            out.put_slice(b": ");
            out.put_slice(value.as_bytes());
            out.put_slice(b"\r\n");
        }
        out.put_slice(b"\r\n");
        out.put_slice(&self.body);

        out.freeze()
    }
}
