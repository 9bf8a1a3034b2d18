//! HTTP/1.1 protocol implementation.
//!
//! A deliberately small subset of HTTP/1.1 over persistent connections:
//!
//! ```text
//! Request:  METHOD SP PATH SP VERSION CRLF *(Name ": " Value CRLF) CRLF [body]
//! Response: HTTP/1.1 SP CODE SP REASON CRLF *(Name ": " Value CRLF) CRLF [body]
//! ```
//!
//! The body length comes only from `Content-Length`; chunked transfer
//! encoding is not supported. Requests may be pipelined and are answered
//! in order.
//!
//! ## Routes
//!
//! | Path            | Method | Response                                  |
//! |-----------------|--------|-------------------------------------------|
//! | `/`             | any    | 200, empty                                |
//! | `/user-agent`   | any    | 200, `User-Agent` header value            |
//! | `/files/<name>` | GET    | 200 file bytes, or 404                    |
//! | `/files/<name>` | POST   | 201 stored, 400 bad length, 500 on error  |
//! | `/echo/<text>`  | any    | 200, `<text>` (gzip if accepted)          |
//! | other           | any    | 404                                       |

pub mod handler;
pub mod parser;
pub mod response;
pub mod router;

pub use parser::{frame, parse_request, Frame, FrameError, ParseError};
pub use router::Router;
