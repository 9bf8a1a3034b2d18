//! Static route table and request dispatch.
//!
//! Routes are matched in table order by exact path or fixed prefix; the
//! first match wins and unmatched requests get a 404. The table is built
//! once at startup and shared read-only by every connection.

use super::handler;
use super::parser::Request;
use super::response::{Response, StatusCode};
use std::path::{Path, PathBuf};
use tracing::trace;

/// Method constraint of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodFilter {
    Any,
    Get,
    Post,
}

impl MethodFilter {
    fn matches(&self, method: &str) -> bool {
        match self {
            MethodFilter::Any => true,
            MethodFilter::Get => method == "GET",
            MethodFilter::Post => method == "POST",
        }
    }
}

/// Path constraint of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathPattern {
    /// Path must equal the pattern.
    Exact(&'static str),
    /// Path must start with the pattern; the remainder is the parameter.
    Prefix(&'static str),
}

impl PathPattern {
    /// Match `path`, returning the trailing parameter (empty for exact routes).
    fn matches<'a>(&self, path: &'a str) -> Option<&'a str> {
        match *self {
            PathPattern::Exact(exact) => (path == exact).then_some(""),
            PathPattern::Prefix(prefix) => path.strip_prefix(prefix),
        }
    }
}

/// Handler bound to a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Root,
    UserAgent,
    ReadFile,
    WriteFile,
    Echo,
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub method: MethodFilter,
    pub pattern: PathPattern,
    pub endpoint: Endpoint,
}

const ROUTES: [Route; 5] = [
    Route {
        method: MethodFilter::Any,
        pattern: PathPattern::Exact("/"),
        endpoint: Endpoint::Root,
    },
    Route {
        method: MethodFilter::Any,
        pattern: PathPattern::Exact("/user-agent"),
        endpoint: Endpoint::UserAgent,
    },
    Route {
        method: MethodFilter::Get,
        pattern: PathPattern::Prefix("/files/"),
        endpoint: Endpoint::ReadFile,
    },
    Route {
        method: MethodFilter::Post,
        pattern: PathPattern::Prefix("/files/"),
        endpoint: Endpoint::WriteFile,
    },
    Route {
        method: MethodFilter::Any,
        pattern: PathPattern::Prefix("/echo/"),
        endpoint: Endpoint::Echo,
    },
];

/// Dispatches requests against the route table.
#[derive(Debug)]
pub struct Router {
    routes: Vec<Route>,
    /// Root directory for the file endpoints; `None` if not configured.
    directory: Option<PathBuf>,
}

impl Router {
    /// Build the router with the standard route table.
    pub fn new(directory: Option<PathBuf>) -> Self {
        Router {
            routes: ROUTES.to_vec(),
            directory,
        }
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Find the first route matching `request`, with its path parameter.
    pub fn route<'a>(&self, request: &'a Request) -> Option<(Endpoint, &'a str)> {
        self.routes.iter().find_map(|route| {
            if !route.method.matches(&request.method) {
                return None;
            }
            route
                .pattern
                .matches(&request.path)
                .map(|param| (route.endpoint, param))
        })
    }

    /// Produce the response for `request`.
    pub async fn dispatch(&self, request: &Request) -> Response {
        let Some((endpoint, param)) = self.route(request) else {
            trace!(method = %request.method, path = %request.path, "No route");
            return Response::empty(StatusCode::NotFound);
        };

        trace!(method = %request.method, path = %request.path, ?endpoint, "Dispatching");

        match endpoint {
            Endpoint::Root => handler::root(),
            Endpoint::UserAgent => handler::user_agent(request),
            Endpoint::ReadFile => handler::read_file(self.directory(), param).await,
            Endpoint::WriteFile => handler::write_file(self.directory(), param, request).await,
            Endpoint::Echo => handler::echo(request, param),
        }
    }
}
