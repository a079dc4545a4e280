//! Request diagnostics captured with new comments for spam forensics

use serde::{Deserialize, Serialize};

/// Field caps in bytes, applied once at capture time
pub mod limits {
    pub const HTTP_ACCEPT: usize = 128;
    pub const HTTP_ACCEPT_CHARSET: usize = 64;
    pub const HTTP_ACCEPT_ENCODING: usize = 64;
    pub const HTTP_ACCEPT_LANGUAGE: usize = 64;
    pub const HTTP_CONNECTION: usize = 64;
    pub const HTTP_REFERER: usize = 255;
    pub const HTTP_USER_AGENT: usize = 128;
    pub const SERVER_NAME: usize = 64;
    pub const QUERY_STRING: usize = 64;
    pub const REMOTE_ADDR: usize = 40;
    pub const REMOTE_HOST: usize = 255;
    pub const REMOTE_PORT: usize = 16;
}

/// Metadata of the inbound request that creates a comment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMetadata {
    pub http_accept: Option<String>,
    pub http_accept_charset: Option<String>,
    pub http_accept_encoding: Option<String>,
    pub http_accept_language: Option<String>,
    pub http_connection: Option<String>,
    pub http_referer: Option<String>,
    pub http_user_agent: Option<String>,
    pub http_host: Option<String>,
    pub server_name: Option<String>,
    pub query_string: Option<String>,
    pub remote_addr: Option<String>,
    pub remote_host: Option<String>,
    pub remote_port: Option<String>,
}

impl RequestMetadata {
    /// Build from CGI-style variables (`HTTP_USER_AGENT`, `REMOTE_ADDR`, ...)
    pub fn from_cgi<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            http_accept: lookup("HTTP_ACCEPT"),
            http_accept_charset: lookup("HTTP_ACCEPT_CHARSET"),
            http_accept_encoding: lookup("HTTP_ACCEPT_ENCODING"),
            http_accept_language: lookup("HTTP_ACCEPT_LANGUAGE"),
            http_connection: lookup("HTTP_CONNECTION"),
            http_referer: lookup("HTTP_REFERER"),
            http_user_agent: lookup("HTTP_USER_AGENT"),
            http_host: lookup("HTTP_HOST"),
            server_name: lookup("SERVER_NAME"),
            query_string: lookup("QUERY_STRING"),
            remote_addr: lookup("REMOTE_ADDR"),
            remote_host: lookup("REMOTE_HOST"),
            remote_port: lookup("REMOTE_PORT"),
        }
    }
}

/// Snapshot of request metadata stored with a comment
///
/// Field names carry the `server_` prefix so they stay recognisable once
/// flattened into the comment record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerDiagnostics {
    pub server_http_accept: Option<String>,
    pub server_http_accept_charset: Option<String>,
    pub server_http_accept_encoding: Option<String>,
    pub server_http_accept_language: Option<String>,
    pub server_http_connection: Option<String>,
    pub server_http_referer: Option<String>,
    pub server_http_user_agent: Option<String>,
    pub server_name: Option<String>,
    pub server_query_string: Option<String>,
    pub server_remote_addr: Option<String>,
    pub server_remote_host: Option<String>,
    pub server_remote_port: Option<String>,
}

impl ServerDiagnostics {
    /// Truncated snapshot of a request
    pub fn from_request(request: &RequestMetadata) -> Self {
        let server_name = request
            .server_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(request.http_host.as_deref());

        Self {
            server_http_accept: capped(request.http_accept.as_deref(), limits::HTTP_ACCEPT),
            server_http_accept_charset: capped(
                request.http_accept_charset.as_deref(),
                limits::HTTP_ACCEPT_CHARSET,
            ),
            server_http_accept_encoding: capped(
                request.http_accept_encoding.as_deref(),
                limits::HTTP_ACCEPT_ENCODING,
            ),
            server_http_accept_language: capped(
                request.http_accept_language.as_deref(),
                limits::HTTP_ACCEPT_LANGUAGE,
            ),
            server_http_connection: capped(
                request.http_connection.as_deref(),
                limits::HTTP_CONNECTION,
            ),
            server_http_referer: capped(request.http_referer.as_deref(), limits::HTTP_REFERER),
            server_http_user_agent: capped(
                request.http_user_agent.as_deref(),
                limits::HTTP_USER_AGENT,
            ),
            server_name: capped(server_name, limits::SERVER_NAME),
            server_query_string: capped(request.query_string.as_deref(), limits::QUERY_STRING),
            server_remote_addr: capped(request.remote_addr.as_deref(), limits::REMOTE_ADDR),
            server_remote_host: capped(request.remote_host.as_deref(), limits::REMOTE_HOST),
            server_remote_port: capped(request.remote_port.as_deref(), limits::REMOTE_PORT),
        }
    }

    /// `server_name` doubles as the "already captured" sentinel
    pub fn is_captured(&self) -> bool {
        self.server_name.as_deref().is_some_and(|name| !name.is_empty())
    }

    /// Capture from the request unless a snapshot is already present.
    /// Fields that already hold a value are left alone.
    /// Returns whether anything was captured.
    pub fn capture_once(&mut self, request: &RequestMetadata) -> bool {
        if self.is_captured() {
            return false;
        }
        let captured = Self::from_request(request);

        fill(&mut self.server_http_accept, captured.server_http_accept);
        fill(&mut self.server_http_accept_charset, captured.server_http_accept_charset);
        fill(&mut self.server_http_accept_encoding, captured.server_http_accept_encoding);
        fill(&mut self.server_http_accept_language, captured.server_http_accept_language);
        fill(&mut self.server_http_connection, captured.server_http_connection);
        fill(&mut self.server_http_referer, captured.server_http_referer);
        fill(&mut self.server_http_user_agent, captured.server_http_user_agent);
        fill(&mut self.server_name, captured.server_name);
        fill(&mut self.server_query_string, captured.server_query_string);
        fill(&mut self.server_remote_addr, captured.server_remote_addr);
        fill(&mut self.server_remote_host, captured.server_remote_host);
        fill(&mut self.server_remote_port, captured.server_remote_port);
        true
    }
}

/// Store `value` only where nothing was recorded yet
fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.as_deref().map_or(true, str::is_empty) {
        *slot = value;
    }
}

fn capped(value: Option<&str>, max_bytes: usize) -> Option<String> {
    value.map(|value| truncate_bytes(value, max_bytes).to_string())
}

/// Longest prefix of at most `max_bytes` bytes that ends on a char boundary
pub fn truncate_bytes(value: &str, max_bytes: usize) -> &str {
    if value.len() <= max_bytes {
        return value;
    }
    let mut end = max_bytes;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}
