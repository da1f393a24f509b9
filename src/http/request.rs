//! Request parsing and outbound header construction.
//!
//! Turns the client's request line and header block into a [`RequestContext`]
//! and rewrites it into the HTTP/1.0 header sent to the origin.

use std::fmt;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use tracing::debug;

use crate::error::{ProxyError, Result};

/// Longest request or header line accepted from a client, in bytes.
pub const MAX_LINE_LENGTH: usize = 8192;

/// Port used when the request URI names none.
pub const DEFAULT_PORT: u16 = 80;

/// User-Agent sent to every origin in place of the client's.
pub const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

// == Method ==
/// Methods the proxy forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

impl Method {
    /// Matches GET or HEAD case-insensitively.
    pub fn parse(token: &str) -> Result<Self> {
        if token.eq_ignore_ascii_case("GET") {
            Ok(Method::Get)
        } else if token.eq_ignore_ascii_case("HEAD") {
            Ok(Method::Head)
        } else {
            Err(ProxyError::UnsupportedMethod(token.to_string()))
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
        }
    }

    /// Whether responses to this method may be served from or stored in the
    /// cache. HEAD responses carry no body and share the GET key.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, Method::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Request Line ==
/// The three tokens of an HTTP request line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub uri: String,
    /// Missing on HTTP/0.9 style requests
    pub version: Option<String>,
}

/// Splits a request line on whitespace.
///
/// # Errors
/// [`ProxyError::MalformedRequest`] if the method or URI is missing.
pub fn parse_request_line(line: &str) -> Result<RequestLine> {
    let mut tokens = line.split_whitespace();

    match (tokens.next(), tokens.next()) {
        (Some(method), Some(uri)) => Ok(RequestLine {
            method: method.to_string(),
            uri: uri.to_string(),
            version: tokens.next().map(str::to_string),
        }),
        _ => Err(ProxyError::MalformedRequest(format!(
            "request line {:?} needs a method and a URI",
            line.trim_end()
        ))),
    }
}

// == Target ==
/// Where a request URI points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub path: String,
}

/// Splits a request URI into host, port and path.
///
/// The host starts after `//` when present, the path at the next `/`
/// (defaulting to `/`), and a `:` before the path introduces the port
/// (defaulting to 80).
///
/// ```
/// use cache_proxy::http::parse_uri;
///
/// let target = parse_uri("http://example.com:8080/a/b").unwrap();
/// assert_eq!(target.host, "example.com");
/// assert_eq!(target.port, 8080);
/// assert_eq!(target.path, "/a/b");
/// ```
pub fn parse_uri(uri: &str) -> Result<Target> {
    let host_start = uri.find("//").map(|i| i + 2).unwrap_or(0);
    let rest = &uri[host_start..];

    let path_begin = rest.find('/').unwrap_or(rest.len());
    let (authority, path) = rest.split_at(path_begin);
    let path = if path.is_empty() { "/" } else { path };

    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, port),
        None => (authority, ""),
    };

    if host.is_empty() {
        return Err(ProxyError::MalformedRequest(format!(
            "no host in request URI {:?}",
            uri
        )));
    }

    let port = if port.is_empty() {
        DEFAULT_PORT
    } else {
        port.parse().map_err(|_| {
            ProxyError::MalformedRequest(format!("invalid port {:?} in {:?}", port, uri))
        })?
    };

    Ok(Target {
        host: host.to_string(),
        port,
        path: path.to_string(),
    })
}

// == Client Headers ==
/// Header block received from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientHeaders {
    /// The client's `Host:` line, CRLF-terminated, forwarded as is
    pub host_line: Option<String>,
    /// Every other header; read but never forwarded
    pub other: Vec<(String, String)>,
}

/// Reads one line, newline included, into `buf`.
///
/// Returns 0 at end of stream.
///
/// # Errors
/// [`ProxyError::MalformedRequest`] if the line is longer than
/// [`MAX_LINE_LENGTH`].
pub async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    let n = (&mut *reader)
        .take(MAX_LINE_LENGTH as u64)
        .read_until(b'\n', buf)
        .await?;

    if n == MAX_LINE_LENGTH && buf.last() != Some(&b'\n') {
        return Err(ProxyError::MalformedRequest(format!(
            "line longer than {} bytes",
            MAX_LINE_LENGTH
        )));
    }
    Ok(n)
}

/// Consumes input up to and including the next newline.
async fn skip_line<R>(reader: &mut R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let (used, done) = {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(());
            }
            match available.iter().position(|&b| b == b'\n') {
                Some(i) => (i + 1, true),
                None => (available.len(), false),
            }
        };
        reader.consume(used);
        if done {
            return Ok(());
        }
    }
}

/// Reads header lines up to the blank line (or end of stream).
///
/// Header lines longer than [`MAX_LINE_LENGTH`] are dropped, except an
/// over-long `Host:` line, which is [`ProxyError::MalformedRequest`].
pub async fn read_headers<R>(reader: &mut R) -> Result<ClientHeaders>
where
    R: AsyncBufRead + Unpin,
{
    let mut headers = ClientHeaders::default();
    let mut buf = Vec::with_capacity(256);

    loop {
        buf.clear();
        let n = (&mut *reader)
            .take(MAX_LINE_LENGTH as u64)
            .read_until(b'\n', &mut buf)
            .await?;
        if n == 0 {
            break;
        }

        if n == MAX_LINE_LENGTH && buf.last() != Some(&b'\n') {
            skip_line(reader).await?;
            let line = String::from_utf8_lossy(&buf);
            let name = line.split(':').next().unwrap_or_default();
            if name.trim().eq_ignore_ascii_case("Host") {
                return Err(ProxyError::MalformedRequest(format!(
                    "Host line longer than {} bytes",
                    MAX_LINE_LENGTH
                )));
            }
            debug!("Dropping header line longer than {} bytes", MAX_LINE_LENGTH);
            continue;
        }

        let line = String::from_utf8_lossy(&buf);
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if name.trim().eq_ignore_ascii_case("Host") {
            headers.host_line = Some(format!("{}\r\n", line));
        } else {
            headers
                .other
                .push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    Ok(headers)
}

// == Request Context ==
/// Everything known about one client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: Method,
    /// Raw request URI; also the cache key
    pub uri: String,
    pub target: Target,
    pub headers: ClientHeaders,
}

impl RequestContext {
    /// The header block to send to the origin.
    pub fn forward_header(&self) -> String {
        build_forward_header(
            self.method,
            &self.target.path,
            &self.target.host,
            self.headers.host_line.as_deref(),
        )
    }
}

// == Forward Header ==
/// Builds the HTTP/1.0 request header sent to the origin.
///
/// Only the client's `Host:` line survives; connection handling and the
/// user agent are always replaced.
pub fn build_forward_header(
    method: Method,
    path: &str,
    host: &str,
    client_host_line: Option<&str>,
) -> String {
    let host_line = match client_host_line {
        Some(line) => line.to_string(),
        None => format!("Host: {}\r\n", host),
    };

    format!(
        "{} {} HTTP/1.0\r\n{}Connection: close\r\nProxy-Connection: close\r\nUser-Agent: {}\r\n\r\n",
        method, path, host_line, USER_AGENT
    )
}
