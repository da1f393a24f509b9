//! Forwarding pipeline for one client connection.
//!
//! Reads the request, answers from the cache when it can, and otherwise
//! streams the origin's response to the client while capturing it for the
//! cache.

use tokio::io::{AsyncBufRead, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info};

use crate::cache::SharedCache;
use crate::error::{ProxyError, Result};
use crate::http::request::{
    parse_request_line, parse_uri, read_headers, read_line, Method, RequestContext,
};

/// Bytes read from the origin per relay step.
pub const RELAY_CHUNK_SIZE: usize = 8192;

// == Outcome ==
/// How a successfully handled connection was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache without contacting the origin
    CacheHit { bytes: usize },
    /// Relayed from the origin; `cached` if the response was stored
    Relayed { bytes: usize, cached: bool },
}

// == Request Reading ==
/// Reads the request line and header block from a client.
///
/// The header block is consumed even for methods the proxy rejects, so an
/// error reply is not lost to a reset.
pub async fn read_request<R>(reader: &mut R) -> Result<RequestContext>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    if read_line(reader, &mut buf).await? == 0 {
        return Err(ProxyError::MalformedRequest(
            "connection closed before request line".to_string(),
        ));
    }

    let raw = String::from_utf8_lossy(&buf);
    info!("Request line: {}", raw.trim_end());
    let request_line = parse_request_line(&raw)?;
    let headers = read_headers(reader).await?;

    let method = Method::parse(&request_line.method)?;
    let target = parse_uri(&request_line.uri)?;

    Ok(RequestContext {
        method,
        uri: request_line.uri,
        target,
        headers,
    })
}

// == Forwarding Pipeline ==
/// Handles client connections against one cache.
///
/// Cheap to clone; every clone shares the same cache.
#[derive(Debug, Clone)]
pub struct ForwardingPipeline {
    cache: SharedCache,
    reply_on_error: bool,
}

impl ForwardingPipeline {
    pub fn new(cache: SharedCache) -> Self {
        Self {
            cache,
            reply_on_error: false,
        }
    }

    /// Answer request errors with 400/501/502 instead of closing silently.
    pub fn reply_on_error(mut self, enabled: bool) -> Self {
        self.reply_on_error = enabled;
        self
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    // == Serve ==
    /// Runs one connection to completion and closes it.
    ///
    /// The client stream is shut down on every path; the error, if any, is
    /// returned for logging only.
    pub async fn serve<S>(&self, stream: S) -> Result<Outcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut client = BufReader::new(stream);
        let result = self.forward(&mut client).await;

        if let Err(err) = &result {
            if self.reply_on_error {
                if let Some(response) = err.error_response() {
                    let _ = client.write_all(&response).await;
                }
            }
        }

        let _ = client.shutdown().await;
        result
    }

    async fn forward<S>(&self, client: &mut BufReader<S>) -> Result<Outcome>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let context = read_request(client).await?;

        if context.method.is_cacheable() {
            if let Some(payload) = self.cache.lookup(&context.uri).await {
                info!("Serving from cache: {}", context.uri);
                client.write_all(&payload).await?;
                client.flush().await?;
                return Ok(Outcome::CacheHit {
                    bytes: payload.len(),
                });
            }
            info!("Cache miss: {}", context.uri);
        } else {
            info!("Bypassing cache for {}: {}", context.method, context.uri);
        }

        self.relay(client, &context).await
    }

    // == Relay ==
    /// Streams the origin's response to the client, keeping a copy of up to
    /// `max_object_size` bytes for the cache.
    ///
    /// An empty origin response is relayed but never stored.
    async fn relay<W>(&self, client: &mut W, context: &RequestContext) -> Result<Outcome>
    where
        W: AsyncWrite + Unpin,
    {
        let host = context.target.host.as_str();
        let port = context.target.port;

        let mut origin = TcpStream::connect((host, port))
            .await
            .map_err(|source| ProxyError::Connect {
                host: host.to_string(),
                port,
                source,
            })?;
        debug!(host, port, "Connected to origin");

        origin.write_all(context.forward_header().as_bytes()).await?;

        let limit = self.cache.max_object_size();
        let mut captured = Vec::new();
        let mut chunk = vec![0u8; RELAY_CHUNK_SIZE];
        let mut total = 0usize;

        loop {
            let n = origin.read(&mut chunk).await?;
            if n == 0 {
                break;
            }
            client.write_all(&chunk[..n]).await?;
            if total + n <= limit {
                captured.extend_from_slice(&chunk[..n]);
            }
            total += n;
        }
        client.flush().await?;

        let cached = context.method.is_cacheable()
            && total > 0
            && total <= limit
            && self.cache.store(context.uri.clone(), captured).await;

        debug!(uri = %context.uri, bytes = total, cached, "Relay finished");
        Ok(Outcome::Relayed {
            bytes: total,
            cached,
        })
    }
}
