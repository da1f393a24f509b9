//! HTTP Module
//!
//! HTTP/1.0 request parsing and the per-connection forwarding pipeline.

pub mod pipeline;
pub mod request;

pub use pipeline::{read_request, ForwardingPipeline, Outcome, RELAY_CHUNK_SIZE};
pub use request::{
    build_forward_header, parse_request_line, parse_uri, read_headers, ClientHeaders, Method,
    RequestContext, RequestLine, Target, USER_AGENT,
};
