//! Shared helpers for the proxy integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use cache_proxy::{Acceptor, Dispatcher, ForwardingPipeline, ObjectCache, SharedCache};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub type Seen = Arc<Mutex<Vec<String>>>;

// == Origin Stub ==

/// Origin server answering every request with `response`, then closing.
///
/// Returns its address and the request headers it has received so far.
pub async fn spawn_origin(response: Vec<u8>) -> (SocketAddr, Seen) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let log = log.clone();
            let response = response.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut byte = [0u8; 1];
                while !request.ends_with(b"\r\n\r\n") {
                    match socket.read(&mut byte).await {
                        Ok(0) | Err(_) => break,
                        Ok(_) => request.push(byte[0]),
                    }
                }
                log.lock()
                    .unwrap()
                    .push(String::from_utf8_lossy(&request).into_owned());
                let _ = socket.write_all(&response).await;
            });
        }
    });

    (addr, seen)
}

/// A complete HTTP/1.0 response with `body`.
pub fn ok_response(body: &[u8]) -> Vec<u8> {
    let mut response = format!(
        "HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    response
}

// == Proxy ==

pub fn shared_cache(max_cache: usize, max_object: usize) -> SharedCache {
    SharedCache::new(ObjectCache::new(max_cache, max_object).unwrap())
}

pub fn pipeline(cache: &SharedCache) -> ForwardingPipeline {
    ForwardingPipeline::new(cache.clone())
}

/// Starts an acceptor on an ephemeral port that runs until the test ends.
pub async fn spawn_proxy(dispatcher: Dispatcher) -> SocketAddr {
    let acceptor = Acceptor::bind("127.0.0.1:0".parse().unwrap())
        .await
        .unwrap();
    let addr = acceptor.local_addr().unwrap();
    tokio::spawn(acceptor.run(dispatcher, std::future::pending::<()>()));
    addr
}

/// Sends `request` to the proxy and returns everything it answers with.
pub async fn send_raw(proxy: SocketAddr, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request.as_bytes()).await.unwrap();
    stream.shutdown().await.unwrap();

    let mut received = Vec::new();
    stream.read_to_end(&mut received).await.unwrap();
    received
}

/// Proxied GET for `uri`.
pub async fn get(proxy: SocketAddr, uri: &str) -> Vec<u8> {
    send_raw(proxy, &format!("GET {} HTTP/1.0\r\n\r\n", uri)).await
}
