//! Shared test infrastructure for integration tests.
//!
//! Provides throwaway upstream servers on OS-assigned ports, canonical
//! post/comment fixtures, hit counters for observing which upstream
//! endpoints were called, and gateway constructors wired to a local
//! backend.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use postern::{build_client, BoxBody, Config, Gateway, RuntimeConfig, UpstreamClient};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// The canonical post used across the mock upstream.
pub const POST_1: &str = r#"{"userId":1,"id":1,"title":"T","body":"B"}"#;

/// A second post that exists upstream but has no comments.
pub const POST_2: &str = r#"{"userId":2,"id":2,"title":"T2","body":"B2"}"#;

/// The unfiltered post listing the mock upstream returns.
pub const POSTS_LIST: &str =
    r#"[{"userId":1,"id":1,"title":"T","body":"B"},{"userId":2,"id":2,"title":"T2","body":"B2"}]"#;

/// Comments owned by post 1, in upstream return order.
pub const POST_1_COMMENTS: &str = r#"[{"postId":1,"id":1,"name":"N1","email":"n1@example.com","body":"C1"},{"postId":1,"id":2,"name":"N2","email":"n2@example.com","body":"C2"}]"#;

/// Initializes a tracing subscriber for test output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("debug")
        .try_init();
}

/// Collects a [`BoxBody`] into [`Bytes`], mapping any body error to a
/// descriptive panic so test assertions remain concise.
pub async fn collect_body(body: BoxBody) -> Bytes {
    body.collect()
        .await
        .expect("failed to collect response body")
        .to_bytes()
}

/// Builds a `RuntimeConfig` whose post and comment bases point at the
/// given local upstream address.
pub fn test_config(addr: SocketAddr) -> RuntimeConfig {
    Config {
        post_base_url: Some(format!("http://{addr}/posts")),
        comment_base_url: Some(format!("http://{addr}/comments")),
        request_timeout_ms: Some(5000),
        ..Default::default()
    }
    .into_runtime()
    .expect("test config must be valid")
}

/// Builds an [`UpstreamClient`] against the given local upstream.
pub fn test_upstream_client(addr: SocketAddr) -> UpstreamClient {
    let config = test_config(addr);
    UpstreamClient::new(build_client(&config), &config)
}

/// Builds a [`Gateway`] against the given local upstream.
pub fn test_gateway(addr: SocketAddr) -> Gateway {
    Gateway::new(test_upstream_client(addr))
}

/// Counts how many times each mock upstream endpoint was hit.
#[derive(Debug, Default)]
pub struct UpstreamHits {
    pub posts: AtomicUsize,
    pub post_by_id: AtomicUsize,
    pub post_comments: AtomicUsize,
    pub comments: AtomicUsize,
}

/// Starts a mock upstream implementing the posts/comments resource.
///
/// Post 1 exists with two comments, post 2 exists with none; every
/// other id returns 404 with an empty JSON object body. Returns the
/// server address, a shutdown handle, and shared hit counters.
pub async fn start_upstream() -> (SocketAddr, oneshot::Sender<()>, Arc<UpstreamHits>) {
    let (tx, rx) = oneshot::channel::<()>();
    let hits = Arc::new(UpstreamHits::default());

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind mock upstream");
    let addr = listener.local_addr().unwrap();

    let server_hits = Arc::clone(&hits);
    tokio::spawn(async move {
        let mut shutdown = std::pin::pin!(async {
            let _ = rx.await;
        });

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, _) = result.expect("accept failed");
                    let hits = Arc::clone(&server_hits);
                    let service = service_fn(move |req: Request<Incoming>| {
                        let hits = Arc::clone(&hits);
                        async move {
                            Ok::<_, std::convert::Infallible>(route_mock(&req, &hits))
                        }
                    });
                    tokio::spawn(async move {
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await;
                    });
                }
                () = &mut shutdown => break,
            }
        }
    });

    (addr, tx, hits)
}

fn route_mock(req: &Request<Incoming>, hits: &UpstreamHits) -> Response<Full<Bytes>> {
    let path = req.uri().path().to_owned();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["posts"] => {
            hits.posts.fetch_add(1, Ordering::SeqCst);
            json_ok(POSTS_LIST)
        }
        ["posts", "1"] => {
            hits.post_by_id.fetch_add(1, Ordering::SeqCst);
            json_ok(POST_1)
        }
        ["posts", "2"] => {
            hits.post_by_id.fetch_add(1, Ordering::SeqCst);
            json_ok(POST_2)
        }
        ["posts", "1", "comments"] => {
            hits.post_comments.fetch_add(1, Ordering::SeqCst);
            json_ok(POST_1_COMMENTS)
        }
        ["posts", "2", "comments"] => {
            hits.post_comments.fetch_add(1, Ordering::SeqCst);
            json_ok("[]")
        }
        ["posts", _, "comments"] => {
            hits.post_comments.fetch_add(1, Ordering::SeqCst);
            json_not_found()
        }
        ["posts", _] => {
            hits.post_by_id.fetch_add(1, Ordering::SeqCst);
            json_not_found()
        }
        ["comments"] => {
            hits.comments.fetch_add(1, Ordering::SeqCst);
            json_ok(POST_1_COMMENTS)
        }
        _ => json_not_found(),
    }
}

fn json_ok(body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from(body)))
        .expect("mock response must build")
}

fn json_not_found() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("content-type", "application/json")
        .body(Full::new(Bytes::from("{}")))
        .expect("mock response must build")
}

/// Starts a backend that responds to every request with the given
/// status, content-type, and body, regardless of path.
pub async fn start_backend(
    status: StatusCode,
    content_type: &'static str,
    body: &'static str,
) -> (SocketAddr, oneshot::Sender<()>) {
    let (tx, rx) = oneshot::channel::<()>();

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind test backend");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut shutdown = std::pin::pin!(async {
            let _ = rx.await;
        });

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, _) = result.expect("accept failed");
                    let service = service_fn(move |_req: Request<Incoming>| {
                        async move {
                            Ok::<_, std::convert::Infallible>(
                                Response::builder()
                                    .status(status)
                                    .header("content-type", content_type)
                                    .body(Full::new(Bytes::from(body)))
                                    .expect("test response must build"),
                            )
                        }
                    });
                    tokio::spawn(async move {
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await;
                    });
                }
                () = &mut shutdown => break,
            }
        }
    });

    (addr, tx)
}

/// Starts a backend that records the path and query of every request
/// and responds 200 with the given JSON body. Used to verify the exact
/// wire form of constructed queries.
pub async fn start_capture_backend(
    body: &'static str,
) -> (SocketAddr, oneshot::Sender<()>, Arc<Mutex<Vec<String>>>) {
    let (tx, rx) = oneshot::channel::<()>();
    let captured = Arc::new(Mutex::new(Vec::new()));

    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind capture backend");
    let addr = listener.local_addr().unwrap();

    let server_captured = Arc::clone(&captured);
    tokio::spawn(async move {
        let mut shutdown = std::pin::pin!(async {
            let _ = rx.await;
        });

        loop {
            tokio::select! {
                result = listener.accept() => {
                    let (stream, _) = result.expect("accept failed");
                    let captured = Arc::clone(&server_captured);
                    let service = service_fn(move |req: Request<Incoming>| {
                        let captured = Arc::clone(&captured);
                        async move {
                            let seen = req
                                .uri()
                                .path_and_query()
                                .map(|pq| pq.as_str().to_owned())
                                .unwrap_or_default();
                            captured.lock().unwrap().push(seen);
                            Ok::<_, std::convert::Infallible>(
                                Response::builder()
                                    .status(StatusCode::OK)
                                    .header("content-type", "application/json")
                                    .body(Full::new(Bytes::from(body)))
                                    .expect("test response must build"),
                            )
                        }
                    });
                    tokio::spawn(async move {
                        let _ = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), service)
                            .await;
                    });
                }
                () = &mut shutdown => break,
            }
        }
    });

    (addr, tx, captured)
}

/// Binds a listener just to reserve an address, then drops it so the
/// port refuses connections.
pub async fn unreachable_addr() -> SocketAddr {
    let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind");
    listener.local_addr().unwrap()
}
