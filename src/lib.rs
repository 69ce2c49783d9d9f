//!
//! An HTTP gateway fronting an upstream posts/comments REST resource,
//! built on [Hyper].
//!
//! Accepts filtered queries, forwards each as a single synchronous
//! round trip to the upstream, composes a post with its comments on
//! demand, and normalizes every failure into one structured problem
//! payload `{title, status, detail}`.
//!
//! [Hyper]: https://hyper.rs/

mod client;
mod config;
mod error;
mod model;
mod routes;
mod server;
mod service;

pub use client::{build_client, HttpClient, UpstreamClient, UpstreamFailure};
pub use config::{Config, RuntimeConfig};
pub use error::{GatewayError, ProblemDetail, DEFAULT_DETAIL, DEFAULT_TITLE};
pub use model::{Comment, CommentFilter, Post, PostFilter, PostWithComments};
pub use routes::{full, handle_request, BoxBody};
pub use server::{serve, shutdown_signal};
pub use service::Gateway;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, GatewayError>;
