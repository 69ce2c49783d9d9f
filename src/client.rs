//! Upstream client: query construction, the HTTP round trip, and
//! failure classification.
//!
//! Every call resolves to either the decoded success body or a tagged
//! [`UpstreamFailure`], so the per-operation mapping into
//! [`GatewayError`] is a pure match over the variant rather than an
//! inspection of exception types. Each round trip logs request and
//! response metadata (method, URI, headers, body) as a diagnostic side
//! channel; the log output is not part of the contract.

use std::fmt;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::{Method, Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::model::{Comment, CommentFilter, Post, PostFilter};
use crate::{GatewayError, Result, RuntimeConfig};

/// The HTTP client type for upstream connections. All upstream calls
/// are GETs with empty bodies.
pub type HttpClient = Client<HttpConnector, Empty<Bytes>>;

/// Constructs a new [`HttpClient`] using the configured pool settings.
pub fn build_client(config: &RuntimeConfig) -> HttpClient {
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build(HttpConnector::new())
}

/// A classified upstream failure, produced by a single round trip.
#[derive(Debug)]
pub enum UpstreamFailure {
    /// The upstream reported 404 for the requested URI.
    NotFound { message: String },
    /// The upstream reported a non-404 4xx status.
    Client { status: StatusCode, message: String },
    /// The upstream reported a 5xx (or otherwise non-success) status.
    Server { status: StatusCode, message: String },
    /// The round trip itself failed: connect error, timeout, or an
    /// unreadable response body.
    Transport { message: String },
    /// The response body was not valid JSON for the expected type.
    Decode { message: String },
}

impl fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { message }
            | Self::Client { message, .. }
            | Self::Server { message, .. }
            | Self::Transport { message }
            | Self::Decode { message } => write!(f, "{message}"),
        }
    }
}

/// Issues filtered queries and by-id fetches against the upstream
/// posts/comments resource, classifying every failure.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: HttpClient,
    post_base: Url,
    comment_base: Url,
    request_timeout: Duration,
}

impl UpstreamClient {
    /// Creates a client over validated base URLs from the runtime config.
    pub fn new(http: HttpClient, config: &RuntimeConfig) -> Self {
        Self {
            http,
            post_base: config.post_base.clone(),
            comment_base: config.comment_base.clone(),
            request_timeout: config.request_timeout,
        }
    }

    /// Lists posts matching the filter.
    ///
    /// The query contains exactly the fields present in `filter`, each
    /// once; absent fields are omitted, never sent as empty. Any
    /// upstream 4xx/5xx yields a generic system error — list failures
    /// are not resource-identity failures, so the upstream status is
    /// not copied.
    pub async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let url = self.posts_url(filter);
        self.fetch_json(&url).await.map_err(|failure| match failure {
            UpstreamFailure::Transport { message } | UpstreamFailure::Decode { message } => {
                GatewayError::Internal(message)
            }
            other => GatewayError::system(format!("Error retrieving posts: {other}")),
        })
    }

    /// Fetches a single post by path segment.
    ///
    /// An upstream 404 becomes a system error pre-populated with status
    /// 404 and title `"Resource Not Found"`; any other upstream status
    /// error becomes a generic system error.
    pub async fn get_post_by_id(&self, id: &str) -> Result<Post> {
        let result = async {
            let url = self.post_path(&[id])?;
            self.fetch_json(&url).await
        }
        .await;

        result.map_err(|failure| match failure {
            UpstreamFailure::NotFound { .. } => GatewayError::system_with(
                format!("Cannot find a Post with id {id}"),
                "Resource Not Found",
                404,
            ),
            UpstreamFailure::Transport { message } | UpstreamFailure::Decode { message } => {
                GatewayError::Internal(message)
            }
            other => GatewayError::system(format!("Error retrieving posts: {other}")),
        })
    }

    /// Fetches the comments sub-resource for a post.
    ///
    /// A post with no comments returns an empty list, not an error. An
    /// upstream 404 here surfaces as a generic system error rather than
    /// a resource-not-found translation; the asymmetry with
    /// [`Self::get_post_by_id`] is intentional.
    pub async fn post_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let result = async {
            let url = self.post_path(&[post_id, "comments"])?;
            self.fetch_json(&url).await
        }
        .await;

        result.map_err(|failure| match failure {
            UpstreamFailure::Transport { message } | UpstreamFailure::Decode { message } => {
                GatewayError::Internal(message)
            }
            other => GatewayError::system(format!("Error retrieving post comments: {other}")),
        })
    }

    /// Lists comments matching the filter, with the same query
    /// construction discipline as [`Self::list_posts`].
    pub async fn list_comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>> {
        let url = self.comments_url(filter);
        self.fetch_json(&url).await.map_err(|failure| match failure {
            UpstreamFailure::Transport { message } | UpstreamFailure::Decode { message } => {
                GatewayError::Internal(message)
            }
            other => GatewayError::system(format!("Error retrieving comments: {other}")),
        })
    }

    /// Builds the posts list URL from the present filter fields.
    fn posts_url(&self, filter: &PostFilter) -> Url {
        let mut url = self.post_base.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(user_id) = &filter.user_id {
                query.append_pair("userId", user_id);
            }
            if let Some(id) = &filter.id {
                query.append_pair("id", id);
            }
            if let Some(title) = &filter.title {
                query.append_pair("title", title);
            }
        }
        strip_empty_query(&mut url);
        url
    }

    /// Builds the comments list URL from the present filter fields.
    fn comments_url(&self, filter: &CommentFilter) -> Url {
        let mut url = self.comment_base.clone();
        {
            let mut query = url.query_pairs_mut();
            if let Some(post_id) = &filter.post_id {
                query.append_pair("postId", post_id);
            }
            if let Some(id) = &filter.id {
                query.append_pair("id", id);
            }
            if let Some(name) = &filter.name {
                query.append_pair("name", name);
            }
            if let Some(email) = &filter.email {
                query.append_pair("email", email);
            }
        }
        strip_empty_query(&mut url);
        url
    }

    /// Appends path segments to the post base URL.
    fn post_path(&self, segments: &[&str]) -> std::result::Result<Url, UpstreamFailure> {
        let mut url = self.post_base.clone();
        url.path_segments_mut()
            .map_err(|()| UpstreamFailure::Transport {
                message: "post base URL cannot carry path segments".into(),
            })?
            .extend(segments);
        Ok(url)
    }

    /// Performs one GET round trip and classifies the result.
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &Url,
    ) -> std::result::Result<T, UpstreamFailure> {
        let uri = url
            .as_str()
            .parse::<hyper::Uri>()
            .map_err(|e| UpstreamFailure::Transport {
                message: format!("failed to build upstream URI {url}: {e}"),
            })?;

        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Empty::<Bytes>::new())
            .map_err(|e| UpstreamFailure::Transport {
                message: format!("failed to build upstream request: {e}"),
            })?;

        debug!(
            method = %request.method(),
            uri = %url,
            headers = ?request.headers(),
            body = "",
            "upstream request"
        );

        let response = timeout(self.request_timeout, self.http.request(request))
            .await
            .map_err(|_| UpstreamFailure::Transport {
                message: format!(
                    "upstream request to {url} timed out after {:?}",
                    self.request_timeout
                ),
            })?
            .map_err(|e| UpstreamFailure::Transport {
                message: format!("upstream request to {url} failed: {e}"),
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| UpstreamFailure::Transport {
                message: format!("failed to read upstream response body: {e}"),
            })?
            .to_bytes();

        debug!(
            status = status.as_u16(),
            headers = ?headers,
            body = %String::from_utf8_lossy(&bytes),
            "upstream response"
        );

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| UpstreamFailure::Decode {
                message: format!("failed to decode upstream response from {url}: {e}"),
            });
        }

        Err(classify_status(status, &bytes))
    }
}

/// Drops a dangling `?` left behind when no query pairs were appended.
fn strip_empty_query(url: &mut Url) {
    if url.query() == Some("") {
        url.set_query(None);
    }
}

/// Classifies a non-success upstream status into an [`UpstreamFailure`].
fn classify_status(status: StatusCode, body: &[u8]) -> UpstreamFailure {
    let reason = status.canonical_reason().unwrap_or("Unknown Status");
    let body_text = String::from_utf8_lossy(body);
    let message = if body_text.trim().is_empty() {
        format!("{} {reason}", status.as_u16())
    } else {
        format!("{} {reason}: \"{}\"", status.as_u16(), body_text.trim())
    };

    if status == StatusCode::NOT_FOUND {
        UpstreamFailure::NotFound { message }
    } else if status.is_client_error() {
        UpstreamFailure::Client { status, message }
    } else {
        UpstreamFailure::Server { status, message }
    }
}
