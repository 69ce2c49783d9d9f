//! Request boundary: path/method dispatch and query-to-filter parsing.
//!
//! Maps URL patterns onto [`Gateway`] operations and renders success
//! bodies as JSON. Errors are never handled here beyond propagation;
//! the caller converts any escaping [`GatewayError`] into a problem
//! response, making that the single translation point.
//!
//! Every inbound request is assigned a monotonically increasing request
//! ID and wrapped in a [`tracing::Span`] carrying structured fields.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::header::CONTENT_TYPE;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use tracing::{info, Instrument};
use url::form_urlencoded;

use crate::model::{CommentFilter, PostFilter};
use crate::{Gateway, GatewayError, Result};

/// An alias to simplify the calls to `Box<dyn std::error::Error + Send + Sync>`.
type StdError = Box<dyn std::error::Error + Send + Sync>;

/// Type-erased response body.
///
/// Wraps any body implementation behind a single boxed trait object so
/// that locally constructed JSON bodies and problem payloads share one
/// response type.
pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, StdError>;

/// Wraps a complete byte payload into a [`BoxBody`].
pub fn full(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Global monotonic counter for assigning unique request IDs.
static REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Dispatches a single inbound request to the matching gateway operation.
///
/// Routes:
/// - `GET /posts?userId&id&title` — filtered post listing
/// - `GET /posts/{id}` — single post by id
/// - `GET /posts/{postId}/comments` — post composed with its comments
/// - `GET /comments?postId&id&name&email` — filtered comment listing
///
/// A known path with a non-GET method fails with
/// [`GatewayError::MethodNotAllowed`]; an unknown path fails with
/// [`GatewayError::NotFound`].
pub async fn handle_request<B>(req: Request<B>, gateway: Gateway) -> Result<Response<BoxBody>> {
    let request_id = REQUEST_ID.fetch_add(1, Ordering::Relaxed);
    let method = req.method().clone();
    let uri = req.uri().clone();

    let span = tracing::info_span!(
        "request",
        id = request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        info!("received request");

        let path = uri.path();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            ["posts"] => {
                require_get(&method)?;
                let filter = post_filter_from_query(uri.query());
                json_response(&gateway.posts(&filter).await?)
            }
            ["posts", id] => {
                require_get(&method)?;
                json_response(&gateway.post_by_id(id).await?)
            }
            ["posts", post_id, "comments"] => {
                require_get(&method)?;
                json_response(&gateway.post_with_comments(post_id).await?)
            }
            ["comments"] => {
                require_get(&method)?;
                let filter = comment_filter_from_query(uri.query());
                json_response(&gateway.comments(&filter).await?)
            }
            _ => Err(GatewayError::NotFound(format!(
                "no handler found for {method} {path}"
            ))),
        }
    }
    .instrument(span)
    .await
}

/// Rejects any method other than GET.
fn require_get(method: &Method) -> Result<()> {
    if method == Method::GET {
        Ok(())
    } else {
        Err(GatewayError::MethodNotAllowed(format!(
            "Request method '{method}' is not supported"
        )))
    }
}

/// Renders a success value as an `application/json` response.
fn json_response<T: Serialize>(value: &T) -> Result<Response<BoxBody>> {
    let body = serde_json::to_vec(value)?;
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "application/json")
        .body(full(body))
        .map_err(Into::into)
}

/// Extracts the post filter fields from the raw query string.
///
/// Unknown parameters are ignored; a parameter present with an empty
/// value stays present (the upstream receives it as sent).
fn post_filter_from_query(query: Option<&str>) -> PostFilter {
    let mut filter = PostFilter::default();
    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "userId" => filter.user_id = Some(value.into_owned()),
            "id" => filter.id = Some(value.into_owned()),
            "title" => filter.title = Some(value.into_owned()),
            _ => {}
        }
    }
    filter
}

/// Extracts the comment filter fields from the raw query string.
fn comment_filter_from_query(query: Option<&str>) -> CommentFilter {
    let mut filter = CommentFilter::default();
    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        match key.as_ref() {
            "postId" => filter.post_id = Some(value.into_owned()),
            "id" => filter.id = Some(value.into_owned()),
            "name" => filter.name = Some(value.into_owned()),
            "email" => filter.email = Some(value.into_owned()),
            _ => {}
        }
    }
    filter
}
