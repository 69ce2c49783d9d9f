//! Domain types for the upstream posts/comments resource.
//!
//! These are plain data carriers mirroring the upstream JSON schema.
//! All behavior (query construction, classification) lives in the
//! client; the filter types only record which constraints are present.

use serde::{Deserialize, Serialize};

/// A post as returned by the upstream resource, identified by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    /// Identifier of the user who authored the post.
    pub user_id: i64,
    pub id: i64,
    pub title: String,
    pub body: String,
}

/// A comment as returned by the upstream resource, logically owned by
/// the post whose `id` equals `post_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub post_id: i64,
    pub id: i64,
    pub name: String,
    pub email: String,
    pub body: String,
}

/// Filter criteria for listing posts.
///
/// An absent field means "no constraint on this field", never
/// "match empty"; only present fields become query parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostFilter {
    pub user_id: Option<String>,
    pub id: Option<String>,
    pub title: Option<String>,
}

/// Filter criteria for listing comments, with the same absence
/// semantics as [`PostFilter`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentFilter {
    pub post_id: Option<String>,
    pub id: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
}

/// A post composed with its comments, built on demand from two
/// upstream calls and never persisted.
///
/// `post_id`, `title`, and `body` are copied from the fetched post;
/// `comments` preserves the upstream return order verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithComments {
    pub post_id: i64,
    pub title: String,
    pub body: String,
    pub comments: Vec<Comment>,
}
