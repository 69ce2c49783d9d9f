//! Aggregation service: thin orchestration over the upstream client.
//!
//! Holds no state of its own. Three operations are direct pass-throughs;
//! [`Gateway::post_with_comments`] is the single composite, issuing two
//! sequential upstream calls and merging the results.

use crate::client::UpstreamClient;
use crate::model::{Comment, CommentFilter, Post, PostFilter, PostWithComments};
use crate::Result;

/// Orchestrates upstream calls on behalf of the request boundary.
#[derive(Debug, Clone)]
pub struct Gateway {
    client: UpstreamClient,
}

impl Gateway {
    /// Creates a gateway over the given upstream client.
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Lists posts matching the filter. Pass-through.
    pub async fn posts(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        self.client.list_posts(filter).await
    }

    /// Fetches a single post by id. Pass-through.
    pub async fn post_by_id(&self, id: &str) -> Result<Post> {
        self.client.get_post_by_id(id).await
    }

    /// Lists comments matching the filter. Pass-through.
    pub async fn comments(&self, filter: &CommentFilter) -> Result<Vec<Comment>> {
        self.client.list_comments(filter).await
    }

    /// Fetches a post and its comments, composing both into one result.
    ///
    /// The two upstream calls are sequential, post first; if the post
    /// fetch fails, the error propagates unchanged and the comments
    /// call is never issued. Comment order is preserved verbatim.
    pub async fn post_with_comments(&self, post_id: &str) -> Result<PostWithComments> {
        let post = self.client.get_post_by_id(post_id).await?;
        let comments = self.client.post_comments(post_id).await?;

        Ok(PostWithComments {
            post_id: post.id,
            title: post.title,
            body: post.body,
            comments,
        })
    }
}
