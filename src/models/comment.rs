// src/models/comment.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::user::{AuthorCard, AuthorInfo};

/// Represents the 'comments' table in the database.
/// One record per comment or reply; threads are one level deep.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,

    pub blog_id: i64,

    /// Denormalized author of the owning blog, captured at creation time
    /// so notification routing never needs a second lookup.
    pub blog_author_id: i64,

    pub content: String,

    pub commented_by: i64,

    /// Present iff this comment is a reply.
    pub parent_id: Option<i64>,

    /// Kept in lockstep with `parent_id`. A CHECK constraint holds the
    /// two together at the database level.
    pub is_reply: bool,

    /// Reply ids in creation order. Only ever non-empty on top-level
    /// comments, since replies-to-replies are not modeled.
    pub children_ids: Vec<i64>,

    pub commented_at: chrono::DateTime<chrono::Utc>,
}

/// A comment row joined with its author's card columns.
#[derive(Debug, Clone)]
pub struct CommentWithAuthor {
    pub comment: Comment,
    pub author: AuthorInfo,
}

/// DTO for posting a comment or a reply.
#[derive(Debug, Deserialize)]
pub struct AddCommentRequest {
    /// The blog being commented on.
    #[serde(rename = "_id")]
    pub blog_id: i64,

    pub comment: String,

    /// Id of the comment being replied to, absent for top-level comments.
    #[serde(default)]
    pub replying_to: Option<i64>,
}

/// Query parameters for a page of top-level comments.
#[derive(Debug, Deserialize)]
pub struct BlogCommentsQuery {
    pub blog_id: i64,
    /// Running count of comments the client has already fetched.
    pub skip: Option<i64>,
}

/// Query parameters for a page of replies under one comment.
#[derive(Debug, Deserialize)]
pub struct RepliesQuery {
    #[serde(rename = "_id")]
    pub comment_id: i64,
    pub skip: Option<i64>,
}

/// DTO for deleting one's own comment.
#[derive(Debug, Deserialize)]
pub struct DeleteCommentRequest {
    #[serde(rename = "_id")]
    pub comment_id: i64,
}

/// DTO for the counter reconciliation endpoint.
#[derive(Debug, Deserialize)]
pub struct ReconcileCommentsRequest {
    #[serde(rename = "_id")]
    pub blog_id: i64,
}

/// Comment payload with its author card, as rendered in threads.
#[derive(Debug, Serialize)]
pub struct CommentResponse {
    #[serde(rename = "_id")]
    pub id: i64,
    pub blog_id: i64,
    pub blog_author: i64,
    pub comment: String,
    pub commented_by: AuthorCard,
    #[serde(rename = "commentedAt")]
    pub commented_at: chrono::DateTime<chrono::Utc>,
    pub children: Vec<i64>,
    #[serde(rename = "isReply")]
    pub is_reply: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<i64>,
}

impl CommentResponse {
    pub fn from_record(record: &CommentWithAuthor) -> Self {
        Self {
            id: record.comment.id,
            blog_id: record.comment.blog_id,
            blog_author: record.comment.blog_author_id,
            comment: record.comment.content.clone(),
            commented_by: record.author.card(),
            commented_at: record.comment.commented_at,
            children: record.comment.children_ids.clone(),
            is_reply: record.comment.is_reply,
            parent: record.comment.parent_id,
        }
    }
}
