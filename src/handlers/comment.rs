// src/handlers/comment.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::comment::{
        AddCommentRequest, BlogCommentsQuery, CommentResponse, DeleteCommentRequest,
        ReconcileCommentsRequest, RepliesQuery,
    },
    store::{CommentDeleteOutcome, DynStore, NewComment},
    utils::{html::clean_html, jwt::Claims},
};

/// Page size for top-level comments under a blog.
const COMMENTS_PAGE_SIZE: i64 = 2;

/// Page size for replies under one comment.
const REPLIES_PAGE_SIZE: i64 = 5;

/// Posts a comment, or a reply when `replying_to` is present.
///
/// The store appends the new id to the blog's comment list, keeps the
/// activity counters in step and queues a notification for the blog
/// author (or the parent comment's author, for replies).
pub async fn add_comment(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<AddCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let record = store
        .create_comment(NewComment {
            blog_id: payload.blog_id,
            author_id: claims.user_id(),
            content: clean_html(&payload.comment),
            parent_id: payload.replying_to,
        })
        .await?;

    Ok(Json(json!({ "comment": CommentResponse::from_record(&record) })))
}

/// One page of a blog's top-level comments, newest first. Replies are
/// not inlined; the client loads them per comment via `/get-replies`.
pub async fn get_blog_comments(
    State(store): State<DynStore>,
    Query(params): Query<BlogCommentsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let skip = params.skip.unwrap_or(0).max(0);

    let records = store
        .top_level_comments(params.blog_id, skip, COMMENTS_PAGE_SIZE)
        .await?;
    let comments: Vec<_> = records.iter().map(CommentResponse::from_record).collect();

    Ok(Json(json!({ "comments": comments })))
}

/// One page of replies under a comment, newest first.
pub async fn get_replies(
    State(store): State<DynStore>,
    Query(params): Query<RepliesQuery>,
) -> Result<impl IntoResponse, AppError> {
    let skip = params.skip.unwrap_or(0).max(0);

    let records = store
        .comment_replies(params.comment_id, skip, REPLIES_PAGE_SIZE)
        .await?;
    let replies: Vec<_> = records.iter().map(CommentResponse::from_record).collect();

    Ok(Json(json!({ "replies": replies })))
}

/// Deletes one of the caller's comments along with its replies.
///
/// Deleting an id that no longer exists still reports `Done`, so a
/// double-fired delete button stays quiet.
pub async fn delete_comment(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<DeleteCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    match store
        .delete_comment_owned(payload.comment_id, claims.user_id())
        .await?
    {
        CommentDeleteOutcome::Deleted { .. } | CommentDeleteOutcome::AlreadyGone => {
            Ok(Json(json!({ "status": "Done" })))
        }
        CommentDeleteOutcome::NotOwner => Err(AppError::Forbidden(
            "You can only delete your own comments".to_string(),
        )),
    }
}

/// Recounts a blog's comment aggregates from the comment records and
/// returns the repaired activity block.
pub async fn reconcile_blog_comments(
    State(store): State<DynStore>,
    Json(payload): Json<ReconcileCommentsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let activity = store
        .reconcile_blog_comments(payload.blog_id)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    Ok(Json(json!({ "status": "Done", "activity": activity })))
}
