// src/models/notification.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::user::{AuthorCard, AuthorInfo};

/// Represents the 'notifications' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,

    /// 'like', 'comment' or 'reply'.
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: String,

    pub blog_id: i64,

    /// Recipient user id.
    pub notification_for: i64,

    /// Acting user id.
    pub user_id: i64,

    /// The new comment, for 'comment' notifications.
    pub comment_id: Option<i64>,

    /// The new reply, for 'reply' notifications.
    pub reply_id: Option<i64>,

    /// The comment that was replied to, for 'reply' notifications.
    pub replied_on_comment_id: Option<i64>,

    pub seen: bool,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A notification row joined with everything its card renders.
#[derive(Debug, Clone)]
pub struct NotificationView {
    pub notification: Notification,
    pub blog_slug: String,
    pub blog_title: String,
    pub actor: AuthorInfo,
    pub comment_text: Option<String>,
    pub reply_text: Option<String>,
    pub replied_on_text: Option<String>,
}

/// Query parameters for the notifications feed.
#[derive(Debug, Deserialize)]
pub struct NotificationsQuery {
    pub page: Option<i64>,
    /// 'all' or one notification kind.
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Count of notifications the client deleted from earlier pages,
    /// folded into the skip so pages stay contiguous.
    #[serde(rename = "deletedDocCount")]
    pub deleted_doc_count: Option<i64>,
}

/// DTO for marking a notification as read.
#[derive(Debug, Deserialize)]
pub struct MarkNotificationRequest {
    #[serde(rename = "notificationId")]
    pub notification_id: i64,
}

/// The blog reference embedded in a notification payload.
#[derive(Debug, Serialize)]
pub struct NotificationBlogRef {
    #[serde(rename = "_id")]
    pub id: i64,
    pub blog_id: String,
    pub title: String,
}

/// A referenced comment's text, embedded in a notification payload.
#[derive(Debug, Serialize)]
pub struct CommentSnippet {
    #[serde(rename = "_id")]
    pub id: i64,
    pub comment: String,
}

/// Wire shape of one notifications-feed entry.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub seen: bool,
    #[serde(rename = "createdAt")]
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub blog: NotificationBlogRef,
    pub user: AuthorCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<CommentSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<CommentSnippet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replied_on_comment: Option<CommentSnippet>,
}

impl NotificationResponse {
    pub fn from_view(view: &NotificationView) -> Self {
        let snippet = |id: Option<i64>, text: &Option<String>| {
            match (id, text) {
                (Some(id), Some(comment)) => Some(CommentSnippet {
                    id,
                    comment: comment.clone(),
                }),
                _ => None,
            }
        };

        Self {
            id: view.notification.id,
            kind: view.notification.kind.clone(),
            seen: view.notification.seen,
            created_at: view.notification.created_at,
            blog: NotificationBlogRef {
                id: view.notification.blog_id,
                blog_id: view.blog_slug.clone(),
                title: view.blog_title.clone(),
            },
            user: view.actor.card(),
            comment: snippet(view.notification.comment_id, &view.comment_text),
            reply: snippet(view.notification.reply_id, &view.reply_text),
            replied_on_comment: snippet(
                view.notification.replied_on_comment_id,
                &view.replied_on_text,
            ),
        }
    }
}
