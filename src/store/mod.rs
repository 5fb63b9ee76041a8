// src/store/mod.rs

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::blog::{Activity, Blog, BlogWithAuthor};
use crate::models::comment::CommentWithAuthor;
use crate::models::notification::NotificationView;
use crate::models::user::{SocialLinks, User};

pub use memory::MemStore;
pub use postgres::PgStore;

/// Shared handle to whichever store backs the running process.
pub type DynStore = Arc<dyn Store>;

/// Columns for a new user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub username: String,
    pub profile_img: String,
}

/// Columns for a new blog row.
#[derive(Debug, Clone)]
pub struct NewBlog {
    pub slug: String,
    pub title: String,
    pub des: String,
    pub banner: String,
    pub content: serde_json::Value,
    pub tags: Vec<String>,
    pub author_id: i64,
    pub draft: bool,
}

/// Inputs for one comment or reply creation.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub blog_id: i64,
    pub author_id: i64,
    pub content: String,
    pub parent_id: Option<i64>,
}

/// Optional search-blogs filters, combined with AND.
#[derive(Debug, Clone, Default)]
pub struct BlogFilter {
    pub tag: Option<String>,
    pub title_query: Option<String>,
    pub author_id: Option<i64>,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy)]
pub struct LikeOutcome {
    pub liked: bool,
    pub total_likes: i64,
}

/// Result of an ownership-gated blog delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlogDeleteOutcome {
    Deleted,
    /// Missing and not-owned are deliberately indistinguishable to the caller.
    NotOwnedOrMissing,
}

/// Result of an ownership-gated comment delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentDeleteOutcome {
    /// The comment and its reply subtree are gone; `removed` counts both.
    Deleted { removed: i64 },
    /// The comment no longer exists. The delete path reports success.
    AlreadyGone,
    /// The comment exists but belongs to someone else.
    NotOwner,
}

/// Persistence seam for the whole API surface.
///
/// `PgStore` is the production implementation; `MemStore` backs the
/// integration tests. Multi-record write sequences (comment creation,
/// comment deletion, like toggles) are atomic per call: partial updates
/// are never observable, whichever implementation is active.
#[async_trait]
pub trait Store: Send + Sync {
    // --- users ---

    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn username_taken(&self, username: &str) -> Result<bool, AppError>;

    /// Case-insensitive username substring search.
    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError>;

    async fn update_profile(
        &self,
        user_id: i64,
        username: &str,
        bio: &str,
        social_links: &SocialLinks,
    ) -> Result<(), AppError>;

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError>;

    // --- blogs ---

    /// Inserts the blog and bumps the author's total_posts unless it is
    /// a draft.
    async fn create_blog(&self, new_blog: NewBlog) -> Result<Blog, AppError>;

    /// Published blogs, newest first.
    async fn latest_blogs(&self, skip: i64, limit: i64) -> Result<Vec<BlogWithAuthor>, AppError>;

    /// Published blogs by reads, then likes, then recency.
    async fn trending_blogs(&self, limit: i64) -> Result<Vec<BlogWithAuthor>, AppError>;

    async fn search_blogs(
        &self,
        filter: BlogFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BlogWithAuthor>, AppError>;

    /// Fetches one blog by slug and bumps its read counter plus the
    /// author's. The returned record carries the pre-bump counts.
    async fn read_blog(&self, slug: &str) -> Result<Option<BlogWithAuthor>, AppError>;

    /// Every blog of one author, drafts included, newest first.
    async fn user_blogs(&self, author_id: i64) -> Result<Vec<Blog>, AppError>;

    async fn delete_blog_owned(
        &self,
        blog_id: i64,
        requester_id: i64,
    ) -> Result<BlogDeleteOutcome, AppError>;

    /// Flips the requester's like on a blog and adjusts total_likes.
    /// Liking also queues a 'like' notification for the blog's author;
    /// unliking removes it again.
    async fn toggle_like(&self, blog_id: i64, user_id: i64) -> Result<LikeOutcome, AppError>;

    async fn is_liked_by_user(&self, blog_id: i64, user_id: i64) -> Result<bool, AppError>;

    // --- comments ---

    /// Inserts a comment, appends its id to the blog's comment_ids,
    /// bumps total_comments (and total_parent_comments for top-level
    /// comments), appends reply ids to the parent's children_ids, and
    /// queues a notification for the blog author (or, for replies, the
    /// parent comment's author). All in one transaction.
    ///
    /// Fails with `Validation` on empty text and `NotFound` when the
    /// blog or the parent comment is missing.
    async fn create_comment(&self, new_comment: NewComment)
    -> Result<CommentWithAuthor, AppError>;

    /// One page of top-level comments, newest first.
    async fn top_level_comments(
        &self,
        blog_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError>;

    /// One page of replies under a comment, newest first. Fails with
    /// `NotFound` when the parent comment does not exist.
    async fn comment_replies(
        &self,
        parent_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError>;

    /// Deletes a comment and its reply subtree if the requester owns
    /// the comment, detaching every removed id from the blog and, for
    /// replies, from the parent's children_ids, with matching counter
    /// decrements. All in one transaction.
    async fn delete_comment_owned(
        &self,
        comment_id: i64,
        requester_id: i64,
    ) -> Result<CommentDeleteOutcome, AppError>;

    /// Recounts a blog's comment aggregates from the comment records
    /// and rewrites comment_ids and children_ids to match. Corrective
    /// tool for counter drift; returns the repaired activity block, or
    /// None when the blog does not exist.
    async fn reconcile_blog_comments(&self, blog_id: i64) -> Result<Option<Activity>, AppError>;

    // --- notifications ---

    /// One page of a user's notifications, newest first, optionally
    /// restricted to one kind.
    async fn notifications_for(
        &self,
        user_id: i64,
        kind: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<NotificationView>, AppError>;

    /// Marks one of the user's notifications as read. A miss (wrong id
    /// or wrong owner) is a silent no-op.
    async fn mark_notification_seen(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> Result<(), AppError>;
}
