// src/models/blog.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::user::{AuthorCard, AuthorInfo};

/// Represents the 'blogs' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Blog {
    pub id: i64,

    /// URL-safe random identifier, generated at creation.
    pub slug: String,

    pub title: String,

    /// Short description shown on cards, capped at 200 characters.
    pub des: String,

    pub banner: String,

    /// Editor block document. Opaque to the server.
    pub content: serde_json::Value,

    pub tags: Vec<String>,

    pub author_id: i64,

    /// Every comment id ever attached to this blog, replies included,
    /// in creation order.
    pub comment_ids: Vec<i64>,

    pub total_likes: i64,
    pub total_comments: i64,
    pub total_reads: i64,
    /// Top-level comments only.
    pub total_parent_comments: i64,

    pub draft: bool,

    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl Blog {
    pub fn activity(&self) -> Activity {
        Activity {
            total_likes: self.total_likes,
            total_comments: self.total_comments,
            total_reads: self.total_reads,
            total_parent_comments: self.total_parent_comments,
        }
    }
}

/// The `activity` counter block embedded in blog payloads.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Activity {
    pub total_likes: i64,
    pub total_comments: i64,
    pub total_reads: i64,
    pub total_parent_comments: i64,
}

/// A blog row joined with its author's card columns.
#[derive(Debug, Clone)]
pub struct BlogWithAuthor {
    pub blog: Blog,
    pub author: AuthorInfo,
}

/// DTO for creating a blog, as a draft or published.
/// Everything beyond the title may be absent while drafting.
#[derive(Debug, Deserialize)]
pub struct CreateBlogRequest {
    pub title: String,
    #[serde(default)]
    pub des: String,
    #[serde(default)]
    pub banner: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub draft: bool,
}

/// Query parameters for the latest-blogs feed.
#[derive(Debug, Deserialize)]
pub struct LatestBlogsQuery {
    pub page: Option<i64>,
}

/// Query parameters for blog search.
#[derive(Debug, Deserialize)]
pub struct SearchBlogsQuery {
    /// Exact tag match.
    pub tag: Option<String>,
    /// Case-insensitive title substring.
    pub query: Option<String>,
    /// Restrict to one author's published blogs.
    pub author: Option<i64>,
    pub page: Option<i64>,
}

/// DTO for deleting one's own blog.
#[derive(Debug, Deserialize)]
pub struct DeleteBlogRequest {
    #[serde(rename = "blogId")]
    pub blog_id: i64,
}

/// DTO for the like toggle. The client also sends its own view of the
/// like state (`isLikedByUser`); the server drops it and resolves the
/// toggle from the blog_likes table instead.
#[derive(Debug, Deserialize)]
pub struct LikeBlogRequest {
    #[serde(rename = "_id")]
    pub blog_id: i64,
}

/// Query parameters for the like-state check.
#[derive(Debug, Deserialize)]
pub struct LikedByUserQuery {
    #[serde(rename = "_id")]
    pub blog_id: i64,
}

/// Card payload for the latest-blogs and search-blogs feeds.
#[derive(Debug, Serialize)]
pub struct BlogCardResponse {
    #[serde(rename = "_id")]
    pub id: i64,
    pub blog_id: String,
    pub title: String,
    pub des: String,
    pub banner: String,
    pub activity: Activity,
    pub tags: Vec<String>,
    #[serde(rename = "publishedAt")]
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub author: AuthorCard,
}

impl BlogCardResponse {
    pub fn from_record(record: &BlogWithAuthor) -> Self {
        Self {
            id: record.blog.id,
            blog_id: record.blog.slug.clone(),
            title: record.blog.title.clone(),
            des: record.blog.des.clone(),
            banner: record.blog.banner.clone(),
            activity: record.blog.activity(),
            tags: record.blog.tags.clone(),
            published_at: record.blog.published_at,
            author: record.author.card(),
        }
    }
}

/// Slim card for the trending sidebar.
#[derive(Debug, Serialize)]
pub struct TrendingBlogResponse {
    pub blog_id: String,
    pub title: String,
    #[serde(rename = "publishedAt")]
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub author: AuthorCard,
}

impl TrendingBlogResponse {
    pub fn from_record(record: &BlogWithAuthor) -> Self {
        Self {
            blog_id: record.blog.slug.clone(),
            title: record.blog.title.clone(),
            published_at: record.blog.published_at,
            author: record.author.card(),
        }
    }
}

/// Full blog payload for the reading page. The author card carries the
/// bio here, unlike feed cards.
#[derive(Debug, Serialize)]
pub struct FullBlogResponse {
    #[serde(rename = "_id")]
    pub id: i64,
    pub title: String,
    pub des: String,
    pub banner: String,
    pub content: serde_json::Value,
    pub tags: Vec<String>,
    pub author: AuthorCard,
    pub activity: Activity,
    #[serde(rename = "publishedAt")]
    pub published_at: chrono::DateTime<chrono::Utc>,
}

impl FullBlogResponse {
    pub fn from_record(record: &BlogWithAuthor) -> Self {
        Self {
            id: record.blog.id,
            title: record.blog.title.clone(),
            des: record.blog.des.clone(),
            banner: record.blog.banner.clone(),
            content: record.blog.content.clone(),
            tags: record.blog.tags.clone(),
            author: record.author.card_with_bio(),
            activity: record.blog.activity(),
            published_at: record.blog.published_at,
        }
    }
}

/// Card payload for the owner's blog management page. Drafts included.
#[derive(Debug, Serialize)]
pub struct ManagedBlogResponse {
    #[serde(rename = "_id")]
    pub id: i64,
    pub blog_id: String,
    pub title: String,
    pub des: String,
    pub banner: String,
    pub activity: Activity,
    #[serde(rename = "publishedAt")]
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub draft: bool,
}

impl ManagedBlogResponse {
    pub fn from_blog(blog: &Blog) -> Self {
        Self {
            id: blog.id,
            blog_id: blog.slug.clone(),
            title: blog.title.clone(),
            des: blog.des.clone(),
            banner: blog.banner.clone(),
            activity: blog.activity(),
            published_at: blog.published_at,
            draft: blog.draft,
        }
    }
}
