// src/handlers/blog.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::blog::{
        BlogCardResponse, CreateBlogRequest, DeleteBlogRequest, FullBlogResponse,
        LatestBlogsQuery, LikeBlogRequest, LikedByUserQuery, ManagedBlogResponse,
        SearchBlogsQuery, TrendingBlogResponse,
    },
    store::{BlogDeleteOutcome, BlogFilter, DynStore, NewBlog},
    utils::{html::clean_html, ids::blog_slug, jwt::Claims},
};

/// Feed page size for latest-blogs and search-blogs.
const BLOGS_PAGE_SIZE: i64 = 5;

const TRENDING_LIMIT: i64 = 5;

const DES_CHAR_LIMIT: usize = 200;

const MAX_TAGS: usize = 10;

fn content_blocks(content: &serde_json::Value) -> usize {
    content
        .get("blocks")
        .and_then(|blocks| blocks.as_array())
        .map_or(0, |blocks| blocks.len())
}

/// Creates a blog, as a draft or published.
///
/// Drafts only need a title; publishing additionally requires a
/// description, a banner, content blocks and 1 to 10 tags.
pub async fn create_blog(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    if payload.title.is_empty() {
        return Err(AppError::Validation(
            "You must provide a title to publish the blog".to_string(),
        ));
    }

    if !payload.draft {
        if payload.des.is_empty() || payload.des.chars().count() > DES_CHAR_LIMIT {
            return Err(AppError::Validation(
                "You must provide blog description under 200 characters".to_string(),
            ));
        }
        if payload.banner.is_empty() {
            return Err(AppError::Validation(
                "You must provide a banner to publish the blog".to_string(),
            ));
        }
        if content_blocks(&payload.content) == 0 {
            return Err(AppError::Validation(
                "There must be some content to publish the blog".to_string(),
            ));
        }
        if payload.tags.is_empty() || payload.tags.len() > MAX_TAGS {
            return Err(AppError::Validation(
                "Provide tags for your blog. Maximum 10".to_string(),
            ));
        }
    }

    let blog = store
        .create_blog(NewBlog {
            slug: blog_slug(),
            title: payload.title,
            des: clean_html(&payload.des),
            banner: payload.banner,
            // The editor document is stored as a one-element array.
            content: json!([payload.content]),
            tags: payload.tags,
            author_id: claims.user_id(),
            draft: payload.draft,
        })
        .await?;

    Ok(Json(json!({ "blog_id": blog.slug })))
}

/// One page of published blogs, newest first.
pub async fn latest_blogs(
    State(store): State<DynStore>,
    Query(params): Query<LatestBlogsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let skip = (page - 1) * BLOGS_PAGE_SIZE;

    let records = store.latest_blogs(skip, BLOGS_PAGE_SIZE).await?;
    let blogs: Vec<_> = records.iter().map(BlogCardResponse::from_record).collect();

    Ok(Json(json!({ "blogs": blogs })))
}

/// The five most-read published blogs.
pub async fn trending_blogs(
    State(store): State<DynStore>,
) -> Result<impl IntoResponse, AppError> {
    let records = store.trending_blogs(TRENDING_LIMIT).await?;
    let blogs: Vec<_> = records
        .iter()
        .map(TrendingBlogResponse::from_record)
        .collect();

    Ok(Json(json!({ "blogs": blogs })))
}

/// Searches published blogs by tag, title substring and author, all
/// optional and AND-combined.
pub async fn search_blogs(
    State(store): State<DynStore>,
    Query(params): Query<SearchBlogsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let page = params.page.unwrap_or(1).max(1);
    let skip = (page - 1) * BLOGS_PAGE_SIZE;

    // Empty query-string values mean "no filter", as in the client.
    let filter = BlogFilter {
        tag: params.tag.filter(|tag| !tag.is_empty()),
        title_query: params.query.filter(|query| !query.is_empty()),
        author_id: params.author,
    };

    let records = store.search_blogs(filter, skip, BLOGS_PAGE_SIZE).await?;
    let blogs: Vec<_> = records.iter().map(BlogCardResponse::from_record).collect();

    Ok(Json(json!({ "blogs": blogs })))
}

/// Full blog payload for the reading page, looked up by slug.
///
/// Every fetch bumps the blog's and the author's read counters; the
/// response itself still shows the pre-bump numbers.
pub async fn get_blog(
    State(store): State<DynStore>,
    Path(blog_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let record = store
        .read_blog(&blog_id)
        .await?
        .ok_or(AppError::NotFound("Blog not found".to_string()))?;

    Ok(Json(json!({ "blog": FullBlogResponse::from_record(&record) })))
}

/// The caller's own blogs, drafts included.
pub async fn get_user_blogs(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let blogs = store.user_blogs(claims.user_id()).await?;
    let blogs: Vec<_> = blogs.iter().map(ManagedBlogResponse::from_blog).collect();

    Ok(Json(json!({ "blogs": blogs })))
}

/// Deletes one of the caller's blogs. Comments, likes and notifications
/// attached to it go with it.
pub async fn delete_blog(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<DeleteBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    match store
        .delete_blog_owned(payload.blog_id, claims.user_id())
        .await?
    {
        BlogDeleteOutcome::Deleted => Ok(Json(json!({ "status": "Blog deleted" }))),
        BlogDeleteOutcome::NotOwnedOrMissing => Err(AppError::Forbidden(
            "Blog not found or you don't have permission to delete it".to_string(),
        )),
    }
}

/// Toggles the caller's like on a blog and reports the resolved state.
pub async fn like_blog(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<LikeBlogRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = store.toggle_like(payload.blog_id, claims.user_id()).await?;

    Ok(Json(json!({
        "liked_by_user": outcome.liked,
        "total_likes": outcome.total_likes,
    })))
}

/// Whether the caller has liked the given blog.
pub async fn is_liked_by_user(
    State(store): State<DynStore>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<LikedByUserQuery>,
) -> Result<impl IntoResponse, AppError> {
    let liked = store
        .is_liked_by_user(params.blog_id, claims.user_id())
        .await?;

    Ok(Json(json!({ "result": liked })))
}
