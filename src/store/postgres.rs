// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::blog::{Activity, Blog, BlogWithAuthor};
use crate::models::comment::{Comment, CommentWithAuthor};
use crate::models::notification::{Notification, NotificationView};
use crate::models::user::{AuthorInfo, SocialLinks, User};
use crate::store::{
    BlogDeleteOutcome, BlogFilter, CommentDeleteOutcome, LikeOutcome, NewBlog, NewComment,
    NewUser, Store,
};

/// Author card columns, aliased with an `author_` prefix when joined
/// next to a blog or comment row.
const AUTHOR_COLUMNS: &str = "u.fullname AS author_fullname, u.username AS author_username, \
     u.profile_img AS author_profile_img, u.bio AS author_bio";

/// Row struct for blog queries joined with the author.
#[derive(Debug, sqlx::FromRow)]
struct BlogWithAuthorRow {
    #[sqlx(flatten)]
    blog: Blog,
    author_fullname: String,
    author_username: String,
    author_profile_img: String,
    author_bio: String,
}

impl From<BlogWithAuthorRow> for BlogWithAuthor {
    fn from(row: BlogWithAuthorRow) -> Self {
        BlogWithAuthor {
            blog: row.blog,
            author: AuthorInfo {
                fullname: row.author_fullname,
                username: row.author_username,
                profile_img: row.author_profile_img,
                bio: row.author_bio,
            },
        }
    }
}

/// Row struct for comment queries joined with the commenter.
#[derive(Debug, sqlx::FromRow)]
struct CommentWithAuthorRow {
    #[sqlx(flatten)]
    comment: Comment,
    author_fullname: String,
    author_username: String,
    author_profile_img: String,
    author_bio: String,
}

impl From<CommentWithAuthorRow> for CommentWithAuthor {
    fn from(row: CommentWithAuthorRow) -> Self {
        CommentWithAuthor {
            comment: row.comment,
            author: AuthorInfo {
                fullname: row.author_fullname,
                username: row.author_username,
                profile_img: row.author_profile_img,
                bio: row.author_bio,
            },
        }
    }
}

/// Row struct for the notifications feed join.
#[derive(Debug, sqlx::FromRow)]
struct NotificationViewRow {
    #[sqlx(flatten)]
    notification: Notification,
    blog_slug: String,
    blog_title: String,
    actor_fullname: String,
    actor_username: String,
    actor_profile_img: String,
    actor_bio: String,
    comment_text: Option<String>,
    reply_text: Option<String>,
    replied_on_text: Option<String>,
}

impl From<NotificationViewRow> for NotificationView {
    fn from(row: NotificationViewRow) -> Self {
        NotificationView {
            notification: row.notification,
            blog_slug: row.blog_slug,
            blog_title: row.blog_title,
            actor: AuthorInfo {
                fullname: row.actor_fullname,
                username: row.actor_username,
                profile_img: row.actor_profile_img,
                bio: row.actor_bio,
            },
            comment_text: row.comment_text,
            reply_text: row.reply_text,
            replied_on_text: row.replied_on_text,
        }
    }
}

/// Row struct for the rows removed by a cascade delete.
#[derive(Debug, sqlx::FromRow)]
struct DeletedCommentRow {
    id: i64,
    is_reply: bool,
}

/// Production store backed by PostgreSQL.
///
/// Everything that spans more than one row (comment creation and
/// deletion, like toggles, read bumps) runs inside a transaction, and
/// every counter change is an atomic in-place update. Application code
/// never read-modify-writes a counter.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    // Postgres error code for unique violation is 23505
    e.to_string().contains("unique constraint") || e.to_string().contains("23505")
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (fullname, email, password, username, profile_img)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new_user.fullname)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&new_user.username)
        .bind(&new_user.profile_img)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already exists".to_string())
            } else {
                AppError::from(e)
            }
        })?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn username_taken(&self, username: &str) -> Result<bool, AppError> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;

        Ok(taken)
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE username ILIKE '%' || $1 || '%'
            ORDER BY username
            LIMIT $2
            "#,
        )
        .bind(query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        username: &str,
        bio: &str,
        social_links: &SocialLinks,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET username = $2, bio = $3, social_links = $4 WHERE id = $1")
            .bind(user_id)
            .bind(username)
            .bind(bio)
            .bind(sqlx::types::Json(social_links))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Username is already taken".to_string())
                } else {
                    AppError::from(e)
                }
            })?;

        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(user_id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn create_blog(&self, new_blog: NewBlog) -> Result<Blog, AppError> {
        let mut tx = self.pool.begin().await?;

        let blog = sqlx::query_as::<_, Blog>(
            r#"
            INSERT INTO blogs (slug, title, des, banner, content, tags, author_id, draft)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&new_blog.slug)
        .bind(&new_blog.title)
        .bind(&new_blog.des)
        .bind(&new_blog.banner)
        .bind(&new_blog.content)
        .bind(&new_blog.tags)
        .bind(new_blog.author_id)
        .bind(new_blog.draft)
        .fetch_one(&mut *tx)
        .await?;

        // Drafts do not count towards the author's published total.
        let increment: i64 = if new_blog.draft { 0 } else { 1 };
        sqlx::query("UPDATE users SET total_posts = total_posts + $2 WHERE id = $1")
            .bind(new_blog.author_id)
            .bind(increment)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(blog)
    }

    async fn latest_blogs(&self, skip: i64, limit: i64) -> Result<Vec<BlogWithAuthor>, AppError> {
        let rows = sqlx::query_as::<_, BlogWithAuthorRow>(&format!(
            r#"
            SELECT b.*, {AUTHOR_COLUMNS}
            FROM blogs b
            JOIN users u ON b.author_id = u.id
            WHERE b.draft = FALSE
            ORDER BY b.published_at DESC, b.id DESC
            OFFSET $1 LIMIT $2
            "#
        ))
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn trending_blogs(&self, limit: i64) -> Result<Vec<BlogWithAuthor>, AppError> {
        let rows = sqlx::query_as::<_, BlogWithAuthorRow>(&format!(
            r#"
            SELECT b.*, {AUTHOR_COLUMNS}
            FROM blogs b
            JOIN users u ON b.author_id = u.id
            WHERE b.draft = FALSE
            ORDER BY b.total_reads DESC, b.total_likes DESC, b.published_at DESC
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn search_blogs(
        &self,
        filter: BlogFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BlogWithAuthor>, AppError> {
        let rows = sqlx::query_as::<_, BlogWithAuthorRow>(&format!(
            r#"
            SELECT b.*, {AUTHOR_COLUMNS}
            FROM blogs b
            JOIN users u ON b.author_id = u.id
            WHERE b.draft = FALSE
              AND ($1::TEXT IS NULL OR $1 = ANY(b.tags))
              AND ($2::TEXT IS NULL OR b.title ILIKE '%' || $2 || '%')
              AND ($3::BIGINT IS NULL OR b.author_id = $3)
            ORDER BY b.published_at DESC, b.id DESC
            OFFSET $4 LIMIT $5
            "#
        ))
        .bind(filter.tag)
        .bind(filter.title_query)
        .bind(filter.author_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn read_blog(&self, slug: &str) -> Result<Option<BlogWithAuthor>, AppError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, BlogWithAuthorRow>(&format!(
            r#"
            SELECT b.*, {AUTHOR_COLUMNS}
            FROM blogs b
            JOIN users u ON b.author_id = u.id
            WHERE b.slug = $1
            "#
        ))
        .bind(slug)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        // The response shows the pre-bump count; this read lands on the
        // next fetch.
        sqlx::query("UPDATE blogs SET total_reads = total_reads + 1 WHERE id = $1")
            .bind(row.blog.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE users SET total_reads = total_reads + 1 WHERE id = $1")
            .bind(row.blog.author_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(Some(row.into()))
    }

    async fn user_blogs(&self, author_id: i64) -> Result<Vec<Blog>, AppError> {
        let blogs = sqlx::query_as::<_, Blog>(
            r#"
            SELECT * FROM blogs
            WHERE author_id = $1
            ORDER BY published_at DESC, id DESC
            "#,
        )
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(blogs)
    }

    async fn delete_blog_owned(
        &self,
        blog_id: i64,
        requester_id: i64,
    ) -> Result<BlogDeleteOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let found: Option<(i64, bool)> =
            sqlx::query_as("SELECT author_id, draft FROM blogs WHERE id = $1")
                .bind(blog_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((author_id, draft)) = found else {
            return Ok(BlogDeleteOutcome::NotOwnedOrMissing);
        };
        if author_id != requester_id {
            return Ok(BlogDeleteOutcome::NotOwnedOrMissing);
        }

        // Comments, likes and notifications go with the blog via
        // ON DELETE CASCADE.
        sqlx::query("DELETE FROM blogs WHERE id = $1")
            .bind(blog_id)
            .execute(&mut *tx)
            .await?;

        if !draft {
            sqlx::query(
                "UPDATE users SET total_posts = GREATEST(0, total_posts - 1) WHERE id = $1",
            )
            .bind(requester_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(BlogDeleteOutcome::Deleted)
    }

    async fn toggle_like(&self, blog_id: i64, user_id: i64) -> Result<LikeOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let author: Option<i64> = sqlx::query_scalar("SELECT author_id FROM blogs WHERE id = $1")
            .bind(blog_id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(author_id) = author else {
            return Err(AppError::NotFound("Blog not found".to_string()));
        };

        let already_liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM blog_likes WHERE blog_id = $1 AND user_id = $2)",
        )
        .bind(blog_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        let total_likes: i64 = if already_liked {
            sqlx::query("DELETE FROM blog_likes WHERE blog_id = $1 AND user_id = $2")
                .bind(blog_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                "DELETE FROM notifications WHERE type = 'like' AND blog_id = $1 AND user_id = $2",
            )
            .bind(blog_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query_scalar(
                r#"
                UPDATE blogs SET total_likes = GREATEST(0, total_likes - 1)
                WHERE id = $1
                RETURNING total_likes
                "#,
            )
            .bind(blog_id)
            .fetch_one(&mut *tx)
            .await?
        } else {
            sqlx::query("INSERT INTO blog_likes (blog_id, user_id) VALUES ($1, $2)")
                .bind(blog_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            sqlx::query(
                r#"
                INSERT INTO notifications (type, blog_id, notification_for, user_id)
                VALUES ('like', $1, $2, $3)
                "#,
            )
            .bind(blog_id)
            .bind(author_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query_scalar(
                r#"
                UPDATE blogs SET total_likes = total_likes + 1
                WHERE id = $1
                RETURNING total_likes
                "#,
            )
            .bind(blog_id)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await?;

        Ok(LikeOutcome {
            liked: !already_liked,
            total_likes,
        })
    }

    async fn is_liked_by_user(&self, blog_id: i64, user_id: i64) -> Result<bool, AppError> {
        let liked: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM blog_likes WHERE blog_id = $1 AND user_id = $2)",
        )
        .bind(blog_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(liked)
    }

    async fn create_comment(
        &self,
        new_comment: NewComment,
    ) -> Result<CommentWithAuthor, AppError> {
        if new_comment.content.is_empty() {
            return Err(AppError::Validation(
                "Write something to leave a comment".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let author: Option<(String, String, String, String)> = sqlx::query_as(
            "SELECT fullname, username, profile_img, bio FROM users WHERE id = $1",
        )
        .bind(new_comment.author_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((fullname, username, profile_img, bio)) = author else {
            return Err(AppError::NotFound("User not found".to_string()));
        };

        let blog_author: Option<i64> =
            sqlx::query_scalar("SELECT author_id FROM blogs WHERE id = $1")
                .bind(new_comment.blog_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(blog_author_id) = blog_author else {
            return Err(AppError::NotFound("Blog not found".to_string()));
        };

        // For replies the parent must exist and live on the same blog.
        let parent: Option<(i64, i64)> = match new_comment.parent_id {
            Some(parent_id) => {
                let parent: Option<(i64, i64)> = sqlx::query_as(
                    "SELECT id, commented_by FROM comments WHERE id = $1 AND blog_id = $2",
                )
                .bind(parent_id)
                .bind(new_comment.blog_id)
                .fetch_optional(&mut *tx)
                .await?;
                Some(parent.ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?)
            }
            None => None,
        };

        let comment = sqlx::query_as::<_, Comment>(
            r#"
            INSERT INTO comments (blog_id, blog_author_id, content, commented_by, parent_id, is_reply)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(new_comment.blog_id)
        .bind(blog_author_id)
        .bind(&new_comment.content)
        .bind(new_comment.author_id)
        .bind(new_comment.parent_id)
        .bind(new_comment.parent_id.is_some())
        .fetch_one(&mut *tx)
        .await?;

        let top_level_increment: i64 = if comment.is_reply { 0 } else { 1 };
        sqlx::query(
            r#"
            UPDATE blogs
            SET comment_ids = array_append(comment_ids, $2),
                total_comments = total_comments + 1,
                total_parent_comments = total_parent_comments + $3
            WHERE id = $1
            "#,
        )
        .bind(comment.blog_id)
        .bind(comment.id)
        .bind(top_level_increment)
        .execute(&mut *tx)
        .await?;

        if let Some((parent_id, parent_author_id)) = parent {
            sqlx::query(
                "UPDATE comments SET children_ids = array_append(children_ids, $2) WHERE id = $1",
            )
            .bind(parent_id)
            .bind(comment.id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO notifications
                    (type, blog_id, notification_for, user_id, reply_id, replied_on_comment_id)
                VALUES ('reply', $1, $2, $3, $4, $5)
                "#,
            )
            .bind(comment.blog_id)
            .bind(parent_author_id)
            .bind(comment.commented_by)
            .bind(comment.id)
            .bind(parent_id)
            .execute(&mut *tx)
            .await?;
        } else {
            sqlx::query(
                r#"
                INSERT INTO notifications (type, blog_id, notification_for, user_id, comment_id)
                VALUES ('comment', $1, $2, $3, $4)
                "#,
            )
            .bind(comment.blog_id)
            .bind(blog_author_id)
            .bind(comment.commented_by)
            .bind(comment.id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(CommentWithAuthor {
            comment,
            author: AuthorInfo {
                fullname,
                username,
                profile_img,
                bio,
            },
        })
    }

    async fn top_level_comments(
        &self,
        blog_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError> {
        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(&format!(
            r#"
            SELECT c.*, {AUTHOR_COLUMNS}
            FROM comments c
            JOIN users u ON c.commented_by = u.id
            WHERE c.blog_id = $1 AND c.is_reply = FALSE
            ORDER BY c.commented_at DESC, c.id DESC
            OFFSET $2 LIMIT $3
            "#
        ))
        .bind(blog_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn comment_replies(
        &self,
        parent_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM comments WHERE id = $1)")
            .bind(parent_id)
            .fetch_one(&self.pool)
            .await?;
        if !exists {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(&format!(
            r#"
            SELECT c.*, {AUTHOR_COLUMNS}
            FROM comments c
            JOIN users u ON c.commented_by = u.id
            WHERE c.parent_id = $1
            ORDER BY c.commented_at DESC, c.id DESC
            OFFSET $2 LIMIT $3
            "#
        ))
        .bind(parent_id)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_comment_owned(
        &self,
        comment_id: i64,
        requester_id: i64,
    ) -> Result<CommentDeleteOutcome, AppError> {
        let mut tx = self.pool.begin().await?;

        let found: Option<(i64, i64, bool, Option<i64>)> = sqlx::query_as(
            "SELECT blog_id, commented_by, is_reply, parent_id FROM comments WHERE id = $1",
        )
        .bind(comment_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((blog_id, owner_id, was_reply, parent_id)) = found else {
            return Ok(CommentDeleteOutcome::AlreadyGone);
        };
        if owner_id != requester_id {
            return Ok(CommentDeleteOutcome::NotOwner);
        }

        // Take the whole reply subtree down with the comment.
        let deleted = sqlx::query_as::<_, DeletedCommentRow>(
            r#"
            WITH RECURSIVE doomed AS (
                SELECT id, is_reply FROM comments WHERE id = $1
                UNION ALL
                SELECT c.id, c.is_reply
                FROM comments c
                JOIN doomed d ON c.parent_id = d.id
            )
            DELETE FROM comments
            WHERE id IN (SELECT id FROM doomed)
            RETURNING id, is_reply
            "#,
        )
        .bind(comment_id)
        .fetch_all(&mut *tx)
        .await?;

        let removed = deleted.len() as i64;
        let top_level_removed = deleted.iter().filter(|row| !row.is_reply).count() as i64;
        let removed_ids: Vec<i64> = deleted.iter().map(|row| row.id).collect();

        sqlx::query(
            r#"
            UPDATE blogs
            SET comment_ids = (
                    SELECT COALESCE(array_agg(cid ORDER BY ord), '{}'::bigint[])
                    FROM unnest(comment_ids) WITH ORDINALITY AS t(cid, ord)
                    WHERE cid <> ALL($2::bigint[])
                ),
                total_comments = GREATEST(0, total_comments - $3),
                total_parent_comments = GREATEST(0, total_parent_comments - $4)
            WHERE id = $1
            "#,
        )
        .bind(blog_id)
        .bind(&removed_ids)
        .bind(removed)
        .bind(top_level_removed)
        .execute(&mut *tx)
        .await?;

        if let Some(parent_id) = parent_id {
            sqlx::query(
                "UPDATE comments SET children_ids = array_remove(children_ids, $2) WHERE id = $1",
            )
            .bind(parent_id)
            .bind(comment_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(CommentDeleteOutcome::Deleted { removed })
    }

    async fn reconcile_blog_comments(&self, blog_id: i64) -> Result<Option<Activity>, AppError> {
        let mut tx = self.pool.begin().await?;

        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM blogs WHERE id = $1)")
            .bind(blog_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE comments p
            SET children_ids = COALESCE(
                    (SELECT array_agg(c.id ORDER BY c.commented_at, c.id)
                     FROM comments c
                     WHERE c.parent_id = p.id),
                    '{}'::bigint[])
            WHERE p.blog_id = $1
            "#,
        )
        .bind(blog_id)
        .execute(&mut *tx)
        .await?;

        let activity = sqlx::query_as::<_, Activity>(
            r#"
            UPDATE blogs
            SET total_comments = stats.total,
                total_parent_comments = stats.top_level,
                comment_ids = stats.ids
            FROM (
                SELECT COUNT(*) AS total,
                       COUNT(*) FILTER (WHERE NOT is_reply) AS top_level,
                       COALESCE(array_agg(id ORDER BY commented_at, id), '{}'::bigint[]) AS ids
                FROM comments
                WHERE blog_id = $1
            ) AS stats
            WHERE blogs.id = $1
            RETURNING blogs.total_likes, blogs.total_comments, blogs.total_reads,
                      blogs.total_parent_comments
            "#,
        )
        .bind(blog_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(activity))
    }

    async fn notifications_for(
        &self,
        user_id: i64,
        kind: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<NotificationView>, AppError> {
        let rows = sqlx::query_as::<_, NotificationViewRow>(
            r#"
            SELECT n.*,
                   b.slug AS blog_slug, b.title AS blog_title,
                   u.fullname AS actor_fullname, u.username AS actor_username,
                   u.profile_img AS actor_profile_img, u.bio AS actor_bio,
                   c.content AS comment_text,
                   r.content AS reply_text,
                   p.content AS replied_on_text
            FROM notifications n
            JOIN blogs b ON n.blog_id = b.id
            JOIN users u ON n.user_id = u.id
            LEFT JOIN comments c ON n.comment_id = c.id
            LEFT JOIN comments r ON n.reply_id = r.id
            LEFT JOIN comments p ON n.replied_on_comment_id = p.id
            WHERE n.notification_for = $1
              AND ($2::TEXT IS NULL OR n.type = $2)
            ORDER BY n.created_at DESC, n.id DESC
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(skip)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn mark_notification_seen(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> Result<(), AppError> {
        // A miss is fine; marking an already-read or foreign
        // notification is a no-op.
        sqlx::query(
            "UPDATE notifications SET seen = TRUE WHERE id = $1 AND notification_for = $2",
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
