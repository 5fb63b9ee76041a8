// src/store/memory.rs

use std::collections::{HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::AppError;
use crate::models::blog::{Activity, Blog, BlogWithAuthor};
use crate::models::comment::{Comment, CommentWithAuthor};
use crate::models::notification::{Notification, NotificationView};
use crate::models::user::{AuthorInfo, SocialLinks, User};
use crate::store::{
    BlogDeleteOutcome, BlogFilter, CommentDeleteOutcome, LikeOutcome, NewBlog, NewComment,
    NewUser, Store,
};

/// In-memory store with the same observable behavior as `PgStore`.
/// Backs the integration tests, which then need no running database.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<MemInner>,
}

#[derive(Default)]
struct MemInner {
    users: HashMap<i64, User>,
    blogs: HashMap<i64, Blog>,
    comments: HashMap<i64, Comment>,
    /// (user_id, blog_id) pairs.
    likes: HashSet<(i64, i64)>,
    notifications: HashMap<i64, Notification>,
    next_id: i64,
}

impl MemInner {
    /// One id sequence across all collections, like a single BIGSERIAL.
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn author_info(&self, user_id: i64) -> Result<AuthorInfo, AppError> {
        self.users
            .get(&user_id)
            .map(AuthorInfo::from)
            .ok_or_else(|| AppError::InternalServerError(format!("user {} missing", user_id)))
    }
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemInner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemInner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }
}

fn clamp_page(skip: i64, limit: i64) -> (usize, usize) {
    (skip.max(0) as usize, limit.max(0) as usize)
}

#[async_trait]
impl Store for MemStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut inner = self.write();

        if inner.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        let id = inner.next_id();
        let user = User {
            id,
            fullname: new_user.fullname,
            email: new_user.email,
            password: new_user.password_hash,
            username: new_user.username,
            bio: String::new(),
            profile_img: new_user.profile_img,
            social_links: sqlx::types::Json(SocialLinks::default()),
            total_posts: 0,
            total_reads: 0,
            created_at: Utc::now(),
        };
        inner.users.insert(id, user.clone());

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.read();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let inner = self.read();
        Ok(inner.users.get(&id).cloned())
    }

    async fn username_taken(&self, username: &str) -> Result<bool, AppError> {
        let inner = self.read();
        Ok(inner.users.values().any(|u| u.username == username))
    }

    async fn search_users(&self, query: &str, limit: i64) -> Result<Vec<User>, AppError> {
        let inner = self.read();
        let needle = query.to_lowercase();

        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        users.truncate(limit.max(0) as usize);

        Ok(users)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        username: &str,
        bio: &str,
        social_links: &SocialLinks,
    ) -> Result<(), AppError> {
        let mut inner = self.write();

        if inner
            .users
            .values()
            .any(|u| u.id != user_id && u.username == username)
        {
            return Err(AppError::Conflict("Username is already taken".to_string()));
        }

        if let Some(user) = inner.users.get_mut(&user_id) {
            user.username = username.to_string();
            user.bio = bio.to_string();
            user.social_links = sqlx::types::Json(social_links.clone());
        }

        Ok(())
    }

    async fn update_password(&self, user_id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut inner = self.write();
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.password = password_hash.to_string();
        }
        Ok(())
    }

    async fn create_blog(&self, new_blog: NewBlog) -> Result<Blog, AppError> {
        let mut inner = self.write();

        if !inner.users.contains_key(&new_blog.author_id) {
            return Err(AppError::InternalServerError(format!(
                "user {} missing",
                new_blog.author_id
            )));
        }

        let id = inner.next_id();
        let blog = Blog {
            id,
            slug: new_blog.slug,
            title: new_blog.title,
            des: new_blog.des,
            banner: new_blog.banner,
            content: new_blog.content,
            tags: new_blog.tags,
            author_id: new_blog.author_id,
            comment_ids: Vec::new(),
            total_likes: 0,
            total_comments: 0,
            total_reads: 0,
            total_parent_comments: 0,
            draft: new_blog.draft,
            published_at: Utc::now(),
        };
        inner.blogs.insert(id, blog.clone());

        if !blog.draft {
            if let Some(user) = inner.users.get_mut(&blog.author_id) {
                user.total_posts += 1;
            }
        }

        Ok(blog)
    }

    async fn latest_blogs(&self, skip: i64, limit: i64) -> Result<Vec<BlogWithAuthor>, AppError> {
        let inner = self.read();
        let (skip, limit) = clamp_page(skip, limit);

        let mut blogs: Vec<&Blog> = inner.blogs.values().filter(|b| !b.draft).collect();
        blogs.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));

        blogs
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|b| {
                Ok(BlogWithAuthor {
                    blog: b.clone(),
                    author: inner.author_info(b.author_id)?,
                })
            })
            .collect()
    }

    async fn trending_blogs(&self, limit: i64) -> Result<Vec<BlogWithAuthor>, AppError> {
        let inner = self.read();

        let mut blogs: Vec<&Blog> = inner.blogs.values().filter(|b| !b.draft).collect();
        blogs.sort_by(|a, b| {
            b.total_reads
                .cmp(&a.total_reads)
                .then(b.total_likes.cmp(&a.total_likes))
                .then(b.published_at.cmp(&a.published_at))
        });

        blogs
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|b| {
                Ok(BlogWithAuthor {
                    blog: b.clone(),
                    author: inner.author_info(b.author_id)?,
                })
            })
            .collect()
    }

    async fn search_blogs(
        &self,
        filter: BlogFilter,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<BlogWithAuthor>, AppError> {
        let inner = self.read();
        let (skip, limit) = clamp_page(skip, limit);
        let needle = filter.title_query.map(|q| q.to_lowercase());

        let mut blogs: Vec<&Blog> = inner
            .blogs
            .values()
            .filter(|b| !b.draft)
            .filter(|b| match &filter.tag {
                Some(tag) => b.tags.iter().any(|t| t == tag),
                None => true,
            })
            .filter(|b| match &needle {
                Some(q) => b.title.to_lowercase().contains(q),
                None => true,
            })
            .filter(|b| match filter.author_id {
                Some(author_id) => b.author_id == author_id,
                None => true,
            })
            .collect();
        blogs.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));

        blogs
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|b| {
                Ok(BlogWithAuthor {
                    blog: b.clone(),
                    author: inner.author_info(b.author_id)?,
                })
            })
            .collect()
    }

    async fn read_blog(&self, slug: &str) -> Result<Option<BlogWithAuthor>, AppError> {
        let mut inner = self.write();

        let Some(blog) = inner.blogs.values().find(|b| b.slug == slug).cloned() else {
            return Ok(None);
        };
        let author = inner.author_info(blog.author_id)?;

        // The caller sees the pre-bump counts.
        if let Some(stored) = inner.blogs.get_mut(&blog.id) {
            stored.total_reads += 1;
        }
        if let Some(user) = inner.users.get_mut(&blog.author_id) {
            user.total_reads += 1;
        }

        Ok(Some(BlogWithAuthor { blog, author }))
    }

    async fn user_blogs(&self, author_id: i64) -> Result<Vec<Blog>, AppError> {
        let inner = self.read();

        let mut blogs: Vec<Blog> = inner
            .blogs
            .values()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect();
        blogs.sort_by(|a, b| b.published_at.cmp(&a.published_at).then(b.id.cmp(&a.id)));

        Ok(blogs)
    }

    async fn delete_blog_owned(
        &self,
        blog_id: i64,
        requester_id: i64,
    ) -> Result<BlogDeleteOutcome, AppError> {
        let mut inner = self.write();

        let Some(blog) = inner.blogs.get(&blog_id) else {
            return Ok(BlogDeleteOutcome::NotOwnedOrMissing);
        };
        if blog.author_id != requester_id {
            return Ok(BlogDeleteOutcome::NotOwnedOrMissing);
        }
        let draft = blog.draft;

        inner.blogs.remove(&blog_id);
        inner.comments.retain(|_, c| c.blog_id != blog_id);
        inner.likes.retain(|(_, liked_blog)| *liked_blog != blog_id);
        inner.notifications.retain(|_, n| n.blog_id != blog_id);

        if !draft {
            if let Some(user) = inner.users.get_mut(&requester_id) {
                user.total_posts = (user.total_posts - 1).max(0);
            }
        }

        Ok(BlogDeleteOutcome::Deleted)
    }

    async fn toggle_like(&self, blog_id: i64, user_id: i64) -> Result<LikeOutcome, AppError> {
        let mut inner = self.write();

        let Some(blog) = inner.blogs.get(&blog_id) else {
            return Err(AppError::NotFound("Blog not found".to_string()));
        };
        let author_id = blog.author_id;

        let key = (user_id, blog_id);
        let already_liked = inner.likes.contains(&key);

        if already_liked {
            inner.likes.remove(&key);
            inner
                .notifications
                .retain(|_, n| !(n.kind == "like" && n.blog_id == blog_id && n.user_id == user_id));
            if let Some(blog) = inner.blogs.get_mut(&blog_id) {
                blog.total_likes = (blog.total_likes - 1).max(0);
            }
        } else {
            inner.likes.insert(key);
            let id = inner.next_id();
            inner.notifications.insert(
                id,
                Notification {
                    id,
                    kind: "like".to_string(),
                    blog_id,
                    notification_for: author_id,
                    user_id,
                    comment_id: None,
                    reply_id: None,
                    replied_on_comment_id: None,
                    seen: false,
                    created_at: Utc::now(),
                },
            );
            if let Some(blog) = inner.blogs.get_mut(&blog_id) {
                blog.total_likes += 1;
            }
        }

        let total_likes = inner.blogs.get(&blog_id).map_or(0, |b| b.total_likes);

        Ok(LikeOutcome {
            liked: !already_liked,
            total_likes,
        })
    }

    async fn is_liked_by_user(&self, blog_id: i64, user_id: i64) -> Result<bool, AppError> {
        let inner = self.read();
        Ok(inner.likes.contains(&(user_id, blog_id)))
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

        let mut inner = self.write();

        let Some(author_user) = inner.users.get(&new_comment.author_id) else {
            return Err(AppError::NotFound("User not found".to_string()));
        };
        let author = AuthorInfo::from(author_user);

        let Some(blog) = inner.blogs.get(&new_comment.blog_id) else {
            return Err(AppError::NotFound("Blog not found".to_string()));
        };
        let blog_author_id = blog.author_id;

        // For replies the parent must exist and live on the same blog.
        let parent_author_id = match new_comment.parent_id {
            Some(parent_id) => match inner.comments.get(&parent_id) {
                Some(parent) if parent.blog_id == new_comment.blog_id => {
                    Some(parent.commented_by)
                }
                _ => return Err(AppError::NotFound("Comment not found".to_string())),
            },
            None => None,
        };

        let id = inner.next_id();
        let comment = Comment {
            id,
            blog_id: new_comment.blog_id,
            blog_author_id,
            content: new_comment.content,
            commented_by: new_comment.author_id,
            parent_id: new_comment.parent_id,
            is_reply: new_comment.parent_id.is_some(),
            children_ids: Vec::new(),
            commented_at: Utc::now(),
        };
        inner.comments.insert(id, comment.clone());

        if let Some(blog) = inner.blogs.get_mut(&new_comment.blog_id) {
            blog.comment_ids.push(id);
            blog.total_comments += 1;
            if !comment.is_reply {
                blog.total_parent_comments += 1;
            }
        }

        if let Some(parent_id) = new_comment.parent_id {
            if let Some(parent) = inner.comments.get_mut(&parent_id) {
                parent.children_ids.push(id);
            }
        }

        let notification_id = inner.next_id();
        let notification = match parent_author_id {
            Some(parent_author_id) => Notification {
                id: notification_id,
                kind: "reply".to_string(),
                blog_id: comment.blog_id,
                notification_for: parent_author_id,
                user_id: comment.commented_by,
                comment_id: None,
                reply_id: Some(id),
                replied_on_comment_id: new_comment.parent_id,
                seen: false,
                created_at: Utc::now(),
            },
            None => Notification {
                id: notification_id,
                kind: "comment".to_string(),
                blog_id: comment.blog_id,
                notification_for: blog_author_id,
                user_id: comment.commented_by,
                comment_id: Some(id),
                reply_id: None,
                replied_on_comment_id: None,
                seen: false,
                created_at: Utc::now(),
            },
        };
        inner.notifications.insert(notification_id, notification);

        Ok(CommentWithAuthor { comment, author })
    }

    async fn top_level_comments(
        &self,
        blog_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError> {
        let inner = self.read();
        let (skip, limit) = clamp_page(skip, limit);

        let mut comments: Vec<&Comment> = inner
            .comments
            .values()
            .filter(|c| c.blog_id == blog_id && !c.is_reply)
            .collect();
        comments.sort_by(|a, b| b.commented_at.cmp(&a.commented_at).then(b.id.cmp(&a.id)));

        comments
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|c| {
                Ok(CommentWithAuthor {
                    comment: c.clone(),
                    author: inner.author_info(c.commented_by)?,
                })
            })
            .collect()
    }

    async fn comment_replies(
        &self,
        parent_id: i64,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<CommentWithAuthor>, AppError> {
        let inner = self.read();
        let (skip, limit) = clamp_page(skip, limit);

        if !inner.comments.contains_key(&parent_id) {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        let mut replies: Vec<&Comment> = inner
            .comments
            .values()
            .filter(|c| c.parent_id == Some(parent_id))
            .collect();
        replies.sort_by(|a, b| b.commented_at.cmp(&a.commented_at).then(b.id.cmp(&a.id)));

        replies
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|c| {
                Ok(CommentWithAuthor {
                    comment: c.clone(),
                    author: inner.author_info(c.commented_by)?,
                })
            })
            .collect()
    }

    async fn delete_comment_owned(
        &self,
        comment_id: i64,
        requester_id: i64,
    ) -> Result<CommentDeleteOutcome, AppError> {
        let mut inner = self.write();

        let Some(comment) = inner.comments.get(&comment_id) else {
            return Ok(CommentDeleteOutcome::AlreadyGone);
        };
        if comment.commented_by != requester_id {
            return Ok(CommentDeleteOutcome::NotOwner);
        }
        let blog_id = comment.blog_id;
        let parent_id = comment.parent_id;

        // Take the whole reply subtree down with the comment.
        let mut doomed = vec![comment_id];
        let mut frontier = vec![comment_id];
        while let Some(current) = frontier.pop() {
            let children: Vec<i64> = inner
                .comments
                .values()
                .filter(|c| c.parent_id == Some(current))
                .map(|c| c.id)
                .collect();
            frontier.extend(children.iter().copied());
            doomed.extend(children);
        }

        let removed = doomed.len() as i64;
        let top_level_removed = doomed
            .iter()
            .filter(|id| inner.comments.get(id).is_some_and(|c| !c.is_reply))
            .count() as i64;

        for id in &doomed {
            inner.comments.remove(id);
        }

        // Notifications pointing at removed comments go too.
        inner.notifications.retain(|_, n| {
            [n.comment_id, n.reply_id, n.replied_on_comment_id]
                .iter()
                .flatten()
                .all(|id| !doomed.contains(id))
        });

        if let Some(blog) = inner.blogs.get_mut(&blog_id) {
            blog.comment_ids.retain(|cid| !doomed.contains(cid));
            blog.total_comments = (blog.total_comments - removed).max(0);
            blog.total_parent_comments =
                (blog.total_parent_comments - top_level_removed).max(0);
        }

        if let Some(parent_id) = parent_id {
            if let Some(parent) = inner.comments.get_mut(&parent_id) {
                parent.children_ids.retain(|cid| *cid != comment_id);
            }
        }

        Ok(CommentDeleteOutcome::Deleted { removed })
    }

    async fn reconcile_blog_comments(&self, blog_id: i64) -> Result<Option<Activity>, AppError> {
        let mut inner = self.write();

        if !inner.blogs.contains_key(&blog_id) {
            return Ok(None);
        }

        let mut ordered: Vec<(chrono::DateTime<Utc>, i64, bool)> = inner
            .comments
            .values()
            .filter(|c| c.blog_id == blog_id)
            .map(|c| (c.commented_at, c.id, c.is_reply))
            .collect();
        ordered.sort();

        let ids: Vec<i64> = ordered.iter().map(|(_, id, _)| *id).collect();
        let total = ids.len() as i64;
        let top_level = ordered.iter().filter(|(_, _, is_reply)| !is_reply).count() as i64;

        let blog_comment_ids: Vec<i64> = ids.clone();
        for parent_id in &blog_comment_ids {
            let mut kids: Vec<(chrono::DateTime<Utc>, i64)> = inner
                .comments
                .values()
                .filter(|c| c.parent_id == Some(*parent_id))
                .map(|c| (c.commented_at, c.id))
                .collect();
            kids.sort();
            let kid_ids: Vec<i64> = kids.into_iter().map(|(_, id)| id).collect();
            if let Some(parent) = inner.comments.get_mut(parent_id) {
                parent.children_ids = kid_ids;
            }
        }

        if let Some(blog) = inner.blogs.get_mut(&blog_id) {
            blog.comment_ids = ids;
            blog.total_comments = total;
            blog.total_parent_comments = top_level;
            return Ok(Some(blog.activity()));
        }

        Ok(None)
    }

    async fn notifications_for(
        &self,
        user_id: i64,
        kind: Option<&str>,
        skip: i64,
        limit: i64,
    ) -> Result<Vec<NotificationView>, AppError> {
        let inner = self.read();
        let (skip, limit) = clamp_page(skip, limit);

        let mut notifications: Vec<&Notification> = inner
            .notifications
            .values()
            .filter(|n| n.notification_for == user_id)
            .filter(|n| match kind {
                Some(kind) => n.kind == kind,
                None => true,
            })
            .collect();
        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let mut views = Vec::new();
        for notification in notifications.into_iter().skip(skip).take(limit) {
            let Some(blog) = inner.blogs.get(&notification.blog_id) else {
                continue;
            };
            let Some(actor_user) = inner.users.get(&notification.user_id) else {
                continue;
            };
            let text = |id: Option<i64>| {
                id.and_then(|comment_id| inner.comments.get(&comment_id))
                    .map(|c| c.content.clone())
            };

            views.push(NotificationView {
                notification: notification.clone(),
                blog_slug: blog.slug.clone(),
                blog_title: blog.title.clone(),
                actor: AuthorInfo::from(actor_user),
                comment_text: text(notification.comment_id),
                reply_text: text(notification.reply_id),
                replied_on_text: text(notification.replied_on_comment_id),
            });
        }

        Ok(views)
    }

    async fn mark_notification_seen(
        &self,
        notification_id: i64,
        user_id: i64,
    ) -> Result<(), AppError> {
        let mut inner = self.write();
        if let Some(notification) = inner.notifications.get_mut(&notification_id) {
            if notification.notification_for == user_id {
                notification.seen = true;
            }
        }
        Ok(())
    }
}
