// tests/store_tests.rs

use inkwell::store::{
    CommentDeleteOutcome, MemStore, NewBlog, NewComment, NewUser, Store,
};

async fn seed_user(store: &MemStore, name: &str) -> i64 {
    let user = store
        .create_user(NewUser {
            fullname: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: "not-a-real-hash".to_string(),
            username: name.to_string(),
            profile_img: "https://images.example.com/avatar.svg".to_string(),
        })
        .await
        .expect("Failed to seed user");
    user.id
}

async fn seed_blog(store: &MemStore, author_id: i64, slug: &str) -> i64 {
    let blog = store
        .create_blog(NewBlog {
            slug: slug.to_string(),
            title: format!("Blog {}", slug),
            des: "d".to_string(),
            banner: "b".to_string(),
            content: serde_json::json!([{ "blocks": [] }]),
            tags: vec!["rust".to_string()],
            author_id,
            draft: false,
        })
        .await
        .expect("Failed to seed blog");
    blog.id
}

async fn seed_comment(
    store: &MemStore,
    blog_id: i64,
    author_id: i64,
    text: &str,
    parent_id: Option<i64>,
) -> i64 {
    let record = store
        .create_comment(NewComment {
            blog_id,
            author_id,
            content: text.to_string(),
            parent_id,
        })
        .await
        .expect("Failed to seed comment");
    record.comment.id
}

#[tokio::test]
async fn two_small_pages_equal_one_large_page() {
    let store = MemStore::new();
    let author = seed_user(&store, "pager").await;
    let blog = seed_blog(&store, author, "paging-blog").await;

    for i in 1..=4 {
        seed_comment(&store, blog, author, &format!("c{}", i), None).await;
    }

    let ids = |records: Vec<inkwell::models::comment::CommentWithAuthor>| {
        records
            .into_iter()
            .map(|r| r.comment.id)
            .collect::<Vec<i64>>()
    };

    let first = ids(store.top_level_comments(blog, 0, 2).await.unwrap());
    let second = ids(store.top_level_comments(blog, 2, 2).await.unwrap());
    let combined = ids(store.top_level_comments(blog, 0, 4).await.unwrap());

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 2);
    let mut stitched = first;
    stitched.extend(second);
    assert_eq!(stitched, combined);
}

#[tokio::test]
async fn reading_replies_changes_nothing() {
    let store = MemStore::new();
    let author = seed_user(&store, "rereader").await;
    let blog = seed_blog(&store, author, "reread-blog").await;
    let parent = seed_comment(&store, blog, author, "parent", None).await;
    for i in 1..=3 {
        seed_comment(&store, blog, author, &format!("r{}", i), Some(parent)).await;
    }

    let once: Vec<i64> = store
        .comment_replies(parent, 0, 5)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.comment.id)
        .collect();
    let twice: Vec<i64> = store
        .comment_replies(parent, 0, 5)
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.comment.id)
        .collect();

    assert_eq!(once.len(), 3);
    assert_eq!(once, twice);
}

#[tokio::test]
async fn delete_outcomes_cover_gone_foreign_and_owned() {
    let store = MemStore::new();
    let author = seed_user(&store, "owner").await;
    let stranger = seed_user(&store, "stranger").await;
    let blog = seed_blog(&store, author, "delete-blog").await;

    let parent = seed_comment(&store, blog, author, "parent", None).await;
    seed_comment(&store, blog, author, "reply", Some(parent)).await;

    // Missing id
    let outcome = store.delete_comment_owned(999_999, author).await.unwrap();
    assert_eq!(outcome, CommentDeleteOutcome::AlreadyGone);

    // Someone else's comment
    let outcome = store.delete_comment_owned(parent, stranger).await.unwrap();
    assert_eq!(outcome, CommentDeleteOutcome::NotOwner);

    // The owner takes the parent and its reply down together
    let outcome = store.delete_comment_owned(parent, author).await.unwrap();
    assert_eq!(outcome, CommentDeleteOutcome::Deleted { removed: 2 });

    let remaining = store.top_level_comments(blog, 0, 10).await.unwrap();
    assert!(remaining.is_empty());
}

#[tokio::test]
async fn reconcile_agrees_with_a_fresh_recount() {
    let store = MemStore::new();
    let author = seed_user(&store, "reconciler").await;
    let blog = seed_blog(&store, author, "reconcile-blog").await;

    // Two top-level comments, three replies, then one reply removed
    let c1 = seed_comment(&store, blog, author, "c1", None).await;
    let c2 = seed_comment(&store, blog, author, "c2", None).await;
    seed_comment(&store, blog, author, "r1", Some(c1)).await;
    let r2 = seed_comment(&store, blog, author, "r2", Some(c1)).await;
    seed_comment(&store, blog, author, "r3", Some(c2)).await;
    store.delete_comment_owned(r2, author).await.unwrap();

    let activity = store
        .reconcile_blog_comments(blog)
        .await
        .unwrap()
        .expect("Blog exists");

    assert_eq!(activity.total_comments, 4);
    assert_eq!(activity.total_parent_comments, 2);

    // children_ids were rebuilt from parent links
    let top_level = store.top_level_comments(blog, 0, 10).await.unwrap();
    let first = top_level
        .iter()
        .find(|r| r.comment.id == c1)
        .expect("c1 listed");
    assert_eq!(first.comment.children_ids.len(), 1);

    // Unknown blogs reconcile to nothing
    let missing = store.reconcile_blog_comments(999_999).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn like_toggle_is_symmetric() {
    let store = MemStore::new();
    let author = seed_user(&store, "liked").await;
    let fan = seed_user(&store, "fan").await;
    let blog = seed_blog(&store, author, "liked-blog").await;

    let outcome = store.toggle_like(blog, fan).await.unwrap();
    assert!(outcome.liked);
    assert_eq!(outcome.total_likes, 1);
    assert!(store.is_liked_by_user(blog, fan).await.unwrap());

    let inbox = store.notifications_for(author, None, 0, 10).await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].notification.kind, "like");

    let outcome = store.toggle_like(blog, fan).await.unwrap();
    assert!(!outcome.liked);
    assert_eq!(outcome.total_likes, 0);
    assert!(!store.is_liked_by_user(blog, fan).await.unwrap());

    let inbox = store.notifications_for(author, None, 0, 10).await.unwrap();
    assert!(inbox.is_empty());
}

#[tokio::test]
async fn blog_delete_sweeps_dependents() {
    let store = MemStore::new();
    let author = seed_user(&store, "sweeper").await;
    let visitor = seed_user(&store, "visitor").await;
    let blog = seed_blog(&store, author, "swept-blog").await;

    let c1 = seed_comment(&store, blog, visitor, "c1", None).await;
    store.toggle_like(blog, visitor).await.unwrap();

    let outcome = store
        .delete_blog_owned(blog, author)
        .await
        .unwrap();
    assert_eq!(outcome, inkwell::store::BlogDeleteOutcome::Deleted);

    // Comments, likes and notifications are all gone
    let replies = store.comment_replies(c1, 0, 5).await;
    assert!(replies.is_err());
    assert!(!store.is_liked_by_user(blog, visitor).await.unwrap());
    let inbox = store.notifications_for(author, None, 0, 10).await.unwrap();
    assert!(inbox.is_empty());

    // The author's post count went back down
    let user = store.find_user_by_id(author).await.unwrap().unwrap();
    assert_eq!(user.total_posts, 0);
}
