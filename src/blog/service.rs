//! Blog domain operations on top of [`BlogStore`].

use super::models::{
    Advertisement, Comment, ModerationStatus, PageView, Post, PostStatus, ReactionKind, Subscriber,
};
use super::slug;
use super::storage::BlogStore;
pub use super::storage::ReactionOutcome;
use crate::error::{AppError, Result};
use crate::users::User;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,
    /// Explicit slug; derived from the title when absent.
    pub slug: Option<String>,
    #[serde(default)]
    pub status: Option<PostStatus>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePostInput {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,
    pub status: Option<PostStatus>,
    pub tags: Option<BTreeSet<String>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentInput {
    #[validate(length(min = 1, max = 2000, message = "Comment must be 1-2000 characters"))]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubscribeInput {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAdInput {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Placement must be 1-100 characters"))]
    pub placement: String,
}

/// A post joined with its approved comments and reaction tallies.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub comments: Vec<Comment>,
    pub likes: u64,
    pub dislikes: u64,
}

/// Aggregate counts for the staff dashboard.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct DashboardCounts {
    pub posts: u64,
    pub comments: u64,
    pub subscribers: u64,
    pub page_views: u64,
}

/// Blog/CMS operations. Handlers call into this; it owns no HTTP concerns.
pub struct BlogService {
    store: Arc<dyn BlogStore>,
}

impl BlogService {
    pub fn new(store: Arc<dyn BlogStore>) -> Self {
        Self { store }
    }

    /// Published posts, newest first.
    pub async fn list_published(&self, offset: usize, limit: usize) -> Result<(Vec<Post>, u64)> {
        self.store.list_published(offset, limit).await
    }

    /// Fetch a published post with its approved comments, recording a page
    /// view when the visitor's address is known.
    pub async fn get_post(&self, slug: &str, visitor_ip: Option<IpAddr>) -> Result<PostDetail> {
        let post = self
            .store
            .get_post_by_slug(slug)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        if let Some(ip) = visitor_ip {
            self.store
                .record_page_view(&PageView {
                    post_id: post.id,
                    visitor_ip: ip,
                    view_date: Utc::now(),
                })
                .await?;
        }

        let comments = self.store.approved_comments(post.id).await?;
        let (likes, dislikes) = self.store.reaction_counts(post.id).await?;
        Ok(PostDetail {
            post,
            comments,
            likes,
            dislikes,
        })
    }

    /// Create a post. Without an explicit slug one is derived from the
    /// title and suffixed until unique; an explicit slug that is already
    /// taken is a conflict.
    pub async fn create_post(&self, author: &User, input: CreatePostInput) -> Result<Post> {
        let slug = match input.slug {
            Some(explicit) => {
                if self.store.slug_exists(&explicit).await? {
                    return Err(AppError::conflict("Slug already in use"));
                }
                explicit
            }
            None => {
                let base = slug::slugify(&input.title);
                if base.is_empty() {
                    return Err(AppError::bad_request("Title yields an empty slug"));
                }
                self.unique_slug(&base).await?
            }
        };

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: input.title,
            slug,
            author_id: author.id,
            content: input.content,
            status: input.status.unwrap_or(PostStatus::Draft),
            tags: input.tags,
            publish_date: now,
            last_updated: now,
        };
        self.store.create_post(&post).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "post created");
        Ok(post)
    }

    async fn unique_slug(&self, base: &str) -> Result<String> {
        let mut candidate = base.to_string();
        let mut n = 2u32;
        while self.store.slug_exists(&candidate).await? {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        Ok(candidate)
    }

    /// Update a post. Only the author or staff may edit.
    pub async fn update_post(
        &self,
        slug: &str,
        user: &User,
        input: UpdatePostInput,
    ) -> Result<Post> {
        let mut post = self
            .store
            .get_post_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        if post.author_id != user.id && !user.is_staff {
            return Err(AppError::forbidden("Only the author may edit this post"));
        }

        if let Some(title) = input.title {
            post.title = title;
        }
        if let Some(content) = input.content {
            post.content = content;
        }
        if let Some(status) = input.status {
            post.status = status;
        }
        if let Some(tags) = input.tags {
            post.tags = tags;
        }
        post.last_updated = Utc::now();

        self.store.update_post(&post).await?;
        Ok(post)
    }

    /// Delete a post. Only the author or staff may delete.
    pub async fn delete_post(&self, slug: &str, user: &User) -> Result<()> {
        let post = self
            .store
            .get_post_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::not_found("Post not found"))?;
        if post.author_id != user.id && !user.is_staff {
            return Err(AppError::forbidden("Only the author may delete this post"));
        }
        self.store.delete_post(post.id).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "post deleted");
        Ok(())
    }

    /// Add a comment to a published post. New comments start out pending
    /// moderation and are hidden from the post detail until approved.
    pub async fn add_comment(
        &self,
        slug: &str,
        author_id: Option<Uuid>,
        input: CreateCommentInput,
    ) -> Result<Comment> {
        let post = self
            .store
            .get_post_by_slug(slug)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        if let Some(parent_id) = input.parent_id {
            let parent = self
                .store
                .get_comment(parent_id)
                .await?
                .ok_or_else(|| AppError::bad_request("Parent comment not found"))?;
            if parent.post_id != post.id {
                return Err(AppError::bad_request("Parent comment is on another post"));
            }
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            author_id,
            content: input.content,
            parent_id: input.parent_id,
            moderation_status: ModerationStatus::Pending,
            timestamp: Utc::now(),
        };
        self.store.create_comment(&comment).await?;
        Ok(comment)
    }

    /// Delete a comment. Only its author or staff may delete.
    pub async fn delete_comment(&self, id: Uuid, user: &User) -> Result<()> {
        let comment = self
            .store
            .get_comment(id)
            .await?
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        if comment.author_id != Some(user.id) && !user.is_staff {
            return Err(AppError::forbidden(
                "Only the author may delete this comment",
            ));
        }
        self.store.delete_comment(id).await
    }

    /// Staff moderation decision on a comment.
    pub async fn moderate_comment(&self, id: Uuid, status: ModerationStatus) -> Result<()> {
        self.store.set_comment_moderation(id, status).await
    }

    /// Toggle a reaction. The interaction type comes in as a raw string;
    /// anything but "like"/"dislike" is rejected.
    pub async fn set_reaction(
        &self,
        user: &User,
        post_id: Uuid,
        interaction_type: &str,
    ) -> Result<ReactionOutcome> {
        let kind = ReactionKind::parse(interaction_type)
            .ok_or_else(|| AppError::bad_request("Invalid interaction type"))?;

        // Only published posts take reactions.
        self.store
            .get_post(post_id)
            .await?
            .filter(Post::is_published)
            .ok_or_else(|| AppError::not_found("Post not found"))?;

        self.store.toggle_reaction(user.id, post_id, kind).await
    }

    /// Current (likes, dislikes) tally for a post.
    pub async fn reaction_counts(&self, post_id: Uuid) -> Result<(u64, u64)> {
        self.store.reaction_counts(post_id).await
    }

    /// Newsletter signup. Duplicate emails conflict.
    pub async fn subscribe(&self, email: String) -> Result<Subscriber> {
        let subscriber = Subscriber {
            id: Uuid::new_v4(),
            email,
            subscription_date: Utc::now(),
        };
        self.store.add_subscriber(&subscriber).await?;
        Ok(subscriber)
    }

    pub async fn create_ad(&self, input: CreateAdInput) -> Result<Advertisement> {
        let ad = Advertisement {
            id: Uuid::new_v4(),
            name: input.name,
            placement: input.placement,
            impressions: 0,
            clicks: 0,
        };
        self.store.create_ad(&ad).await?;
        Ok(ad)
    }

    /// Record an ad click, returning the new click total.
    pub async fn ad_click(&self, id: Uuid) -> Result<u64> {
        self.store.increment_ad_clicks(id).await
    }

    /// Published posts under a tag. An unreferenced tag is a 404.
    pub async fn posts_for_tag(&self, tag: &str) -> Result<Vec<Post>> {
        if !self.store.tag_exists(tag).await? {
            return Err(AppError::not_found("Tag not found"));
        }
        self.store.published_posts_with_tag(tag).await
    }

    pub async fn dashboard(&self) -> Result<DashboardCounts> {
        Ok(DashboardCounts {
            posts: self.store.count_posts().await?,
            comments: self.store.count_comments().await?,
            subscribers: self.store.count_subscribers().await?,
            page_views: self.store.count_page_views().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blog::storage::InMemoryBlogStore;

    fn service() -> BlogService {
        BlogService::new(Arc::new(InMemoryBlogStore::new()))
    }

    fn input(title: &str) -> CreatePostInput {
        CreatePostInput {
            title: title.to_string(),
            content: "body".to_string(),
            slug: None,
            status: Some(PostStatus::Published),
            tags: BTreeSet::new(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_titles_get_distinct_slugs() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");

        let first = svc.create_post(&author, input("My Post")).await.unwrap();
        let second = svc.create_post(&author, input("My Post")).await.unwrap();

        assert_eq!(first.slug, "my-post");
        assert_eq!(second.slug, "my-post-2");
    }

    #[tokio::test]
    async fn test_explicit_slug_conflict() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        svc.create_post(&author, input("My Post")).await.unwrap();

        let mut dup = input("Another");
        dup.slug = Some("my-post".to_string());
        let err = svc.create_post(&author, dup).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reaction_toggle_round_trip() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        let reader = User::new("bob", "bob@example.com");
        let post = svc.create_post(&author, input("Hello")).await.unwrap();

        let out = svc.set_reaction(&reader, post.id, "like").await.unwrap();
        assert_eq!(out, ReactionOutcome::Added);
        let out = svc.set_reaction(&reader, post.id, "like").await.unwrap();
        assert_eq!(out, ReactionOutcome::Removed);

        let detail = svc.get_post(&post.slug, None).await.unwrap();
        assert_eq!(detail.likes, 0);
    }

    #[tokio::test]
    async fn test_like_then_dislike_leaves_one_dislike() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        let reader = User::new("bob", "bob@example.com");
        let post = svc.create_post(&author, input("Hello")).await.unwrap();

        svc.set_reaction(&reader, post.id, "like").await.unwrap();
        let out = svc.set_reaction(&reader, post.id, "dislike").await.unwrap();
        assert_eq!(out, ReactionOutcome::Switched);

        let detail = svc.get_post(&post.slug, None).await.unwrap();
        assert_eq!((detail.likes, detail.dislikes), (0, 1));
    }

    #[tokio::test]
    async fn test_invalid_interaction_type() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        let post = svc.create_post(&author, input("Hello")).await.unwrap();

        let err = svc
            .set_reaction(&author, post.id, "neutral")
            .await
            .unwrap_err();
        assert_eq!(err.client_message(), "Invalid interaction type");
    }

    #[tokio::test]
    async fn test_reaction_on_unpublished_post_rejected() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        let reader = User::new("bob", "bob@example.com");

        let mut draft = input("Draft");
        draft.status = Some(PostStatus::Draft);
        let post = svc.create_post(&author, draft).await.unwrap();

        let err = svc.set_reaction(&reader, post.id, "like").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_pending_comments_hidden_from_detail() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        let post = svc.create_post(&author, input("Hello")).await.unwrap();

        let comment = svc
            .add_comment(
                &post.slug,
                None,
                CreateCommentInput {
                    content: "first".to_string(),
                    parent_id: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(comment.moderation_status, ModerationStatus::Pending);

        let detail = svc.get_post(&post.slug, None).await.unwrap();
        assert!(detail.comments.is_empty());

        svc.moderate_comment(comment.id, ModerationStatus::Approved)
            .await
            .unwrap();
        let detail = svc.get_post(&post.slug, None).await.unwrap();
        assert_eq!(detail.comments.len(), 1);
    }

    #[tokio::test]
    async fn test_non_author_cannot_edit() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        let other = User::new("bob", "bob@example.com");
        let post = svc.create_post(&author, input("Hello")).await.unwrap();

        let err = svc
            .update_post(&post.slug, &other, UpdatePostInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_unknown_tag_is_not_found() {
        let svc = service();
        let err = svc.posts_for_tag("missing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_page_view_recorded_on_detail() {
        let svc = service();
        let author = User::new("alice", "alice@example.com");
        let post = svc.create_post(&author, input("Hello")).await.unwrap();

        let ip: IpAddr = "203.0.113.7".parse().unwrap();
        svc.get_post(&post.slug, Some(ip)).await.unwrap();
        svc.get_post(&post.slug, Some(ip)).await.unwrap();

        let counts = svc.dashboard().await.unwrap();
        assert_eq!(counts.page_views, 2);
    }
}
