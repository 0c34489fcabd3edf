//! Storage trait for blog content, with an in-memory implementation.
//!
//! The store is the serialization point for the content invariants: the
//! reaction table holds at most one row per (user, post), and toggling is a
//! single atomic transition on that key.

use super::models::{
    Advertisement, Comment, PageView, Post, Reaction, ReactionKind, Subscriber,
};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Outcome of a reaction toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionOutcome {
    /// No prior reaction; one was created.
    Added,
    /// Prior reaction had the same kind; it was removed.
    Removed,
    /// Prior reaction had the other kind; it was overwritten.
    Switched,
}

/// Trait for storing blog content.
#[async_trait]
pub trait BlogStore: Send + Sync {
    // Posts

    async fn create_post(&self, post: &Post) -> Result<()>;

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;

    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>>;

    async fn slug_exists(&self, slug: &str) -> Result<bool>;

    async fn update_post(&self, post: &Post) -> Result<()>;

    /// Delete a post and everything hanging off it (comments, reactions,
    /// page views).
    async fn delete_post(&self, id: Uuid) -> Result<()>;

    /// Published posts, newest first.
    async fn list_published(&self, offset: usize, limit: usize) -> Result<(Vec<Post>, u64)>;

    /// Published posts carrying the given tag, newest first.
    async fn published_posts_with_tag(&self, tag: &str) -> Result<Vec<Post>>;

    /// Whether any post references the tag.
    async fn tag_exists(&self, tag: &str) -> Result<bool>;

    async fn count_posts(&self) -> Result<u64>;

    // Comments

    async fn create_comment(&self, comment: &Comment) -> Result<()>;

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>>;

    async fn delete_comment(&self, id: Uuid) -> Result<()>;

    async fn set_comment_moderation(
        &self,
        id: Uuid,
        status: super::models::ModerationStatus,
    ) -> Result<()>;

    /// Approved comments on a post, oldest first.
    async fn approved_comments(&self, post_id: Uuid) -> Result<Vec<Comment>>;

    async fn count_comments(&self) -> Result<u64>;

    // Reactions

    /// Atomically apply the three-way toggle for (user, post):
    /// absent -> insert; same kind -> delete; other kind -> overwrite.
    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionOutcome>;

    async fn reaction_for(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Reaction>>;

    /// (likes, dislikes) for a post.
    async fn reaction_counts(&self, post_id: Uuid) -> Result<(u64, u64)>;

    // Newsletter subscribers

    /// Insert a subscriber; duplicate email is a conflict.
    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<()>;

    async fn count_subscribers(&self) -> Result<u64>;

    // Advertisements

    async fn create_ad(&self, ad: &Advertisement) -> Result<()>;

    async fn get_ad(&self, id: Uuid) -> Result<Option<Advertisement>>;

    /// Increment the click counter, returning the new total.
    async fn increment_ad_clicks(&self, id: Uuid) -> Result<u64>;

    // Page views

    async fn record_page_view(&self, view: &PageView) -> Result<()>;

    async fn count_page_views(&self) -> Result<u64>;
}

/// In-memory blog store.
///
/// A single lock over the whole state keeps every multi-step operation
/// atomic without finer-grained coordination.
#[derive(Default, Clone)]
pub struct InMemoryBlogStore {
    state: Arc<RwLock<BlogState>>,
}

#[derive(Default)]
struct BlogState {
    posts: HashMap<Uuid, Post>,
    comments: HashMap<Uuid, Comment>,
    reactions: HashMap<(Uuid, Uuid), ReactionKind>,
    subscribers: HashMap<String, Subscriber>,
    ads: HashMap<Uuid, Advertisement>,
    page_views: Vec<PageView>,
}

impl InMemoryBlogStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_newest_first(mut posts: Vec<Post>) -> Vec<Post> {
    posts.sort_by(|a, b| {
        b.publish_date
            .cmp(&a.publish_date)
            .then_with(|| a.slug.cmp(&b.slug))
    });
    posts
}

#[async_trait]
impl BlogStore for InMemoryBlogStore {
    async fn create_post(&self, post: &Post) -> Result<()> {
        self.state.write().await.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.state.read().await.posts.get(&id).cloned())
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>> {
        Ok(self
            .state
            .read()
            .await
            .posts
            .values()
            .find(|p| p.slug == slug)
            .cloned())
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .posts
            .values()
            .any(|p| p.slug == slug))
    }

    async fn update_post(&self, post: &Post) -> Result<()> {
        let mut state = self.state.write().await;
        if !state.posts.contains_key(&post.id) {
            return Err(AppError::not_found("Post not found"));
        }
        state.posts.insert(post.id, post.clone());
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        if state.posts.remove(&id).is_none() {
            return Err(AppError::not_found("Post not found"));
        }
        state.comments.retain(|_, c| c.post_id != id);
        state.reactions.retain(|(_, post_id), _| *post_id != id);
        state.page_views.retain(|v| v.post_id != id);
        Ok(())
    }

    async fn list_published(&self, offset: usize, limit: usize) -> Result<(Vec<Post>, u64)> {
        let state = self.state.read().await;
        let published: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.is_published())
            .cloned()
            .collect();
        let total = published.len() as u64;
        let page = sorted_newest_first(published)
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect();
        Ok((page, total))
    }

    async fn published_posts_with_tag(&self, tag: &str) -> Result<Vec<Post>> {
        let state = self.state.read().await;
        let posts: Vec<Post> = state
            .posts
            .values()
            .filter(|p| p.is_published() && p.tags.contains(tag))
            .cloned()
            .collect();
        Ok(sorted_newest_first(posts))
    }

    async fn tag_exists(&self, tag: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .posts
            .values()
            .any(|p| p.tags.contains(tag)))
    }

    async fn count_posts(&self) -> Result<u64> {
        Ok(self.state.read().await.posts.len() as u64)
    }

    async fn create_comment(&self, comment: &Comment) -> Result<()> {
        self.state
            .write()
            .await
            .comments
            .insert(comment.id, comment.clone());
        Ok(())
    }

    async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.state.read().await.comments.get(&id).cloned())
    }

    async fn delete_comment(&self, id: Uuid) -> Result<()> {
        let mut state = self.state.write().await;
        if state.comments.remove(&id).is_none() {
            return Err(AppError::not_found("Comment not found"));
        }
        // Orphan replies rather than cascading; the thread keeps its shape.
        for comment in state.comments.values_mut() {
            if comment.parent_id == Some(id) {
                comment.parent_id = None;
            }
        }
        Ok(())
    }

    async fn set_comment_moderation(
        &self,
        id: Uuid,
        status: super::models::ModerationStatus,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let comment = state
            .comments
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Comment not found"))?;
        comment.moderation_status = status;
        Ok(())
    }

    async fn approved_comments(&self, post_id: Uuid) -> Result<Vec<Comment>> {
        let state = self.state.read().await;
        let mut comments: Vec<Comment> = state
            .comments
            .values()
            .filter(|c| {
                c.post_id == post_id
                    && c.moderation_status == super::models::ModerationStatus::Approved
            })
            .cloned()
            .collect();
        comments.sort_by_key(|c| c.timestamp);
        Ok(comments)
    }

    async fn count_comments(&self) -> Result<u64> {
        Ok(self.state.read().await.comments.len() as u64)
    }

    async fn toggle_reaction(
        &self,
        user_id: Uuid,
        post_id: Uuid,
        kind: ReactionKind,
    ) -> Result<ReactionOutcome> {
        let mut state = self.state.write().await;
        let key = (user_id, post_id);
        match state.reactions.get(&key).copied() {
            None => {
                state.reactions.insert(key, kind);
                Ok(ReactionOutcome::Added)
            }
            Some(existing) if existing == kind => {
                state.reactions.remove(&key);
                Ok(ReactionOutcome::Removed)
            }
            Some(_) => {
                state.reactions.insert(key, kind);
                Ok(ReactionOutcome::Switched)
            }
        }
    }

    async fn reaction_for(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Reaction>> {
        Ok(self
            .state
            .read()
            .await
            .reactions
            .get(&(user_id, post_id))
            .map(|kind| Reaction {
                user_id,
                post_id,
                kind: *kind,
            }))
    }

    async fn reaction_counts(&self, post_id: Uuid) -> Result<(u64, u64)> {
        let state = self.state.read().await;
        let mut likes = 0;
        let mut dislikes = 0;
        for ((_, pid), kind) in state.reactions.iter() {
            if *pid == post_id {
                match kind {
                    ReactionKind::Like => likes += 1,
                    ReactionKind::Dislike => dislikes += 1,
                }
            }
        }
        Ok((likes, dislikes))
    }

    async fn add_subscriber(&self, subscriber: &Subscriber) -> Result<()> {
        let mut state = self.state.write().await;
        if state.subscribers.contains_key(&subscriber.email) {
            return Err(AppError::conflict("Email already subscribed"));
        }
        state
            .subscribers
            .insert(subscriber.email.clone(), subscriber.clone());
        Ok(())
    }

    async fn count_subscribers(&self) -> Result<u64> {
        Ok(self.state.read().await.subscribers.len() as u64)
    }

    async fn create_ad(&self, ad: &Advertisement) -> Result<()> {
        self.state.write().await.ads.insert(ad.id, ad.clone());
        Ok(())
    }

    async fn get_ad(&self, id: Uuid) -> Result<Option<Advertisement>> {
        Ok(self.state.read().await.ads.get(&id).cloned())
    }

    async fn increment_ad_clicks(&self, id: Uuid) -> Result<u64> {
        let mut state = self.state.write().await;
        let ad = state
            .ads
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found("Advertisement not found"))?;
        ad.clicks += 1;
        Ok(ad.clicks)
    }

    async fn record_page_view(&self, view: &PageView) -> Result<()> {
        self.state.write().await.page_views.push(view.clone());
        Ok(())
    }

    async fn count_page_views(&self) -> Result<u64> {
        Ok(self.state.read().await.page_views.len() as u64)
    }
}
