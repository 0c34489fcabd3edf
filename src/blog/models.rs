use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::net::IpAddr;
use uuid::Uuid;

/// Publication state of a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostStatus {
    Draft,
    Published,
    Archived,
}

impl PostStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Published => "published",
            Self::Archived => "archived",
        }
    }
}

impl std::fmt::Display for PostStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub author_id: Uuid,
    pub content: String,
    pub status: PostStatus,
    /// Tag names; sorted set so serialization is stable.
    pub tags: BTreeSet<String>,
    pub publish_date: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Post {
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.status == PostStatus::Published
    }
}

/// Review state of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    Approved,
    Pending,
    Spam,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Option<Uuid>,
    pub content: String,
    pub parent_id: Option<Uuid>,
    pub moderation_status: ModerationStatus,
    pub timestamp: DateTime<Utc>,
}

/// A user's reaction to a post. At most one per (user, post) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReactionKind {
    Like,
    Dislike,
}

impl ReactionKind {
    /// Parse the wire value; anything but "like"/"dislike" is rejected.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "like" => Some(Self::Like),
            "dislike" => Some(Self::Dislike),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "like",
            Self::Dislike => "dislike",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: Uuid,
    pub post_id: Uuid,
    pub kind: ReactionKind,
}

/// Newsletter subscriber.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subscriber {
    pub id: Uuid,
    pub email: String,
    pub subscription_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Advertisement {
    pub id: Uuid,
    pub name: String,
    pub placement: String,
    pub impressions: u64,
    pub clicks: u64,
}

/// A single page view of a published post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PageView {
    pub post_id: Uuid,
    pub visitor_ip: IpAddr,
    pub view_date: DateTime<Utc>,
}
