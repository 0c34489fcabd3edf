//! Blog/CMS domain: posts, comments, tags, reactions, newsletter
//! subscribers, advertisements, page views, and the staff dashboard.

pub mod models;
pub mod routes;
pub mod service;
pub mod slug;
pub mod storage;

pub use models::{
    Advertisement, Comment, ModerationStatus, PageView, Post, PostStatus, Reaction, ReactionKind,
    Subscriber,
};
pub use routes::BlogModule;
pub use service::{BlogService, DashboardCounts, PostDetail, ReactionOutcome};
pub use storage::{BlogStore, InMemoryBlogStore};
