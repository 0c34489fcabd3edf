//! HTTP surface for the blog domain.

use super::models::{ModerationStatus, Post};
use super::service::{
    BlogService, CreateAdInput, CreateCommentInput, CreatePostInput, SubscribeInput,
    UpdatePostInput,
};
use super::storage::ReactionOutcome;
use crate::app::AppContext;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::http::{
    query::PaginationQuery,
    response::{PaginatedData, StatusResponse},
    routes::RouteModule,
};
use crate::validation::ValidatedJson;
use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// Route module for posts, comments, reactions, tags, newsletter signup,
/// advertisements, and the staff dashboard.
#[derive(Debug, Default, Clone, Copy)]
pub struct BlogModule;

impl RouteModule for BlogModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/posts", get(list_posts).post(create_post))
            .route(
                "/posts/{slug}",
                get(get_post).put(update_post).delete(delete_post),
            )
            .route("/posts/{slug}/comments", post(add_comment))
            .route("/posts/{id}/reaction", post(set_reaction))
            .route("/comments/{id}", delete(delete_comment))
            .route("/comments/{id}/moderate", post(moderate_comment))
            .route("/subscribe", post(subscribe))
            .route("/ads", post(create_ad))
            .route("/ads/{id}/click", post(ad_click))
            .route("/tags/{name}", get(posts_for_tag))
            .route("/dashboard", get(dashboard))
    }
}

/// Visitor address as forwarded by the proxy, first hop wins.
fn visitor_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
}

async fn list_posts(
    State(ctx): State<AppContext>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<PaginatedData<Post>>> {
    let (page, per_page) = query.clamped();
    let (posts, total) = ctx
        .blog
        .list_published(query.offset(), per_page as usize)
        .await?;
    Ok(Json(PaginatedData::new(posts, total, page, per_page)))
}

async fn get_post(
    State(ctx): State<AppContext>,
    Path(slug): Path<String>,
    headers: HeaderMap,
) -> Result<Json<super::service::PostDetail>> {
    let detail = ctx.blog.get_post(&slug, visitor_ip(&headers)).await?;
    Ok(Json(detail))
}

async fn create_post(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreatePostInput>,
) -> Result<Json<Post>> {
    let post = ctx.blog.create_post(&user.0, input).await?;
    Ok(Json(post))
}

async fn update_post(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(slug): Path<String>,
    ValidatedJson(input): ValidatedJson<UpdatePostInput>,
) -> Result<Json<Post>> {
    let post = ctx.blog.update_post(&slug, &user.0, input).await?;
    Ok(Json(post))
}

async fn delete_post(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(slug): Path<String>,
) -> Result<StatusResponse> {
    ctx.blog.delete_post(&slug, &user.0).await?;
    Ok(StatusResponse::success())
}

async fn add_comment(
    State(ctx): State<AppContext>,
    user: Option<CurrentUser>,
    Path(slug): Path<String>,
    ValidatedJson(input): ValidatedJson<CreateCommentInput>,
) -> Result<Json<super::models::Comment>> {
    let author_id = user.map(|u| u.0.id);
    let comment = ctx.blog.add_comment(&slug, author_id, input).await?;
    Ok(Json(comment))
}

async fn delete_comment(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusResponse> {
    ctx.blog.delete_comment(id, &user.0).await?;
    Ok(StatusResponse::success())
}

#[derive(Debug, Deserialize)]
struct ModerateCommentInput {
    status: ModerationStatus,
}

async fn moderate_comment(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ModerateCommentInput>,
) -> Result<StatusResponse> {
    user.require_staff()?;
    ctx.blog.moderate_comment(id, input.status).await?;
    Ok(StatusResponse::success())
}

#[derive(Debug, Deserialize)]
struct ReactionInput {
    interaction_type: String,
}

#[derive(Debug, Serialize)]
struct ReactionResponse {
    outcome: ReactionOutcome,
    likes: u64,
    dislikes: u64,
}

async fn set_reaction(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(input): Json<ReactionInput>,
) -> Result<Json<ReactionResponse>> {
    let outcome = ctx
        .blog
        .set_reaction(&user.0, id, &input.interaction_type)
        .await?;
    let detail = ctx.blog.reaction_counts(id).await?;
    Ok(Json(ReactionResponse {
        outcome,
        likes: detail.0,
        dislikes: detail.1,
    }))
}

async fn subscribe(
    State(ctx): State<AppContext>,
    ValidatedJson(input): ValidatedJson<SubscribeInput>,
) -> Result<StatusResponse> {
    ctx.blog.subscribe(input.email).await?;
    Ok(StatusResponse::success())
}

async fn create_ad(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreateAdInput>,
) -> Result<Json<super::models::Advertisement>> {
    user.require_staff()?;
    let ad = ctx.blog.create_ad(input).await?;
    Ok(Json(ad))
}

#[derive(Debug, Serialize)]
struct AdClickResponse {
    clicks: u64,
}

async fn ad_click(
    State(ctx): State<AppContext>,
    Path(id): Path<Uuid>,
) -> Result<Json<AdClickResponse>> {
    let clicks = ctx.blog.ad_click(id).await?;
    Ok(Json(AdClickResponse { clicks }))
}

async fn posts_for_tag(
    State(ctx): State<AppContext>,
    Path(name): Path<String>,
) -> Result<Json<Vec<Post>>> {
    let posts = ctx.blog.posts_for_tag(&name).await?;
    Ok(Json(posts))
}

async fn dashboard(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<super::service::DashboardCounts>> {
    user.require_staff()?;
    let counts = ctx.blog.dashboard().await?;
    Ok(Json(counts))
}
