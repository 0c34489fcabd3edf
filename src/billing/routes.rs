//! HTTP surface for billing.

use super::models::{Plan, StoredSubscription, Transaction};
use super::subscription::{CreatePlanInput, SubscriptionStatusView};
use crate::app::AppContext;
use crate::auth::CurrentUser;
use crate::error::Result;
use crate::http::routes::RouteModule;
use crate::validation::ValidatedJson;
use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

/// Route module for plans, subscriptions, and transaction history.
#[derive(Debug, Default, Clone, Copy)]
pub struct BillingModule;

impl RouteModule for BillingModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new()
            .route("/plans", get(list_plans).post(create_plan))
            .route("/subscribe/{plan_id}", post(subscribe))
            .route("/cancel", post(cancel))
            .route("/status", get(status))
            .route("/transactions", get(list_transactions))
    }

    fn prefix(&self) -> Option<&str> {
        Some("/billing")
    }
}

async fn list_plans(State(ctx): State<AppContext>) -> Result<Json<Vec<Plan>>> {
    Ok(Json(ctx.subscriptions.list_plans().await?))
}

async fn create_plan(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    ValidatedJson(input): ValidatedJson<CreatePlanInput>,
) -> Result<Json<Plan>> {
    user.require_staff()?;
    Ok(Json(ctx.subscriptions.create_plan(input).await?))
}

async fn subscribe(
    State(ctx): State<AppContext>,
    user: CurrentUser,
    Path(plan_id): Path<Uuid>,
) -> Result<Json<StoredSubscription>> {
    Ok(Json(ctx.subscriptions.subscribe(user.0.id, plan_id).await?))
}

async fn cancel(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<StoredSubscription>> {
    Ok(Json(ctx.subscriptions.cancel(user.0.id).await?))
}

async fn status(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<SubscriptionStatusView>> {
    Ok(Json(ctx.subscriptions.status(user.0.id).await?))
}

async fn list_transactions(
    State(ctx): State<AppContext>,
    user: CurrentUser,
) -> Result<Json<Vec<Transaction>>> {
    Ok(Json(ctx.transactions.list_for_user(user.0.id).await?))
}
