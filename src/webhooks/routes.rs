//! HTTP surface for webhook ingestion.

use super::payment::{dispatch, PaymentNotification, PaymentNotificationHandler};
use crate::app::AppContext;
use crate::billing::error::BillingError;
use crate::error::{AppError, Result};
use crate::http::{response::StatusResponse, routes::RouteModule};
use axum::{body::Bytes, extract::State, http::HeaderMap, routing::post, Router};

pub const SIGNATURE_HEADER: &str = "x-webhook-signature";

/// Route module for payment processor notifications.
#[derive(Debug, Default, Clone, Copy)]
pub struct WebhookModule;

impl RouteModule for WebhookModule {
    fn routes(&self) -> Router<AppContext> {
        Router::new().route("/payment", post(payment_notification))
    }

    fn prefix(&self) -> Option<&str> {
        Some("/webhooks")
    }
}

/// Verify, parse, and apply one payment notification.
///
/// The raw body is verified before any parsing so a forged payload never
/// reaches the deserializer.
async fn payment_notification(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("Missing webhook signature"))?;

    if !ctx
        .webhook_verifier
        .verify_signature(&body, signature)
        .await?
    {
        return Err(BillingError::InvalidWebhookSignature.into());
    }

    let event: PaymentNotification =
        serde_json::from_slice(&body).map_err(|e| BillingError::InvalidWebhookPayload {
            message: e.to_string(),
        })?;

    let handler = PaymentNotificationHandler::new(
        ctx.transactions.clone(),
        ctx.subscriptions.clone(),
    );
    dispatch(&event, &handler, ctx.webhook_events.as_ref()).await?;

    Ok(StatusResponse::success())
}
