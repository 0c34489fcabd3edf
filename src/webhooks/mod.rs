//! Payment processor webhook ingestion.
//!
//! Verified, idempotent processing of payment notifications: signature
//! check first, then a dispatch step that skips already-seen event ids and
//! records new ones only after the handler succeeds.

pub mod idempotency;
pub mod payment;
pub mod routes;
pub mod verification;

pub use idempotency::{IdempotencyStore, MemoryIdempotencyStore};
pub use payment::{PaymentEventKind, PaymentNotification, PaymentNotificationHandler};
pub use routes::WebhookModule;
pub use verification::{HmacSha256Verifier, NoVerification, WebhookVerifier};
