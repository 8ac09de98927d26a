use tracing::{error, info, warn};

use crate::state::AppState;

pub mod client;
pub mod outbox;
pub mod templates;

pub use client::{EmailClient, EmailMessage};
pub use templates::EmailEvent;

/// How a notification left the building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    Fallback,
}

/// Render and deliver a notification. Delivery problems are downgraded to a
/// fallback log entry; the calling operation never fails because of email.
pub async fn notify(state: &AppState, to: &str, event: EmailEvent) -> Delivery {
    let (subject, html) = templates::render(&event);
    let msg = EmailMessage {
        to: to.to_string(),
        subject,
        html,
        event: event.kind(),
    };
    match state.email.send(&msg).await {
        Ok(()) => {
            info!(to = %msg.to, event = msg.event, "notification sent");
            Delivery::Sent
        }
        Err(e) => {
            warn!(error = %e, to = %msg.to, event = msg.event, "delivery failed, logging to outbox");
            if let Err(log_err) = outbox::log_fallback(&state.db, &msg, &e.to_string()).await {
                error!(error = %log_err, to = %msg.to, "outbox write failed, email content dropped");
            }
            Delivery::Fallback
        }
    }
}
