use std::sync::Arc;
use std::time::Duration;

use crate::domain::models::notification::Notification;
use crate::error::AppError;
use crate::state::AppState;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

const SEND_ATTEMPTS: u32 = 2;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// Sending half of the notification queue. Enqueueing never blocks a
/// request; a full or closed queue drops the notification with a log
/// line, since every notification here is best-effort.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::Sender<Notification>,
}

impl Notifier {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.tx.try_send(notification) {
            warn!("Dropping notification: {}", e);
        }
    }
}

pub async fn start_notification_worker(state: Arc<AppState>, mut rx: mpsc::Receiver<Notification>) {
    info!("Starting notification worker...");

    while let Some(notification) = rx.recv().await {
        if let Err(e) = deliver(&state, &notification).await {
            error!("Failed to deliver notification {:?}: {}", notification, e);
        }
    }

    info!("Notification channel closed, worker exiting");
}

async fn deliver(state: &Arc<AppState>, notification: &Notification) -> Result<(), AppError> {
    match notification {
        Notification::InvitationAccepted {
            owner_id,
            enterprise_name,
            accepted_user_email,
            accepted_user_name,
            role,
        } => {
            let owner = state
                .identity
                .get_user(owner_id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Owner {} not found", owner_id)))?;

            let mut context = tera::Context::new();
            context.insert("admin_name", &owner.display_name());
            context.insert("accepted_user_name", accepted_user_name);
            context.insert("accepted_user_email", accepted_user_email);
            context.insert("enterprise_name", enterprise_name);
            context.insert("role", role);
            context.insert("dashboard_url", &format!("{}/enterprise", state.config.frontend_url));

            let html = state
                .templates
                .render("invitation_accepted.html", &context)
                .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {:?}", e)))?;
            let subject = format!("{} joined {}", accepted_user_name, enterprise_name);

            send_with_retry(state, &owner.email, &subject, &html).await
        }
        Notification::UserCreated {
            recipient,
            enterprise_name,
            inviter_name,
        } => {
            let mut context = tera::Context::new();
            context.insert("enterprise_name", enterprise_name);
            context.insert("inviter_name", inviter_name);
            context.insert("login_url", &format!("{}/accept-invitation", state.config.frontend_url));

            let html = state
                .templates
                .render("user_created.html", &context)
                .map_err(|e| AppError::InternalWithMsg(format!("Template render error: {:?}", e)))?;
            let subject = format!("Welcome to {} on MealLens AI", enterprise_name);

            send_with_retry(state, recipient, &subject, &html).await
        }
    }
}

async fn send_with_retry(state: &Arc<AppState>, recipient: &str, subject: &str, html: &str) -> Result<(), AppError> {
    let mut last_error = None;
    for attempt in 1..=SEND_ATTEMPTS {
        match state.email_service.send(recipient, subject, html).await {
            Ok(()) => {
                info!("Notification email sent to {}", recipient);
                return Ok(());
            }
            Err(e) => {
                warn!("Email send to {} failed (attempt {}/{}): {}", recipient, attempt, SEND_ATTEMPTS, e);
                last_error = Some(e);
                if attempt < SEND_ATTEMPTS {
                    sleep(RETRY_PAUSE).await;
                }
            }
        }
    }
    Err(last_error.unwrap_or(AppError::Internal))
}
