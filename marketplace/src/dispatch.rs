//! Notification routing
//!
//! In `popup` mode every notification is a toast. In `browser` mode the
//! platform channel is tried first and a toast is shown if it fails.

use shared::logging::Component;
use shared::messages::notifications::ALERT_TOAST_DURATION;
use shared::{market_debug, market_warn, Notification, NotificationMode};

use crate::error::MarketResult;
use crate::traits::Notifier;

/// Channel a notification was delivered on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Toast,
    Platform,
}

#[derive(Debug, Clone, Copy)]
pub struct NotificationDispatcher {
    mode: NotificationMode,
}

impl NotificationDispatcher {
    pub fn new(mode: NotificationMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> NotificationMode {
        self.mode
    }

    pub async fn deliver<N: Notifier + ?Sized>(&self, notifier: &N, notification: &Notification) -> MarketResult<Channel> {
        if self.mode == NotificationMode::Browser {
            match notifier.platform_notify(&notification.title, &notification.body).await {
                Ok(()) => return Ok(Channel::Platform),
                Err(e) => {
                    market_warn!(Component::Presentation, "Platform notification unavailable, using toast: {}", e);
                }
            }
        }
        notifier
            .toast(&notification.toast_text(), ALERT_TOAST_DURATION)
            .await?;
        market_debug!(Component::Presentation, "Delivered '{}' as toast", notification.title);
        Ok(Channel::Toast)
    }
}
