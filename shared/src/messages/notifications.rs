//! Notification and render payloads pushed to the presentation layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::types::UserId;

/// A user-facing notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// User the notification is meant for; `None` addresses whoever is at the screen
    #[serde(default)]
    pub recipient: Option<UserId>,
    pub title: String,
    pub body: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: None,
            title: title.into(),
            body: body.into(),
        }
    }

    pub fn to(recipient: UserId, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: Some(recipient),
            title: title.into(),
            body: body.into(),
        }
    }

    /// Single-line form used when the notification is shown as a toast
    pub fn toast_text(&self) -> String {
        format!("{}: {}", self.title, self.body)
    }
}

/// Views the presentation layer re-renders after a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    Vendors,
    Cart,
    Orders,
}

impl fmt::Display for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderTarget::Vendors => write!(f, "vendors"),
            RenderTarget::Cart => write!(f, "cart"),
            RenderTarget::Orders => write!(f, "orders"),
        }
    }
}

/// Default on-screen duration for informational toasts
pub const TOAST_DURATION: Duration = Duration::from_secs(3);

/// Toasts carrying errors or warnings stay up longer
pub const ALERT_TOAST_DURATION: Duration = Duration::from_secs(5);
