//! Manually set locations
//!
//! Holds a device-wide fix plus optional per-user overrides. Cloning shares
//! the same underlying table, so the input loop can update locations the
//! engine reads.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shared::{Coordinate, UserId};
use tokio::sync::RwLock;

use crate::traits::LocationProvider;

#[derive(Debug, Default)]
struct Fixes {
    device: Option<Coordinate>,
    per_user: HashMap<UserId, Coordinate>,
}

#[derive(Debug, Clone, Default)]
pub struct ManualLocationProvider {
    fixes: Arc<RwLock<Fixes>>,
}

impl ManualLocationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Location reported for anyone without an override
    pub async fn set_device_location(&self, location: Option<Coordinate>) {
        self.fixes.write().await.device = location;
    }

    pub async fn set_user_location(&self, user_id: UserId, location: Coordinate) {
        self.fixes.write().await.per_user.insert(user_id, location);
    }

    pub async fn clear_user_location(&self, user_id: UserId) {
        self.fixes.write().await.per_user.remove(&user_id);
    }
}

#[async_trait]
impl LocationProvider for ManualLocationProvider {
    async fn current_location(&self, user_id: UserId) -> Option<Coordinate> {
        let fixes = self.fixes.read().await;
        fixes.per_user.get(&user_id).copied().or(fixes.device)
    }
}
