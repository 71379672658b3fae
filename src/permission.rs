use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
#[error("membership lookup failed: {0}")]
pub struct LookupError(pub String);

/// Answers "is this user an admin or the owner of this chat?".
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    async fn is_admin(&self, chat_id: i64, user_id: u64) -> Result<bool, LookupError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Granted,
    Denied,
    /// The lookup itself failed; treated as a denial.
    Unavailable,
}

/// Default-deny wrapper around a [`PermissionProvider`].
#[derive(Clone)]
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self { provider }
    }

    pub async fn check(&self, chat_id: i64, user_id: u64) -> Authorization {
        match self.provider.is_admin(chat_id, user_id).await {
            Ok(true) => Authorization::Granted,
            Ok(false) => {
                debug!("User {} is not an admin of chat {}", user_id, chat_id);
                Authorization::Denied
            }
            Err(e) => {
                warn!(
                    "Permission check for user {} in chat {} failed: {}",
                    user_id, chat_id, e
                );
                Authorization::Unavailable
            }
        }
    }
}
