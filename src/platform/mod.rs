pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

use crate::giveaway::Participant;

/// Who sent a command, where, and in which message.
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub chat_id: i64,
    /// Id of the command message itself
    pub message_id: i32,
    /// Message the command replies to, if any
    pub reply_to: Option<i32>,
    pub sender: Participant,
}

/// Outbound side of the chat platform. All texts are HTML.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Post a giveaway announcement carrying the join button.
    /// Returns the id of the new message, which becomes the giveaway's key.
    async fn post_giveaway(&self, chat_id: i64, reply_to: Option<i32>, text: String)
        -> Result<i32>;

    async fn send(&self, chat_id: i64, reply_to: Option<i32>, text: String) -> Result<()>;
}
