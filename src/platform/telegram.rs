use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::payloads::{
    AnswerCallbackQuerySetters, DeleteWebhookSetters, SendMessageSetters,
};
use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode, ReplyParameters, User,
};
use tracing::{error, info, warn};

use crate::command::{self, Command};
use crate::giveaway::{GiveawayId, Participant};
use crate::messages;
use crate::permission::{LookupError, PermissionProvider};
use crate::platform::{CommandContext, Messenger};
use crate::service::{CommandError, GiveawayService};

/// Callback data carried by the join button.
const JOIN_CALLBACK: &str = "join";

/// Our own username, so `/cmd@OtherBot` in a shared group is left alone.
#[derive(Clone)]
struct BotUsername(Arc<str>);

fn participant(user: &User) -> Participant {
    Participant {
        user_id: user.id.0,
        username: user.username.clone(),
        first_name: user.first_name.clone(),
    }
}

fn join_keyboard() -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "🎟 Join",
        JOIN_CALLBACK,
    )]])
}

/// Sends giveaway messages through the Bot API.
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn post_giveaway(
        &self,
        chat_id: i64,
        reply_to: Option<i32>,
        text: String,
    ) -> Result<i32> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html)
            .reply_markup(join_keyboard());
        if let Some(reply_to) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }
        let sent = request
            .await
            .with_context(|| format!("Failed to post giveaway in chat {}", chat_id))?;
        Ok(sent.id.0)
    }

    async fn send(&self, chat_id: i64, reply_to: Option<i32>, text: String) -> Result<()> {
        let mut request = self
            .bot
            .send_message(ChatId(chat_id), text)
            .parse_mode(ParseMode::Html);
        if let Some(reply_to) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(MessageId(reply_to)));
        }
        request
            .await
            .with_context(|| format!("Failed to send message to chat {}", chat_id))?;
        Ok(())
    }
}

/// Chat admins and the owner are allowed to run giveaway commands.
#[derive(Clone)]
pub struct TelegramPermissions {
    bot: Bot,
}

impl TelegramPermissions {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl PermissionProvider for TelegramPermissions {
    async fn is_admin(&self, chat_id: i64, user_id: u64) -> Result<bool, LookupError> {
        let member = self
            .bot
            .get_chat_member(ChatId(chat_id), UserId(user_id))
            .await
            .map_err(|e| LookupError(e.to_string()))?;
        Ok(member.is_privileged())
    }
}

/// Remove any webhook so long polling gets the updates.
pub async fn clear_webhook(bot: &Bot) {
    info!("Removing any previous webhook...");
    match bot.delete_webhook().drop_pending_updates(true).await {
        Ok(_) => info!("Webhook removed (or there was none)"),
        Err(e) => warn!("Could not remove webhook: {}", e),
    }
}

/// Run the Telegram bot platform
pub async fn run(service: Arc<GiveawayService>, bot: Bot) -> Result<()> {
    info!("Starting Telegram platform...");

    let me = bot
        .get_me()
        .await
        .context("Failed to fetch the bot's own account")?;
    let username = BotUsername(me.user.username.clone().unwrap_or_default().into());
    info!("Running as @{}", username.0);

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(
            Update::filter_callback_query()
                .filter(|q: CallbackQuery| q.data.as_deref() == Some(JOIN_CALLBACK))
                .endpoint(handle_join),
        );

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service, username])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Telegram platform stopped");
    Ok(())
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    service: Arc<GiveawayService>,
    username: BotUsername,
) -> ResponseResult<()> {
    let user = match msg.from.as_ref() {
        Some(user) => user,
        None => return Ok(()),
    };

    let command = match msg.text().and_then(|text| command::parse(text, &username.0)) {
        Some(command) => command,
        None => return Ok(()),
    };

    info!(
        "Command {:?} from {} ({}) in chat {}",
        command, user.first_name, user.id.0, msg.chat.id.0
    );

    let ctx = CommandContext {
        chat_id: msg.chat.id.0,
        message_id: msg.id.0,
        reply_to: msg.reply_to_message().map(|m| m.id.0),
        sender: participant(user),
    };

    let result = match command {
        Command::Help => {
            bot.send_message(msg.chat.id, messages::help())
                .parse_mode(ParseMode::Html)
                .await?;
            return Ok(());
        }
        Command::StartGiveaway(args) => service.start(&ctx, &args).await.map(|_| ()),
        Command::EndGiveaway => service.end(&ctx).await.map(|_| ()),
    };

    if let Err(e) = result {
        match &e {
            CommandError::Transport(_)
            | CommandError::DuplicateGiveaway(_) => {
                error!("Command failed in chat {}: {}", ctx.chat_id, e)
            }
            _ => info!("Command rejected in chat {}: {}", ctx.chat_id, e),
        }
        bot.send_message(msg.chat.id, messages::command_error(&e))
            .parse_mode(ParseMode::Html)
            .reply_parameters(ReplyParameters::new(msg.id))
            .await?;
    }

    Ok(())
}

async fn handle_join(
    bot: Bot,
    q: CallbackQuery,
    service: Arc<GiveawayService>,
) -> ResponseResult<()> {
    let result = match q.message.as_ref() {
        Some(message) => {
            let id = GiveawayId::new(message.chat().id.0, message.id().0);
            service.join(id, participant(&q.from)).await
        }
        None => Err(CommandError::GiveawayClosed),
    };

    let closed = matches!(result, Err(CommandError::GiveawayClosed));
    bot.answer_callback_query(q.id.clone())
        .text(messages::join_reply(&result))
        .show_alert(closed)
        .await?;

    Ok(())
}
