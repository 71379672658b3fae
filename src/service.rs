use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::command::{self, ArgsError};
use crate::giveaway::{
    CloseReason, DurationError, Giveaway, GiveawayError, GiveawayId, GiveawayRegistry,
    Participant, Resolution,
};
use crate::messages;
use crate::permission::{Authorization, PermissionGate, PermissionProvider};
use crate::platform::{CommandContext, Messenger};
use crate::scheduler::{DeferredRunner, DeferredTask};

/// Why a command did not go through. Each variant maps to a reply in
/// [`messages::command_error`]; none of them is fatal.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("missing command arguments")]
    Usage,
    #[error("invalid winner count '{0}'")]
    InvalidWinnerCount(String),
    #[error("invalid duration: {0}")]
    InvalidDuration(#[from] DurationError),
    #[error("sender is not a chat administrator")]
    NotAuthorized,
    #[error("permission lookup unavailable")]
    PermissionUnavailable,
    #[error("no active giveaway")]
    NoActiveGiveaway,
    #[error("giveaway is closed or unknown")]
    GiveawayClosed,
    #[error("already joined")]
    AlreadyJoined,
    #[error("giveaway {0} already registered")]
    DuplicateGiveaway(GiveawayId),
    #[error("transport error: {0:#}")]
    Transport(anyhow::Error),
}

impl From<ArgsError> for CommandError {
    fn from(err: ArgsError) -> Self {
        match err {
            ArgsError::Usage => CommandError::Usage,
            ArgsError::InvalidWinnerCount(raw) => CommandError::InvalidWinnerCount(raw),
            ArgsError::InvalidDuration(e) => CommandError::InvalidDuration(e),
        }
    }
}

impl From<GiveawayError> for CommandError {
    fn from(err: GiveawayError) -> Self {
        match err {
            GiveawayError::AlreadyJoined(_) => CommandError::AlreadyJoined,
            GiveawayError::AlreadyClosed | GiveawayError::NotFound(_) => {
                CommandError::GiveawayClosed
            }
            GiveawayError::DuplicateId(id) => CommandError::DuplicateGiveaway(id),
        }
    }
}

/// Drives the giveaway lifecycle: start, join, end and expiry.
///
/// Every state change goes through the registry's lock, and closing draws the
/// winners inside that same critical section. Whichever close trigger gets
/// there first announces; the others see `GiveawayClosed`.
pub struct GiveawayService {
    registry: GiveawayRegistry,
    gate: PermissionGate,
    messenger: Arc<dyn Messenger>,
    timer: Arc<dyn DeferredRunner>,
    rng: Mutex<StdRng>,
}

impl GiveawayService {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        permissions: Arc<dyn PermissionProvider>,
        timer: Arc<dyn DeferredRunner>,
    ) -> Self {
        Self {
            registry: GiveawayRegistry::new(),
            gate: PermissionGate::new(permissions),
            messenger,
            timer,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Replace the random source with a seeded one.
    #[cfg(test)]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    pub fn registry(&self) -> &GiveawayRegistry {
        &self.registry
    }

    async fn authorize(&self, ctx: &CommandContext) -> Result<(), CommandError> {
        match self.gate.check(ctx.chat_id, ctx.sender.user_id).await {
            Authorization::Granted => Ok(()),
            Authorization::Denied => Err(CommandError::NotAuthorized),
            Authorization::Unavailable => Err(CommandError::PermissionUnavailable),
        }
    }

    /// `/giveaway <prize> <winners> <duration>`
    pub async fn start(
        self: &Arc<Self>,
        ctx: &CommandContext,
        args: &[String],
    ) -> Result<GiveawayId, CommandError> {
        self.authorize(ctx).await?;
        let args = command::parse_start_args(args)?;

        let text = messages::announcement(&ctx.sender, &args);
        let message_id = self
            .messenger
            .post_giveaway(ctx.chat_id, Some(ctx.message_id), text)
            .await
            .map_err(CommandError::Transport)?;

        let id = GiveawayId::new(ctx.chat_id, message_id);
        let delay = args.duration.as_duration();
        let giveaway = Giveaway::new(
            id,
            args.prize,
            args.winner_slots,
            args.duration,
            ctx.sender.clone(),
        );
        info!(
            "Giveaway {} started by {} ({}): prize '{}', {} winner(s), ends at {}",
            id,
            ctx.sender.handle(),
            ctx.sender.user_id,
            giveaway.prize,
            giveaway.winner_slots,
            giveaway.ends_at()
        );
        if let Err(e) = self.registry.create(giveaway).await {
            error!(
                "Giveaway message {} was posted but could not be registered, its join button is dead: {}",
                id, e
            );
            return Err(e.into());
        }

        self.schedule_expiry(id, delay).await;
        Ok(id)
    }

    async fn schedule_expiry(self: &Arc<Self>, id: GiveawayId, delay: Duration) {
        let service = Arc::downgrade(self);
        let task: DeferredTask = Box::pin(async move {
            if let Some(service) = service.upgrade() {
                service.expire(id).await;
            }
        });

        if let Err(e) = self
            .timer
            .run_after(&format!("giveaway-{}", id), delay, task)
            .await
        {
            error!(
                "Failed to schedule expiry of giveaway {}, it stays open until ended manually: {:#}",
                id, e
            );
        }
    }

    /// Join button. No authorization needed.
    pub async fn join(&self, id: GiveawayId, participant: Participant) -> Result<(), CommandError> {
        let thanks = messages::thanks_for_joining(&participant);
        let user_id = participant.user_id;

        let count = self
            .registry
            .mutate(id, move |g| {
                g.join(participant).map(|()| g.participants().len())
            })
            .await??;
        info!(
            "User {} joined giveaway {} ({} participant(s))",
            user_id, id, count
        );

        if let Err(e) = self
            .messenger
            .send(id.chat_id, Some(id.message_id), thanks)
            .await
        {
            warn!("Failed to thank user {} for joining {}: {:#}", user_id, id, e);
        }
        Ok(())
    }

    /// `/endgiveaway`: a replied-to giveaway if the command is a reply to
    /// one, otherwise the newest giveaway still open in the chat.
    pub async fn end(&self, ctx: &CommandContext) -> Result<Resolution, CommandError> {
        self.authorize(ctx).await?;

        let replied = match ctx.reply_to {
            Some(message_id) => {
                let id = GiveawayId::new(ctx.chat_id, message_id);
                self.registry.contains(id).await.then_some(id)
            }
            None => None,
        };
        let id = match replied {
            Some(id) => id,
            None => self
                .registry
                .latest_open_in_chat(ctx.chat_id)
                .await
                .ok_or(CommandError::NoActiveGiveaway)?,
        };

        let resolution = self.close(id, CloseReason::ManualByAdmin).await?;
        if let Err(e) = self
            .messenger
            .send(
                ctx.chat_id,
                Some(ctx.message_id),
                messages::ended_manually().to_string(),
            )
            .await
        {
            warn!("Failed to confirm manual end of {}: {:#}", id, e);
        }
        self.announce(&resolution).await;
        Ok(resolution)
    }

    /// Timer callback. A giveaway that was already ended is left alone.
    pub async fn expire(&self, id: GiveawayId) {
        match self.close(id, CloseReason::Expired).await {
            Ok(resolution) => self.announce(&resolution).await,
            Err(CommandError::GiveawayClosed) => {
                debug!("Giveaway {} was already closed when its timer fired", id)
            }
            Err(e) => warn!("Failed to expire giveaway {}: {}", id, e),
        }
    }

    async fn close(&self, id: GiveawayId, reason: CloseReason) -> Result<Resolution, CommandError> {
        let resolution = self
            .registry
            .mutate(id, |g| {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                g.close(reason, &mut *rng)
            })
            .await??;

        info!(
            "Giveaway {} closed ({}): {} participant(s), {} winner(s)",
            id,
            resolution.reason,
            resolution.participant_count,
            resolution.winners.len()
        );
        Ok(resolution)
    }

    async fn announce(&self, resolution: &Resolution) {
        let id = resolution.id;
        let text = messages::resolution(resolution);
        if let Err(e) = self
            .messenger
            .send(id.chat_id, Some(id.message_id), text)
            .await
        {
            error!("Failed to announce result of giveaway {}: {:#}", id, e);
        }
    }

    /// Forget giveaways closed longer ago than `retention`.
    pub async fn prune_closed(&self, retention: chrono::Duration) -> usize {
        self.registry.prune_closed_before(Utc::now() - retention).await
    }
}
