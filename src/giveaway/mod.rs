pub mod duration;
pub mod registry;
pub mod selector;

use std::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

pub use duration::{DurationError, GiveawayDuration};
pub use registry::GiveawayRegistry;

/// Key of a giveaway: the chat it lives in and the id of its announcement message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GiveawayId {
    pub chat_id: i64,
    pub message_id: i32,
}

impl GiveawayId {
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self {
            chat_id,
            message_id,
        }
    }
}

impl fmt::Display for GiveawayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.message_id)
    }
}

/// A chat user as far as giveaways care: identity plus display data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub user_id: u64,
    pub username: Option<String>,
    pub first_name: String,
}

impl Participant {
    /// `@username` when the user has one, otherwise the first name.
    pub fn handle(&self) -> String {
        match &self.username {
            Some(username) => format!("@{}", username),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    Expired,
    ManualByAdmin,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Expired => write!(f, "expired"),
            CloseReason::ManualByAdmin => write!(f, "ended by admin"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GiveawayError {
    #[error("giveaway {0} already exists")]
    DuplicateId(GiveawayId),
    #[error("giveaway {0} not found")]
    NotFound(GiveawayId),
    #[error("user {0} already joined")]
    AlreadyJoined(u64),
    #[error("giveaway already closed")]
    AlreadyClosed,
}

/// Everything the announcement needs, captured at the moment of closing.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub id: GiveawayId,
    pub prize: String,
    pub creator: Participant,
    pub reason: CloseReason,
    pub participant_count: usize,
    pub winners: Vec<Participant>,
}

impl Resolution {
    pub fn has_winners(&self) -> bool {
        !self.winners.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Giveaway {
    pub id: GiveawayId,
    pub prize: String,
    pub winner_slots: usize,
    pub duration: GiveawayDuration,
    pub creator: Participant,
    pub created_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    participants: Vec<Participant>,
    status: Status,
}

impl Giveaway {
    /// A fresh, open giveaway. `winner_slots` is clamped to at least one.
    pub fn new(
        id: GiveawayId,
        prize: impl Into<String>,
        winner_slots: usize,
        duration: GiveawayDuration,
        creator: Participant,
    ) -> Self {
        Self {
            id,
            prize: prize.into(),
            winner_slots: winner_slots.max(1),
            duration,
            creator,
            created_at: Utc::now(),
            closed_at: None,
            participants: Vec::new(),
            status: Status::Open,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_open(&self) -> bool {
        self.status() == Status::Open
    }

    /// Participants in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.created_at + chrono::Duration::seconds(self.duration.as_secs() as i64)
    }

    pub fn join(&mut self, participant: Participant) -> Result<(), GiveawayError> {
        if !self.is_open() {
            return Err(GiveawayError::AlreadyClosed);
        }
        if self
            .participants
            .iter()
            .any(|p| p.user_id == participant.user_id)
        {
            return Err(GiveawayError::AlreadyJoined(participant.user_id));
        }
        self.participants.push(participant);
        Ok(())
    }

    /// Close the giveaway and draw winners from the final participant list.
    ///
    /// Only the first call succeeds; every later call gets `AlreadyClosed`
    /// and leaves the giveaway untouched.
    pub fn close<R: Rng + ?Sized>(
        &mut self,
        reason: CloseReason,
        rng: &mut R,
    ) -> Result<Resolution, GiveawayError> {
        if !self.is_open() {
            return Err(GiveawayError::AlreadyClosed);
        }
        self.status = Status::Closed;
        self.closed_at = Some(Utc::now());

        let winners = selector::select_winners(&self.participants, self.winner_slots, rng);
        Ok(Resolution {
            id: self.id,
            prize: self.prize.clone(),
            creator: self.creator.clone(),
            reason,
            participant_count: self.participants.len(),
            winners,
        })
    }
}
