//! User-facing texts. Everything here is sent with HTML parse mode, so any
//! text that came from users goes through [`escape`].

use teloxide::utils::html::escape;

use crate::command::StartArgs;
use crate::giveaway::duration::MAX_DAYS;
use crate::giveaway::{Participant, Resolution};
use crate::service::CommandError;

pub fn help() -> String {
    format!(
        "🎁 I run giveaways in this chat.\n\n\
         Commands (admins only):\n\
         {}\n\
         /endgiveaway - end the latest open giveaway now (or reply to one to end it)\n\n\
         Everyone else just presses the join button.",
        usage_line()
    )
}

fn usage_line() -> String {
    escape("/giveaway <prize> <winners> <duration> - start a giveaway, e.g. /giveaway 100_Robux 1 10m")
}

pub fn announcement(creator: &Participant, args: &StartArgs) -> String {
    format!(
        "🎉 <b>New giveaway!</b>\n\n\
         \u{2022} Hosted by: {}\n\
         \u{2022} Prize: {}\n\
         \u{2022} Winners: {}\n\
         \u{2022} Duration: {}\n\n\
         Press the button below to join!",
        escape(&creator.handle()),
        escape(&args.prize),
        args.winner_slots,
        args.duration
    )
}

pub fn joined() -> &'static str {
    "You joined the giveaway! 🎉"
}

pub fn thanks_for_joining(participant: &Participant) -> String {
    format!(
        "{}, thanks for joining the giveaway, good luck! 🍀",
        escape(&participant.handle())
    )
}

pub fn ended_manually() -> &'static str {
    "🛑 Giveaway ended manually."
}

/// `@username`, or a tg://user link labelled with the first name.
pub fn mention(participant: &Participant) -> String {
    match &participant.username {
        Some(username) => format!("@{}", escape(username)),
        None => format!(
            "<a href=\"tg://user?id={}\">{}</a>",
            participant.user_id,
            escape(&participant.first_name)
        ),
    }
}

pub fn resolution(resolution: &Resolution) -> String {
    if !resolution.has_winners() {
        return format!(
            "😔 The giveaway for <b>{}</b> ended with no participants.",
            escape(&resolution.prize)
        );
    }

    let winners = resolution
        .winners
        .iter()
        .map(mention)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🏁 <b>Giveaway ended!</b>\n\n\
         \u{2022} Prize: {}\n\
         \u{2022} Winner(s):\n{}\n\n\
         Congratulations! Claim your prize by messaging the host: {} 🎁",
        escape(&resolution.prize),
        winners,
        escape(&resolution.creator.handle())
    )
}

pub fn command_error(err: &CommandError) -> String {
    match err {
        CommandError::Usage => format!("Usage: {}", usage_line()),
        CommandError::InvalidWinnerCount(_) => {
            "⚠️ The number of winners must be a positive whole number (e.g. 1, 2).".to_string()
        }
        CommandError::InvalidDuration(_) => format!(
            "⚠️ The duration must be a number ending in 'm' or 'h', e.g. 10m or 1h \
             (at most {} days).",
            MAX_DAYS
        ),
        CommandError::NotAuthorized => {
            "🚫 Only administrators can start or end giveaways.".to_string()
        }
        CommandError::PermissionUnavailable => {
            "I couldn't check your permissions, please try again.".to_string()
        }
        CommandError::NoActiveGiveaway => "⚠️ There is no active giveaway.".to_string(),
        CommandError::GiveawayClosed => "⚠️ That giveaway has already ended.".to_string(),
        CommandError::AlreadyJoined => "You're already taking part.".to_string(),
        CommandError::DuplicateGiveaway(_) | CommandError::Transport(_) => {
            "Something went wrong, please try again.".to_string()
        }
    }
}

/// Toast shown to someone pressing the join button.
pub fn join_reply(result: &Result<(), CommandError>) -> String {
    match result {
        Ok(()) => joined().to_string(),
        Err(CommandError::GiveawayClosed) => {
            "This giveaway has ended or doesn't exist.".to_string()
        }
        Err(e) => command_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::giveaway::tests::user;
    use crate::giveaway::{CloseReason, GiveawayId};

    fn resolution_with(winners: Vec<Participant>) -> Resolution {
        Resolution {
            id: GiveawayId::new(-100, 7),
            prize: "100 <Robux>".to_string(),
            creator: user(1, Some("host")),
            reason: CloseReason::Expired,
            participant_count: winners.len(),
            winners,
        }
    }

    #[test]
    fn test_announcement_lists_details() {
        let args = StartArgs {
            prize: "Gift & card".to_string(),
            winner_slots: 2,
            duration: "10m".parse().unwrap(),
        };
        let text = announcement(&user(1, Some("host")), &args);
        assert!(text.contains("Hosted by: @host"));
        assert!(text.contains("Prize: Gift &amp; card"));
        assert!(text.contains("Winners: 2"));
        assert!(text.contains("Duration: 10m"));
    }

    #[test]
    fn test_mention_fallback_to_link() {
        assert_eq!(mention(&user(5, Some("alice"))), "@alice");
        assert_eq!(
            mention(&user(6, None)),
            "<a href=\"tg://user?id=6\">User6</a>"
        );
    }

    #[test]
    fn test_resolution_with_winners() {
        let text = resolution(&resolution_with(vec![user(5, Some("alice")), user(6, None)]));
        assert!(text.contains("Prize: 100 &lt;Robux&gt;"));
        assert!(text.contains("@alice\n<a href=\"tg://user?id=6\">User6</a>"));
        assert!(text.contains("messaging the host: @host"));
    }

    #[test]
    fn test_resolution_without_participants() {
        let text = resolution(&resolution_with(Vec::new()));
        assert!(text.contains("no participants"));
        assert!(!text.contains("Winner(s)"));
    }

    #[test]
    fn test_usage_is_escaped() {
        let text = command_error(&CommandError::Usage);
        assert!(text.contains("&lt;prize&gt;"));
        assert!(!text.contains("<prize>"));
    }

    #[test]
    fn test_join_replies_differ() {
        assert_eq!(join_reply(&Ok(())), joined());
        assert_ne!(
            join_reply(&Err(CommandError::AlreadyJoined)),
            join_reply(&Ok(()))
        );
        assert!(join_reply(&Err(CommandError::GiveawayClosed)).contains("ended"));
    }
}
