use crate::giveaway::{DurationError, GiveawayDuration};

/// A recognised bot command, before any validation of its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    StartGiveaway(Vec<String>),
    EndGiveaway,
}

/// Validated arguments of `/giveaway`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartArgs {
    pub prize: String,
    pub winner_slots: usize,
    pub duration: GiveawayDuration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    Usage,
    InvalidWinnerCount(String),
    InvalidDuration(DurationError),
}

/// Recognise a command in a message. `/cmd@bot_username` is accepted as
/// `/cmd`; a command addressed to any other bot is not ours.
pub fn parse(text: &str, bot_username: &str) -> Option<Command> {
    let mut words = text.split_whitespace();
    let head = words.next()?.strip_prefix('/')?;
    let name = match head.split_once('@') {
        Some((name, target)) if target.eq_ignore_ascii_case(bot_username) => name,
        Some(_) => return None,
        None => head,
    };
    let name = name.to_lowercase();
    let args: Vec<String> = words.map(str::to_string).collect();

    match name.as_str() {
        "start" | "help" => Some(Command::Help),
        "giveaway" => Some(Command::StartGiveaway(args)),
        "endgiveaway" => Some(Command::EndGiveaway),
        _ => None,
    }
}

/// `<prize> <winners> <duration>`; underscores in the prize stand for spaces.
/// Extra trailing words are ignored.
pub fn parse_start_args(args: &[String]) -> Result<StartArgs, ArgsError> {
    let [prize, winners, duration, ..] = args else {
        return Err(ArgsError::Usage);
    };

    let prize = prize.replace('_', " ");
    let winner_slots = winners
        .parse::<usize>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| ArgsError::InvalidWinnerCount(winners.clone()))?;
    let duration = duration
        .parse::<GiveawayDuration>()
        .map_err(ArgsError::InvalidDuration)?;

    Ok(StartArgs {
        prize,
        winner_slots,
        duration,
    })
}
