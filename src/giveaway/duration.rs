use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DurationError {
    #[error("duration '{0}' must end in 'm' or 'h'")]
    UnknownUnit(String),
    #[error("duration '{0}' must start with a positive whole number")]
    InvalidMagnitude(String),
    #[error("duration '{0}' is longer than {} days", MAX_DAYS)]
    TooLong(String),
}

/// Longest giveaway accepted.
pub const MAX_DAYS: u64 = 366;
const MAX_SECS: u64 = MAX_DAYS * 24 * 3600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Minutes,
    Hours,
}

impl DurationUnit {
    fn seconds(self) -> u64 {
        match self {
            DurationUnit::Minutes => 60,
            DurationUnit::Hours => 3600,
        }
    }

    fn suffix(self) -> char {
        match self {
            DurationUnit::Minutes => 'm',
            DurationUnit::Hours => 'h',
        }
    }
}

/// How long a giveaway stays open, as typed by the admin (`10m`, `2h`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GiveawayDuration {
    magnitude: u64,
    unit: DurationUnit,
    secs: u64,
}

impl GiveawayDuration {
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.secs
    }
}

impl FromStr for GiveawayDuration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let unit = match s.chars().last() {
            Some('m') => DurationUnit::Minutes,
            Some('h') => DurationUnit::Hours,
            _ => return Err(DurationError::UnknownUnit(s.to_string())),
        };

        let digits = &s[..s.len() - 1];
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(DurationError::InvalidMagnitude(s.to_string()));
        }

        let magnitude: u64 = digits
            .parse()
            .map_err(|_| DurationError::InvalidMagnitude(s.to_string()))?;
        let secs = magnitude
            .checked_mul(unit.seconds())
            .filter(|secs| *secs > 0)
            .ok_or_else(|| DurationError::InvalidMagnitude(s.to_string()))?;
        if secs > MAX_SECS {
            return Err(DurationError::TooLong(s.to_string()));
        }

        Ok(Self {
            magnitude,
            unit,
            secs,
        })
    }
}

impl fmt::Display for GiveawayDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.magnitude, self.unit.suffix())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes() {
        let d: GiveawayDuration = "10m".parse().unwrap();
        assert_eq!(d.as_secs(), 600);
        assert_eq!(d.to_string(), "10m");
    }

    #[test]
    fn test_hours() {
        let d: GiveawayDuration = "2h".parse().unwrap();
        assert_eq!(d.as_duration(), Duration::from_secs(7200));
    }

    #[test]
    fn test_unknown_unit_rejected() {
        assert_eq!(
            "5z".parse::<GiveawayDuration>(),
            Err(DurationError::UnknownUnit("5z".to_string()))
        );
        assert!("10".parse::<GiveawayDuration>().is_err());
        assert!("".parse::<GiveawayDuration>().is_err());
    }

    #[test]
    fn test_bad_magnitude_rejected() {
        for input in ["m", "-5m", "1.5h", "abch", "0m", "+3m"] {
            assert!(
                matches!(
                    input.parse::<GiveawayDuration>(),
                    Err(DurationError::InvalidMagnitude(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_overflow_rejected() {
        let huge = format!("{}h", u64::MAX);
        assert!(huge.parse::<GiveawayDuration>().is_err());
        let digits = "9".repeat(40) + "m";
        assert!(digits.parse::<GiveawayDuration>().is_err());
    }

    #[test]
    fn test_too_long_rejected() {
        assert!("8784h".parse::<GiveawayDuration>().is_ok());
        assert_eq!(
            "8785h".parse::<GiveawayDuration>(),
            Err(DurationError::TooLong("8785h".to_string()))
        );
        assert!(matches!(
            "1000000000000000m".parse::<GiveawayDuration>(),
            Err(DurationError::TooLong(_))
        ));
    }
}
