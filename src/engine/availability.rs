//! Player availability gate: injury status and minutes volatility.
//!
//! Runs before a prop is generated. An excluded player produces no
//! candidate at all, same as an eligibility rejection.

use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// A game below this fraction of the average minutes is a low-minute game.
pub const LOW_MINUTES_FRACTION: f64 = 0.75;
/// Consecutive most-recent low-minute games that exclude a player.
pub const EXCLUDE_LOW_MINUTE_STREAK: usize = 3;
/// Max spread of minutes across the last five games to count as stable.
pub const STABLE_MINUTES_RANGE: f64 = 8.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlayerStatus {
    #[default]
    Active,
    Probable,
    Questionable,
    GameTimeDecision,
    Doubtful,
    Out,
    Suspended,
    Unknown,
}

impl PlayerStatus {
    pub fn is_excluded(self) -> bool {
        matches!(
            self,
            PlayerStatus::Doubtful | PlayerStatus::Out | PlayerStatus::Suspended
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            PlayerStatus::Active => "active",
            PlayerStatus::Probable => "probable",
            PlayerStatus::Questionable => "questionable",
            PlayerStatus::GameTimeDecision => "game-time decision",
            PlayerStatus::Doubtful => "doubtful",
            PlayerStatus::Out => "out",
            PlayerStatus::Suspended => "suspended",
            PlayerStatus::Unknown => "unknown",
        }
    }
}

impl FromStr for PlayerStatus {
    type Err = Infallible;

    /// Accepts the spellings different injury reports use.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s.trim().to_lowercase().as_str() {
            "" | "active" | "available" | "healthy" => PlayerStatus::Active,
            "probable" | "likely" => PlayerStatus::Probable,
            "questionable" | "uncertain" => PlayerStatus::Questionable,
            "gtd" | "game-time decision" | "game time decision" => PlayerStatus::GameTimeDecision,
            "doubtful" | "unlikely" => PlayerStatus::Doubtful,
            "out" | "injured" | "dnp" | "did not play" => PlayerStatus::Out,
            "suspended" | "suspension" => PlayerStatus::Suspended,
            _ => PlayerStatus::Unknown,
        };
        Ok(status)
    }
}

impl From<String> for PlayerStatus {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(status) => status,
            Err(never) => match never {},
        }
    }
}

impl From<PlayerStatus> for String {
    fn from(status: PlayerStatus) -> Self {
        status.label().to_string()
    }
}

impl fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinutesAnalysis {
    pub average: f64,
    /// Minutes in the most recent game.
    pub last_game: Option<f64>,
    pub low_minute_games: usize,
    /// Low-minute games in a row, counting back from the most recent.
    pub low_minute_streak: usize,
    /// Max minus min over the last five games. `None` with fewer than five.
    pub recent_range: Option<f64>,
    pub stable: bool,
}

impl MinutesAnalysis {
    /// Most recent game fell below the low-minute cutoff.
    pub fn last_game_low(&self) -> bool {
        self.last_game
            .is_some_and(|m| m < self.average * LOW_MINUTES_FRACTION)
    }
}

/// `minutes` is most recent first.
pub fn analyze_minutes(minutes: &[f64]) -> MinutesAnalysis {
    if minutes.is_empty() {
        return MinutesAnalysis {
            average: 0.0,
            last_game: None,
            low_minute_games: 0,
            low_minute_streak: 0,
            recent_range: None,
            stable: false,
        };
    }

    let average = minutes.iter().sum::<f64>() / minutes.len() as f64;
    let low = average * LOW_MINUTES_FRACTION;
    let low_minute_games = minutes.iter().filter(|&&m| m < low).count();
    let low_minute_streak = minutes.iter().take_while(|&&m| m < low).count();

    let recent_range = minutes.get(..5).map(|recent| {
        let max = recent.iter().copied().fold(f64::MIN, f64::max);
        let min = recent.iter().copied().fold(f64::MAX, f64::min);
        max - min
    });

    MinutesAnalysis {
        average,
        last_game: minutes.first().copied(),
        low_minute_games,
        low_minute_streak,
        recent_range,
        stable: recent_range.is_some_and(|r| r <= STABLE_MINUTES_RANGE),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Availability {
    Available {
        status: PlayerStatus,
        minutes: MinutesAnalysis,
    },
    Excluded(String),
}

pub fn check_player(status: PlayerStatus, minutes: &[f64]) -> Availability {
    if status.is_excluded() {
        return Availability::Excluded(format!("Player status: {status}"));
    }
    let analysis = analyze_minutes(minutes);
    if analysis.low_minute_streak >= EXCLUDE_LOW_MINUTE_STREAK {
        return Availability::Excluded(format!(
            "{} consecutive low-minute games",
            analysis.low_minute_streak
        ));
    }
    Availability::Available {
        status,
        minutes: analysis,
    }
}
