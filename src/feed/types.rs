use crate::engine::availability::PlayerStatus;
use crate::engine::legs::{Direction, Matchup, PlayerId, PlayerRef, PropType, TeamId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Normalized internal types used by the engine (provider-agnostic).

/// One completed game from a team's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    pub date: NaiveDate,
    pub team_id: TeamId,
    pub opponent_id: TeamId,
    pub team_score: u32,
    pub opponent_score: u32,
    #[serde(default)]
    pub is_home: bool,
}

impl GameRecord {
    pub fn won(&self) -> bool {
        self.team_score > self.opponent_score
    }

    /// Subject score minus opponent score.
    pub fn margin(&self) -> i32 {
        self.team_score as i32 - self.opponent_score as i32
    }

    /// Combined score of both teams.
    pub fn total(&self) -> u32 {
        self.team_score + self.opponent_score
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatLine {
    pub points: f64,
    pub rebounds: f64,
    pub assists: f64,
    pub threes: f64,
    pub steals: f64,
    pub blocks: f64,
}

/// One completed game from a player's point of view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerGame {
    pub game_id: String,
    pub date: NaiveDate,
    pub player_id: PlayerId,
    pub opponent_id: TeamId,
    #[serde(default)]
    pub minutes: f64,
    pub stats: StatLine,
}

/// A line with its American price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub line: f64,
    pub odds: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoneylineMarket {
    pub home_odds: i32,
    pub away_odds: i32,
}

/// Spread lines offered for one team. More than one line = alt spreads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpreadMarket {
    pub team_id: TeamId,
    pub lines: Vec<PricedLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TotalMarket {
    pub direction: Direction,
    pub lines: Vec<PricedLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamTotalMarket {
    pub team_id: TeamId,
    pub direction: Direction,
    pub lines: Vec<PricedLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropMarket {
    pub player: PlayerRef,
    pub prop: PropType,
    pub direction: Direction,
    pub lines: Vec<PricedLine>,
    #[serde(default)]
    pub status: PlayerStatus,
}

/// Markets already known for a game. Sourcing the prices is the caller's job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMarkets {
    pub moneyline: Option<MoneylineMarket>,
    pub spreads: Vec<SpreadMarket>,
    pub game_totals: Vec<TotalMarket>,
    pub team_totals: Vec<TeamTotalMarket>,
    pub props: Vec<PropMarket>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSlate {
    pub matchup: Matchup,
    #[serde(default)]
    pub markets: GameMarkets,
}
