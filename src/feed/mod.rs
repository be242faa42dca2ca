pub mod fixture;
pub mod types;

use crate::engine::legs::{PlayerId, TeamId};
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use types::{GameRecord, PlayerGame};

/// Why a game log could not be fetched. Any of these degrades the affected
/// subject to "no candidate"; none of them aborts a parlay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("source unavailable: {0}")]
    Unavailable(String),
}

/// Source of completed-game history. All results are most recent first.
#[async_trait]
pub trait GameLogSource: Send + Sync {
    /// Up to `count` most recent games for a team.
    async fn team_games(&self, team: TeamId, count: usize) -> Result<Vec<GameRecord>, FetchError>;

    /// Up to `count` most recent games for a player.
    async fn player_games(&self, player: PlayerId, count: usize) -> Result<Vec<PlayerGame>, FetchError>;

    /// Every game `team` played against `opponent` on or after `since`.
    async fn head_to_head(
        &self,
        team: TeamId,
        opponent: TeamId,
        since: NaiveDate,
    ) -> Result<Vec<GameRecord>, FetchError>;
}
