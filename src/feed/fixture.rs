use super::types::{GameRecord, GameSlate, PlayerGame};
use super::{FetchError, GameLogSource};
use crate::engine::legs::{PlayerId, TeamId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A day's slate plus the game logs needed to evaluate it, as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fixture {
    /// Date the slate is played on. Head-to-head lookback counts back from here.
    pub as_of: NaiveDate,
    pub slate: Vec<GameSlate>,
    #[serde(default)]
    pub team_games: Vec<GameRecord>,
    #[serde(default)]
    pub player_games: Vec<PlayerGame>,
}

impl Fixture {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture from {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Failed to parse fixture {}", path.display()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        Ok(fixture)
    }
}

/// In-memory game logs served through [`GameLogSource`].
#[derive(Debug, Clone, Default)]
pub struct FixtureSource {
    teams: HashMap<TeamId, Vec<GameRecord>>,
    players: HashMap<PlayerId, Vec<PlayerGame>>,
}

impl FixtureSource {
    pub fn new(team_games: Vec<GameRecord>, player_games: Vec<PlayerGame>) -> Self {
        let mut teams: HashMap<TeamId, Vec<GameRecord>> = HashMap::new();
        for game in team_games {
            teams.entry(game.team_id).or_default().push(game);
        }
        let mut players: HashMap<PlayerId, Vec<PlayerGame>> = HashMap::new();
        for game in player_games {
            players.entry(game.player_id).or_default().push(game);
        }
        // most recent first
        for games in teams.values_mut() {
            games.sort_by(|a, b| b.date.cmp(&a.date));
        }
        for games in players.values_mut() {
            games.sort_by(|a, b| b.date.cmp(&a.date));
        }
        Self { teams, players }
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        Self::new(fixture.team_games.clone(), fixture.player_games.clone())
    }

    fn team(&self, team: TeamId) -> Result<&[GameRecord], FetchError> {
        self.teams
            .get(&team)
            .map(Vec::as_slice)
            .ok_or_else(|| FetchError::NotFound(format!("team {team}")))
    }
}

#[async_trait]
impl GameLogSource for FixtureSource {
    async fn team_games(&self, team: TeamId, count: usize) -> Result<Vec<GameRecord>, FetchError> {
        Ok(self.team(team)?.iter().take(count).cloned().collect())
    }

    async fn player_games(&self, player: PlayerId, count: usize) -> Result<Vec<PlayerGame>, FetchError> {
        self.players
            .get(&player)
            .map(|games| games.iter().take(count).cloned().collect())
            .ok_or_else(|| FetchError::NotFound(format!("player {player}")))
    }

    async fn head_to_head(
        &self,
        team: TeamId,
        opponent: TeamId,
        since: NaiveDate,
    ) -> Result<Vec<GameRecord>, FetchError> {
        Ok(self
            .team(team)?
            .iter()
            .filter(|g| g.opponent_id == opponent && g.date >= since)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(team_id: TeamId, opponent_id: TeamId, date: &str, team_score: u32) -> GameRecord {
        GameRecord {
            game_id: format!("{team_id}-{date}"),
            date: date.parse().unwrap(),
            team_id,
            opponent_id,
            team_score,
            opponent_score: 100,
            is_home: true,
        }
    }

    #[tokio::test]
    async fn test_team_games_most_recent_first() {
        let source = FixtureSource::new(
            vec![
                game(1, 2, "2026-01-05", 101),
                game(1, 3, "2026-01-09", 109),
                game(1, 2, "2026-01-07", 107),
            ],
            vec![],
        );
        let games = source.team_games(1, 2).await.unwrap();
        assert_eq!(games.iter().map(|g| g.team_score).collect::<Vec<_>>(), vec![109, 107]);
    }

    #[tokio::test]
    async fn test_unknown_subject_is_not_found() {
        let source = FixtureSource::default();
        assert!(matches!(source.team_games(9, 5).await, Err(FetchError::NotFound(_))));
        assert!(matches!(source.player_games(9, 5).await, Err(FetchError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_head_to_head_respects_lookback() {
        let source = FixtureSource::new(
            vec![
                game(1, 2, "2024-12-01", 95),
                game(1, 2, "2025-11-20", 110),
                game(1, 3, "2026-01-09", 109),
                game(1, 2, "2026-01-07", 107),
            ],
            vec![],
        );
        let since = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let games = source.head_to_head(1, 2, since).await.unwrap();
        assert_eq!(games.len(), 2);
        assert!(games.iter().all(|g| g.opponent_id == 2 && g.date >= since));
    }

    #[test]
    fn test_fixture_from_json() {
        let json = r#"{
            "as_of": "2026-03-01",
            "slate": [{
                "matchup": {
                    "game_id": "g1",
                    "home": {"id": 1, "name": "Boston Celtics"},
                    "away": {"id": 2, "name": "Miami Heat"}
                },
                "markets": {"moneyline": {"home_odds": -180, "away_odds": 155}}
            }]
        }"#;
        let fixture = Fixture::from_json(json).unwrap();
        assert_eq!(fixture.slate.len(), 1);
        assert!(fixture.team_games.is_empty());
        assert_eq!(fixture.slate[0].markets.moneyline.map(|m| m.home_odds), Some(-180));
    }
}
