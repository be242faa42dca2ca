use super::eligibility::{hit_rate_percentage, Window};
use super::odds;
use crate::error::Result;
use crate::feed::types::StatLine;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type TeamId = u32;
pub type PlayerId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamRef {
    pub id: TeamId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: PlayerId,
    pub name: String,
    pub team_id: TeamId,
}

/// One scheduled game on the slate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matchup {
    pub game_id: String,
    pub home: TeamRef,
    pub away: TeamRef,
}

impl Matchup {
    pub fn team(&self, id: TeamId) -> Option<&TeamRef> {
        [&self.home, &self.away].into_iter().find(|t| t.id == id)
    }

    pub fn opponent_of(&self, id: TeamId) -> Option<&TeamRef> {
        if self.home.id == id {
            Some(&self.away)
        } else if self.away.id == id {
            Some(&self.home)
        } else {
            None
        }
    }

    pub fn is_home(&self, id: TeamId) -> bool {
        self.home.id == id
    }
}

impl fmt::Display for Matchup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.away.name, self.home.name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Over,
    Under,
}

impl Direction {
    /// Strict comparison: a value sitting exactly on the line never hits.
    pub fn clears(self, value: f64, line: f64) -> bool {
        match self {
            Direction::Over => value > line,
            Direction::Under => value < line,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Over => "Over",
            Direction::Under => "Under",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropType {
    Points,
    Rebounds,
    Assists,
    Threes,
    Steals,
    Blocks,
    PtsRebAst,
}

impl PropType {
    pub fn value(self, stats: &StatLine) -> f64 {
        match self {
            PropType::Points => stats.points,
            PropType::Rebounds => stats.rebounds,
            PropType::Assists => stats.assists,
            PropType::Threes => stats.threes,
            PropType::Steals => stats.steals,
            PropType::Blocks => stats.blocks,
            PropType::PtsRebAst => stats.points + stats.rebounds + stats.assists,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PropType::Points => "Points",
            PropType::Rebounds => "Rebounds",
            PropType::Assists => "Assists",
            PropType::Threes => "Threes",
            PropType::Steals => "Steals",
            PropType::Blocks => "Blocks",
            PropType::PtsRebAst => "Pts+Reb+Ast",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    PlayerProp,
    Moneyline,
    Spread,
    GameTotal,
    TeamTotal,
}

impl LegKind {
    pub const ALL: [LegKind; 5] = [
        LegKind::PlayerProp,
        LegKind::Moneyline,
        LegKind::Spread,
        LegKind::GameTotal,
        LegKind::TeamTotal,
    ];

    pub fn label(self) -> &'static str {
        match self {
            LegKind::PlayerProp => "Player Prop",
            LegKind::Moneyline => "Moneyline",
            LegKind::Spread => "Spread",
            LegKind::GameTotal => "Game Total",
            LegKind::TeamTotal => "Team Total",
        }
    }
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Hit count for an accepted leg over its ladder window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitRecord {
    pub hits: u32,
    pub window: Window,
}

impl HitRecord {
    pub fn games(&self) -> usize {
        self.window.size()
    }

    pub fn percentage(&self) -> f64 {
        hit_rate_percentage(self.hits, self.games())
    }
}

/// Head-to-head record. Supporting context only; never gates eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadToHead {
    pub wins: u32,
    pub games: u32,
}

impl HeadToHead {
    pub fn losses(&self) -> u32 {
        self.games - self.wins
    }

    pub fn is_favorable(&self) -> bool {
        self.games > 0 && self.wins * 2 > self.games
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Qualification {
    Full,
    Partial,
    Neither,
}

/// Team-total check of the team's own scoring and the opponent's points
/// allowed against the line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamTotalQualification {
    pub window: Window,
    pub team_average: f64,
    pub opponent_allowed_average: f64,
    pub team_qualifies: bool,
    pub opponent_qualifies: bool,
}

impl TeamTotalQualification {
    pub fn status(&self) -> Qualification {
        match (self.team_qualifies, self.opponent_qualifies) {
            (true, true) => Qualification::Full,
            (false, false) => Qualification::Neither,
            _ => Qualification::Partial,
        }
    }
}

/// Kind-specific part of a leg. Each case carries only its own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    PlayerProp {
        player: PlayerRef,
        prop: PropType,
        line: f64,
        direction: Direction,
    },
    Moneyline {
        team: TeamRef,
        head_to_head: Option<HeadToHead>,
    },
    Spread {
        team: TeamRef,
        line: f64,
        average_margin: f64,
    },
    GameTotal {
        line: f64,
        direction: Direction,
        average_total: f64,
    },
    TeamTotal {
        team: TeamRef,
        line: f64,
        direction: Direction,
        average_score: f64,
        qualification: Option<TeamTotalQualification>,
    },
}

/// An accepted proposition. Rejected candidates are never materialised as
/// a `Leg`; generators return `None` for them instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub matchup: Matchup,
    pub selection: Selection,
    pub record: HitRecord,
    /// American odds.
    pub odds: i32,
}

impl Leg {
    pub fn kind(&self) -> LegKind {
        match self.selection {
            Selection::PlayerProp { .. } => LegKind::PlayerProp,
            Selection::Moneyline { .. } => LegKind::Moneyline,
            Selection::Spread { .. } => LegKind::Spread,
            Selection::GameTotal { .. } => LegKind::GameTotal,
            Selection::TeamTotal { .. } => LegKind::TeamTotal,
        }
    }

    pub fn label(&self) -> String {
        match &self.selection {
            Selection::PlayerProp { player, prop, line, direction } => {
                format!("{} {} {:.1} {}", player.name, direction, line, prop.label())
            }
            Selection::Moneyline { team, .. } => format!("{} ML", team.name),
            Selection::Spread { team, line, .. } => format!("{} {:+.1}", team.name, line),
            Selection::GameTotal { line, direction, .. } => {
                format!("{} Game Total {} {:.1}", self.matchup, direction, line)
            }
            Selection::TeamTotal { team, line, direction, .. } => {
                format!("{} Team Total {} {:.1}", team.name, direction, line)
            }
        }
    }

    pub fn percentage(&self) -> f64 {
        self.record.percentage()
    }

    pub fn decimal_odds(&self) -> Result<f64> {
        odds::american_to_decimal(self.odds)
    }

    /// Team whose performance backs this leg, if any.
    pub fn subject_team(&self) -> Option<&TeamRef> {
        match &self.selection {
            Selection::PlayerProp { player, .. } => self.matchup.team(player.team_id),
            Selection::Moneyline { team, .. }
            | Selection::Spread { team, .. }
            | Selection::TeamTotal { team, .. } => Some(team),
            Selection::GameTotal { .. } => None,
        }
    }
}
