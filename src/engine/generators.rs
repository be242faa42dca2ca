//! Leg generators, one per leg kind.
//!
//! Each generator takes the subject's history (most recent first), counts
//! hits over exactly `window` games and runs the ladder. A rejected
//! candidate comes back as `Ok(None)` and is only ever visible in the debug
//! log. Too little history is an error, never a silently shorter window.

use super::availability::{self, Availability, MinutesAnalysis};
use super::caution::{self, CautionResult};
use super::confidence::{self, AltLineFit, Confidence, Context, Venue};
use super::eligibility::{check_window, Verdict, Window, WindowHits};
use super::legs::{
    Direction, HeadToHead, HitRecord, Leg, Matchup, Selection, TeamRef,
};
use super::odds;
use super::projection::{self, ProjectionResult};
use crate::error::{ParlayError, Result};
use crate::feed::types::{GameRecord, PlayerGame, PricedLine, PropMarket};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Deepest history kept as evidence. Matches the longest ladder window.
pub const MAX_HISTORY: usize = 15;

/// Numbers behind an accepted leg, kept for explanations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Per-game values the leg was judged on, most recent first.
    pub values: Vec<f64>,
    /// Hits at the leg's line over every window that fits in `values`.
    pub windows: Vec<WindowHits>,
    /// Points the opponent allowed, team totals only.
    pub opponent_allowed: Vec<f64>,
    pub minutes: Option<MinutesAnalysis>,
    pub projection: Option<ProjectionResult>,
}

impl Evidence {
    pub fn average(&self, window: Window) -> Option<f64> {
        let recent = self.values.get(..window.size())?;
        Some(recent.iter().sum::<f64>() / recent.len() as f64)
    }
}

/// An accepted leg plus what is needed to score and explain it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub leg: Leg,
    pub evidence: Evidence,
    pub context: Context,
}

impl Candidate {
    pub fn confidence(&self) -> Confidence {
        confidence::score(&self.evidence.windows, &self.context)
    }

    pub fn cautions(&self) -> CautionResult {
        caution::assess(&self.leg, &self.context)
    }

    /// Attach the alt-line projection that picked this leg's line.
    pub fn with_projection(mut self, projection: ProjectionResult) -> Self {
        self.context.alt_line = Some(AltLineFit {
            line: projection.line,
            windows: projection.windows.clone(),
        });
        self.evidence.projection = Some(projection);
        self
    }

    /// Record whether the subject's last game was the day before `game_day`.
    pub fn with_rest(mut self, last_played: Option<NaiveDate>, game_day: NaiveDate) -> Self {
        self.context.back_to_back = last_played.is_some_and(|d| caution::is_back_to_back(d, game_day));
        self
    }
}

fn take_window<T>(records: &[T], window: Window) -> Result<&[T]> {
    records
        .get(..window.size())
        .ok_or(ParlayError::InsufficientHistory {
            needed: window.size(),
            available: records.len(),
        })
}

fn ladder(values: &[f64], hit: &impl Fn(f64) -> bool) -> Vec<WindowHits> {
    Window::available(values.len())
        .into_iter()
        .map(|window| WindowHits {
            window,
            hits: values[..window.size()].iter().filter(|&&v| hit(v)).count() as u32,
        })
        .collect()
}

/// Count hits over exactly `window` values and run the ladder.
fn gate(
    subject: &str,
    values: &[f64],
    window: Window,
    hit: impl Fn(f64) -> bool,
) -> Result<Option<(HitRecord, Vec<WindowHits>)>> {
    let recent = take_window(values, window)?;
    let hits = recent.iter().filter(|&&v| hit(v)).count() as u32;
    match check_window(hits, window)? {
        Verdict::Eligible => Ok(Some((HitRecord { hits, window }, ladder(values, &hit)))),
        Verdict::Rejected(reason) => {
            debug!(subject, window = %window, reason = %reason, "leg rejected");
            Ok(None)
        }
    }
}

fn venue(matchup: &Matchup, team_id: u32) -> Venue {
    if matchup.is_home(team_id) {
        Venue::Home
    } else {
        Venue::Road
    }
}

fn recent<T>(records: &[T], value: impl Fn(&T) -> f64) -> Vec<f64> {
    records.iter().take(MAX_HISTORY).map(value).collect()
}

fn average(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len().max(1) as f64
}

pub fn player_prop(
    matchup: &Matchup,
    market: &PropMarket,
    line: PricedLine,
    games: &[PlayerGame],
    window: Window,
) -> Result<Option<Candidate>> {
    odds::american_to_decimal(line.odds)?;
    let subject = format!(
        "{} {} {:.1} {}",
        market.player.name,
        market.direction,
        line.line,
        market.prop.label()
    );

    let minutes: Vec<f64> = recent(games, |g| g.minutes);
    let minutes = match availability::check_player(market.status, &minutes) {
        Availability::Available { minutes, .. } => minutes,
        Availability::Excluded(reason) => {
            debug!(subject = %subject, reason = %reason, "player excluded");
            return Ok(None);
        }
    };

    let values = recent(games, |g| market.prop.value(&g.stats));
    let direction = market.direction;
    let Some((record, windows)) = gate(&subject, &values, window, |v| direction.clears(v, line.line))? else {
        return Ok(None);
    };

    Ok(Some(Candidate {
        leg: Leg {
            matchup: matchup.clone(),
            selection: Selection::PlayerProp {
                player: market.player.clone(),
                prop: market.prop,
                line: line.line,
                direction,
            },
            record,
            odds: line.odds,
        },
        evidence: Evidence {
            values,
            windows,
            minutes: Some(minutes),
            ..Evidence::default()
        },
        context: Context {
            minutes: Some(minutes),
            venue: Some(venue(matchup, market.player.team_id)),
            status: market.status,
            ..Context::default()
        },
    }))
}

/// Win/loss over the window. `head_to_head` is the lookback of games against
/// this opponent and is attached as support only.
pub fn moneyline(
    matchup: &Matchup,
    team: &TeamRef,
    odds: i32,
    games: &[GameRecord],
    head_to_head: &[GameRecord],
    window: Window,
) -> Result<Option<Candidate>> {
    odds::american_to_decimal(odds)?;
    let subject = format!("{} ML", team.name);
    let margins = recent(games, |g| g.margin() as f64);
    let Some((record, windows)) = gate(&subject, &margins, window, |m| m > 0.0)? else {
        return Ok(None);
    };

    let head_to_head = (!head_to_head.is_empty()).then(|| HeadToHead {
        wins: head_to_head.iter().filter(|g| g.won()).count() as u32,
        games: head_to_head.len() as u32,
    });

    Ok(Some(Candidate {
        leg: Leg {
            matchup: matchup.clone(),
            selection: Selection::Moneyline {
                team: team.clone(),
                head_to_head,
            },
            record,
            odds,
        },
        evidence: Evidence {
            values: margins,
            windows,
            ..Evidence::default()
        },
        context: Context {
            h2h_favorable: head_to_head.is_some_and(|h| h.is_favorable()),
            venue: Some(venue(matchup, team.id)),
            ..Context::default()
        },
    }))
}

/// Covered when the margin is strictly greater than `-line`: a -7.5
/// favorite must win by 8+, a +4.5 dog must lose by 4 or fewer or win.
pub fn spread(
    matchup: &Matchup,
    team: &TeamRef,
    line: PricedLine,
    games: &[GameRecord],
    window: Window,
) -> Result<Option<Candidate>> {
    odds::american_to_decimal(line.odds)?;
    let subject = format!("{} {:+.1}", team.name, line.line);
    let margins = recent(games, |g| g.margin() as f64);
    let threshold = -line.line;
    let Some((record, windows)) = gate(&subject, &margins, window, |m| m > threshold)? else {
        return Ok(None);
    };
    let average_margin = average(&margins[..window.size()]);

    Ok(Some(Candidate {
        leg: Leg {
            matchup: matchup.clone(),
            selection: Selection::Spread {
                team: team.clone(),
                line: line.line,
                average_margin,
            },
            record,
            odds: line.odds,
        },
        evidence: Evidence {
            values: margins,
            windows,
            ..Evidence::default()
        },
        context: Context {
            venue: Some(venue(matchup, team.id)),
            ..Context::default()
        },
    }))
}

/// Combined score against the line. `games` is the history of the team the
/// total is judged from (the home side on the slate).
pub fn game_total(
    matchup: &Matchup,
    direction: Direction,
    line: PricedLine,
    games: &[GameRecord],
    window: Window,
) -> Result<Option<Candidate>> {
    odds::american_to_decimal(line.odds)?;
    let subject = format!("{matchup} {direction} {:.1}", line.line);
    let totals = recent(games, |g| g.total() as f64);
    let Some((record, windows)) = gate(&subject, &totals, window, |t| direction.clears(t, line.line))? else {
        return Ok(None);
    };
    let average_total = average(&totals[..window.size()]);

    Ok(Some(Candidate {
        leg: Leg {
            matchup: matchup.clone(),
            selection: Selection::GameTotal {
                line: line.line,
                direction,
                average_total,
            },
            record,
            odds: line.odds,
        },
        evidence: Evidence {
            values: totals,
            windows,
            ..Evidence::default()
        },
        context: Context::default(),
    }))
}

/// The team's own score against the line. When the opponent has enough
/// history, its points allowed are checked too and recorded as a
/// qualification; that never changes eligibility.
pub fn team_total(
    matchup: &Matchup,
    team: &TeamRef,
    direction: Direction,
    line: PricedLine,
    games: &[GameRecord],
    opponent_games: &[GameRecord],
    window: Window,
) -> Result<Option<Candidate>> {
    odds::american_to_decimal(line.odds)?;
    let subject = format!("{} Team Total {direction} {:.1}", team.name, line.line);
    let scores = recent(games, |g| g.team_score as f64);
    let Some((record, windows)) = gate(&subject, &scores, window, |s| direction.clears(s, line.line))? else {
        return Ok(None);
    };
    let average_score = average(&scores[..window.size()]);

    let opponent_allowed = recent(opponent_games, |g| g.opponent_score as f64);
    let qualification =
        match projection::team_total_qualification(&scores, &opponent_allowed, line.line, direction, window) {
            Ok(q) => Some(q),
            Err(ParlayError::InsufficientHistory { available, .. }) => {
                debug!(subject = %subject, available, "opponent history too short for qualification");
                None
            }
            Err(e) => return Err(e),
        };

    Ok(Some(Candidate {
        leg: Leg {
            matchup: matchup.clone(),
            selection: Selection::TeamTotal {
                team: team.clone(),
                line: line.line,
                direction,
                average_score,
                qualification,
            },
            record,
            odds: line.odds,
        },
        evidence: Evidence {
            values: scores,
            windows,
            opponent_allowed,
            ..Evidence::default()
        },
        context: Context {
            venue: Some(venue(matchup, team.id)),
            ..Context::default()
        },
    }))
}
