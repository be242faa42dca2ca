//! Async orchestration: fetch every subject's history concurrently, run the
//! generators, then hand the surviving pool to the assembler.
//!
//! A subject whose fetch fails, or whose history is too short, contributes
//! nothing. It never fails the other subjects.

use crate::engine::assembler::{self, Parlay, ParlayRequest};
use crate::engine::eligibility::Window;
use crate::engine::generators::{self, Candidate, MAX_HISTORY};
use crate::engine::legs::{Matchup, TeamRef};
use crate::engine::projection::{self, ProjectionResult};
use crate::error::{ParlayError, Result};
use crate::feed::types::{GameRecord, GameSlate, PricedLine, PropMarket, SpreadMarket, TeamTotalMarket, TotalMarket};
use crate::feed::{FetchError, GameLogSource};
use chrono::{Duration, NaiveDate};
use futures_util::future::{join_all, BoxFuture, FutureExt};
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

pub const DEFAULT_HEAD_TO_HEAD_DAYS: i64 = 365;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoolOptions {
    pub window: Window,
    /// Slate date; the head-to-head lookback counts back from it.
    pub as_of: NaiveDate,
    /// Games fetched per subject. Never less than the window.
    pub history_depth: usize,
    pub head_to_head_days: i64,
}

impl PoolOptions {
    pub fn new(window: Window, as_of: NaiveDate) -> Self {
        Self {
            window,
            as_of,
            history_depth: MAX_HISTORY,
            head_to_head_days: DEFAULT_HEAD_TO_HEAD_DAYS,
        }
    }

    fn depth(&self) -> usize {
        self.history_depth.max(self.window.size())
    }

    fn head_to_head_since(&self) -> NaiveDate {
        self.as_of - Duration::days(self.head_to_head_days)
    }
}

/// What happened to each subject while building the pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PoolReport {
    pub evaluated: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
}

impl PoolReport {
    pub fn all_failed(&self) -> bool {
        self.evaluated > 0 && self.failed == self.evaluated
    }
}

#[derive(Debug, Error)]
enum SubjectError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Engine(#[from] ParlayError),
}

type SubjectResult = std::result::Result<Option<Candidate>, SubjectError>;

enum Outcome {
    Accepted(Box<Candidate>),
    Rejected,
    Failed,
}

async fn run_subject(subject: String, evaluation: impl Future<Output = SubjectResult>) -> Outcome {
    match evaluation.await {
        Ok(Some(candidate)) => {
            tracing::debug!(subject = %subject, hits = candidate.leg.record.hits, "leg accepted");
            Outcome::Accepted(Box::new(candidate))
        }
        Ok(None) => Outcome::Rejected,
        Err(e) => {
            tracing::warn!(subject = %subject, error = %e, "subject skipped");
            Outcome::Failed
        }
    }
}

/// A single line is used as is; several are alt lines and go through the
/// projection first.
fn pick_line(
    lines: &[PricedLine],
    project: impl FnOnce(&[f64]) -> Result<Option<ProjectionResult>>,
) -> Result<Option<(PricedLine, Option<ProjectionResult>)>> {
    match lines {
        [] => Err(ParlayError::InvalidInput("market has no lines".to_string())),
        [only] => Ok(Some((*only, None))),
        _ => {
            let candidates: Vec<f64> = lines.iter().map(|l| l.line).collect();
            let Some(projection) = project(&candidates)? else {
                return Ok(None);
            };
            let chosen = lines
                .iter()
                .find(|l| l.line == projection.line)
                .copied()
                .ok_or_else(|| ParlayError::InvalidInput(format!("projected line {} not offered", projection.line)))?;
            Ok(Some((chosen, Some(projection))))
        }
    }
}

/// `last_played` is the date of the subject's most recent game.
fn attach(
    candidate: Option<Candidate>,
    projection: Option<ProjectionResult>,
    last_played: Option<NaiveDate>,
    options: &PoolOptions,
) -> Option<Candidate> {
    let candidate = candidate?.with_rest(last_played, options.as_of);
    Some(match projection {
        Some(p) => candidate.with_projection(p),
        None => candidate,
    })
}

fn team_in<'a>(matchup: &'a Matchup, team_id: u32) -> Result<&'a TeamRef> {
    matchup
        .team(team_id)
        .ok_or_else(|| ParlayError::InvalidInput(format!("team {team_id} is not in {matchup}")))
}

async fn moneyline_subject(
    source: &dyn GameLogSource,
    matchup: &Matchup,
    team: &TeamRef,
    odds: i32,
    options: &PoolOptions,
) -> SubjectResult {
    let opponent = matchup
        .opponent_of(team.id)
        .ok_or_else(|| ParlayError::InvalidInput(format!("team {} is not in {matchup}", team.name)))?;
    let (games, head_to_head) = tokio::join!(
        source.team_games(team.id, options.depth()),
        source.head_to_head(team.id, opponent.id, options.head_to_head_since()),
    );
    let games = games?;
    // supporting context only; losing it never excludes the team
    let head_to_head = head_to_head.unwrap_or_else(|e| {
        tracing::debug!(team = %team.name, error = %e, "head-to-head unavailable");
        Vec::new()
    });
    let candidate = generators::moneyline(matchup, team, odds, &games, &head_to_head, options.window)?;
    Ok(attach(candidate, None, games.first().map(|g| g.date), options))
}

async fn spread_subject(
    source: &dyn GameLogSource,
    matchup: &Matchup,
    market: &SpreadMarket,
    options: &PoolOptions,
) -> SubjectResult {
    let team = team_in(matchup, market.team_id)?;
    let games = source.team_games(team.id, options.depth()).await?;
    let margins: Vec<f64> = games.iter().map(|g| g.margin() as f64).collect();
    let Some((line, projection)) = pick_line(&market.lines, |c| projection::select_spread(&margins, c))? else {
        return Ok(None);
    };
    let candidate = generators::spread(matchup, team, line, &games, options.window)?;
    Ok(attach(candidate, projection, games.first().map(|g| g.date), options))
}

async fn game_total_subject(
    source: &dyn GameLogSource,
    matchup: &Matchup,
    market: &TotalMarket,
    options: &PoolOptions,
) -> SubjectResult {
    let games = source.team_games(matchup.home.id, options.depth()).await?;
    let totals: Vec<f64> = games.iter().map(|g| g.total() as f64).collect();
    let Some((line, projection)) =
        pick_line(&market.lines, |c| projection::select(&totals, c, market.direction))?
    else {
        return Ok(None);
    };
    let candidate = generators::game_total(matchup, market.direction, line, &games, options.window)?;
    Ok(attach(candidate, projection, games.first().map(|g| g.date), options))
}

async fn team_total_subject(
    source: &dyn GameLogSource,
    matchup: &Matchup,
    market: &TeamTotalMarket,
    options: &PoolOptions,
) -> SubjectResult {
    let team = team_in(matchup, market.team_id)?;
    let opponent = matchup
        .opponent_of(team.id)
        .ok_or_else(|| ParlayError::InvalidInput(format!("no opponent for {}", team.name)))?;
    let (games, opponent_games) = tokio::join!(
        source.team_games(team.id, options.depth()),
        source.team_games(opponent.id, options.depth()),
    );
    let games = games?;
    let opponent_games: Vec<GameRecord> = opponent_games.unwrap_or_else(|e| {
        tracing::debug!(team = %opponent.name, error = %e, "opponent history unavailable");
        Vec::new()
    });
    let scores: Vec<f64> = games.iter().map(|g| g.team_score as f64).collect();
    let Some((line, projection)) =
        pick_line(&market.lines, |c| projection::select(&scores, c, market.direction))?
    else {
        return Ok(None);
    };
    let candidate = generators::team_total(
        matchup,
        team,
        market.direction,
        line,
        &games,
        &opponent_games,
        options.window,
    )?;
    Ok(attach(candidate, projection, games.first().map(|g| g.date), options))
}

async fn prop_subject(
    source: &dyn GameLogSource,
    matchup: &Matchup,
    market: &PropMarket,
    options: &PoolOptions,
) -> SubjectResult {
    team_in(matchup, market.player.team_id)?;
    let games = source.player_games(market.player.id, options.depth()).await?;
    let values: Vec<f64> = games.iter().map(|g| market.prop.value(&g.stats)).collect();
    let Some((line, projection)) =
        pick_line(&market.lines, |c| projection::select(&values, c, market.direction))?
    else {
        return Ok(None);
    };
    let candidate = generators::player_prop(matchup, market, line, &games, options.window)?;
    Ok(attach(candidate, projection, games.first().map(|g| g.date), options))
}

fn subjects<'a>(
    source: &'a dyn GameLogSource,
    game: &'a GameSlate,
    options: &'a PoolOptions,
) -> Vec<BoxFuture<'a, Outcome>> {
    let matchup = &game.matchup;
    let markets = &game.markets;
    let mut futures: Vec<BoxFuture<'a, Outcome>> = Vec::new();

    if let Some(ml) = markets.moneyline {
        for (team, odds) in [(&matchup.home, ml.home_odds), (&matchup.away, ml.away_odds)] {
            futures.push(
                run_subject(
                    format!("{} ML", team.name),
                    moneyline_subject(source, matchup, team, odds, options),
                )
                .boxed(),
            );
        }
    }
    for market in &markets.spreads {
        futures.push(
            run_subject(
                format!("{matchup} spread team {}", market.team_id),
                spread_subject(source, matchup, market, options),
            )
            .boxed(),
        );
    }
    for market in &markets.game_totals {
        futures.push(
            run_subject(
                format!("{matchup} game total {}", market.direction),
                game_total_subject(source, matchup, market, options),
            )
            .boxed(),
        );
    }
    for market in &markets.team_totals {
        futures.push(
            run_subject(
                format!("{matchup} team total {} {}", market.team_id, market.direction),
                team_total_subject(source, matchup, market, options),
            )
            .boxed(),
        );
    }
    for market in &markets.props {
        futures.push(
            run_subject(
                format!("{} {} {}", market.player.name, market.direction, market.prop.label()),
                prop_subject(source, matchup, market, options),
            )
            .boxed(),
        );
    }
    futures
}

/// Evaluate every subject on the slate concurrently. The returned pool holds
/// only accepted candidates, in slate order.
pub async fn build_pool(
    source: &dyn GameLogSource,
    slate: &[GameSlate],
    options: &PoolOptions,
) -> (Vec<Candidate>, PoolReport) {
    let futures: Vec<_> = slate
        .iter()
        .flat_map(|game| subjects(source, game, options))
        .collect();

    let mut report = PoolReport {
        evaluated: futures.len(),
        ..PoolReport::default()
    };
    let mut pool = Vec::new();
    for outcome in join_all(futures).await {
        match outcome {
            Outcome::Accepted(candidate) => {
                report.accepted += 1;
                pool.push(*candidate);
            }
            Outcome::Rejected => report.rejected += 1,
            Outcome::Failed => report.failed += 1,
        }
    }

    if report.all_failed() {
        tracing::error!(subjects = report.evaluated, "every subject failed to evaluate");
    } else {
        tracing::info!(
            evaluated = report.evaluated,
            accepted = report.accepted,
            rejected = report.rejected,
            failed = report.failed,
            window = %options.window,
            "candidate pool built"
        );
    }
    (pool, report)
}

/// Build the pool for the request's window and assemble a parlay from it.
pub async fn generate_parlay(
    source: &dyn GameLogSource,
    slate: &[GameSlate],
    request: &ParlayRequest,
    options: &PoolOptions,
) -> Result<(Parlay, PoolReport)> {
    let options = PoolOptions {
        window: request.window,
        ..*options
    };
    let (pool, report) = build_pool(source, slate, &options).await;
    let parlay = assembler::assemble(pool, request)?;
    Ok((parlay, report))
}
