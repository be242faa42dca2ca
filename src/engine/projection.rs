//! Alt-line selection by consistency across the ladder windows.
//!
//! Each candidate line is scored by its *worst* hit rate over the trailing
//! 5/10/15-game windows that fit in the data, so a line that only clears in
//! a hot recent stretch loses to one that clears everywhere. Only lines that
//! pass the ladder at the longest available window can be chosen; among the
//! most consistent of those, the tightest line relative to the trailing
//! average wins.

use super::confidence;
use super::eligibility::{check_window, Verdict, Window, WindowHits};
use super::legs::{Direction, TeamTotalQualification};
use crate::error::{ParlayError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

const CONSISTENCY_EPSILON: f64 = 1e-9;

/// One candidate line scored over every available window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEvaluation {
    pub line: f64,
    /// Shortest window first.
    pub windows: Vec<WindowHits>,
    /// Minimum hit rate across `windows`.
    pub consistency: f64,
    /// Why the line failed the ladder at the longest window.
    pub rejection: Option<String>,
}

impl LineEvaluation {
    pub fn is_eligible(&self) -> bool {
        self.rejection.is_none()
    }

    /// Hit count at the longest evaluated window.
    pub fn deciding(&self) -> Option<WindowHits> {
        self.windows.last().copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowAverage {
    pub window: Window,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub line: f64,
    pub direction: Direction,
    /// Base confidence of the chosen line's hit windows.
    pub confidence: u8,
    pub windows: Vec<WindowHits>,
    pub averages: Vec<WindowAverage>,
    /// Every line considered, chosen line included, in ascending order.
    pub alternatives: Vec<LineEvaluation>,
}

impl ProjectionResult {
    /// Longest window the selection was decided on.
    pub fn deciding_window(&self) -> Option<Window> {
        self.windows.last().map(|w| w.window)
    }

    /// Chosen line passes the ladder in every window, not only the longest.
    pub fn clears_every_window(&self) -> bool {
        !self.windows.is_empty() && self.windows.iter().all(WindowHits::passes)
    }

    pub fn rejected_alternatives(&self) -> impl Iterator<Item = &LineEvaluation> {
        self.alternatives.iter().filter(|a| !a.is_eligible())
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn validate(values: &[f64], candidates: &[f64]) -> Result<Vec<f64>> {
    if candidates.is_empty() {
        return Err(ParlayError::InvalidInput("no candidate lines".to_string()));
    }
    if let Some(bad) = values.iter().chain(candidates).find(|v| !v.is_finite()) {
        return Err(ParlayError::InvalidInput(format!("non-finite value {bad}")));
    }
    let mut lines = candidates.to_vec();
    lines.sort_by(f64::total_cmp);
    lines.dedup();
    Ok(lines)
}

fn evaluate(values: &[f64], line: f64, direction: Direction, windows: &[Window]) -> Result<LineEvaluation> {
    let hits: Vec<WindowHits> = windows
        .iter()
        .map(|&window| WindowHits {
            window,
            hits: values[..window.size()]
                .iter()
                .filter(|&&v| direction.clears(v, line))
                .count() as u32,
        })
        .collect();
    let consistency = hits.iter().map(WindowHits::rate).fold(f64::INFINITY, f64::min);
    let rejection = match hits.last() {
        Some(deciding) => match check_window(deciding.hits, deciding.window)? {
            Verdict::Eligible => None,
            Verdict::Rejected(reason) => Some(reason),
        },
        None => Some("No window available".to_string()),
    };
    Ok(LineEvaluation {
        line,
        windows: hits,
        consistency,
        rejection,
    })
}

/// Sort key: lines on the far side of the average come last, then by distance.
fn tightness(line: f64, average: f64, direction: Direction) -> (bool, f64) {
    let beyond = match direction {
        Direction::Over => line > average,
        Direction::Under => line < average,
    };
    (beyond, (line - average).abs())
}

/// Pick the most consistent eligible line from `candidates`.
///
/// `values` is most recent first. `Ok(None)` means no candidate passes the
/// ladder and the subject yields no leg.
pub fn select(values: &[f64], candidates: &[f64], direction: Direction) -> Result<Option<ProjectionResult>> {
    let lines = validate(values, candidates)?;
    let windows = Window::available(values.len());
    let Some(&longest) = windows.last() else {
        return Err(ParlayError::InsufficientHistory {
            needed: Window::L5.size(),
            available: values.len(),
        });
    };

    let alternatives = lines
        .iter()
        .map(|&line| evaluate(values, line, direction, &windows))
        .collect::<Result<Vec<_>>>()?;

    let average = mean(&values[..longest.size()]);
    let best = alternatives
        .iter()
        .filter(|a| a.is_eligible())
        .map(|a| a.consistency)
        .fold(f64::NEG_INFINITY, f64::max);

    let chosen = alternatives
        .iter()
        .filter(|a| a.is_eligible() && a.consistency >= best - CONSISTENCY_EPSILON)
        .min_by(|a, b| {
            let (beyond_a, dist_a) = tightness(a.line, average, direction);
            let (beyond_b, dist_b) = tightness(b.line, average, direction);
            beyond_a.cmp(&beyond_b).then(dist_a.total_cmp(&dist_b))
        })
        .cloned();

    let Some(chosen) = chosen else {
        debug!(
            direction = %direction,
            candidates = lines.len(),
            window = %longest,
            "no candidate line clears the ladder"
        );
        return Ok(None);
    };

    let averages = windows
        .iter()
        .map(|&window| WindowAverage {
            window,
            average: mean(&values[..window.size()]),
        })
        .collect();

    Ok(Some(ProjectionResult {
        line: chosen.line,
        direction,
        confidence: confidence::base_score(&chosen.windows).clamp(0, confidence::CONFIDENCE_MAX as i32) as u8,
        windows: chosen.windows,
        averages,
        alternatives,
    }))
}

/// Spread variant of [`select`]: `margins` are subject-minus-opponent scores
/// and a spread `s` is covered when the margin is strictly greater than `-s`.
pub fn select_spread(margins: &[f64], spreads: &[f64]) -> Result<Option<ProjectionResult>> {
    let thresholds: Vec<f64> = spreads.iter().map(|s| -s).collect();
    let Some(mut result) = select(margins, &thresholds, Direction::Over)? else {
        return Ok(None);
    };
    result.line = -result.line;
    for alt in &mut result.alternatives {
        alt.line = -alt.line;
    }
    result.alternatives.sort_by(|a, b| a.line.total_cmp(&b.line));
    Ok(Some(result))
}

/// Compare the team's scoring and the opponent's points allowed against the
/// line over `window`. Over qualifies on `average >= line`, under on
/// `average <= line`.
pub fn team_total_qualification(
    team_scores: &[f64],
    opponent_allowed: &[f64],
    line: f64,
    direction: Direction,
    window: Window,
) -> Result<TeamTotalQualification> {
    let size = window.size();
    for series in [team_scores, opponent_allowed] {
        if series.len() < size {
            return Err(ParlayError::InsufficientHistory {
                needed: size,
                available: series.len(),
            });
        }
    }
    let team_average = mean(&team_scores[..size]);
    let opponent_allowed_average = mean(&opponent_allowed[..size]);
    let qualifies = |average: f64| match direction {
        Direction::Over => average >= line,
        Direction::Under => average <= line,
    };
    Ok(TeamTotalQualification {
        window,
        team_average,
        opponent_allowed_average,
        team_qualifies: qualifies(team_average),
        opponent_qualifies: qualifies(opponent_allowed_average),
    })
}
