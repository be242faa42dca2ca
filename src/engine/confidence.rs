//! Deterministic confidence score for an accepted leg.
//!
//! Base score comes from hit consistency across the ladder windows, then
//! context modifiers apply and the result is clamped to 0..=95. Confidence
//! is display-only and never feeds back into eligibility.

use super::availability::{MinutesAnalysis, PlayerStatus, LOW_MINUTES_FRACTION, STABLE_MINUTES_RANGE};
use super::eligibility::{Window, WindowHits};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Confidence never reaches 100.
pub const CONFIDENCE_MAX: u8 = 95;

/// (hits, window, base score). Within a window, a hit count between two
/// entries takes the lower entry's score.
const BASE_SCORES: [(u32, Window, i32); 8] = [
    (5, Window::L5, 70),
    (4, Window::L5, 62),
    (8, Window::L10, 65),
    (7, Window::L10, 58),
    (13, Window::L15, 68),
    (12, Window::L15, 60),
    (11, Window::L15, 56),
    (10, Window::L15, 52),
];

/// Fallback weighting when no window reaches the base table.
const WEIGHTS: [(Window, f64); 3] = [(Window::L5, 0.25), (Window::L10, 0.35), (Window::L15, 0.40)];

const ALT_LINE_CONSISTENCY: i32 = 5;
const MINUTES_STABLE: i32 = 5;
const H2H_ALIGNMENT: i32 = 3;
const HOME_ADVANTAGE: i32 = 2;
const QUESTIONABLE: i32 = -6;
const ONE_LOW_MINUTE_GAME: i32 = -7;
const TWO_LOW_MINUTE_GAMES: i32 = -12;
const ROAD_DISADVANTAGE: i32 = -2;

const MAX_REASONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Venue {
    Home,
    Road,
}

/// Hits of a line that was picked from several alternatives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AltLineFit {
    pub line: f64,
    /// Shortest window first.
    pub windows: Vec<WindowHits>,
}

impl AltLineFit {
    /// Passes the ladder in every window, not only the deciding one.
    pub fn consistent(&self) -> bool {
        !self.windows.is_empty() && self.windows.iter().all(WindowHits::passes)
    }

    /// Lowest-rate window the line fails, if any.
    pub fn weakest_failure(&self) -> Option<WindowHits> {
        self.windows
            .iter()
            .filter(|w| !w.passes())
            .min_by(|a, b| a.rate().total_cmp(&b.rate()))
            .copied()
    }

    /// Best window hit rate minus worst.
    pub fn rate_spread(&self) -> f64 {
        let rates = self.windows.iter().map(WindowHits::rate);
        let max = rates.clone().fold(f64::NEG_INFINITY, f64::max);
        let min = rates.fold(f64::INFINITY, f64::min);
        if self.windows.is_empty() { 0.0 } else { max - min }
    }
}

/// Context known about a leg beyond its hit counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Set only when the line came out of an alt-line projection.
    pub alt_line: Option<AltLineFit>,
    /// Player legs only.
    pub minutes: Option<MinutesAnalysis>,
    pub h2h_favorable: bool,
    pub venue: Option<Venue>,
    pub status: PlayerStatus,
    /// Subject played the day before this game.
    pub back_to_back: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    HighRisk,
    Moonshot,
    Normal,
    Safe,
}

impl Tier {
    pub fn from_score(score: u8) -> Self {
        match score {
            80.. => Tier::Safe,
            60..=79 => Tier::Normal,
            40..=59 => Tier::Moonshot,
            _ => Tier::HighRisk,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::Safe => "Safe",
            Tier::Normal => "Normal",
            Tier::Moonshot => "Moonshot",
            Tier::HighRisk => "High Risk",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Adjustment {
    pub reason: String,
    pub points: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    pub score: u8,
    pub tier: Tier,
    pub base: i32,
    pub adjustments: Vec<Adjustment>,
    pub why_not_higher: Vec<String>,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {} ({})", self.score, CONFIDENCE_MAX, self.tier)
    }
}

fn clamp(score: i32) -> u8 {
    score.clamp(0, CONFIDENCE_MAX as i32) as u8
}

/// Strongest applicable base score. Bases from different windows do not stack.
pub fn base_score(windows: &[WindowHits]) -> i32 {
    let table_best = windows
        .iter()
        .filter_map(|w| {
            BASE_SCORES
                .iter()
                .filter(|(hits, window, _)| *window == w.window && *hits <= w.hits)
                .map(|(_, _, score)| *score)
                .max()
        })
        .max();
    if let Some(score) = table_best {
        return score;
    }

    let (weighted, total_weight) = WEIGHTS
        .iter()
        .filter_map(|(window, weight)| {
            windows
                .iter()
                .find(|w| w.window == *window)
                .map(|w| (w.rate() * 100.0 * weight, *weight))
        })
        .fold((0.0, 0.0), |(sum, total), (v, w)| (sum + v, total + w));
    if total_weight == 0.0 {
        return 0;
    }
    clamp((weighted / total_weight * 0.95).round() as i32) as i32
}

pub fn score(windows: &[WindowHits], context: &Context) -> Confidence {
    let base = base_score(windows);
    let mut adjustments = Vec::new();
    let mut negative_reasons = Vec::new();

    let mut add = |reason: &str, points: i32| {
        adjustments.push(Adjustment {
            reason: reason.to_string(),
            points,
        });
    };

    if context.alt_line.as_ref().is_some_and(AltLineFit::consistent) {
        add("Alt line consistency", ALT_LINE_CONSISTENCY);
    }
    if context.minutes.is_some_and(|m| m.stable) {
        add("Minutes stable", MINUTES_STABLE);
    }
    if context.h2h_favorable {
        add("Head-to-head alignment", H2H_ALIGNMENT);
    }
    if context.venue == Some(Venue::Home) {
        add("Home advantage", HOME_ADVANTAGE);
    }

    if matches!(
        context.status,
        PlayerStatus::Questionable | PlayerStatus::GameTimeDecision | PlayerStatus::Doubtful
    ) {
        add("Questionable or doubtful status", QUESTIONABLE);
        negative_reasons.push(format!("Listed as {} ({QUESTIONABLE})", context.status));
    }
    if let Some(m) = context.minutes {
        let cutoff = format!(
            "under {:.0}% of the {:.1}-minute average",
            LOW_MINUTES_FRACTION * 100.0,
            m.average
        );
        match m.low_minute_games {
            0 => {}
            1 => {
                add("One low-minute game", ONE_LOW_MINUTE_GAME);
                negative_reasons.push(format!("1 game {cutoff} ({ONE_LOW_MINUTE_GAME})"));
            }
            n => {
                add("Two or more low-minute games", TWO_LOW_MINUTE_GAMES);
                negative_reasons.push(format!("{n} games {cutoff} ({TWO_LOW_MINUTE_GAMES})"));
            }
        }
    }
    if context.venue == Some(Venue::Road) {
        add("Road disadvantage", ROAD_DISADVANTAGE);
        negative_reasons.push(format!("Road game ({ROAD_DISADVANTAGE})"));
    }

    let total = base + adjustments.iter().map(|a| a.points).sum::<i32>();
    let score = clamp(total);
    let why_not_higher = why_not_higher(score, base, windows, negative_reasons, context);

    Confidence {
        score,
        tier: Tier::from_score(score),
        base,
        adjustments,
        why_not_higher,
    }
}

/// Every reason names the number behind it.
fn why_not_higher(
    score: u8,
    base: i32,
    windows: &[WindowHits],
    mut reasons: Vec<String>,
    context: &Context,
) -> Vec<String> {
    let unstable_range = context
        .minutes
        .and_then(|m| m.recent_range)
        .filter(|&r| r > STABLE_MINUTES_RANGE);
    if let Some(range) = unstable_range {
        reasons.push(format!(
            "Last-5 minutes range {range:.1} > {STABLE_MINUTES_RANGE:.0}"
        ));
    }
    if let Some(fit) = &context.alt_line {
        if let Some(w) = fit.weakest_failure() {
            reasons.push(format!(
                "Alt line {} clears only {}/{} at {}",
                fit.line,
                w.hits,
                w.window.size(),
                w.window
            ));
        }
    }

    if reasons.is_empty() {
        let weakest = windows
            .iter()
            .min_by(|a, b| a.rate().total_cmp(&b.rate()));
        let reason = match weakest {
            Some(w) if (w.hits as usize) < w.window.size() => format!(
                "Missed {} of the last {} games ({})",
                w.window.size() - w.hits as usize,
                w.window.size(),
                w.window
            ),
            _ if score >= CONFIDENCE_MAX => format!("Capped at {CONFIDENCE_MAX}"),
            _ => format!(
                "Hit history scores {base}, context adds {:+}",
                score as i32 - base
            ),
        };
        reasons.push(reason);
    }
    reasons.truncate(MAX_REASONS);
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::availability::analyze_minutes;

    fn hits(l5: u32, l10: Option<u32>, l15: Option<u32>) -> Vec<WindowHits> {
        let mut out = vec![WindowHits { window: Window::L5, hits: l5 }];
        if let Some(h) = l10 {
            out.push(WindowHits { window: Window::L10, hits: h });
        }
        if let Some(h) = l15 {
            out.push(WindowHits { window: Window::L15, hits: h });
        }
        out
    }

    #[test]
    fn test_base_takes_strongest_window() {
        assert_eq!(base_score(&hits(5, Some(7), Some(10))), 70);
        assert_eq!(base_score(&hits(3, Some(8), Some(11))), 65);
        assert_eq!(base_score(&hits(4, None, None)), 62);
    }

    #[test]
    fn test_base_between_table_entries_uses_lower_entry() {
        // 10/10 sits above the 8/10 entry
        assert_eq!(base_score(&hits(3, Some(10), None)), 65);
        assert_eq!(base_score(&hits(3, Some(9), Some(15))), 68);
    }

    #[test]
    fn test_base_weighted_fallback() {
        // 3/5 only: 60% * 0.95 = 57
        assert_eq!(base_score(&hits(3, None, None)), 57);
        // 3/5, 6/10, 9/15: (60*.25 + 60*.35 + 60*.40) * .95 = 57
        assert_eq!(base_score(&hits(3, Some(6), Some(9))), 57);
        assert_eq!(base_score(&[]), 0);
    }

    fn consistent_alt(line: f64) -> AltLineFit {
        AltLineFit { line, windows: hits(5, Some(8), Some(13)) }
    }

    #[test]
    fn test_score_never_exceeds_ceiling() {
        let context = Context {
            alt_line: Some(consistent_alt(24.5)),
            minutes: Some(analyze_minutes(&[34.0, 35.0, 33.0, 36.0, 34.0])),
            h2h_favorable: true,
            venue: Some(Venue::Home),
            ..Context::default()
        };
        // 70 + 5 + 5 + 3 + 2 = 85
        let result = score(&hits(5, Some(8), Some(13)), &context);
        assert_eq!(result.score, 85);
        assert_eq!(result.tier, Tier::Safe);
        assert_eq!(result.why_not_higher, vec!["Missed 2 of the last 10 games (L10)".to_string()]);

        let stacked = Context { back_to_back: true, ..context };
        assert!(score(&hits(5, Some(10), Some(15)), &stacked).score <= CONFIDENCE_MAX);
    }

    #[test]
    fn test_negative_modifiers_always_apply() {
        // avg 27.7, cutoff 20.75: two low games, last-5 range 36 - 13 = 23
        let minutes = analyze_minutes(&[34.0, 14.0, 35.0, 13.0, 36.0, 34.0]);
        let context = Context {
            minutes: Some(minutes),
            venue: Some(Venue::Road),
            status: PlayerStatus::Questionable,
            ..Context::default()
        };
        // 62 - 6 - 12 - 2 = 42
        let result = score(&hits(4, None, None), &context);
        assert_eq!(result.score, 42);
        assert_eq!(result.tier, Tier::Moonshot);
        assert_eq!(
            result.why_not_higher,
            vec![
                "Listed as questionable (-6)".to_string(),
                "2 games under 75% of the 27.7-minute average (-12)".to_string(),
                "Road game (-2)".to_string(),
                "Last-5 minutes range 23.0 > 8".to_string(),
            ]
        );
    }

    #[test]
    fn test_single_line_leg_has_no_alt_line_reason() {
        let result = score(&hits(4, None, None), &Context::default());
        assert_eq!(result.why_not_higher, vec!["Missed 1 of the last 5 games (L5)".to_string()]);
        assert!(result.why_not_higher.iter().all(|r| !r.contains("Alt line")));
    }

    #[test]
    fn test_inconsistent_alt_line_names_its_weakest_window() {
        let fit = AltLineFit {
            line: 22.5,
            windows: vec![
                WindowHits { window: Window::L5, hits: 2 },
                WindowHits { window: Window::L10, hits: 7 },
            ],
        };
        assert!(!fit.consistent());
        assert!((fit.rate_spread() - 0.3).abs() < 1e-9);
        let context = Context { alt_line: Some(fit.clone()), ..Context::default() };
        let result = score(&fit.windows, &context);
        assert!(result.adjustments.iter().all(|a| a.points != ALT_LINE_CONSISTENCY));
        assert_eq!(result.why_not_higher, vec!["Alt line 22.5 clears only 2/5 at L5".to_string()]);
    }

    #[test]
    fn test_perfect_history_reason_is_numeric() {
        // 5/5 base 70, road -2
        let context = Context { venue: Some(Venue::Road), ..Context::default() };
        let result = score(&hits(5, None, None), &context);
        assert_eq!(result.why_not_higher, vec!["Road game (-2)".to_string()]);

        let result = score(&hits(5, None, None), &Context::default());
        assert_eq!(result.why_not_higher, vec!["Hit history scores 70, context adds +0".to_string()]);
    }

    #[test]
    fn test_tiers() {
        assert_eq!(Tier::from_score(95), Tier::Safe);
        assert_eq!(Tier::from_score(80), Tier::Safe);
        assert_eq!(Tier::from_score(79), Tier::Normal);
        assert_eq!(Tier::from_score(40), Tier::Moonshot);
        assert_eq!(Tier::from_score(39), Tier::HighRisk);
    }

    #[test]
    fn test_display() {
        let result = score(&hits(4, None, None), &Context::default());
        assert_eq!(result.to_string(), "62 / 95 (Normal)");
    }
}
