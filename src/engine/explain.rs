//! Plain-text justification for accepted legs and whole parlays.
//!
//! Every statement carries the number behind it. No markup, no randomness:
//! the same leg and evidence always produce the same text.

use super::assembler::{Parlay, ParlayLeg};
use super::caution::CautionResult;
use super::confidence::CONFIDENCE_MAX;
use super::eligibility::{hit_rate_percentage, WindowHits};
use super::generators::Evidence;
use super::legs::{Direction, Leg, Qualification, Selection, TeamTotalQualification};
use super::odds;
use super::projection::{LineEvaluation, ProjectionResult};

/// Whole numbers without a decimal, everything else to one place.
fn num(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        format!("{value:.1}")
    }
}

fn signed(value: f64) -> String {
    if value > 0.0 {
        format!("+{}", num(value))
    } else {
        num(value)
    }
}

fn window_hits(w: &WindowHits) -> String {
    let games = w.window.size();
    format!(
        "{}: {}/{} ({:.1}%)",
        w.window,
        w.hits,
        games,
        hit_rate_percentage(w.hits, games)
    )
}

fn averages_line(label: &str, evidence: &Evidence, signed_values: bool) -> Option<String> {
    let parts: Vec<String> = evidence
        .windows
        .iter()
        .filter_map(|w| {
            let avg = evidence.average(w.window)?;
            let shown = if signed_values { signed(round1(avg)) } else { format!("{avg:.1}") };
            Some(format!("{} {}", w.window, shown))
        })
        .collect();
    (!parts.is_empty()).then(|| format!("{label}: {}", parts.join(", ")))
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn recent_line(leg: &Leg, evidence: &Evidence) -> Option<String> {
    let games = leg.record.games();
    let recent = evidence.values.get(..games)?;
    let shown: Vec<String> = recent.iter().map(|&v| num(v)).collect();
    Some(format!("Last {games} (most recent first): {}", shown.join(", ")))
}

fn qualification_lines(q: &TeamTotalQualification, line: f64, direction: Direction) -> Vec<String> {
    let cmp = match direction {
        Direction::Over => ">=",
        Direction::Under => "<=",
    };
    let verdict = |ok: bool| if ok { "qualifies" } else { "does not qualify" };
    let status = match q.status() {
        Qualification::Full => "full (team and opponent)",
        Qualification::Partial => "partial (one side only)",
        Qualification::Neither => "none",
    };
    vec![
        format!(
            "Team scoring ({}): average {:.1} {} (needs {} {})",
            q.window,
            q.team_average,
            verdict(q.team_qualifies),
            cmp,
            num(line)
        ),
        format!(
            "Opponent defense ({}): allows {:.1} {} (needs {} {})",
            q.window,
            q.opponent_allowed_average,
            verdict(q.opponent_qualifies),
            cmp,
            num(line)
        ),
        format!("Qualification: {status}"),
    ]
}

fn alternative_line(alt: &LineEvaluation, chosen: &ProjectionResult) -> String {
    let windows: Vec<String> = alt
        .windows
        .iter()
        .map(|w| format!("{} {}/{}", w.window, w.hits, w.window.size()))
        .collect();
    let head = format!(
        "{}: {}, consistency {:.1}%",
        num(alt.line),
        windows.join(", "),
        alt.consistency * 100.0
    );
    let chosen_consistency = chosen
        .alternatives
        .iter()
        .find(|a| a.line == chosen.line)
        .map(|a| a.consistency)
        .unwrap_or(0.0);
    let outcome = if alt.line == chosen.line {
        "selected".to_string()
    } else if let Some(reason) = &alt.rejection {
        format!("rejected: {reason}")
    } else if alt.consistency < chosen_consistency {
        format!(
            "not selected: consistency {:.1}% below {:.1}%",
            alt.consistency * 100.0,
            chosen_consistency * 100.0
        )
    } else {
        format!(
            "not selected: same consistency, {} is tighter to the average",
            num(chosen.line)
        )
    };
    format!("{head} - {outcome}")
}

fn projection_lines(projection: &ProjectionResult) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(window) = projection.deciding_window() {
        lines.push(format!(
            "Alt lines considered ({} checked against the ladder, consistency = lowest hit rate across windows):",
            window
        ));
    }
    for alt in &projection.alternatives {
        lines.push(format!("  {}", alternative_line(alt, projection)));
    }
    let averages: Vec<String> = projection
        .averages
        .iter()
        .map(|a| format!("{} {:.1}", a.window, a.average))
        .collect();
    if !averages.is_empty() {
        lines.push(format!("Trailing averages: {}", averages.join(", ")));
    }
    lines
}

/// Justification for one accepted leg.
pub fn explain(leg: &Leg, evidence: &Evidence) -> String {
    let mut lines = vec![
        format!("{} ({:+})", leg.label(), leg.odds),
        format!("Game: {}", leg.matchup),
        format!(
            "Hit rate: {}/{} ({:.1}%) over the last {} games, ladder needs {}/{}",
            leg.record.hits,
            leg.record.games(),
            leg.percentage(),
            leg.record.games(),
            leg.record.window.threshold(),
            leg.record.games()
        ),
    ];

    let other_windows: Vec<String> = evidence
        .windows
        .iter()
        .filter(|w| w.window != leg.record.window)
        .map(window_hits)
        .collect();
    if !other_windows.is_empty() {
        lines.push(format!("Other windows: {}", other_windows.join(", ")));
    }

    match &leg.selection {
        Selection::PlayerProp { prop, .. } => {
            lines.extend(averages_line(&format!("Average {}", prop.label()), evidence, false));
            if let Some(m) = &evidence.minutes {
                let range = match m.recent_range {
                    Some(r) if m.stable => format!("last-5 range {r:.1} (within 8)"),
                    Some(r) => format!("last-5 range {r:.1} (wider than 8)"),
                    None => "fewer than 5 games for a range".to_string(),
                };
                lines.push(format!(
                    "Minutes: average {:.1}, {} low-minute game(s), {}",
                    m.average, m.low_minute_games, range
                ));
            }
        }
        Selection::Moneyline { head_to_head, .. } => {
            let games = leg.record.games() as u32;
            lines.push(format!(
                "Record: {}-{} over the last {} games",
                leg.record.hits,
                games - leg.record.hits,
                games
            ));
            lines.extend(averages_line("Average margin", evidence, true));
            match head_to_head {
                Some(h2h) => lines.push(format!(
                    "Head-to-head (supporting only, not used for eligibility): {}-{} in {} meeting(s)",
                    h2h.wins,
                    h2h.losses(),
                    h2h.games
                )),
                None => lines.push(
                    "Head-to-head (supporting only, not used for eligibility): 0 meetings in lookback"
                        .to_string(),
                ),
            }
        }
        Selection::Spread { line, average_margin, .. } => {
            lines.push(format!(
                "Covers when margin > {}; average margin {} over the window",
                signed(-line),
                signed(round1(*average_margin))
            ));
            lines.extend(averages_line("Average margin", evidence, true));
        }
        Selection::GameTotal { line, average_total, .. } => {
            lines.push(format!(
                "Average combined score {:.1} vs line {}",
                average_total,
                num(*line)
            ));
        }
        Selection::TeamTotal {
            line,
            direction,
            average_score,
            qualification,
            ..
        } => {
            lines.push(format!(
                "Average team score {:.1} vs line {}",
                average_score,
                num(*line)
            ));
            if let Some(q) = qualification {
                lines.extend(qualification_lines(q, *line, *direction));
            }
        }
    }

    lines.extend(recent_line(leg, evidence));
    if let Some(projection) = &evidence.projection {
        lines.extend(projection_lines(projection));
    }
    lines.join("\n")
}

/// At most this many caution messages ride inline on a summary line.
const INLINE_CAUTIONS: usize = 3;

fn caution_inline(caution: &CautionResult) -> String {
    if caution.is_empty() {
        return String::new();
    }
    let shown: Vec<&str> = caution.messages().take(INLINE_CAUTIONS).collect();
    let more = caution.cautions.len().saturating_sub(INLINE_CAUTIONS);
    let tail = if more > 0 { format!(", +{more} more") } else { String::new() };
    format!(" [{} caution: {}{}]", caution.level, shown.join("; "), tail)
}

/// Caution block for one leg, empty when nothing applies.
pub fn caution_lines(caution: &CautionResult) -> Vec<String> {
    if caution.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![format!(
        "Caution: {} (severity {})",
        caution.level, caution.total_severity
    )];
    lines.extend(caution.messages().map(|m| format!("  - {m}")));
    lines
}

/// [`explain`] for an assembled leg, followed by its cautions and the
/// confidence score with what held it back.
pub fn explain_leg(pl: &ParlayLeg) -> String {
    let mut lines = vec![explain(&pl.leg, &pl.evidence)];
    lines.extend(caution_lines(&pl.caution));
    lines.push(format!("Confidence {}", pl.confidence));
    lines.extend(
        pl.confidence
            .adjustments
            .iter()
            .map(|a| format!("  {:+} {}", a.points, a.reason)),
    );
    if !pl.confidence.why_not_higher.is_empty() {
        lines.push(format!(
            "Not higher because: {}",
            pl.confidence.why_not_higher.join("; ")
        ));
    }
    lines.join("\n")
}

/// Summary across all legs of an assembled parlay.
pub fn explain_parlay(parlay: &Parlay) -> String {
    let mut lines = vec![format!("{}-Leg Parlay ({} ladder)", parlay.legs.len(), parlay.window)];

    lines.extend(parlay.legs.iter().enumerate().map(|(i, pl)| {
        format!(
            "{}. {} ({:+}) - {}/{} ({:.1}%), confidence {}/{} {}{}{}",
            i + 1,
            pl.leg.label(),
            pl.leg.odds,
            pl.leg.record.hits,
            pl.leg.record.games(),
            pl.leg.percentage(),
            pl.confidence.score,
            CONFIDENCE_MAX,
            pl.confidence.tier,
            if pl.high_confidence { ", high confidence" } else { "" },
            caution_inline(&pl.caution)
        )
    }));

    let composition: Vec<String> = parlay
        .composition()
        .into_iter()
        .map(|(kind, n)| format!("{n} {kind}"))
        .collect();
    lines.push(format!("Composition: {}", composition.join(", ")));

    let (mut high, mut mid, mut low) = (0, 0, 0);
    for pl in &parlay.legs {
        match pl.confidence.score {
            80.. => high += 1,
            60..=79 => mid += 1,
            _ => low += 1,
        }
    }
    lines.push(format!("Confidence: {high} at 80+, {mid} at 60-79, {low} below 60"));
    let flagged = parlay.legs.iter().filter(|pl| !pl.caution.is_empty()).count();
    if flagged > 0 {
        lines.push(format!("Cautions: {flagged} of {} legs flagged", parlay.legs.len()));
    }
    lines.push(format!(
        "Correlated legs (sharing a game): {}",
        parlay.correlated_legs()
    ));

    let implied = 100.0 / parlay.odds.decimal;
    lines.push(format!(
        "Combined odds: {:+} ({:.2} decimal, {:.1}% implied)",
        parlay.odds.american, parlay.odds.decimal, implied
    ));
    let per_leg: Vec<String> = parlay
        .legs
        .iter()
        .filter_map(|pl| odds::implied_probability(pl.leg.odds).ok())
        .map(|p| format!("{:.1}%", p * 100.0))
        .collect();
    lines.push(format!("Per-leg implied probability: {}", per_leg.join(", ")));
    lines.push(format!(
        "Wager ${:.2}, potential win ${:.2}, total payout ${:.2}",
        parlay.wager, parlay.odds.potential_win, parlay.odds.payout
    ));
    lines.join("\n")
}
