//! Caution flags for accepted legs.
//!
//! Cautions are shown next to a pick and in its explanation. They never
//! gate eligibility; a player who should not be picked at all is removed
//! earlier by the availability check.

use super::availability::{MinutesAnalysis, PlayerStatus, LOW_MINUTES_FRACTION};
use super::confidence::{AltLineFit, Context, Venue};
use super::legs::{Leg, Selection};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Absolute spread at or above which the line is flagged.
pub const LARGE_SPREAD: f64 = 10.0;
/// Average cover margin below which historical covers are thin.
pub const THIN_COVER_MARGIN: f64 = 2.0;
/// Max gap between the best and worst window hit rate of an alt line.
pub const ALT_LINE_RATE_SPREAD: f64 = 0.15;

/// Total severity at which stacked mild triggers become high.
const HIGH_SEVERITY: u8 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CautionLevel {
    #[default]
    None,
    Mild,
    High,
}

impl CautionLevel {
    pub fn label(self) -> &'static str {
        match self {
            CautionLevel::None => "none",
            CautionLevel::Mild => "mild",
            CautionLevel::High => "high",
        }
    }
}

impl fmt::Display for CautionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Questionable,
    Doubtful,
    GameTimeDecision,
    LowMinuteGame,
    LowMinuteGames,
    LastGameLowMinutes,
    BackToBack,
    RoadGame,
    LargeSpread,
    ThinCoverMargin,
    AltLineVolatility,
}

impl Trigger {
    pub fn severity(self) -> u8 {
        match self {
            Trigger::Doubtful | Trigger::LowMinuteGames | Trigger::AltLineVolatility => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caution {
    pub trigger: Trigger,
    pub message: String,
}

impl Caution {
    fn new(trigger: Trigger, message: impl Into<String>) -> Self {
        Self {
            trigger,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CautionResult {
    pub level: CautionLevel,
    pub cautions: Vec<Caution>,
    pub total_severity: u8,
}

impl CautionResult {
    /// One mild trigger is mild. Any severe trigger, or mild triggers
    /// stacking to a total of 3, is high.
    pub fn from_cautions(cautions: Vec<Caution>) -> Self {
        let total_severity: u8 = cautions.iter().map(|c| c.trigger.severity()).sum();
        let level = if cautions.is_empty() {
            CautionLevel::None
        } else if total_severity >= HIGH_SEVERITY || cautions.iter().any(|c| c.trigger.severity() >= 2) {
            CautionLevel::High
        } else {
            CautionLevel::Mild
        };
        Self {
            level,
            cautions,
            total_severity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cautions.is_empty()
    }

    pub fn has(&self, trigger: Trigger) -> bool {
        self.cautions.iter().any(|c| c.trigger == trigger)
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.cautions.iter().map(|c| c.message.as_str())
    }
}

/// The subject's previous game was the day before `game_day`.
pub fn is_back_to_back(last_played: NaiveDate, game_day: NaiveDate) -> bool {
    (game_day - last_played).num_days() == 1
}

fn low_minutes_cutoff(m: &MinutesAnalysis) -> String {
    format!(
        "under {:.0}% of the {:.1}-minute average",
        LOW_MINUTES_FRACTION * 100.0,
        m.average
    )
}

pub fn player_cautions(status: PlayerStatus, minutes: Option<&MinutesAnalysis>) -> Vec<Caution> {
    let mut out = Vec::new();
    match status {
        PlayerStatus::Doubtful => out.push(Caution::new(Trigger::Doubtful, "Listed as doubtful")),
        PlayerStatus::Questionable => {
            out.push(Caution::new(Trigger::Questionable, "Listed as questionable"))
        }
        PlayerStatus::GameTimeDecision => {
            out.push(Caution::new(Trigger::GameTimeDecision, "Game-time decision"))
        }
        _ => {}
    }

    if let Some(m) = minutes {
        match m.low_minute_games {
            0 => {}
            1 => out.push(Caution::new(
                Trigger::LowMinuteGame,
                format!("1 game {}", low_minutes_cutoff(m)),
            )),
            n => out.push(Caution::new(
                Trigger::LowMinuteGames,
                format!("{n} games {}", low_minutes_cutoff(m)),
            )),
        }
        if let Some(last) = m.last_game.filter(|_| m.last_game_low()) {
            out.push(Caution::new(
                Trigger::LastGameLowMinutes,
                format!("Last game {last:.1} minutes, {}", low_minutes_cutoff(m)),
            ));
        }
    }
    out
}

pub fn schedule_cautions(venue: Option<Venue>, back_to_back: bool) -> Vec<Caution> {
    let mut out = Vec::new();
    if back_to_back {
        out.push(Caution::new(Trigger::BackToBack, "Back-to-back: played 1 day ago"));
    }
    if venue == Some(Venue::Road) {
        out.push(Caution::new(Trigger::RoadGame, "Road game"));
    }
    out
}

/// Cover margin is the average margin beyond what the spread requires.
pub fn spread_cautions(line: f64, average_margin: f64) -> Vec<Caution> {
    let mut out = Vec::new();
    if line.abs() >= LARGE_SPREAD {
        out.push(Caution::new(
            Trigger::LargeSpread,
            format!("Spread {line:+.1} is {LARGE_SPREAD:.0}+ points"),
        ));
    }
    let cover_margin = average_margin + line;
    if cover_margin.abs() < THIN_COVER_MARGIN {
        out.push(Caution::new(
            Trigger::ThinCoverMargin,
            format!("Average cover margin {cover_margin:+.1}, inside {THIN_COVER_MARGIN:.1}"),
        ));
    }
    out
}

pub fn alt_line_cautions(fit: &AltLineFit) -> Vec<Caution> {
    let spread = fit.rate_spread();
    if spread <= ALT_LINE_RATE_SPREAD {
        return Vec::new();
    }
    vec![Caution::new(
        Trigger::AltLineVolatility,
        format!(
            "Alt line {} hit rate varies {:.0} points across windows (over {:.0})",
            fit.line,
            spread * 100.0,
            ALT_LINE_RATE_SPREAD * 100.0
        ),
    )]
}

/// Every caution that applies to an accepted leg.
pub fn assess(leg: &Leg, context: &Context) -> CautionResult {
    let mut cautions = Vec::new();
    if let Selection::PlayerProp { .. } = leg.selection {
        cautions.extend(player_cautions(context.status, context.minutes.as_ref()));
    }
    cautions.extend(schedule_cautions(context.venue, context.back_to_back));
    if let Selection::Spread { line, average_margin, .. } = leg.selection {
        cautions.extend(spread_cautions(line, average_margin));
    }
    if let Some(fit) = &context.alt_line {
        cautions.extend(alt_line_cautions(fit));
    }
    CautionResult::from_cautions(cautions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::availability::analyze_minutes;
    use crate::engine::eligibility::{Window, WindowHits};
    use crate::engine::legs::{HitRecord, Matchup, TeamRef};

    fn spread_leg(line: f64, average_margin: f64) -> Leg {
        Leg {
            matchup: Matchup {
                game_id: "g1".to_string(),
                home: TeamRef { id: 1, name: "Boston Celtics".to_string() },
                away: TeamRef { id: 2, name: "Miami Heat".to_string() },
            },
            selection: Selection::Spread {
                team: TeamRef { id: 1, name: "Boston Celtics".to_string() },
                line,
                average_margin,
            },
            record: HitRecord { hits: 3, window: Window::L5 },
            odds: -110,
        }
    }

    #[test]
    fn test_no_triggers_is_none() {
        let result = CautionResult::from_cautions(Vec::new());
        assert_eq!(result.level, CautionLevel::None);
        assert_eq!(result.total_severity, 0);
        assert!(result.is_empty());
    }

    #[test]
    fn test_single_mild_trigger() {
        let result = CautionResult::from_cautions(schedule_cautions(Some(Venue::Road), false));
        assert_eq!(result.level, CautionLevel::Mild);
        assert_eq!(result.messages().collect::<Vec<_>>(), vec!["Road game"]);
    }

    #[test]
    fn test_mild_triggers_stack_to_high() {
        let two = CautionResult::from_cautions(schedule_cautions(Some(Venue::Road), true));
        assert_eq!((two.level, two.total_severity), (CautionLevel::Mild, 2));

        let mut three = schedule_cautions(Some(Venue::Road), true);
        three.extend(player_cautions(PlayerStatus::Questionable, None));
        let three = CautionResult::from_cautions(three);
        assert_eq!((three.level, three.total_severity), (CautionLevel::High, 3));
    }

    #[test]
    fn test_severe_trigger_alone_is_high() {
        let result = CautionResult::from_cautions(player_cautions(PlayerStatus::Doubtful, None));
        assert_eq!(result.level, CautionLevel::High);
        assert!(result.has(Trigger::Doubtful));
    }

    #[test]
    fn test_player_minutes_triggers() {
        // avg 27.5, cutoff 20.6: two low games, the latest one included
        let minutes = analyze_minutes(&[14.0, 34.0, 13.0, 35.0, 36.0, 33.0]);
        let cautions = player_cautions(PlayerStatus::GameTimeDecision, Some(&minutes));
        let triggers: Vec<Trigger> = cautions.iter().map(|c| c.trigger).collect();
        assert_eq!(
            triggers,
            vec![Trigger::GameTimeDecision, Trigger::LowMinuteGames, Trigger::LastGameLowMinutes]
        );
        assert_eq!(cautions[1].message, "2 games under 75% of the 27.5-minute average");
        assert_eq!(
            cautions[2].message,
            "Last game 14.0 minutes, under 75% of the 27.5-minute average"
        );
    }

    #[test]
    fn test_spread_triggers() {
        // needs 10.5, averages 11.2: cover margin +0.7
        let cautions = spread_cautions(-10.5, 11.2);
        assert_eq!(cautions.len(), 2);
        assert_eq!(cautions[0].message, "Spread -10.5 is 10+ points");
        assert_eq!(cautions[1].message, "Average cover margin +0.7, inside 2.0");

        assert!(spread_cautions(-4.5, 9.0).is_empty());
    }

    #[test]
    fn test_alt_line_volatility() {
        let volatile = AltLineFit {
            line: 24.5,
            windows: vec![
                WindowHits { window: Window::L5, hits: 5 },
                WindowHits { window: Window::L10, hits: 7 },
            ],
        };
        let cautions = alt_line_cautions(&volatile);
        assert_eq!(cautions.len(), 1);
        assert_eq!(
            cautions[0].message,
            "Alt line 24.5 hit rate varies 30 points across windows (over 15)"
        );

        let steady = AltLineFit {
            line: 22.5,
            windows: vec![
                WindowHits { window: Window::L5, hits: 4 },
                WindowHits { window: Window::L10, hits: 8 },
            ],
        };
        assert!(alt_line_cautions(&steady).is_empty());
    }

    #[test]
    fn test_assess_spread_leg_on_the_road() {
        let context = Context {
            venue: Some(Venue::Road),
            back_to_back: true,
            ..Context::default()
        };
        let result = assess(&spread_leg(-5.5, 5.8), &context);
        assert!(result.has(Trigger::BackToBack));
        assert!(result.has(Trigger::RoadGame));
        assert!(result.has(Trigger::ThinCoverMargin));
        assert_eq!(result.level, CautionLevel::High);
    }

    #[test]
    fn test_team_leg_ignores_player_status() {
        let context = Context {
            status: PlayerStatus::Questionable,
            ..Context::default()
        };
        assert!(assess(&spread_leg(-4.5, 9.0), &context).is_empty());
    }

    #[test]
    fn test_back_to_back() {
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 2, d).unwrap();
        assert!(is_back_to_back(day(27), day(28)));
        assert!(!is_back_to_back(day(26), day(28)));
        assert!(!is_back_to_back(day(28), day(28)));
    }
}
