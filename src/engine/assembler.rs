//! Picks N legs from the eligible pool and prices the parlay.
//!
//! The pool is never relaxed to meet the requested count: if it runs short
//! the request fails with `InsufficientLegs`.

use super::caution::CautionResult;
use super::confidence::Confidence;
use super::eligibility::Window;
use super::generators::{Candidate, Evidence};
use super::legs::{Leg, LegKind, Qualification, Selection};
use super::odds::{self, CombinedOdds};
use crate::error::{ParlayError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

pub const MIN_LEGS: usize = 2;
pub const MAX_LEGS: usize = 10;
pub const DEFAULT_HIGH_CONFIDENCE_PCT: f64 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "order", rename_all = "snake_case")]
pub enum SelectionOrder {
    /// Best confidence first.
    Ranked,
    /// Ranked, then shuffled with a fixed seed. Same seed, same parlay.
    Shuffled { seed: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParlayRequest {
    pub legs: usize,
    pub wager: f64,
    pub window: Window,
    pub order: SelectionOrder,
    /// Hit percentage at or above which a leg is labelled high confidence.
    pub high_confidence_pct: f64,
}

impl ParlayRequest {
    pub fn new(legs: usize, wager: f64, window: Window) -> Self {
        Self {
            legs,
            wager,
            window,
            order: SelectionOrder::Ranked,
            high_confidence_pct: DEFAULT_HIGH_CONFIDENCE_PCT,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.order = SelectionOrder::Shuffled { seed };
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_LEGS..=MAX_LEGS).contains(&self.legs) {
            return Err(ParlayError::InvalidInput(format!(
                "leg count must be between {MIN_LEGS} and {MAX_LEGS}, got {}",
                self.legs
            )));
        }
        if !self.wager.is_finite() || self.wager <= 0.0 {
            return Err(ParlayError::InvalidInput(format!(
                "wager must be positive, got {}",
                self.wager
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub leg: Leg,
    pub evidence: Evidence,
    pub confidence: Confidence,
    pub high_confidence: bool,
    pub caution: CautionResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parlay {
    pub legs: Vec<ParlayLeg>,
    pub wager: f64,
    pub window: Window,
    pub odds: CombinedOdds,
}

impl Parlay {
    pub fn composition(&self) -> BTreeMap<LegKind, usize> {
        let mut counts = BTreeMap::new();
        for leg in &self.legs {
            *counts.entry(leg.leg.kind()).or_insert(0) += 1;
        }
        counts
    }

    /// Legs that share their game with at least one other leg.
    pub fn correlated_legs(&self) -> usize {
        let mut per_game: BTreeMap<&str, usize> = BTreeMap::new();
        for leg in &self.legs {
            *per_game.entry(leg.leg.matchup.game_id.as_str()).or_insert(0) += 1;
        }
        per_game.values().filter(|&&n| n > 1).sum()
    }
}

/// High confidence needs the hit rate at or above `threshold_pct`; team
/// totals also need both the team and the opponent side to qualify.
pub fn is_high_confidence(leg: &Leg, threshold_pct: f64) -> bool {
    if leg.percentage() < threshold_pct {
        return false;
    }
    match &leg.selection {
        Selection::TeamTotal { qualification, .. } => {
            qualification.is_some_and(|q| q.status() == Qualification::Full)
        }
        _ => true,
    }
}

/// Two legs that cannot sensibly ride in the same parlay.
fn conflicts(a: &Leg, b: &Leg) -> bool {
    if a.matchup.game_id != b.matchup.game_id {
        return false;
    }
    match (&a.selection, &b.selection) {
        (Selection::Moneyline { .. }, Selection::Moneyline { .. })
        | (Selection::Spread { .. }, Selection::Spread { .. })
        | (Selection::GameTotal { .. }, Selection::GameTotal { .. }) => true,
        (Selection::TeamTotal { team: ta, .. }, Selection::TeamTotal { team: tb, .. }) => ta.id == tb.id,
        (
            Selection::PlayerProp { player: pa, prop: qa, .. },
            Selection::PlayerProp { player: pb, prop: qb, .. },
        ) => pa.id == pb.id && qa == qb,
        _ => false,
    }
}

struct Scored {
    candidate: Candidate,
    confidence: Confidence,
}

fn rank(pool: Vec<Candidate>) -> Vec<Scored> {
    let mut scored: Vec<Scored> = pool
        .into_iter()
        .map(|candidate| Scored {
            confidence: candidate.confidence(),
            candidate,
        })
        .collect();
    scored.sort_by(|a, b| {
        b.confidence
            .score
            .cmp(&a.confidence.score)
            .then(b.candidate.leg.percentage().total_cmp(&a.candidate.leg.percentage()))
            .then_with(|| a.candidate.leg.label().cmp(&b.candidate.leg.label()))
    });
    scored
}

/// Indices into `ordered`: one leg per kind first, then the rest preferring
/// games not yet used.
fn pick(ordered: &[Scored], wanted: usize) -> Vec<usize> {
    let mut picked: Vec<usize> = Vec::with_capacity(wanted);
    let fits = |picked: &[usize], i: usize| {
        !picked.contains(&i)
            && picked
                .iter()
                .all(|&p| !conflicts(&ordered[p].candidate.leg, &ordered[i].candidate.leg))
    };

    let mut kinds = HashSet::new();
    for (i, scored) in ordered.iter().enumerate() {
        if picked.len() == wanted {
            return picked;
        }
        let kind = scored.candidate.leg.kind();
        if !kinds.contains(&kind) && fits(&picked, i) {
            kinds.insert(kind);
            picked.push(i);
        }
    }

    let mut games: HashSet<String> = picked
        .iter()
        .map(|&i| ordered[i].candidate.leg.matchup.game_id.clone())
        .collect();
    for prefer_new_game in [true, false] {
        for (i, scored) in ordered.iter().enumerate() {
            if picked.len() == wanted {
                return picked;
            }
            let game = &scored.candidate.leg.matchup.game_id;
            if prefer_new_game && games.contains(game) {
                continue;
            }
            if fits(&picked, i) {
                games.insert(game.clone());
                picked.push(i);
            }
        }
    }
    picked
}

pub fn assemble(pool: Vec<Candidate>, request: &ParlayRequest) -> Result<Parlay> {
    request.validate()?;
    if pool.len() < request.legs {
        return Err(ParlayError::InsufficientLegs {
            requested: request.legs,
            available: pool.len(),
        });
    }

    let mut ordered = rank(pool);
    if let SelectionOrder::Shuffled { seed } = request.order {
        let mut rng = StdRng::seed_from_u64(seed);
        ordered.shuffle(&mut rng);
    }

    let picked = pick(&ordered, request.legs);
    if picked.len() < request.legs {
        return Err(ParlayError::InsufficientLegs {
            requested: request.legs,
            available: picked.len(),
        });
    }

    let mut slots: Vec<Option<Scored>> = ordered.into_iter().map(Some).collect();
    let legs: Vec<ParlayLeg> = picked
        .into_iter()
        .filter_map(|i| slots[i].take())
        .map(|scored| ParlayLeg {
            high_confidence: is_high_confidence(&scored.candidate.leg, request.high_confidence_pct),
            caution: scored.candidate.cautions(),
            leg: scored.candidate.leg,
            evidence: scored.candidate.evidence,
            confidence: scored.confidence,
        })
        .collect();

    let prices: Vec<i32> = legs.iter().map(|l| l.leg.odds).collect();
    let odds = odds::combine(&prices, request.wager)?;
    debug!(
        legs = legs.len(),
        american = odds.american,
        decimal = odds.decimal,
        "parlay assembled"
    );

    Ok(Parlay {
        legs,
        wager: request.wager,
        window: request.window,
        odds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::confidence::Context;
    use crate::engine::eligibility::WindowHits;
    use crate::engine::legs::{Direction, HitRecord, Matchup, PlayerRef, PropType, TeamRef, TeamTotalQualification};

    fn matchup(game: &str) -> Matchup {
        Matchup {
            game_id: game.to_string(),
            home: TeamRef { id: 1, name: "Boston Celtics".to_string() },
            away: TeamRef { id: 2, name: "Miami Heat".to_string() },
        }
    }

    fn candidate(game: &str, selection: Selection, hits: u32) -> Candidate {
        Candidate {
            leg: Leg {
                matchup: matchup(game),
                selection,
                record: HitRecord { hits, window: Window::L5 },
                odds: -110,
            },
            evidence: Evidence {
                windows: vec![WindowHits { window: Window::L5, hits }],
                ..Evidence::default()
            },
            context: Context::default(),
        }
    }

    fn prop(game: &str, player_id: u32, hits: u32) -> Candidate {
        candidate(
            game,
            Selection::PlayerProp {
                player: PlayerRef { id: player_id, name: format!("Player {player_id}"), team_id: 1 },
                prop: PropType::Points,
                line: 20.5,
                direction: Direction::Over,
            },
            hits,
        )
    }

    fn spread(game: &str, hits: u32) -> Candidate {
        candidate(
            game,
            Selection::Spread {
                team: TeamRef { id: 1, name: "Boston Celtics".to_string() },
                line: -4.5,
                average_margin: 6.0,
            },
            hits,
        )
    }

    #[test]
    fn test_short_pool_fails_instead_of_relaxing() {
        let pool = vec![prop("g1", 1, 5), prop("g1", 2, 4)];
        let err = assemble(pool, &ParlayRequest::new(3, 10.0, Window::L5)).unwrap_err();
        assert_eq!(err, ParlayError::InsufficientLegs { requested: 3, available: 2 });
    }

    #[test]
    fn test_leg_count_and_wager_bounds() {
        let pool = vec![prop("g1", 1, 5), prop("g1", 2, 4)];
        assert!(matches!(
            assemble(pool.clone(), &ParlayRequest::new(1, 10.0, Window::L5)),
            Err(ParlayError::InvalidInput(_))
        ));
        assert!(matches!(
            assemble(pool.clone(), &ParlayRequest::new(11, 10.0, Window::L5)),
            Err(ParlayError::InvalidInput(_))
        ));
        assert!(matches!(
            assemble(pool, &ParlayRequest::new(2, -5.0, Window::L5)),
            Err(ParlayError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_variety_when_pool_allows() {
        // props rank higher but one spread must make it in
        let pool = vec![prop("g1", 1, 5), prop("g2", 2, 5), prop("g3", 3, 5), spread("g4", 3)];
        let parlay = assemble(pool, &ParlayRequest::new(2, 10.0, Window::L5)).unwrap();
        let composition = parlay.composition();
        assert_eq!(composition.get(&LegKind::PlayerProp), Some(&1));
        assert_eq!(composition.get(&LegKind::Spread), Some(&1));
    }

    #[test]
    fn test_single_kind_pool_still_fills() {
        let pool = vec![prop("g1", 1, 5), prop("g1", 2, 4), prop("g2", 3, 3)];
        let parlay = assemble(pool, &ParlayRequest::new(3, 10.0, Window::L5)).unwrap();
        assert_eq!(parlay.legs.len(), 3);
        assert_eq!(parlay.correlated_legs(), 2);
    }

    #[test]
    fn test_conflicting_legs_are_not_combined() {
        let pool = vec![spread("g1", 5), spread("g1", 4)];
        assert_eq!(
            assemble(pool, &ParlayRequest::new(2, 10.0, Window::L5)),
            Err(ParlayError::InsufficientLegs { requested: 2, available: 1 })
        );
    }

    #[test]
    fn test_combined_odds_cover_every_leg() {
        let pool = vec![prop("g1", 1, 5), spread("g2", 4), prop("g3", 3, 3)];
        let parlay = assemble(pool, &ParlayRequest::new(3, 10.0, Window::L5)).unwrap();
        let expected = odds::american_to_decimal(-110).unwrap().powi(3);
        assert!((parlay.odds.decimal - expected).abs() < 1e-12);
        assert!((parlay.odds.potential_win - (10.0 * expected - 10.0)).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_refresh_is_reproducible() {
        let pool: Vec<Candidate> = (1..=8).map(|i| prop(&format!("g{i}"), i, 3 + i % 3)).collect();
        let request = ParlayRequest::new(3, 10.0, Window::L5).with_seed(42);
        let first = assemble(pool.clone(), &request).unwrap();
        let second = assemble(pool, &request).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_partial_team_total_is_never_high_confidence() {
        let qualification = TeamTotalQualification {
            window: Window::L5,
            team_average: 115.0,
            opponent_allowed_average: 106.0,
            team_qualifies: true,
            opponent_qualifies: false,
        };
        let mut leg = candidate(
            "g1",
            Selection::TeamTotal {
                team: TeamRef { id: 1, name: "Boston Celtics".to_string() },
                line: 112.5,
                direction: Direction::Over,
                average_score: 115.0,
                qualification: Some(qualification),
            },
            5,
        )
        .leg;
        assert!(!is_high_confidence(&leg, 80.0));

        if let Selection::TeamTotal { qualification: Some(q), .. } = &mut leg.selection {
            q.opponent_qualifies = true;
        }
        assert!(is_high_confidence(&leg, 80.0));
    }

    #[test]
    fn test_high_confidence_threshold() {
        assert!(is_high_confidence(&prop("g1", 1, 4).leg, 80.0));
        assert!(!is_high_confidence(&prop("g1", 1, 3).leg, 80.0));
    }
}
