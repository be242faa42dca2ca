//! Eligibility ladder: maps (hits, window) to accept/reject.
//!
//! | window | pass if hits >= | reject if hits <= |
//! |--------|-----------------|-------------------|
//! | 5      | 3               | 2                 |
//! | 10     | 7               | 6                 |
//! | 15     | 10              | 9                 |
//!
//! The two columns partition `0..=window` with no gap and no overlap.

use crate::error::{ParlayError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Historical window ("ladder") a leg is judged on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Window {
    L5,
    L10,
    L15,
}

impl Window {
    /// Shortest first.
    pub const ALL: [Window; 3] = [Window::L5, Window::L10, Window::L15];

    pub fn size(self) -> usize {
        match self {
            Window::L5 => 5,
            Window::L10 => 10,
            Window::L15 => 15,
        }
    }

    /// Minimum hits required to pass.
    pub fn threshold(self) -> u32 {
        match self {
            Window::L5 => 3,
            Window::L10 => 7,
            Window::L15 => 10,
        }
    }

    /// Windows that fit inside `available` games, shortest first.
    pub fn available(available: usize) -> Vec<Window> {
        Window::ALL
            .into_iter()
            .filter(|w| w.size() <= available)
            .collect()
    }
}

impl TryFrom<u32> for Window {
    type Error = ParlayError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            5 => Ok(Window::L5),
            10 => Ok(Window::L10),
            15 => Ok(Window::L15),
            other => Err(ParlayError::UnsupportedWindow(other)),
        }
    }
}

impl From<Window> for u32 {
    fn from(window: Window) -> u32 {
        window.size() as u32
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.size())
    }
}

/// Outcome of an eligibility check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Eligible,
    Rejected(String),
}

impl Verdict {
    pub fn is_eligible(&self) -> bool {
        matches!(self, Verdict::Eligible)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Verdict::Eligible => None,
            Verdict::Rejected(reason) => Some(reason),
        }
    }
}

/// Hit count observed over one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowHits {
    pub window: Window,
    pub hits: u32,
}

impl WindowHits {
    pub fn rate(&self) -> f64 {
        self.hits as f64 / self.window.size() as f64
    }

    pub fn passes(&self) -> bool {
        self.hits >= self.window.threshold()
    }
}

/// Check a raw (hits, window) pair against the ladder.
pub fn check(hits: u32, window: u32) -> Result<Verdict> {
    check_window(hits, Window::try_from(window)?)
}

pub fn check_window(hits: u32, window: Window) -> Result<Verdict> {
    let size = window.size() as u32;
    if hits > size {
        return Err(ParlayError::InvalidInput(format!(
            "{hits} hits reported over a {size}-game window"
        )));
    }
    let threshold = window.threshold();
    if hits >= threshold {
        Ok(Verdict::Eligible)
    } else {
        Ok(Verdict::Rejected(format!(
            "Hit rate {hits}/{size} below threshold {threshold}/{size}"
        )))
    }
}

/// Hit rate as a percentage rounded to one decimal.
pub fn hit_rate_percentage(hits: u32, games: usize) -> f64 {
    if games == 0 {
        return 0.0;
    }
    (hits as f64 / games as f64 * 1000.0).round() / 10.0
}

/// Plain-text description of the ladder for the front end.
pub fn rules_summary() -> String {
    let mut lines = vec!["Eligibility Rules".to_string()];
    for window in Window::ALL {
        let size = window.size();
        let threshold = window.threshold();
        lines.push(format!(
            "{size}-game ladder: allowed {threshold}-{size} hits, rejected 0-{} hits (need at least {threshold} of {size})",
            threshold - 1
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_match_threshold_table() {
        assert!(!check(2, 5).unwrap().is_eligible());
        assert!(check(3, 5).unwrap().is_eligible());
        assert!(!check(6, 10).unwrap().is_eligible());
        assert!(check(7, 10).unwrap().is_eligible());
        assert!(!check(9, 15).unwrap().is_eligible());
        assert!(check(10, 15).unwrap().is_eligible());
    }

    #[test]
    fn test_every_hit_count_is_partitioned() {
        for window in Window::ALL {
            let size = window.size() as u32;
            for hits in 0..=size {
                let verdict = check(hits, size).unwrap();
                assert_eq!(verdict.is_eligible(), hits >= window.threshold(), "{hits}/{size}");
                assert_eq!(verdict.reason().is_none(), verdict.is_eligible());
            }
        }
    }

    #[test]
    fn test_rejection_reason_is_numeric() {
        let verdict = check(2, 5).unwrap();
        assert_eq!(verdict.reason(), Some("Hit rate 2/5 below threshold 3/5"));
    }

    #[test]
    fn test_unsupported_window() {
        assert_eq!(check(3, 7), Err(ParlayError::UnsupportedWindow(7)));
        assert_eq!(check(0, 0), Err(ParlayError::UnsupportedWindow(0)));
    }

    #[test]
    fn test_hits_above_window_is_invalid_input() {
        assert!(matches!(check(6, 5), Err(ParlayError::InvalidInput(_))));
        assert!(matches!(check(16, 15), Err(ParlayError::InvalidInput(_))));
    }

    #[test]
    fn test_available_windows() {
        assert!(Window::available(4).is_empty());
        assert_eq!(Window::available(9), vec![Window::L5]);
        assert_eq!(Window::available(12), vec![Window::L5, Window::L10]);
        assert_eq!(Window::available(40), Window::ALL.to_vec());
    }

    #[test]
    fn test_window_serde_uses_game_count() {
        let w: Window = serde_json::from_str("10").unwrap();
        assert_eq!(w, Window::L10);
        assert_eq!(serde_json::to_string(&Window::L15).unwrap(), "15");
        assert!(serde_json::from_str::<Window>("7").is_err());
    }

    #[test]
    fn test_hit_rate_percentage() {
        assert_eq!(hit_rate_percentage(3, 5), 60.0);
        assert_eq!(hit_rate_percentage(2, 3), 66.7);
        assert_eq!(hit_rate_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_rules_summary_lists_every_ladder() {
        let summary = rules_summary();
        assert!(summary.contains("5-game ladder: allowed 3-5 hits, rejected 0-2 hits"));
        assert!(summary.contains("10-game ladder: allowed 7-10 hits, rejected 0-6 hits"));
        assert!(summary.contains("15-game ladder: allowed 10-15 hits, rejected 0-9 hits"));
    }
}
