use thiserror::Error;

/// Errors raised by the eligibility, projection, odds and assembly engines.
///
/// All of them are local and recoverable: a failure for one subject excludes
/// that subject, it never aborts the whole parlay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParlayError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unsupported window: {0} (must be 5, 10, or 15)")]
    UnsupportedWindow(u32),

    #[error("insufficient history: needed {needed} games, {available} available")]
    InsufficientHistory { needed: usize, available: usize },

    #[error("invalid odds: {0}")]
    InvalidOdds(String),

    #[error("insufficient legs: requested {requested}, only {available} eligible")]
    InsufficientLegs { requested: usize, available: usize },
}

pub type Result<T> = std::result::Result<T, ParlayError>;
