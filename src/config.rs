use crate::engine::assembler::{ParlayRequest, SelectionOrder, MAX_LEGS, MIN_LEGS};
use crate::engine::eligibility::Window;
use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub parlay: ParlayConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ParlayConfig {
    #[serde(default = "default_legs")]
    pub default_legs: usize,
    #[serde(default = "default_wager")]
    pub default_wager: f64,
    #[serde(default = "default_window")]
    pub default_window: Window,
    #[serde(default = "default_min_wager")]
    pub min_wager: f64,
    #[serde(default = "default_max_wager")]
    pub max_wager: f64,
}

fn default_legs() -> usize { 3 }
fn default_wager() -> f64 { 10.0 }
fn default_window() -> Window { Window::L5 }
fn default_min_wager() -> f64 { 1.0 }
fn default_max_wager() -> f64 { 1000.0 }

impl Default for ParlayConfig {
    fn default() -> Self {
        Self {
            default_legs: default_legs(),
            default_wager: default_wager(),
            default_window: default_window(),
            min_wager: default_min_wager(),
            max_wager: default_max_wager(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Games fetched per subject.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
    #[serde(default = "default_head_to_head_days")]
    pub head_to_head_days: i64,
    /// Hit percentage for the high-confidence label.
    #[serde(default = "default_high_confidence_pct")]
    pub high_confidence_pct: f64,
}

fn default_history_depth() -> usize { 15 }
fn default_head_to_head_days() -> i64 { 365 }
fn default_high_confidence_pct() -> f64 { 80.0 }

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            history_depth: default_history_depth(),
            head_to_head_days: default_head_to_head_days(),
            high_confidence_pct: default_high_confidence_pct(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// JSON slate and game logs. Relative paths resolve against the config file.
    pub fixture: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "nba_parlay=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: default_log_filter() }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| "Failed to parse config TOML")?;
        if config.data.fixture.is_relative() {
            if let Some(dir) = path.parent() {
                config.data.fixture = dir.join(&config.data.fixture);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let p = &self.parlay;
        ensure!(
            (MIN_LEGS..=MAX_LEGS).contains(&p.default_legs),
            "parlay.default_legs must be between {MIN_LEGS} and {MAX_LEGS}, got {}",
            p.default_legs
        );
        ensure!(
            p.min_wager > 0.0 && p.min_wager <= p.max_wager,
            "parlay.min_wager must be positive and not above max_wager"
        );
        self.check_wager(p.default_wager)
            .context("parlay.default_wager is out of range")?;
        ensure!(
            self.generation.history_depth >= Window::L5.size(),
            "generation.history_depth must be at least {}",
            Window::L5.size()
        );
        ensure!(
            self.generation.head_to_head_days > 0,
            "generation.head_to_head_days must be positive"
        );
        Ok(())
    }

    pub fn check_wager(&self, wager: f64) -> Result<f64> {
        let p = &self.parlay;
        ensure!(
            wager.is_finite() && wager >= p.min_wager && wager <= p.max_wager,
            "wager must be between ${:.2} and ${:.2}, got {}",
            p.min_wager,
            p.max_wager,
            wager
        );
        Ok(wager)
    }

    /// Request built from config defaults, overridden by whatever the caller supplies.
    pub fn request(
        &self,
        legs: Option<usize>,
        wager: Option<f64>,
        window: Option<Window>,
        seed: Option<u64>,
    ) -> Result<ParlayRequest> {
        let wager = self.check_wager(wager.unwrap_or(self.parlay.default_wager))?;
        let mut request = ParlayRequest::new(
            legs.unwrap_or(self.parlay.default_legs),
            wager,
            window.unwrap_or(self.parlay.default_window),
        );
        request.high_confidence_pct = self.generation.high_confidence_pct;
        if let Some(seed) = seed {
            request.order = SelectionOrder::Shuffled { seed };
        }
        Ok(request)
    }
}
