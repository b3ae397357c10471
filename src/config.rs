//! # Reconciliation Configuration Module
//!
//! This module defines the tunable thresholds of the reconciliation pipeline:
//! mass caps for the quantity normalizer, similarity thresholds for matching
//! and link classification, and the calorie sanity bound of the aggregator.

use std::env;
use std::str::FromStr;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::{ReconcileError, Result};

// Constants for reconciliation configuration
pub const DEFAULT_MAX_MASS_GRAMS: f64 = 500.0;
pub const DEFAULT_GARNISH_GRAMS: f64 = 10.0;
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;
pub const DEFAULT_EQUIVALENCE_THRESHOLD: f64 = 0.9;
pub const DEFAULT_CLOSE_MATCH_THRESHOLD: f64 = 0.7;
pub const DEFAULT_CALORIE_WARNING_KCAL: f64 = 2000.0;
pub const DEFAULT_HIGH_MASS_LINE_GRAMS: f64 = 200.0;

/// Confidence tier boundaries for cross-source links
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Lower bound (inclusive) of the equivalence tier
    pub equivalence: f64,
    /// Lower bound (inclusive) of the close-match tier
    pub close_match: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            equivalence: DEFAULT_EQUIVALENCE_THRESHOLD,
            close_match: DEFAULT_CLOSE_MATCH_THRESHOLD,
        }
    }
}

/// Configuration structure for a reconciliation batch
///
/// Serialized into every report; missing fields deserialize to their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Upper clamp for the mass estimate of a single ingredient line
    pub max_mass_grams: f64,
    /// Mass assigned to garnish-like quantities ("to taste", "a pinch")
    pub garnish_default_grams: f64,
    /// Minimum edit-distance similarity accepted for cross-source matches
    pub similarity_threshold: f64,
    /// Confidence tier boundaries
    pub tiers: TierThresholds,
    /// Per-serving energy above which a recipe is flagged
    pub calorie_warning_kcal: f64,
    /// Lines heavier than this are listed as contributors in calorie warnings
    pub high_mass_line_grams: f64,
    /// Cap on catalog entries scored per query by the O(n) strategies (0 = no cap)
    pub max_candidates: usize,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            max_mass_grams: DEFAULT_MAX_MASS_GRAMS,
            garnish_default_grams: DEFAULT_GARNISH_GRAMS,
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            tiers: TierThresholds::default(),
            calorie_warning_kcal: DEFAULT_CALORIE_WARNING_KCAL,
            high_mass_line_grams: DEFAULT_HIGH_MASS_LINE_GRAMS,
            max_candidates: 0,
        }
    }
}

impl ReconcileConfig {
    /// Build a configuration from `RECONCILE_*` environment variables
    ///
    /// Unset variables keep their defaults; unparseable values are logged and
    /// ignored. The result is validated before being returned.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `RECONCILE_MAX_MASS_GRAMS` | `max_mass_grams` |
    /// | `RECONCILE_GARNISH_GRAMS` | `garnish_default_grams` |
    /// | `RECONCILE_SIMILARITY_THRESHOLD` | `similarity_threshold` |
    /// | `RECONCILE_EQUIVALENCE_THRESHOLD` | `tiers.equivalence` |
    /// | `RECONCILE_CLOSE_MATCH_THRESHOLD` | `tiers.close_match` |
    /// | `RECONCILE_CALORIE_WARNING_KCAL` | `calorie_warning_kcal` |
    /// | `RECONCILE_HIGH_MASS_LINE_GRAMS` | `high_mass_line_grams` |
    /// | `RECONCILE_MAX_CANDIDATES` | `max_candidates` |
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        read_env("RECONCILE_MAX_MASS_GRAMS", &mut config.max_mass_grams);
        read_env("RECONCILE_GARNISH_GRAMS", &mut config.garnish_default_grams);
        read_env(
            "RECONCILE_SIMILARITY_THRESHOLD",
            &mut config.similarity_threshold,
        );
        read_env(
            "RECONCILE_EQUIVALENCE_THRESHOLD",
            &mut config.tiers.equivalence,
        );
        read_env(
            "RECONCILE_CLOSE_MATCH_THRESHOLD",
            &mut config.tiers.close_match,
        );
        read_env(
            "RECONCILE_CALORIE_WARNING_KCAL",
            &mut config.calorie_warning_kcal,
        );
        read_env(
            "RECONCILE_HIGH_MASS_LINE_GRAMS",
            &mut config.high_mass_line_grams,
        );
        read_env("RECONCILE_MAX_CANDIDATES", &mut config.max_candidates);

        config.validate()?;
        Ok(config)
    }

    /// Check that all values are in range and tier boundaries are ordered
    pub fn validate(&self) -> Result<()> {
        if !(self.max_mass_grams.is_finite() && self.max_mass_grams > 0.0) {
            return Err(ReconcileError::Config(format!(
                "max_mass_grams must be positive, got {}",
                self.max_mass_grams
            )));
        }
        if !(0.0..=self.max_mass_grams).contains(&self.garnish_default_grams) {
            return Err(ReconcileError::Config(format!(
                "garnish_default_grams must lie in [0, {}], got {}",
                self.max_mass_grams, self.garnish_default_grams
            )));
        }
        for (name, value) in [
            ("similarity_threshold", self.similarity_threshold),
            ("tiers.equivalence", self.tiers.equivalence),
            ("tiers.close_match", self.tiers.close_match),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ReconcileError::Config(format!(
                    "{name} must lie in [0, 1], got {value}"
                )));
            }
        }
        if self.tiers.close_match > self.tiers.equivalence {
            return Err(ReconcileError::Config(format!(
                "close-match boundary {} exceeds equivalence boundary {}",
                self.tiers.close_match, self.tiers.equivalence
            )));
        }
        if !(self.calorie_warning_kcal.is_finite() && self.calorie_warning_kcal > 0.0) {
            return Err(ReconcileError::Config(format!(
                "calorie_warning_kcal must be positive, got {}",
                self.calorie_warning_kcal
            )));
        }
        Ok(())
    }
}

fn read_env<T: FromStr + std::fmt::Display>(name: &str, target: &mut T) {
    if let Ok(raw) = env::var(name) {
        match raw.trim().parse::<T>() {
            Ok(value) => {
                debug!("{} = {}", name, value);
                *target = value;
            }
            Err(_) => warn!("Ignoring unparseable value for {}: '{}'", name, raw),
        }
    }
}
