//! # Quantity Normalizer
//!
//! This module turns a free-text measurement ("1/2 cup", "2 tbsp", "3", "a pinch")
//! into an estimated mass in grams.
//!
//! Every input resolves to a number: malformed, empty or unit-less text falls back
//! to a documented default so that aggregation never fails on a single bad line.
//! The result is always clamped to `[0, max_mass_grams]`.
//!
//! ## Usage
//!
//! ```rust
//! use recipe_reconcile::quantity::parse_measure;
//!
//! assert_eq!(parse_measure("1/2 cup"), 60.0);
//! assert_eq!(parse_measure("2 tbsp"), 30.0);
//! assert_eq!(parse_measure("3 avocado"), 300.0);
//! assert_eq!(parse_measure("a pinch"), 10.0);
//! assert_eq!(parse_measure(""), 30.0);
//! ```

use log::trace;
use serde::{Deserialize, Serialize};

use crate::config::ReconcileConfig;
use crate::measurement_patterns::{AMOUNT_REGEX, FRACTION_REGEX};
use crate::measurement_types::{
    lookup_unit, UnitLookup, ALWAYS_VANISHING_TERMS, CUP_GRAMS, ITEM_GRAMS, MAX_ITEM_COUNT,
    MIN_MILLILITER_COUNT, NON_NUMERIC_VANISHING_TERMS, NO_AMOUNT_GRAMS, TABLESPOON_GRAMS,
    UNKNOWN_UNIT_GRAMS,
};

/// Unicode vulgar fractions and their ASCII spelling
const VULGAR_FRACTIONS: &[(char, &str)] = &[
    ('½', "1/2"),
    ('⅓', "1/3"),
    ('⅔', "2/3"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('⅕', "1/5"),
    ('⅛', "1/8"),
    ('⅜', "3/8"),
    ('⅝', "5/8"),
    ('⅞', "7/8"),
];

/// Which rule of the normalizer produced a mass estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MeasureRule {
    /// Garnish-like phrasing ("to taste", "a pinch")
    Vanishing,
    /// A fraction, converted through its unit or a cup equivalent
    Fraction,
    /// A number followed by a unit with a gram conversion
    Unit,
    /// A number followed by a recognized unit with no gram estimate
    UnknownUnit,
    /// A small unit-less number read as a count of whole items
    ItemCount,
    /// A large unit-less number read as milliliters
    Milliliters,
    /// A mid-sized unit-less number read as tablespoon-equivalents
    TablespoonEquivalent,
    /// No number at all
    NoAmount,
}

/// A mass estimate together with the rule that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MassEstimate {
    /// Estimated grams, clamped to the configured maximum
    pub grams: f64,
    /// Rule that produced the estimate
    pub rule: MeasureRule,
}

/// Quantity normalizer parameterized by the mass cap and garnish default
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantityNormalizer {
    max_mass_grams: f64,
    garnish_grams: f64,
}

impl Default for QuantityNormalizer {
    fn default() -> Self {
        Self::from_config(&ReconcileConfig::default())
    }
}

impl QuantityNormalizer {
    /// Create a normalizer from the batch configuration
    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self {
            max_mass_grams: config.max_mass_grams,
            garnish_grams: config.garnish_default_grams,
        }
    }

    /// Estimate the mass in grams of a free-text quantity
    pub fn parse_measure(&self, text: &str) -> f64 {
        self.estimate(text).grams
    }

    /// Estimate the mass in grams and report which rule was applied
    pub fn estimate(&self, text: &str) -> MassEstimate {
        let text = expand_vulgar_fractions(&text.trim().to_lowercase());
        let (raw_grams, rule) = self.estimate_unclamped(&text);
        let grams = self.clamp(raw_grams);

        trace!(
            "Measure '{}' -> {:.1}g via {:?} (unclamped {:.1}g)",
            text,
            grams,
            rule,
            raw_grams
        );

        MassEstimate { grams, rule }
    }

    fn estimate_unclamped(&self, text: &str) -> (f64, MeasureRule) {
        if text.is_empty() {
            return (NO_AMOUNT_GRAMS, MeasureRule::NoAmount);
        }

        if is_vanishing(text) {
            return (self.garnish_grams, MeasureRule::Vanishing);
        }

        if let Some(grams) = fraction_grams(text) {
            return (grams, MeasureRule::Fraction);
        }

        let Some(captures) = AMOUNT_REGEX.captures(text) else {
            return (NO_AMOUNT_GRAMS, MeasureRule::NoAmount);
        };
        let Ok(amount) = captures[1].parse::<f64>() else {
            return (NO_AMOUNT_GRAMS, MeasureRule::NoAmount);
        };

        if let Some(word) = captures.get(2) {
            match lookup_unit(word.as_str()) {
                UnitLookup::Convertible(conversion) => {
                    return (amount * conversion.grams_per_unit, MeasureRule::Unit);
                }
                UnitLookup::Unestimated => {
                    return (amount * UNKNOWN_UNIT_GRAMS, MeasureRule::UnknownUnit);
                }
                UnitLookup::NotAUnit => {}
            }
        }

        unit_less_grams(amount)
    }

    fn clamp(&self, grams: f64) -> f64 {
        if grams.is_nan() {
            return NO_AMOUNT_GRAMS.min(self.max_mass_grams);
        }
        grams.clamp(0.0, self.max_mass_grams)
    }
}

/// Estimate the mass of a free-text quantity with the default configuration
pub fn parse_measure(text: &str) -> f64 {
    QuantityNormalizer::default().parse_measure(text)
}

fn is_vanishing(text: &str) -> bool {
    if ALWAYS_VANISHING_TERMS.iter().any(|term| text.contains(term)) {
        return true;
    }
    let has_digit = text.chars().any(|c| c.is_ascii_digit());
    !has_digit && NON_NUMERIC_VANISHING_TERMS.iter().any(|term| text.contains(term))
}

fn fraction_grams(text: &str) -> Option<f64> {
    let captures = FRACTION_REGEX.captures(text)?;

    let whole: f64 = match captures.get(1) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0.0,
    };
    let numerator: f64 = captures[2].parse().ok()?;
    let denominator: f64 = captures[3].parse().ok()?;
    if denominator == 0.0 {
        return None;
    }
    let amount = whole + numerator / denominator;

    let grams = match captures.get(4).map(|m| lookup_unit(m.as_str())) {
        Some(UnitLookup::Convertible(conversion)) => amount * conversion.grams_per_unit,
        Some(UnitLookup::Unestimated) => amount * UNKNOWN_UNIT_GRAMS,
        Some(UnitLookup::NotAUnit) | None => amount * CUP_GRAMS,
    };
    Some(grams)
}

fn unit_less_grams(count: f64) -> (f64, MeasureRule) {
    if count <= MAX_ITEM_COUNT {
        (count * ITEM_GRAMS, MeasureRule::ItemCount)
    } else if count >= MIN_MILLILITER_COUNT {
        (count, MeasureRule::Milliliters)
    } else {
        (count * TABLESPOON_GRAMS, MeasureRule::TablespoonEquivalent)
    }
}

fn expand_vulgar_fractions(text: &str) -> String {
    if text.is_ascii() {
        return text.to_string();
    }
    let mut expanded = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match VULGAR_FRACTIONS.iter().find(|(glyph, _)| *glyph == c) {
            Some((_, ascii)) => {
                expanded.push(' ');
                expanded.push_str(ascii);
                expanded.push(' ');
            }
            None => expanded.push(c),
        }
    }
    expanded.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_documented_values() {
        assert_eq!(parse_measure(""), 30.0);
        assert_eq!(parse_measure("1/2 cup"), 60.0);
        assert_eq!(parse_measure("2 tbsp"), 30.0);
        assert_eq!(parse_measure("3 avocado"), 300.0);
        assert_eq!(parse_measure("a pinch"), 10.0);
        assert!(approx(parse_measure("1 lb"), 453.6));
    }

    #[test]
    fn test_vanishing_terms() {
        assert_eq!(parse_measure("to taste"), 10.0);
        assert_eq!(parse_measure("Garnish"), 10.0);
        assert_eq!(parse_measure("drizzle"), 10.0);
        assert_eq!(parse_measure("2 handfuls"), 10.0);
        // Numeric pinches go through the unit table instead
        assert!(approx(parse_measure("2 pinches"), 1.0));
    }

    #[test]
    fn test_fractions() {
        assert_eq!(parse_measure("3/4"), 90.0);
        assert_eq!(parse_measure("1 1/2 cups"), 180.0);
        assert_eq!(parse_measure("1/2 tsp"), 2.5);
        assert_eq!(parse_measure("½ cup"), 60.0);
        assert_eq!(parse_measure("1½ cups"), 180.0);
        assert_eq!(parse_measure("1/2 tin"), 15.0);
    }

    #[test]
    fn test_zero_denominator_falls_back() {
        let estimate = QuantityNormalizer::default().estimate("1/0 cup");
        assert_ne!(estimate.rule, MeasureRule::Fraction);
        assert!(estimate.grams >= 0.0 && estimate.grams <= 500.0);
    }

    #[test]
    fn test_units() {
        assert_eq!(parse_measure("250g"), 250.0);
        assert_eq!(parse_measure("2 cloves"), 6.0);
        assert_eq!(parse_measure("1 large"), 100.0);
        assert!(approx(parse_measure("4 oz"), 113.4));
        assert_eq!(parse_measure("2 cans"), 60.0);
    }

    #[test]
    fn test_unit_less_numbers() {
        let normalizer = QuantityNormalizer::default();
        assert_eq!(normalizer.estimate("3").rule, MeasureRule::ItemCount);
        assert_eq!(parse_measure("3"), 300.0);
        assert_eq!(parse_measure("15"), 225.0);
        assert_eq!(parse_measure("150"), 150.0);
        assert_eq!(parse_measure("750"), 500.0);
        assert_eq!(
            normalizer.estimate("750").rule,
            MeasureRule::Milliliters
        );
    }

    #[test]
    fn test_no_number() {
        assert_eq!(parse_measure("some chopped"), 10.0);
        assert_eq!(parse_measure("as needed"), 30.0);
        assert_eq!(
            QuantityNormalizer::default().estimate("as needed").rule,
            MeasureRule::NoAmount
        );
    }

    #[test]
    fn test_always_clamped() {
        let samples = [
            "", "2 kg", "1000 lb", "99999999999999999999999", "0", "0 g", "1/3", "12 cups",
            "a splash", "x", "-5 g", "1e9", "½", "3 ½ kg",
        ];
        for sample in samples {
            let grams = parse_measure(sample);
            assert!(
                (0.0..=500.0).contains(&grams),
                "'{}' produced {}",
                sample,
                grams
            );
        }
    }

    #[test]
    fn test_custom_cap() {
        let config = ReconcileConfig {
            max_mass_grams: 250.0,
            garnish_default_grams: 5.0,
            ..Default::default()
        };
        let normalizer = QuantityNormalizer::from_config(&config);
        assert_eq!(normalizer.parse_measure("1 lb"), 250.0);
        assert_eq!(normalizer.parse_measure("to taste"), 5.0);
    }
}
