//! # Text Processing Module
//!
//! This module implements the ingredient key normalizer: it turns a free-text
//! ingredient name into the canonical [`NormalizedKey`] used for every lookup
//! and cross-source comparison.
//!
//! ## Features
//!
//! - Removal of parenthetical content ("flour (all-purpose)" -> "flour")
//! - Case folding and removal of every character outside `[a-z\s]`
//! - Removal of a preparation-qualifier stoplist (fresh, chopped, minced, ...)
//! - A free-text variant for unstructured corpus lines, which also strips
//!   measurement units, size words and articles ("2 cloves fresh garlic" -> "garlic")
//!
//! Normalization is deterministic and idempotent for both variants.

use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::ingredient_model::NormalizedKey;
use crate::measurement_patterns::{NON_ALPHA_REGEX, PARENTHETICAL_REGEX};
use crate::measurement_types::is_free_text_unit;

/// Preparation qualifiers removed from every source's ingredient names
pub const STRUCTURED_QUALIFIERS: &[&str] = &[
    "fresh", "frozen", "dried", "canned", "chopped", "sliced", "diced", "minced", "raw",
    "cooked", "whole", "ground",
];

/// Additional qualifiers removed from free-text corpus lines
pub const FREE_TEXT_QUALIFIERS: &[&str] = &[
    "grated", "optional", "finely", "thinly", "roughly", "large", "small", "medium",
    "boneless", "skinless", "of", "a", "an", "the",
];

/// Multi-token phrases removed from free-text corpus lines
pub const FREE_TEXT_PHRASES: &[&[&str]] = &[&["to", "taste"]];

/// Which source convention an ingredient name follows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerVariant {
    /// Clean ingredient names from structured APIs and nutrient catalogs
    #[default]
    Structured,
    /// Full free-text ingredient lines with quantities and units
    FreeText,
}

/// Ingredient key normalizer for one source convention
#[derive(Debug, Clone)]
pub struct KeyNormalizer {
    variant: NormalizerVariant,
    qualifiers: HashSet<String>,
    phrases: Vec<Vec<String>>,
}

static STRUCTURED_NORMALIZER: LazyLock<KeyNormalizer> =
    LazyLock::new(|| KeyNormalizer::new(NormalizerVariant::Structured));
static FREE_TEXT_NORMALIZER: LazyLock<KeyNormalizer> =
    LazyLock::new(|| KeyNormalizer::new(NormalizerVariant::FreeText));

impl KeyNormalizer {
    /// Create a normalizer with the stoplist of the given variant
    pub fn new(variant: NormalizerVariant) -> Self {
        let mut qualifiers: HashSet<String> =
            STRUCTURED_QUALIFIERS.iter().map(|q| q.to_string()).collect();
        let mut phrases = Vec::new();

        if variant == NormalizerVariant::FreeText {
            qualifiers.extend(FREE_TEXT_QUALIFIERS.iter().map(|q| q.to_string()));
            phrases.extend(
                FREE_TEXT_PHRASES
                    .iter()
                    .map(|phrase| phrase.iter().map(|t| t.to_string()).collect()),
            );
        }

        Self {
            variant,
            qualifiers,
            phrases,
        }
    }

    /// Extend the qualifier stoplist with source-specific words
    ///
    /// # Examples
    ///
    /// ```rust
    /// use recipe_reconcile::text_processing::{KeyNormalizer, NormalizerVariant};
    ///
    /// let normalizer = KeyNormalizer::new(NormalizerVariant::Structured)
    ///     .with_extra_qualifiers(["boneless", "skinless"]);
    /// let key = normalizer.normalize("Boneless Skinless Chicken Thighs");
    /// assert_eq!(key.as_str(), "chicken thighs");
    /// ```
    pub fn with_extra_qualifiers<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for qualifier in extra {
            let qualifier = qualifier.as_ref().trim().to_lowercase();
            if !qualifier.is_empty() {
                self.qualifiers.insert(qualifier);
            }
        }
        self
    }

    /// The variant this normalizer implements
    pub fn variant(&self) -> NormalizerVariant {
        self.variant
    }

    /// Normalize an ingredient name into its canonical key
    pub fn normalize(&self, text: &str) -> NormalizedKey {
        let without_parens = PARENTHETICAL_REGEX.replace_all(text, " ");
        let lowered = without_parens.to_lowercase();
        let alpha_only = NON_ALPHA_REGEX.replace_all(&lowered, "");

        let mut tokens: Vec<&str> = alpha_only
            .split_whitespace()
            .filter(|token| !self.is_stop_token(token))
            .collect();
        self.remove_phrases(&mut tokens);

        let key = tokens.join(" ");
        trace!("Normalized '{}' -> '{}' ({:?})", text, key, self.variant);
        NormalizedKey::from_normalized(key)
    }

    fn is_stop_token(&self, token: &str) -> bool {
        if self.qualifiers.contains(token) {
            return true;
        }
        self.variant == NormalizerVariant::FreeText && is_free_text_unit(token)
    }

    // Repeated until no phrase remains so that removal stays idempotent
    fn remove_phrases(&self, tokens: &mut Vec<&str>) {
        for phrase in &self.phrases {
            let width = phrase.len();
            if width == 0 {
                continue;
            }
            while let Some(start) = tokens
                .windows(width)
                .position(|window| window.iter().zip(phrase).all(|(t, p)| *t == p.as_str()))
            {
                tokens.drain(start..start + width);
            }
        }
    }
}

/// Normalize a structured ingredient name (recipe APIs, nutrient catalogs)
///
/// # Examples
///
/// ```rust
/// use recipe_reconcile::text_processing::normalize_name;
///
/// assert_eq!(normalize_name("Fresh Garlic, chopped").as_str(), "garlic");
/// assert_eq!(normalize_name("Flour (all-purpose)").as_str(), "flour");
/// ```
pub fn normalize_name(text: &str) -> NormalizedKey {
    STRUCTURED_NORMALIZER.normalize(text)
}

/// Normalize a free-text corpus ingredient line
///
/// # Examples
///
/// ```rust
/// use recipe_reconcile::text_processing::normalize_free_text;
///
/// assert_eq!(normalize_free_text("2 cloves fresh garlic").as_str(), "garlic");
/// assert_eq!(normalize_free_text("1 cup of sugar").as_str(), "sugar");
/// ```
pub fn normalize_free_text(text: &str) -> NormalizedKey {
    FREE_TEXT_NORMALIZER.normalize(text)
}

/// Normalize with the shared normalizer of the given variant
pub fn normalize_with(text: &str, variant: NormalizerVariant) -> NormalizedKey {
    match variant {
        NormalizerVariant::Structured => STRUCTURED_NORMALIZER.normalize(text),
        NormalizerVariant::FreeText => FREE_TEXT_NORMALIZER.normalize(text),
    }
}
