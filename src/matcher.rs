//! # Candidate Matcher
//!
//! Resolves a normalized ingredient key against a [`Catalog`] with a cascade
//! of strategies, most trusted first:
//!
//! 1. Exact key lookup (confidence 1.0)
//! 2. Containment in either direction (confidence 0.8); ties go to the
//!    shortest catalog key, then the lexicographically smallest
//! 3. Token overlap, scored `|query ∩ candidate| / |query|`; ties go to the
//!    earliest catalog entry
//! 4. Normalized edit-distance similarity, only in [`MatchMode::CrossSource`]
//!
//! [`CandidateMatcher::similar`] returns every entry linked to a key instead
//! of the best one; the cross-source linker scores through it.
//!
//! The catalog is borrowed read-only, so one matcher can be shared across
//! worker threads.

use log::trace;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::catalog::{Catalog, NutrientCatalogEntry};
use crate::config::ReconcileConfig;
use crate::ingredient_model::NormalizedKey;

/// Confidence assigned to an exact key match
pub const EXACT_CONFIDENCE: f64 = 1.0;
/// Confidence assigned to a containment match
pub const CONTAINMENT_CONFIDENCE: f64 = 0.8;

/// The strategy that produced a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    Exact,
    Containment,
    TokenOverlap,
    EditDistance,
}

/// What the matcher is used for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Resolving recipe lines against a nutrient catalog
    #[default]
    NutrientLookup,
    /// Aligning keys across sources; enables edit-distance similarity
    CrossSource,
}

/// A resolved catalog entry with its confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogMatch<'a> {
    pub entry: &'a NutrientCatalogEntry,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    pub strategy: MatchStrategy,
}

/// Strategy cascade over a borrowed catalog
#[derive(Debug, Clone, Copy)]
pub struct CandidateMatcher<'a> {
    catalog: &'a Catalog,
    mode: MatchMode,
    similarity_threshold: f64,
    max_candidates: usize,
}

impl<'a> CandidateMatcher<'a> {
    pub fn new(catalog: &'a Catalog, config: &ReconcileConfig, mode: MatchMode) -> Self {
        Self::with_limits(
            catalog,
            mode,
            config.similarity_threshold,
            config.max_candidates,
        )
    }

    /// Matcher with an explicit similarity threshold and candidate budget
    pub fn with_limits(
        catalog: &'a Catalog,
        mode: MatchMode,
        similarity_threshold: f64,
        max_candidates: usize,
    ) -> Self {
        Self {
            catalog,
            mode,
            similarity_threshold,
            max_candidates,
        }
    }

    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Resolve a key to its best catalog entry, or `None` when no strategy applies
    pub fn resolve(&self, key: &NormalizedKey) -> Option<CatalogMatch<'a>> {
        if key.is_empty() {
            return None;
        }

        let found = self
            .exact(key)
            .or_else(|| self.containment(key))
            .or_else(|| self.token_overlap(key))
            .or_else(|| match self.mode {
                MatchMode::CrossSource => self.edit_distance(key),
                MatchMode::NutrientLookup => None,
            });

        match &found {
            Some(m) => trace!(
                "'{}' -> '{}' via {:?} ({:.2})",
                key,
                m.entry.key,
                m.strategy,
                m.confidence
            ),
            None => trace!("'{}' has no match in '{}'", key, self.catalog.name()),
        }
        found
    }

    /// Every entry linked to the key: the exact entry first, then, in
    /// [`MatchMode::CrossSource`], each other candidate whose edit-distance
    /// similarity reaches the threshold, in catalog order
    pub fn similar(&self, key: &NormalizedKey) -> Vec<CatalogMatch<'a>> {
        if key.is_empty() {
            return Vec::new();
        }
        let mut matches: Vec<CatalogMatch<'a>> = self.exact(key).into_iter().collect();
        if self.mode == MatchMode::CrossSource {
            matches.extend(
                self.edit_scores(key)
                    .into_iter()
                    .map(|(entry, confidence)| CatalogMatch {
                        entry,
                        confidence,
                        strategy: MatchStrategy::EditDistance,
                    }),
            );
        }
        matches
    }

    fn exact(&self, key: &NormalizedKey) -> Option<CatalogMatch<'a>> {
        self.catalog.get(key).map(|entry| CatalogMatch {
            entry,
            confidence: EXACT_CONFIDENCE,
            strategy: MatchStrategy::Exact,
        })
    }

    fn containment(&self, key: &NormalizedKey) -> Option<CatalogMatch<'a>> {
        let query = key.as_str();
        self.catalog
            .entries()
            .iter()
            .filter(|entry| {
                let candidate = entry.key.as_str();
                candidate.contains(query) || query.contains(candidate)
            })
            .min_by(|a, b| {
                a.key
                    .as_str()
                    .len()
                    .cmp(&b.key.as_str().len())
                    .then_with(|| a.key.cmp(&b.key))
            })
            .map(|entry| CatalogMatch {
                entry,
                confidence: CONTAINMENT_CONFIDENCE,
                strategy: MatchStrategy::Containment,
            })
    }

    fn token_overlap(&self, key: &NormalizedKey) -> Option<CatalogMatch<'a>> {
        let query: HashSet<&str> = key.tokens().collect();
        let denominator = query.len().max(1) as f64;

        let mut best: Option<(&'a NutrientCatalogEntry, f64)> = None;
        for entry in self.candidates() {
            let shared = entry
                .key
                .tokens()
                .collect::<HashSet<_>>()
                .intersection(&query)
                .count();
            if shared == 0 {
                continue;
            }
            let score = shared as f64 / denominator;
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((entry, score));
            }
        }

        best.map(|(entry, confidence)| CatalogMatch {
            entry,
            confidence,
            strategy: MatchStrategy::TokenOverlap,
        })
    }

    fn edit_distance(&self, key: &NormalizedKey) -> Option<CatalogMatch<'a>> {
        let mut best: Option<(&'a NutrientCatalogEntry, f64)> = None;
        for (entry, score) in self.edit_scores(key) {
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((entry, score));
            }
        }

        best.map(|(entry, confidence)| CatalogMatch {
            entry,
            confidence,
            strategy: MatchStrategy::EditDistance,
        })
    }

    // Non-identical candidates at or above the similarity threshold
    fn edit_scores(&self, key: &NormalizedKey) -> Vec<(&'a NutrientCatalogEntry, f64)> {
        self.candidates()
            .filter(|entry| entry.key != *key)
            .map(|entry| {
                let score = strsim::normalized_levenshtein(key.as_str(), entry.key.as_str());
                (entry, score)
            })
            .filter(|(_, score)| *score >= self.similarity_threshold)
            .collect()
    }

    // Scored strategies look at no more than `max_candidates` entries (0 = all)
    fn candidates(&self) -> impl Iterator<Item = &'a NutrientCatalogEntry> {
        let limit = match self.max_candidates {
            0 => usize::MAX,
            n => n,
        };
        self.catalog.entries().iter().take(limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_processing::normalize_name;

    fn build_catalog(descriptions: &[&str]) -> Catalog {
        Catalog::from_entries(
            "test",
            descriptions
                .iter()
                .enumerate()
                .map(|(i, d)| NutrientCatalogEntry::new(d, &i.to_string())),
        )
    }

    fn resolve<'a>(catalog: &'a Catalog, name: &str, mode: MatchMode) -> Option<CatalogMatch<'a>> {
        CandidateMatcher::new(catalog, &ReconcileConfig::default(), mode)
            .resolve(&normalize_name(name))
    }

    #[test]
    fn test_exact_beats_decoy() {
        let catalog = build_catalog(&["Garlic powder", "Garlic"]);
        let m = resolve(&catalog, "Fresh garlic", MatchMode::NutrientLookup).unwrap();
        assert_eq!(m.entry.key.as_str(), "garlic");
        assert_eq!(m.strategy, MatchStrategy::Exact);
        assert_eq!(m.confidence, 1.0);
    }

    #[test]
    fn test_containment_prefers_shortest_then_lexicographic() {
        let catalog = build_catalog(&["salted butter", "sea salt", "salt pork"]);
        let m = resolve(&catalog, "salt", MatchMode::NutrientLookup).unwrap();
        assert_eq!(m.strategy, MatchStrategy::Containment);
        assert_eq!(m.confidence, 0.8);
        assert_eq!(m.entry.key.as_str(), "sea salt");

        let catalog = build_catalog(&["palm oil", "corn oil"]);
        let m = resolve(&catalog, "oil", MatchMode::NutrientLookup).unwrap();
        assert_eq!(m.entry.key.as_str(), "corn oil");
    }

    #[test]
    fn test_query_containing_catalog_key() {
        let catalog = build_catalog(&["chicken", "breadcrumbs"]);
        let m = resolve(&catalog, "chicken thighs", MatchMode::NutrientLookup).unwrap();
        assert_eq!(m.entry.key.as_str(), "chicken");
        assert_eq!(m.strategy, MatchStrategy::Containment);
    }

    #[test]
    fn test_token_overlap_ties_use_catalog_order() {
        let catalog = build_catalog(&["peppers sweet red", "bell peppers green"]);
        let m = resolve(&catalog, "red bell pepper", MatchMode::NutrientLookup).unwrap();
        assert_eq!(m.strategy, MatchStrategy::TokenOverlap);
        assert_eq!(m.entry.key.as_str(), "peppers sweet red");
        assert!((m.confidence - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_token_overlap_prefers_higher_score() {
        let catalog = build_catalog(&["onions spring", "onions red sweet"]);
        let m = resolve(&catalog, "sweet red onion", MatchMode::NutrientLookup).unwrap();
        assert_eq!(m.entry.key.as_str(), "onions red sweet");
        assert!((m.confidence - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_edit_distance_only_for_cross_source() {
        let catalog = build_catalog(&["tomatoes"]);
        assert!(resolve(&catalog, "tomatos", MatchMode::NutrientLookup).is_none());

        let m = resolve(&catalog, "tomatos", MatchMode::CrossSource).unwrap();
        assert_eq!(m.strategy, MatchStrategy::EditDistance);
        assert!((m.confidence - 0.875).abs() < 1e-9);
    }

    #[test]
    fn test_edit_distance_respects_threshold() {
        let catalog = build_catalog(&["lettuce"]);
        assert!(resolve(&catalog, "lentils", MatchMode::CrossSource).is_none());
    }

    #[test]
    fn test_similar_lists_exact_then_fuzzy_entries() {
        let catalog = build_catalog(&["tomatos", "tomatoes", "potatoes"]);
        let matcher =
            CandidateMatcher::new(&catalog, &ReconcileConfig::default(), MatchMode::CrossSource);

        let found = matcher.similar(&normalize_name("tomatoes"));
        let keys: Vec<&str> = found.iter().map(|m| m.entry.key.as_str()).collect();
        assert_eq!(keys, vec!["tomatoes", "tomatos", "potatoes"]);
        assert_eq!(found[0].strategy, MatchStrategy::Exact);
        assert!(found[1..].iter().all(|m| m.strategy == MatchStrategy::EditDistance));

        let lookup =
            CandidateMatcher::new(&catalog, &ReconcileConfig::default(), MatchMode::NutrientLookup);
        assert_eq!(lookup.similar(&normalize_name("tomatoes")).len(), 1);
    }

    #[test]
    fn test_no_match_and_empty_key() {
        let catalog = build_catalog(&["rice"]);
        assert!(resolve(&catalog, "saffron", MatchMode::NutrientLookup).is_none());
        assert!(resolve(&catalog, "(fresh)", MatchMode::CrossSource).is_none());
    }

    #[test]
    fn test_max_candidates_bounds_scored_strategies() {
        let catalog = build_catalog(&["beans black", "beans kidney red"]);
        let config = ReconcileConfig {
            max_candidates: 1,
            ..Default::default()
        };
        let matcher = CandidateMatcher::new(&catalog, &config, MatchMode::NutrientLookup);
        let m = matcher.resolve(&normalize_name("red kidney beans")).unwrap();
        assert_eq!(m.entry.key.as_str(), "beans black");
        assert!((m.confidence - 1.0 / 3.0).abs() < 1e-9);

        let unbounded = resolve(&catalog, "red kidney beans", MatchMode::NutrientLookup).unwrap();
        assert_eq!(unbounded.entry.key.as_str(), "beans kidney red");
    }
}
