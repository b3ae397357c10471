//! # Cross-Source Link Classifier
//!
//! Links ingredient keys across sources and grades each link into a
//! confidence tier:
//!
//! - `confidence >= equivalence` (0.9): [`LinkTier::Equivalence`]
//! - `close_match <= confidence < equivalence` (0.7): [`LinkTier::CloseMatch`]
//! - below that: [`LinkTier::RelatedMatch`]
//!
//! Identical keys link with confidence 1.0. Other key pairs link when their
//! normalized edit-distance similarity reaches the acceptance threshold; the
//! scoring runs through a cross-source [`CandidateMatcher`] over the second
//! source's keys, so `max_candidates` bounds it. Source pairs are processed
//! in parallel and merged in a stable order.

use log::{debug, info};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::{Catalog, NutrientCatalogEntry};
use crate::config::{ReconcileConfig, TierThresholds};
use crate::ingredient_model::NormalizedKey;
use crate::matcher::{CandidateMatcher, MatchMode, MatchStrategy};

/// Confidence tier of a cross-source link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkTier {
    Equivalence,
    CloseMatch,
    RelatedMatch,
}

impl fmt::Display for LinkTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LinkTier::Equivalence => "equivalence",
            LinkTier::CloseMatch => "close match",
            LinkTier::RelatedMatch => "related match",
        };
        write!(f, "{}", label)
    }
}

/// How a link was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMethod {
    Exact,
    EditDistance,
}

/// An asserted correspondence between keys of two sources
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrossSourceLink {
    pub source_a: String,
    pub key_a: NormalizedKey,
    pub source_b: String,
    pub key_b: NormalizedKey,
    pub confidence: f64,
    pub tier: LinkTier,
    pub method: LinkMethod,
}

/// The distinct keys of one source
#[derive(Debug, Clone, PartialEq)]
pub struct SourceKeys {
    source: String,
    keys: Vec<NormalizedKey>,
}

impl SourceKeys {
    /// Collect keys of a source; duplicates and empty keys are dropped
    pub fn new<I>(source: &str, keys: I) -> Self
    where
        I: IntoIterator<Item = NormalizedKey>,
    {
        let mut keys: Vec<NormalizedKey> = keys.into_iter().filter(|k| !k.is_empty()).collect();
        keys.sort();
        keys.dedup();
        Self {
            source: source.to_string(),
            keys,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Distinct keys in sorted order
    pub fn keys(&self) -> &[NormalizedKey] {
        &self.keys
    }

    /// The keys as a catalog without nutrients, in sorted order
    pub fn to_catalog(&self) -> Catalog {
        Catalog::from_entries(
            &self.source,
            self.keys
                .iter()
                .map(|key| NutrientCatalogEntry::for_key(key, &self.source)),
        )
    }
}

/// Map a confidence onto its tier; lower bounds are inclusive
///
/// ```rust
/// use recipe_reconcile::config::TierThresholds;
/// use recipe_reconcile::linker::{classify_confidence, LinkTier};
///
/// let tiers = TierThresholds::default();
/// assert_eq!(classify_confidence(0.9, &tiers), LinkTier::Equivalence);
/// assert_eq!(classify_confidence(0.7, &tiers), LinkTier::CloseMatch);
/// assert_eq!(classify_confidence(0.69, &tiers), LinkTier::RelatedMatch);
/// ```
pub fn classify_confidence(confidence: f64, tiers: &TierThresholds) -> LinkTier {
    if confidence >= tiers.equivalence {
        LinkTier::Equivalence
    } else if confidence >= tiers.close_match {
        LinkTier::CloseMatch
    } else {
        LinkTier::RelatedMatch
    }
}

/// Per-tier link counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkSummary {
    pub total: usize,
    pub exact: usize,
    pub edit_distance: usize,
    pub equivalence: usize,
    pub close_match: usize,
    pub related_match: usize,
}

impl LinkSummary {
    pub fn from_links(links: &[CrossSourceLink]) -> Self {
        let mut summary = Self::default();
        for link in links {
            summary.total += 1;
            match link.method {
                LinkMethod::Exact => summary.exact += 1,
                LinkMethod::EditDistance => summary.edit_distance += 1,
            }
            match link.tier {
                LinkTier::Equivalence => summary.equivalence += 1,
                LinkTier::CloseMatch => summary.close_match += 1,
                LinkTier::RelatedMatch => summary.related_match += 1,
            }
        }
        summary
    }
}

/// Links keys between every pair of distinct sources
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkClassifier {
    similarity_threshold: f64,
    max_candidates: usize,
    tiers: TierThresholds,
}

impl Default for LinkClassifier {
    fn default() -> Self {
        Self::from_config(&ReconcileConfig::default())
    }
}

impl LinkClassifier {
    pub fn from_config(config: &ReconcileConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold,
            max_candidates: config.max_candidates,
            tiers: config.tiers,
        }
    }

    /// Link every unordered pair of sources
    ///
    /// Pairs are visited in source order (`(0,1), (0,2), ..., (1,2), ...`) and
    /// their links concatenated in that order.
    pub fn link(&self, sources: &[SourceKeys]) -> Vec<CrossSourceLink> {
        let pairs: Vec<(usize, usize)> = (0..sources.len())
            .flat_map(|i| ((i + 1)..sources.len()).map(move |j| (i, j)))
            .collect();

        let links: Vec<CrossSourceLink> = pairs
            .par_iter()
            .map(|&(i, j)| self.link_pair(&sources[i], &sources[j]))
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect();

        let summary = LinkSummary::from_links(&links);
        info!(
            "Linked {} sources: {} links ({} equivalence, {} close, {} related)",
            sources.len(),
            summary.total,
            summary.equivalence,
            summary.close_match,
            summary.related_match
        );
        links
    }

    /// Link the keys of two sources
    ///
    /// Identical keys are always found; edit-distance scoring looks at no more
    /// than `max_candidates` keys of `b` per key of `a` (0 = all).
    pub fn link_pair(&self, a: &SourceKeys, b: &SourceKeys) -> Vec<CrossSourceLink> {
        let catalog = b.to_catalog();
        let matcher = CandidateMatcher::with_limits(
            &catalog,
            MatchMode::CrossSource,
            self.similarity_threshold,
            self.max_candidates,
        );
        let mut links = Vec::new();

        for key_a in &a.keys {
            for found in matcher.similar(key_a) {
                let method = match found.strategy {
                    MatchStrategy::Exact => LinkMethod::Exact,
                    _ => LinkMethod::EditDistance,
                };
                links.push(CrossSourceLink {
                    source_a: a.source.clone(),
                    key_a: key_a.clone(),
                    source_b: b.source.clone(),
                    key_b: found.entry.key.clone(),
                    confidence: found.confidence,
                    tier: classify_confidence(found.confidence, &self.tiers),
                    method,
                });
            }
        }

        debug!(
            "{} <-> {}: {} links from {}x{} keys",
            a.source,
            b.source,
            links.len(),
            a.keys.len(),
            b.keys.len()
        );
        links
    }
}
