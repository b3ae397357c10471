//! # Reconciliation Pipeline
//!
//! This module drives a batch: every recipe line is normalized, weighed and
//! matched against the nutrient catalog, recipes are aggregated into
//! per-serving nutrition, and the keys of all sources are optionally linked.
//!
//! Recipes are independent, so a batch is processed in parallel with the
//! catalog shared by reference; results keep the input order.

use chrono::{DateTime, Utc};
use log::{debug, info};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug_span, info_span};

use crate::catalog::Catalog;
use crate::config::ReconcileConfig;
use crate::dietary::{classify, DietaryFlags};
use crate::errors::ReconcileError;
use crate::ingredient_model::{NormalizedKey, Recipe};
use crate::linker::{CrossSourceLink, LinkClassifier, LinkSummary, SourceKeys};
use crate::matcher::{CandidateMatcher, MatchMode, MatchStrategy};
use crate::nutrition::{CalorieWarning, NutritionAggregator, PerServingNutrition};
use crate::quantity::QuantityNormalizer;
use crate::servings::estimate_servings;
use crate::sources::{SourceBatch, SourceFormat};
use crate::text_processing::{normalize_with, NormalizerVariant};

/// Outcome of one ingredient line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineReport {
    pub name: String,
    pub key: NormalizedKey,
    pub grams: f64,
    /// Catalog key the line resolved to, if any
    pub matched: Option<NormalizedKey>,
    pub strategy: Option<MatchStrategy>,
    pub confidence: Option<f64>,
}

/// Per-serving nutrition of one recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecipeNutrition {
    pub recipe_id: String,
    pub source: String,
    pub title: Option<String>,
    pub servings: u32,
    pub per_serving: PerServingNutrition,
    pub warning: Option<CalorieWarning>,
    pub lines_matched: usize,
    pub lines_total: usize,
    pub dietary: DietaryFlags,
    pub lines: Vec<LineReport>,
}

/// A record left out of the batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

impl From<&ReconcileError> for SkippedRecord {
    fn from(error: &ReconcileError) -> Self {
        match error {
            ReconcileError::MalformedRecord { id, reason } => Self {
                id: id.clone(),
                reason: reason.clone(),
            },
            other => Self {
                id: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Counters of one batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub recipes_total: usize,
    pub recipes_processed: usize,
    pub recipes_skipped: usize,
    pub lines_total: usize,
    pub lines_matched: usize,
    pub recipes_with_warnings: usize,
    /// Share of lines with a catalog match, in `[0, 1]`
    pub match_rate: f64,
}

impl BatchSummary {
    fn from_results(recipes: &[RecipeNutrition], skipped: usize) -> Self {
        let lines_total: usize = recipes.iter().map(|r| r.lines_total).sum();
        let lines_matched: usize = recipes.iter().map(|r| r.lines_matched).sum();
        Self {
            recipes_total: recipes.len() + skipped,
            recipes_processed: recipes.len(),
            recipes_skipped: skipped,
            lines_total,
            lines_matched,
            recipes_with_warnings: recipes.iter().filter(|r| r.warning.is_some()).count(),
            match_rate: if lines_total == 0 {
                0.0
            } else {
                lines_matched as f64 / lines_total as f64
            },
        }
    }
}

/// Results of one source
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub summary: BatchSummary,
    pub duplicates_collapsed: usize,
    pub skipped: Vec<SkippedRecord>,
    pub recipes: Vec<RecipeNutrition>,
}

/// Results of a whole reconciliation run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconcileReport {
    pub generated_at: DateTime<Utc>,
    pub catalog: String,
    pub catalog_entries: usize,
    pub config: ReconcileConfig,
    pub sources: Vec<SourceReport>,
    pub links: Vec<CrossSourceLink>,
    pub link_summary: Option<LinkSummary>,
}

/// Reconciles recipes against one catalog
#[derive(Debug, Clone)]
pub struct ReconcilePipeline<'a> {
    catalog: &'a Catalog,
    config: ReconcileConfig,
    quantities: QuantityNormalizer,
}

impl<'a> ReconcilePipeline<'a> {
    pub fn new(catalog: &'a Catalog, config: ReconcileConfig) -> Self {
        let quantities = QuantityNormalizer::from_config(&config);
        Self {
            catalog,
            config,
            quantities,
        }
    }

    /// Reconcile a single recipe
    pub fn reconcile_recipe(
        &self,
        recipe: &Recipe,
        variant: NormalizerVariant,
    ) -> RecipeNutrition {
        let _span = debug_span!("recipe", id = %recipe.id).entered();
        let matcher =
            CandidateMatcher::new(self.catalog, &self.config, MatchMode::NutrientLookup);
        let mut aggregator = NutritionAggregator::new(&recipe.id, &self.config);
        let mut lines = Vec::with_capacity(recipe.lines.len());

        for line in &recipe.lines {
            let key = normalize_with(&line.name, variant);
            let grams = self.quantities.parse_measure(&line.quantity_text);
            let found = matcher.resolve(&key);

            if let Some(m) = &found {
                aggregator.add_line(line, grams, m.entry);
            } else {
                debug!("[{}] no catalog match for '{}'", recipe.id, line.name);
            }

            lines.push(LineReport {
                name: line.name.clone(),
                key,
                grams,
                matched: found.map(|m| m.entry.key.clone()),
                strategy: found.map(|m| m.strategy),
                confidence: found.map(|m| m.confidence),
            });
        }

        let servings = estimate_servings(&recipe.instructions, recipe.ingredient_count());
        let dietary = classify(lines.iter().map(|line| &line.key));
        let nutrition = aggregator.finalize(servings);

        RecipeNutrition {
            recipe_id: recipe.id.clone(),
            source: recipe.source.clone(),
            title: recipe.title.clone(),
            servings: nutrition.servings,
            per_serving: nutrition.per_serving,
            warning: nutrition.warning,
            lines_matched: nutrition.totals.lines_matched,
            lines_total: recipe.ingredient_count(),
            dietary,
            lines,
        }
    }

    /// Reconcile every recipe of an adapted source batch
    pub fn run(&self, format: SourceFormat, batch: &SourceBatch) -> SourceReport {
        let _span =
            info_span!("batch", source = %format, recipes = batch.recipes.len()).entered();
        let variant = format.normalizer_variant();

        let recipes: Vec<RecipeNutrition> = batch
            .recipes
            .par_iter()
            .map(|recipe| self.reconcile_recipe(recipe, variant))
            .collect();

        let skipped: Vec<SkippedRecord> =
            batch.rejected.iter().map(SkippedRecord::from).collect();
        let summary = BatchSummary::from_results(&recipes, skipped.len());
        info!(
            "{}: {}/{} recipes processed, {}/{} lines matched ({:.1}%), {} calorie warnings",
            format,
            summary.recipes_processed,
            summary.recipes_total,
            summary.lines_matched,
            summary.lines_total,
            summary.match_rate * 100.0,
            summary.recipes_with_warnings
        );

        SourceReport {
            source: format.source_name().to_string(),
            summary,
            duplicates_collapsed: batch.duplicates_collapsed,
            skipped,
            recipes,
        }
    }
}

/// Distinct ingredient keys of a source batch, for cross-source linking
pub fn source_keys(format: SourceFormat, batch: &SourceBatch) -> SourceKeys {
    let variant = format.normalizer_variant();
    SourceKeys::new(
        format.source_name(),
        batch
            .recipes
            .iter()
            .flat_map(|recipe| recipe.lines.iter())
            .map(|line| normalize_with(&line.name, variant)),
    )
}

/// Reconcile every source against the catalog, optionally linking their keys
pub fn reconcile_sources(
    catalog: &Catalog,
    config: &ReconcileConfig,
    inputs: &[(SourceFormat, SourceBatch)],
    link: bool,
) -> ReconcileReport {
    let pipeline = ReconcilePipeline::new(catalog, config.clone());
    let sources: Vec<SourceReport> = inputs
        .iter()
        .map(|(format, batch)| pipeline.run(*format, batch))
        .collect();

    let (links, link_summary) = if link {
        let keys: Vec<SourceKeys> = inputs
            .iter()
            .map(|(format, batch)| source_keys(*format, batch))
            .collect();
        let links = LinkClassifier::from_config(config).link(&keys);
        let summary = LinkSummary::from_links(&links);
        (links, Some(summary))
    } else {
        (Vec::new(), None)
    };

    ReconcileReport {
        generated_at: Utc::now(),
        catalog: catalog.name().to_string(),
        catalog_entries: catalog.len(),
        config: config.clone(),
        sources,
        links,
        link_summary,
    }
}
