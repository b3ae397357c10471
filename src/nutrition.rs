//! # Nutrition Aggregator
//!
//! Accumulates the nutrients of matched ingredient lines into recipe totals and
//! derives rounded per-serving figures.
//!
//! ## Tracked nutrients
//!
//! Energy (kcal), protein, fat, carbohydrate, fiber and sugar. Catalog nutrient
//! names are mapped onto these through an alias table covering the USDA
//! FoodData Central names ("Total lipid (fat)", "Carbohydrate, by difference",
//! ...) and common short names. Energy given in kJ is converted to kcal.
//!
//! ## Usage
//!
//! ```rust
//! use recipe_reconcile::catalog::NutrientCatalogEntry;
//! use recipe_reconcile::config::ReconcileConfig;
//! use recipe_reconcile::ingredient_model::IngredientLine;
//! use recipe_reconcile::nutrition::NutritionAggregator;
//!
//! let chicken = NutrientCatalogEntry::new("Chicken breast", "171077")
//!     .with_nutrient("Protein", 31.0, "g");
//! let line = IngredientLine::new("Chicken Breast", "1 lb", 0);
//!
//! let mut aggregator = NutritionAggregator::new("52772", &ReconcileConfig::default());
//! aggregator.add_line(&line, 453.6, &chicken);
//! let nutrition = aggregator.finalize(2);
//!
//! assert_eq!(nutrition.per_serving.protein_g, 70.3);
//! assert!(nutrition.warning.is_none());
//! ```

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::AddAssign;
use std::sync::LazyLock;

use crate::catalog::NutrientCatalogEntry;
use crate::config::ReconcileConfig;
use crate::ingredient_model::IngredientLine;

/// Kilojoules per kilocalorie
pub const KJ_PER_KCAL: f64 = 4.184;

/// Nutrients tracked by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Nutrient {
    Energy,
    Protein,
    Fat,
    Carbohydrate,
    Fiber,
    Sugar,
}

/// Lower-cased catalog nutrient name -> tracked nutrient
static NUTRIENT_ALIASES: LazyLock<HashMap<&'static str, Nutrient>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    for alias in ["energy", "calories", "energy (atwater general factors)", "kcal"] {
        map.insert(alias, Nutrient::Energy);
    }
    map.insert("protein", Nutrient::Protein);
    for alias in ["total lipid (fat)", "fat", "total fat", "lipids"] {
        map.insert(alias, Nutrient::Fat);
    }
    for alias in [
        "carbohydrate, by difference",
        "carbohydrate",
        "carbohydrates",
        "carbs",
        "total carbohydrate",
    ] {
        map.insert(alias, Nutrient::Carbohydrate);
    }
    for alias in ["fiber, total dietary", "fiber", "fibre", "dietary fiber"] {
        map.insert(alias, Nutrient::Fiber);
    }
    for alias in [
        "sugars, total including nlea",
        "sugars, total",
        "total sugars",
        "sugars",
        "sugar",
    ] {
        map.insert(alias, Nutrient::Sugar);
    }

    map
});

impl Nutrient {
    /// Map a catalog nutrient name onto a tracked nutrient
    pub fn from_catalog_name(name: &str) -> Option<Self> {
        NUTRIENT_ALIASES.get(name.trim().to_lowercase().as_str()).copied()
    }
}

/// Amounts of the tracked nutrients
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutrientProfile {
    pub energy_kcal: f64,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbohydrate_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
}

impl NutrientProfile {
    /// Per-100 g profile of a catalog entry
    ///
    /// When a catalog lists energy both in kcal and in kJ, the kcal figure wins.
    pub fn per_100g(entry: &NutrientCatalogEntry) -> Self {
        let mut profile = Self::default();
        let mut energy_kcal = None;
        let mut energy_from_kj = None;

        for (name, amount) in &entry.nutrients {
            let Some(nutrient) = Nutrient::from_catalog_name(name) else {
                continue;
            };
            let value = amount.amount_per_100g;
            match nutrient {
                Nutrient::Energy if amount.unit.eq_ignore_ascii_case("kj") => {
                    energy_from_kj.get_or_insert(value / KJ_PER_KCAL);
                }
                Nutrient::Energy => {
                    energy_kcal.get_or_insert(value);
                }
                other => {
                    let slot = profile.slot_mut(other);
                    if *slot == 0.0 {
                        *slot = value;
                    }
                }
            }
        }

        profile.energy_kcal = energy_kcal.or(energy_from_kj).unwrap_or(0.0);
        profile
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Energy => self.energy_kcal,
            Nutrient::Protein => self.protein_g,
            Nutrient::Fat => self.fat_g,
            Nutrient::Carbohydrate => self.carbohydrate_g,
            Nutrient::Fiber => self.fiber_g,
            Nutrient::Sugar => self.sugar_g,
        }
    }

    fn slot_mut(&mut self, nutrient: Nutrient) -> &mut f64 {
        match nutrient {
            Nutrient::Energy => &mut self.energy_kcal,
            Nutrient::Protein => &mut self.protein_g,
            Nutrient::Fat => &mut self.fat_g,
            Nutrient::Carbohydrate => &mut self.carbohydrate_g,
            Nutrient::Fiber => &mut self.fiber_g,
            Nutrient::Sugar => &mut self.sugar_g,
        }
    }

    /// Multiply every amount by a factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            energy_kcal: self.energy_kcal * factor,
            protein_g: self.protein_g * factor,
            fat_g: self.fat_g * factor,
            carbohydrate_g: self.carbohydrate_g * factor,
            fiber_g: self.fiber_g * factor,
            sugar_g: self.sugar_g * factor,
        }
    }
}

impl AddAssign for NutrientProfile {
    fn add_assign(&mut self, other: Self) {
        self.energy_kcal += other.energy_kcal;
        self.protein_g += other.protein_g;
        self.fat_g += other.fat_g;
        self.carbohydrate_g += other.carbohydrate_g;
        self.fiber_g += other.fiber_g;
        self.sugar_g += other.sugar_g;
    }
}

/// Rounded per-serving nutrition: integer kcal, grams to one decimal
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerServingNutrition {
    pub energy_kcal: u32,
    pub protein_g: f64,
    pub fat_g: f64,
    pub carbohydrate_g: f64,
    pub fiber_g: f64,
    pub sugar_g: f64,
}

impl PerServingNutrition {
    fn from_profile(profile: &NutrientProfile) -> Self {
        Self {
            energy_kcal: profile.energy_kcal.max(0.0).round() as u32,
            protein_g: round_one_decimal(profile.protein_g),
            fat_g: round_one_decimal(profile.fat_g),
            carbohydrate_g: round_one_decimal(profile.carbohydrate_g),
            fiber_g: round_one_decimal(profile.fiber_g),
            sugar_g: round_one_decimal(profile.sugar_g),
        }
    }
}

/// A matched line whose mass exceeds the high-mass bound
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighMassLine {
    pub name: String,
    pub grams: f64,
}

/// Flag raised when per-serving energy exceeds the sanity bound
///
/// Values are reported as computed; the warning never corrects them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalorieWarning {
    pub energy_kcal_per_serving: u32,
    pub threshold_kcal: f64,
    /// Likely culprits, heaviest first
    pub high_mass_lines: Vec<HighMassLine>,
}

/// Running totals for one recipe
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecipeNutritionTotals {
    pub totals: NutrientProfile,
    pub lines_matched: usize,
    pub total_mass_grams: f64,
}

/// Final nutrition of one recipe
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedNutrition {
    pub servings: u32,
    pub totals: RecipeNutritionTotals,
    pub per_serving: PerServingNutrition,
    pub warning: Option<CalorieWarning>,
}

/// Accumulates matched lines of a single recipe
#[derive(Debug, Clone)]
pub struct NutritionAggregator {
    recipe_id: String,
    totals: RecipeNutritionTotals,
    matched_lines: Vec<HighMassLine>,
    calorie_warning_kcal: f64,
    high_mass_line_grams: f64,
}

impl NutritionAggregator {
    pub fn new(recipe_id: &str, config: &ReconcileConfig) -> Self {
        Self {
            recipe_id: recipe_id.to_string(),
            totals: RecipeNutritionTotals::default(),
            matched_lines: Vec::new(),
            calorie_warning_kcal: config.calorie_warning_kcal,
            high_mass_line_grams: config.high_mass_line_grams,
        }
    }

    /// Add the contribution of a matched line: `per_100g * mass / 100`
    pub fn add_line(
        &mut self,
        line: &IngredientLine,
        mass_grams: f64,
        entry: &NutrientCatalogEntry,
    ) {
        let contribution = NutrientProfile::per_100g(entry).scaled(mass_grams / 100.0);
        debug!(
            "[{}] {} ({:.1}g) -> {:.0} kcal via '{}'",
            self.recipe_id, line.name, mass_grams, contribution.energy_kcal, entry.key
        );

        self.totals.totals += contribution;
        self.totals.lines_matched += 1;
        self.totals.total_mass_grams += mass_grams;
        self.matched_lines.push(HighMassLine {
            name: line.name.clone(),
            grams: mass_grams,
        });
    }

    /// Running totals so far
    pub fn totals(&self) -> &RecipeNutritionTotals {
        &self.totals
    }

    /// Divide the totals by the serving count, round, and check the calorie bound
    pub fn finalize(self, servings: u32) -> AggregatedNutrition {
        let servings = servings.max(1);
        let per_serving =
            PerServingNutrition::from_profile(&self.totals.totals.scaled(1.0 / servings as f64));

        let warning = if f64::from(per_serving.energy_kcal) > self.calorie_warning_kcal {
            let mut high_mass_lines: Vec<HighMassLine> = self
                .matched_lines
                .into_iter()
                .filter(|line| line.grams > self.high_mass_line_grams)
                .collect();
            high_mass_lines.sort_by(|a, b| {
                b.grams
                    .total_cmp(&a.grams)
                    .then_with(|| a.name.cmp(&b.name))
            });

            warn!(
                "Recipe {}: {} kcal per serving exceeds {} kcal (high-mass lines: {})",
                self.recipe_id,
                per_serving.energy_kcal,
                self.calorie_warning_kcal,
                high_mass_lines
                    .iter()
                    .map(|line| format!("{} {:.0}g", line.name, line.grams))
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            Some(CalorieWarning {
                energy_kcal_per_serving: per_serving.energy_kcal,
                threshold_kcal: self.calorie_warning_kcal,
                high_mass_lines,
            })
        } else {
            None
        };

        AggregatedNutrition {
            servings,
            totals: self.totals,
            per_serving,
            warning,
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
