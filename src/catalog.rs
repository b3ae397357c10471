//! # Nutrient Catalog
//!
//! This module holds the read-only nutrient catalog the candidate matcher
//! resolves ingredient keys against, together with its JSON loaders.
//!
//! ## Supported formats
//!
//! - Generic entries: `{"description", "source_id", "nutrients": {name: {"amount", "unit"}}}`
//! - USDA FoodData Central food details:
//!   `{"fdcId", "description", "foodNutrients": [{"nutrient": {"name", "unitName"}, "amount"}]}`
//! - USDA search results, with flat nutrients `{"nutrientName", "unitName", "value"}`,
//!   either as a bare array or wrapped in `{"foods": [...]}`
//! - USDA abridged foods, with nutrients `{"number", "name", "amount", "unitName"}`
//!
//! Nutrients of a USDA food are read one by one: a nutrient in none of these
//! shapes is skipped with a warning and the food keeps its id and the rest.
//!
//! Catalog keys are derived from descriptions with the structured key
//! normalizer. The catalog preserves insertion order, which the matcher uses
//! for deterministic tie-breaks.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use crate::errors::{ReconcileError, Result};
use crate::ingredient_model::NormalizedKey;
use crate::text_processing::normalize_name;

/// Amount of one nutrient per 100 g of food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientAmount {
    pub amount_per_100g: f64,
    pub unit: String,
}

/// One food in a nutrient catalog
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutrientCatalogEntry {
    /// Normalized key derived from the description
    pub key: NormalizedKey,
    /// Identifier in the catalog's own namespace (e.g., a USDA FDC id)
    pub source_id: String,
    /// Food description as published in the catalog
    pub description: String,
    /// Nutrient name (as given by the catalog) -> amount per 100 g
    pub nutrients: BTreeMap<String, NutrientAmount>,
}

impl NutrientCatalogEntry {
    /// Create an entry whose key is the normalized description
    pub fn new(description: &str, source_id: &str) -> Self {
        Self {
            key: normalize_name(description),
            source_id: source_id.to_string(),
            description: description.to_string(),
            nutrients: BTreeMap::new(),
        }
    }

    /// Create an entry for an already normalized key, without nutrients
    pub fn for_key(key: &NormalizedKey, source_id: &str) -> Self {
        Self {
            key: key.clone(),
            source_id: source_id.to_string(),
            description: key.as_str().to_string(),
            nutrients: BTreeMap::new(),
        }
    }

    /// Add a nutrient amount per 100 g
    pub fn with_nutrient(mut self, name: &str, amount_per_100g: f64, unit: &str) -> Self {
        self.nutrients.insert(
            name.to_string(),
            NutrientAmount {
                amount_per_100g,
                unit: unit.to_string(),
            },
        );
        self
    }
}

/// An order-preserving set of catalog entries indexed by key
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    name: String,
    entries: Vec<NutrientCatalogEntry>,
    index: HashMap<NormalizedKey, usize>,
}

impl Catalog {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Build a catalog from entries, keeping the first entry of each key
    pub fn from_entries<I>(name: &str, entries: I) -> Self
    where
        I: IntoIterator<Item = NutrientCatalogEntry>,
    {
        let mut catalog = Self::new(name);
        for entry in entries {
            catalog.insert(entry);
        }
        catalog
    }

    /// Insert an entry; returns false when the key is empty or already present
    pub fn insert(&mut self, entry: NutrientCatalogEntry) -> bool {
        if entry.key.is_empty() {
            debug!("Skipping catalog entry '{}' with empty key", entry.description);
            return false;
        }
        if self.index.contains_key(&entry.key) {
            debug!(
                "Duplicate catalog key '{}' ({}); keeping first entry",
                entry.key, entry.source_id
            );
            return false;
        }
        self.index.insert(entry.key.clone(), self.entries.len());
        self.entries.push(entry);
        true
    }

    pub fn get(&self, key: &NormalizedKey) -> Option<&NutrientCatalogEntry> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    /// Entries in insertion order
    pub fn entries(&self) -> &[NutrientCatalogEntry] {
        &self.entries
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    Entries(Vec<serde_json::Value>),
    Foods { foods: Vec<serde_json::Value> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCatalogEntry {
    Usda(UsdaFood),
    Generic(GenericEntry),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsdaFood {
    fdc_id: serde_json::Value,
    description: String,
    #[serde(default)]
    food_nutrients: Vec<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UsdaNutrient {
    Detailed {
        nutrient: UsdaNutrientInfo,
        #[serde(default)]
        amount: Option<f64>,
    },
    Flat {
        #[serde(rename = "nutrientName")]
        nutrient_name: String,
        #[serde(rename = "unitName", default)]
        unit_name: String,
        #[serde(default)]
        value: Option<f64>,
    },
    Abridged {
        name: String,
        #[serde(rename = "unitName", default)]
        unit_name: String,
        #[serde(default)]
        amount: Option<f64>,
    },
}

impl UsdaNutrient {
    fn into_parts(self) -> (String, String, Option<f64>) {
        match self {
            UsdaNutrient::Detailed { nutrient, amount } => {
                (nutrient.name, nutrient.unit_name, amount)
            }
            UsdaNutrient::Flat {
                nutrient_name,
                unit_name,
                value,
            } => (nutrient_name, unit_name, value),
            UsdaNutrient::Abridged {
                name,
                unit_name,
                amount,
            } => (name, unit_name, amount),
        }
    }
}

#[derive(Deserialize)]
struct UsdaNutrientInfo {
    name: String,
    #[serde(rename = "unitName", default)]
    unit_name: String,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GenericEntry {
    description: String,
    #[serde(default)]
    source_id: Option<String>,
    #[serde(default)]
    nutrients: BTreeMap<String, GenericNutrient>,
}

#[derive(Deserialize)]
struct GenericNutrient {
    amount: f64,
    #[serde(default)]
    unit: String,
}

impl RawCatalogEntry {
    fn into_entry(self, position: usize) -> NutrientCatalogEntry {
        match self {
            RawCatalogEntry::Usda(food) => {
                let source_id = match food.fdc_id {
                    serde_json::Value::String(id) => id,
                    other => other.to_string(),
                };
                let mut entry = NutrientCatalogEntry::new(&food.description, &source_id);
                for (index, value) in food.food_nutrients.into_iter().enumerate() {
                    let nutrient = match serde_json::from_value::<UsdaNutrient>(value) {
                        Ok(nutrient) => nutrient,
                        Err(e) => {
                            warn!(
                                "Skipping nutrient #{} of '{}' ({}): {}",
                                index, entry.description, entry.source_id, e
                            );
                            continue;
                        }
                    };
                    let (name, unit, amount) = nutrient.into_parts();
                    if let Some(amount) = amount {
                        entry = entry.with_nutrient(&name, amount, &unit);
                    }
                }
                entry
            }
            RawCatalogEntry::Generic(generic) => {
                let source_id = generic
                    .source_id
                    .unwrap_or_else(|| format!("entry-{}", position));
                let mut entry = NutrientCatalogEntry::new(&generic.description, &source_id);
                for (name, nutrient) in generic.nutrients {
                    entry = entry.with_nutrient(&name, nutrient.amount, &nutrient.unit);
                }
                entry
            }
        }
    }
}

/// Parse a catalog from JSON text
///
/// Entries matching neither supported shape are skipped with a warning. A
/// document that is not valid JSON, or that yields no usable entry, is a
/// [`ReconcileError::CatalogLoad`].
pub fn parse_catalog(name: &str, json: &str) -> Result<Catalog> {
    let document: CatalogDocument = serde_json::from_str(json).map_err(|e| {
        ReconcileError::CatalogLoad(format!("catalog '{}' is not valid JSON: {}", name, e))
    })?;
    let values = match document {
        CatalogDocument::Entries(values) => values,
        CatalogDocument::Foods { foods } => foods,
    };

    let mut catalog = Catalog::new(name);
    let mut unusable = 0usize;
    for (position, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<RawCatalogEntry>(value) {
            Ok(raw) => {
                catalog.insert(raw.into_entry(position));
            }
            Err(e) => {
                unusable += 1;
                warn!("Skipping catalog '{}' entry #{}: {}", name, position, e);
            }
        }
    }

    if catalog.is_empty() {
        return Err(ReconcileError::CatalogLoad(format!(
            "catalog '{}' contains no usable entries",
            name
        )));
    }

    info!(
        "Loaded catalog '{}' with {} entries ({} unusable)",
        name,
        catalog.len(),
        unusable
    );
    Ok(catalog)
}

/// Load a catalog from a JSON file, named after the file stem
pub fn load_catalog(path: &Path) -> Result<Catalog> {
    let json = fs::read_to_string(path).map_err(|e| {
        ReconcileError::CatalogLoad(format!("cannot read {}: {}", path.display(), e))
    })?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("catalog");
    parse_catalog(name, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_insert_keeps_order_and_first_duplicate() {
        let mut catalog = Catalog::new("test");
        assert!(catalog.insert(NutrientCatalogEntry::new("Garlic, raw", "1")));
        assert!(catalog.insert(NutrientCatalogEntry::new("Onions", "2")));
        assert!(!catalog.insert(NutrientCatalogEntry::new("GARLIC", "3")));
        assert!(!catalog.insert(NutrientCatalogEntry::new("(nothing)", "4")));

        let keys: Vec<&str> = catalog.entries().iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["garlic", "onions"]);
        assert_eq!(catalog.get(&normalize_name("garlic")).map(|e| e.source_id.as_str()), Some("1"));
    }

    #[test]
    fn test_parse_generic_entries() {
        let json = r#"[
            {"description": "Chicken Breast", "source_id": "usda:171077",
             "nutrients": {"protein": {"amount": 31.0, "unit": "g"}}},
            {"description": "Rice", "nutrients": {}}
        ]"#;
        let catalog = parse_catalog("generic", json).unwrap();
        assert_eq!(catalog.len(), 2);

        let chicken = catalog.get(&normalize_name("chicken breast")).unwrap();
        assert_eq!(chicken.source_id, "usda:171077");
        assert_eq!(chicken.nutrients["protein"].amount_per_100g, 31.0);
        assert_eq!(catalog.entries()[1].source_id, "entry-1");
    }

    #[test]
    fn test_parse_usda_food_details_and_search_form() {
        let json = r#"{"foods": [
            {"fdcId": 171077, "description": "Chicken, broilers or fryers, breast",
             "foodNutrients": [
                {"nutrient": {"name": "Protein", "unitName": "g"}, "amount": 31.0},
                {"nutrient": {"name": "Energy", "unitName": "kcal"}}
             ]},
            {"fdcId": "169756", "description": "Garlic, raw",
             "foodNutrients": [{"nutrientName": "Energy", "unitName": "KCAL", "value": 149.0}]}
        ]}"#;
        let catalog = parse_catalog("usda", json).unwrap();
        assert_eq!(catalog.len(), 2);

        let chicken = &catalog.entries()[0];
        assert_eq!(chicken.source_id, "171077");
        assert_eq!(chicken.nutrients.len(), 1);

        let garlic = catalog.get(&normalize_name("garlic")).unwrap();
        assert_eq!(garlic.source_id, "169756");
        assert_eq!(garlic.nutrients["Energy"].unit, "KCAL");
    }

    #[test]
    fn test_unreadable_nutrient_keeps_the_food() {
        let json = r#"[
            {"fdcId": 1, "description": "Chicken breast",
             "foodNutrients": [
                {"nutrient": {"name": "Protein", "unitName": "g"}, "amount": 31.0},
                {"nutrient": {"id": 1008}, "amount": 2.0}
             ]}
        ]"#;
        let catalog = parse_catalog("usda", json).unwrap();
        let chicken = catalog.get(&normalize_name("chicken breast")).unwrap();
        assert_eq!(chicken.source_id, "1");
        assert_eq!(chicken.nutrients.len(), 1);
        assert_eq!(chicken.nutrients["Protein"].amount_per_100g, 31.0);
    }

    #[test]
    fn test_parse_usda_abridged_form() {
        let json = r#"[
            {"fdcId": 169756, "description": "Rice, white, cooked",
             "foodNutrients": [
                {"number": "203", "name": "Protein", "amount": 2.7, "unitName": "G"},
                {"number": "208", "name": "Energy", "amount": 130.0, "unitName": "KCAL"}
             ]}
        ]"#;
        let catalog = parse_catalog("usda", json).unwrap();
        let rice = &catalog.entries()[0];
        assert_eq!(rice.source_id, "169756");
        assert_eq!(rice.nutrients.len(), 2);
        assert_eq!(rice.nutrients["Energy"].amount_per_100g, 130.0);
    }

    #[test]
    fn test_unusable_entries_are_skipped() {
        let json = r#"[
            {"name": "no description"},
            {"description": "Oats", "foodNutrients": []},
            {"description": "Salt"}
        ]"#;
        let catalog = parse_catalog("mixed", json).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].source_id, "entry-2");
    }

    #[test]
    fn test_empty_or_invalid_catalog_is_an_error() {
        assert!(matches!(
            parse_catalog("empty", "[]"),
            Err(ReconcileError::CatalogLoad(_))
        ));
        assert!(matches!(
            parse_catalog("broken", "{not json"),
            Err(ReconcileError::CatalogLoad(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"[{{"description": "Butter", "source_id": "b1"}}]"#).unwrap();

        let catalog = load_catalog(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(!catalog.name().is_empty());

        let missing = load_catalog(Path::new("/nonexistent/catalog.json"));
        assert!(matches!(missing, Err(ReconcileError::CatalogLoad(_))));
    }
}
