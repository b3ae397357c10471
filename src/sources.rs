//! # Source Record Adapters
//!
//! Adapts recipe records of each supported source schema into [`Recipe`]s.
//!
//! ## Formats
//!
//! - [`SourceFormat::Generic`]: `{"id", "title", "instructions",
//!   "ingredients": [{"name", "quantity"}]}`
//! - [`SourceFormat::MealDb`]: TheMealDB records (`idMeal`, `strMeal`, `strInstructions`,
//!   `strIngredient1..20`, `strMeasure1..20`), bare or wrapped in `{"meals": [...]}`
//! - [`SourceFormat::RecipeNlg`]: RecipeNLG corpus rows whose `ingredients` are
//!   full free-text lines; `ingredients` and `directions` may be arrays or
//!   JSON-encoded strings
//!
//! A record that cannot be adapted is rejected with
//! [`ReconcileError::MalformedRecord`] and the rest of the batch continues.

use log::{debug, info, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use crate::errors::{ReconcileError, Result};
use crate::ingredient_model::Recipe;
use crate::text_processing::NormalizerVariant;

/// Maximum numbered ingredient slot in a TheMealDB record
pub const MEALDB_MAX_INGREDIENTS: usize = 20;

/// Schema of a recipe source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceFormat {
    Generic,
    MealDb,
    RecipeNlg,
}

impl SourceFormat {
    /// Name recorded as the source of adapted recipes
    pub fn source_name(&self) -> &'static str {
        match self {
            SourceFormat::Generic => "generic",
            SourceFormat::MealDb => "themealdb",
            SourceFormat::RecipeNlg => "recipenlg",
        }
    }

    /// Key normalizer variant matching the source's naming convention
    pub fn normalizer_variant(&self) -> NormalizerVariant {
        match self {
            SourceFormat::RecipeNlg => NormalizerVariant::FreeText,
            SourceFormat::Generic | SourceFormat::MealDb => NormalizerVariant::Structured,
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source_name())
    }
}

impl FromStr for SourceFormat {
    type Err = ReconcileError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "generic" => Ok(SourceFormat::Generic),
            "mealdb" | "themealdb" => Ok(SourceFormat::MealDb),
            "recipenlg" | "nlg" => Ok(SourceFormat::RecipeNlg),
            other => Err(ReconcileError::Config(format!(
                "unknown source format '{}' (expected generic, mealdb or recipenlg)",
                other
            ))),
        }
    }
}

/// Recipes adapted from one source, with the records that were rejected
#[derive(Debug, Default)]
pub struct SourceBatch {
    pub recipes: Vec<Recipe>,
    pub rejected: Vec<ReconcileError>,
    /// Records dropped because a richer version with the same id exists
    pub duplicates_collapsed: usize,
}

/// Adapt a JSON document of records
///
/// Only a document that is not JSON at all, or not a list of records, is an
/// error; individual bad records land in [`SourceBatch::rejected`].
pub fn parse_records(format: SourceFormat, json: &str) -> Result<SourceBatch> {
    let document: Value = serde_json::from_str(json)?;
    let records = match document {
        Value::Array(records) => records,
        Value::Object(mut object) => {
            let wrapped = object.remove("meals").or_else(|| object.remove("recipes"));
            match wrapped {
                Some(Value::Array(records)) => records,
                // TheMealDB answers an empty search with {"meals": null}
                Some(Value::Null) => Vec::new(),
                _ => vec![Value::Object(object)],
            }
        }
        _ => {
            return Err(ReconcileError::malformed(
                format.source_name(),
                "document is neither a record list nor a record",
            ))
        }
    };

    let mut adapted = Vec::with_capacity(records.len());
    let mut rejected = Vec::new();
    for (position, record) in records.iter().enumerate() {
        match adapt_record(format, record, position) {
            Ok(recipe) => adapted.push(recipe),
            Err(e) => {
                warn!("Skipping {} record: {}", format, e);
                rejected.push(e);
            }
        }
    }

    let (recipes, duplicates_collapsed) = deduplicate(adapted);
    info!(
        "Adapted {} {} recipes ({} rejected, {} duplicates collapsed)",
        recipes.len(),
        format,
        rejected.len(),
        duplicates_collapsed
    );

    Ok(SourceBatch {
        recipes,
        rejected,
        duplicates_collapsed,
    })
}

/// Read and adapt a JSON file of records
pub fn load_records(format: SourceFormat, path: &Path) -> Result<SourceBatch> {
    let json = fs::read_to_string(path)?;
    parse_records(format, &json)
}

/// Adapt a single record; `position` identifies records without an id
pub fn adapt_record(format: SourceFormat, record: &Value, position: usize) -> Result<Recipe> {
    let fallback_id = format!("#{}", position);
    if !record.is_object() {
        return Err(ReconcileError::malformed(fallback_id, "record is not an object"));
    }

    let recipe = match format {
        SourceFormat::Generic => adapt_generic(record, &fallback_id)?,
        SourceFormat::MealDb => adapt_mealdb(record, &fallback_id)?,
        SourceFormat::RecipeNlg => adapt_recipenlg(record, &fallback_id)?,
    };

    if recipe.lines.is_empty() {
        return Err(ReconcileError::malformed(recipe.id, "no ingredient lines"));
    }
    debug!(
        "Adapted {} record '{}' with {} lines",
        format,
        recipe.id,
        recipe.ingredient_count()
    );
    Ok(recipe)
}

/// Keep one recipe per id: the version with the most ingredient lines
///
/// First-seen order is preserved; among equally rich versions the first wins.
pub fn deduplicate(recipes: Vec<Recipe>) -> (Vec<Recipe>, usize) {
    let mut kept: Vec<Recipe> = Vec::with_capacity(recipes.len());
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut collapsed = 0;

    for recipe in recipes {
        match index.get(&recipe.id) {
            Some(&i) => {
                collapsed += 1;
                if recipe.ingredient_count() > kept[i].ingredient_count() {
                    kept[i] = recipe;
                }
            }
            None => {
                index.insert(recipe.id.clone(), kept.len());
                kept.push(recipe);
            }
        }
    }

    (kept, collapsed)
}

fn adapt_generic(record: &Value, fallback_id: &str) -> Result<Recipe> {
    let id = id_field(record, &["id"])
        .ok_or_else(|| ReconcileError::malformed(fallback_id, "missing 'id'"))?;

    let mut recipe = Recipe::new(&id, SourceFormat::Generic.source_name());
    if let Some(title) = text_field(record, "title") {
        recipe = recipe.with_title(&title);
    }
    if let Some(instructions) = text_field(record, "instructions") {
        recipe = recipe.with_instructions(&instructions);
    }

    let Some(Value::Array(ingredients)) = record.get("ingredients") else {
        return Err(ReconcileError::malformed(id, "missing 'ingredients' list"));
    };
    for ingredient in ingredients {
        let name = match ingredient {
            Value::String(name) => Some(name.clone()),
            Value::Object(_) => text_field(ingredient, "name"),
            _ => None,
        };
        let Some(name) = name else {
            debug!("Generic record '{}': skipping unnamed ingredient", id);
            continue;
        };
        let quantity = text_field(ingredient, "quantity").unwrap_or_default();
        recipe.push_line(&name, &quantity);
    }

    Ok(recipe)
}

fn adapt_mealdb(record: &Value, fallback_id: &str) -> Result<Recipe> {
    let id = id_field(record, &["idMeal"])
        .ok_or_else(|| ReconcileError::malformed(fallback_id, "missing 'idMeal'"))?;

    let mut recipe = Recipe::new(&id, SourceFormat::MealDb.source_name());
    if let Some(title) = text_field(record, "strMeal") {
        recipe = recipe.with_title(&title);
    }
    if let Some(instructions) = text_field(record, "strInstructions") {
        recipe = recipe.with_instructions(&instructions);
    }

    for slot in 1..=MEALDB_MAX_INGREDIENTS {
        let Some(name) = text_field(record, &format!("strIngredient{}", slot)) else {
            continue;
        };
        let measure = text_field(record, &format!("strMeasure{}", slot)).unwrap_or_default();
        recipe.push_line(&name, &measure);
    }

    Ok(recipe)
}

fn adapt_recipenlg(record: &Value, fallback_id: &str) -> Result<Recipe> {
    let id = id_field(record, &["id", "recipe_id"])
        .ok_or_else(|| ReconcileError::malformed(fallback_id, "missing 'id'"))?;

    let mut recipe = Recipe::new(&id, SourceFormat::RecipeNlg.source_name());
    if let Some(title) = text_field(record, "title") {
        recipe = recipe.with_title(&title);
    }

    let directions = string_list(record.get("directions"));
    recipe = recipe.with_instructions(&directions.join("\n"));

    if record.get("ingredients").is_none() {
        return Err(ReconcileError::malformed(id, "missing 'ingredients'"));
    }
    for line in string_list(record.get("ingredients")) {
        recipe.push_line(&line, &line);
    }

    Ok(recipe)
}

// Ids may be strings or numbers
fn id_field(record: &Value, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| match record.get(*name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

// Non-empty trimmed string field
fn text_field(record: &Value, name: &str) -> Option<String> {
    match record.get(name)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// An array of strings, a JSON-encoded array of strings, or a single string
fn string_list(value: Option<&Value>) -> Vec<String> {
    let items = match value {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Vec<Value>>(s) {
            Ok(items) => items,
            Err(_) => vec![Value::String(s.clone())],
        },
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match item {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_from_str() {
        assert_eq!("MealDB".parse::<SourceFormat>().unwrap(), SourceFormat::MealDb);
        assert_eq!("recipenlg".parse::<SourceFormat>().unwrap(), SourceFormat::RecipeNlg);
        assert!("csv".parse::<SourceFormat>().is_err());
    }

    #[test]
    fn test_mealdb_record() {
        let record = json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strInstructions": "Preheat oven. Serves 4.",
            "strIngredient1": "soy sauce",
            "strMeasure1": "3/4 cup",
            "strIngredient2": "",
            "strMeasure2": " ",
            "strIngredient3": "chicken breasts",
            "strMeasure3": "2",
            "strIngredient4": null
        });
        let recipe = adapt_record(SourceFormat::MealDb, &record, 0).unwrap();
        assert_eq!(recipe.id, "52772");
        assert_eq!(recipe.source, "themealdb");
        assert_eq!(recipe.ingredient_count(), 2);
        assert_eq!(recipe.lines[1].name, "chicken breasts");
        assert_eq!(recipe.lines[1].position, 1);
        assert_eq!(recipe.lines[0].quantity_text, "3/4 cup");
    }

    #[test]
    fn test_recipenlg_record_with_encoded_lists() {
        let record = json!({
            "id": 17,
            "title": "No-Bake Nut Cookies",
            "ingredients": "[\"1 c. firmly packed brown sugar\", \"1/2 c. evaporated milk\"]",
            "directions": "[\"In a heavy saucepan, mix.\", \"Divide between four plates.\"]"
        });
        let recipe = adapt_record(SourceFormat::RecipeNlg, &record, 0).unwrap();
        assert_eq!(recipe.id, "17");
        assert_eq!(recipe.ingredient_count(), 2);
        assert_eq!(recipe.lines[0].name, recipe.lines[0].quantity_text);
        assert!(recipe.instructions.contains("four plates"));
    }

    #[test]
    fn test_generic_record() {
        let record = json!({
            "id": "g1",
            "ingredients": [{"name": "rice", "quantity": "1 cup"}, "salt", {"quantity": "2"}]
        });
        let recipe = adapt_record(SourceFormat::Generic, &record, 0).unwrap();
        assert_eq!(recipe.ingredient_count(), 2);
        assert_eq!(recipe.lines[1].quantity_text, "");
        assert_eq!(recipe.display_name(), "g1");
    }

    #[test]
    fn test_malformed_records() {
        let no_id = adapt_record(SourceFormat::MealDb, &json!({"strIngredient1": "egg"}), 3);
        match no_id {
            Err(ReconcileError::MalformedRecord { id, .. }) => assert_eq!(id, "#3"),
            other => panic!("expected malformed record, got {:?}", other),
        }

        let no_lines = adapt_record(SourceFormat::MealDb, &json!({"idMeal": "1"}), 0);
        assert!(matches!(no_lines, Err(ReconcileError::MalformedRecord { .. })));

        let not_object = adapt_record(SourceFormat::Generic, &json!([1, 2]), 0);
        assert!(matches!(not_object, Err(ReconcileError::MalformedRecord { .. })));
    }

    #[test]
    fn test_parse_records_collapses_duplicates_and_keeps_going() {
        let json = r#"{"meals": [
            {"idMeal": "1", "strIngredient1": "egg"},
            {"idMeal": "2"},
            {"idMeal": "1", "strIngredient1": "egg", "strIngredient2": "milk"},
            {"idMeal": "3", "strIngredient1": "rice"}
        ]}"#;
        let batch = parse_records(SourceFormat::MealDb, json).unwrap();
        assert_eq!(batch.recipes.len(), 2);
        assert_eq!(batch.recipes[0].id, "1");
        assert_eq!(batch.recipes[0].ingredient_count(), 2);
        assert_eq!(batch.recipes[1].id, "3");
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.duplicates_collapsed, 1);
    }

    #[test]
    fn test_invalid_document() {
        assert!(matches!(
            parse_records(SourceFormat::Generic, "not json"),
            Err(ReconcileError::Json(_))
        ));
        assert!(parse_records(SourceFormat::Generic, "42").is_err());
    }
}
