//! # Recipe and Ingredient Data Model
//!
//! This module defines the data structures shared by every stage of the
//! reconciliation pipeline: recipes decomposed into ingredient lines, and the
//! normalized keys derived from ingredient names.
//!
//! ## Core Concepts
//!
//! - **Recipe**: one record from one source, with free-text instructions
//! - **IngredientLine**: one (name, quantity text) occurrence within a recipe
//! - **NormalizedKey**: the canonical lookup key derived from an ingredient name
//!
//! ## Usage
//!
//! ```rust
//! use recipe_reconcile::ingredient_model::{IngredientLine, Recipe};
//!
//! let recipe = Recipe::new("52772", "themealdb")
//!     .with_title("Teriyaki Chicken Casserole")
//!     .with_instructions("Preheat oven to 350F. Serves 4.")
//!     .with_line("soy sauce", "3/4 cup")
//!     .with_line("chicken breasts", "2");
//!
//! assert_eq!(recipe.ingredient_count(), 2);
//! assert_eq!(recipe.lines[1].position, 1);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// One ingredient occurrence within one recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientLine {
    /// Raw ingredient name as given by the source (e.g., "Chicken Breast", "2 cups flour")
    pub name: String,

    /// Raw quantity/unit text (e.g., "1 lb", "1/2 cup", "to taste")
    pub quantity_text: String,

    /// Position of the line within its recipe, starting at 0
    pub position: usize,
}

/// A recipe record adapted from any source schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Identifier within its source
    pub id: String,

    /// Name of the source dataset (e.g., "themealdb", "recipenlg")
    pub source: String,

    /// Optional human-readable title
    pub title: Option<String>,

    /// Free-text instructions, used to recover the serving count
    pub instructions: String,

    /// Ordered ingredient lines
    pub lines: Vec<IngredientLine>,
}

/// Canonical lower-case token sequence derived from an ingredient name
///
/// Keys are only produced by [`crate::text_processing`]; the normalization is
/// idempotent, so a key fed back through the normalizer is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl IngredientLine {
    /// Create a new ingredient line
    pub fn new(name: &str, quantity_text: &str, position: usize) -> Self {
        Self {
            name: name.to_string(),
            quantity_text: quantity_text.to_string(),
            position,
        }
    }
}

impl Recipe {
    /// Create a new recipe with no instructions and no lines
    pub fn new(id: &str, source: &str) -> Self {
        Self {
            id: id.to_string(),
            source: source.to_string(),
            title: None,
            instructions: String::new(),
            lines: Vec::new(),
        }
    }

    /// Set the recipe title
    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    /// Set the free-text instructions
    pub fn with_instructions(mut self, instructions: &str) -> Self {
        self.instructions = instructions.to_string();
        self
    }

    /// Append an ingredient line; its position is the current line count
    pub fn with_line(mut self, name: &str, quantity_text: &str) -> Self {
        self.push_line(name, quantity_text);
        self
    }

    /// Append an ingredient line in place
    pub fn push_line(&mut self, name: &str, quantity_text: &str) {
        let position = self.lines.len();
        self.lines.push(IngredientLine::new(name, quantity_text, position));
    }

    /// Number of ingredient lines
    pub fn ingredient_count(&self) -> usize {
        self.lines.len()
    }

    /// Title if present, identifier otherwise
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

impl NormalizedKey {
    pub(crate) fn from_normalized(key: String) -> Self {
        Self(key)
    }

    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether normalization removed every token
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whitespace-separated tokens of the key
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    /// Underscore-joined identifier form ("all purpose flour" -> "all_purpose_flour")
    pub fn slug(&self) -> String {
        self.0.replace(' ', "_")
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for IngredientLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.quantity_text.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.quantity_text, self.name)
        }
    }
}

impl fmt::Display for Recipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} [{}:{}] ({} ingredients):",
            self.display_name(),
            self.source,
            self.id,
            self.ingredient_count()
        )?;
        for line in &self.lines {
            writeln!(f, "  • {}", line)?;
        }
        Ok(())
    }
}
