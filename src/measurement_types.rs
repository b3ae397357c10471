//! # Measurement Types Module
//!
//! This module defines the unit conversion tables used to turn a free-text
//! amount into an estimated mass in grams.
//!
//! Volume units assume a water-like density and are deliberately conservative
//! (1 cup ≈ 120 g). Count-ish words ("clove", "large") carry an average item
//! mass. Recognized measurement words without a sensible mass ("can", "bunch")
//! fall back to [`UNKNOWN_UNIT_GRAMS`] per unit.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

/// Grams per unit for recognized measurement words with no mass estimate
pub const UNKNOWN_UNIT_GRAMS: f64 = 30.0;
/// Grams assumed for a fraction with no unit (a cup equivalent)
pub const CUP_GRAMS: f64 = 120.0;
/// Average mass of a counted whole item ("3 avocados")
pub const ITEM_GRAMS: f64 = 100.0;
/// Grams per tablespoon-equivalent for mid-sized unit-less numbers
pub const TABLESPOON_GRAMS: f64 = 15.0;
/// Result when the text carries no number at all (including empty input)
pub const NO_AMOUNT_GRAMS: f64 = 30.0;
/// Unit-less counts up to this value are item counts
pub const MAX_ITEM_COUNT: f64 = 10.0;
/// Unit-less numbers from this value on are read as milliliters
pub const MIN_MILLILITER_COUNT: f64 = 100.0;

/// Garnish-like phrasing that always resolves to the garnish default
pub const ALWAYS_VANISHING_TERMS: &[&str] = &[
    "drizzle", "splash", "sprinkle", "garnish", "to taste", "to serve", "handful",
];

/// Phrasing that resolves to the garnish default only when no digit is present
pub const NON_NUMERIC_VANISHING_TERMS: &[&str] = &["pinch", "dash", "a little", "some"];

/// Broad category of a measurement unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnitKind {
    /// Exact gram-based weights
    Weight,
    /// Volumes converted with a water-like density
    Volume,
    /// Counts and size words with an average item mass
    Count,
}

/// A unit with a known gram conversion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitConversion {
    /// Estimated grams for one unit
    pub grams_per_unit: f64,
    /// Category of the unit
    pub kind: UnitKind,
}

/// Outcome of looking a word up in the unit tables
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnitLookup {
    /// A unit with a gram conversion
    Convertible(UnitConversion),
    /// A recognized measurement word with no gram estimate
    Unestimated,
    /// Not a unit; the preceding number is an item count
    NotAUnit,
}

/// Unit word → gram conversion
pub static GRAM_CONVERSIONS: LazyLock<HashMap<&'static str, UnitConversion>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();

        let weight = |grams| UnitConversion {
            grams_per_unit: grams,
            kind: UnitKind::Weight,
        };
        let volume = |grams| UnitConversion {
            grams_per_unit: grams,
            kind: UnitKind::Volume,
        };
        let count = |grams| UnitConversion {
            grams_per_unit: grams,
            kind: UnitKind::Count,
        };

        // Weight units
        for word in ["g", "gr", "gram", "grams", "gramme", "grammes"] {
            map.insert(word, weight(1.0));
        }
        for word in ["kg", "kilo", "kilogram", "kilograms"] {
            map.insert(word, weight(1000.0));
        }
        for word in ["mg", "milligram", "milligrams"] {
            map.insert(word, weight(0.001));
        }
        for word in ["oz", "ounce", "ounces"] {
            map.insert(word, weight(28.35));
        }
        for word in ["lb", "lbs", "pound", "pounds"] {
            map.insert(word, weight(453.6));
        }

        // Volume units
        for word in ["cup", "cups", "c"] {
            map.insert(word, volume(CUP_GRAMS));
        }
        for word in ["tbsp", "tbs", "tb", "tbl", "tablespoon", "tablespoons"] {
            map.insert(word, volume(15.0));
        }
        for word in ["tsp", "ts", "teaspoon", "teaspoons"] {
            map.insert(word, volume(5.0));
        }
        for word in ["ml", "milliliter", "milliliters", "millilitre", "millilitres"] {
            map.insert(word, volume(1.0));
        }
        map.insert("cl", volume(10.0));
        map.insert("dl", volume(100.0));
        for word in ["l", "liter", "liters", "litre", "litres"] {
            map.insert(word, volume(1000.0));
        }
        for word in ["fl", "floz"] {
            map.insert(word, volume(30.0));
        }
        for word in ["pint", "pints", "pt"] {
            map.insert(word, volume(2.0 * CUP_GRAMS));
        }
        for word in ["quart", "quarts", "qt"] {
            map.insert(word, volume(4.0 * CUP_GRAMS));
        }

        // Count-ish units
        for word in ["clove", "cloves"] {
            map.insert(word, count(3.0));
        }
        map.insert("pinch", count(0.5));
        map.insert("dash", count(0.5));
        for word in ["slice", "slices"] {
            map.insert(word, count(15.0));
        }
        for word in ["piece", "pieces"] {
            map.insert(word, count(25.0));
        }
        map.insert("whole", count(40.0));
        map.insert("small", count(30.0));
        map.insert("medium", count(60.0));
        map.insert("large", count(100.0));
        for word in ["fillet", "fillets"] {
            map.insert(word, count(120.0));
        }
        for word in ["breast", "breasts"] {
            map.insert(word, count(150.0));
        }

        map
    });

/// Measurement and container words without a gram estimate
pub static UNESTIMATED_UNITS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "can", "tin", "jar", "packet", "package", "pkg", "pack", "bunch", "sprig", "stalk",
        "stick", "cube", "bag", "bottle", "sheet", "knob", "head", "leaf", "leaves", "box",
        "carton", "sachet", "envelope", "bar", "drop", "handful", "scoop", "rasher",
    ]
    .into_iter()
    .collect()
});

/// Unit tokens stripped from free-text corpus lines by the key normalizer
pub static FREE_TEXT_UNIT_TOKENS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "cup", "cups", "c", "tsp", "teaspoon", "teaspoons", "tbsp", "tablespoon",
        "tablespoons", "oz", "ounce", "ounces", "lb", "lbs", "pound", "pounds", "g", "gr",
        "gram", "grams", "kg", "kilogram", "kilograms", "ml", "milliliter", "milliliters", "l",
        "liter", "liters", "can", "cans", "pkg", "package", "packages", "slice", "slices",
        "pinch", "pinches", "dash", "dashes", "clove", "cloves", "pint", "pints", "qt", "quart",
        "quarts", "stick", "sticks", "jar", "jars",
    ]
    .into_iter()
    .collect()
});

/// Look a unit word up, trying the plural-stripped forms as well
///
/// # Examples
///
/// ```rust
/// use recipe_reconcile::measurement_types::{lookup_unit, UnitLookup};
///
/// assert!(matches!(lookup_unit("tbsp"), UnitLookup::Convertible(_)));
/// assert!(matches!(lookup_unit("pinches"), UnitLookup::Convertible(_)));
/// assert_eq!(lookup_unit("cans"), UnitLookup::Unestimated);
/// assert_eq!(lookup_unit("avocado"), UnitLookup::NotAUnit);
/// ```
pub fn lookup_unit(word: &str) -> UnitLookup {
    let word = word.trim().to_lowercase();

    for candidate in singular_forms(&word) {
        if let Some(conversion) = GRAM_CONVERSIONS.get(candidate) {
            return UnitLookup::Convertible(*conversion);
        }
        if UNESTIMATED_UNITS.contains(candidate) {
            return UnitLookup::Unestimated;
        }
    }

    UnitLookup::NotAUnit
}

/// Whether a free-text token is a measurement unit (plural-insensitive)
pub fn is_free_text_unit(token: &str) -> bool {
    singular_forms(token)
        .into_iter()
        .any(|candidate| FREE_TEXT_UNIT_TOKENS.contains(candidate))
}

fn singular_forms(word: &str) -> Vec<&str> {
    let mut forms = vec![word];
    if word.len() > 1 {
        if let Some(stripped) = word.strip_suffix('s') {
            forms.push(stripped);
        }
        if let Some(stripped) = word.strip_suffix("es") {
            forms.push(stripped);
        }
    }
    forms
}
