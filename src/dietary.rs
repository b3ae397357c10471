//! # Dietary Classification
//!
//! Diet and allergen flags expressed as data: each [`DietCategory`] owns a
//! keyword table, and a recipe is classified by a pure function over its
//! normalized ingredient keys.
//!
//! A keyword hits a token it starts or ends, so compounds such as
//! "breadcrumbs", "meatballs" and "buttermilk" are caught along with plurals.
//! Multi-word keywords match consecutive tokens. An exception table, matched
//! on whole tokens, covers plant foods named after animal products or grains
//! ("peanut butter", "coconut milk", "eggplant", "buckwheat").

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::ingredient_model::NormalizedKey;

/// A dietary restriction violated by an ingredient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietCategory {
    /// Animal products; excludes the recipe from vegan
    NonVegan,
    /// Meat and fish; excludes the recipe from vegetarian and vegan
    NonVegetarian,
    /// Gluten sources; excludes the recipe from gluten-free
    Gluten,
}

impl DietCategory {
    pub const ALL: [DietCategory; 3] = [
        DietCategory::NonVegan,
        DietCategory::NonVegetarian,
        DietCategory::Gluten,
    ];
}

static CATEGORY_KEYWORDS: LazyLock<HashMap<DietCategory, Vec<&'static str>>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        map.insert(
            DietCategory::NonVegan,
            vec![
                "egg", "chicken", "beef", "pork", "fish", "milk", "cheese", "butter", "honey",
                "gelatin", "cream", "yogurt", "salmon",
            ],
        );
        map.insert(
            DietCategory::NonVegetarian,
            vec![
                "chicken", "beef", "pork", "fish", "gelatin", "salmon", "prawn", "shrimp", "meat",
                "bacon",
            ],
        );
        map.insert(
            DietCategory::Gluten,
            vec![
                "wheat", "flour", "bread", "pasta", "barley", "semolina", "noodle", "soy sauce",
            ],
        );
        map
    });

/// Keys containing one of these phrases are exempt from the category
static CATEGORY_EXCEPTIONS: LazyLock<HashMap<DietCategory, Vec<&'static str>>> =
    LazyLock::new(|| {
        let mut map = HashMap::new();
        map.insert(
            DietCategory::NonVegan,
            vec![
                "peanut butter", "almond butter", "cocoa butter", "coconut milk", "coconut cream",
                "almond milk", "soy milk", "oat milk", "rice milk", "cream of tartar",
                "cream tartar", "eggplant", "butternut", "honeydew", "beefsteak tomato",
            ],
        );
        map.insert(DietCategory::NonVegetarian, vec!["beefsteak tomato"]);
        map.insert(
            DietCategory::Gluten,
            vec![
                "rice flour", "almond flour", "coconut flour", "corn flour", "cornflour",
                "rice noodle", "buckwheat", "breadfruit",
            ],
        );
        map
    });

/// Dietary flags of one recipe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DietaryFlags {
    pub vegan: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
}

impl Default for DietaryFlags {
    fn default() -> Self {
        Self {
            vegan: true,
            vegetarian: true,
            gluten_free: true,
        }
    }
}

/// Categories whose keyword table hits the key
pub fn categories_of(key: &NormalizedKey) -> Vec<DietCategory> {
    let tokens: Vec<&str> = key.tokens().collect();
    DietCategory::ALL
        .into_iter()
        .filter(|category| {
            let exempt = CATEGORY_EXCEPTIONS.get(category).is_some_and(|phrases| {
                phrases
                    .iter()
                    .any(|p| contains_phrase(&tokens, p, whole_token_matches))
            });
            !exempt
                && CATEGORY_KEYWORDS.get(category).is_some_and(|keywords| {
                    keywords
                        .iter()
                        .any(|k| contains_phrase(&tokens, k, stem_matches))
                })
        })
        .collect()
}

/// Classify a recipe from its normalized ingredient keys
///
/// # Examples
///
/// ```rust
/// use recipe_reconcile::dietary::classify;
/// use recipe_reconcile::text_processing::normalize_name;
///
/// let keys = vec![normalize_name("Eggplant"), normalize_name("Spaghetti pasta")];
/// let flags = classify(&keys);
/// assert!(flags.vegan);
/// assert!(!flags.gluten_free);
/// ```
pub fn classify<'k, I>(keys: I) -> DietaryFlags
where
    I: IntoIterator<Item = &'k NormalizedKey>,
{
    let mut flags = DietaryFlags::default();
    for key in keys {
        for category in categories_of(key) {
            match category {
                DietCategory::NonVegan => flags.vegan = false,
                DietCategory::NonVegetarian => {
                    flags.vegetarian = false;
                    flags.vegan = false;
                }
                DietCategory::Gluten => flags.gluten_free = false,
            }
        }
    }
    flags
}

fn contains_phrase(tokens: &[&str], phrase: &str, matches: fn(&str, &str) -> bool) -> bool {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() || words.len() > tokens.len() {
        return false;
    }
    tokens.windows(words.len()).any(|window| {
        window
            .iter()
            .zip(&words)
            .all(|(token, word)| matches(token, word))
    })
}

// The word itself or its plural
fn whole_token_matches(token: &str, word: &str) -> bool {
    matches!(token.strip_prefix(word), Some("") | Some("s") | Some("es"))
}

// Keyword as the head or tail of a compound: "meatballs", "buttermilk"
fn stem_matches(token: &str, word: &str) -> bool {
    token.starts_with(word) || token.ends_with(word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_processing::normalize_name;

    fn flags_for(names: &[&str]) -> DietaryFlags {
        let keys: Vec<NormalizedKey> = names.iter().map(|n| normalize_name(n)).collect();
        classify(&keys)
    }

    #[test]
    fn test_plant_only_recipe() {
        let flags = flags_for(&["Rice", "Black beans", "Tomatoes", "Eggplant"]);
        assert_eq!(flags, DietaryFlags::default());
    }

    #[test]
    fn test_dairy_is_vegetarian_not_vegan() {
        let flags = flags_for(&["Eggs", "Milk", "Cheddar cheese"]);
        assert!(!flags.vegan);
        assert!(flags.vegetarian);
        assert!(flags.gluten_free);
    }

    #[test]
    fn test_meat_excludes_vegan_and_vegetarian() {
        let flags = flags_for(&["Shrimp", "Garlic"]);
        assert!(!flags.vegetarian);
        assert!(!flags.vegan);
    }

    #[test]
    fn test_gluten_phrases() {
        assert!(!flags_for(&["Soy sauce"]).gluten_free);
        assert!(!flags_for(&["Egg noodles"]).gluten_free);
        assert!(flags_for(&["Soy beans"]).gluten_free);
        assert!(flags_for(&["Rice flour"]).gluten_free);
    }

    #[test]
    fn test_plant_based_exceptions() {
        assert!(flags_for(&["Peanut butter", "Coconut milk"]).vegan);
        assert!(!flags_for(&["Butter"]).vegan);
    }

    #[test]
    fn test_compound_words_hit_their_stems() {
        let breadcrumbs = flags_for(&["Breadcrumbs"]);
        assert!(!breadcrumbs.gluten_free);
        assert!(breadcrumbs.vegan);

        let meatballs = flags_for(&["Meatballs"]);
        assert!(!meatballs.vegetarian);
        assert!(!meatballs.vegan);

        let buttermilk = flags_for(&["Buttermilk"]);
        assert!(!buttermilk.vegan);
        assert!(buttermilk.vegetarian);

        let fish_sauce = flags_for(&["Fishsauce"]);
        assert!(!fish_sauce.vegetarian);
        assert!(!fish_sauce.vegan);
    }

    #[test]
    fn test_compound_plant_foods_stay_exempt() {
        assert_eq!(
            flags_for(&["Eggplant", "Butternut squash", "Honeydew melon", "Buckwheat"]),
            DietaryFlags::default()
        );
        assert!(flags_for(&["Beefsteak tomatoes"]).vegetarian);
    }

    #[test]
    fn test_categories_of_key() {
        let categories = categories_of(&normalize_name("chicken stock"));
        assert!(categories.contains(&DietCategory::NonVegan));
        assert!(categories.contains(&DietCategory::NonVegetarian));
        assert!(!categories.contains(&DietCategory::Gluten));
    }
}
