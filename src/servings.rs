//! # Serving Estimator
//!
//! Recovers a plausible serving count from free-text instructions, falling back
//! to a step function of the ingredient count.
//!
//! ```rust
//! use recipe_reconcile::servings::estimate_servings;
//!
//! assert_eq!(estimate_servings("Bake 20 minutes. Serves 4.", 3), 4);
//! assert_eq!(estimate_servings("Divide between two plates.", 9), 2);
//! assert_eq!(estimate_servings("Mix well.", 12), 4);
//! ```

use log::debug;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::measurement_patterns::{
    DIVIDE_SERVINGS_REGEX, N_PEOPLE_REGEX, N_SERVINGS_REGEX, SERVES_REGEX,
};

/// Spelled-out serving counts accepted after "divide ... between"
static SPELLED_NUMBERS: LazyLock<HashMap<&'static str, u32>> = LazyLock::new(|| {
    [
        ("two", 2),
        ("three", 3),
        ("four", 4),
        ("five", 5),
        ("six", 6),
        ("seven", 7),
        ("eight", 8),
    ]
    .into_iter()
    .collect()
});

/// Estimate how many servings a recipe yields
///
/// Textual hints are tried in order ("divide ... between N plates", "serves N",
/// "N servings", "N people"); a hint of zero is ignored. Without a hint the
/// ingredient count decides: 12 or more lines give 4, 8 or more give 3, and
/// anything smaller gives 2. The result is always at least 1.
pub fn estimate_servings(instructions: &str, ingredient_count: usize) -> u32 {
    let text = instructions.to_lowercase();

    if let Some(servings) = servings_from_text(&text) {
        debug!("Servings {} recovered from instructions", servings);
        return servings;
    }

    let servings = servings_from_ingredient_count(ingredient_count);
    debug!(
        "No serving hint found; {} ingredients -> {} servings",
        ingredient_count, servings
    );
    servings
}

fn servings_from_text(text: &str) -> Option<u32> {
    if let Some(captures) = DIVIDE_SERVINGS_REGEX.captures(text) {
        let word = &captures[1];
        let parsed = word
            .parse::<u32>()
            .ok()
            .or_else(|| SPELLED_NUMBERS.get(word).copied());
        if let Some(n) = parsed.filter(|n| *n > 0) {
            return Some(n);
        }
    }

    let numeric_patterns: [&Regex; 3] = [&*SERVES_REGEX, &*N_SERVINGS_REGEX, &*N_PEOPLE_REGEX];
    numeric_patterns.iter().find_map(|pattern| {
        pattern
            .captures(text)
            .and_then(|captures| captures[1].parse::<u32>().ok())
            .filter(|n| *n > 0)
    })
}

fn servings_from_ingredient_count(ingredient_count: usize) -> u32 {
    match ingredient_count {
        n if n >= 12 => 4,
        n if n >= 8 => 3,
        _ => 2,
    }
}
