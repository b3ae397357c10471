//! # Measurement Patterns Module
//!
//! This module contains the regex patterns used by the quantity normalizer,
//! the ingredient key normalizer and the serving estimator.

use lazy_static::lazy_static;
use regex::Regex;

// Mixed or simple fraction with an optional unit word: "1/2 cup", "1 1/2 cups", "3/4"
pub const FRACTION_PATTERN: &str = r"(?:(\d+)\s+)?(\d+)\s*/\s*(\d+)(?:\s*([a-z]+))?";

// First decimal amount with an optional following word: "2 tbsp", "1.5kg", "3 avocado", "3"
pub const AMOUNT_PATTERN: &str = r"(\d+(?:\.\d+)?)\s*([a-z]+)?";

// Parenthetical spans in ingredient names: "flour (all-purpose)"
pub const PARENTHETICAL_PATTERN: &str = r"\s*\([^)]*\)";

// Everything the normalized key may not contain
pub const NON_ALPHA_PATTERN: &str = r"[^a-z\s]";

// "divide between four plates", "divide the mixture between 2 bowls"
pub const DIVIDE_SERVINGS_PATTERN: &str =
    r"divide.*?between\s+(\w+)\s+(?:plates|bowls|people|portions|servings)";

// Only "serves N"; the imperative "serve 1 tablespoon" is an instruction
pub const SERVES_PATTERN: &str = r"\bserves\s+(\d+)";
pub const N_SERVINGS_PATTERN: &str = r"\b(\d+)\s+servings?\b";
pub const N_PEOPLE_PATTERN: &str = r"\b(\d+)\s+people\b";

// Lazy static regexes to avoid recompilation
lazy_static! {
    pub static ref FRACTION_REGEX: Regex =
        Regex::new(FRACTION_PATTERN).expect("Fraction pattern should be valid");
    pub static ref AMOUNT_REGEX: Regex =
        Regex::new(AMOUNT_PATTERN).expect("Amount pattern should be valid");
    pub static ref PARENTHETICAL_REGEX: Regex =
        Regex::new(PARENTHETICAL_PATTERN).expect("Parenthetical pattern should be valid");
    pub static ref NON_ALPHA_REGEX: Regex =
        Regex::new(NON_ALPHA_PATTERN).expect("Non-alpha pattern should be valid");
    pub static ref DIVIDE_SERVINGS_REGEX: Regex =
        Regex::new(DIVIDE_SERVINGS_PATTERN).expect("Divide pattern should be valid");
    pub static ref SERVES_REGEX: Regex =
        Regex::new(SERVES_PATTERN).expect("Serves pattern should be valid");
    pub static ref N_SERVINGS_REGEX: Regex =
        Regex::new(N_SERVINGS_PATTERN).expect("Servings pattern should be valid");
    pub static ref N_PEOPLE_REGEX: Regex =
        Regex::new(N_PEOPLE_PATTERN).expect("People pattern should be valid");
}
