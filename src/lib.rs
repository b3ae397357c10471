//! # Recipe Reconcile
//!
//! Reconciles recipe records from heterogeneous sources (structured recipe
//! APIs, free-text recipe corpora) against a nutrient catalog: quantities are
//! normalized to grams, ingredient names to canonical keys, keys are matched
//! to catalog entries, and matched lines are aggregated into per-serving
//! nutrition. Keys of different sources can be linked into graded
//! correspondences.

pub mod catalog;
pub mod config;
pub mod dietary;
pub mod errors;
pub mod ingredient_model;
pub mod linker;
pub mod matcher;
pub mod measurement_patterns;
pub mod measurement_types;
pub mod nutrition;
pub mod pipeline;
pub mod quantity;
pub mod servings;
pub mod sources;
pub mod text_processing;
