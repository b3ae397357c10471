use recipe_reconcile::catalog::{Catalog, NutrientCatalogEntry};
use recipe_reconcile::config::{ReconcileConfig, TierThresholds};
use recipe_reconcile::linker::{classify_confidence, LinkClassifier, LinkTier, SourceKeys};
use recipe_reconcile::matcher::{CandidateMatcher, MatchMode, MatchStrategy};
use recipe_reconcile::text_processing::{normalize_free_text, normalize_name};

fn catalog() -> Catalog {
    Catalog::from_entries(
        "usda",
        [
            NutrientCatalogEntry::new("Sugars, brown", "168833"),
            NutrientCatalogEntry::new("Sugar", "169655"),
            NutrientCatalogEntry::new("Milk, evaporated", "171269"),
            NutrientCatalogEntry::new("Butter, salted", "173410"),
        ],
    )
}

#[test]
fn test_exact_match_wins_over_decoys() {
    let catalog = catalog();
    let config = ReconcileConfig::default();
    let matcher = CandidateMatcher::new(&catalog, &config, MatchMode::NutrientLookup);

    let m = matcher.resolve(&normalize_name("SUGAR")).unwrap();
    assert_eq!(m.strategy, MatchStrategy::Exact);
    assert_eq!(m.entry.source_id, "169655");
}

#[test]
fn test_free_text_lines_resolve() {
    let catalog = catalog();
    let config = ReconcileConfig::default();
    let matcher = CandidateMatcher::new(&catalog, &config, MatchMode::NutrientLookup);

    let milk = matcher
        .resolve(&normalize_free_text("1/2 c. evaporated milk"))
        .unwrap();
    assert_eq!(milk.entry.source_id, "171269");
    assert_eq!(milk.strategy, MatchStrategy::TokenOverlap);
    assert_eq!(milk.confidence, 1.0);

    let butter = matcher.resolve(&normalize_free_text("2 tbsp butter")).unwrap();
    assert_eq!(butter.strategy, MatchStrategy::Containment);
    assert_eq!(butter.entry.source_id, "173410");

    assert!(matcher.resolve(&normalize_free_text("1 tsp vanilla")).is_none());
}

#[test]
fn test_matcher_is_shareable_across_threads() {
    let catalog = catalog();
    let config = ReconcileConfig::default();
    let matcher = CandidateMatcher::new(&catalog, &config, MatchMode::CrossSource);

    std::thread::scope(|scope| {
        for name in ["sugar", "butter salted", "milk evaporated"] {
            scope.spawn(move || assert!(matcher.resolve(&normalize_name(name)).is_some()));
        }
    });
}

#[test]
fn test_tier_boundaries() {
    let tiers = TierThresholds::default();
    assert_eq!(classify_confidence(0.9, &tiers), LinkTier::Equivalence);
    assert_eq!(classify_confidence(0.7, &tiers), LinkTier::CloseMatch);
    assert_eq!(classify_confidence(0.69, &tiers), LinkTier::RelatedMatch);
}

#[test]
fn test_cross_source_links() {
    let mealdb = SourceKeys::new(
        "themealdb",
        ["Brown Sugar", "Butter", "Cinnamon"].map(normalize_name),
    );
    let recipenlg = SourceKeys::new(
        "recipenlg",
        ["1 c. brown sugar", "1 stick butter", "1 tsp cinamon"].map(normalize_free_text),
    );

    let links = LinkClassifier::default().link(&[mealdb, recipenlg]);
    assert_eq!(links.len(), 3);

    let cinnamon = links
        .iter()
        .find(|l| l.key_a.as_str() == "cinnamon")
        .unwrap();
    assert_eq!(cinnamon.key_b.as_str(), "cinamon");
    assert_eq!(cinnamon.tier, LinkTier::CloseMatch);
    assert!((cinnamon.confidence - 0.875).abs() < 1e-9);
    assert!(links.iter().all(|l| l.source_a == "themealdb" && l.source_b == "recipenlg"));
}
