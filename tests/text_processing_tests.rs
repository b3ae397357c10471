#[cfg(test)]
mod tests {
    use recipe_reconcile::quantity::{parse_measure, MeasureRule, QuantityNormalizer};
    use recipe_reconcile::servings::estimate_servings;
    use recipe_reconcile::text_processing::{
        normalize_free_text, normalize_name, normalize_with, NormalizerVariant,
    };

    #[test]
    fn test_pinned_quantities() {
        assert_eq!(parse_measure(""), 30.0);
        assert_eq!(parse_measure("1/2 cup"), 60.0);
        assert_eq!(parse_measure("2 tbsp"), 30.0);
        assert_eq!(parse_measure("3 avocado"), 300.0);
        assert_eq!(parse_measure("a pinch"), 10.0);
        assert!((parse_measure("1 lb") - 453.6).abs() < 1e-9);
    }

    #[test]
    fn test_quantity_always_within_bounds() {
        let inputs = [
            "", " ", "2 kg", "5 lb", "1000", "1 1/2", "7/0", "3.5 l", "12", "99 cups",
            "salt to taste", "1/2 tin", "2 x 400g tins", "⅓ cup", "about 3", "one", "1.2.3",
        ];
        for input in inputs {
            let grams = parse_measure(input);
            assert!(
                (0.0..=500.0).contains(&grams),
                "'{}' -> {} outside [0, 500]",
                input,
                grams
            );
        }
    }

    #[test]
    fn test_mealdb_style_measures() {
        let normalizer = QuantityNormalizer::default();
        assert_eq!(normalizer.estimate("3/4 cup").grams, 90.0);
        assert_eq!(normalizer.estimate("1 tsp").grams, 5.0);
        assert_eq!(normalizer.estimate("Garnish").rule, MeasureRule::Vanishing);
        assert_eq!(normalizer.estimate("2 Large").grams, 200.0);
        assert_eq!(normalizer.estimate("200g").grams, 200.0);
    }

    #[test]
    fn test_free_text_lines_as_quantities() {
        // RecipeNLG lines are weighed whole
        assert_eq!(parse_measure("2 cloves fresh garlic"), 6.0);
        assert_eq!(parse_measure("1 c. firmly packed brown sugar"), 120.0);
        assert_eq!(parse_measure("salt and pepper to taste"), 10.0);
    }

    #[test]
    fn test_normalizer_contract() {
        assert_eq!(normalize_free_text("2 cloves fresh garlic").as_str(), "garlic");
        assert_eq!(normalize_name("Garlic"), normalize_name("  GARLIC "));
        assert_eq!(normalize_name("Chopped Onion (optional)").as_str(), "onion");

        for input in ["1 1/2 cups Sifted Flour (plain)", "Fresh BASIL, torn", "to taste"] {
            for variant in [NormalizerVariant::Structured, NormalizerVariant::FreeText] {
                let once = normalize_with(input, variant);
                assert_eq!(normalize_with(once.as_str(), variant), once);
                assert!(once.as_str().chars().all(|c| c.is_ascii_lowercase() || c == ' '));
            }
        }
    }

    #[test]
    fn test_serving_estimates() {
        assert_eq!(estimate_servings("Cook the rice. Serves 4.", 2), 4);
        assert_eq!(
            estimate_servings("Divide between six bowls and top with herbs.", 20),
            6
        );
        assert_eq!(estimate_servings("Mix everything.", 12), 4);
        assert_eq!(estimate_servings("Mix everything.", 1), 2);
        assert!(estimate_servings("serves 0", 0) >= 1);
    }
}
