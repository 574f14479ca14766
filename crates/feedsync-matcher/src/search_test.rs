use rust_decimal::Decimal;

use super::*;
use crate::memory::InMemoryCatalog;

fn product(id: i64, name: &str) -> CatalogProduct {
    CatalogProduct {
        id,
        sku: format!("SKU-{id}"),
        model: None,
        name: name.to_string(),
        price: Decimal::from(100),
        stock: 0,
    }
}

fn index(products: Vec<CatalogProduct>, settings: &MatchSettings) -> CatalogSearchIndex {
    CatalogSearchIndex::new(Arc::new(InMemoryCatalog::new(products)), settings)
}

fn strategies(steps: &[SearchStep]) -> Vec<Strategy> {
    steps.iter().map(|s| s.strategy).collect()
}

#[test]
fn analyze_keeps_short_tokens_with_digits() {
    let terms = analyze_query("KEF Q3 speaker");
    assert_eq!(terms.tokens, vec!["kef", "q3", "speaker"]);
    assert_eq!(terms.significant, vec!["kef", "q3", "speaker"]);
    assert_eq!(terms.models, vec!["q3"]);
}

#[test]
fn analyze_drops_two_letter_words() {
    let terms = analyze_query("TV stand by Acme");
    assert_eq!(terms.significant, vec!["stand", "acme"]);
}

#[test]
fn analyze_removes_stop_words_from_core() {
    let terms = analyze_query("Klipsch RP-1400SW Subwoofer Black Gloss");
    assert_eq!(
        terms.significant,
        vec!["klipsch", "rp-1400sw", "subwoofer", "black", "gloss"]
    );
    assert_eq!(terms.core, vec!["klipsch", "rp-1400sw", "subwoofer"]);
    assert_eq!(terms.brand(), Some("klipsch"));
    assert_eq!(terms.models, vec!["rp-1400sw"]);
}

#[test]
fn analyze_falls_back_to_first_three_tokens() {
    let terms = analyze_query("Black White Silver Gold");
    assert_eq!(terms.core, vec!["black", "white", "silver"]);
}

#[test]
fn analyze_maps_unicode_dashes() {
    let terms = analyze_query("RP\u{2013}1400SW");
    assert_eq!(terms.tokens, vec!["rp-1400sw"]);
}

#[test]
fn analyze_deduplicates_tokens() {
    let terms = analyze_query("pair speaker speaker");
    assert_eq!(terms.tokens, vec!["pair", "speaker"]);
}

#[test]
fn analyze_empty_query() {
    let terms = analyze_query("  ---  ");
    assert!(terms.tokens.is_empty());
    assert!(terms.core.is_empty());
    assert!(plan_search(&terms).is_empty());
}

#[test]
fn plan_runs_precise_strategies_first() {
    let steps = plan_search(&analyze_query("Klipsch RP1400SW Subwoofer"));
    assert_eq!(
        strategies(&steps),
        vec![
            Strategy::AllWords,
            Strategy::AllWordsDashless,
            Strategy::BrandModel,
            Strategy::Relaxed,
            Strategy::Relaxed,
            Strategy::BrandPlusWord,
        ]
    );
    assert_eq!(steps[2].terms, vec!["klipsch", "rp1400sw"]);
    assert!(steps[2].ignore_dashes);
    assert_eq!(steps[3].terms, vec!["klipsch", "rp1400sw"]);
    assert_eq!(steps[4].terms, vec!["klipsch"]);
    assert_eq!(steps[5].terms, vec!["klipsch", "subwoofer"]);
}

#[test]
fn plan_includes_core_words_when_stop_words_present() {
    let steps = plan_search(&analyze_query("Denon Receiver Black"));
    assert_eq!(steps[2].strategy, Strategy::CoreWords);
    assert_eq!(steps[2].terms, vec!["denon", "receiver"]);
}

#[test]
fn plan_strips_dashes_for_dashless_step() {
    let steps = plan_search(&analyze_query("RP-1400SW"));
    let dashless = steps
        .iter()
        .find(|s| s.strategy == Strategy::AllWordsDashless)
        .unwrap();
    assert_eq!(dashless.terms, vec!["rp1400sw"]);
}

#[tokio::test]
async fn dashless_strategy_finds_hyphenated_catalog_names() {
    let idx = index(
        vec![product(1, "KLIPSCH RP-1400SW Subwoofer Black")],
        &MatchSettings::default(),
    );
    let found = idx.search("RP1400SW").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, 1);
}

#[tokio::test]
async fn brand_model_strategy_bridges_missing_words() {
    let idx = index(
        vec![product(7, "KLIPSCH RP-1400SW Subwoofer Black")],
        &MatchSettings::default(),
    );
    let found = idx.search("Klipsch RP1400SW powered sub").await.unwrap();
    assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![7]);
}

#[tokio::test]
async fn results_are_deduplicated_across_strategies() {
    let idx = index(
        vec![
            product(1, "Acme Widget Pro"),
            product(2, "Acme Widget Lite"),
            product(3, "Acme Gadget"),
        ],
        &MatchSettings::default(),
    );
    let found = idx.search("Acme Widget Pro").await.unwrap();
    let mut ids: Vec<i64> = found.iter().map(|p| p.id).collect();
    assert_eq!(ids[0], 1);
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), found.len());
    assert_eq!(ids, vec![1, 2, 3]);
}

#[tokio::test]
async fn cascade_stops_once_target_reached() {
    let settings = MatchSettings {
        target_candidates: 1,
        ..MatchSettings::default()
    };
    let idx = index(
        vec![product(1, "Acme Widget Pro"), product(2, "Acme Gadget")],
        &settings,
    );
    let found = idx.search("Acme Widget Pro").await.unwrap();
    assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1]);
}

#[tokio::test]
async fn results_are_capped_at_max_candidates() {
    let settings = MatchSettings {
        target_candidates: 2,
        max_candidates: 2,
        ..MatchSettings::default()
    };
    let products = (1..=5).map(|i| product(i, &format!("Acme Cable {i}m"))).collect();
    let idx = index(products, &settings);
    let found = idx.search("Acme Cable").await.unwrap();
    assert_eq!(found.len(), 2);
}

#[tokio::test]
async fn no_terms_means_no_lookups() {
    let idx = index(vec![product(1, "Anything")], &MatchSettings::default());
    assert!(idx.search("").await.unwrap().is_empty());
}
