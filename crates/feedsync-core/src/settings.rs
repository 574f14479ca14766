use rust_decimal::Decimal;

pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.65;
pub const DEFAULT_SKU_BOOST: f64 = 0.2;
pub const DEFAULT_PRICE_CHANGE_THRESHOLD_PCT: i64 = 10;
pub const DEFAULT_TARGET_CANDIDATES: usize = 10;
pub const DEFAULT_MAX_CANDIDATES: usize = 50;

/// Tunables for identity resolution and delta classification.
///
/// The defaults were tuned empirically against production feeds and have no
/// derivation beyond that. They are exposed as settings so they can be
/// revisited per supplier without a code change.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    /// A fuzzy candidate is accepted when its boosted ratio is strictly
    /// greater than this value.
    pub fuzzy_threshold: f64,
    /// Added to the ratio when the supplier SKU appears verbatim (normalized)
    /// inside the candidate name.
    pub sku_boost: f64,
    /// Minimum absolute percentage change that is queued for review.
    pub price_change_threshold_pct: Decimal,
    /// The search cascade stops once this many candidates have accumulated.
    pub target_candidates: usize,
    /// Hard cap on candidates returned by one search.
    pub max_candidates: usize,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            sku_boost: DEFAULT_SKU_BOOST,
            price_change_threshold_pct: Decimal::from(DEFAULT_PRICE_CHANGE_THRESHOLD_PCT),
            target_candidates: DEFAULT_TARGET_CANDIDATES,
            max_candidates: DEFAULT_MAX_CANDIDATES,
        }
    }
}
