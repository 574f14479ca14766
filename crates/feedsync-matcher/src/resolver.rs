//! Maps one supplier record to at most one catalog product.

use std::sync::Arc;

use feedsync_core::{
    model_variants, normalize, CatalogProduct, CatalogStore, MatchResult, MatchSettings,
    MatchType, StoreError, SupplierRecord,
};
use strsim::normalized_levenshtein;

use crate::search::{analyze_query, CandidatePool, CatalogSearchIndex};

const EXACT_SKU_CONFIDENCE: u8 = 100;
const EXACT_MODEL_CONFIDENCE: u8 = 95;
const NORMALIZED_MODEL_CONFIDENCE: u8 = 90;

/// Edit similarity of two display strings after [`normalize`], in `[0, 1]`.
#[must_use]
pub fn similarity(a: &str, b: &str) -> f64 {
    normalized_levenshtein(&normalize(a), &normalize(b))
}

/// Free-text queries tried against the search index, most specific first:
/// the full name, its first three words, its first two words, and its
/// longest single word.
fn query_shapes(name: &str) -> Vec<String> {
    let words: Vec<&str> = name.split_whitespace().collect();
    let mut shapes: Vec<String> = Vec::with_capacity(4);
    let mut push = |shape: String| {
        if !shape.is_empty() && !shapes.contains(&shape) {
            shapes.push(shape);
        }
    };

    push(words.join(" "));
    push(words.iter().take(3).copied().collect::<Vec<_>>().join(" "));
    push(words.iter().take(2).copied().collect::<Vec<_>>().join(" "));
    // max_by_key returns the last maximum; keep the first longest word.
    if let Some(longest) = words
        .iter()
        .copied()
        .reduce(|best, w| if w.len() > best.len() { w } else { best })
    {
        push(longest.to_string());
    }
    shapes
}

pub struct IdentityResolver {
    catalog: Arc<dyn CatalogStore>,
    search: CatalogSearchIndex,
    fuzzy_threshold: f64,
    sku_boost: f64,
}

impl IdentityResolver {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, settings: &MatchSettings) -> Self {
        Self {
            search: CatalogSearchIndex::new(Arc::clone(&catalog), settings),
            catalog,
            fuzzy_threshold: settings.fuzzy_threshold,
            sku_boost: settings.sku_boost,
        }
    }

    /// Resolve `record` by exact SKU, exact model, separator variants of the
    /// SKU against the model field, and finally fuzzy name similarity. The
    /// first step that finds a product wins.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if a catalog lookup fails.
    pub async fn resolve(&self, record: &SupplierRecord) -> Result<MatchResult, StoreError> {
        if let Some(product) = self.catalog.find_by_sku(&record.sku).await? {
            return Ok(MatchResult::matched(
                product,
                MatchType::ExactSku,
                EXACT_SKU_CONFIDENCE,
            ));
        }

        if let Some(product) = self.catalog.find_by_model(&record.sku).await? {
            return Ok(MatchResult::matched(
                product,
                MatchType::ExactModel,
                EXACT_MODEL_CONFIDENCE,
            ));
        }

        for variant in model_variants(&record.sku) {
            if let Some(product) = self.catalog.find_by_model(&variant).await? {
                tracing::debug!(sku = %record.sku, variant = %variant, "matched model variant");
                return Ok(MatchResult::matched(
                    product,
                    MatchType::NormalizedModel,
                    NORMALIZED_MODEL_CONFIDENCE,
                ));
            }
        }

        let Some(name) = record.name.as_deref() else {
            return Ok(MatchResult::none());
        };
        if normalize(name).is_empty() {
            return Ok(MatchResult::none());
        }

        let candidates = self.candidates(name).await?;
        match self.best_candidate(record, name, candidates) {
            Some((product, score)) if score > self.fuzzy_threshold => {
                tracing::debug!(
                    sku = %record.sku,
                    product_id = product.id,
                    score,
                    "fuzzy name match"
                );
                Ok(MatchResult::matched(
                    product,
                    MatchType::FuzzyName,
                    confidence(score),
                ))
            }
            _ => Ok(MatchResult::none()),
        }
    }

    async fn candidates(&self, name: &str) -> Result<Vec<CatalogProduct>, StoreError> {
        let mut pool = CandidatePool::new(self.search.max_candidates());
        for shape in query_shapes(name) {
            if pool.len() >= self.search.target_candidates() {
                break;
            }
            self.search
                .search_into(&analyze_query(&shape), &mut pool)
                .await?;
        }
        Ok(pool.into_vec())
    }

    /// Highest boosted score among `candidates`; the earliest candidate wins
    /// ties.
    fn best_candidate(
        &self,
        record: &SupplierRecord,
        name: &str,
        candidates: Vec<CatalogProduct>,
    ) -> Option<(CatalogProduct, f64)> {
        let sku_key = normalize(&record.sku);
        let mut best: Option<(CatalogProduct, f64)> = None;

        for candidate in candidates {
            let mut score = similarity(name, &candidate.name);
            if sku_key.len() > 3 && normalize(&candidate.name).contains(&sku_key) {
                score += self.sku_boost;
            }
            if best.as_ref().is_none_or(|(_, top)| score > *top) {
                best = Some((candidate, score));
            }
        }
        best
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn confidence(score: f64) -> u8 {
    (score.clamp(0.0, 1.0) * 100.0).round() as u8
}
