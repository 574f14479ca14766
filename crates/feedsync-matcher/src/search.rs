//! Candidate retrieval for fuzzy identity resolution.
//!
//! [`CatalogSearchIndex::search`] runs a cascade of conjunctive name lookups,
//! most precise first. Each step only adds candidates; the cascade stops as
//! soon as enough have accumulated, so a near-exact hit is never pushed out
//! by a looser one.

use std::collections::HashSet;
use std::sync::{Arc, LazyLock};

use feedsync_core::normalize::{is_dash, strip_dashes};
use feedsync_core::{CatalogProduct, CatalogStore, MatchSettings, NameQuery, StoreError};
use regex::Regex;

static TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-z0-9]+(?:-[a-z0-9]+)*").expect("valid token regex"));

/// Descriptive adjectives, colours, and packaging words that say nothing
/// about product identity.
const STOP_WORDS: &[&str] = &[
    "and", "the", "with", "for", "new", "black", "white", "silver", "grey", "gray", "red",
    "blue", "green", "gold", "brown", "walnut", "oak", "cherry", "ebony", "piano", "matte",
    "gloss", "glossy", "satin", "finish", "color", "colour", "pair", "single", "each", "unit",
    "units", "pack", "piece", "pcs", "box", "boxed", "edition", "series", "version",
];

/// Lookups tried by the cascade, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    AllWords,
    AllWordsDashless,
    CoreWords,
    BrandModel,
    Relaxed,
    BrandPlusWord,
}

impl Strategy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::AllWords => "all_words",
            Strategy::AllWordsDashless => "all_words_dashless",
            Strategy::CoreWords => "core_words",
            Strategy::BrandModel => "brand_model",
            Strategy::Relaxed => "relaxed",
            Strategy::BrandPlusWord => "brand_plus_word",
        }
    }
}

/// One planned lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchStep {
    pub strategy: Strategy,
    pub terms: Vec<String>,
    pub ignore_dashes: bool,
}

/// The word classes a free-text query is broken into.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTerms {
    /// Every token, lowercased, in query order.
    pub tokens: Vec<String>,
    /// Tokens longer than two characters or containing a digit.
    pub significant: Vec<String>,
    /// Significant tokens minus stop words, or the first three tokens when
    /// nothing else survives.
    pub core: Vec<String>,
    /// Tokens with both a letter and a digit.
    pub models: Vec<String>,
}

impl QueryTerms {
    /// The first core word, taken as the manufacturer.
    #[must_use]
    pub fn brand(&self) -> Option<&str> {
        self.core.first().map(String::as_str)
    }
}

/// Split a query into [`QueryTerms`].
#[must_use]
pub fn analyze_query(query: &str) -> QueryTerms {
    let lowered: String = query
        .to_lowercase()
        .chars()
        .map(|c| if is_dash(c) { '-' } else { c })
        .collect();

    let mut tokens: Vec<String> = Vec::new();
    for m in TOKEN_RE.find_iter(&lowered) {
        let token = m.as_str().to_string();
        if !tokens.contains(&token) {
            tokens.push(token);
        }
    }

    let significant: Vec<String> = tokens
        .iter()
        .filter(|t| t.len() > 2 || t.chars().any(|c| c.is_ascii_digit()))
        .cloned()
        .collect();

    let mut core: Vec<String> = significant
        .iter()
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .cloned()
        .collect();
    if core.is_empty() {
        core = tokens.iter().take(3).cloned().collect();
    }

    let models = significant
        .iter()
        .filter(|t| {
            t.chars().any(|c| c.is_ascii_alphabetic()) && t.chars().any(|c| c.is_ascii_digit())
        })
        .cloned()
        .collect();

    QueryTerms {
        tokens,
        significant,
        core,
        models,
    }
}

/// Build the ordered lookup plan for a query. Steps with no terms, or with
/// terms identical to an earlier step, are left out.
#[must_use]
pub fn plan_search(terms: &QueryTerms) -> Vec<SearchStep> {
    let mut steps: Vec<SearchStep> = Vec::new();
    let mut push = |strategy: Strategy, terms: Vec<String>, ignore_dashes: bool| {
        let terms: Vec<String> = terms.into_iter().filter(|t| !t.is_empty()).collect();
        if terms.is_empty() {
            return;
        }
        let duplicate = steps
            .iter()
            .any(|s| s.terms == terms && s.ignore_dashes == ignore_dashes);
        if !duplicate {
            steps.push(SearchStep {
                strategy,
                terms,
                ignore_dashes,
            });
        }
    };

    push(Strategy::AllWords, terms.significant.clone(), false);
    push(
        Strategy::AllWordsDashless,
        terms.significant.iter().map(|t| strip_dashes(t)).collect(),
        true,
    );
    push(Strategy::CoreWords, terms.core.clone(), false);

    if let Some(brand) = terms.brand() {
        let brand_key = strip_dashes(brand);
        for model in &terms.models {
            let model_key = strip_dashes(model);
            if model_key != brand_key {
                push(
                    Strategy::BrandModel,
                    vec![brand_key.clone(), model_key],
                    true,
                );
            }
        }
    }

    let core_len = terms.core.len();
    let floor = (core_len / 2).max(1);
    for n in (floor..core_len).rev() {
        push(Strategy::Relaxed, terms.core[..n].to_vec(), false);
    }

    if let Some(brand) = terms.brand() {
        for word in terms.core.iter().skip(1).take(3) {
            push(
                Strategy::BrandPlusWord,
                vec![brand.to_string(), word.clone()],
                false,
            );
        }
    }

    steps
}

/// Ordered, id-deduplicated candidate accumulator.
#[derive(Debug)]
pub(crate) struct CandidatePool {
    seen: HashSet<i64>,
    items: Vec<CatalogProduct>,
    capacity: usize,
}

impl CandidatePool {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            seen: HashSet::new(),
            items: Vec::new(),
            capacity,
        }
    }

    pub(crate) fn extend(&mut self, products: impl IntoIterator<Item = CatalogProduct>) {
        for product in products {
            if self.items.len() >= self.capacity {
                break;
            }
            if self.seen.insert(product.id) {
                self.items.push(product);
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn into_vec(self) -> Vec<CatalogProduct> {
        self.items
    }
}

/// Free-text candidate search over a [`CatalogStore`].
#[derive(Clone)]
pub struct CatalogSearchIndex {
    catalog: Arc<dyn CatalogStore>,
    target_candidates: usize,
    max_candidates: usize,
}

impl CatalogSearchIndex {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogStore>, settings: &MatchSettings) -> Self {
        Self {
            catalog,
            target_candidates: settings.target_candidates,
            max_candidates: settings.max_candidates.max(1),
        }
    }

    #[must_use]
    pub fn target_candidates(&self) -> usize {
        self.target_candidates
    }

    #[must_use]
    pub fn max_candidates(&self) -> usize {
        self.max_candidates
    }

    /// Return up to `max_candidates` products for `query`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if any catalog lookup fails.
    pub async fn search(&self, query: &str) -> Result<Vec<CatalogProduct>, StoreError> {
        let terms = analyze_query(query);
        let mut pool = CandidatePool::new(self.max_candidates);
        self.search_into(&terms, &mut pool).await?;
        Ok(pool.into_vec())
    }

    pub(crate) async fn search_into(
        &self,
        terms: &QueryTerms,
        pool: &mut CandidatePool,
    ) -> Result<(), StoreError> {
        for step in plan_search(terms) {
            if pool.len() >= self.target_candidates {
                break;
            }
            let found = self
                .catalog
                .search_by_name(&NameQuery {
                    terms: step.terms.clone(),
                    ignore_dashes: step.ignore_dashes,
                    limit: self.max_candidates,
                })
                .await?;
            tracing::debug!(
                strategy = step.strategy.as_str(),
                terms = ?step.terms,
                found = found.len(),
                "catalog search step"
            );
            pool.extend(found);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "search_test.rs"]
mod tests;
