use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RecordError;

/// One supplier row exactly as the extraction stage emitted it.
///
/// Fields are loosely typed because extracted price lists carry prices as
/// numbers, as strings with currency symbols, or not at all. Convert with
/// [`SupplierRecord::try_from`] before anything else touches the row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSupplierRow {
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub stock: Option<Value>,
}

/// A validated supplier feed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplierRecord {
    pub sku: String,
    pub name: Option<String>,
    /// Supplier cost price.
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
}

impl SupplierRecord {
    #[must_use]
    pub fn new(sku: impl Into<String>) -> Self {
        Self {
            sku: sku.into(),
            name: None,
            price: None,
            stock: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_price(mut self, price: Decimal) -> Self {
        self.price = Some(price);
        self
    }

    #[must_use]
    pub fn with_stock(mut self, stock: i32) -> Self {
        self.stock = Some(stock);
        self
    }

    /// Checks the invariants a hand-built record must satisfy: a non-blank
    /// SKU and a non-negative price.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::MissingSku`] or [`RecordError::InvalidPrice`].
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.sku.trim().is_empty() {
            return Err(RecordError::MissingSku);
        }
        if let Some(price) = self.price {
            if price < Decimal::ZERO {
                return Err(RecordError::InvalidPrice {
                    sku: self.sku.clone(),
                    value: price.to_string(),
                    reason: "price is negative".to_string(),
                });
            }
        }
        Ok(())
    }
}

impl TryFrom<RawSupplierRow> for SupplierRecord {
    type Error = RecordError;

    fn try_from(raw: RawSupplierRow) -> Result<Self, Self::Error> {
        let sku = raw
            .sku
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(RecordError::MissingSku)?;

        let name = raw
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        let price = match raw.price {
            Some(value) => parse_price(&sku, &value)?,
            None => None,
        };
        let stock = match raw.stock {
            Some(value) => parse_stock(&sku, &value)?,
            None => None,
        };

        let record = SupplierRecord {
            sku,
            name,
            price,
            stock,
        };
        record.validate()?;
        Ok(record)
    }
}

/// Parses a price cell. Currency symbols, thousands separators, and spaces
/// are discarded; cells without any digit (`"POA"`, `""`) mean "no price".
fn parse_price(sku: &str, value: &Value) -> Result<Option<Decimal>, RecordError> {
    let invalid = |reason: &str| RecordError::InvalidPrice {
        sku: sku.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    };

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .map(Some)
            .map_err(|e| invalid(&e.to_string())),
        Value::String(s) => {
            if !s.chars().any(|c| c.is_ascii_digit()) {
                return Ok(None);
            }
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            Decimal::from_str(&cleaned)
                .map(Some)
                .map_err(|e| invalid(&e.to_string()))
        }
        _ => Err(invalid("expected a number or string")),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_stock(sku: &str, value: &Value) -> Result<Option<i32>, RecordError> {
    let invalid = || RecordError::InvalidStock {
        sku: sku.to_string(),
        value: value.to_string(),
    };

    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return i32::try_from(i).map(Some).map_err(|_| invalid());
            }
            match n.as_f64() {
                Some(f) if f.fract() == 0.0 && f.abs() <= f64::from(i32::MAX) => Ok(Some(f as i32)),
                _ => Err(invalid()),
            }
        }
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '-')
                .collect();
            if cleaned.is_empty() {
                return Ok(None);
            }
            cleaned.parse::<i32>().map(Some).map_err(|_| invalid())
        }
        _ => Err(invalid()),
    }
}

/// A sellable product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub id: i64,
    pub sku: String,
    /// Manufacturer model number, when the catalog records one separately.
    pub model: Option<String>,
    pub name: String,
    /// Current retail price.
    pub price: Decimal,
    pub stock: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactSku,
    ExactModel,
    NormalizedModel,
    FuzzyName,
    None,
}

impl std::fmt::Display for MatchType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchType::ExactSku => write!(f, "exact_sku"),
            MatchType::ExactModel => write!(f, "exact_model"),
            MatchType::NormalizedModel => write!(f, "normalized_model"),
            MatchType::FuzzyName => write!(f, "fuzzy_name"),
            MatchType::None => write!(f, "none"),
        }
    }
}

/// Outcome of resolving one supplier record against the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub product: Option<CatalogProduct>,
    pub match_type: MatchType,
    /// 0-100.
    pub confidence: u8,
}

impl MatchResult {
    #[must_use]
    pub fn matched(product: CatalogProduct, match_type: MatchType, confidence: u8) -> Self {
        Self {
            product: Some(product),
            match_type,
            confidence: confidence.min(100),
        }
    }

    #[must_use]
    pub fn none() -> Self {
        Self {
            product: None,
            match_type: MatchType::None,
            confidence: 0,
        }
    }

    #[must_use]
    pub fn is_match(&self) -> bool {
        self.product.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceChangeStatus {
    Pending,
    Approved,
    Rejected,
}

impl PriceChangeStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PriceChangeStatus::Pending => "pending",
            PriceChangeStatus::Approved => "approved",
            PriceChangeStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for PriceChangeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriceChangeStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PriceChangeStatus::Pending),
            "approved" => Ok(PriceChangeStatus::Approved),
            "rejected" => Ok(PriceChangeStatus::Rejected),
            other => Err(format!("unknown price change status: {other}")),
        }
    }
}

/// A material price movement awaiting human approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceChangeCandidate {
    pub product_id: i64,
    pub sku: String,
    pub product_name: String,
    pub current_price: Decimal,
    /// Retail price computed from the supplier cost, not the raw cost.
    pub new_price: Decimal,
    /// Signed percentage, rounded to two decimal places.
    pub change_pct: Decimal,
    pub supplier_id: String,
    pub status: PriceChangeStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewProductStatus {
    Pending,
    ApprovedPending,
    Approved,
}

impl NewProductStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NewProductStatus::Pending => "pending",
            NewProductStatus::ApprovedPending => "approved_pending",
            NewProductStatus::Approved => "approved",
        }
    }
}

impl std::fmt::Display for NewProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NewProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(NewProductStatus::Pending),
            "approved_pending" => Ok(NewProductStatus::ApprovedPending),
            "approved" => Ok(NewProductStatus::Approved),
            other => Err(format!("unknown new product status: {other}")),
        }
    }
}

/// A supplier line with no catalog counterpart, queued for creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProductCandidate {
    pub supplier_name: String,
    pub sku: String,
    pub name: Option<String>,
    pub cost_price: Option<Decimal>,
    pub stock_level: Option<i32>,
    pub status: NewProductStatus,
}

/// A [`PriceChangeCandidate`] as stored in the review queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedPriceChange {
    pub id: i64,
    pub candidate: PriceChangeCandidate,
}

/// A [`NewProductCandidate`] as stored in the review queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueuedNewProduct {
    pub id: i64,
    pub candidate: NewProductCandidate,
}

/// Stock movement observed for a matched product. Reported, never applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockDelta {
    pub current: i32,
    pub incoming: i32,
    pub delta: i64,
}

impl StockDelta {
    #[must_use]
    pub fn new(current: i32, incoming: i32) -> Self {
        Self {
            current,
            incoming,
            delta: i64::from(incoming) - i64::from(current),
        }
    }

    #[must_use]
    pub fn is_change(&self) -> bool {
        self.delta != 0
    }
}

/// A conjunctive name lookup: every term must occur in the product name,
/// case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameQuery {
    pub terms: Vec<String>,
    /// Compare against the name with hyphens and dashes removed.
    pub ignore_dashes: bool,
    pub limit: usize,
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
