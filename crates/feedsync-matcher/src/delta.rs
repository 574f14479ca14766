//! Price and stock change classification for matched products.

use feedsync_core::{
    CatalogProduct, PriceChangeCandidate, PriceChangeStatus, RecordError, RetailCalculator,
    StockDelta, SupplierRecord,
};
use rust_decimal::Decimal;
use serde::Serialize;

/// Signed percentage change from `current` to `new`. A non-positive current
/// price has no meaningful ratio and is reported as a 100% change.
///
/// Returns `None` when the ratio does not fit in a [`Decimal`].
#[must_use]
pub fn change_pct(current: Decimal, new: Decimal) -> Option<Decimal> {
    if current <= Decimal::ZERO {
        return Some(Decimal::ONE_HUNDRED);
    }
    new.checked_sub(current)?
        .checked_div(current)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

/// Everything the detector observed for one matched record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delta {
    /// Present only when the change exceeds the materiality threshold.
    pub price_change: Option<PriceChangeCandidate>,
    /// Retail price derived from the supplier cost, when the record had one.
    pub retail_price: Option<Decimal>,
    /// Unrounded change, when the record had a price.
    pub change_pct: Option<Decimal>,
    pub stock: Option<StockDelta>,
}

#[derive(Debug, Clone)]
pub struct DeltaDetector {
    threshold_pct: Decimal,
}

impl DeltaDetector {
    #[must_use]
    pub fn new(threshold_pct: Decimal) -> Self {
        Self { threshold_pct }
    }

    #[must_use]
    pub fn threshold_pct(&self) -> Decimal {
        self.threshold_pct
    }

    /// Compare `record` against the product it resolved to.
    ///
    /// Price changes are only ever emitted as `pending` candidates; nothing
    /// here writes to the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::RetailCalc`] if the retail calculator rejects
    /// the supplier cost, or [`RecordError::InvalidPrice`] if the change
    /// from the catalog price overflows.
    pub fn detect(
        &self,
        matched: &CatalogProduct,
        record: &SupplierRecord,
        supplier_id: &str,
        retail: &dyn RetailCalculator,
    ) -> Result<Delta, RecordError> {
        let stock = record
            .stock
            .map(|incoming| StockDelta::new(matched.stock, incoming));

        let Some(cost) = record.price else {
            return Ok(Delta {
                price_change: None,
                retail_price: None,
                change_pct: None,
                stock,
            });
        };

        let retail_price = retail
            .retail_price(cost, supplier_id, None)
            .map_err(|source| RecordError::RetailCalc {
                sku: record.sku.clone(),
                source,
            })?;
        let pct = change_pct(matched.price, retail_price).ok_or_else(|| {
            RecordError::InvalidPrice {
                sku: record.sku.clone(),
                value: retail_price.to_string(),
                reason: format!("change from catalog price {} overflows", matched.price),
            }
        })?;

        let price_change = (pct.abs() > self.threshold_pct).then(|| PriceChangeCandidate {
            product_id: matched.id,
            sku: matched.sku.clone(),
            product_name: matched.name.clone(),
            current_price: matched.price,
            new_price: retail_price,
            change_pct: pct.round_dp(2),
            supplier_id: supplier_id.to_string(),
            status: PriceChangeStatus::Pending,
        });

        Ok(Delta {
            price_change,
            retail_price: Some(retail_price),
            change_pct: Some(pct),
            stock,
        })
    }
}

#[cfg(test)]
mod tests {
    use feedsync_core::RetailCalcError;

    use super::*;

    fn product(price: i64, stock: i32) -> CatalogProduct {
        CatalogProduct {
            id: 42,
            sku: "KEF-Q350".to_string(),
            model: None,
            name: "KEF Q350".to_string(),
            price: Decimal::from(price),
            stock,
        }
    }

    fn identity(cost: Decimal, _: &str, _: Option<&str>) -> Result<Decimal, RetailCalcError> {
        Ok(cost)
    }

    fn detector() -> DeltaDetector {
        DeltaDetector::new(Decimal::from(10))
    }

    #[test]
    fn change_pct_is_signed() {
        assert_eq!(
            change_pct(Decimal::from(200), Decimal::from(150)),
            Some(Decimal::from(-25))
        );
        assert_eq!(
            change_pct(Decimal::from(100), Decimal::from(110)),
            Some(Decimal::from(10))
        );
    }

    #[test]
    fn change_from_zero_is_one_hundred_percent() {
        assert_eq!(
            change_pct(Decimal::ZERO, Decimal::from(5)),
            Some(Decimal::ONE_HUNDRED)
        );
    }

    #[test]
    fn overflowing_change_is_none() {
        let huge = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        assert_eq!(change_pct(Decimal::new(1, 2), huge), None);
    }

    #[test]
    fn overflowing_change_is_a_record_error() {
        let penny = CatalogProduct {
            price: Decimal::new(1, 2),
            ..product(0, 0)
        };
        let huge = Decimal::from_i128_with_scale(10_i128.pow(27), 0);
        let record = SupplierRecord::new("KEF-Q350").with_price(huge);
        let err = detector()
            .detect(&penny, &record, "acme", &identity)
            .unwrap_err();
        assert!(matches!(err, RecordError::InvalidPrice { ref sku, .. } if sku == "KEF-Q350"));
    }

    #[test]
    fn exactly_ten_percent_is_not_material() {
        let record = SupplierRecord::new("KEF-Q350").with_price(Decimal::from(110));
        let delta = detector()
            .detect(&product(100, 0), &record, "acme", &identity)
            .unwrap();
        assert!(delta.price_change.is_none());
        assert_eq!(delta.change_pct, Some(Decimal::from(10)));
    }

    #[test]
    fn material_increase_emits_pending_candidate() {
        let record = SupplierRecord::new("KEF-Q350").with_price(Decimal::from(5000));
        let delta = detector()
            .detect(&product(4500, 0), &record, "audio-direct", &identity)
            .unwrap();
        let candidate = delta.price_change.unwrap();
        assert_eq!(candidate.status, PriceChangeStatus::Pending);
        assert_eq!(candidate.new_price, Decimal::from(5000));
        assert_eq!(candidate.current_price, Decimal::from(4500));
        assert_eq!(candidate.change_pct, Decimal::new(1111, 2));
        assert_eq!(candidate.supplier_id, "audio-direct");
        assert_eq!(candidate.product_id, 42);
    }

    #[test]
    fn material_decrease_emits_candidate() {
        let record = SupplierRecord::new("KEF-Q350").with_price(Decimal::from(80));
        let delta = detector()
            .detect(&product(100, 0), &record, "acme", &identity)
            .unwrap();
        assert_eq!(delta.price_change.unwrap().change_pct, Decimal::from(-20));
    }

    #[test]
    fn new_price_is_retail_not_cost() {
        let double =
            |cost: Decimal, _: &str, _: Option<&str>| Ok::<_, RetailCalcError>(cost * Decimal::TWO);
        let record = SupplierRecord::new("KEF-Q350").with_price(Decimal::from(100));
        let delta = detector()
            .detect(&product(100, 0), &record, "acme", &double)
            .unwrap();
        assert_eq!(delta.retail_price, Some(Decimal::from(200)));
        assert_eq!(delta.price_change.unwrap().new_price, Decimal::from(200));
    }

    #[test]
    fn retail_failure_is_a_record_error() {
        let failing = |_: Decimal, id: &str, _: Option<&str>| {
            Err::<Decimal, _>(RetailCalcError::UnknownSupplier(id.to_string()))
        };
        let record = SupplierRecord::new("KEF-Q350").with_price(Decimal::from(100));
        let err = detector()
            .detect(&product(100, 0), &record, "nobody", &failing)
            .unwrap_err();
        assert!(matches!(err, RecordError::RetailCalc { ref sku, .. } if sku == "KEF-Q350"));
    }

    #[test]
    fn missing_price_yields_no_change_but_reports_stock() {
        let record = SupplierRecord::new("KEF-Q350").with_stock(7);
        let delta = detector()
            .detect(&product(100, 3), &record, "acme", &identity)
            .unwrap();
        assert!(delta.price_change.is_none());
        assert!(delta.retail_price.is_none());
        let stock = delta.stock.unwrap();
        assert_eq!(stock.delta, 4);
        assert!(stock.is_change());
    }
}
