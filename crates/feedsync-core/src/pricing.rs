//! Cost-to-retail conversion driven by per-supplier markup rules.

use std::collections::HashMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::RetailCalcError;
use crate::store::RetailCalculator;
use crate::suppliers::SuppliersFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MarkupRule {
    markup_pct: Decimal,
    round_to: Option<Decimal>,
}

/// `retail = cost * (1 + markup_pct / 100)`, optionally rounded up to a
/// multiple of `round_to`, keyed by supplier slug.
#[derive(Debug, Clone, Default)]
pub struct MarkupRules {
    rules: HashMap<String, MarkupRule>,
}

impl MarkupRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_suppliers(file: &SuppliersFile) -> Self {
        let mut rules = Self::new();
        for supplier in &file.suppliers {
            rules.insert(&supplier.slug(), supplier.markup_pct, supplier.round_to);
        }
        rules
    }

    pub fn insert(&mut self, supplier_id: &str, markup_pct: Decimal, round_to: Option<Decimal>) {
        self.rules.insert(
            supplier_id.to_string(),
            MarkupRule {
                markup_pct,
                round_to,
            },
        );
    }
}

impl RetailCalculator for MarkupRules {
    fn retail_price(
        &self,
        cost: Decimal,
        supplier_id: &str,
        _category: Option<&str>,
    ) -> Result<Decimal, RetailCalcError> {
        if cost < Decimal::ZERO {
            return Err(RetailCalcError::InvalidCost(cost));
        }
        let rule = self
            .rules
            .get(supplier_id)
            .ok_or_else(|| RetailCalcError::UnknownSupplier(supplier_id.to_string()))?;

        let factor = Decimal::ONE + rule.markup_pct / Decimal::ONE_HUNDRED;
        let retail = cost
            .checked_mul(factor)
            .ok_or_else(|| RetailCalcError::Other(format!("overflow computing retail for {cost}")))?;

        let retail = match rule.round_to {
            Some(step) if step > Decimal::ZERO => retail
                .checked_div(step)
                .map(|steps| steps.round_dp_with_strategy(0, RoundingStrategy::AwayFromZero))
                .and_then(|steps| steps.checked_mul(step))
                .ok_or_else(|| {
                    RetailCalcError::Other(format!(
                        "overflow rounding {retail} to a multiple of {step}"
                    ))
                })?,
            _ => retail.round_dp(2),
        };
        Ok(retail.normalize())
    }
}
