use serde_json::json;

use super::*;

fn raw(sku: Option<&str>, price: Option<Value>, stock: Option<Value>) -> RawSupplierRow {
    RawSupplierRow {
        sku: sku.map(str::to_string),
        name: Some("  KEF Q350 Bookshelf Speaker ".to_string()),
        price,
        stock,
    }
}

// -----------------------------------------------------------------------
// RawSupplierRow -> SupplierRecord
// -----------------------------------------------------------------------

#[test]
fn try_from_trims_sku_and_name() {
    let record = SupplierRecord::try_from(raw(Some(" KEF-Q350 "), None, None)).unwrap();
    assert_eq!(record.sku, "KEF-Q350");
    assert_eq!(record.name.as_deref(), Some("KEF Q350 Bookshelf Speaker"));
}

#[test]
fn try_from_rejects_missing_sku() {
    let err = SupplierRecord::try_from(raw(None, None, None)).unwrap_err();
    assert!(matches!(err, RecordError::MissingSku));
}

#[test]
fn try_from_rejects_blank_sku() {
    let err = SupplierRecord::try_from(raw(Some("   "), None, None)).unwrap_err();
    assert!(matches!(err, RecordError::MissingSku));
}

#[test]
fn try_from_blank_name_becomes_none() {
    let mut row = raw(Some("A1"), None, None);
    row.name = Some("   ".to_string());
    let record = SupplierRecord::try_from(row).unwrap();
    assert!(record.name.is_none());
}

#[test]
fn try_from_parses_numeric_price() {
    let record = SupplierRecord::try_from(raw(Some("A1"), Some(json!(5000)), None)).unwrap();
    assert_eq!(record.price, Some(Decimal::new(5000, 0)));
}

#[test]
fn try_from_parses_fractional_price() {
    let record = SupplierRecord::try_from(raw(Some("A1"), Some(json!(49.99)), None)).unwrap();
    assert_eq!(record.price, Some(Decimal::new(4999, 2)));
}

#[test]
fn try_from_parses_price_string_with_currency_and_separators() {
    let record =
        SupplierRecord::try_from(raw(Some("A1"), Some(json!("R 1,299.50")), None)).unwrap();
    assert_eq!(record.price, Some(Decimal::new(129_950, 2)));
}

#[test]
fn try_from_price_without_digits_is_absent() {
    let record = SupplierRecord::try_from(raw(Some("A1"), Some(json!("POA")), None)).unwrap();
    assert!(record.price.is_none());
}

#[test]
fn try_from_null_price_is_absent() {
    let record = SupplierRecord::try_from(raw(Some("A1"), Some(Value::Null), None)).unwrap();
    assert!(record.price.is_none());
}

#[test]
fn try_from_rejects_negative_price() {
    let err = SupplierRecord::try_from(raw(Some("A1"), Some(json!(-5)), None)).unwrap_err();
    assert!(matches!(err, RecordError::InvalidPrice { ref sku, .. } if sku == "A1"));
}

#[test]
fn try_from_rejects_malformed_price_string() {
    let err = SupplierRecord::try_from(raw(Some("A1"), Some(json!("1.2.3")), None)).unwrap_err();
    assert!(matches!(err, RecordError::InvalidPrice { .. }));
}

#[test]
fn try_from_rejects_boolean_price() {
    let err = SupplierRecord::try_from(raw(Some("A1"), Some(json!(true)), None)).unwrap_err();
    assert!(matches!(err, RecordError::InvalidPrice { ref reason, .. } if reason.contains("number or string")));
}

#[test]
fn try_from_parses_stock_number_and_string() {
    let a = SupplierRecord::try_from(raw(Some("A1"), None, Some(json!(12)))).unwrap();
    assert_eq!(a.stock, Some(12));

    let b = SupplierRecord::try_from(raw(Some("A1"), None, Some(json!(" 7 units")))).unwrap();
    assert_eq!(b.stock, Some(7));

    let c = SupplierRecord::try_from(raw(Some("A1"), None, Some(json!(3.0)))).unwrap();
    assert_eq!(c.stock, Some(3));
}

#[test]
fn try_from_rejects_fractional_stock() {
    let err = SupplierRecord::try_from(raw(Some("A1"), None, Some(json!(2.5)))).unwrap_err();
    assert!(matches!(err, RecordError::InvalidStock { .. }));
}

#[test]
fn try_from_empty_stock_string_is_absent() {
    let record = SupplierRecord::try_from(raw(Some("A1"), None, Some(json!("n/a")))).unwrap();
    assert!(record.stock.is_none());
}

#[test]
fn raw_row_deserializes_with_missing_fields() {
    let row: RawSupplierRow = serde_json::from_str(r#"{"sku": "X-1"}"#).unwrap();
    assert_eq!(row.sku.as_deref(), Some("X-1"));
    assert!(row.name.is_none());
    assert!(row.price.is_none());
    assert!(row.stock.is_none());
}

// -----------------------------------------------------------------------
// SupplierRecord helpers
// -----------------------------------------------------------------------

#[test]
fn builder_sets_optional_fields() {
    let record = SupplierRecord::new("NEW-999")
        .with_name("Brand New Widget")
        .with_price(Decimal::new(100, 0))
        .with_stock(4);
    assert_eq!(record.sku, "NEW-999");
    assert_eq!(record.name.as_deref(), Some("Brand New Widget"));
    assert_eq!(record.price, Some(Decimal::new(100, 0)));
    assert_eq!(record.stock, Some(4));
    assert!(record.validate().is_ok());
}

#[test]
fn validate_rejects_blank_sku() {
    assert!(matches!(
        SupplierRecord::new(" ").validate(),
        Err(RecordError::MissingSku)
    ));
}

// -----------------------------------------------------------------------
// Enums and small value types
// -----------------------------------------------------------------------

#[test]
fn match_type_display_uses_snake_case() {
    assert_eq!(MatchType::ExactSku.to_string(), "exact_sku");
    assert_eq!(MatchType::NormalizedModel.to_string(), "normalized_model");
    assert_eq!(MatchType::FuzzyName.to_string(), "fuzzy_name");
    assert_eq!(MatchType::None.to_string(), "none");
}

#[test]
fn match_result_none_has_zero_confidence() {
    let result = MatchResult::none();
    assert!(!result.is_match());
    assert_eq!(result.confidence, 0);
    assert_eq!(result.match_type, MatchType::None);
}

#[test]
fn match_result_caps_confidence_at_100() {
    let product = CatalogProduct {
        id: 1,
        sku: "A".to_string(),
        model: None,
        name: "A".to_string(),
        price: Decimal::ONE,
        stock: 0,
    };
    let result = MatchResult::matched(product, MatchType::FuzzyName, 140);
    assert_eq!(result.confidence, 100);
}

#[test]
fn price_change_status_round_trips_through_str() {
    for status in [
        PriceChangeStatus::Pending,
        PriceChangeStatus::Approved,
        PriceChangeStatus::Rejected,
    ] {
        assert_eq!(status.as_str().parse::<PriceChangeStatus>(), Ok(status));
    }
    assert!("bogus".parse::<PriceChangeStatus>().is_err());
}

#[test]
fn new_product_status_serializes_snake_case() {
    let json = serde_json::to_string(&NewProductStatus::ApprovedPending).unwrap();
    assert_eq!(json, "\"approved_pending\"");
    assert_eq!(
        "approved_pending".parse::<NewProductStatus>(),
        Ok(NewProductStatus::ApprovedPending)
    );
}

#[test]
fn stock_delta_computes_signed_difference() {
    let down = StockDelta::new(10, 4);
    assert_eq!(down.delta, -6);
    assert!(down.is_change());

    let same = StockDelta::new(3, 3);
    assert!(!same.is_change());
}
