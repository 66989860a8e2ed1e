//! Transformer tests against the fraud transaction schema

use std::sync::Arc;

use serde_json::{json, Map, Value};

use super::schema::FeatureSchema;
use super::transform::{FeatureTransformer, TransformError};

fn fraud_schema() -> Arc<FeatureSchema> {
    let schema = FeatureSchema::from_json(
        r#"{
            "drop_features": ["nameOrig", "nameDest", "isFraud"],
            "categorical_features": ["type"],
            "encoded_columns": ["type_CASH_IN", "type_CASH_OUT", "type_DEBIT", "type_PAYMENT", "type_TRANSFER"],
            "final_feature_order": [
                "step", "amount", "oldbalanceOrg", "newbalanceOrig",
                "oldbalanceDest", "newbalanceDest", "isFlaggedFraud",
                "type_CASH_IN", "type_CASH_OUT", "type_DEBIT", "type_PAYMENT", "type_TRANSFER"
            ]
        }"#,
    )
    .unwrap();
    Arc::new(schema)
}

fn record(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn transaction() -> Map<String, Value> {
    record(json!({
        "step": 1,
        "type": "TRANSFER",
        "amount": 181.0,
        "nameOrig": "C1305486145",
        "oldbalanceOrg": 181.0,
        "newbalanceOrig": 0.0,
        "nameDest": "C553264065",
        "oldbalanceDest": 0.0,
        "newbalanceDest": 0.0,
        "isFlaggedFraud": 0
    }))
}

#[test]
fn test_transform_orders_and_encodes() {
    let transformer = FeatureTransformer::new(fraud_schema());
    let vector = transformer.transform(&transaction()).unwrap();

    assert_eq!(
        vector.as_slice(),
        &[1.0, 181.0, 181.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
    );
}

#[test]
fn test_shape_is_stable_across_inputs() {
    let transformer = FeatureTransformer::new(fraud_schema());

    let sparse = record(json!({ "amount": 5.0 }));
    let noisy = record(json!({
        "type": "PAYMENT",
        "amount": 10.0,
        "unexpected": "ignored",
        "another": [1, 2, 3]
    }));

    let a = transformer.transform(&transaction()).unwrap();
    let b = transformer.transform(&sparse).unwrap();
    let c = transformer.transform(&noisy).unwrap();

    assert_eq!(a.len(), 12);
    assert_eq!(b.len(), 12);
    assert_eq!(c.len(), 12);
}

#[test]
fn test_absent_categories_are_zero() {
    let schema = fraud_schema();
    let transformer = FeatureTransformer::new(schema.clone());
    let vector = transformer.transform(&transaction()).unwrap();

    for column in ["type_CASH_IN", "type_CASH_OUT", "type_DEBIT", "type_PAYMENT"] {
        let index = schema.feature_index(column).unwrap();
        assert_eq!(vector.get(index), Some(0.0), "{} should be 0", column);
    }
}

#[test]
fn test_unknown_category_encodes_to_nothing() {
    let transformer = FeatureTransformer::new(fraud_schema());
    let mut raw = transaction();
    raw.insert("type".to_string(), json!("WIRE"));

    let vector = transformer.transform(&raw).unwrap();
    assert!(vector.as_slice()[7..].iter().all(|v| *v == 0.0));
}

#[test]
fn test_missing_drop_fields_are_ignored() {
    let transformer = FeatureTransformer::new(fraud_schema());
    let raw = record(json!({ "step": 3, "type": "DEBIT" }));

    let vector = transformer.transform(&raw).unwrap();
    assert_eq!(vector.get(0), Some(3.0));
    assert_eq!(vector.get(9), Some(1.0));
}

#[test]
fn test_numeric_coercions() {
    let transformer = FeatureTransformer::new(fraud_schema());
    let raw = record(json!({
        "step": "7",
        "amount": null,
        "isFlaggedFraud": true
    }));

    let vector = transformer.transform(&raw).unwrap();
    assert_eq!(vector.get(0), Some(7.0));
    assert_eq!(vector.get(1), Some(0.0));
    assert_eq!(vector.get(6), Some(1.0));
}

#[test]
fn test_non_numeric_value_is_rejected() {
    let transformer = FeatureTransformer::new(fraud_schema());
    let raw = record(json!({ "amount": "a lot" }));

    match transformer.transform(&raw) {
        Err(TransformError::NonNumeric { field, .. }) => assert_eq!(field, "amount"),
        other => panic!("Expected NonNumeric, got {:?}", other),
    }
}

#[test]
fn test_pre_encoded_rows_pass_through() {
    // Reference samples are stored already one-hot encoded
    let transformer = FeatureTransformer::new(fraud_schema());
    let raw = record(json!({
        "step": 2,
        "amount": 50.0,
        "type_CASH_OUT": 1,
        "type_TRANSFER": false
    }));

    let vector = transformer.transform(&raw).unwrap();
    assert_eq!(vector.get(8), Some(1.0));
    assert_eq!(vector.get(11), Some(0.0));
}

#[test]
fn test_transform_many_aligns_rows() {
    let transformer = FeatureTransformer::new(fraud_schema());
    let rows = vec![
        transaction(),
        record(json!({ "type": "CASH_IN", "amount": 20.0 })),
        record(json!({})),
    ];

    let matrix = transformer.transform_many(&rows).unwrap();
    assert_eq!(matrix.nrows(), 3);
    assert_eq!(matrix.ncols(), 12);
    assert_eq!(matrix.columns()[11], "type_TRANSFER");

    let cash_in = matrix.column("type_CASH_IN").unwrap();
    assert_eq!(cash_in.to_vec(), vec![0.0, 1.0, 0.0]);
}

#[test]
fn test_transform_values_requires_objects() {
    let transformer = FeatureTransformer::new(fraud_schema());
    let rows = vec![json!({ "amount": 1.0 }), json!([1, 2])];

    match transformer.transform_values(&rows) {
        Err(TransformError::NotAnObject { index }) => assert_eq!(index, 1),
        other => panic!("Expected NotAnObject, got {:?}", other),
    }
}
