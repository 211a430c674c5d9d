//! Tests for `#[derive(Entity)]`.

mod common;

use chrono::NaiveDateTime;
use common::*;
use oxide_mapper_core::schema::Entity;
use oxide_mapper_core::{ConversionError, Parameters, SqlValue};
use uuid::Uuid;

// =============================================================================
// Descriptors
// =============================================================================

#[test]
fn test_descriptor_names() {
    let descriptor = Product::descriptor();
    assert_eq!(descriptor.type_name, "Product");
    assert_eq!(descriptor.table, Some("Product"));
    assert_eq!(descriptor.schema, Some("Sales"));
    assert!(!descriptor.interface);
    assert!(IWidget::descriptor().interface);
}

#[test]
fn test_field_flags() {
    let fields = Product::descriptor().fields;
    assert_eq!(fields.len(), 5);

    let key = &fields[0];
    assert_eq!(key.property, "product_id");
    assert_eq!(key.column_name(), "ProductID");
    assert!(key.key && key.identity);

    assert_eq!(fields[3].column_name(), "rowguid");
    assert!(fields[3].ignore_update);
    assert!(fields[4].generated);
    assert_eq!(SequencePerson::descriptor().fields[0].sequence, Some("person_seq"));
}

#[test]
fn test_ignored_field_is_not_described() {
    assert!(Product::descriptor()
        .fields
        .iter()
        .all(|f| f.property != "cached_label"));
}

#[test]
fn test_raw_identifier_property() {
    #[derive(Default, oxide_mapper_derive::Entity)]
    struct Keyword {
        id: i64,
        r#type: String,
    }
    assert_eq!(Keyword::descriptor().fields[1].property, "type");
    let mut k = Keyword::default();
    k.set_value("type", SqlValue::Text("x".into())).unwrap();
    assert_eq!(k.get_value("TYPE"), Some(SqlValue::Text("x".into())));
}

#[test]
fn test_unsigned_fields_round_trip() {
    #[derive(Default, oxide_mapper_derive::Entity)]
    struct Counters {
        id: i64,
        hits: u32,
        retries: u16,
        flags: u8,
    }
    let mut c = Counters::default();
    c.set_value("hits", SqlValue::Int(i64::from(u32::MAX))).unwrap();
    c.set_value("flags", SqlValue::Int(255)).unwrap();
    assert_eq!(c.get_value("hits"), Some(SqlValue::Int(i64::from(u32::MAX))));
    assert_eq!(c.get_value("retries"), Some(SqlValue::Int(0)));

    let err = c.set_value("flags", SqlValue::Int(-1)).unwrap_err();
    assert!(matches!(err, ConversionError::OutOfRange { target: "u8", .. }));
    assert_eq!(c.flags, 255);
}

// =============================================================================
// Accessors
// =============================================================================

#[test]
fn test_get_value() {
    let guid = Uuid::new_v4();
    let product = Product {
        product_id: 7,
        name: String::from("Chain"),
        color: None,
        guid_id: guid,
        modified_date: None,
        cached_label: Some(String::from("ignored")),
    };
    assert_eq!(product.get_value("product_id"), Some(SqlValue::Int(7)));
    assert_eq!(product.get_value("Name"), Some(SqlValue::Text("Chain".into())));
    assert_eq!(product.get_value("color"), Some(SqlValue::Null));
    assert_eq!(
        product.get_value("guid_id"),
        Some(SqlValue::Text(guid.to_string()))
    );
    assert_eq!(product.get_value("cached_label"), None);
    assert_eq!(product.get_value("missing"), None);
}

#[test]
fn test_set_value_coerces() {
    let mut product = Product::default();
    product.set_value("PRODUCT_ID", SqlValue::Text("12".into())).unwrap();
    product
        .set_value("modified_date", SqlValue::Text("2024-02-03 04:05:06".into()))
        .unwrap();
    product.set_value("color", SqlValue::Null).unwrap();

    assert_eq!(product.product_id, 12);
    assert_eq!(
        product.modified_date,
        NaiveDateTime::parse_from_str("2024-02-03 04:05:06", "%Y-%m-%d %H:%M:%S").ok()
    );
    assert_eq!(product.color, None);
}

#[test]
fn test_set_value_errors() {
    let mut person = Person::default();
    assert!(matches!(
        person.set_value("nickname", SqlValue::Int(1)),
        Err(ConversionError::UnknownField(_))
    ));
    assert!(matches!(
        person.set_value("id", SqlValue::Null),
        Err(ConversionError::Incompatible { .. })
    ));
    assert!(matches!(
        person.set_value("id", SqlValue::Float(1.5)),
        Err(ConversionError::OutOfRange { .. })
    ));
    assert_eq!(person, Person::default());
}

#[test]
fn test_parameters_from_entity() {
    let person = Person {
        id: 5,
        first_name: String::from("Ada"),
        last_name: String::from("Lovelace"),
    };
    let params = Parameters::from_entity(&person);
    assert_eq!(params.len(), 3);
    assert_eq!(params.get("ID"), Some(&SqlValue::Int(5)));
    assert_eq!(params.get("last_name"), Some(&SqlValue::Text("Lovelace".into())));
}
