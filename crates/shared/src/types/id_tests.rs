use super::*;
use std::str::FromStr;
use uuid::Uuid;

#[test]
fn test_typed_id_creation() {
    let id = ApartmentId::new();
    assert!(!id.to_string().is_empty());
}

#[test]
fn test_typed_id_from_uuid() {
    let uuid = Uuid::new_v4();
    let id = BuildingId::from_uuid(uuid);
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_display() {
    let uuid = Uuid::new_v4();
    let id = ExpenseId::from_uuid(uuid);
    assert_eq!(format!("{id}"), uuid.to_string());
}

#[test]
fn test_typed_id_from_str() {
    let uuid = Uuid::new_v4();
    let id = SessionId::from_str(&uuid.to_string()).unwrap();
    assert_eq!(id.into_inner(), uuid);
}

#[test]
fn test_typed_id_from_str_error() {
    assert!(ApartmentId::from_str("invalid").is_err());
}

#[test]
fn test_typed_id_ordering_follows_integer_value() {
    let low = ApartmentId::from_u128(1);
    let high = ApartmentId::from_u128(2);
    assert!(low < high);

    let mut ids = vec![high, low];
    ids.sort();
    assert_eq!(ids, vec![low, high]);
}

#[test]
fn test_v7_ids_are_time_ordered() {
    let first = ApartmentId::new();
    let second = ApartmentId::new();
    assert!(first <= second);
}
