// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    DomainError, EntityId, GeoPoint, PanierItem, normalize_email, validate_email, validate_name,
    validate_panier_items, validate_position, validate_price, validate_quantity,
    validate_tax_rate,
};

#[test]
fn test_normalize_email_trims_and_lowercases() {
    assert_eq!(normalize_email("  Jane.Doe@Example.COM "), "jane.doe@example.com");
}

#[test]
fn test_valid_emails() {
    for email in ["a@b.co", "jane.doe+shop@example.com", "x@mail.example.org"] {
        assert!(validate_email(email).is_ok(), "{email} should be valid");
    }
}

#[test]
fn test_invalid_emails() {
    for email in [
        "",
        "plainaddress",
        "@example.com",
        "jane@",
        "jane@localhost",
        "jane@@example.com",
        "ja ne@example.com",
        "jane@example.",
        "jane@.example.com",
    ] {
        assert_eq!(
            validate_email(email),
            Err(DomainError::InvalidEmail(email.to_string())),
            "{email} should be invalid"
        );
    }
}

#[test]
fn test_overlong_email_is_rejected() {
    let email: String = format!("{}@example.com", "a".repeat(250));
    assert!(validate_email(&email).is_err());
}

#[test]
fn test_names_must_not_be_blank() {
    assert!(validate_name("first name", "Jane").is_ok());
    assert!(matches!(
        validate_name("first name", "   "),
        Err(DomainError::InvalidName {
            field: "first name",
            ..
        })
    ));
    assert!(validate_name("first name", &"x".repeat(201)).is_err());
}

#[test]
fn test_prices_must_not_be_negative() {
    assert!(validate_price("price", 0).is_ok());
    assert!(validate_price("price", 1_250).is_ok());
    assert_eq!(
        validate_price("price", -1),
        Err(DomainError::InvalidPrice {
            field: "price",
            amount: -1,
        })
    );
}

#[test]
fn test_tax_rate_range() {
    assert!(validate_tax_rate(0.0).is_ok());
    assert!(validate_tax_rate(5.5).is_ok());
    assert!(validate_tax_rate(100.0).is_ok());
    assert!(validate_tax_rate(-0.1).is_err());
    assert!(validate_tax_rate(100.1).is_err());
    assert!(validate_tax_rate(f64::NAN).is_err());
}

#[test]
fn test_quantity_must_be_positive() {
    assert!(validate_quantity("quantity", 1).is_ok());
    assert!(validate_quantity("quantity", 0).is_err());
    assert!(validate_quantity("quantity", -4).is_err());
}

#[test]
fn test_position_ranges() {
    assert!(
        validate_position(GeoPoint {
            latitude: 48.85,
            longitude: 2.35,
        })
        .is_ok()
    );
    assert!(
        validate_position(GeoPoint {
            latitude: 90.5,
            longitude: 0.0,
        })
        .is_err()
    );
    assert!(
        validate_position(GeoPoint {
            latitude: 0.0,
            longitude: -180.5,
        })
        .is_err()
    );
}

#[test]
fn test_panier_items() {
    assert_eq!(validate_panier_items(&[]), Err(DomainError::EmptyPanier));

    let items: Vec<PanierItem> = vec![PanierItem {
        product_id: EntityId::generate(),
        quantity: 0,
    }];
    assert!(validate_panier_items(&items).is_err());

    let items: Vec<PanierItem> = vec![PanierItem {
        product_id: EntityId::generate(),
        quantity: 2,
    }];
    assert!(validate_panier_items(&items).is_ok());
}
