// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::DomainError;

#[test]
fn test_domain_error_display() {
    let err: DomainError = DomainError::InvalidIdentifier(String::from("xyz"));
    assert_eq!(format!("{err}"), "Invalid identifier: 'xyz'");

    let err: DomainError = DomainError::InvalidPageSize {
        requested: 0,
        max: 100,
    };
    assert_eq!(
        format!("{err}"),
        "Invalid page size: 0. Must be between 1 and 100"
    );

    let err: DomainError = DomainError::InvalidName {
        field: "product name",
        reason: String::from("cannot be empty"),
    };
    assert_eq!(format!("{err}"), "Invalid product name: cannot be empty");

    let err: DomainError = DomainError::InvalidPrice {
        field: "product price",
        amount: -5,
    };
    assert_eq!(
        format!("{err}"),
        "Invalid product price: -5 must not be negative"
    );

    let err: DomainError = DomainError::InvalidStatusTransition {
        from: String::from("DONE"),
        to: String::from("READY"),
    };
    assert_eq!(format!("{err}"), "Cannot change command status from DONE to READY");

    let err: DomainError = DomainError::UnknownService(String::from("DELIVERY"));
    assert_eq!(format!("{err}"), "Unknown service: 'DELIVERY'");

    let err: DomainError = DomainError::EmptyPanier;
    assert_eq!(
        format!("{err}"),
        "A panier must contain at least one product"
    );
}

#[test]
fn test_domain_error_is_std_error() {
    let err: Box<dyn std::error::Error> =
        Box::new(DomainError::InvalidCursor(String::from("not base64")));
    assert_eq!(err.to_string(), "Invalid cursor: not base64");
}
