// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    DomainError, PendingChange, ServiceAction, ServiceCatalog, ServiceSubscription, ServiceTier,
    ServiceUpdate, apply_service_update, billable_amount, billing_anchor, is_billing_due,
    prorated_charge, remaining_cycle_days, settle_pending_changes,
};
use time::Date;
use time::macros::date;

const LAST_BILLING: Date = date!(2026 - 01 - 01);
const MID_CYCLE: Date = date!(2026 - 01 - 16);

fn create_test_update(service: &str, tier: ServiceTier, action: ServiceAction) -> ServiceUpdate {
    ServiceUpdate {
        service: service.to_string(),
        tier,
        action,
    }
}

fn codes(services: &[ServiceSubscription]) -> Vec<String> {
    services.iter().map(ServiceSubscription::code).collect()
}

fn parse_codes(values: &[&str]) -> Vec<ServiceSubscription> {
    values.iter().map(|code| code.parse().unwrap()).collect()
}

fn apply(
    services: &mut Vec<ServiceSubscription>,
    tier: ServiceTier,
    action: ServiceAction,
) -> Result<i64, DomainError> {
    apply_service_update(
        services,
        &create_test_update("CLICKANDCOLLECT", tier, action),
        &ServiceCatalog::default(),
        LAST_BILLING,
        MID_CYCLE,
    )
}

#[test]
fn test_subscription_codes_parse() {
    let parsed: Vec<ServiceSubscription> = parse_codes(&[
        "PANIER_M",
        "PANIER_C",
        "PANIER_M_REMOVE",
        "PANIER_C_UPDATE",
    ]);
    assert_eq!(parsed[0].tier, ServiceTier::Monthly);
    assert_eq!(parsed[0].pending, None);
    assert_eq!(parsed[1].tier, ServiceTier::Consumption);
    assert_eq!(parsed[2].pending, Some(PendingChange::Remove));
    assert_eq!(parsed[3].pending, Some(PendingChange::Update));
    assert_eq!(
        codes(&parsed),
        vec!["PANIER_M", "PANIER_C", "PANIER_M_REMOVE", "PANIER_C_UPDATE"]
    );

    assert!("PANIER".parse::<ServiceSubscription>().is_err());
    assert!("_M".parse::<ServiceSubscription>().is_err());
}

#[test]
fn test_billing_anchor_and_remaining_days() {
    assert_eq!(billing_anchor(LAST_BILLING).unwrap(), date!(2026 - 01 - 31));
    assert_eq!(remaining_cycle_days(LAST_BILLING, MID_CYCLE).unwrap(), 15);
    assert_eq!(
        remaining_cycle_days(LAST_BILLING, date!(2026 - 03 - 01)).unwrap(),
        0
    );
    assert!(!is_billing_due(LAST_BILLING, date!(2026 - 01 - 30)).unwrap());
    assert!(is_billing_due(LAST_BILLING, date!(2026 - 01 - 31)).unwrap());
}

#[test]
fn test_prorated_charge_rounds_half_up_to_minor_units() {
    assert_eq!(prorated_charge(2_000, 15), 1_000);
    assert_eq!(prorated_charge(2_000, 30), 2_000);
    assert_eq!(prorated_charge(2_000, 0), 0);
    // 19.99 / 30 = 0.6663 -> 0.67
    assert_eq!(prorated_charge(1_999, 1), 67);
    // 0.45 / 30 = 0.015 -> 0.02
    assert_eq!(prorated_charge(45, 1), 2);
}

#[test]
fn test_add_monthly_charges_remaining_days() {
    let mut services: Vec<ServiceSubscription> = Vec::new();
    let charge: i64 = apply(&mut services, ServiceTier::Monthly, ServiceAction::Add).unwrap();
    assert_eq!(charge, 1_000);
    assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_M"]);
}

#[test]
fn test_add_consumption_is_free() {
    let mut services: Vec<ServiceSubscription> = Vec::new();
    let charge: i64 = apply(&mut services, ServiceTier::Consumption, ServiceAction::Add).unwrap();
    assert_eq!(charge, 0);
    assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_C"]);
}

#[test]
fn test_add_active_service_is_rejected() {
    for existing in ["CLICKANDCOLLECT_M", "CLICKANDCOLLECT_C", "CLICKANDCOLLECT_C_UPDATE"] {
        let mut services: Vec<ServiceSubscription> = parse_codes(&[existing]);
        let result: Result<i64, DomainError> =
            apply(&mut services, ServiceTier::Monthly, ServiceAction::Add);
        assert_eq!(
            result,
            Err(DomainError::ServiceAlreadySubscribed(String::from(
                "CLICKANDCOLLECT"
            )))
        );
        assert_eq!(codes(&services), vec![existing]);
    }
}

#[test]
fn test_add_after_remove_restores_without_charge() {
    let mut services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_M_REMOVE"]);
    let charge: i64 = apply(&mut services, ServiceTier::Monthly, ServiceAction::Add).unwrap();
    assert_eq!(charge, 0);
    assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_M"]);

    let mut services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_M_REMOVE"]);
    let charge: i64 = apply(&mut services, ServiceTier::Consumption, ServiceAction::Add).unwrap();
    assert_eq!(charge, 0);
    assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_C_UPDATE"]);
}

#[test]
fn test_update_consumption_to_monthly_charges_like_add() {
    let mut services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_C"]);
    let charge: i64 = apply(&mut services, ServiceTier::Monthly, ServiceAction::Update).unwrap();
    assert_eq!(charge, 1_000);
    assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_M"]);
}

#[test]
fn test_update_monthly_to_consumption_is_deferred() {
    let mut services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_M"]);
    let charge: i64 =
        apply(&mut services, ServiceTier::Consumption, ServiceAction::Update).unwrap();
    assert_eq!(charge, 0);
    assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_C_UPDATE"]);

    // Switching back within the cycle is free.
    let charge: i64 = apply(&mut services, ServiceTier::Monthly, ServiceAction::Update).unwrap();
    assert_eq!(charge, 0);
    assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_M"]);
}

#[test]
fn test_update_to_current_tier_is_rejected() {
    let mut services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_M"]);
    assert!(apply(&mut services, ServiceTier::Monthly, ServiceAction::Update).is_err());

    let mut services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_C"]);
    assert!(apply(&mut services, ServiceTier::Consumption, ServiceAction::Update).is_err());
}

#[test]
fn test_remove_monthly_is_deferred() {
    for existing in ["CLICKANDCOLLECT_M", "CLICKANDCOLLECT_C_UPDATE"] {
        let mut services: Vec<ServiceSubscription> = parse_codes(&[existing]);
        let charge: i64 =
            apply(&mut services, ServiceTier::Monthly, ServiceAction::Remove).unwrap();
        assert_eq!(charge, 0);
        assert_eq!(codes(&services), vec!["CLICKANDCOLLECT_M_REMOVE"]);
    }
}

#[test]
fn test_remove_consumption_is_immediate() {
    let mut services: Vec<ServiceSubscription> =
        parse_codes(&["PANIER_M", "CLICKANDCOLLECT_C"]);
    apply(&mut services, ServiceTier::Consumption, ServiceAction::Remove).unwrap();
    assert_eq!(codes(&services), vec!["PANIER_M"]);
}

#[test]
fn test_update_or_remove_unsubscribed_service_is_rejected() {
    let mut services: Vec<ServiceSubscription> = Vec::new();
    let expected: Result<i64, DomainError> = Err(DomainError::ServiceNotSubscribed(String::from(
        "CLICKANDCOLLECT",
    )));
    assert_eq!(
        apply(&mut services, ServiceTier::Monthly, ServiceAction::Update),
        expected
    );
    assert_eq!(
        apply(&mut services, ServiceTier::Monthly, ServiceAction::Remove),
        expected
    );
}

#[test]
fn test_unknown_service_is_rejected() {
    let mut services: Vec<ServiceSubscription> = Vec::new();
    let result: Result<i64, DomainError> = apply_service_update(
        &mut services,
        &create_test_update("DELIVERY", ServiceTier::Monthly, ServiceAction::Add),
        &ServiceCatalog::default(),
        LAST_BILLING,
        MID_CYCLE,
    );
    assert_eq!(
        result,
        Err(DomainError::UnknownService(String::from("DELIVERY")))
    );
    assert!(services.is_empty());
}

#[test]
fn test_service_names_are_case_insensitive() {
    let mut services: Vec<ServiceSubscription> = Vec::new();
    apply_service_update(
        &mut services,
        &create_test_update("panier", ServiceTier::Consumption, ServiceAction::Add),
        &ServiceCatalog::default(),
        LAST_BILLING,
        MID_CYCLE,
    )
    .unwrap();
    assert_eq!(codes(&services), vec!["PANIER_C"]);
}

#[test]
fn test_billable_amount() {
    let catalog: ServiceCatalog = ServiceCatalog::default();
    let click: i64 = catalog.find("CLICKANDCOLLECT").unwrap().month_price;
    let panier_per_command: i64 = catalog.find("PANIER").unwrap().consumption_price;

    let services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_M_REMOVE", "PANIER_C"]);
    assert_eq!(
        billable_amount(&services, &catalog, 4),
        click + 4 * panier_per_command
    );

    let services: Vec<ServiceSubscription> = parse_codes(&["CLICKANDCOLLECT_C_UPDATE"]);
    assert_eq!(billable_amount(&services, &catalog, 10), click);
}

#[test]
fn test_settle_pending_changes() {
    let mut services: Vec<ServiceSubscription> = parse_codes(&[
        "CLICKANDCOLLECT_M_REMOVE",
        "PANIER_C_UPDATE",
    ]);
    settle_pending_changes(&mut services);
    assert_eq!(codes(&services), vec!["PANIER_C"]);
}
