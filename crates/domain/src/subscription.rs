// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Service subscriptions of a commerce and their billing rules.
//!
//! A commerce subscribes to catalog services in one of two tiers:
//!
//! - monthly (`NAME_M`): a flat price per 30-day billing cycle
//! - consumption (`NAME_C`): a price per commerce command received
//!
//! Monthly commitments run until the end of the current cycle. Removing a
//! monthly service therefore tags it `NAME_M_REMOVE`, and switching it to
//! consumption tags it `NAME_C_UPDATE`; both are billed monthly one last
//! time and settled by the next billing pass.
//!
//! Subscribing to a monthly service mid-cycle charges the remaining days of
//! the cycle to the commerce's due balance.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use time::{Date, Duration};

/// Length of a billing cycle in days.
pub const BILLING_CYCLE_DAYS: i64 = 30;

/// Billing tier of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceTier {
    /// Flat price per billing cycle.
    Monthly,
    /// Price per commerce command received.
    Consumption,
}

impl ServiceTier {
    const fn suffix(self) -> &'static str {
        match self {
            Self::Monthly => "M",
            Self::Consumption => "C",
        }
    }
}

/// A change that takes effect at the next billing pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingChange {
    /// Monthly service removed; billed once more, then dropped.
    Remove,
    /// Monthly service switched to consumption; billed monthly once more.
    Update,
}

/// One entry of a commerce's subscribed service list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceSubscription {
    /// Catalog service name, e.g. `CLICKANDCOLLECT`.
    pub service: String,
    pub tier: ServiceTier,
    pub pending: Option<PendingChange>,
}

impl ServiceSubscription {
    /// Creates an active subscription with no pending change.
    #[must_use]
    pub fn new(service: &str, tier: ServiceTier) -> Self {
        Self {
            service: service.to_uppercase(),
            tier,
            pending: None,
        }
    }

    /// Returns the storage code, e.g. `CLICKANDCOLLECT_M_REMOVE`.
    #[must_use]
    pub fn code(&self) -> String {
        match self.pending {
            None => format!("{}_{}", self.service, self.tier.suffix()),
            Some(PendingChange::Remove) => format!("{}_M_REMOVE", self.service),
            Some(PendingChange::Update) => format!("{}_C_UPDATE", self.service),
        }
    }

    /// Returns true if the next billing pass bills this entry at the
    /// monthly price.
    #[must_use]
    pub const fn is_billed_monthly(&self) -> bool {
        matches!(self.tier, ServiceTier::Monthly)
            || matches!(self.pending, Some(PendingChange::Update))
    }

    /// Returns true if the next billing pass bills this entry per command.
    #[must_use]
    pub const fn is_billed_per_command(&self) -> bool {
        matches!(self.tier, ServiceTier::Consumption) && self.pending.is_none()
    }
}

impl FromStr for ServiceSubscription {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (service, tier, pending): (&str, ServiceTier, Option<PendingChange>) =
            if let Some(service) = s.strip_suffix("_M_REMOVE") {
                (service, ServiceTier::Monthly, Some(PendingChange::Remove))
            } else if let Some(service) = s.strip_suffix("_C_UPDATE") {
                (service, ServiceTier::Consumption, Some(PendingChange::Update))
            } else if let Some(service) = s.strip_suffix("_M") {
                (service, ServiceTier::Monthly, None)
            } else if let Some(service) = s.strip_suffix("_C") {
                (service, ServiceTier::Consumption, None)
            } else {
                return Err(DomainError::InvalidServiceCode(s.to_string()));
            };

        if service.is_empty() {
            return Err(DomainError::InvalidServiceCode(s.to_string()));
        }

        Ok(Self {
            service: service.to_string(),
            tier,
            pending,
        })
    }
}

impl TryFrom<String> for ServiceSubscription {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServiceSubscription> for String {
    fn from(value: ServiceSubscription) -> Self {
        value.code()
    }
}

/// Catalog entry describing a subscribable service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub name: String,
    pub description: String,
    /// Price per billing cycle, in minor currency units.
    pub month_price: i64,
    /// Price per commerce command, in minor currency units.
    pub consumption_price: i64,
}

/// The services a commerce may subscribe to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCatalog {
    services: Vec<ServiceInfo>,
}

impl ServiceCatalog {
    /// Creates a catalog from a list of services.
    #[must_use]
    pub const fn new(services: Vec<ServiceInfo>) -> Self {
        Self { services }
    }

    /// Returns every service of the catalog.
    #[must_use]
    pub fn services(&self) -> &[ServiceInfo] {
        &self.services
    }

    /// Looks up a service by name, case-insensitively.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&ServiceInfo> {
        self.services
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(name))
    }
}

impl Default for ServiceCatalog {
    fn default() -> Self {
        Self::new(vec![
            ServiceInfo {
                name: String::from("CLICKANDCOLLECT"),
                description: String::from("Online ordering of individual products for pickup"),
                month_price: 2_000,
                consumption_price: 50,
            },
            ServiceInfo {
                name: String::from("PANIER"),
                description: String::from("Sale of fixed-price product baskets"),
                month_price: 1_500,
                consumption_price: 30,
            },
        ])
    }
}

/// Kind of change requested on a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceAction {
    Add,
    Update,
    Remove,
}

/// A requested change on a commerce's subscription list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub service: String,
    /// Target tier; ignored for `Remove`.
    pub tier: ServiceTier,
    pub action: ServiceAction,
}

/// Returns the next billing date after `last_billing`.
///
/// # Errors
///
/// Returns an error if the date overflows.
pub fn billing_anchor(last_billing: Date) -> Result<Date, DomainError> {
    last_billing
        .checked_add(Duration::days(BILLING_CYCLE_DAYS))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("computing the billing anchor after {last_billing}"),
        })
}

/// Returns the number of days left before the billing anchor, never negative.
///
/// # Errors
///
/// Returns an error if the anchor date overflows.
pub fn remaining_cycle_days(last_billing: Date, today: Date) -> Result<i64, DomainError> {
    let anchor: Date = billing_anchor(last_billing)?;
    Ok((anchor - today).whole_days().max(0))
}

/// Returns true once the billing anchor has been reached.
///
/// # Errors
///
/// Returns an error if the anchor date overflows.
pub fn is_billing_due(last_billing: Date, today: Date) -> Result<bool, DomainError> {
    Ok(today >= billing_anchor(last_billing)?)
}

/// Prorates a monthly price over the remaining days of a cycle.
///
/// Computes `month_price / 30 * remaining_days` rounded half-up to the
/// minor currency unit, i.e. to two decimals of the major unit.
#[must_use]
pub const fn prorated_charge(month_price: i64, remaining_days: i64) -> i64 {
    (month_price * remaining_days + BILLING_CYCLE_DAYS / 2) / BILLING_CYCLE_DAYS
}

/// Applies a subscription change and returns the amount to add to the
/// commerce's due balance.
///
/// # Arguments
///
/// * `services` - The commerce's subscription list, modified in place
/// * `update` - The requested change
/// * `catalog` - The service catalog
/// * `last_billing` - The commerce's last billing date
/// * `today` - The current date
///
/// # Errors
///
/// Returns an error if:
/// - The service is not in the catalog
/// - An added service is already active
/// - An updated or removed service is not subscribed
/// - An update does not change the tier
pub fn apply_service_update(
    services: &mut Vec<ServiceSubscription>,
    update: &ServiceUpdate,
    catalog: &ServiceCatalog,
    last_billing: Date,
    today: Date,
) -> Result<i64, DomainError> {
    let info: &ServiceInfo = catalog
        .find(&update.service)
        .ok_or_else(|| DomainError::UnknownService(update.service.clone()))?;
    let name: &str = info.name.as_str();
    let position: Option<usize> = services.iter().position(|entry| entry.service == name);

    let monthly_charge = || -> Result<i64, DomainError> {
        Ok(prorated_charge(
            info.month_price,
            remaining_cycle_days(last_billing, today)?,
        ))
    };

    match update.action {
        ServiceAction::Add => {
            let Some(index) = position else {
                services.push(ServiceSubscription::new(name, update.tier));
                return match update.tier {
                    ServiceTier::Monthly => monthly_charge(),
                    ServiceTier::Consumption => Ok(0),
                };
            };

            let entry: &mut ServiceSubscription = &mut services[index];
            if entry.pending != Some(PendingChange::Remove) {
                return Err(DomainError::ServiceAlreadySubscribed(name.to_string()));
            }

            // The current cycle is already paid for.
            match update.tier {
                ServiceTier::Monthly => entry.pending = None,
                ServiceTier::Consumption => {
                    entry.tier = ServiceTier::Consumption;
                    entry.pending = Some(PendingChange::Update);
                }
            }
            Ok(0)
        }
        ServiceAction::Update => {
            let index: usize =
                position.ok_or_else(|| DomainError::ServiceNotSubscribed(name.to_string()))?;
            let entry: &mut ServiceSubscription = &mut services[index];

            match (update.tier, entry.tier, entry.pending) {
                (ServiceTier::Monthly, ServiceTier::Consumption, None) => {
                    entry.tier = ServiceTier::Monthly;
                    monthly_charge()
                }
                (ServiceTier::Monthly, _, Some(_)) => {
                    entry.tier = ServiceTier::Monthly;
                    entry.pending = None;
                    Ok(0)
                }
                (ServiceTier::Consumption, ServiceTier::Monthly, _) => {
                    entry.tier = ServiceTier::Consumption;
                    entry.pending = Some(PendingChange::Update);
                    Ok(0)
                }
                _ => Err(DomainError::ServiceAlreadySubscribed(name.to_string())),
            }
        }
        ServiceAction::Remove => {
            let index: usize =
                position.ok_or_else(|| DomainError::ServiceNotSubscribed(name.to_string()))?;
            let entry: &mut ServiceSubscription = &mut services[index];

            if entry.is_billed_monthly() {
                entry.tier = ServiceTier::Monthly;
                entry.pending = Some(PendingChange::Remove);
            } else {
                services.remove(index);
            }
            Ok(0)
        }
    }
}

/// Amount billed by a billing pass for a subscription list.
///
/// # Arguments
///
/// * `services` - The commerce's subscription list
/// * `catalog` - The service catalog
/// * `commands_in_cycle` - Commerce commands received since the last billing
#[must_use]
pub fn billable_amount(
    services: &[ServiceSubscription],
    catalog: &ServiceCatalog,
    commands_in_cycle: i64,
) -> i64 {
    services
        .iter()
        .filter_map(|entry| {
            let info: &ServiceInfo = catalog.find(&entry.service)?;
            if entry.is_billed_monthly() {
                Some(info.month_price)
            } else if entry.is_billed_per_command() {
                Some(info.consumption_price * commands_in_cycle)
            } else {
                None
            }
        })
        .sum()
}

/// Settles pending changes once a billing pass has charged the commerce.
///
/// `NAME_M_REMOVE` entries are dropped and `NAME_C_UPDATE` entries become
/// plain consumption subscriptions.
pub fn settle_pending_changes(services: &mut Vec<ServiceSubscription>) {
    services.retain(|entry| entry.pending != Some(PendingChange::Remove));
    for entry in services.iter_mut() {
        entry.pending = None;
    }
}
