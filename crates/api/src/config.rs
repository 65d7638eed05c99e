// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Runtime settings shared by the services.

use localmarket_domain::ServiceCatalog;
use time::Duration;

use crate::password_policy::PasswordPolicy;

/// Default session lifetime (30 days).
pub const DEFAULT_SESSION_LIFETIME: Duration = Duration::days(30);

/// Settings passed explicitly into every service call that needs them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// How long a login session stays valid.
    pub session_lifetime: Duration,
    /// Subscribable services and their prices.
    pub catalog: ServiceCatalog,
    /// Requirements applied to new and changed passwords.
    pub password_policy: PasswordPolicy,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            session_lifetime: DEFAULT_SESSION_LIFETIME,
            catalog: ServiceCatalog::default(),
            password_policy: PasswordPolicy::default(),
        }
    }
}
