// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Command status lifecycle and parent status aggregation.
//!
//! A `CommerceCommand` carries its own status, changed by storekeepers.
//! The parent `Command` has no status of its own: it is derived from the
//! statuses of its children with `aggregate_command_status`.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Status of a commerce command, and the derived status of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommandStatus {
    /// The storekeeper is preparing the order.
    #[default]
    InProgress,
    /// The order is ready for pickup.
    Ready,
    /// The order was picked up.
    Done,
    /// The order was canceled.
    Canceled,
}

impl CommandStatus {
    /// Returns the string representation used in storage and the API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "INPROGRESS",
            Self::Ready => "READY",
            Self::Done => "DONE",
            Self::Canceled => "CANCELED",
        }
    }

    /// Returns true if no further status change is allowed.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Canceled)
    }

    /// Validates a storekeeper-initiated status change.
    ///
    /// Valid transitions are:
    /// - `INPROGRESS` → `READY`, `DONE`, `CANCELED`
    /// - `READY` → `INPROGRESS`, `DONE`, `CANCELED`
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStatusTransition` for any other change,
    /// including a change to the current status.
    pub fn validate_transition(&self, new_status: Self) -> Result<(), DomainError> {
        let valid: bool = match self {
            Self::InProgress => matches!(new_status, Self::Ready | Self::Done | Self::Canceled),
            Self::Ready => matches!(new_status, Self::InProgress | Self::Done | Self::Canceled),
            Self::Done | Self::Canceled => false,
        };

        if valid {
            Ok(())
        } else {
            Err(DomainError::InvalidStatusTransition {
                from: self.as_str().to_string(),
                to: new_status.as_str().to_string(),
            })
        }
    }
}

impl FromStr for CommandStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INPROGRESS" => Ok(Self::InProgress),
            "READY" => Ok(Self::Ready),
            "DONE" => Ok(Self::Done),
            "CANCELED" => Ok(Self::Canceled),
            _ => Err(DomainError::InvalidCommandStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for CommandStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derives a command's status from the statuses of its commerce commands.
///
/// Precedence:
/// 1. every child `CANCELED` → `CANCELED`
/// 2. every child `DONE` → `DONE`
/// 3. every child `READY` → `READY`
/// 4. anything else → `INPROGRESS`
///
/// A command without children is `INPROGRESS`.
#[must_use]
pub fn aggregate_command_status(children: &[CommandStatus]) -> CommandStatus {
    if children.is_empty() {
        return CommandStatus::InProgress;
    }

    let all = |status: CommandStatus| children.iter().all(|child| *child == status);

    if all(CommandStatus::Canceled) {
        CommandStatus::Canceled
    } else if all(CommandStatus::Done) {
        CommandStatus::Done
    } else if all(CommandStatus::Ready) {
        CommandStatus::Ready
    } else {
        CommandStatus::InProgress
    }
}
