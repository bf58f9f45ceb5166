//! # Rental Lifecycle
//!
//! ```text
//!              confirm               complete
//!   DRAFT ─────────────► CONFIRMED ─────────────► COMPLETED
//!     │                      │
//!     │ cancel               │ cancel
//!     └──────────┬───────────┘
//!                ▼
//!            CANCELED
//! ```
//!
//! CANCELED and COMPLETED are terminal. Items and dates may only be replaced
//! while the rental is DRAFT or CONFIRMED.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::types::RentalStatus;

/// A requested status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalTransition {
    Confirm,
    Cancel,
    Complete,
}

impl RentalTransition {
    /// Status reached when the transition succeeds.
    pub fn target(&self) -> RentalStatus {
        match self {
            RentalTransition::Confirm => RentalStatus::Confirmed,
            RentalTransition::Cancel => RentalStatus::Canceled,
            RentalTransition::Complete => RentalStatus::Completed,
        }
    }
}

impl fmt::Display for RentalTransition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RentalTransition::Confirm => write!(f, "confirm"),
            RentalTransition::Cancel => write!(f, "cancel"),
            RentalTransition::Complete => write!(f, "complete"),
        }
    }
}

impl RentalStatus {
    /// Whether this status reserves stock for the rental's date range.
    #[inline]
    pub fn is_blocking(&self) -> bool {
        matches!(self, RentalStatus::Confirmed | RentalStatus::Completed)
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, RentalStatus::Canceled | RentalStatus::Completed)
    }

    /// Whether items, dates and totals may still be replaced.
    #[inline]
    pub fn is_editable(&self) -> bool {
        matches!(self, RentalStatus::Draft | RentalStatus::Confirmed)
    }

    pub fn can_transition_to(&self, to: RentalStatus) -> bool {
        matches!(
            (self, to),
            (RentalStatus::Draft, RentalStatus::Confirmed)
                | (RentalStatus::Confirmed, RentalStatus::Completed)
                | (RentalStatus::Draft, RentalStatus::Canceled)
                | (RentalStatus::Confirmed, RentalStatus::Canceled)
        )
    }

    /// Applies `transition`, returning the new status.
    pub fn apply(&self, transition: RentalTransition) -> Result<RentalStatus, ValidationError> {
        let to = transition.target();
        if self.can_transition_to(to) {
            Ok(to)
        } else {
            Err(ValidationError::InvalidTransition { from: *self, to })
        }
    }

    pub fn ensure_editable(&self) -> Result<(), ValidationError> {
        if self.is_editable() {
            Ok(())
        } else {
            Err(ValidationError::NotEditable { status: *self })
        }
    }
}

/// Statuses whose items count against RENTAL availability.
pub const BLOCKING_STATUSES: [RentalStatus; 2] = [RentalStatus::Confirmed, RentalStatus::Completed];

/// Statuses whose SALE lines are allocated but not yet taken out of stock.
pub const SALE_HOLDING_STATUSES: [RentalStatus; 2] = [RentalStatus::Draft, RentalStatus::Confirmed];

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [RentalStatus; 4] = [
        RentalStatus::Draft,
        RentalStatus::Confirmed,
        RentalStatus::Canceled,
        RentalStatus::Completed,
    ];

    #[test]
    fn test_happy_path() {
        let status = RentalStatus::Draft;
        let status = status.apply(RentalTransition::Confirm).unwrap();
        assert_eq!(status, RentalStatus::Confirmed);
        let status = status.apply(RentalTransition::Complete).unwrap();
        assert_eq!(status, RentalStatus::Completed);
    }

    #[test]
    fn test_cancel_from_draft_and_confirmed_only() {
        assert!(RentalStatus::Draft.apply(RentalTransition::Cancel).is_ok());
        assert!(RentalStatus::Confirmed.apply(RentalTransition::Cancel).is_ok());
        assert_eq!(
            RentalStatus::Completed.apply(RentalTransition::Cancel),
            Err(ValidationError::InvalidTransition {
                from: RentalStatus::Completed,
                to: RentalStatus::Canceled
            })
        );
    }

    #[test]
    fn test_terminal_states_have_no_exit() {
        for from in [RentalStatus::Canceled, RentalStatus::Completed] {
            assert!(from.is_terminal());
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn test_draft_cannot_skip_to_completed() {
        assert!(RentalStatus::Draft.apply(RentalTransition::Complete).is_err());
        assert!(RentalStatus::Confirmed.apply(RentalTransition::Confirm).is_err());
    }

    #[test]
    fn test_blocking_and_editable() {
        let blocking: Vec<_> = ALL.into_iter().filter(RentalStatus::is_blocking).collect();
        assert_eq!(blocking, BLOCKING_STATUSES.to_vec());

        let editable: Vec<_> = ALL.into_iter().filter(RentalStatus::is_editable).collect();
        assert_eq!(editable, SALE_HOLDING_STATUSES.to_vec());

        assert_eq!(
            RentalStatus::Canceled.ensure_editable(),
            Err(ValidationError::NotEditable {
                status: RentalStatus::Canceled
            })
        );
    }
}
