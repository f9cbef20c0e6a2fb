//! Audit ledger action constants and helpers.
//!
//! The ledger is append-only: every committed mutation writes exactly one
//! entry, nothing is ever updated or deleted afterwards. Daily quota usage
//! and grace-delete eligibility are derived by replaying entries, so the
//! action set below is closed on purpose.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Action constants
// ---------------------------------------------------------------------------

/// Known actions for audit ledger entries.
pub mod actions {
    /// A new zone was created.
    pub const CREATE: &str = "CREATE";
    /// An existing zone's geometry or fields changed.
    pub const UPDATE: &str = "UPDATE";
    /// A zone was soft-deleted outside the grace window.
    pub const DELETE: &str = "DELETE";
    /// A zone was soft-deleted by its creator inside the grace window.
    pub const GRACE_DELETE: &str = "GRACE_DELETE";
}

/// All valid ledger actions.
pub const VALID_ACTIONS: &[&str] = &[
    actions::CREATE,
    actions::UPDATE,
    actions::DELETE,
    actions::GRACE_DELETE,
];

// ---------------------------------------------------------------------------
// Action enum
// ---------------------------------------------------------------------------

/// Ledger action enum with string conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    GraceDelete,
}

impl AuditAction {
    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => actions::CREATE,
            Self::Update => actions::UPDATE,
            Self::Delete => actions::DELETE,
            Self::GraceDelete => actions::GRACE_DELETE,
        }
    }

    /// Parse from a string, returning an error for unknown actions.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            actions::CREATE => Ok(Self::Create),
            actions::UPDATE => Ok(Self::Update),
            actions::DELETE => Ok(Self::Delete),
            actions::GRACE_DELETE => Ok(Self::GraceDelete),
            other => Err(CoreError::Validation(format!(
                "Unknown audit action: '{other}'. Valid actions: {}",
                VALID_ACTIONS.join(", ")
            ))),
        }
    }
}
