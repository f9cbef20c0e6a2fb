//! Audit ledger entity model and append DTO.
//!
//! Ledger rows are immutable once inserted: no update DTO exists on
//! purpose, and nothing in this crate issues UPDATE or DELETE against
//! `audit_log`.

use serde::Serialize;
use sqlx::FromRow;
use zonal_core::audit::AuditAction;
use zonal_core::types::{DbId, Timestamp};

/// A single audit ledger entry.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditEntry {
    pub id: DbId,
    pub zone_id: DbId,
    /// One of the closed action set, see `zonal_core::audit::actions`.
    pub action: String,
    pub actor_id: String,
    pub recorded_at: Timestamp,
    /// Snapshot of `{geometry, category_id, description}` before the
    /// mutation. `None` for CREATE.
    pub before_data: Option<serde_json::Value>,
    /// Snapshot after the mutation. `None` for DELETE and GRACE_DELETE.
    pub after_data: Option<serde_json::Value>,
}

/// DTO for appending a ledger entry inside a mutation transaction.
#[derive(Debug, Clone)]
pub struct AppendAuditEntry {
    pub zone_id: DbId,
    pub action: AuditAction,
    pub actor_id: String,
    pub recorded_at: Timestamp,
    pub before_data: Option<serde_json::Value>,
    pub after_data: Option<serde_json::Value>,
}
