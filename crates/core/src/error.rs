use crate::quota::{QuotaAction, QuotaUsage};
use crate::types::{DbId, Timestamp};

/// Domain error taxonomy shared by every layer.
///
/// The HTTP layer maps each variant to a stable error code and status; the
/// variants carry enough structure for the response to explain itself (who
/// holds a lease, how much quota remains, which zone conflicts).
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Zone {zone_id} is locked by {holder} until {expires_at}")]
    AlreadyLocked {
        zone_id: DbId,
        holder: String,
        expires_at: Timestamp,
    },

    #[error("Zone {zone_id} is locked by {holder}")]
    LockMismatch { zone_id: DbId, holder: String },

    #[error("Edit lease on zone {zone_id} has expired or was never acquired")]
    LockExpired { zone_id: DbId },

    #[error("Daily {action} quota reached ({used}/{limit})")]
    QuotaExceeded {
        action: QuotaAction,
        used: i64,
        limit: i64,
        usage: QuotaUsage,
    },

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Geometry overlaps existing zone {conflicting_zone_id}")]
    GeometryConflict { conflicting_zone_id: DbId },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
