use zonal_core::error::CoreError;

/// Error type for the persistence layer.
///
/// Lifecycle operations mix domain gate failures (quota, lease, geometry)
/// with database errors; this keeps both without flattening one into the
/// other, so the HTTP layer can map each to its own status.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}
