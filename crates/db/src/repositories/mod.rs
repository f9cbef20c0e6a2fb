//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods over the
//! tables it owns. Reads accept any `PgExecutor`; writes that must commit
//! atomically with other writes take `&mut PgConnection` so the lifecycle
//! layer can run them inside one transaction.

pub mod audit_repo;
pub mod category_repo;
pub mod lock_repo;
pub mod zone_repo;

pub use audit_repo::AuditRepo;
pub use category_repo::CategoryRepo;
pub use lock_repo::LockRepo;
pub use zone_repo::ZoneRepo;
