//! Request handlers, grouped by resource.

pub mod categories;
pub mod quota;
pub mod zones;
