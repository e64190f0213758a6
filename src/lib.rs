pub mod config;
pub mod protocol;
pub mod router;
pub mod transport;

/// Opaque router label drawn from the configured universe (e.g. "A".."F").
pub type RouterId = String;
