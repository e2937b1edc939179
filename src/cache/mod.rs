//! Enhanced-background cache: identity, staleness, and atomic replacement.
//!
//! Only [`store::EnhancedCache`] writes into the cache directory.

pub(crate) mod key;
pub(crate) mod stale;
pub(crate) mod store;
