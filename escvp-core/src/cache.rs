//! Known-address cache
//!
//! Remembers where each projector last answered discovery, keyed by its
//! model label, so a command can still reach it when a later broadcast goes
//! unanswered.
//!
//! # Lifecycle
//!
//! [`KnownAddressCache::shared`] is empty at process start and lives until
//! the process exits. Discovery is its only writer. Entries are never
//! expired automatically; call [`forget`](KnownAddressCache::forget) or
//! [`clear`](KnownAddressCache::clear) to drop them. Isolated instances
//! from [`KnownAddressCache::new`] can be injected instead.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;

use escvp_types::KnownAddress;

/// Thread-safe and can be cloned cheaply (Arc internally).
#[derive(Debug, Clone, Default)]
pub struct KnownAddressCache {
    inner: Arc<RwLock<HashMap<String, KnownAddress>>>,
}

impl KnownAddressCache {
    /// Create an empty, isolated cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache
    pub fn shared() -> Self {
        static SHARED: OnceLock<KnownAddressCache> = OnceLock::new();
        SHARED.get_or_init(Self::new).clone()
    }

    pub fn lookup(&self, model: &str) -> Option<KnownAddress> {
        self.inner.read().get(model).copied()
    }

    /// Record a confirmed address for `model`
    ///
    /// Returns `true` if the address differs from the one cached before.
    pub fn remember(&self, model: &str, address: IpAddr) -> bool {
        let mut entries = self.inner.write();
        let previous = entries.insert(model.to_owned(), KnownAddress::confirmed(address));
        previous.is_none_or(|known| known.address != address)
    }

    pub fn forget(&self, model: &str) -> Option<KnownAddress> {
        self.inner.write().remove(model)
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}
