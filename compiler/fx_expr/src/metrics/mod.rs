//! Runtime statistics: counters and the registry that exposes them.
//!
//! A [`Counter`] is an atomic handle owned by an expression node. Nodes
//! register their counters with a [`MetricsRegistry`] during `init` and
//! unregister them during `deinit`. The registry only accepts counters whose
//! [`StatsLevel`] is enabled; registering a counter above the configured
//! level is a silent no-op.
//!
//! Several handles may be registered under one name (one per node); the
//! exported value is their sum. A node reachable from several places in a
//! tree registers its handle once per place; the registry keeps a use count
//! and drops the handle when the last use is released.

use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Verbosity of runtime statistics, ordered from least to most detailed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatsLevel {
    #[default]
    Level0,
    Level1,
    Level2,
    Level3,
}

/// Shared atomic counter.
///
/// Clones refer to the same underlying count. Equality is handle identity.
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicU64>);

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn same_handle(&self, other: &Counter) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for Counter {
    fn eq(&self, other: &Self) -> bool {
        self.same_handle(other)
    }
}

impl Eq for Counter {}

impl fmt::Debug for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Counter").field(&self.get()).finish()
    }
}

/// Registration refused by the registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("cannot register counter `{name}`: registry is full ({limit} counters)")]
    LimitReached { name: String, limit: usize },
}

/// A registered handle and how many nodes currently hold it.
#[derive(Debug)]
struct Registration {
    counter: Counter,
    uses: usize,
}

/// Named collection of counters, filtered by stats level.
pub struct MetricsRegistry {
    level: StatsLevel,
    /// Maximum number of distinct handles across all names.
    limit: Option<usize>,
    counters: Mutex<FxHashMap<String, Vec<Registration>>>,
}

impl MetricsRegistry {
    pub fn new(level: StatsLevel) -> Self {
        MetricsRegistry {
            level,
            limit: None,
            counters: Mutex::new(FxHashMap::default()),
        }
    }

    /// Registry that refuses new handles once `limit` distinct handles are
    /// registered. Further uses of an already registered handle always succeed.
    pub fn with_limit(level: StatsLevel, limit: usize) -> Self {
        MetricsRegistry {
            limit: Some(limit),
            ..Self::new(level)
        }
    }

    pub fn level(&self) -> StatsLevel {
        self.level
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Whether counters at `level` are collected.
    pub fn is_enabled(&self, level: StatsLevel) -> bool {
        level <= self.level
    }

    /// Register `counter` under `name`.
    ///
    /// Does nothing if `level` is above the registry level. Registering a
    /// handle that is already registered takes another use of it; each use
    /// is released by one `unregister_counter`.
    pub fn register_counter(
        &self,
        level: StatsLevel,
        name: &str,
        counter: &Counter,
    ) -> Result<(), MetricsError> {
        if !self.is_enabled(level) {
            return Ok(());
        }
        let mut counters = self.counters.lock();
        if let Some(existing) = counters
            .get_mut(name)
            .and_then(|handles| handles.iter_mut().find(|r| r.counter.same_handle(counter)))
        {
            existing.uses += 1;
            tracing::debug!(name, uses = existing.uses, "reused counter");
            return Ok(());
        }
        if let Some(limit) = self.limit {
            if counters.values().map(Vec::len).sum::<usize>() >= limit {
                tracing::warn!(name, limit, "counter registry is full");
                return Err(MetricsError::LimitReached {
                    name: name.to_string(),
                    limit,
                });
            }
        }
        let handles = counters.entry(name.to_string()).or_default();
        handles.push(Registration {
            counter: counter.clone(),
            uses: 1,
        });
        tracing::debug!(name, handles = handles.len(), "registered counter");
        Ok(())
    }

    /// Release one use of `counter` under `name`. Unknown handles are ignored.
    pub fn unregister_counter(&self, name: &str, counter: &Counter) {
        let mut counters = self.counters.lock();
        let Some(handles) = counters.get_mut(name) else {
            return;
        };
        let Some(pos) = handles.iter().position(|r| r.counter.same_handle(counter)) else {
            return;
        };
        handles[pos].uses -= 1;
        if handles[pos].uses == 0 {
            handles.swap_remove(pos);
        }
        if handles.is_empty() {
            counters.remove(name);
        }
    }

    /// Sum of the distinct handles registered under `name`, or `None` if
    /// there are none. A handle with several uses is counted once.
    pub fn counter_value(&self, name: &str) -> Option<u64> {
        self.counters
            .lock()
            .get(name)
            .map(|handles| handles.iter().map(|r| r.counter.get()).sum())
    }

    /// Number of distinct handles registered under `name`.
    pub fn registered_count(&self, name: &str) -> usize {
        self.counters.lock().get(name).map_or(0, Vec::len)
    }

    /// Outstanding uses of `counter` under `name`.
    pub fn uses(&self, name: &str, counter: &Counter) -> usize {
        self.counters.lock().get(name).map_or(0, |handles| {
            handles
                .iter()
                .find(|r| r.counter.same_handle(counter))
                .map_or(0, |r| r.uses)
        })
    }

    /// Whether no counter is registered at all.
    pub fn is_empty(&self) -> bool {
        self.counters.lock().is_empty()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new(StatsLevel::default())
    }
}

impl fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("level", &self.level)
            .field("limit", &self.limit)
            .field("names", &self.counters.lock().len())
            .finish()
    }
}

/// Thread-safe shared handle to a [`MetricsRegistry`].
#[derive(Clone, Debug, Default)]
pub struct SharedMetricsRegistry(Arc<MetricsRegistry>);

impl SharedMetricsRegistry {
    pub fn new(registry: MetricsRegistry) -> Self {
        SharedMetricsRegistry(Arc::new(registry))
    }

    pub fn with_level(level: StatsLevel) -> Self {
        Self::new(MetricsRegistry::new(level))
    }
}

impl Deref for SharedMetricsRegistry {
    type Target = MetricsRegistry;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
