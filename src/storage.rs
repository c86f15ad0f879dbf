//! Entry storage for the container
//!
//! Uses DashMap for lock-free concurrent access. Declared entries and
//! compiled class plans live in separate maps; one identifier may have both.

use crate::{Factory, Injectable, Result, Value};
use ahash::RandomState;
use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::cmp::Ordering;
use std::iter::Peekable;
use std::str::Chars;
use std::sync::Arc;

/// 8 shards balances creation speed vs concurrency for typical containers
const SHARDS: usize = 8;

/// What can be stored under an identifier
#[derive(Debug, Clone)]
pub enum Entry {
    /// A ready value, returned as is
    Value(Value),
    /// A factory run on first `get`, and on every `create`
    Factory(Factory),
}

impl Entry {
    /// Wrap a plain value
    pub fn value<T: Injectable>(value: T) -> Self {
        Self::Value(Value::new(value))
    }

    /// The null entry
    pub fn null() -> Self {
        Self::Value(Value::null())
    }
}

impl From<Value> for Entry {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Factory> for Entry {
    fn from(factory: Factory) -> Self {
        Self::Factory(factory)
    }
}

/// One declared entry.
///
/// A value entry starts resolved. A factory entry starts pending and is
/// resolved at most once; a failed attempt leaves it pending.
pub(crate) struct EntrySlot {
    factory: Option<Factory>,
    value: OnceCell<Value>,
}

impl EntrySlot {
    fn resolved(value: Value) -> Self {
        Self {
            factory: None,
            value: OnceCell::with_value(value),
        }
    }

    fn pending(factory: Factory) -> Self {
        Self {
            factory: Some(factory),
            value: OnceCell::new(),
        }
    }

    /// Cached value, if resolved
    #[inline]
    pub(crate) fn value(&self) -> Option<Value> {
        self.value.get().cloned()
    }

    #[inline]
    pub(crate) fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    /// Return the cached value or run `init` to produce it.
    ///
    /// Concurrent callers for the same slot wait for the first one; only a
    /// successful result is stored.
    pub(crate) fn get_or_try_init<F>(&self, init: F) -> Result<Value>
    where
        F: FnOnce() -> Result<Value>,
    {
        self.value.get_or_try_init(init).cloned()
    }

    fn duplicate(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            value: self.value.clone(),
        }
    }
}

/// Thread-safe storage for declared entries and compiled plans
pub(crate) struct EntryStore {
    entries: DashMap<String, Arc<EntrySlot>, RandomState>,
    plans: DashMap<String, Factory, RandomState>,
}

impl EntryStore {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                SHARDS,
            ),
            plans: DashMap::with_capacity_and_hasher_and_shard_amount(
                0,
                RandomState::new(),
                SHARDS,
            ),
        }
    }

    /// Insert an entry, replacing any entry or plan under `id`
    pub(crate) fn set(&self, id: impl Into<String>, entry: Entry) {
        let id = id.into();
        self.plans.remove(&id);
        let slot = match entry {
            Entry::Value(value) => EntrySlot::resolved(value),
            Entry::Factory(factory) => EntrySlot::pending(factory),
        };
        self.entries.insert(id, Arc::new(slot));
    }

    /// Declared entry under `id`.
    ///
    /// The map guard is released before returning, so callers may run
    /// factories that touch the store again.
    #[inline]
    pub(crate) fn slot(&self, id: &str) -> Option<Arc<EntrySlot>> {
        self.entries.get(id).map(|slot| Arc::clone(slot.value()))
    }

    /// Cached value under `id`
    #[cfg(test)]
    pub(crate) fn value(&self, id: &str) -> Option<Value> {
        self.slot(id).and_then(|slot| slot.value())
    }

    /// Declared factory under `id`, else the compiled plan
    pub(crate) fn factory(&self, id: &str) -> Option<Factory> {
        self.slot(id)
            .and_then(|slot| slot.factory().cloned())
            .or_else(|| self.plan(id))
    }

    /// Compiled plan under `id`
    #[inline]
    pub(crate) fn plan(&self, id: &str) -> Option<Factory> {
        self.plans.get(id).map(|plan| plan.value().clone())
    }

    /// Store a compiled plan; the first plan stored under `id` wins
    pub(crate) fn insert_plan(&self, id: &str, plan: Factory) -> Factory {
        self.plans
            .entry(id.to_owned())
            .or_insert(plan)
            .value()
            .clone()
    }

    /// Pending slot backed by a plan, created unless an entry already exists
    pub(crate) fn slot_for_plan(&self, id: &str, plan: Factory) -> Arc<EntrySlot> {
        let slot = self
            .entries
            .entry(id.to_owned())
            .or_insert_with(|| Arc::new(EntrySlot::pending(plan)));
        Arc::clone(slot.value())
    }

    /// Check for a declared entry or a compiled plan
    #[inline]
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id) || self.plans.contains_key(id)
    }

    /// Every known identifier in natural, case-insensitive order
    pub(crate) fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .chain(self.plans.iter().map(|plan| plan.key().clone()))
            .collect();
        ids.sort_by(|a, b| natural_cmp(a, b).then_with(|| a.cmp(b)));
        ids.dedup();
        ids
    }

    /// Number of declared entries
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deep copy sharing no slots with `self`.
    ///
    /// Resolved values are shared instances; pending slots are resolved
    /// independently in each copy.
    pub(crate) fn duplicate(&self) -> Self {
        let copy = Self::new();
        for entry in self.entries.iter() {
            copy.entries
                .insert(entry.key().clone(), Arc::new(entry.value().duplicate()));
        }
        for plan in self.plans.iter() {
            copy.plans.insert(plan.key().clone(), plan.value().clone());
        }
        copy
    }
}

impl std::fmt::Debug for EntryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryStore")
            .field("entries", &self.entries.len())
            .field("plans", &self.plans.len())
            .finish()
    }
}

/// Case-insensitive natural ordering: digit runs compare by numeric value
pub(crate) fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a = a.chars().peekable();
    let mut b = b.chars().peekable();

    loop {
        let (x, y) = match (a.peek(), b.peek()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&x), Some(&y)) => (x, y),
        };

        let ordering = if x.is_ascii_digit() && y.is_ascii_digit() {
            let left = digit_run(&mut a);
            let right = digit_run(&mut b);
            let left = left.trim_start_matches('0');
            let right = right.trim_start_matches('0');
            left.len().cmp(&right.len()).then_with(|| left.cmp(right))
        } else {
            a.next();
            b.next();
            x.to_lowercase().cmp(y.to_lowercase())
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn digit_run(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}
