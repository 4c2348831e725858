// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::rc::Rc;

use crate::errors::StateError;
use crate::observability::messages::state::{FlushLimitReached, NamespaceDisposed, NamespaceOpened};
use crate::observability::messages::StructuredLog;
use crate::state::subscription::{Listener, Subscription};
use crate::state::{Action, AnnotationId, MappedPolicy, Notification, NotificationKind, UnitId, UnitKind};

/// Maximum number of delivery rounds in one flush. Listeners that keep
/// writing in response to their own notifications stop here.
pub const FLUSH_ROUND_LIMIT: usize = 64;

type Compute = Rc<dyn Fn(&[Value]) -> Value>;

struct DerivedCache {
    dep_versions: Vec<u64>,
    value: Value,
}

enum Cell {
    Value(Value),
    Mapped {
        entries: BTreeMap<String, Value>,
        policy: MappedPolicy,
    },
    Split {
        items: Vec<(String, UnitId)>,
    },
    Derived {
        deps: Vec<UnitId>,
        compute: Compute,
        cache: Option<DerivedCache>,
        recomputations: u64,
    },
}

impl Cell {
    fn kind(&self) -> UnitKind {
        match self {
            Cell::Value(_) => UnitKind::Value,
            Cell::Mapped { .. } => UnitKind::Mapped,
            Cell::Split { .. } => UnitKind::Split,
            Cell::Derived { .. } => UnitKind::Derived,
        }
    }
}

struct Unit {
    namespace: AnnotationId,
    key: String,
    /// Split unit owning this item unit
    parent: Option<UnitId>,
    cell: Cell,
    version: u64,
    listeners: BTreeMap<u64, Listener>,
}

#[derive(Default)]
struct Namespace {
    keys: HashMap<String, UnitId>,
}

#[derive(Default)]
pub(crate) struct StoreInner {
    next_unit: u64,
    next_listener: u64,
    units: HashMap<UnitId, Unit>,
    disposed: HashSet<UnitId>,
    namespaces: HashMap<AnnotationId, Namespace>,
    dependents: HashMap<UnitId, Vec<UnitId>>,
    pending: VecDeque<Notification>,
}

impl StoreInner {
    fn live(&self, id: UnitId) -> Result<&Unit, StateError> {
        match self.units.get(&id) {
            Some(unit) => Ok(unit),
            None if self.disposed.contains(&id) => Err(StateError::UnitDisposed(id)),
            None => Err(StateError::UnknownUnit(id)),
        }
    }

    fn live_mut(&mut self, id: UnitId) -> Result<&mut Unit, StateError> {
        if self.disposed.contains(&id) {
            return Err(StateError::UnitDisposed(id));
        }
        self.units.get_mut(&id).ok_or(StateError::UnknownUnit(id))
    }

    fn insert_unit(
        &mut self,
        namespace: AnnotationId,
        key: String,
        parent: Option<UnitId>,
        cell: Cell,
    ) -> Result<UnitId, StateError> {
        let ns = self
            .namespaces
            .get_mut(&namespace)
            .ok_or(StateError::UnknownNamespace(namespace.0))?;
        if ns.keys.contains_key(&key) {
            return Err(StateError::DuplicateKey(key));
        }

        self.next_unit += 1;
        let id = UnitId(self.next_unit);
        ns.keys.insert(key.clone(), id);
        self.units.insert(
            id,
            Unit {
                namespace,
                key,
                parent,
                cell,
                version: 0,
                listeners: BTreeMap::new(),
            },
        );
        Ok(id)
    }

    pub(crate) fn remove_listener(&mut self, unit: UnitId, id: u64) -> bool {
        self.units
            .get_mut(&unit)
            .map(|u| u.listeners.remove(&id).is_some())
            .unwrap_or(false)
    }

    pub(crate) fn has_listener(&self, unit: UnitId, id: u64) -> bool {
        self.units
            .get(&unit)
            .map(|u| u.listeners.contains_key(&id))
            .unwrap_or(false)
    }

    /// Bump the version of `id` and its owning split units, queueing one
    /// notification per unit plus invalidations for derived dependents.
    fn notify_changed(&mut self, id: UnitId) {
        let mut current = Some(id);
        while let Some(uid) = current {
            let Some(unit) = self.units.get_mut(&uid) else {
                break;
            };
            unit.version += 1;
            let notification = Notification {
                unit: uid,
                namespace: unit.namespace,
                version: unit.version,
                kind: NotificationKind::Changed,
            };
            current = unit.parent;
            self.pending.push_back(notification);
            self.invalidate_dependents(uid);
        }
    }

    fn invalidate_dependents(&mut self, id: UnitId) {
        let mut stack = self.dependents.get(&id).cloned().unwrap_or_default();
        let mut seen = HashSet::new();
        while let Some(dependent) = stack.pop() {
            if !seen.insert(dependent) {
                continue;
            }
            if let Some(unit) = self.units.get(&dependent) {
                self.pending.push_back(Notification {
                    unit: dependent,
                    namespace: unit.namespace,
                    version: unit.version,
                    kind: NotificationKind::Invalidated,
                });
                if let Some(next) = self.dependents.get(&dependent) {
                    stack.extend(next.iter().copied());
                }
            }
        }
    }

    /// Remove a unit (and its items, if it is a split unit) without touching
    /// other units. Returns the disposed ids.
    fn detach(&mut self, id: UnitId) -> Vec<UnitId> {
        let mut removed = Vec::new();
        let mut stack = vec![id];
        while let Some(uid) = stack.pop() {
            let Some(unit) = self.units.remove(&uid) else {
                continue;
            };
            match &unit.cell {
                Cell::Split { items } => stack.extend(items.iter().map(|(_, item)| *item)),
                Cell::Derived { deps, .. } => {
                    for dep in deps {
                        if let Some(dependents) = self.dependents.get_mut(dep) {
                            dependents.retain(|d| *d != uid);
                        }
                    }
                }
                _ => {}
            }
            if let Some(ns) = self.namespaces.get_mut(&unit.namespace) {
                ns.keys.remove(&unit.key);
            }
            self.disposed.insert(uid);
            self.dependents.remove(&uid);
            removed.push(uid);
        }
        let removed_set: HashSet<UnitId> = removed.iter().copied().collect();
        self.pending.retain(|n| !removed_set.contains(&n.unit));
        removed
    }

    /// Dispose one unit inside a live namespace, dropping entries that
    /// non-retaining mapped units held for it.
    fn dispose_unit(&mut self, id: UnitId) -> Result<(), StateError> {
        let namespace = self.live(id)?.namespace;
        self.detach(id);
        self.purge_weak_entries(namespace);
        Ok(())
    }

    /// Drop entries of non-retaining mapped units whose key no longer names a live unit.
    fn purge_weak_entries(&mut self, namespace: AnnotationId) {
        let Some(ns) = self.namespaces.get(&namespace) else {
            return;
        };
        let live_keys: HashSet<String> = ns.keys.keys().cloned().collect();
        let mapped: Vec<UnitId> = ns.keys.values().copied().collect();

        let mut changed = Vec::new();
        for uid in mapped {
            if let Some(unit) = self.units.get_mut(&uid) {
                if let Cell::Mapped { entries, policy } = &mut unit.cell {
                    if policy.retains_entries {
                        continue;
                    }
                    let before = entries.len();
                    entries.retain(|key, _| live_keys.contains(key));
                    if entries.len() != before {
                        changed.push(uid);
                    }
                }
            }
        }
        changed.sort();
        for uid in changed {
            self.notify_changed(uid);
        }
    }

    fn read_unit(&mut self, id: UnitId) -> Result<(Value, u64), StateError> {
        if matches!(self.live(id)?.cell, Cell::Derived { .. }) {
            return self.read_derived(id);
        }
        let unit = self.live(id)?;
        let version = unit.version;
        match &unit.cell {
            Cell::Value(value) => Ok((value.clone(), version)),
            Cell::Mapped { entries, .. } => {
                let map: Map<String, Value> = entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                Ok((Value::Object(map), version))
            }
            Cell::Split { items } => {
                let mut values = Vec::with_capacity(items.len());
                for (_, item) in items {
                    match self.live(*item)?.cell {
                        Cell::Value(ref value) => values.push(value.clone()),
                        _ => values.push(Value::Null),
                    }
                }
                Ok((Value::Array(values), version))
            }
            Cell::Derived { .. } => Err(StateError::KindMismatch {
                unit: id,
                kind: UnitKind::Derived.as_str(),
                action: "read",
            }),
        }
    }

    fn read_derived(&mut self, id: UnitId) -> Result<(Value, u64), StateError> {
        let (deps, compute) = match &self.live(id)?.cell {
            Cell::Derived { deps, compute, .. } => (deps.clone(), Rc::clone(compute)),
            other => {
                return Err(StateError::KindMismatch {
                    unit: id,
                    kind: other.kind().as_str(),
                    action: "read_derived",
                })
            }
        };

        let mut inputs = Vec::with_capacity(deps.len());
        let mut versions = Vec::with_capacity(deps.len());
        for dep in &deps {
            let (value, version) = self.read_unit(*dep)?;
            inputs.push(value);
            versions.push(version);
        }

        let unit = self.live_mut(id)?;
        let Cell::Derived {
            cache,
            recomputations,
            ..
        } = &mut unit.cell
        else {
            return Err(StateError::UnknownUnit(id));
        };

        if let Some(cached) = cache.as_ref() {
            if cached.dep_versions == versions {
                return Ok((cached.value.clone(), unit.version));
            }
        }

        let value = compute(&inputs);
        *recomputations += 1;
        let changed = cache.as_ref().map_or(true, |cached| cached.value != value);
        *cache = Some(DerivedCache {
            dep_versions: versions,
            value: value.clone(),
        });
        if changed {
            unit.version += 1;
        }
        Ok((value, unit.version))
    }

    fn apply(&mut self, id: UnitId, action: Action) -> Result<bool, StateError> {
        let (kind, namespace, key) = {
            let unit = self.live(id)?;
            (unit.cell.kind(), unit.namespace, unit.key.clone())
        };
        let mismatch = StateError::KindMismatch {
            unit: id,
            kind: kind.as_str(),
            action: action.name(),
        };

        match action {
            Action::Set(value) => {
                let Cell::Value(current) = &mut self.live_mut(id)?.cell else {
                    return Err(mismatch);
                };
                if *current == value {
                    return Ok(false);
                }
                *current = value;
            }
            Action::SetEntry { key: entry, value } => {
                let retains = match &self.live(id)?.cell {
                    Cell::Mapped { policy, .. } => policy.retains_entries,
                    _ => return Err(mismatch),
                };
                if !retains && !self.has_key(namespace, &entry) {
                    return Err(StateError::DanglingEntry { unit: id, key: entry });
                }
                let Cell::Mapped { entries, .. } = &mut self.live_mut(id)?.cell else {
                    return Err(mismatch);
                };
                if entries.get(&entry) == Some(&value) {
                    return Ok(false);
                }
                entries.insert(entry, value);
            }
            Action::DeleteEntry { key: entry } => {
                let Cell::Mapped { entries, .. } = &mut self.live_mut(id)?.cell else {
                    return Err(mismatch);
                };
                if entries.remove(&entry).is_none() {
                    return Ok(false);
                }
            }
            Action::Clear => match &mut self.live_mut(id)?.cell {
                Cell::Mapped { entries, .. } => {
                    if entries.is_empty() {
                        return Ok(false);
                    }
                    entries.clear();
                }
                Cell::Split { items } => {
                    if items.is_empty() {
                        return Ok(false);
                    }
                    let drained: Vec<UnitId> = items.drain(..).map(|(_, item)| item).collect();
                    for item in drained {
                        self.detach(item);
                    }
                    self.purge_weak_entries(namespace);
                }
                _ => return Err(mismatch),
            },
            Action::Remove { item } => {
                let Cell::Split { items } = &mut self.live_mut(id)?.cell else {
                    return Err(mismatch);
                };
                let position = items
                    .iter()
                    .position(|(k, _)| *k == item)
                    .ok_or_else(|| StateError::UnknownItem {
                        unit: id,
                        item: item.clone(),
                    })?;
                let (_, item_unit) = items.remove(position);
                self.dispose_unit(item_unit)?;
            }
            Action::InsertBefore {
                item,
                value,
                before,
            } => {
                let Cell::Split { items } = &self.live(id)?.cell else {
                    return Err(mismatch);
                };
                if items.iter().any(|(k, _)| *k == item) {
                    return Err(StateError::DuplicateKey(item_key(&key, &item)));
                }
                let position = match &before {
                    Some(b) => items.iter().position(|(k, _)| k == b).ok_or_else(|| {
                        StateError::UnknownItem {
                            unit: id,
                            item: b.clone(),
                        }
                    })?,
                    None => items.len(),
                };
                let item_unit =
                    self.insert_unit(namespace, item_key(&key, &item), Some(id), Cell::Value(value))?;
                let Cell::Split { items } = &mut self.live_mut(id)?.cell else {
                    return Err(mismatch);
                };
                items.insert(position, (item, item_unit));
            }
            Action::MoveBefore { item, before } => {
                let Cell::Split { items } = &mut self.live_mut(id)?.cell else {
                    return Err(mismatch);
                };
                let from = items
                    .iter()
                    .position(|(k, _)| *k == item)
                    .ok_or_else(|| StateError::UnknownItem {
                        unit: id,
                        item: item.clone(),
                    })?;
                if before.as_deref() == Some(item.as_str()) {
                    return Ok(false);
                }
                let original: Vec<String> = items.iter().map(|(k, _)| k.clone()).collect();
                let moving = items.remove(from);
                let to = match &before {
                    Some(b) => match items.iter().position(|(k, _)| k == b) {
                        Some(to) => to,
                        None => {
                            items.insert(from, moving);
                            return Err(StateError::UnknownItem {
                                unit: id,
                                item: b.clone(),
                            });
                        }
                    },
                    None => items.len(),
                };
                items.insert(to, moving);
                if items.iter().map(|(k, _)| k).eq(original.iter()) {
                    return Ok(false);
                }
            }
        }

        self.notify_changed(id);
        Ok(true)
    }

    fn has_key(&self, namespace: AnnotationId, key: &str) -> bool {
        self.namespaces
            .get(&namespace)
            .map(|ns| ns.keys.contains_key(key))
            .unwrap_or(false)
    }
}

fn item_key(split_key: &str, item: &str) -> String {
    format!("{}/{}", split_key, item)
}

/// Handle to the reactive state of every open annotation.
///
/// Cloning the handle shares the store. All access happens on one thread;
/// reads and writes are synchronous, while subscriber notifications are
/// queued and delivered by [`StateStore::flush`].
#[derive(Clone, Default)]
pub struct StateStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open_namespace(&self, namespace: AnnotationId) -> Result<(), StateError> {
        let mut inner = self.inner.borrow_mut();
        if inner.namespaces.contains_key(&namespace) {
            return Err(StateError::NamespaceExists(namespace.0));
        }
        inner.namespaces.insert(namespace, Namespace::default());
        NamespaceOpened {
            namespace: namespace.0,
        }
        .log();
        Ok(())
    }

    pub fn has_namespace(&self, namespace: AnnotationId) -> bool {
        self.inner.borrow().namespaces.contains_key(&namespace)
    }

    /// Dispose every unit of a namespace. Listeners are dropped and pending
    /// notifications discarded before this returns; later operations on
    /// those units fail with `UnitDisposed`.
    pub fn dispose_namespace(&self, namespace: AnnotationId) -> Result<usize, StateError> {
        let mut inner = self.inner.borrow_mut();
        let ns = inner
            .namespaces
            .get(&namespace)
            .ok_or(StateError::UnknownNamespace(namespace.0))?;
        let ids: Vec<UnitId> = ns.keys.values().copied().collect();

        let mut disposed = 0;
        for id in ids {
            disposed += inner.detach(id).len();
        }
        inner.namespaces.remove(&namespace);
        inner.pending.retain(|n| n.namespace != namespace);

        NamespaceDisposed {
            namespace: namespace.0,
            unit_count: disposed,
        }
        .log();
        Ok(disposed)
    }

    pub fn create_value(
        &self,
        namespace: AnnotationId,
        key: &str,
        initial: Value,
    ) -> Result<UnitId, StateError> {
        self.inner
            .borrow_mut()
            .insert_unit(namespace, key.to_string(), None, Cell::Value(initial))
    }

    pub fn create_mapped(
        &self,
        namespace: AnnotationId,
        key: &str,
        policy: MappedPolicy,
    ) -> Result<UnitId, StateError> {
        self.inner.borrow_mut().insert_unit(
            namespace,
            key.to_string(),
            None,
            Cell::Mapped {
                entries: BTreeMap::new(),
                policy,
            },
        )
    }

    pub fn create_split(&self, namespace: AnnotationId, key: &str) -> Result<UnitId, StateError> {
        self.inner.borrow_mut().insert_unit(
            namespace,
            key.to_string(),
            None,
            Cell::Split { items: Vec::new() },
        )
    }

    /// Create a derived unit. `compute` receives the current values of
    /// `deps` in order and runs lazily on the first read after any of them
    /// changed.
    pub fn create_derived<F>(
        &self,
        namespace: AnnotationId,
        key: &str,
        deps: &[UnitId],
        compute: F,
    ) -> Result<UnitId, StateError>
    where
        F: Fn(&[Value]) -> Value + 'static,
    {
        let mut inner = self.inner.borrow_mut();
        for dep in deps {
            if inner.live(*dep)?.namespace != namespace {
                return Err(StateError::CrossNamespace(*dep));
            }
        }
        let id = inner.insert_unit(
            namespace,
            key.to_string(),
            None,
            Cell::Derived {
                deps: deps.to_vec(),
                compute: Rc::new(compute),
                cache: None,
                recomputations: 0,
            },
        )?;
        for dep in deps {
            inner.dependents.entry(*dep).or_default().push(id);
        }
        Ok(id)
    }

    /// Dispose a single unit (a split unit takes its items with it).
    /// Derived units reading it fail with `UnitDisposed` afterwards.
    pub fn dispose(&self, unit: UnitId) -> Result<(), StateError> {
        self.inner.borrow_mut().dispose_unit(unit)
    }

    pub fn lookup(&self, namespace: AnnotationId, key: &str) -> Option<UnitId> {
        self.inner
            .borrow()
            .namespaces
            .get(&namespace)
            .and_then(|ns| ns.keys.get(key).copied())
    }

    /// Read the current value. Never changes observable content; derived
    /// units may refresh their cache.
    pub fn read(&self, unit: UnitId) -> Result<Value, StateError> {
        self.inner.borrow_mut().read_unit(unit).map(|(value, _)| value)
    }

    pub fn version(&self, unit: UnitId) -> Result<u64, StateError> {
        self.inner.borrow_mut().read_unit(unit).map(|(_, version)| version)
    }

    /// Apply one action. Returns whether observable content changed; only
    /// changing writes queue notifications.
    pub fn write(&self, unit: UnitId, action: Action) -> Result<bool, StateError> {
        self.inner.borrow_mut().apply(unit, action)
    }

    pub fn subscribe(&self, unit: UnitId, listener: Listener) -> Result<Subscription, StateError> {
        let mut inner = self.inner.borrow_mut();
        inner.next_listener += 1;
        let id = inner.next_listener;
        inner.live_mut(unit)?.listeners.insert(id, listener);
        Ok(Subscription {
            unit,
            id,
            store: Rc::downgrade(&self.inner),
        })
    }

    pub fn listener_count(&self, unit: UnitId) -> Result<usize, StateError> {
        Ok(self.inner.borrow().live(unit)?.listeners.len())
    }

    pub fn kind(&self, unit: UnitId) -> Result<UnitKind, StateError> {
        Ok(self.inner.borrow().live(unit)?.cell.kind())
    }

    pub fn key(&self, unit: UnitId) -> Result<String, StateError> {
        Ok(self.inner.borrow().live(unit)?.key.clone())
    }

    /// Ordered `(item, unit)` pairs of a split unit.
    pub fn items(&self, split: UnitId) -> Result<Vec<(String, UnitId)>, StateError> {
        let inner = self.inner.borrow();
        match &inner.live(split)?.cell {
            Cell::Split { items } => Ok(items.clone()),
            other => Err(StateError::KindMismatch {
                unit: split,
                kind: other.kind().as_str(),
                action: "items",
            }),
        }
    }

    pub fn item(&self, split: UnitId, item: &str) -> Result<UnitId, StateError> {
        self.items(split)?
            .into_iter()
            .find(|(k, _)| k == item)
            .map(|(_, unit)| unit)
            .ok_or_else(|| StateError::UnknownItem {
                unit: split,
                item: item.to_string(),
            })
    }

    /// Number of times a derived unit has run its compute function.
    pub fn recompute_count(&self, unit: UnitId) -> Result<u64, StateError> {
        let inner = self.inner.borrow();
        match &inner.live(unit)?.cell {
            Cell::Derived { recomputations, .. } => Ok(*recomputations),
            other => Err(StateError::KindMismatch {
                unit,
                kind: other.kind().as_str(),
                action: "recompute_count",
            }),
        }
    }

    pub fn unit_count(&self, namespace: AnnotationId) -> usize {
        self.inner
            .borrow()
            .namespaces
            .get(&namespace)
            .map(|ns| ns.keys.len())
            .unwrap_or(0)
    }

    pub fn pending_notifications(&self) -> usize {
        self.inner.borrow().pending.len()
    }

    /// Deliver queued notifications in write order. Listeners run without
    /// any store borrow held, so they may read and write; notifications
    /// produced by their writes are delivered in later rounds of the same
    /// flush. Returns the number of listener invocations.
    pub fn flush(&self) -> usize {
        let mut delivered = 0;
        for _ in 0..FLUSH_ROUND_LIMIT {
            let batch: Vec<(Notification, Vec<(u64, Listener)>)> = {
                let mut inner = self.inner.borrow_mut();
                if inner.pending.is_empty() {
                    return delivered;
                }
                let drained: Vec<Notification> = inner.pending.drain(..).collect();
                drained
                    .into_iter()
                    .filter_map(|n| {
                        let listeners = inner
                            .units
                            .get(&n.unit)?
                            .listeners
                            .iter()
                            .map(|(id, l)| (*id, Rc::clone(l)))
                            .collect();
                        Some((n, listeners))
                    })
                    .collect()
            };

            for (notification, listeners) in batch {
                for (id, listener) in listeners {
                    if self.inner.borrow().has_listener(notification.unit, id) {
                        listener(&notification);
                        delivered += 1;
                    }
                }
            }
        }

        let remaining = self.inner.borrow().pending.len();
        if remaining > 0 {
            FlushLimitReached {
                rounds: FLUSH_ROUND_LIMIT,
                remaining,
            }
            .log();
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::Cell as StdCell;

    const NS: AnnotationId = AnnotationId(1);

    fn store() -> StateStore {
        let store = StateStore::new();
        store.open_namespace(NS).unwrap();
        store
    }

    fn counter(store: &StateStore, unit: UnitId) -> (Rc<StdCell<usize>>, Subscription) {
        let count = Rc::new(StdCell::new(0));
        let seen = Rc::clone(&count);
        let sub = store
            .subscribe(unit, Rc::new(move |_| seen.set(seen.get() + 1)))
            .unwrap();
        (count, sub)
    }

    fn order(store: &StateStore, split: UnitId) -> Vec<String> {
        store.items(split).unwrap().into_iter().map(|(k, _)| k).collect()
    }

    fn split_abcd(store: &StateStore) -> UnitId {
        let split = store.create_split(NS, "results").unwrap();
        for item in ["a", "b", "c", "d"] {
            store
                .write(
                    split,
                    Action::InsertBefore {
                        item: item.to_string(),
                        value: json!({ "id": item }),
                        before: None,
                    },
                )
                .unwrap();
        }
        store.flush();
        split
    }

    #[test]
    fn test_write_then_read_is_immediate() {
        let store = store();
        let unit = store.create_value(NS, "title", json!("draft")).unwrap();

        assert!(store.write(unit, Action::Set(json!("final"))).unwrap());
        assert_eq!(store.read(unit).unwrap(), json!("final"));
    }

    #[test]
    fn test_noop_write_does_not_notify() {
        let store = store();
        let unit = store.create_value(NS, "title", json!("same")).unwrap();
        let (count, _sub) = counter(&store, unit);

        assert!(!store.write(unit, Action::Set(json!("same"))).unwrap());
        store.flush();
        assert_eq!(count.get(), 0);

        assert!(store.write(unit, Action::Set(json!("other"))).unwrap());
        assert_eq!(count.get(), 0, "delivery waits for flush");
        store.flush();
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_every_write_is_delivered() {
        let store = store();
        let unit = store.create_value(NS, "n", json!(0)).unwrap();
        let versions = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&versions);
        let _sub = store
            .subscribe(unit, Rc::new(move |n| seen.borrow_mut().push(n.version)))
            .unwrap();

        for i in 1..=3 {
            store.write(unit, Action::Set(json!(i))).unwrap();
        }
        assert_eq!(store.pending_notifications(), 3);
        assert!(versions.borrow().is_empty());
        store.flush();

        assert_eq!(*versions.borrow(), vec![1, 2, 3]);
        assert_eq!(store.pending_notifications(), 0);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = store();
        let unit = store.create_value(NS, "n", json!(0)).unwrap();
        let (count, sub) = counter(&store, unit);

        assert!(sub.unsubscribe());
        store.write(unit, Action::Set(json!(1))).unwrap();
        store.flush();

        assert_eq!(count.get(), 0);
        assert_eq!(store.listener_count(unit).unwrap(), 0);
    }

    #[test]
    fn test_listener_writes_are_delivered_in_same_flush() {
        let store = store();
        let source = store.create_value(NS, "source", json!(0)).unwrap();
        let mirror = store.create_value(NS, "mirror", json!(0)).unwrap();
        let (count, _mirror_sub) = counter(&store, mirror);

        let writer = store.clone();
        let _sub = store
            .subscribe(
                source,
                Rc::new(move |_| {
                    let value = writer.read(source).unwrap();
                    writer.write(mirror, Action::Set(value)).unwrap();
                }),
            )
            .unwrap();

        store.write(source, Action::Set(json!(7))).unwrap();
        store.flush();

        assert_eq!(store.read(mirror).unwrap(), json!(7));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn test_mapped_unit_operations() {
        let store = store();
        let map = store.create_mapped(NS, "flags", MappedPolicy::RETAINING).unwrap();

        assert!(store
            .write(map, Action::SetEntry { key: "a".into(), value: json!(1) })
            .unwrap());
        assert!(!store
            .write(map, Action::SetEntry { key: "a".into(), value: json!(1) })
            .unwrap());
        assert!(!store.write(map, Action::DeleteEntry { key: "zz".into() }).unwrap());
        assert_eq!(store.read(map).unwrap(), json!({ "a": 1 }));

        assert!(store.write(map, Action::Clear).unwrap());
        assert!(!store.write(map, Action::Clear).unwrap());
        assert_eq!(store.read(map).unwrap(), json!({}));
    }

    #[test]
    fn test_weak_mapped_unit_drops_entries_of_removed_items() {
        let store = store();
        let split = split_abcd(&store);
        let selection = store.create_mapped(NS, "selection", MappedPolicy::WEAK).unwrap();
        let retained = store.create_mapped(NS, "notes", MappedPolicy::RETAINING).unwrap();

        for map in [selection, retained] {
            store
                .write(map, Action::SetEntry { key: "results/b".into(), value: json!(true) })
                .unwrap();
        }
        store.write(split, Action::Remove { item: "b".into() }).unwrap();

        assert_eq!(store.read(selection).unwrap(), json!({}));
        assert_eq!(store.read(retained).unwrap(), json!({ "results/b": true }));
    }

    #[test]
    fn test_weak_mapped_unit_rejects_dangling_entry() {
        let store = store();
        let selection = store.create_mapped(NS, "selection", MappedPolicy::WEAK).unwrap();

        let result = store.write(
            selection,
            Action::SetEntry { key: "results/nope".into(), value: json!(true) },
        );
        assert!(matches!(result, Err(StateError::DanglingEntry { .. })));
    }

    #[test]
    fn test_split_insert_before_and_remove() {
        let store = store();
        let split = split_abcd(&store);

        store
            .write(
                split,
                Action::InsertBefore { item: "x".into(), value: json!({ "id": "x" }), before: Some("c".into()) },
            )
            .unwrap();
        assert_eq!(order(&store, split), vec!["a", "b", "x", "c", "d"]);

        let removed = store.item(split, "b").unwrap();
        store.write(split, Action::Remove { item: "b".into() }).unwrap();
        assert_eq!(order(&store, split), vec!["a", "x", "c", "d"]);
        assert_eq!(store.read(removed), Err(StateError::UnitDisposed(removed)));
    }

    #[test]
    fn test_split_move_before_preserves_relative_order() {
        struct TestCase {
            name: &'static str,
            item: &'static str,
            before: Option<&'static str>,
            expected: Vec<&'static str>,
            changed: bool,
        }

        let test_cases = vec![
            TestCase { name: "move last to front", item: "d", before: Some("a"), expected: vec!["d", "a", "b", "c"], changed: true },
            TestCase { name: "move first to end", item: "a", before: None, expected: vec!["b", "c", "d", "a"], changed: true },
            TestCase { name: "move forward", item: "a", before: Some("d"), expected: vec!["b", "c", "a", "d"], changed: true },
            TestCase { name: "before own successor", item: "b", before: Some("c"), expected: vec!["a", "b", "c", "d"], changed: false },
            TestCase { name: "before itself", item: "b", before: Some("b"), expected: vec!["a", "b", "c", "d"], changed: false },
            TestCase { name: "last to end", item: "d", before: None, expected: vec!["a", "b", "c", "d"], changed: false },
        ];

        for test_case in test_cases {
            let store = store();
            let split = split_abcd(&store);
            let (count, _sub) = counter(&store, split);

            let changed = store
                .write(
                    split,
                    Action::MoveBefore {
                        item: test_case.item.to_string(),
                        before: test_case.before.map(str::to_string),
                    },
                )
                .unwrap();
            store.flush();

            assert_eq!(changed, test_case.changed, "Test case '{}' failed", test_case.name);
            assert_eq!(order(&store, split), test_case.expected, "Test case '{}' failed", test_case.name);
            assert_eq!(count.get(), usize::from(test_case.changed), "Test case '{}' failed", test_case.name);
        }
    }

    #[test]
    fn test_split_move_before_unknown_target_keeps_order() {
        let store = store();
        let split = split_abcd(&store);

        let result = store.write(split, Action::MoveBefore { item: "a".into(), before: Some("q".into()) });
        assert!(matches!(result, Err(StateError::UnknownItem { .. })));
        assert_eq!(order(&store, split), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_item_write_notifies_item_and_split() {
        let store = store();
        let split = split_abcd(&store);
        let item = store.item(split, "c").unwrap();
        let (split_count, _s1) = counter(&store, split);
        let (item_count, _s2) = counter(&store, item);

        store.write(item, Action::Set(json!({ "id": "c", "edited": true }))).unwrap();
        store.flush();

        assert_eq!(split_count.get(), 1);
        assert_eq!(item_count.get(), 1);
        assert_eq!(store.read(split).unwrap()[2], json!({ "id": "c", "edited": true }));
    }

    #[test]
    fn test_derived_unit_is_lazy_and_cached() {
        let store = store();
        let a = store.create_value(NS, "a", json!(2)).unwrap();
        let b = store.create_value(NS, "b", json!(3)).unwrap();
        let sum = store
            .create_derived(NS, "sum", &[a, b], |v| {
                json!(v[0].as_i64().unwrap_or(0) + v[1].as_i64().unwrap_or(0))
            })
            .unwrap();

        assert_eq!(store.recompute_count(sum).unwrap(), 0);
        assert_eq!(store.read(sum).unwrap(), json!(5));
        assert_eq!(store.read(sum).unwrap(), json!(5));
        assert_eq!(store.recompute_count(sum).unwrap(), 1);

        store.write(a, Action::Set(json!(10))).unwrap();
        assert_eq!(store.recompute_count(sum).unwrap(), 1, "no eager recompute");
        assert_eq!(store.read(sum).unwrap(), json!(13));
        assert_eq!(store.recompute_count(sum).unwrap(), 2);
    }

    #[test]
    fn test_derived_chain_short_circuits_on_equal_value() {
        let store = store();
        let n = store.create_value(NS, "n", json!(4)).unwrap();
        let parity = store
            .create_derived(NS, "parity", &[n], |v| json!(v[0].as_i64().unwrap_or(0) % 2))
            .unwrap();
        let label = store
            .create_derived(NS, "label", &[parity], |v| {
                json!(if v[0] == json!(0) { "even" } else { "odd" })
            })
            .unwrap();

        assert_eq!(store.read(label).unwrap(), json!("even"));
        store.write(n, Action::Set(json!(6))).unwrap();
        assert_eq!(store.read(label).unwrap(), json!("even"));

        assert_eq!(store.recompute_count(parity).unwrap(), 2);
        assert_eq!(store.recompute_count(label).unwrap(), 1);
    }

    #[test]
    fn test_derived_subscribers_are_invalidated() {
        let store = store();
        let n = store.create_value(NS, "n", json!(1)).unwrap();
        let double = store
            .create_derived(NS, "double", &[n], |v| json!(v[0].as_i64().unwrap_or(0) * 2))
            .unwrap();
        let kinds = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&kinds);
        let _sub = store
            .subscribe(double, Rc::new(move |note| seen.borrow_mut().push(note.kind)))
            .unwrap();

        store.write(n, Action::Set(json!(5))).unwrap();
        store.flush();

        assert_eq!(*kinds.borrow(), vec![NotificationKind::Invalidated]);
        assert_eq!(store.recompute_count(double).unwrap(), 0);
    }

    #[test]
    fn test_disposed_namespace_rejects_operations() {
        let store = store();
        let unit = store.create_value(NS, "n", json!(1)).unwrap();
        let derived = store.create_derived(NS, "d", &[unit], |v| v[0].clone()).unwrap();
        let (count, sub) = counter(&store, unit);
        store.write(unit, Action::Set(json!(2))).unwrap();

        assert_eq!(store.dispose_namespace(NS).unwrap(), 2);
        store.flush();

        assert_eq!(count.get(), 0, "pending notifications are discarded");
        assert!(!sub.is_active());
        assert_eq!(store.read(unit), Err(StateError::UnitDisposed(unit)));
        assert_eq!(store.read(derived), Err(StateError::UnitDisposed(derived)));
        assert_eq!(
            store.write(unit, Action::Set(json!(3))),
            Err(StateError::UnitDisposed(unit))
        );
        assert!(store.subscribe(unit, Rc::new(|_| {})).is_err());
    }

    #[test]
    fn test_derived_over_disposed_item_fails_fast() {
        let store = store();
        let split = split_abcd(&store);
        let item = store.item(split, "a").unwrap();
        let view = store.create_derived(NS, "first", &[item], |v| v[0].clone()).unwrap();

        store.write(split, Action::Remove { item: "a".into() }).unwrap();
        assert_eq!(store.read(view), Err(StateError::UnitDisposed(item)));
    }

    #[test]
    fn test_namespaces_are_independent() {
        let store = store();
        let other = AnnotationId(2);
        store.open_namespace(other).unwrap();
        let mine = store.create_value(NS, "title", json!("mine")).unwrap();
        let theirs = store.create_value(other, "title", json!("theirs")).unwrap();

        store.dispose_namespace(other).unwrap();

        assert_eq!(store.read(mine).unwrap(), json!("mine"));
        assert!(store.read(theirs).is_err());
        assert_eq!(store.lookup(NS, "title"), Some(mine));
        assert!(store.create_derived(NS, "x", &[theirs], |v| v[0].clone()).is_err());
    }

    #[test]
    fn test_kind_mismatch() {
        let store = store();
        let unit = store.create_value(NS, "n", json!(1)).unwrap();

        assert!(matches!(
            store.write(unit, Action::Clear),
            Err(StateError::KindMismatch { action: "clear", .. })
        ));
    }

    #[test]
    fn test_dispose_single_unit_frees_its_key() {
        let store = store();
        let base = store.create_value(NS, "tag/1/state", json!(1)).unwrap();
        let view = store
            .create_derived(NS, "tag/1/view", &[base], |v| v[0].clone())
            .unwrap();
        assert_eq!(store.read(view).unwrap(), json!(1));

        store.dispose(view).unwrap();
        store.dispose(base).unwrap();

        assert_eq!(store.lookup(NS, "tag/1/state"), None);
        assert_eq!(store.read(base), Err(StateError::UnitDisposed(base)));
        assert!(store.create_value(NS, "tag/1/state", json!(2)).is_ok());
        assert_eq!(store.dispose(base), Err(StateError::UnitDisposed(base)));
    }
}
