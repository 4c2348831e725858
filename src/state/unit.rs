// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Stable identifier of a state unit, unique for the lifetime of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(pub u64);

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of an annotation, which is also the state namespace it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AnnotationId(pub u64);

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    Value,
    Mapped,
    Split,
    Derived,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Value => "value",
            UnitKind::Mapped => "mapped",
            UnitKind::Split => "split",
            UnitKind::Derived => "derived",
        }
    }
}

/// Retention policy of a mapped unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappedPolicy {
    /// When false, every entry key must name a live unit in the same
    /// namespace, and the entry is dropped as soon as that unit is disposed.
    pub retains_entries: bool,
}

impl MappedPolicy {
    pub const RETAINING: MappedPolicy = MappedPolicy {
        retains_entries: true,
    };
    pub const WEAK: MappedPolicy = MappedPolicy {
        retains_entries: false,
    };
}

/// The closed set of writes a unit accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace the value of a value unit (or a split item unit)
    Set(Value),
    /// Insert or replace one entry of a mapped unit
    SetEntry { key: String, value: Value },
    /// Remove one entry of a mapped unit
    DeleteEntry { key: String },
    /// Empty a mapped or split unit
    Clear,
    /// Remove an item of a split unit, disposing its unit
    Remove { item: String },
    /// Insert a new item before `before`, or at the end when `before` is `None`
    InsertBefore {
        item: String,
        value: Value,
        before: Option<String>,
    },
    /// Move an existing item before `before`, or to the end when `before` is `None`
    MoveBefore { item: String, before: Option<String> },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Set(_) => "set",
            Action::SetEntry { .. } => "set_entry",
            Action::DeleteEntry { .. } => "delete_entry",
            Action::Clear => "clear",
            Action::Remove { .. } => "remove",
            Action::InsertBefore { .. } => "insert_before",
            Action::MoveBefore { .. } => "move_before",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// The unit's observable content changed
    Changed,
    /// A dependency of a derived unit changed; the value is recomputed on next read
    Invalidated,
}

/// One queued change delivered to a unit's subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub unit: UnitId,
    pub namespace: AnnotationId,
    /// Version of the unit after the write that produced this notification
    pub version: u64,
    pub kind: NotificationKind,
}
