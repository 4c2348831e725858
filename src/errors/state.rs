// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

use crate::state::UnitId;

/// Errors raised by the reactive state store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateError {
    /// The unit belonged to a destroyed namespace or was removed from its collection.
    #[error("State unit {0} has been disposed")]
    UnitDisposed(UnitId),

    /// The unit id was never issued by this store.
    #[error("Unknown state unit {0}")]
    UnknownUnit(UnitId),

    /// The action does not apply to this kind of unit.
    #[error("Action '{action}' cannot be applied to {kind} unit {unit}")]
    KindMismatch {
        unit: UnitId,
        kind: &'static str,
        action: &'static str,
    },

    /// A split unit has no item with this key.
    #[error("Split unit {unit} has no item '{item}'")]
    UnknownItem { unit: UnitId, item: String },

    /// A non-retaining mapped unit was asked to hold an entry for a unit that does not exist.
    #[error("Mapped unit {unit} cannot hold entry '{key}': no live unit with that key")]
    DanglingEntry { unit: UnitId, key: String },

    /// Derived units may only depend on units of their own namespace.
    #[error("Unit {0} belongs to another namespace")]
    CrossNamespace(UnitId),

    /// A unit with this key already exists in the namespace.
    #[error("Unit key '{0}' already exists in this namespace")]
    DuplicateKey(String),

    /// The namespace is already open.
    #[error("State namespace {0} already exists")]
    NamespaceExists(u64),

    /// The namespace was never opened or has been disposed.
    #[error("Unknown state namespace {0}")]
    UnknownNamespace(u64),
}
