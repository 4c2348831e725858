// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::state::store::StoreInner;
use crate::state::{Notification, UnitId};

/// Callback invoked once per delivered notification.
pub type Listener = Rc<dyn Fn(&Notification)>;

/// Handle returned by [`crate::state::StateStore::subscribe`].
///
/// Unsubscribing is explicit; dropping the handle leaves the listener in
/// place until its unit is disposed.
pub struct Subscription {
    pub(crate) unit: UnitId,
    pub(crate) id: u64,
    pub(crate) store: Weak<RefCell<StoreInner>>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("unit", &self.unit)
            .field("id", &self.id)
            .finish()
    }
}

impl Subscription {
    pub fn unit(&self) -> UnitId {
        self.unit
    }

    /// Remove the listener. Returns false when it was already gone, e.g.
    /// because the unit or the whole store has been disposed.
    pub fn unsubscribe(self) -> bool {
        match self.store.upgrade() {
            Some(store) => store.borrow_mut().remove_listener(self.unit, self.id),
            None => false,
        }
    }

    /// Whether the listener is still registered.
    pub fn is_active(&self) -> bool {
        match self.store.upgrade() {
            Some(store) => store.borrow().has_listener(self.unit, self.id),
            None => false,
        }
    }
}

