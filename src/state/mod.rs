// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Annotation-scoped reactive state.
//!
//! The store holds independently subscribable units ("atoms") grouped into
//! one namespace per open annotation. Units are addressed by a stable
//! [`UnitId`] or by their key inside a namespace, subscription lists are
//! plain data on each unit, and notifications are queued by writes and
//! delivered by [`StateStore::flush`].
//!
//! Four unit kinds exist:
//! * value units hold any JSON value
//! * mapped units hold a keyed collection, optionally without retaining
//!   entries whose key names a unit that no longer exists
//! * split units hold an ordered collection of item units
//! * derived units compute a value from other units on read

mod store;
mod subscription;
mod unit;

pub use store::{StateStore, FLUSH_ROUND_LIMIT};
pub use subscription::{Listener, Subscription};
pub use unit::{Action, AnnotationId, MappedPolicy, Notification, NotificationKind, UnitId, UnitKind};
