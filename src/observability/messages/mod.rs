// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for the human-readable line and
//! [`StructuredLog`] to emit the same event with structured fields at its
//! documented level.
//!
//! # Usage Pattern
//!
//! ```rust
//! use the_labelwood::observability::messages::builder::TreeBuilt;
//!
//! let msg = TreeBuilt {
//!     root: "View",
//!     node_count: 5,
//!     warning_count: 0,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

use tracing::Span;

pub mod builder;
pub mod controller;
pub mod registry;
pub mod state;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog: std::fmt::Display {
    /// Emit the message as a `tracing` event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, name: &str) -> Span;
}
