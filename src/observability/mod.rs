// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! This module provides centralized message types for all diagnostic and operational
//! logging throughout the Labelwood engine. Message types follow a struct-based pattern
//! with `Display` trait implementation to:
//!
//! * Eliminate magic strings scattered throughout the codebase
//! * Keep structured field names consistent between call sites
//! * Provide consistent, structured logging output
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::builder` - config tree construction and attribute warnings
//! * `messages::registry` - tag type registration
//! * `messages::state` - reactive store namespaces and delivery
//! * `messages::controller` - annotation and controller lifecycle
//!
//! # Usage
//!
//! ```rust
//! use the_labelwood::observability::messages::builder::UnknownTagDropped;
//! use the_labelwood::observability::messages::StructuredLog;
//!
//! let msg = UnknownTagDropped {
//!     tag: "Bogus",
//!     path: "View/Bogus[1]",
//! };
//!
//! msg.log();
//! ```

pub mod messages;
