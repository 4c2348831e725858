// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod config;        // markup parsing, tree building, settings
pub mod engine;        // annotations, controllers, sessions
pub mod errors;        // error handling
pub mod flags;
pub mod observability;
pub mod registry;      // tag type registry
pub mod render;
pub mod schema;        // attribute schemas
pub mod state;         // reactive state store
pub mod tags;          // built-in tag set
pub mod traits;        // behavior, view and notifier seams
