// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Labeling config: markup in, immutable [`ConfigTree`] out.
//!
//! Building runs in fixed stages: parse the markup into generic elements,
//! expand repeaters against the task data, resolve each element against the
//! tag registry (schema, allowed children) and finally check cross-node
//! constraints such as unique names and `toName` targets.

pub mod builder;
pub mod consts;
pub mod loader;
pub mod markup;
pub mod reference;
pub mod repeater;
pub mod task;
pub mod tree;
pub mod validation;

#[cfg(test)]
mod integration_tests;

pub use builder::{BuildOptions, ConfigTreeBuilder, UnknownTagPolicy};
pub use loader::{load_settings, parse_settings, EngineSettings, RegistrySettings};
pub use task::{RegionResult, Task, TaskData};
pub use tree::{BuildWarning, ConfigNode, ConfigTree, NodeId, SourceRef};
pub use validation::validate_tree;
