// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `Labels`: span labeling over a text object.
//!
//! Each result marks one span, `{"start": n, "end": m, "labels": [".."]}`,
//! with `start <= end` and labels drawn from the declared `Label` children.

use serde_json::Value;

use crate::config::{ConfigNode, ConfigTree};
use crate::tags::control::{check_declared_list, child_values, ResultShape};

#[derive(Debug, Default)]
pub struct LabelsShape;

impl ResultShape for LabelsShape {
    fn result_type(&self) -> &'static str {
        "labels"
    }

    fn check(&self, node: &ConfigNode, tree: &ConfigTree, value: &Value) -> Result<(), String> {
        let declared = child_values(tree, node, "Label");
        check_declared_list(value, "labels", &declared)?;
        let offset = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_u64)
                .ok_or_else(|| format!("'{}' must be a non-negative integer", key))
        };
        let (start, end) = (offset("start")?, offset("end")?);
        if start > end {
            return Err(format!("span start {} is after end {}", start, end));
        }
        Ok(())
    }
}
