// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `Rectangle`: bounding boxes over an image. Geometry is in percent of the
//! image size.

use serde_json::Value;

use crate::config::{ConfigNode, ConfigTree};
use crate::tags::control::ResultShape;

const GEOMETRY: [&str; 4] = ["x", "y", "width", "height"];

#[derive(Debug, Default)]
pub struct RectangleShape;

impl ResultShape for RectangleShape {
    fn result_type(&self) -> &'static str {
        "rectangle"
    }

    fn check(&self, _node: &ConfigNode, _tree: &ConfigTree, value: &Value) -> Result<(), String> {
        let mut geometry = [0.0; 4];
        for (slot, key) in geometry.iter_mut().zip(GEOMETRY) {
            match value.get(key).and_then(Value::as_f64) {
                Some(n) if (0.0..=100.0).contains(&n) => *slot = n,
                Some(n) => return Err(format!("'{}' is {}, expected 0..100", key, n)),
                None => return Err(format!("'{}' must be a number", key)),
            }
        }

        // The box has to stay inside the image on both axes.
        let [x, y, width, height] = geometry;
        for (origin, extent, origin_key, extent_key) in
            [(x, width, "x", "width"), (y, height, "y", "height")]
        {
            if origin + extent > 100.0 {
                return Err(format!(
                    "'{}' + '{}' is {}, expected at most 100",
                    origin_key,
                    extent_key,
                    origin + extent
                ));
            }
        }
        Ok(())
    }
}
