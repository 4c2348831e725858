// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `TextArea`: free-text answers, `{"text": ["..", ..]}`, at most
//! `maxSubmissions` entries when that attribute is set.

use serde_json::Value;

use crate::config::{ConfigNode, ConfigTree};
use crate::tags::control::ResultShape;

#[derive(Debug, Default)]
pub struct TextAreaShape;

impl ResultShape for TextAreaShape {
    fn result_type(&self) -> &'static str {
        "textarea"
    }

    fn check(&self, node: &ConfigNode, _tree: &ConfigTree, value: &Value) -> Result<(), String> {
        let Some(texts) = value.get("text").and_then(Value::as_array) else {
            return Err("'text' must be a list".to_string());
        };
        if texts.iter().any(|text| !text.is_string()) {
            return Err("'text' must contain strings".to_string());
        }
        if let Some(max) = node.attr_f64("maxSubmissions") {
            if texts.len() as f64 > max {
                return Err(format!("at most {} submissions allowed, got {}", max, texts.len()));
            }
        }
        Ok(())
    }

    fn single_result(&self) -> bool {
        true
    }

    fn is_blank(&self, value: &Value) -> bool {
        value
            .get("text")
            .and_then(Value::as_array)
            .map_or(true, |texts| {
                texts
                    .iter()
                    .all(|text| text.as_str().map_or(true, |s| s.trim().is_empty()))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigTreeBuilder;
    use crate::registry::TagRegistry;
    use serde_json::{json, Map};

    #[test]
    fn test_submission_limit_and_blanks() {
        let registry = TagRegistry::with_builtin_tags().unwrap();
        let tree = ConfigTreeBuilder::new(&registry)
            .build(
                r#"<View>
                     <Text name="text" value="$text"/>
                     <TextArea name="notes" toName="text" maxSubmissions="2"/>
                   </View>"#,
                &Map::new(),
            )
            .unwrap();
        let node = tree.by_name("notes").unwrap();

        assert!(TextAreaShape.check(node, &tree, &json!({"text": ["a", "b"]})).is_ok());
        assert!(TextAreaShape.check(node, &tree, &json!({"text": ["a", "b", "c"]})).is_err());
        assert!(TextAreaShape.check(node, &tree, &json!({"text": [1]})).is_err());

        assert!(TextAreaShape.is_blank(&json!({"text": []})));
        assert!(TextAreaShape.is_blank(&json!({"text": ["  ", ""]})));
        assert!(!TextAreaShape.is_blank(&json!({"text": ["done"]})));
    }
}
