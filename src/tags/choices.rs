// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! `Choices`: classification by picking declared `Choice` values.
//!
//! A `Choices` tag keeps one result per annotation. Its value is
//! `{"choices": ["..."]}`; in `single` mode at most one value may be picked.

use serde_json::Value;

use crate::config::{ConfigNode, ConfigTree};
use crate::tags::control::{check_declared_list, child_values, ResultShape};

#[derive(Debug, Default)]
pub struct ChoicesShape;

impl ResultShape for ChoicesShape {
    fn result_type(&self) -> &'static str {
        "choices"
    }

    fn check(&self, node: &ConfigNode, tree: &ConfigTree, value: &Value) -> Result<(), String> {
        let declared = child_values(tree, node, "Choice");
        let picked = check_declared_list(value, "choices", &declared)?;
        if node.attr_str("choice") != Some("multiple") && picked > 1 {
            return Err(format!("single choice mode allows one value, got {}", picked));
        }
        Ok(())
    }

    fn single_result(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigTreeBuilder;
    use crate::registry::TagRegistry;
    use serde_json::{json, Map};

    fn tree(mode: &str) -> ConfigTree {
        let registry = TagRegistry::with_builtin_tags().unwrap();
        let markup = format!(
            r#"<View>
                 <Text name="text" value="$text"/>
                 <Choices name="sentiment" toName="text" choice="{}">
                   <Choice value="Positive"/>
                   <Choice value="Negative"/>
                 </Choices>
               </View>"#,
            mode
        );
        ConfigTreeBuilder::new(&registry)
            .build(&markup, &Map::new())
            .unwrap()
    }

    #[test]
    fn test_choices_value_shapes() {
        struct TestCase {
            name: &'static str,
            mode: &'static str,
            value: Value,
            accepted: bool,
        }

        let cases = vec![
            TestCase {
                name: "one declared value",
                mode: "single",
                value: json!({"choices": ["Positive"]}),
                accepted: true,
            },
            TestCase {
                name: "two values in single mode",
                mode: "single",
                value: json!({"choices": ["Positive", "Negative"]}),
                accepted: false,
            },
            TestCase {
                name: "two values in multiple mode",
                mode: "multiple",
                value: json!({"choices": ["Positive", "Negative"]}),
                accepted: true,
            },
            TestCase {
                name: "undeclared value",
                mode: "multiple",
                value: json!({"choices": ["Neutral"]}),
                accepted: false,
            },
            TestCase {
                name: "empty list",
                mode: "single",
                value: json!({"choices": []}),
                accepted: false,
            },
            TestCase {
                name: "not a list",
                mode: "single",
                value: json!({"choices": "Positive"}),
                accepted: false,
            },
        ];

        for case in cases {
            let tree = tree(case.mode);
            let node = tree.by_name("sentiment").unwrap();
            assert_eq!(
                ChoicesShape.check(node, &tree, &case.value).is_ok(),
                case.accepted,
                "{}",
                case.name
            );
        }
    }
}
