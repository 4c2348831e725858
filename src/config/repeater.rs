// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Repeater expansion.
//!
//! A `<Repeater on="$key">` element is replaced by one copy of its children
//! per item of the task data array under `key`. Every occurrence of the index
//! flag (default `{{idx}}`) in attribute values and text is replaced with the
//! copy's index. Expansion runs once on the generic element tree, so the
//! output contains no repeaters and expanding it again changes nothing.

use serde_json::{Map, Value};

use crate::config::consts::{DEFAULT_INDEX_FLAG, REPEATER_TAG};
use crate::config::markup::GenericElement;
use crate::errors::ConfigError;
use crate::observability::messages::builder::RepeaterExpanded;
use crate::observability::messages::StructuredLog;

/// Expand every repeater below `root`.
pub fn expand(root: GenericElement, data: &Map<String, Value>) -> Result<GenericElement, ConfigError> {
    if root.name == REPEATER_TAG {
        return Err(ConfigError::RepeaterData {
            path: root.name.clone(),
            key: root.attribute("on").unwrap_or_default().to_string(),
            reason: "a repeater cannot be the root element".to_string(),
        });
    }
    let path = root.name.clone();
    expand_element(root, &path, data)
}

fn expand_element(
    mut element: GenericElement,
    path: &str,
    data: &Map<String, Value>,
) -> Result<GenericElement, ConfigError> {
    let children = std::mem::take(&mut element.children);
    for (index, child) in children.into_iter().enumerate() {
        let child_path = format!("{}/{}[{}]", path, child.name, index);
        if child.name == REPEATER_TAG {
            element
                .children
                .extend(expand_repeater(child, &child_path, data)?);
        } else {
            element
                .children
                .push(expand_element(child, &child_path, data)?);
        }
    }
    Ok(element)
}

fn expand_repeater(
    repeater: GenericElement,
    path: &str,
    data: &Map<String, Value>,
) -> Result<Vec<GenericElement>, ConfigError> {
    let Some(on) = repeater.attribute("on") else {
        return Err(ConfigError::MissingRequiredAttribute {
            tag: REPEATER_TAG.to_string(),
            path: path.to_string(),
            attribute: "on".to_string(),
        });
    };
    let key = on.strip_prefix('$').unwrap_or(on).to_string();
    let flag = repeater
        .attribute("indexFlag")
        .unwrap_or(DEFAULT_INDEX_FLAG)
        .to_string();

    reject_nested(&repeater.children, path)?;

    let items = match data.get(&key) {
        Some(Value::Array(items)) => items.len(),
        Some(_) => {
            return Err(ConfigError::RepeaterData {
                path: path.to_string(),
                key,
                reason: "task data value is not an array".to_string(),
            })
        }
        None => {
            return Err(ConfigError::RepeaterData {
                path: path.to_string(),
                key,
                reason: "task data has no such key".to_string(),
            })
        }
    };

    let mut copies = Vec::with_capacity(items * repeater.children.len());
    for index in 0..items {
        let index_text = index.to_string();
        for template in &repeater.children {
            copies.push(substitute(template.clone(), &flag, &index_text));
        }
    }

    RepeaterExpanded {
        path,
        key: &key,
        copies: items,
    }
    .log();

    Ok(copies)
}

fn reject_nested(children: &[GenericElement], path: &str) -> Result<(), ConfigError> {
    for (index, child) in children.iter().enumerate() {
        let child_path = format!("{}/{}[{}]", path, child.name, index);
        if child.name == REPEATER_TAG {
            return Err(ConfigError::DisallowedChild {
                parent: REPEATER_TAG.to_string(),
                child: REPEATER_TAG.to_string(),
                path: child_path,
            });
        }
        reject_nested(&child.children, &child_path)?;
    }
    Ok(())
}

fn substitute(mut element: GenericElement, flag: &str, index: &str) -> GenericElement {
    for (_, value) in element.attributes.iter_mut() {
        if value.contains(flag) {
            *value = value.replace(flag, index);
        }
    }
    if element.text.contains(flag) {
        element.text = element.text.replace(flag, index);
    }
    element.children = element
        .children
        .into_iter()
        .map(|child| substitute(child, flag, index))
        .collect();
    element
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::markup;
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    const MARKUP: &str = r#"
<View>
  <Header value="Pages"/>
  <Repeater on="$pages">
    <Image name="page_{{idx}}" value="$pages[{{idx}}].url"/>
    <Header>Page {{idx}}</Header>
  </Repeater>
</View>"#;

    #[test]
    fn test_expands_one_copy_per_item() {
        let root = markup::parse(MARKUP).unwrap();
        let data = data(json!({"pages": [{"url": "a"}, {"url": "b"}, {"url": "c"}]}));

        let expanded = expand(root, &data).unwrap();

        assert_eq!(expanded.children.len(), 1 + 3 * 2);
        let names: Vec<&str> = expanded
            .children
            .iter()
            .filter_map(|c| c.attribute("name"))
            .collect();
        assert_eq!(names, vec!["page_0", "page_1", "page_2"]);
        assert_eq!(expanded.children[3].attribute("value"), Some("$pages[1].url"));
        assert_eq!(expanded.children[6].text, "Page 2");
    }

    #[test]
    fn test_empty_array_expands_to_nothing() {
        let root = markup::parse(MARKUP).unwrap();
        let expanded = expand(root, &data(json!({"pages": []}))).unwrap();
        assert_eq!(expanded.children.len(), 1);
        assert_eq!(expanded.children[0].name, "Header");
    }

    #[test]
    fn test_expansion_is_idempotent() {
        let root = markup::parse(MARKUP).unwrap();
        let data = data(json!({"pages": [{"url": "a"}, {"url": "b"}]}));
        let once = expand(root, &data).unwrap();
        let twice = expand(once.clone(), &data).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_custom_index_flag() {
        let root = markup::parse(
            r##"<View><Repeater on="$items" indexFlag="#"><Text name="t#" value="x"/></Repeater></View>"##,
        )
        .unwrap();
        let expanded = expand(root, &data(json!({"items": [1, 2]}))).unwrap();
        assert_eq!(expanded.children[1].attribute("name"), Some("t1"));
    }

    #[test]
    fn test_repeater_errors() {
        struct TestCase {
            name: &'static str,
            markup: &'static str,
            data: Value,
        }

        let cases = vec![
            TestCase {
                name: "missing key",
                markup: r#"<View><Repeater on="$pages"><Header/></Repeater></View>"#,
                data: json!({}),
            },
            TestCase {
                name: "not an array",
                markup: r#"<View><Repeater on="$pages"><Header/></Repeater></View>"#,
                data: json!({"pages": "nope"}),
            },
        ];

        for case in cases {
            let root = markup::parse(case.markup).unwrap();
            let result = expand(root, &data(case.data));
            assert!(
                matches!(result, Err(ConfigError::RepeaterData { .. })),
                "{}: {:?}",
                case.name,
                result
            );
        }
    }

    #[test]
    fn test_nested_repeater_is_disallowed() {
        let root = markup::parse(
            r#"<View><Repeater on="$a"><View><Repeater on="$b"><Header/></Repeater></View></Repeater></View>"#,
        )
        .unwrap();
        let result = expand(root, &data(json!({"a": [1], "b": [1]})));
        assert_eq!(
            result,
            Err(ConfigError::DisallowedChild {
                parent: "Repeater".to_string(),
                child: "Repeater".to_string(),
                path: "View/Repeater[0]/View[0]/Repeater[0]".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_on_attribute() {
        let root = markup::parse(r#"<View><Repeater><Header/></Repeater></View>"#).unwrap();
        assert!(matches!(
            expand(root, &Map::new()),
            Err(ConfigError::MissingRequiredAttribute { .. })
        ));
    }
}
