// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod integration_tests {
    use std::fs;

    use serde_json::{json, Map, Value};

    use crate::config::{
        load_settings, BuildOptions, BuildWarning, ConfigTreeBuilder, NodeId, Task,
        UnknownTagPolicy,
    };
    use crate::errors::ConfigError;
    use crate::registry::TagRegistry;
    use crate::schema::{AttrValue, InvalidAttributePolicy};

    fn registry() -> TagRegistry {
        TagRegistry::with_builtin_tags().unwrap()
    }

    fn fixture_data() -> Map<String, Value> {
        let text = fs::read_to_string("configs/image-task.json").unwrap();
        Task::from_json(&text).unwrap().data_record().unwrap()
    }

    /// The image classification fixture builds with every tag resolved.
    #[test]
    fn test_image_classification_fixture() {
        let registry = registry();
        let markup = fs::read_to_string("configs/image-classification.xml").unwrap();
        let tree = ConfigTreeBuilder::new(&registry)
            .build(&markup, &fixture_data())
            .unwrap();

        assert_eq!(tree.len(), 9);
        assert_eq!(tree.node(tree.root()).unwrap().tag_type, "View");
        assert!(tree.warnings().is_empty());

        let quality = tree.by_name("quality").unwrap();
        assert_eq!(quality.attr_bool("required"), Some(true));
        assert_eq!(quality.to_names(), vec!["image"]);
        assert_eq!(quality.source.path, "View/Choices[3]");
        let values: Vec<&str> = tree
            .children(quality.id)
            .filter_map(|choice| choice.attr_str("value"))
            .collect();
        assert_eq!(values, vec!["Good", "Blurry", "Unusable"]);

        let notes = tree.by_name("notes").unwrap();
        assert_eq!(notes.attr_f64("maxSubmissions"), Some(2.0));
        assert_eq!(notes.attr_bool("required"), Some(false));
    }

    /// Building the same markup twice yields equal trees.
    #[test]
    fn test_builds_are_deterministic() {
        let registry = registry();
        let markup = fs::read_to_string("configs/text-spans.xml").unwrap();
        let data = fixture_data();
        let builder = ConfigTreeBuilder::new(&registry);

        let first = builder.build(&markup, &data).unwrap();
        let second = builder.build(&markup, &data).unwrap();
        assert_eq!(first, second);

        let ids: Vec<NodeId> = first.iter().map(|node| node.id).collect();
        assert_eq!(ids, (0..first.len()).map(NodeId).collect::<Vec<_>>());
    }

    #[test]
    fn test_control_targeting_missing_object_fails() {
        let registry = registry();
        struct TestCase {
            to_name: &'static str,
            target: &'static str,
        }

        let cases = vec![
            TestCase { to_name: "img", target: "img" },
            TestCase { to_name: "", target: "" },
            TestCase { to_name: " , ", target: "" },
        ];

        for case in cases {
            let markup = format!(
                r#"<View><Header value="Hi"/><Rectangle name="r" toName="{}"/></View>"#,
                case.to_name
            );
            let err = ConfigTreeBuilder::new(&registry)
                .build(&markup, &Map::new())
                .unwrap_err();

            assert_eq!(
                err,
                ConfigError::UnresolvedReference {
                    tag: "Rectangle".to_string(),
                    path: "View/Rectangle[1]".to_string(),
                    attribute: "toName".to_string(),
                    target: case.target.to_string(),
                },
                "toName={:?}",
                case.to_name
            );
        }
    }

    #[test]
    fn test_control_targeting_non_object_fails() {
        let registry = registry();
        let err = ConfigTreeBuilder::new(&registry)
            .build(
                r#"<View>
                     <Header name="hdr" value="Hi"/>
                     <Rectangle name="r" toName="hdr"/>
                   </View>"#,
                &Map::new(),
            )
            .unwrap_err();

        assert!(matches!(
            err,
            ConfigError::UnresolvedReference { ref target, .. } if target == "hdr"
        ));
    }

    #[test]
    fn test_unknown_tag_policies() {
        let registry = registry();
        let markup = r#"<View><Header value="Hi"/><Bogus><Header value="Lost"/></Bogus></View>"#;

        let err = ConfigTreeBuilder::new(&registry)
            .build(markup, &Map::new())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::UnknownTagType {
                tag: "Bogus".to_string(),
                path: "View/Bogus[1]".to_string(),
            }
        );

        let tree = ConfigTreeBuilder::new(&registry)
            .with_options(BuildOptions {
                unknown_tags: UnknownTagPolicy::DropSubtree,
                ..BuildOptions::default()
            })
            .build(markup, &Map::new())
            .unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(
            tree.warnings(),
            &[BuildWarning::UnknownTagDropped {
                tag: "Bogus".to_string(),
                path: "View/Bogus[1]".to_string(),
            }]
        );
    }

    #[test]
    fn test_dropping_the_root_fails_the_build() {
        let registry = registry();
        let err = ConfigTreeBuilder::new(&registry)
            .with_options(BuildOptions {
                unknown_tags: UnknownTagPolicy::DropSubtree,
                ..BuildOptions::default()
            })
            .build("<Bogus><View/></Bogus>", &Map::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTagType { ref tag, .. } if tag == "Bogus"));
    }

    #[test]
    fn test_invalid_attribute_policies() {
        struct TestCase {
            name: &'static str,
            markup: &'static str,
            policy: InvalidAttributePolicy,
            expected_error: Option<&'static str>,
        }

        let cases = vec![
            TestCase {
                name: "out of range is rejected by default",
                markup: r#"<View><Image name="img" value="$image"/><Rectangle name="r" toName="img" strokeWidth="40"/></View>"#,
                policy: InvalidAttributePolicy::Reject,
                expected_error: Some("strokeWidth"),
            },
            TestCase {
                name: "out of range falls back to the default",
                markup: r#"<View><Image name="img" value="$image"/><Rectangle name="r" toName="img" strokeWidth="40"/></View>"#,
                policy: InvalidAttributePolicy::FallBackToDefault,
                expected_error: None,
            },
            TestCase {
                name: "no default to fall back to",
                markup: r#"<View><Header value="Hi" size="9"/></View>"#,
                policy: InvalidAttributePolicy::FallBackToDefault,
                expected_error: Some("size"),
            },
            TestCase {
                name: "bad color",
                markup: r##"<View><Text name="t" value="$text"/><Labels name="l" toName="t"><Label value="A" background="#12345"/></Labels></View>"##,
                policy: InvalidAttributePolicy::Reject,
                expected_error: Some("background"),
            },
            TestCase {
                name: "enumeration outsider",
                markup: r#"<View><Text name="t" value="$text"/><Choices name="c" toName="t" choice="some"><Choice value="A"/></Choices></View>"#,
                policy: InvalidAttributePolicy::Reject,
                expected_error: Some("choice"),
            },
        ];

        let registry = registry();
        for case in cases {
            let result = ConfigTreeBuilder::new(&registry)
                .with_options(BuildOptions {
                    invalid_attributes: case.policy,
                    ..BuildOptions::default()
                })
                .build(case.markup, &Map::new());
            match case.expected_error {
                Some(attribute) => match result {
                    Err(ConfigError::InvalidAttribute { attribute: got, .. }) => {
                        assert_eq!(got, attribute, "{}", case.name)
                    }
                    other => panic!("{}: expected InvalidAttribute, got {:?}", case.name, other),
                },
                None => {
                    let tree = result.unwrap();
                    let rect = tree.by_name("r").unwrap();
                    assert_eq!(rect.attr_f64("strokeWidth"), Some(1.0), "{}", case.name);
                    assert_eq!(
                        tree.warnings(),
                        &[BuildWarning::AttributeFellBack {
                            tag: "Rectangle".to_string(),
                            path: "View/Rectangle[1]".to_string(),
                            attribute: "strokeWidth".to_string(),
                            value: "40".to_string(),
                            default: AttrValue::Number(1.0),
                        }],
                        "{}",
                        case.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_missing_required_attribute() {
        let registry = registry();
        let err = ConfigTreeBuilder::new(&registry)
            .build(r#"<View><Image value="$image"/></View>"#, &Map::new())
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingRequiredAttribute {
                tag: "Image".to_string(),
                path: "View/Image[0]".to_string(),
                attribute: "name".to_string(),
            }
        );
    }

    #[test]
    fn test_undeclared_attributes_are_kept_with_a_warning() {
        let registry = registry();
        let tree = ConfigTreeBuilder::new(&registry)
            .build(r#"<View className="wide"><Header value="Hi"/></View>"#, &Map::new())
            .unwrap();
        let root = tree.node(tree.root()).unwrap();
        assert_eq!(root.attr_str("className"), Some("wide"));
        assert_eq!(
            tree.warnings(),
            &[BuildWarning::UndeclaredAttribute {
                tag: "View".to_string(),
                path: "View".to_string(),
                attribute: "className".to_string(),
            }]
        );
    }

    #[test]
    fn test_disallowed_child() {
        let registry = registry();
        let err = ConfigTreeBuilder::new(&registry)
            .build(
                r#"<View>
                     <Text name="t" value="$text"/>
                     <Choices name="c" toName="t"><Label value="A"/></Choices>
                   </View>"#,
                &Map::new(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DisallowedChild {
                parent: "Choices".to_string(),
                child: "Label".to_string(),
                path: "View/Choices[1]/Label[0]".to_string(),
            }
        );
    }

    #[test]
    fn test_duplicate_names() {
        let registry = registry();
        let err = ConfigTreeBuilder::new(&registry)
            .build(
                r#"<View><Image name="img" value="$a"/><Text name="img" value="$b"/></View>"#,
                &Map::new(),
            )
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateName {
                name: "img".to_string(),
                path: "View/Text[1]".to_string(),
            }
        );
    }

    #[test]
    fn test_syntax_errors_carry_a_position() {
        let registry = registry();
        let err = ConfigTreeBuilder::new(&registry)
            .build("<View>\n  <Header value=\"Hi\">\n</View>", &Map::new())
            .unwrap_err();
        assert!(
            matches!(err, ConfigError::Syntax { line: Some(_), .. }),
            "unexpected {:?}",
            err
        );
    }

    #[test]
    fn test_repeater_expands_per_data_item() {
        let registry = registry();
        let markup = fs::read_to_string("configs/image-gallery.xml").unwrap();
        let data = fixture_data();
        let tree = ConfigTreeBuilder::new(&registry)
            .build(&markup, &data)
            .unwrap();

        // View plus three copies of Header, Image and Rectangle
        assert_eq!(tree.len(), 10);
        assert_eq!(tree.of_type("Image").count(), 3);
        let image = tree.by_name("image_2").unwrap();
        assert_eq!(image.attr_str("value"), Some("$images[2].url"));
        assert_eq!(image.source.path, "View/Image[7]");
        assert_eq!(tree.by_name("box_1").unwrap().to_names(), vec!["image_1"]);
        let headers: Vec<&str> = tree
            .of_type("Header")
            .filter_map(|header| header.attr_str("value"))
            .collect();
        assert_eq!(headers, vec!["Image 0", "Image 1", "Image 2"]);
    }

    #[test]
    fn test_repeater_over_empty_array_yields_no_copies() {
        let registry = registry();
        let markup = fs::read_to_string("configs/image-gallery.xml").unwrap();
        let mut data = Map::new();
        data.insert("images".to_string(), json!([]));

        let tree = ConfigTreeBuilder::new(&registry)
            .build(&markup, &data)
            .unwrap();
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_repeater_without_data_fails() {
        let registry = registry();
        let markup = fs::read_to_string("configs/image-gallery.xml").unwrap();
        let err = ConfigTreeBuilder::new(&registry)
            .build(&markup, &Map::new())
            .unwrap_err();
        assert!(matches!(err, ConfigError::RepeaterData { ref key, .. } if key == "images"));
    }

    #[test]
    fn test_lenient_settings_fixture() {
        let settings = load_settings("configs/lenient-settings.yaml").unwrap();
        assert_eq!(settings.build.unknown_tags, UnknownTagPolicy::DropSubtree);
        assert_eq!(
            settings.build.invalid_attributes,
            InvalidAttributePolicy::FallBackToDefault
        );
        assert!(settings.registry.seal_after_builtin);
        assert!(settings.feature_flags.is_enabled("show_region_count", false));
    }
}
