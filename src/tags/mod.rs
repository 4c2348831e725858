// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The built-in tag set.
//!
//! Every tag type is a [`TagDescriptor`]: capability flags, the children it
//! accepts, its attribute schema, a controller factory and a view. Hosts can
//! register further tag types next to these before sealing the registry.

pub mod choices;
pub mod control;
pub mod labels;
pub mod layout;
pub mod object;
pub mod rectangle;
pub mod textarea;

use std::sync::Arc;

use crate::errors::RegistryError;
use crate::registry::{Capability, ChildRule, TagDescriptor, TagRegistry};
use crate::schema::{AttrDescriptor, AttrType, AttrValue, AttributeSchema};

use choices::ChoicesShape;
use control::{ChoiceOptionFactory, ControlFactory, ControlView, LabelOptionFactory, OptionView};
use labels::LabelsShape;
use layout::{ContainerView, HeaderFactory, HeaderView, StaticFactory};
use object::{ObjectFactory, ObjectView};
use rectangle::RectangleShape;
use textarea::TextAreaShape;

fn name_attr() -> AttrDescriptor {
    AttrDescriptor::new("name", AttrType::String).required()
}

fn to_name_attr() -> AttrDescriptor {
    AttrDescriptor::new("toName", AttrType::String).required()
}

fn required_flag() -> AttrDescriptor {
    AttrDescriptor::new("required", AttrType::Boolean).with_default(AttrValue::Bool(false))
}

fn option_schema() -> AttributeSchema {
    AttributeSchema::new()
        .attr(AttrDescriptor::new("value", AttrType::String).required())
        .attr(AttrDescriptor::new("background", AttrType::Color))
        .attr(AttrDescriptor::new("hotkey", AttrType::String))
}

fn object_schema() -> AttributeSchema {
    AttributeSchema::new()
        .attr(name_attr())
        .attr(AttrDescriptor::new("value", AttrType::String).required())
}

pub fn builtin_descriptors() -> Vec<TagDescriptor> {
    vec![
        TagDescriptor::new("View", Arc::new(StaticFactory), Arc::new(ContainerView))
            .capability(Capability::Container)
            .children(ChildRule::Unrestricted)
            .schema(
                AttributeSchema::new()
                    .attr(AttrDescriptor::new("name", AttrType::String))
                    .attr(AttrDescriptor::new("style", AttrType::String)),
            ),
        TagDescriptor::new("Header", Arc::new(HeaderFactory), Arc::new(HeaderView))
            .capability(Capability::Visual)
            .schema(
                AttributeSchema::new()
                    .attr(AttrDescriptor::new("name", AttrType::String))
                    .attr(AttrDescriptor::new("value", AttrType::String))
                    .attr(AttrDescriptor::new(
                        "size",
                        AttrType::one_of(&["1", "2", "3", "4", "5", "6"]),
                    )),
            ),
        TagDescriptor::new("Image", Arc::new(ObjectFactory), Arc::new(ObjectView))
            .capability(Capability::Object)
            .schema(object_schema()),
        TagDescriptor::new("Text", Arc::new(ObjectFactory), Arc::new(ObjectView))
            .capability(Capability::Object)
            .schema(object_schema()),
        TagDescriptor::new(
            "Choices",
            Arc::new(ControlFactory::<ChoicesShape>::new()),
            Arc::new(ControlView),
        )
        .capability(Capability::Control)
        .children(ChildRule::only(&["Choice"]))
        .schema(
            AttributeSchema::new()
                .attr(name_attr())
                .attr(to_name_attr())
                .attr(
                    AttrDescriptor::new("choice", AttrType::one_of(&["single", "multiple"]))
                        .with_default(AttrValue::text("single")),
                )
                .attr(required_flag()),
        ),
        TagDescriptor::new("Choice", Arc::new(ChoiceOptionFactory), Arc::new(OptionView))
            .capability(Capability::Visual)
            .schema(option_schema()),
        TagDescriptor::new(
            "Labels",
            Arc::new(ControlFactory::<LabelsShape>::new()),
            Arc::new(ControlView),
        )
        .capability(Capability::Control)
        .children(ChildRule::only(&["Label"]))
        .schema(
            AttributeSchema::new()
                .attr(name_attr())
                .attr(to_name_attr())
                .attr(required_flag()),
        ),
        TagDescriptor::new("Label", Arc::new(LabelOptionFactory), Arc::new(OptionView))
            .capability(Capability::Visual)
            .schema(option_schema()),
        TagDescriptor::new(
            "Rectangle",
            Arc::new(ControlFactory::<RectangleShape>::new()),
            Arc::new(ControlView),
        )
        .capability(Capability::Control)
        .schema(
            AttributeSchema::new()
                .attr(name_attr())
                .attr(to_name_attr())
                .attr(
                    AttrDescriptor::new("strokeWidth", AttrType::range(1.0, 10.0))
                        .with_default(AttrValue::Number(1.0)),
                )
                .attr(required_flag()),
        ),
        TagDescriptor::new(
            "TextArea",
            Arc::new(ControlFactory::<TextAreaShape>::new()),
            Arc::new(ControlView),
        )
        .capability(Capability::Control)
        .schema(
            AttributeSchema::new()
                .attr(name_attr())
                .attr(to_name_attr())
                .attr(
                    AttrDescriptor::new("rows", AttrType::range(1.0, 50.0))
                        .with_default(AttrValue::Number(1.0)),
                )
                .attr(AttrDescriptor::new("maxSubmissions", AttrType::range(1.0, 100.0)))
                .attr(AttrDescriptor::new("placeholder", AttrType::String))
                .attr(required_flag()),
        ),
    ]
}

/// Register the built-in tag set. The registry is left open.
pub fn register_builtin_tags(registry: &mut TagRegistry) -> Result<(), RegistryError> {
    for descriptor in builtin_descriptors() {
        registry.register(descriptor)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_registration_is_idempotent() {
        let mut registry = TagRegistry::with_builtin_tags().unwrap();
        let count = registry.len();
        register_builtin_tags(&mut registry).unwrap();
        assert_eq!(registry.len(), count);
    }

    #[test]
    fn test_leaf_and_container_rules() {
        let registry = TagRegistry::with_builtin_tags().unwrap();
        struct TestCase {
            parent: &'static str,
            child: &'static str,
            permitted: bool,
        }

        let cases = vec![
            TestCase { parent: "View", child: "Rectangle", permitted: true },
            TestCase { parent: "Choices", child: "Choice", permitted: true },
            TestCase { parent: "Choices", child: "Label", permitted: false },
            TestCase { parent: "Labels", child: "Label", permitted: true },
            TestCase { parent: "Image", child: "Header", permitted: false },
            TestCase { parent: "Rectangle", child: "View", permitted: false },
        ];

        for case in cases {
            let descriptor = registry.resolve(case.parent).unwrap();
            assert_eq!(
                descriptor.children.permits(case.child),
                case.permitted,
                "{} > {}",
                case.parent,
                case.child
            );
        }
    }
}
