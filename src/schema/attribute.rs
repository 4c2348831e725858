// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::errors::ConfigError;
use crate::schema::AttrValue;

/// The value shape an attribute accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrType {
    /// One of a fixed set of literal strings
    Enumeration(Vec<String>),
    /// `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb()/rgba()/hsl()/hsla()` or a named color
    Color,
    /// A number within an inclusive range
    Range { min: f64, max: f64 },
    /// Any string
    String,
    /// `true` or `false`
    Boolean,
}

impl AttrType {
    pub fn one_of(values: &[&str]) -> Self {
        AttrType::Enumeration(values.iter().map(|v| v.to_string()).collect())
    }

    pub fn range(min: f64, max: f64) -> Self {
        AttrType::Range { min, max }
    }

    /// Parse a raw attribute string, returning the accepted-values description on failure.
    pub fn parse(&self, raw: &str) -> Result<AttrValue, String> {
        match self {
            AttrType::Enumeration(allowed) => {
                if allowed.iter().any(|a| a == raw) {
                    Ok(AttrValue::Text(raw.to_string()))
                } else {
                    Err(self.describe())
                }
            }
            AttrType::Color => {
                if is_color(raw) {
                    Ok(AttrValue::Color(raw.to_string()))
                } else {
                    Err(self.describe())
                }
            }
            AttrType::Range { min, max } => match raw.trim().parse::<f64>() {
                Ok(n) if n.is_finite() && n >= *min && n <= *max => Ok(AttrValue::Number(n)),
                _ => Err(self.describe()),
            },
            AttrType::String => Ok(AttrValue::Text(raw.to_string())),
            AttrType::Boolean => match raw {
                "true" => Ok(AttrValue::Bool(true)),
                "false" => Ok(AttrValue::Bool(false)),
                _ => Err(self.describe()),
            },
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AttrType::Enumeration(allowed) => format!("one of [{}]", allowed.join(", ")),
            AttrType::Color => "a color".to_string(),
            AttrType::Range { min, max } => format!("a number between {} and {}", min, max),
            AttrType::String => "a string".to_string(),
            AttrType::Boolean => "true or false".to_string(),
        }
    }
}

fn is_color(raw: &str) -> bool {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix('#') {
        return matches!(hex.len(), 3 | 4 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    for func in ["rgba(", "rgb(", "hsla(", "hsl("] {
        if let Some(args) = raw.strip_prefix(func) {
            return args.ends_with(')')
                && args[..args.len() - 1]
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '%' | ' '));
        }
    }
    !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphabetic())
}

/// Declaration of one recognized attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrDescriptor {
    pub name: String,
    pub ty: AttrType,
    pub default: Option<AttrValue>,
    pub required: bool,
}

impl AttrDescriptor {
    pub fn new(name: &str, ty: AttrType) -> Self {
        Self {
            name: name.to_string(),
            ty,
            default: None,
            required: false,
        }
    }

    pub fn with_default(mut self, default: AttrValue) -> Self {
        self.default = Some(default);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// What the builder does with a declared attribute whose value is out of shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidAttributePolicy {
    /// Fail the build with `InvalidAttribute`
    #[default]
    Reject,
    /// Use the declared default and record a warning; fail if there is no default
    FallBackToDefault,
}

/// Non-fatal findings from attribute validation.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeIssue {
    Undeclared {
        attribute: String,
        value: String,
    },
    FellBackToDefault {
        attribute: String,
        value: String,
        default: AttrValue,
    },
}

/// Attribute values of one element after validation, defaults applied.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidatedAttributes {
    pub values: BTreeMap<String, AttrValue>,
    pub issues: Vec<AttributeIssue>,
}

/// The set of attributes a tag type recognizes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeSchema {
    attrs: BTreeMap<String, AttrDescriptor>,
}

impl AttributeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attr(mut self, descriptor: AttrDescriptor) -> Self {
        self.attrs.insert(descriptor.name.clone(), descriptor);
        self
    }

    /// Returns the declaration for `name`, or `None` when the attribute is not declared.
    pub fn get(&self, name: &str) -> Option<&AttrDescriptor> {
        self.attrs.get(name)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &AttrDescriptor> {
        self.attrs.values()
    }

    /// Validate raw attributes of one element.
    ///
    /// Declared attributes are parsed against their type, missing ones take
    /// their default, and undeclared ones are kept as text with an
    /// [`AttributeIssue::Undeclared`] note.
    pub fn validate(
        &self,
        tag: &str,
        path: &str,
        raw: &[(String, String)],
        policy: InvalidAttributePolicy,
    ) -> Result<ValidatedAttributes, ConfigError> {
        let mut validated = ValidatedAttributes::default();

        for (name, value) in raw {
            let Some(descriptor) = self.attrs.get(name) else {
                validated.issues.push(AttributeIssue::Undeclared {
                    attribute: name.clone(),
                    value: value.clone(),
                });
                validated
                    .values
                    .insert(name.clone(), AttrValue::Text(value.clone()));
                continue;
            };

            match descriptor.ty.parse(value) {
                Ok(parsed) => {
                    validated.values.insert(name.clone(), parsed);
                }
                Err(expected) => {
                    let fallback = match policy {
                        InvalidAttributePolicy::Reject => None,
                        InvalidAttributePolicy::FallBackToDefault => descriptor.default.clone(),
                    };
                    let Some(default) = fallback else {
                        return Err(ConfigError::InvalidAttribute {
                            tag: tag.to_string(),
                            path: path.to_string(),
                            attribute: name.clone(),
                            value: value.clone(),
                            expected,
                        });
                    };
                    validated.issues.push(AttributeIssue::FellBackToDefault {
                        attribute: name.clone(),
                        value: value.clone(),
                        default: default.clone(),
                    });
                    validated.values.insert(name.clone(), default);
                }
            }
        }

        for descriptor in self.attrs.values() {
            if validated.values.contains_key(&descriptor.name) {
                continue;
            }
            match &descriptor.default {
                Some(default) => {
                    validated
                        .values
                        .insert(descriptor.name.clone(), default.clone());
                }
                None if descriptor.required => {
                    return Err(ConfigError::MissingRequiredAttribute {
                        tag: tag.to_string(),
                        path: path.to_string(),
                        attribute: descriptor.name.clone(),
                    });
                }
                None => {}
            }
        }

        Ok(validated)
    }
}
