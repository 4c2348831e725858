// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Serialize;
use std::fmt;

/// A configuration attribute value after parsing against its declared type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AttrValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Color(String),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) | AttrValue::Color(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        AttrValue::Text(value.into())
    }
}

impl From<&AttrValue> for serde_json::Value {
    fn from(value: &AttrValue) -> Self {
        match value {
            AttrValue::Text(s) | AttrValue::Color(s) => serde_json::Value::String(s.clone()),
            AttrValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            AttrValue::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) | AttrValue::Color(s) => write!(f, "{}", s),
            AttrValue::Number(n) => write!(f, "{}", n),
            AttrValue::Bool(b) => write!(f, "{}", b),
        }
    }
}
