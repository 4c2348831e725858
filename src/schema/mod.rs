// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Attribute schemas: the recognized configuration attributes of a tag type,
//! their value shapes, defaults and validation.
//!
//! A schema answers one question for the builder: given an attribute name,
//! is it declared, and if so what shape must its value have? Undeclared
//! attributes are tolerated (they surface as warnings) so configs written for
//! newer tag versions still load.

mod attribute;
mod value;

pub use attribute::{AttrDescriptor, AttrType, AttributeIssue, AttributeSchema, InvalidAttributePolicy, ValidatedAttributes};
pub use value::AttrValue;
