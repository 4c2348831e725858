// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Tag-agnostic parsing of config markup into generic elements.
//!
//! Nothing here knows about tag types; resolution against the registry
//! happens in the builder. Comments, processing instructions and the XML
//! declaration are skipped.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::errors::ConfigError;

/// An element as written in the markup, before resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct GenericElement {
    pub name: String,
    /// Attributes in source order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<GenericElement>,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl GenericElement {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse markup into its single root element.
pub fn parse(markup: &str) -> Result<GenericElement, ConfigError> {
    let mut reader = Reader::from_str(markup);
    reader.trim_text(true);

    let mut stack: Vec<GenericElement> = Vec::new();
    let mut root: Option<GenericElement> = None;

    loop {
        let offset = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                stack.push(element(markup, &start, offset)?);
            }
            Ok(Event::Empty(start)) => {
                let element = element(markup, &start, offset)?;
                attach(markup, offset, &mut stack, &mut root, element)?;
            }
            Ok(Event::End(_)) => {
                let Some(element) = stack.pop() else {
                    return Err(syntax(markup, offset, "closing tag without opening tag"));
                };
                attach(markup, offset, &mut stack, &mut root, element)?;
            }
            Ok(Event::Text(text)) => {
                let text = text
                    .unescape()
                    .map_err(|e| syntax(markup, offset, &e.to_string()))?;
                push_text(markup, offset, &mut stack, &text)?;
            }
            Ok(Event::CData(data)) => {
                let bytes = data.into_inner();
                let text = String::from_utf8_lossy(&bytes);
                push_text(markup, offset, &mut stack, &text)?;
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(syntax(markup, reader.buffer_position(), &e.to_string()));
            }
        }
    }

    if let Some(open) = stack.last() {
        return Err(ConfigError::Syntax {
            message: format!("element <{}> is never closed", open.name),
            line: Some(open.line),
            column: Some(open.column),
        });
    }

    root.ok_or(ConfigError::EmptyDocument)
}

fn element(markup: &str, start: &BytesStart<'_>, offset: usize) -> Result<GenericElement, ConfigError> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(|e| syntax(markup, offset, &e.to_string()))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| syntax(markup, offset, &e.to_string()))?
            .into_owned();
        attributes.push((key, value));
    }

    // The reader's offset sits before any skipped whitespace.
    let tag_offset = markup
        .get(offset..)
        .and_then(|rest| rest.find('<'))
        .map(|i| offset + i)
        .unwrap_or(offset);
    let (line, column) = line_column(markup, tag_offset);

    Ok(GenericElement {
        name,
        attributes,
        children: Vec::new(),
        text: String::new(),
        line,
        column,
    })
}

fn attach(
    markup: &str,
    offset: usize,
    stack: &mut [GenericElement],
    root: &mut Option<GenericElement>,
    element: GenericElement,
) -> Result<(), ConfigError> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
        return Ok(());
    }
    if root.is_some() {
        return Err(syntax(
            markup,
            offset,
            &format!("second root element <{}>", element.name),
        ));
    }
    *root = Some(element);
    Ok(())
}

fn push_text(
    markup: &str,
    offset: usize,
    stack: &mut [GenericElement],
    text: &str,
) -> Result<(), ConfigError> {
    match stack.last_mut() {
        Some(parent) => {
            if !parent.text.is_empty() {
                parent.text.push(' ');
            }
            parent.text.push_str(text.trim());
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(syntax(markup, offset, "text outside the root element")),
    }
}

fn syntax(markup: &str, offset: usize, message: &str) -> ConfigError {
    let (line, column) = line_column(markup, offset.min(markup.len()));
    ConfigError::Syntax {
        message: message.to_string(),
        line: Some(line),
        column: Some(column),
    }
}

/// 1-based line and column of a byte offset.
fn line_column(markup: &str, offset: usize) -> (usize, usize) {
    let before = markup.get(..offset).unwrap_or(markup);
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(newline) => before[newline + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}
