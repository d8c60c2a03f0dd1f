// src/descriptor/xml.rs

//! Minimal element tree built on top of `quick-xml`'s pull reader.
//!
//! The descriptor schema only needs element names, attributes, text content
//! and child order, so this keeps exactly that. Building the whole tree first
//! means well-formedness errors always surface before any schema error.

use std::borrow::Cow;

use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};

use crate::errors::{PackwatchError, Result};

/// One XML element with its text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Concatenated direct text content, trimmed.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(contents: &str) -> Result<Element> {
    let mut reader = Reader::from_str(contents);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let event = reader.read_event().map_err(|e| {
            parse_error(format!(
                "malformed XML at position {}: {e}",
                reader.error_position()
            ))
        })?;

        match event {
            Event::Start(start) => {
                ensure_single_root(&root, &stack)?;
                stack.push(open_element(&start)?);
            }
            Event::Empty(start) => {
                ensure_single_root(&root, &stack)?;
                let element = open_element(&start)?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(end) => {
                let name = String::from_utf8_lossy(end.name().as_ref()).into_owned();
                let element = stack
                    .pop()
                    .ok_or_else(|| parse_error(format!("unexpected closing tag </{name}>")))?;
                if element.name != name {
                    return Err(parse_error(format!(
                        "expected </{}>, found </{name}>",
                        element.name
                    )));
                }
                close_element(element, &mut stack, &mut root);
            }
            Event::Text(text) => {
                let decoded = text.decode().map_err(|e| parse_error(e.to_string()))?;
                push_text(&mut stack, &decoded)?;
            }
            Event::CData(data) => {
                let raw = data.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&raw))?;
            }
            Event::GeneralRef(reference) => {
                let name = reference.decode().map_err(|e| parse_error(e.to_string()))?;
                let resolved = resolve_reference(&name)?;
                push_text(&mut stack, &resolved)?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype.
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(parse_error(format!("unclosed element <{}>", open.name)));
    }

    let mut root = root.ok_or_else(|| parse_error("document has no root element".to_string()))?;
    trim_text(&mut root);
    Ok(root)
}

fn parse_error(msg: String) -> PackwatchError {
    PackwatchError::Parse(msg)
}

fn ensure_single_root(root: &Option<Element>, stack: &[Element]) -> Result<()> {
    if root.is_some() && stack.is_empty() {
        return Err(parse_error(
            "found a second element after the root element".to_string(),
        ));
    }
    Ok(())
}

fn open_element(start: &BytesStart<'_>) -> Result<Element> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut attributes = Vec::new();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| parse_error(format!("bad attribute on <{name}>: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let raw = String::from_utf8_lossy(&attr.value);
        let value = unescape(&raw)
            .map_err(|e| parse_error(format!("bad attribute value on <{name}>: {e}")))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        attributes,
        ..Element::default()
    })
}

fn close_element(element: Element, stack: &mut [Element], root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

fn push_text(stack: &mut [Element], text: &str) -> Result<()> {
    match stack.last_mut() {
        Some(current) => {
            current.text.push_str(text);
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(parse_error("text outside of the root element".to_string())),
    }
}

/// Resolve `&name;` / `&#NN;` / `&#xNN;` references.
fn resolve_reference(name: &str) -> Result<Cow<'static, str>> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => num.parse::<u32>(),
        };
        return code
            .ok()
            .and_then(char::from_u32)
            .map(|c| Cow::Owned(c.to_string()))
            .ok_or_else(|| parse_error(format!("invalid character reference &{name};")));
    }

    resolve_predefined_entity(name)
        .map(Cow::Borrowed)
        .ok_or_else(|| parse_error(format!("unknown entity &{name};")))
}

fn trim_text(element: &mut Element) {
    let trimmed = element.text.trim();
    if trimmed.len() != element.text.len() {
        element.text = trimmed.to_string();
    }
    for child in &mut element.children {
        trim_text(child);
    }
}
