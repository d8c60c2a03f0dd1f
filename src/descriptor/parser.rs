// src/descriptor/parser.rs

//! Reader for the subset of the `.tps` schema that declares source files.
//!
//! A descriptor looks like:
//!
//! ```xml
//! <data version="1.0">
//!     <struct type="Settings">
//!         <key>fileList</key>
//!         <array>
//!             <filename>sprites/hero</filename>
//!             <filename>sprites/ui.png</filename>
//!         </array>
//!     </struct>
//! </data>
//! ```
//!
//! Checks run in a fixed order and the first failure wins, so a document
//! with several problems always reports the same one.

use std::path::{Component, Path, PathBuf};

use tracing::warn;

use super::xml::{parse_document, Element};
use crate::errors::{PackwatchError, Result};

pub const ROOT_TAG: &str = "data";
pub const SUPPORTED_VERSION: &str = "1.0";
pub const SETTINGS_TAG: &str = "struct";
pub const SETTINGS_TYPE: &str = "Settings";
pub const FILE_LIST_KEY: &str = "fileList";

/// Version and declared sources extracted from a descriptor document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDescriptor {
    pub version: Option<String>,
    pub sources: Vec<PathBuf>,
}

/// Parse descriptor contents and return the declared source paths, resolved
/// against `descriptor_dir`.
pub fn parse_source_paths(contents: &str, descriptor_dir: &Path) -> Result<Vec<PathBuf>> {
    parse_descriptor(contents, descriptor_dir).map(|parsed| parsed.sources)
}

/// Parse descriptor contents into version + source paths.
pub fn parse_descriptor(contents: &str, descriptor_dir: &Path) -> Result<ParsedDescriptor> {
    let root = parse_document(contents)?;

    if root.name != ROOT_TAG {
        return Err(schema(format!(
            "Expected root element <{ROOT_TAG}>, found <{}>",
            root.name
        )));
    }

    let version = check_version(&root)?;
    let settings = settings_block(&root)?;
    let sources = file_list(settings, descriptor_dir)?;

    Ok(ParsedDescriptor { version, sources })
}

fn schema(msg: String) -> PackwatchError {
    PackwatchError::Schema(msg)
}

fn check_version(root: &Element) -> Result<Option<String>> {
    match root.attribute("version") {
        None => {
            warn!("No <{ROOT_TAG} version=\"...\"> attribute found");
            Ok(None)
        }
        Some(SUPPORTED_VERSION) => Ok(Some(SUPPORTED_VERSION.to_string())),
        Some(other) => Err(schema(format!(
            "Expected {ROOT_TAG} version \"{SUPPORTED_VERSION}\", found \"{other}\""
        ))),
    }
}

fn settings_block(root: &Element) -> Result<&Element> {
    let settings = root
        .children
        .first()
        .ok_or_else(|| schema(format!("<{ROOT_TAG}> element has no child elements")))?;

    if settings.name != SETTINGS_TAG {
        return Err(schema(format!(
            "<{ROOT_TAG}> first child should be <{SETTINGS_TAG}>, found <{}>",
            settings.name
        )));
    }

    if settings.attribute("type") != Some(SETTINGS_TYPE) {
        return Err(schema(format!(
            "Expected <{SETTINGS_TAG} type=\"{SETTINGS_TYPE}\"> attribute"
        )));
    }

    Ok(settings)
}

/// Scan the settings block for `<key>fileList</key>` followed by `<array>`.
///
/// The current key sticks until the next `<key>`; the first matching array
/// ends the scan.
fn file_list(settings: &Element, descriptor_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut key: Option<&str> = None;

    for element in &settings.children {
        if element.name == "key" {
            key = Some(element.text.as_str());
            continue;
        }

        if key == Some(FILE_LIST_KEY) && element.name == "array" {
            let mut sources = Vec::with_capacity(element.children.len());
            for file in &element.children {
                if file.name != "filename" {
                    return Err(schema(format!("Expected <filename>, found <{}>", file.name)));
                }
                sources.push(resolve_source(descriptor_dir, &file.text));
            }
            return Ok(sources);
        }
    }

    Err(schema(format!(
        "Could not find <key>{FILE_LIST_KEY}</key> followed by <array> of file paths"
    )))
}

/// Join `raw` onto `base` and normalise `.`/`..` lexically.
pub fn resolve_source(base: &Path, raw: &str) -> PathBuf {
    let joined = base.join(raw);
    let mut out = PathBuf::new();

    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `/..` is `/`
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    out
}
