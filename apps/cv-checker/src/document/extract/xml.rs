//! Shared helpers for the zip+XML formats (docx, pptx, hwpx).

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::document::extract::ExtractError;

const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Opens a zip-based document. Password-protected OOXML files are stored as
/// OLE containers instead of zips, so that signature is reported as encryption.
pub fn open_archive(path: &Path) -> Result<ZipArchive<File>, ExtractError> {
    reject_ole_container(path)?;
    Ok(ZipArchive::new(File::open(path)?)?)
}

pub fn reject_ole_container(path: &Path) -> Result<(), ExtractError> {
    let mut magic = [0u8; 8];
    let mut file = File::open(path)?;
    if file.read(&mut magic)? == magic.len() && magic == OLE_MAGIC {
        return Err(ExtractError::Encrypted);
    }
    Ok(())
}

pub fn read_entry<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractError> {
    let mut entry = archive.by_name(name)?;
    let mut out = String::new();
    entry.read_to_string(&mut out)?;
    Ok(out)
}

/// Entries named `{prefix}{N}{suffix}`, ordered by `N` numerically.
pub fn numbered_entries<R: Read + Seek>(
    archive: &ZipArchive<R>,
    prefix: &str,
    suffix: &str,
) -> Vec<String> {
    let mut found: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let n = name.strip_prefix(prefix)?.strip_suffix(suffix)?.parse().ok()?;
            Some((n, name.to_string()))
        })
        .collect();
    found.sort();
    found.into_iter().map(|(_, name)| name).collect()
}

/// Element names (local, namespace prefix stripped) that shape paragraph text.
pub struct ParagraphTags {
    /// Elements whose text becomes one fragment each.
    pub paragraph: &'static [&'static [u8]],
    /// Elements whose character data is document text.
    pub text: &'static [u8],
    pub tab: &'static [&'static [u8]],
    pub line_break: &'static [&'static [u8]],
    pub space: &'static [&'static [u8]],
    /// Subtrees ignored entirely.
    pub skip: &'static [&'static [u8]],
}

/// Collects paragraph texts in document order, including empty ones.
///
/// A paragraph nested in another (table cell, text box) closes the text gathered
/// so far in the outer one, so reading order is kept.
pub fn collect_paragraphs(xml: &str, tags: &ParagraphTags) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut stack: Vec<String> = Vec::new();
    let mut text_depth = 0usize;
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if skip_depth > 0 || tags.skip.contains(&name) {
                    skip_depth += 1;
                } else if tags.paragraph.contains(&name) {
                    if let Some(outer) = stack.last_mut() {
                        if !outer.trim().is_empty() {
                            paragraphs.push(std::mem::take(outer));
                        }
                    }
                    stack.push(String::new());
                } else if name == tags.text {
                    text_depth += 1;
                } else {
                    push_marker(&mut stack, name, tags);
                }
            }
            Event::Empty(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if skip_depth > 0 || tags.skip.contains(&name) {
                    continue;
                }
                if tags.paragraph.contains(&name) {
                    paragraphs.push(String::new());
                } else {
                    push_marker(&mut stack, name, tags);
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                let name = name.as_ref();
                if skip_depth > 0 {
                    skip_depth -= 1;
                } else if tags.paragraph.contains(&name) {
                    if let Some(done) = stack.pop() {
                        paragraphs.push(done);
                    }
                } else if name == tags.text {
                    text_depth = text_depth.saturating_sub(1);
                }
            }
            Event::Text(t) => {
                if skip_depth == 0 && text_depth > 0 {
                    if let Some(current) = stack.last_mut() {
                        current.push_str(&t.unescape()?);
                    }
                }
            }
            Event::CData(t) => {
                if skip_depth == 0 && text_depth > 0 {
                    if let Some(current) = stack.last_mut() {
                        current.push_str(&String::from_utf8_lossy(&t));
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_marker(stack: &mut [String], name: &[u8], tags: &ParagraphTags) {
    let Some(current) = stack.last_mut() else {
        return;
    };
    if tags.tab.contains(&name) {
        current.push('\t');
    } else if tags.line_break.contains(&name) {
        current.push('\n');
    } else if tags.space.contains(&name) {
        current.push(' ');
    }
}

/// Attribute `key` (qualified name, e.g. `r:id`) of an element, unescaped.
pub fn attribute(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, ExtractError> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

/// Values of attribute `key` on every `local_name` element, in document order.
pub fn attribute_values(
    xml: &str,
    local_name: &[u8],
    key: &[u8],
) -> Result<Vec<String>, ExtractError> {
    let mut reader = Reader::from_str(xml);
    let mut values = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) if e.local_name().as_ref() == local_name => {
                if let Some(v) = attribute(&e, key)? {
                    values.push(v);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(values)
}
