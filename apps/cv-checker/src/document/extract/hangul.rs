//! Hangul word processor: `.hwpx` (zip + OWPML sections) and `.hwp` 5.0
//! (compound file, optionally deflated record streams). One fragment per
//! non-empty paragraph, sections in order.

use std::io::{Cursor, Read};
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use flate2::read::DeflateDecoder;
use tracing::debug;

use crate::document::extract::ole::{self, slice, u32_at};
use crate::document::extract::xml::{self, ParagraphTags};
use crate::document::extract::ExtractError;
use crate::document::normalize::ExtractedDocument;

const HWPX_TAGS: ParagraphTags = ParagraphTags {
    paragraph: &[b"p"],
    text: b"t",
    tab: &[b"tab"],
    line_break: &[b"lineBreak"],
    space: &[b"nbSpace", b"fwSpace"],
    skip: &[],
};

pub fn extract_hwpx(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let mut archive = xml::open_archive(path)?;
    let sections = xml::numbered_entries(&archive, "Contents/section", ".xml");
    if sections.is_empty() {
        return Err(ExtractError::Malformed("no body sections".to_string()));
    }
    debug!("hwpx: {} section(s)", sections.len());

    let mut doc = ExtractedDocument::default();
    for section in sections {
        let body = xml::read_entry(&mut archive, &section)?;
        for paragraph in xml::collect_paragraphs(&body, &HWPX_TAGS)? {
            if !paragraph.trim().is_empty() {
                doc.push(paragraph);
            }
        }
    }
    Ok(doc)
}

const HWP_SIGNATURE: &[u8] = b"HWP Document File";
const PROP_COMPRESSED: u32 = 0x01;
const PROP_PASSWORD: u32 = 0x02;
const PROP_DISTRIBUTION: u32 = 0x04;
const HWPTAG_PARA_TEXT: u32 = 0x10 + 51;

pub fn extract_hwp(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let mut comp = ole::open(path)?;
    let header = ole::read_stream(&mut comp, "/FileHeader")?;
    if !header.starts_with(HWP_SIGNATURE) {
        return Err(ExtractError::Malformed("not an HWP 5.0 document".to_string()));
    }
    let properties = u32_at(&header, 36)?;
    // Distribution documents keep their text in encrypted ViewText streams.
    if properties & (PROP_PASSWORD | PROP_DISTRIBUTION) != 0 {
        return Err(ExtractError::Encrypted);
    }
    let compressed = properties & PROP_COMPRESSED != 0;

    let mut doc = ExtractedDocument::default();
    let mut section = 0;
    loop {
        let name = format!("/BodyText/Section{section}");
        if !comp.is_stream(&name) {
            break;
        }
        let raw = ole::read_stream(&mut comp, &name)?;
        let records = if compressed {
            let mut inflated = Vec::new();
            DeflateDecoder::new(raw.as_slice()).read_to_end(&mut inflated)?;
            inflated
        } else {
            raw
        };
        collect_para_text(&records, &mut doc)?;
        section += 1;
    }
    if section == 0 {
        return Err(ExtractError::Malformed("no body sections".to_string()));
    }
    debug!("hwp: {} section(s), {} paragraph(s)", section, doc.len());
    Ok(doc)
}

/// Walks a section's record stream and decodes every paragraph-text record.
fn collect_para_text(records: &[u8], doc: &mut ExtractedDocument) -> Result<(), ExtractError> {
    let mut cursor = Cursor::new(records);
    while cursor.position() as usize + 4 <= records.len() {
        let header = cursor.read_u32::<LittleEndian>()?;
        let tag = header & 0x3FF;
        let mut size = (header >> 20) as usize;
        if size == 0xFFF {
            size = cursor.read_u32::<LittleEndian>()? as usize;
        }
        let pos = cursor.position() as usize;
        let body = slice(records, pos, size)?;
        if tag == HWPTAG_PARA_TEXT {
            let text = decode_para_text(body);
            if !text.trim().is_empty() {
                doc.push(text);
            }
        }
        cursor.set_position((pos + size) as u64);
    }
    Ok(())
}

/// Decodes paragraph text. Control codes either stand alone (one code unit) or
/// carry seven more units of inline/extended payload that are skipped.
fn decode_para_text(body: &[u8]) -> String {
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(LittleEndian::read_u16)
        .collect();

    let mut plain = Vec::with_capacity(units.len());
    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        match unit {
            9 => {
                plain.push(u16::from(b'\t'));
                i += 8;
            }
            1..=8 | 11 | 12 | 14..=23 => i += 8,
            10 => {
                plain.push(u16::from(b'\n'));
                i += 1;
            }
            24 => {
                plain.push(u16::from(b'-'));
                i += 1;
            }
            30 | 31 => {
                plain.push(u16::from(b' '));
                i += 1;
            }
            0..=31 => i += 1,
            _ => {
                plain.push(unit);
                i += 1;
            }
        }
    }

    char::decode_utf16(plain)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
