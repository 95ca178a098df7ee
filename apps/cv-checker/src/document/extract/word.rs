//! Word documents: `.docx` paragraphs from `word/document.xml`, `.doc` paragraphs
//! from the Word 97 piece table. Empty paragraphs are dropped.

use std::path::Path;

use tracing::debug;

use crate::document::extract::ole::{self, cp1252, slice, u16_at, u32_at, utf16le};
use crate::document::extract::xml::{self, ParagraphTags};
use crate::document::extract::ExtractError;
use crate::document::normalize::ExtractedDocument;

const DOCX_TAGS: ParagraphTags = ParagraphTags {
    paragraph: &[b"p"],
    text: b"t",
    tab: &[b"tab", b"ptab"],
    line_break: &[b"br", b"cr"],
    space: &[],
    // Text boxes are stored twice: DrawingML under `mc:Choice`, a VML copy under `mc:Fallback`.
    skip: &[b"tabs", b"instrText", b"delText", b"Fallback"],
};

pub fn extract_docx(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let mut archive = xml::open_archive(path)?;
    let body = xml::read_entry(&mut archive, "word/document.xml")?;
    let paragraphs = xml::collect_paragraphs(&body, &DOCX_TAGS)?;
    debug!("docx: {} paragraph(s) before filtering", paragraphs.len());
    Ok(non_empty(paragraphs))
}

pub fn extract_doc(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let mut comp = ole::open(path)?;
    let word = ole::read_stream(&mut comp, "/WordDocument")?;
    let fib = Fib::parse(&word)?;
    if fib.encrypted {
        return Err(ExtractError::Encrypted);
    }
    let table_name = if fib.uses_1table { "/1Table" } else { "/0Table" };
    let table = ole::read_stream(&mut comp, table_name)?;

    let text = piece_table_text(&word, &table, &fib)?;
    let paragraphs = split_paragraphs(&text);
    debug!("doc: {} paragraph(s) before filtering", paragraphs.len());
    Ok(non_empty(paragraphs))
}

fn non_empty(paragraphs: Vec<String>) -> ExtractedDocument {
    ExtractedDocument::new(
        paragraphs
            .into_iter()
            .filter(|p| !p.trim().is_empty())
            .collect(),
    )
}

const WORD_IDENT: u16 = 0xA5EC;
const F_ENCRYPTED: u16 = 0x0100;
const F_WHICH_TBL_STM: u16 = 0x0200;
/// Index of the fcClx/lcbClx pair inside FibRgFcLcb97.
const CLX_PAIR_INDEX: usize = 33;

/// The few File Information Block fields needed to reach the main text.
#[derive(Debug)]
struct Fib {
    encrypted: bool,
    uses_1table: bool,
    ccp_text: usize,
    fc_clx: usize,
    lcb_clx: usize,
}

impl Fib {
    fn parse(word: &[u8]) -> Result<Self, ExtractError> {
        if u16_at(word, 0)? != WORD_IDENT {
            return Err(ExtractError::Malformed(
                "not a Word 97-2003 document".to_string(),
            ));
        }
        let flags = u16_at(word, 0x0A)?;

        let csw = u16_at(word, 0x20)? as usize;
        let cslw_at = 0x22 + csw * 2;
        let cslw = u16_at(word, cslw_at)? as usize;
        let rg_lw = cslw_at + 2;
        if cslw < 4 {
            return Err(ExtractError::Malformed("FIB too short".to_string()));
        }
        let ccp_text = u32_at(word, rg_lw + 12)? as usize;

        let cb_at = rg_lw + cslw * 4;
        let cb_rg_fc_lcb = u16_at(word, cb_at)? as usize;
        if cb_rg_fc_lcb <= CLX_PAIR_INDEX {
            return Err(ExtractError::Malformed("FIB has no piece table".to_string()));
        }
        let clx_at = cb_at + 2 + CLX_PAIR_INDEX * 8;

        Ok(Self {
            encrypted: flags & F_ENCRYPTED != 0,
            uses_1table: flags & F_WHICH_TBL_STM != 0,
            ccp_text,
            fc_clx: u32_at(word, clx_at)? as usize,
            lcb_clx: u32_at(word, clx_at + 4)? as usize,
        })
    }
}

/// Concatenates the pieces covering the main document story (the first `ccp_text` characters).
fn piece_table_text(word: &[u8], table: &[u8], fib: &Fib) -> Result<String, ExtractError> {
    let clx = slice(table, fib.fc_clx, fib.lcb_clx)?;

    // Skip Prc entries (property modifiers) until the Pcdt.
    let mut pos = 0;
    let plc = loop {
        match clx.get(pos) {
            Some(0x01) => {
                let cb = u16_at(clx, pos + 1)? as i16;
                pos += 3 + cb.max(0) as usize;
            }
            Some(0x02) => {
                let lcb = u32_at(clx, pos + 1)? as usize;
                break slice(clx, pos + 5, lcb)?;
            }
            _ => return Err(ExtractError::Malformed("piece table not found".to_string())),
        }
    };

    if plc.len() < 4 || (plc.len() - 4) % 12 != 0 {
        return Err(ExtractError::Malformed("bad piece table size".to_string()));
    }
    let pieces = (plc.len() - 4) / 12;

    let mut text = String::new();
    let mut remaining = fib.ccp_text;
    for i in 0..pieces {
        if remaining == 0 {
            break;
        }
        let cp_start = u32_at(plc, i * 4)? as usize;
        let cp_end = u32_at(plc, (i + 1) * 4)? as usize;
        let count = cp_end.saturating_sub(cp_start).min(remaining);

        let fc_raw = u32_at(plc, (pieces + 1) * 4 + i * 8 + 2)?;
        let fc = (fc_raw & 0x3FFF_FFFF) as usize;
        if fc_raw & 0x4000_0000 != 0 {
            text.push_str(&cp1252(slice(word, fc / 2, count)?));
        } else {
            text.push_str(&utf16le(slice(word, fc, count * 2)?));
        }
        remaining -= count;
    }
    Ok(text)
}

/// Splits Word's character stream into paragraphs, dropping field instructions
/// and non-printing control characters.
fn split_paragraphs(text: &str) -> Vec<String> {
    // One entry per open field: true while still inside its instruction part.
    let mut fields: Vec<bool> = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        match c {
            '\u{13}' => fields.push(true),
            '\u{14}' => {
                if let Some(in_instruction) = fields.last_mut() {
                    *in_instruction = false;
                }
            }
            '\u{15}' => {
                fields.pop();
            }
            _ if fields.iter().any(|&instr| instr) => {}
            '\r' | '\u{7}' | '\u{c}' => paragraphs.push(std::mem::take(&mut current)),
            '\u{b}' => current.push('\n'),
            '\u{1e}' => current.push('-'),
            '\t' => current.push('\t'),
            c if (c as u32) < 0x20 => {}
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }
    paragraphs
}
