//! PowerPoint: one fragment per text run, slides in presentation order.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};
use tracing::debug;

use crate::document::extract::ole::{self, cp1252, slice, u32_at, utf16le};
use crate::document::extract::xml::{self, ParagraphTags};
use crate::document::extract::ExtractError;
use crate::document::normalize::ExtractedDocument;

/// DrawingML runs and fields each become a fragment.
const RUN_TAGS: ParagraphTags = ParagraphTags {
    paragraph: &[b"r", b"fld"],
    text: b"t",
    tab: &[],
    line_break: &[],
    space: &[],
    skip: &[],
};

pub fn extract_pptx(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let mut archive = xml::open_archive(path)?;
    let slides = slide_order(&mut archive)?;
    debug!("pptx: {} slide(s)", slides.len());

    let mut doc = ExtractedDocument::default();
    for slide in slides {
        let body = xml::read_entry(&mut archive, &slide)?;
        for run in xml::collect_paragraphs(&body, &RUN_TAGS)? {
            if !run.is_empty() {
                doc.push(run);
            }
        }
    }
    Ok(doc)
}

/// Slide part names in the order of the presentation's slide-id list, falling
/// back to `slideN.xml` numbering when the list cannot be resolved.
fn slide_order<R: std::io::Read + std::io::Seek>(
    archive: &mut zip::ZipArchive<R>,
) -> Result<Vec<String>, ExtractError> {
    let fallback = xml::numbered_entries(archive, "ppt/slides/slide", ".xml");

    let (Ok(presentation), Ok(rels)) = (
        xml::read_entry(archive, "ppt/presentation.xml"),
        xml::read_entry(archive, "ppt/_rels/presentation.xml.rels"),
    ) else {
        return Ok(fallback);
    };

    let ids = xml::attribute_values(&presentation, b"sldId", b"r:id")?;
    let targets: HashMap<String, String> = xml::attribute_values(&rels, b"Relationship", b"Id")?
        .into_iter()
        .zip(xml::attribute_values(&rels, b"Relationship", b"Target")?)
        .collect();

    let ordered: Option<Vec<String>> = ids
        .iter()
        .map(|id| targets.get(id).map(|t| part_name("ppt", t)))
        .collect();
    match ordered {
        Some(slides) if !slides.is_empty() => Ok(slides),
        _ => Ok(fallback),
    }
}

/// Resolves a relationship target relative to the `ppt/` folder.
fn part_name(base: &str, target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("{base}/{}", target.trim_start_matches("./")),
    }
}

const RT_DOCUMENT: u16 = 0x03E8;
const RT_SLIDE: u16 = 0x03EE;
const RT_SLIDE_PERSIST_ATOM: u16 = 0x03F3;
const RT_SLIDE_LIST_WITH_TEXT: u16 = 0x0FF0;
const RT_TEXT_CHARS_ATOM: u16 = 0x0FA0;
const RT_TEXT_BYTES_ATOM: u16 = 0x0FA8;
const RT_PERSIST_DIRECTORY_ATOM: u16 = 0x1772;

/// Deepest container nesting accepted inside a slide.
const MAX_DEPTH: usize = 64;

pub fn extract_ppt(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    let mut comp = ole::open(path)?;
    if comp.is_stream("/EncryptedSummary") {
        return Err(ExtractError::Encrypted);
    }
    let stream = ole::read_stream(&mut comp, "/PowerPoint Document")?;

    let doc = slides_text(&stream)?;
    debug!("ppt: {} text atom(s)", doc.len());
    Ok(doc)
}

/// One record header plus its body. `offset` is where the header starts in
/// the slice the record was read from.
struct Record<'a> {
    rec_type: u16,
    instance: u16,
    container: bool,
    offset: usize,
    body: &'a [u8],
}

/// Sibling records laid out back to back in `data`.
fn records(data: &[u8]) -> Result<Vec<Record<'_>>, ExtractError> {
    let mut out = Vec::new();
    let mut cursor = Cursor::new(data);
    while cursor.position() as usize + 8 <= data.len() {
        let offset = cursor.position() as usize;
        let ver_instance = cursor.read_u16::<LittleEndian>()?;
        let rec_type = cursor.read_u16::<LittleEndian>()?;
        let len = cursor.read_u32::<LittleEndian>()? as usize;
        let body = slice(data, offset + 8, len)?;
        out.push(Record {
            rec_type,
            instance: ver_instance >> 4,
            container: ver_instance & 0x000F == 0x000F,
            offset,
            body,
        });
        cursor.set_position((offset + 8 + len) as u64);
    }
    Ok(out)
}

/// Placeholder text listed for one slide in the document's slide list.
struct SlideEntry {
    persist_id: Option<u32>,
    texts: Vec<String>,
}

/// Text of every slide in presentation order. Each slide contributes its
/// placeholder text from the slide list, then the text drawn on the slide
/// itself (text boxes, shapes, tables). Masters, notes and handouts are not read.
fn slides_text(stream: &[u8]) -> Result<ExtractedDocument, ExtractError> {
    let top = records(stream)?;

    let mut persist: HashMap<u32, usize> = HashMap::new();
    for record in top.iter().filter(|r| r.rec_type == RT_PERSIST_DIRECTORY_ATOM) {
        read_persist_directory(record.body, &mut persist)?;
    }
    let slides: Vec<&Record<'_>> = top
        .iter()
        .filter(|r| r.container && r.rec_type == RT_SLIDE)
        .collect();
    let entries = match top.iter().find(|r| r.container && r.rec_type == RT_DOCUMENT) {
        Some(document) => slide_list(document.body)?,
        None => Vec::new(),
    };

    let mut doc = ExtractedDocument::default();
    let mut used = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        for text in &entry.texts {
            doc.push(text.clone());
        }
        // Without a persist directory, slide containers are paired by position.
        let slide = if persist.is_empty() {
            slides.get(i).copied()
        } else {
            entry
                .persist_id
                .and_then(|id| persist.get(&id))
                .and_then(|offset| slides.iter().find(|s| s.offset == *offset).copied())
        };
        if let Some(slide) = slide {
            used.insert(slide.offset);
            drawn_text(slide.body, 1, &mut doc)?;
        }
    }
    if persist.is_empty() {
        for slide in slides.iter().filter(|s| !used.contains(&s.offset)) {
            drawn_text(slide.body, 1, &mut doc)?;
        }
    }
    Ok(doc)
}

/// Splits the slide list (`SlideListWithText`, instance 0) into per-slide
/// entries, each opened by a `SlidePersistAtom`.
fn slide_list(document: &[u8]) -> Result<Vec<SlideEntry>, ExtractError> {
    let mut entries: Vec<SlideEntry> = Vec::new();
    let lists = records(document)?;
    let Some(list) = lists
        .iter()
        .find(|r| r.container && r.rec_type == RT_SLIDE_LIST_WITH_TEXT && r.instance == 0)
    else {
        return Ok(entries);
    };

    for record in records(list.body)? {
        if record.rec_type == RT_SLIDE_PERSIST_ATOM {
            entries.push(SlideEntry {
                persist_id: Some(u32_at(record.body, 0)?),
                texts: Vec::new(),
            });
        } else if let Some(text) = atom_text(&record) {
            if entries.is_empty() {
                entries.push(SlideEntry {
                    persist_id: None,
                    texts: Vec::new(),
                });
            }
            if let Some(entry) = entries.last_mut() {
                entry.texts.push(text);
            }
        }
    }
    Ok(entries)
}

/// Persist directory entries: a `u32` holding the first persist id (low 20 bits)
/// and a count (high 12 bits), followed by that many stream offsets.
/// Later directories override earlier ones, as incremental saves append.
fn read_persist_directory(
    body: &[u8],
    persist: &mut HashMap<u32, usize>,
) -> Result<(), ExtractError> {
    let mut cursor = Cursor::new(body);
    while (cursor.position() as usize) + 4 <= body.len() {
        let info = cursor.read_u32::<LittleEndian>()?;
        let first = info & 0x000F_FFFF;
        let count = info >> 20;
        for k in 0..count {
            let offset = cursor.read_u32::<LittleEndian>()?;
            persist.insert(first + k, offset as usize);
        }
    }
    Ok(())
}

/// Text atoms anywhere under a slide container, in stream order.
fn drawn_text(data: &[u8], depth: usize, doc: &mut ExtractedDocument) -> Result<(), ExtractError> {
    for record in records(data)? {
        if record.container {
            if depth >= MAX_DEPTH {
                return Err(ExtractError::Malformed(format!(
                    "records nested deeper than {MAX_DEPTH} levels"
                )));
            }
            drawn_text(record.body, depth + 1, doc)?;
        } else if let Some(text) = atom_text(&record) {
            doc.push(text);
        }
    }
    Ok(())
}

/// Decoded text of a text atom, with paragraph and vertical-tab breaks as `\n`.
/// Empty atoms give `None`.
fn atom_text(record: &Record<'_>) -> Option<String> {
    let text = match record.rec_type {
        RT_TEXT_CHARS_ATOM => utf16le(record.body),
        RT_TEXT_BYTES_ATOM => cp1252(record.body),
        _ => return None,
    };
    let text = text.replace(['\r', '\u{b}'], "\n");
    (!text.is_empty()).then_some(text)
}
