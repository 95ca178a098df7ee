//! OLE compound-file access and little-endian readers for the legacy binary formats.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use cfb::CompoundFile;

use crate::document::extract::ExtractError;

pub fn open(path: &Path) -> Result<CompoundFile<File>, ExtractError> {
    cfb::open(path).map_err(|e| ExtractError::Malformed(format!("not an OLE compound file: {e}")))
}

pub fn read_stream(comp: &mut CompoundFile<File>, name: &str) -> Result<Vec<u8>, ExtractError> {
    if !comp.is_stream(name) {
        return Err(ExtractError::Malformed(format!("missing stream {name}")));
    }
    let mut data = Vec::new();
    comp.open_stream(name)?.read_to_end(&mut data)?;
    Ok(data)
}

pub fn u16_at(data: &[u8], offset: usize) -> Result<u16, ExtractError> {
    Ok(slice(data, offset, 2)?.read_u16::<LittleEndian>()?)
}

pub fn u32_at(data: &[u8], offset: usize) -> Result<u32, ExtractError> {
    Ok(slice(data, offset, 4)?.read_u32::<LittleEndian>()?)
}

pub fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ExtractError> {
    offset
        .checked_add(len)
        .and_then(|end| data.get(offset..end))
        .ok_or_else(|| truncated(offset))
}

/// Decodes UTF-16LE, replacing unpaired surrogates.
pub fn utf16le(bytes: &[u8]) -> String {
    let units = bytes.chunks_exact(2).map(LittleEndian::read_u16);
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

/// Windows-1252 code points for bytes 0x80..=0x9F; the rest map to Latin-1.
const CP1252_HIGH: [char; 32] = [
    '€', '\u{81}', '‚', 'ƒ', '„', '…', '†', '‡', 'ˆ', '‰', 'Š', '‹', 'Œ', '\u{8D}', 'Ž', '\u{8F}',
    '\u{90}', '‘', '’', '“', '”', '•', '–', '—', '˜', '™', 'š', '›', 'œ', '\u{9D}', 'ž', 'Ÿ',
];

pub fn cp1252(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => b as char,
        })
        .collect()
}

fn truncated(offset: usize) -> ExtractError {
    ExtractError::Malformed(format!("record truncated at offset {offset:#x}"))
}
