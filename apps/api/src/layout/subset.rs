//! Glyph subsetting for embedded TrueType fonts.
//!
//! Glyph ids are preserved: outlines of unused glyphs are dropped from `glyf`
//! and `loca` is rewritten around the gaps, so a `CIDToGIDMap /Identity`
//! written for the full font stays valid for the subset. Only the tables a
//! viewer reads from a `FontFile2` program are carried over.

use std::collections::BTreeSet;

use thiserror::Error;
use ttf_parser::{RawFace, Tag};

/// Tables kept in the subset, in the ascending tag order the table directory requires.
const KEPT_TABLES: [&[u8; 4]; 9] = [
    b"cvt ", b"fpgm", b"glyf", b"head", b"hhea", b"hmtx", b"loca", b"maxp", b"prep",
];
const REQUIRED_TABLES: [&[u8; 4]; 6] = [b"glyf", b"head", b"hhea", b"hmtx", b"loca", b"maxp"];

const HEAD_CHECKSUM_ADJUSTMENT: usize = 8;
const HEAD_INDEX_TO_LOC_FORMAT: usize = 50;
const MAXP_NUM_GLYPHS: usize = 4;
const CHECKSUM_MAGIC: u32 = 0xB1B0_AFBA;

// Composite glyph component flags
const ARG_1_AND_2_ARE_WORDS: u16 = 0x0001;
const WE_HAVE_A_SCALE: u16 = 0x0008;
const MORE_COMPONENTS: u16 = 0x0020;
const WE_HAVE_AN_X_AND_Y_SCALE: u16 = 0x0040;
const WE_HAVE_A_TWO_BY_TWO: u16 = 0x0080;

#[derive(Debug, Error)]
pub enum SubsetError {
    #[error("cannot parse font: {0}")]
    Parse(String),

    #[error("font has no '{0}' table")]
    MissingTable(String),

    #[error("malformed '{0}' table")]
    Malformed(&'static str),
}

/// Returns a font program holding only the outlines of `used` glyphs, the
/// `.notdef` glyph and every component those glyphs reference.
pub fn subset_glyphs(data: &[u8], used: &BTreeSet<u16>) -> Result<Vec<u8>, SubsetError> {
    let raw = RawFace::parse(data, 0).map_err(|e| SubsetError::Parse(e.to_string()))?;
    let table = |tag: &[u8; 4]| raw.table(Tag::from_bytes(tag));
    for tag in REQUIRED_TABLES {
        if table(tag).is_none() {
            return Err(SubsetError::MissingTable(
                String::from_utf8_lossy(tag).into_owned(),
            ));
        }
    }
    let head = table(b"head").unwrap_or_default();
    let glyf = table(b"glyf").unwrap_or_default();

    let num_glyphs = read_u16(table(b"maxp").unwrap_or_default(), MAXP_NUM_GLYPHS, "maxp")?;
    let long_offsets = read_u16(head, HEAD_INDEX_TO_LOC_FORMAT, "head")? != 0;
    let offsets = read_loca(table(b"loca").unwrap_or_default(), num_glyphs, long_offsets)?;

    let mut keep: BTreeSet<u16> = used.iter().copied().filter(|g| *g < num_glyphs).collect();
    keep.insert(0);
    let mut pending: Vec<u16> = keep.iter().copied().collect();
    while let Some(gid) = pending.pop() {
        for component in composite_components(glyph_data(glyf, &offsets, gid)?)? {
            if component < num_glyphs && keep.insert(component) {
                pending.push(component);
            }
        }
    }

    let mut new_glyf = Vec::new();
    let mut new_loca = Vec::with_capacity((num_glyphs as usize + 1) * 4);
    for gid in 0..num_glyphs {
        new_loca.extend_from_slice(&(new_glyf.len() as u32).to_be_bytes());
        if keep.contains(&gid) {
            new_glyf.extend_from_slice(glyph_data(glyf, &offsets, gid)?);
            pad4(&mut new_glyf);
        }
    }
    new_loca.extend_from_slice(&(new_glyf.len() as u32).to_be_bytes());

    let mut new_head = head.to_vec();
    new_head[HEAD_CHECKSUM_ADJUSTMENT..HEAD_CHECKSUM_ADJUSTMENT + 4].fill(0);
    new_head[HEAD_INDEX_TO_LOC_FORMAT..HEAD_INDEX_TO_LOC_FORMAT + 2]
        .copy_from_slice(&1u16.to_be_bytes());

    let mut tables: Vec<(&[u8; 4], Vec<u8>)> = Vec::with_capacity(KEPT_TABLES.len());
    for tag in KEPT_TABLES {
        let bytes = match tag {
            b"glyf" => std::mem::take(&mut new_glyf),
            b"loca" => std::mem::take(&mut new_loca),
            b"head" => std::mem::take(&mut new_head),
            _ => match table(tag) {
                Some(bytes) => bytes.to_vec(),
                None => continue,
            },
        };
        tables.push((tag, bytes));
    }

    Ok(write_font(&tables))
}

/// Six-letter subset prefix for `/BaseFont`, derived from the glyph set so
/// different subsets of one font get different names.
pub fn subset_tag(used: &BTreeSet<u16>) -> String {
    let mut hash: u32 = 0x811C_9DC5;
    for gid in used {
        for byte in gid.to_be_bytes() {
            hash = (hash ^ byte as u32).wrapping_mul(0x0100_0193);
        }
    }
    (0..6)
        .map(|_| {
            let letter = (b'A' + (hash % 26) as u8) as char;
            hash /= 26;
            letter
        })
        .collect()
}

fn read_u16(data: &[u8], at: usize, table: &'static str) -> Result<u16, SubsetError> {
    data.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(SubsetError::Malformed(table))
}

fn read_u32(data: &[u8], at: usize, table: &'static str) -> Result<u32, SubsetError> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(SubsetError::Malformed(table))
}

/// Glyph byte offsets into `glyf`, `num_glyphs + 1` entries.
fn read_loca(loca: &[u8], num_glyphs: u16, long_offsets: bool) -> Result<Vec<usize>, SubsetError> {
    (0..=num_glyphs as usize)
        .map(|i| {
            if long_offsets {
                read_u32(loca, i * 4, "loca").map(|v| v as usize)
            } else {
                read_u16(loca, i * 2, "loca").map(|v| v as usize * 2)
            }
        })
        .collect()
}

fn glyph_data<'a>(glyf: &'a [u8], offsets: &[usize], gid: u16) -> Result<&'a [u8], SubsetError> {
    let start = offsets[gid as usize];
    let end = offsets[gid as usize + 1];
    if end < start {
        return Err(SubsetError::Malformed("loca"));
    }
    glyf.get(start..end).ok_or(SubsetError::Malformed("glyf"))
}

/// Glyph ids referenced by a composite glyph. Simple and empty glyphs have none.
fn composite_components(glyph: &[u8]) -> Result<Vec<u16>, SubsetError> {
    if glyph.len() < 10 || (read_u16(glyph, 0, "glyf")? as i16) >= 0 {
        return Ok(Vec::new());
    }

    let mut components = Vec::new();
    let mut at = 10;
    loop {
        let flags = read_u16(glyph, at, "glyf")?;
        components.push(read_u16(glyph, at + 2, "glyf")?);
        at += 4;
        at += if flags & ARG_1_AND_2_ARE_WORDS != 0 { 4 } else { 2 };
        if flags & WE_HAVE_A_SCALE != 0 {
            at += 2;
        } else if flags & WE_HAVE_AN_X_AND_Y_SCALE != 0 {
            at += 4;
        } else if flags & WE_HAVE_A_TWO_BY_TWO != 0 {
            at += 8;
        }
        if flags & MORE_COMPONENTS == 0 {
            break;
        }
    }
    Ok(components)
}

fn pad4(data: &mut Vec<u8>) {
    while data.len() % 4 != 0 {
        data.push(0);
    }
}

fn checksum(data: &[u8]) -> u32 {
    data.chunks(4).fold(0u32, |sum, chunk| {
        let mut word = [0u8; 4];
        word[..chunk.len()].copy_from_slice(chunk);
        sum.wrapping_add(u32::from_be_bytes(word))
    })
}

/// Serializes an sfnt with the given tables, which must be sorted by tag.
fn write_font(tables: &[(&[u8; 4], Vec<u8>)]) -> Vec<u8> {
    let num_tables = tables.len() as u16;
    let mut entry_selector = 0u16;
    while (1u16 << (entry_selector + 1)) <= num_tables {
        entry_selector += 1;
    }
    let search_range = (1u16 << entry_selector) * 16;
    let range_shift = num_tables * 16 - search_range;

    let mut out = Vec::new();
    out.extend_from_slice(&0x0001_0000u32.to_be_bytes());
    for value in [num_tables, search_range, entry_selector, range_shift] {
        out.extend_from_slice(&value.to_be_bytes());
    }

    let mut offset = 12 + 16 * tables.len();
    let mut head_offset = None;
    for (tag, bytes) in tables {
        if *tag == b"head" {
            head_offset = Some(offset);
        }
        out.extend_from_slice(*tag);
        out.extend_from_slice(&checksum(bytes).to_be_bytes());
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        offset += bytes.len().next_multiple_of(4);
    }
    for (_, bytes) in tables {
        out.extend_from_slice(bytes);
        pad4(&mut out);
    }

    if let Some(at) = head_offset {
        let adjustment = CHECKSUM_MAGIC.wrapping_sub(checksum(&out));
        out[at + HEAD_CHECKSUM_ADJUSTMENT..at + HEAD_CHECKSUM_ADJUSTMENT + 4]
            .copy_from_slice(&adjustment.to_be_bytes());
    }
    out
}
