//! Font selection and fallback.
//!
//! A `FontSet` is resolved once (normally at startup) and then shared by every
//! layout engine. The family choice lives on the instance; nothing global is
//! mutated when assets are missing.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};
use ttf_parser::{name_id, Face, GlyphId};

use crate::layout::font_metrics::{
    standard_metrics, win_ansi_code, FontFamily, FontWeight, StandardMetrics,
};

pub const REGULAR_FONT_FILE: &str = "DejaVuSans.ttf";
pub const BOLD_FONT_FILE: &str = "DejaVuSans-Bold.ttf";

#[derive(Debug, Error)]
pub enum FontLoadError {
    #[error("cannot read font file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse font file {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("font file {path} has no Unicode cmap")]
    NoUnicodeCmap { path: PathBuf },
}

// ────────────────────────────────────────────────────────────────────────────
// TrueType font
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct GlyphMetric {
    gid: u16,
    advance: u16,
}

/// A parsed TrueType font, kept in memory for embedding.
///
/// The cmap and advance widths are flattened into a map at load time so that
/// measuring never has to re-parse the face.
#[derive(Debug)]
pub struct TrueTypeFont {
    pub postscript_name: String,
    pub data: Vec<u8>,
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub cap_height: i16,
    /// x_min, y_min, x_max, y_max in font units.
    pub bbox: [i16; 4],
    glyphs: HashMap<char, GlyphMetric>,
    notdef_advance: u16,
}

impl TrueTypeFont {
    pub fn load(path: &Path) -> Result<Self, FontLoadError> {
        let data = std::fs::read(path).map_err(|source| FontLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(data, path)
    }

    fn from_bytes(data: Vec<u8>, path: &Path) -> Result<Self, FontLoadError> {
        let face = Face::parse(&data, 0).map_err(|e| FontLoadError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut glyphs = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|cp| {
                    let (Some(ch), Some(gid)) = (char::from_u32(cp), subtable.glyph_index(cp))
                    else {
                        return;
                    };
                    let advance = face.glyph_hor_advance(gid).unwrap_or(0);
                    glyphs.entry(ch).or_insert(GlyphMetric {
                        gid: gid.0,
                        advance,
                    });
                });
            }
        }
        if glyphs.is_empty() {
            return Err(FontLoadError::NoUnicodeCmap {
                path: path.to_path_buf(),
            });
        }

        let fallback_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("EmbeddedFont");
        let postscript_name = face
            .names()
            .into_iter()
            .find(|n| n.name_id == name_id::POST_SCRIPT_NAME)
            .and_then(|n| n.to_string())
            .map(|name| sanitize_font_name(&name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| sanitize_font_name(fallback_name));

        let units_per_em = face.units_per_em().max(1);
        let ascender = face.ascender();
        let descender = face.descender();
        let cap_height = face.capital_height().unwrap_or(ascender);
        let rect = face.global_bounding_box();
        let bbox = [rect.x_min, rect.y_min, rect.x_max, rect.y_max];
        let notdef_advance = face.glyph_hor_advance(GlyphId(0)).unwrap_or(units_per_em / 2);
        drop(face);

        Ok(Self {
            postscript_name,
            data,
            units_per_em,
            ascender,
            descender,
            cap_height,
            bbox,
            glyphs,
            notdef_advance,
        })
    }

    fn glyph(&self, c: char) -> GlyphMetric {
        self.glyphs.get(&c).copied().unwrap_or(GlyphMetric {
            gid: 0,
            advance: self.notdef_advance,
        })
    }

    /// Converts font units to 1/1000 em, the unit PDF width arrays use.
    pub fn to_pdf_units(&self, value: i32) -> i64 {
        (value as i64 * 1000) / self.units_per_em as i64
    }

    pub fn measure_str(&self, text: &str, size_pt: f32) -> f32 {
        let units: u32 = text.chars().map(|c| self.glyph(c).advance as u32).sum();
        units as f32 * size_pt / self.units_per_em as f32
    }

    /// Advance width of the glyph drawn for `c`, in 1/1000 em.
    pub fn char_width(&self, c: char) -> i64 {
        self.to_pdf_units(self.glyph(c).advance as i32)
    }
}

fn sanitize_font_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Font faces
// ────────────────────────────────────────────────────────────────────────────

/// Text converted into the byte form a PDF `Tj` operator expects for a face.
#[derive(Debug, Clone, Default)]
pub struct EncodedText {
    pub bytes: Vec<u8>,
    /// Glyph ids drawn, with the character each one stands for. Empty for base-14 faces.
    pub glyphs: Vec<(u16, char)>,
    /// Characters the face could not represent and replaced.
    pub substituted: usize,
}

#[derive(Debug, Clone)]
pub enum FontFace {
    Standard(&'static StandardMetrics),
    TrueType(Arc<TrueTypeFont>),
}

impl FontFace {
    pub fn measure_str(&self, text: &str, size_pt: f32) -> f32 {
        match self {
            FontFace::Standard(metrics) => metrics.measure_str(text, size_pt),
            FontFace::TrueType(font) => font.measure_str(text, size_pt),
        }
    }

    /// Encodes `text` for this face: one WinAnsi byte per char for base-14
    /// faces, big-endian 16-bit glyph ids for embedded (Identity-H) faces.
    pub fn encode(&self, text: &str) -> EncodedText {
        let mut encoded = EncodedText::default();
        match self {
            FontFace::Standard(_) => {
                for c in text.chars() {
                    match win_ansi_code(c) {
                        Some(code) => encoded.bytes.push(code),
                        None => {
                            encoded.bytes.push(b'?');
                            encoded.substituted += 1;
                        }
                    }
                }
            }
            FontFace::TrueType(font) => {
                for c in text.chars() {
                    let glyph = font.glyph(c);
                    if glyph.gid == 0 {
                        encoded.substituted += 1;
                    }
                    encoded.bytes.extend_from_slice(&glyph.gid.to_be_bytes());
                    encoded.glyphs.push((glyph.gid, c));
                }
            }
        }
        encoded
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Font set
// ────────────────────────────────────────────────────────────────────────────

/// The regular/bold pair a document is rendered with.
#[derive(Debug, Clone)]
pub struct FontSet {
    family: FontFamily,
    regular: FontFace,
    bold: FontFace,
}

impl FontSet {
    /// Loads DejaVu Sans from `font_dir`, degrading to Helvetica if either
    /// weight is missing or unreadable. Never fails.
    pub fn load(font_dir: &Path) -> Self {
        let regular = TrueTypeFont::load(&font_dir.join(REGULAR_FONT_FILE));
        let bold = TrueTypeFont::load(&font_dir.join(BOLD_FONT_FILE));

        match (regular, bold) {
            (Ok(regular), Ok(bold)) => {
                info!(
                    font_dir = %font_dir.display(),
                    regular = %regular.postscript_name,
                    bold = %bold.postscript_name,
                    "Using embedded DejaVu Sans fonts"
                );
                Self {
                    family: FontFamily::DejaVuSans,
                    regular: FontFace::TrueType(Arc::new(regular)),
                    bold: FontFace::TrueType(Arc::new(bold)),
                }
            }
            (regular, bold) => {
                for err in [regular.err(), bold.err()].into_iter().flatten() {
                    warn!(error = %err, "Font asset unavailable");
                }
                warn!(
                    font_dir = %font_dir.display(),
                    "Falling back to Helvetica; non-Latin text will not render correctly"
                );
                Self::fallback()
            }
        }
    }

    /// The base-14 Helvetica pair. Always available.
    pub fn fallback() -> Self {
        Self {
            family: FontFamily::Helvetica,
            regular: FontFace::Standard(standard_metrics(FontWeight::Regular)),
            bold: FontFace::Standard(standard_metrics(FontWeight::Bold)),
        }
    }

    pub fn family(&self) -> FontFamily {
        self.family
    }

    pub fn face(&self, weight: FontWeight) -> &FontFace {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }

    pub fn measure(&self, text: &str, weight: FontWeight, size_pt: f32) -> f32 {
        self.face(weight).measure_str(text, size_pt)
    }
}
