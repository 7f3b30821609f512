//! PDF serialization of laid-out pages using `lopdf`.
//!
//! The writer owns the object graph for one document: a shared resources
//! dictionary, one flate-compressed content stream per page, and one font
//! resource per weight that was actually drawn. Base-14 faces are referenced
//! by name; TrueType faces are subset to the drawn glyphs and embedded as
//! `Type0`/`CIDFontType2` with glyph ids as CIDs, so every drawn glyph also
//! gets a `W` entry and a `ToUnicode` mapping.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use chrono::NaiveDate;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use tracing::{debug, warn};

use crate::layout::canvas::{DrawOp, PageCanvas, TextRun};
use crate::layout::font_metrics::FontWeight;
use crate::layout::fonts::{FontFace, FontSet, TrueTypeFont};
use crate::layout::geometry::PageGeometry;
use crate::layout::output::RenderedOutput;
use crate::layout::subset::{subset_glyphs, subset_tag};
use crate::layout::LayoutError;

const WEIGHTS: [FontWeight; 2] = [FontWeight::Regular, FontWeight::Bold];
const RULE_GRAY: f32 = 0.6;

/// Document-level metadata written to the trailer's `/Info` dictionary.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub title: String,
    pub creation_date: NaiveDate,
}

fn weight_slot(weight: FontWeight) -> usize {
    match weight {
        FontWeight::Regular => 0,
        FontWeight::Bold => 1,
    }
}

fn resource_name(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Regular => "F1",
        FontWeight::Bold => "F2",
    }
}

/// Serializes `pages` into a complete PDF document.
pub fn write_pdf(
    pages: &[PageCanvas],
    geometry: &PageGeometry,
    fonts: &FontSet,
    info: &DocumentInfo,
) -> Result<RenderedOutput, LayoutError> {
    let mut writer = PdfWriter::new(geometry, fonts);
    for page in pages {
        writer.add_page(page)?;
    }
    writer.finish(info)
}

struct PdfWriter<'a> {
    document: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    font_ids: [ObjectId; 2],
    /// Glyph id → character, per weight. Only filled for TrueType faces.
    used_glyphs: [BTreeMap<u16, char>; 2],
    used_weights: [bool; 2],
    substituted: usize,
    page_ids: Vec<ObjectId>,
    fonts: &'a FontSet,
    page_width: f32,
    page_height: f32,
}

impl<'a> PdfWriter<'a> {
    fn new(geometry: &PageGeometry, fonts: &'a FontSet) -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();
        let resources_id = document.new_object_id();
        let font_ids = [document.new_object_id(), document.new_object_id()];

        Self {
            document,
            pages_id,
            resources_id,
            font_ids,
            used_glyphs: [BTreeMap::new(), BTreeMap::new()],
            used_weights: [false, false],
            substituted: 0,
            page_ids: Vec::new(),
            fonts,
            page_width: geometry.width_pt(),
            page_height: geometry.height_pt(),
        }
    }

    fn add_page(&mut self, page: &PageCanvas) -> Result<(), LayoutError> {
        let mut content = Content { operations: vec![] };

        for op in &page.ops {
            match op {
                DrawOp::Text(run) => self.draw_text(&mut content, run),
                DrawOp::Rule { x1, x2, y, thickness } => {
                    let pdf_y = self.page_height - y;
                    content.operations.extend([
                        Operation::new("q", vec![]),
                        Operation::new("G", vec![RULE_GRAY.into()]),
                        Operation::new("w", vec![(*thickness).into()]),
                        Operation::new("m", vec![(*x1).into(), pdf_y.into()]),
                        Operation::new("l", vec![(*x2).into(), pdf_y.into()]),
                        Operation::new("S", vec![]),
                        Operation::new("Q", vec![]),
                    ]);
                }
            }
        }

        let compressed = compress(&content.encode()?)?;
        let content_id = self
            .document
            .add_object(Stream::new(dictionary! { "Filter" => "FlateDecode" }, compressed));

        let page_id = self.document.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), self.page_width.into(), self.page_height.into()],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        });
        self.page_ids.push(page_id);
        Ok(())
    }

    fn draw_text(&mut self, content: &mut Content, run: &TextRun) {
        let fonts = self.fonts;
        let slot = weight_slot(run.weight);
        let face = fonts.face(run.weight);
        let encoded = face.encode(&run.text);

        self.used_weights[slot] = true;
        self.substituted += encoded.substituted;
        for (gid, ch) in &encoded.glyphs {
            self.used_glyphs[slot].entry(*gid).or_insert(*ch);
        }

        let format = match face {
            FontFace::Standard(_) => StringFormat::Literal,
            FontFace::TrueType(_) => StringFormat::Hexadecimal,
        };
        let pdf_y = self.page_height - run.baseline_y;

        content.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![resource_name(run.weight).into(), run.size_pt.into()]),
            Operation::new("Td", vec![run.x.into(), pdf_y.into()]),
            Operation::new("Tj", vec![Object::String(encoded.bytes, format)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn finish(mut self, info: &DocumentInfo) -> Result<RenderedOutput, LayoutError> {
        let fonts = self.fonts;
        let mut font_resources = Dictionary::new();
        for weight in WEIGHTS {
            let slot = weight_slot(weight);
            if !self.used_weights[slot] {
                continue;
            }
            let font_id = self.font_ids[slot];
            let font_dict = match fonts.face(weight) {
                FontFace::Standard(metrics) => dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => Object::Name(metrics.base_font.as_bytes().to_vec()),
                    "Encoding" => "WinAnsiEncoding",
                },
                FontFace::TrueType(font) => {
                    let used = std::mem::take(&mut self.used_glyphs[slot]);
                    self.embed_truetype(font, &used)?
                }
            };
            self.document
                .objects
                .insert(font_id, Object::Dictionary(font_dict));
            font_resources.set(resource_name(weight), font_id);
        }

        if self.substituted > 0 {
            warn!(
                substituted_chars = self.substituted,
                family = ?fonts.family(),
                "Characters outside the font's coverage were replaced"
            );
        }

        self.document.objects.insert(
            self.resources_id,
            Object::Dictionary(dictionary! { "Font" => font_resources }),
        );

        let kids: Vec<Object> = self.page_ids.iter().map(|id| Object::from(*id)).collect();
        let page_count = self.page_ids.len() as i64;
        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => page_count,
            }),
        );

        let catalog_id = self
            .document
            .add_object(dictionary! { "Type" => "Catalog", "Pages" => self.pages_id });
        self.document.trailer.set("Root", catalog_id);

        let info_id = self.document.add_object(dictionary! {
            "Title" => Object::string_literal(info.title.as_str()),
            "Producer" => Object::string_literal(concat!("resume-api ", env!("CARGO_PKG_VERSION"))),
            "CreationDate" => Object::string_literal(
                info.creation_date.format("D:%Y%m%d000000").to_string()
            ),
        });
        self.document.trailer.set("Info", info_id);

        let mut buffer = Vec::new();
        self.document.save_to(&mut buffer)?;
        debug!(pages = page_count, bytes = buffer.len(), "PDF serialized");
        Ok(RenderedOutput::ByteBuffer(buffer))
    }

    /// Adds the descendant font, descriptor, font file and ToUnicode objects
    /// and returns the `Type0` dictionary that ties them together.
    fn embed_truetype(
        &mut self,
        font: &TrueTypeFont,
        used: &BTreeMap<u16, char>,
    ) -> Result<Dictionary, LayoutError> {
        let glyph_ids: BTreeSet<u16> = used.keys().copied().collect();
        let (program, name) = match subset_glyphs(&font.data, &glyph_ids) {
            Ok(program) => {
                debug!(
                    font = %font.postscript_name,
                    glyphs = glyph_ids.len(),
                    full_bytes = font.data.len(),
                    subset_bytes = program.len(),
                    "Font subset"
                );
                let name = format!("{}+{}", subset_tag(&glyph_ids), font.postscript_name);
                (program, name)
            }
            Err(err) => {
                warn!(
                    error = %err,
                    font = %font.postscript_name,
                    "Font subsetting failed; embedding the whole font"
                );
                (font.data.clone(), font.postscript_name.clone())
            }
        };
        let base_font = Object::Name(name.into_bytes());

        let font_file = Stream::new(
            dictionary! {
                "Length1" => program.len() as i64,
                "Filter" => "FlateDecode",
            },
            compress(&program)?,
        );
        let font_file_id = self.document.add_object(font_file);

        let bbox: Vec<Object> = font
            .bbox
            .iter()
            .map(|v| Object::Integer(font.to_pdf_units(*v as i32)))
            .collect();
        let descriptor_id = self.document.add_object(dictionary! {
            "Type" => "FontDescriptor",
            "FontName" => base_font.clone(),
            // Nonsymbolic
            "Flags" => 32,
            "FontBBox" => bbox,
            "ItalicAngle" => 0,
            "Ascent" => font.to_pdf_units(font.ascender as i32),
            "Descent" => font.to_pdf_units(font.descender as i32),
            "CapHeight" => font.to_pdf_units(font.cap_height as i32),
            "StemV" => 80,
            "FontFile2" => font_file_id,
        });

        let mut widths = Vec::with_capacity(used.len() * 2);
        for (gid, ch) in used {
            widths.push(Object::Integer(*gid as i64));
            widths.push(Object::Array(vec![Object::Integer(font.char_width(*ch))]));
        }

        let cid_font_id = self.document.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "CIDFontType2",
            "BaseFont" => base_font.clone(),
            "CIDSystemInfo" => dictionary! {
                "Registry" => Object::string_literal("Adobe"),
                "Ordering" => Object::string_literal("Identity"),
                "Supplement" => 0,
            },
            "FontDescriptor" => descriptor_id,
            "DW" => 1000,
            "W" => widths,
            "CIDToGIDMap" => "Identity",
        });

        let cmap = to_unicode_cmap(used);
        let to_unicode_id = self.document.add_object(Stream::new(
            dictionary! { "Filter" => "FlateDecode" },
            compress(cmap.as_bytes())?,
        ));

        Ok(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type0",
            "BaseFont" => base_font,
            "Encoding" => "Identity-H",
            "DescendantFonts" => vec![Object::from(cid_font_id)],
            "ToUnicode" => to_unicode_id,
        })
    }
}

fn compress(data: &[u8]) -> Result<Vec<u8>, LayoutError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Builds a `ToUnicode` CMap mapping each drawn glyph id back to its character.
/// `.notdef` is left unmapped.
fn to_unicode_cmap(glyphs: &BTreeMap<u16, char>) -> String {
    let entries: Vec<(u16, char)> = glyphs
        .iter()
        .filter(|(gid, _)| **gid != 0)
        .map(|(gid, ch)| (*gid, *ch))
        .collect();

    let mut out = String::new();
    out.push_str("/CIDInit /ProcSet findresource begin\n");
    out.push_str("12 dict begin\n");
    out.push_str("begincmap\n");
    out.push_str("/CIDSystemInfo << /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
    out.push_str("/CMapName /Adobe-Identity-UCS def\n");
    out.push_str("/CMapType 2 def\n");
    out.push_str("1 begincodespacerange\n<0000> <FFFF>\nendcodespacerange\n");

    // bfchar blocks are limited to 100 entries each.
    for chunk in entries.chunks(100) {
        out.push_str(&format!("{} beginbfchar\n", chunk.len()));
        for (gid, ch) in chunk {
            let mut units = [0u16; 2];
            let hex: String = ch
                .encode_utf16(&mut units)
                .iter()
                .map(|u| format!("{u:04X}"))
                .collect();
            out.push_str(&format!("<{gid:04X}> <{hex}>\n"));
        }
        out.push_str("endbfchar\n");
    }

    out.push_str("endcmap\n");
    out.push_str("CMapName currentdict /CMap defineresource pop\n");
    out.push_str("end\nend\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_info() -> DocumentInfo {
        DocumentInfo {
            title: "Resume".to_string(),
            creation_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        }
    }

    fn make_page(text: &str, weight: FontWeight) -> PageCanvas {
        let mut page = PageCanvas::default();
        page.push_text(TextRun {
            x: 42.5,
            baseline_y: 60.0,
            weight,
            size_pt: 10.0,
            text: text.to_string(),
        });
        page.push_rule(42.5, 552.8, 70.0, 0.5);
        page
    }

    fn render(pages: &[PageCanvas], fonts: &FontSet) -> Vec<u8> {
        match write_pdf(pages, &PageGeometry::a4(), fonts, &make_info()).unwrap() {
            RenderedOutput::ByteBuffer(bytes) => bytes,
            other => panic!("unexpected output variant: {other:?}"),
        }
    }

    #[test]
    fn test_writes_loadable_document_with_page_count() {
        let fonts = FontSet::fallback();
        let pages = vec![
            make_page("First", FontWeight::Regular),
            make_page("Second", FontWeight::Bold),
        ];
        let bytes = render(&pages, &fonts);
        assert!(bytes.starts_with(b"%PDF-1.7"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn test_fallback_text_is_extractable() {
        let fonts = FontSet::fallback();
        let bytes = render(&[make_page("Hard skills (C++)", FontWeight::Regular)], &fonts);
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Hard skills (C++)"), "got: {text}");
    }

    #[test]
    fn test_only_drawn_weights_are_registered() {
        let fonts = FontSet::fallback();
        let bytes = render(&[make_page("Only regular", FontWeight::Regular)], &fonts);
        let doc = Document::load_mem(&bytes).unwrap();
        let font_dicts = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_dict().ok())
            .filter(|dict| matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Font"))
            .count();
        assert_eq!(font_dicts, 1);
    }

    #[test]
    fn test_to_unicode_cmap_entries() {
        let mut glyphs = BTreeMap::new();
        glyphs.insert(0u16, 'Ж');
        glyphs.insert(3u16, 'A');
        glyphs.insert(0x1F4u16, 'Ж');
        glyphs.insert(9u16, '😀');
        let cmap = to_unicode_cmap(&glyphs);
        assert!(cmap.contains("3 beginbfchar"));
        assert!(cmap.contains("<0003> <0041>"));
        assert!(cmap.contains("<01F4> <0416>"));
        assert!(cmap.contains("<0009> <D83DDE00>"));
        assert!(!cmap.contains("<0000> <0416>"));
    }

    #[test]
    fn test_to_unicode_cmap_chunks_at_100() {
        let glyphs: BTreeMap<u16, char> = (1u16..=150).map(|g| (g, 'a')).collect();
        let cmap = to_unicode_cmap(&glyphs);
        assert!(cmap.contains("100 beginbfchar"));
        assert!(cmap.contains("50 beginbfchar"));
    }

    #[test]
    fn test_embedded_font_round_trips_cyrillic_when_installed() {
        let dir = std::path::Path::new("/usr/share/fonts/truetype/dejavu");
        if !dir.join(crate::layout::fonts::REGULAR_FONT_FILE).exists()
            || !dir.join(crate::layout::fonts::BOLD_FONT_FILE).exists()
        {
            return;
        }
        let fonts = FontSet::load(dir);
        let bytes = render(&[make_page("Иван Иванов", FontWeight::Bold)], &fonts);
        let text = pdf_extract::extract_text_from_mem(&bytes).unwrap();
        assert!(text.contains("Иван Иванов"), "got: {text}");

        let doc = Document::load_mem(&bytes).unwrap();
        let base_fonts: Vec<Vec<u8>> = doc
            .objects
            .values()
            .filter_map(|obj| obj.as_dict().ok())
            .filter(|dict| {
                matches!(dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"CIDFontType2")
            })
            .filter_map(|dict| dict.get(b"BaseFont").and_then(Object::as_name).ok())
            .map(|name| name.to_vec())
            .collect();
        assert_eq!(base_fonts.len(), 1);
        assert_eq!(base_fonts[0].get(6), Some(&b'+'));
    }
}
