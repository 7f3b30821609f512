//! The document layout engine.
//!
//! One engine lays out one document. `generate` consumes the engine, so an
//! instance can never be reused for a second document; callers build a fresh
//! one per request (construction is cheap, fonts are shared behind `Arc`).

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info};

use crate::layout::canvas::{PageCanvas, TextRun};
use crate::layout::font_metrics::FontWeight;
use crate::layout::fonts::FontSet;
use crate::layout::geometry::PageGeometry;
use crate::layout::header::{extract_header, normalize_records, HeaderFields};
use crate::layout::output::encode_output;
use crate::layout::pdf::{write_pdf, DocumentInfo};
use crate::layout::wrap::wrap_text;
use crate::layout::LayoutError;
use crate::models::resume::ResumeRecord;

// ─── Typography ─────────────────────────────────────────────────────────────

pub const TITLE_SIZE: f32 = 16.0;
pub const BODY_SIZE: f32 = 10.0;
pub const FOOTER_SIZE: f32 = 8.0;
pub const LINE_HEIGHT_FACTOR: f32 = 1.5;

/// The only body content of a document without records.
pub const EMPTY_BODY_PLACEHOLDER: &str = "No data provided.";

/// The name line; every page must be able to hold at least this much.
const TALLEST_LINE_PT: f32 = TITLE_SIZE * LINE_HEIGHT_FACTOR;
const RECORD_GAP_PT: f32 = BODY_SIZE * LINE_HEIGHT_FACTOR / 2.0;
const RULE_MARGIN_PT: f32 = 6.0;
const RULE_THICKNESS_PT: f32 = 0.5;
/// Baseline offset from the top of a line box, as a fraction of font size.
const ASCENT_RATIO: f32 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
}

// ─── Engine ─────────────────────────────────────────────────────────────────

pub struct LayoutEngine {
    geometry: PageGeometry,
    fonts: FontSet,
    /// Fixed at construction; every wrap call uses this value.
    content_width: f32,
    generated_on: NaiveDate,
    current: PageCanvas,
    finished: Vec<PageCanvas>,
    /// Distance of the next line's top edge from the page's top edge.
    cursor_y: f32,
    skipped_records: usize,
}

impl LayoutEngine {
    /// Builds an engine for one document. Fails with `InvalidGeometry` when the
    /// page leaves no positive content width or cannot fit a single title line.
    pub fn new(geometry: PageGeometry, fonts: FontSet) -> Result<Self, LayoutError> {
        geometry.validate(TALLEST_LINE_PT)?;
        let content_width = geometry.content_width_pt();

        Ok(Self {
            geometry,
            fonts,
            content_width,
            generated_on: Local::now().date_naive(),
            current: PageCanvas::default(),
            finished: Vec::new(),
            cursor_y: geometry.top_pt(),
            skipped_records: 0,
        })
    }

    /// Overrides the date printed in page footers.
    #[cfg(test)]
    pub fn with_generation_date(mut self, date: NaiveDate) -> Self {
        self.generated_on = date;
        self
    }

    #[cfg(test)]
    pub fn content_width(&self) -> f32 {
        self.content_width
    }

    /// Lays out `records` and returns the encoded PDF.
    pub fn generate(mut self, records: &[ResumeRecord]) -> Result<Vec<u8>, LayoutError> {
        self.layout(records);
        self.finish()
    }

    fn layout(&mut self, records: &[ResumeRecord]) {
        let normalized = normalize_records(records);
        let dropped = records.len() - normalized.len();
        let (header, body) = extract_header(normalized);
        debug!(
            input = records.len(),
            dropped_blank = dropped,
            body = body.len(),
            has_name = header.name.is_some(),
            "Records partitioned"
        );

        self.render_header(&header);

        if body.is_empty() {
            self.flow_block(EMPTY_BODY_PLACEHOLDER, FontWeight::Regular, BODY_SIZE, Align::Left);
            return;
        }

        for (index, record) in body.iter().enumerate() {
            if index > 0 {
                self.cursor_y += RECORD_GAP_PT;
            }
            self.render_record(record);
        }
    }

    fn render_header(&mut self, header: &HeaderFields) {
        self.flow_block(header.display_name(), FontWeight::Bold, TITLE_SIZE, Align::Center);

        match header.contact_line() {
            Some(contact) => {
                self.flow_block(&contact, FontWeight::Regular, BODY_SIZE, Align::Center);
            }
            None => self.cursor_y += BODY_SIZE * LINE_HEIGHT_FACTOR,
        }

        if self.cursor_y + 2.0 * RULE_MARGIN_PT > self.geometry.bottom_limit_pt() {
            self.new_page();
            return;
        }
        self.cursor_y += RULE_MARGIN_PT;
        let left = self.geometry.left_pt();
        self.current.push_rule(
            left,
            left + self.content_width,
            self.cursor_y,
            RULE_THICKNESS_PT,
        );
        self.cursor_y += RULE_MARGIN_PT;
    }

    fn render_record(&mut self, record: &ResumeRecord) {
        if self.content_width <= 0.0 {
            error!(
                label = %record.label,
                value_len = record.value.chars().count(),
                page = self.page_number(),
                cursor_y = self.cursor_y,
                content_width = self.content_width,
                "Non-positive content width; skipping record"
            );
            self.skipped_records += 1;
            return;
        }

        let label = format!("{}:", record.label);
        self.flow_block(&label, FontWeight::Bold, BODY_SIZE, Align::Left);
        self.flow_block(&record.value, FontWeight::Regular, BODY_SIZE, Align::Left);
    }

    /// Wraps `text` to the content width and places each line, breaking pages
    /// as needed. Never issues a wrap with a non-positive width.
    fn flow_block(&mut self, text: &str, weight: FontWeight, size_pt: f32, align: Align) {
        if self.content_width <= 0.0 {
            error!(
                text_len = text.chars().count(),
                page = self.page_number(),
                cursor_y = self.cursor_y,
                "Non-positive content width; block not placed"
            );
            return;
        }

        let fonts = &self.fonts;
        let lines = wrap_text(text, self.content_width, |s| fonts.measure(s, weight, size_pt));
        for line in lines {
            self.place_line(line, weight, size_pt, align);
        }
    }

    fn place_line(&mut self, text: String, weight: FontWeight, size_pt: f32, align: Align) {
        let line_height = size_pt * LINE_HEIGHT_FACTOR;
        if self.cursor_y + line_height > self.geometry.bottom_limit_pt() {
            self.new_page();
        }

        let left = self.geometry.left_pt();
        let x = match align {
            Align::Left => left,
            Align::Center => {
                let width = self.fonts.measure(&text, weight, size_pt);
                left + ((self.content_width - width) / 2.0).max(0.0)
            }
        };
        let baseline_y = self.cursor_y + (line_height - size_pt) / 2.0 + size_pt * ASCENT_RATIO;

        self.current.push_text(TextRun {
            x,
            baseline_y,
            weight,
            size_pt,
            text,
        });
        self.cursor_y += line_height;
    }

    fn new_page(&mut self) {
        let page = std::mem::take(&mut self.current);
        self.finished.push(page);
        self.cursor_y = self.geometry.top_pt();
        debug!(page = self.page_number(), "Page break");
    }

    fn page_number(&self) -> usize {
        self.finished.len() + 1
    }

    fn footer_text(&self, page: usize, total: usize) -> String {
        format!(
            "Generated on: {} · Page {page} of {total}",
            self.generated_on.format("%Y-%m-%d")
        )
    }

    fn finish(mut self) -> Result<Vec<u8>, LayoutError> {
        let last = std::mem::take(&mut self.current);
        self.finished.push(last);

        let total = self.finished.len();
        let left = self.geometry.left_pt();
        let baseline_y = self.geometry.height_pt() - self.geometry.bottom_margin_pt() / 2.0
            + FOOTER_SIZE * ASCENT_RATIO / 2.0;

        let footers: Vec<String> = (1..=total).map(|n| self.footer_text(n, total)).collect();
        for (page, text) in self.finished.iter_mut().zip(footers) {
            let width = self.fonts.measure(&text, FontWeight::Regular, FOOTER_SIZE);
            page.push_text(TextRun {
                x: left + ((self.content_width - width) / 2.0).max(0.0),
                baseline_y,
                weight: FontWeight::Regular,
                size_pt: FOOTER_SIZE,
                text,
            });
        }

        let info = DocumentInfo {
            title: "Resume".to_string(),
            creation_date: self.generated_on,
        };
        let rendered = write_pdf(&self.finished, &self.geometry, &self.fonts, &info)?;
        let bytes = encode_output(rendered)?;

        info!(
            pages = total,
            skipped_records = self.skipped_records,
            bytes = bytes.len(),
            family = ?self.fonts.family(),
            "Resume document generated"
        );
        Ok(bytes)
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
