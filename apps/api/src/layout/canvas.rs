//! Positioned drawing operations collected by the engine, one list per page.
//!
//! Coordinates are in points measured from the top-left corner of the page.
//! The PDF writer flips them into PDF user space.

use crate::layout::font_metrics::FontWeight;

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub x: f32,
    /// Baseline distance from the top edge.
    pub baseline_y: f32,
    pub weight: FontWeight,
    pub size_pt: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text(TextRun),
    /// Horizontal rule from `x1` to `x2` at distance `y` from the top edge.
    Rule { x1: f32, x2: f32, y: f32, thickness: f32 },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCanvas {
    pub ops: Vec<DrawOp>,
}

impl PageCanvas {
    pub fn push_text(&mut self, run: TextRun) {
        if !run.text.is_empty() {
            self.ops.push(DrawOp::Text(run));
        }
    }

    pub fn push_rule(&mut self, x1: f32, x2: f32, y: f32, thickness: f32) {
        self.ops.push(DrawOp::Rule { x1, x2, y, thickness });
    }

    #[cfg(test)]
    pub fn text_runs(&self) -> impl Iterator<Item = &TextRun> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text(run) => Some(run),
            DrawOp::Rule { .. } => None,
        })
    }
}
