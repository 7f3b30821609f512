//! Page geometry. Dimensions are specified in millimetres and consumed in PDF points.

use crate::layout::LayoutError;

/// Points per millimetre (72pt per inch / 25.4mm per inch).
pub const MM_TO_PT: f32 = 72.0 / 25.4;

/// A fixed-size page with independent margins on each side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub width_mm: f32,
    pub height_mm: f32,
    pub margin_left_mm: f32,
    pub margin_right_mm: f32,
    pub margin_top_mm: f32,
    pub margin_bottom_mm: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl PageGeometry {
    /// A4 portrait with 15mm margins on all sides (180mm content width).
    pub fn a4() -> Self {
        Self::with_uniform_margin(210.0, 297.0, 15.0)
    }

    pub fn with_uniform_margin(width_mm: f32, height_mm: f32, margin_mm: f32) -> Self {
        Self {
            width_mm,
            height_mm,
            margin_left_mm: margin_mm,
            margin_right_mm: margin_mm,
            margin_top_mm: margin_mm,
            margin_bottom_mm: margin_mm,
        }
    }

    pub fn width_pt(&self) -> f32 {
        self.width_mm * MM_TO_PT
    }

    pub fn height_pt(&self) -> f32 {
        self.height_mm * MM_TO_PT
    }

    pub fn left_pt(&self) -> f32 {
        self.margin_left_mm * MM_TO_PT
    }

    pub fn top_pt(&self) -> f32 {
        self.margin_top_mm * MM_TO_PT
    }

    pub fn bottom_margin_pt(&self) -> f32 {
        self.margin_bottom_mm * MM_TO_PT
    }

    /// Distance from the top edge below which no body line may extend.
    pub fn bottom_limit_pt(&self) -> f32 {
        self.height_pt() - self.bottom_margin_pt()
    }

    /// Page width minus both horizontal margins. May be non-positive for a
    /// malformed geometry; `validate` rejects those.
    pub fn content_width_pt(&self) -> f32 {
        (self.width_mm - self.margin_left_mm - self.margin_right_mm) * MM_TO_PT
    }

    pub fn content_height_pt(&self) -> f32 {
        (self.height_mm - self.margin_top_mm - self.margin_bottom_mm) * MM_TO_PT
    }

    /// Rejects pages that cannot host at least one line of `tallest_line_pt`.
    ///
    /// Non-finite values and negative margins are rejected as well, so a
    /// validated geometry always yields a strictly positive content width.
    pub fn validate(&self, tallest_line_pt: f32) -> Result<(), LayoutError> {
        let fields = [
            self.width_mm,
            self.height_mm,
            self.margin_left_mm,
            self.margin_right_mm,
            self.margin_top_mm,
            self.margin_bottom_mm,
        ];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(LayoutError::InvalidGeometry(
                "page dimensions must be finite".to_string(),
            ));
        }
        if fields[2..].iter().any(|m| *m < 0.0) {
            return Err(LayoutError::InvalidGeometry(
                "margins must not be negative".to_string(),
            ));
        }

        let width = self.content_width_pt();
        if width <= 0.0 {
            return Err(LayoutError::InvalidGeometry(format!(
                "content width is {width:.2}pt: page {}mm is narrower than its margins ({}mm + {}mm)",
                self.width_mm, self.margin_left_mm, self.margin_right_mm
            )));
        }

        let height = self.content_height_pt();
        if height < tallest_line_pt {
            return Err(LayoutError::InvalidGeometry(format!(
                "content height is {height:.2}pt, need at least {tallest_line_pt:.2}pt for one line"
            )));
        }

        Ok(())
    }
}
