//! Segmented Bar Renderer
//! One bar per category; segmented categories stack their parts bottom-up,
//! each with its own palette color and a label at the segment midpoint.

use crate::charts::canvas::{Canvas, CanvasError, Mark};
use crate::charts::palette::Palette;
use crate::data::{Category, CategoryValue};
use thiserror::Error;
use tracing::info;

/// Bar width in x-axis (category index) units.
pub const BAR_WIDTH: f64 = 0.8;
/// Annotation x offset from the bar center.
pub const ANNOTATION_OFFSET: f64 = -0.3;

#[derive(Error, Debug)]
pub enum BarError {
    #[error("Category '{label}' has {segments} segments but the palette only colors {capacity}")]
    PaletteExhausted {
        label: String,
        segments: usize,
        capacity: usize,
    },
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// What was drawn, one entry per bar or segment.
#[derive(Debug, Clone, PartialEq)]
pub enum BarRecord {
    Whole {
        label: String,
        index: usize,
        value: f64,
    },
    Segment {
        label: String,
        index: usize,
        base: f64,
        top: f64,
    },
}

pub struct SegmentedBarRenderer {
    palette: Palette,
}

impl SegmentedBarRenderer {
    pub fn new(palette: Palette) -> Self {
        Self { palette }
    }

    /// Draw a single category at x = `index`.
    pub fn draw_category(
        &self,
        canvas: &mut Canvas,
        index: usize,
        category: &Category,
    ) -> Result<Vec<BarRecord>, BarError> {
        let x = index as f64;

        match &category.value {
            CategoryValue::Scalar(value) => {
                let color = self.palette.whole_bar().ok_or(BarError::PaletteExhausted {
                    label: category.label.clone(),
                    segments: 1,
                    capacity: 0,
                })?;
                canvas.add(Mark::Bar {
                    x,
                    width: BAR_WIDTH,
                    base: 0.0,
                    top: *value,
                    color,
                });
                info!(label = %category.label, index, value, "bar");

                Ok(vec![BarRecord::Whole {
                    label: category.label.clone(),
                    index,
                    value: *value,
                }])
            }
            CategoryValue::Segmented(segments) => {
                let capacity = self.palette.segment_capacity();
                if segments.len() > capacity {
                    return Err(BarError::PaletteExhausted {
                        label: category.label.clone(),
                        segments: segments.len(),
                        capacity,
                    });
                }

                let mut records = Vec::with_capacity(segments.len());
                let mut base = 0.0;
                for (position, segment) in segments.iter().enumerate() {
                    let top = base + segment.value;
                    let color =
                        self.palette
                            .segment(position)
                            .ok_or(BarError::PaletteExhausted {
                                label: category.label.clone(),
                                segments: segments.len(),
                                capacity,
                            })?;

                    canvas.add(Mark::Bar {
                        x,
                        width: BAR_WIDTH,
                        base,
                        top,
                        color,
                    });
                    canvas.add(Mark::Annotation {
                        text: segment.label.clone(),
                        at: (x + ANNOTATION_OFFSET, base + segment.value / 2.0),
                    });
                    info!(label = %segment.label, index, base, top, "segment");

                    records.push(BarRecord::Segment {
                        label: segment.label.clone(),
                        index,
                        base,
                        top,
                    });
                    base = top;
                }

                Ok(records)
            }
        }
    }

    /// Draw every category in order, then label the x axis with their names.
    pub fn draw_all(
        &self,
        canvas: &mut Canvas,
        categories: &[Category],
    ) -> Result<Vec<BarRecord>, BarError> {
        let mut records = Vec::new();
        for (index, category) in categories.iter().enumerate() {
            records.extend(self.draw_category(canvas, index, category)?);
        }

        canvas.set_x_ticks(
            categories
                .iter()
                .enumerate()
                .map(|(index, category)| (index as f64, category.label.clone()))
                .collect(),
        );

        Ok(records)
    }
}
