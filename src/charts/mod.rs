//! Charts module - Canvas and the two figure renderers

mod bars;
mod canvas;
mod curves;
mod palette;

pub use bars::SegmentedBarRenderer;
pub use canvas::{Canvas, CanvasConfig};
pub use curves::{CurveComparison, CurveScenario, Step};
pub use palette::{Palette, PASTEL1};

#[cfg(test)]
pub use canvas::SpineStyle;
#[cfg(test)]
pub use curves::Edit;
