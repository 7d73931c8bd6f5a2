//! Data module - Categories and embedded figure definitions

mod category;
mod figures;

pub use category::{Category, CategoryValue};
pub use figures::{bar_figures, curve_figures, BarFigure, CurveFigure};
