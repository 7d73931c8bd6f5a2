//! Figure Definitions Module
//! Embedded JSON describing every figure the binary writes.

use crate::charts::{CanvasConfig, CurveScenario, Step};
use crate::data::category::{parse_categories, Category, CategoryError};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

const REPRODUCIBILITY_FAILURES: &str = include_str!("../../figures/reproducibility_failures.json");
const EFFORT_SNAPSHOTS: &str = include_str!("../../figures/effort_snapshots.json");
const EFFORT_DOCUMENT: &str = include_str!("../../figures/effort_document.json");

#[derive(Error, Debug)]
pub enum FigureError {
    #[error("Invalid figure definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Category(#[from] CategoryError),
}

/// Bar chart definition. Categories stay raw until `categories()` so that a
/// bad value shape is reported as a category error, not a JSON one.
#[derive(Debug, Clone, Deserialize)]
pub struct BarFigure {
    pub output: String,
    pub seed: u64,
    #[serde(default)]
    pub canvas: CanvasConfig,
    pub categories: Vec<Value>,
}

impl BarFigure {
    pub fn from_json(json: &str) -> Result<Self, FigureError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn categories(&self) -> Result<Vec<Category>, CategoryError> {
        parse_categories(&self.categories)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CurveFigure {
    #[serde(default)]
    pub canvas: CanvasConfig,
    pub scenario: CurveScenario,
    pub steps: Vec<Step>,
}

impl CurveFigure {
    pub fn from_json(json: &str) -> Result<Self, FigureError> {
        Ok(serde_json::from_str(json)?)
    }
}

pub fn bar_figures() -> Result<Vec<BarFigure>, FigureError> {
    Ok(vec![BarFigure::from_json(REPRODUCIBILITY_FAILURES)?])
}

pub fn curve_figures() -> Result<Vec<CurveFigure>, FigureError> {
    [EFFORT_SNAPSHOTS, EFFORT_DOCUMENT]
        .into_iter()
        .map(CurveFigure::from_json)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{Edit, SpineStyle};

    #[test]
    fn embedded_bar_figure_parses() {
        let figures = bar_figures().unwrap();
        let categories = figures[0].categories().unwrap();

        assert_eq!(figures[0].seed, 0);
        assert_eq!(categories.len(), 4);
        assert_eq!(categories[0].segment_count(), 3);
        assert_eq!(categories[0].height(), 58.0);
        assert!(figures[0].canvas.rotate_tick_labels);
    }

    #[test]
    fn embedded_curve_figures_parse() {
        let figures = curve_figures().unwrap();
        assert_eq!(figures.len(), 2);

        let snapshots = &figures[0];
        assert_eq!(snapshots.canvas.spines, SpineStyle::Origin);
        assert_eq!(snapshots.scenario.reference_x, Some(1.0));
        let edits: Vec<Edit> = snapshots.steps.iter().map(|s| s.edit).collect();
        assert_eq!(
            edits,
            vec![Edit::DrawBaseline, Edit::DrawImproved, Edit::RemoveBaseline]
        );
        assert!(snapshots.steps.iter().all(|s| s.persist.is_some()));

        let document = &figures[1];
        assert_eq!(document.scenario.samples, 100);
        assert_eq!(document.scenario.reference_x, None);
        assert_eq!(document.steps[0].persist, None);
    }

    #[test]
    fn snapshot_names_are_distinct() {
        let mut names: Vec<String> = curve_figures()
            .unwrap()
            .into_iter()
            .flat_map(|f| f.steps.into_iter().filter_map(|s| s.persist))
            .chain(bar_figures().unwrap().into_iter().map(|f| f.output))
            .collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
    }

    #[test]
    fn bad_category_is_a_category_error() {
        let figure = BarFigure::from_json(
            r#"{"output": "x", "seed": 1, "categories": [["ok", 3], ["bad", "oops"]]}"#,
        )
        .unwrap();
        assert!(matches!(
            figure.categories(),
            Err(CategoryError::InvalidValue { .. })
        ));
        assert_eq!(figure.canvas, CanvasConfig::default());
    }

    #[test]
    fn unknown_edit_is_rejected() {
        let json = r#"{
            "scenario": {
                "x_min": 0.1, "x_max": 2.0,
                "baseline": {"label": "a", "function": {"kind": "reciprocal", "scale": 1.0}, "color": [0, 0, 0]},
                "improved": {"label": "b", "function": {"kind": "reciprocal", "scale": 1.0}, "color": [0, 0, 0]}
            },
            "steps": [{"edit": "redraw_baseline"}]
        }"#;
        assert!(matches!(
            CurveFigure::from_json(json),
            Err(FigureError::Json(_))
        ));
    }
}
