//! Annotated Curve Renderer
//! Status-quo vs. improved curves on one shared canvas, edited step by step.
//! Each step may persist a snapshot of whatever the canvas holds right then.
//!
//! State machine:
//!   Empty --DrawBaseline--> BaselineOnly --DrawImproved--> BothCurves
//!         --RemoveBaseline--> ImprovedOnly

use crate::charts::canvas::{ArrowDirection, Canvas, CanvasConfig, CanvasError, Mark, MarkId};
use plotters::style::RGBColor;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_SAMPLES: usize = 100;

#[derive(Error, Debug)]
pub enum CurveError {
    #[error("Cannot apply {edit:?} while the canvas is {state:?}")]
    InvalidTransition {
        state: ComparisonState,
        edit: Edit,
    },
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

/// Evenly spaced samples over `[min, max]`, both endpoints included.
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => {
            let step = (max - min) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { max } else { min + step * i as f64 })
                .collect()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CurveFn {
    /// `scale / x`
    Reciprocal { scale: f64 },
    /// `scale * x^exponent`
    Power { scale: f64, exponent: f64 },
}

impl CurveFn {
    pub fn eval(&self, x: f64) -> f64 {
        match *self {
            CurveFn::Reciprocal { scale } => scale / x,
            CurveFn::Power { scale, exponent } => scale * x.powf(exponent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurveSpec {
    pub label: String,
    pub function: CurveFn,
    pub color: [u8; 3],
}

impl CurveSpec {
    pub fn rgb(&self) -> RGBColor {
        let [r, g, b] = self.color;
        RGBColor(r, g, b)
    }
}

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CurveScenario {
    pub x_min: f64,
    pub x_max: f64,
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// Fixed "effort" x for the dashed reference marker; no marker if absent.
    #[serde(default)]
    pub reference_x: Option<f64>,
    pub baseline: CurveSpec,
    pub improved: CurveSpec,
}

impl CurveScenario {
    pub fn xs(&self) -> Vec<f64> {
        linspace(self.x_min, self.x_max, self.samples)
    }

    pub fn y_limit(&self) -> f64 {
        1.0 / self.x_min
    }

    /// Pin the canvas to x in [0, x_max] and y in [0, 1 / x_min].
    pub fn canvas_config(&self, base: CanvasConfig) -> CanvasConfig {
        CanvasConfig {
            x_limits: Some([0.0, self.x_max]),
            y_limits: Some([0.0, self.y_limit()]),
            ..base
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonState {
    Empty,
    BaselineOnly,
    BothCurves,
    ImprovedOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edit {
    DrawBaseline,
    DrawImproved,
    RemoveBaseline,
}

/// One edit, optionally followed by saving `<persist>.svg`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Step {
    pub edit: Edit,
    #[serde(default)]
    pub persist: Option<String>,
}

/// Marks owned by one curve, so they can be removed together.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveMarks {
    pub line: MarkId,
    pub reference: Option<(MarkId, MarkId)>,
}

impl CurveMarks {
    fn ids(&self) -> Vec<MarkId> {
        let mut ids = vec![self.line];
        if let Some((dashed, point)) = self.reference {
            ids.push(dashed);
            ids.push(point);
        }
        ids
    }
}

pub struct CurveComparison {
    scenario: CurveScenario,
    canvas: Canvas,
    state: ComparisonState,
    baseline: Option<CurveMarks>,
    improved: Option<CurveMarks>,
}

impl CurveComparison {
    pub fn new(scenario: CurveScenario, config: CanvasConfig) -> Self {
        let canvas = Canvas::new(scenario.canvas_config(config));
        Self {
            scenario,
            canvas,
            state: ComparisonState::Empty,
            baseline: None,
            improved: None,
        }
    }

    pub fn state(&self) -> ComparisonState {
        self.state
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn scenario(&self) -> &CurveScenario {
        &self.scenario
    }

    pub fn apply(&mut self, edit: Edit) -> Result<ComparisonState, CurveError> {
        let next = match (self.state, edit) {
            (ComparisonState::Empty, Edit::DrawBaseline) => {
                self.canvas.add(Mark::AxisArrow(ArrowDirection::Up));
                self.canvas.add(Mark::AxisArrow(ArrowDirection::Right));
                let spec = self.scenario.baseline.clone();
                self.baseline = Some(self.draw_curve(&spec));
                ComparisonState::BaselineOnly
            }
            (ComparisonState::BaselineOnly, Edit::DrawImproved) => {
                let spec = self.scenario.improved.clone();
                self.improved = Some(self.draw_curve(&spec));
                ComparisonState::BothCurves
            }
            (ComparisonState::BothCurves, Edit::RemoveBaseline) => {
                if let Some(marks) = self.baseline.take() {
                    for id in marks.ids() {
                        self.canvas.remove(id)?;
                    }
                }
                ComparisonState::ImprovedOnly
            }
            (state, edit) => return Err(CurveError::InvalidTransition { state, edit }),
        };

        debug!(from = ?self.state, to = ?next, ?edit, "transition");
        self.state = next;
        Ok(next)
    }

    /// Apply every step in order, saving snapshots into `out_dir`.
    pub fn run(&mut self, steps: &[Step], out_dir: &Path) -> Result<Vec<PathBuf>, CurveError> {
        let mut written = Vec::new();
        for step in steps {
            self.apply(step.edit)?;
            if let Some(name) = &step.persist {
                let path = out_dir.join(format!("{name}.svg"));
                self.canvas.save_svg(&path)?;
                written.push(path);
            }
        }
        Ok(written)
    }

    fn draw_curve(&mut self, spec: &CurveSpec) -> CurveMarks {
        let color = spec.rgb();
        let points = self
            .scenario
            .xs()
            .into_iter()
            .map(|x| (x, spec.function.eval(x)))
            .collect();
        let line = self.canvas.add(Mark::Curve {
            label: spec.label.clone(),
            points,
            color,
        });

        let reference = self.scenario.reference_x.map(|x| {
            let y = spec.function.eval(x);
            let dashed = self.canvas.add(Mark::ReferenceLine { x, top: y, color });
            let point = self.canvas.add(Mark::Point { at: (x, y), color });
            (dashed, point)
        });

        CurveMarks { line, reference }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::canvas::{MarkKind, SpineStyle};

    fn scenario(reference_x: Option<f64>) -> CurveScenario {
        CurveScenario {
            x_min: 0.1,
            x_max: 2.0,
            samples: DEFAULT_SAMPLES,
            reference_x,
            baseline: CurveSpec {
                label: "status quo".into(),
                function: CurveFn::Reciprocal { scale: 2.0 },
                color: [31, 119, 180],
            },
            improved: CurveSpec {
                label: "with reproducibility tools".into(),
                function: CurveFn::Reciprocal { scale: 1.0 },
                color: [255, 127, 14],
            },
        }
    }

    fn origin_config() -> CanvasConfig {
        CanvasConfig {
            spines: SpineStyle::Origin,
            ..CanvasConfig::default()
        }
    }

    #[test]
    fn linspace_includes_endpoints() {
        let xs = linspace(0.1, 2.0, 100);
        assert_eq!(xs.len(), 100);
        assert_eq!(xs[0], 0.1);
        assert_eq!(xs[99], 2.0);
        assert!(xs.windows(2).all(|w| w[1] > w[0]));
        assert!(linspace(0.0, 1.0, 0).is_empty());
        assert_eq!(linspace(3.0, 5.0, 1), vec![3.0]);
    }

    #[test]
    fn curve_functions() {
        assert_eq!(CurveFn::Reciprocal { scale: 2.0 }.eval(0.5), 4.0);
        let power = CurveFn::Power {
            scale: 3.0,
            exponent: 2.0,
        };
        assert_eq!(power.eval(2.0), 12.0);
    }

    #[test]
    fn baseline_snapshot_has_one_curve_and_two_arrows() {
        let mut comparison = CurveComparison::new(scenario(Some(1.0)), origin_config());
        comparison.apply(Edit::DrawBaseline).unwrap();

        let canvas = comparison.canvas();
        assert_eq!(canvas.count(MarkKind::Curve), 1);
        assert_eq!(canvas.count(MarkKind::AxisArrow), 2);
        assert_eq!(comparison.scenario().y_limit(), 10.0);
        assert_eq!(canvas.limits(), (0.0..2.0, 0.0..10.0));

        match canvas.marks().find(|m| m.kind() == MarkKind::Curve) {
            Some(Mark::Curve { points, .. }) => assert_eq!(points.len(), 100),
            other => panic!("expected a curve, got {other:?}"),
        };
    }

    #[test]
    fn reference_marker_hits_the_curve() {
        let mut comparison = CurveComparison::new(scenario(Some(1.0)), origin_config());
        comparison.apply(Edit::DrawBaseline).unwrap();

        let canvas = comparison.canvas();
        assert!(canvas.marks().any(|m| *m
            == Mark::ReferenceLine {
                x: 1.0,
                top: 2.0,
                color: RGBColor(31, 119, 180)
            }));
        assert!(canvas.marks().any(|m| *m
            == Mark::Point {
                at: (1.0, 2.0),
                color: RGBColor(31, 119, 180)
            }));
    }

    #[test]
    fn removing_baseline_leaves_improved_marks() {
        let mut comparison = CurveComparison::new(scenario(Some(1.0)), origin_config());
        comparison.apply(Edit::DrawBaseline).unwrap();
        comparison.apply(Edit::DrawImproved).unwrap();
        assert_eq!(comparison.canvas().data_mark_count(), 6);
        assert_eq!(comparison.canvas().count(MarkKind::AxisArrow), 2);

        let state = comparison.apply(Edit::RemoveBaseline).unwrap();
        assert_eq!(state, ComparisonState::ImprovedOnly);

        let canvas = comparison.canvas();
        assert_eq!(canvas.data_mark_count(), 3);
        assert_eq!(canvas.count(MarkKind::AxisArrow), 2);
        match canvas.marks().find(|m| m.kind() == MarkKind::Curve) {
            Some(Mark::Curve { label, .. }) => assert_eq!(label, "with reproducibility tools"),
            other => panic!("expected a curve, got {other:?}"),
        };
    }

    #[test]
    fn markers_are_optional() {
        let mut comparison = CurveComparison::new(scenario(None), origin_config());
        comparison.apply(Edit::DrawBaseline).unwrap();
        comparison.apply(Edit::DrawImproved).unwrap();
        assert_eq!(comparison.canvas().data_mark_count(), 2);
        comparison.apply(Edit::RemoveBaseline).unwrap();
        assert_eq!(comparison.canvas().data_mark_count(), 1);
    }

    #[test]
    fn transitions_are_one_way() {
        let mut comparison = CurveComparison::new(scenario(Some(1.0)), origin_config());
        assert!(matches!(
            comparison.apply(Edit::DrawImproved),
            Err(CurveError::InvalidTransition {
                state: ComparisonState::Empty,
                edit: Edit::DrawImproved
            })
        ));

        comparison.apply(Edit::DrawBaseline).unwrap();
        assert!(comparison.apply(Edit::DrawBaseline).is_err());
        assert!(comparison.apply(Edit::RemoveBaseline).is_err());

        comparison.apply(Edit::DrawImproved).unwrap();
        comparison.apply(Edit::RemoveBaseline).unwrap();
        assert!(comparison.apply(Edit::RemoveBaseline).is_err());
        assert!(comparison.apply(Edit::DrawBaseline).is_err());
        assert_eq!(comparison.state(), ComparisonState::ImprovedOnly);
    }

    #[test]
    fn run_writes_one_file_per_persisted_step() {
        let dir = tempfile::tempdir().unwrap();
        let steps = vec![
            Step {
                edit: Edit::DrawBaseline,
                persist: Some("baseline".into()),
            },
            Step {
                edit: Edit::DrawImproved,
                persist: Some("both".into()),
            },
            Step {
                edit: Edit::RemoveBaseline,
                persist: Some("improved".into()),
            },
        ];

        let mut comparison = CurveComparison::new(scenario(Some(1.0)), origin_config());
        let written = comparison.run(&steps, dir.path()).unwrap();

        assert_eq!(
            written,
            vec![
                dir.path().join("baseline.svg"),
                dir.path().join("both.svg"),
                dir.path().join("improved.svg"),
            ]
        );
        let snapshots: Vec<String> = written
            .iter()
            .map(|p| std::fs::read_to_string(p).unwrap())
            .collect();
        assert_ne!(snapshots[0], snapshots[1]);
        assert_ne!(snapshots[1], snapshots[2]);
    }

    #[test]
    fn steps_without_persist_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let steps = vec![Step {
            edit: Edit::DrawBaseline,
            persist: None,
        }];
        let mut comparison = CurveComparison::new(scenario(None), origin_config());
        assert!(comparison.run(&steps, dir.path()).unwrap().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
