//! Canvas Module
//! Retained drawing surface: marks are added and removed between saves, and
//! every save renders whatever is currently accumulated to SVG via plotters.
//!
//! Two spine styles are supported:
//! - `Frame`: boxed plot area with numeric y ticks (bar charts)
//! - `Origin`: left/bottom spines through (0, 0), no ticks, no top/right
//!   spines, axis-end arrows (curve comparisons)

use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Deserialize;
use std::fmt;
use std::ops::Range;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const AXIS_COLOR: RGBColor = BLACK;
const ANNOTATION_FONT_SIZE: f64 = 12.0;
const TICK_FONT_SIZE: f64 = 13.0;
const AXIS_LABEL_FONT_SIZE: f64 = 15.0;
const ARROW_HALF: i32 = 6;
const DASH_LEN: f64 = 6.0;
const DASH_GAP: f64 = 4.0;
const POINT_RADIUS: i32 = 5;

#[derive(Error, Debug)]
pub enum CanvasError {
    #[error("No mark with id {0} on the canvas")]
    UnknownMark(MarkId),
    #[error("Drawing failed: {0}")]
    Draw(String),
}

fn draw_err<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> CanvasError {
    CanvasError::Draw(err.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpineStyle {
    #[default]
    Frame,
    Origin,
}

/// Canvas layout. Every field has a default so figure definitions only
/// spell out what differs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Fixed x limits; autoscaled from the marks when absent.
    pub x_limits: Option<[f64; 2]>,
    /// Fixed y limits; autoscaled from the marks when absent.
    pub y_limits: Option<[f64; 2]>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    pub spines: SpineStyle,
    pub legend: bool,
    pub rotate_tick_labels: bool,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            x_limits: None,
            y_limits: None,
            x_label: None,
            y_label: None,
            spines: SpineStyle::Frame,
            legend: false,
            rotate_tick_labels: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkId(u64);

impl fmt::Display for MarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowDirection {
    /// Top end of the y spine.
    Up,
    /// Right end of the x spine.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Bar,
    Annotation,
    Curve,
    ReferenceLine,
    Point,
    AxisArrow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mark {
    Bar {
        x: f64,
        width: f64,
        base: f64,
        top: f64,
        color: RGBColor,
    },
    Annotation {
        text: String,
        at: (f64, f64),
    },
    Curve {
        label: String,
        points: Vec<(f64, f64)>,
        color: RGBColor,
    },
    /// Dashed vertical from the x spine up to `top`.
    ReferenceLine {
        x: f64,
        top: f64,
        color: RGBColor,
    },
    Point {
        at: (f64, f64),
        color: RGBColor,
    },
    /// Pinned to an axis end in axis coordinates, independent of data scale.
    AxisArrow(ArrowDirection),
}

impl Mark {
    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Bar { .. } => MarkKind::Bar,
            Mark::Annotation { .. } => MarkKind::Annotation,
            Mark::Curve { .. } => MarkKind::Curve,
            Mark::ReferenceLine { .. } => MarkKind::ReferenceLine,
            Mark::Point { .. } => MarkKind::Point,
            Mark::AxisArrow(_) => MarkKind::AxisArrow,
        }
    }

    pub fn is_decoration(&self) -> bool {
        matches!(self, Mark::AxisArrow(_))
    }

    /// Data-space points this mark covers, used for autoscaling.
    fn extent_points(&self) -> Vec<(f64, f64)> {
        match self {
            Mark::Bar {
                x,
                width,
                base,
                top,
                ..
            } => vec![(x - width / 2.0, *base), (x + width / 2.0, *top)],
            Mark::Annotation { at, .. } | Mark::Point { at, .. } => vec![*at],
            Mark::Curve { points, .. } => points
                .iter()
                .copied()
                .filter(|(x, y)| x.is_finite() && y.is_finite())
                .collect(),
            Mark::ReferenceLine { x, top, .. } => vec![(*x, 0.0), (*x, *top)],
            Mark::AxisArrow(_) => Vec::new(),
        }
    }
}

/// Explicitly owned drawing surface.
#[derive(Debug, Clone)]
pub struct Canvas {
    config: CanvasConfig,
    marks: Vec<(MarkId, Mark)>,
    x_ticks: Vec<(f64, String)>,
    next_id: u64,
}

impl Canvas {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            config,
            marks: Vec::new(),
            x_ticks: Vec::new(),
            next_id: 0,
        }
    }

    pub fn add(&mut self, mark: Mark) -> MarkId {
        let id = MarkId(self.next_id);
        self.next_id += 1;
        debug!(id = %id, kind = ?mark.kind(), "add mark");
        self.marks.push((id, mark));
        id
    }

    /// Erase a previously added mark. Ids are never reused, so removing
    /// twice is an error.
    pub fn remove(&mut self, id: MarkId) -> Result<Mark, CanvasError> {
        let pos = self
            .marks
            .iter()
            .position(|(mark_id, _)| *mark_id == id)
            .ok_or(CanvasError::UnknownMark(id))?;
        let (_, mark) = self.marks.remove(pos);
        debug!(id = %id, kind = ?mark.kind(), "remove mark");
        Ok(mark)
    }

    pub fn marks(&self) -> impl Iterator<Item = &Mark> {
        self.marks.iter().map(|(_, mark)| mark)
    }

    pub fn get(&self, id: MarkId) -> Option<&Mark> {
        self.marks
            .iter()
            .find(|(mark_id, _)| *mark_id == id)
            .map(|(_, mark)| mark)
    }

    pub fn count(&self, kind: MarkKind) -> usize {
        self.marks().filter(|m| m.kind() == kind).count()
    }

    pub fn data_mark_count(&self) -> usize {
        self.marks().filter(|m| !m.is_decoration()).count()
    }

    pub fn set_x_ticks(&mut self, ticks: Vec<(f64, String)>) {
        self.x_ticks = ticks;
    }

    pub fn x_ticks(&self) -> &[(f64, String)] {
        &self.x_ticks
    }

    /// Effective (x, y) limits: configured ones, else autoscaled.
    pub fn limits(&self) -> (Range<f64>, Range<f64>) {
        let points: Vec<(f64, f64)> = self.marks().flat_map(Mark::extent_points).collect();

        let x = match self.config.x_limits {
            Some([lo, hi]) => lo..hi,
            None => padded_range(points.iter().map(|p| p.0), false),
        };
        let y = match self.config.y_limits {
            Some([lo, hi]) => lo..hi,
            None => padded_range(points.iter().map(|p| p.1), true),
        };
        (x, y)
    }

    /// Render the current marks into `root`.
    pub fn draw_on<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
    ) -> Result<(), CanvasError> {
        root.fill(&WHITE).map_err(draw_err)?;

        let (x_range, y_range) = self.limits();
        let frame = self.config.spines == SpineStyle::Frame;

        let mut builder = ChartBuilder::on(root);
        builder.margin_top(20).margin_right(20);
        if frame {
            let bottom = if self.config.rotate_tick_labels { 130 } else { 50 };
            builder
                .margin_left(if self.config.y_label.is_some() { 30 } else { 10 })
                .margin_bottom(bottom)
                .y_label_area_size(45);
        } else {
            builder.margin_left(45).margin_bottom(45);
        }
        let mut chart = builder
            .build_cartesian_2d(x_range.clone(), y_range.clone())
            .map_err(draw_err)?;

        if frame {
            chart
                .configure_mesh()
                .disable_mesh()
                .x_labels(0)
                .y_labels(6)
                .y_label_style(("sans-serif", TICK_FONT_SIZE))
                .draw()
                .map_err(draw_err)?;
            let outline = vec![
                (x_range.start, y_range.start),
                (x_range.end, y_range.start),
                (x_range.end, y_range.end),
                (x_range.start, y_range.end),
                (x_range.start, y_range.start),
            ];
            chart
                .draw_series(std::iter::once(PathElement::new(outline, AXIS_COLOR)))
                .map_err(draw_err)?;
        }

        // Spines through the origin, clamped into view.
        let origin = (
            0f64.clamp(x_range.start, x_range.end),
            0f64.clamp(y_range.start, y_range.end),
        );
        if !frame {
            chart
                .draw_series([
                    PathElement::new(
                        vec![(x_range.start, origin.1), (x_range.end, origin.1)],
                        AXIS_COLOR,
                    ),
                    PathElement::new(
                        vec![(origin.0, y_range.start), (origin.0, y_range.end)],
                        AXIS_COLOR,
                    ),
                ])
                .map_err(draw_err)?;
        }

        let annotation_style = TextStyle::from(("sans-serif", ANNOTATION_FONT_SIZE).into_font())
            .pos(Pos::new(HPos::Left, VPos::Center));

        for (_, mark) in &self.marks {
            match mark {
                Mark::Bar {
                    x,
                    width,
                    base,
                    top,
                    color,
                } => {
                    chart
                        .draw_series(std::iter::once(Rectangle::new(
                            [(x - width / 2.0, *base), (x + width / 2.0, *top)],
                            color.filled(),
                        )))
                        .map_err(draw_err)?;
                }
                Mark::Annotation { text, at } => {
                    chart
                        .draw_series(std::iter::once(Text::new(
                            text.clone(),
                            *at,
                            annotation_style.clone(),
                        )))
                        .map_err(draw_err)?;
                }
                Mark::Curve { points, color, .. } => {
                    for run in visible_runs(points, &y_range) {
                        chart
                            .draw_series(LineSeries::new(run, color.stroke_width(2)))
                            .map_err(draw_err)?;
                    }
                }
                Mark::ReferenceLine { x, top, color } => {
                    let from = chart.backend_coord(&(*x, origin.1));
                    let to = chart.backend_coord(&(*x, top.min(y_range.end)));
                    for dash in dashes(from, to) {
                        root.draw(&PathElement::new(dash, color.stroke_width(2)))
                            .map_err(draw_err)?;
                    }
                }
                Mark::Point { at, color } => {
                    chart
                        .draw_series(std::iter::once(Circle::new(
                            *at,
                            POINT_RADIUS,
                            color.filled(),
                        )))
                        .map_err(draw_err)?;
                }
                Mark::AxisArrow(direction) => {
                    let (tip, corners) = match direction {
                        ArrowDirection::Up => {
                            let (px, py) = chart.backend_coord(&(origin.0, y_range.end));
                            (
                                (px, py - ARROW_HALF),
                                [(px - ARROW_HALF, py + ARROW_HALF), (px + ARROW_HALF, py + ARROW_HALF)],
                            )
                        }
                        ArrowDirection::Right => {
                            let (px, py) = chart.backend_coord(&(x_range.end, origin.1));
                            (
                                (px + ARROW_HALF, py),
                                [(px - ARROW_HALF, py - ARROW_HALF), (px - ARROW_HALF, py + ARROW_HALF)],
                            )
                        }
                    };
                    root.draw(&Polygon::new(
                        vec![tip, corners[0], corners[1]],
                        AXIS_COLOR.filled(),
                    ))
                    .map_err(draw_err)?;
                }
            }
        }

        // Categorical tick labels below the bottom edge
        let mut tick_style = TextStyle::from(("sans-serif", TICK_FONT_SIZE).into_font());
        tick_style = if self.config.rotate_tick_labels {
            tick_style
                .transform(FontTransform::Rotate270)
                .pos(Pos::new(HPos::Right, VPos::Center))
        } else {
            tick_style.pos(Pos::new(HPos::Center, VPos::Top))
        };
        for (x, label) in &self.x_ticks {
            let (px, py) = chart.backend_coord(&(*x, y_range.start));
            root.draw(&Text::new(label.as_str(), (px, py + 6), tick_style.clone()))
                .map_err(draw_err)?;
        }

        let label_style = TextStyle::from(("sans-serif", AXIS_LABEL_FONT_SIZE).into_font());
        if let Some(x_label) = &self.config.x_label {
            let mid = (x_range.start + x_range.end) / 2.0;
            let (px, py) = chart.backend_coord(&(mid, origin.1));
            let (_, height) = root.dim_in_pixel();
            let pos = if frame {
                (px, height as i32 - 8)
            } else {
                (px, py + 14)
            };
            let v_pos = if frame { VPos::Bottom } else { VPos::Top };
            root.draw(&Text::new(
                x_label.as_str(),
                pos,
                label_style.pos(Pos::new(HPos::Center, v_pos)),
            ))
            .map_err(draw_err)?;
        }
        if let Some(y_label) = &self.config.y_label {
            let mid = (y_range.start + y_range.end) / 2.0;
            let (px, py) = chart.backend_coord(&(origin.0, mid));
            let pos = if frame { (8, py) } else { (px - 14, py) };
            let v_pos = if frame { VPos::Top } else { VPos::Bottom };
            root.draw(&Text::new(
                y_label.as_str(),
                pos,
                label_style
                    .transform(FontTransform::Rotate270)
                    .pos(Pos::new(HPos::Center, v_pos)),
            ))
            .map_err(draw_err)?;
        }

        if self.config.legend {
            self.draw_legend(root, chart.backend_coord(&(x_range.end, y_range.end)))?;
        }

        Ok(())
    }

    /// One entry per curve, top-right of the plot area.
    fn draw_legend<DB: DrawingBackend>(
        &self,
        root: &DrawingArea<DB, Shift>,
        top_right: (i32, i32),
    ) -> Result<(), CanvasError> {
        let style = TextStyle::from(("sans-serif", ANNOTATION_FONT_SIZE).into_font())
            .pos(Pos::new(HPos::Left, VPos::Center));
        let (right, top) = top_right;
        let left = right - 200;

        let curves = self.marks().filter_map(|mark| match mark {
            Mark::Curve { label, color, .. } => Some((label, color)),
            _ => None,
        });
        for (i, (label, color)) in curves.enumerate() {
            let y = top + 14 + 20 * i as i32;
            root.draw(&PathElement::new(
                vec![(left, y), (left + 24, y)],
                color.stroke_width(2),
            ))
            .map_err(draw_err)?;
            root.draw(&Text::new(label.as_str(), (left + 30, y), style.clone()))
                .map_err(draw_err)?;
        }
        Ok(())
    }

    pub fn to_svg_string(&self) -> Result<String, CanvasError> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.size()).into_drawing_area();
            self.draw_on(&root)?;
            root.present().map_err(draw_err)?;
        }
        Ok(svg)
    }

    pub fn save_svg(&self, path: &Path) -> Result<(), CanvasError> {
        {
            let root = SVGBackend::new(path, self.size()).into_drawing_area();
            self.draw_on(&root)?;
            root.present().map_err(draw_err)?;
        }
        info!(path = %path.display(), marks = self.marks.len(), "saved figure");
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

/// Min/max of `values` with a 5% margin. A bound sitting at zero stays
/// there, and `include_zero` pulls zero into the range.
fn padded_range(values: impl Iterator<Item = f64>, include_zero: bool) -> Range<f64> {
    let (mut lo, mut hi) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    if hi - lo == 0.0 {
        return (lo - 0.5)..(hi + 0.5);
    }
    let pad = (hi - lo) * 0.05;
    let lo = if lo == 0.0 { lo } else { lo - pad };
    let hi = if hi == 0.0 { hi } else { hi + pad };
    lo..hi
}

/// Split a sampled curve into runs that stay inside the y band.
/// Non-finite samples also break a run.
pub fn visible_runs(points: &[(f64, f64)], y_range: &Range<f64>) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for &(x, y) in points {
        if x.is_finite() && y.is_finite() && y >= y_range.start && y <= y_range.end {
            current.push((x, y));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

/// Pixel-space dash pieces between two backend coordinates.
fn dashes(from: (i32, i32), to: (i32, i32)) -> Vec<Vec<(i32, i32)>> {
    let (dx, dy) = ((to.0 - from.0) as f64, (to.1 - from.1) as f64);
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        return Vec::new();
    }

    let at = |t: f64| {
        (
            from.0 + (dx * t / length).round() as i32,
            from.1 + (dy * t / length).round() as i32,
        )
    };

    let mut pieces = Vec::new();
    let mut t = 0.0;
    while t < length {
        let end = (t + DASH_LEN).min(length);
        pieces.push(vec![at(t), at(end)]);
        t += DASH_LEN + DASH_GAP;
    }
    pieces
}
