//! Prelim Figures - static charts for the presentation and the written document
//!
//! Writes every figure defined under `figures/` as SVG into the current
//! directory. Takes no arguments.

mod charts;
mod data;

use anyhow::{Context, Result};
use charts::{Canvas, CurveComparison, Palette, SegmentedBarRenderer, PASTEL1};
use data::{BarFigure, CurveFigure};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let out_dir = Path::new(".");

    for figure in data::bar_figures()? {
        render_bar_figure(&figure, out_dir)
            .with_context(|| format!("rendering bar figure '{}'", figure.output))?;
    }

    for figure in data::curve_figures()? {
        let written = render_curve_figure(&figure, out_dir).context("rendering curve figure")?;
        info!(files = written.len(), "curve figure done");
    }

    Ok(())
}

fn render_bar_figure(figure: &BarFigure, out_dir: &Path) -> Result<PathBuf> {
    let categories = figure.categories()?;
    let renderer = SegmentedBarRenderer::new(Palette::shuffled(&PASTEL1, figure.seed));
    let mut canvas = Canvas::new(figure.canvas.clone());

    renderer.draw_all(&mut canvas, &categories)?;

    let path = out_dir.join(format!("{}.svg", figure.output));
    canvas.save_svg(&path)?;
    Ok(path)
}

fn render_curve_figure(figure: &CurveFigure, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut comparison = CurveComparison::new(figure.scenario.clone(), figure.canvas.clone());
    Ok(comparison.run(&figure.steps, out_dir)?)
}
