//! A laid-out stacked heatmap and its rendering with plotters.

use super::panel::{CategoryLegend, ColorBar, HeatmapRegion, PanelRegions};
use crate::error::{IobioError, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use plotters::style::FontTransform;

/// Left gutter for the y label and row labels.
const LABEL_GUTTER: i32 = 120;
/// Bottom gutter for rotated column labels.
const COLUMN_LABEL_GUTTER: i32 = 70;
/// Slices in a color bar.
const COLOR_BAR_STEPS: i32 = 64;
/// Height of one category legend entry.
const LEGEND_LINE: i32 = 18;

/// Pixel rectangle, `x1`/`y1` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl Rect {
    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}

/// The composed figure returned by `StackedHeatmap::draw`.
///
/// One row per panel, three regions per row: data, color bar and
/// category legend.
#[derive(Debug, Clone)]
pub struct Figure {
    size: (u32, u32),
    width_ratios: [f64; 3],
    height_ratios: Vec<f64>,
    columns: Vec<String>,
    rows: Vec<PanelRegions>,
}

impl Figure {
    pub(crate) fn new(
        size: (u32, u32),
        width_ratios: [f64; 3],
        height_ratios: Vec<f64>,
        columns: Vec<String>,
        rows: Vec<PanelRegions>,
    ) -> Self {
        Self {
            size,
            width_ratios,
            height_ratios,
            columns,
            rows,
        }
    }

    /// Width and height in pixels.
    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// Relative widths of the three region columns.
    pub fn width_ratios(&self) -> [f64; 3] {
        self.width_ratios
    }

    /// Relative panel heights.
    pub fn height_ratios(&self) -> &[f64] {
        &self.height_ratios
    }

    /// Shared column order every panel was drawn with.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rendered panels, top to bottom.
    pub fn rows(&self) -> &[PanelRegions] {
        &self.rows
    }

    /// Region rectangles in row-major order, three per panel.
    pub fn grid(&self) -> Vec<Rect> {
        grid_for(self.size, &self.width_ratios, &self.height_ratios)
    }

    /// Draw onto a plotters drawing area.
    ///
    /// The grid is laid out over the area's own pixel size.
    pub fn render_on<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> Result<()> {
        area.fill(&WHITE).map_err(render_err)?;
        let grid = grid_for(area.dim_in_pixel(), &self.width_ratios, &self.height_ratios);

        for (row, cells) in self.rows.iter().zip(grid.chunks(3)) {
            draw_heatmap(area, cells[0], &row.data)?;
            if let Some(bar) = &row.continuous_legend {
                draw_color_bar(area, cells[1], bar)?;
            }
            if let Some(legend) = &row.discrete_legend {
                draw_category_legend(area, cells[2], legend)?;
            }
        }
        Ok(())
    }

    /// Render to an SVG document.
    pub fn render_svg(&self) -> Result<String> {
        let mut svg = String::new();
        {
            let root = SVGBackend::with_string(&mut svg, self.size).into_drawing_area();
            self.render_on(&root)?;
            root.present().map_err(render_err)?;
        }
        Ok(svg)
    }
}

fn render_err<E: std::fmt::Display>(e: E) -> IobioError {
    IobioError::Render(e.to_string())
}

/// Cumulative pixel boundaries for `ratios` over `total` pixels.
fn breakpoints(total: u32, ratios: &[f64]) -> Vec<i32> {
    let sum: f64 = ratios.iter().sum();
    let n = ratios.len().max(1) as f64;
    let mut acc = 0.0;
    let mut bounds = vec![0];
    for (i, r) in ratios.iter().enumerate() {
        acc += r;
        let frac = if sum > 0.0 { acc / sum } else { (i + 1) as f64 / n };
        bounds.push((total as f64 * frac).round() as i32);
    }
    bounds
}

fn grid_for(size: (u32, u32), width_ratios: &[f64; 3], height_ratios: &[f64]) -> Vec<Rect> {
    let xs = breakpoints(size.0, width_ratios);
    let ys = breakpoints(size.1, height_ratios);
    let mut grid = Vec::with_capacity(height_ratios.len() * 3);
    for r in 0..height_ratios.len() {
        for c in 0..3 {
            grid.push(Rect {
                x0: xs[c],
                y0: ys[r],
                x1: xs[c + 1],
                y1: ys[r + 1],
            });
        }
    }
    grid
}

fn label_style(size: f64, pos: Pos) -> TextStyle<'static> {
    ("sans-serif", size).into_font().color(&BLACK).pos(pos)
}

fn draw_heatmap<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rect: Rect,
    region: &HeatmapRegion,
) -> Result<()> {
    let n_rows = region.cells.len() as i32;
    let n_cols = region.column_labels.len() as i32;

    let left = LABEL_GUTTER.min(rect.width() / 3);
    let bottom = if region.show_column_labels {
        COLUMN_LABEL_GUTTER.min(rect.height() / 3)
    } else {
        0
    };
    let (gx0, gy0) = (rect.x0 + left, rect.y0 + 4);
    let (avail_w, avail_h) = ((rect.x1 - 4 - gx0) as f64, (rect.y1 - bottom - gy0) as f64);
    if avail_w <= 0.0 || avail_h <= 0.0 {
        return Ok(());
    }

    if !region.y_label.is_empty() {
        area.draw(&Text::new(
            region.y_label.clone(),
            (rect.x0 + 10, gy0 + avail_h as i32 / 2),
            label_style(13.0, Pos::new(HPos::Center, VPos::Center)).transform(FontTransform::Rotate270),
        ))
        .map_err(render_err)?;
    }
    if n_rows == 0 || n_cols == 0 {
        return Ok(());
    }

    let mut cw = avail_w / n_cols as f64;
    let mut ch = avail_h / n_rows as f64;
    if let Some(aspect) = region.aspect {
        if cw * aspect > ch {
            cw = ch / aspect;
        } else {
            ch = cw * aspect;
        }
    }
    let x_at = |c: i32| gx0 + (c as f64 * cw).round() as i32;
    let y_at = |r: i32| gy0 + (r as f64 * ch).round() as i32;
    let (gx1, gy1) = (x_at(n_cols), y_at(n_rows));

    for (r, row) in region.cells.iter().enumerate() {
        for (c, color) in row.iter().enumerate() {
            let (r, c) = (r as i32, c as i32);
            area.draw(&Rectangle::new(
                [(x_at(c), y_at(r)), (x_at(c + 1), y_at(r + 1))],
                color.filled(),
            ))
            .map_err(render_err)?;
        }
    }

    if region.show_frame {
        area.draw(&Rectangle::new([(gx0, gy0), (gx1, gy1)], BLACK.stroke_width(1)))
            .map_err(render_err)?;
    }

    let tick = if region.show_ticks { 4 } else { 0 };
    let row_font = (ch * 0.7).clamp(6.0, 12.0);
    for (r, label) in region.row_labels.iter().enumerate() {
        let y = (y_at(r as i32) + y_at(r as i32 + 1)) / 2;
        if tick > 0 {
            area.draw(&PathElement::new(vec![(gx0 - tick, y), (gx0, y)], BLACK.stroke_width(1)))
                .map_err(render_err)?;
        }
        area.draw(&Text::new(
            label.clone(),
            (gx0 - tick - 3, y),
            label_style(row_font, Pos::new(HPos::Right, VPos::Center)),
        ))
        .map_err(render_err)?;
    }

    if region.show_column_labels {
        let col_font = (cw * 0.7).clamp(6.0, 12.0);
        for &c in &region.column_ticks {
            let Some(label) = region.column_labels.get(c) else {
                continue;
            };
            let x = (x_at(c as i32) + x_at(c as i32 + 1)) / 2;
            if tick > 0 {
                area.draw(&PathElement::new(vec![(x, gy1), (x, gy1 + tick)], BLACK.stroke_width(1)))
                    .map_err(render_err)?;
            }
            area.draw(&Text::new(
                label.clone(),
                (x, gy1 + tick + 3),
                label_style(col_font, Pos::new(HPos::Left, VPos::Center)).transform(FontTransform::Rotate90),
            ))
            .map_err(render_err)?;
        }
    }

    Ok(())
}

fn draw_color_bar<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, rect: Rect, bar: &ColorBar) -> Result<()> {
    let x0 = rect.x0 + 4;
    let x1 = x0 + 20.min(rect.width() / 3).max(1);
    let (y0, y1) = (rect.y0 + 8, rect.y1 - 8);
    let height = y1 - y0;
    if height <= 0 {
        return Ok(());
    }

    // top of the bar is vmax
    for step in 0..COLOR_BAR_STEPS {
        let top = y0 + height * step / COLOR_BAR_STEPS;
        let next = y0 + height * (step + 1) / COLOR_BAR_STEPS;
        let t = 1.0 - (step as f64 + 0.5) / COLOR_BAR_STEPS as f64;
        area.draw(&Rectangle::new([(x0, top), (x1, next)], bar.scale.color_at(t).filled()))
            .map_err(render_err)?;
    }
    area.draw(&Rectangle::new([(x0, y0), (x1, y1)], BLACK.stroke_width(1)))
        .map_err(render_err)?;

    let mid = (bar.vmin + bar.vmax) / 2.0;
    for (value, y) in [(bar.vmax, y0), (mid, (y0 + y1) / 2), (bar.vmin, y1)] {
        area.draw(&Text::new(
            format_tick(value),
            (x1 + 4, y),
            label_style(10.0, Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

fn draw_category_legend<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    rect: Rect,
    legend: &CategoryLegend,
) -> Result<()> {
    let total = LEGEND_LINE * legend.entries.len() as i32;
    let top = rect.y0 + ((rect.height() - total) / 2).max(0);
    let x = rect.x0 + 4;

    for (i, (fill, label)) in legend.entries.iter().enumerate() {
        let y = top + LEGEND_LINE * i as i32;
        area.draw(&Rectangle::new([(x, y + 3), (x + 12, y + 15)], fill.filled()))
            .map_err(render_err)?;
        area.draw(&Text::new(
            label.clone(),
            (x + 16, y + 9),
            label_style(11.0, Pos::new(HPos::Left, VPos::Center)),
        ))
        .map_err(render_err)?;
    }
    Ok(())
}

fn format_tick(value: f64) -> String {
    if value != 0.0 && (value.abs() >= 1e4 || value.abs() < 1e-2) {
        format!("{:.1e}", value)
    } else {
        format!("{:.2}", value)
    }
}
