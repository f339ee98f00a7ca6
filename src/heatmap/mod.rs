//! Stacked heatmaps.
//!
//! A [`StackedHeatmap`] holds panels ([`DiscreteMatrix`] for categorical
//! annotation, [`ContinuousMatrix`] for numeric data) stacked top to bottom.
//! Every panel is drawn against one shared column order, given explicitly,
//! taken from the panels' common columns, or computed by clustering.
//! [`StackedHeatmap::draw`] lays the panels out on a grid with a data region
//! and two legend regions per panel and returns a [`Figure`] that renders
//! through plotters.

mod color;
mod continuous;
mod discrete;
mod figure;
mod panel;
mod stack;

pub use color::{color_limits, normalize, parse_color, ColorScale, MISSING_COLOR};
pub use continuous::{ContinuousConfig, ContinuousMatrix};
pub use discrete::{CategoryColors, DiscreteConfig, DiscreteMatrix};
pub use figure::{Figure, Rect};
pub use panel::{
    CategoryLegend, ColorBar, HeatmapRegion, Level, Panel, PanelRegions, Placement, TickDisplay,
};
pub use stack::{DrawOptions, StackedHeatmap};
