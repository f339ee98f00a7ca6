//! The stackable panel abstraction and the regions a panel renders to.

use super::color::ColorScale;
use super::continuous::ContinuousMatrix;
use super::discrete::DiscreteMatrix;
use crate::data::NumericTable;
use crate::error::Result;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};

/// Which column labels to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TickDisplay {
    /// All labels up to a readable count, evenly thinned beyond it.
    #[default]
    Auto,
    /// Every label.
    All,
    /// No labels.
    Hidden,
    /// Every n-th label, starting with the first.
    Every(usize),
}

/// Labels shown by [`TickDisplay::Auto`] before thinning kicks in.
const AUTO_MAX_TICKS: usize = 40;

impl TickDisplay {
    /// Indices of the labels to show out of `n`.
    pub fn indices(&self, n: usize) -> Vec<usize> {
        let step = match self {
            TickDisplay::Hidden => return Vec::new(),
            TickDisplay::All => 1,
            TickDisplay::Every(k) => (*k).max(1),
            TickDisplay::Auto => n.div_ceil(AUTO_MAX_TICKS).max(1),
        };
        (0..n).step_by(step).collect()
    }
}

/// Where a panel sits in the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Position from the top, starting at 0.
    pub index: usize,
    /// Whether this is the last (bottom-most) panel.
    pub is_bottom: bool,
}

/// The colored grid of one panel plus its axis decoration.
#[derive(Debug, Clone)]
pub struct HeatmapRegion {
    /// Row labels, top to bottom.
    pub row_labels: Vec<String>,
    /// Column labels, left to right (the shared column order).
    pub column_labels: Vec<String>,
    /// Fill color per cell, `cells[row][col]`.
    pub cells: Vec<Vec<RGBColor>>,
    /// Axis label drawn beside the rows.
    pub y_label: String,
    /// Whether the column labels are drawn at all.
    pub show_column_labels: bool,
    /// Indices into `column_labels` that get a label when shown.
    pub column_ticks: Vec<usize>,
    /// Whether tick marks are drawn next to labels.
    pub show_ticks: bool,
    /// Whether a border is drawn around the grid.
    pub show_frame: bool,
    /// Fixed cell height-to-width ratio.
    pub aspect: Option<f64>,
}

/// Continuous color-bar legend.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorBar {
    /// Scale the bar shows.
    pub scale: ColorScale,
    /// Value at the bottom of the bar.
    pub vmin: f64,
    /// Value at the top of the bar.
    pub vmax: f64,
}

/// Categorical legend: one patch per category, in mapping order.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryLegend {
    /// `(fill, label)` pairs.
    pub entries: Vec<(RGBColor, String)>,
}

/// Everything one panel contributes to its row of the figure.
///
/// A `None` legend leaves that region blank.
#[derive(Debug, Clone)]
pub struct PanelRegions {
    pub data: HeatmapRegion,
    pub continuous_legend: Option<ColorBar>,
    pub discrete_legend: Option<CategoryLegend>,
}

/// A layer of a stacked heatmap.
pub trait Panel {
    /// Title, used as the y-axis label of the panel's row.
    fn title(&self) -> &str;

    /// Numeric form of the panel's values (category codes for discrete data).
    fn data(&self) -> &NumericTable;

    /// Number of rows.
    fn row_count(&self) -> usize {
        self.data().n_rows()
    }

    /// Row labels, top to bottom.
    fn row_labels(&self) -> &[String] {
        self.data().row_labels()
    }

    /// The panel's own column labels.
    fn column_labels(&self) -> &[String] {
        self.data().column_labels()
    }

    /// Values restricted to `columns`, in that order.
    ///
    /// Fails with a missing-column error if the panel lacks any of them.
    fn values_for(&self, columns: &[String]) -> Result<NumericTable> {
        self.data().select_columns(columns)
    }

    /// Render against the shared column order.
    fn render(&self, columns: &[String], placement: Placement) -> Result<PanelRegions>;
}

/// A panel of either kind, as stored in a stack.
#[derive(Debug, Clone)]
pub enum Level {
    Discrete(DiscreteMatrix),
    Continuous(ContinuousMatrix),
}

impl Level {
    fn panel(&self) -> &dyn Panel {
        match self {
            Level::Discrete(p) => p,
            Level::Continuous(p) => p,
        }
    }
}

impl Panel for Level {
    fn title(&self) -> &str {
        self.panel().title()
    }

    fn data(&self) -> &NumericTable {
        self.panel().data()
    }

    fn render(&self, columns: &[String], placement: Placement) -> Result<PanelRegions> {
        self.panel().render(columns, placement)
    }
}

impl From<DiscreteMatrix> for Level {
    fn from(panel: DiscreteMatrix) -> Self {
        Level::Discrete(panel)
    }
}

impl From<ContinuousMatrix> for Level {
    fn from(panel: ContinuousMatrix) -> Self {
        Level::Continuous(panel)
    }
}
