//! Numeric heatmap panels.

use super::color::{color_limits, ColorScale};
use super::panel::{ColorBar, HeatmapRegion, Panel, PanelRegions, Placement, TickDisplay};
use crate::cluster::{cluster_order, Linkage};
use crate::data::NumericTable;
use crate::error::{IobioError, Result};
use crate::normalize::{row_mean_normalize, row_range_normalize};
use serde::{Deserialize, Serialize};

/// Options for a [`ContinuousMatrix`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousConfig {
    /// Panel title.
    pub title: String,
    /// Color scale.
    pub scale: ColorScale,
    /// Value at the middle of the scale; color limits become symmetric around it.
    pub center: Option<f64>,
    /// Rescale each row to [0, 1].
    pub row_range_normalize: bool,
    /// Standardize each row to mean 0, standard deviation 1.
    pub row_mean_normalize: bool,
    /// Reorder rows by hierarchical clustering with this linkage.
    pub cluster_rows: Option<Linkage>,
    /// Draw the color bar.
    pub do_legend: bool,
    /// Which column labels to draw when this is the bottom panel.
    pub x_tick_labels: TickDisplay,
}

impl Default for ContinuousConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            scale: ColorScale::default(),
            center: None,
            row_range_normalize: false,
            row_mean_normalize: false,
            cluster_rows: None,
            do_legend: true,
            x_tick_labels: TickDisplay::Auto,
        }
    }
}

impl ContinuousConfig {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(IobioError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(IobioError::from)
    }
}

/// A panel of numeric values drawn on a color scale.
///
/// Row transforms and row clustering happen once, at construction.
#[derive(Debug, Clone)]
pub struct ContinuousMatrix {
    data: NumericTable,
    config: ContinuousConfig,
}

impl ContinuousMatrix {
    /// Build a panel with default options.
    pub fn new(table: NumericTable, title: impl Into<String>) -> Result<Self> {
        Self::with_config(
            table,
            ContinuousConfig {
                title: title.into(),
                ..Default::default()
            },
        )
    }

    /// Build a panel, applying row normalization and clustering.
    pub fn with_config(table: NumericTable, config: ContinuousConfig) -> Result<Self> {
        let mut data = table;

        if config.row_range_normalize && config.row_mean_normalize {
            tracing::warn!(
                title = %config.title,
                "both row normalizations requested, applying range then mean"
            );
        }
        if config.row_range_normalize {
            data = data.with_data(row_range_normalize(data.data()))?;
        }
        if config.row_mean_normalize {
            data = data.with_data(row_mean_normalize(data.data()))?;
        }

        if let Some(method) = config.cluster_rows {
            if data.n_rows() >= 2 {
                let order = cluster_order(data.data(), method)?;
                data = data.reorder_rows(&order)?;
            }
        }

        Ok(Self { data, config })
    }

    /// Panel options.
    pub fn config(&self) -> &ContinuousConfig {
        &self.config
    }

    /// Whether the color bar is drawn.
    pub fn do_legend(&self) -> bool {
        self.config.do_legend
    }
}

impl Panel for ContinuousMatrix {
    fn title(&self) -> &str {
        &self.config.title
    }

    fn data(&self) -> &NumericTable {
        &self.data
    }

    fn render(&self, columns: &[String], placement: Placement) -> Result<PanelRegions> {
        let values = self.values_for(columns)?;
        let scale = self.config.scale;
        let (vmin, vmax) = color_limits(values.data().iter(), self.config.center);

        let cells = (0..values.n_rows())
            .map(|r| {
                values
                    .row(r)
                    .iter()
                    .map(|&v| scale.color_for(v, vmin, vmax))
                    .collect()
            })
            .collect();

        let continuous_legend = self
            .config
            .do_legend
            .then_some(ColorBar { scale, vmin, vmax });

        Ok(PanelRegions {
            data: HeatmapRegion {
                row_labels: values.row_labels().to_vec(),
                column_labels: columns.to_vec(),
                cells,
                y_label: self.config.title.clone(),
                show_column_labels: placement.is_bottom,
                column_ticks: self.config.x_tick_labels.indices(columns.len()),
                show_ticks: true,
                show_frame: true,
                aspect: None,
            },
            continuous_legend,
            discrete_legend: None,
        })
    }
}
