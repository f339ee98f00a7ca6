//! Stacking panels over a shared column order.

use super::figure::Figure;
use super::panel::{Level, Panel, Placement};
use crate::cluster::{cluster_order, Linkage};
use crate::data::check_permutation;
use crate::error::{IobioError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Figure geometry for [`StackedHeatmap::draw`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawOptions {
    /// Width and height in pixels.
    pub figure_size: (u32, u32),
    /// Relative widths of the data, color-bar and category-legend columns.
    pub width_ratios: [f64; 3],
    /// Relative panel heights; defaults to each panel's row count.
    pub height_ratios: Option<Vec<f64>>,
}

impl Default for DrawOptions {
    fn default() -> Self {
        Self {
            figure_size: (1000, 1000),
            width_ratios: [10.0, 1.0, 1.0],
            height_ratios: None,
        }
    }
}

impl DrawOptions {
    /// Load from YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(IobioError::from)
    }

    /// Save to YAML string.
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(IobioError::from)
    }

    fn validate(&self, n_panels: usize) -> Result<()> {
        if self.figure_size.0 == 0 || self.figure_size.1 == 0 {
            return Err(IobioError::InvalidParameter(format!(
                "figure size must be positive, got {:?}",
                self.figure_size
            )));
        }
        if !self.width_ratios.iter().all(|w| w.is_finite() && *w >= 0.0)
            || self.width_ratios.iter().sum::<f64>() <= 0.0
        {
            return Err(IobioError::InvalidParameter(format!(
                "width ratios must be non-negative with a positive sum, got {:?}",
                self.width_ratios
            )));
        }
        if let Some(heights) = &self.height_ratios {
            if heights.len() != n_panels {
                return Err(IobioError::DimensionMismatch {
                    expected: n_panels,
                    actual: heights.len(),
                });
            }
            if !heights.iter().all(|h| h.is_finite() && *h > 0.0) {
                return Err(IobioError::InvalidParameter(format!(
                    "height ratios must be positive, got {:?}",
                    heights
                )));
            }
        }
        Ok(())
    }
}

/// Panels stacked top to bottom, all drawn against one column order.
#[derive(Debug, Clone, Default)]
pub struct StackedHeatmap {
    levels: Vec<Level>,
    columns: Option<Vec<String>>,
}

impl StackedHeatmap {
    /// Empty stack.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a panel below the existing ones.
    pub fn add_level(&mut self, panel: impl Into<Level>) -> &mut Self {
        self.levels.push(panel.into());
        self
    }

    /// Panels, top to bottom.
    pub fn levels(&self) -> &[Level] {
        &self.levels
    }

    /// Fix the shared column order explicitly.
    pub fn set_columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    /// The shared column order.
    ///
    /// The explicit order if one was set or computed by clustering, otherwise
    /// the sorted intersection of every panel's columns.
    pub fn columns(&self) -> Vec<String> {
        if let Some(columns) = &self.columns {
            return columns.clone();
        }
        let mut levels = self.levels.iter();
        let Some(first) = levels.next() else {
            return Vec::new();
        };
        let mut shared: BTreeSet<&String> = first.column_labels().iter().collect();
        for level in levels {
            let theirs: BTreeSet<&String> = level.column_labels().iter().collect();
            shared.retain(|c| theirs.contains(c));
        }
        shared.into_iter().cloned().collect()
    }

    /// Reorder the shared columns by clustering them.
    ///
    /// All panels' values over the current shared columns are stacked into
    /// one table (discrete panels contribute their category codes) whose
    /// columns are clustered; the optimal leaf order becomes the shared
    /// order. Fewer than two columns leave the order as it is.
    pub fn cluster_columns(&mut self, method: Linkage) -> Result<()> {
        if self.levels.is_empty() {
            return Err(IobioError::EmptyData(
                "cannot cluster columns of an empty stack".to_string(),
            ));
        }
        let columns = self.columns();
        if columns.len() < 2 {
            return Ok(());
        }

        let blocks = self
            .levels
            .iter()
            .enumerate()
            .map(|(i, level)| level.values_for(&columns).map_err(|e| e.in_panel(i)))
            .collect::<Result<Vec<_>>>()?;

        let total_rows: usize = blocks.iter().map(|b| b.n_rows()).sum();
        let mut by_column = DMatrix::zeros(columns.len(), total_rows);
        let mut offset = 0;
        for block in &blocks {
            let rows = block.n_rows();
            by_column
                .columns_mut(offset, rows)
                .copy_from(&block.data().transpose());
            offset += rows;
        }

        let order = cluster_order(&by_column, method)?;
        check_permutation(&order, columns.len())?;
        let clustered: Vec<String> = order.iter().map(|&i| columns[i].clone()).collect();
        tracing::debug!(
            method = %method,
            features = total_rows,
            columns = clustered.len(),
            "clustered shared columns"
        );
        self.columns = Some(clustered);
        Ok(())
    }

    /// Relative panel heights: each panel's row count.
    pub fn predict_height_ratios(&self) -> Vec<usize> {
        self.levels.iter().map(|l| l.row_count()).collect()
    }

    /// Render every panel into one figure.
    ///
    /// Any panel that fails aborts the whole draw; a missing shared column is
    /// reported with the panel's index.
    pub fn draw(&self, options: &DrawOptions) -> Result<Figure> {
        if self.levels.is_empty() {
            return Err(IobioError::EmptyData("nothing to draw".to_string()));
        }
        options.validate(self.levels.len())?;

        let columns = self.columns();
        let height_ratios = match &options.height_ratios {
            Some(h) => h.clone(),
            None => self
                .predict_height_ratios()
                .into_iter()
                .map(|r| r as f64)
                .collect(),
        };

        let last = self.levels.len() - 1;
        let rows = self
            .levels
            .iter()
            .enumerate()
            .map(|(index, level)| {
                level
                    .render(&columns, Placement { index, is_bottom: index == last })
                    .map_err(|e| e.in_panel(index))
            })
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            panels = rows.len(),
            columns = columns.len(),
            width = options.figure_size.0,
            height = options.figure_size.1,
            ?height_ratios,
            "laid out stacked heatmap"
        );

        Ok(Figure::new(
            options.figure_size,
            options.width_ratios,
            height_ratios,
            columns,
            rows,
        ))
    }
}
