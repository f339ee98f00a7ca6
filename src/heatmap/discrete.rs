//! Categorical heatmap panels.

use super::color::parse_color;
use super::panel::{CategoryLegend, HeatmapRegion, Panel, PanelRegions, Placement, TickDisplay};
use crate::data::{CategoricalTable, NumericTable};
use crate::error::{IobioError, Result};
use nalgebra::DMatrix;
use plotters::style::RGBColor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Ordered category → color mapping.
///
/// Order matters: it fixes the category codes and the legend order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryColors(Vec<(String, String)>);

impl CategoryColors {
    /// Empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a category with its color, builder style.
    pub fn with(mut self, category: impl Into<String>, color: impl Into<String>) -> Self {
        self.0.push((category.into(), color.into()));
        self
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `(category, color)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(c, k)| (c.as_str(), k.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CategoryColors {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Options for a [`DiscreteMatrix`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscreteConfig {
    /// Panel title.
    pub title: String,
    /// Fixed cell height-to-width ratio.
    pub aspect: Option<f64>,
    /// Category colors; required.
    pub colors: Option<CategoryColors>,
}

/// A panel of categorical values drawn with one color per category.
#[derive(Debug, Clone)]
pub struct DiscreteMatrix {
    title: String,
    codes: NumericTable,
    legend: Vec<(String, String)>,
    palette: Vec<RGBColor>,
    aspect: Option<f64>,
}

impl DiscreteMatrix {
    /// Build a panel from categorical data and its color mapping.
    pub fn new(table: CategoricalTable, colors: Option<CategoryColors>) -> Result<Self> {
        Self::with_config(
            table,
            DiscreteConfig {
                colors,
                ..Default::default()
            },
        )
    }

    /// Build a panel with title and aspect options.
    ///
    /// Fails with a configuration error when the mapping is absent or empty,
    /// lists a category twice, holds an unparseable color, or misses a
    /// category present in the data.
    pub fn with_config(table: CategoricalTable, config: DiscreteConfig) -> Result<Self> {
        let colors = config.colors.ok_or_else(|| {
            IobioError::Configuration("DiscreteMatrix requires a category to color mapping".to_string())
        })?;
        if colors.is_empty() {
            return Err(IobioError::Configuration(
                "DiscreteMatrix color mapping is empty".to_string(),
            ));
        }
        if let Some(aspect) = config.aspect {
            if !(aspect.is_finite() && aspect > 0.0) {
                return Err(IobioError::Configuration(format!(
                    "aspect must be a positive number, got {}",
                    aspect
                )));
            }
        }

        let mut code_of: HashMap<&str, usize> = HashMap::with_capacity(colors.len());
        let mut palette = Vec::with_capacity(colors.len());
        for (code, (category, color)) in colors.iter().enumerate() {
            if code_of.insert(category, code).is_some() {
                return Err(IobioError::Configuration(format!(
                    "category '{}' is mapped twice",
                    category
                )));
            }
            palette.push(parse_color(color)?);
        }

        let mut codes = DMatrix::zeros(table.n_rows(), table.n_cols());
        for (r, row) in table.rows().iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                let code = code_of.get(value.as_str()).ok_or_else(|| {
                    IobioError::Configuration(format!(
                        "value '{}' at row '{}', column '{}' has no color",
                        value,
                        table.row_labels()[r],
                        table.column_labels()[c]
                    ))
                })?;
                codes[(r, c)] = *code as f64;
            }
        }

        let legend = colors
            .iter()
            .map(|(category, color)| (color.to_string(), category.to_string()))
            .collect();

        Ok(Self {
            title: config.title,
            codes: NumericTable::new(
                codes,
                table.row_labels().to_vec(),
                table.column_labels().to_vec(),
            )?,
            legend,
            palette,
            aspect: config.aspect,
        })
    }

    /// Category codes, in mapping order starting at 0.
    pub fn codes(&self) -> &NumericTable {
        &self.codes
    }

    /// `(color, label)` legend entries in mapping order.
    pub fn legend(&self) -> &[(String, String)] {
        &self.legend
    }

    /// Fixed cell aspect, if any.
    pub fn aspect(&self) -> Option<f64> {
        self.aspect
    }
}

impl Panel for DiscreteMatrix {
    fn title(&self) -> &str {
        &self.title
    }

    fn data(&self) -> &NumericTable {
        &self.codes
    }

    fn render(&self, columns: &[String], placement: Placement) -> Result<PanelRegions> {
        let values = self.values_for(columns)?;
        let cells = (0..values.n_rows())
            .map(|r| {
                values
                    .row(r)
                    .iter()
                    .map(|&code| self.palette[code as usize])
                    .collect()
            })
            .collect();

        let entries = self
            .palette
            .iter()
            .zip(&self.legend)
            .map(|(fill, (_, label))| (*fill, label.clone()))
            .collect();

        Ok(PanelRegions {
            data: HeatmapRegion {
                row_labels: values.row_labels().to_vec(),
                column_labels: columns.to_vec(),
                cells,
                y_label: self.title.clone(),
                show_column_labels: placement.is_bottom,
                column_ticks: TickDisplay::All.indices(columns.len()),
                show_ticks: false,
                show_frame: false,
                aspect: self.aspect,
            },
            continuous_legend: None,
            discrete_legend: Some(CategoryLegend { entries }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_table() -> CategoricalTable {
        CategoricalTable::new(
            vec![
                vec!["A".into(), "B".into()],
                vec!["B".into(), "A".into()],
            ],
            vec!["g1".into(), "g2".into()],
            vec!["s1".into(), "s2".into()],
        )
        .unwrap()
    }

    fn create_test_colors() -> CategoryColors {
        CategoryColors::new().with("A", "red").with("B", "blue")
    }

    #[test]
    fn test_codes_and_legend() {
        let panel = DiscreteMatrix::new(create_test_table(), Some(create_test_colors())).unwrap();
        assert_eq!(panel.codes().row(0), vec![0.0, 1.0]);
        assert_eq!(panel.codes().row(1), vec![1.0, 0.0]);
        assert_eq!(
            panel.legend(),
            &[("red".to_string(), "A".to_string()), ("blue".to_string(), "B".to_string())]
        );
        assert_eq!(panel.row_count(), 2);
    }

    #[test]
    fn test_requires_mapping() {
        let err = DiscreteMatrix::new(create_test_table(), None).unwrap_err();
        assert!(matches!(err, IobioError::Configuration(_)));

        let err = DiscreteMatrix::new(create_test_table(), Some(CategoryColors::new())).unwrap_err();
        assert!(matches!(err, IobioError::Configuration(_)));
    }

    #[test]
    fn test_rejects_bad_mappings() {
        let unmapped = CategoryColors::new().with("A", "red");
        assert!(DiscreteMatrix::new(create_test_table(), Some(unmapped)).is_err());

        let duplicate = create_test_colors().with("A", "green");
        assert!(DiscreteMatrix::new(create_test_table(), Some(duplicate)).is_err());

        let bad_color = CategoryColors::new().with("A", "red").with("B", "#zzzzzz");
        assert!(DiscreteMatrix::new(create_test_table(), Some(bad_color)).is_err());
    }

    #[test]
    fn test_codes_follow_mapping_order() {
        let colors: CategoryColors = vec![("B", "#0000ff"), ("A", "#ff0000")].into_iter().collect();
        let panel = DiscreteMatrix::new(create_test_table(), Some(colors)).unwrap();
        assert_eq!(panel.codes().row(0), vec![1.0, 0.0]);
        assert_eq!(panel.legend()[0].1, "B");
    }

    #[test]
    fn test_render_regions() {
        let panel = DiscreteMatrix::with_config(
            create_test_table(),
            DiscreteConfig {
                title: "group".into(),
                aspect: Some(1.0),
                colors: Some(create_test_colors()),
            },
        )
        .unwrap();

        let columns = vec!["s2".to_string(), "s1".to_string()];
        let regions = panel
            .render(&columns, Placement { index: 0, is_bottom: false })
            .unwrap();

        assert_eq!(regions.data.cells[0], vec![RGBColor(0, 0, 255), RGBColor(255, 0, 0)]);
        assert!(!regions.data.show_column_labels);
        assert!(!regions.data.show_frame);
        assert!(!regions.data.show_ticks);
        assert_eq!(regions.data.y_label, "group");
        assert!(regions.continuous_legend.is_none());
        let legend = regions.discrete_legend.unwrap();
        assert_eq!(legend.entries[1], (RGBColor(0, 0, 255), "B".to_string()));
    }

    #[test]
    fn test_render_missing_column() {
        let panel = DiscreteMatrix::new(create_test_table(), Some(create_test_colors())).unwrap();
        let err = panel
            .render(&["s9".to_string()], Placement { index: 0, is_bottom: true })
            .unwrap_err();
        assert!(matches!(err, IobioError::MissingColumn(c) if c == "s9"));
    }
}
