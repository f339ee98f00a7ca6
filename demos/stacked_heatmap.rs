//! Stacked heatmap of sample annotation over two expression panels.
//!
//! This example shows how to:
//! 1. Build discrete and continuous panels from in-memory tables
//! 2. Stack them and cluster the shared columns
//! 3. Render the figure to an SVG file
//!
//! Run with `RUST_LOG=iobio=debug` to see layout and clustering events.

use iobio::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Stacked Heatmap Example ===\n");

    let samples: Vec<String> = (1..=12).map(|i| format!("S{:02}", i)).collect();

    // Annotation: response group and sequencing site
    let response: Vec<String> = (0..samples.len())
        .map(|j| if j % 3 == 0 { "responder" } else { "non-responder" }.to_string())
        .collect();
    let site: Vec<String> = (0..samples.len())
        .map(|j| if j < 6 { "site A" } else { "site B" }.to_string())
        .collect();
    let annotation = CategoricalTable::new(
        vec![response, site],
        vec!["response".into(), "site".into()],
        samples.clone(),
    )?;
    let colors = CategoryColors::new()
        .with("responder", "tab:green")
        .with("non-responder", "tab:gray")
        .with("site A", "#1f77b4")
        .with("site B", "#ff7f0e");
    let annotation = DiscreteMatrix::new(annotation, Some(colors))?;

    // Expression: responders carry an interferon signature
    let interferon = create_panel(&["IFIT1", "ISG15", "MX1", "OAS1", "STAT1"], &samples, 3.0);
    let housekeeping = create_panel(&["ACTB", "GAPDH", "RPLP0"], &samples, 0.0);

    let interferon = ContinuousMatrix::with_config(
        interferon,
        ContinuousConfig {
            title: "interferon".into(),
            scale: ColorScale::RdBuR,
            center: Some(0.0),
            row_mean_normalize: true,
            cluster_rows: Some(Linkage::Average),
            ..Default::default()
        },
    )?;
    let housekeeping = ContinuousMatrix::with_config(
        housekeeping,
        ContinuousConfig {
            title: "housekeeping".into(),
            row_range_normalize: true,
            ..Default::default()
        },
    )?;

    let mut stack = StackedHeatmap::new();
    stack
        .add_level(annotation)
        .add_level(interferon)
        .add_level(housekeeping);

    println!("Panels: {}", stack.levels().len());
    println!("Height ratios: {:?}", stack.predict_height_ratios());
    println!("Columns before clustering: {:?}", stack.columns());

    stack.cluster_columns(Linkage::Average)?;
    println!("Columns after clustering:  {:?}", stack.columns());
    println!();

    let figure = stack.draw(&DrawOptions {
        figure_size: (1200, 700),
        ..Default::default()
    })?;

    let path = std::env::temp_dir().join("iobio_stacked_heatmap.svg");
    std::fs::write(&path, figure.render_svg()?)?;
    println!("Wrote {}", path.display());

    Ok(())
}

/// Log-scale expression with a per-gene baseline; responders (every third
/// sample) are shifted by `signal`.
fn create_panel(genes: &[&str], samples: &[String], signal: f64) -> NumericTable {
    let rows: Vec<Vec<f64>> = genes
        .iter()
        .enumerate()
        .map(|(g, _)| {
            (0..samples.len())
                .map(|j| {
                    let wobble = ((g * 5 + j * 7) % 11) as f64 / 11.0;
                    let shift = if j % 3 == 0 { signal } else { 0.0 };
                    4.0 + g as f64 + wobble + shift
                })
                .collect()
        })
        .collect();

    NumericTable::from_rows(
        &rows,
        genes.iter().map(|g| g.to_string()).collect(),
        samples.to_vec(),
    )
    .expect("rows match labels")
}
