//! Static Map Renderer
//! Draws the world scatter of city growth with plotters.
//!
//! Layout:
//! 1. Title centered on top
//! 2. Map (flat-polar quartic) with graticule and one marker per city:
//!    - colour: relative growth, red-yellow-green, zero at the centre
//!    - area: absolute growth
//! 3. Colour bar on the right
//! 4. Marker size legend in the lower left corner

use crate::charts::color::{rd_yl_gn, static_marker_area, MidpointNormalize};
use crate::charts::projection::FlatPolarQuartic;
use crate::data::UrbanTable;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Plotting failed: {0}")]
    Plot(String),
    #[error("Failed to encode figure: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Nothing to render: the table has no cities")]
    EmptyTable,
    #[error("plotly.js bundle missing from the plotly crate's page")]
    MissingPlotlyJs,
    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// Colors
const OCEAN: RGBColor = RGBColor(198, 219, 239); // #c6dbef
const BORDER: RGBColor = RGBColor(82, 82, 82); // #525252
const GRID: RGBColor = RGBColor(150, 150, 150); // #969696
const EDGE: RGBColor = RGBColor(115, 115, 115); // #737373

const MARKER_ALPHA: f64 = 0.9;
const DPI: f64 = 140.0;

// Growth in thousands shown in the size legend
const SIZE_LEGEND: [(f64, &str); 4] = [
    (10.0, "10,000"),
    (100.0, "100,000"),
    (1000.0, "1 million"),
    (10000.0, "10 million"),
];

const FONT: &str = "sans-serif";

const CENTRAL_MERIDIAN: f64 = 45.0;
// Height of the colour bar's overflow arrow, relative to the bar's range
const CAP_FRACTION: f64 = 0.06;

pub struct StaticMapRenderer;

impl StaticMapRenderer {
    /// Render to `path`: PNG when the extension is `png`, SVG otherwise.
    pub fn render_to_file(
        table: &UrbanTable,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        if table.is_empty() {
            return Err(RenderError::EmptyTable);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));

        if is_png {
            let root = BitMapBackend::new(path, size).into_drawing_area();
            Self::draw(&root, table)?;
            root.present().map_err(plot_err)?;
        } else {
            let root = SVGBackend::new(path, size).into_drawing_area();
            Self::draw(&root, table)?;
            root.present().map_err(plot_err)?;
        }

        info!(cities = table.len(), "saved map to {}", path.display());
        Ok(())
    }

    /// Draw the complete figure onto any plotters backend.
    pub fn draw<DB: DrawingBackend>(
        root: &DrawingArea<DB, Shift>,
        table: &UrbanTable,
    ) -> Result<(), RenderError> {
        root.fill(&WHITE).map_err(plot_err)?;

        let (start, end) = table.reference_years();
        let title = format!(
            "Projected growth of cities with over 300,000 inhabitants ({}-{})",
            start, end
        );
        let body = root.titled(&title, (FONT, 32).into_font()).map_err(plot_err)?;

        let (width, _) = body.dim_in_pixel();
        let bar_width = (width / 12).max(120) as i32;
        let (map_area, bar_area) = body.split_horizontally(width as i32 - bar_width);

        let norm = MidpointNormalize::for_growth(table);
        debug!(vmin = norm.vmin, vmax = norm.vmax, "colour bounds");

        Self::draw_map(&map_area, table, &norm)?;
        Self::draw_size_legend(&map_area)?;
        Self::draw_colorbar(&bar_area, &norm)?;
        Ok(())
    }

    fn draw_map<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        table: &UrbanTable,
        norm: &MidpointNormalize,
    ) -> Result<(), RenderError> {
        let projection = FlatPolarQuartic::new(CENTRAL_MERIDIAN);

        // Keep the projection's aspect ratio inside the available area
        let (x_max, y_max) = FlatPolarQuartic::extent();
        let (w, h) = area.dim_in_pixel();
        let aspect = w as f64 / h.max(1) as f64;
        let (x_half, y_half) = if x_max / y_max > aspect {
            (x_max * 1.02, x_max * 1.02 / aspect)
        } else {
            (y_max * 1.02 * aspect, y_max * 1.02)
        };

        let mut chart = ChartBuilder::on(area)
            .margin(10)
            .build_cartesian_2d(-x_half..x_half, -y_half..y_half)
            .map_err(plot_err)?;

        chart
            .draw_series(std::iter::once(Polygon::new(
                projection.outline(90),
                OCEAN.filled(),
            )))
            .map_err(plot_err)?;

        let grid_style = GRID.stroke_width(1);
        for lat in (-90..=90).step_by(30) {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    projection.parallel(lat as f64, 180),
                    grid_style,
                )))
                .map_err(plot_err)?;
        }
        for lon in (0..360).step_by(60) {
            chart
                .draw_series(std::iter::once(PathElement::new(
                    projection.meridian(lon as f64, 90),
                    grid_style,
                )))
                .map_err(plot_err)?;
        }

        let mut outline = projection.outline(90);
        if let Some(&first) = outline.first() {
            outline.push(first);
        }
        chart
            .draw_series(std::iter::once(PathElement::new(
                outline,
                BORDER.stroke_width(1),
            )))
            .map_err(plot_err)?;

        // Cities without a percentage are drawn in the neutral centre colour
        let markers = table.records().iter().map(|city| {
            let pos = projection.project(city.longitude, city.latitude);
            let t = city.growth_pct.map(|p| norm.apply(p)).unwrap_or(0.5);
            let radius = marker_radius(static_marker_area(city.growth_abs));
            Circle::new(pos, radius, rd_yl_gn(t).mix(MARKER_ALPHA).filled())
        });
        chart.draw_series(markers).map_err(plot_err)?;

        let edges = table.records().iter().map(|city| {
            let pos = projection.project(city.longitude, city.latitude);
            let radius = marker_radius(static_marker_area(city.growth_abs));
            Circle::new(pos, radius, EDGE.mix(MARKER_ALPHA).stroke_width(1))
        });
        chart.draw_series(edges).map_err(plot_err)?;

        Ok(())
    }

    fn draw_size_legend<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>) -> Result<(), RenderError> {
        let (_, h) = area.dim_in_pixel();
        let row_height = 44;
        let mut y = h as i32 - row_height * SIZE_LEGEND.len() as i32 - 10;

        for (growth, label) in SIZE_LEGEND {
            let radius = marker_radius(static_marker_area(growth));
            let x = 40;
            area.draw(&Circle::new((x, y), radius, EDGE.mix(MARKER_ALPHA).stroke_width(1)))
                .map_err(plot_err)?;
            area.draw(&Text::new(
                label.to_string(),
                (x + 40, y - 8),
                (FONT, 18).into_font(),
            ))
            .map_err(plot_err)?;
            y += row_height;
        }
        Ok(())
    }

    fn draw_colorbar<DB: DrawingBackend>(
        area: &DrawingArea<DB, Shift>,
        norm: &MidpointNormalize,
    ) -> Result<(), RenderError> {
        let (vmin, vmax) = if norm.vmax > norm.vmin {
            (norm.vmin, norm.vmax)
        } else {
            (norm.vmin, norm.vmin + 1.0)
        };

        // Values above vmax share the arrow on top of the bar
        let (top, cap) = extend_max_cap(vmin, vmax);

        let mut chart = ChartBuilder::on(area)
            .margin_top(60)
            .margin_bottom(60)
            .margin_right(10)
            .y_label_area_size(70)
            .build_cartesian_2d(0.0..1.0, vmin..top)
            .map_err(plot_err)?;

        chart
            .configure_mesh()
            .disable_mesh()
            .disable_x_axis()
            .y_desc("Relative city size growth (%)")
            .y_label_formatter(&|v: &f64| {
                if *v > vmax {
                    String::new()
                } else {
                    format!("{:.0}", v)
                }
            })
            .draw()
            .map_err(plot_err)?;

        let steps = 100;
        let step = (vmax - vmin) / steps as f64;
        let slices = (0..steps).map(|i| {
            let lo = vmin + step * i as f64;
            let hi = lo + step;
            let color = rd_yl_gn(norm.apply((lo + hi) / 2.0));
            Rectangle::new([(0.0, lo), (1.0, hi)], color.filled())
        });
        chart.draw_series(slices).map_err(plot_err)?;

        chart
            .draw_series(std::iter::once(Polygon::new(cap, rd_yl_gn(1.0).filled())))
            .map_err(plot_err)?;

        Ok(())
    }
}

/// Top of the colour bar axis and the triangle drawn between `vmax` and it.
fn extend_max_cap(vmin: f64, vmax: f64) -> (f64, Vec<(f64, f64)>) {
    let top = vmax + (vmax - vmin) * CAP_FRACTION;
    (top, vec![(0.0, vmax), (1.0, vmax), (0.5, top)])
}

/// Pixel radius of a marker with matplotlib-style area `s` (points squared).
pub fn marker_radius(area_pt2: f64) -> i32 {
    let radius_pt = area_pt2.sqrt() / 2.0;
    (radius_pt * DPI / 72.0).round().max(1.0) as i32
}

fn plot_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Plot(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::data::DataProcessor;
    use polars::prelude::*;

    fn two_cities() -> UrbanTable {
        let df = DataFrame::new(vec![
            Column::new("Index".into(), vec!["1", "2"]),
            Column::new("Country or area".into(), vec!["India", "Japan"]),
            Column::new("Latitude".into(), vec!["28.6667", "35.6895"]),
            Column::new("Longitude".into(), vec!["77.2167", "139.6917"]),
            Column::new("Urban Agglomeration".into(), vec!["Delhi", "Tokyo"]),
            Column::new("2018".into(), vec!["28 513.682", "37 468.302"]),
            Column::new("2035".into(), vec!["43 345.161", "36 014.211"]),
        ])
        .unwrap();
        DataProcessor::build_table(&df, &DatasetConfig::default()).unwrap()
    }

    #[test]
    fn svg_has_title_and_a_marker_per_city() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphics/map.svg");
        let table = two_cities();
        StaticMapRenderer::render_to_file(&table, &path, (2240, 1120)).unwrap();

        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("Projected growth of cities with over 300,000 inhabitants (2018-2035)"));
        assert!(svg.contains("Relative city size growth (%)"));
        // Fill and edge per city, one ring per size legend entry
        assert_eq!(
            svg.matches("<circle").count(),
            2 * table.len() + SIZE_LEGEND.len()
        );
        // Ocean and the colour bar arrow
        assert_eq!(svg.matches("<polygon").count(), 2);
    }

    #[test]
    fn png_extension_writes_bitmap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.png");
        StaticMapRenderer::render_to_file(&two_cities(), &path, (800, 400)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
    }

    #[test]
    fn colorbar_cap_sits_above_vmax() {
        let (top, cap) = extend_max_cap(-20.0, 80.0);
        assert!((top - 86.0).abs() < 1e-9);
        assert_eq!(cap, vec![(0.0, 80.0), (1.0, 80.0), (0.5, top)]);
    }

    #[test]
    fn marker_radius_grows_with_area() {
        let small = marker_radius(static_marker_area(10.0));
        let large = marker_radius(static_marker_area(10000.0));
        assert!(small >= 1);
        assert!(large > small);
        assert_eq!(marker_radius(0.0), 1);
    }

    #[test]
    fn empty_table_is_not_rendered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.svg");
        let err = StaticMapRenderer::render_to_file(&UrbanTable::default(), &path, (400, 200))
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyTable));
        assert!(!path.exists());
    }
}
