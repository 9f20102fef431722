//! Interactive Globe Writer
//! Builds a plotly `scattergeo` figure and saves it as a standalone HTML page
//! with plotly.js inlined.

use crate::charts::color::{globe_marker_size, growth_color_bounds};
use crate::charts::renderer::RenderError;
use crate::config::OutputConfig;
use crate::data::{CityRecord, UrbanTable};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use tracing::info;

// First line of the minified plotly.js licence banner
const PLOTLY_BANNER: &str = "plotly.js v";
const SOURCE_URL: &str = "https://esa.un.org/unpd/wup/";

/// Extra layout keys merged over the defaults, mirroring plotly's `update`.
#[derive(Debug, Clone, Default)]
pub struct LayoutOverrides {
    pub layout: serde_json::Map<String, Value>,
    pub geo: serde_json::Map<String, Value>,
}

impl From<&OutputConfig> for LayoutOverrides {
    fn from(output: &OutputConfig) -> Self {
        Self {
            layout: output.globe_layout.clone(),
            geo: output.globe_geo.clone(),
        }
    }
}

pub struct GlobeWriter;

impl GlobeWriter {
    /// The single `scattergeo` trace.
    pub fn make_data(table: &UrbanTable) -> Value {
        let (cmin, cmax) = growth_color_bounds(table);
        let records = table.records();

        let lon: Vec<f64> = records.iter().map(|r| r.longitude).collect();
        let lat: Vec<f64> = records.iter().map(|r| r.latitude).collect();
        let color: Vec<Option<f64>> = records.iter().map(|r| r.growth_pct).collect();
        let size: Vec<f64> = records
            .iter()
            .map(|r| globe_marker_size(r.growth_abs))
            .collect();
        let text: Vec<String> = records.iter().map(hover_label).collect();

        json!([{
            "type": "scattergeo",
            "lon": lon,
            "lat": lat,
            "marker": {
                "color": color,
                "colorscale": "Portland",
                "colorbar": { "ticksuffix": "%" },
                "reversescale": true,
                "showscale": true,
                "cmin": cmin,
                "cmax": cmax,
                "sizemode": "area",
                "size": size,
            },
            "showlegend": false,
            "text": text,
            "hoverinfo": "text",
        }])
    }

    /// Global layout: orthographic globe with the dataset's colours.
    pub fn make_layout(table: &UrbanTable, overrides: &LayoutOverrides) -> Value {
        let (start, end) = table.reference_years();
        let mut layout = json!({
            "title": format!(
                "Projected growth of cities with over 300,000 inhabitants ({}-{})\
                 <br>Source: <a href=\"{}\"> UN World Urbanization Prospects 2018</a>",
                start, end, SOURCE_URL
            ),
            "showlegend": true,
            "geo": {
                "scope": "world",
                "projection": { "type": "orthographic" },
                "showland": true,
                "showcoastlines": true,
                "resolution": 110,
                "showcountries": true,
                "countrycolor": "#525252",
                "showocean": true,
                "oceancolor": "#c6dbef",
                "showlakes": true,
                "lakecolor": "#c6dbef",
                "showrivers": true,
                "rivercolor": "#c6dbef",
                "landcolor": "#f2e0c9",
                "subunitwidth": 1,
                "countrywidth": 1,
            },
        });

        if let Some(obj) = layout.as_object_mut() {
            for (k, v) in &overrides.layout {
                obj.insert(k.clone(), v.clone());
            }
            if let Some(geo) = obj.get_mut("geo").and_then(Value::as_object_mut) {
                for (k, v) in &overrides.geo {
                    geo.insert(k.clone(), v.clone());
                }
            }
        }
        layout
    }

    pub fn make_figure(table: &UrbanTable, overrides: &LayoutOverrides) -> Value {
        json!({
            "data": Self::make_data(table),
            "layout": Self::make_layout(table, overrides),
        })
    }

    /// plotly.js as bundled by the `plotly` crate, lifted from the inline
    /// scripts of an empty plotly page.
    fn plotly_js() -> Result<String, RenderError> {
        let page = plotly::Plot::new().to_html();
        script_blocks(&page)
            .into_iter()
            .map(|(_, body)| body)
            .find(|body| body.contains(PLOTLY_BANNER))
            .map(str::to_string)
            .ok_or(RenderError::MissingPlotlyJs)
    }

    /// Render the figure into a self-contained HTML document.
    pub fn to_html(figure: &Value) -> Result<String, RenderError> {
        // Keep "</" out of the inline script
        let figure_json = serde_json::to_string(figure)?.replace("</", "<\\/");
        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>Urban growth</title>
<script type="text/javascript">{plotly_js}</script>
</head>
<body style="margin:0">
<div id="urban-growth" style="width:100%;height:100vh;"></div>
<script>
var figure = {figure};
Plotly.newPlot("urban-growth", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
            plotly_js = Self::plotly_js()?,
            figure = figure_json
        ))
    }

    /// Write the page and optionally open it in the system viewer.
    pub fn write(
        table: &UrbanTable,
        path: &Path,
        overrides: &LayoutOverrides,
        auto_open: bool,
    ) -> Result<(), RenderError> {
        if table.is_empty() {
            return Err(RenderError::EmptyTable);
        }
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let html = Self::to_html(&Self::make_figure(table, overrides))?;
        fs::write(path, html)?;
        info!(cities = table.len(), "saved globe to {}", path.display());

        if auto_open {
            open::that(path).map_err(|source| RenderError::Open {
                path: path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }
}

/// `(opening tag, body)` of every `<script>` element, in document order.
fn script_blocks(html: &str) -> Vec<(&str, &str)> {
    const CLOSE: &str = "</script>";
    let mut blocks = Vec::new();
    let mut rest = html;
    while let Some(start) = rest.find("<script") {
        let tail = &rest[start..];
        let Some(tag_end) = tail.find('>') else { break };
        let (tag, after) = tail.split_at(tag_end + 1);
        let Some(close) = after.find(CLOSE) else { break };
        blocks.push((tag, &after[..close]));
        rest = &after[close + CLOSE.len()..];
    }
    blocks
}

/// Hover text, e.g. `Delhi: +14,831,479 (+52.0%)`.
pub fn hover_label(city: &CityRecord) -> String {
    let people = (city.growth_abs * 1000.0).round() as i64;
    let pct = match city.growth_pct {
        Some(p) => format!("{:+.1}%", p),
        None => "n/a".to_string(),
    };
    format!("{}: {} ({})", city.name, format_signed_thousands(people), pct)
}

/// `+1,234,567` / `-1,000` / `+0`
pub fn format_signed_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if n < 0 { '-' } else { '+' };
    format!("{}{}", sign, grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetConfig;
    use crate::data::DataProcessor;
    use polars::prelude::*;

    fn table() -> UrbanTable {
        let df = DataFrame::new(vec![
            Column::new("Index".into(), vec!["1", "2", "3"]),
            Column::new("Country or area".into(), vec!["India", "Japan", "Nowhere"]),
            Column::new("Latitude".into(), vec!["28.6667", "35.6895", "0"]),
            Column::new("Longitude".into(), vec!["77.2167", "139.6917", "0"]),
            Column::new("Urban Agglomeration".into(), vec!["Delhi", "Tokyo", "Newtown"]),
            Column::new("2018".into(), vec!["28 513.682", "37 468.302", "0"]),
            Column::new("2035".into(), vec!["43 345.161", "36 014.211", "500"]),
        ])
        .unwrap();
        DataProcessor::build_table(&df, &DatasetConfig::default()).unwrap()
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_signed_thousands(0), "+0");
        assert_eq!(format_signed_thousands(999), "+999");
        assert_eq!(format_signed_thousands(1000), "+1,000");
        assert_eq!(format_signed_thousands(-1_454_091), "-1,454,091");
        assert_eq!(format_signed_thousands(14_831_479), "+14,831,479");
    }

    #[test]
    fn hover_labels_use_city_name() {
        let t = table();
        assert_eq!(
            hover_label(t.get("Delhi").unwrap()),
            "Delhi: +14,831,479 (+52.0%)"
        );
        assert_eq!(
            hover_label(t.get("Tokyo").unwrap()),
            "Tokyo: -1,454,091 (-3.9%)"
        );
        assert_eq!(hover_label(t.get("Newtown").unwrap()), "Newtown: +500,000 (n/a)");
    }

    #[test]
    fn trace_carries_colour_and_size() {
        let data = GlobeWriter::make_data(&table());
        let trace = &data[0];
        assert_eq!(trace["type"], "scattergeo");
        assert_eq!(trace["lon"].as_array().unwrap().len(), 3);
        assert_eq!(trace["marker"]["colorscale"], "Portland");
        assert!(trace["marker"]["color"][2].is_null());
        assert_eq!(trace["marker"]["size"][2], json!(500f64.powf(0.7) + 5.0));
        assert!(trace["marker"]["cmin"].as_f64().unwrap() < 0.0);
    }

    #[test]
    fn layout_overrides_are_merged() {
        let mut overrides = LayoutOverrides::default();
        overrides.layout.insert("showlegend".into(), json!(false));
        overrides.geo.insert("landcolor".into(), json!("#ffffff"));
        let layout = GlobeWriter::make_layout(&table(), &overrides);
        assert_eq!(layout["showlegend"], false);
        assert_eq!(layout["geo"]["landcolor"], "#ffffff");
        assert_eq!(layout["geo"]["projection"]["type"], "orthographic");
        assert!(layout["title"].as_str().unwrap().contains("(2018-2035)"));
    }

    #[test]
    fn output_config_feeds_overrides() {
        let mut output = OutputConfig::default();
        output
            .globe_geo
            .insert("projection".into(), json!({"type": "natural earth"}));
        let layout = GlobeWriter::make_layout(&table(), &LayoutOverrides::from(&output));
        assert_eq!(layout["geo"]["projection"]["type"], "natural earth");
        assert_eq!(layout["geo"]["landcolor"], "#f2e0c9");
    }

    #[test]
    fn html_escapes_closing_tags() {
        let html = GlobeWriter::to_html(&json!({"data": [], "layout": {"title": "<a>x</a>"}}))
            .unwrap();
        assert!(html.contains(r#"<a>x<\/a>"#));
    }

    #[test]
    fn html_inlines_plotly_js() {
        let html = GlobeWriter::to_html(&json!({"data": [], "layout": {}})).unwrap();
        let scripts = script_blocks(&html);
        assert_eq!(scripts.len(), 2);
        assert!(scripts.iter().all(|(tag, _)| !tag.contains("src=")));
        assert!(scripts[0].1.contains(PLOTLY_BANNER));
        assert!(scripts[1].1.contains("Plotly.newPlot"));
    }

    #[test]
    fn script_blocks_split_tags_and_bodies() {
        let html = r#"<head><script src="x.js"></script></head><script type="module">let a = 1 < 2;</script>"#;
        assert_eq!(
            script_blocks(html),
            vec![
                (r#"<script src="x.js">"#, ""),
                (r#"<script type="module">"#, "let a = 1 < 2;"),
            ]
        );
    }

    #[test]
    fn writes_html_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graphics/globe.html");
        GlobeWriter::write(&table(), &path, &LayoutOverrides::default(), false).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("scattergeo"));
        assert!(html.contains("Delhi: +14,831,479 (+52.0%)"));
    }

    #[test]
    fn empty_table_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("globe.html");
        let err = GlobeWriter::write(&UrbanTable::default(), &path, &LayoutOverrides::default(), false)
            .unwrap_err();
        assert!(matches!(err, RenderError::EmptyTable));
    }
}
