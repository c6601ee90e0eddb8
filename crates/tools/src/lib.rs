use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use canvas::{Canvas, CommandLog, SvgCanvas, TooltipState};
use formats::{MapData, MapManifest, VariantConfig};
use foundation::ids::StationId;
use foundation::math::Vec2;
use foundation::time::Time;
use layers::trend::TrendPlot;
use layers::{MapView, Surfaces, Viewport};
use scene::YearBucket;
use serde::Serialize;
use tracing::info;

/// Where the map assets come from.
#[derive(Debug, Clone, Default)]
pub struct Source {
    pub data_dir: PathBuf,
    pub manifest: Option<PathBuf>,
    /// Preset name, or a path to a variant JSON file.
    pub variant: Option<String>,
}

pub fn resolve_variant(name: &str) -> Result<VariantConfig> {
    let path = Path::new(name);
    if path.extension().is_some_and(|ext| ext == "json") {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read variant {}", path.display()))?;
        return VariantConfig::from_json_str(&text)
            .with_context(|| format!("parse variant {}", path.display()));
    }
    Ok(VariantConfig::preset(name)?)
}

pub fn load(source: &Source) -> Result<MapData> {
    let manifest = match &source.manifest {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("read manifest {}", path.display()))?;
            MapManifest::from_json_str(&text)
                .with_context(|| format!("parse manifest {}", path.display()))?
        }
        None => MapManifest::default(),
    };
    let variant = match source.variant.as_deref().or(manifest.variant.as_deref()) {
        Some(name) => resolve_variant(name)?,
        None => VariantConfig::default(),
    };
    info!(variant = %variant.name, root = %source.data_dir.display(), "loading map data");
    Ok(MapData::load_from_dir(&source.data_dir, &manifest, variant)?)
}

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub year: Option<String>,
    pub category: Option<String>,
    pub width: f64,
    pub height: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            year: None,
            category: None,
            width: 960.0,
            height: 600.0,
        }
    }
}

/// Renders the map with every transition settled and returns the SVG text.
pub fn render_snapshot(data: MapData, opts: &RenderOptions) -> Result<String> {
    let mut view_state = MapView::initial_view_state(&data);
    if let Some(year) = &opts.year {
        view_state.set_year(year)?;
    }
    if let Some(category) = &opts.category {
        view_state.set_category(category, &data.variant.category_filter())?;
    }
    let settle = Time::from_millis(data.variant.transition_ms).add_millis(1.0);

    let mut map = SvgCanvas::new();
    let mut plot = CommandLog::new();
    let mut tooltip = TooltipState::default();
    let mut surfaces = Surfaces {
        map: &mut map,
        plot: &mut plot,
        tooltip: &mut tooltip,
        plot_size: Vec2::ZERO,
    };
    let viewport = Viewport::new(opts.width, opts.height, opts.width);
    let mut view = MapView::new(data, viewport, view_state, &mut surfaces, Time(0.0));
    view.tick(settle, &mut surfaces);

    info!(nodes = map.node_count(), "rendered map snapshot");
    Ok(map.to_svg_string(opts.width, opts.height))
}

/// One station's trend plot as SVG.
pub fn render_trend(data: &MapData, station: &str, year: Option<&str>, size: Vec2) -> Result<String> {
    let year = match year {
        Some(raw) => YearBucket::parse(raw).ok_or_else(|| anyhow!("invalid year bucket {raw:?}"))?,
        None => YearBucket::FIRST,
    };
    let record = data
        .dataset
        .get(&StationId::from(station))
        .ok_or_else(|| anyhow!("unknown station {station:?}"))?;
    let plot = TrendPlot::build(record, year, &data.variant.year_labels);

    let mut canvas = SvgCanvas::new();
    canvas.apply_all(&plot.draw(size));
    Ok(canvas.to_svg_string(size.x, size.y))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub variant: String,
    pub stations: usize,
    pub towns: usize,
    pub water_polygons: usize,
    pub water_lines: usize,
    /// Station count per BCG category code.
    pub records_per_tier: BTreeMap<String, usize>,
    /// Missing metric cells per year bucket, over the variant's families.
    pub missing_per_bucket: BTreeMap<u8, usize>,
}

pub fn inspect(data: &MapData) -> DatasetSummary {
    let mut records_per_tier = BTreeMap::new();
    let mut missing_per_bucket: BTreeMap<u8, usize> =
        YearBucket::all().map(|y| (y.get(), 0)).collect();

    for record in data.dataset.iter() {
        *records_per_tier.entry(record.tier.to_string()).or_default() += 1;
        for family in &data.variant.metric_families {
            for year in YearBucket::all() {
                if record.value(family.kind, year).is_none() {
                    *missing_per_bucket.entry(year.get()).or_default() += 1;
                }
            }
        }
    }

    DatasetSummary {
        variant: data.variant.name.clone(),
        stations: data.dataset.len(),
        towns: data.towns.len(),
        water_polygons: data.water_polygons.len(),
        water_lines: data.water_lines.len(),
        records_per_tier,
        missing_per_bucket,
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderOptions, inspect, render_snapshot, render_trend};
    use formats::{MapData, MapManifest, MapPayloads, VariantConfig};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;

    const TOWNS: &str = r#"{
        "type": "Topology",
        "arcs": [[[-73.0, 41.0], [-72.0, 41.0], [-72.0, 42.0], [-73.0, 41.0]]],
        "objects": { "CTTowns": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "arcs": [[0]], "properties": { "name": "Lyme" } }
        ] } }
    }"#;
    const WATER_POLY: &str = r#"{"type":"Topology","arcs":[],"objects":{"StateWaterbodyPoly":{"type":"GeometryCollection","geometries":[]}}}"#;
    const WATER_LINE: &str = r#"{"type":"Topology","arcs":[],"objects":{"StateWaterbodyLine":{"type":"GeometryCollection","geometries":[]}}}"#;

    const METRICS: &str = "\
Station_Name,Municipality_Name,XLong,YLat,BCG,Metric,Yr1,Yr2,Yr3,Yr4,Yr5,Yr6
Mill Brook,Lyme,-72.3,41.4,2,T2,0.3,0.25,,0.2,0.2,0.1
Mill Brook,Lyme,-72.3,41.4,2,T5,0.1,0.1,0.1,,0.1,0.1
Hop River,Coventry,-72.6,41.7,5,T5,0.8,0.6,0.5,0.5,0.4,0.3
";

    fn data() -> MapData {
        let payloads = MapPayloads {
            towns: TOWNS.into(),
            water_polygons: WATER_POLY.into(),
            water_lines: WATER_LINE.into(),
            metrics: METRICS.into(),
        };
        MapData::from_payloads(&MapManifest::default(), VariantConfig::combined(), &payloads)
            .unwrap()
    }

    #[test]
    fn snapshot_has_settled_markers_and_hides_other_category() {
        let svg = render_snapshot(
            data(),
            &RenderOptions {
                year: Some("1".into()),
                category: Some("5".into()),
                ..RenderOptions::default()
            },
        )
        .unwrap();
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<circle").count() - 2, 3, "two legend circles");
        // Hop River at 0.8 on [0, 40] settles at 32.
        assert!(svg.contains(r#"r="32""#));
        assert_eq!(svg.matches(r#"display="none""#).count(), 2);
    }

    #[test]
    fn snapshot_rejects_out_of_range_year() {
        let err = render_snapshot(
            data(),
            &RenderOptions {
                year: Some("7".into()),
                ..RenderOptions::default()
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains('7'));
    }

    #[test]
    fn trend_needs_a_known_station() {
        let data = data();
        let svg = render_trend(&data, "Hop River/T5", Some("3"), Vec2::new(300.0, 200.0)).unwrap();
        assert!(svg.contains("Hop River"));
        assert!(render_trend(&data, "Nowhere/T2", None, Vec2::new(300.0, 200.0)).is_err());
    }

    #[test]
    fn inspect_counts_tiers_and_missing_cells() {
        let summary = inspect(&data());
        assert_eq!(summary.stations, 3);
        assert_eq!(summary.towns, 1);
        assert_eq!(summary.records_per_tier.get("2"), Some(&2));
        assert_eq!(summary.records_per_tier.get("5"), Some(&1));
        assert_eq!(summary.missing_per_bucket.get(&3), Some(&1));
        assert_eq!(summary.missing_per_bucket.get(&4), Some(&1));
        assert_eq!(summary.missing_per_bucket.get(&1), Some(&0));
    }
}
