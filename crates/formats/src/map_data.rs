use std::fs;
use std::path::{Path, PathBuf};

use scene::MetricDataset;
use thiserror::Error;
use tracing::info;

use crate::geometry::FeatureCollection;
use crate::manifest::{MapManifest, TopologyAsset};
use crate::metric_table::{MetricTableError, parse_metric_table};
use crate::topology::{Topology, TopologyError};
use crate::variant::VariantConfig;

/// Any failure while loading; nothing is drawn when one occurs.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
    #[error("failed to decode {asset}: {source}")]
    Topology {
        asset: String,
        source: TopologyError,
    },
    #[error("failed to parse {asset}: {source}")]
    MetricTable {
        asset: String,
        source: MetricTableError,
    },
}

/// Raw asset bodies, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct MapPayloads {
    pub towns: String,
    pub water_polygons: String,
    pub water_lines: String,
    pub metrics: String,
}

impl From<(String, String, String, String)> for MapPayloads {
    fn from((towns, water_polygons, water_lines, metrics): (String, String, String, String)) -> Self {
        Self {
            towns,
            water_polygons,
            water_lines,
            metrics,
        }
    }
}

/// Everything a map render needs, decoded.
#[derive(Debug, Clone)]
pub struct MapData {
    pub variant: VariantConfig,
    pub towns: FeatureCollection,
    pub water_polygons: FeatureCollection,
    pub water_lines: FeatureCollection,
    pub dataset: MetricDataset,
}

impl MapData {
    pub fn from_payloads(
        manifest: &MapManifest,
        variant: VariantConfig,
        payloads: &MapPayloads,
    ) -> Result<Self, LoadError> {
        let towns = decode_topology(&manifest.towns, &payloads.towns)?;
        let water_polygons = decode_topology(&manifest.water_polygons, &payloads.water_polygons)?;
        let water_lines = decode_topology(&manifest.water_lines, &payloads.water_lines)?;
        let dataset = parse_metric_table(&payloads.metrics, &variant).map_err(|source| {
            LoadError::MetricTable {
                asset: manifest.metrics.clone(),
                source,
            }
        })?;

        info!(
            towns = towns.len(),
            water_polygons = water_polygons.len(),
            water_lines = water_lines.len(),
            stations = dataset.len(),
            "map data loaded"
        );
        Ok(Self {
            variant,
            towns,
            water_polygons,
            water_lines,
            dataset,
        })
    }

    /// Reads the manifest's assets from `root` and decodes them.
    pub fn load_from_dir(
        root: impl AsRef<Path>,
        manifest: &MapManifest,
        variant: VariantConfig,
    ) -> Result<Self, LoadError> {
        let root = root.as_ref();
        let read = |rel: &str| {
            let path = root.join(rel);
            fs::read_to_string(&path).map_err(|source| LoadError::Io { path, source })
        };
        let payloads = MapPayloads {
            towns: read(&manifest.towns.path)?,
            water_polygons: read(&manifest.water_polygons.path)?,
            water_lines: read(&manifest.water_lines.path)?,
            metrics: read(&manifest.metrics)?,
        };
        Self::from_payloads(manifest, variant, &payloads)
    }
}

fn decode_topology(asset: &TopologyAsset, payload: &str) -> Result<FeatureCollection, LoadError> {
    Topology::parse(payload)
        .and_then(|topo| topo.feature_collection(&asset.object))
        .map_err(|source| LoadError::Topology {
            asset: asset.path.clone(),
            source,
        })
}


#[cfg(test)]
mod tests {
    use super::{LoadError, MapData, fixtures};
    use crate::manifest::MapManifest;
    use crate::variant::VariantConfig;

    #[test]
    fn joins_all_four_assets() {
        let data = MapData::from_payloads(
            &MapManifest::default(),
            VariantConfig::combined(),
            &fixtures::payloads(),
        )
        .unwrap();
        assert_eq!(data.towns.len(), 1);
        assert_eq!(data.water_polygons.len(), 1);
        assert_eq!(data.water_lines.len(), 1);
        assert_eq!(data.dataset.len(), 2);
        assert_eq!(data.towns.bounds().min, [-73.0, 41.0]);
    }

    #[test]
    fn any_failed_asset_aborts_the_load() {
        let mut payloads = fixtures::payloads();
        payloads.water_lines = "{ not json".to_string();
        let err = MapData::from_payloads(&MapManifest::default(), VariantConfig::combined(), &payloads)
            .unwrap_err();
        assert!(matches!(err, LoadError::Topology { ref asset, .. } if asset.ends_with("StateWaterbodyLine.json")));

        let mut payloads = fixtures::payloads();
        payloads.metrics = "Station_Name\nA\n".to_string();
        assert!(matches!(
            MapData::from_payloads(&MapManifest::default(), VariantConfig::combined(), &payloads),
            Err(LoadError::MetricTable { .. })
        ));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = MapData::load_from_dir(
            "/nonexistent/bcgmap",
            &MapManifest::default(),
            VariantConfig::combined(),
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
