use serde::{Deserialize, Serialize};

pub const MANIFEST_VERSION: &str = "1.0";

/// A TopoJSON asset and the object inside it to draw.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopologyAsset {
    pub path: String,
    pub object: String,
}

impl TopologyAsset {
    pub fn new(path: impl Into<String>, object: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            object: object.into(),
        }
    }
}

/// The four assets a map render joins before drawing anything.
///
/// Paths are relative to the data root (a directory natively, the page
/// origin on the web).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MapManifest {
    pub version: String,
    pub towns: TopologyAsset,
    pub water_polygons: TopologyAsset,
    pub water_lines: TopologyAsset,
    pub metrics: String,
    /// Variant preset name used when none is given explicitly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<String>,
}

impl Default for MapManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            towns: TopologyAsset::new("data/CTTowns.json", "CTTowns"),
            water_polygons: TopologyAsset::new("data/StateWaterbodyPoly.json", "StateWaterbodyPoly"),
            water_lines: TopologyAsset::new("data/StateWaterbodyLine.json", "StateWaterbodyLine"),
            metrics: "data/BCG_OverTime2.csv".to_string(),
            variant: None,
        }
    }
}

impl MapManifest {
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    pub fn asset_paths(&self) -> [&str; 4] {
        [
            &self.towns.path,
            &self.water_polygons.path,
            &self.water_lines.path,
            &self.metrics,
        ]
    }
}
