use std::collections::{BTreeMap, HashSet};

use scene::{CategoryFilter, MetricKind, TierCategory, YearBucket};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TRANSITION_MS: f64 = 500.0;
pub const DEFAULT_PLOT_BREAKPOINT_PX: f64 = 1400.0;
pub const DEFAULT_TOOLTIP_OFFSET: [f64; 2] = [10.0, -30.0];
pub const DEFAULT_CAPTION: &str = "relative abundance";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("variant config parse error: {0}")]
    Parse(String),
    #[error("unknown variant preset {0:?}")]
    UnknownPreset(String),
    #[error("variant has no metric families")]
    NoFamilies,
    #[error("metric column prefix must not be empty")]
    EmptyPrefix,
    #[error("metric column prefix {0:?} is used twice")]
    DuplicatePrefix(String),
    #[error("metric column prefix {0:?} is a prefix of {1:?}")]
    AmbiguousPrefix(String, String),
    #[error("metric kind {0} is listed twice")]
    DuplicateFamily(MetricKind),
    #[error("marker kind {0} has no metric family")]
    MarkerWithoutFamily(MetricKind),
    #[error("category toggles must be two distinct values")]
    SameToggles,
    #[error("default category {0:?} is not a toggle value")]
    DefaultNotToggle(String),
    #[error("radius range {0:?} is not finite")]
    BadRadiusRange([f64; 2]),
    #[error("{0} must be finite and non-negative")]
    BadNumber(&'static str),
    #[error("at least one id column is required")]
    NoIdColumns,
}

/// CSV columns `<prefix><bucket>` hold the values of `kind`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricFamily {
    pub kind: MetricKind,
    pub prefix: String,
}

impl MetricFamily {
    pub fn new(kind: MetricKind, prefix: impl Into<String>) -> Self {
        Self {
            kind,
            prefix: prefix.into(),
        }
    }

    pub fn column(&self, year: YearBucket) -> String {
        format!("{}{}", self.prefix, year)
    }
}

/// Everything that differs between dataset variants of the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariantConfig {
    pub name: String,
    pub metric_families: Vec<MetricFamily>,
    /// One marker layer per kind, drawn in this order.
    pub marker_kinds: Vec<MetricKind>,
    pub radius_range: [f64; 2],
    pub category_toggles: [TierCategory; 2],
    pub default_category: TierCategory,
    #[serde(default)]
    pub year_labels: BTreeMap<YearBucket, String>,
    pub legend_ratios: Vec<f64>,
    #[serde(default = "default_caption")]
    pub legend_caption: String,
    /// Columns joined with `/` to form the station id.
    pub id_columns: Vec<String>,
    /// Column naming the metric a row describes, in combined tables.
    #[serde(default)]
    pub series_column: Option<String>,
    /// Marker kinds shown regardless of the category toggle.
    #[serde(default = "default_toggle_exempt_kinds")]
    pub toggle_exempt_kinds: Vec<MetricKind>,
    #[serde(default = "default_transition_ms")]
    pub transition_ms: f64,
    #[serde(default = "default_plot_breakpoint_px")]
    pub plot_breakpoint_px: f64,
    #[serde(default = "default_tooltip_offset")]
    pub tooltip_offset: [f64; 2],
}

fn default_caption() -> String {
    DEFAULT_CAPTION.to_string()
}

fn default_toggle_exempt_kinds() -> Vec<MetricKind> {
    vec![MetricKind::Max]
}

fn default_transition_ms() -> f64 {
    DEFAULT_TRANSITION_MS
}

fn default_plot_breakpoint_px() -> f64 {
    DEFAULT_PLOT_BREAKPOINT_PX
}

fn default_tooltip_offset() -> [f64; 2] {
    DEFAULT_TOOLTIP_OFFSET
}

impl VariantConfig {
    pub const PRESETS: [&'static str; 4] = ["combined", "tier-pairs", "tiers", "sensitive"];

    fn base(name: &str, families: Vec<MetricFamily>, radius_range: [f64; 2]) -> Self {
        Self {
            name: name.to_string(),
            marker_kinds: families.iter().map(|f| f.kind).collect(),
            metric_families: families,
            radius_range,
            category_toggles: [TierCategory::Tier2, TierCategory::Tier5],
            default_category: TierCategory::Tier2,
            year_labels: BTreeMap::new(),
            legend_ratios: vec![0.0, 1.0],
            legend_caption: default_caption(),
            id_columns: vec!["Station_Name".to_string()],
            series_column: None,
            toggle_exempt_kinds: default_toggle_exempt_kinds(),
            transition_ms: DEFAULT_TRANSITION_MS,
            plot_breakpoint_px: DEFAULT_PLOT_BREAKPOINT_PX,
            tooltip_offset: DEFAULT_TOOLTIP_OFFSET,
        }
    }

    /// One row per station and metric; `Yr<n>` columns with a `Metric`
    /// column naming the tier.
    pub fn combined() -> Self {
        Self {
            id_columns: vec!["Station_Name".to_string(), "Metric".to_string()],
            series_column: Some("Metric".to_string()),
            ..Self::base(
                "combined",
                vec![MetricFamily::new(MetricKind::Composite, "Yr")],
                [0.0, 40.0],
            )
        }
    }

    /// Moderate and tolerant layers side by side.
    pub fn tier_pairs() -> Self {
        Self::base(
            "tier-pairs",
            vec![
                MetricFamily::new(MetricKind::Moderate, "T4Yr"),
                MetricFamily::new(MetricKind::Tolerant, "T5Yr"),
            ],
            [0.0, 20.0],
        )
    }

    /// All three tiers plus the per-station maximum.
    pub fn tiers() -> Self {
        Self {
            legend_ratios: vec![0.5, 1.0],
            ..Self::base(
                "tiers",
                vec![
                    MetricFamily::new(MetricKind::Sensitive, "T2Yr"),
                    MetricFamily::new(MetricKind::Moderate, "T4Yr"),
                    MetricFamily::new(MetricKind::Tolerant, "T5Yr"),
                    MetricFamily::new(MetricKind::Max, "MaxYr"),
                ],
                [1.0, 40.0],
            )
        }
    }

    pub fn sensitive() -> Self {
        Self::base(
            "sensitive",
            vec![MetricFamily::new(MetricKind::Sensitive, "T2Yr")],
            [0.0, 30.0],
        )
    }

    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "combined" => Ok(Self::combined()),
            "tier-pairs" => Ok(Self::tier_pairs()),
            "tiers" => Ok(Self::tiers()),
            "sensitive" => Ok(Self::sensitive()),
            other => Err(ConfigError::UnknownPreset(other.to_string())),
        }
    }

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.metric_families.is_empty() {
            return Err(ConfigError::NoFamilies);
        }
        let mut kinds = HashSet::new();
        for family in &self.metric_families {
            if family.prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix);
            }
            if !kinds.insert(family.kind) {
                return Err(ConfigError::DuplicateFamily(family.kind));
            }
        }
        for (i, a) in self.metric_families.iter().enumerate() {
            for b in &self.metric_families[i + 1..] {
                if a.prefix == b.prefix {
                    return Err(ConfigError::DuplicatePrefix(a.prefix.clone()));
                }
                let (short, long) = if a.prefix.len() <= b.prefix.len() {
                    (a, b)
                } else {
                    (b, a)
                };
                if long.prefix.starts_with(&short.prefix) {
                    return Err(ConfigError::AmbiguousPrefix(
                        short.prefix.clone(),
                        long.prefix.clone(),
                    ));
                }
            }
        }
        if let Some(kind) = self.marker_kinds.iter().find(|k| !kinds.contains(*k)) {
            return Err(ConfigError::MarkerWithoutFamily(*kind));
        }
        let [a, b] = &self.category_toggles;
        if a == b {
            return Err(ConfigError::SameToggles);
        }
        if !self.category_toggles.contains(&self.default_category) {
            return Err(ConfigError::DefaultNotToggle(
                self.default_category.code().to_string(),
            ));
        }
        if !self.radius_range.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::BadRadiusRange(self.radius_range));
        }
        if !(self.transition_ms.is_finite() && self.transition_ms >= 0.0) {
            return Err(ConfigError::BadNumber("transition_ms"));
        }
        if !(self.plot_breakpoint_px.is_finite() && self.plot_breakpoint_px >= 0.0) {
            return Err(ConfigError::BadNumber("plot_breakpoint_px"));
        }
        if !self.legend_ratios.iter().all(|r| r.is_finite()) {
            return Err(ConfigError::BadNumber("legend_ratios"));
        }
        if self.id_columns.is_empty() {
            return Err(ConfigError::NoIdColumns);
        }
        Ok(())
    }

    pub fn family(&self, kind: MetricKind) -> Option<&MetricFamily> {
        self.metric_families.iter().find(|f| f.kind == kind)
    }

    /// True when any tier kind has a column family. Tiers without one read
    /// as zero in the breakdown.
    pub fn has_tier_families(&self) -> bool {
        MetricKind::TIERS.iter().any(|k| self.family(*k).is_some())
    }

    pub fn category_filter(&self) -> CategoryFilter {
        let [a, b] = self.category_toggles.clone();
        CategoryFilter::new(a, b)
    }

    /// `None` when the bucket has no label; callers omit the label.
    pub fn year_label(&self, year: YearBucket) -> Option<&str> {
        self.year_labels.get(&year).map(String::as_str)
    }
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self::combined()
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, MetricFamily, VariantConfig};
    use pretty_assertions::assert_eq;
    use scene::{MetricKind, TierCategory, YearBucket};

    #[test]
    fn presets_validate() {
        for name in VariantConfig::PRESETS {
            let v = VariantConfig::preset(name).unwrap();
            assert_eq!(v.name, name);
            v.validate().unwrap();
        }
        assert_eq!(
            VariantConfig::preset("x"),
            Err(ConfigError::UnknownPreset("x".to_string()))
        );
    }

    #[test]
    fn preset_radius_ranges() {
        assert_eq!(VariantConfig::combined().radius_range, [0.0, 40.0]);
        assert_eq!(VariantConfig::tier_pairs().radius_range, [0.0, 20.0]);
        assert_eq!(VariantConfig::tiers().radius_range, [1.0, 40.0]);
        assert_eq!(VariantConfig::sensitive().radius_range, [0.0, 30.0]);
        assert_eq!(VariantConfig::tiers().legend_ratios, vec![0.5, 1.0]);
        assert!(VariantConfig::tiers().has_tier_families());
        assert!(VariantConfig::tier_pairs().has_tier_families());
        assert!(!VariantConfig::combined().has_tier_families());
        assert_eq!(VariantConfig::tiers().toggle_exempt_kinds, vec![MetricKind::Max]);
    }

    #[test]
    fn json_fills_defaults_and_reads_year_labels() {
        let json = r#"{
            "name": "custom",
            "metric_families": [{ "kind": "tolerant", "prefix": "T5Yr" }],
            "marker_kinds": ["tolerant"],
            "radius_range": [0, 40],
            "category_toggles": ["2", "5"],
            "default_category": "5",
            "year_labels": { "1": "1989-1993", "2": "1994-1998" },
            "legend_ratios": [0, 1],
            "id_columns": ["Station_Name"]
        }"#;
        let v = VariantConfig::from_json_str(json).unwrap();
        assert_eq!(v.default_category, TierCategory::Tier5);
        assert_eq!(v.transition_ms, 500.0);
        assert_eq!(v.tooltip_offset, [10.0, -30.0]);
        assert_eq!(v.legend_caption, "relative abundance");
        assert_eq!(v.toggle_exempt_kinds, vec![MetricKind::Max]);
        assert_eq!(v.year_label(YearBucket::FIRST), Some("1989-1993"));
        assert_eq!(v.year_label(YearBucket::new(6).unwrap()), None);
    }

    #[test]
    fn rejects_ambiguous_prefixes() {
        let mut v = VariantConfig::tier_pairs();
        v.metric_families.push(MetricFamily::new(MetricKind::Max, "T4"));
        assert_eq!(
            v.validate(),
            Err(ConfigError::AmbiguousPrefix("T4".into(), "T4Yr".into()))
        );
    }

    #[test]
    fn rejects_marker_without_family_and_bad_toggles() {
        let mut v = VariantConfig::sensitive();
        v.marker_kinds.push(MetricKind::Max);
        assert_eq!(
            v.validate(),
            Err(ConfigError::MarkerWithoutFamily(MetricKind::Max))
        );

        let mut v = VariantConfig::sensitive();
        v.category_toggles = [TierCategory::Tier2, TierCategory::Tier2];
        assert_eq!(v.validate(), Err(ConfigError::SameToggles));

        let mut v = VariantConfig::sensitive();
        v.default_category = TierCategory::Tier4;
        assert_eq!(
            v.validate(),
            Err(ConfigError::DefaultNotToggle("4".into()))
        );
    }
}
