use std::collections::BTreeMap;
use std::fmt;

use foundation::ids::StationId;
use foundation::math::LonLat;
use serde::{Deserialize, Serialize};

/// Family of a per-year metric column.
///
/// The three tier kinds are relative abundances of taxa by BCG tolerance
/// tier: `Sensitive` (tier 2), `Moderate` (tier 4) and `Tolerant` (tier 5).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Sensitive,
    Moderate,
    Tolerant,
    Max,
    Composite,
}

impl MetricKind {
    pub const TIERS: [MetricKind; 3] = [
        MetricKind::Sensitive,
        MetricKind::Moderate,
        MetricKind::Tolerant,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MetricKind::Sensitive => "sensitive",
            MetricKind::Moderate => "moderate",
            MetricKind::Tolerant => "tolerant",
            MetricKind::Max => "max",
            MetricKind::Composite => "composite",
        }
    }

    /// BCG tier a tier kind describes.
    pub fn tier(self) -> Option<TierCategory> {
        match self {
            MetricKind::Sensitive => Some(TierCategory::Tier2),
            MetricKind::Moderate => Some(TierCategory::Tier4),
            MetricKind::Tolerant => Some(TierCategory::Tier5),
            MetricKind::Max | MetricKind::Composite => None,
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One of the six sampling periods, `1..=6`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct YearBucket(u8);

impl YearBucket {
    pub const COUNT: u8 = 6;
    pub const FIRST: YearBucket = YearBucket(1);

    pub fn new(n: u8) -> Option<Self> {
        (1..=Self::COUNT).contains(&n).then_some(YearBucket(n))
    }

    /// Parses a slider value or column suffix such as `"3"`.
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse::<u8>().ok().and_then(Self::new)
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based position on an ordinal axis.
    pub fn ordinal(self) -> usize {
        usize::from(self.0 - 1)
    }

    pub fn all() -> impl Iterator<Item = YearBucket> {
        (1..=Self::COUNT).map(YearBucket)
    }
}

impl Default for YearBucket {
    fn default() -> Self {
        Self::FIRST
    }
}

impl TryFrom<u8> for YearBucket {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        Self::new(n).ok_or_else(|| format!("year bucket {n} outside 1..={}", Self::COUNT))
    }
}

impl From<YearBucket> for u8 {
    fn from(bucket: YearBucket) -> u8 {
        bucket.0
    }
}

impl fmt::Display for YearBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BCG classification of a station.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TierCategory {
    Tier2,
    Tier4,
    Tier5,
    /// Any other code, kept verbatim.
    Other(String),
}

impl TierCategory {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "2" => TierCategory::Tier2,
            "4" => TierCategory::Tier4,
            "5" => TierCategory::Tier5,
            other => TierCategory::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            TierCategory::Tier2 => "2",
            TierCategory::Tier4 => "4",
            TierCategory::Tier5 => "5",
            TierCategory::Other(code) => code,
        }
    }
}

impl fmt::Display for TierCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for TierCategory {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for TierCategory {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(TierCategory::parse(&raw))
    }
}

/// One monitoring station row.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRecord {
    pub station_id: StationId,
    pub station_name: String,
    pub municipality_name: String,
    pub position: LonLat,
    pub tier: TierCategory,
    /// Which metric a row of a combined dataset describes.
    pub series: Option<MetricKind>,
    pub metrics: BTreeMap<(MetricKind, YearBucket), f64>,
}

impl MetricRecord {
    pub fn new(
        station_id: StationId,
        station_name: impl Into<String>,
        municipality_name: impl Into<String>,
        position: LonLat,
        tier: TierCategory,
    ) -> Self {
        Self {
            station_id,
            station_name: station_name.into(),
            municipality_name: municipality_name.into(),
            position,
            tier,
            series: None,
            metrics: BTreeMap::new(),
        }
    }

    pub fn with_metric(mut self, kind: MetricKind, year: YearBucket, value: f64) -> Self {
        self.set_metric(kind, year, value);
        self
    }

    pub fn set_metric(&mut self, kind: MetricKind, year: YearBucket, value: f64) {
        self.metrics.insert((kind, year), value);
    }

    /// The stored value, `None` when the cell was blank or unparseable.
    pub fn value(&self, kind: MetricKind, year: YearBucket) -> Option<f64> {
        self.metrics.get(&(kind, year)).copied()
    }

    /// Missing values read as zero.
    pub fn numeric_value(&self, kind: MetricKind, year: YearBucket) -> f64 {
        self.value(kind, year).unwrap_or(0.0)
    }
}

/// Station records keyed by id, iterated in id order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricDataset {
    records: BTreeMap<StationId, MetricRecord>,
}

impl MetricDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `record`, returning the record it replaced.
    pub fn insert(&mut self, record: MetricRecord) -> Option<MetricRecord> {
        self.records.insert(record.station_id.clone(), record)
    }

    pub fn remove(&mut self, id: &StationId) -> Option<MetricRecord> {
        self.records.remove(id)
    }

    pub fn get(&self, id: &StationId) -> Option<&MetricRecord> {
        self.records.get(id)
    }

    pub fn contains(&self, id: &StationId) -> bool {
        self.records.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricRecord> + '_ {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl FromIterator<MetricRecord> for MetricDataset {
    fn from_iter<I: IntoIterator<Item = MetricRecord>>(iter: I) -> Self {
        let mut dataset = MetricDataset::new();
        for record in iter {
            dataset.insert(record);
        }
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::{MetricDataset, MetricKind, MetricRecord, TierCategory, YearBucket};
    use foundation::math::LonLat;
    use pretty_assertions::assert_eq;

    fn record(id: &str) -> MetricRecord {
        MetricRecord::new(
            id.into(),
            "Mill Brook",
            "Lyme",
            LonLat::new(-72.3, 41.4),
            TierCategory::Tier2,
        )
    }

    #[test]
    fn year_bucket_bounds() {
        assert!(YearBucket::new(0).is_none());
        assert!(YearBucket::new(7).is_none());
        assert_eq!(YearBucket::parse(" 6 ").map(YearBucket::get), Some(6));
        assert!(YearBucket::parse("x").is_none());
        assert_eq!(
            YearBucket::all().map(YearBucket::get).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5, 6]
        );
        assert_eq!(YearBucket::FIRST.ordinal(), 0);
    }

    #[test]
    fn year_bucket_serde_rejects_out_of_range() {
        let ok: YearBucket = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<YearBucket>("9").is_err());
    }

    #[test]
    fn tier_category_keeps_unknown_codes() {
        assert_eq!(TierCategory::parse("2"), TierCategory::Tier2);
        assert_eq!(TierCategory::parse(" 5"), TierCategory::Tier5);
        assert_eq!(TierCategory::parse("3"), TierCategory::Other("3".into()));
        assert_eq!(TierCategory::parse("3").code(), "3");
    }

    #[test]
    fn missing_metric_reads_as_zero() {
        let year = YearBucket::FIRST;
        let r = record("a").with_metric(MetricKind::Sensitive, year, 0.25);
        assert_eq!(r.value(MetricKind::Sensitive, year), Some(0.25));
        assert_eq!(r.value(MetricKind::Tolerant, year), None);
        assert_eq!(r.numeric_value(MetricKind::Tolerant, year), 0.0);
    }

    #[test]
    fn dataset_iterates_in_id_order_and_replaces() {
        let mut ds: MetricDataset = [record("b"), record("a")].into_iter().collect();
        assert_eq!(ds.len(), 2);
        let ids: Vec<_> = ds.iter().map(|r| r.station_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);

        assert!(ds.insert(record("a")).is_some());
        assert_eq!(ds.len(), 2);
        assert!(ds.remove(&"a".into()).is_some());
        assert!(!ds.contains(&"a".into()));
    }
}
