use csv::{ReaderBuilder, StringRecord, Trim};
use foundation::ids::StationId;
use foundation::math::LonLat;
use scene::{MetricDataset, MetricKind, MetricRecord, TierCategory, YearBucket};
use thiserror::Error;
use tracing::{debug, info};

use crate::variant::VariantConfig;

pub const STATION_NAME: &str = "Station_Name";
pub const MUNICIPALITY_NAME: &str = "Municipality_Name";
pub const LONGITUDE: &str = "XLong";
pub const LATITUDE: &str = "YLat";
pub const CATEGORY: &str = "BCG";

#[derive(Debug, Error)]
pub enum MetricTableError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column {0:?}")]
    MissingColumn(String),
    #[error("column {column:?} matches prefix {prefix:?} but does not end in a year bucket 1..=6")]
    MalformedMetricColumn { column: String, prefix: String },
    #[error("line {line}: {column} value {value:?} is not a valid coordinate")]
    InvalidCoordinate {
        line: u64,
        column: &'static str,
        value: String,
    },
    #[error("line {line}: duplicate station id {id:?}")]
    DuplicateStation { line: u64, id: String },
}

/// Resolved header positions for one table.
struct Columns {
    station_name: usize,
    municipality_name: usize,
    longitude: usize,
    latitude: usize,
    category: usize,
    id: Vec<usize>,
    series: Option<usize>,
    metrics: Vec<(usize, MetricKind, YearBucket)>,
}

impl Columns {
    fn resolve(headers: &StringRecord, variant: &VariantConfig) -> Result<Self, MetricTableError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| MetricTableError::MissingColumn(name.to_string()))
        };

        let mut metrics = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            let Some(family) = variant
                .metric_families
                .iter()
                .find(|f| header.starts_with(f.prefix.as_str()))
            else {
                continue;
            };
            let suffix = &header[family.prefix.len()..];
            let year = suffix
                .bytes()
                .all(|b| b.is_ascii_digit())
                .then(|| YearBucket::parse(suffix))
                .flatten()
                .ok_or_else(|| MetricTableError::MalformedMetricColumn {
                    column: header.to_string(),
                    prefix: family.prefix.clone(),
                })?;
            metrics.push((idx, family.kind, year));
        }

        Ok(Self {
            station_name: find(STATION_NAME)?,
            municipality_name: find(MUNICIPALITY_NAME)?,
            longitude: find(LONGITUDE)?,
            latitude: find(LATITUDE)?,
            category: find(CATEGORY)?,
            id: variant
                .id_columns
                .iter()
                .map(|c| find(c))
                .collect::<Result<_, _>>()?,
            series: variant.series_column.as_deref().map(find).transpose()?,
            metrics,
        })
    }
}

/// Maps a combined table's `Metric` cell (`T2`, `T4`, `T5`) to its tier kind.
pub fn series_kind(code: &str) -> Option<MetricKind> {
    match code.trim() {
        "T2" => Some(MetricKind::Sensitive),
        "T4" => Some(MetricKind::Moderate),
        "T5" => Some(MetricKind::Tolerant),
        _ => None,
    }
}

/// Parses a station metric table.
///
/// Metric columns are `<prefix><bucket>` for the variant's families and are
/// checked once against the header. Blank or non-numeric cells are stored as
/// missing.
pub fn parse_metric_table(
    csv_text: &str,
    variant: &VariantConfig,
) -> Result<MetricDataset, MetricTableError> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_reader(csv_text.as_bytes());
    let headers = reader.headers()?.clone();
    let columns = Columns::resolve(&headers, variant)?;

    let mut dataset = MetricDataset::new();
    let mut missing_cells = 0usize;
    for row in reader.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line());
        let cell = |idx: usize| row.get(idx).unwrap_or("");

        let coordinate = |idx: usize, column: &'static str| {
            let raw = cell(idx);
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| MetricTableError::InvalidCoordinate {
                    line,
                    column,
                    value: raw.to_string(),
                })
        };
        let position = LonLat::new(
            coordinate(columns.longitude, LONGITUDE)?,
            coordinate(columns.latitude, LATITUDE)?,
        );
        if !position.is_valid() {
            return Err(MetricTableError::InvalidCoordinate {
                line,
                column: LONGITUDE,
                value: format!("{},{}", cell(columns.longitude), cell(columns.latitude)),
            });
        }

        let id = columns
            .id
            .iter()
            .map(|&idx| cell(idx))
            .collect::<Vec<_>>()
            .join("/");
        if dataset.contains(&StationId::new(id.as_str())) {
            return Err(MetricTableError::DuplicateStation { line, id });
        }

        let mut record = MetricRecord::new(
            StationId::new(id),
            cell(columns.station_name),
            cell(columns.municipality_name),
            position,
            TierCategory::parse(cell(columns.category)),
        );
        record.series = columns.series.and_then(|idx| series_kind(cell(idx)));

        for &(idx, kind, year) in &columns.metrics {
            match cell(idx).parse::<f64>() {
                Ok(v) if v.is_finite() => record.set_metric(kind, year, v),
                _ => missing_cells += 1,
            }
        }
        dataset.insert(record);
    }

    if missing_cells > 0 {
        debug!(missing_cells, "metric table has blank or non-numeric cells");
    }
    info!(
        variant = %variant.name,
        stations = dataset.len(),
        metric_columns = columns.metrics.len(),
        "parsed metric table"
    );
    Ok(dataset)
}
