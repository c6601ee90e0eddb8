use scene::{MetricKind, Stacking};

pub const SENSITIVE_COLOR: &str = "#008837";
pub const MODERATE_COLOR: &str = "#f9711d";
pub const TOLERANT_COLOR: &str = "#34394b";

/// Class of a marker that currently has the pointer.
pub const HOVER_CLASS: &str = "hover";

/// Linear map from a ratio in `[0, 1]` to a pixel radius.
///
/// Ratios outside the domain extrapolate; NaN and infinities map to `0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RadiusScale {
    range: [f64; 2],
}

impl RadiusScale {
    pub const fn new(range: [f64; 2]) -> Self {
        Self { range }
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    pub fn scale(&self, ratio: f64) -> f64 {
        if !ratio.is_finite() {
            return 0.0;
        }
        let [min, max] = self.range;
        min + ratio * (max - min)
    }
}

/// Stroke colour for a tier kind.
pub fn kind_color(kind: MetricKind) -> Option<&'static str> {
    match kind {
        MetricKind::Sensitive => Some(SENSITIVE_COLOR),
        MetricKind::Moderate => Some(MODERATE_COLOR),
        MetricKind::Tolerant => Some(TOLERANT_COLOR),
        MetricKind::Max | MetricKind::Composite => None,
    }
}

/// Resting class of a marker layer.
pub fn baseline_class(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::Sensitive => "sensTaxa",
        MetricKind::Moderate => "modTaxa",
        MetricKind::Tolerant => "tolTaxa",
        MetricKind::Max => "maxTaxa",
        MetricKind::Composite => "Taxa",
    }
}

pub fn marker_class(kind: MetricKind, stacking: Stacking) -> &'static str {
    match stacking {
        Stacking::Baseline => baseline_class(kind),
        Stacking::Raised => HOVER_CLASS,
    }
}

/// `0.5` → `"50%"`.
pub fn format_percent(ratio: f64) -> String {
    format!("{}%", (ratio * 100.0).round())
}
