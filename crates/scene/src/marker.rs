use foundation::handles::Handle;
use foundation::ids::StationId;
use foundation::math::Vec2;
use foundation::time::Time;
use runtime::transition::Transition;

use crate::dataset::MetricKind;
use crate::visibility::Visibility;

const ELEMENT_ID_PREFIX: &str = "marker-";

/// One marker per station per marker layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKey {
    pub station: StationId,
    pub kind: MetricKind,
}

impl MarkerKey {
    pub fn new(station: StationId, kind: MetricKind) -> Self {
        Self { station, kind }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Stacking {
    #[default]
    Baseline,
    /// Drawn above every other marker.
    Raised,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedMarker {
    pub key: MarkerKey,
    /// Screen position; fixed for the life of the marker.
    pub position: Vec2,
    pub radius: Transition,
    pub visibility: Visibility,
    pub stacking: Stacking,
}

impl RenderedMarker {
    /// A new marker starts collapsed and visible.
    pub fn new(key: MarkerKey, position: Vec2) -> Self {
        Self {
            key,
            position,
            radius: Transition::settled(0.0),
            visibility: Visibility::visible(),
            stacking: Stacking::Baseline,
        }
    }

    pub fn radius_at(&self, now: Time) -> f64 {
        self.radius.value_at(now)
    }
}

/// DOM id of the element drawn for `handle`.
pub fn element_id(handle: Handle) -> String {
    format!("{ELEMENT_ID_PREFIX}{handle}")
}

/// Inverse of [`element_id`]; `None` for elements that are not markers.
pub fn handle_from_element_id(id: &str) -> Option<Handle> {
    id.strip_prefix(ELEMENT_ID_PREFIX)?.parse().ok()
}
