use std::collections::HashMap;

use canvas::{DrawCommand, Group, Node, Shape, Style};
use formats::VariantConfig;
use foundation::handles::Handle;
use foundation::ids::StationId;
use foundation::math::{Projection, Vec2};
use foundation::time::Time;
use scene::{
    CategoryFilter, MarkerKey, MarkerSet, MetricDataset, MetricKind, RenderedMarker, ViewState,
    Visibility, element_id,
};
use tracing::debug;

use crate::layer::{Layer, LayerId};
use crate::symbology::{RadiusScale, kind_color, marker_class};

/// Radius changes below this are not worth a redraw.
const RADIUS_EPSILON: f64 = 1e-3;

/// Handles touched by one [`MarkerBinder::bind`] call.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BindReport {
    pub created: Vec<Handle>,
    pub removed: Vec<Handle>,
    /// Markers that existed before the bind and were recomputed.
    pub updated: Vec<Handle>,
}

/// Reconciles the rendered marker set against a dataset and view state.
///
/// Each record gets one marker per marker kind. Screen positions are cached
/// per station, so the projection runs once per station for the lifetime of
/// the binder. Kinds in `toggle_exempt` (the Max layer by default) ignore
/// the category toggle.
#[derive(Debug)]
pub struct MarkerBinder {
    marker_kinds: Vec<MetricKind>,
    scale: RadiusScale,
    filter: CategoryFilter,
    toggle_exempt: Vec<MetricKind>,
    transition_ms: f64,
    positions: HashMap<StationId, Vec2>,
    markers: MarkerSet,
}

impl MarkerBinder {
    pub fn new(
        marker_kinds: Vec<MetricKind>,
        scale: RadiusScale,
        filter: CategoryFilter,
        transition_ms: f64,
    ) -> Self {
        Self {
            marker_kinds,
            scale,
            filter,
            toggle_exempt: vec![MetricKind::Max],
            transition_ms,
            positions: HashMap::new(),
            markers: MarkerSet::new(),
        }
    }

    pub fn for_variant(variant: &VariantConfig) -> Self {
        Self::new(
            variant.marker_kinds.clone(),
            RadiusScale::new(variant.radius_range),
            variant.category_filter(),
            variant.transition_ms,
        )
        .with_toggle_exempt(variant.toggle_exempt_kinds.clone())
    }

    pub fn with_toggle_exempt(mut self, kinds: Vec<MetricKind>) -> Self {
        self.toggle_exempt = kinds;
        self
    }

    pub fn scale(&self) -> RadiusScale {
        self.scale
    }

    pub fn filter(&self) -> &CategoryFilter {
        &self.filter
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn markers_mut(&mut self) -> &mut MarkerSet {
        &mut self.markers
    }

    pub fn cached_position(&self, station: &StationId) -> Option<Vec2> {
        self.positions.get(station).copied()
    }

    /// Drops every marker and cached position. Handles issued before the
    /// reset go stale instead of resolving to markers created after it.
    pub fn reset(&mut self) {
        self.markers.clear();
        self.positions.clear();
    }

    pub fn bind(
        &mut self,
        dataset: &MetricDataset,
        view: &ViewState,
        projection: &dyn Projection,
        now: Time,
    ) -> BindReport {
        let mut report = BindReport {
            removed: self.markers.retain_stations(|s| dataset.contains(s)),
            ..BindReport::default()
        };
        self.positions.retain(|s, _| dataset.contains(s));

        let year = view.selected_year;
        for record in dataset.iter() {
            let filtered = self.filter.visibility(&record.tier, &view.selected_category);
            for &kind in &self.marker_kinds {
                let visibility = if self.toggle_exempt.contains(&kind) {
                    Visibility::visible()
                } else {
                    filtered
                };
                let key = MarkerKey::new(record.station_id.clone(), kind);
                let handle = match self.markers.handle_of(&key) {
                    Some(h) => {
                        report.updated.push(h);
                        h
                    }
                    None => {
                        let position = *self
                            .positions
                            .entry(record.station_id.clone())
                            .or_insert_with(|| projection.project(record.position));
                        let h = self.markers.insert(RenderedMarker::new(key, position));
                        report.created.push(h);
                        h
                    }
                };

                let Some(marker) = self.markers.get_mut(handle) else {
                    continue;
                };
                let target = self.scale.scale(record.numeric_value(kind, year));
                if marker.radius.target() != target {
                    marker.radius.retarget(target, now, self.transition_ms);
                }
                marker.visibility = visibility;
            }
        }

        debug!(
            year = year.get(),
            category = %view.selected_category,
            created = report.created.len(),
            removed = report.removed.len(),
            updated = report.updated.len(),
            "bound markers"
        );
        report
    }
}

/// Turns bind results and radius animation into draw commands.
#[derive(Debug, Default)]
pub struct MarkerLayer {
    drawn_radius: HashMap<Handle, f64>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draw_report(
        &mut self,
        report: &BindReport,
        binder: &MarkerBinder,
        dataset: &MetricDataset,
        now: Time,
    ) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        for &h in &report.removed {
            self.drawn_radius.remove(&h);
            commands.push(DrawCommand::Remove { id: element_id(h) });
        }

        for &h in &report.created {
            let Some(marker) = binder.markers().get(h) else {
                continue;
            };
            let color = dataset
                .get(&marker.key.station)
                .and_then(|r| r.series)
                .or(Some(marker.key.kind))
                .and_then(kind_color);
            let mut style = Style::class(marker_class(marker.key.kind, marker.stacking));
            if let Some(color) = color {
                style = style.with_stroke(color, 1.5);
            }
            let radius = marker.radius_at(now);
            self.drawn_radius.insert(h, radius);
            let mut node =
                Node::new(Shape::circle(marker.position, radius), style).with_id(element_id(h));
            node.visible = marker.visibility.visible;
            commands.push(DrawCommand::Append {
                group: Group::Markers,
                node,
            });
        }

        for &h in &report.updated {
            if let Some(marker) = binder.markers().get(h) {
                commands.push(DrawCommand::SetVisible {
                    id: element_id(h),
                    visible: marker.visibility.visible,
                });
            }
        }
        commands
    }

    /// `SetRadius` for every marker whose animated radius moved since the
    /// last draw.
    pub fn tick(&mut self, binder: &MarkerBinder, now: Time) -> Vec<DrawCommand> {
        let mut commands = Vec::new();
        for (h, marker) in binder.markers().iter() {
            let radius = marker.radius_at(now);
            let drawn = self.drawn_radius.entry(h).or_insert(f64::NAN);
            let settled = marker.radius.is_finished(now);
            if drawn.is_nan() || (radius - *drawn).abs() > RADIUS_EPSILON || (settled && radius != *drawn) {
                *drawn = radius;
                commands.push(DrawCommand::SetRadius {
                    id: element_id(h),
                    radius,
                });
            }
        }
        commands
    }

    pub fn is_animating(&self, binder: &MarkerBinder, now: Time) -> bool {
        binder
            .markers()
            .iter()
            .any(|(_, m)| !m.radius.is_finished(now))
    }
}

impl Layer for MarkerLayer {
    fn id(&self) -> LayerId {
        LayerId(10)
    }

    fn group(&self) -> Group {
        Group::Markers
    }
}
