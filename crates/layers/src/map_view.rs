use canvas::{Canvas, DrawCommand, TooltipSurface};
use formats::MapData;
use foundation::handles::Handle;
use foundation::math::{Mercator, Vec2};
use foundation::time::Time;
use runtime::UiEvent;
use scene::{ViewState, YearBucket};
use tracing::{debug, warn};

use crate::basemap::BasemapLayer;
use crate::hover::{HoverContext, HoverDetailPresenter, HoverOutcome, PlotChange, TooltipChange};
use crate::layer::Layer;
use crate::legend::Legend;
use crate::markers::{MarkerBinder, MarkerLayer};
use crate::symbology::RadiusScale;

/// Map and window dimensions in CSS pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    /// Browser window width; gates the trend plot.
    pub window_width: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64, window_width: f64) -> Self {
        Self {
            width,
            height,
            window_width,
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// Where a map view draws.
pub struct Surfaces<'a> {
    pub map: &'a mut dyn Canvas,
    pub plot: &'a mut dyn Canvas,
    pub tooltip: &'a mut dyn TooltipSurface,
    pub plot_size: Vec2,
}

/// The whole interactive map: base layers, markers, legend and hover detail.
///
/// Owns the loaded data and the view state; every change arrives through
/// [`MapView::handle`].
pub struct MapView {
    data: MapData,
    viewport: Viewport,
    view: ViewState,
    projection: Mercator,
    binder: MarkerBinder,
    marker_layer: MarkerLayer,
    hover: HoverDetailPresenter,
    legend: Legend,
}

impl MapView {
    pub fn new(
        data: MapData,
        viewport: Viewport,
        view: ViewState,
        surfaces: &mut Surfaces<'_>,
        now: Time,
    ) -> Self {
        let variant = &data.variant;
        let legend = Legend::new(
            RadiusScale::new(variant.radius_range),
            variant.legend_ratios.clone(),
            variant.legend_caption.clone(),
        );
        let binder = MarkerBinder::for_variant(variant);
        let hover = HoverDetailPresenter::for_variant(variant);
        let projection = Mercator::fit_size(viewport.width, viewport.height, data.towns.bounds());
        let mut map = Self {
            data,
            viewport,
            view,
            projection,
            binder,
            marker_layer: MarkerLayer::new(),
            hover,
            legend,
        };
        map.render(surfaces, now);
        map
    }

    /// Default view state for `data`'s variant.
    pub fn initial_view_state(data: &MapData) -> ViewState {
        ViewState::new(YearBucket::FIRST, data.variant.default_category.clone())
    }

    pub fn data(&self) -> &MapData {
        &self.data
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn projection(&self) -> &Mercator {
        &self.projection
    }

    pub fn binder(&self) -> &MarkerBinder {
        &self.binder
    }

    pub fn hover(&self) -> &HoverDetailPresenter {
        &self.hover
    }

    pub fn handle(&mut self, event: &UiEvent, now: Time, surfaces: &mut Surfaces<'_>) {
        match event {
            UiEvent::YearChanged(raw) => {
                if let Err(e) = self.view.set_year(raw) {
                    warn!(error = %e, "ignoring year change");
                    return;
                }
                self.rebind(surfaces, now);
            }
            UiEvent::CategoryChanged(raw) => {
                if let Err(e) = self.view.set_category(raw, self.binder.filter()) {
                    warn!(error = %e, "ignoring category change");
                    return;
                }
                self.rebind(surfaces, now);
            }
            UiEvent::PointerEnter { marker } => self.pointer_enter(*marker, surfaces),
            UiEvent::PointerLeave { marker } => {
                let out = self.hover.pointer_leave(*marker, self.binder.markers_mut());
                apply_hover(out, surfaces);
            }
            UiEvent::PointerMove { position } => {
                if let Some(p) = self.hover.pointer_move(*position) {
                    surfaces.tooltip.move_to(p);
                }
            }
            UiEvent::Resize {
                width,
                height,
                window_width,
            } => {
                debug!(width, height, window_width, "rebuilding map for resize");
                self.viewport = Viewport::new(*width, *height, *window_width);
                self.projection =
                    Mercator::fit_size(*width, *height, self.data.towns.bounds());
                self.binder.reset();
                self.marker_layer = MarkerLayer::new();
                self.hover = HoverDetailPresenter::for_variant(&self.data.variant);
                self.render(surfaces, now);
            }
        }
    }

    /// Advances radius animation; returns whether any marker is still moving.
    pub fn tick(&mut self, now: Time, surfaces: &mut Surfaces<'_>) -> bool {
        let commands = self.marker_layer.tick(&self.binder, now);
        surfaces.map.apply_all(&commands);
        self.marker_layer.is_animating(&self.binder, now)
    }

    /// Tears down every surface and draws the map from scratch.
    fn render(&mut self, surfaces: &mut Surfaces<'_>, now: Time) {
        surfaces.map.apply(&DrawCommand::Clear);
        surfaces.plot.apply(&DrawCommand::Clear);
        surfaces.tooltip.hide();

        let basemaps = [
            (BasemapLayer::towns(), &self.data.towns),
            (BasemapLayer::water_polygons(), &self.data.water_polygons),
            (BasemapLayer::water_lines(), &self.data.water_lines),
        ];
        for (layer, features) in basemaps {
            draw_layer(surfaces, &layer, layer.draw(features, &self.projection));
        }
        draw_layer(surfaces, &self.legend, self.legend.draw(self.viewport.size()));
        self.rebind(surfaces, now);
    }

    fn rebind(&mut self, surfaces: &mut Surfaces<'_>, now: Time) {
        let report = self
            .binder
            .bind(&self.data.dataset, &self.view, &self.projection, now);
        let commands = self
            .marker_layer
            .draw_report(&report, &self.binder, &self.data.dataset, now);
        draw_layer(surfaces, &self.marker_layer, commands);
        let out = self.hover.revalidate(self.binder.markers());
        apply_hover(out, surfaces);
    }

    fn pointer_enter(&mut self, marker: Handle, surfaces: &mut Surfaces<'_>) {
        let ctx = HoverContext {
            dataset: &self.data.dataset,
            view: &self.view,
            variant: &self.data.variant,
            window_width: self.viewport.window_width,
        };
        let out = self
            .hover
            .pointer_enter(marker, self.binder.markers_mut(), ctx);
        apply_hover(out, surfaces);
    }
}

fn draw_layer(surfaces: &mut Surfaces<'_>, layer: &dyn Layer, commands: Vec<DrawCommand>) {
    debug!(
        layer = layer.id().0,
        group = layer.group().name(),
        commands = commands.len(),
        "drawing layer"
    );
    surfaces.map.apply_all(&commands);
}

fn apply_hover(out: HoverOutcome, surfaces: &mut Surfaces<'_>) {
    surfaces.map.apply_all(&out.commands);
    match out.tooltip {
        TooltipChange::Unchanged => {}
        TooltipChange::Show(content) => surfaces.tooltip.show(&content.to_html()),
        TooltipChange::Hide => surfaces.tooltip.hide(),
    }
    match out.plot {
        PlotChange::Unchanged => {}
        PlotChange::Show(plot) => surfaces.plot.apply_all(&plot.draw(surfaces.plot_size)),
        PlotChange::Clear => surfaces.plot.apply(&DrawCommand::Clear),
    }
}

#[cfg(test)]
mod tests {
    use super::{MapView, Surfaces, Viewport};
    use canvas::{CommandLog, Group, SvgCanvas, TooltipState};
    use formats::{MapData, MapManifest, MapPayloads, VariantConfig};
    use foundation::math::Vec2;
    use foundation::time::Time;
    use runtime::UiEvent;
    use scene::{MarkerKey, MetricKind, TierCategory, YearBucket, element_id};

    const TOWNS: &str = r#"{
        "type": "Topology",
        "arcs": [[[-73.0, 41.0], [-72.0, 41.0], [-72.0, 42.0], [-73.0, 42.0], [-73.0, 41.0]]],
        "objects": { "CTTowns": { "type": "GeometryCollection", "geometries": [
            { "type": "Polygon", "arcs": [[0]] }
        ] } }
    }"#;

    const EMPTY_POLY: &str =
        r#"{"type":"Topology","arcs":[],"objects":{"StateWaterbodyPoly":{"type":"GeometryCollection","geometries":[]}}}"#;
    const EMPTY_LINE: &str =
        r#"{"type":"Topology","arcs":[],"objects":{"StateWaterbodyLine":{"type":"GeometryCollection","geometries":[]}}}"#;

    const METRICS: &str = "\
Station_Name,Municipality_Name,XLong,YLat,BCG,T2Yr1,T2Yr2,T4Yr1,T4Yr2,T5Yr1,T5Yr2,MaxYr1,MaxYr2
Mill Brook,Lyme,-72.3,41.4,2,0.3,0.25,0.2,0.2,0.1,0.3,0.3,0.3
Hop River,Coventry,-72.6,41.7,5,0.05,,0.15,0.1,0.8,0.6,0.8,0.6
";

    struct Harness {
        map: SvgCanvas,
        plot: CommandLog,
        tooltip: TooltipState,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                map: SvgCanvas::new(),
                plot: CommandLog::new(),
                tooltip: TooltipState::default(),
            }
        }

        fn surfaces(&mut self) -> Surfaces<'_> {
            Surfaces {
                map: &mut self.map,
                plot: &mut self.plot,
                tooltip: &mut self.tooltip,
                plot_size: Vec2::new(300.0, 200.0),
            }
        }
    }

    fn data() -> MapData {
        let payloads = MapPayloads {
            towns: TOWNS.into(),
            water_polygons: EMPTY_POLY.into(),
            water_lines: EMPTY_LINE.into(),
            metrics: METRICS.into(),
        };
        MapData::from_payloads(&MapManifest::default(), VariantConfig::tiers(), &payloads).unwrap()
    }

    fn view(h: &mut Harness) -> MapView {
        let data = data();
        let state = MapView::initial_view_state(&data);
        MapView::new(
            data,
            Viewport::new(800.0, 600.0, 1600.0),
            state,
            &mut h.surfaces(),
            Time(0.0),
        )
    }

    fn marker_id(view: &MapView, station: &str, kind: MetricKind) -> String {
        let h = view
            .binder()
            .markers()
            .handle_of(&MarkerKey::new(station.into(), kind))
            .unwrap();
        element_id(h)
    }

    #[test]
    fn initial_render_draws_every_layer() {
        let mut h = Harness::new();
        let v = view(&mut h);
        assert_eq!(h.map.nodes(Group::Towns).len(), 1);
        assert_eq!(h.map.nodes(Group::Legend).len(), 5);
        // Two stations, four marker kinds each.
        assert_eq!(h.map.nodes(Group::Markers).len(), 8);
        assert_eq!(v.view_state().selected_category, TierCategory::Tier2);

        let hop = h.map.find(&marker_id(&v, "Hop River", MetricKind::Tolerant)).unwrap();
        assert!(!hop.visible);
    }

    #[test]
    fn controls_rebind_and_bad_input_is_ignored() {
        let mut h = Harness::new();
        let mut v = view(&mut h);

        v.handle(&UiEvent::CategoryChanged("5".into()), Time(1.0), &mut h.surfaces());
        let hop = marker_id(&v, "Hop River", MetricKind::Tolerant);
        let mill = marker_id(&v, "Mill Brook", MetricKind::Tolerant);
        assert!(h.map.find(&hop).unwrap().visible);
        assert!(!h.map.find(&mill).unwrap().visible);

        v.handle(&UiEvent::YearChanged("2".into()), Time(2.0), &mut h.surfaces());
        v.handle(&UiEvent::YearChanged("9".into()), Time(2.0), &mut h.surfaces());
        v.handle(&UiEvent::CategoryChanged("4".into()), Time(2.0), &mut h.surfaces());
        assert_eq!(v.view_state().selected_year, YearBucket::new(2).unwrap());
        assert_eq!(v.view_state().selected_category, TierCategory::Tier5);

        assert!(!v.tick(Time(5.0), &mut h.surfaces()));
        // tiers preset: [1, 40]; Hop River T5Yr2 = 0.6.
        let r = match &h.map.find(&hop).unwrap().shape {
            canvas::Shape::Circle { radius, .. } => *radius,
            other => panic!("unexpected shape {other:?}"),
        };
        assert!((r - 24.4).abs() < 1e-9);
    }

    #[test]
    fn hover_shows_tooltip_tracks_pointer_and_draws_plot() {
        let mut h = Harness::new();
        let mut v = view(&mut h);
        let id = marker_id(&v, "Mill Brook", MetricKind::Sensitive);
        let handle = scene::handle_from_element_id(&id).unwrap();

        v.handle(&UiEvent::PointerEnter { marker: handle }, Time(1.0), &mut h.surfaces());
        assert!(h.tooltip.visible);
        assert!(h.tooltip.html.contains("Other: 40%"));
        assert_eq!(h.map.find(&id).unwrap().style.class.as_deref(), Some("hover"));
        assert_eq!(h.map.nodes(Group::Markers).last().unwrap().id.as_deref(), Some(id.as_str()));
        assert!(
            h.plot
                .commands
                .contains(&canvas::DrawCommand::ClearGroup(Group::Plot))
        );

        v.handle(
            &UiEvent::PointerMove {
                position: Vec2::new(50.0, 60.0),
            },
            Time(1.0),
            &mut h.surfaces(),
        );
        assert_eq!(h.tooltip.position, Some(Vec2::new(60.0, 30.0)));

        v.handle(&UiEvent::PointerLeave { marker: handle }, Time(1.0), &mut h.surfaces());
        assert!(!h.tooltip.visible);
        assert_eq!(h.map.find(&id).unwrap().style.class.as_deref(), Some("sensTaxa"));
        assert_eq!(h.plot.commands.last(), Some(&canvas::DrawCommand::Clear));
    }

    #[test]
    fn resize_rebuilds_but_keeps_view_state() {
        let mut h = Harness::new();
        let mut v = view(&mut h);
        v.handle(&UiEvent::YearChanged("2".into()), Time(1.0), &mut h.surfaces());
        v.handle(
            &UiEvent::Resize {
                width: 400.0,
                height: 300.0,
                window_width: 900.0,
            },
            Time(2.0),
            &mut h.surfaces(),
        );
        assert_eq!(v.view_state().selected_year, YearBucket::new(2).unwrap());
        assert_eq!(h.map.nodes(Group::Towns).len(), 1);
        assert_eq!(h.map.nodes(Group::Markers).len(), 8);
        assert_eq!(v.viewport().width, 400.0);
    }

    #[test]
    fn pointer_events_from_before_a_resize_are_stale() {
        let mut h = Harness::new();
        let mut v = view(&mut h);
        let id = marker_id(&v, "Mill Brook", MetricKind::Sensitive);
        let before = scene::handle_from_element_id(&id).unwrap();

        v.handle(
            &UiEvent::Resize {
                width: 400.0,
                height: 300.0,
                window_width: 900.0,
            },
            Time(1.0),
            &mut h.surfaces(),
        );
        assert!(!v.binder().markers().contains(before));

        v.handle(&UiEvent::PointerEnter { marker: before }, Time(2.0), &mut h.surfaces());
        assert!(!h.tooltip.visible);
        assert_eq!(v.hover().hovered(), None);
    }
}
