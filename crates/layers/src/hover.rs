use canvas::{DrawCommand, escape_text};
use formats::VariantConfig;
use foundation::handles::Handle;
use foundation::ids::StationId;
use foundation::math::Vec2;
use scene::{MarkerSet, MetricDataset, MetricKind, MetricRecord, Stacking, ViewState, YearBucket, element_id};

use crate::symbology::marker_class;
use crate::trend::TrendPlot;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HoverState {
    #[default]
    Idle,
    Hovering { marker: Handle, station: StationId },
}

/// Rounded tier percentages for one station and year.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TierBreakdown {
    pub sensitive: i64,
    pub moderate: i64,
    pub tolerant: i64,
    /// `100 - (sensitive + moderate + tolerant)`.
    pub other: i64,
}

impl TierBreakdown {
    pub fn from_record(record: &MetricRecord, year: YearBucket) -> Self {
        let pct = |kind| (record.numeric_value(kind, year) * 100.0).round() as i64;
        let sensitive = pct(MetricKind::Sensitive);
        let moderate = pct(MetricKind::Moderate);
        let tolerant = pct(MetricKind::Tolerant);
        Self {
            sensitive,
            moderate,
            tolerant,
            other: 100 - (sensitive + moderate + tolerant),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TooltipContent {
    pub station_name: String,
    pub municipality_name: String,
    /// Absent when the selected bucket has no label.
    pub year_label: Option<String>,
    pub tiers: Option<TierBreakdown>,
}

impl TooltipContent {
    pub fn to_html(&self) -> String {
        let mut html = format!(
            "<h4>{}</h4><p>{}</p>",
            escape_text(&self.station_name),
            escape_text(&self.municipality_name)
        );
        if let Some(label) = &self.year_label {
            html.push_str(&format!("<p>{}</p>", escape_text(label)));
        }
        if let Some(t) = &self.tiers {
            html.push_str(&format!(
                "<ul><li>Sensitive: {}%</li><li>Moderate: {}%</li><li>Tolerant: {}%</li><li>Other: {}%</li></ul>",
                t.sensitive, t.moderate, t.tolerant, t.other
            ));
        }
        html
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum TooltipChange {
    #[default]
    Unchanged,
    Show(TooltipContent),
    Hide,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlotChange {
    #[default]
    Unchanged,
    Show(TrendPlot),
    Clear,
}

/// Side effects of one hover transition.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HoverOutcome {
    pub commands: Vec<DrawCommand>,
    pub tooltip: TooltipChange,
    pub plot: PlotChange,
}

/// Read-only inputs a pointer-enter needs.
#[derive(Debug, Clone, Copy)]
pub struct HoverContext<'a> {
    pub dataset: &'a MetricDataset,
    pub view: &'a ViewState,
    pub variant: &'a VariantConfig,
    pub window_width: f64,
}

/// Two-state hover machine: `Idle` and `Hovering`.
#[derive(Debug, Clone, PartialEq)]
pub struct HoverDetailPresenter {
    state: HoverState,
    offset: Vec2,
    plot_breakpoint_px: f64,
}

impl HoverDetailPresenter {
    pub fn new(offset: Vec2, plot_breakpoint_px: f64) -> Self {
        Self {
            state: HoverState::Idle,
            offset,
            plot_breakpoint_px,
        }
    }

    pub fn for_variant(variant: &VariantConfig) -> Self {
        let [dx, dy] = variant.tooltip_offset;
        Self::new(Vec2::new(dx, dy), variant.plot_breakpoint_px)
    }

    pub fn state(&self) -> &HoverState {
        &self.state
    }

    pub fn hovered(&self) -> Option<Handle> {
        match &self.state {
            HoverState::Idle => None,
            HoverState::Hovering { marker, .. } => Some(*marker),
        }
    }

    pub fn pointer_enter(
        &mut self,
        handle: Handle,
        markers: &mut MarkerSet,
        ctx: HoverContext<'_>,
    ) -> HoverOutcome {
        let Some(station) = markers.get(handle).map(|m| m.key.station.clone()) else {
            return HoverOutcome::default();
        };
        let Some(record) = ctx.dataset.get(&station) else {
            return HoverOutcome::default();
        };

        let mut out = HoverOutcome::default();
        if let HoverState::Hovering { marker, .. } = &self.state
            && *marker != handle
        {
            out.commands.extend(demote(*marker, markers));
        }

        if let Some(marker) = markers.get_mut(handle) {
            marker.stacking = Stacking::Raised;
            let id = element_id(handle);
            out.commands.push(DrawCommand::SetClass {
                id: id.clone(),
                class: marker_class(marker.key.kind, Stacking::Raised).to_string(),
            });
            out.commands.push(DrawCommand::Raise { id });
        }

        let year = ctx.view.selected_year;
        out.tooltip = TooltipChange::Show(TooltipContent {
            station_name: record.station_name.clone(),
            municipality_name: record.municipality_name.clone(),
            year_label: ctx.variant.year_label(year).map(str::to_string),
            tiers: ctx
                .variant
                .has_tier_families()
                .then(|| TierBreakdown::from_record(record, year)),
        });
        if ctx.window_width > self.plot_breakpoint_px {
            out.plot = PlotChange::Show(TrendPlot::build(record, year, &ctx.variant.year_labels));
        }

        self.state = HoverState::Hovering {
            marker: handle,
            station,
        };
        out
    }

    /// Leaving a marker other than the hovered one is ignored.
    pub fn pointer_leave(&mut self, handle: Handle, markers: &mut MarkerSet) -> HoverOutcome {
        match &self.state {
            HoverState::Hovering { marker, .. } if *marker == handle => {}
            _ => return HoverOutcome::default(),
        }
        self.state = HoverState::Idle;
        HoverOutcome {
            commands: demote(handle, markers),
            tooltip: TooltipChange::Hide,
            plot: PlotChange::Clear,
        }
    }

    /// Tooltip position for a pointer at `pointer`, while hovering.
    pub fn pointer_move(&self, pointer: Vec2) -> Option<Vec2> {
        match self.state {
            HoverState::Idle => None,
            HoverState::Hovering { .. } => Some(pointer + self.offset),
        }
    }

    /// Drops the hover if its marker no longer exists.
    pub fn revalidate(&mut self, markers: &MarkerSet) -> HoverOutcome {
        match &self.state {
            HoverState::Hovering { marker, .. } if !markers.contains(*marker) => {
                self.state = HoverState::Idle;
                HoverOutcome {
                    commands: Vec::new(),
                    tooltip: TooltipChange::Hide,
                    plot: PlotChange::Clear,
                }
            }
            _ => HoverOutcome::default(),
        }
    }
}

fn demote(handle: Handle, markers: &mut MarkerSet) -> Vec<DrawCommand> {
    let Some(marker) = markers.get_mut(handle) else {
        return Vec::new();
    };
    marker.stacking = Stacking::Baseline;
    vec![DrawCommand::SetClass {
        id: element_id(handle),
        class: marker_class(marker.key.kind, Stacking::Baseline).to_string(),
    }]
}
