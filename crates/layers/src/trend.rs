use std::collections::BTreeMap;

use canvas::{DrawCommand, Group, Node, Shape, Style, TextAnchor};
use foundation::math::Vec2;
use scene::{MetricKind, MetricRecord, YearBucket};

use crate::symbology::kind_color;

/// Series drawn, back to front.
pub const SERIES_ORDER: [MetricKind; 3] = [
    MetricKind::Tolerant,
    MetricKind::Moderate,
    MetricKind::Sensitive,
];

const MARGIN_TOP: f64 = 30.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 40.0;
const MARGIN_LEFT: f64 = 40.0;
const POINT_RADIUS: f64 = 3.0;
const Y_TICKS: [f64; 5] = [0.0, 25.0, 50.0, 75.0, 100.0];

#[derive(Debug, Clone, PartialEq)]
pub struct TrendSeries {
    pub kind: MetricKind,
    /// `(bucket, percent)`; buckets with no value are absent.
    pub points: Vec<(YearBucket, f64)>,
}

/// Tier percentages of one station across all six buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendPlot {
    pub title: String,
    pub selected_year: YearBucket,
    pub series: Vec<TrendSeries>,
    /// Tick text per bucket, bucket 1 first.
    pub tick_labels: Vec<String>,
}

impl TrendPlot {
    pub fn build(
        record: &MetricRecord,
        selected_year: YearBucket,
        year_labels: &BTreeMap<YearBucket, String>,
    ) -> Self {
        let series = SERIES_ORDER
            .iter()
            .map(|&kind| TrendSeries {
                kind,
                points: YearBucket::all()
                    .filter_map(|y| record.value(kind, y).map(|v| (y, v * 100.0)))
                    .collect(),
            })
            .collect();
        let tick_labels = YearBucket::all()
            .map(|y| year_labels.get(&y).cloned().unwrap_or_else(|| y.to_string()))
            .collect();
        Self {
            title: record.station_name.clone(),
            selected_year,
            series,
            tick_labels,
        }
    }

    pub fn series(&self, kind: MetricKind) -> Option<&TrendSeries> {
        self.series.iter().find(|s| s.kind == kind)
    }

    /// Replaces the plot surface contents with this plot at `size`.
    pub fn draw(&self, size: Vec2) -> Vec<DrawCommand> {
        let frame = PlotFrame::new(size);
        let mut out = vec![DrawCommand::ClearGroup(Group::Plot)];
        let mut push = |shape: Shape, style: Style| {
            out.push(DrawCommand::Append {
                group: Group::Plot,
                node: Node::new(shape, style),
            });
        };

        push(
            Shape::Text {
                at: Vec2::new(size.x / 2.0, MARGIN_TOP / 2.0),
                text: self.title.clone(),
                anchor: TextAnchor::Middle,
                dy_em: 0.35,
            },
            Style::class("plot-title"),
        );

        // Axes.
        let bottom = frame.y(0.0);
        push(
            Shape::Line {
                from: Vec2::new(MARGIN_LEFT, bottom),
                to: Vec2::new(size.x - MARGIN_RIGHT, bottom),
            },
            Style::class("axis").with_stroke("#000", 1.0),
        );
        push(
            Shape::Line {
                from: Vec2::new(MARGIN_LEFT, frame.y(100.0)),
                to: Vec2::new(MARGIN_LEFT, bottom),
            },
            Style::class("axis").with_stroke("#000", 1.0),
        );
        for (i, label) in self.tick_labels.iter().enumerate() {
            push(
                Shape::Text {
                    at: Vec2::new(frame.x_index(i), bottom),
                    text: label.clone(),
                    anchor: TextAnchor::Middle,
                    dy_em: 1.2,
                },
                Style::class("tick"),
            );
        }
        for pct in Y_TICKS {
            push(
                Shape::Text {
                    at: Vec2::new(MARGIN_LEFT - 6.0, frame.y(pct)),
                    text: format!("{pct}"),
                    anchor: TextAnchor::End,
                    dy_em: 0.32,
                },
                Style::class("tick"),
            );
        }

        for series in &self.series {
            let color = kind_color(series.kind).unwrap_or("#666");
            let points: Vec<Vec2> = series
                .points
                .iter()
                .map(|&(y, pct)| Vec2::new(frame.x(y), frame.y(pct)))
                .collect();
            if points.len() >= 2 {
                push(
                    Shape::Polyline {
                        points: points.clone(),
                    },
                    Style::class(format!("line {}", series.kind)).with_stroke(color, 2.0),
                );
            }
            for p in points {
                push(
                    Shape::circle(p, POINT_RADIUS),
                    Style::class(format!("point {}", series.kind)).with_fill(color),
                );
            }
        }

        let x = frame.x(self.selected_year);
        push(
            Shape::Line {
                from: Vec2::new(x, frame.y(100.0)),
                to: Vec2::new(x, bottom),
            },
            Style::class("year-marker").with_stroke("#999", 1.0),
        );
        out
    }
}

/// Ordinal x over the six buckets, linear y over 0..=100 percent.
struct PlotFrame {
    inner: Vec2,
}

impl PlotFrame {
    fn new(size: Vec2) -> Self {
        Self {
            inner: Vec2::new(
                (size.x - MARGIN_LEFT - MARGIN_RIGHT).max(0.0),
                (size.y - MARGIN_TOP - MARGIN_BOTTOM).max(0.0),
            ),
        }
    }

    fn x_index(&self, i: usize) -> f64 {
        let step = self.inner.x / f64::from(YearBucket::COUNT);
        MARGIN_LEFT + (i as f64 + 0.5) * step
    }

    fn x(&self, year: YearBucket) -> f64 {
        self.x_index(year.ordinal())
    }

    fn y(&self, pct: f64) -> f64 {
        MARGIN_TOP + self.inner.y * (1.0 - pct / 100.0)
    }
}
