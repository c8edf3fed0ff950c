//! # Forecast Chart Rendering
//!
//! This module turns merged snapshot datasets into chart specifications that a
//! UI layer can draw, and renders those specifications as ASCII for terminal
//! use.
//!
//! Overtopping markers are styled from an explicit decision table keyed on
//! stage, confidence bucket and whether any overtopping occurred, so the
//! styling can be checked on its own.

use crate::{
    snapshot::{FeatureSnapshot, SnapshotPair},
    Feature, FeatureRecord, OvertoppingRecord, Stage, StagedDataset,
};
use chrono::NaiveDateTime;
use serde::Serialize;

/// Interquartile guide lines drawn across every overtopping chart
pub const IQR_GUIDES: [(f64, &str); 2] = [(6.0, "25% IQR (6)"), (54.0, "75% IQR (54)")];

const FEATURE_LINE_COLOR: &str = "#478DB4";
const ADJUSTED_LINE_COLOR: &str = "#808080";
const PREVIOUS_COLOR: &str = "grey";
const FALLBACK_COLOR: &str = "#AAD3E3";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerSymbol {
    XThin,
    CircleOpen,
    Circle,
    Square,
}

/// Row key of the styling table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    /// No overtopping in the bucket
    Zero,
    /// Confidence above 0.80
    High,
    /// Confidence in [0.50, 0.80]
    Medium,
    /// Confidence below 0.50
    Low,
}

impl Level {
    /// `None` when the confidence falls in no bucket (NaN).
    pub fn of(overtopping_count: u32, confidence: f64) -> Option<Level> {
        if overtopping_count == 0 {
            Some(Level::Zero)
        } else if confidence > 0.80 {
            Some(Level::High)
        } else if (0.50..=0.80).contains(&confidence) {
            Some(Level::Medium)
        } else if confidence < 0.50 {
            Some(Level::Low)
        } else {
            None
        }
    }

    pub fn symbol(&self) -> MarkerSymbol {
        match self {
            Level::Zero => MarkerSymbol::XThin,
            Level::High => MarkerSymbol::CircleOpen,
            Level::Medium => MarkerSymbol::Circle,
            Level::Low => MarkerSymbol::Square,
        }
    }
}

/// Fill and outline of one marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct MarkerStyle {
    pub symbol: MarkerSymbol,
    pub color: &'static str,
    pub line_color: &'static str,
}

/// (stage, level) → (fill, outline)
const STYLE_TABLE: [(Stage, Level, &str, &str); 8] = [
    (Stage::Forecast, Level::Zero, "#2A5485", "#2A5485"),
    (Stage::Forecast, Level::High, "#000", "#000"),
    (Stage::Forecast, Level::Medium, "#2A5485", "#2A5485"),
    (Stage::Forecast, Level::Low, "#AAD3E3", "#AAD3E3"),
    (Stage::AdjustedForecast, Level::Zero, "#C5C5C5", "#C5C5C5"),
    (Stage::AdjustedForecast, Level::High, "#808080", "#808080"),
    (Stage::AdjustedForecast, Level::Medium, "#C5C5C5", "#000"),
    (Stage::AdjustedForecast, Level::Low, "#C7C7C7", "#C7C7C7"),
];

/// Look up the marker style of one overtopping record.
///
/// # Example
/// ```
/// use splash_lib::renderer::{marker_style, MarkerSymbol};
/// use splash_lib::Stage;
///
/// let style = marker_style(Stage::Forecast, 0.95, 4);
/// assert_eq!(style.symbol, MarkerSymbol::CircleOpen);
/// assert_eq!(style.color, "#000");
/// ```
pub fn marker_style(stage: Stage, confidence: f64, overtopping_count: u32) -> MarkerStyle {
    let Some(level) = Level::of(overtopping_count, confidence) else {
        return MarkerStyle {
            symbol: MarkerSymbol::Circle,
            color: FALLBACK_COLOR,
            line_color: FALLBACK_COLOR,
        };
    };

    if stage == Stage::Previous {
        return MarkerStyle {
            symbol: level.symbol(),
            color: PREVIOUS_COLOR,
            line_color: PREVIOUS_COLOR,
        };
    }

    let (color, line_color) = STYLE_TABLE
        .iter()
        .find(|(s, l, _, _)| *s == stage && *l == level)
        .map(|(_, _, fill, outline)| (*fill, *outline))
        .unwrap_or((FALLBACK_COLOR, FALLBACK_COLOR));

    MarkerStyle {
        symbol: level.symbol(),
        color,
        line_color,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OvertoppingPoint {
    pub time: Option<NaiveDateTime>,
    pub overtopping_count: u32,
    pub confidence: f64,
    pub stage: Stage,
    pub style: MarkerStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GuideLine {
    pub y: f64,
    pub label: &'static str,
}

/// Scatter chart of one overtopping series.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OvertoppingChart {
    pub title: String,
    pub logo: String,
    pub points: Vec<OvertoppingPoint>,
    pub guides: Vec<GuideLine>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LinePoint {
    pub time: Option<NaiveDateTime>,
    pub value: f64,
}

/// Consecutive records of one stage drawn as a single trace.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineTrace {
    pub stage: Stage,
    pub color: &'static str,
    pub points: Vec<LinePoint>,
}

/// Line chart of one feature with its overtopping events.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureChart {
    pub feature: Feature,
    pub title: String,
    pub unit: &'static str,
    pub y_range: (f64, f64),
    pub lines: Vec<LineTrace>,
    /// "Overtopping event" markers
    pub events: Vec<LineTrace>,
}

/// Legend keys shown above the charts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Legend {
    pub forecast: bool,
    pub adjusted_forecast: bool,
}

impl Legend {
    pub fn for_adjustment(adjusted: bool) -> Self {
        Legend {
            forecast: true,
            adjusted_forecast: adjusted,
        }
    }
}

pub fn render_overtopping_chart(
    title: &str,
    logo: &str,
    data: &StagedDataset<OvertoppingRecord>,
) -> OvertoppingChart {
    let points = data
        .records
        .iter()
        .map(|staged| {
            let record = &staged.record;
            OvertoppingPoint {
                time: record.time,
                overtopping_count: record.overtopping_count,
                confidence: record.confidence,
                stage: staged.stage,
                style: marker_style(staged.stage, record.confidence, record.overtopping_count),
            }
        })
        .collect();

    OvertoppingChart {
        title: title.to_string(),
        logo: logo.to_string(),
        points,
        guides: IQR_GUIDES
            .iter()
            .map(|(y, label)| GuideLine { y: *y, label: *label })
            .collect(),
    }
}

/// Render a series from its snapshot pair.
pub fn render_overtopping_pair(
    title: &str,
    logo: &str,
    pair: &SnapshotPair<OvertoppingRecord>,
) -> OvertoppingChart {
    render_overtopping_chart(title, logo, &pair.merged())
}

pub fn render_feature_chart(feature: Feature, snapshot: &FeatureSnapshot) -> FeatureChart {
    FeatureChart {
        feature,
        title: feature.title().to_string(),
        unit: feature.unit(),
        y_range: feature.y_range(),
        lines: traces_by_stage(&snapshot.series.merged()),
        events: traces_by_stage(&snapshot.events.merged()),
    }
}

fn line_color(stage: Stage) -> &'static str {
    match stage {
        Stage::Forecast => FEATURE_LINE_COLOR,
        Stage::AdjustedForecast => ADJUSTED_LINE_COLOR,
        Stage::Previous => PREVIOUS_COLOR,
    }
}

fn traces_by_stage(data: &StagedDataset<FeatureRecord>) -> Vec<LineTrace> {
    let mut traces: Vec<LineTrace> = Vec::new();
    for staged in &data.records {
        let point = LinePoint {
            time: staged.record.time,
            value: staged.record.value,
        };
        match traces.last_mut() {
            Some(trace) if trace.stage == staged.stage => trace.points.push(point),
            _ => traces.push(LineTrace {
                stage: staged.stage,
                color: line_color(staged.stage),
                points: vec![point],
            }),
        }
    }
    traces
}

// -- ASCII rendering --

const ROWS: usize = 16;
const COLUMNS: usize = 96;
const Y_AXIS_WIDTH: usize = 6;

fn glyph(stage: Stage, symbol: MarkerSymbol) -> char {
    match (stage, symbol) {
        (Stage::Forecast, MarkerSymbol::XThin) => 'x',
        (Stage::Forecast, MarkerSymbol::CircleOpen) => 'O',
        (Stage::Forecast, MarkerSymbol::Circle) => '●',
        (Stage::Forecast, MarkerSymbol::Square) => '■',
        (_, MarkerSymbol::XThin) => '+',
        (_, MarkerSymbol::CircleOpen) => '◌',
        (_, MarkerSymbol::Circle) => '○',
        (_, MarkerSymbol::Square) => '□',
    }
}

/// Map timestamps onto `COLUMNS` columns; `None` when no point has a time.
fn time_to_column<'a, I>(times: I) -> Option<impl Fn(NaiveDateTime) -> usize>
where
    I: Iterator<Item = &'a Option<NaiveDateTime>>,
{
    let (first, last) = times
        .flatten()
        .fold(None, |range: Option<(NaiveDateTime, NaiveDateTime)>, t| {
            Some(match range {
                Some((lo, hi)) => (lo.min(*t), hi.max(*t)),
                None => (*t, *t),
            })
        })?;
    let span = (last - first).num_seconds().max(1) as f64;
    Some(move |t: NaiveDateTime| {
        let normalized = (t - first).num_seconds() as f64 / span;
        (normalized * (COLUMNS as f64 - 1.0)).round() as usize
    })
}

fn value_to_row(min: f64, max: f64) -> impl Fn(f64) -> usize {
    move |value: f64| {
        let normalized = ((value - min) / (max - min)).clamp(0.0, 1.0);
        ((1.0 - normalized) * (ROWS as f64 - 1.0)).round() as usize
    }
}

fn grid_to_string(title: &str, grid: Vec<Vec<char>>, footer: &str) -> String {
    let mut out = String::new();
    out.push_str(title);
    out.push('\n');
    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }
    out.push_str(footer);
    out.push('\n');
    out
}

fn empty_grid(max: f64, min: f64, to_row: &impl Fn(f64) -> usize) -> Vec<Vec<char>> {
    let mut grid = vec![vec![' '; COLUMNS + Y_AXIS_WIDTH]; ROWS];
    for (value, row) in [(max, 0), (min, ROWS - 1), ((max + min) / 2.0, to_row((max + min) / 2.0))] {
        let label = format!("{:>width$.0}", value, width = Y_AXIS_WIDTH - 1);
        for (i, ch) in label.chars().enumerate().take(Y_AXIS_WIDTH - 1) {
            grid[row][i] = ch;
        }
    }
    for row in grid.iter_mut() {
        row[Y_AXIS_WIDTH - 1] = '│';
    }
    grid
}

/// Render an overtopping chart as ASCII art.
pub fn ascii_overtopping(chart: &OvertoppingChart) -> String {
    let max_count = chart
        .points
        .iter()
        .map(|p| p.overtopping_count as f64)
        .chain(chart.guides.iter().map(|g| g.y))
        .fold(1.0f64, f64::max);
    let to_row = value_to_row(0.0, max_count);
    let mut grid = empty_grid(max_count, 0.0, &to_row);

    for guide in &chart.guides {
        let row = to_row(guide.y);
        for cell in grid[row].iter_mut().skip(Y_AXIS_WIDTH) {
            *cell = '-';
        }
    }

    let Some(to_column) = time_to_column(chart.points.iter().map(|p| &p.time)) else {
        return grid_to_string(&chart.title, grid, "(no data)");
    };

    // Later points overwrite earlier ones, so current markers sit on top.
    for point in &chart.points {
        if let Some(time) = point.time {
            let row = to_row(point.overtopping_count as f64);
            grid[row][Y_AXIS_WIDTH + to_column(time)] = glyph(point.stage, point.style.symbol);
        }
    }

    let footer = time_footer(chart.points.iter().map(|p| &p.time));
    grid_to_string(&chart.title, grid, &footer)
}

/// Render a feature chart as ASCII art.
pub fn ascii_feature(chart: &FeatureChart) -> String {
    let (min, max) = chart.y_range;
    let to_row = value_to_row(min, max);
    let mut grid = empty_grid(max, min, &to_row);
    let title = format!("{} [{}]", chart.title, chart.unit);

    let all_times = chart
        .lines
        .iter()
        .chain(chart.events.iter())
        .flat_map(|trace| trace.points.iter().map(|p| &p.time));
    let Some(to_column) = time_to_column(all_times) else {
        return grid_to_string(&title, grid, "(no data)");
    };

    for trace in &chart.lines {
        let mark = if trace.stage == Stage::Forecast { '•' } else { '·' };
        for point in &trace.points {
            if let Some(time) = point.time {
                grid[to_row(point.value)][Y_AXIS_WIDTH + to_column(time)] = mark;
            }
        }
    }
    for trace in &chart.events {
        let mark = if trace.stage == Stage::Forecast { '▲' } else { '△' };
        for point in &trace.points {
            if let Some(time) = point.time {
                grid[to_row(point.value)][Y_AXIS_WIDTH + to_column(time)] = mark;
            }
        }
    }

    let footer = time_footer(
        chart
            .lines
            .iter()
            .flat_map(|trace| trace.points.iter().map(|p| &p.time)),
    );
    grid_to_string(&title, grid, &footer)
}

fn time_footer<'a, I>(times: I) -> String
where
    I: Iterator<Item = &'a Option<NaiveDateTime>>,
{
    let (first, last) = times.flatten().fold((None, None), |(lo, hi), t| {
        (
            Some(lo.map_or(*t, |l: NaiveDateTime| l.min(*t))),
            Some(hi.map_or(*t, |h: NaiveDateTime| h.max(*t))),
        )
    });
    match (first, last) {
        (Some(first), Some(last)) => {
            let left = first.format("%d/%m %H:%M").to_string();
            let right = last.format("%d/%m %H:%M").to_string();
            let gap = COLUMNS.saturating_sub(left.len() + right.len());
            format!(
                "{}{}{}{}",
                " ".repeat(Y_AXIS_WIDTH),
                left,
                " ".repeat(gap),
                right
            )
        }
        _ => String::new(),
    }
}

/// Render the legend keys as text.
pub fn ascii_legend(legend: &Legend) -> String {
    let mut out = String::from("Key\n");
    if legend.forecast {
        out.push_str(
            "  Forecast:          O high > 80%   ● medium 50-80%   ■ low < 50%   x no overtopping   --- IQR (25th/75th)\n",
        );
    }
    if legend.adjusted_forecast {
        out.push_str(
            "  Adjusted forecast: ◌ high > 80%   ○ medium 50-80%   □ low < 50%   + no overtopping\n",
        );
    }
    out
}
