//! # SPLASH Dashboard Core Library
//!
//! This library holds the reactive core of the SPLASH wave-overtopping dashboard:
//! everything between a user interaction (site selection, slider buttons, submit)
//! and the chart specifications handed back to the UI layer.
//!
//! ## Data Flow
//!
//! 1. **Dispatch**: a [`Trigger`] identifies the single control behind an update
//! 2. **Fetch**: four concurrent GET requests against the site's forecasting API
//! 3. **Normalize**: raw JSON lists become typed [`Dataset`]s
//! 4. **Snapshot**: each series rolls its current dataset into "previous" (submit)
//!    or discards history (any other trigger), tagging every record with a [`Stage`]
//! 5. **Render**: merged previous + current datasets become chart specifications
//!
//! ## Core Types
//!
//! - [`OvertoppingRecord`]: one 10-minute overtopping bucket
//! - [`FeatureRecord`]: one sample of an environmental forecast variable
//! - [`Dataset`]: a normalized, unstaged table of records
//! - [`StagedDataset`]: records captured by the snapshot state machine
//! - [`Site`], [`Feature`], [`SliderKind`], [`ResetGroup`]: the fixed catalogue
//!   of sites, feature resources and adjustable variables

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod api;
pub mod config;
pub mod normalize;
pub mod renderer;
pub mod session;
pub mod slider;
pub mod snapshot;

/// A single 10-minute overtopping observation or prediction.
///
/// `time` is `None` when the backend sent a timestamp that could not be parsed;
/// the record is kept so counts stay aligned with the source.
///
/// # Example
/// ```
/// use splash_lib::OvertoppingRecord;
///
/// let record = OvertoppingRecord { time: None, overtopping_count: 3, confidence: 0.9 };
/// assert!(record.is_event());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OvertoppingRecord {
    pub time: Option<NaiveDateTime>,
    /// Number of overtopping occurrences in the bucket
    pub overtopping_count: u32,
    /// Model confidence in [0, 1]
    pub confidence: f64,
}

impl OvertoppingRecord {
    /// True if at least one overtopping occurred in this bucket.
    pub fn is_event(&self) -> bool {
        self.overtopping_count > 0
    }
}

/// A single sample of a forecast environmental variable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub time: Option<NaiveDateTime>,
    pub value: f64,
}

/// Which snapshot a record belongs to once captured by the state machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Baseline model output
    Forecast,
    /// Model output recomputed with slider adjustments
    AdjustedForecast,
    /// Superseded snapshot kept for comparison
    Previous,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Forecast => "forecast",
            Stage::AdjustedForecast => "adjusted_forecast",
            Stage::Previous => "previous",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A record carrying its stage tag.
///
/// Serializes flat, e.g. `{"stage":"forecast","time":...,"overtopping_count":2,...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Staged<R> {
    pub stage: Stage,
    #[serde(flatten)]
    pub record: R,
}

/// A normalized table of records, as returned by the forecasting API.
///
/// The column list is always present, even for an empty table, so an empty
/// dataset can be told apart from a normalization failure.
///
/// # Example
/// ```
/// use splash_lib::{Dataset, FeatureRecord};
///
/// let empty: Dataset<FeatureRecord> = Dataset::empty(&["time", "tidal_level"]);
/// assert!(empty.is_empty());
/// assert_eq!(empty.columns, vec!["time", "tidal_level"]);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dataset<R> {
    pub columns: Vec<String>,
    pub records: Vec<R>,
}

impl<R> Dataset<R> {
    pub fn empty(columns: &[&str]) -> Self {
        Dataset {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            records: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Capture every record under a single stage.
    pub fn into_staged(self, stage: Stage) -> StagedDataset<R> {
        StagedDataset {
            records: self
                .records
                .into_iter()
                .map(|record| Staged { stage, record })
                .collect(),
        }
    }
}

/// Records captured by the snapshot state machine, each tagged with its stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagedDataset<R> {
    pub records: Vec<Staged<R>>,
}

impl<R> Default for StagedDataset<R> {
    fn default() -> Self {
        StagedDataset {
            records: Vec::new(),
        }
    }
}

impl<R: Clone> StagedDataset<R> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Copy of this dataset with every record moved to `stage`.
    pub fn retagged(&self, stage: Stage) -> Self {
        StagedDataset {
            records: self
                .records
                .iter()
                .map(|staged| Staged {
                    stage,
                    record: staged.record.clone(),
                })
                .collect(),
        }
    }

    /// `self` followed by `later`, keeping each record's own stage.
    pub fn concat(&self, later: &StagedDataset<R>) -> Self {
        let mut records = Vec::with_capacity(self.records.len() + later.records.len());
        records.extend(self.records.iter().cloned());
        records.extend(later.records.iter().cloned());
        StagedDataset { records }
    }

    /// Count of records carrying `stage`.
    pub fn count_stage(&self, stage: Stage) -> usize {
        self.records.iter().filter(|s| s.stage == stage).count()
    }
}

/// Coastal site monitored by the dashboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Dawlish,
    Penzance,
}

impl Site {
    pub fn name(&self) -> &'static str {
        match self {
            Site::Dawlish => "Dawlish",
            Site::Penzance => "Penzance",
        }
    }

    /// The two overtopping series the site's API returns, as
    /// (response key, chart title, logo).
    pub fn overtopping_series(&self) -> [(&'static str, &'static str, &'static str); 2] {
        match self {
            Site::Dawlish => [
                (
                    "seawall_crest_overtopping",
                    "Dawlish Seawall Crest",
                    "dawlish_seawall_crest.png",
                ),
                (
                    "railway_line_overtopping",
                    "Dawlish Railway Line",
                    "dawlish_railway_line.png",
                ),
            ],
            Site::Penzance => [
                (
                    "seawall_crest_overtopping",
                    "Penzance Seawall Crest",
                    "dawlish_seawall_crest.png",
                ),
                (
                    "seawall_crest_sheltered_overtopping",
                    "Penzance, Seawall Crest (sheltered)",
                    "dawlish_seawall_crest.png",
                ),
            ],
        }
    }
}

/// Environmental forecast variable served by its own API resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    SignificantWaveHeight,
    TidalLevel,
    WindSpeed,
}

impl Feature {
    pub const ALL: [Feature; 3] = [
        Feature::SignificantWaveHeight,
        Feature::TidalLevel,
        Feature::WindSpeed,
    ];

    /// API resource path segment
    pub fn resource(&self) -> &'static str {
        match self {
            Feature::SignificantWaveHeight => "significant-wave-height",
            Feature::TidalLevel => "tidal-level",
            Feature::WindSpeed => "wind-speed",
        }
    }

    /// Response list key, also used as the value column name
    pub fn key(&self) -> &'static str {
        match self {
            Feature::SignificantWaveHeight => "significant_wave_height",
            Feature::TidalLevel => "tidal_level",
            Feature::WindSpeed => "wind_speed",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Feature::SignificantWaveHeight => "Significant wave height (Hs)",
            Feature::TidalLevel => "Tidal level",
            Feature::WindSpeed => "Wind speed (U10)",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Feature::SignificantWaveHeight | Feature::TidalLevel => "m",
            Feature::WindSpeed => "m/s",
        }
    }

    /// Fixed y-axis range for the feature chart
    pub fn y_range(&self) -> (f64, f64) {
        match self {
            Feature::SignificantWaveHeight => (0.0, 10.0),
            Feature::TidalLevel => (-4.0, 4.0),
            Feature::WindSpeed => (0.0, 30.0),
        }
    }
}

/// One of the six adjustable forecast inputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SliderKind {
    SignificantWaveHeight,
    Freeboard,
    MeanWavePeriod,
    MeanWaveDirection,
    WindSpeed,
    WindDirection,
}

impl SliderKind {
    pub const ALL: [SliderKind; 6] = [
        SliderKind::SignificantWaveHeight,
        SliderKind::Freeboard,
        SliderKind::MeanWavePeriod,
        SliderKind::MeanWaveDirection,
        SliderKind::WindSpeed,
        SliderKind::WindDirection,
    ];

    /// Query parameter carrying this adjustment on submit
    pub fn query_param(&self) -> &'static str {
        match self {
            SliderKind::SignificantWaveHeight => "sig_wave_height",
            SliderKind::Freeboard => "freeboard",
            SliderKind::MeanWavePeriod => "mean_wave_period",
            SliderKind::MeanWaveDirection => "mean_wave_dir",
            SliderKind::WindSpeed => "wind_speed",
            SliderKind::WindDirection => "wind_direction",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SliderKind::SignificantWaveHeight => "Significant wave height",
            SliderKind::Freeboard => "Freeboard",
            SliderKind::MeanWavePeriod => "Mean wave period",
            SliderKind::MeanWaveDirection => "Mean wave direction",
            SliderKind::WindSpeed => "Wind speed",
            SliderKind::WindDirection => "Wind direction",
        }
    }

    /// Panel whose "Reset" link resets this slider
    pub fn group(&self) -> ResetGroup {
        match self {
            SliderKind::SignificantWaveHeight
            | SliderKind::Freeboard
            | SliderKind::MeanWavePeriod => ResetGroup::WaveAdjustedData,
            SliderKind::MeanWaveDirection => ResetGroup::MeanWaveDirection,
            SliderKind::WindSpeed => ResetGroup::AtmosphericAdjustedData,
            SliderKind::WindDirection => ResetGroup::WindDirection,
        }
    }
}

/// Slider panels that carry their own "Reset" link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetGroup {
    WaveAdjustedData,
    MeanWaveDirection,
    AtmosphericAdjustedData,
    WindDirection,
}

impl ResetGroup {
    pub const ALL: [ResetGroup; 4] = [
        ResetGroup::WaveAdjustedData,
        ResetGroup::MeanWaveDirection,
        ResetGroup::AtmosphericAdjustedData,
        ResetGroup::WindDirection,
    ];
}

/// The single UI control whose change caused the current update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// Dashboard mount; no control fired yet
    InitialLoad,
    SiteDropdown,
    Submit,
    /// A slider handle was dragged
    Slider(SliderKind),
    Increment(SliderKind),
    Decrement(SliderKind),
    GroupReset(ResetGroup),
    ResetAll,
}

impl Trigger {
    /// True if the trigger starts a forecast refresh rather than a slider edit.
    pub fn refreshes_forecast(&self) -> bool {
        matches!(
            self,
            Trigger::InitialLoad | Trigger::SiteDropdown | Trigger::Submit
        )
    }
}
