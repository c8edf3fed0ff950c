//! # Forecast Snapshots
//!
//! Every displayed series keeps two snapshots: `previous` and `current`.
//! On each refresh the series either rolls its current snapshot into
//! `previous` (an adjusted forecast was submitted) or drops its history (site
//! change, initial load), so the chart can overlay "before" and "after" an
//! adjustment without leaving ghosts from another site.
//!
//! The same trigger and submit count drive every series of a cycle, so all of
//! them flip to `adjusted_forecast` together or reset together.

use crate::{
    Dataset, Feature, FeatureRecord, OvertoppingRecord, Stage, StagedDataset, Trigger,
};
use serde::{Deserialize, Serialize};

/// Previous and current snapshot of one series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SnapshotPair<R> {
    pub previous: StagedDataset<R>,
    pub current: StagedDataset<R>,
}

impl<R> Default for SnapshotPair<R> {
    fn default() -> Self {
        SnapshotPair {
            previous: StagedDataset::default(),
            current: StagedDataset::default(),
        }
    }
}

impl<R: Clone> SnapshotPair<R> {
    /// Previous records first so current markers draw on top.
    pub fn merged(&self) -> StagedDataset<R> {
        self.previous.concat(&self.current)
    }
}

/// True when a refresh should be treated as an adjustment of the current
/// forecast rather than a fresh baseline.
pub fn is_adjustment(trigger: Trigger, submit_count: u32) -> bool {
    trigger == Trigger::Submit && submit_count > 0
}

/// Stage assigned to freshly fetched records for this trigger.
pub fn fresh_stage(trigger: Trigger, submit_count: u32) -> Stage {
    if is_adjustment(trigger, submit_count) {
        Stage::AdjustedForecast
    } else {
        Stage::Forecast
    }
}

/// Compute the next snapshot pair of one series.
///
/// - Any trigger other than submit, or no submit yet: history is dropped and
///   the fresh dataset becomes the current forecast.
/// - Submit after at least one click: the prior current snapshot becomes
///   `previous`, re-tagged `forecast`, and the fresh dataset becomes the
///   current `adjusted_forecast`.
///
/// # Example
/// ```
/// use splash_lib::{snapshot::advance, Dataset, FeatureRecord, Stage, StagedDataset, Trigger};
///
/// let fresh: Dataset<FeatureRecord> = Dataset {
///     columns: vec!["time".into(), "tidal_level".into()],
///     records: vec![FeatureRecord { time: None, value: 1.2 }],
/// };
/// let pair = advance(Trigger::SiteDropdown, 4, fresh, &StagedDataset::default());
/// assert!(pair.previous.is_empty());
/// assert_eq!(pair.current.count_stage(Stage::Forecast), 1);
/// ```
pub fn advance<R: Clone>(
    trigger: Trigger,
    submit_count: u32,
    fresh: Dataset<R>,
    prior_current: &StagedDataset<R>,
) -> SnapshotPair<R> {
    if is_adjustment(trigger, submit_count) {
        SnapshotPair {
            previous: prior_current.retagged(Stage::Forecast),
            current: fresh.into_staged(Stage::AdjustedForecast),
        }
    } else {
        SnapshotPair {
            previous: StagedDataset::default(),
            current: fresh.into_staged(Stage::Forecast),
        }
    }
}

/// Snapshots of a feature line and its overtopping-event markers.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureSnapshot {
    pub series: SnapshotPair<FeatureRecord>,
    pub events: SnapshotPair<FeatureRecord>,
}

/// Datasets produced by one fetch cycle, before staging.
#[derive(Clone, Debug)]
pub struct FreshDatasets {
    /// The site's two overtopping series, in [`crate::Site::overtopping_series`] order
    pub overtopping: [Dataset<OvertoppingRecord>; 2],
    /// (series, event times) per feature, in [`Feature::ALL`] order
    pub features: [(Dataset<FeatureRecord>, Dataset<FeatureRecord>); 3],
}

/// Per-session snapshot state of every displayed series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotStore {
    pub overtopping: [SnapshotPair<OvertoppingRecord>; 2],
    pub features: [FeatureSnapshot; 3],
}

impl SnapshotStore {
    /// Next store after a fetch cycle. `self` is left untouched so the caller
    /// can commit the result only once the whole cycle has succeeded.
    pub fn advanced(&self, trigger: Trigger, submit_count: u32, fresh: FreshDatasets) -> Self {
        let [first, second] = fresh.overtopping;
        let overtopping = [
            advance(trigger, submit_count, first, &self.overtopping[0].current),
            advance(trigger, submit_count, second, &self.overtopping[1].current),
        ];

        let mut features: [FeatureSnapshot; 3] = Default::default();
        for (index, (series, events)) in fresh.features.into_iter().enumerate() {
            let prior = &self.features[index];
            features[index] = FeatureSnapshot {
                series: advance(trigger, submit_count, series, &prior.series.current),
                events: advance(trigger, submit_count, events, &prior.events.current),
            };
        }

        SnapshotStore {
            overtopping,
            features,
        }
    }

    pub fn feature(&self, feature: Feature) -> &FeatureSnapshot {
        let index = Feature::ALL
            .iter()
            .position(|f| *f == feature)
            .unwrap_or_default();
        &self.features[index]
    }
}
