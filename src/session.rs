//! # Dashboard Session
//!
//! One [`Session`] holds everything a browser session of the dashboard keeps
//! between interactions: the selected site, the six sliders, the submit count,
//! the forecast snapshots and the last rendered output.
//!
//! ## Event Handling
//!
//! Every [`UiEvent`] maps to exactly one [`Trigger`]. Slider events only
//! update the sliders. Site changes and submits also run a refresh cycle:
//!
//! 1. Resolve the dataset option and start date from the site label
//! 2. Build the request (slider values are sent only for an adjustment)
//! 3. Fetch the overtopping and three feature resources concurrently
//! 4. Normalize, advance the snapshots and render every chart
//! 5. Commit the new snapshots and output together
//!
//! A cycle that fails at any step leaves the previous snapshots and output in
//! place and records the error for display.
//!
//! Events are handled one at a time through `&mut self`, so an update is never
//! interleaved with another. There is no cancellation: the last completed
//! cycle wins.

use crate::{
    api::{resource_url, ApiError, ForecastRequest, ForecastSource, Resource},
    config::Config,
    normalize::{normalize_feature, normalize_overtopping, NormalizeError},
    renderer::{
        render_feature_chart, render_overtopping_pair, FeatureChart, Legend, OvertoppingChart,
    },
    slider::SliderBank,
    snapshot::{is_adjustment, FreshDatasets, SnapshotStore},
    Dataset, Feature, FeatureRecord, ResetGroup, Site, SliderKind, Trigger,
};
use chrono::{Duration, Local, NaiveDate};
use log::{error, info};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;

/// Site dropdown options, in display order
pub const SITE_LABELS: [&str; 6] = [
    "Dawlish",
    "Penzance",
    "Dawlish Storm Bert - overtopping",
    "Penzance Storm Bert - overtopping",
    "Dawlish - no overtopping",
    "Penzance - no overtopping",
];

pub const DEFAULT_SITE_LABEL: &str = "Dawlish";

/// Date format of the `start_date` query parameter
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Days of forecast shown after the start date
pub const FORECAST_DAYS: i64 = 5;

/// Key of the overtopping-event sub-series in feature responses
const OVERTOPPING_TIMES_KEY: &str = "overtopping_times";

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A response lacked one of the series the dashboard draws
    #[error("{resource} response has no '{key}' series")]
    MissingSeries { resource: &'static str, key: String },

    #[error("could not read the '{series}' series: {source}")]
    Normalize {
        series: String,
        #[source]
        source: NormalizeError,
    },
}

/// A user interaction delivered to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum UiEvent {
    SiteSelected(String),
    SliderDragged(SliderKind, i32),
    IncrementClicked(SliderKind),
    DecrementClicked(SliderKind),
    GroupResetClicked(ResetGroup),
    ResetAllClicked,
    SubmitClicked,
}

impl UiEvent {
    pub fn trigger(&self) -> Trigger {
        match self {
            UiEvent::SiteSelected(_) => Trigger::SiteDropdown,
            UiEvent::SliderDragged(kind, _) => Trigger::Slider(*kind),
            UiEvent::IncrementClicked(kind) => Trigger::Increment(*kind),
            UiEvent::DecrementClicked(kind) => Trigger::Decrement(*kind),
            UiEvent::GroupResetClicked(group) => Trigger::GroupReset(*group),
            UiEvent::ResetAllClicked => Trigger::ResetAll,
            UiEvent::SubmitClicked => Trigger::Submit,
        }
    }
}

/// Backend dataset chosen by a site label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSelection {
    pub option: &'static str,
    /// `DD-MM-YYYY`
    pub start_date: String,
}

static DAWLISH: Lazy<Option<Regex>> = Lazy::new(|| mention_pattern("Dawlish"));
static STORM_BERT: Lazy<Option<Regex>> = Lazy::new(|| mention_pattern("Storm Bert"));
static NO_OVERTOPPING: Lazy<Option<Regex>> = Lazy::new(|| mention_pattern("no overtopping"));

/// Case-insensitive match of any word ending in `suffix`.
fn mention_pattern(suffix: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"\b\w*{}\b", regex::escape(suffix)))
        .case_insensitive(true)
        .build()
        .ok()
}

fn mentions(pattern: &Lazy<Option<Regex>>, label: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(label))
}

/// Resolve the backend option and forecast start date for a dropdown label.
///
/// Fixed-scenario labels are matched before the generic Penzance fallback, so
/// their historical start dates win. The live Dawlish label matches
/// regardless of case, like [`site_for_label`].
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use splash_lib::session::resolve_dataset;
///
/// let today = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// let storm = resolve_dataset("Penzance, Storm Bert - overtopping", today);
/// assert_eq!(storm.option, "storm_bert");
/// assert_eq!(storm.start_date, "21-11-2024");
/// assert_eq!(resolve_dataset("Dawlish", today).start_date, "16-10-2026");
/// ```
pub fn resolve_dataset(label: &str, today: NaiveDate) -> DatasetSelection {
    let today = today.format(DATE_FORMAT).to_string();
    if label.eq_ignore_ascii_case("Dawlish") {
        DatasetSelection {
            option: "dawlish",
            start_date: today,
        }
    } else if mentions(&STORM_BERT, label) {
        DatasetSelection {
            option: "storm_bert",
            start_date: "21-11-2024".to_string(),
        }
    } else if mentions(&NO_OVERTOPPING, label) {
        DatasetSelection {
            option: "no_overtopping",
            start_date: "10-12-2024".to_string(),
        }
    } else {
        DatasetSelection {
            option: "penzance",
            start_date: today,
        }
    }
}

/// Site whose API serves a dropdown label.
pub fn site_for_label(label: &str) -> Site {
    if mentions(&DAWLISH, label) {
        Site::Dawlish
    } else {
        Site::Penzance
    }
}

/// Dates covered by the displayed forecast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ForecastRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ForecastRange {
    /// Range starting at a `DD-MM-YYYY` date; `None` if it does not parse.
    pub fn from_start_date(start_date: &str) -> Option<Self> {
        let start = NaiveDate::parse_from_str(start_date, DATE_FORMAT).ok()?;
        Some(ForecastRange {
            start,
            end: start + Duration::days(FORECAST_DAYS),
        })
    }
}

/// Everything the UI redraws after a refresh cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DashboardUpdate {
    pub trigger: Trigger,
    pub site_label: String,
    pub request: ForecastRequest,
    pub overtopping: Vec<OvertoppingChart>,
    pub features: Vec<FeatureChart>,
    pub forecast_range: Option<ForecastRange>,
    pub legend: Legend,
}

/// Per-session dashboard state.
pub struct Session<S> {
    config: Config,
    source: S,
    site_label: String,
    sliders: SliderBank,
    submit_count: u32,
    snapshots: SnapshotStore,
    busy: watch::Sender<bool>,
    last_update: Option<DashboardUpdate>,
    last_error: Option<String>,
    today: Option<NaiveDate>,
}

impl<S: ForecastSource> Session<S> {
    pub fn new(config: Config, source: S) -> Self {
        let (busy, _) = watch::channel(false);
        Session {
            config,
            source,
            site_label: DEFAULT_SITE_LABEL.to_string(),
            sliders: SliderBank::default(),
            submit_count: 0,
            snapshots: SnapshotStore::default(),
            busy,
            last_update: None,
            last_error: None,
            today: None,
        }
    }

    /// Pin the date used as "today" for live forecasts.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    /// Watch the busy indicator: `true` while a cycle's fetches are in flight.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    pub fn is_busy(&self) -> bool {
        *self.busy.borrow()
    }

    pub fn site_label(&self) -> &str {
        &self.site_label
    }

    pub fn sliders(&self) -> &SliderBank {
        &self.sliders
    }

    pub fn submit_count(&self) -> u32 {
        self.submit_count
    }

    pub fn snapshots(&self) -> &SnapshotStore {
        &self.snapshots
    }

    pub fn last_update(&self) -> Option<&DashboardUpdate> {
        self.last_update.as_ref()
    }

    /// Message of the last failed cycle, cleared by the next success
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Mount the controls and fetch the baseline forecast of the default site.
    pub async fn load(&mut self) -> Result<DashboardUpdate, DashboardError> {
        self.sliders.apply(Trigger::InitialLoad);
        self.sliders.mount();
        self.refresh(Trigger::InitialLoad).await
    }

    /// Handle one user interaction.
    ///
    /// Returns the new dashboard output when the event refreshed the forecast,
    /// `None` for slider-only events.
    ///
    /// A site change whose refresh fails is rolled back: the session keeps the
    /// site and sliders its snapshots were fetched for.
    pub async fn dispatch(
        &mut self,
        event: UiEvent,
    ) -> Result<Option<DashboardUpdate>, DashboardError> {
        let trigger = event.trigger();
        let rollback = (trigger == Trigger::SiteDropdown)
            .then(|| (self.site_label.clone(), self.sliders.clone()));
        match event {
            UiEvent::SiteSelected(label) => self.site_label = label,
            UiEvent::SliderDragged(kind, value) => self.sliders.drag(kind, value),
            UiEvent::SubmitClicked => self.submit_count += 1,
            _ => {}
        }
        self.sliders.apply(trigger);

        if trigger.refreshes_forecast() {
            let result = self.refresh(trigger).await;
            if let (Err(_), Some((site_label, sliders))) = (&result, rollback) {
                info!("Staying on '{}' after failed switch to '{}'", site_label, self.site_label);
                self.site_label = site_label;
                self.sliders = sliders;
            }
            result.map(Some)
        } else {
            Ok(None)
        }
    }

    fn request_for(&self, trigger: Trigger) -> ForecastRequest {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let selection = resolve_dataset(&self.site_label, today);
        let adjustments =
            is_adjustment(trigger, self.submit_count).then(|| self.sliders.values());
        ForecastRequest {
            option: selection.option.to_string(),
            start_date: selection.start_date,
            adjustments,
        }
    }

    async fn refresh(&mut self, trigger: Trigger) -> Result<DashboardUpdate, DashboardError> {
        let site = site_for_label(&self.site_label);
        let request = self.request_for(trigger);

        self.busy.send_replace(true);
        let fetched = self.fetch_cycle(site, &request).await;
        self.busy.send_replace(false);

        let fresh = match fetched {
            Ok(fresh) => fresh,
            Err(e) => {
                error!("Forecast refresh for '{}' failed: {}", self.site_label, e);
                self.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        let snapshots = self.snapshots.advanced(trigger, self.submit_count, fresh);
        let update = self.render(trigger, site, request, &snapshots);

        info!(
            "Refreshed '{}' on {:?}: {} overtopping points, adjusted={}",
            self.site_label,
            trigger,
            update.overtopping.iter().map(|c| c.points.len()).sum::<usize>(),
            update.request.is_adjusted()
        );

        self.snapshots = snapshots;
        self.last_update = Some(update.clone());
        self.last_error = None;
        Ok(update)
    }

    async fn fetch_cycle(
        &self,
        site: Site,
        request: &ForecastRequest,
    ) -> Result<FreshDatasets, DashboardError> {
        let root = &self.config.site(site).api_root;
        let overtopping_url = resource_url(root, Resource::WaveOvertopping, request)?;
        let [hs_url, tidal_url, wind_url] = [
            resource_url(root, Resource::Feature(Feature::SignificantWaveHeight), request)?,
            resource_url(root, Resource::Feature(Feature::TidalLevel), request)?,
            resource_url(root, Resource::Feature(Feature::WindSpeed), request)?,
        ];

        let (overtopping, hs, tidal, wind) = tokio::try_join!(
            self.source.get_json(&overtopping_url),
            self.source.get_json(&hs_url),
            self.source.get_json(&tidal_url),
            self.source.get_json(&wind_url),
        )?;

        let [(first_key, _, _), (second_key, _, _)] = site.overtopping_series();
        Ok(FreshDatasets {
            overtopping: [
                overtopping_series(&overtopping, first_key)?,
                overtopping_series(&overtopping, second_key)?,
            ],
            features: [
                feature_series(Feature::SignificantWaveHeight, &hs)?,
                feature_series(Feature::TidalLevel, &tidal)?,
                feature_series(Feature::WindSpeed, &wind)?,
            ],
        })
    }

    fn render(
        &self,
        trigger: Trigger,
        site: Site,
        request: ForecastRequest,
        snapshots: &SnapshotStore,
    ) -> DashboardUpdate {
        let overtopping = site
            .overtopping_series()
            .iter()
            .zip(snapshots.overtopping.iter())
            .map(|((_, title, logo), pair)| render_overtopping_pair(title, logo, pair))
            .collect();
        let features = Feature::ALL
            .iter()
            .map(|feature| render_feature_chart(*feature, snapshots.feature(*feature)))
            .collect();

        DashboardUpdate {
            trigger,
            site_label: self.site_label.clone(),
            forecast_range: ForecastRange::from_start_date(&request.start_date),
            legend: Legend::for_adjustment(request.is_adjusted()),
            request,
            overtopping,
            features,
        }
    }
}

fn series_payload<'a>(
    payload: &'a Value,
    resource: &'static str,
    key: &str,
) -> Result<&'a Value, DashboardError> {
    payload
        .get(key)
        .ok_or_else(|| DashboardError::MissingSeries {
            resource,
            key: key.to_string(),
        })
}

fn overtopping_series(
    payload: &Value,
    key: &str,
) -> Result<Dataset<crate::OvertoppingRecord>, DashboardError> {
    let raw = series_payload(payload, Resource::WaveOvertopping.path(), key)?;
    normalize_overtopping(Some(raw)).map_err(|source| DashboardError::Normalize {
        series: key.to_string(),
        source,
    })
}

fn feature_series(
    feature: Feature,
    payload: &Value,
) -> Result<(Dataset<FeatureRecord>, Dataset<FeatureRecord>), DashboardError> {
    let normalize = |key: &str| -> Result<Dataset<FeatureRecord>, DashboardError> {
        let raw = series_payload(payload, feature.resource(), key)?;
        normalize_feature(Some(raw), feature.key()).map_err(|source| DashboardError::Normalize {
            series: format!("{}.{}", feature.resource(), key),
            source,
        })
    };
    Ok((normalize(feature.key())?, normalize(OVERTOPPING_TIMES_KEY)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_every_dropdown_label_resolves() {
        let options: Vec<&str> = SITE_LABELS
            .iter()
            .map(|label| resolve_dataset(label, today()).option)
            .collect();
        assert_eq!(
            options,
            vec![
                "dawlish",
                "penzance",
                "storm_bert",
                "storm_bert",
                "no_overtopping",
                "no_overtopping"
            ]
        );
    }

    #[test]
    fn test_fixed_scenarios_use_historical_dates() {
        assert_eq!(
            resolve_dataset("Dawlish - no overtopping", today()).start_date,
            "10-12-2024"
        );
        assert_eq!(
            resolve_dataset("Penzance", today()).start_date,
            "16-10-2026"
        );
    }

    #[test]
    fn test_site_for_label() {
        assert_eq!(site_for_label("Dawlish Storm Bert - overtopping"), Site::Dawlish);
        assert_eq!(site_for_label("dawlish"), Site::Dawlish);
        assert_eq!(site_for_label("Penzance - no overtopping"), Site::Penzance);
    }

    #[test]
    fn test_mention_patterns_are_case_insensitive_suffix_matches() {
        assert!(DAWLISH.is_some() && STORM_BERT.is_some() && NO_OVERTOPPING.is_some());
        assert!(mentions(&STORM_BERT, "PENZANCE STORM BERT"));
        assert!(!mentions(&STORM_BERT, "Storm Berty"));
        assert!(!mentions(&NO_OVERTOPPING, "Penzance"));
    }

    #[test]
    fn test_lowercase_dawlish_resolves_consistently() {
        let selection = resolve_dataset("dawlish", today());
        assert_eq!(selection.option, "dawlish");
        assert_eq!(selection.start_date, "16-10-2026");
        assert_eq!(site_for_label("dawlish"), Site::Dawlish);
    }

    #[test]
    fn test_forecast_range_spans_five_days() {
        let range = ForecastRange::from_start_date("21-11-2024").unwrap();
        assert_eq!(range.end, NaiveDate::from_ymd_opt(2024, 11, 26).unwrap());
        assert!(ForecastRange::from_start_date("2024-11-21").is_none());
    }

    #[test]
    fn test_event_triggers() {
        assert_eq!(UiEvent::SubmitClicked.trigger(), Trigger::Submit);
        assert_eq!(
            UiEvent::SliderDragged(SliderKind::Freeboard, 3).trigger(),
            Trigger::Slider(SliderKind::Freeboard)
        );
        assert!(!UiEvent::ResetAllClicked.trigger().refreshes_forecast());
    }
}
