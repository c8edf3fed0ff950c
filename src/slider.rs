//! # Adjustment Sliders
//!
//! Six sliders let the user perturb the forecast inputs before submitting.
//! They share one state machine, parameterized by [`SliderState`]: each update
//! resolves the single control that fired and computes the slider's new value.
//!
//! | trigger | result |
//! |---|---|
//! | own increment button | value + step |
//! | own decrement button | value - step |
//! | own group reset, reset all, site change | default |
//! | anything else (including a drag) | unchanged |
//!
//! Until the controls are mounted every click counter is `None`, and the
//! resolved value is the default whatever the trigger.

use crate::{ResetGroup, SliderKind, Trigger};
use serde::{Deserialize, Serialize};

pub const PERCENTAGE_MIN: i32 = -100;
pub const PERCENTAGE_MAX: i32 = 100;
pub const DEGREE_MIN: i32 = -180;
pub const DEGREE_MAX: i32 = 180;

/// Current value and limits of one slider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliderState {
    pub kind: SliderKind,
    pub value: i32,
    pub min: i32,
    pub max: i32,
    pub step: i32,
    pub default: i32,
}

impl SliderState {
    /// Slider at its default value.
    pub fn new(kind: SliderKind) -> Self {
        let (min, max) = match kind {
            SliderKind::MeanWaveDirection | SliderKind::WindDirection => (DEGREE_MIN, DEGREE_MAX),
            _ => (PERCENTAGE_MIN, PERCENTAGE_MAX),
        };
        SliderState {
            kind,
            value: 0,
            min,
            max,
            step: 1,
            default: 0,
        }
    }

    /// Display unit appended to the value
    pub fn unit(&self) -> &'static str {
        match self.kind {
            SliderKind::MeanWaveDirection | SliderKind::WindDirection => "°",
            _ => "%",
        }
    }

    /// Value after an update caused by `trigger`.
    ///
    /// # Example
    /// ```
    /// use splash_lib::slider::{SliderClicks, SliderState};
    /// use splash_lib::{SliderKind, Trigger};
    ///
    /// let slider = SliderState::new(SliderKind::Freeboard);
    /// let clicks = SliderClicks::mounted();
    /// assert_eq!(slider.resolve(Trigger::Increment(SliderKind::Freeboard), &clicks), 1);
    /// assert_eq!(slider.resolve(Trigger::Increment(SliderKind::WindSpeed), &clicks), 0);
    /// ```
    pub fn resolve(&self, trigger: Trigger, clicks: &SliderClicks) -> i32 {
        if !clicks.is_mounted() {
            return self.default;
        }

        match trigger {
            Trigger::Increment(kind) if kind == self.kind => self.clamp(self.value + self.step),
            Trigger::Decrement(kind) if kind == self.kind => self.clamp(self.value - self.step),
            Trigger::GroupReset(group) if group == self.kind.group() => self.default,
            Trigger::ResetAll | Trigger::SiteDropdown => self.default,
            _ => self.value,
        }
    }

    pub fn clamp(&self, value: i32) -> i32 {
        value.clamp(self.min, self.max)
    }
}

/// The four click counters feeding one slider's state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SliderClicks {
    pub increment: Option<u32>,
    pub decrement: Option<u32>,
    pub group_reset: Option<u32>,
    pub reset_all: Option<u32>,
}

impl SliderClicks {
    /// Counters of freshly mounted controls.
    pub fn mounted() -> Self {
        SliderClicks {
            increment: Some(0),
            decrement: Some(0),
            group_reset: Some(0),
            reset_all: Some(0),
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.increment.is_some()
            && self.decrement.is_some()
            && self.group_reset.is_some()
            && self.reset_all.is_some()
    }
}

/// All six sliders plus the click counters of their buttons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SliderBank {
    sliders: [SliderState; 6],
    increments: [Option<u32>; 6],
    decrements: [Option<u32>; 6],
    group_resets: [Option<u32>; 4],
    reset_all: Option<u32>,
}

impl Default for SliderBank {
    fn default() -> Self {
        SliderBank {
            sliders: SliderKind::ALL.map(SliderState::new),
            increments: [None; 6],
            decrements: [None; 6],
            group_resets: [None; 4],
            reset_all: None,
        }
    }
}

impl SliderBank {
    /// Mark every button as rendered, enabling the sliders.
    pub fn mount(&mut self) {
        for counter in self
            .increments
            .iter_mut()
            .chain(self.decrements.iter_mut())
            .chain(self.group_resets.iter_mut())
            .chain(std::iter::once(&mut self.reset_all))
        {
            counter.get_or_insert(0);
        }
    }

    pub fn is_mounted(&self) -> bool {
        SliderKind::ALL
            .iter()
            .all(|kind| self.clicks(*kind).is_mounted())
    }

    pub fn get(&self, kind: SliderKind) -> &SliderState {
        &self.sliders[slider_index(kind)]
    }

    pub fn value(&self, kind: SliderKind) -> i32 {
        self.get(kind).value
    }

    /// Store a dragged handle position; the following [`SliderBank::apply`]
    /// with `Trigger::Slider` echoes it back.
    pub fn drag(&mut self, kind: SliderKind, value: i32) {
        let slider = &mut self.sliders[slider_index(kind)];
        slider.value = slider.clamp(value);
    }

    /// Counters seen by `kind`'s state machine.
    pub fn clicks(&self, kind: SliderKind) -> SliderClicks {
        let index = slider_index(kind);
        SliderClicks {
            increment: self.increments[index],
            decrement: self.decrements[index],
            group_reset: self.group_resets[group_index(kind.group())],
            reset_all: self.reset_all,
        }
    }

    /// Count the click behind `trigger`, then run every slider's state machine
    /// against it.
    pub fn apply(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Increment(kind) => bump(&mut self.increments[slider_index(kind)]),
            Trigger::Decrement(kind) => bump(&mut self.decrements[slider_index(kind)]),
            Trigger::GroupReset(group) => bump(&mut self.group_resets[group_index(group)]),
            Trigger::ResetAll => bump(&mut self.reset_all),
            _ => {}
        }

        for kind in SliderKind::ALL {
            let clicks = self.clicks(kind);
            let index = slider_index(kind);
            self.sliders[index].value = self.sliders[index].resolve(trigger, &clicks);
        }
    }

    /// (slider, value) pairs in query-parameter order.
    pub fn values(&self) -> Vec<(SliderKind, i32)> {
        self.sliders.iter().map(|s| (s.kind, s.value)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SliderState> {
        self.sliders.iter()
    }
}

fn bump(counter: &mut Option<u32>) {
    *counter = Some(counter.unwrap_or(0) + 1);
}

fn slider_index(kind: SliderKind) -> usize {
    SliderKind::ALL
        .iter()
        .position(|k| *k == kind)
        .unwrap_or_default()
}

fn group_index(group: ResetGroup) -> usize {
    ResetGroup::ALL
        .iter()
        .position(|g| *g == group)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SWH: SliderKind = SliderKind::SignificantWaveHeight;

    #[test]
    fn test_increment_then_decrement_returns_to_default() {
        let mut bank = SliderBank::default();
        bank.mount();

        bank.apply(Trigger::Increment(SWH));
        assert_eq!(bank.value(SWH), 1);
        bank.apply(Trigger::Decrement(SWH));
        assert_eq!(bank.value(SWH), 0);
    }

    #[test]
    fn test_reset_from_any_value() {
        let mut bank = SliderBank::default();
        bank.mount();
        bank.drag(SWH, 40);
        bank.drag(SliderKind::WindDirection, -90);

        bank.apply(Trigger::GroupReset(ResetGroup::WaveAdjustedData));
        assert_eq!(bank.value(SWH), 0);
        assert_eq!(bank.value(SliderKind::WindDirection), -90);

        bank.apply(Trigger::ResetAll);
        assert_eq!(bank.value(SliderKind::WindDirection), 0);
    }

    #[test]
    fn test_site_change_resets_every_slider() {
        let mut bank = SliderBank::default();
        bank.mount();
        for kind in SliderKind::ALL {
            bank.drag(kind, 15);
        }
        bank.apply(Trigger::SiteDropdown);
        assert!(bank.values().iter().all(|(_, v)| *v == 0));
    }

    #[test]
    fn test_drag_is_echoed() {
        let mut bank = SliderBank::default();
        bank.mount();
        bank.drag(SliderKind::MeanWavePeriod, -35);
        bank.apply(Trigger::Slider(SliderKind::MeanWavePeriod));
        assert_eq!(bank.value(SliderKind::MeanWavePeriod), -35);
    }

    #[test]
    fn test_guard_before_mount() {
        let slider = SliderState {
            value: 25,
            ..SliderState::new(SWH)
        };
        let partially_mounted = SliderClicks {
            increment: Some(3),
            decrement: None,
            group_reset: Some(0),
            reset_all: Some(0),
        };
        assert_eq!(slider.resolve(Trigger::Slider(SWH), &partially_mounted), 0);
        assert_eq!(slider.resolve(Trigger::Increment(SWH), &SliderClicks::default()), 0);
        assert_eq!(slider.resolve(Trigger::Slider(SWH), &SliderClicks::mounted()), 25);
    }

    #[test]
    fn test_buttons_clamp_to_range() {
        let at_max = SliderState {
            value: DEGREE_MAX,
            ..SliderState::new(SliderKind::MeanWaveDirection)
        };
        assert_eq!(
            at_max.resolve(
                Trigger::Increment(SliderKind::MeanWaveDirection),
                &SliderClicks::mounted()
            ),
            DEGREE_MAX
        );
    }

    #[test]
    fn test_click_counters() {
        let mut bank = SliderBank::default();
        assert!(!bank.is_mounted());
        bank.mount();
        assert!(bank.is_mounted());

        bank.apply(Trigger::Increment(SliderKind::WindSpeed));
        bank.apply(Trigger::Increment(SliderKind::WindSpeed));
        bank.apply(Trigger::GroupReset(ResetGroup::AtmosphericAdjustedData));
        let clicks = bank.clicks(SliderKind::WindSpeed);
        assert_eq!(clicks.increment, Some(2));
        assert_eq!(clicks.group_reset, Some(1));
        assert_eq!(bank.value(SliderKind::WindSpeed), 0);
    }
}
