/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::ipmi::bus::{PropertyMap, PropertyValue, SENSOR_THRESHOLD_NAMESPACE};
use bitflags::bitflags;
use log::error;
use std::collections::BTreeMap;

pub const WARNING_ALARM_HIGH: &str = "WarningAlarmHigh";
pub const WARNING_ALARM_LOW: &str = "WarningAlarmLow";
pub const CRITICAL_ALARM_HIGH: &str = "CriticalAlarmHigh";
pub const CRITICAL_ALARM_LOW: &str = "CriticalAlarmLow";

bitflags! {
    /// Byte 2 of Get Sensor Reading / flags of Get Sensor Event Status.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SensorOperation: u8 {
        const EVENT_MESSAGES_ENABLE = 1 << 7;
        const SENSOR_SCANNING_ENABLE = 1 << 6;
        const READING_STATE_UNAVAILABLE = 1 << 5;
    }
}

bitflags! {
    /// Threshold comparison status, also used as the readable/settable mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThresholdMask: u8 {
        const LOWER_NON_CRITICAL = 1 << 0;
        const LOWER_CRITICAL = 1 << 1;
        const LOWER_NON_RECOVERABLE = 1 << 2;
        const UPPER_NON_CRITICAL = 1 << 3;
        const UPPER_CRITICAL = 1 << 4;
        const UPPER_NON_RECOVERABLE = 1 << 5;
    }
}

bitflags! {
    /// Low byte of the threshold event masks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThresholdEventLsb: u8 {
        const UPPER_NON_CRITICAL_GOING_HIGH = 1 << 7;
        const UPPER_NON_CRITICAL_GOING_LOW = 1 << 6;
        const LOWER_NON_RECOVERABLE_GOING_HIGH = 1 << 5;
        const LOWER_NON_RECOVERABLE_GOING_LOW = 1 << 4;
        const LOWER_CRITICAL_GOING_HIGH = 1 << 3;
        const LOWER_CRITICAL_GOING_LOW = 1 << 2;
        const LOWER_NON_CRITICAL_GOING_HIGH = 1 << 1;
        const LOWER_NON_CRITICAL_GOING_LOW = 1 << 0;
    }
}

bitflags! {
    /// High byte of the threshold event masks. In SDR assertion/deassertion
    /// masks bits 4..6 report which threshold comparisons are returned.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ThresholdEventMsb: u8 {
        const NON_RECOVERABLE_THRESHOLD = 1 << 6;
        const CRITICAL_THRESHOLD = 1 << 5;
        const NON_CRITICAL_THRESHOLD = 1 << 4;
        const UPPER_NON_RECOVERABLE_GOING_HIGH = 1 << 3;
        const UPPER_NON_RECOVERABLE_GOING_LOW = 1 << 2;
        const UPPER_CRITICAL_GOING_HIGH = 1 << 1;
        const UPPER_CRITICAL_GOING_LOW = 1 << 0;
    }
}

/// Bit index, in the 16-bit event status words, of the transition each
/// alarm property reports.
pub fn alarm_event_bit(property: &str) -> Option<u16> {
    match property {
        WARNING_ALARM_LOW => Some(0),
        CRITICAL_ALARM_LOW => Some(2),
        WARNING_ALARM_HIGH => Some(7),
        CRITICAL_ALARM_HIGH => Some(9),
        _ => None,
    }
}

/// Alarm transitions seen through threshold property-change notifications.
///
/// `true` means asserted; `false` means asserted at some point and
/// deasserted since. A missing entry has never been asserted.
#[derive(Debug, Default)]
pub struct DeassertTracker {
    states: BTreeMap<String, BTreeMap<String, bool>>,
}

impl DeassertTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one PropertiesChanged signal.
    pub fn on_properties_changed(&mut self, path: &str, interface: &str, changed: &PropertyMap) {
        if !interface.starts_with(SENSOR_THRESHOLD_NAMESPACE) {
            return;
        }
        for (name, value) in changed.iter().filter(|(name, _)| name.contains("Alarm")) {
            match value {
                PropertyValue::Bool(true) => {
                    self.states
                        .entry(path.to_string())
                        .or_default()
                        .insert(name.clone(), true);
                }
                PropertyValue::Bool(false) => {
                    if let Some(state) = self
                        .states
                        .get_mut(path)
                        .and_then(|props| props.get_mut(name))
                    {
                        *state = false;
                    }
                }
                other => {
                    error!(
                        "threshold alarm {} on {} is not a boolean: {:?}",
                        name, path, other
                    );
                }
            }
        }
    }

    pub fn state(&self, path: &str, property: &str) -> Option<bool> {
        self.states.get(path).and_then(|props| props.get(property)).copied()
    }

    /// Deassertion bitmap (16 bits) for `path`.
    pub fn deassertions(&self, path: &str) -> u16 {
        let Some(props) = self.states.get(path) else {
            return 0;
        };
        props
            .iter()
            .filter(|(_, asserted)| !**asserted)
            // a deassertion reports on its threshold's assertion bit (WL 0, CL 2, WH 7, CH 9)
            .filter_map(|(name, _)| alarm_event_bit(name))
            .fold(0u16, |acc, bit| acc | (1 << bit))
    }

    pub fn forget(&mut self, path: &str) {
        self.states.remove(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipmi::bus::SENSOR_WARNING_INTERFACE;

    const PATH: &str = "/xyz/openbmc_project/sensors/temperature/ambient";

    fn change(name: &str, value: PropertyValue) -> PropertyMap {
        let mut map = PropertyMap::new();
        map.insert(name.to_string(), value);
        map
    }

    #[test]
    fn test_assert_then_deassert() {
        let mut tracker = DeassertTracker::new();
        tracker.on_properties_changed(
            PATH,
            SENSOR_WARNING_INTERFACE,
            &change(WARNING_ALARM_HIGH, PropertyValue::Bool(true)),
        );
        assert_eq!(tracker.state(PATH, WARNING_ALARM_HIGH), Some(true));
        assert_eq!(tracker.deassertions(PATH), 0);

        tracker.on_properties_changed(
            PATH,
            SENSOR_WARNING_INTERFACE,
            &change(WARNING_ALARM_HIGH, PropertyValue::Bool(false)),
        );
        assert_eq!(tracker.state(PATH, WARNING_ALARM_HIGH), Some(false));
        assert_eq!(tracker.deassertions(PATH), 1 << 7);
    }

    #[test]
    fn test_deassert_without_assert_is_ignored() {
        let mut tracker = DeassertTracker::new();
        tracker.on_properties_changed(
            PATH,
            SENSOR_WARNING_INTERFACE,
            &change(WARNING_ALARM_LOW, PropertyValue::Bool(false)),
        );
        assert_eq!(tracker.state(PATH, WARNING_ALARM_LOW), None);
        assert_eq!(tracker.deassertions(PATH), 0);
    }

    #[test]
    fn test_foreign_interface_and_bad_type() {
        let mut tracker = DeassertTracker::new();
        tracker.on_properties_changed(
            PATH,
            "xyz.openbmc_project.Sensor.Value",
            &change(CRITICAL_ALARM_LOW, PropertyValue::Bool(true)),
        );
        tracker.on_properties_changed(
            PATH,
            SENSOR_WARNING_INTERFACE,
            &change(CRITICAL_ALARM_LOW, PropertyValue::Double(1.0)),
        );
        assert_eq!(tracker.state(PATH, CRITICAL_ALARM_LOW), None);
    }

    #[test]
    fn test_event_bits() {
        assert_eq!(alarm_event_bit(CRITICAL_ALARM_HIGH), Some(9));
        assert_eq!(alarm_event_bit(CRITICAL_ALARM_LOW), Some(2));
        assert_eq!(alarm_event_bit("CriticalHigh"), None);
        assert_eq!(
            ThresholdEventLsb::UPPER_NON_CRITICAL_GOING_HIGH.bits(),
            1 << alarm_event_bit(WARNING_ALARM_HIGH).unwrap()
        );
    }
}
