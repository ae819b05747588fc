/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
//! Sensor directory (path <-> sensor number) and the per-service cache of
//! live sensor properties.

use crate::commands::sensor::events::{
    CRITICAL_ALARM_HIGH, CRITICAL_ALARM_LOW, WARNING_ALARM_HIGH, WARNING_ALARM_LOW,
};
use crate::commands::sensor::linear::{
    derive_params, LinearizationParams, DEFAULT_SENSOR_MAX, DEFAULT_SENSOR_MIN,
};
use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::bus::{
    InterfaceMap, ManagedObjects, PropertyMap, SensorBus, SENSOR_AVAILABILITY_INTERFACE,
    SENSOR_CRITICAL_INTERFACE, SENSOR_VALUE_INTERFACE, SENSOR_WARNING_INTERFACE,
};
use crate::{debug2, debug3};
use log::warn;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Sensor number 0xFF never names a sensor.
pub const INVALID_SENSOR_NUMBER: u8 = 0xff;
const MAX_SENSOR_NUMBERS: usize = INVALID_SENSOR_NUMBER as usize;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SensorEntry {
    pub path: String,
    pub service: String,
    pub interfaces: Vec<String>,
}

impl SensorEntry {
    /// Second to last path segment: `temperature`, `voltage`, ...
    pub fn type_string(&self) -> &str {
        sensor_type_string(&self.path)
    }

    /// Last path segment.
    pub fn label(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }
}

pub fn sensor_type_string(path: &str) -> &str {
    let mut segments = path.rsplit('/');
    segments.next();
    segments.next().unwrap_or("")
}

/// Sensor number tied to the directory snapshot it was issued from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SensorHandle {
    pub number: u8,
    generation: u64,
}

/// Sorted snapshot of the sensor subtree. Sensor numbers are indexes into
/// it and only hold until the next rebuild.
#[derive(Debug, Default)]
pub struct SensorDirectory {
    entries: Vec<SensorEntry>,
    valid: bool,
    generation: u64,
}

impl SensorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the snapshot; the next lookup rebuilds it.
    pub fn invalidate(&mut self) {
        if self.valid {
            debug2!("sensor directory invalidated");
        }
        self.valid = false;
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Rebuild if needed. Returns true when a rebuild happened.
    pub fn refresh(&mut self, bus: &mut dyn SensorBus, root: &str, depth: i32) -> IpmiResult<bool> {
        if self.valid {
            return Ok(false);
        }
        let tree = bus
            .get_subtree(root, depth, &[SENSOR_VALUE_INTERFACE])
            .map_err(|e| {
                warn!("sensor discovery under {} failed: {}", root, e);
                e
            })?;

        let mut entries = Vec::with_capacity(tree.len());
        for (path, services) in tree {
            let Some((service, interfaces)) = services.into_iter().next() else {
                continue;
            };
            entries.push(SensorEntry {
                path,
                service,
                interfaces,
            });
        }
        if entries.len() > MAX_SENSOR_NUMBERS {
            warn!(
                "{} sensors discovered, only {} can be numbered",
                entries.len(),
                MAX_SENSOR_NUMBERS
            );
        }

        self.entries = entries;
        self.valid = true;
        self.generation = self.generation.wrapping_add(1);
        debug2!(
            "sensor directory rebuilt: {} sensors (generation {})",
            self.entries.len(),
            self.generation
        );
        Ok(true)
    }

    pub fn entries(&self) -> &[SensorEntry] {
        if self.valid {
            &self.entries
        } else {
            &[]
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn sensor_number(&self, path: &str) -> Option<u8> {
        self.entries()
            .iter()
            .position(|e| e.path == path)
            .filter(|idx| *idx < MAX_SENSOR_NUMBERS)
            .map(|idx| idx as u8)
    }

    pub fn entry(&self, number: u8) -> Option<&SensorEntry> {
        if number == INVALID_SENSOR_NUMBER {
            return None;
        }
        self.entries().get(number as usize)
    }

    pub fn handle(&self, path: &str) -> Option<SensorHandle> {
        self.sensor_number(path).map(|number| SensorHandle {
            number,
            generation: self.generation,
        })
    }

    /// Entry for a handle, or `None` if the directory was rebuilt or
    /// invalidated since the handle was issued.
    pub fn resolve(&self, handle: SensorHandle) -> Option<&SensorEntry> {
        if !self.valid || handle.generation != self.generation {
            return None;
        }
        self.entry(handle.number)
    }
}

struct ServiceSnapshot {
    fetched: Instant,
    objects: ManagedObjects,
}

/// Per-service copy of every sensor property, refetched once the
/// staleness window has passed.
pub struct LiveSensorCache {
    window: Duration,
    services: HashMap<String, ServiceSnapshot>,
}

impl LiveSensorCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            services: HashMap::new(),
        }
    }

    fn is_stale(&self, service: &str) -> bool {
        self.services
            .get(service)
            .map_or(true, |snap| snap.fetched.elapsed() > self.window)
    }

    /// Properties of `path` as owned by `service`.
    ///
    /// An unreachable service is a bus error; a reachable service without
    /// the path is `SensorNotFound`.
    pub fn get(
        &mut self,
        bus: &mut dyn SensorBus,
        service: &str,
        path: &str,
    ) -> IpmiResult<InterfaceMap> {
        if self.is_stale(service) {
            debug3!("refreshing sensor properties of {}", service);
            let objects = bus.get_managed_objects(service).map_err(|e| {
                warn!("fetching properties of {} failed: {}", service, e);
                e
            })?;
            self.services.insert(
                service.to_string(),
                ServiceSnapshot {
                    fetched: Instant::now(),
                    objects,
                },
            );
        }

        self.services
            .get(service)
            .and_then(|snap| snap.objects.get(path))
            .cloned()
            .ok_or_else(|| IpmiError::SensorNotFound(format!("{} not owned by {}", path, service)))
    }

    /// Force the next lookup on `service` to refetch.
    pub fn invalidate(&mut self, service: &str) {
        self.services.remove(service);
    }

    pub fn clear(&mut self) {
        self.services.clear();
    }
}

/// High/low pair of one threshold interface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ThresholdPair {
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub alarm_high: Option<bool>,
    pub alarm_low: Option<bool>,
}

impl ThresholdPair {
    fn from_props(props: &PropertyMap, prefix: &str, alarm_high: &str, alarm_low: &str) -> Self {
        // NaN marks an unset threshold
        let number = |name: String| {
            props
                .get(&name)
                .and_then(|v| v.as_f64())
                .filter(|v| !v.is_nan())
        };
        let flag = |name: &str| props.get(name).and_then(|v| v.as_bool());
        Self {
            high: number(format!("{}High", prefix)),
            low: number(format!("{}Low", prefix)),
            alarm_high: flag(alarm_high),
            alarm_low: flag(alarm_low),
        }
    }
}

/// Typed view of one sensor's interfaces.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LiveSensorRecord {
    /// `None` when the Value property is missing, NaN when unreadable
    pub value: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub warning: Option<ThresholdPair>,
    pub critical: Option<ThresholdPair>,
    pub available: Option<bool>,
}

impl LiveSensorRecord {
    pub fn from_interfaces(interfaces: &InterfaceMap) -> IpmiResult<Self> {
        let value_props = interfaces.get(SENSOR_VALUE_INTERFACE).ok_or_else(|| {
            IpmiError::ResponseError("sensor has no Value interface".to_string())
        })?;
        let number = |name: &str| value_props.get(name).and_then(|v| v.as_f64());

        Ok(Self {
            value: number("Value"),
            min: number("MinValue"),
            max: number("MaxValue"),
            warning: interfaces.get(SENSOR_WARNING_INTERFACE).map(|props| {
                ThresholdPair::from_props(props, "Warning", WARNING_ALARM_HIGH, WARNING_ALARM_LOW)
            }),
            critical: interfaces.get(SENSOR_CRITICAL_INTERFACE).map(|props| {
                ThresholdPair::from_props(
                    props,
                    "Critical",
                    CRITICAL_ALARM_HIGH,
                    CRITICAL_ALARM_LOW,
                )
            }),
            available: interfaces
                .get(SENSOR_AVAILABILITY_INTERFACE)
                .and_then(|props| props.get("Available"))
                .and_then(|v| v.as_bool()),
        })
    }

    pub fn has_thresholds(&self) -> bool {
        self.warning.is_some() || self.critical.is_some()
    }

    pub fn is_unavailable(&self) -> bool {
        self.available == Some(false) || self.value.map_or(true, f64::is_nan)
    }

    /// Declared range widened to cover every configured threshold.
    pub fn range(&self) -> (f64, f64) {
        let mut min = self.min.unwrap_or(DEFAULT_SENSOR_MIN);
        let mut max = self.max.unwrap_or(DEFAULT_SENSOR_MAX);
        for pair in [self.critical, self.warning].iter().flatten() {
            if let Some(low) = pair.low {
                min = min.min(low);
            }
            if let Some(high) = pair.high {
                max = max.max(high);
            }
        }
        (min, max)
    }

    pub fn params(&self) -> IpmiResult<LinearizationParams> {
        let (min, max) = self.range();
        derive_params(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipmi::bus::PropertyValue;
    use crate::ipmi::snapshot::{BusSnapshot, SnapshotBus};

    const ROOT: &str = "/xyz/openbmc_project/sensors";
    const SERVICE: &str = "xyz.openbmc_project.HwmonTempSensor";

    fn value_iface(value: f64) -> InterfaceMap {
        let mut props = PropertyMap::new();
        props.insert("Value".to_string(), PropertyValue::Double(value));
        let mut ifaces = InterfaceMap::new();
        ifaces.insert(SENSOR_VALUE_INTERFACE.to_string(), props);
        ifaces
    }

    fn bus_with(paths: &[&str]) -> SnapshotBus {
        let mut snapshot = BusSnapshot::default();
        for path in paths {
            snapshot.insert_sensor(SERVICE, path, value_iface(1.0));
        }
        SnapshotBus::new(snapshot)
    }

    #[test]
    fn test_directory_numbers_follow_path_order() {
        let mut bus = bus_with(&[
            "/xyz/openbmc_project/sensors/voltage/p3v3",
            "/xyz/openbmc_project/sensors/fan_tach/fan0",
        ]);
        let mut dir = SensorDirectory::new();
        assert!(dir.refresh(&mut bus, ROOT, 2).unwrap());
        assert!(!dir.refresh(&mut bus, ROOT, 2).unwrap());
        assert_eq!(bus.stats().subtree_queries, 1);

        assert_eq!(
            dir.sensor_number("/xyz/openbmc_project/sensors/fan_tach/fan0"),
            Some(0)
        );
        assert_eq!(dir.entry(1).map(|e| e.label()), Some("p3v3"));
        assert_eq!(dir.entry(1).map(|e| e.type_string()), Some("voltage"));
        assert!(dir.entry(INVALID_SENSOR_NUMBER).is_none());
    }

    #[test]
    fn test_stale_handle_fails_after_rebuild() {
        let mut bus = bus_with(&["/xyz/openbmc_project/sensors/voltage/p3v3"]);
        let mut dir = SensorDirectory::new();
        dir.refresh(&mut bus, ROOT, 2).unwrap();
        let handle = dir
            .handle("/xyz/openbmc_project/sensors/voltage/p3v3")
            .unwrap();
        assert!(dir.resolve(handle).is_some());

        bus.state().insert_sensor(
            SERVICE,
            "/xyz/openbmc_project/sensors/current/aux",
            value_iface(0.5),
        );
        dir.invalidate();
        assert!(dir.resolve(handle).is_none());
        assert!(dir.entries().is_empty());
        assert!(dir.refresh(&mut bus, ROOT, 2).unwrap());
        assert!(dir.resolve(handle).is_none());
        assert_eq!(dir.len(), 2);
    }

    #[test]
    fn test_live_cache_serves_within_window() {
        let path = "/xyz/openbmc_project/sensors/voltage/p3v3";
        let mut bus = bus_with(&[path]);
        let mut cache = LiveSensorCache::new(Duration::from_secs(3600));
        cache.get(&mut bus, SERVICE, path).unwrap();
        cache.get(&mut bus, SERVICE, path).unwrap();
        assert_eq!(bus.stats().property_fetches, 1);

        cache.invalidate(SERVICE);
        cache.get(&mut bus, SERVICE, path).unwrap();
        assert_eq!(bus.stats().property_fetches, 2);
    }

    #[test]
    fn test_live_cache_refreshes_when_stale() {
        let path = "/xyz/openbmc_project/sensors/voltage/p3v3";
        let mut bus = bus_with(&[path]);
        let mut cache = LiveSensorCache::new(Duration::ZERO);
        cache.get(&mut bus, SERVICE, path).unwrap();
        std::thread::sleep(Duration::from_millis(2));
        cache.get(&mut bus, SERVICE, path).unwrap();
        assert_eq!(bus.stats().property_fetches, 2);
    }

    #[test]
    fn test_live_cache_errors() {
        let path = "/xyz/openbmc_project/sensors/voltage/p3v3";
        let mut bus = bus_with(&[path]);
        let mut cache = LiveSensorCache::new(Duration::from_secs(10));
        assert!(matches!(
            cache.get(&mut bus, SERVICE, "/xyz/openbmc_project/sensors/voltage/gone"),
            Err(IpmiError::SensorNotFound(_))
        ));
        assert!(matches!(
            cache.get(&mut bus, "xyz.openbmc_project.Missing", path),
            Err(IpmiError::Bus(_))
        ));
    }

    #[test]
    fn test_record_range_widens_with_thresholds() {
        let mut ifaces = value_iface(30.0);
        let value = ifaces.get_mut(SENSOR_VALUE_INTERFACE).unwrap();
        value.insert("MinValue".to_string(), PropertyValue::Double(0.0));
        value.insert("MaxValue".to_string(), PropertyValue::Double(100.0));
        let mut crit = PropertyMap::new();
        crit.insert("CriticalHigh".to_string(), PropertyValue::Double(110.0));
        crit.insert("CriticalLow".to_string(), PropertyValue::Double(-5.0));
        crit.insert(CRITICAL_ALARM_HIGH.to_string(), PropertyValue::Bool(true));
        ifaces.insert(SENSOR_CRITICAL_INTERFACE.to_string(), crit);

        let record = LiveSensorRecord::from_interfaces(&ifaces).unwrap();
        assert_eq!(record.range(), (-5.0, 110.0));
        assert!(record.has_thresholds());
        assert_eq!(record.critical.unwrap().alarm_high, Some(true));
        assert_eq!(record.warning, None);
        assert!(!record.is_unavailable());
    }

    #[test]
    fn test_record_defaults_and_unavailable() {
        let mut ifaces = value_iface(f64::NAN);
        let record = LiveSensorRecord::from_interfaces(&ifaces).unwrap();
        assert_eq!(record.range(), (DEFAULT_SENSOR_MIN, DEFAULT_SENSOR_MAX));
        assert!(record.is_unavailable());

        ifaces.remove(SENSOR_VALUE_INTERFACE);
        assert!(LiveSensorRecord::from_interfaces(&ifaces).is_err());
    }
}
