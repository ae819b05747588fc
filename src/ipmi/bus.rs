/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
//! Collaborators living outside the responder: the sensor object bus, the
//! FRU inventory, the platform event hook and the log rotation service.

use crate::error::IpmiResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const SENSOR_VALUE_INTERFACE: &str = "xyz.openbmc_project.Sensor.Value";
pub const SENSOR_THRESHOLD_NAMESPACE: &str = "xyz.openbmc_project.Sensor.Threshold";
pub const SENSOR_WARNING_INTERFACE: &str = "xyz.openbmc_project.Sensor.Threshold.Warning";
pub const SENSOR_CRITICAL_INTERFACE: &str = "xyz.openbmc_project.Sensor.Threshold.Critical";
pub const SENSOR_AVAILABILITY_INTERFACE: &str =
    "xyz.openbmc_project.State.Decorator.Availability";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Double(v) => Some(*v),
            PropertyValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// property name -> value
pub type PropertyMap = BTreeMap<String, PropertyValue>;
/// interface -> properties
pub type InterfaceMap = BTreeMap<String, PropertyMap>;
/// object path -> interfaces, as returned for one owning service
pub type ManagedObjects = BTreeMap<String, InterfaceMap>;
/// object path -> (service -> implemented interfaces)
pub type SubTree = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Sensor side of the object bus.
pub trait SensorBus {
    /// One-shot subtree query used to build the sensor directory.
    fn get_subtree(&mut self, root: &str, depth: i32, interfaces: &[&str]) -> IpmiResult<SubTree>;

    /// Every object, interface and property owned by `service`.
    fn get_managed_objects(&mut self, service: &str) -> IpmiResult<ManagedObjects>;

    fn set_property(
        &mut self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: PropertyValue,
    ) -> IpmiResult<()>;

    /// Walk the association from a sensor to its physical parent and
    /// return its (entity id, entity instance). `None` keeps the defaults.
    fn resolve_parent_entity(&mut self, _path: &str, _interfaces: &InterfaceMap) -> Option<(u8, u8)> {
        None
    }

    /// Publish the management engine health derived from a platform event.
    fn set_me_health(&mut self, _reason: &str, _state: MeHealth) -> IpmiResult<()> {
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeHealth {
    Ok,
    Warning,
    Critical,
}

impl MeHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeHealth::Ok => "ok",
            MeHealth::Warning => "warning",
            MeHealth::Critical => "critical",
        }
    }
}

/// What the FRU subsystem knows about one FRU device.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FruDescriptor {
    pub fru_id: u8,
    pub name: String,
    #[serde(default)]
    pub entity_id: u8,
    #[serde(default = "default_entity_instance")]
    pub entity_instance: u8,
}

fn default_entity_instance() -> u8 {
    1
}

pub trait FruInventory {
    fn fru_count(&mut self) -> IpmiResult<usize>;

    /// Descriptor at `index`, in the subsystem's own order.
    fn fru_descriptor(&mut self, index: usize) -> IpmiResult<FruDescriptor>;

    fn read_fru(&mut self, fru_id: u8) -> IpmiResult<Vec<u8>>;

    fn write_fru(&mut self, fru_id: u8, data: &[u8]) -> IpmiResult<()>;
}

/// Platform event as forwarded to the external event hook.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlatformEvent {
    pub generator_id: u16,
    pub evm_rev: u8,
    pub sensor_type: u8,
    pub sensor_num: u8,
    pub event_type: u8,
    pub event_data: [u8; 3],
}

pub trait EventHook {
    /// Returns true when the event was routed to the external log.
    fn forward_platform_event(&mut self, event: &PlatformEvent) -> bool;

    /// Raw SEL record from AddSelEntry.
    fn forward_sel_entry(&mut self, record: &[u8]) -> bool;
}

pub trait LogRotation {
    /// Ask the logging subsystem to start new SEL files.
    fn request_restart(&mut self) -> IpmiResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_conversions() {
        assert_eq!(PropertyValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Double(1.5).as_f64(), Some(1.5));
        assert_eq!(PropertyValue::Bool(true).as_f64(), None);
        assert_eq!(PropertyValue::Bool(false).as_bool(), Some(false));
        assert_eq!(PropertyValue::Str("x".into()).as_bool(), None);
    }

    #[test]
    fn test_property_value_json() {
        let v: PropertyValue = serde_json::from_str("125.5").unwrap();
        assert_eq!(v, PropertyValue::Double(125.5));
        let v: PropertyValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, PropertyValue::Bool(true));
        let fru: FruDescriptor = serde_json::from_str(r#"{"fru_id": 3, "name": "Board"}"#).unwrap();
        assert_eq!(fru.entity_instance, 1);
    }
}
