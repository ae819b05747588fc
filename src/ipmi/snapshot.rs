/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
//! In-memory bus backed by a JSON snapshot of the sensor tree and FRU
//! inventory. Used by the command line tool and by tests.

use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::bus::{
    FruDescriptor, FruInventory, InterfaceMap, ManagedObjects, MeHealth, PropertyValue,
    SensorBus, SubTree,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::rc::Rc;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SnapshotFru {
    #[serde(flatten)]
    pub descriptor: FruDescriptor,
    #[serde(default)]
    pub data: Vec<u8>,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BusStats {
    pub subtree_queries: usize,
    pub property_fetches: usize,
    pub property_writes: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BusSnapshot {
    /// service -> path -> interface -> property
    #[serde(default)]
    pub services: BTreeMap<String, ManagedObjects>,
    /// sensor path -> (entity id, entity instance)
    #[serde(default)]
    pub entities: BTreeMap<String, (u8, u8)>,
    #[serde(default)]
    pub frus: Vec<SnapshotFru>,
    /// Services that fail every call
    #[serde(skip)]
    pub offline: BTreeSet<String>,
    #[serde(skip)]
    pub me_health: Vec<(String, MeHealth)>,
    #[serde(skip)]
    pub stats: BusStats,
}

impl BusSnapshot {
    pub fn insert_sensor(&mut self, service: &str, path: &str, interfaces: InterfaceMap) {
        self.services
            .entry(service.to_string())
            .or_default()
            .insert(path.to_string(), interfaces);
    }

    pub fn remove_sensor(&mut self, path: &str) {
        for objects in self.services.values_mut() {
            objects.remove(path);
        }
    }
}

/// Cheap-to-clone handle; clones share the same snapshot.
#[derive(Clone, Debug, Default)]
pub struct SnapshotBus {
    state: Rc<RefCell<BusSnapshot>>,
}

impl SnapshotBus {
    pub fn new(snapshot: BusSnapshot) -> Self {
        Self {
            state: Rc::new(RefCell::new(snapshot)),
        }
    }

    pub fn from_json(text: &str) -> IpmiResult<Self> {
        let snapshot: BusSnapshot = serde_json::from_str(text)
            .map_err(|e| IpmiError::System(format!("invalid bus snapshot: {}", e)))?;
        Ok(Self::new(snapshot))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> IpmiResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn state(&self) -> std::cell::RefMut<'_, BusSnapshot> {
        self.state.borrow_mut()
    }

    pub fn stats(&self) -> BusStats {
        self.state.borrow().stats
    }

    fn check_online(&self, service: &str) -> IpmiResult<()> {
        if self.state.borrow().offline.contains(service) {
            return Err(IpmiError::Bus(format!("service {} unreachable", service)));
        }
        Ok(())
    }
}

fn within_depth(root: &str, path: &str, depth: i32) -> bool {
    let Some(rest) = path.strip_prefix(root) else {
        return false;
    };
    if !rest.starts_with('/') {
        return false;
    }
    let levels = rest.split('/').filter(|s| !s.is_empty()).count() as i32;
    depth <= 0 || levels <= depth
}

impl SensorBus for SnapshotBus {
    fn get_subtree(&mut self, root: &str, depth: i32, interfaces: &[&str]) -> IpmiResult<SubTree> {
        let mut state = self.state.borrow_mut();
        state.stats.subtree_queries += 1;
        let mut tree = SubTree::new();
        for (service, objects) in state.services.iter() {
            if state.offline.contains(service) {
                continue;
            }
            for (path, ifaces) in objects {
                if !within_depth(root, path, depth) {
                    continue;
                }
                if !interfaces.is_empty() && !interfaces.iter().any(|i| ifaces.contains_key(*i)) {
                    continue;
                }
                tree.entry(path.clone())
                    .or_default()
                    .insert(service.clone(), ifaces.keys().cloned().collect());
            }
        }
        Ok(tree)
    }

    fn get_managed_objects(&mut self, service: &str) -> IpmiResult<ManagedObjects> {
        self.check_online(service)?;
        let mut state = self.state.borrow_mut();
        state.stats.property_fetches += 1;
        state
            .services
            .get(service)
            .cloned()
            .ok_or_else(|| IpmiError::Bus(format!("unknown service {}", service)))
    }

    fn set_property(
        &mut self,
        service: &str,
        path: &str,
        interface: &str,
        property: &str,
        value: PropertyValue,
    ) -> IpmiResult<()> {
        self.check_online(service)?;
        let mut state = self.state.borrow_mut();
        state.stats.property_writes += 1;
        let props = state
            .services
            .get_mut(service)
            .and_then(|objects| objects.get_mut(path))
            .and_then(|ifaces| ifaces.get_mut(interface))
            .ok_or_else(|| IpmiError::Bus(format!("no {} on {}", interface, path)))?;
        props.insert(property.to_string(), value);
        Ok(())
    }

    fn resolve_parent_entity(&mut self, path: &str, _interfaces: &InterfaceMap) -> Option<(u8, u8)> {
        self.state.borrow().entities.get(path).copied()
    }

    fn set_me_health(&mut self, reason: &str, state: MeHealth) -> IpmiResult<()> {
        self.state
            .borrow_mut()
            .me_health
            .push((reason.to_string(), state));
        Ok(())
    }
}

impl FruInventory for SnapshotBus {
    fn fru_count(&mut self) -> IpmiResult<usize> {
        Ok(self.state.borrow().frus.len())
    }

    fn fru_descriptor(&mut self, index: usize) -> IpmiResult<FruDescriptor> {
        self.state
            .borrow()
            .frus
            .get(index)
            .map(|f| f.descriptor.clone())
            .ok_or_else(|| IpmiError::ResponseError(format!("no FRU at index {}", index)))
    }

    fn read_fru(&mut self, fru_id: u8) -> IpmiResult<Vec<u8>> {
        self.state
            .borrow()
            .frus
            .iter()
            .find(|f| f.descriptor.fru_id == fru_id)
            .map(|f| f.data.clone())
            .ok_or_else(|| IpmiError::ResponseError(format!("no FRU device {}", fru_id)))
    }

    fn write_fru(&mut self, fru_id: u8, data: &[u8]) -> IpmiResult<()> {
        let mut state = self.state.borrow_mut();
        let fru = state
            .frus
            .iter_mut()
            .find(|f| f.descriptor.fru_id == fru_id)
            .ok_or_else(|| IpmiError::ResponseError(format!("no FRU device {}", fru_id)))?;
        fru.data = data.to_vec();
        Ok(())
    }
}
