/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::commands::fru::FruCache;
use crate::commands::sdr::SdrRepoState;
use crate::commands::sensor::cache::{LiveSensorCache, LiveSensorRecord, SensorDirectory, SensorEntry};
use crate::commands::sensor::events::DeassertTracker;
use crate::config::ResponderConfig;
use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::bus::{EventHook, FruInventory, InterfaceMap, LogRotation, PlatformEvent, PropertyMap, SensorBus};
use crate::ipmi::reservation::Reservation;
use crate::ipmi::time::current_timestamp;
use crate::{debug1, debug2, debug3};
use crate::helper::buf2str;
use log::{info, warn};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

/// Responder state shared by every command.
///
/// Owns every piece of mutable responder state and the collaborators that
/// live outside it. Commands run one at a time against `&mut self`.
pub struct ResponderContext {
    pub config: ResponderConfig,
    bus: Box<dyn SensorBus>,
    fru: Box<dyn FruInventory>,
    hook: Box<dyn EventHook>,
    rotation: Box<dyn LogRotation>,
    pub directory: SensorDirectory,
    pub live: LiveSensorCache,
    pub tracker: DeassertTracker,
    pub sdr: SdrRepoState,
    pub sel_reservation: Reservation,
    pub fru_cache: FruCache,
}

impl ResponderContext {
    pub fn new(
        config: ResponderConfig,
        bus: Box<dyn SensorBus>,
        fru: Box<dyn FruInventory>,
        hook: Box<dyn EventHook>,
        rotation: Box<dyn LogRotation>,
    ) -> Self {
        let live = LiveSensorCache::new(config.sensor_map_update_period);
        let fru_cache = FruCache::new(config.fru_write_timeout);
        Self {
            config,
            bus,
            fru,
            hook,
            rotation,
            directory: SensorDirectory::new(),
            live,
            tracker: DeassertTracker::new(),
            sdr: SdrRepoState::new(),
            sel_reservation: Reservation::new(),
            fru_cache,
        }
    }

    pub fn bus(&mut self) -> &mut dyn SensorBus {
        self.bus.as_mut()
    }

    pub fn fru_inventory(&mut self) -> &mut dyn FruInventory {
        self.fru.as_mut()
    }

    pub fn hook(&mut self) -> &mut dyn EventHook {
        self.hook.as_mut()
    }

    pub fn rotation(&mut self) -> &mut dyn LogRotation {
        self.rotation.as_mut()
    }

    /// Service timers: commits a FRU write whose deadline has passed.
    pub fn tick(&mut self) {
        self.fru_cache.flush_expired(self.fru.as_mut(), Instant::now());
    }

    /// Rebuild the sensor directory if it was invalidated.
    pub fn refresh_directory(&mut self) -> IpmiResult<()> {
        let rebuilt = self.directory.refresh(
            self.bus.as_mut(),
            &self.config.sensor_root,
            self.config.sensor_depth,
        )?;
        if rebuilt {
            debug1!("{} sensors in directory", self.directory.len());
        }
        Ok(())
    }

    /// Directory entry behind a sensor number.
    pub fn sensor_connection(&mut self, number: u8) -> IpmiResult<SensorEntry> {
        self.refresh_directory()
            .map_err(|e| IpmiError::ResponseError(format!("sensor directory unavailable: {}", e)))?;
        self.directory
            .entry(number)
            .cloned()
            .ok_or_else(|| IpmiError::InvalidField(format!("sensor number 0x{:02x}", number)))
    }

    /// Live interfaces of a sensor and their typed view.
    pub fn live_sensor(&mut self, entry: &SensorEntry) -> IpmiResult<(InterfaceMap, LiveSensorRecord)> {
        let interfaces = self
            .live
            .get(self.bus.as_mut(), &entry.service, &entry.path)?;
        let record = LiveSensorRecord::from_interfaces(&interfaces)?;
        Ok((interfaces, record))
    }

    pub fn fru_count(&mut self) -> IpmiResult<usize> {
        self.fru.fru_count()
    }

    /// Load `fru_id` into the FRU cache.
    pub fn load_fru(&mut self, fru_id: u8) -> IpmiResult<()> {
        self.fru_cache
            .load(self.fru.as_mut(), fru_id)
            .map_err(|e| IpmiError::ResponseError(format!("FRU {} unavailable: {}", fru_id, e)))
    }

    pub fn write_fru(&mut self, offset: usize, bytes: &[u8]) -> IpmiResult<bool> {
        self.fru_cache.write(self.fru.as_mut(), offset, bytes)
    }

    pub fn forward_platform_event(&mut self, event: &PlatformEvent) -> bool {
        self.hook.forward_platform_event(event)
    }

    /// A sensor object appeared on the bus.
    pub fn on_sensor_added(&mut self, path: &str) {
        info!("sensor added: {}", path);
        self.directory.invalidate();
        self.sdr.last_add = current_timestamp();
    }

    /// A sensor object went away.
    pub fn on_sensor_removed(&mut self, path: &str) {
        info!("sensor removed: {}", path);
        self.directory.invalidate();
        self.tracker.forget(path);
        self.sdr.last_remove = current_timestamp();
    }

    /// PropertiesChanged on a sensor object.
    pub fn on_properties_changed(&mut self, path: &str, interface: &str, changed: &PropertyMap) {
        debug3!("{} changed on {}: {:?}", interface, path, changed);
        self.tracker.on_properties_changed(path, interface, changed);
    }

    /// The FRU subsystem reported new or changed devices.
    pub fn on_fru_changed(&mut self) {
        debug2!("FRU inventory changed, dropping cached image");
        self.fru_cache.invalidate(self.fru.as_mut());
    }

    /// Ask the log service for fresh SEL files.
    pub fn restart_sel_logging(&mut self) {
        if let Err(e) = self.rotation.request_restart() {
            warn!("SEL log restart failed: {}", e);
        }
    }
}

#[derive(Debug, Default)]
pub struct HookLog {
    pub events: Vec<PlatformEvent>,
    pub sel_entries: Vec<Vec<u8>>,
}

/// Event hook that only logs. Nothing is redirected, so every event is
/// reported as not handled. Clones share the same record of calls.
#[derive(Clone, Debug, Default)]
pub struct LogHook {
    log: Rc<RefCell<HookLog>>,
}

impl LogHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> std::cell::Ref<'_, HookLog> {
        self.log.borrow()
    }
}

impl EventHook for LogHook {
    fn forward_platform_event(&mut self, event: &PlatformEvent) -> bool {
        info!(
            "platform event: generator 0x{:04x} sensor type 0x{:02x} num 0x{:02x} event type 0x{:02x} data {:02x?}",
            event.generator_id, event.sensor_type, event.sensor_num, event.event_type, event.event_data
        );
        self.log.borrow_mut().events.push(*event);
        false
    }

    fn forward_sel_entry(&mut self, record: &[u8]) -> bool {
        info!("SEL entry: {}", buf2str(record));
        self.log.borrow_mut().sel_entries.push(record.to_vec());
        false
    }
}

#[derive(Debug, Default)]
pub struct NoopRotation;

impl LogRotation for NoopRotation {
    fn request_restart(&mut self) -> IpmiResult<()> {
        debug2!("SEL log restart requested");
        Ok(())
    }
}
