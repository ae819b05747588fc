/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
pub mod cache;
pub mod events;
pub mod linear;

use crate::commands::sdr::record::FullSensorView;
use crate::commands::sdr::types::SDR_RECORD_TYPE_FULL_SENSOR;
use crate::commands::sdr::{ipmi_sdr_get_record, ipmi_sdr_get_reservation};
use crate::commands::sendrecv;
use crate::commands::sensor::cache::{
    LiveSensorRecord, SensorEntry, ThresholdPair, INVALID_SENSOR_NUMBER,
};
use crate::commands::sensor::events::*;
use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::bus::{
    InterfaceMap, MeHealth, PlatformEvent, PropertyValue, SENSOR_CRITICAL_INTERFACE,
    SENSOR_WARNING_INTERFACE,
};
use crate::ipmi::context::ResponderContext;
use crate::ipmi::ipmi::*;
use crate::{debug2, debug3};
use clap::{Subcommand, ValueEnum};
use ipmi_macros::AsBytes;
use log::error;
use std::error::Error;

/// IPMI 2.0 event message revision; a payload starting with it carries
/// no generator id.
const IPMI_EVM_REV: u8 = 0x04;
/// Sensor number the ME reports its own health on.
const ME_HEALTH_SENSOR: u8 = 0x17;
const EVENT_TYPE_DEASSERTION: u8 = 0x80;
const SET_THRESHOLD_RESERVED: u8 = 0xc0;

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SensorNumRq {
    pub sensor_num: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SensorReadingRs {
    pub value: u8,
    pub operation: u8,
    pub thresholds: u8,
}

/// Threshold values in wire order; shared by Get and Set Sensor Thresholds.
#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SensorThresholdsRs {
    pub mask: u8,
    pub lower_non_critical: u8,
    pub lower_critical: u8,
    pub lower_non_recoverable: u8,
    pub upper_non_critical: u8,
    pub upper_critical: u8,
    pub upper_non_recoverable: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SetSensorThresholdsRq {
    pub sensor_num: u8,
    pub mask: u8,
    pub lower_non_critical: u8,
    pub lower_critical: u8,
    pub lower_non_recoverable: u8,
    pub upper_non_critical: u8,
    pub upper_critical: u8,
    pub upper_non_recoverable: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SensorEventEnableRs {
    pub enabled: u8,
    pub assertion_lsb: u8,
    pub assertion_msb: u8,
    pub deassertion_lsb: u8,
    pub deassertion_msb: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SensorEventStatusRs {
    pub flags: u8,
    pub assertions: u16,
    pub deassertions: u16,
}

fn sensor_num(data: &[u8]) -> IpmiResult<u8> {
    SensorNumRq::from_le_bytes(data)
        .map(|rq| rq.sensor_num)
        .map_err(|_| IpmiError::ReqDataLenInvalid)
}

/// Directory entry, raw interfaces and typed view of sensor `num`.
fn lookup_sensor(
    ctx: &mut ResponderContext,
    num: u8,
) -> IpmiResult<(SensorEntry, InterfaceMap, LiveSensorRecord)> {
    let entry = ctx.sensor_connection(num)?;
    let (interfaces, record) = ctx.live_sensor(&entry).map_err(|e| {
        error!("sensor 0x{:02x} ({}) map error: {}", num, entry.path, e);
        IpmiError::ResponseError(format!("sensor {} unavailable: {}", entry.path, e))
    })?;
    Ok((entry, interfaces, record))
}

/// Alarm bits of one threshold pair as a comparison-status mask.
fn alarm_mask(pair: Option<ThresholdPair>, high: ThresholdMask, low: ThresholdMask) -> ThresholdMask {
    let mut mask = ThresholdMask::empty();
    if let Some(pair) = pair {
        if pair.alarm_high == Some(true) {
            mask |= high;
        }
        if pair.alarm_low == Some(true) {
            mask |= low;
        }
    }
    mask
}

/// ME health state for a health event, `None` when the code is not tracked.
fn me_health_state(data2: u8, data3: u8, deassert: bool) -> Option<MeHealth> {
    let state = match data2 {
        0x01 | 0x02 | 0x04..=0x09 | 0x0d | 0x0e => MeHealth::Critical,
        // only the first states of 0x03 matter
        0x03 if data3 <= 0x02 => MeHealth::Warning,
        0x0a | 0x13 | 0x19 | 0x1a => MeHealth::Warning,
        _ => return None,
    };
    if deassert {
        Some(MeHealth::Ok)
    } else {
        Some(state)
    }
}

/// Platform Event Message. Logged through the event hook, never the SEL.
pub fn ipmi_sen_platform_event(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    // system interface requests lead with the generator id, IPMB ones do not
    let (generator_id, body) = match data.first() {
        Some(&IPMI_EVM_REV) => (IPMI_ME_SLAVE_ADDR as u16, data),
        Some(&generator) => (generator as u16, &data[1..]),
        None => return Err(IpmiError::ReqDataLenInvalid),
    };
    if body.len() < 5 || body.len() > 7 {
        return Err(IpmiError::ReqDataLenInvalid);
    }
    let data2 = body.get(5).copied();
    let data3 = body.get(6).copied();
    let event = PlatformEvent {
        generator_id,
        evm_rev: body[0],
        sensor_type: body[1],
        sensor_num: body[2],
        event_type: body[3],
        event_data: [body[4], data2.unwrap_or(0xff), data3.unwrap_or(0xff)],
    };
    let handled = ctx.forward_platform_event(&event);
    debug2!("platform event from 0x{:02x}, handled by hook: {}", generator_id, handled);

    if generator_id == IPMI_ME_SLAVE_ADDR as u16 && event.sensor_num == ME_HEALTH_SENSOR {
        if let (Some(data2), Some(data3)) = (data2, data3) {
            let deassert = event.event_type & EVENT_TYPE_DEASSERTION != 0;
            if let Some(state) = me_health_state(data2, data3, deassert) {
                if let Err(e) = ctx.bus().set_me_health(&data2.to_string(), state) {
                    error!("Failed to set ME health: {}", e);
                }
            }
        }
    }
    Ok(Vec::new())
}

/// Get Sensor Reading: `[value, operation, threshold status]`.
pub fn ipmi_sen_get_sensor_reading(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let num = sensor_num(data)?;
    let (entry, _, record) = lookup_sensor(ctx, num)?;
    let value = record
        .value
        .ok_or_else(|| IpmiError::ResponseError(format!("{} has no Value", entry.path)))?;
    let params = record.params()?;

    let mut operation = SensorOperation::SENSOR_SCANNING_ENABLE | SensorOperation::EVENT_MESSAGES_ENABLE;
    let raw = if record.is_unavailable() {
        operation |= SensorOperation::READING_STATE_UNAVAILABLE;
        0
    } else {
        params.encode(value)
    };
    let thresholds = alarm_mask(
        record.warning,
        ThresholdMask::UPPER_NON_CRITICAL,
        ThresholdMask::LOWER_NON_CRITICAL,
    ) | alarm_mask(
        record.critical,
        ThresholdMask::UPPER_CRITICAL,
        ThresholdMask::LOWER_CRITICAL,
    );
    debug3!("sensor 0x{:02x} value {} raw 0x{:02x}", num, value, raw);

    Ok(SensorReadingRs {
        value: raw,
        operation: operation.bits(),
        thresholds: thresholds.bits(),
    }
    .to_le_bytes())
}

/// Get Sensor Thresholds. Non-recoverable thresholds are never readable.
pub fn ipmi_sen_get_sensor_thresholds(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let num = sensor_num(data)?;
    let (_, _, record) = lookup_sensor(ctx, num)?;
    let mut rsp = SensorThresholdsRs::default();
    if !record.has_thresholds() {
        return Ok(rsp.to_le_bytes());
    }

    let params = record.params()?;
    let mut mask = ThresholdMask::empty();
    let mut set = |value: Option<f64>, bit: ThresholdMask, field: &mut u8| {
        if let Some(value) = value {
            mask |= bit;
            *field = params.encode(value);
        }
    };
    if let Some(warning) = record.warning {
        set(warning.high, ThresholdMask::UPPER_NON_CRITICAL, &mut rsp.upper_non_critical);
        set(warning.low, ThresholdMask::LOWER_NON_CRITICAL, &mut rsp.lower_non_critical);
    }
    if let Some(critical) = record.critical {
        set(critical.high, ThresholdMask::UPPER_CRITICAL, &mut rsp.upper_critical);
        set(critical.low, ThresholdMask::LOWER_CRITICAL, &mut rsp.lower_critical);
    }
    rsp.mask = mask.bits();
    Ok(rsp.to_le_bytes())
}

/// Set Sensor Thresholds. Only the warning and critical pairs exist.
pub fn ipmi_sen_set_sensor_thresholds(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let rq = SetSensorThresholdsRq::from_le_bytes(data).map_err(|_| IpmiError::ReqDataLenInvalid)?;
    if rq.mask & SET_THRESHOLD_RESERVED != 0 {
        return Err(IpmiError::InvalidField("reserved threshold mask bits".to_string()));
    }
    let mask = ThresholdMask::from_bits_truncate(rq.mask);
    if mask.intersects(ThresholdMask::LOWER_NON_RECOVERABLE | ThresholdMask::UPPER_NON_RECOVERABLE) {
        return Err(IpmiError::InvalidField(
            "non-recoverable thresholds are not supported".to_string(),
        ));
    }
    if mask.is_empty() {
        return Ok(Vec::new());
    }

    let (entry, interfaces, record) = lookup_sensor(ctx, rq.sensor_num)?;
    let selected = [
        (ThresholdMask::LOWER_CRITICAL, SENSOR_CRITICAL_INTERFACE, "CriticalLow", rq.lower_critical),
        (ThresholdMask::UPPER_CRITICAL, SENSOR_CRITICAL_INTERFACE, "CriticalHigh", rq.upper_critical),
        (ThresholdMask::LOWER_NON_CRITICAL, SENSOR_WARNING_INTERFACE, "WarningLow", rq.lower_non_critical),
        (ThresholdMask::UPPER_NON_CRITICAL, SENSOR_WARNING_INTERFACE, "WarningHigh", rq.upper_non_critical),
    ];

    // every selected property must exist before anything is written
    let mut to_set = Vec::new();
    for (bit, interface, property, raw) in selected {
        if !mask.contains(bit) {
            continue;
        }
        let props = interfaces.get(interface).ok_or_else(|| {
            IpmiError::InvalidField(format!("{} has no {}", entry.path, interface))
        })?;
        if !props.contains_key(property) {
            return Err(IpmiError::InvalidField(format!(
                "{} has no {} threshold",
                entry.path, property
            )));
        }
        to_set.push((interface, property, raw));
    }

    let params = record.params()?;
    for (interface, property, raw) in to_set {
        let value = params.decode(raw);
        debug2!("setting {} of {} to {}", property, entry.path, value);
        ctx.bus()
            .set_property(&entry.service, &entry.path, interface, property, PropertyValue::Double(value))
            .map_err(|e| {
                error!("setting {} on {} failed: {}", property, entry.path, e);
                e
            })?;
    }
    ctx.live.invalidate(&entry.service);
    Ok(Vec::new())
}

/// Get Sensor Event Enable, derived from the configured thresholds.
pub fn ipmi_sen_get_sensor_event_enable(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let num = sensor_num(data)?;
    let (_, _, record) = lookup_sensor(ctx, num)?;
    let mut rsp = SensorEventEnableRs::default();
    if !record.has_thresholds() {
        return Ok(rsp.to_le_bytes());
    }
    rsp.enabled = SensorOperation::SENSOR_SCANNING_ENABLE.bits();

    let mut assert_lsb = ThresholdEventLsb::empty();
    let mut deassert_lsb = ThresholdEventLsb::empty();
    let mut assert_msb = ThresholdEventMsb::empty();
    let mut deassert_msb = ThresholdEventMsb::empty();
    if let Some(warning) = record.warning {
        if warning.high.is_some() {
            assert_lsb |= ThresholdEventLsb::UPPER_NON_CRITICAL_GOING_HIGH;
            deassert_lsb |= ThresholdEventLsb::UPPER_NON_CRITICAL_GOING_LOW;
        }
        if warning.low.is_some() {
            assert_lsb |= ThresholdEventLsb::LOWER_NON_CRITICAL_GOING_LOW;
            deassert_lsb |= ThresholdEventLsb::LOWER_NON_CRITICAL_GOING_HIGH;
        }
    }
    if let Some(critical) = record.critical {
        if critical.high.is_some() {
            assert_msb |= ThresholdEventMsb::UPPER_CRITICAL_GOING_HIGH;
            deassert_msb |= ThresholdEventMsb::UPPER_CRITICAL_GOING_LOW;
        }
        if critical.low.is_some() {
            assert_lsb |= ThresholdEventLsb::LOWER_CRITICAL_GOING_LOW;
            deassert_lsb |= ThresholdEventLsb::LOWER_CRITICAL_GOING_HIGH;
        }
    }
    rsp.assertion_lsb = assert_lsb.bits();
    rsp.assertion_msb = assert_msb.bits();
    rsp.deassertion_lsb = deassert_lsb.bits();
    rsp.deassertion_msb = deassert_msb.bits();
    Ok(rsp.to_le_bytes())
}

/// Get Sensor Event Status: live alarms as assertions, tracked
/// high-to-low alarm transitions as deassertions.
pub fn ipmi_sen_get_sensor_event_status(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let num = sensor_num(data)?;
    if num == INVALID_SENSOR_NUMBER {
        return Err(IpmiError::InvalidField("reserved sensor number 0xff".to_string()));
    }
    let (entry, _, record) = lookup_sensor(ctx, num)?;

    let mut flags = SensorOperation::SENSOR_SCANNING_ENABLE;
    let mut assertions = 0u16;
    if record.has_thresholds() {
        flags |= SensorOperation::EVENT_MESSAGES_ENABLE;
        let alarms = [
            (record.warning.and_then(|p| p.alarm_high), WARNING_ALARM_HIGH),
            (record.warning.and_then(|p| p.alarm_low), WARNING_ALARM_LOW),
            (record.critical.and_then(|p| p.alarm_high), CRITICAL_ALARM_HIGH),
            (record.critical.and_then(|p| p.alarm_low), CRITICAL_ALARM_LOW),
        ];
        for (active, property) in alarms {
            if active == Some(true) {
                if let Some(bit) = alarm_event_bit(property) {
                    assertions |= 1 << bit;
                }
            }
        }
    }
    let deassertions = ctx.tracker.deassertions(&entry.path);
    debug3!(
        "sensor 0x{:02x} assertions 0x{:04x} deassertions 0x{:04x}",
        num,
        assertions,
        deassertions
    );

    Ok(SensorEventStatusRs {
        flags: flags.bits(),
        assertions,
        deassertions,
    }
    .to_le_bytes())
}

/// Decoded Get Sensor Reading response.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorReading {
    pub raw: u8,
    pub operation: SensorOperation,
    pub thresholds: ThresholdMask,
    pub unavailable: bool,
}

impl SensorReading {
    /// ipmitool style status column
    pub fn status(&self) -> &'static str {
        if self.unavailable {
            "na"
        } else if self
            .thresholds
            .intersects(ThresholdMask::UPPER_CRITICAL | ThresholdMask::LOWER_CRITICAL)
        {
            "cr"
        } else if self
            .thresholds
            .intersects(ThresholdMask::UPPER_NON_CRITICAL | ThresholdMask::LOWER_NON_CRITICAL)
        {
            "nc"
        } else {
            "ok"
        }
    }
}

pub fn ipmi_sensor_get_reading(ctx: &mut ResponderContext, num: u8) -> IpmiResult<SensorReading> {
    let rsp = sendrecv(ctx, IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_READING, &[num])?;
    let rs = SensorReadingRs::from_le_bytes(&rsp)
        .map_err(|e| IpmiError::ResponseError(format!("bad Get Sensor Reading response: {}", e)))?;
    let operation = SensorOperation::from_bits_truncate(rs.operation);
    Ok(SensorReading {
        raw: rs.value,
        operation,
        thresholds: ThresholdMask::from_bits_truncate(rs.thresholds),
        unavailable: operation.contains(SensorOperation::READING_STATE_UNAVAILABLE),
    })
}

pub fn ipmi_sensor_get_thresholds(ctx: &mut ResponderContext, num: u8) -> IpmiResult<SensorThresholdsRs> {
    let rsp = sendrecv(ctx, IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_THRESHOLDS, &[num])?;
    SensorThresholdsRs::from_le_bytes(&rsp)
        .map_err(|e| IpmiError::ResponseError(format!("bad Get Sensor Thresholds response: {}", e)))
}

#[derive(Subcommand, Debug)]
pub enum SensorCommand {
    /// List all sensors and thresholds
    List,
    /// Read one sensor by number
    Reading {
        #[arg(value_parser = crate::helper::str2u8)]
        sensor_num: u8,
    },
    /// Show event enable and event status of one sensor
    Status {
        #[arg(value_parser = crate::helper::str2u8)]
        sensor_num: u8,
    },
    /// Set an individual threshold
    Thresh {
        #[arg(value_parser = crate::helper::str2u8)]
        sensor_num: u8,
        /// Threshold type
        #[arg(value_enum)]
        threshold: ThresholdType,
        /// Threshold value
        setting: f64,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ThresholdType {
    /// Upper Non-Recoverable
    Unr,
    /// Upper Critical
    Ucr,
    /// Upper Non-Critical
    Unc,
    /// Lower Non-Critical
    Lnc,
    /// Lower Critical
    Lcr,
    /// Lower Non-Recoverable
    Lnr,
}

impl ThresholdType {
    fn mask(self) -> ThresholdMask {
        match self {
            ThresholdType::Unr => ThresholdMask::UPPER_NON_RECOVERABLE,
            ThresholdType::Ucr => ThresholdMask::UPPER_CRITICAL,
            ThresholdType::Unc => ThresholdMask::UPPER_NON_CRITICAL,
            ThresholdType::Lnc => ThresholdMask::LOWER_NON_CRITICAL,
            ThresholdType::Lcr => ThresholdMask::LOWER_CRITICAL,
            ThresholdType::Lnr => ThresholdMask::LOWER_NON_RECOVERABLE,
        }
    }
}

pub fn ipmi_sensor_main(command: SensorCommand, ctx: &mut ResponderContext) -> Result<(), Box<dyn Error>> {
    match command {
        SensorCommand::List => ipmi_sensor_list(ctx),
        SensorCommand::Reading { sensor_num } => {
            let view = ipmi_sensor_get_view(ctx, sensor_num)?;
            let reading = ipmi_sensor_get_reading(ctx, sensor_num)?;
            if reading.unavailable {
                println!("{:<16} | no reading", view.name);
            } else {
                println!(
                    "{:<16} | {:.3} {}",
                    view.name,
                    view.params.decode(reading.raw),
                    view.unit_name()
                );
            }
            Ok(())
        }
        SensorCommand::Status { sensor_num } => ipmi_sensor_status(ctx, sensor_num),
        SensorCommand::Thresh {
            sensor_num,
            threshold,
            setting,
        } => ipmi_sensor_set_threshold(ctx, sensor_num, threshold, setting),
    }
}

/// Full sensor record behind a sensor number.
fn ipmi_sensor_get_view(ctx: &mut ResponderContext, num: u8) -> Result<FullSensorView, Box<dyn Error>> {
    // sensor records come first and their record id is the sensor number
    let (_, record) = ipmi_sdr_get_record(ctx, 0, num as u16)?;
    if record.get(3) != Some(&SDR_RECORD_TYPE_FULL_SENSOR) {
        return Err(Box::new(IpmiError::SensorNotFound(format!("sensor 0x{:02x}", num))));
    }
    Ok(FullSensorView::from_le_bytes(&record)?)
}

pub fn ipmi_sensor_list(ctx: &mut ResponderContext) -> Result<(), Box<dyn Error>> {
    let reservation = ipmi_sdr_get_reservation(ctx)?;
    debug2!("SDR reservation ID {:04x}", reservation);

    let mut record_id = 0u16;
    loop {
        let (next, record) = ipmi_sdr_get_record(ctx, reservation, record_id)?;
        if record.get(3) != Some(&SDR_RECORD_TYPE_FULL_SENSOR) {
            // sensor records are laid out first
            break;
        }
        let view = FullSensorView::from_le_bytes(&record)?;
        let (value, status) = match ipmi_sensor_get_reading(ctx, view.sensor_num) {
            Ok(r) if !r.unavailable => (format!("{:.3}", view.params.decode(r.raw)), r.status()),
            Ok(_) => ("na".to_string(), "na"),
            Err(e) => {
                debug2!("reading of {} failed: {}", view.name, e);
                ("na".to_string(), "na")
            }
        };
        let thresh = ipmi_sensor_get_thresholds(ctx, view.sensor_num).unwrap_or_default();
        let readable = ThresholdMask::from_bits_truncate(thresh.mask);
        let setting = |bit: ThresholdMask, raw: u8| {
            if readable.contains(bit) {
                format!("{:.3}", view.params.decode(raw))
            } else {
                "na".to_string()
            }
        };
        println!(
            "{:<16} | {:<10} | {:<10} | {:<6} | {:<9} | {:<9} | {:<9} | {:<9} | {:<9} | {:<9}",
            view.name,
            value,
            view.unit_name(),
            status,
            setting(ThresholdMask::LOWER_NON_RECOVERABLE, thresh.lower_non_recoverable),
            setting(ThresholdMask::LOWER_CRITICAL, thresh.lower_critical),
            setting(ThresholdMask::LOWER_NON_CRITICAL, thresh.lower_non_critical),
            setting(ThresholdMask::UPPER_NON_CRITICAL, thresh.upper_non_critical),
            setting(ThresholdMask::UPPER_CRITICAL, thresh.upper_critical),
            setting(ThresholdMask::UPPER_NON_RECOVERABLE, thresh.upper_non_recoverable),
        );
        if next == 0xffff {
            break;
        }
        record_id = next;
    }
    Ok(())
}

fn ipmi_sensor_status(ctx: &mut ResponderContext, num: u8) -> Result<(), Box<dyn Error>> {
    let rsp = sendrecv(ctx, IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_EVENT_ENABLE, &[num])?;
    let enable = SensorEventEnableRs::from_le_bytes(&rsp)?;
    let rsp = sendrecv(ctx, IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_EVENT_STATUS, &[num])?;
    let status = SensorEventStatusRs::from_le_bytes(&rsp)?;
    let flags = SensorOperation::from_bits_truncate(status.flags);

    println!(
        "Event Messages      : {}",
        if flags.contains(SensorOperation::EVENT_MESSAGES_ENABLE) { "enabled" } else { "disabled" }
    );
    println!(
        "Sensor Scanning     : {}",
        if flags.contains(SensorOperation::SENSOR_SCANNING_ENABLE) { "enabled" } else { "disabled" }
    );
    println!(
        "Assertion Enable    : {:02x}{:02x}",
        enable.assertion_msb, enable.assertion_lsb
    );
    println!(
        "Deassertion Enable  : {:02x}{:02x}",
        enable.deassertion_msb, enable.deassertion_lsb
    );
    println!("Assertions          : {:04x}", status.assertions);
    println!("Deassertions        : {:04x}", status.deassertions);
    Ok(())
}

fn ipmi_sensor_set_threshold(
    ctx: &mut ResponderContext,
    num: u8,
    threshold: ThresholdType,
    setting: f64,
) -> Result<(), Box<dyn Error>> {
    let view = ipmi_sensor_get_view(ctx, num)?;
    let raw = view.params.encode(setting);
    let mask = threshold.mask();
    let mut rq = SetSensorThresholdsRq {
        sensor_num: num,
        mask: mask.bits(),
        ..Default::default()
    };
    match threshold {
        ThresholdType::Unr => rq.upper_non_recoverable = raw,
        ThresholdType::Ucr => rq.upper_critical = raw,
        ThresholdType::Unc => rq.upper_non_critical = raw,
        ThresholdType::Lnc => rq.lower_non_critical = raw,
        ThresholdType::Lcr => rq.lower_critical = raw,
        ThresholdType::Lnr => rq.lower_non_recoverable = raw,
    }
    println!(
        "Locating sensor record '{}'...\nSetting sensor \"{}\" {:?} threshold to {:.3}",
        view.name,
        view.name,
        threshold,
        view.params.decode(raw)
    );
    sendrecv(ctx, IPMI_NETFN_SE, IPMI_CMD_SET_SENSOR_THRESHOLDS, &rq.to_le_bytes())?;
    Ok(())
}
