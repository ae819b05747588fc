/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
//! Byte-exact SDR record builders.
//!
//! Records are written field by field at fixed offsets; host struct
//! layout is never relied on.

use crate::commands::sdr::types::*;
use crate::commands::sensor::cache::LiveSensorRecord;
use crate::commands::sensor::events::{ThresholdEventLsb, ThresholdEventMsb, ThresholdMask};
use crate::commands::sensor::linear::LinearizationParams;
use crate::error::IpmiResult;
use crate::ipmi::bus::FruDescriptor;
use crate::ipmi::ipmi::{IPMI_BMC_SLAVE_ADDR, IPMI_ME_SLAVE_ADDR};

pub const SDR_ID_STRING_MAX: usize = 16;

pub const FULL_SENSOR_RECORD_SIZE: usize = 64;
pub const FRU_LOCATOR_RECORD_SIZE: usize = 32;
pub const MC_LOCATOR_RECORD_SIZE: usize = 32;
pub const NM_DISCOVERY_RECORD_SIZE: usize = 16;

/// Device records following the FRU locators, then one discovery record.
pub const TYPE12_RECORD_COUNT: usize = 2;
pub const NM_DISCOVERY_RECORD_COUNT: usize = 1;
pub const FIXED_RECORD_COUNT: usize = TYPE12_RECORD_COUNT + NM_DISCOVERY_RECORD_COUNT;

const ENTITY_ID_MGMT_CONTROLLER: u8 = 0x2e;
const ID_TYPE_ASCII_8BIT: u8 = 0xc0;

// Full sensor record offsets
const FULL_OWNER_ID: usize = 5;
const FULL_SENSOR_NUM: usize = 7;
const FULL_ENTITY_ID: usize = 8;
const FULL_CAPABILITIES: usize = 11;
const FULL_SENSOR_TYPE: usize = 12;
const FULL_EVENT_TYPE: usize = 13;
const FULL_ASSERT_MASK: usize = 14;
const FULL_DEASSERT_MASK: usize = 16;
const FULL_READING_MASK: usize = 18;
const FULL_UNITS_1: usize = 20;
const FULL_UNITS_2: usize = 21;
const FULL_M_LSB: usize = 24;
const FULL_UPPER_CRITICAL: usize = 37;
const FULL_UPPER_NON_CRITICAL: usize = 38;
const FULL_LOWER_CRITICAL: usize = 40;
const FULL_LOWER_NON_CRITICAL: usize = 41;
const FULL_ID_CODE: usize = 47;
const FULL_ID_STRING: usize = 48;

/// auto re-arm, threshold access and event generation per threshold
const SENSOR_CAPABILITIES: u8 = 0x68;

fn write_header(buf: &mut [u8], record_id: u16, record_type: u8, length: u8) {
    buf[0] = (record_id & 0xff) as u8;
    buf[1] = (record_id >> 8) as u8;
    buf[2] = IPMI_SDR_VERSION;
    buf[3] = record_type;
    buf[4] = length;
}

fn copy_name(buf: &mut [u8], name: &[u8]) {
    let len = name.len().min(SDR_ID_STRING_MAX).min(buf.len());
    buf[..len].copy_from_slice(&name[..len]);
}

/// Display name of a sensor: last path segment with underscores as
/// spaces, abbreviated and cut to 16 bytes when too long.
pub fn sensor_display_name(path: &str) -> String {
    let label = path.rsplit('/').next().unwrap_or("");
    let mut name = label.replace('_', " ");
    if name.len() > SDR_ID_STRING_MAX {
        for (find, replace) in [("Output", "Out"), ("Input", "In")] {
            name = name.replace(find, replace);
        }
        let mut end = SDR_ID_STRING_MAX.min(name.len());
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}

/// Full Sensor Record (type 01h) for the sensor at `path`.
pub fn build_full_sensor_record(
    record_id: u16,
    path: &str,
    record: &LiveSensorRecord,
    entity: (u8, u8),
) -> IpmiResult<Vec<u8>> {
    let params = record.params()?;
    let mut buf = vec![0u8; FULL_SENSOR_RECORD_SIZE];
    write_header(
        &mut buf,
        record_id,
        SDR_RECORD_TYPE_FULL_SENSOR,
        (FULL_SENSOR_RECORD_SIZE - SDR_HEADER_SIZE) as u8,
    );

    // key: owner id, owner lun, number
    buf[FULL_OWNER_ID] = IPMI_BMC_SLAVE_ADDR;
    buf[FULL_SENSOR_NUM] = (record_id & 0xff) as u8;

    buf[FULL_ENTITY_ID] = entity.0;
    buf[FULL_ENTITY_ID + 1] = entity.1;
    buf[FULL_CAPABILITIES] = SENSOR_CAPABILITIES;
    buf[FULL_SENSOR_TYPE] = sensor_type_from_path(path);
    buf[FULL_EVENT_TYPE] = event_type_from_path(path);
    buf[FULL_UNITS_1] = (params.signed as u8) << 7;
    buf[FULL_UNITS_2] = sensor_units_from_path(path);
    buf[FULL_M_LSB..FULL_M_LSB + 6].copy_from_slice(&params.sdr_bytes());

    let mut assert = [0u8; 2];
    let mut deassert = [0u8; 2];
    let mut readable = ThresholdMask::empty();

    let critical = record.critical.unwrap_or_default();
    let warning = record.warning.unwrap_or_default();
    if let Some(value) = critical.high {
        buf[FULL_UPPER_CRITICAL] = params.encode(value);
        deassert[1] |= (ThresholdEventMsb::CRITICAL_THRESHOLD
            | ThresholdEventMsb::UPPER_CRITICAL_GOING_HIGH)
            .bits();
        assert[1] |= ThresholdEventMsb::UPPER_CRITICAL_GOING_HIGH.bits();
        readable |= ThresholdMask::UPPER_CRITICAL;
    }
    if let Some(value) = warning.high {
        buf[FULL_UPPER_NON_CRITICAL] = params.encode(value);
        deassert[1] |= ThresholdEventMsb::NON_CRITICAL_THRESHOLD.bits();
        deassert[0] |= ThresholdEventLsb::UPPER_NON_CRITICAL_GOING_HIGH.bits();
        assert[0] |= ThresholdEventLsb::UPPER_NON_CRITICAL_GOING_HIGH.bits();
        readable |= ThresholdMask::UPPER_NON_CRITICAL;
    }
    if let Some(value) = critical.low {
        buf[FULL_LOWER_CRITICAL] = params.encode(value);
        assert[1] |= ThresholdEventMsb::CRITICAL_THRESHOLD.bits();
        deassert[0] |= ThresholdEventLsb::LOWER_CRITICAL_GOING_LOW.bits();
        assert[0] |= ThresholdEventLsb::LOWER_CRITICAL_GOING_LOW.bits();
        readable |= ThresholdMask::LOWER_CRITICAL;
    }
    if let Some(value) = warning.low {
        buf[FULL_LOWER_NON_CRITICAL] = params.encode(value);
        assert[1] |= ThresholdEventMsb::NON_CRITICAL_THRESHOLD.bits();
        deassert[0] |= ThresholdEventLsb::LOWER_NON_CRITICAL_GOING_LOW.bits();
        assert[0] |= ThresholdEventLsb::LOWER_NON_CRITICAL_GOING_LOW.bits();
        readable |= ThresholdMask::LOWER_NON_CRITICAL;
    }
    buf[FULL_ASSERT_MASK..FULL_ASSERT_MASK + 2].copy_from_slice(&assert);
    buf[FULL_DEASSERT_MASK..FULL_DEASSERT_MASK + 2].copy_from_slice(&deassert);
    // everything readable is settable
    buf[FULL_READING_MASK] = readable.bits();
    buf[FULL_READING_MASK + 1] = readable.bits();

    let name = sensor_display_name(path);
    buf[FULL_ID_CODE] = name.len() as u8;
    copy_name(&mut buf[FULL_ID_STRING..], name.as_bytes());
    Ok(buf)
}

/// FRU Device Locator (type 11h).
pub fn build_fru_locator_record(record_id: u16, fru: &FruDescriptor) -> Vec<u8> {
    let name = &fru.name.as_bytes()[..fru.name.len().min(SDR_ID_STRING_MAX)];
    let mut buf = vec![0u8; FRU_LOCATOR_RECORD_SIZE];
    let full_length = FRU_LOCATOR_RECORD_SIZE - SDR_HEADER_SIZE;
    write_header(
        &mut buf,
        record_id,
        SDR_RECORD_TYPE_FRU_DEVICE_LOCATOR,
        (full_length - (SDR_ID_STRING_MAX - name.len())) as u8,
    );
    // key: access address, FRU id, logical device, channel
    buf[5] = IPMI_BMC_SLAVE_ADDR;
    buf[6] = fru.fru_id;
    buf[7] = 0x80;
    buf[8] = 0x00;
    // body: reserved, device type, modifier, entity, instance, oem, id code
    buf[9] = 0x00;
    buf[10] = 0x10;
    buf[11] = 0x00;
    buf[12] = fru.entity_id;
    buf[13] = fru.entity_instance;
    buf[14] = 0x00;
    buf[15] = name.len() as u8;
    copy_name(&mut buf[16..], name);
    buf
}

fn build_mc_locator_record(
    record_id: u16,
    length: u8,
    device: [u8; 4],
    instance: u8,
    name: &str,
) -> Vec<u8> {
    let mut buf = vec![0u8; MC_LOCATOR_RECORD_SIZE];
    write_header(&mut buf, record_id, SDR_RECORD_TYPE_MC_DEVICE_LOCATOR, length);
    // slave address, channel, power state notification, capabilities
    buf[5..9].copy_from_slice(&device);
    // 9..12 reserved
    buf[12] = ENTITY_ID_MGMT_CONTROLLER;
    buf[13] = instance;
    buf[14] = 0x00;
    buf[15] = ID_TYPE_ASCII_8BIT | name.len() as u8;
    copy_name(&mut buf[16..], name.as_bytes());
    buf
}

/// Management Controller Device Locator (type 12h) for the BMC itself
/// (`index` 0) or the management engine (`index` 1).
pub fn build_type12_record(index: usize, record_id: u16) -> Option<Vec<u8>> {
    match index {
        0 => Some(build_mc_locator_record(
            record_id,
            0x1b,
            [IPMI_BMC_SLAVE_ADDR, 0x00, 0x00, 0xbf],
            1,
            "Basbrd Mgmt Ctlr",
        )),
        1 => Some(build_mc_locator_record(
            record_id,
            0x16,
            [IPMI_ME_SLAVE_ADDR, 0x06, 0x24, 0x21],
            2,
            "Mgmt Engine",
        )),
        _ => None,
    }
}

/// Node manager discovery OEM record (type C0h).
pub fn build_nm_discovery_record(index: usize, record_id: u16) -> Option<Vec<u8>> {
    if index >= NM_DISCOVERY_RECORD_COUNT {
        return None;
    }
    let mut buf = vec![0u8; NM_DISCOVERY_RECORD_SIZE];
    write_header(&mut buf, record_id, SDR_RECORD_TYPE_OEM, 0x0b);
    buf[5..].copy_from_slice(&[
        0x57, 0x01, 0x00, // Intel manufacturer id
        0x0d, // NM discovery subtype
        0x01, // version
        IPMI_ME_SLAVE_ADDR,
        0x60, // channel
        0x19, // health event sensor
        0x18, // exception event sensor
        0x1a, // operational capabilities sensor
        0x1b, // threshold exceeded sensor
    ]);
    Some(buf)
}

fn tos32(val: i32, bits: i32) -> i32 {
    if val & (1 << (bits - 1)) != 0 {
        -(val & (1 << (bits - 1))) | val
    } else {
        val
    }
}

/// Fields of a full sensor record needed to show its readings.
#[derive(Debug, Clone, PartialEq)]
pub struct FullSensorView {
    pub record_id: u16,
    pub sensor_num: u8,
    pub entity_id: u8,
    pub entity_instance: u8,
    pub sensor_type: u8,
    pub units: u8,
    pub params: LinearizationParams,
    pub readable: ThresholdMask,
    pub upper_critical: u8,
    pub upper_non_critical: u8,
    pub lower_critical: u8,
    pub lower_non_critical: u8,
    pub name: String,
}

impl FullSensorView {
    pub fn from_le_bytes(data: &[u8]) -> Result<Self, &'static str> {
        if data.len() < FULL_ID_STRING {
            return Err("Input data too short for full sensor record");
        }
        if data[3] != SDR_RECORD_TYPE_FULL_SENSOR {
            return Err("not a full sensor record");
        }
        let m_raw = data[FULL_M_LSB] as i32 | ((data[FULL_M_LSB + 1] as i32 & 0xc0) << 2);
        let b_raw = data[FULL_M_LSB + 2] as i32 | ((data[FULL_M_LSB + 3] as i32 & 0xc0) << 2);
        let exps = data[FULL_M_LSB + 5] as i32;

        let id_len = (data[FULL_ID_CODE] & 0x1f) as usize;
        let name_end = (FULL_ID_STRING + id_len.min(SDR_ID_STRING_MAX)).min(data.len());
        let name = String::from_utf8_lossy(&data[FULL_ID_STRING..name_end])
            .trim_end_matches('\0')
            .to_string();

        Ok(Self {
            record_id: u16::from_le_bytes([data[0], data[1]]),
            sensor_num: data[FULL_SENSOR_NUM],
            entity_id: data[FULL_ENTITY_ID],
            entity_instance: data[FULL_ENTITY_ID + 1],
            sensor_type: data[FULL_SENSOR_TYPE],
            units: data[FULL_UNITS_2],
            params: LinearizationParams {
                m: tos32(m_raw, 10) as i16,
                b: tos32(b_raw, 10) as i16,
                r_exp: tos32((exps & 0xf0) >> 4, 4) as i8,
                b_exp: tos32(exps & 0x0f, 4) as i8,
                signed: data[FULL_UNITS_1] & 0x80 != 0,
            },
            readable: ThresholdMask::from_bits_truncate(data[FULL_READING_MASK]),
            upper_critical: data[FULL_UPPER_CRITICAL],
            upper_non_critical: data[FULL_UPPER_NON_CRITICAL],
            lower_critical: data[FULL_LOWER_CRITICAL],
            lower_non_critical: data[FULL_LOWER_NON_CRITICAL],
            name,
        })
    }

    pub fn unit_name(&self) -> &'static str {
        match self.units {
            SENSOR_UNIT_DEGREES_C => "degrees C",
            SENSOR_UNIT_VOLTS => "Volts",
            SENSOR_UNIT_AMPS => "Amps",
            SENSOR_UNIT_WATTS => "Watts",
            SENSOR_UNIT_RPM => "RPM",
            _ => "unspecified",
        }
    }

    /// Format one threshold field.
    pub fn print_thresh_setting(&self, avail: ThresholdMask, setting: u8) -> String {
        if !self.readable.contains(avail) {
            return "na".to_string();
        }
        format!("{:.3}", self.params.decode(setting))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sensor::cache::ThresholdPair;

    fn ambient() -> LiveSensorRecord {
        LiveSensorRecord {
            value: Some(25.0),
            min: Some(-40.0),
            max: Some(125.0),
            ..Default::default()
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            sensor_display_name("/xyz/openbmc_project/sensors/temperature/ambient"),
            "ambient"
        );
        assert_eq!(
            sensor_display_name("/xyz/openbmc_project/sensors/voltage/P3V3_Aux"),
            "P3V3 Aux"
        );
        assert_eq!(
            sensor_display_name("/xyz/openbmc_project/sensors/power/PSU1_Input_Power"),
            "PSU1 Input Power"
        );
        assert_eq!(
            sensor_display_name("/xyz/openbmc_project/sensors/power/Total_Input_Power"),
            "Total In Power"
        );
        assert_eq!(
            sensor_display_name("/xyz/openbmc_project/sensors/current/PSU2_Output_Current_Limit"),
            "PSU2 Out Current"
        );
    }

    #[test]
    fn test_ambient_full_record() {
        let path = "/xyz/openbmc_project/sensors/temperature/ambient";
        let rec = build_full_sensor_record(2, path, &ambient(), (0, 1)).unwrap();
        assert_eq!(rec.len(), FULL_SENSOR_RECORD_SIZE);
        assert_eq!(&rec[..5], &[0x02, 0x00, 0x51, 0x01, 59]);
        assert_eq!(rec[FULL_OWNER_ID], 0x20);
        assert_eq!(rec[FULL_SENSOR_NUM], 2);
        assert_eq!(rec[FULL_ENTITY_ID], 0);
        assert_eq!(rec[FULL_ENTITY_ID + 1], 1);
        assert_eq!(rec[FULL_CAPABILITIES], 0x68);
        assert_eq!(rec[FULL_SENSOR_TYPE], SENSOR_TYPE_TEMPERATURE);
        assert_eq!(rec[FULL_EVENT_TYPE], 0x01);
        assert_eq!(rec[FULL_UNITS_1], 0x80);
        assert_eq!(rec[FULL_UNITS_2], SENSOR_UNIT_DEGREES_C);
        assert_eq!(&rec[24..30], &[65, 0x00, 0xac, 0x40, 0x00, 0xe1]);
        // no thresholds configured
        assert_eq!(&rec[14..20], &[0; 6]);
        assert_eq!(rec[FULL_ID_CODE], 7);
        assert_eq!(&rec[48..55], b"ambient");
        assert!(rec[55..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_threshold_masks() {
        let mut record = ambient();
        record.critical = Some(ThresholdPair {
            high: Some(100.0),
            low: Some(-20.0),
            ..Default::default()
        });
        record.warning = Some(ThresholdPair {
            high: Some(80.0),
            low: None,
            ..Default::default()
        });
        let path = "/xyz/openbmc_project/sensors/temperature/cpu0";
        let rec = build_full_sensor_record(0x0105, path, &record, (7, 3)).unwrap();
        assert_eq!(&rec[..2], &[0x05, 0x01]);
        assert_eq!(rec[FULL_SENSOR_NUM], 0x05);
        // assert lsb: UNC high | LC low; msb: UC high | critical
        assert_eq!(rec[FULL_ASSERT_MASK], 0x80 | 0x04);
        assert_eq!(rec[FULL_ASSERT_MASK + 1], 0x02 | 0x20);
        assert_eq!(rec[FULL_DEASSERT_MASK], 0x80 | 0x04);
        assert_eq!(rec[FULL_DEASSERT_MASK + 1], 0x20 | 0x02 | 0x10);
        assert_eq!(rec[FULL_READING_MASK], 0x10 | 0x08 | 0x02);
        assert_eq!(rec[FULL_READING_MASK + 1], rec[FULL_READING_MASK]);
        assert_eq!(rec[FULL_LOWER_NON_CRITICAL], 0);

        let view = FullSensorView::from_le_bytes(&rec).unwrap();
        let params = record.params().unwrap();
        assert_eq!(view.params, params);
        assert_eq!(view.entity_id, 7);
        assert_eq!(view.name, "cpu0");
        assert_eq!(view.upper_critical, params.encode(100.0));
        assert_eq!(view.print_thresh_setting(ThresholdMask::LOWER_NON_CRITICAL, 0), "na");
    }

    #[test]
    fn test_fru_locator_record() {
        let fru = FruDescriptor {
            fru_id: 3,
            name: "Baseboard".to_string(),
            entity_id: 7,
            entity_instance: 1,
        };
        let rec = build_fru_locator_record(9, &fru);
        assert_eq!(rec.len(), FRU_LOCATOR_RECORD_SIZE);
        assert_eq!(&rec[..5], &[9, 0, 0x51, 0x11, 27 - (16 - 9)]);
        assert_eq!(&rec[5..16], &[0x20, 3, 0x80, 0, 0, 0x10, 0, 7, 1, 0, 9]);
        assert_eq!(&rec[16..25], b"Baseboard");

        let long = FruDescriptor {
            name: "A Very Long FRU Device Name".to_string(),
            ..fru
        };
        let rec = build_fru_locator_record(9, &long);
        assert_eq!(rec[4], 27);
        assert_eq!(rec[15], 16);
        assert_eq!(&rec[16..32], b"A Very Long FRU ");
    }

    #[test]
    fn test_fixed_records() {
        let bmc = build_type12_record(0, 5).unwrap();
        assert_eq!(&bmc[..9], &[5, 0, 0x51, 0x12, 0x1b, 0x20, 0, 0, 0xbf]);
        assert_eq!(&bmc[12..16], &[0x2e, 1, 0, 0xd0]);
        assert_eq!(&bmc[16..], b"Basbrd Mgmt Ctlr");

        let me = build_type12_record(1, 6).unwrap();
        assert_eq!(&me[..9], &[6, 0, 0x51, 0x12, 0x16, 0x2c, 6, 0x24, 0x21]);
        assert_eq!(&me[12..16], &[0x2e, 2, 0, 0xcb]);
        assert_eq!(&me[16..27], b"Mgmt Engine");
        assert!(build_type12_record(2, 7).is_none());

        let nm = build_nm_discovery_record(0, 7).unwrap();
        assert_eq!(
            nm,
            vec![7, 0, 0x51, 0xc0, 0x0b, 0x57, 0x01, 0x00, 0x0d, 0x01, 0x2c, 0x60, 0x19, 0x18, 0x1a, 0x1b]
        );
        assert!(build_nm_discovery_record(1, 8).is_none());
    }
}
