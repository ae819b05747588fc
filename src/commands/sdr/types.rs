/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::commands::sensor::cache::sensor_type_string;
use crate::ipmi::time::{ipmi_timestamp_numeric, IPMI_TIME_UNSPECIFIED};
use ipmi_macros::AsBytes;

pub const IPMI_SDR_VERSION: u8 = 0x51;

/// SDR record types
pub const SDR_RECORD_TYPE_FULL_SENSOR: u8 = 0x01;
pub const SDR_RECORD_TYPE_FRU_DEVICE_LOCATOR: u8 = 0x11;
pub const SDR_RECORD_TYPE_MC_DEVICE_LOCATOR: u8 = 0x12;
pub const SDR_RECORD_TYPE_OEM: u8 = 0xc0;

pub fn get_sdr_record_type_name(record_type: u8) -> &'static str {
    match record_type {
        SDR_RECORD_TYPE_FULL_SENSOR => "Full Sensor",
        SDR_RECORD_TYPE_FRU_DEVICE_LOCATOR => "FRU Device Locator",
        SDR_RECORD_TYPE_MC_DEVICE_LOCATOR => "MC Device Locator",
        SDR_RECORD_TYPE_OEM => "OEM",
        _ => "Unknown",
    }
}

// Operation support bits of Get SDR Repository Info
pub const SDR_OP_OVERFLOW: u8 = 0x80;
pub const SDR_OP_RESERVE: u8 = 0x02;
pub const SDR_OP_ALLOC_INFO: u8 = 0x01;

/// Get SDR Repository Info response
#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SdrRepositoryInfo {
    pub sdr_version: u8,
    pub record_count: u16,
    pub free_space: u16,
    pub recent_addition: u32,
    pub recent_erase: u32,
    pub operations: u8,
}

impl SdrRepositoryInfo {
    pub fn format_standard(&self) -> String {
        let yes_no = |flag: bool| if flag { "yes" } else { "no" };
        let stamp = |ts: u32| {
            if ts == 0 || ts == IPMI_TIME_UNSPECIFIED {
                "NA".to_string()
            } else {
                ipmi_timestamp_numeric(ts)
            }
        };

        let mut output = String::new();
        output.push_str(&format!(
            "SDR Version                         : 0x{:x}\n",
            self.sdr_version
        ));
        output.push_str(&format!(
            "Record Count                        : {}\n",
            self.record_count
        ));
        output.push_str("Free Space                          : ");
        match self.free_space {
            0x0000 => output.push_str("none (full)\n"),
            0xFFFF => output.push_str("unspecified\n"),
            0xFFFE => output.push_str("> 64Kb - 2 bytes\n"),
            _ => output.push_str(&format!("{} bytes\n", self.free_space)),
        }
        output.push_str(&format!(
            "Most recent Addition                : {}\n",
            stamp(self.recent_addition)
        ));
        output.push_str(&format!(
            "Most recent Erase                   : {}\n",
            stamp(self.recent_erase)
        ));
        output.push_str(&format!(
            "SDR overflow                        : {}\n",
            yes_no(self.operations & SDR_OP_OVERFLOW != 0)
        ));
        output.push_str(&format!(
            "Reserve SDR repository supported    : {}\n",
            yes_no(self.operations & SDR_OP_RESERVE != 0)
        ));
        output.push_str(&format!(
            "SDR Repository Alloc info supported : {}",
            yes_no(self.operations & SDR_OP_ALLOC_INFO != 0)
        ));
        output
    }
}

/// Get SDR Repository Allocation Info response
#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SdrAllocInfo {
    pub alloc_units: u16,
    pub alloc_unit_size: u16,
    pub free_units: u16,
    pub largest_free_blk: u16,
    pub max_record_size: u8,
}

impl SdrAllocInfo {
    pub fn format(&self) -> String {
        format!(
            "# of Alloc Units : {}\nAlloc Unit Size  : {}\n# Free Units     : {}\nLargest Free Blk : {}\nMax Record Size  : {}",
            self.alloc_units,
            self.alloc_unit_size,
            self.free_units,
            self.largest_free_blk,
            self.max_record_size
        )
    }
}

/// Common 5-byte record header
#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SdrRecordHeader {
    pub record_id: u16,
    pub sdr_version: u8,
    pub record_type: u8,
    pub record_length: u8,
}

pub const SDR_HEADER_SIZE: usize = 5;

// Sensor types (IPMI table 42-3)
pub const SENSOR_TYPE_RESERVED: u8 = 0x00;
pub const SENSOR_TYPE_TEMPERATURE: u8 = 0x01;
pub const SENSOR_TYPE_VOLTAGE: u8 = 0x02;
pub const SENSOR_TYPE_CURRENT: u8 = 0x03;
pub const SENSOR_TYPE_FAN: u8 = 0x04;
pub const SENSOR_TYPE_OTHER: u8 = 0x0b;

// Base units (IPMI table 43-15)
pub const SENSOR_UNIT_UNSPECIFIED: u8 = 0;
pub const SENSOR_UNIT_DEGREES_C: u8 = 1;
pub const SENSOR_UNIT_VOLTS: u8 = 4;
pub const SENSOR_UNIT_AMPS: u8 = 5;
pub const SENSOR_UNIT_WATTS: u8 = 6;
pub const SENSOR_UNIT_RPM: u8 = 18;

pub const EVENT_READING_TYPE_THRESHOLD: u8 = 0x01;

pub fn sensor_type_from_path(path: &str) -> u8 {
    match sensor_type_string(path) {
        "temperature" => SENSOR_TYPE_TEMPERATURE,
        "voltage" => SENSOR_TYPE_VOLTAGE,
        "current" => SENSOR_TYPE_CURRENT,
        "fan_tach" | "fan_pwm" => SENSOR_TYPE_FAN,
        "power" => SENSOR_TYPE_OTHER,
        _ => SENSOR_TYPE_RESERVED,
    }
}

pub fn sensor_units_from_path(path: &str) -> u8 {
    match sensor_type_string(path) {
        "temperature" => SENSOR_UNIT_DEGREES_C,
        "voltage" => SENSOR_UNIT_VOLTS,
        "current" => SENSOR_UNIT_AMPS,
        "fan_tach" => SENSOR_UNIT_RPM,
        "power" => SENSOR_UNIT_WATTS,
        _ => SENSOR_UNIT_UNSPECIFIED,
    }
}

/// Every sensor on the bus is a threshold sensor.
pub fn event_type_from_path(_path: &str) -> u8 {
    EVENT_READING_TYPE_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_info_wire_layout() {
        let info = SdrRepositoryInfo {
            sdr_version: IPMI_SDR_VERSION,
            record_count: 8,
            free_space: 0xffff,
            recent_addition: IPMI_TIME_UNSPECIFIED,
            recent_erase: 0x01020304,
            operations: SDR_OP_OVERFLOW | SDR_OP_RESERVE | SDR_OP_ALLOC_INFO,
        };
        let bytes = info.to_le_bytes();
        assert_eq!(
            bytes,
            vec![0x51, 8, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 4, 3, 2, 1, 0x83]
        );
        assert_eq!(SdrRepositoryInfo::from_le_bytes(&bytes), Ok(info));
        let text = info.format_standard();
        assert!(text.contains("Record Count                        : 8"));
        assert!(text.contains("Most recent Addition                : NA"));
        assert!(text.contains("SDR overflow                        : yes"));
    }

    #[test]
    fn test_path_tables() {
        let path = "/xyz/openbmc_project/sensors/fan_tach/Fan_1";
        assert_eq!(sensor_type_from_path(path), SENSOR_TYPE_FAN);
        assert_eq!(sensor_units_from_path(path), SENSOR_UNIT_RPM);
        assert_eq!(
            sensor_units_from_path("/xyz/openbmc_project/sensors/fan_pwm/Pwm_1"),
            SENSOR_UNIT_UNSPECIFIED
        );
        assert_eq!(
            sensor_type_from_path("/xyz/openbmc_project/sensors/power/PSU1_Input"),
            SENSOR_TYPE_OTHER
        );
        assert_eq!(sensor_type_from_path("/xyz/openbmc_project/sensors/humidity/x"), 0);
    }

    #[test]
    fn test_header_parse() {
        let header = SdrRecordHeader::from_le_bytes(&[0x07, 0x00, 0x51, 0x12, 0x1b]).unwrap();
        assert_eq!(header.record_id, 7);
        assert_eq!(get_sdr_record_type_name(header.record_type), "MC Device Locator");
        assert!(SdrRecordHeader::from_le_bytes(&[0x07]).is_err());
    }
}
