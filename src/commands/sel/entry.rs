/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::commands::sdr::types::{event_type_from_path, sensor_type_from_path};
use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::time::{ipmi_timestamp_numeric, parse_log_timestamp, IPMI_TIME_UNSPECIFIED};
use ipmi_macros::AsBytes;
use log::warn;

pub const SEL_RECORD_TYPE_SYSTEM_EVENT: u8 = 0x02;
pub const SEL_OEM_TS_FIRST: u8 = 0xc0;
pub const SEL_OEM_TS_LAST: u8 = 0xdf;
pub const SEL_OEM_NOTS_FIRST: u8 = 0xe0;

pub const SEL_SYSTEM_EVENT_DATA_LEN: usize = 3;
pub const SEL_OEM_TS_DATA_LEN: usize = 9;
pub const SEL_OEM_NOTS_DATA_LEN: usize = 13;

/// Event message revision stamped on system events read back from the log.
pub const SEL_EVM_REV: u8 = 0x04;
const EVENT_DIR_DEASSERT: u8 = 0x80;

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct StandardSpecSelRec {
    pub timestamp: u32,
    pub gen_id: u16,
    pub evm_rev: u8,
    pub sensor_type: u8,
    pub sensor_num: u8,
    /// 7 bits event type, bit 7 event direction
    pub event_flag: u8,
    pub event_data: [u8; SEL_SYSTEM_EVENT_DATA_LEN],
}

impl StandardSpecSelRec {
    pub fn event_type(&self) -> u8 {
        self.event_flag & 0x7f
    }

    /// true for a deassertion
    pub fn event_dir(&self) -> bool {
        self.event_flag & EVENT_DIR_DEASSERT != 0
    }
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct OemTsSpecSelRec {
    pub timestamp: u32,
    pub oem_defined: [u8; SEL_OEM_TS_DATA_LEN],
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct OemNotsSpecSelRec {
    pub oem_defined: [u8; SEL_OEM_NOTS_DATA_LEN],
}

/// Record body by record-type range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelType {
    Standard(StandardSpecSelRec),
    OemTimestamped(OemTsSpecSelRec),
    OemNonTimestamped(OemNotsSpecSelRec),
}

/// One 16-byte SEL record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelEventRecord {
    pub record_id: u16,
    pub record_type: u8,
    pub sel_type: SelType,
}

pub const SEL_RECORD_SIZE: usize = 16;

impl SelEventRecord {
    pub fn to_le_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(SEL_RECORD_SIZE);
        out.extend_from_slice(&self.record_id.to_le_bytes());
        out.push(self.record_type);
        match &self.sel_type {
            SelType::Standard(rec) => out.extend(rec.to_le_bytes()),
            SelType::OemTimestamped(rec) => out.extend(rec.to_le_bytes()),
            SelType::OemNonTimestamped(rec) => out.extend(rec.to_le_bytes()),
        }
        out
    }

    pub fn from_le_bytes(data: &[u8]) -> Result<Self, &'static str> {
        if data.len() != SEL_RECORD_SIZE {
            return Err("SEL record must be 16 bytes");
        }
        let record_id = u16::from_le_bytes([data[0], data[1]]);
        let record_type = data[2];
        let body = &data[3..];
        let sel_type = match record_type {
            SEL_OEM_TS_FIRST..=SEL_OEM_TS_LAST => {
                SelType::OemTimestamped(OemTsSpecSelRec::from_le_bytes(body)?)
            }
            SEL_OEM_NOTS_FIRST..=0xff => {
                SelType::OemNonTimestamped(OemNotsSpecSelRec::from_le_bytes(body)?)
            }
            _ => SelType::Standard(StandardSpecSelRec::from_le_bytes(body)?),
        };
        Ok(Self {
            record_id,
            record_type,
            sel_type,
        })
    }

    pub fn timestamp(&self) -> Option<u32> {
        match &self.sel_type {
            SelType::Standard(rec) => Some(rec.timestamp),
            SelType::OemTimestamped(rec) => Some(rec.timestamp),
            SelType::OemNonTimestamped(_) => None,
        }
    }

    /// One `ipmitool sel list` style line.
    pub fn format_list(&self) -> String {
        let stamp = match self.timestamp() {
            Some(IPMI_TIME_UNSPECIFIED) | None => "Unspecified".to_string(),
            Some(ts) if ts < 0x20000000 => format!("Pre-Init {:010}", ts),
            Some(ts) => ipmi_timestamp_numeric(ts),
        };
        match &self.sel_type {
            SelType::Standard(rec) => format!(
                "{:>4x} | {} | Sensor type 0x{:02x} #0x{:02x} | event type 0x{:02x} | data {} | {}",
                self.record_id,
                stamp,
                rec.sensor_type,
                rec.sensor_num,
                rec.event_type(),
                hex::encode_upper(rec.event_data),
                if rec.event_dir() { "Deasserted" } else { "Asserted" }
            ),
            SelType::OemTimestamped(rec) => format!(
                "{:>4x} | {} | OEM record {:02x} | {}",
                self.record_id,
                stamp,
                self.record_type,
                hex::encode_upper(rec.oem_defined)
            ),
            SelType::OemNonTimestamped(rec) => format!(
                "{:>4x} | OEM record {:02x} | {}",
                self.record_id,
                self.record_type,
                hex::encode_upper(rec.oem_defined)
            ),
        }
    }
}

/// Fields of one log line:
/// `<timestamp> <id>,<type>,<hex data>[,<generator>,<sensor path>,<asserted>]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SelLogEntry {
    pub timestamp: String,
    pub record_id: u16,
    pub record_type: u8,
    pub event_data: Vec<u8>,
    pub generator_id: Option<String>,
    pub sensor_path: Option<String>,
    pub direction: Option<String>,
}

/// Hex pairs; a trailing odd digit is read as its own byte.
fn decode_event_data(text: &str) -> IpmiResult<Vec<u8>> {
    if !text.is_ascii() {
        return Err(IpmiError::Unspecified(format!("bad SEL event data {}", text)));
    }
    let split = text.len() - text.len() % 2;
    let (pairs, tail) = text.split_at(split);
    let mut data = hex::decode(pairs)
        .map_err(|e| IpmiError::Unspecified(format!("bad SEL event data {}: {}", text, e)))?;
    if !tail.is_empty() {
        let last = u8::from_str_radix(tail, 16)
            .map_err(|e| IpmiError::Unspecified(format!("bad SEL event data {}: {}", text, e)))?;
        data.push(last);
    }
    Ok(data)
}

impl SelLogEntry {
    pub fn parse(line: &str) -> IpmiResult<Self> {
        let bad = |what: &str| IpmiError::Unspecified(format!("{} in SEL line '{}'", what, line));
        let (timestamp, rest) = line.split_once(' ').ok_or_else(|| bad("no timestamp"))?;
        // empty fields collapse, as the logger may pad them
        let fields: Vec<&str> = rest
            .trim_start_matches(' ')
            .split(',')
            .filter(|field| !field.is_empty())
            .collect();
        if fields.len() < 3 {
            return Err(bad("too few fields"));
        }
        let record_id = fields[0].trim().parse::<u16>().map_err(|_| bad("bad record id"))?;
        let record_type =
            u8::from_str_radix(fields[1].trim(), 16).map_err(|_| bad("bad record type"))?;
        let event_data = decode_event_data(fields[2].trim())?;
        let extra = |i: usize| (fields.len() >= 6).then(|| fields[i].trim().to_string());

        Ok(Self {
            timestamp: timestamp.to_string(),
            record_id,
            record_type,
            event_data,
            generator_id: extra(3),
            sensor_path: extra(4),
            direction: extra(5),
        })
    }

    fn data<const N: usize>(&self) -> [u8; N] {
        let mut out = [0u8; N];
        let n = self.event_data.len().min(N);
        out[..n].copy_from_slice(&self.event_data[..n]);
        out
    }

    fn timestamp_value(&self) -> u32 {
        parse_log_timestamp(&self.timestamp).unwrap_or(IPMI_TIME_UNSPECIFIED)
    }

    /// Binary record. `sensor_number` maps a sensor path to its number.
    pub fn to_record<F>(&self, sensor_number: F) -> IpmiResult<SelEventRecord>
    where
        F: FnOnce(&str) -> Option<u8>,
    {
        let sel_type = match self.record_type {
            SEL_RECORD_TYPE_SYSTEM_EVENT => {
                let mut rec = StandardSpecSelRec {
                    timestamp: self.timestamp_value(),
                    evm_rev: SEL_EVM_REV,
                    sensor_num: 0xff,
                    event_data: self.data(),
                    ..Default::default()
                };
                if let (Some(generator), Some(path), Some(direction)) =
                    (&self.generator_id, &self.sensor_path, &self.direction)
                {
                    rec.gen_id = u16::from_str_radix(generator, 16).unwrap_or_else(|_| {
                        warn!("Invalid Generator ID {}", generator);
                        0
                    });
                    rec.sensor_type = sensor_type_from_path(path);
                    rec.sensor_num = sensor_number(path).unwrap_or(0xff);
                    rec.event_flag = event_type_from_path(path) & 0x7f;
                    match direction.parse::<u32>() {
                        Ok(0) => rec.event_flag |= EVENT_DIR_DEASSERT,
                        Ok(_) => {}
                        Err(_) => warn!("Invalid Event Direction {}", direction),
                    }
                }
                SelType::Standard(rec)
            }
            SEL_OEM_TS_FIRST..=SEL_OEM_TS_LAST => SelType::OemTimestamped(OemTsSpecSelRec {
                timestamp: self.timestamp_value(),
                oem_defined: self.data(),
            }),
            SEL_OEM_NOTS_FIRST..=0xff => SelType::OemNonTimestamped(OemNotsSpecSelRec {
                oem_defined: self.data(),
            }),
            other => {
                return Err(IpmiError::Unspecified(format!(
                    "unsupported SEL record type 0x{:02x}",
                    other
                )))
            }
        };
        Ok(SelEventRecord {
            record_id: self.record_id,
            record_type: self.record_type,
            sel_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AMBIENT: &str = "/xyz/openbmc_project/sensors/temperature/ambient";

    #[test]
    fn test_parse_system_event() {
        let line = format!("2024-05-01T10:00:00.000000+00:00 7,2,A1B2C3FF,20,{},0", AMBIENT);
        let entry = SelLogEntry::parse(&line).unwrap();
        assert_eq!(entry.record_id, 7);
        assert_eq!(entry.record_type, 2);
        assert_eq!(entry.event_data, vec![0xa1, 0xb2, 0xc3, 0xff]);

        let record = entry.to_record(|path| (path == AMBIENT).then_some(3)).unwrap();
        let bytes = record.to_le_bytes();
        assert_eq!(bytes.len(), SEL_RECORD_SIZE);
        let SelType::Standard(rec) = record.sel_type else {
            panic!("not a system event");
        };
        assert_eq!(rec.timestamp, 1714557600);
        assert_eq!(rec.gen_id, 0x20);
        assert_eq!(rec.evm_rev, 0x04);
        assert_eq!((rec.sensor_type, rec.sensor_num), (0x01, 3));
        assert_eq!(rec.event_type(), 0x01);
        assert!(rec.event_dir());
        // only three data bytes fit
        assert_eq!(rec.event_data, [0xa1, 0xb2, 0xc3]);
        assert_eq!(&bytes[..3], &[7, 0, 2]);
        assert_eq!(bytes[12], 0x81);
        assert_eq!(SelEventRecord::from_le_bytes(&bytes), Ok(record));
    }

    #[test]
    fn test_system_event_without_sensor() {
        let entry = SelLogEntry::parse("2024-05-01T10:00:00+00:00 3,02,0102").unwrap();
        let record = entry.to_record(|_| Some(1)).unwrap();
        let SelType::Standard(rec) = record.sel_type else {
            panic!("not a system event");
        };
        assert_eq!(rec.sensor_num, 0xff);
        assert_eq!(rec.gen_id, 0);
        assert!(!rec.event_dir());
        assert_eq!(rec.event_data, [1, 2, 0]);
    }

    #[test]
    fn test_oem_records() {
        let entry = SelLogEntry::parse("garbage 4,C1,0102030405060708090A0B").unwrap();
        let record = entry.to_record(|_| None).unwrap();
        let bytes = record.to_le_bytes();
        // unparsable timestamp
        assert_eq!(&bytes[3..7], &[0xff; 4]);
        assert_eq!(&bytes[7..], &[1, 2, 3, 4, 5, 6, 7, 8, 9]);

        let entry = SelLogEntry::parse("2024-05-01T10:00:00 5,E0,0102030").unwrap();
        assert_eq!(entry.event_data, vec![1, 2, 3, 0]);
        let bytes = entry.to_record(|_| None).unwrap().to_le_bytes();
        assert_eq!(&bytes[3..8], &[1, 2, 3, 0, 0]);
        assert_eq!(bytes.len(), SEL_RECORD_SIZE);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(SelLogEntry::parse("no-space-here").is_err());
        assert!(SelLogEntry::parse("2024-05-01T10:00:00 5,E0").is_err());
        assert!(SelLogEntry::parse("2024-05-01T10:00:00 x,E0,00").is_err());
        assert!(SelLogEntry::parse("2024-05-01T10:00:00 5,E0,ZZ").is_err());
        let entry = SelLogEntry::parse("2024-05-01T10:00:00 5,10,00").unwrap();
        assert!(matches!(entry.to_record(|_| None), Err(IpmiError::Unspecified(_))));
    }

    #[test]
    fn test_non_ascii_event_data() {
        assert!(matches!(
            SelLogEntry::parse("2024-05-01T10:00:00 5,E0,aé"),
            Err(IpmiError::Unspecified(_))
        ));
        assert!(matches!(
            SelLogEntry::parse("2024-05-01T10:00:00 5,E0,0é"),
            Err(IpmiError::Unspecified(_))
        ));
    }
}
