/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::error::{val2str, COMPLETION_CODE_VALS, IPMI_CC_OK};
use std::fmt;

pub const IPMI_NETFN_SE: u8 = 0x04;
pub const IPMI_NETFN_STORAGE: u8 = 0x0a;

pub const IPMI_BMC_SLAVE_ADDR: u8 = 0x20;
pub const IPMI_ME_SLAVE_ADDR: u8 = 0x2c;

// Sensor/Event
pub const IPMI_CMD_PLATFORM_EVENT: u8 = 0x02;
pub const IPMI_CMD_GET_DEVICE_SDR: u8 = 0x21;
pub const IPMI_CMD_RESERVE_DEVICE_SDR_REPO: u8 = 0x22;
pub const IPMI_CMD_SET_SENSOR_THRESHOLDS: u8 = 0x26;
pub const IPMI_CMD_GET_SENSOR_THRESHOLDS: u8 = 0x27;
pub const IPMI_CMD_GET_SENSOR_EVENT_ENABLE: u8 = 0x29;
pub const IPMI_CMD_GET_SENSOR_EVENT_STATUS: u8 = 0x2b;
pub const IPMI_CMD_GET_SENSOR_READING: u8 = 0x2d;

// Storage
pub const IPMI_CMD_GET_FRU_INV_AREA_INFO: u8 = 0x10;
pub const IPMI_CMD_READ_FRU_DATA: u8 = 0x11;
pub const IPMI_CMD_WRITE_FRU_DATA: u8 = 0x12;
pub const IPMI_CMD_GET_SDR_REPO_INFO: u8 = 0x20;
pub const IPMI_CMD_GET_SDR_REPO_ALLOC_INFO: u8 = 0x21;
pub const IPMI_CMD_RESERVE_SDR_REPO: u8 = 0x22;
pub const IPMI_CMD_GET_SDR: u8 = 0x23;
pub const IPMI_CMD_GET_SEL_INFO: u8 = 0x40;
pub const IPMI_CMD_RESERVE_SEL: u8 = 0x42;
pub const IPMI_CMD_GET_SEL_ENTRY: u8 = 0x43;
pub const IPMI_CMD_ADD_SEL_ENTRY: u8 = 0x44;
pub const IPMI_CMD_CLEAR_SEL: u8 = 0x47;
pub const IPMI_CMD_GET_SEL_TIME: u8 = 0x48;
pub const IPMI_CMD_SET_SEL_TIME: u8 = 0x49;

/// A decoded inbound command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IpmiRequest {
    pub netfn: u8,
    pub cmd: u8,
    pub data: Vec<u8>,
}

impl IpmiRequest {
    pub fn new(netfn: u8, cmd: u8) -> Self {
        Self {
            netfn,
            cmd,
            data: Vec::new(),
        }
    }

    pub fn with_data(mut self, data: &[u8]) -> Self {
        self.data = data.to_vec();
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IpmiResponse {
    pub ccode: u8,
    pub data: Vec<u8>,
}

impl IpmiResponse {
    pub fn ok(data: Vec<u8>) -> Self {
        Self {
            ccode: IPMI_CC_OK,
            data,
        }
    }

    pub fn error(ccode: u8) -> Self {
        Self {
            ccode,
            data: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.ccode == IPMI_CC_OK
    }
}

impl fmt::Display for IpmiResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ccode 0x{:02x} ({}) data [{}]",
            self.ccode,
            val2str(self.ccode, &COMPLETION_CODE_VALS),
            crate::helper::buf2str(&self.data)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_display() {
        let rsp = IpmiResponse::ok(vec![0x51, 0x00]);
        assert!(rsp.is_ok());
        assert_eq!(
            rsp.to_string(),
            "ccode 0x00 (Command completed normally) data [51 00]"
        );
        assert_eq!(IpmiResponse::error(0xc1).data.len(), 0);
    }
}
