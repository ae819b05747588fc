/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::ipmi::time::{ipmi_timestamp_numeric, IPMI_TIME_UNSPECIFIED};
use ipmi_macros::AsBytes;

const SEL_OVERFLOW: u8 = 0x80;

/// Get SEL Info response body.
#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct SelBasicInfo {
    pub version: u8,
    pub entries: u16,
    pub free_space: u16,
    pub last_add_time: u32,
    pub last_del_time: u32,
    pub operations: u8,
}

impl SelBasicInfo {
    pub fn overflow(&self) -> bool {
        self.operations & SEL_OVERFLOW != 0
    }

    pub fn format(&self) -> String {
        let mut output = String::new();

        let version_str = format!(
            "{}.{} ({})",
            self.version & 0xf,
            (self.version >> 4) & 0xf,
            if self.version == 0x51 || self.version == 0x02 {
                "v1.5, v2 compliant"
            } else {
                "Unknown"
            }
        );

        // truncated, not rounded
        let free_space = self.free_space as u32;
        let pctfull = if self.entries != 0 {
            let used = self.entries as u32 * 16;
            100 * used / (free_space + used)
        } else {
            0
        };

        let format_time = |time: u32| {
            if time == IPMI_TIME_UNSPECIFIED || time == 0 {
                "Not Available".to_string()
            } else {
                ipmi_timestamp_numeric(time)
            }
        };

        let mut cmds = Vec::new();
        if self.operations & 0x08 != 0 {
            cmds.push("'Delete'");
        }
        if self.operations & 0x04 != 0 {
            cmds.push("'Partial Add'");
        }
        if self.operations & 0x02 != 0 {
            cmds.push("'Reserve'");
        }
        if self.operations & 0x01 != 0 {
            cmds.push("'Get Alloc Info'");
        }
        let cmds_str = if cmds.is_empty() {
            "None".to_string()
        } else {
            cmds.join(" ")
        };

        output.push_str("SEL Information\n");
        output.push_str(&format!("Version          : {}\n", version_str));
        output.push_str(&format!("Entries          : {}\n", self.entries));
        output.push_str(&format!(
            "Free Space       : {} bytes {}\n",
            self.free_space,
            if self.free_space == u16::MAX { "or more" } else { "" }
        ));
        output.push_str(&format!(
            "Percent Used     : {}\n",
            if self.free_space == u16::MAX {
                "unknown".to_string()
            } else {
                format!("{}%", pctfull)
            }
        ));
        output.push_str(&format!(
            "Last Add Time    : {}\n",
            format_time(self.last_add_time)
        ));
        output.push_str(&format!(
            "Last Del Time    : {}\n",
            format_time(self.last_del_time)
        ));
        output.push_str(&format!("Overflow         : {}\n", self.overflow()));
        output.push_str(&format!("Supported Cmds   : {} ", cmds_str));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_layout() {
        let info = SelBasicInfo {
            version: 0x51,
            entries: 3,
            free_space: 0xffff,
            last_add_time: 0x01020304,
            last_del_time: IPMI_TIME_UNSPECIFIED,
            operations: 0x02,
        };
        let bytes = info.to_le_bytes();
        assert_eq!(bytes.len(), 14);
        assert_eq!(&bytes[..5], &[0x51, 3, 0, 0xff, 0xff]);
        assert_eq!(&bytes[5..9], &[4, 3, 2, 1]);
        assert_eq!(bytes[13], 0x02);
        assert_eq!(SelBasicInfo::from_le_bytes(&bytes).unwrap(), info);
        assert!(SelBasicInfo::from_le_bytes(&bytes[..13]).is_err());
    }

    #[test]
    fn test_format() {
        let info = SelBasicInfo {
            version: 0x51,
            entries: 2,
            free_space: 0xffff,
            last_add_time: IPMI_TIME_UNSPECIFIED,
            last_del_time: 0,
            operations: 0x02,
        };
        let text = info.format();
        assert!(text.contains("1.5 (v1.5, v2 compliant)"));
        assert!(text.contains("Percent Used     : unknown"));
        assert!(text.contains("Last Add Time    : Not Available"));
        assert!(text.contains("Overflow         : false"));
        assert!(text.contains("'Reserve'"));
    }
}
