/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
pub fn buf2str(data: &[u8]) -> String {
    data.iter()
        .map(|byte| format!("{:02x}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse `0x1f`, `1f h` style hex or plain decimal, the way ipmitool
/// accepts numeric arguments.
pub fn str2u32(text: &str) -> Result<u32, String> {
    let text = text.trim();
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse::<u32>()
    };
    parsed.map_err(|_| format!("Numeric argument required; got '{}'", text))
}

pub fn str2u8(text: &str) -> Result<u8, String> {
    let value = str2u32(text)?;
    u8::try_from(value).map_err(|_| format!("Value out of range for a byte: '{}'", text))
}

pub fn str2u16(text: &str) -> Result<u16, String> {
    let value = str2u32(text)?;
    u16::try_from(value).map_err(|_| format!("Value out of range for a 16-bit field: '{}'", text))
}
