/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use std::path::Path;
use std::time::UNIX_EPOCH;

// special IPMI timestamps
pub const IPMI_TIME_UNSPECIFIED: u32 = 0xFFFFFFFF;
const IPMI_TIME_INIT_DONE: u32 = 0x20000000;
const SECONDS_A_DAY: u32 = 24 * 60 * 60;

const LOG_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Wall-clock seconds since the epoch, saturated into the IPMI range.
pub fn current_timestamp() -> u32 {
    Utc::now().timestamp().clamp(0, (IPMI_TIME_UNSPECIFIED - 1) as i64) as u32
}

/// Timestamp at the head of a SEL log line.
///
/// Lines written with an offset (`2024-05-01T10:00:00.123+08:00`) are taken
/// as is; bare `YYYY-MM-DDTHH:MM:SS` stamps are read as local time.
pub fn parse_log_timestamp(text: &str) -> Option<u32> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return u32::try_from(dt.timestamp()).ok();
    }
    let head = text.get(..19)?;
    let naive = NaiveDateTime::parse_from_str(head, LOG_TIME_FORMAT).ok()?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    u32::try_from(local.timestamp()).ok()
}

/// Modification time of `path`, if the file exists.
pub fn file_mtime<P: AsRef<Path>>(path: P) -> Option<u32> {
    let modified = std::fs::metadata(path.as_ref()).ok()?.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    u32::try_from(secs).ok()
}

fn format_time(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

/// ipmitool style: MM/DD/YYYY HH:MM:SS (UTC)
pub fn ipmi_timestamp_numeric(stamp: u32) -> String {
    if stamp == IPMI_TIME_UNSPECIFIED {
        return "Unspecified".to_string();
    }

    if stamp < IPMI_TIME_INIT_DONE {
        if stamp < SECONDS_A_DAY {
            return format!("S+ {}", format_time(stamp));
        }
        let years = stamp / (365 * SECONDS_A_DAY);
        let days = (stamp % (365 * SECONDS_A_DAY)) / SECONDS_A_DAY;
        return format!("S+ {}/{} {}", years, days, format_time(stamp % SECONDS_A_DAY));
    }

    match Utc.timestamp_opt(stamp as i64, 0).single() {
        Some(dt) => dt.format("%m/%d/%Y %H:%M:%S").to_string(),
        None => "Invalid timestamp".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_special_timestamps() {
        assert_eq!(ipmi_timestamp_numeric(3600), "S+ 01:00:00");
        assert_eq!(ipmi_timestamp_numeric(86400), "S+ 0/1 00:00:00");
        assert_eq!(ipmi_timestamp_numeric(IPMI_TIME_UNSPECIFIED), "Unspecified");
        assert_eq!(ipmi_timestamp_numeric(1_556_116_360), "04/24/2019 14:32:40");
    }

    #[test]
    fn test_parse_log_timestamp_with_offset() {
        assert_eq!(
            parse_log_timestamp("2019-04-24T14:32:40.123456+00:00"),
            Some(1_556_116_360)
        );
        assert_eq!(
            parse_log_timestamp("2019-04-24T16:32:40+02:00"),
            Some(1_556_116_360)
        );
    }

    #[test]
    fn test_parse_log_timestamp_local_and_garbage() {
        assert!(parse_log_timestamp("2019-04-24T14:32:40").is_some());
        assert_eq!(parse_log_timestamp("yesterday"), None);
        assert_eq!(parse_log_timestamp(""), None);
    }

    #[test]
    fn test_file_mtime_missing() {
        assert_eq!(file_mtime("/nonexistent/sel_erase_time"), None);
    }
}
