/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SEL_LOG_DIR: &str = "/var/log";
pub const DEFAULT_SEL_LOG_FILENAME: &str = "ipmi_sel";
pub const DEFAULT_SEL_ERASE_TIME_FILE: &str = "/var/lib/ipmi/sel_erase_time";
pub const DEFAULT_SENSOR_ROOT: &str = "/xyz/openbmc_project/sensors";
pub const DEFAULT_SENSOR_DEPTH: i32 = 2;
pub const DEFAULT_SENSOR_MAP_UPDATE_PERIOD: Duration = Duration::from_secs(10);
pub const DEFAULT_FRU_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Runtime settings of the responder.
#[derive(Clone, Debug)]
pub struct ResponderConfig {
    /// Directory holding the rotated SEL text files
    pub sel_log_dir: PathBuf,
    /// Base name of the active SEL file; rotated files append `.N`
    pub sel_log_filename: String,
    /// File whose mtime records the last SEL erase
    pub sel_erase_time_file: PathBuf,
    /// Root of the sensor subtree queried during discovery
    pub sensor_root: String,
    pub sensor_depth: i32,
    /// How long a service's property snapshot is served before refetching
    pub sensor_map_update_period: Duration,
    /// Delay before a partial FRU write is committed
    pub fru_write_timeout: Duration,
}

impl Default for ResponderConfig {
    fn default() -> Self {
        Self {
            sel_log_dir: PathBuf::from(DEFAULT_SEL_LOG_DIR),
            sel_log_filename: DEFAULT_SEL_LOG_FILENAME.to_string(),
            sel_erase_time_file: PathBuf::from(DEFAULT_SEL_ERASE_TIME_FILE),
            sensor_root: DEFAULT_SENSOR_ROOT.to_string(),
            sensor_depth: DEFAULT_SENSOR_DEPTH,
            sensor_map_update_period: DEFAULT_SENSOR_MAP_UPDATE_PERIOD,
            fru_write_timeout: DEFAULT_FRU_WRITE_TIMEOUT,
        }
    }
}

impl ResponderConfig {
    pub fn builder() -> Self {
        Self::default()
    }

    pub fn with_sel_log_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.sel_log_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn with_sel_log_filename(mut self, name: &str) -> Self {
        self.sel_log_filename = name.to_string();
        self
    }

    pub fn with_sel_erase_time_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.sel_erase_time_file = path.as_ref().to_path_buf();
        self
    }

    pub fn with_sensor_root(mut self, root: &str) -> Self {
        self.sensor_root = root.to_string();
        self
    }

    pub fn with_sensor_map_update_period(mut self, period: Duration) -> Self {
        self.sensor_map_update_period = period;
        self
    }

    pub fn with_fru_write_timeout(mut self, timeout: Duration) -> Self {
        self.fru_write_timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let cfg = ResponderConfig::builder()
            .with_sel_log_dir("/tmp/sel")
            .with_sensor_map_update_period(Duration::ZERO);
        assert_eq!(cfg.sel_log_dir, PathBuf::from("/tmp/sel"));
        assert_eq!(cfg.sel_log_filename, "ipmi_sel");
        assert_eq!(cfg.sensor_map_update_period, Duration::ZERO);
        assert_eq!(cfg.fru_write_timeout, Duration::from_secs(10));
    }
}
