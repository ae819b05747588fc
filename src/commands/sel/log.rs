/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
//! Rotated SEL log files on disk.
//!
//! The active file is `<dir>/<name>`; rotation renames it to `<name>.1`,
//! `<name>.2`, ... with higher suffixes holding older entries.

use crate::ipmi::time::{file_mtime, IPMI_TIME_UNSPECIFIED};
use crate::{debug2, debug3};
use log::{error, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

#[derive(Debug, Clone)]
pub struct SelLogFiles {
    dir: PathBuf,
    name: String,
}

impl SelLogFiles {
    pub fn new<P: AsRef<Path>>(dir: P, name: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            name: name.to_string(),
        }
    }

    pub fn active_path(&self) -> PathBuf {
        self.dir.join(&self.name)
    }

    /// Rotation index of a file name, `None` if it is not one of ours.
    fn rotation_index(&self, file_name: &str) -> Option<u32> {
        let rest = file_name.strip_prefix(self.name.as_str())?;
        if rest.is_empty() {
            return Some(0);
        }
        rest.strip_prefix('.')?.parse().ok()
    }

    /// Log files ordered newest first.
    pub fn list(&self) -> Vec<PathBuf> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                debug2!("cannot read SEL directory {}: {}", self.dir.display(), e);
                return Vec::new();
            }
        };
        let mut files: Vec<(u32, PathBuf)> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                let index = self.rotation_index(name.to_str()?)?;
                Some((index, entry.path()))
            })
            .collect();
        files.sort_by_key(|(index, _)| *index);
        files.into_iter().map(|(_, path)| path).collect()
    }

    fn open(path: &Path) -> Option<BufReader<File>> {
        match File::open(path) {
            Ok(file) => Some(BufReader::new(file)),
            Err(e) => {
                warn!("cannot open SEL log {}: {}", path.display(), e);
                None
            }
        }
    }

    fn lines(path: &Path) -> impl Iterator<Item = String> {
        Self::open(path)
            .into_iter()
            .flat_map(|reader| reader.split(b'\n').map_while(Result::ok))
            .map(|raw| {
                let line = String::from_utf8_lossy(&raw);
                line.strip_suffix('\r').unwrap_or(&line).to_string()
            })
    }

    /// Total line count across every rotated file.
    pub fn count_entries(&self) -> usize {
        self.list().iter().map(|path| Self::lines(path).count()).sum()
    }

    /// First line of the oldest file.
    pub fn first_entry(&self) -> Option<String> {
        let files = self.list();
        Self::lines(files.last()?).next()
    }

    /// Last line of the newest file.
    pub fn last_entry(&self) -> Option<String> {
        let files = self.list();
        Self::lines(files.first()?).last()
    }

    /// Line holding `record_id`, searching newest file first.
    pub fn find_entry(&self, record_id: u16) -> Option<String> {
        // the id follows the timestamp and is terminated by a comma
        let needle = format!(" {},", record_id);
        for path in self.list() {
            if let Some(line) = Self::lines(&path).find(|line| line.contains(&needle)) {
                debug3!("record {} found in {}", record_id, path.display());
                return Some(line);
            }
        }
        None
    }

    /// Mtime of the active file.
    pub fn last_add_time(&self) -> u32 {
        file_mtime(self.active_path()).unwrap_or(IPMI_TIME_UNSPECIFIED)
    }

    /// Delete every rotated file. Failures are logged and skipped.
    pub fn remove_all(&self) -> usize {
        let mut removed = 0;
        for path in self.list() {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => error!("removing {} failed: {}", path.display(), e),
            }
        }
        removed
    }
}

/// Erase timestamp: the mtime of a marker file, not its contents.
pub fn erase_time_get<P: AsRef<Path>>(path: P) -> u32 {
    file_mtime(path).unwrap_or(IPMI_TIME_UNSPECIFIED)
}

pub fn erase_time_save<P: AsRef<Path>>(path: P) {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            error!("cannot create {}: {}", parent.display(), e);
            return;
        }
    }
    let file = match OpenOptions::new().write(true).create(true).truncate(false).open(path) {
        Ok(file) => file,
        Err(e) => {
            error!("Failed to open {}: {}", path.display(), e);
            return;
        }
    };
    if let Err(e) = file.set_modified(SystemTime::now()) {
        error!("Failed to update timestamp of {}: {}", path.display(), e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(dir: &Path, name: &str, lines: &[&str]) {
        let mut file = File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    #[test]
    fn test_rotation_order() {
        let dir = tempfile::tempdir().unwrap();
        write_log(dir.path(), "ipmi_sel", &["2024-05-01T10:00:00 12,2,010203"]);
        write_log(dir.path(), "ipmi_sel.1", &["2024-04-01T10:00:00 10,2,010203"]);
        write_log(dir.path(), "ipmi_sel.10", &["2024-01-01T10:00:00 1,2,010203"]);
        write_log(dir.path(), "ipmi_sel.2", &["2024-03-01T10:00:00 5,2,010203"]);
        write_log(dir.path(), "ipmi_sel.bak", &["ignored"]);
        write_log(dir.path(), "other", &["ignored"]);

        let logs = SelLogFiles::new(dir.path(), "ipmi_sel");
        let names: Vec<String> = logs
            .list()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["ipmi_sel", "ipmi_sel.1", "ipmi_sel.2", "ipmi_sel.10"]);
        assert_eq!(logs.count_entries(), 4);
        assert!(logs.first_entry().unwrap().contains(" 1,"));
        assert!(logs.last_entry().unwrap().contains(" 12,"));
    }

    #[test]
    fn test_find_entry_matches_whole_id() {
        let dir = tempfile::tempdir().unwrap();
        write_log(
            dir.path(),
            "ipmi_sel",
            &[
                "2024-05-01T10:00:00 11,2,010203",
                "2024-05-01T10:00:01 1,2,040506",
            ],
        );
        let logs = SelLogFiles::new(dir.path(), "ipmi_sel");
        assert!(logs.find_entry(1).unwrap().ends_with("040506"));
        assert!(logs.find_entry(11).unwrap().ends_with("010203"));
        assert!(logs.find_entry(2).is_none());
    }

    #[test]
    fn test_invalid_utf8_line_does_not_stop_scan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("ipmi_sel"),
            b"2024-05-01T10:00:00 1,2,010203\n\
              2024-05-01T10:00:01 2,2,040506\xff\xfe\n\
              2024-05-01T10:00:02 3,2,070809\r\n",
        )
        .unwrap();
        let logs = SelLogFiles::new(dir.path(), "ipmi_sel");
        assert_eq!(logs.count_entries(), 3);
        assert!(logs.find_entry(2).is_some());
        assert!(logs.find_entry(3).unwrap().ends_with("070809"));
        assert_eq!(logs.last_entry().unwrap(), "2024-05-01T10:00:02 3,2,070809");
    }

    #[test]
    fn test_missing_directory() {
        let logs = SelLogFiles::new("/nonexistent/sel/dir", "ipmi_sel");
        assert!(logs.list().is_empty());
        assert_eq!(logs.count_entries(), 0);
        assert_eq!(logs.last_add_time(), IPMI_TIME_UNSPECIFIED);
        assert!(logs.last_entry().is_none());
    }

    #[test]
    fn test_erase_time_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("ipmi").join("sel_erase_time");
        assert_eq!(erase_time_get(&marker), IPMI_TIME_UNSPECIFIED);
        erase_time_save(&marker);
        assert_ne!(erase_time_get(&marker), IPMI_TIME_UNSPECIFIED);
    }
}
