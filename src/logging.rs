/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use env_logger::Env;
use std::env;
use std::io::Write;

pub const DEBUG_TARGETS: [&str; 5] = ["debug1", "debug2", "debug3", "debug4", "debug5"];

fn level_color(level: log::Level, enable_color: bool) -> (&'static str, &'static str) {
    if !enable_color {
        return ("", "");
    }
    let color = match level {
        log::Level::Error => "\x1b[31m",
        log::Level::Warn => "\x1b[33m",
        log::Level::Info => "\x1b[32m",
        log::Level::Debug => "\x1b[36m",
        log::Level::Trace => "\x1b[35m",
    };
    (color, "\x1b[0m")
}

/// Filter string for a verbosity level.
///
/// - 0: error and warn only
/// - 1: + info, debug1 (-v)
/// - n: + debug1..debugn, up to 5
pub fn log_filter(verbose: u8) -> String {
    let mut parts = vec!["warn".to_string()];
    if verbose > 0 {
        parts[0] = "info".to_string();
    }
    for (idx, target) in DEBUG_TARGETS.iter().enumerate().take(verbose.min(5) as usize) {
        let level = if idx < 4 { "debug" } else { "trace" };
        parts.push(format!("{}={}", target, level));
    }
    parts.join(",")
}

/// Initialise env_logger. `RUST_LOG`, when set, wins over `verbose`.
pub fn setup_logger(verbose: u8) {
    let enable_color =
        env::var("NO_COLOR").is_err() && env::var("TERM").map_or(false, |term| term != "dumb");

    let filter = env::var("RUST_LOG").unwrap_or_else(|_| log_filter(verbose));

    let result = env_logger::Builder::from_env(Env::default().default_filter_or(filter))
        .format(move |buf, record| {
            if DEBUG_TARGETS.contains(&record.target()) {
                // debugN output carries no prefix, like ipmitool
                return writeln!(buf, "{}", record.args());
            }
            let (color, reset) = level_color(record.level(), enable_color);
            writeln!(
                buf,
                "{}[{:<5}]{} {}",
                color,
                record.level(),
                reset,
                record.args()
            )
        })
        .try_init();

    if result.is_err() {
        log::debug!("logger already initialised");
    }
}

pub fn is_debug_enabled(level: u8) -> bool {
    match level {
        1..=4 => log::log_enabled!(target: DEBUG_TARGETS[(level - 1) as usize], log::Level::Debug),
        5 => log::log_enabled!(target: "debug5", log::Level::Trace),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{debug1, debug2, debug3};

    #[test]
    fn test_log_filter_levels() {
        assert_eq!(log_filter(0), "warn");
        assert_eq!(log_filter(2), "info,debug1=debug,debug2=debug");
        assert!(log_filter(9).ends_with("debug5=trace"));
    }

    #[test]
    fn test_setup_logger_twice() {
        setup_logger(2);
        setup_logger(2);
        debug1!("This is debug1 message");
        debug2!("This is debug2 message");
        debug3!("This should not appear");
    }
}
