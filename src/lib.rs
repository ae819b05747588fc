/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
#![allow(clippy::module_inception)]

pub mod commands;
pub mod config;
pub mod error;
pub mod helper;
pub mod ipmi;
pub mod logging;

// debugN macros: gated by -v level, targets match logging::DEBUG_TARGETS
#[macro_export]
macro_rules! debug1 {
    ($($arg:tt)*) => {
        ::log::debug!(target: "debug1", $($arg)*)
    };
}

#[macro_export]
macro_rules! debug2 {
    ($($arg:tt)*) => {
        ::log::debug!(target: "debug2", $($arg)*)
    };
}

#[macro_export]
macro_rules! debug3 {
    ($($arg:tt)*) => {
        ::log::debug!(target: "debug3", $($arg)*)
    };
}

#[macro_export]
macro_rules! debug4 {
    ($($arg:tt)*) => {
        ::log::debug!(target: "debug4", $($arg)*)
    };
}

#[macro_export]
macro_rules! debug5 {
    ($($arg:tt)*) => {
        ::log::trace!(target: "debug5", $($arg)*)
    };
}
