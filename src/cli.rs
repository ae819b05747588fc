/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

use utipmi_sdrsel::commands::sdr::SdrCommand;
use utipmi_sdrsel::commands::sel::SelCommand;
use utipmi_sdrsel::commands::sensor::SensorCommand;
use utipmi_sdrsel::config::{
    DEFAULT_SEL_ERASE_TIME_FILE, DEFAULT_SEL_LOG_DIR, DEFAULT_SEL_LOG_FILENAME,
};

// top-level command
#[derive(Parser, Debug)]
#[command(
    name = "utipmi-sdrsel",
    version,
    about = "Virtual SDR/SEL responder diagnostics",
    max_term_width = 100
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: MainCommand,
}

// global options
#[derive(Args, Debug)]
pub struct GlobalArgs {
    #[arg(short = 'v', action = ArgAction::Count, global = true, help = "Verbose (can use multiple times)")]
    pub verbose: u8,

    /// Directory holding the rotated SEL log files
    #[arg(long, default_value = DEFAULT_SEL_LOG_DIR)]
    pub sel_dir: PathBuf,

    /// Base name of the active SEL log file
    #[arg(long, default_value = DEFAULT_SEL_LOG_FILENAME)]
    pub sel_file: String,

    /// File whose mtime records the last SEL erase
    #[arg(long, default_value = DEFAULT_SEL_ERASE_TIME_FILE)]
    pub erase_file: PathBuf,

    /// JSON bus snapshot with sensors and FRUs
    #[arg(long)]
    pub snapshot: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum MainCommand {
    /// Send a raw IPMI command
    Raw {
        #[arg(value_parser = utipmi_sdrsel::helper::str2u8)]
        netfn: u8,
        #[arg(value_parser = utipmi_sdrsel::helper::str2u8)]
        cmd: u8,
        #[arg(value_parser = utipmi_sdrsel::helper::str2u8)]
        data: Vec<u8>,
    },

    /// Sensor commands
    Sensor {
        #[command(subcommand)]
        subcmd: Option<SensorCommand>,
    },

    /// SDR repository commands
    Sdr {
        #[command(subcommand)]
        subcmd: SdrCommand,
    },

    /// System event log
    #[command(name = "sel")]
    Sel {
        #[command(subcommand)]
        subcmd: SelCommand,
    },
}
