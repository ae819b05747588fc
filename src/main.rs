/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
mod cli;
use clap::Parser;
use cli::{Cli, GlobalArgs, MainCommand};
use std::error::Error;
use std::process::ExitCode;

use utipmi_sdrsel::commands::sdr::ipmi_sdr_main;
use utipmi_sdrsel::commands::sel::ipmi_sel_main;
use utipmi_sdrsel::commands::sensor::{ipmi_sensor_main, SensorCommand};
use utipmi_sdrsel::commands::dispatch;
use utipmi_sdrsel::config::ResponderConfig;
use utipmi_sdrsel::error::{val2str, COMPLETION_CODE_VALS};
use utipmi_sdrsel::helper::buf2str;
use utipmi_sdrsel::ipmi::context::{LogHook, NoopRotation, ResponderContext};
use utipmi_sdrsel::ipmi::ipmi::IpmiRequest;
use utipmi_sdrsel::ipmi::snapshot::SnapshotBus;
use utipmi_sdrsel::{debug2, logging};

fn build_context(global: &GlobalArgs) -> Result<ResponderContext, Box<dyn Error>> {
    let bus = match &global.snapshot {
        Some(path) => {
            debug2!("Loading bus snapshot {}", path.display());
            SnapshotBus::load(path)?
        }
        None => SnapshotBus::default(),
    };
    let config = ResponderConfig::builder()
        .with_sel_log_dir(&global.sel_dir)
        .with_sel_log_filename(&global.sel_file)
        .with_sel_erase_time_file(&global.erase_file);
    Ok(ResponderContext::new(
        config,
        Box::new(bus.clone()),
        Box::new(bus),
        Box::new(LogHook::new()),
        Box::new(NoopRotation),
    ))
}

fn ipmi_raw_main(ctx: &mut ResponderContext, netfn: u8, cmd: u8, data: Vec<u8>) -> Result<(), Box<dyn Error>> {
    let req = IpmiRequest { netfn, cmd, data };
    let rsp = dispatch(ctx, &req);
    if !rsp.is_ok() {
        return Err(format!(
            "Unable to send RAW command (netfn=0x{:x} cmd=0x{:x} rsp=0x{:x}): {}",
            netfn,
            cmd,
            rsp.ccode,
            val2str(rsp.ccode, &COMPLETION_CODE_VALS)
        )
        .into());
    }
    println!(" {}", buf2str(&rsp.data));
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::setup_logger(cli.global.verbose);

    let mut ctx = match build_context(&cli.global) {
        Ok(ctx) => ctx,
        Err(e) => {
            log::error!("Unable to set up responder: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        MainCommand::Raw { netfn, cmd, data } => ipmi_raw_main(&mut ctx, netfn, cmd, data),
        MainCommand::Sensor { subcmd } => {
            let command = subcmd.unwrap_or(SensorCommand::List);
            ipmi_sensor_main(command, &mut ctx)
        }
        MainCommand::Sdr { subcmd } => ipmi_sdr_main(subcmd, &mut ctx),
        MainCommand::Sel { subcmd } => ipmi_sel_main(subcmd, &mut ctx),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
