/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
pub mod entry;
pub mod info;
pub mod log;

use crate::commands::sel::entry::{SelEventRecord, SelLogEntry, SEL_RECORD_SIZE};
use crate::commands::sel::info::SelBasicInfo;
use crate::commands::sel::log::{erase_time_get, erase_time_save, SelLogFiles};
use crate::commands::sendrecv;
use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::context::ResponderContext;
use crate::ipmi::ipmi::*;
use crate::ipmi::time::{current_timestamp, ipmi_timestamp_numeric};
use crate::{debug2, debug3};
use ::log::{info, warn};
use clap::Subcommand;
use ipmi_macros::AsBytes;
use std::error::Error;

pub const IPMI_SEL_VERSION: u8 = 0x51;
pub const SEL_OP_RESERVE: u8 = 0x02;
pub const SEL_FIRST_ENTRY: u16 = 0x0000;
pub const SEL_LAST_ENTRY: u16 = 0xffff;
pub const SEL_ENTIRE_RECORD: u8 = 0xff;
/// Free space reported when more than 64 KiB is available.
const SEL_FREE_SPACE_UNKNOWN: u16 = 0xffff;

const SEL_CLEAR_MAGIC: [u8; 3] = *b"CLR";
pub const SEL_ERASE_GET_STATUS: u8 = 0x00;
pub const SEL_ERASE_INITIATE: u8 = 0xaa;
pub const SEL_ERASE_COMPLETE: u8 = 0x01;

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct GetSelEntryRq {
    pub reservation_id: u16,
    pub record_id: u16,
    pub offset: u8,
    pub count: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct ClearSelRq {
    pub reservation_id: u16,
    pub magic: [u8; 3],
    pub operation: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct AddSelEntryRq {
    pub record_id: u16,
    pub record_type: u8,
    pub timestamp: u32,
    pub generator_id: u16,
    pub evm_rev: u8,
    pub sensor_type: u8,
    pub sensor_num: u8,
    pub event_type: u8,
    pub event_data: [u8; 3],
}

fn sel_logs(ctx: &ResponderContext) -> SelLogFiles {
    SelLogFiles::new(&ctx.config.sel_log_dir, &ctx.config.sel_log_filename)
}

fn no_data(data: &[u8]) -> IpmiResult<()> {
    if data.is_empty() {
        Ok(())
    } else {
        Err(IpmiError::ReqDataLenInvalid)
    }
}

/// Get SEL Info.
pub fn ipmi_storage_get_sel_info(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    no_data(data)?;
    let logs = sel_logs(ctx);
    let entries = logs.count_entries();
    let info = SelBasicInfo {
        version: IPMI_SEL_VERSION,
        entries: entries.min(u16::MAX as usize) as u16,
        free_space: SEL_FREE_SPACE_UNKNOWN,
        last_add_time: logs.last_add_time(),
        last_del_time: erase_time_get(&ctx.config.sel_erase_time_file),
        operations: SEL_OP_RESERVE,
    };
    debug2!("SEL holds {} entries", entries);
    Ok(info.to_le_bytes())
}

/// Reserve SEL.
pub fn ipmi_storage_reserve_sel(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    no_data(data)?;
    let id = ctx.sel_reservation.reserve();
    debug2!("SEL reservation 0x{:04x}", id);
    Ok(id.to_le_bytes().to_vec())
}

/// Get SEL Entry: `[next id lsb, next id msb, 16-byte record]`.
pub fn ipmi_storage_get_sel_entry(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let rq = GetSelEntryRq::from_le_bytes(data).map_err(|_| IpmiError::ReqDataLenInvalid)?;
    // whole records only
    if rq.offset != 0 || rq.count != SEL_ENTIRE_RECORD {
        return Err(IpmiError::BytesUnavailable);
    }
    if rq.reservation_id != 0 {
        ctx.sel_reservation.check(rq.reservation_id)?;
    }

    let logs = sel_logs(ctx);
    if logs.list().is_empty() {
        return Err(IpmiError::SensorNotFound("no SEL log files".to_string()));
    }

    let line = match rq.record_id {
        SEL_FIRST_ENTRY => logs
            .first_entry()
            .ok_or_else(|| IpmiError::Unspecified("oldest SEL file is empty".to_string()))?,
        SEL_LAST_ENTRY => logs
            .last_entry()
            .ok_or_else(|| IpmiError::Unspecified("newest SEL file is empty".to_string()))?,
        id => logs
            .find_entry(id)
            .ok_or_else(|| IpmiError::SensorNotFound(format!("SEL record {}", id)))?,
    };
    debug3!("SEL line: {}", line);

    let entry = SelLogEntry::parse(&line)?;
    let next = match entry.record_id.checked_add(1) {
        Some(next) if logs.find_entry(next).is_some() => next,
        _ => SEL_LAST_ENTRY,
    };

    if let Err(e) = ctx.refresh_directory() {
        warn!("sensor numbers unavailable for SEL record {}: {}", entry.record_id, e);
    }
    let directory = &ctx.directory;
    let record = entry.to_record(|path| directory.sensor_number(path))?;

    let mut rsp = Vec::with_capacity(2 + SEL_RECORD_SIZE);
    rsp.extend_from_slice(&next.to_le_bytes());
    rsp.extend(record.to_le_bytes());
    Ok(rsp)
}

/// Add SEL Entry. The record goes to the event hook; the log files are
/// owned by the system logger and never appended here.
pub fn ipmi_storage_add_sel_entry(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let rq = AddSelEntryRq::from_le_bytes(data).map_err(|_| IpmiError::ReqDataLenInvalid)?;
    ctx.sel_reservation.cancel();
    let handled = ctx.hook().forward_sel_entry(data);
    debug2!(
        "SEL add: type 0x{:02x} generator 0x{:04x} sensor 0x{:02x}, handled by hook: {}",
        rq.record_type,
        rq.generator_id,
        rq.sensor_num,
        handled
    );
    Ok(SEL_LAST_ENTRY.to_le_bytes().to_vec())
}

/// Clear SEL.
pub fn ipmi_storage_clear_sel(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let rq = ClearSelRq::from_le_bytes(data).map_err(|_| IpmiError::ReqDataLenInvalid)?;
    ctx.sel_reservation.check(rq.reservation_id)?;
    if rq.magic != SEL_CLEAR_MAGIC {
        return Err(IpmiError::InvalidField("clear SEL magic".to_string()));
    }
    // erasure is synchronous, so it is always complete
    match rq.operation {
        SEL_ERASE_GET_STATUS => return Ok(vec![SEL_ERASE_COMPLETE]),
        SEL_ERASE_INITIATE => {}
        other => {
            return Err(IpmiError::InvalidField(format!(
                "erase operation 0x{:02x}",
                other
            )))
        }
    }

    ctx.sel_reservation.cancel();
    erase_time_save(&ctx.config.sel_erase_time_file);
    let removed = sel_logs(ctx).remove_all();
    info!("SEL cleared, {} log files removed", removed);
    ctx.restart_sel_logging();
    Ok(vec![SEL_ERASE_COMPLETE])
}

/// Get SEL Time: wall clock seconds.
pub fn ipmi_storage_get_sel_time(_ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    no_data(data)?;
    Ok(current_timestamp().to_le_bytes().to_vec())
}

/// Set SEL Time. The SEL clock follows the BMC clock and cannot be set.
pub fn ipmi_storage_set_sel_time(_ctx: &mut ResponderContext, _data: &[u8]) -> IpmiResult<Vec<u8>> {
    Err(IpmiError::InvalidCommand)
}

#[derive(Subcommand, Debug)]
pub enum SelTimeCommand {
    Get,
    Set {
        /// Seconds since the epoch
        #[arg(value_parser = crate::helper::str2u32)]
        time: u32,
    },
}

// SEL subcommands
#[derive(Subcommand, Debug)]
pub enum SelCommand {
    Info,
    #[command(name = "list")]
    List {
        // list
        // list <count>
        // list first <count>
        // list last <count>
        args: Vec<String>,
    },
    /// Show one raw SEL entry
    Get {
        #[arg(value_parser = crate::helper::str2u16)]
        record_id: u16,
    },
    /// Add a raw 16-byte SEL record given as hex
    Add { record: String },
    Clear,
    Time {
        #[command(subcommand)]
        action: SelTimeCommand,
    },
}

pub fn ipmi_sel_main(command: SelCommand, ctx: &mut ResponderContext) -> Result<(), Box<dyn Error>> {
    match command {
        SelCommand::Info => ipmi_sel_get_info(ctx),
        SelCommand::List { args } => {
            let (order, count) = parse_sel_list_args(&args)?;
            ipmi_sel_list(ctx, order, count)
        }
        SelCommand::Get { record_id } => {
            let (next, record) = ipmi_sel_get_entry(ctx, 0, record_id)?;
            println!("{}", record.format_list());
            debug2!("next SEL record 0x{:04x}", next);
            Ok(())
        }
        SelCommand::Add { record } => {
            let bytes = hex::decode(record.trim())?;
            let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_ADD_SEL_ENTRY, &bytes)?;
            match rsp.as_slice() {
                [lsb, msb] => println!("Added SEL entry 0x{:04x}", u16::from_le_bytes([*lsb, *msb])),
                _ => return Err("bad Add SEL Entry response".into()),
            }
            Ok(())
        }
        SelCommand::Clear => ipmi_sel_clear(ctx),
        SelCommand::Time { action } => match action {
            SelTimeCommand::Get => {
                let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_GET_SEL_TIME, &[])?;
                let bytes: [u8; 4] = rsp
                    .as_slice()
                    .try_into()
                    .map_err(|_| "bad Get SEL Time response")?;
                println!("{}", ipmi_timestamp_numeric(u32::from_le_bytes(bytes)));
                Ok(())
            }
            SelTimeCommand::Set { time } => {
                sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_SET_SEL_TIME, &time.to_le_bytes())?;
                Ok(())
            }
        },
    }
}

pub fn ipmi_sel_get_info(ctx: &mut ResponderContext) -> Result<(), Box<dyn Error>> {
    let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_GET_SEL_INFO, &[])?;
    let info = SelBasicInfo::from_le_bytes(&rsp)
        .map_err(|e| format!("Failed to parse SEL info: {}", e))?;
    println!("{}", info.format());
    Ok(())
}

pub fn ipmi_sel_reserve(ctx: &mut ResponderContext) -> IpmiResult<u16> {
    let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_RESERVE_SEL, &[])?;
    match rsp.as_slice() {
        [lsb, msb] => Ok(u16::from_le_bytes([*lsb, *msb])),
        _ => Err(IpmiError::ResponseError("bad Reserve SEL response".to_string())),
    }
}

/// Fetch one entry, returning `(next id, record)`.
pub fn ipmi_sel_get_entry(
    ctx: &mut ResponderContext,
    reservation_id: u16,
    record_id: u16,
) -> IpmiResult<(u16, SelEventRecord)> {
    let rq = GetSelEntryRq {
        reservation_id,
        record_id,
        offset: 0,
        count: SEL_ENTIRE_RECORD,
    };
    let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_GET_SEL_ENTRY, &rq.to_le_bytes())?;
    if rsp.len() != 2 + SEL_RECORD_SIZE {
        return Err(IpmiError::ResponseError(format!(
            "Get SEL Entry returned {} bytes",
            rsp.len()
        )));
    }
    let record = SelEventRecord::from_le_bytes(&rsp[2..]).map_err(|e| IpmiError::ResponseError(e.to_string()))?;
    Ok((u16::from_le_bytes([rsp[0], rsp[1]]), record))
}

pub fn ipmi_sel_list(
    ctx: &mut ResponderContext,
    order: Option<String>,
    count: Option<usize>,
) -> Result<(), Box<dyn Error>> {
    let mut records = Vec::new();
    let mut record_id = SEL_FIRST_ENTRY;
    loop {
        let (next, record) = match ipmi_sel_get_entry(ctx, 0, record_id) {
            Ok(found) => found,
            Err(IpmiError::SensorNotFound(_)) if records.is_empty() => {
                println!("SEL has no entries");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        records.push(record);
        if next == SEL_LAST_ENTRY {
            break;
        }
        record_id = next;
    }

    let shown: &[SelEventRecord] = match (order.as_deref(), count) {
        (Some("last"), Some(n)) if n > 0 => &records[records.len().saturating_sub(n)..],
        (_, Some(n)) if n > 0 => &records[..n.min(records.len())],
        _ => &records,
    };
    for record in shown {
        println!("{}", record.format_list());
    }
    Ok(())
}

fn ipmi_sel_clear(ctx: &mut ResponderContext) -> Result<(), Box<dyn Error>> {
    let reservation = ipmi_sel_reserve(ctx)?;
    let mut rq = ClearSelRq {
        reservation_id: reservation,
        magic: SEL_CLEAR_MAGIC,
        operation: SEL_ERASE_INITIATE,
    };
    let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_CLEAR_SEL, &rq.to_le_bytes())?;
    if rsp.first().map_or(false, |status| status & 0x0f == SEL_ERASE_COMPLETE) {
        println!("Clearing SEL.  Please allow a few seconds to erase.");
        return Ok(());
    }
    // the clear cancelled the old reservation
    rq.reservation_id = ipmi_sel_reserve(ctx)?;
    rq.operation = SEL_ERASE_GET_STATUS;
    sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_CLEAR_SEL, &rq.to_le_bytes())?;
    println!("Clearing SEL.  Please allow a few seconds to erase.");
    Ok(())
}

/// Arguments to `sel list`, as ipmitool reads them:
/// - list                 (all)
/// - list <n>             (first n)
/// - list first <n>       (first n)
/// - list last <n>        (last n)
fn parse_sel_list_args(args: &[String]) -> Result<(Option<String>, Option<usize>), Box<dyn Error>> {
    match args.len() {
        0 => Ok((None, None)),
        1 => {
            let count = parse_count_arg(&args[0])?;
            Ok((Some("first".to_string()), Some(count)))
        }
        2 => {
            let order = &args[0];
            if order != "first" && order != "last" {
                return Err(format!("Unknown sel list option: {}", order).into());
            }
            let count = parse_count_arg(&args[1])?;
            Ok((Some(order.clone()), Some(count)))
        }
        _ => Err("Too many arguments for sel list command".into()),
    }
}

/// Parse a count; negative counts from the end.
fn parse_count_arg(count_str: &str) -> Result<usize, Box<dyn Error>> {
    match count_str.parse::<i32>() {
        Ok(n) => Ok(n.unsigned_abs() as usize),
        Err(_) => Err(format!("Numeric argument required; got '{}'", count_str).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResponderConfig;
    use crate::commands::sel::entry::SelType;
    use crate::ipmi::bus::{InterfaceMap, PropertyMap, PropertyValue, SENSOR_VALUE_INTERFACE};
    use crate::ipmi::context::{LogHook, NoopRotation};
    use crate::ipmi::snapshot::{BusSnapshot, SnapshotBus};
    use crate::ipmi::time::IPMI_TIME_UNSPECIFIED;
    use std::fs::File;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const AMBIENT: &str = "/xyz/openbmc_project/sensors/temperature/ambient";

    fn write_log(dir: &Path, name: &str, lines: &[String]) {
        let mut file = File::create(dir.join(name)).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn context(dir: &TempDir) -> (ResponderContext, LogHook) {
        let mut snapshot = BusSnapshot::default();
        let mut props = PropertyMap::new();
        props.insert("Value".to_string(), PropertyValue::Double(21.0));
        let mut ifaces = InterfaceMap::new();
        ifaces.insert(SENSOR_VALUE_INTERFACE.to_string(), props);
        snapshot.insert_sensor("xyz.openbmc_project.HwmonTempSensor", AMBIENT, ifaces);
        let bus = SnapshotBus::new(snapshot);
        let hook = LogHook::new();
        let config = ResponderConfig::builder()
            .with_sel_log_dir(dir.path())
            .with_sel_erase_time_file(dir.path().join("sel_erase_time"));
        let ctx = ResponderContext::new(
            config,
            Box::new(bus.clone()),
            Box::new(bus),
            Box::new(hook.clone()),
            Box::new(NoopRotation),
        );
        (ctx, hook)
    }

    /// ids 1..=2 rotated out, 3..=4 in the active file
    fn populate(dir: &TempDir) {
        write_log(
            dir.path(),
            "ipmi_sel.1",
            &[
                "2024-05-01T10:00:00+00:00 1,2,010203,20,/xyz/openbmc_project/sensors/voltage/P12V,1".to_string(),
                "2024-05-01T10:00:01+00:00 2,C0,010203040506070809".to_string(),
            ],
        );
        write_log(
            dir.path(),
            "ipmi_sel",
            &[
                format!("2024-05-01T10:00:02+00:00 3,2,A1B2C3,20,{},0", AMBIENT),
                "2024-05-01T10:00:03+00:00 4,E5,0102030405060708090A0B0C0D".to_string(),
            ],
        );
    }

    fn get_entry(ctx: &mut ResponderContext, reservation: u16, id: u16) -> IpmiResult<Vec<u8>> {
        let rq = GetSelEntryRq {
            reservation_id: reservation,
            record_id: id,
            offset: 0,
            count: 0xff,
        };
        ipmi_storage_get_sel_entry(ctx, &rq.to_le_bytes())
    }

    #[test]
    fn test_sel_info() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir);
        let (mut ctx, _) = context(&dir);
        let rsp = ipmi_storage_get_sel_info(&mut ctx, &[]).unwrap();
        let info = SelBasicInfo::from_le_bytes(&rsp).unwrap();
        assert_eq!(info.version, 0x51);
        assert_eq!(info.entries, 4);
        assert_eq!(info.free_space, 0xffff);
        assert_ne!(info.last_add_time, IPMI_TIME_UNSPECIFIED);
        assert_eq!(info.last_del_time, IPMI_TIME_UNSPECIFIED);
        assert_eq!(info.operations, 0x02);
    }

    #[test]
    fn test_get_entry_walk() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir);
        let (mut ctx, _) = context(&dir);

        let rsp = get_entry(&mut ctx, 0, SEL_FIRST_ENTRY).unwrap();
        assert_eq!(rsp.len(), 18);
        assert_eq!(&rsp[..5], &[2, 0, 1, 0, 2]);

        let rsp = get_entry(&mut ctx, 0, 3).unwrap();
        assert_eq!(&rsp[..2], &[4, 0]);
        let record = SelEventRecord::from_le_bytes(&rsp[2..]).unwrap();
        let SelType::Standard(rec) = record.sel_type else {
            panic!("not a system event");
        };
        // the only sensor in the directory is number 0
        assert_eq!(rec.sensor_num, 0);
        assert!(rec.event_dir());
        assert_eq!(rec.event_data, [0xa1, 0xb2, 0xc3]);

        let rsp = get_entry(&mut ctx, 0, SEL_LAST_ENTRY).unwrap();
        assert_eq!(&rsp[..5], &[0xff, 0xff, 4, 0, 0xe5]);
        assert_eq!(&rsp[5..], &[1, 2, 3, 4, 5, 6, 7, 8, 9, 0xa, 0xb, 0xc, 0xd]);

        // voltage sensor is not in the directory
        let rsp = get_entry(&mut ctx, 0, 1).unwrap();
        let record = SelEventRecord::from_le_bytes(&rsp[2..]).unwrap();
        let SelType::Standard(rec) = record.sel_type else {
            panic!("not a system event");
        };
        assert_eq!(rec.sensor_num, 0xff);

        assert!(matches!(get_entry(&mut ctx, 0, 9), Err(IpmiError::SensorNotFound(_))));
    }

    #[test]
    fn test_get_entry_window_and_reservation() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir);
        let (mut ctx, _) = context(&dir);
        let partial = GetSelEntryRq {
            reservation_id: 0,
            record_id: 1,
            offset: 0,
            count: 16,
        };
        assert_eq!(
            ipmi_storage_get_sel_entry(&mut ctx, &partial.to_le_bytes()),
            Err(IpmiError::BytesUnavailable)
        );
        assert_eq!(get_entry(&mut ctx, 0x1234, 1), Err(IpmiError::InvalidReservation));
        let rsp = ipmi_storage_reserve_sel(&mut ctx, &[]).unwrap();
        let reservation = u16::from_le_bytes([rsp[0], rsp[1]]);
        assert!(get_entry(&mut ctx, reservation, 1).is_ok());
    }

    #[test]
    fn test_no_log_files() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ctx, _) = context(&dir);
        assert!(matches!(get_entry(&mut ctx, 0, 0), Err(IpmiError::SensorNotFound(_))));
        let info = SelBasicInfo::from_le_bytes(&ipmi_storage_get_sel_info(&mut ctx, &[]).unwrap()).unwrap();
        assert_eq!(info.entries, 0);
    }

    #[test]
    fn test_add_entry_never_touches_log() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir);
        let (mut ctx, hook) = context(&dir);
        let rsp = ipmi_storage_reserve_sel(&mut ctx, &[]).unwrap();
        let reservation = u16::from_le_bytes([rsp[0], rsp[1]]);

        let record = [0u8; 16];
        assert_eq!(ipmi_storage_add_sel_entry(&mut ctx, &record), Ok(vec![0xff, 0xff]));
        assert_eq!(hook.log().sel_entries.len(), 1);
        assert!(ctx.sel_reservation.current().is_none());
        assert_eq!(get_entry(&mut ctx, reservation, 1), Err(IpmiError::InvalidReservation));

        let info = SelBasicInfo::from_le_bytes(&ipmi_storage_get_sel_info(&mut ctx, &[]).unwrap()).unwrap();
        assert_eq!(info.entries, 4);
        assert_eq!(ipmi_storage_add_sel_entry(&mut ctx, &[0u8; 15]), Err(IpmiError::ReqDataLenInvalid));
    }

    #[test]
    fn test_clear_sel() {
        let dir = tempfile::tempdir().unwrap();
        populate(&dir);
        let (mut ctx, _) = context(&dir);
        let clear = |reservation: u16, magic: [u8; 3], operation: u8| {
            ClearSelRq {
                reservation_id: reservation,
                magic,
                operation,
            }
            .to_le_bytes()
        };

        assert_eq!(
            ipmi_storage_clear_sel(&mut ctx, &clear(0, *b"CLR", SEL_ERASE_INITIATE)),
            Err(IpmiError::InvalidReservation)
        );
        let rsp = ipmi_storage_reserve_sel(&mut ctx, &[]).unwrap();
        let reservation = u16::from_le_bytes([rsp[0], rsp[1]]);
        assert!(matches!(
            ipmi_storage_clear_sel(&mut ctx, &clear(reservation, *b"CLX", SEL_ERASE_INITIATE)),
            Err(IpmiError::InvalidField(_))
        ));
        assert!(matches!(
            ipmi_storage_clear_sel(&mut ctx, &clear(reservation, *b"CLR", 0x55)),
            Err(IpmiError::InvalidField(_))
        ));
        assert_eq!(
            ipmi_storage_clear_sel(&mut ctx, &clear(reservation, *b"CLR", SEL_ERASE_GET_STATUS)),
            Ok(vec![SEL_ERASE_COMPLETE])
        );
        assert_eq!(
            ipmi_storage_clear_sel(&mut ctx, &clear(reservation, *b"CLR", SEL_ERASE_INITIATE)),
            Ok(vec![SEL_ERASE_COMPLETE])
        );
        assert!(ctx.sel_reservation.current().is_none());

        let info = SelBasicInfo::from_le_bytes(&ipmi_storage_get_sel_info(&mut ctx, &[]).unwrap()).unwrap();
        assert_eq!(info.entries, 0);
        assert_ne!(info.last_del_time, IPMI_TIME_UNSPECIFIED);
        assert_eq!(info.last_add_time, IPMI_TIME_UNSPECIFIED);
    }

    #[test]
    fn test_sel_time() {
        let dir = tempfile::tempdir().unwrap();
        let (mut ctx, _) = context(&dir);
        let rsp = ipmi_storage_get_sel_time(&mut ctx, &[]).unwrap();
        assert_eq!(rsp.len(), 4);
        assert!(u32::from_le_bytes([rsp[0], rsp[1], rsp[2], rsp[3]]) > 0x20000000);
        assert_eq!(
            ipmi_storage_set_sel_time(&mut ctx, &[0, 0, 0, 0x60]),
            Err(IpmiError::InvalidCommand)
        );
    }

    #[test]
    fn test_list_args() {
        assert_eq!(parse_sel_list_args(&[]).unwrap(), (None, None));
        let args = vec!["last".to_string(), "-3".to_string()];
        assert_eq!(parse_sel_list_args(&args).unwrap(), (Some("last".to_string()), Some(3)));
        assert!(parse_sel_list_args(&["middle".to_string(), "1".to_string()]).is_err());
        assert!(parse_sel_list_args(&["x".to_string()]).is_err());
    }
}
