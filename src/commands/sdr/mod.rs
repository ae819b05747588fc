/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
pub mod record;
pub mod types;

use crate::commands::sdr::record::*;
use crate::commands::sdr::types::*;
use crate::commands::sendrecv;
use crate::commands::sensor::cache::SensorEntry;
use crate::commands::sensor::ipmi_sensor_get_reading;
use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::context::ResponderContext;
use crate::ipmi::ipmi::*;
use crate::ipmi::reservation::Reservation;
use crate::ipmi::time::IPMI_TIME_UNSPECIFIED;
use crate::{debug2, debug3};
use clap::Subcommand;
use ipmi_macros::AsBytes;
use log::warn;
use std::error::Error;

/// Bytes the repository could hold if it were writable.
const MAX_SDR_TOTAL_SIZE: u16 = 76;
const SDR_LAST_RECORD_ID: u16 = 0xffff;
const SDR_READ_WHOLE_RECORD: u8 = 0xff;

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct GetSdrRq {
    pub reservation_id: u16,
    pub record_id: u16,
    pub offset: u8,
    pub count: u8,
}

/// Record sources visible during one read sequence.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SdrLayout {
    pub sensors: Vec<SensorEntry>,
    pub fru_count: usize,
}

impl SdrLayout {
    pub fn record_count(&self) -> usize {
        self.sensors.len() + self.fru_count + FIXED_RECORD_COUNT
    }

    pub fn last_record(&self) -> u16 {
        (self.record_count() - 1).min(SDR_LAST_RECORD_ID as usize - 1) as u16
    }
}

/// SDR repository state kept between commands.
#[derive(Debug)]
pub struct SdrRepoState {
    pub reservation: Reservation,
    /// Layout captured when the live reservation was issued
    layout: Option<SdrLayout>,
    pub last_add: u32,
    pub last_remove: u32,
}

impl Default for SdrRepoState {
    fn default() -> Self {
        Self {
            reservation: Reservation::new(),
            layout: None,
            last_add: IPMI_TIME_UNSPECIFIED,
            last_remove: IPMI_TIME_UNSPECIFIED,
        }
    }
}

impl SdrRepoState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Snapshot the current sensor directory and FRU count.
fn current_layout(ctx: &mut ResponderContext) -> IpmiResult<SdrLayout> {
    ctx.refresh_directory()
        .map_err(|e| IpmiError::ResponseError(format!("sensor directory unavailable: {}", e)))?;
    let sensors = ctx.directory.entries().to_vec();
    let fru_count = ctx
        .fru_count()
        .map_err(|e| IpmiError::ResponseError(format!("FRU count unavailable: {}", e)))?;
    Ok(SdrLayout { sensors, fru_count })
}

/// Bytes of the record at `record_id` within `layout`.
fn build_record(ctx: &mut ResponderContext, layout: &SdrLayout, record_id: u16) -> IpmiResult<Vec<u8>> {
    let index = record_id as usize;
    if let Some(entry) = layout.sensors.get(index) {
        let (interfaces, live) = ctx.live_sensor(entry).map_err(|e| {
            IpmiError::ResponseError(format!("sensor {} unavailable: {}", entry.path, e))
        })?;
        let entity = ctx
            .bus()
            .resolve_parent_entity(&entry.path, &interfaces)
            .unwrap_or((0, 1));
        return build_full_sensor_record(record_id, &entry.path, &live, entity);
    }

    let fru_index = index - layout.sensors.len();
    if fru_index < layout.fru_count {
        let fru = ctx
            .fru_inventory()
            .fru_descriptor(fru_index)
            .map_err(|e| IpmiError::ResponseError(format!("FRU {} unavailable: {}", fru_index, e)))?;
        return Ok(build_fru_locator_record(record_id, &fru));
    }

    let type12_index = fru_index - layout.fru_count;
    if type12_index < TYPE12_RECORD_COUNT {
        return build_type12_record(type12_index, record_id)
            .ok_or_else(|| IpmiError::InvalidField(format!("record 0x{:04x}", record_id)));
    }
    build_nm_discovery_record(type12_index - TYPE12_RECORD_COUNT, record_id)
        .ok_or_else(|| IpmiError::InvalidField(format!("record 0x{:04x}", record_id)))
}

/// Get SDR Repository Info.
pub fn ipmi_storage_get_sdr_repo_info(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    if !data.is_empty() {
        return Err(IpmiError::ReqDataLenInvalid);
    }
    let layout = current_layout(ctx)?;
    let info = SdrRepositoryInfo {
        sdr_version: IPMI_SDR_VERSION,
        record_count: layout.record_count().min(u16::MAX as usize) as u16,
        free_space: 0xffff,
        recent_addition: ctx.sdr.last_add,
        recent_erase: ctx.sdr.last_remove,
        operations: SDR_OP_OVERFLOW | SDR_OP_RESERVE | SDR_OP_ALLOC_INFO,
    };
    debug2!("SDR repository holds {} records", info.record_count);
    Ok(info.to_le_bytes())
}

/// Get SDR Repository Allocation Info. Writes are unsupported, so the
/// allocator is reported as a single block.
pub fn ipmi_storage_get_sdr_alloc_info(_ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    if !data.is_empty() {
        return Err(IpmiError::ReqDataLenInvalid);
    }
    Ok(SdrAllocInfo {
        alloc_units: 0,
        alloc_unit_size: MAX_SDR_TOTAL_SIZE,
        free_units: 0,
        largest_free_blk: 0,
        max_record_size: 1,
    }
    .to_le_bytes())
}

/// Reserve SDR Repository (also Reserve Device SDR Repository).
pub fn ipmi_storage_reserve_sdr(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    if !data.is_empty() {
        return Err(IpmiError::ReqDataLenInvalid);
    }
    let id = ctx.sdr.reservation.reserve();
    ctx.sdr.layout = match current_layout(ctx) {
        Ok(layout) => Some(layout),
        Err(e) => {
            warn!("SDR layout not captured for reservation {}: {}", id, e);
            None
        }
    };
    debug2!("SDR reservation 0x{:04x}", id);
    Ok(id.to_le_bytes().to_vec())
}

/// Get SDR (also Get Device SDR): `[next id lsb, next id msb, bytes...]`.
pub fn ipmi_storage_get_sdr(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let rq = GetSdrRq::from_le_bytes(data).map_err(|_| IpmiError::ReqDataLenInvalid)?;

    // only partial reads need a reservation
    if rq.offset != 0 {
        ctx.sdr.reservation.check(rq.reservation_id)?;
    }

    let pinned = if ctx.sdr.reservation.is_valid(rq.reservation_id) {
        ctx.sdr.layout.clone()
    } else {
        None
    };
    let layout = match pinned {
        Some(layout) => layout,
        None => current_layout(ctx)?,
    };

    let last = layout.last_record();
    let record_id = if rq.record_id == SDR_LAST_RECORD_ID {
        last
    } else {
        rq.record_id
    };
    if record_id > last {
        return Err(IpmiError::InvalidField(format!(
            "record 0x{:04x} beyond last 0x{:04x}",
            record_id, last
        )));
    }
    let next = if record_id < last {
        record_id + 1
    } else {
        SDR_LAST_RECORD_ID
    };

    let record = build_record(ctx, &layout, record_id)?;
    let offset = rq.offset as usize;
    if offset > record.len() {
        return Err(IpmiError::InvalidField(format!(
            "offset {} beyond record length {}",
            offset,
            record.len()
        )));
    }
    let count = (rq.count as usize).min(record.len() - offset);

    let mut rsp = Vec::with_capacity(2 + count);
    rsp.extend_from_slice(&next.to_le_bytes());
    rsp.extend_from_slice(&record[offset..offset + count]);
    debug3!(
        "SDR 0x{:04x} [{}..{}] next 0x{:04x}",
        record_id,
        offset,
        offset + count,
        next
    );
    Ok(rsp)
}

#[derive(Subcommand, Debug)]
pub enum SdrCommand {
    /// Display information about the SDR repository
    Info,
    /// Display allocation information of the SDR repository
    Alloc,
    /// List sensors with their current readings
    List,
    /// List every SDR record with sensor number and entity info
    Elist,
    /// Dump one raw SDR record
    Get {
        /// Record id, 0xffff for the last record
        #[arg(value_parser = crate::helper::str2u16)]
        record_id: u16,
    },
}

pub fn ipmi_sdr_main(command: SdrCommand, ctx: &mut ResponderContext) -> Result<(), Box<dyn Error>> {
    match command {
        SdrCommand::Info => ipmi_sdr_info(ctx),
        SdrCommand::Alloc => {
            let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_GET_SDR_REPO_ALLOC_INFO, &[])?;
            let info = SdrAllocInfo::from_le_bytes(&rsp)?;
            println!("{}", info.format());
            Ok(())
        }
        SdrCommand::List => ipmi_sdr_list(ctx, false),
        SdrCommand::Elist => ipmi_sdr_list(ctx, true),
        SdrCommand::Get { record_id } => {
            let (_, record) = ipmi_sdr_get_record(ctx, 0, record_id)?;
            println!("{}", crate::helper::buf2str(&record));
            Ok(())
        }
    }
}

pub fn ipmi_sdr_info(ctx: &mut ResponderContext) -> Result<(), Box<dyn Error>> {
    let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_GET_SDR_REPO_INFO, &[])?;
    let info = SdrRepositoryInfo::from_le_bytes(&rsp)?;
    println!("{}", info.format_standard());
    Ok(())
}

pub fn ipmi_sdr_get_reservation(ctx: &mut ResponderContext) -> IpmiResult<u16> {
    let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_RESERVE_SDR_REPO, &[])?;
    match rsp.as_slice() {
        [lsb, msb] => Ok(u16::from_le_bytes([*lsb, *msb])),
        _ => Err(IpmiError::ResponseError("bad Reserve SDR response".to_string())),
    }
}

/// Read a whole record, returning `(next id, bytes)`.
pub fn ipmi_sdr_get_record(
    ctx: &mut ResponderContext,
    reservation_id: u16,
    record_id: u16,
) -> IpmiResult<(u16, Vec<u8>)> {
    let rq = GetSdrRq {
        reservation_id,
        record_id,
        offset: 0,
        count: SDR_READ_WHOLE_RECORD,
    };
    let rsp = sendrecv(ctx, IPMI_NETFN_STORAGE, IPMI_CMD_GET_SDR, &rq.to_le_bytes())?;
    if rsp.len() < 2 {
        return Err(IpmiError::ResponseError("short Get SDR response".to_string()));
    }
    Ok((u16::from_le_bytes([rsp[0], rsp[1]]), rsp[2..].to_vec()))
}

fn id_string(record: &[u8], code_at: usize) -> String {
    let len = record.get(code_at).map_or(0, |c| (c & 0x1f) as usize);
    let start = code_at + 1;
    let end = (start + len).min(record.len());
    if start >= end {
        return String::new();
    }
    String::from_utf8_lossy(&record[start..end]).to_string()
}

pub fn ipmi_sdr_list(ctx: &mut ResponderContext, extended: bool) -> Result<(), Box<dyn Error>> {
    let reservation = ipmi_sdr_get_reservation(ctx)?;

    let mut record_id = 0u16;
    loop {
        let (next, record) = ipmi_sdr_get_record(ctx, reservation, record_id)?;
        let header = SdrRecordHeader::from_le_bytes(&record[..SDR_HEADER_SIZE.min(record.len())])?;
        match header.record_type {
            SDR_RECORD_TYPE_FULL_SENSOR => {
                let view = FullSensorView::from_le_bytes(&record)?;
                let reading = match ipmi_sensor_get_reading(ctx, view.sensor_num) {
                    Ok(r) if !r.unavailable => {
                        format!("{:.2} {}", view.params.decode(r.raw), view.unit_name())
                    }
                    Ok(_) => "no reading".to_string(),
                    Err(e) => {
                        debug2!("reading of {} failed: {}", view.name, e);
                        "no reading".to_string()
                    }
                };
                if extended {
                    println!(
                        "{:<16} | {:02X}h | ok  | {:>3}.{:<3} | {}",
                        view.name, view.sensor_num, view.entity_id, view.entity_instance, reading
                    );
                } else {
                    println!("{:<16} | {:<17} | ok", view.name, reading);
                }
            }
            SDR_RECORD_TYPE_FRU_DEVICE_LOCATOR if extended => {
                println!(
                    "{:<16} | {:02X}h | ok  | {:>3}.{:<3} | {}",
                    id_string(&record, 15),
                    record.get(6).copied().unwrap_or(0),
                    record.get(12).copied().unwrap_or(0),
                    record.get(13).copied().unwrap_or(0),
                    get_sdr_record_type_name(header.record_type)
                );
            }
            SDR_RECORD_TYPE_MC_DEVICE_LOCATOR if extended => {
                println!(
                    "{:<16} | 00h | ok  | {:>3}.{:<3} | {}",
                    id_string(&record, 15),
                    record.get(12).copied().unwrap_or(0),
                    record.get(13).copied().unwrap_or(0),
                    get_sdr_record_type_name(header.record_type)
                );
            }
            other => {
                debug3!(
                    "skipping record 0x{:04x} ({})",
                    header.record_id,
                    get_sdr_record_type_name(other)
                );
            }
        }
        if next == SDR_LAST_RECORD_ID {
            break;
        }
        record_id = next;
    }
    Ok(())
}
