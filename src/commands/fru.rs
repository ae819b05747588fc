/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
//! FRU inventory access commands over a one-device write-back cache.

use crate::error::{IpmiError, IpmiResult};
use crate::ipmi::bus::FruInventory;
use crate::ipmi::context::ResponderContext;
use crate::{debug2, debug3};
use ipmi_macros::AsBytes;
use log::error;
use std::time::{Duration, Instant};

pub const FRU_DEVICE_ID_INVALID: u8 = 0xff;
const FRU_BLOCK_SIZE: usize = 8;
const FRU_HEADER_SIZE: usize = 8;
const FRU_ACCESS_BY_BYTE: u8 = 0x00;

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct FruDeviceRq {
    pub fru_id: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct ReadFruDataRq {
    pub fru_id: u8,
    pub offset: u16,
    pub count: u8,
}

#[derive(AsBytes, Debug, Default, Clone, Copy, PartialEq)]
pub struct FruAreaInfoRs {
    pub size: u16,
    pub access: u8,
}

/// Raw image of the last FRU device touched, plus a deferred commit.
#[derive(Debug)]
pub struct FruCache {
    device: Option<u8>,
    data: Vec<u8>,
    write_deadline: Option<Instant>,
    timeout: Duration,
}

impl FruCache {
    pub fn new(timeout: Duration) -> Self {
        Self {
            device: None,
            data: Vec::new(),
            write_deadline: None,
            timeout,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn has_pending_write(&self) -> bool {
        self.write_deadline.is_some()
    }

    /// Make `fru_id` the cached device, committing any pending write for
    /// the previous one first.
    pub fn load(&mut self, inventory: &mut dyn FruInventory, fru_id: u8) -> IpmiResult<()> {
        if self.device == Some(fru_id) {
            return Ok(());
        }
        self.flush(inventory)?;
        self.device = None;
        self.data.clear();

        let data = inventory.read_fru(fru_id).map_err(|e| {
            error!("reading FRU {} failed: {}", fru_id, e);
            e
        })?;
        debug2!("FRU {} cached, {} bytes", fru_id, data.len());
        self.device = Some(fru_id);
        self.data = data;
        Ok(())
    }

    pub fn flush(&mut self, inventory: &mut dyn FruInventory) -> IpmiResult<()> {
        if self.write_deadline.take().is_none() {
            return Ok(());
        }
        let Some(fru_id) = self.device else {
            return Ok(());
        };
        debug2!("committing FRU {} ({} bytes)", fru_id, self.data.len());
        inventory.write_fru(fru_id, &self.data).map_err(|e| {
            error!("error writing fru {}: {}", fru_id, e);
            e
        })
    }

    pub fn flush_expired(&mut self, inventory: &mut dyn FruInventory, now: Instant) {
        match self.write_deadline {
            Some(deadline) if now >= deadline => {
                if let Err(e) = self.flush(inventory) {
                    error!("deferred FRU write dropped: {}", e);
                }
            }
            _ => {}
        }
    }

    /// Commit pending data and forget the cached image.
    pub fn invalidate(&mut self, inventory: &mut dyn FruInventory) {
        if let Err(e) = self.flush(inventory) {
            error!("FRU write before cache reset failed: {}", e);
        }
        self.device = None;
        self.data.clear();
    }

    /// Patch the cached image. Returns true when the write reaches the
    /// end of the last area and was committed right away.
    pub fn write(
        &mut self,
        inventory: &mut dyn FruInventory,
        offset: usize,
        bytes: &[u8],
    ) -> IpmiResult<bool> {
        let end = offset + bytes.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[offset..end].copy_from_slice(bytes);

        if write_reaches_end(&self.data, end) {
            self.write_deadline = Some(Instant::now());
            if let Err(e) = self.flush(inventory) {
                // the next access reloads what the inventory actually holds
                self.device = None;
                self.data.clear();
                return Err(e);
            }
            Ok(true)
        } else {
            self.write_deadline = Some(Instant::now() + self.timeout);
            Ok(false)
        }
    }
}

/// Whether a write ending at `last_write` covers the last area named by the
/// common header. Multirecord areas are walked to their end-of-list record.
fn write_reaches_end(data: &[u8], last_write: usize) -> bool {
    if data.len() < FRU_HEADER_SIZE {
        return false;
    }
    // internal, chassis, board, product, multirecord offsets
    let multirecord = data[5] as usize;
    let mut last_start = data[1..=5].iter().copied().max().unwrap_or(0) as usize * FRU_BLOCK_SIZE;
    let mut area_len = 0usize;

    if multirecord != 0 {
        loop {
            let (Some(flags), Some(len)) = (data.get(last_start + 1), data.get(last_start + 2))
            else {
                return false;
            };
            area_len = *len as usize + 5;
            if flags & 0x80 != 0 {
                break;
            }
            last_start += area_len;
        }
    } else if last_write > last_start + 1 {
        area_len = data.get(last_start + 1).copied().unwrap_or(0) as usize * FRU_BLOCK_SIZE;
    }
    last_write >= last_start + area_len
}

fn check_device(fru_id: u8) -> IpmiResult<()> {
    if fru_id == FRU_DEVICE_ID_INVALID {
        return Err(IpmiError::InvalidField(format!("FRU device id 0x{:02x}", fru_id)));
    }
    Ok(())
}

/// Get FRU Inventory Area Info: `[size lsb, size msb, access type]`.
pub fn ipmi_storage_get_fru_inv_area_info(
    ctx: &mut ResponderContext,
    data: &[u8],
) -> IpmiResult<Vec<u8>> {
    let rq = FruDeviceRq::from_le_bytes(data).map_err(|_| IpmiError::ReqDataLenInvalid)?;
    check_device(rq.fru_id)?;
    ctx.load_fru(rq.fru_id)?;
    let size = ctx.fru_cache.data().len().min(u16::MAX as usize) as u16;
    Ok(FruAreaInfoRs {
        size,
        access: FRU_ACCESS_BY_BYTE,
    }
    .to_le_bytes())
}

/// Read FRU Data: `[count, data...]`.
pub fn ipmi_storage_read_fru_data(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let rq = ReadFruDataRq::from_le_bytes(data).map_err(|_| IpmiError::ReqDataLenInvalid)?;
    check_device(rq.fru_id)?;
    ctx.load_fru(rq.fru_id)?;

    let image = ctx.fru_cache.data();
    let offset = rq.offset as usize;
    let count = rq.count as usize;
    let len = if offset + count < image.len() {
        count
    } else if image.len() > offset {
        image.len() - offset
    } else {
        return Err(IpmiError::ReqDataLenExceeded);
    };

    let mut rsp = Vec::with_capacity(len + 1);
    rsp.push(len as u8);
    rsp.extend_from_slice(&image[offset..offset + len]);
    debug3!("FRU {} read {} bytes at {}", rq.fru_id, len, offset);
    Ok(rsp)
}

/// Write FRU Data: `[fru id, offset lsb, offset msb, data...]` -> `[count]`.
pub fn ipmi_storage_write_fru_data(ctx: &mut ResponderContext, data: &[u8]) -> IpmiResult<Vec<u8>> {
    if data.len() < 3 {
        return Err(IpmiError::ReqDataLenInvalid);
    }
    let fru_id = data[0];
    let offset = u16::from_le_bytes([data[1], data[2]]) as usize;
    let bytes = &data[3..];
    check_device(fru_id)?;
    ctx.load_fru(fru_id)?;

    let committed = ctx.write_fru(offset, bytes).map_err(|e| {
        IpmiError::InvalidField(format!("FRU {} commit failed: {}", fru_id, e))
    })?;
    debug2!(
        "FRU {} wrote {} bytes at {}{}",
        fru_id,
        bytes.len(),
        offset,
        if committed { ", committed" } else { "" }
    );
    Ok(vec![bytes.len().min(u8::MAX as usize) as u8])
}
