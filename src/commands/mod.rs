/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use crate::error::{IpmiError, IpmiResult, IPMI_CC_OK};
use crate::ipmi::context::ResponderContext;
use crate::ipmi::ipmi::*;
use crate::{debug2, debug3};
use log::{error, warn};

pub mod fru;
pub mod sdr;
pub mod sel;
pub mod sensor;

/// Handler shared by every routed command.
pub type CommandHandler = fn(&mut ResponderContext, &[u8]) -> IpmiResult<Vec<u8>>;

fn lookup_handler(netfn: u8, cmd: u8) -> Option<(&'static str, CommandHandler)> {
    let handler: (&'static str, CommandHandler) = match (netfn, cmd) {
        (IPMI_NETFN_SE, IPMI_CMD_PLATFORM_EVENT) => ("Platform Event", sensor::ipmi_sen_platform_event),
        (IPMI_NETFN_SE, IPMI_CMD_GET_DEVICE_SDR) => ("Get Device SDR", sdr::ipmi_storage_get_sdr),
        (IPMI_NETFN_SE, IPMI_CMD_RESERVE_DEVICE_SDR_REPO) => {
            ("Reserve Device SDR Repository", sdr::ipmi_storage_reserve_sdr)
        }
        (IPMI_NETFN_SE, IPMI_CMD_SET_SENSOR_THRESHOLDS) => {
            ("Set Sensor Thresholds", sensor::ipmi_sen_set_sensor_thresholds)
        }
        (IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_THRESHOLDS) => {
            ("Get Sensor Thresholds", sensor::ipmi_sen_get_sensor_thresholds)
        }
        (IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_EVENT_ENABLE) => {
            ("Get Sensor Event Enable", sensor::ipmi_sen_get_sensor_event_enable)
        }
        (IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_EVENT_STATUS) => {
            ("Get Sensor Event Status", sensor::ipmi_sen_get_sensor_event_status)
        }
        (IPMI_NETFN_SE, IPMI_CMD_GET_SENSOR_READING) => {
            ("Get Sensor Reading", sensor::ipmi_sen_get_sensor_reading)
        }

        (IPMI_NETFN_STORAGE, IPMI_CMD_GET_FRU_INV_AREA_INFO) => {
            ("Get FRU Inventory Area Info", fru::ipmi_storage_get_fru_inv_area_info)
        }
        (IPMI_NETFN_STORAGE, IPMI_CMD_READ_FRU_DATA) => ("Read FRU Data", fru::ipmi_storage_read_fru_data),
        (IPMI_NETFN_STORAGE, IPMI_CMD_WRITE_FRU_DATA) => ("Write FRU Data", fru::ipmi_storage_write_fru_data),
        (IPMI_NETFN_STORAGE, IPMI_CMD_GET_SDR_REPO_INFO) => {
            ("Get SDR Repository Info", sdr::ipmi_storage_get_sdr_repo_info)
        }
        (IPMI_NETFN_STORAGE, IPMI_CMD_GET_SDR_REPO_ALLOC_INFO) => {
            ("Get SDR Repository Allocation Info", sdr::ipmi_storage_get_sdr_alloc_info)
        }
        (IPMI_NETFN_STORAGE, IPMI_CMD_RESERVE_SDR_REPO) => ("Reserve SDR Repository", sdr::ipmi_storage_reserve_sdr),
        (IPMI_NETFN_STORAGE, IPMI_CMD_GET_SDR) => ("Get SDR", sdr::ipmi_storage_get_sdr),
        (IPMI_NETFN_STORAGE, IPMI_CMD_GET_SEL_INFO) => ("Get SEL Info", sel::ipmi_storage_get_sel_info),
        (IPMI_NETFN_STORAGE, IPMI_CMD_RESERVE_SEL) => ("Reserve SEL", sel::ipmi_storage_reserve_sel),
        (IPMI_NETFN_STORAGE, IPMI_CMD_GET_SEL_ENTRY) => ("Get SEL Entry", sel::ipmi_storage_get_sel_entry),
        (IPMI_NETFN_STORAGE, IPMI_CMD_ADD_SEL_ENTRY) => ("Add SEL Entry", sel::ipmi_storage_add_sel_entry),
        (IPMI_NETFN_STORAGE, IPMI_CMD_CLEAR_SEL) => ("Clear SEL", sel::ipmi_storage_clear_sel),
        (IPMI_NETFN_STORAGE, IPMI_CMD_GET_SEL_TIME) => ("Get SEL Time", sel::ipmi_storage_get_sel_time),
        (IPMI_NETFN_STORAGE, IPMI_CMD_SET_SEL_TIME) => ("Set SEL Time", sel::ipmi_storage_set_sel_time),
        _ => return None,
    };
    Some(handler)
}

/// Run one request against the responder.
///
/// Timers are serviced first so an expired FRU write is committed before
/// the command sees the cache. Handler errors become completion codes;
/// unrouted commands get 0xC1.
pub fn dispatch(ctx: &mut ResponderContext, req: &IpmiRequest) -> IpmiResponse {
    ctx.tick();

    let Some((name, handler)) = lookup_handler(req.netfn, req.cmd) else {
        warn!(
            "unsupported command netfn 0x{:02x} cmd 0x{:02x}",
            req.netfn, req.cmd
        );
        return IpmiResponse::error(IpmiError::InvalidCommand.completion_code());
    };

    debug2!("{} (netfn 0x{:02x} cmd 0x{:02x})", name, req.netfn, req.cmd);
    debug3!("request data: {}", crate::helper::buf2str(&req.data));

    match handler(ctx, &req.data) {
        Ok(data) => {
            debug3!("response data: {}", crate::helper::buf2str(&data));
            IpmiResponse::ok(data)
        }
        Err(e) => {
            let ccode = e.completion_code();
            match e {
                IpmiError::Bus(_) | IpmiError::System(_) | IpmiError::Unspecified(_) => {
                    error!("{} failed: {} (ccode 0x{:02x})", name, e, ccode)
                }
                _ => debug2!("{} failed: {} (ccode 0x{:02x})", name, e, ccode),
            }
            IpmiResponse::error(ccode)
        }
    }
}

/// Dispatch a request and unwrap the completion code, for the CLI side.
pub fn sendrecv(ctx: &mut ResponderContext, netfn: u8, cmd: u8, data: &[u8]) -> IpmiResult<Vec<u8>> {
    let req = IpmiRequest::new(netfn, cmd).with_data(data);
    let rsp = dispatch(ctx, &req);
    if rsp.ccode != IPMI_CC_OK {
        return Err(IpmiError::CompletionCode(rsp.ccode));
    }
    Ok(rsp.data)
}
