/*
 * SPDX-FileCopyrightText: 2025 UnionTech Software Technology Co., Ltd.
 *
 * SPDX-License-Identifier: GPL-2.0-or-later
 */
use std::collections::HashMap;
use std::fmt;

// completion code -> description
type ValStrMap = HashMap<u8, &'static str>;

pub const IPMI_CC_OK: u8 = 0x00;
pub const IPMI_CC_INVALID_COMMAND: u8 = 0xc1;
pub const IPMI_CC_INVALID_RESERVATION: u8 = 0xc5;
pub const IPMI_CC_REQ_DATA_LEN_INVALID: u8 = 0xc7;
pub const IPMI_CC_REQ_DATA_LEN_EXCEEDED: u8 = 0xc8;
pub const IPMI_CC_BYTES_UNAVAILABLE: u8 = 0xca;
pub const IPMI_CC_SENSOR_INVALID: u8 = 0xcb;
pub const IPMI_CC_INVALID_FIELD: u8 = 0xcc;
pub const IPMI_CC_RESPONSE_ERROR: u8 = 0xce;
pub const IPMI_CC_UNSPECIFIED: u8 = 0xff;

pub fn val2str(val: u8, map: &ValStrMap) -> &'static str {
    map.get(&val).copied().unwrap_or("Unknown value")
}

lazy_static::lazy_static! {
    pub static ref COMPLETION_CODE_VALS: ValStrMap = {
        let mut m = HashMap::new();
        m.insert(0x00, "Command completed normally");
        m.insert(0xc0, "Node busy");
        m.insert(0xc1, "Invalid command");
        m.insert(0xc2, "Invalid command on LUN");
        m.insert(0xc3, "Timeout");
        m.insert(0xc4, "Out of space");
        m.insert(0xc5, "Reservation cancelled or invalid");
        m.insert(0xc6, "Request data truncated");
        m.insert(0xc7, "Request data length invalid");
        m.insert(0xc8, "Request data field length limit exceeded");
        m.insert(0xc9, "Parameter out of range");
        m.insert(0xca, "Cannot return number of requested data bytes");
        m.insert(0xcb, "Requested sensor, data, or record not found");
        m.insert(0xcc, "Invalid data field in request");
        m.insert(0xcd, "Command illegal for specified sensor or record type");
        m.insert(0xce, "Command response could not be provided");
        m.insert(0xd5, "Command not supported in present state");
        m.insert(0xff, "Unspecified error");
        m
    };
}

/// Errors raised while answering a sensor or storage command.
///
/// Every variant resolves to exactly one completion code, see
/// [`IpmiError::completion_code`].
#[derive(Debug, Clone, PartialEq)]
pub enum IpmiError {
    /// Raw completion code from a collaborator
    CompletionCode(u8),
    /// Command is not implemented or deliberately refused
    InvalidCommand,
    /// Reservation id is stale or was never issued
    InvalidReservation,
    /// Request payload has the wrong size
    ReqDataLenInvalid,
    /// Request reaches beyond the end of the addressed data
    ReqDataLenExceeded,
    /// Requested window cannot be returned
    BytesUnavailable,
    /// Sensor, record or log entry does not exist
    SensorNotFound(String),
    /// A request field is out of range
    InvalidField(String),
    /// Backend could not produce data
    ResponseError(String),
    /// Object bus call failed
    Bus(String),
    /// Log entry could not be interpreted
    Unspecified(String),
    /// File I/O
    System(String),
}

impl IpmiError {
    pub fn completion_code(&self) -> u8 {
        match self {
            IpmiError::CompletionCode(code) => *code,
            IpmiError::InvalidCommand => IPMI_CC_INVALID_COMMAND,
            IpmiError::InvalidReservation => IPMI_CC_INVALID_RESERVATION,
            IpmiError::ReqDataLenInvalid => IPMI_CC_REQ_DATA_LEN_INVALID,
            IpmiError::ReqDataLenExceeded => IPMI_CC_REQ_DATA_LEN_EXCEEDED,
            IpmiError::BytesUnavailable => IPMI_CC_BYTES_UNAVAILABLE,
            IpmiError::SensorNotFound(_) => IPMI_CC_SENSOR_INVALID,
            IpmiError::InvalidField(_) => IPMI_CC_INVALID_FIELD,
            IpmiError::ResponseError(_) | IpmiError::Bus(_) | IpmiError::System(_) => {
                IPMI_CC_RESPONSE_ERROR
            }
            IpmiError::Unspecified(_) => IPMI_CC_UNSPECIFIED,
        }
    }
}

impl fmt::Display for IpmiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.completion_code();
        let text = val2str(code, &COMPLETION_CODE_VALS);
        match self {
            IpmiError::CompletionCode(_)
            | IpmiError::InvalidCommand
            | IpmiError::InvalidReservation
            | IpmiError::ReqDataLenInvalid
            | IpmiError::ReqDataLenExceeded
            | IpmiError::BytesUnavailable => write!(f, "{} (0x{:02x})", text, code),
            IpmiError::SensorNotFound(msg)
            | IpmiError::InvalidField(msg)
            | IpmiError::ResponseError(msg)
            | IpmiError::Unspecified(msg) => write!(f, "{} (0x{:02x}): {}", text, code, msg),
            IpmiError::Bus(msg) => write!(f, "Bus error: {}", msg),
            IpmiError::System(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for IpmiError {}

impl From<std::io::Error> for IpmiError {
    fn from(error: std::io::Error) -> Self {
        IpmiError::System(error.to_string())
    }
}

pub type IpmiResult<T> = Result<T, IpmiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_codes() {
        assert_eq!(IpmiError::InvalidReservation.completion_code(), 0xc5);
        assert_eq!(IpmiError::InvalidField("x".into()).completion_code(), 0xcc);
        assert_eq!(IpmiError::Bus("down".into()).completion_code(), 0xce);
        assert_eq!(IpmiError::CompletionCode(0x01).completion_code(), 0x01);
    }

    #[test]
    fn test_display_uses_code_table() {
        let err = IpmiError::InvalidCommand;
        assert_eq!(err.to_string(), "Invalid command (0xc1)");
        assert_eq!(val2str(0x42, &COMPLETION_CODE_VALS), "Unknown value");
    }
}
