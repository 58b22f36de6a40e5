//
// abi.rs
//

// Request codes and payload layouts of the board's driver interfaces.
// Requests are base | function; layouts are shared with the firmware,
// so field order and sizes are load-bearing.

use crate::drivers::BoardCmd;
use crate::filter::MaskFilter;

use libc::{c_ulong, timespec};

use std::time::Duration;

const CAN_BASE: c_ulong = 0x1500;
const BOARD_USER_BASE: c_ulong = 0x8000;

pub const CANIOC_RTR: c_ulong = CAN_BASE | 0x01;
pub const CANIOC_ADD_STDFILTER: c_ulong = CAN_BASE | 0x06;
pub const CANIOC_DEL_STDFILTER: c_ulong = CAN_BASE | 0x07;
pub const CANIOC_ADD_EXTFILTER: c_ulong = CAN_BASE | 0x08;
pub const CANIOC_DEL_EXTFILTER: c_ulong = CAN_BASE | 0x09;

/// Filter type selector. Only mask filters are used here.
pub const CAN_FILTER_MASK: u8 = 0;

/// `CANIOC_ADD_STDFILTER` payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StdFilterIoc {
    pub sf_id1: u16,
    pub sf_id2: u16,
    pub sf_type: u8,
    pub sf_prio: u8,
}

impl StdFilterIoc {
    pub fn from_filter(filter: &MaskFilter) -> StdFilterIoc {
        StdFilterIoc {
            sf_id1: filter.id_bits as u16,
            sf_id2: filter.mask_bits as u16,
            sf_type: CAN_FILTER_MASK,
            sf_prio: 0,
        }
    }
}

/// `CANIOC_ADD_EXTFILTER` payload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtFilterIoc {
    pub xf_id1: u32,
    pub xf_id2: u32,
    pub xf_type: u8,
    pub xf_prio: u8,
}

impl ExtFilterIoc {
    pub fn from_filter(filter: &MaskFilter) -> ExtFilterIoc {
        ExtFilterIoc {
            xf_id1: filter.id_bits,
            xf_id2: filter.mask_bits,
            xf_type: CAN_FILTER_MASK,
            xf_prio: 0,
        }
    }
}

/// `CANIOC_RTR` payload. `ci_msg` points at a record buffer prefilled
/// with the request header; the driver overwrites it in place with the
/// response, or fails after `ci_timeout`.
#[repr(C)]
pub struct RtrIoc {
    pub ci_timeout: timespec,
    pub ci_msg: *mut u8,
}

pub fn timespec_from(duration: Duration) -> timespec {
    timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    }
}

pub fn board_request(cmd: BoardCmd) -> c_ulong {
    let function: c_ulong = match cmd {
        BoardCmd::DrsSetAngle => 0x01,
        BoardCmd::DrsStart => 0x02,
        BoardCmd::DrsStop => 0x03,
        BoardCmd::LinSenseEnable => 0x04,
        BoardCmd::ArmReady => 0x05,
        BoardCmd::EtbSetDuty => 0x06,
        BoardCmd::EtbStop => 0x07,
        BoardCmd::WssEnable => 0x08,
    };
    BOARD_USER_BASE | function
}
