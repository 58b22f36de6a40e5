//
// codec.rs
//

use crate::frame::{FrameRecord, MAX_DATA_LEN};
use crate::BusOptions;

use embedded_can::Frame;

/// Bytes in a frame record before the payload: 32-bit ID plus info byte.
pub const HEADER_LEN: usize = 5;

/// Wire size of a record carrying a full payload.
pub const MAX_RECORD_LEN: usize = HEADER_LEN + MAX_DATA_LEN;

const DLC_MASK: u8 = 0x0F;
const RTR_BIT: u8 = 1 << 4;
const ERROR_BIT: u8 = 1 << 5;
const EXTENDED_BIT: u8 = 1 << 6;

/// Total wire length of a record with the given declared DLC.
///
/// DLC values above eight clamp to eight for length purposes; the
/// declared value survives only in the header.
pub fn record_len(dlc: u8) -> usize {
    HEADER_LEN + usize::from(dlc).min(MAX_DATA_LEN)
}

/// Decodes the record at the front of `buf`, returning it together with
/// its wire length. `None` when the buffer holds no complete record.
fn decode_record(buf: &[u8], opts: BusOptions) -> Option<(FrameRecord, usize)> {
    if buf.len() < HEADER_LEN {
        return None;
    }

    let id = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let info = buf[4];
    let dlc = info & DLC_MASK;

    let len = record_len(dlc);
    if buf.len() < len {
        return None;
    }

    let remote = info & RTR_BIT != 0;
    let error = opts.error_reports && info & ERROR_BIT != 0;
    let extended = opts.extended_ids && info & EXTENDED_BIT != 0;

    let record = FrameRecord::from_wire(id, dlc, remote, error, extended, &buf[HEADER_LEN..len]);
    Some((record, len))
}

/// Appends the wire image of `record` to `out`, returning the number of
/// bytes written.
pub fn encode_record(record: &FrameRecord, out: &mut Vec<u8>) -> usize {
    let mut info = (record.dlc() as u8) & DLC_MASK;
    if record.is_remote_frame() {
        info |= RTR_BIT;
    }
    if record.is_error_report() {
        info |= ERROR_BIT;
    }
    if record.is_extended() {
        info |= EXTENDED_BIT;
    }

    out.extend_from_slice(&record.raw_id().to_le_bytes());
    out.push(info);
    out.extend_from_slice(record.raw_data());

    HEADER_LEN + record.raw_data().len()
}

/// Iterator over the packed frame records in one read() buffer.
///
/// Each record's offset is derived from the previous record's own DLC
/// field; there is no external index. The stream stops at the first
/// record that does not fit entirely inside the valid region, which
/// covers both the normal loop terminator and a truncated tail.
pub struct RecordStream<'a> {
    buf: &'a [u8],
    offset: usize,
    opts: BusOptions,
}

impl<'a> RecordStream<'a> {
    /// `buf` must be the valid region of the read, not the whole
    /// allocation: pass `&buf[..n]` for a read that returned `n`.
    pub fn new(buf: &'a [u8], opts: BusOptions) -> RecordStream<'a> {
        RecordStream { buf, offset: 0, opts }
    }
}

impl Iterator for RecordStream<'_> {
    type Item = FrameRecord;

    fn next(&mut self) -> Option<FrameRecord> {
        let (record, len) = decode_record(&self.buf[self.offset..], self.opts)?;
        self.offset += len;
        Some(record)
    }
}
