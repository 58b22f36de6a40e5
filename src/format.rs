//
// format.rs
//

use crate::frame::{ControllerStatus, ErrorClass, FrameRecord, ProtocolViolation};

use embedded_can::Frame;

use std::fmt;

const CONTROLLER_LABELS: [(ControllerStatus, &str); 6] = [
    (ControllerStatus::RX_OVERFLOW, "RX overflow"),
    (ControllerStatus::TX_OVERFLOW, "TX overflow"),
    (ControllerStatus::RX_WARNING, "RX warning level"),
    (ControllerStatus::TX_WARNING, "TX warning level"),
    (ControllerStatus::RX_PASSIVE, "RX passive level"),
    (ControllerStatus::TX_PASSIVE, "TX passive level"),
];

const PROTOCOL_LABELS: [(ProtocolViolation, &str); 8] = [
    (ProtocolViolation::BIT, "Single bit error"),
    (ProtocolViolation::FORM, "Framing format"),
    (ProtocolViolation::STUFF, "Bit-stuffing error"),
    (ProtocolViolation::BIT0, "Send dominant failed"),
    (ProtocolViolation::BIT1, "Send recessive failed"),
    (ProtocolViolation::OVERLOAD, "Bus overload"),
    (ProtocolViolation::ACTIVE, "Active error announcement"),
    (ProtocolViolation::TX, "General TX error"),
];

/// Display adapter for one received record.
///
/// Data and remote frames render on a single line; error reports render
/// as a multi-line [`ErrorReportFormatter`] block.
pub struct RecordFormatter<'a> {
    record: &'a FrameRecord,
}

impl<'a> From<&'a FrameRecord> for RecordFormatter<'a> {
    fn from(record: &'a FrameRecord) -> Self {
        RecordFormatter { record }
    }
}

impl fmt::Display for RecordFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;

        if record.is_error_report() {
            return ErrorReportFormatter::from(record).fmt(f);
        }

        let direction = if record.is_remote_frame() { "RMT" } else { "DAT" };
        let width = if record.is_extended() { "EXT" } else { "STD" };
        write!(f, "{} {} ID {} DLC {}", direction, width, record.raw_id(), record.dlc())?;

        if !record.is_remote_frame() {
            write!(f, " DATA")?;
            for byte in record.data() {
                write!(f, " {:02X}", byte)?;
            }
        }

        Ok(())
    }
}

/// Display adapter for the error report carried by an error record.
pub struct ErrorReportFormatter<'a> {
    record: &'a FrameRecord,
}

impl<'a> From<&'a FrameRecord> for ErrorReportFormatter<'a> {
    fn from(record: &'a FrameRecord) -> Self {
        ErrorReportFormatter { record }
    }
}

impl fmt::Display for ErrorReportFormatter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let record = self.record;

        if !record.is_error_report() {
            return write!(f, "Not an error frame.");
        }

        write!(f, "Error report:")?;

        let classes = record.error_classes();
        if classes.contains(ErrorClass::TX_TIMEOUT) {
            write!(f, "\n  TX timeout")?;
        }
        if classes.contains(ErrorClass::LOST_ARBITRATION) {
            write!(f, "\n  Lost arbitration")?;
        }
        if classes.contains(ErrorClass::CONTROLLER) {
            write!(f, "\n  Controller error(s): ")?;
            write_details(f, &controller_labels(record.controller_status()))?;
        }
        if classes.contains(ErrorClass::PROTOCOL) {
            write!(f, "\n  Protocol error(s): ")?;
            write_details(f, &protocol_labels(record.protocol_violation()))?;
        }
        if classes.contains(ErrorClass::TRANSCEIVER) {
            write!(f, "\n  Transceiver error")?;
        }
        if classes.contains(ErrorClass::NO_ACK) {
            write!(f, "\n  No ACK received")?;
        }
        if classes.contains(ErrorClass::BUS_OFF) {
            write!(f, "\n  Bus off")?;
        }
        if classes.contains(ErrorClass::BUS_ERROR) {
            write!(f, "\n  Bus error")?;
        }
        if classes.contains(ErrorClass::RESTARTED) {
            write!(f, "\n  Controller restarted")?;
        }
        if classes.contains(ErrorClass::INTERNAL) {
            write!(f, "\n  Stack-internal error")?;
        }

        Ok(())
    }
}

fn controller_labels(status: ControllerStatus) -> Vec<&'static str> {
    CONTROLLER_LABELS
        .iter()
        .filter(|(flag, _)| status.contains(*flag))
        .map(|&(_, label)| label)
        .collect()
}

fn protocol_labels(violation: ProtocolViolation) -> Vec<&'static str> {
    PROTOCOL_LABELS
        .iter()
        .filter(|(flag, _)| violation.contains(*flag))
        .map(|&(_, label)| label)
        .collect()
}

/// A detail line with no recognized bits reads "Unspecified".
fn write_details(f: &mut fmt::Formatter<'_>, labels: &[&str]) -> fmt::Result {
    if labels.is_empty() {
        write!(f, "Unspecified")
    } else {
        write!(f, "{}", labels.join(", "))
    }
}
