//
// frame.rs
//

use bitflags::bitflags;
use embedded_can::{ExtendedId, Frame, Id, StandardId};

/// Payload capacity of a classic CAN frame.
pub const MAX_DATA_LEN: usize = 8;

bitflags! {
    /// Coarse error classes carried in the ID field of an error record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ErrorClass: u32 {
        const TX_TIMEOUT       = 1 << 0;
        const LOST_ARBITRATION = 1 << 1;
        const CONTROLLER       = 1 << 2;
        const PROTOCOL         = 1 << 3;
        const TRANSCEIVER      = 1 << 4;
        const NO_ACK           = 1 << 5;
        const BUS_OFF          = 1 << 6;
        const BUS_ERROR        = 1 << 7;
        const RESTARTED        = 1 << 8;
        const INTERNAL         = 1 << 9;
    }
}

bitflags! {
    /// Controller status detail carried in payload byte 1 of an error record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControllerStatus: u8 {
        const RX_OVERFLOW = 1 << 0;
        const TX_OVERFLOW = 1 << 1;
        const RX_WARNING  = 1 << 2;
        const TX_WARNING  = 1 << 3;
        const RX_PASSIVE  = 1 << 4;
        const TX_PASSIVE  = 1 << 5;
    }
}

bitflags! {
    /// Protocol violation detail carried in payload byte 2 of an error record.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ProtocolViolation: u8 {
        const BIT      = 1 << 0;
        const FORM     = 1 << 1;
        const STUFF    = 1 << 2;
        const BIT0     = 1 << 3;
        const BIT1     = 1 << 4;
        const OVERLOAD = 1 << 5;
        const ACTIVE   = 1 << 6;
        const TX       = 1 << 7;
    }
}

/// One CAN bus transaction as carried by the character device.
///
/// Unlike a plain CAN frame this keeps the declared DLC even when it
/// exceeds the 8-byte payload (the hardware clamps the payload, not the
/// DLC), and it can represent the driver's error reports, where the ID
/// is an [`ErrorClass`] mask and payload bytes 1 and 2 hold detail masks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameRecord {
    id: u32,
    extended: bool,
    remote: bool,
    error: bool,
    dlc: u8,
    data: [u8; MAX_DATA_LEN],
}

impl FrameRecord {
    /// Builds a record from decoded wire fields. The ID is masked to the
    /// width selected by `extended` so that `id()` is always in range.
    pub(crate) fn from_wire(
        id: u32,
        dlc: u8,
        remote: bool,
        error: bool,
        extended: bool,
        data: &[u8],
    ) -> Self {
        let id = if extended {
            id & ExtendedId::MAX.as_raw()
        } else {
            id & u32::from(StandardId::MAX.as_raw())
        };

        let mut payload = [0u8; MAX_DATA_LEN];
        let n = data.len().min(MAX_DATA_LEN);
        payload[..n].copy_from_slice(&data[..n]);

        FrameRecord { id, extended, remote, error, dlc, data: payload }
    }

    /// Creates an error report record. The driver sends these with a full
    /// DLC; byte 1 carries the controller status and byte 2 the protocol
    /// violation detail.
    pub fn new_error(
        classes: ErrorClass,
        controller: ControllerStatus,
        protocol: ProtocolViolation,
    ) -> Self {
        let mut data = [0u8; MAX_DATA_LEN];
        data[1] = controller.bits();
        data[2] = protocol.bits();

        FrameRecord {
            id: classes.bits(),
            extended: false,
            remote: false,
            error: true,
            dlc: MAX_DATA_LEN as u8,
            data,
        }
    }

    /// The ID field without interpretation (for error records this is the
    /// raw class mask).
    pub fn raw_id(&self) -> u32 {
        self.id
    }

    pub fn is_error_report(&self) -> bool {
        self.error
    }

    /// Number of payload bytes actually present on the wire. The declared
    /// DLC may be larger; the hardware clamps at [`MAX_DATA_LEN`].
    pub fn payload_len(&self) -> usize {
        usize::from(self.dlc).min(MAX_DATA_LEN)
    }

    pub fn error_classes(&self) -> ErrorClass {
        ErrorClass::from_bits_truncate(self.id)
    }

    pub fn controller_status(&self) -> ControllerStatus {
        ControllerStatus::from_bits_truncate(self.data.get(1).copied().unwrap_or(0))
    }

    pub fn protocol_violation(&self) -> ProtocolViolation {
        ProtocolViolation::from_bits_truncate(self.data.get(2).copied().unwrap_or(0))
    }

    /// Raw payload storage, independent of frame kind. The wire encoder
    /// wants this; display code wants [`Frame::data`] instead.
    pub(crate) fn raw_data(&self) -> &[u8] {
        &self.data[..self.payload_len()]
    }
}

impl Frame for FrameRecord {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        if data.len() > MAX_DATA_LEN {
            return None;
        }

        let id: Id = id.into();

        let mut payload = [0u8; MAX_DATA_LEN];
        payload[..data.len()].copy_from_slice(data);

        Some(FrameRecord {
            id: raw_of(&id),
            extended: matches!(id, Id::Extended(_)),
            remote: false,
            error: false,
            dlc: data.len() as u8,
            data: payload,
        })
    }

    fn new_remote(id: impl Into<Id>, dlc: usize) -> Option<Self> {
        if dlc > MAX_DATA_LEN {
            return None;
        }

        let id: Id = id.into();

        Some(FrameRecord {
            id: raw_of(&id),
            extended: matches!(id, Id::Extended(_)),
            remote: true,
            error: false,
            dlc: dlc as u8,
            data: [0u8; MAX_DATA_LEN],
        })
    }

    fn id(&self) -> Id {
        // Masked on construction, so the conversions cannot fail.
        if self.extended {
            Id::Extended(ExtendedId::new(self.id).unwrap())
        } else {
            Id::Standard(StandardId::new(self.id as u16).unwrap())
        }
    }

    fn is_extended(&self) -> bool {
        self.extended
    }

    fn is_remote_frame(&self) -> bool {
        self.remote
    }

    fn dlc(&self) -> usize {
        usize::from(self.dlc)
    }

    /// Payload view. Empty for remote frames and error reports, whose
    /// payload bytes carry no message data.
    fn data(&self) -> &[u8] {
        if self.remote || self.error {
            &[]
        } else {
            &self.data[..self.payload_len()]
        }
    }
}

pub fn raw_of(id: &Id) -> u32 {
    match id {
        Id::Standard(id) => u32::from(id.as_raw()),
        Id::Extended(id) => id.as_raw(),
    }
}
