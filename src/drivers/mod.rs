//
// mod.rs
//

pub mod abi;
pub mod board;
pub mod chardev;
#[cfg(test)]
pub mod mock;

use crate::filter::{FilterWidth, MaskFilter};
use crate::frame::FrameRecord;

use async_trait::async_trait;
use embedded_can::Id;

use std::io;
use std::time::Duration;

/// Parameters for one remote-request-response transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtrRequest {
    pub id: Id,
    pub dlc: u8,
    pub timeout: Duration,
}

/// One opened CAN character device.
///
/// `read` returns raw bytes holding one or more packed frame records;
/// walking them is the decoder's job. The control calls mirror the
/// driver's request interface, so errors come back as [`io::Error`]
/// with the OS error code attached.
#[async_trait]
pub trait CanDevice {
    /// Reads a burst of packed records, returning the valid byte count.
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes packed records, returning the byte count accepted.
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize>;

    /// Installs a compiled mask filter and returns its hardware slot.
    fn add_filter(&mut self, filter: &MaskFilter) -> io::Result<i32>;

    /// Removes the filter previously returned from [`add_filter`].
    fn del_filter(&mut self, width: FilterWidth, slot: i32) -> io::Result<()>;

    /// Sends a remote request and waits for the matching response.
    async fn rtr(&mut self, request: RtrRequest) -> io::Result<FrameRecord>;

    /// Second handle onto the same underlying device.
    fn try_clone(&self) -> io::Result<CanDevicePtr>;
}

pub type CanDevicePtr = Box<dyn CanDevice + Sync + Send>;

/// Commands understood by the board control device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardCmd {
    DrsSetAngle,
    DrsStart,
    DrsStop,
    LinSenseEnable,
    ArmReady,
    EtbSetDuty,
    EtbStop,
    WssEnable,
}

/// Board-level control surface used by the actuator test tools.
pub trait BoardControl {
    fn command(&mut self, cmd: BoardCmd, arg: u32) -> io::Result<()>;
}

pub type BoardControlPtr = Box<dyn BoardControl + Sync + Send>;
