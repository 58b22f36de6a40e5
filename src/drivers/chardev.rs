//
// chardev.rs
//

use crate::codec::{self, RecordStream, MAX_RECORD_LEN};
use crate::drivers::{abi, CanDevice, CanDevicePtr, RtrRequest};
use crate::filter::{FilterWidth, MaskFilter};
use crate::frame::FrameRecord;
use crate::BusOptions;

use async_trait::async_trait;
use embedded_can::Frame;
use tokio::io::unix::AsyncFd;
use tokio::task;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

/// CAN character device.
///
/// Opened read-write and nonblocking so receive can be multiplexed with
/// console input; reads and writes go through the readiness loop, the
/// control calls are plain ioctls on the same descriptor.
pub struct CanCharDevice {
    fd: AsyncFd<File>,
    opts: BusOptions,
}

impl CanCharDevice {
    pub fn open(path: &Path, opts: BusOptions) -> io::Result<CanCharDevice> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)?;
        log::debug!("opened CAN device {} on fd {}", path.display(), file.as_raw_fd());

        Ok(CanCharDevice { fd: AsyncFd::new(file)?, opts })
    }

    fn raw_fd(&self) -> libc::c_int {
        self.fd.get_ref().as_raw_fd()
    }
}

#[async_trait]
impl CanDevice for CanCharDevice {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.readable().await?;
            match guard.try_io(|fd| {
                let mut file = fd.get_ref();
                file.read(buf)
            }) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        loop {
            let mut guard = self.fd.writable().await?;
            match guard.try_io(|fd| {
                let mut file = fd.get_ref();
                file.write(buf)
            }) {
                Ok(result) => return result,
                Err(_would_block) => continue,
            }
        }
    }

    fn add_filter(&mut self, filter: &MaskFilter) -> io::Result<i32> {
        match filter.width {
            FilterWidth::Standard => {
                let mut ioc = abi::StdFilterIoc::from_filter(filter);
                check(unsafe { libc::ioctl(self.raw_fd(), abi::CANIOC_ADD_STDFILTER, &mut ioc) })
            }
            FilterWidth::Extended => {
                let mut ioc = abi::ExtFilterIoc::from_filter(filter);
                check(unsafe { libc::ioctl(self.raw_fd(), abi::CANIOC_ADD_EXTFILTER, &mut ioc) })
            }
        }
    }

    fn del_filter(&mut self, width: FilterWidth, slot: i32) -> io::Result<()> {
        let request = match width {
            FilterWidth::Standard => abi::CANIOC_DEL_STDFILTER,
            FilterWidth::Extended => abi::CANIOC_DEL_EXTFILTER,
        };
        check(unsafe { libc::ioctl(self.raw_fd(), request, slot as libc::c_ulong) })?;
        Ok(())
    }

    async fn rtr(&mut self, request: RtrRequest) -> io::Result<FrameRecord> {
        // The transaction blocks in the driver until the response or the
        // timeout, so it runs on a blocking thread with its own handle.
        let file = self.fd.get_ref().try_clone()?;
        let opts = self.opts;
        log::debug!("rtr request id {:?} dlc {}", request.id, request.dlc);

        task::spawn_blocking(move || rtr_blocking(&file, request, opts))
            .await
            .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?
    }

    fn try_clone(&self) -> io::Result<CanDevicePtr> {
        let file = self.fd.get_ref().try_clone()?;
        Ok(Box::new(CanCharDevice { fd: AsyncFd::new(file)?, opts: self.opts }))
    }
}

fn rtr_blocking(file: &File, request: RtrRequest, opts: BusOptions) -> io::Result<FrameRecord> {
    let template = FrameRecord::new_remote(request.id, usize::from(request.dlc))
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "requested DLC too large"))?;

    let mut msg = Vec::with_capacity(MAX_RECORD_LEN);
    codec::encode_record(&template, &mut msg);
    msg.resize(MAX_RECORD_LEN, 0);

    let mut ioc = abi::RtrIoc {
        ci_timeout: abi::timespec_from(request.timeout),
        ci_msg: msg.as_mut_ptr(),
    };
    check(unsafe { libc::ioctl(file.as_raw_fd(), abi::CANIOC_RTR, &mut ioc) })?;

    RecordStream::new(&msg, opts)
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidData, "malformed RTR response"))
}

fn check(ret: libc::c_int) -> io::Result<i32> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}
