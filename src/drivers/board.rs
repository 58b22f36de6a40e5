//
// board.rs
//

use crate::drivers::{abi, BoardCmd, BoardControl};

use std::fs::{File, OpenOptions};
use std::io;
use std::os::fd::AsRawFd;
use std::path::Path;

/// Board control character device, normally /dev/etcboard.
pub struct BoardCharDevice {
    file: File,
}

impl BoardCharDevice {
    pub fn open(path: &Path) -> io::Result<BoardCharDevice> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        log::debug!("opened board device {} on fd {}", path.display(), file.as_raw_fd());

        Ok(BoardCharDevice { file })
    }
}

impl BoardControl for BoardCharDevice {
    fn command(&mut self, cmd: BoardCmd, arg: u32) -> io::Result<()> {
        log::debug!("board command {:?} arg {}", cmd, arg);

        let ret = unsafe {
            libc::ioctl(self.file.as_raw_fd(), abi::board_request(cmd), arg as libc::c_ulong)
        };
        if ret < 0 {
            Err(io::Error::last_os_error())
        } else {
            Ok(())
        }
    }
}
