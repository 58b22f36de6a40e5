//
// utils.rs
//

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

/// Picks the CAN character device to use when none was given on the
/// command line: the alphabetically first `can*` entry in /dev.
pub fn find_can_device() -> io::Result<Option<PathBuf>> {
    scan_can_devices(Path::new("/dev"))
}

fn scan_can_devices(dir: &Path) -> io::Result<Option<PathBuf>> {
    let mut devices = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        match entry.file_name().to_str() {
            Some(name) if is_can_name(name) => {}
            _ => continue,
        }
        if entry.file_type()?.is_char_device() {
            devices.push(entry.path());
        }
    }

    devices.sort();
    Ok(devices.into_iter().next())
}

fn is_can_name(name: &str) -> bool {
    name.starts_with("can")
}
