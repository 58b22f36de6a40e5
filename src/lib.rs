//
// lib.rs
//

pub mod action;
pub mod codec;
pub mod console;
pub mod drivers;
pub mod filter;
pub mod format;
pub mod frame;
pub mod utils;

use clap::{Parser, Subcommand};

/// Capabilities of the CAN controller behind the character device.
/// Flag bits outside these capabilities are ignored when decoding
/// and never produced when encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusOptions {
    pub extended_ids: bool,
    pub error_reports: bool,
}

impl Default for BusOptions {
    fn default() -> Self {
        BusOptions { extended_ids: true, error_reports: true }
    }
}

/// etctools provides the board bring-up and driver test utilities
#[derive(Parser, Debug)]
#[command(version, about = "ETCetera board diagnostic tools")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

/// Tool to run
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive CAN driver exerciser
    Cantest(action::cantest::Args),
    /// DRS servo positioning test
    Drstest(action::BoardArgs),
    /// Throttle body duty-cycle test
    Etbtest(action::BoardArgs),
    /// Enable the wheel speed sensor feeds
    Wsstest(action::BoardArgs),
    /// Dyno automation helper
    Dynohelper,
}
