//
// mod.rs
//

pub mod cantest;
pub mod drstest;
pub mod dynohelper;
pub mod etbtest;
pub mod wsstest;

use clap::Parser;

use std::path::PathBuf;

/// Arguments shared by the board control test tools
#[derive(Debug, Parser)]
pub struct BoardArgs {
    /// Board control device to open
    #[arg(short = 'd', long = "dev", default_value = "/dev/etcboard")]
    pub dev: PathBuf,
}
