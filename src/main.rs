//
// main.rs
//

use anyhow::Context;
use clap::Parser;

use etctools::action;
use etctools::drivers::board::BoardCharDevice;
use etctools::drivers::chardev::CanCharDevice;
use etctools::drivers::BoardControlPtr;
use etctools::utils;
use etctools::{Args, Command};

use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    match args.cmd {
        Command::Cantest(args) => {
            let opts = args.bus_options();
            let path = can_device_path(args.dev)?;
            println!("Opening CAN device {}.", path.display());

            let device = CanCharDevice::open(&path, opts)
                .with_context(|| format!("Failed to open CAN device {}", path.display()))?;

            action::cantest::run(Box::new(device), opts).await
        }
        Command::Drstest(args) => action::drstest::run(open_board(&args.dev)?).await,
        Command::Etbtest(args) => action::etbtest::run(open_board(&args.dev)?).await,
        Command::Wsstest(args) => action::wsstest::run(open_board(&args.dev)?).await,
        Command::Dynohelper => action::dynohelper::run().await,
    }
}

fn can_device_path(dev: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    match dev {
        Some(path) => Ok(path),
        None => utils::find_can_device()
            .context("Error searching for CAN devices in /dev")?
            .context("No CAN devices found in /dev"),
    }
}

fn open_board(path: &Path) -> anyhow::Result<BoardControlPtr> {
    let board = BoardCharDevice::open(path)
        .with_context(|| format!("Failed to open board control device {}", path.display()))?;
    Ok(Box::new(board))
}
