//
// wsstest.rs
//

use crate::drivers::{BoardCmd, BoardControlPtr};

use anyhow::Context;

pub async fn run(mut board: BoardControlPtr) -> anyhow::Result<()> {
    println!("Enabling wheel speed feeds.");
    board
        .command(BoardCmd::WssEnable, 0)
        .context("failed to enable wheel speed sensor feeds")?;

    Ok(())
}
