//
// etbtest.rs
//

use crate::console::{self, Console};
use crate::drivers::{BoardCmd, BoardControlPtr};

use tokio::io::AsyncRead;
use tokio::time;

use std::time::Duration;

const ARM_DELAY: Duration = Duration::from_secs(1);

pub async fn run(board: BoardControlPtr) -> anyhow::Result<()> {
    session(board, &mut Console::stdin()).await
}

async fn session<R: AsyncRead + Unpin>(
    mut board: BoardControlPtr,
    console: &mut Console<R>,
) -> anyhow::Result<()> {
    let result = tokio::select! {
        result = menu(&mut board, console) => result,
        signal = tokio::signal::ctrl_c() => signal.map_err(anyhow::Error::from),
    };

    // The throttle body must never be left driven, interrupt included.
    if let Err(err) = board.command(BoardCmd::EtbStop, 0) {
        println!("Error stopping throttle body: {}", err);
    }

    result
}

async fn menu<R: AsyncRead + Unpin>(
    board: &mut BoardControlPtr,
    console: &mut Console<R>,
) -> anyhow::Result<()> {
    println!("Enabling 5V0LIN_SENSE...");
    if let Err(err) = board.command(BoardCmd::LinSenseEnable, 0) {
        println!("5V0LIN_SENSE failed to start. Aborting: {}", err);
        return Ok(());
    }
    println!("5V0LIN_SENSE enabled successfully. Waiting 1 second to arm.");

    time::sleep(ARM_DELAY).await;

    if let Err(err) = board.command(BoardCmd::ArmReady, 0) {
        println!("Error arming throttle body: {}", err);
        return Ok(());
    }

    loop {
        println!("Type Q to quit or enter a duty cycle as a percentage:\n");

        let selection = match console.prompt("Please select an option (duty cycle/Q): ").await? {
            Some(selection) => selection,
            None => break,
        };

        if console::is_quit(&selection) {
            println!("Quit.");
            break;
        }

        let duty: u32 = match selection.trim().parse() {
            Ok(duty) if (1..=30).contains(&duty) => duty,
            _ => {
                println!("Invalid duty cycle. Duty cycle may not be >30.");
                continue;
            }
        };

        if let Err(err) = board.command(BoardCmd::EtbSetDuty, duty) {
            println!("Error setting duty cycle: {}", err);
        }
    }

    Ok(())
}
