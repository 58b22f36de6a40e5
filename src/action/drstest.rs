//
// drstest.rs
//

use crate::console::{self, Console};
use crate::drivers::{BoardCmd, BoardControlPtr};

use tokio::io::AsyncRead;

pub async fn run(board: BoardControlPtr) -> anyhow::Result<()> {
    menu(board, &mut Console::stdin()).await
}

async fn menu<R: AsyncRead + Unpin>(
    mut board: BoardControlPtr,
    console: &mut Console<R>,
) -> anyhow::Result<()> {
    loop {
        println!(
            "Type Q to quit or select a test to run:\n \
             1. Command 0 deg position (500us pulse)\n \
             2. Command 90 deg position (1100us pulse)\n \
             3. Command 180 deg position (1700us pulse)\n\n"
        );

        let selection = match console.prompt("Please select an option (1/2/3/Q): ").await? {
            Some(selection) => selection,
            None => break,
        };

        if console::is_quit(&selection) {
            println!("Quit.");
            break;
        }

        match selection.as_str() {
            "1" => command_angle(&mut board, 0),
            "2" => command_angle(&mut board, 90),
            "3" => command_angle(&mut board, 180),
            _ => println!("Invalid selection."),
        }
    }

    // The servo is left unpowered no matter how the menu ends.
    if let Err(err) = board.command(BoardCmd::DrsStop, 0) {
        println!("Error stopping DRS servo: {}", err);
    }

    Ok(())
}

fn command_angle(board: &mut BoardControlPtr, angle: u32) {
    if let Err(err) = board.command(BoardCmd::DrsSetAngle, angle) {
        println!("Error commanding DRS servo: {}", err);
        return;
    }

    if let Err(err) = board.command(BoardCmd::DrsStart, 0) {
        println!("Error commanding DRS servo: {}", err);
    }
}
