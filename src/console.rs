//
// console.rs
//

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines, Stdin};

use std::io::{self, Write};

/// Line input for the interactive menus.
///
/// Generic over the byte source so the menu loops can be driven from a
/// scripted buffer in tests; the binary uses [`Console::stdin`].
pub struct Console<R> {
    lines: Lines<BufReader<R>>,
}

impl Console<Stdin> {
    pub fn stdin() -> Console<Stdin> {
        Console::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin> Console<R> {
    pub fn new(input: R) -> Console<R> {
        Console { lines: BufReader::new(input).lines() }
    }

    /// Reads the next line, without its terminator. `None` once the
    /// input is exhausted.
    ///
    /// Cancellation safe, so it can sit in a select! against device
    /// reads without losing input.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.lines.next_line().await
    }

    /// Writes `text` as-is, flushes, and reads one line.
    pub async fn prompt(&mut self, text: &str) -> io::Result<Option<String>> {
        print!("{}", text);
        io::stdout().flush()?;
        self.next_line().await
    }
}

/// A lone Q, either case, quits every menu and entry loop.
pub fn is_quit(line: &str) -> bool {
    line.eq_ignore_ascii_case("q")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn lines_come_back_in_order_then_none() {
        let mut console = Console::new(Cursor::new("first\nsecond\n".to_string()));
        assert_eq!(console.next_line().await.unwrap(), Some("first".to_string()));
        assert_eq!(console.next_line().await.unwrap(), Some("second".to_string()));
        assert_eq!(console.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn carriage_returns_are_stripped() {
        let mut console = Console::new(Cursor::new("Q\r\n".to_string()));
        assert_eq!(console.next_line().await.unwrap(), Some("Q".to_string()));
    }

    #[test]
    fn quit_matches_either_case_exactly() {
        assert!(is_quit("q"));
        assert!(is_quit("Q"));
        assert!(!is_quit("quit"));
        assert!(!is_quit(" q"));
        assert!(!is_quit(""));
    }
}
