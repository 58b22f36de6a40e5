//
// mock.rs
//

// Scriptable in-memory devices for the interaction loop tests. Reads
// pop from a queue and block forever once it runs dry, which lets a
// scripted console line end the loop the same way a user would.

use crate::drivers::{BoardCmd, BoardControl, CanDevice, CanDevicePtr, RtrRequest};
use crate::filter::{FilterWidth, MaskFilter};
use crate::frame::FrameRecord;

use async_trait::async_trait;

use std::collections::VecDeque;
use std::future;
use std::io;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct MockCanState {
    pub reads: VecDeque<io::Result<Vec<u8>>>,
    pub written: Vec<u8>,
    pub filters_added: Vec<MaskFilter>,
    pub filters_removed: Vec<(FilterWidth, i32)>,
    pub rtr_requests: Vec<RtrRequest>,
    pub rtr_responses: VecDeque<io::Result<FrameRecord>>,
    /// When set, every filter call fails with this raw OS error.
    pub filter_error: Option<i32>,
    pub next_slot: i32,
}

pub struct MockCanDevice {
    state: Arc<Mutex<MockCanState>>,
}

impl MockCanDevice {
    pub fn new() -> (MockCanDevice, Arc<Mutex<MockCanState>>) {
        let state = Arc::new(Mutex::new(MockCanState::default()));
        (MockCanDevice { state: state.clone() }, state)
    }
}

#[async_trait]
impl CanDevice for MockCanDevice {
    async fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let next = self.state.lock().unwrap().reads.pop_front();
        match next {
            Some(Ok(bytes)) => {
                let n = bytes.len().min(buf.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                Ok(n)
            }
            Some(Err(err)) => Err(err),
            None => future::pending().await,
        }
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.lock().unwrap().written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn add_filter(&mut self, filter: &MaskFilter) -> io::Result<i32> {
        let mut state = self.state.lock().unwrap();
        state.filters_added.push(*filter);
        if let Some(code) = state.filter_error {
            return Err(io::Error::from_raw_os_error(code));
        }
        let slot = state.next_slot;
        state.next_slot += 1;
        Ok(slot)
    }

    fn del_filter(&mut self, width: FilterWidth, slot: i32) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.filters_removed.push((width, slot));
        if let Some(code) = state.filter_error {
            return Err(io::Error::from_raw_os_error(code));
        }
        Ok(())
    }

    async fn rtr(&mut self, request: RtrRequest) -> io::Result<FrameRecord> {
        let mut state = self.state.lock().unwrap();
        state.rtr_requests.push(request);
        match state.rtr_responses.pop_front() {
            Some(result) => result,
            None => Err(io::Error::from_raw_os_error(libc::ETIMEDOUT)),
        }
    }

    fn try_clone(&self) -> io::Result<CanDevicePtr> {
        Ok(Box::new(MockCanDevice { state: self.state.clone() }))
    }
}

#[derive(Default)]
pub struct MockBoardState {
    pub commands: Vec<(BoardCmd, u32)>,
    /// When set, the named command fails with this raw OS error.
    pub fail_on: Option<(BoardCmd, i32)>,
}

pub struct MockBoard {
    state: Arc<Mutex<MockBoardState>>,
}

impl MockBoard {
    pub fn new() -> (MockBoard, Arc<Mutex<MockBoardState>>) {
        let state = Arc::new(Mutex::new(MockBoardState::default()));
        (MockBoard { state: state.clone() }, state)
    }
}

impl BoardControl for MockBoard {
    fn command(&mut self, cmd: BoardCmd, arg: u32) -> io::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.commands.push((cmd, arg));
        match state.fail_on {
            Some((failing, code)) if failing == cmd => Err(io::Error::from_raw_os_error(code)),
            _ => Ok(()),
        }
    }
}
