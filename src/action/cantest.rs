//
// cantest.rs
//

use crate::codec::{self, RecordStream, MAX_RECORD_LEN};
use crate::console::{self, Console};
use crate::drivers::{CanDevicePtr, RtrRequest};
use crate::filter::{self, FilterWidth};
use crate::format::RecordFormatter;
use crate::frame::FrameRecord;
use crate::BusOptions;

use clap::Parser;
use embedded_can::{ExtendedId, Id, StandardId};
use tokio::io::AsyncRead;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

const RECV_BUF_LEN: usize = 8 * MAX_RECORD_LEN;
const BURST_COUNT: u32 = 17;
const RTR_TIMEOUT: Duration = Duration::from_secs(10);

/// Arguments for the CAN driver test utility
#[derive(Debug, Parser)]
pub struct Args {
    /// CAN character device to open; defaults to the first /dev/can*
    #[arg(short = 'd', long = "dev")]
    pub dev: Option<PathBuf>,

    /// Treat the controller as standard-ID only
    #[arg(long = "no-extid")]
    pub no_extid: bool,

    /// Ignore the controller's error reporting flags
    #[arg(long = "no-error-frames")]
    pub no_error_frames: bool,
}

impl Args {
    pub fn bus_options(&self) -> BusOptions {
        BusOptions {
            extended_ids: !self.no_extid,
            error_reports: !self.no_error_frames,
        }
    }
}

pub async fn run(device: CanDevicePtr, opts: BusOptions) -> anyhow::Result<()> {
    menu(device, opts, &mut Console::stdin()).await
}

async fn menu<R: AsyncRead + Unpin>(
    mut device: CanDevicePtr,
    opts: BusOptions,
    console: &mut Console<R>,
) -> anyhow::Result<()> {
    loop {
        println!(
            "Type Q to quit or select a test to run:\n \
             1. Basic receive\n \
             2. Print setup info\n \
             3. Add standard filters\n \
             4. Add extended filters\n \
             5. Remove standard filters\n \
             6. Remove extended filters\n \
             7. Perform a remote-request-response transaction\n \
             8. Send a burst of TX messages\n \
             9. Test for can_poll() bug\n\n"
        );

        let selection = match console.prompt("Please select an option (1/2/3/4/5/6/7/8/9/Q): ").await? {
            Some(selection) => selection,
            None => break,
        };

        if console::is_quit(&selection) {
            println!("Quit.");
            break;
        }

        match selection.as_str() {
            "1" => receive(&mut device, opts, console).await?,
            "2" => println!("Not implemented yet."),
            "3" => add_filters(&mut device, FilterWidth::Standard, opts, console).await?,
            "4" => {
                if opts.extended_ids {
                    add_filters(&mut device, FilterWidth::Extended, opts, console).await?;
                } else {
                    println!("Extended ID support was disabled in this build.");
                }
            }
            "5" => remove_filters(&mut device, FilterWidth::Standard, opts, console).await?,
            "6" => remove_filters(&mut device, FilterWidth::Extended, opts, console).await?,
            "7" => rtr_transaction(&mut device, opts, console).await?,
            "8" => tx_burst(&mut device, opts).await,
            "9" => poll_bug(&mut device, opts, console).await?,
            _ => println!("Invalid selection."),
        }
    }

    Ok(())
}

/// Prints received frames until the user quits. Records arrive packed,
/// several to a read, so every read goes through the stream decoder.
async fn receive<R: AsyncRead + Unpin>(
    device: &mut CanDevicePtr,
    opts: BusOptions,
    console: &mut Console<R>,
) -> io::Result<()> {
    println!("Listening for CAN frames. Type Q to quit.");

    let mut buf = [0u8; RECV_BUF_LEN];
    loop {
        tokio::select! {
            biased;

            read = device.read(&mut buf) => match read {
                Ok(n) => {
                    for record in RecordStream::new(&buf[..n], opts) {
                        println!("{}", RecordFormatter::from(&record));
                    }
                }
                Err(err) => {
                    println!("read() of CAN device failed: {}", err);
                    break;
                }
            },

            line = console.next_line() => match line? {
                Some(line) if console::is_quit(&line) => {
                    println!("Quit.");
                    break;
                }
                Some(_) => {}
                None => break,
            },
        }
    }

    Ok(())
}

async fn add_filters<R: AsyncRead + Unpin>(
    device: &mut CanDevicePtr,
    width: FilterWidth,
    opts: BusOptions,
    console: &mut Console<R>,
) -> io::Result<()> {
    let kind = match width {
        FilterWidth::Standard => "Standard",
        FilterWidth::Extended => "Extended",
    };
    println!(
        "{} mask filter: enter a message ID as 1's and 0's with\n\
         don't cares represented by X's. (example: 11X001X)\n\
         Unspecified bits are treated as must-match leading zeros.",
        kind
    );

    loop {
        let line = match console.prompt("Enter a filter, or Q to quit: ").await? {
            Some(line) => line,
            None => break,
        };

        if console::is_quit(&line) {
            println!("Quit");
            break;
        }

        // A filter that does not compile is never submitted.
        let filter = match filter::compile(&line, width, opts) {
            Ok(filter) => filter,
            Err(err) => {
                println!("Error parsing mask: {}", err);
                continue;
            }
        };

        match device.add_filter(&filter) {
            Ok(slot) => println!("Added filter {}.", slot),
            Err(err) => {
                println!("Error adding filter: {}", err);
                break;
            }
        }
    }

    Ok(())
}

async fn remove_filters<R: AsyncRead + Unpin>(
    device: &mut CanDevicePtr,
    width: FilterWidth,
    opts: BusOptions,
    console: &mut Console<R>,
) -> io::Result<()> {
    if width == FilterWidth::Extended && !opts.extended_ids {
        println!("Extended ID support disabled in this build.");
        return Ok(());
    }

    let kind = match width {
        FilterWidth::Standard => "standard",
        FilterWidth::Extended => "extended",
    };
    println!(
        "Delete {} filter: enter the filter number returned when the\n\
         filter was added.",
        kind
    );

    loop {
        let line = match console.prompt("Enter a filter number, or Q to quit: ").await? {
            Some(line) => line,
            None => break,
        };

        if console::is_quit(&line) {
            println!("Quit");
            break;
        }

        let slot: i32 = match line.trim().parse() {
            Ok(slot) => slot,
            Err(_) => {
                println!("Not a valid filter number.");
                continue;
            }
        };

        match device.del_filter(width, slot) {
            Ok(()) => println!("Deleted filter."),
            Err(err) => {
                println!("Error deleting filter: {}", err);
                break;
            }
        }
    }

    Ok(())
}

async fn rtr_transaction<R: AsyncRead + Unpin>(
    device: &mut CanDevicePtr,
    opts: BusOptions,
    console: &mut Console<R>,
) -> io::Result<()> {
    loop {
        let line = match console
            .prompt(
                "Enter X for extended ID, S for standard ID, followed by the\n\
                 message ID in decimal. (e.g. S1520) Enter Q to quit: ",
            )
            .await?
        {
            Some(line) => line,
            None => break,
        };

        if console::is_quit(&line) {
            println!("Quit");
            break;
        }

        let id = match parse_request_id(&line, opts) {
            Ok(id) => id,
            Err(reason) => {
                println!("{}", reason);
                continue;
            }
        };

        let dlc_line = match console
            .prompt("Enter the data length code to request in decimal,\nor Q to quit: ")
            .await?
        {
            Some(line) => line,
            None => break,
        };

        if console::is_quit(&dlc_line) {
            break;
        }

        let dlc: u8 = match dlc_line.trim().parse() {
            Ok(dlc) if dlc <= 8 => dlc,
            Ok(_) => {
                println!("DLC too large.");
                continue;
            }
            Err(_) => {
                println!("Not a valid DLC");
                continue;
            }
        };

        println!("Sending request and waiting for response...");
        match device.rtr(RtrRequest { id, dlc, timeout: RTR_TIMEOUT }).await {
            Ok(response) => {
                println!("Response received:");
                println!("{}", RecordFormatter::from(&response));
            }
            Err(err) => println!("Request failed: {}", err),
        }
    }

    Ok(())
}

fn parse_request_id(line: &str, opts: BusOptions) -> Result<Id, &'static str> {
    let mut chars = line.chars();
    let extended = match chars.next() {
        Some('X') => {
            if !opts.extended_ids {
                return Err("Extended ID support disabled in this build.");
            }
            true
        }
        Some('S') => false,
        _ => return Err("Unexpected starting character."),
    };

    let digits = chars.as_str();
    if !digits.chars().next().map_or(false, |c| c.is_ascii_digit()) {
        return Err("Not a valid message ID.");
    }

    let raw: u64 = digits.parse().map_err(|_| "Not a valid message ID.")?;

    if extended {
        u32::try_from(raw)
            .ok()
            .and_then(ExtendedId::new)
            .map(Id::Extended)
            .ok_or("Extended message ID too large.")
    } else {
        u16::try_from(raw)
            .ok()
            .and_then(StandardId::new)
            .map(Id::Standard)
            .ok_or("Standard message ID too large.")
    }
}

/// Writes a burst of back-to-back frames in a single call so the TX
/// rate of the hardware can be measured.
async fn tx_burst(device: &mut CanDevicePtr, opts: BusOptions) {
    let mut burst = Vec::with_capacity(BURST_COUNT as usize * MAX_RECORD_LEN);
    for id in 0..BURST_COUNT {
        let record = FrameRecord::from_wire(id, 8, false, false, opts.extended_ids, &[0u8; 8]);
        codec::encode_record(&record, &mut burst);
    }

    match device.write(&burst).await {
        Ok(n) => println!("{} bytes written", n),
        Err(err) => println!("write() of CAN device failed: {}", err),
    }
}

/// Reproducer for a driver wakeup loss: a second handle sits in a
/// blocking read while the normal receive loop polls the device.
async fn poll_bug<R: AsyncRead + Unpin>(
    device: &mut CanDevicePtr,
    opts: BusOptions,
    console: &mut Console<R>,
) -> io::Result<()> {
    let clone = match device.try_clone() {
        Ok(clone) => clone,
        Err(err) => {
            println!("Error cloning CAN device handle: {}", err);
            return Ok(());
        }
    };

    let reader = tokio::spawn(async move {
        let mut device = clone;
        let mut buf = [0u8; MAX_RECORD_LEN];
        loop {
            if device.read(&mut buf).await.is_err() {
                break;
            }
        }
    });

    let result = receive(device, opts, console).await;
    reader.abort();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::mock::MockCanDevice;
    use embedded_can::Frame;
    use std::io::Cursor;

    fn scripted(input: &str) -> Console<Cursor<String>> {
        Console::new(Cursor::new(input.to_string()))
    }

    fn mock() -> (CanDevicePtr, std::sync::Arc<std::sync::Mutex<crate::drivers::mock::MockCanState>>)
    {
        let (device, state) = MockCanDevice::new();
        (Box::new(device), state)
    }

    fn record_bytes(record: &FrameRecord) -> Vec<u8> {
        let mut buf = Vec::new();
        codec::encode_record(record, &mut buf);
        buf
    }

    #[tokio::test]
    async fn receive_drains_reads_then_quits() {
        let (mut device, state) = mock();
        let mut buf = record_bytes(
            &FrameRecord::new(StandardId::new(0x123).unwrap(), &[1, 2]).unwrap(),
        );
        buf.extend(record_bytes(
            &FrameRecord::new_remote(StandardId::new(1520).unwrap(), 0).unwrap(),
        ));
        state.lock().unwrap().reads.push_back(Ok(buf));

        receive(&mut device, BusOptions::default(), &mut scripted("q\n"))
            .await
            .unwrap();

        assert!(state.lock().unwrap().reads.is_empty());
    }

    #[tokio::test]
    async fn receive_stops_on_read_error() {
        let (mut device, state) = mock();
        state
            .lock()
            .unwrap()
            .reads
            .push_back(Err(io::Error::from_raw_os_error(libc::EIO)));

        receive(&mut device, BusOptions::default(), &mut scripted(""))
            .await
            .unwrap();

        assert!(state.lock().unwrap().reads.is_empty());
    }

    #[tokio::test]
    async fn add_filters_submits_only_valid_compiles() {
        let (mut device, state) = mock();

        add_filters(
            &mut device,
            FilterWidth::Standard,
            BusOptions::default(),
            &mut scripted("11X001X\n20\n\nq\n"),
        )
        .await
        .unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.filters_added.len(), 1);
        assert_eq!(state.filters_added[0].id_bits, 0x062);
        assert_eq!(state.filters_added[0].mask_bits, 0x7EE);
    }

    #[tokio::test]
    async fn add_filters_stops_after_driver_error() {
        let (mut device, state) = mock();
        state.lock().unwrap().filter_error = Some(libc::EINVAL);

        add_filters(
            &mut device,
            FilterWidth::Standard,
            BusOptions::default(),
            &mut scripted("111\n101\nq\n"),
        )
        .await
        .unwrap();

        // The loop ends on the first driver failure, so the second
        // filter is never submitted.
        assert_eq!(state.lock().unwrap().filters_added.len(), 1);
    }

    #[tokio::test]
    async fn remove_filters_parses_slots() {
        let (mut device, state) = mock();

        remove_filters(
            &mut device,
            FilterWidth::Standard,
            BusOptions::default(),
            &mut scripted("0\nxyz\n2\nq\n"),
        )
        .await
        .unwrap();

        assert_eq!(
            state.lock().unwrap().filters_removed,
            vec![(FilterWidth::Standard, 0), (FilterWidth::Standard, 2)]
        );
    }

    #[tokio::test]
    async fn extended_removal_needs_extended_support() {
        let (mut device, state) = mock();
        let opts = BusOptions { extended_ids: false, error_reports: true };

        remove_filters(&mut device, FilterWidth::Extended, opts, &mut scripted("0\nq\n"))
            .await
            .unwrap();

        assert!(state.lock().unwrap().filters_removed.is_empty());
    }

    #[tokio::test]
    async fn menu_gates_extended_filter_entry() {
        let (device, state) = mock();
        let opts = BusOptions { extended_ids: false, error_reports: true };

        menu(device, opts, &mut scripted("4\nq\n")).await.unwrap();

        assert!(state.lock().unwrap().filters_added.is_empty());
    }

    #[tokio::test]
    async fn rtr_sends_request_and_reads_response() {
        let (mut device, state) = mock();
        state
            .lock()
            .unwrap()
            .rtr_responses
            .push_back(Ok(FrameRecord::new(StandardId::new(1520).unwrap(), &[9]).unwrap()));

        rtr_transaction(
            &mut device,
            BusOptions::default(),
            &mut scripted("S1520\n0\nq\n"),
        )
        .await
        .unwrap();

        let state = state.lock().unwrap();
        assert_eq!(
            state.rtr_requests,
            vec![RtrRequest {
                id: Id::Standard(StandardId::new(1520).unwrap()),
                dlc: 0,
                timeout: RTR_TIMEOUT,
            }]
        );
    }

    #[tokio::test]
    async fn rtr_quit_at_dlc_prompt_sends_nothing() {
        let (mut device, state) = mock();

        rtr_transaction(&mut device, BusOptions::default(), &mut scripted("S1\nq\n"))
            .await
            .unwrap();

        assert!(state.lock().unwrap().rtr_requests.is_empty());
    }

    #[test]
    fn request_id_validation() {
        let opts = BusOptions::default();
        assert_eq!(
            parse_request_id("S1520", opts),
            Ok(Id::Standard(StandardId::new(1520).unwrap()))
        );
        assert_eq!(
            parse_request_id("X70000", opts),
            Ok(Id::Extended(ExtendedId::new(70000).unwrap()))
        );
        assert_eq!(parse_request_id("Z1", opts), Err("Unexpected starting character."));
        assert_eq!(parse_request_id("S", opts), Err("Not a valid message ID."));
        assert_eq!(parse_request_id("Sx1", opts), Err("Not a valid message ID."));
        assert_eq!(parse_request_id("S2048", opts), Err("Standard message ID too large."));
        assert_eq!(
            parse_request_id("X536870912", opts),
            Err("Extended message ID too large.")
        );

        let no_ext = BusOptions { extended_ids: false, error_reports: true };
        assert_eq!(
            parse_request_id("X1", no_ext),
            Err("Extended ID support disabled in this build.")
        );
        assert!(parse_request_id("S1", no_ext).is_ok());
    }

    #[tokio::test]
    async fn tx_burst_writes_seventeen_extended_records() {
        let (mut device, state) = mock();

        tx_burst(&mut device, BusOptions::default()).await;

        let state = state.lock().unwrap();
        assert_eq!(state.written.len(), 17 * MAX_RECORD_LEN);

        let records: Vec<_> = RecordStream::new(&state.written, BusOptions::default()).collect();
        assert_eq!(records.len(), 17);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.raw_id(), i as u32);
            assert!(record.is_extended());
            assert_eq!(record.dlc(), 8);
            assert_eq!(record.data(), &[0u8; 8]);
        }
    }

    #[tokio::test]
    async fn tx_burst_uses_standard_ids_when_extid_disabled() {
        let (mut device, state) = mock();
        let opts = BusOptions { extended_ids: false, error_reports: true };

        tx_burst(&mut device, opts).await;

        let state = state.lock().unwrap();
        let records: Vec<_> = RecordStream::new(&state.written, opts).collect();
        assert_eq!(records.len(), 17);
        assert!(records.iter().all(|r| !r.is_extended()));
    }

    #[tokio::test]
    async fn menu_dispatches_and_quits() {
        let (device, state) = mock();

        menu(device, BusOptions::default(), &mut scripted("2\n8\nbogus\nq\n"))
            .await
            .unwrap();

        assert_eq!(state.lock().unwrap().written.len(), 17 * MAX_RECORD_LEN);
    }

    #[tokio::test]
    async fn poll_bug_fixture_still_quits_cleanly() {
        let (mut device, state) = mock();
        state.lock().unwrap().reads.push_back(Ok(record_bytes(
            &FrameRecord::new(StandardId::new(1).unwrap(), &[]).unwrap(),
        )));

        poll_bug(&mut device, BusOptions::default(), &mut scripted("q\n"))
            .await
            .unwrap();

        assert!(state.lock().unwrap().reads.is_empty());
    }
}
