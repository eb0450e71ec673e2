//! A small command line tool for poking at D2XX devices.
//!
//! * `list` - list attached devices
//! * `status` - show a device's queue lengths and pending events
//! * `write` - send text to a device
//! * `read` - read a number of bytes from a device, printing them as hex
//!
//! All logging is done to stderr and can be controlled via the `RUST_LOG`
//! environment variable.
use d2xx::{list_devices, Error, Session, SessionBuilder};

use clap::{Parser, Subcommand};
use env_logger;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and drive FTDI D2XX devices")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List attached devices
    List,

    /// Show queue status for a device
    Status {
        #[arg(short, long, default_value_t = 0)]
        index: u32,
    },

    /// Write text to a device
    Write {
        #[arg(short, long, default_value_t = 0)]
        index: u32,
        #[arg(short, long, default_value_t = 115_200)]
        baud: u32,
        text: String,
    },

    /// Read bytes from a device
    Read {
        #[arg(short, long, default_value_t = 0)]
        index: u32,
        #[arg(short, long, default_value_t = 115_200)]
        baud: u32,
        /// Number of bytes to read
        #[arg(short, long, default_value_t = 16)]
        count: usize,
        /// Give up after this many milliseconds
        #[arg(short, long, default_value_t = 1000)]
        timeout_ms: u64,
    },
}

fn list() -> Result<(), Error> {
    let devices = list_devices()?;
    if devices.is_empty() {
        println!("No devices found");
    }
    for device in devices {
        println!(
            "{:>3}  {:04x}:{:04x}  loc 0x{:04x}  {:<16} {}{}",
            device.index,
            device.vendor_id(),
            device.product_id(),
            device.location_id,
            device.serial_number,
            device.description,
            if device.is_opened() { " (open)" } else { "" },
        );
    }
    Ok(())
}

fn status(index: u32) -> Result<(), Error> {
    let mut session = SessionBuilder::new().index(index).build()?;
    let status = session.status()?;
    println!("rx queue: {}", status.rx_queue);
    println!("tx queue: {}", status.tx_queue);
    println!("events:   {}", status.events);
    session.close()
}

fn open(index: u32, baud: u32) -> Result<Session<'static>, Error> {
    SessionBuilder::new()
        .index(index)
        .baud_rate(baud)
        .build()
}

fn write(index: u32, baud: u32, text: &str) -> Result<(), Error> {
    let mut session = open(index, baud)?;
    let mut remaining = text.as_bytes();
    while !remaining.is_empty() {
        let written = session.write(remaining)?;
        debug!("Wrote {written} bytes");
        if written == 0 {
            warn!("Device accepted no bytes - giving up");
            break;
        }
        remaining = &remaining[written..];
    }
    println!("Wrote {} bytes", text.len() - remaining.len());
    session.close()
}

fn read(index: u32, baud: u32, count: usize, timeout: Duration) -> Result<(), Error> {
    let mut session = open(index, baud)?;
    let mut buf = vec![0u8; count];
    let mut filled = 0;
    let start = Instant::now();
    while filled < count && start.elapsed() < timeout {
        filled += session.read(&mut buf[filled..])?;
    }
    if filled < count {
        warn!("Timed out after reading {filled} of {count} bytes");
    }
    let hex: Vec<String> = buf[..filled].iter().map(|b| format!("{b:02x}")).collect();
    println!("{}", hex.join(" "));
    session.close()
}

fn execute(args: Args) -> Result<(), Error> {
    match args.command {
        Command::List => list(),
        Command::Status { index } => status(index),
        Command::Write { index, baud, text } => write(index, baud, &text),
        Command::Read {
            index,
            baud,
            count,
            timeout_ms,
        } => read(index, baud, count, Duration::from_millis(timeout_ms)),
    }
}

fn main() {
    env_logger::builder().init();
    let args = Args::parse();
    trace!("{args:?}");

    match execute(args) {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            error!("Error: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(e.to_errno());
        }
    }
}
