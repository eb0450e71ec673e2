//! # d2xx
//!
//! This crate provides a Rust interface for FTDI USB-to-serial bridge chips,
//! via FTDI's D2XX native driver.  It lets you enumerate attached chips, open
//! one, configure its link parameters and move bytes through the resulting
//! serial channel.
//!
//! ## Overview
//!
//! The d2xx crate is structured around two main components:
//!
//! - The device directory - [`list_devices`] returns a [`DeviceRecord`] for
//!   each attached chip
//! - A [`Session`] - one opened chip, with configuration setters, a status
//!   query and read/write
//!
//! The typical flow is list, select, open, configure, read/write in a loop,
//! and close.  Every operation is a synchronous call into the native driver -
//! there are no background threads.
//!
//! ## Getting Started
//!
//! The recommended way to open a device is [`SessionBuilder`], which selects,
//! opens and configures it in one go.
//!
//! ```rust,no_run
//! use d2xx::{SessionBuilder, LineProperties};
//!
//! let mut session = SessionBuilder::new()
//!     .index(0)
//!     .baud_rate(115_200)
//!     .line_properties(LineProperties::default())
//!     .build()
//!     .unwrap();
//!
//! session.write(b"hello").unwrap();
//!
//! // No need to close the session, it will be closed when it goes out of
//! // scope
//! ```
//!
//! Or work from the directory directly:
//!
//! ```rust,no_run
//! use d2xx::{list_devices, Error};
//!
//! fn main() -> Result<(), Error> {
//!     for device in list_devices()? {
//!         println!("{}: {} {}", device.index, device.serial_number, device.description);
//!     }
//!
//!     let devices = list_devices()?;
//!     let mut session = devices[0].open()?;
//!     session.set_baud_rate(9600)?;
//!
//!     let mut buf = [0u8; 256];
//!     let read = session.read(&mut buf)?;
//!     println!("Read {read} bytes");
//!
//!     session.close()
//! }
//! ```
//!
//! ## Reading
//!
//! The native read call doesn't reliably block until the requested number of
//! bytes is available.  [`Session::read`] therefore only requests what is
//! already queued, waiting briefly first if that is less than asked for.  It
//! returns between zero and `buffer.len()` bytes - short reads are normal, and
//! a zero byte read doesn't mean end of stream.  Loop to collect a fixed
//! number of bytes.
//!
//! [`Session::write`] is likewise a single native write, which may accept
//! fewer bytes than offered.
//!
//! ## Error Handling
//!
//! The library uses a custom [`Error`] type that covers:
//!
//! - Native call failures, carrying the entry point, native status code and
//!   the handle or index involved
//! - Malformed strings returned by the native layer
//! - Use of a session after it has been closed
//! - Failure to load the D2XX library
//! - No device matching a [`SessionBuilder`] selection
//!
//! There is no end of stream signal.  An unplugged device shows up as a
//! native failure on the next call - use [`Error::is_disconnect`] to detect
//! it.
//!
//! ## The Native Library
//!
//! The D2XX library (`ftd2xx.dll`, `libftd2xx.so` or `libftd2xx.dylib`) is
//! loaded on first use and shared by the whole process.  Set the
//! `D2XX_LIBRARY` environment variable, or use [`DriverConfig`], to load it
//! from elsewhere.
//!
//! ## Thread Safety
//!
//! [`Session`] operations all take `&mut self`, so a session can only be used
//! by one thread at a time.  To share one, use [`Session::into_shared`] to get
//! a mutex-protected [`SharedSession`].  Different sessions, and
//! [`list_devices`], can be used concurrently.
//!
//! ## Logging
//!
//! The library uses the `log` crate for diagnostic output:
//!
//! - Warn: Native call failures
//! - Info: Devices being opened and closed, the library being loaded
//! - Debug: Read compensation decisions, partial writes
//! - Trace: Function entry and arguments
//!
//! To enable logging, use [`env_logger::init`](https://docs.rs/env_logger/latest/env_logger/index.html) and set the `RUST_LOG` environment variable.
//!
//! ## License
//!
//! This library is licensed under the GNU General Public License Version 3 (GPLv3).

pub mod builder;
pub mod config;
pub mod constants;
pub mod directory;
pub mod driver;
pub mod error;
pub mod params;
pub mod session;
pub mod shared;

pub use crate::builder::{DeviceSelector, SessionBuilder};
pub use crate::config::{DriverConfig, SessionConfig};
pub use crate::directory::{list_devices, list_devices_with, DeviceRecord};
pub use crate::driver::{D2xx, Driver, RawHandle};
pub use crate::error::{DeviceAccess, Error, FtStatus, NativeOp, StringField, Target};
pub use crate::params::{BitMode, DataBits, EventFlags, FlowControl, LineProperties, Parity, StopBits};
pub use crate::session::{QueueStatus, Session};
pub use crate::shared::SharedSession;
