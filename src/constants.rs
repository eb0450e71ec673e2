//! Constants used in the D2XX binding
use std::time::Duration;

/// Native library

/// Environment variable which may be used to override the D2XX library path
pub const LIBRARY_ENV_VAR: &str = "D2XX_LIBRARY";
/// Default D2XX shared library name for this platform
#[cfg(target_os = "windows")]
pub const DEFAULT_LIBRARY_NAME: &str = "ftd2xx.dll";
/// Default D2XX shared library name for this platform
#[cfg(target_os = "macos")]
pub const DEFAULT_LIBRARY_NAME: &str = "libftd2xx.dylib";
/// Default D2XX shared library name for this platform
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
pub const DEFAULT_LIBRARY_NAME: &str = "libftd2xx.so";

/// Native status codes

/// The only native status value which signifies success
pub const FT_OK: u32 = 0;

/// Fixed-width native string fields

/// Size of the serial number buffer filled in by `FT_GetDeviceInfoDetail`
pub const SERIAL_NUMBER_LEN: usize = 16;
/// Size of the description buffer filled in by `FT_GetDeviceInfoDetail`
pub const DESCRIPTION_LEN: usize = 64;

/// Purge policy

/// Purge selector for the receive buffer
pub const PURGE_RX: u32 = 0x01;
/// Purge selector for the transmit buffer
pub const PURGE_TX: u32 = 0x02;
/// [`crate::Session::purge`] always flushes both buffers
pub const PURGE_BOTH: u32 = PURGE_RX | PURGE_TX;

/// Flow control policy

/// XON character used when software flow control is selected
pub const XON_CHAR: u8 = 0x11;
/// XOFF character used when software flow control is selected
pub const XOFF_CHAR: u8 = 0x13;

/// Bit mode policy

/// Pin direction mask passed alongside every bit mode - all pins input
pub const ALL_PINS_INPUT: u8 = 0x00;

/// Special characters

/// Passing this as the event or error character disables it
pub const CHAR_DISABLED: u8 = 0x00;

/// Latency timer range in milliseconds.  The native layer rejects values
/// outside it.
pub const MIN_LATENCY_MS: u8 = 2;
/// See [`MIN_LATENCY_MS`]
pub const MAX_LATENCY_MS: u8 = 255;

/// USB transfer sizes.  Must be a multiple of [`TRANSFER_SIZE_STEP`] within
/// the range.  The native layer rejects values outside it.
pub const MIN_TRANSFER_SIZE: u32 = 64;
/// See [`MIN_TRANSFER_SIZE`]
pub const MAX_TRANSFER_SIZE: u32 = 64 * 1024;
/// See [`MIN_TRANSFER_SIZE`]
pub const TRANSFER_SIZE_STEP: u32 = 64;

/// Timing

/// Delay inserted before a read which asks for more bytes than are queued,
/// giving the driver a chance to accumulate more data
pub const DEFAULT_READ_DELAY: Duration = Duration::from_millis(20);

/// Event flags reported by [`crate::Session::status`]

/// A character was received
pub const EVENT_RXCHAR: u32 = 0x01;
/// Modem status changed
pub const EVENT_MODEM_STATUS: u32 = 0x02;
/// Line status changed
pub const EVENT_LINE_STATUS: u32 = 0x04;

/// Device flags reported by enumeration

/// The device is already open
pub const FLAGS_OPENED: u32 = 0x01;
/// The device is high speed USB
pub const FLAGS_HIGH_SPEED: u32 = 0x02;
