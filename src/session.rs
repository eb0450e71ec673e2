//! [`Session`] is an open bridge chip, and the main interface for
//! configuring it and moving bytes through it.
use crate::config::SessionConfig;
use crate::constants::{
    ALL_PINS_INPUT, DEFAULT_READ_DELAY, PURGE_BOTH, XOFF_CHAR, XON_CHAR,
};
use crate::directory::DeviceRecord;
use crate::driver::{D2xx, Driver, RawHandle};
use crate::error::{check, Error, NativeOp, Target};
use crate::{BitMode, EventFlags, FlowControl, LineProperties, SharedSession};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::cmp::min;
use std::thread::sleep;
use std::time::Duration;

/// Queue lengths and pending events, as reported by [`Session::status`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QueueStatus {
    /// Bytes received and waiting to be read
    pub rx_queue: u32,
    /// Bytes waiting to be transmitted
    pub tx_queue: u32,
    pub events: EventFlags,
}

/// An open bridge chip.
///
/// The session owns the native handle from [`Session::open`] until
/// [`Session::close`].  If the session is dropped while still open, the
/// handle is closed then, so the handle is released on every path out of
/// the code which opened it, including early returns on errors.
///
/// Once closed, every operation returns [`Error::UseAfterClose`], including
/// a second [`Session::close`].
///
/// All operations take `&mut self`, as the native layer doesn't promise a
/// single handle can be used from several threads at once.  To share a
/// session between threads use [`Session::into_shared`].  Distinct sessions
/// can be used concurrently.
///
/// # Example
///
/// ```rust,no_run
/// use d2xx::{list_devices, LineProperties};
///
/// let devices = list_devices().unwrap();
/// let mut session = devices[0].open().unwrap();
/// session.set_baud_rate(115_200).unwrap();
/// session.set_line_properties(LineProperties::default()).unwrap();
/// session.write(b"AT\r").unwrap();
///
/// let mut buf = [0u8; 64];
/// let read = session.read(&mut buf).unwrap();
/// println!("Got {:?}", &buf[..read]);
///
/// session.close().unwrap();
/// ```
#[derive(Debug)]
pub struct Session<'d, D: Driver + ?Sized = D2xx> {
    driver: &'d D,
    handle: Option<RawHandle>,
    index: u32,
    read_delay: Duration,
}

/// Lifecycle functions
impl<'d, D: Driver + ?Sized> Session<'d, D> {
    /// Opens the device described by `record`.
    ///
    /// # Errors
    /// [`Error::NativeCallFailed`] if the native open fails.  No session is
    /// created in that case.
    pub fn open(driver: &'d D, record: &DeviceRecord) -> Result<Self, Error> {
        Self::open_index(driver, record.index)
    }

    /// Opens the device at `index` in the most recent enumeration
    pub fn open_index(driver: &'d D, index: u32) -> Result<Self, Error> {
        trace!("Session::open_index index {index}");
        let mut handle: RawHandle = 0;
        check(NativeOp::Open, Target::Index(index), driver.open(index, &mut handle))
            .inspect_err(|e| warn!("{e}"))?;

        info!("Opened device {index} handle 0x{handle:x}");
        Ok(Session {
            driver,
            handle: Some(handle),
            index,
            read_delay: DEFAULT_READ_DELAY,
        })
    }

    /// Releases the native handle.
    ///
    /// The session is closed afterwards even if the native call fails, as
    /// the handle can't usefully be retried.
    ///
    /// # Errors
    /// [`Error::UseAfterClose`] if the session is already closed, or
    /// [`Error::NativeCallFailed`] if the native close fails.
    pub fn close(&mut self) -> Result<(), Error> {
        trace!("Session::close");
        let handle = self.handle.take().ok_or(Error::UseAfterClose {
            op: NativeOp::Close,
        })?;
        check(NativeOp::Close, Target::Handle(handle), self.driver.close(handle))
            .inspect_err(|e| warn!("{e} - abandoning handle"))?;
        info!("Closed device {} handle 0x{handle:x}", self.index);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// The native handle, or None once closed
    pub fn handle(&self) -> Option<RawHandle> {
        self.handle
    }

    /// The enumeration index this session was opened from
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Resets the device.  The handle stays open.
    pub fn reset(&mut self) -> Result<(), Error> {
        trace!("Session::reset");
        self.call(NativeOp::ResetDevice, |d, h| d.reset_device(h))
    }

    /// Resets the USB port the device is attached to.  The handle stays open.
    pub fn reset_port(&mut self) -> Result<(), Error> {
        trace!("Session::reset_port");
        self.call(NativeOp::ResetPort, |d, h| d.reset_port(h))
    }

    /// Flushes both the receive and transmit buffers
    pub fn purge(&mut self) -> Result<(), Error> {
        trace!("Session::purge");
        self.call(NativeOp::Purge, |d, h| d.purge(h, PURGE_BOTH))
    }

    /// Converts this session into one which can be shared between threads
    pub fn into_shared(self) -> SharedSession<'d, D> {
        SharedSession::new(self)
    }

    fn live_handle(&self, op: NativeOp) -> Result<RawHandle, Error> {
        self.handle.ok_or_else(|| {
            warn!("{op} attempted on closed session for device {}", self.index);
            Error::UseAfterClose { op }
        })
    }

    // Makes a native call which returns nothing but a status
    fn call(&mut self, op: NativeOp, f: impl FnOnce(&D, RawHandle) -> u32) -> Result<(), Error> {
        let handle = self.live_handle(op)?;
        check(op, Target::Handle(handle), f(self.driver, handle)).inspect_err(|e| warn!("{e}"))
    }
}

/// Configuration functions.  Each takes effect immediately.
///
/// Range limits documented here are enforced by the native layer, which
/// returns [`Error::NativeCallFailed`] for values it rejects.
impl<'d, D: Driver + ?Sized> Session<'d, D> {
    pub fn set_baud_rate(&mut self, baud_rate: u32) -> Result<(), Error> {
        trace!("Session::set_baud_rate {baud_rate}");
        self.call(NativeOp::SetBaudRate, |d, h| d.set_baud_rate(h, baud_rate))
    }

    /// Sets the event and error characters.  Passing
    /// [`crate::constants::CHAR_DISABLED`] for either disables it.
    pub fn set_chars(&mut self, event_char: u8, error_char: u8) -> Result<(), Error> {
        trace!("Session::set_chars event 0x{event_char:02x} error 0x{error_char:02x}");
        // Each char doubles as its own enable flag
        self.call(NativeOp::SetChars, |d, h| {
            d.set_chars(h, event_char, event_char, error_char, error_char)
        })
    }

    /// Sets the bit mode, with every pin configured as an input
    pub fn set_bit_mode(&mut self, mode: BitMode) -> Result<(), Error> {
        trace!("Session::set_bit_mode {mode}");
        self.call(NativeOp::SetBitMode, |d, h| {
            d.set_bit_mode(h, ALL_PINS_INPUT, mode.code())
        })
    }

    /// Sets flow control.  [`FlowControl::XonXoff`] always uses
    /// [`XON_CHAR`] and [`XOFF_CHAR`].
    pub fn set_flow_control(&mut self, flow_control: FlowControl) -> Result<(), Error> {
        trace!("Session::set_flow_control {flow_control}");
        self.call(NativeOp::SetFlowControl, |d, h| {
            d.set_flow_control(h, flow_control.code(), XON_CHAR, XOFF_CHAR)
        })
    }

    /// Sets the latency timer.  Valid between 2 and 255ms.
    pub fn set_latency_ms(&mut self, latency_ms: u8) -> Result<(), Error> {
        trace!("Session::set_latency_ms {latency_ms}");
        self.call(NativeOp::SetLatencyTimer, |d, h| {
            d.set_latency_timer(h, latency_ms)
        })
    }

    /// Sets the USB transfer sizes.  Valid between 64 bytes and 64KB, in
    /// 64 byte increments.
    pub fn set_transfer_size(&mut self, read_size: u32, write_size: u32) -> Result<(), Error> {
        trace!("Session::set_transfer_size read {read_size} write {write_size}");
        self.call(NativeOp::SetUsbParameters, |d, h| {
            d.set_usb_parameters(h, read_size, write_size)
        })
    }

    pub fn set_line_properties(&mut self, props: LineProperties) -> Result<(), Error> {
        trace!("Session::set_line_properties {props}");
        self.call(NativeOp::SetDataCharacteristics, |d, h| {
            d.set_data_characteristics(
                h,
                props.bits.code(),
                props.stop_bits.code(),
                props.parity.code(),
            )
        })
    }

    /// Sets the native read and write timeouts.  These are the only timeouts
    /// which apply to [`Session::read`] and [`Session::write`].
    ///
    /// Durations are truncated to whole milliseconds.
    pub fn set_timeouts(&mut self, read: Duration, write: Duration) -> Result<(), Error> {
        trace!("Session::set_timeouts read {read:?} write {write:?}");
        let read_ms = u32::try_from(read.as_millis()).unwrap_or(u32::MAX);
        let write_ms = u32::try_from(write.as_millis()).unwrap_or(u32::MAX);
        self.call(NativeOp::SetTimeouts, |d, h| {
            d.set_timeouts(h, read_ms, write_ms)
        })
    }

    /// The delay [`Session::read`] waits when fewer bytes are queued than
    /// requested
    pub fn read_delay(&self) -> Duration {
        self.read_delay
    }

    pub fn set_read_delay(&mut self, delay: Duration) {
        trace!("Session::set_read_delay {delay:?}");
        self.read_delay = delay;
    }

    /// Applies every setting present in `config`, stopping at the first
    /// failure.
    pub fn configure(&mut self, config: &SessionConfig) -> Result<(), Error> {
        trace!("Session::configure {config:?}");
        if let Some(mode) = config.bit_mode {
            self.set_bit_mode(mode)?;
        }
        if let Some(baud_rate) = config.baud_rate {
            self.set_baud_rate(baud_rate)?;
        }
        if let Some(props) = config.line_properties {
            self.set_line_properties(props)?;
        }
        if let Some(flow_control) = config.flow_control {
            self.set_flow_control(flow_control)?;
        }
        if let Some((event_char, error_char)) = config.chars {
            self.set_chars(event_char, error_char)?;
        }
        if let Some(latency_ms) = config.latency_ms {
            self.set_latency_ms(latency_ms)?;
        }
        if let Some((read_size, write_size)) = config.transfer_size {
            self.set_transfer_size(read_size, write_size)?;
        }
        if let Some((read, write)) = config.timeouts {
            self.set_timeouts(read, write)?;
        }
        self.set_read_delay(config.read_delay);
        if config.purge_on_open {
            self.purge()?;
        }
        Ok(())
    }
}

/// Status and data transfer functions
impl<'d, D: Driver + ?Sized> Session<'d, D> {
    /// Retrieves the receive and transmit queue lengths, and pending events
    pub fn status(&mut self) -> Result<QueueStatus, Error> {
        trace!("Session::status");
        let mut rx_queue = 0u32;
        let mut tx_queue = 0u32;
        let mut events = 0u32;
        self.call(NativeOp::GetStatus, |d, h| {
            d.get_status(h, &mut rx_queue, &mut tx_queue, &mut events)
        })?;
        Ok(QueueStatus {
            rx_queue,
            tx_queue,
            events: EventFlags(events),
        })
    }

    /// Reads up to `buffer.len()` bytes, returning how many were read.
    ///
    /// The native read can't be relied upon to block until the requested
    /// number of bytes arrive.  So this only asks the native layer for as
    /// many bytes as are already queued.  If that is fewer than requested,
    /// it first waits [`Session::read_delay`] to let the driver accumulate
    /// more - but still only reads the number queued before the wait.
    ///
    /// Short reads, including zero byte reads when nothing is queued, are
    /// normal.  Call again to collect more.  A zero byte read is not end of
    /// stream - an unplugged device is reported as an error instead (see
    /// [`Error::is_disconnect`]).
    ///
    /// # Returns
    /// * `Ok(usize)` - bytes read, between 0 and `buffer.len()`
    /// * `Err(Error)` - if the status query or the read fails
    pub fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Error> {
        let requested = buffer.len();
        trace!("Session::read buffer.len() {requested}");
        let handle = self.live_handle(NativeOp::Read)?;

        let queued = self.status()?.rx_queue as usize;
        let to_read = if requested > queued {
            debug!(
                "Requested {requested} bytes, {queued} queued - waiting {:?} then reading {queued}",
                self.read_delay
            );
            sleep(self.read_delay);
            queued
        } else {
            requested
        };

        let mut bytes_read = 0u32;
        let status = self
            .driver
            .read(handle, &mut buffer[..to_read], &mut bytes_read);
        check(NativeOp::Read, Target::Handle(handle), status).inspect_err(|e| warn!("{e}"))?;

        let bytes_read = bytes_read as usize;
        if bytes_read > to_read {
            warn!("Native layer reported reading {bytes_read} bytes, more than the {to_read} requested");
            return Ok(min(bytes_read, to_read));
        }
        trace!("Read {bytes_read} bytes");
        Ok(bytes_read)
    }

    /// Writes `buffer`, returning the number of bytes the native layer
    /// accepted.
    ///
    /// This is a single native write - a partial write is returned as is,
    /// and it is up to the caller to write the remainder.
    pub fn write(&mut self, buffer: &[u8]) -> Result<usize, Error> {
        trace!("Session::write buffer.len() {}", buffer.len());
        let handle = self.live_handle(NativeOp::Write)?;

        let mut bytes_written = 0u32;
        let status = self.driver.write(handle, buffer, &mut bytes_written);
        check(NativeOp::Write, Target::Handle(handle), status).inspect_err(|e| warn!("{e}"))?;

        if (bytes_written as usize) < buffer.len() {
            debug!(
                "Partial write of {bytes_written} of {} bytes",
                buffer.len()
            );
        }
        Ok(bytes_written as usize)
    }
}

/// Reads via [`Session::read`].  As an `Ok(0)` means end of stream to
/// [`std::io::Read`] users, a zero byte read into a non-empty buffer is
/// returned as [`std::io::ErrorKind::WouldBlock`] instead.
impl<'d, D: Driver + ?Sized> std::io::Read for Session<'d, D> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let read = Session::read(self, buf)?;
        if read == 0 && !buf.is_empty() {
            return Err(std::io::ErrorKind::WouldBlock.into());
        }
        Ok(read)
    }
}

impl<'d, D: Driver + ?Sized> std::io::Write for Session<'d, D> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(Session::write(self, buf)?)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'d, D: Driver + ?Sized> Drop for Session<'d, D> {
    fn drop(&mut self) {
        trace!("Session::drop");
        if self.handle.is_some() {
            debug!("Closing device {} on drop", self.index);
            // Ignoring errors since we're in drop
            let _ = self.close();
        }
    }
}
