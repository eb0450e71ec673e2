//! [`D2xx`] binds the [`Driver`] trait to the vendor's D2XX shared library.
//!
//! Every entry point is resolved once, when the library is loaded, and the
//! resulting table is never modified.  The process-wide table is created on
//! first use by [`D2xx::global`] and lives until the process exits.
use crate::config::DriverConfig;
use crate::error::{Error, FtStatus, NativeOp};

use super::{Driver, RawDeviceDetail, RawHandle};

use libloading::Library;
#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use once_cell::sync::OnceCell;
use std::ffi::c_void;
use std::os::raw::c_int;

type FtHandle = *mut c_void;
type FtStatusCode = u32;

type CreateDeviceInfoListFn = unsafe extern "system" fn(*mut u32) -> FtStatusCode;
type GetDeviceInfoDetailFn = unsafe extern "system" fn(
    u32,
    *mut u32,
    *mut u32,
    *mut u32,
    *mut u32,
    *mut c_void,
    *mut c_void,
    *mut FtHandle,
) -> FtStatusCode;
type OpenFn = unsafe extern "system" fn(c_int, *mut FtHandle) -> FtStatusCode;
type HandleFn = unsafe extern "system" fn(FtHandle) -> FtStatusCode;
type HandleU32Fn = unsafe extern "system" fn(FtHandle, u32) -> FtStatusCode;
type HandleU32U32Fn = unsafe extern "system" fn(FtHandle, u32, u32) -> FtStatusCode;
type HandleU8Fn = unsafe extern "system" fn(FtHandle, u8) -> FtStatusCode;
type HandleU8U8Fn = unsafe extern "system" fn(FtHandle, u8, u8) -> FtStatusCode;
type HandleU8U8U8Fn = unsafe extern "system" fn(FtHandle, u8, u8, u8) -> FtStatusCode;
type SetCharsFn = unsafe extern "system" fn(FtHandle, u8, u8, u8, u8) -> FtStatusCode;
type SetFlowControlFn = unsafe extern "system" fn(FtHandle, u16, u8, u8) -> FtStatusCode;
type ReadFn = unsafe extern "system" fn(FtHandle, *mut c_void, u32, *mut u32) -> FtStatusCode;
type WriteFn = unsafe extern "system" fn(FtHandle, *const c_void, u32, *mut u32) -> FtStatusCode;
type GetStatusFn = unsafe extern "system" fn(FtHandle, *mut u32, *mut u32, *mut u32) -> FtStatusCode;

static GLOBAL: OnceCell<D2xx> = OnceCell::new();

/// The D2XX library and its bound entry points
pub struct D2xx {
    create_device_info_list: CreateDeviceInfoListFn,
    get_device_info_detail: GetDeviceInfoDetailFn,
    open: OpenFn,
    close: HandleFn,
    reset_device: HandleFn,
    reset_port: HandleFn,
    purge: HandleU32Fn,
    read: ReadFn,
    write: WriteFn,
    get_status: GetStatusFn,
    set_baud_rate: HandleU32Fn,
    set_chars: SetCharsFn,
    set_bit_mode: HandleU8U8Fn,
    set_flow_control: SetFlowControlFn,
    set_latency_timer: HandleU8Fn,
    set_usb_parameters: HandleU32U32Fn,
    set_data_characteristics: HandleU8U8U8Fn,
    set_timeouts: HandleU32U32Fn,

    // Must outlive the function pointers above
    _library: Library,
}

impl std::fmt::Debug for D2xx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("D2xx").finish_non_exhaustive()
    }
}

/// Resolve a single entry point, copying out the function pointer
///
/// # Safety
/// `T` must be the correct function pointer type for the symbol.
unsafe fn bind<T: Copy>(library: &Library, op: NativeOp) -> Result<T, Error> {
    trace!("Binding {op}");
    let symbol = library
        .get::<T>(op.symbol_name().as_bytes())
        .map_err(|e| Error::Library {
            message: format!("Failed to resolve {op}: {e}"),
        })?;
    Ok(*symbol)
}

impl D2xx {
    /// Loads the D2XX library and binds every entry point this crate uses.
    ///
    /// Most users want [`D2xx::global`] instead, which only loads the library
    /// once per process.
    ///
    /// # Errors
    /// [`Error::Library`] if the library can't be loaded, or lacks one of the
    /// entry points.
    pub fn load(config: &DriverConfig) -> Result<Self, Error> {
        let path = config.resolve_library_path();
        debug!("Loading D2XX library from {path:?}");

        // SAFETY: loading the library runs its initialisers, which is
        // unavoidable for a vendor driver
        let library = unsafe { Library::new(&path) }.map_err(|e| {
            warn!("Failed to load D2XX library {path:?}: {e}");
            Error::Library {
                message: format!("{}: {e}", path.display()),
            }
        })?;

        // SAFETY: each type alias matches the documented D2XX prototype
        let d2xx = unsafe {
            D2xx {
                create_device_info_list: bind(&library, NativeOp::CreateDeviceInfoList)?,
                get_device_info_detail: bind(&library, NativeOp::GetDeviceInfoDetail)?,
                open: bind(&library, NativeOp::Open)?,
                close: bind(&library, NativeOp::Close)?,
                reset_device: bind(&library, NativeOp::ResetDevice)?,
                reset_port: bind(&library, NativeOp::ResetPort)?,
                purge: bind(&library, NativeOp::Purge)?,
                read: bind(&library, NativeOp::Read)?,
                write: bind(&library, NativeOp::Write)?,
                get_status: bind(&library, NativeOp::GetStatus)?,
                set_baud_rate: bind(&library, NativeOp::SetBaudRate)?,
                set_chars: bind(&library, NativeOp::SetChars)?,
                set_bit_mode: bind(&library, NativeOp::SetBitMode)?,
                set_flow_control: bind(&library, NativeOp::SetFlowControl)?,
                set_latency_timer: bind(&library, NativeOp::SetLatencyTimer)?,
                set_usb_parameters: bind(&library, NativeOp::SetUsbParameters)?,
                set_data_characteristics: bind(&library, NativeOp::SetDataCharacteristics)?,
                set_timeouts: bind(&library, NativeOp::SetTimeouts)?,
                _library: library,
            }
        };

        info!("Loaded D2XX library from {path:?}");
        Ok(d2xx)
    }

    /// Returns the process-wide D2XX binding, loading it with the default
    /// [`DriverConfig`] on first use.
    ///
    /// A failed load is not cached - the next call tries again.
    pub fn global() -> Result<&'static Self, Error> {
        Self::init_global(&DriverConfig::default())
    }

    /// As [`D2xx::global`], but uses `config` if this call is the one which
    /// loads the library.  Has no effect if the library is already loaded.
    pub fn init_global(config: &DriverConfig) -> Result<&'static Self, Error> {
        GLOBAL.get_or_try_init(|| Self::load(config))
    }
}

fn to_native(handle: RawHandle) -> FtHandle {
    handle as FtHandle
}

// The native layer takes a DWORD length
fn native_len(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

// All calls below pass either values, or pointers to memory which is valid
// and correctly sized for the duration of the call.
impl Driver for D2xx {
    fn create_device_info_list(&self, num_devs: &mut u32) -> u32 {
        unsafe { (self.create_device_info_list)(num_devs) }
    }

    fn get_device_info_detail(&self, index: u32, detail: &mut RawDeviceDetail) -> u32 {
        let mut handle: FtHandle = std::ptr::null_mut();
        let status = unsafe {
            (self.get_device_info_detail)(
                index,
                &mut detail.flags,
                &mut detail.device_type,
                &mut detail.id,
                &mut detail.loc_id,
                detail.serial_number.as_mut_ptr() as *mut c_void,
                detail.description.as_mut_ptr() as *mut c_void,
                &mut handle,
            )
        };
        detail.handle = handle as RawHandle;
        status
    }

    fn open(&self, index: u32, handle: &mut RawHandle) -> u32 {
        let Ok(index) = c_int::try_from(index) else {
            return FtStatus::InvalidArgs.code();
        };
        let mut native: FtHandle = std::ptr::null_mut();
        let status = unsafe { (self.open)(index, &mut native) };
        *handle = native as RawHandle;
        status
    }

    fn close(&self, handle: RawHandle) -> u32 {
        unsafe { (self.close)(to_native(handle)) }
    }

    fn reset_device(&self, handle: RawHandle) -> u32 {
        unsafe { (self.reset_device)(to_native(handle)) }
    }

    fn reset_port(&self, handle: RawHandle) -> u32 {
        unsafe { (self.reset_port)(to_native(handle)) }
    }

    fn purge(&self, handle: RawHandle, mask: u32) -> u32 {
        unsafe { (self.purge)(to_native(handle), mask) }
    }

    fn read(&self, handle: RawHandle, buffer: &mut [u8], bytes_returned: &mut u32) -> u32 {
        unsafe {
            (self.read)(
                to_native(handle),
                buffer.as_mut_ptr() as *mut c_void,
                native_len(buffer.len()),
                bytes_returned,
            )
        }
    }

    fn write(&self, handle: RawHandle, buffer: &[u8], bytes_written: &mut u32) -> u32 {
        unsafe {
            (self.write)(
                to_native(handle),
                buffer.as_ptr() as *const c_void,
                native_len(buffer.len()),
                bytes_written,
            )
        }
    }

    fn get_status(
        &self,
        handle: RawHandle,
        rx_queue: &mut u32,
        tx_queue: &mut u32,
        events: &mut u32,
    ) -> u32 {
        unsafe { (self.get_status)(to_native(handle), rx_queue, tx_queue, events) }
    }

    fn set_baud_rate(&self, handle: RawHandle, baud_rate: u32) -> u32 {
        unsafe { (self.set_baud_rate)(to_native(handle), baud_rate) }
    }

    fn set_chars(
        &self,
        handle: RawHandle,
        event_char: u8,
        event_char_enabled: u8,
        error_char: u8,
        error_char_enabled: u8,
    ) -> u32 {
        unsafe {
            (self.set_chars)(
                to_native(handle),
                event_char,
                event_char_enabled,
                error_char,
                error_char_enabled,
            )
        }
    }

    fn set_bit_mode(&self, handle: RawHandle, mask: u8, mode: u8) -> u32 {
        unsafe { (self.set_bit_mode)(to_native(handle), mask, mode) }
    }

    fn set_flow_control(&self, handle: RawHandle, flow_control: u16, xon: u8, xoff: u8) -> u32 {
        unsafe { (self.set_flow_control)(to_native(handle), flow_control, xon, xoff) }
    }

    fn set_latency_timer(&self, handle: RawHandle, latency_ms: u8) -> u32 {
        unsafe { (self.set_latency_timer)(to_native(handle), latency_ms) }
    }

    fn set_usb_parameters(&self, handle: RawHandle, in_size: u32, out_size: u32) -> u32 {
        unsafe { (self.set_usb_parameters)(to_native(handle), in_size, out_size) }
    }

    fn set_data_characteristics(
        &self,
        handle: RawHandle,
        word_length: u8,
        stop_bits: u8,
        parity: u8,
    ) -> u32 {
        unsafe { (self.set_data_characteristics)(to_native(handle), word_length, stop_bits, parity) }
    }

    fn set_timeouts(&self, handle: RawHandle, read_timeout_ms: u32, write_timeout_ms: u32) -> u32 {
        unsafe { (self.set_timeouts)(to_native(handle), read_timeout_ms, write_timeout_ms) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_missing_library() {
        let config = DriverConfig {
            library_path: Some(PathBuf::from("/nonexistent/libftd2xx-missing.so")),
        };
        let result = D2xx::load(&config);
        assert!(matches!(result, Err(Error::Library { .. })));
    }

    #[test]
    fn test_native_len_saturates() {
        assert_eq!(native_len(10), 10);
        assert_eq!(native_len(usize::MAX), u32::MAX);
    }
}
