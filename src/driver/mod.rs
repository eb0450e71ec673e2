//! The [`Driver`] module is the seam between this crate and the D2XX native
//! layer.
//!
//! [`Driver`] mirrors the native entry points one method per call: each takes
//! the same arguments, fills in the same output parameters, and returns the
//! raw native status code (`0` for success).  Status checking, string
//! decoding and read compensation all live above this seam, in
//! [`crate::directory`] and [`crate::Session`].
//!
//! It is unlikely you need to implement this trait yourself - [`D2xx`] binds
//! it to the vendor library.  It exists so the native layer can be mocked
//! out for testing.

pub mod d2xx;
#[cfg(test)]
pub(crate) mod mock;

pub use d2xx::D2xx;

use crate::constants::{DESCRIPTION_LEN, SERIAL_NUMBER_LEN};

/// An opaque native device handle.  Only meaningful to the [`Driver`] which
/// produced it.
pub type RawHandle = usize;

/// Output fields of `FT_GetDeviceInfoDetail`, in native order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDeviceDetail {
    pub flags: u32,
    pub device_type: u32,
    pub id: u32,
    pub loc_id: u32,
    pub serial_number: [u8; SERIAL_NUMBER_LEN],
    pub description: [u8; DESCRIPTION_LEN],
    pub handle: RawHandle,
}

impl Default for RawDeviceDetail {
    fn default() -> Self {
        RawDeviceDetail {
            flags: 0,
            device_type: 0,
            id: 0,
            loc_id: 0,
            serial_number: [0u8; SERIAL_NUMBER_LEN],
            description: [0u8; DESCRIPTION_LEN],
            handle: 0,
        }
    }
}

/// The native D2XX entry points used by this crate.
///
/// Every method returns the native status code.  Output parameters are only
/// meaningful when that code is `0`.
///
/// Implementations must be safe to call from multiple threads for distinct
/// handles.  Calls for the same handle are serialized by [`crate::Session`]
/// requiring `&mut self`.
pub trait Driver: std::fmt::Debug + Send + Sync {
    /// `FT_CreateDeviceInfoList` - snapshot the attached devices and return
    /// how many there are
    fn create_device_info_list(&self, num_devs: &mut u32) -> u32;

    /// `FT_GetDeviceInfoDetail` - retrieve the details of the device at
    /// `index` in the most recent snapshot
    fn get_device_info_detail(&self, index: u32, detail: &mut RawDeviceDetail) -> u32;

    /// `FT_Open`
    fn open(&self, index: u32, handle: &mut RawHandle) -> u32;

    /// `FT_Close`
    fn close(&self, handle: RawHandle) -> u32;

    /// `FT_ResetDevice`
    fn reset_device(&self, handle: RawHandle) -> u32;

    /// `FT_ResetPort`
    fn reset_port(&self, handle: RawHandle) -> u32;

    /// `FT_Purge`
    fn purge(&self, handle: RawHandle, mask: u32) -> u32;

    /// `FT_Read` - requests exactly `buffer.len()` bytes
    fn read(&self, handle: RawHandle, buffer: &mut [u8], bytes_returned: &mut u32) -> u32;

    /// `FT_Write` - offers exactly `buffer.len()` bytes
    fn write(&self, handle: RawHandle, buffer: &[u8], bytes_written: &mut u32) -> u32;

    /// `FT_GetStatus`
    fn get_status(
        &self,
        handle: RawHandle,
        rx_queue: &mut u32,
        tx_queue: &mut u32,
        events: &mut u32,
    ) -> u32;

    /// `FT_SetBaudRate`
    fn set_baud_rate(&self, handle: RawHandle, baud_rate: u32) -> u32;

    /// `FT_SetChars`
    fn set_chars(
        &self,
        handle: RawHandle,
        event_char: u8,
        event_char_enabled: u8,
        error_char: u8,
        error_char_enabled: u8,
    ) -> u32;

    /// `FT_SetBitMode`
    fn set_bit_mode(&self, handle: RawHandle, mask: u8, mode: u8) -> u32;

    /// `FT_SetFlowControl`
    fn set_flow_control(&self, handle: RawHandle, flow_control: u16, xon: u8, xoff: u8) -> u32;

    /// `FT_SetLatencyTimer`
    fn set_latency_timer(&self, handle: RawHandle, latency_ms: u8) -> u32;

    /// `FT_SetUSBParameters`
    fn set_usb_parameters(&self, handle: RawHandle, in_size: u32, out_size: u32) -> u32;

    /// `FT_SetDataCharacteristics`
    fn set_data_characteristics(
        &self,
        handle: RawHandle,
        word_length: u8,
        stop_bits: u8,
        parity: u8,
    ) -> u32;

    /// `FT_SetTimeouts`
    fn set_timeouts(&self, handle: RawHandle, read_timeout_ms: u32, write_timeout_ms: u32) -> u32;
}
