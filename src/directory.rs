//! Enumeration of the bridge chips currently attached to the host.
//!
//! Each call to [`list_devices`] takes a fresh snapshot from the native
//! layer.  Indices are only stable until the next snapshot, so open a device
//! from the records of the most recent listing.
use crate::constants::{FLAGS_HIGH_SPEED, FLAGS_OPENED};
use crate::driver::{D2xx, Driver, RawDeviceDetail, RawHandle};
use crate::error::{check, Error, NativeOp, StringField, Target};
use crate::Session;

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};

/// Information about one attached bridge chip, as reported by the native
/// layer.  Holds no native resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    /// Position in the enumeration this record came from.  Used to open the
    /// device.
    pub index: u32,
    pub flags: u32,
    pub device_type: u32,
    /// Vendor ID in the high 16 bits, product ID in the low 16 bits
    pub vendor_product_id: u32,
    pub location_id: u32,
    pub serial_number: String,
    pub description: String,
    /// Handle of the device if some other process or session has it open.
    /// Not used for opening.
    pub native_handle: RawHandle,
}

impl DeviceRecord {
    pub fn vendor_id(&self) -> u16 {
        (self.vendor_product_id >> 16) as u16
    }

    pub fn product_id(&self) -> u16 {
        (self.vendor_product_id & 0xffff) as u16
    }

    /// Whether the device was already open when enumerated
    pub fn is_opened(&self) -> bool {
        self.flags & FLAGS_OPENED != 0
    }

    pub fn is_high_speed(&self) -> bool {
        self.flags & FLAGS_HIGH_SPEED != 0
    }

    /// Opens this device via the process-wide D2XX library
    ///
    /// # Errors
    /// [`Error::Library`] if the library can't be loaded, or
    /// [`Error::NativeCallFailed`] if the device can't be opened.
    pub fn open(&self) -> Result<Session<'static, D2xx>, Error> {
        Session::open(D2xx::global()?, self)
    }

    fn from_raw(index: u32, raw: &RawDeviceDetail) -> Result<Self, Error> {
        Ok(DeviceRecord {
            index,
            flags: raw.flags,
            device_type: raw.device_type,
            vendor_product_id: raw.id,
            location_id: raw.loc_id,
            serial_number: decode_fixed_str(&raw.serial_number, StringField::SerialNumber, index)?,
            description: decode_fixed_str(&raw.description, StringField::Description, index)?,
            native_handle: raw.handle,
        })
    }
}

/// Decode a NUL-terminated, fixed-width native string field.
///
/// Bytes from the first NUL onwards are discarded.  Bytes which aren't valid
/// UTF-8 are replaced, as the native layer doesn't specify an encoding.
///
/// # Errors
/// [`Error::MalformedNativeString`] if there is no NUL within the buffer.
pub fn decode_fixed_str(buf: &[u8], field: StringField, index: u32) -> Result<String, Error> {
    match buf.iter().position(|&b| b == 0) {
        Some(end) => Ok(String::from_utf8_lossy(&buf[..end]).into_owned()),
        None => {
            warn!("Device {index} {field} is not NUL terminated");
            Err(Error::MalformedNativeString { field, index })
        }
    }
}

/// Lists attached devices using the process-wide D2XX library.
///
/// See [`list_devices_with`].
pub fn list_devices() -> Result<Vec<DeviceRecord>, Error> {
    list_devices_with(D2xx::global()?)
}

/// Lists attached devices, in native enumeration order.
///
/// Either every device is returned, or an error - a failure part way through
/// discards the records already decoded.
///
/// # Errors
/// [`Error::NativeCallFailed`] if either native call fails, or
/// [`Error::MalformedNativeString`] if a device's strings can't be decoded.
pub fn list_devices_with<D: Driver + ?Sized>(driver: &D) -> Result<Vec<DeviceRecord>, Error> {
    trace!("directory::list_devices");

    let mut count = 0u32;
    check(
        NativeOp::CreateDeviceInfoList,
        Target::DeviceList,
        driver.create_device_info_list(&mut count),
    )
    .inspect_err(|e| warn!("{e}"))?;
    debug!("Native layer reports {count} device(s)");

    let mut records = Vec::with_capacity(count as usize);
    for index in 0..count {
        let mut raw = RawDeviceDetail::default();
        check(
            NativeOp::GetDeviceInfoDetail,
            Target::Index(index),
            driver.get_device_info_detail(index, &mut raw),
        )
        .inspect_err(|e| warn!("{e}"))?;

        let record = DeviceRecord::from_raw(index, &raw)?;
        trace!("Found device {record:?}");
        records.push(record);
    }

    Ok(records)
}
