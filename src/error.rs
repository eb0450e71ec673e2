//! Error objects for the d2xx crate
use crate::constants::FT_OK;

use libc::{EBADF, EINVAL, EIO, ENODEV, ENOENT, ENOMEM};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error type for the d2xx crate
///
/// Note that a short read or write is not an error.  [`crate::Session::read`]
/// and [`crate::Session::write`] return the number of bytes actually
/// transferred, which may be fewer than requested.
#[derive(Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// A native D2XX entry point returned a non-zero status
    #[error("{op} failed for {target}: {status}")]
    NativeCallFailed {
        op: NativeOp,
        status: FtStatus,
        target: Target,
    },

    /// A fixed-width string field returned by the native layer had no NUL
    /// terminator
    #[error("Native layer returned {field} for device {index} without a NUL terminator")]
    MalformedNativeString { field: StringField, index: u32 },

    /// An operation was attempted on a [`crate::Session`] which has already
    /// been closed
    #[error("{op} attempted on a closed session")]
    UseAfterClose { op: NativeOp },

    /// The D2XX shared library, or one of its entry points, couldn't be
    /// loaded
    #[error("Failed to load the D2XX library: {message}")]
    Library { message: String },

    /// DeviceAccess holds errors locating a specific device
    #[error("{kind}")]
    DeviceAccess { kind: DeviceAccess },

    /// Invalid arguments passed to the d2xx library
    #[error("d2xx library called with invalid arguments: {message}")]
    Args { message: String },
}

/// Used to differentiate between different problems locating a device
#[derive(Debug, Error, PartialEq, Serialize, Deserialize)]
pub enum DeviceAccess {
    #[error("No D2XX devices are attached")]
    NoDevices,

    #[error("No D2XX device matching {selector} found - found {found} device(s)")]
    NotFound { selector: String, found: usize },
}

/// The native D2XX entry points, used to identify which call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NativeOp {
    CreateDeviceInfoList,
    GetDeviceInfoDetail,
    Open,
    Close,
    ResetDevice,
    ResetPort,
    Purge,
    Read,
    Write,
    GetStatus,
    SetBaudRate,
    SetChars,
    SetBitMode,
    SetFlowControl,
    SetLatencyTimer,
    SetUsbParameters,
    SetDataCharacteristics,
    SetTimeouts,
}

impl NativeOp {
    /// The exported symbol name of this entry point in the D2XX library
    pub fn symbol_name(&self) -> &'static str {
        match self {
            NativeOp::CreateDeviceInfoList => "FT_CreateDeviceInfoList",
            NativeOp::GetDeviceInfoDetail => "FT_GetDeviceInfoDetail",
            NativeOp::Open => "FT_Open",
            NativeOp::Close => "FT_Close",
            NativeOp::ResetDevice => "FT_ResetDevice",
            NativeOp::ResetPort => "FT_ResetPort",
            NativeOp::Purge => "FT_Purge",
            NativeOp::Read => "FT_Read",
            NativeOp::Write => "FT_Write",
            NativeOp::GetStatus => "FT_GetStatus",
            NativeOp::SetBaudRate => "FT_SetBaudRate",
            NativeOp::SetChars => "FT_SetChars",
            NativeOp::SetBitMode => "FT_SetBitMode",
            NativeOp::SetFlowControl => "FT_SetFlowControl",
            NativeOp::SetLatencyTimer => "FT_SetLatencyTimer",
            NativeOp::SetUsbParameters => "FT_SetUSBParameters",
            NativeOp::SetDataCharacteristics => "FT_SetDataCharacteristics",
            NativeOp::SetTimeouts => "FT_SetTimeouts",
        }
    }
}

impl fmt::Display for NativeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol_name())
    }
}

/// What a failed native call was operating on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Target {
    /// The device list as a whole
    DeviceList,
    /// A device by its enumeration index
    Index(u32),
    /// An open device by its native handle
    Handle(usize),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::DeviceList => write!(f, "device list"),
            Target::Index(index) => write!(f, "device index {index}"),
            Target::Handle(handle) => write!(f, "handle 0x{handle:x}"),
        }
    }
}

/// Which fixed-width string field of a device record failed to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringField {
    SerialNumber,
    Description,
}

impl fmt::Display for StringField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StringField::SerialNumber => write!(f, "serial number"),
            StringField::Description => write!(f, "description"),
        }
    }
}

/// Non-zero status codes returned by the D2XX native layer.
///
/// Codes this crate doesn't know about are preserved in [`FtStatus::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FtStatus {
    InvalidHandle,
    DeviceNotFound,
    DeviceNotOpened,
    IoError,
    InsufficientResources,
    InvalidParameter,
    InvalidBaudRate,
    DeviceNotOpenedForErase,
    DeviceNotOpenedForWrite,
    FailedToWriteDevice,
    EepromReadFailed,
    EepromWriteFailed,
    EepromEraseFailed,
    EepromNotPresent,
    EepromNotProgrammed,
    InvalidArgs,
    NotSupported,
    OtherError,
    DeviceListNotReady,
    Other(u32),
}

impl FtStatus {
    /// The raw native value of this status
    pub fn code(&self) -> u32 {
        match self {
            FtStatus::InvalidHandle => 1,
            FtStatus::DeviceNotFound => 2,
            FtStatus::DeviceNotOpened => 3,
            FtStatus::IoError => 4,
            FtStatus::InsufficientResources => 5,
            FtStatus::InvalidParameter => 6,
            FtStatus::InvalidBaudRate => 7,
            FtStatus::DeviceNotOpenedForErase => 8,
            FtStatus::DeviceNotOpenedForWrite => 9,
            FtStatus::FailedToWriteDevice => 10,
            FtStatus::EepromReadFailed => 11,
            FtStatus::EepromWriteFailed => 12,
            FtStatus::EepromEraseFailed => 13,
            FtStatus::EepromNotPresent => 14,
            FtStatus::EepromNotProgrammed => 15,
            FtStatus::InvalidArgs => 16,
            FtStatus::NotSupported => 17,
            FtStatus::OtherError => 18,
            FtStatus::DeviceListNotReady => 19,
            FtStatus::Other(code) => *code,
        }
    }

    /// Whether this status indicates the device has gone away, either
    /// unplugged or with its handle no longer valid
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            FtStatus::InvalidHandle
                | FtStatus::DeviceNotFound
                | FtStatus::DeviceNotOpened
                | FtStatus::IoError
        )
    }
}

impl From<u32> for FtStatus {
    fn from(code: u32) -> Self {
        match code {
            1 => FtStatus::InvalidHandle,
            2 => FtStatus::DeviceNotFound,
            3 => FtStatus::DeviceNotOpened,
            4 => FtStatus::IoError,
            5 => FtStatus::InsufficientResources,
            6 => FtStatus::InvalidParameter,
            7 => FtStatus::InvalidBaudRate,
            8 => FtStatus::DeviceNotOpenedForErase,
            9 => FtStatus::DeviceNotOpenedForWrite,
            10 => FtStatus::FailedToWriteDevice,
            11 => FtStatus::EepromReadFailed,
            12 => FtStatus::EepromWriteFailed,
            13 => FtStatus::EepromEraseFailed,
            14 => FtStatus::EepromNotPresent,
            15 => FtStatus::EepromNotProgrammed,
            16 => FtStatus::InvalidArgs,
            17 => FtStatus::NotSupported,
            18 => FtStatus::OtherError,
            19 => FtStatus::DeviceListNotReady,
            other => FtStatus::Other(other),
        }
    }
}

impl fmt::Display for FtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FtStatus::InvalidHandle => "FT_INVALID_HANDLE",
            FtStatus::DeviceNotFound => "FT_DEVICE_NOT_FOUND",
            FtStatus::DeviceNotOpened => "FT_DEVICE_NOT_OPENED",
            FtStatus::IoError => "FT_IO_ERROR",
            FtStatus::InsufficientResources => "FT_INSUFFICIENT_RESOURCES",
            FtStatus::InvalidParameter => "FT_INVALID_PARAMETER",
            FtStatus::InvalidBaudRate => "FT_INVALID_BAUD_RATE",
            FtStatus::DeviceNotOpenedForErase => "FT_DEVICE_NOT_OPENED_FOR_ERASE",
            FtStatus::DeviceNotOpenedForWrite => "FT_DEVICE_NOT_OPENED_FOR_WRITE",
            FtStatus::FailedToWriteDevice => "FT_FAILED_TO_WRITE_DEVICE",
            FtStatus::EepromReadFailed => "FT_EEPROM_READ_FAILED",
            FtStatus::EepromWriteFailed => "FT_EEPROM_WRITE_FAILED",
            FtStatus::EepromEraseFailed => "FT_EEPROM_ERASE_FAILED",
            FtStatus::EepromNotPresent => "FT_EEPROM_NOT_PRESENT",
            FtStatus::EepromNotProgrammed => "FT_EEPROM_NOT_PROGRAMMED",
            FtStatus::InvalidArgs => "FT_INVALID_ARGS",
            FtStatus::NotSupported => "FT_NOT_SUPPORTED",
            FtStatus::OtherError => "FT_OTHER_ERROR",
            FtStatus::DeviceListNotReady => "FT_DEVICE_LIST_NOT_READY",
            FtStatus::Other(code) => return write!(f, "unknown status {code}"),
        };
        write!(f, "{name} ({})", self.code())
    }
}

/// Turns a raw native status into a `Result`, attaching the operation and
/// target to any failure
pub(crate) fn check(op: NativeOp, target: Target, status: u32) -> Result<(), Error> {
    if status == FT_OK {
        Ok(())
    } else {
        Err(Error::NativeCallFailed {
            op,
            status: status.into(),
            target,
        })
    }
}

impl Error {
    pub fn to_errno(&self) -> i32 {
        match self {
            Error::NativeCallFailed { status, .. } => match status {
                FtStatus::InvalidHandle | FtStatus::DeviceNotOpened => EBADF,
                FtStatus::DeviceNotFound => ENODEV,
                FtStatus::InsufficientResources => ENOMEM,
                FtStatus::InvalidParameter
                | FtStatus::InvalidBaudRate
                | FtStatus::InvalidArgs
                | FtStatus::NotSupported => EINVAL,
                _ => EIO,
            },
            Error::MalformedNativeString { .. } => EIO,
            Error::UseAfterClose { .. } => EBADF,
            Error::Library { .. } => ENOENT,
            Error::DeviceAccess { kind } => match kind {
                DeviceAccess::NoDevices => ENODEV,
                DeviceAccess::NotFound { .. } => ENOENT,
            },
            Error::Args { .. } => EINVAL,
        }
    }

    /// Whether this error is a native failure indicating the device has been
    /// unplugged or its handle invalidated.
    ///
    /// The native layer has no end-of-stream signal, so this is the only way
    /// to tell a disconnect apart from other failures.
    pub fn is_disconnect(&self) -> bool {
        match self {
            Error::NativeCallFailed { status, .. } => status.is_disconnect(),
            _ => false,
        }
    }
}

// Map Error to std::io::Error, for the io::Read and io::Write impls
impl From<Error> for std::io::Error {
    fn from(err: Error) -> Self {
        use std::io::ErrorKind;
        let kind = if err.is_disconnect() {
            ErrorKind::BrokenPipe
        } else {
            match &err {
                Error::UseAfterClose { .. } => ErrorKind::NotConnected,
                Error::Args { .. } => ErrorKind::InvalidInput,
                _ => ErrorKind::Other,
            }
        };
        std::io::Error::new(kind, err)
    }
}

// Map DeviceAccess to Error
impl From<DeviceAccess> for Error {
    fn from(kind: DeviceAccess) -> Self {
        Self::DeviceAccess { kind }
    }
}
