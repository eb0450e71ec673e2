//! Configuration objects for loading the D2XX library and setting up a
//! [`crate::Session`]
use crate::constants::{DEFAULT_LIBRARY_NAME, DEFAULT_READ_DELAY, LIBRARY_ENV_VAR};
use crate::{BitMode, FlowControl, LineProperties};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Controls where the D2XX shared library is loaded from
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Path to the D2XX shared library.  If None, the `D2XX_LIBRARY`
    /// environment variable is used, falling back to the platform's default
    /// library name (resolved via the system library search path).
    pub library_path: Option<PathBuf>,
}

impl DriverConfig {
    /// Returns the path the library will actually be loaded from
    pub fn resolve_library_path(&self) -> PathBuf {
        if let Some(path) = &self.library_path {
            trace!("Using configured D2XX library path {path:?}");
            return path.clone();
        }
        match std::env::var_os(LIBRARY_ENV_VAR) {
            Some(path) if !path.is_empty() => {
                debug!("Using D2XX library path from {LIBRARY_ENV_VAR}: {path:?}");
                PathBuf::from(path)
            }
            _ => PathBuf::from(DEFAULT_LIBRARY_NAME),
        }
    }
}

/// Settings applied to a [`crate::Session`] straight after it is opened, by
/// [`crate::SessionBuilder`] or [`crate::Session::configure`].
///
/// Settings left as None are not sent to the device, so the chip keeps
/// whatever the driver defaulted them to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub bit_mode: Option<BitMode>,
    pub baud_rate: Option<u32>,
    pub line_properties: Option<LineProperties>,
    pub flow_control: Option<FlowControl>,
    /// Event and error characters, in that order
    pub chars: Option<(u8, u8)>,
    /// Valid between 2 and 255
    pub latency_ms: Option<u8>,
    /// Read and write USB transfer sizes, in that order
    pub transfer_size: Option<(u32, u32)>,
    /// Read and write timeouts, in that order
    pub timeouts: Option<(Duration, Duration)>,
    /// Delay used by [`crate::Session::read`] when fewer bytes are queued
    /// than requested
    pub read_delay: Duration,
    /// Flush the receive and transmit buffers once configured
    pub purge_on_open: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            bit_mode: None,
            baud_rate: None,
            line_properties: None,
            flow_control: None,
            chars: None,
            latency_ms: None,
            transfer_size: None,
            timeouts: None,
            read_delay: DEFAULT_READ_DELAY,
            purge_on_open: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_library_path_wins() {
        let config = DriverConfig {
            library_path: Some(PathBuf::from("/opt/ftdi/libftd2xx.so.1.4")),
        };
        assert_eq!(
            config.resolve_library_path(),
            PathBuf::from("/opt/ftdi/libftd2xx.so.1.4")
        );
    }

    #[test]
    fn test_session_config_default() {
        let config = SessionConfig::default();
        assert_eq!(config.read_delay, DEFAULT_READ_DELAY);
        assert!(!config.purge_on_open);
        assert!(config.baud_rate.is_none());
    }
}
