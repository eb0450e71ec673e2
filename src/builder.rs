use crate::config::{DriverConfig, SessionConfig};
use crate::directory::{list_devices_with, DeviceRecord};
use crate::driver::{D2xx, Driver};
use crate::error::{DeviceAccess, Error};
use crate::{BitMode, FlowControl, LineProperties, Session};

#[allow(unused_imports)]
use log::{debug, error, info, trace, warn};
use std::fmt;
use std::time::Duration;

/// How [`SessionBuilder`] picks which device to open
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    /// Enumeration index
    Index(u32),
    /// Exact serial number
    SerialNumber(String),
    /// Exact description
    Description(String),
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::Index(index) => write!(f, "index {index}"),
            DeviceSelector::SerialNumber(serial) => write!(f, "serial number {serial:?}"),
            DeviceSelector::Description(desc) => write!(f, "description {desc:?}"),
        }
    }
}

impl DeviceSelector {
    fn matches(&self, record: &DeviceRecord) -> bool {
        match self {
            DeviceSelector::Index(index) => record.index == *index,
            DeviceSelector::SerialNumber(serial) => record.serial_number == *serial,
            DeviceSelector::Description(desc) => record.description == *desc,
        }
    }
}

/// A builder pattern for finding, opening and configuring a [`Session`].
///
/// Enumerates the attached devices, opens the selected one, then applies
/// each configured setting.  If any setting fails the session is closed
/// again before the error is returned.
///
/// # Examples
///
/// ## A simple example
///
/// ```no_run
/// use d2xx::SessionBuilder;
///
/// // Opens the first attached device, leaving its settings alone
/// let session = SessionBuilder::new()
///     .build()
///     .unwrap();
/// ```
///
/// ## A more complex example
///
/// ```no_run
/// use d2xx::{SessionBuilder, LineProperties, FlowControl};
/// use std::time::Duration;
///
/// let session = SessionBuilder::new()
///     .serial_number("FT4ZKX1A")
///     .baud_rate(115_200)
///     .line_properties(LineProperties::default())
///     .flow_control(FlowControl::RtsCts)
///     .timeouts(Duration::from_millis(500), Duration::from_millis(500))
///     .purge_on_open(true)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, Default)]
pub struct SessionBuilder {
    selector: Option<DeviceSelector>,
    config: SessionConfig,
    driver_config: Option<DriverConfig>,
}

impl SessionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a [`Session`] using the process-wide D2XX library.
    ///
    /// # Returns
    /// * `Ok(Session)` - the opened and configured session
    /// * `Err(Error)` - if the library couldn't be loaded, no device matched,
    ///   or opening or configuring it failed
    ///
    /// # Notes:
    /// If [`SessionBuilder::driver_config`] was set, it is only used if this
    /// is the first use of the library in this process.
    pub fn build(&self) -> Result<Session<'static, D2xx>, Error> {
        let driver = match &self.driver_config {
            Some(config) => D2xx::init_global(config)?,
            None => D2xx::global()?,
        };
        self.build_with(driver)
    }

    /// As [`SessionBuilder::build`] but using the provided [`Driver`]
    pub fn build_with<'d, D: Driver + ?Sized>(&self, driver: &'d D) -> Result<Session<'d, D>, Error> {
        trace!("SessionBuilder::build_with selector {:?}", self.selector);
        let records = list_devices_with(driver)?;
        let record = self.select(&records)?;
        debug!(
            "Selected device {} serial {:?} description {:?}",
            record.index, record.serial_number, record.description
        );

        // Dropping the session on a configuration error closes it
        let mut session = Session::open(driver, record)?;
        session.configure(&self.config).inspect_err(|e| {
            warn!("Failed to configure device {}: {e}", record.index);
        })?;
        Ok(session)
    }

    fn select<'r>(&self, records: &'r [DeviceRecord]) -> Result<&'r DeviceRecord, Error> {
        if records.is_empty() {
            info!("No D2XX devices found");
            return Err(DeviceAccess::NoDevices.into());
        }
        match &self.selector {
            None => Ok(&records[0]),
            Some(selector) => records
                .iter()
                .find(|record| selector.matches(record))
                .ok_or_else(|| {
                    info!("No D2XX device matching {selector} found");
                    DeviceAccess::NotFound {
                        selector: selector.to_string(),
                        found: records.len(),
                    }
                    .into()
                }),
        }
    }
}

/// Device selection
///
/// If none is set, the first enumerated device is used.  Setting more than
/// once replaces the previous selection.
impl SessionBuilder {
    pub fn index(&mut self, index: u32) -> &mut Self {
        self.selector = Some(DeviceSelector::Index(index));
        self
    }

    pub fn serial_number(&mut self, serial: &str) -> &mut Self {
        self.selector = Some(DeviceSelector::SerialNumber(serial.to_string()));
        self
    }

    pub fn description(&mut self, description: &str) -> &mut Self {
        self.selector = Some(DeviceSelector::Description(description.to_string()));
        self
    }

    /// Sets the D2XX library location.  See [`SessionBuilder::build`].
    pub fn driver_config(&mut self, config: DriverConfig) -> &mut Self {
        self.driver_config = Some(config);
        self
    }
}

/// Session settings, applied in the order of [`Session::configure`]
impl SessionBuilder {
    /// Replaces every setting with those in `config`
    pub fn config(&mut self, config: SessionConfig) -> &mut Self {
        self.config = config;
        self
    }

    pub fn bit_mode(&mut self, mode: BitMode) -> &mut Self {
        self.config.bit_mode = Some(mode);
        self
    }

    pub fn baud_rate(&mut self, baud_rate: u32) -> &mut Self {
        self.config.baud_rate = Some(baud_rate);
        self
    }

    pub fn line_properties(&mut self, props: LineProperties) -> &mut Self {
        self.config.line_properties = Some(props);
        self
    }

    pub fn flow_control(&mut self, flow_control: FlowControl) -> &mut Self {
        self.config.flow_control = Some(flow_control);
        self
    }

    pub fn chars(&mut self, event_char: u8, error_char: u8) -> &mut Self {
        self.config.chars = Some((event_char, error_char));
        self
    }

    pub fn latency_ms(&mut self, latency_ms: u8) -> &mut Self {
        self.config.latency_ms = Some(latency_ms);
        self
    }

    pub fn transfer_size(&mut self, read_size: u32, write_size: u32) -> &mut Self {
        self.config.transfer_size = Some((read_size, write_size));
        self
    }

    pub fn timeouts(&mut self, read: Duration, write: Duration) -> &mut Self {
        self.config.timeouts = Some((read, write));
        self
    }

    pub fn read_delay(&mut self, delay: Duration) -> &mut Self {
        self.config.read_delay = delay;
        self
    }

    pub fn purge_on_open(&mut self, purge: bool) -> &mut Self {
        self.config.purge_on_open = purge;
        self
    }
}
