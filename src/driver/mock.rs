//! A simulated D2XX native layer for tests
use super::{Driver, RawDeviceDetail, RawHandle};
use crate::constants::{DESCRIPTION_LEN, FT_OK, SERIAL_NUMBER_LEN};
use crate::error::{FtStatus, NativeOp};

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

const FIRST_HANDLE: RawHandle = 0x1000;

/// A single recorded native call
#[derive(Debug, Clone)]
pub(crate) struct MockCall {
    pub op: NativeOp,
    pub at: Instant,
    /// Buffer length for reads and writes
    pub len: Option<usize>,
}

/// Settings most recently applied to an open device
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct MockSettings {
    pub baud_rate: Option<u32>,
    pub chars: Option<(u8, u8, u8, u8)>,
    pub bit_mode: Option<(u8, u8)>,
    pub flow_control: Option<(u16, u8, u8)>,
    pub latency_ms: Option<u8>,
    pub usb_parameters: Option<(u32, u32)>,
    pub data_characteristics: Option<(u8, u8, u8)>,
    pub timeouts: Option<(u32, u32)>,
    pub purges: Vec<u32>,
    pub resets: usize,
    pub port_resets: usize,
}

#[derive(Debug, Default)]
struct MockOpen {
    index: u32,
    rx: VecDeque<u8>,
    tx: u32,
    events: u32,
    settings: MockSettings,
}

#[derive(Debug, Default)]
struct MockState {
    devices: Vec<RawDeviceDetail>,
    open: HashMap<RawHandle, MockOpen>,
    closed: HashMap<RawHandle, MockSettings>,
    next_handle: RawHandle,
    failures: HashMap<NativeOp, u32>,
    calls: Vec<MockCall>,
    echo: bool,
    write_limit: Option<u32>,
    // Reported rx queue length, overriding the real queue length
    rx_report: Option<u32>,
    // Reported read count, overriding the number of bytes copied
    read_report: Option<u32>,
}

/// A simulated native layer.  Writes are echoed back into the receive queue
/// unless disabled with [`MockDriver::set_echo`].
#[derive(Debug)]
pub(crate) struct MockDriver {
    state: Mutex<MockState>,
}

pub(crate) fn serial_buf(serial: &str) -> [u8; SERIAL_NUMBER_LEN] {
    let mut buf = [0u8; SERIAL_NUMBER_LEN];
    buf[..serial.len()].copy_from_slice(serial.as_bytes());
    buf
}

pub(crate) fn description_buf(description: &str) -> [u8; DESCRIPTION_LEN] {
    let mut buf = [0u8; DESCRIPTION_LEN];
    buf[..description.len()].copy_from_slice(description.as_bytes());
    buf
}

impl MockDriver {
    pub fn new() -> Self {
        MockDriver {
            state: Mutex::new(MockState {
                next_handle: FIRST_HANDLE,
                echo: true,
                ..Default::default()
            }),
        }
    }

    /// A driver with `count` attached devices, with serials `FT0000`,
    /// `FT0001`, ... and descriptions `Bridge 0`, `Bridge 1`, ...
    pub fn with_devices(count: u32) -> Self {
        let driver = Self::new();
        for ii in 0..count {
            driver.add_device(&format!("FT{ii:04}"), &format!("Bridge {ii}"));
        }
        driver
    }

    pub fn add_device(&self, serial: &str, description: &str) {
        self.add_raw_device(serial_buf(serial), description_buf(description));
    }

    pub fn add_raw_device(
        &self,
        serial_number: [u8; SERIAL_NUMBER_LEN],
        description: [u8; DESCRIPTION_LEN],
    ) {
        let mut state = self.state.lock();
        let index = state.devices.len() as u32;
        state.devices.push(RawDeviceDetail {
            flags: 0x2,
            device_type: 5,
            id: 0x0403_6001,
            loc_id: 0x100 + index,
            serial_number,
            description,
            handle: 0,
        });
    }

    /// Make every subsequent call to `op` fail with `status`
    pub fn fail(&self, op: NativeOp, status: FtStatus) {
        self.state.lock().failures.insert(op, status.code());
    }

    pub fn clear_failure(&self, op: NativeOp) {
        self.state.lock().failures.remove(&op);
    }

    pub fn set_echo(&self, echo: bool) {
        self.state.lock().echo = echo;
    }

    /// Accept at most `limit` bytes per write
    pub fn set_write_limit(&self, limit: u32) {
        self.state.lock().write_limit = Some(limit);
    }

    pub fn report_rx_queue(&self, rx: u32) {
        self.state.lock().rx_report = Some(rx);
    }

    pub fn report_read_count(&self, count: u32) {
        self.state.lock().read_report = Some(count);
    }

    pub fn push_rx(&self, handle: RawHandle, data: &[u8]) {
        if let Some(open) = self.state.lock().open.get_mut(&handle) {
            open.rx.extend(data);
        }
    }

    pub fn set_events(&self, handle: RawHandle, events: u32) {
        if let Some(open) = self.state.lock().open.get_mut(&handle) {
            open.events = events;
        }
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn calls_for(&self, op: NativeOp) -> Vec<MockCall> {
        self.calls().into_iter().filter(|c| c.op == op).collect()
    }

    pub fn open_handles(&self) -> Vec<RawHandle> {
        self.state.lock().open.keys().copied().collect()
    }

    pub fn open_index(&self, handle: RawHandle) -> Option<u32> {
        self.state.lock().open.get(&handle).map(|o| o.index)
    }

    /// Settings of an open device, or of a device as it was when closed
    pub fn settings(&self, handle: RawHandle) -> Option<MockSettings> {
        let state = self.state.lock();
        state
            .open
            .get(&handle)
            .map(|o| o.settings.clone())
            .or_else(|| state.closed.get(&handle).cloned())
    }

    // Records the call and returns an injected failure, if any
    fn enter(&self, op: NativeOp, len: Option<usize>) -> Option<u32> {
        let mut state = self.state.lock();
        state.calls.push(MockCall {
            op,
            at: Instant::now(),
            len,
        });
        state.failures.get(&op).copied()
    }

    // Runs `f` against an open device, or reports an invalid handle
    fn with_open(
        &self,
        op: NativeOp,
        len: Option<usize>,
        handle: RawHandle,
        f: impl FnOnce(&mut MockOpen),
    ) -> u32 {
        if let Some(status) = self.enter(op, len) {
            return status;
        }
        match self.state.lock().open.get_mut(&handle) {
            Some(open) => {
                f(open);
                FT_OK
            }
            None => FtStatus::InvalidHandle.code(),
        }
    }
}

impl Driver for MockDriver {
    fn create_device_info_list(&self, num_devs: &mut u32) -> u32 {
        if let Some(status) = self.enter(NativeOp::CreateDeviceInfoList, None) {
            return status;
        }
        *num_devs = self.state.lock().devices.len() as u32;
        FT_OK
    }

    fn get_device_info_detail(&self, index: u32, detail: &mut RawDeviceDetail) -> u32 {
        if let Some(status) = self.enter(NativeOp::GetDeviceInfoDetail, None) {
            return status;
        }
        match self.state.lock().devices.get(index as usize) {
            Some(device) => {
                *detail = device.clone();
                FT_OK
            }
            None => FtStatus::DeviceNotFound.code(),
        }
    }

    fn open(&self, index: u32, handle: &mut RawHandle) -> u32 {
        if let Some(status) = self.enter(NativeOp::Open, None) {
            return status;
        }
        let mut state = self.state.lock();
        if index as usize >= state.devices.len() {
            return FtStatus::DeviceNotFound.code();
        }
        let new_handle = state.next_handle;
        state.next_handle += 1;
        state.open.insert(
            new_handle,
            MockOpen {
                index,
                ..Default::default()
            },
        );
        *handle = new_handle;
        FT_OK
    }

    fn close(&self, handle: RawHandle) -> u32 {
        if let Some(status) = self.enter(NativeOp::Close, None) {
            return status;
        }
        let mut state = self.state.lock();
        match state.open.remove(&handle) {
            Some(open) => {
                state.closed.insert(handle, open.settings);
                FT_OK
            }
            None => FtStatus::InvalidHandle.code(),
        }
    }

    fn reset_device(&self, handle: RawHandle) -> u32 {
        self.with_open(NativeOp::ResetDevice, None, handle, |open| {
            open.settings.resets += 1
        })
    }

    fn reset_port(&self, handle: RawHandle) -> u32 {
        self.with_open(NativeOp::ResetPort, None, handle, |open| {
            open.settings.port_resets += 1
        })
    }

    fn purge(&self, handle: RawHandle, mask: u32) -> u32 {
        self.with_open(NativeOp::Purge, None, handle, |open| {
            if mask & crate::constants::PURGE_RX != 0 {
                open.rx.clear();
            }
            if mask & crate::constants::PURGE_TX != 0 {
                open.tx = 0;
            }
            open.settings.purges.push(mask);
        })
    }

    fn read(&self, handle: RawHandle, buffer: &mut [u8], bytes_returned: &mut u32) -> u32 {
        let read_report = self.state.lock().read_report;
        self.with_open(NativeOp::Read, Some(buffer.len()), handle, |open| {
            let count = buffer.len().min(open.rx.len());
            for (slot, byte) in buffer.iter_mut().zip(open.rx.drain(..count)) {
                *slot = byte;
            }
            *bytes_returned = read_report.unwrap_or(count as u32);
        })
    }

    fn write(&self, handle: RawHandle, buffer: &[u8], bytes_written: &mut u32) -> u32 {
        let (echo, limit) = {
            let state = self.state.lock();
            (state.echo, state.write_limit)
        };
        self.with_open(NativeOp::Write, Some(buffer.len()), handle, |open| {
            let count = limit.map_or(buffer.len(), |l| buffer.len().min(l as usize));
            if echo {
                open.rx.extend(&buffer[..count]);
            } else {
                open.tx += count as u32;
            }
            *bytes_written = count as u32;
        })
    }

    fn get_status(
        &self,
        handle: RawHandle,
        rx_queue: &mut u32,
        tx_queue: &mut u32,
        events: &mut u32,
    ) -> u32 {
        let rx_report = self.state.lock().rx_report;
        self.with_open(NativeOp::GetStatus, None, handle, |open| {
            *rx_queue = rx_report.unwrap_or(open.rx.len() as u32);
            *tx_queue = open.tx;
            *events = open.events;
        })
    }

    fn set_baud_rate(&self, handle: RawHandle, baud_rate: u32) -> u32 {
        self.with_open(NativeOp::SetBaudRate, None, handle, |open| {
            open.settings.baud_rate = Some(baud_rate)
        })
    }

    fn set_chars(
        &self,
        handle: RawHandle,
        event_char: u8,
        event_char_enabled: u8,
        error_char: u8,
        error_char_enabled: u8,
    ) -> u32 {
        self.with_open(NativeOp::SetChars, None, handle, |open| {
            open.settings.chars = Some((
                event_char,
                event_char_enabled,
                error_char,
                error_char_enabled,
            ))
        })
    }

    fn set_bit_mode(&self, handle: RawHandle, mask: u8, mode: u8) -> u32 {
        self.with_open(NativeOp::SetBitMode, None, handle, |open| {
            open.settings.bit_mode = Some((mask, mode))
        })
    }

    fn set_flow_control(&self, handle: RawHandle, flow_control: u16, xon: u8, xoff: u8) -> u32 {
        self.with_open(NativeOp::SetFlowControl, None, handle, |open| {
            open.settings.flow_control = Some((flow_control, xon, xoff))
        })
    }

    fn set_latency_timer(&self, handle: RawHandle, latency_ms: u8) -> u32 {
        // The real driver rejects values below 2
        if latency_ms < crate::constants::MIN_LATENCY_MS {
            self.enter(NativeOp::SetLatencyTimer, None);
            return FtStatus::InvalidParameter.code();
        }
        self.with_open(NativeOp::SetLatencyTimer, None, handle, |open| {
            open.settings.latency_ms = Some(latency_ms)
        })
    }

    fn set_usb_parameters(&self, handle: RawHandle, in_size: u32, out_size: u32) -> u32 {
        self.with_open(NativeOp::SetUsbParameters, None, handle, |open| {
            open.settings.usb_parameters = Some((in_size, out_size))
        })
    }

    fn set_data_characteristics(
        &self,
        handle: RawHandle,
        word_length: u8,
        stop_bits: u8,
        parity: u8,
    ) -> u32 {
        self.with_open(NativeOp::SetDataCharacteristics, None, handle, |open| {
            open.settings.data_characteristics = Some((word_length, stop_bits, parity))
        })
    }

    fn set_timeouts(&self, handle: RawHandle, read_timeout_ms: u32, write_timeout_ms: u32) -> u32 {
        self.with_open(NativeOp::SetTimeouts, None, handle, |open| {
            open.settings.timeouts = Some((read_timeout_ms, write_timeout_ms))
        })
    }
}
