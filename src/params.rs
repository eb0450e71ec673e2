//! Parameter value types passed to the [`crate::Session`] configuration
//! setters.  Each mirrors the native encoding of its D2XX argument.

use crate::constants::{EVENT_LINE_STATUS, EVENT_MODEM_STATUS, EVENT_RXCHAR};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Bit-bang modes supported by `FT_SetBitMode`.  Not every chip supports
/// every mode - the native layer rejects unsupported ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BitMode {
    /// Return the chip to its default UART mode
    #[default]
    Reset,
    AsyncBitbang,
    Mpsse,
    SyncBitbang,
    McuHost,
    FastSerial,
    CbusBitbang,
    SyncFifo,
}

impl BitMode {
    pub fn code(&self) -> u8 {
        match self {
            BitMode::Reset => 0x00,
            BitMode::AsyncBitbang => 0x01,
            BitMode::Mpsse => 0x02,
            BitMode::SyncBitbang => 0x04,
            BitMode::McuHost => 0x08,
            BitMode::FastSerial => 0x10,
            BitMode::CbusBitbang => 0x20,
            BitMode::SyncFifo => 0x40,
        }
    }
}

impl fmt::Display for BitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02x})", self, self.code())
    }
}

/// Flow control disciplines supported by `FT_SetFlowControl`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FlowControl {
    #[default]
    None,
    RtsCts,
    DtrDsr,
    /// Software flow control, using [`crate::constants::XON_CHAR`] and
    /// [`crate::constants::XOFF_CHAR`]
    XonXoff,
}

impl FlowControl {
    pub fn code(&self) -> u16 {
        match self {
            FlowControl::None => 0x0000,
            FlowControl::RtsCts => 0x0100,
            FlowControl::DtrDsr => 0x0200,
            FlowControl::XonXoff => 0x0400,
        }
    }
}

impl fmt::Display for FlowControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowControl::None => write!(f, "none"),
            FlowControl::RtsCts => write!(f, "RTS/CTS"),
            FlowControl::DtrDsr => write!(f, "DTR/DSR"),
            FlowControl::XonXoff => write!(f, "XON/XOFF"),
        }
    }
}

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataBits {
    Seven,
    #[default]
    Eight,
}

impl DataBits {
    pub fn code(&self) -> u8 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopBits {
    #[default]
    One,
    Two,
}

impl StopBits {
    pub fn code(&self) -> u8 {
        match self {
            StopBits::One => 0,
            StopBits::Two => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Parity {
    #[default]
    None,
    Odd,
    Even,
    Mark,
    Space,
}

impl Parity {
    pub fn code(&self) -> u8 {
        match self {
            Parity::None => 0,
            Parity::Odd => 1,
            Parity::Even => 2,
            Parity::Mark => 3,
            Parity::Space => 4,
        }
    }
}

/// The line format passed to `FT_SetDataCharacteristics`.  Defaults to 8N1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LineProperties {
    pub bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
}

impl LineProperties {
    #[must_use]
    pub fn new(bits: DataBits, stop_bits: StopBits, parity: Parity) -> Self {
        Self {
            bits,
            stop_bits,
            parity,
        }
    }
}

impl fmt::Display for LineProperties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parity = match self.parity {
            Parity::None => 'N',
            Parity::Odd => 'O',
            Parity::Even => 'E',
            Parity::Mark => 'M',
            Parity::Space => 'S',
        };
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "{}{parity}{stop}", self.bits.code())
    }
}

/// Pending modem/line events, as reported by `FT_GetStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EventFlags(pub u32);

impl EventFlags {
    pub fn rx_char(&self) -> bool {
        self.0 & EVENT_RXCHAR != 0
    }

    pub fn modem_status(&self) -> bool {
        self.0 & EVENT_MODEM_STATUS != 0
    }

    pub fn line_status(&self) -> bool {
        self.0 & EVENT_LINE_STATUS != 0
    }
}

impl fmt::Display for EventFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flags = [
            (self.rx_char(), "rx-char"),
            (self.modem_status(), "modem-status"),
            (self.line_status(), "line-status"),
        ];
        let set: Vec<&str> = flags
            .iter()
            .filter(|(set, _)| *set)
            .map(|(_, name)| *name)
            .collect();
        if set.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", set.join(","))
        }
    }
}
