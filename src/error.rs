use core::fmt;

use crate::boards::DeviceIdx;
use crate::config::BOARD_NAME;

/// Error type for FET board operations.
///
/// None of these are fatal: the call that produced the error did nothing on
/// the bus and left the board state unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// More boards registered than there are CAN ID slots.
    TooManyBoards { count: usize },
    /// Output number outside 0..=1.
    OutputOutOfRange { output: u8 },
    /// No board registered under this ordinal.
    DeviceNotFound { device: DeviceIdx },
    /// Frame was addressed to us, but the opcode means nothing to a FET board.
    UnknownCommand { device: DeviceIdx, opcode: u8 },
    /// Frame was addressed to us, but is too short for its opcode. `None`
    /// when there was no payload at all.
    MalformedFrame { device: DeviceIdx, opcode: Option<u8> },
    /// Device name doesn't fit the name buffer.
    NameTooLong,
    /// The bus frame type refused our ID or payload.
    InvalidFrame,
    /// Transmission failed in the CAN driver.
    Bus(embedded_can::ErrorKind),
}

impl Error {
    /// Board this error is tagged with, if any.
    pub fn device(&self) -> Option<DeviceIdx> {
        match self {
            Error::DeviceNotFound { device }
            | Error::UnknownCommand { device, .. }
            | Error::MalformedFrame { device, .. } => Some(*device),
            _ => None,
        }
    }
}

impl<E: embedded_can::Error> From<E> for Error {
    fn from(e: E) -> Self {
        Error::Bus(e.kind())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::TooManyBoards { count } => write!(f, "Too many {}: {}.", BOARD_NAME, count),
            Error::OutputOutOfRange { output } => {
                write!(f, "{} output {} not found.", BOARD_NAME, output)
            }
            Error::DeviceNotFound { device } => write!(f, "{} {} not found.", BOARD_NAME, device),
            Error::UnknownCommand { device, opcode } => {
                write!(f, "{} {}: unknown command {:#x}.", BOARD_NAME, device, opcode)
            }
            Error::MalformedFrame { device, opcode: None } => {
                write!(f, "{} {}: empty frame.", BOARD_NAME, device)
            }
            Error::MalformedFrame { device, opcode: Some(opcode) } => {
                write!(f, "{} {}: short frame for command {:#x}.", BOARD_NAME, device, opcode)
            }
            Error::NameTooLong => write!(f, "{} name too long.", BOARD_NAME),
            Error::InvalidFrame => write!(f, "{} frame rejected.", BOARD_NAME),
            Error::Bus(kind) => write!(f, "{} bus error: {:?}.", BOARD_NAME, kind),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Error::TooManyBoards { count } => defmt::write!(fmt, "TooManyBoards({})", count),
            Error::OutputOutOfRange { output } => {
                defmt::write!(fmt, "OutputOutOfRange({})", output)
            }
            Error::DeviceNotFound { device } => defmt::write!(fmt, "DeviceNotFound({})", device),
            Error::UnknownCommand { device, opcode } => {
                defmt::write!(fmt, "UnknownCommand({}, {:#x})", device, opcode)
            }
            Error::MalformedFrame { device, opcode } => {
                defmt::write!(fmt, "MalformedFrame({}, {})", device, opcode)
            }
            Error::NameTooLong => defmt::write!(fmt, "NameTooLong"),
            Error::InvalidFrame => defmt::write!(fmt, "InvalidFrame"),
            Error::Bus(kind) => defmt::write!(fmt, "Bus({})", defmt::Debug2Format(kind)),
        }
    }
}
