//! Capabilities shared by every motor board on the robot's CAN bus.
//!
//! A concrete board (eg. [`FetBoard`](super::fet::FetBoard)) composes a
//! [`DeviceRegistry`] that owns the registered devices and a [`CommonDecoder`]
//! that handles opcodes every board speaks. Both are traits so tests and other
//! boards can substitute their own.

use heapless::{Deque, String, Vec};

use super::DeviceIdx;
use crate::components::message::{CanMessage, Message, common};
use crate::config::{ERROR_LOG_LEN, MAX_NAME_LEN};
use crate::error::Error;

/// A single board instance on the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String<MAX_NAME_LEN>,
    /// Robot -> board.
    pub can_in: u16,
    /// Board -> robot.
    pub can_out: u16,
    /// Answered a ping or sent anything common since registration.
    pub alive: bool,
    /// Last reported frames per second.
    pub fps: Option<u16>,
    /// Last error code reported by the board itself.
    pub board_error: Option<u8>,
}

impl Device {
    pub fn new(name: &str, can_in: u16, can_out: u16) -> Result<Self, Error> {
        let mut stored = String::new();
        stored.push_str(name).map_err(|_| Error::NameTooLong)?;
        Ok(Self {
            name: stored,
            can_in,
            can_out,
            alive: false,
            fps: None,
            board_error: None,
        })
    }

    /// Is the frame ID one this device transmits on?
    pub fn is_for_me(&self, can_id: u16) -> bool {
        self.can_out == can_id
    }
}

/// Keeps devices in registration order. Index == ordinal number of the device.
pub trait DeviceRegistry {
    /// Append a device. Returns its ordinal number.
    fn register(&mut self, name: &str, can_in: u16, can_out: u16) -> Result<DeviceIdx, Error>;

    fn devices(&self) -> &[Device];

    fn devices_mut(&mut self) -> &mut [Device];

    fn count(&self) -> usize {
        self.devices().len()
    }

    fn device(&self, idx: DeviceIdx) -> Option<&Device> {
        self.devices().get(idx as usize)
    }

    /// First device transmitting on this ID.
    fn find_by_out_id(&self, can_id: u16) -> Option<DeviceIdx> {
        self.devices()
            .iter()
            .position(|device| device.is_for_me(can_id))
            .map(|pos| pos as DeviceIdx)
    }
}

/// Fixed-capacity registry.
#[derive(Debug, Default)]
pub struct Registry<const N: usize> {
    devices: Vec<Device, N>,
}

impl<const N: usize> Registry<N> {
    pub const fn new() -> Self {
        Self { devices: Vec::new() }
    }
}

impl<const N: usize> DeviceRegistry for Registry<N> {
    fn register(&mut self, name: &str, can_in: u16, can_out: u16) -> Result<DeviceIdx, Error> {
        let device = Device::new(name, can_in, can_out)?;
        let idx = self.devices.len() as DeviceIdx;
        self.devices
            .push(device)
            .map_err(|_| Error::TooManyBoards { count: N })?;
        Ok(idx)
    }

    fn devices(&self) -> &[Device] {
        &self.devices
    }

    fn devices_mut(&mut self) -> &mut [Device] {
        &mut self.devices
    }
}

/// Decoding of opcodes shared by all motor boards.
pub trait CommonDecoder {
    /// Returns `false` if the opcode is not a common one and the board itself
    /// has to make sense of it.
    fn decode_common(&mut self, message: &CanMessage, device: &mut Device) -> bool;
}

/// Default handling of common opcodes.
#[derive(Debug, Default)]
pub struct CommonCommands;

impl CommonDecoder for CommonCommands {
    fn decode_common(&mut self, message: &CanMessage, device: &mut Device) -> bool {
        let Some(parsed) = Message::from_raw(message) else {
            return false;
        };

        match parsed {
            Message::ReportAlive => {
                if !device.alive {
                    log_info!("{} alive", device.name.as_str());
                }
            }
            Message::FpsSending { fps } => {
                device.fps = Some(fps);
            }
            Message::Error { code } => {
                log_warn!("{} reports error {}", device.name.as_str(), code);
                device.board_error = Some(code);
            }
            Message::Notification => {
                log_debug!("{} notification", device.name.as_str());
            }
            // Robot -> board only.
            Message::TurnOn { .. } | Message::TurnOff { .. } => return false,
        }
        // Anything the board sends proves it is there.
        device.alive = true;
        true
    }
}

/// Human readable name of a common opcode.
pub fn common_command_name(opcode: u8) -> Option<&'static str> {
    match opcode {
        common::FPS_SENDING => Some("FPS sending"),
        common::NOTIFICATION => Some("Notification"),
        common::ERROR => Some("Error"),
        common::REPORT_ALIVE => Some("Report alive"),
        _ => None,
    }
}

/// Diagnostic entry: what failed and for which device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ErrorRecord {
    pub device: Option<DeviceIdx>,
    pub error: Error,
}

/// Bounded log of recent errors. When full, the oldest entry is dropped.
#[derive(Debug, Default)]
pub struct ErrorLog {
    records: Deque<ErrorRecord, ERROR_LOG_LEN>,
}

impl ErrorLog {
    pub const fn new() -> Self {
        Self {
            records: Deque::new(),
        }
    }

    pub fn record(&mut self, error: Error) {
        if self.records.is_full() {
            self.records.pop_front();
        }
        let _ = self.records.push_back(ErrorRecord {
            device: error.device(),
            error,
        });
    }

    pub fn last(&self) -> Option<&ErrorRecord> {
        self.records.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
