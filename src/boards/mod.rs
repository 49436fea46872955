pub mod fet;
pub mod motor_board;

pub use fet::FetBoard;

use crate::components::message::CanMessage;
use crate::error::Error;

/// Ordinal number of a device within its board group, in registration order.
pub type DeviceIdx = u8;

/// What a board did with an incoming frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Decoded {
    /// Not addressed to any of our devices. Nothing changed.
    NotForMe,
    /// Addressed to `device` and understood.
    Handled { device: DeviceIdx },
    /// Addressed to us, but could not be handled. The error is tagged with
    /// the device and already recorded.
    Rejected { device: DeviceIdx, error: Error },
}

impl Decoded {
    /// Did the address match one of our devices?
    pub fn claimed(&self) -> bool {
        !matches!(self, Decoded::NotForMe)
    }

    pub fn error(&self) -> Option<Error> {
        match self {
            Decoded::Rejected { error, .. } => Some(*error),
            _ => None,
        }
    }
}

/// Robot-level view of a board group sharing the CAN bus.
pub trait Board {
    fn name(&self) -> &'static str;

    /// Number of registered devices.
    fn count(&self) -> usize;

    /// Inspect a frame received from the bus.
    fn decode(&mut self, message: &CanMessage) -> Decoded;

    fn command_name(&self, opcode: u8) -> Option<&'static str>;
}

/// Hand a frame to boards in order. The first board that claims it wins and
/// the rest never see it.
pub fn dispatch(boards: &mut [&mut dyn Board], message: &CanMessage) -> Decoded {
    for board in boards.iter_mut() {
        let decoded = board.decode(message);
        if decoded.claimed() {
            return decoded;
        }
    }
    log_debug!("Nobody claimed frame {:#x}", message.can_id());
    Decoded::NotForMe
}
