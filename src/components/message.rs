use embedded_can::{Frame, Id, StandardId};

/* Payload layout shared by all motor boards:
 * - byte 0: opcode
 * - bytes 1..: opcode arguments
 * The 11-bit CAN ID selects the board (see config::can_ids), not the command.
 */

/// Opcodes understood by every motor board.
pub mod common {
    /// FPS report from the board. u16 LE in bytes 1..3.
    pub const FPS_SENDING: u8 = 0x31;
    /// Board-side notification, no arguments we care about.
    pub const NOTIFICATION: u8 = 0x41;
    /// Board reports an error, code in byte 1.
    pub const ERROR: u8 = 0xEE;
    /// Ping request from the robot and "I'm here" reply from the board.
    pub const REPORT_ALIVE: u8 = 0xFF;
}

/// FET board opcodes. Outbound only.
pub mod fet {
    pub const TURN_OFF: u8 = 0x00;
    pub const TURN_ON: u8 = 0x01;
}

/// Raw message prepared for sending or just received.
///
/// Only standard (11-bit) data frames are representable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanMessage {
    id: u16,
    length: u8,
    data: [u8; 8],
}

impl CanMessage {
    /// Build from an 11-bit ID and up to 8 bytes of payload.
    pub fn from_bytes(id: u16, data: &[u8]) -> Option<Self> {
        if id > StandardId::MAX.as_raw() || data.len() > 8 {
            return None;
        }
        let mut raw = Self {
            id,
            length: data.len() as u8,
            data: [0; 8],
        };
        raw.data[0..data.len()].copy_from_slice(data);
        Some(raw)
    }

    /// Reconstruct from a frame received on any driver. Extended and remote
    /// frames are not ours.
    pub fn from_frame<F: Frame>(frame: &F) -> Option<Self> {
        if frame.is_remote_frame() {
            return None;
        }
        match frame.id() {
            Id::Standard(id) => Self::from_bytes(id.as_raw(), frame.data()),
            Id::Extended(_) => None,
        }
    }

    /// Convert into the frame type of a concrete CAN driver.
    pub fn to_frame<F: Frame>(&self) -> Option<F> {
        let id = StandardId::new(self.id)?;
        F::new(id, self.data_as_slice())
    }

    pub fn can_id(&self) -> u16 {
        self.id
    }

    pub fn length(&self) -> u8 {
        self.length
    }

    pub fn data_as_slice(&self) -> &[u8] {
        &self.data[0..self.length as usize]
    }

    /// First payload byte. `None` for empty frames.
    pub fn opcode(&self) -> Option<u8> {
        self.data_as_slice().first().copied()
    }
}

impl Frame for CanMessage {
    fn new(id: impl Into<Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            Id::Standard(id) => Self::from_bytes(id.as_raw(), data),
            Id::Extended(_) => None,
        }
    }

    fn new_remote(_id: impl Into<Id>, _dlc: usize) -> Option<Self> {
        None
    }

    fn is_extended(&self) -> bool {
        false
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> Id {
        // from_bytes() keeps the ID within 11 bits.
        Id::Standard(StandardId::new(self.id).unwrap_or(StandardId::ZERO))
    }

    fn dlc(&self) -> usize {
        self.length as usize
    }

    fn data(&self) -> &[u8] {
        self.data_as_slice()
    }
}

/// This holds the decoded message internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Message {
    /// Switch FET output on.
    TurnOn { output: u8 },
    /// Switch FET output off.
    TurnOff { output: u8 },

    /// Ping request, or the answer to it.
    ReportAlive,
    /// Board-side error.
    Error { code: u8 },
    /// Board-side notification.
    Notification,
    /// Frames per second the board is processing.
    FpsSending { fps: u16 },
}

impl Message {
    /// Parse messages common to all motor boards. FET opcodes are never sent
    /// by the board, so they yield `None` here like any unknown opcode.
    pub fn from_raw(raw: &CanMessage) -> Option<Self> {
        let data = raw.data_as_slice();
        match *data.first()? {
            common::REPORT_ALIVE => Some(Message::ReportAlive),
            common::NOTIFICATION => Some(Message::Notification),
            common::ERROR => {
                if data.len() < 2 {
                    log_warn!("Error report without a code from {:#x}", raw.can_id());
                    return None;
                }
                Some(Message::Error { code: data[1] })
            }
            common::FPS_SENDING => {
                if data.len() < 3 {
                    log_warn!("FPS report has invalid length {}", data.len());
                    return None;
                }
                Some(Message::FpsSending {
                    fps: u16::from_le_bytes([data[1], data[2]]),
                })
            }
            _ => None,
        }
    }

    /// Serialize into a frame addressed to `can_id`.
    pub fn to_raw(&self, can_id: u16) -> Option<CanMessage> {
        match self {
            Message::TurnOn { output } => CanMessage::from_bytes(can_id, &[fet::TURN_ON, *output]),
            Message::TurnOff { output } => {
                CanMessage::from_bytes(can_id, &[fet::TURN_OFF, *output])
            }
            Message::ReportAlive => CanMessage::from_bytes(can_id, &[common::REPORT_ALIVE]),
            Message::Error { code } => CanMessage::from_bytes(can_id, &[common::ERROR, *code]),
            Message::Notification => CanMessage::from_bytes(can_id, &[common::NOTIFICATION]),
            Message::FpsSending { fps } => {
                let fps = fps.to_le_bytes();
                CanMessage::from_bytes(can_id, &[common::FPS_SENDING, fps[0], fps[1]])
            }
        }
    }
}
