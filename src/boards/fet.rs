//! Driver for the 8-slot FET (relay/MOSFET switch) board group.
//!
//! Every board switches two outputs. Boards get their CAN IDs from the slot
//! they were registered into, see [`config::can_ids`](crate::config::can_ids).
//! Commands are fire-and-forget: a successful transmit is all we know.

use embassy_sync::once_lock::OnceLock;
use embedded_can::blocking::Can;

use super::motor_board::{
    CommonCommands, CommonDecoder, Device, DeviceRegistry, ErrorLog, Registry,
    common_command_name,
};
use super::{Board, Decoded, DeviceIdx};
use crate::components::message::{CanMessage, Message, fet};
use crate::config::{self, BOARD_NAME, FetConfig, MAX_FET_BOARDS, OUTPUTS_PER_BOARD};
use crate::error::Error;
use crate::status::COUNTERS;

/// Opcode -> label table of FET specific commands.
#[derive(Debug)]
pub struct CommandNames {
    names: [(u8, &'static str); 2],
}

impl CommandNames {
    /// Build a fresh table. Use [`command_names`] for the shared one.
    pub fn new() -> Self {
        Self {
            names: [(fet::TURN_ON, "Turn on"), (fet::TURN_OFF, "Turn off")],
        }
    }

    pub fn get(&self, opcode: u8) -> Option<&'static str> {
        self.names
            .iter()
            .find(|(code, _)| *code == opcode)
            .map(|(_, name)| *name)
    }
}

impl Default for CommandNames {
    fn default() -> Self {
        Self::new()
    }
}

static COMMAND_NAMES: OnceLock<CommandNames> = OnceLock::new();

/// Shared table, built on first use and read-only afterwards.
pub fn command_names() -> &'static CommandNames {
    COMMAND_NAMES.get_or_init(CommandNames::new)
}

/// Group of FET boards on one CAN bus.
pub struct FetBoard<R = Registry<MAX_FET_BOARDS>, D = CommonCommands> {
    registry: R,
    decoder: D,
    config: FetConfig,
    errors: ErrorLog,
    names: &'static CommandNames,
}

impl FetBoard {
    pub fn new(config: FetConfig) -> Self {
        Self::with_parts(Registry::new(), CommonCommands, config)
    }
}

impl<R: DeviceRegistry, D: CommonDecoder> FetBoard<R, D> {
    /// Build with custom registry/decoder implementations.
    pub fn with_parts(registry: R, decoder: D, config: FetConfig) -> Self {
        Self {
            registry,
            decoder,
            config,
            errors: ErrorLog::new(),
            names: command_names(),
        }
    }

    /// Register the next board. Its CAN IDs come from the slot it lands in.
    pub fn add(&mut self, name: &str) -> Result<DeviceIdx, Error> {
        let slot = self.registry.count();
        let ids = if slot < self.config.max_boards {
            config::can_ids(slot)
        } else {
            None
        };
        let Some(ids) = ids else {
            return Err(self.fail(Error::TooManyBoards { count: slot }));
        };

        match self.registry.register(name, ids.can_in, ids.can_out) {
            Ok(idx) => {
                log_info!(
                    "Added {} #{} in={:#x} out={:#x}",
                    BOARD_NAME,
                    idx,
                    ids.can_in,
                    ids.can_out
                );
                Ok(idx)
            }
            Err(error) => Err(self.fail(error)),
        }
    }

    /// Turn output (0 or 1) of a board on.
    pub fn turn_on<C: Can>(
        &mut self,
        bus: &mut C,
        output: u8,
        device: DeviceIdx,
    ) -> Result<(), Error> {
        self.check_output(output)?;
        self.send(bus, device, Message::TurnOn { output })
    }

    /// Turn output (0 or 1) of a board off.
    pub fn turn_off<C: Can>(
        &mut self,
        bus: &mut C,
        output: u8,
        device: DeviceIdx,
    ) -> Result<(), Error> {
        self.check_output(output)?;
        self.send(bus, device, Message::TurnOff { output })
    }

    /// Ask a board to report back. The answer marks it alive.
    pub fn ping<C: Can>(&mut self, bus: &mut C, device: DeviceIdx) -> Result<(), Error> {
        self.send(bus, device, Message::ReportAlive)
    }

    /// Ping every registered board. Keeps going on failure, returns the first error.
    pub fn ping_all<C: Can>(&mut self, bus: &mut C) -> Result<(), Error> {
        let mut result = Ok(());
        for idx in 0..self.registry.count() {
            if let Err(error) = self.ping(bus, idx as DeviceIdx) {
                result = result.and(Err(error));
            }
        }
        result
    }

    /// Inspect a received frame. Frames of other boards are left untouched.
    ///
    /// A frame on one of our output IDs is always claimed, even when it
    /// can't be understood.
    pub fn decode(&mut self, message: &CanMessage) -> Decoded {
        let Some(idx) = self.registry.find_by_out_id(message.can_id()) else {
            return Decoded::NotForMe;
        };
        COUNTERS.frames_claimed.inc();

        let Some(opcode) = message.opcode() else {
            let error = Error::MalformedFrame {
                device: idx,
                opcode: None,
            };
            return Decoded::Rejected {
                device: idx,
                error: self.fail(error),
            };
        };

        let device = &mut self.registry.devices_mut()[idx as usize];
        if self.decoder.decode_common(message, device) {
            return Decoded::Handled { device: idx };
        }

        // A common opcode the decoder refused is missing its arguments.
        // Both FET opcodes travel robot -> board, so nothing else is valid here.
        let error = if common_command_name(opcode).is_some() {
            Error::MalformedFrame {
                device: idx,
                opcode: Some(opcode),
            }
        } else {
            Error::UnknownCommand {
                device: idx,
                opcode,
            }
        };
        Decoded::Rejected {
            device: idx,
            error: self.fail(error),
        }
    }

    /// Same as [`decode`](Self::decode), for frames of any CAN driver.
    pub fn decode_frame<F: embedded_can::Frame>(&mut self, frame: &F) -> Decoded {
        match CanMessage::from_frame(frame) {
            Some(message) => self.decode(&message),
            None => Decoded::NotForMe,
        }
    }

    /// Label of an opcode: FET specific first, then the common ones.
    pub fn command_name(&self, opcode: u8) -> Option<&'static str> {
        self.names
            .get(opcode)
            .or_else(|| common_command_name(opcode))
    }

    pub fn count(&self) -> usize {
        self.registry.count()
    }

    pub fn device(&self, idx: DeviceIdx) -> Option<&Device> {
        self.registry.device(idx)
    }

    pub fn alive(&self, idx: DeviceIdx) -> bool {
        self.device(idx).is_some_and(|device| device.alive)
    }

    /// Ordinals of boards that answered since registration.
    pub fn alive_devices(&self) -> impl Iterator<Item = DeviceIdx> + '_ {
        self.registry
            .devices()
            .iter()
            .enumerate()
            .filter(|(_, device)| device.alive)
            .map(|(idx, _)| idx as DeviceIdx)
    }

    pub fn config(&self) -> &FetConfig {
        &self.config
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    pub fn clear_errors(&mut self) {
        self.errors.clear();
    }

    fn check_output(&mut self, output: u8) -> Result<(), Error> {
        if output >= OUTPUTS_PER_BOARD {
            return Err(self.fail(Error::OutputOutOfRange { output }));
        }
        Ok(())
    }

    /// Transmit a message to a board's input ID.
    fn send<C: Can>(
        &mut self,
        bus: &mut C,
        device: DeviceIdx,
        message: Message,
    ) -> Result<(), Error> {
        let Some(can_in) = self.registry.device(device).map(|d| d.can_in) else {
            return Err(self.fail(Error::DeviceNotFound { device }));
        };

        let frame = message
            .to_raw(can_in)
            .and_then(|raw| raw.to_frame::<C::Frame>());
        let Some(frame) = frame else {
            return Err(self.fail(Error::InvalidFrame));
        };

        if let Err(e) = bus.transmit(&frame) {
            return Err(self.fail(e.into()));
        }
        COUNTERS.frames_sent.inc();
        log_info!("{} #{} <- {:?}", BOARD_NAME, device, message);
        Ok(())
    }

    /// Record a non-fatal error and hand it back to the caller.
    fn fail(&mut self, error: Error) -> Error {
        match error {
            Error::TooManyBoards { .. } => COUNTERS.too_many_boards.inc(),
            Error::OutputOutOfRange { .. } => COUNTERS.invalid_output.inc(),
            Error::UnknownCommand { .. } => COUNTERS.unknown_command.inc(),
            Error::MalformedFrame { .. } => COUNTERS.malformed_frame.inc(),
            Error::Bus(_) => COUNTERS.bus_error.inc(),
            _ => {}
        }
        if let Error::Bus(_) = error {
            log_error!("{}", error);
        } else {
            log_warn!("{}", error);
        }
        self.errors.record(error);
        error
    }
}

impl<R: DeviceRegistry, D: CommonDecoder> Board for FetBoard<R, D> {
    fn name(&self) -> &'static str {
        BOARD_NAME
    }

    fn count(&self) -> usize {
        FetBoard::count(self)
    }

    fn decode(&mut self, message: &CanMessage) -> Decoded {
        FetBoard::decode(self, message)
    }

    fn command_name(&self, opcode: u8) -> Option<&'static str> {
        FetBoard::command_name(self, opcode)
    }
}
