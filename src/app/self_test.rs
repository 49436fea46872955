/*
 * Diagnostic exerciser: blink one output of every alive FET board.
 * - Off for `test_off_time`, on for `test_on_time`, repeat.
 * - The output alternates 0, 1, 0... after each on/off cycle.
 * Caller polls update() with the current time at its own cadence.
 */
use embassy_time::{Duration, Instant};
use embedded_can::blocking::Can;
use heapless::Vec;

use crate::boards::motor_board::{CommonDecoder, DeviceRegistry};
use crate::boards::{DeviceIdx, FetBoard};
use crate::config::{MAX_FET_BOARDS, OUTPUTS_PER_BOARD};
use crate::error::Error;

/// Internal state machine of the exerciser.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Phase {
    /// Outputs are off since Instant.
    Off(Instant),
    /// Outputs are on since Instant.
    On(Instant),
}

/// Result of a single update.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Nothing sent.
    Wait,
    /// Output turned on on `devices` boards.
    TurnedOn { output: u8, devices: u8 },
    /// Output turned off on `devices` boards.
    TurnedOff { output: u8, devices: u8 },
}

pub struct SelfTest {
    phase: Phase,
    /// Output exercised in the current cycle.
    output: u8,
}

impl SelfTest {
    /// Start in the off phase, beginning at `now`, with output 0.
    pub fn new(now: Instant) -> Self {
        Self {
            phase: Phase::Off(now),
            output: 0,
        }
    }

    pub fn output(&self) -> u8 {
        self.output
    }

    pub fn is_on(&self) -> bool {
        matches!(self.phase, Phase::On(_))
    }

    /// Advance to `now`, sending commands if a phase ended.
    ///
    /// A failed send to one board doesn't stop the others; the phase still
    /// changes and the first error is returned.
    pub fn update<R, D, C>(
        &mut self,
        board: &mut FetBoard<R, D>,
        bus: &mut C,
        now: Instant,
    ) -> Result<Step, Error>
    where
        R: DeviceRegistry,
        D: CommonDecoder,
        C: Can,
    {
        let (since, limit) = match self.phase {
            Phase::Off(since) => (since, board.config().test_off_time),
            Phase::On(since) => (since, board.config().test_on_time),
        };
        let elapsed = now
            .checked_duration_since(since)
            .unwrap_or(Duration::from_ticks(0));
        if elapsed < limit {
            return Ok(Step::Wait);
        }

        let alive: Vec<DeviceIdx, MAX_FET_BOARDS> =
            board.alive_devices().take(MAX_FET_BOARDS).collect();
        if alive.is_empty() {
            // Nobody to blink. Re-arm the timer and stay in this phase.
            self.phase = match self.phase {
                Phase::Off(_) => Phase::Off(now),
                Phase::On(_) => Phase::On(now),
            };
            return Ok(Step::Wait);
        }

        let output = self.output;
        let turn_on = matches!(self.phase, Phase::Off(_));
        let mut result = Ok(());
        for device in alive.iter().copied() {
            let sent = if turn_on {
                board.turn_on(bus, output, device)
            } else {
                board.turn_off(bus, output, device)
            };
            if let Err(error) = sent {
                result = result.and(Err(error));
            }
        }

        let devices = alive.len() as u8;
        let step = if turn_on {
            self.phase = Phase::On(now);
            log_info!("On {}", output);
            Step::TurnedOn { output, devices }
        } else {
            self.phase = Phase::Off(now);
            self.output = (output + 1) % OUTPUTS_PER_BOARD;
            log_info!("Off {}", output);
            Step::TurnedOff { output, devices }
        };

        result.map(|()| step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::message::{CanMessage, common, fet};
    use crate::components::mock_bus::MockBus;
    use crate::config::FetConfig;

    fn alive_board(n: usize) -> FetBoard {
        let mut board = FetBoard::new(FetConfig::default());
        for slot in 0..n {
            board.add("FET").unwrap();
            let ids = crate::config::can_ids(slot).unwrap();
            let alive = CanMessage::from_bytes(ids.can_out, &[common::REPORT_ALIVE]).unwrap();
            assert!(board.decode(&alive).claimed());
        }
        board
    }

    #[test]
    fn waits_for_off_time() {
        let mut board = alive_board(1);
        let mut bus = MockBus::default();
        let start = Instant::from_millis(0);
        let mut test = SelfTest::new(start);

        let step = test
            .update(&mut board, &mut bus, start + Duration::from_millis(1999))
            .unwrap();
        assert_eq!(step, Step::Wait);
        assert!(bus.sent.is_empty());
        assert!(!test.is_on());
    }

    #[test]
    fn sweeps_every_alive_board() {
        let mut board = alive_board(3);
        let mut bus = MockBus::default();
        let start = Instant::from_millis(0);
        let mut test = SelfTest::new(start);

        let step = test
            .update(&mut board, &mut bus, start + Duration::from_millis(2000))
            .unwrap();
        assert_eq!(step, Step::TurnedOn { output: 0, devices: 3 });
        assert_eq!(bus.sent.len(), 3);
        assert!(bus.sent.iter().all(|m| m.data_as_slice() == [fet::TURN_ON, 0]));
    }

    #[test]
    fn no_alive_boards_rearms_timer() {
        let mut board = FetBoard::new(FetConfig::default());
        board.add("FET-0").unwrap();
        let mut bus = MockBus::default();
        let start = Instant::from_millis(0);
        let mut test = SelfTest::new(start);

        let at = start + Duration::from_millis(2500);
        assert_eq!(test.update(&mut board, &mut bus, at), Ok(Step::Wait));
        assert!(bus.sent.is_empty());
        assert!(!test.is_on());
        // Timer restarted at 2500.
        let at = start + Duration::from_millis(4000);
        assert_eq!(test.update(&mut board, &mut bus, at), Ok(Step::Wait));
    }

    #[test]
    fn send_error_still_changes_phase() {
        let mut board = alive_board(1);
        let mut bus = MockBus::failing(embedded_can::ErrorKind::Other);
        let start = Instant::from_millis(0);
        let mut test = SelfTest::new(start);

        let result = test.update(&mut board, &mut bus, start + Duration::from_millis(2000));
        assert_eq!(result, Err(Error::Bus(embedded_can::ErrorKind::Other)));
        assert!(test.is_on());
    }
}
