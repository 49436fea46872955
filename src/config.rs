/* Constants configuring the crate */

use embassy_time::Duration;

/// Name used in diagnostics, eg. "Too many FET: 8."
pub const BOARD_NAME: &str = "FET";

/// Slot capacity. Each slot owns a fixed pair of CAN IDs.
pub const MAX_FET_BOARDS: usize = 8;

/// Each board switches two outputs: 0 and 1.
pub const OUTPUTS_PER_BOARD: u8 = 2;

pub const MAX_NAME_LEN: usize = 16;

/// Depth of the per-board diagnostic log.
pub const ERROR_LOG_LEN: usize = 8;

/// Self-test: how long an output stays on.
pub const TEST_ON_TIME: Duration = Duration::from_millis(200);
/// Self-test: pause between activations.
pub const TEST_OFF_TIME: Duration = Duration::from_millis(2000);

// Ids are 11-bit. Robot -> board on the even id, board -> robot on the odd one.
// Slot:        0      1      2      3      4      5      6      7
const CAN_ID_FET_IN: [u16; MAX_FET_BOARDS] =
    [0x340, 0x342, 0x344, 0x346, 0x348, 0x34A, 0x34C, 0x34E];
const CAN_ID_FET_OUT: [u16; MAX_FET_BOARDS] =
    [0x341, 0x343, 0x345, 0x347, 0x349, 0x34B, 0x34D, 0x34F];

/// CAN ID pair assigned to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CanIds {
    /// Frames the board listens to.
    pub can_in: u16,
    /// Frames the board transmits.
    pub can_out: u16,
}

/// Look up the CAN IDs of a slot. `None` past the last slot.
pub fn can_ids(slot: usize) -> Option<CanIds> {
    Some(CanIds {
        can_in: *CAN_ID_FET_IN.get(slot)?,
        can_out: *CAN_ID_FET_OUT.get(slot)?,
    })
}

/// Runtime configuration of a FET board group.
#[derive(Debug, Clone, Copy)]
pub struct FetConfig {
    /// Boards expected on the bus. Never above `MAX_FET_BOARDS`.
    pub max_boards: usize,
    pub test_on_time: Duration,
    pub test_off_time: Duration,
}

impl FetConfig {
    pub fn with_max_boards(max_boards: usize) -> Self {
        Self {
            max_boards: max_boards.min(MAX_FET_BOARDS),
            ..Self::default()
        }
    }
}

impl Default for FetConfig {
    fn default() -> Self {
        Self {
            max_boards: MAX_FET_BOARDS,
            test_on_time: TEST_ON_TIME,
            test_off_time: TEST_OFF_TIME,
        }
    }
}
