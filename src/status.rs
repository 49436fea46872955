use core::sync::atomic::{AtomicU32, Ordering};

/// Event counter that can live in a `static`.
#[derive(Default)]
pub struct Counter(AtomicU32);

impl Counter {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

impl core::fmt::Debug for Counter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&self.get(), f)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Counter {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.get());
    }
}

/// Process-wide FET driver statistics.
#[derive(Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Counters {
    /// Command frames handed to the bus.
    pub frames_sent: Counter,
    /// Frames claimed by a FET board.
    pub frames_claimed: Counter,
    /// Registration past the last CAN ID slot.
    pub too_many_boards: Counter,
    /// Output number outside 0..=1.
    pub invalid_output: Counter,
    /// Claimed frame with an opcode we don't know.
    pub unknown_command: Counter,
    /// Claimed frame too short for its opcode.
    pub malformed_frame: Counter,
    /// CAN driver refused a frame.
    pub bus_error: Counter,
}

pub static COUNTERS: Counters = Counters {
    frames_sent: Counter::new(),
    frames_claimed: Counter::new(),
    too_many_boards: Counter::new(),
    invalid_output: Counter::new(),
    unknown_command: Counter::new(),
    malformed_frame: Counter::new(),
    bus_error: Counter::new(),
};

impl Counters {
    /// Any error counted since boot?
    pub fn has_problem(&self) -> bool {
        [
            &self.too_many_boards,
            &self.invalid_output,
            &self.unknown_command,
            &self.malformed_frame,
            &self.bus_error,
        ]
        .iter()
        .any(|counter| counter.get() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_counts() {
        let counter = Counter::new();
        counter.inc();
        counter.inc();
        assert_eq!(counter.get(), 2);
        assert_eq!(std::format!("{:?}", counter), "2");
    }

    #[test]
    fn local_counters_start_clean() {
        let counters = Counters {
            frames_sent: Counter::new(),
            frames_claimed: Counter::new(),
            too_many_boards: Counter::new(),
            invalid_output: Counter::new(),
            unknown_command: Counter::new(),
            malformed_frame: Counter::new(),
            bus_error: Counter::new(),
        };
        counters.frames_sent.inc();
        assert!(!counters.has_problem());
        counters.malformed_frame.inc();
        assert!(counters.has_problem());
    }
}
