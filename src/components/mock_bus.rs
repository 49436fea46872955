use embedded_can::{ErrorKind, blocking::Can};

use super::message::CanMessage;

/// In-memory bus recording everything transmitted.
#[derive(Default)]
pub struct MockBus {
    pub sent: Vec<CanMessage>,
    pub fail: Option<ErrorKind>,
}

impl MockBus {
    pub fn failing(kind: ErrorKind) -> Self {
        Self {
            sent: Vec::new(),
            fail: Some(kind),
        }
    }
}

impl Can for MockBus {
    type Frame = CanMessage;
    type Error = ErrorKind;

    fn transmit(&mut self, frame: &CanMessage) -> Result<(), ErrorKind> {
        if let Some(kind) = self.fail {
            return Err(kind);
        }
        self.sent.push(*frame);
        Ok(())
    }

    fn receive(&mut self) -> Result<CanMessage, ErrorKind> {
        Err(ErrorKind::Overrun)
    }
}
