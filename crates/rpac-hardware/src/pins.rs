//! In-memory pin implementations for wiring that has no GPIO behind it.

use crate::Result;
use crate::traits::OutputPin;
use std::sync::atomic::{AtomicBool, Ordering};

/// Output that simply remembers the last written level.
///
/// Used where a line is hard-wired on the board (for example RFID reader
/// power on a bench registration station) but the reader logic still wants
/// to switch and verify it.
#[derive(Debug, Default)]
pub struct LatchedOutput {
    level: AtomicBool,
}

impl LatchedOutput {
    /// Create a latched output at `level`.
    pub fn new(level: bool) -> Self {
        Self {
            level: AtomicBool::new(level),
        }
    }
}

impl OutputPin for LatchedOutput {
    fn write(&self, level: bool) -> Result<()> {
        self.level.store(level, Ordering::SeqCst);
        Ok(())
    }

    fn read(&self) -> Result<bool> {
        Ok(self.level.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latched_output_reads_back_write() {
        let pin = LatchedOutput::new(false);
        assert!(!pin.read().unwrap());
        pin.write(true).unwrap();
        assert!(pin.read().unwrap());
    }
}
