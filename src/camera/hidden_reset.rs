/// Escape hatch hidden behind the fake gallery button
///
/// Every `threshold`-th tap fires exactly once and the count starts over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HiddenResetCounter {
    taps: u32,
    threshold: u32,
}

impl HiddenResetCounter {
    pub fn new(threshold: u32) -> Self {
        Self {
            taps: 0,
            threshold: threshold.max(1),
        }
    }

    /// Register a tap; returns true when the reset should fire
    pub fn tap(&mut self) -> bool {
        self.taps += 1;
        if self.taps >= self.threshold {
            self.taps = 0;
            true
        } else {
            false
        }
    }

    pub fn taps(&self) -> u32 {
        self.taps
    }

    pub fn reset(&mut self) {
        self.taps = 0;
    }
}

impl Default for HiddenResetCounter {
    fn default() -> Self {
        Self::new(3)
    }
}
