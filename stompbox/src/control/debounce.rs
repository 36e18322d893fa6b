//! Tick-based debouncing and edge detection for push buttons.

/// Accepts a press only if enough ticks have passed since the last accepted one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debouncer {
    interval: u32,
    last_press: Option<u32>,
}

impl Debouncer {
    /// Create a debouncer requiring `interval` ticks between presses.
    pub const fn new(interval: u32) -> Self {
        Debouncer { interval, last_press: None }
    }

    /// Tick of the last accepted press.
    pub fn last_press(&self) -> Option<u32> {
        self.last_press
    }

    /// Register a press at tick `now`. Returns whether it was accepted; an
    /// accepted press restarts the interval.
    #[inline]
    pub fn accept(&mut self, now: u32) -> bool {
        let ready = match self.last_press {
            None => true,
            Some(last) => now.wrapping_sub(last) >= self.interval,
        };
        if ready {
            self.last_press = Some(now);
        }
        ready
    }
}

/// Rising-edge detector over a level signal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EdgeDetector {
    level: bool,
}

impl EdgeDetector {
    /// Start released.
    pub const fn new() -> Self {
        EdgeDetector { level: false }
    }

    /// Feed the current level; true only on a released-to-pressed transition.
    #[inline]
    pub fn rising(&mut self, level: bool) -> bool {
        let edge = level && !self.level;
        self.level = level;
        edge
    }
}
