//! Rotary encoder quadrature decoding.
//!
//! The decoder consumes the 2-bit `AB` signal (`A` in bit 1, `B` in bit 0)
//! once per encoder interrupt. A detent is one full Gray-code cycle that
//! starts and ends on `11`:
//!
//! ```text
//!   clockwise:          11 ─► 01 ─► 00 ─► 10 ─► 11
//!   counter-clockwise:  11 ─► 10 ─► 00 ─► 01 ─► 11
//! ```
//!
//! One step back along the current path is followed (contact bounce). A
//! transition that flips both bits at once cannot come from a clean encoder
//! and drops the decoder back to idle, as does returning to `11` before the
//! cycle is complete.

/// Direction of one completed detent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Clockwise.
    Clockwise,
    /// Counter-clockwise.
    CounterClockwise,
}

/// Decoder position within a detent cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum QuadState {
    /// Resting on `11`.
    Idle,
    /// Clockwise, seen `01`.
    Cw01,
    /// Clockwise, seen `00`.
    Cw00,
    /// Clockwise, seen `10`.
    Cw10,
    /// Counter-clockwise, seen `10`.
    Ccw10,
    /// Counter-clockwise, seen `00`.
    Ccw00,
    /// Counter-clockwise, seen `01`.
    Ccw01,
}

impl QuadState {
    /// Next state for `ab`, plus the rotation completed by this step.
    pub const fn step(self, ab: u8) -> (QuadState, Option<Rotation>) {
        use QuadState::*;
        let ab = ab & 0b11;
        match (self, ab) {
            (Idle, 0b01) => (Cw01, None),
            (Idle, 0b10) => (Ccw10, None),

            (Cw01, 0b00) => (Cw00, None),
            (Cw01, 0b01) => (Cw01, None),
            (Cw00, 0b10) => (Cw10, None),
            (Cw00, 0b01) => (Cw01, None),
            (Cw00, 0b00) => (Cw00, None),
            (Cw10, 0b11) => (Idle, Some(Rotation::Clockwise)),
            (Cw10, 0b00) => (Cw00, None),
            (Cw10, 0b10) => (Cw10, None),

            (Ccw10, 0b00) => (Ccw00, None),
            (Ccw10, 0b10) => (Ccw10, None),
            (Ccw00, 0b01) => (Ccw01, None),
            (Ccw00, 0b10) => (Ccw10, None),
            (Ccw00, 0b00) => (Ccw00, None),
            (Ccw01, 0b11) => (Idle, Some(Rotation::CounterClockwise)),
            (Ccw01, 0b00) => (Ccw00, None),
            (Ccw01, 0b01) => (Ccw01, None),

            // Back on 11 early, or both bits flipped at once
            _ => (Idle, None),
        }
    }
}

/// Quadrature state machine with a one-event latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QuadratureDecoder {
    state: QuadState,
    pending: Option<Rotation>,
}

impl QuadratureDecoder {
    /// Start idle with nothing latched.
    pub const fn new() -> Self {
        QuadratureDecoder { state: QuadState::Idle, pending: None }
    }

    /// Current position in the cycle.
    pub fn state(&self) -> QuadState {
        self.state
    }

    /// Feed one 2-bit `AB` sample. A completed detent is latched until
    /// [`take_event`](Self::take_event); a newer detent replaces an unread one.
    #[inline]
    pub fn update(&mut self, ab: u8) {
        let (next, rotation) = self.state.step(ab);
        self.state = next;
        if let Some(rotation) = rotation {
            log::trace!("quadrature detent {:?}", rotation);
            self.pending = Some(rotation);
        }
    }

    /// Latched detent, without consuming it.
    pub fn pending(&self) -> Option<Rotation> {
        self.pending
    }

    /// Consume the latched detent.
    pub fn take_event(&mut self) -> Option<Rotation> {
        self.pending.take()
    }
}

impl Default for QuadratureDecoder {
    fn default() -> Self {
        Self::new()
    }
}
