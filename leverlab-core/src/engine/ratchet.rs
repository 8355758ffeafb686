//! Stop ratchet: stops may tighten, never loosen.

use crate::domain::Side;

/// Ratchet over a stop level.
///
/// - Long positions: the stop can only rise
/// - Short positions: the stop can only fall
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopRatchet {
    level: f64,
    side: Side,
}

impl StopRatchet {
    pub fn new(side: Side, level: f64) -> Self {
        Self { level, side }
    }

    /// Offer `proposed` and return the level after the ratchet rule.
    ///
    /// ```
    /// use leverlab_core::domain::Side;
    /// use leverlab_core::engine::StopRatchet;
    ///
    /// let mut ratchet = StopRatchet::new(Side::Long, 95.0);
    /// assert_eq!(ratchet.apply(100.0), 100.0);
    /// assert_eq!(ratchet.apply(90.0), 100.0);
    /// ```
    #[inline]
    pub fn apply(&mut self, proposed: f64) -> f64 {
        if proposed.is_finite() && self.side.is_tighter(proposed, self.level) {
            self.level = proposed;
        }
        self.level
    }

    pub fn level(&self) -> f64 {
        self.level
    }
}
