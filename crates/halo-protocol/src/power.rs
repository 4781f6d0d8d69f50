/// Transmit-power rotation across broadcast epochs.
///
/// The protocol has no acknowledgment or range negotiation, so each
/// broadcast epoch probes a different range band: the rotator walks a
/// fixed ladder of discrete levels and wraps around.

/// Discrete transmit-power levels, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxPowerLevel {
    UltraLow,
    Low,
    Medium,
    High,
}

/// Default ladder: sweep the full range, weakest to strongest.
pub const DEFAULT_LADDER: [TxPowerLevel; 4] = [
    TxPowerLevel::UltraLow,
    TxPowerLevel::Low,
    TxPowerLevel::Medium,
    TxPowerLevel::High,
];

/// Cycles through a power ladder, one step per broadcast epoch.
#[derive(Debug)]
pub struct PowerRotator {
    ladder: Vec<TxPowerLevel>,
    index: usize,
}

impl PowerRotator {
    pub fn new() -> Self {
        Self::with_ladder(DEFAULT_LADDER.to_vec())
    }

    /// Custom ladder. Panics if empty.
    pub fn with_ladder(ladder: Vec<TxPowerLevel>) -> Self {
        assert!(!ladder.is_empty(), "power ladder must not be empty");
        Self { ladder, index: 0 }
    }

    /// Level for the upcoming broadcast epoch; advances the rotation.
    pub fn next(&mut self) -> TxPowerLevel {
        let level = self.ladder[self.index];
        self.index = (self.index + 1) % self.ladder.len();
        level
    }

    /// Level the next call to [`next`](Self::next) will return.
    pub fn peek(&self) -> TxPowerLevel {
        self.ladder[self.index]
    }
}

impl Default for PowerRotator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn walks_ladder_in_order_and_wraps() {
        let mut rotator = PowerRotator::new();
        assert_eq!(rotator.next(), TxPowerLevel::UltraLow);
        assert_eq!(rotator.next(), TxPowerLevel::Low);
        assert_eq!(rotator.next(), TxPowerLevel::Medium);
        assert_eq!(rotator.next(), TxPowerLevel::High);
        // Modulo wrap.
        assert_eq!(rotator.next(), TxPowerLevel::UltraLow);
    }

    #[test]
    fn peek_does_not_advance() {
        let mut rotator = PowerRotator::new();
        assert_eq!(rotator.peek(), TxPowerLevel::UltraLow);
        assert_eq!(rotator.peek(), TxPowerLevel::UltraLow);
        assert_eq!(rotator.next(), TxPowerLevel::UltraLow);
        assert_eq!(rotator.peek(), TxPowerLevel::Low);
    }

    #[test]
    fn single_level_ladder_repeats() {
        let mut rotator = PowerRotator::with_ladder(vec![TxPowerLevel::High]);
        assert_eq!(rotator.next(), TxPowerLevel::High);
        assert_eq!(rotator.next(), TxPowerLevel::High);
    }

    #[test]
    #[should_panic(expected = "power ladder must not be empty")]
    fn empty_ladder_panics() {
        PowerRotator::with_ladder(Vec::new());
    }
}
