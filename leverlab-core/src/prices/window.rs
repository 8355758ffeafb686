//! Price window extraction for lookback-based stop losses.

use super::ohlc::Ohlc;
use crate::domain::{CandleBody, OrderSettings};

/// OHLC sub-window ending at the current bar.
///
/// `entry` is the current bar's open. Without a lookback basis the window is
/// the single first bar, which later logic never reads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceWindow<'a> {
    pub entry: f64,
    pub open: &'a [f64],
    pub high: &'a [f64],
    pub low: &'a [f64],
    pub close: &'a [f64],
    start: usize,
}

impl<'a> PriceWindow<'a> {
    /// First bar index covered by the window.
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }

    #[inline]
    pub fn series(&self, body: CandleBody) -> &'a [f64] {
        match body {
            CandleBody::Open => self.open,
            CandleBody::High => self.high,
            CandleBody::Low => self.low,
            CandleBody::Close => self.close,
        }
    }

    /// Lowest value of `body` in the window.
    pub fn lowest(&self, body: CandleBody) -> f64 {
        self.series(body).iter().copied().fold(f64::INFINITY, f64::min)
    }

    /// Highest value of `body` in the window.
    pub fn highest(&self, body: CandleBody) -> f64 {
        self.series(body)
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }
}

/// Extract the window `settings` needs at `bar_idx`.
///
/// `lookback_start = max(bar_idx - lookback, 0)`; the slice is inclusive of
/// `bar_idx`, so it is never empty.
#[inline]
pub fn price_window<'a>(bar_idx: usize, ohlc: &'a Ohlc, settings: &OrderSettings) -> PriceWindow<'a> {
    let entry = ohlc.open[bar_idx];
    let (start, end) = match settings.sl_based_on {
        Some(_) => (bar_idx.saturating_sub(settings.sl_based_on_lookback), bar_idx + 1),
        None => (0, 1),
    };
    PriceWindow {
        entry,
        open: &ohlc.open[start..end],
        high: &ohlc.high[start..end],
        low: &ohlc.low[start..end],
        close: &ohlc.close[start..end],
        start,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prices::Bar;

    fn ramp(n: usize) -> Ohlc {
        let bars: Vec<Bar> = (0..n)
            .map(|i| {
                let p = 100.0 + i as f64;
                Bar::new(p, p + 1.0, p - 1.0, p + 0.5)
            })
            .collect();
        Ohlc::from_bars(&bars)
    }

    #[test]
    fn disabled_basis_gives_single_bar_window() {
        let ohlc = ramp(10);
        let settings = OrderSettings::default();
        let w = price_window(7, &ohlc, &settings);
        assert_eq!(w.entry, 107.0);
        assert_eq!(w.len(), 1);
        assert_eq!(w.start(), 0);
    }

    #[test]
    fn lookback_window_is_inclusive() {
        let ohlc = ramp(10);
        let settings = OrderSettings {
            sl_based_on: Some(CandleBody::Low),
            sl_based_on_lookback: 3,
            ..OrderSettings::default()
        };
        let w = price_window(7, &ohlc, &settings);
        assert_eq!(w.start(), 4);
        assert_eq!(w.len(), 4);
        assert_eq!(w.lowest(CandleBody::Low), 103.0);
        assert_eq!(w.highest(CandleBody::High), 108.0);
    }

    #[test]
    fn lookback_clamps_at_series_start() {
        let ohlc = ramp(10);
        let settings = OrderSettings {
            sl_based_on: Some(CandleBody::Low),
            sl_based_on_lookback: 50,
            ..OrderSettings::default()
        };
        let w = price_window(2, &ohlc, &settings);
        assert_eq!(w.start(), 0);
        assert_eq!(w.len(), 3);
    }
}
