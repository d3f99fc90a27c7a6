//! Pure data-shaping helpers for the market charts: zoom/scroll windowing,
//! candlestick density thinning and per-interval request budgets. Stateless
//! by design; the caller owns zoom level and scroll position.

use crate::models::{CandlePoint, KlineInterval, PricePoint};

/// Scroll headroom at 1x zoom: only 80% of the series is shown.
const UNZOOMED_VISIBLE_RATIO: f64 = 0.8;
/// Never zoom in past this many visible points.
const MIN_VISIBLE_POINTS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartStyle {
    Line,
    Candlestick,
}

/// How many points to request from the feed for a given interval and
/// rendering style.
pub fn point_budget(interval: KlineInterval, style: ChartStyle) -> u32 {
    match style {
        ChartStyle::Line => interval.line_points(),
        ChartStyle::Candlestick => interval.candle_points(),
    }
}

/// The contiguous visible slice of `data` for a zoom factor and scroll
/// offset. The scroll offset is clamped to keep the window inside the
/// series.
pub fn zoom_window<T>(data: &[T], zoom: f64, scroll: f64) -> &[T] {
    if data.is_empty() {
        return data;
    }

    let total = data.len();
    let visible = if zoom == 1.0 {
        (total as f64 * UNZOOMED_VISIBLE_RATIO).floor() as usize
    } else {
        ((total as f64 / zoom).floor() as usize).max(MIN_VISIBLE_POINTS)
    };

    let max_scroll = total.saturating_sub(visible);
    let start = (scroll.max(0.0).floor() as usize).min(max_scroll);
    let end = (start + visible).min(total);

    &data[start..end]
}

/// Collapse candles to their close prices for line rendering.
pub fn line_series(data: &[CandlePoint]) -> Vec<PricePoint> {
    data.iter().map(CandlePoint::close_point).collect()
}

/// Thin a candle series so individual candles stay legible: above 100
/// points keep every ⌈n/100⌉-th, above 50 every 2nd. Minute candles are
/// exempt so the minute-by-minute rhythm survives.
pub fn thin_candles(data: &[CandlePoint], interval: KlineInterval) -> Vec<CandlePoint> {
    if interval == KlineInterval::OneMinute || data.len() <= 50 {
        return data.to_vec();
    }

    let step = if data.len() > 100 {
        data.len().div_ceil(100)
    } else {
        2
    };
    data.iter().step_by(step).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles(n: usize) -> Vec<CandlePoint> {
        (0..n)
            .map(|i| CandlePoint {
                date: chrono::DateTime::from_timestamp(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1.0,
            })
            .collect()
    }

    #[test]
    fn unzoomed_window_shows_eighty_percent() {
        let data: Vec<u32> = (0..100).collect();
        let window = zoom_window(&data, 1.0, 0.0);
        assert_eq!(window.len(), 80);
        assert_eq!(window[0], 0);
    }

    #[test]
    fn zoomed_window_divides_the_series() {
        let data: Vec<u32> = (0..100).collect();
        assert_eq!(zoom_window(&data, 2.0, 0.0).len(), 50);
        assert_eq!(zoom_window(&data, 4.0, 0.0).len(), 25);
    }

    #[test]
    fn deep_zoom_is_floored_at_ten_points() {
        let data: Vec<u32> = (0..100).collect();
        assert_eq!(zoom_window(&data, 50.0, 0.0).len(), 10);
    }

    #[test]
    fn scroll_is_clamped_to_the_series() {
        let data: Vec<u32> = (0..100).collect();

        let window = zoom_window(&data, 2.0, 1_000.0);
        assert_eq!(window.len(), 50);
        assert_eq!(*window.first().unwrap(), 50);
        assert_eq!(*window.last().unwrap(), 99);

        let window = zoom_window(&data, 2.0, -5.0);
        assert_eq!(*window.first().unwrap(), 0);
    }

    #[test]
    fn window_of_empty_series_is_empty() {
        let data: Vec<u32> = Vec::new();
        assert!(zoom_window(&data, 1.0, 0.0).is_empty());
    }

    #[test]
    fn tiny_series_survives_deep_zoom() {
        let data: Vec<u32> = (0..4).collect();
        // The 10-point floor exceeds the series; the window is the whole of it.
        assert_eq!(zoom_window(&data, 8.0, 0.0).len(), 4);
    }

    #[test]
    fn small_candle_series_is_untouched() {
        let data = candles(50);
        assert_eq!(thin_candles(&data, KlineInterval::OneHour).len(), 50);
    }

    #[test]
    fn medium_candle_series_keeps_every_second_point() {
        let data = candles(80);
        assert_eq!(thin_candles(&data, KlineInterval::OneHour).len(), 40);
    }

    #[test]
    fn large_candle_series_is_stepped_to_about_a_hundred() {
        let data = candles(288);
        let thinned = thin_candles(&data, KlineInterval::FiveMinutes);
        // step = ceil(288 / 100) = 3
        assert_eq!(thinned.len(), 96);
    }

    #[test]
    fn minute_candles_are_never_thinned() {
        let data = candles(240);
        assert_eq!(thin_candles(&data, KlineInterval::OneMinute).len(), 240);
    }

    #[test]
    fn line_series_takes_the_close_of_each_candle() {
        let data = candles(3);
        let series = line_series(&data);
        assert_eq!(series.len(), 3);
        assert!(series.iter().all(|p| p.price == 100.5));
        assert_eq!(series[0].date, data[0].date);
    }

    #[test]
    fn candlestick_budget_halves_five_minute_density() {
        assert_eq!(point_budget(KlineInterval::FiveMinutes, ChartStyle::Line), 288);
        assert_eq!(
            point_budget(KlineInterval::FiveMinutes, ChartStyle::Candlestick),
            144
        );
        assert_eq!(point_budget(KlineInterval::OneDay, ChartStyle::Line), 30);
    }
}
