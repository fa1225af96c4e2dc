//! Latest-value indicator helpers for screening.
//!
//! Screens only ever ask "what is the indicator right now", so everything
//! here returns the most recent value rather than a full series. The math
//! itself is not part of the screener contract; rules are the extension
//! point, formulas are swappable.

/// Simple moving average of the trailing `period` values.
pub fn sma(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let window = &data[data.len() - period..];
    Some(window.iter().sum::<f64>() / period as f64)
}

/// Exponential moving average, seeded with the SMA of the first `period`
/// values and smoothed over the rest of the series.
pub fn ema(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period {
        return None;
    }
    let multiplier = 2.0 / (period as f64 + 1.0);
    let mut value = data[..period].iter().sum::<f64>() / period as f64;
    for x in &data[period..] {
        value = (x - value) * multiplier + value;
    }
    Some(value)
}

/// Latest Wilder-smoothed RSI. Needs at least `period + 1` values.
pub fn rsi(data: &[f64], period: usize) -> Option<f64> {
    if period == 0 || data.len() < period + 1 {
        return None;
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);
    for pair in data.windows(2) {
        let change = pair[1] - pair[0];
        gains.push(change.max(0.0));
        losses.push((-change).max(0.0));
    }

    let mut avg_gain = gains[..period].iter().sum::<f64>() / period as f64;
    let mut avg_loss = losses[..period].iter().sum::<f64>() / period as f64;
    for i in period..gains.len() {
        avg_gain = (avg_gain * (period - 1) as f64 + gains[i]) / period as f64;
        avg_loss = (avg_loss * (period - 1) as f64 + losses[i]) / period as f64;
    }

    if avg_loss == 0.0 {
        return Some(100.0);
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - (100.0 / (1.0 + rs)))
}

/// Latest volume relative to a trailing average. None when the average is
/// zero or not a usable number.
pub fn volume_ratio(latest: f64, average: f64) -> Option<f64> {
    if !(average > 0.0) || !latest.is_finite() {
        return None;
    }
    Some(latest / average)
}
