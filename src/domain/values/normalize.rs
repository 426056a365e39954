//! Normalization of heterogeneous evidence into factor deltas.
//!
//! Every factor is expressed as a relative price delta: a fraction of the
//! baseline price (`0.05` means "five percent above baseline"). Each function
//! returns `None` when its evidence is missing or unusable, which makes the
//! factor inactive for the run.

use serde_json::Value;

/// Market and intrinsic deltas never move the price more than this.
pub const MAX_PRICE_GAP: f64 = 0.5;
/// Full-polarity sentiment moves the price by this fraction.
pub const SENTIMENT_SCALE: f64 = 0.10;
/// Bound on the macro-economic adjustment.
pub const MAX_ECONOMIC_DELTA: f64 = 0.05;
/// Premium for on-chain verified ownership.
pub const PROVENANCE_PREMIUM: f64 = 0.02;

/// Reads a numeric field, accepting numbers and numeric strings such as
/// `"+5.2%"` or `"1,200"`.
pub fn number(payload: &Value, key: &str) -> Option<f64> {
    match payload.get(key)? {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => {
            let cleaned: String = s
                .trim()
                .trim_end_matches('%')
                .chars()
                .filter(|c| *c != ',' && *c != '+')
                .collect();
            cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
        }
        _ => None,
    }
}

/// Relative gap between `price` and `baseline`, clamped to ±[`MAX_PRICE_GAP`].
pub fn relative_gap(price: f64, baseline: f64) -> Option<f64> {
    if baseline <= 0.0 || price <= 0.0 || !price.is_finite() {
        return None;
    }
    Some(((price - baseline) / baseline).clamp(-MAX_PRICE_GAP, MAX_PRICE_GAP))
}

/// Delta from a reported percentage change (`5.2` means +5.2%).
pub fn percent_delta(pct: f64) -> Option<f64> {
    if !pct.is_finite() {
        return None;
    }
    Some((pct / 100.0).clamp(-MAX_PRICE_GAP, MAX_PRICE_GAP))
}

/// Sentiment polarity in [-1, 1] scaled by [`SENTIMENT_SCALE`].
pub fn sentiment_delta(payload: &Value) -> Option<f64> {
    let polarity = number(payload, "overall_sentiment")?;
    Some(polarity.clamp(-1.0, 1.0) * SENTIMENT_SCALE)
}

/// Composite macro adjustment relative to neutral reference levels
/// (2% growth, 3% rates, 2% inflation, confidence index 100).
pub fn economic_delta(payload: &Value) -> Option<f64> {
    let gdp = number(payload, "gdp_growth");
    let rate = number(payload, "interest_rate");
    let inflation = number(payload, "inflation_rate");
    let sentiment = number(payload, "consumer_confidence");
    if gdp.is_none() && rate.is_none() && inflation.is_none() && sentiment.is_none() {
        return None;
    }
    let delta = gdp.map_or(0.0, |g| 0.01 * (g - 2.0))
        - rate.map_or(0.0, |r| 0.01 * (r - 3.0))
        - inflation.map_or(0.0, |i| 0.005 * (i - 2.0))
        + sentiment.map_or(0.0, |c| 0.001 * (c - 100.0));
    Some(delta.clamp(-MAX_ECONOMIC_DELTA, MAX_ECONOMIC_DELTA))
}

/// Comparable-sales average price in a market or auction payload.
pub fn comparable_price(payload: &Value) -> Option<f64> {
    number(payload, "average_price").filter(|p| *p > 0.0)
}

/// Intrinsic-value delta: mean of the available estimates against baseline.
pub fn intrinsic_delta(estimates: &[f64], baseline: f64) -> Option<f64> {
    let usable: Vec<f64> = estimates.iter().copied().filter(|p| *p > 0.0).collect();
    if usable.is_empty() {
        return None;
    }
    let mean = usable.iter().sum::<f64>() / usable.len() as f64;
    relative_gap(mean, baseline)
}
