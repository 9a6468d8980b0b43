//! Sentiment/price correlation over a trailing history window.
//!
//! Pairs daily percentage price changes with the sentiment score on the
//! later day of each pair, then runs a standard Pearson coefficient.

use rand::Rng;

/// Divergence is also flagged when the window correlation sits below the
/// negative of this threshold.
pub const DIVERGENCE_THRESHOLD: f64 = 0.3;

/// Below this many historical records the coefficient is a placeholder,
/// not a computed value.
pub const MIN_HISTORY_FOR_CORRELATION: usize = 7;

/// One day of paired observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub sentiment: f64,
    pub price: f64,
}

/// Correlation carried with its provenance: `computed` is false for the
/// cold-start placeholder so consumers can tell the two apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorrelationSignal {
    pub value: f64,
    pub computed: bool,
}

fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.len() != y.len() || x.is_empty() {
        return 0.0;
    }

    let n = x.len() as f64;
    let mean_x = x.iter().sum::<f64>() / n;
    let mean_y = y.iter().sum::<f64>() / n;

    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;

    for i in 0..x.len() {
        let dx = x[i] - mean_x;
        let dy = y[i] - mean_y;
        numerator += dx * dy;
        sum_sq_x += dx * dx;
        sum_sq_y += dy * dy;
    }

    let denominator = (sum_sq_x * sum_sq_y).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }

    numerator / denominator
}

/// Pearson coefficient between daily percentage price changes and same-day
/// sentiment, rounded to two decimals. Zero-variance series and windows
/// shorter than two points return 0.
pub fn sentiment_price_correlation(points: &[SeriesPoint]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }

    let mut price_changes = Vec::with_capacity(points.len() - 1);
    for pair in points.windows(2) {
        if pair[0].price == 0.0 {
            return 0.0;
        }
        price_changes.push((pair[1].price - pair[0].price) / pair[0].price * 100.0);
    }

    // Each change pairs with the sentiment on the later day, so the first
    // sentiment value drops out.
    let sentiments: Vec<f64> = points[1..].iter().map(|p| p.sentiment).collect();

    let correlation = pearson(&price_changes, &sentiments);
    (correlation * 100.0).round() / 100.0
}

/// Correlation over a sliding window. Windows larger than the series
/// collapse to a single full-series coefficient.
#[allow(dead_code)]
pub fn rolling_correlation(points: &[SeriesPoint], window: usize) -> Vec<f64> {
    if window == 0 || points.len() < window {
        return vec![sentiment_price_correlation(points)];
    }

    (window - 1..points.len())
        .map(|i| sentiment_price_correlation(&points[i + 1 - window..=i]))
        .collect()
}

/// True when sentiment and price are pulling apart: the last two points
/// moved in opposite directions, or the window correlation is significantly
/// negative.
pub fn detect_divergence(points: &[SeriesPoint], threshold: f64) -> bool {
    if points.len() < 2 {
        return false;
    }

    if sentiment_price_correlation(points) < -threshold {
        return true;
    }

    let prev = points[points.len() - 2];
    let last = points[points.len() - 1];
    let sentiment_delta = last.sentiment - prev.sentiment;
    let price_delta = last.price - prev.price;

    (sentiment_delta > 0.0 && price_delta < 0.0) || (sentiment_delta < 0.0 && price_delta > 0.0)
}

/// Correlation for today's record. With enough history the coefficient is
/// computed over history plus today; cold-start assets get a pseudo-random
/// placeholder in [-1, 1] flagged as not computed.
pub fn correlation_signal(history: &[SeriesPoint], today: SeriesPoint) -> CorrelationSignal {
    if history.len() < MIN_HISTORY_FOR_CORRELATION {
        return CorrelationSignal {
            value: placeholder_correlation(),
            computed: false,
        };
    }

    let mut points = history.to_vec();
    points.push(today);

    CorrelationSignal {
        value: sentiment_price_correlation(&points),
        computed: true,
    }
}

fn placeholder_correlation() -> f64 {
    rand::rng().random_range(-1.0..=1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(pairs: &[(f64, f64)]) -> Vec<SeriesPoint> {
        pairs
            .iter()
            .map(|&(sentiment, price)| SeriesPoint { sentiment, price })
            .collect()
    }

    #[test]
    fn fewer_than_two_points_is_zero() {
        assert_eq!(sentiment_price_correlation(&[]), 0.0);
        assert_eq!(
            sentiment_price_correlation(&series(&[(60.0, 100.0)])),
            0.0
        );
    }

    #[test]
    fn constant_price_series_is_exactly_zero() {
        let points = series(&[
            (40.0, 100.0),
            (55.0, 100.0),
            (70.0, 100.0),
            (65.0, 100.0),
        ]);
        assert_eq!(sentiment_price_correlation(&points), 0.0);
    }

    #[test]
    fn constant_sentiment_series_is_exactly_zero() {
        let points = series(&[(50.0, 100.0), (50.0, 105.0), (50.0, 99.0), (50.0, 110.0)]);
        assert_eq!(sentiment_price_correlation(&points), 0.0);
    }

    #[test]
    fn aligned_series_correlate_positively() {
        // Sentiment tracks each day's price move exactly.
        let points = series(&[
            (50.0, 100.0),
            (60.0, 110.0),
            (40.0, 95.0),
            (70.0, 120.0),
            (45.0, 100.0),
        ]);
        let corr = sentiment_price_correlation(&points);
        assert!(corr > 0.8, "expected strong positive, got {corr}");
        assert!(corr <= 1.0);
    }

    #[test]
    fn sign_flips_when_sentiment_inverts() {
        let up = series(&[
            (50.0, 100.0),
            (60.0, 110.0),
            (40.0, 95.0),
            (70.0, 120.0),
        ]);
        // Same prices, sentiment mirrored around 50.
        let down = series(&[
            (50.0, 100.0),
            (40.0, 110.0),
            (60.0, 95.0),
            (30.0, 120.0),
        ]);

        let corr_up = sentiment_price_correlation(&up);
        let corr_down = sentiment_price_correlation(&down);

        assert!((corr_up + corr_down).abs() < 0.011, "magnitudes should mirror");
        assert!(corr_up > 0.0 && corr_down < 0.0);
        assert!((-1.0..=1.0).contains(&corr_up));
        assert!((-1.0..=1.0).contains(&corr_down));
    }

    #[test]
    fn result_is_rounded_to_two_decimals() {
        let points = series(&[
            (52.0, 100.0),
            (61.0, 103.0),
            (48.0, 101.0),
            (66.0, 107.0),
            (58.0, 104.0),
        ]);
        let corr = sentiment_price_correlation(&points);
        assert_eq!(corr, (corr * 100.0).round() / 100.0);
    }

    #[test]
    fn divergence_flags_opposite_last_two_moves() {
        // Sentiment up, price down.
        let points = series(&[(50.0, 100.0), (55.0, 98.0)]);
        assert!(detect_divergence(&points, DIVERGENCE_THRESHOLD));

        // Sentiment down, price up.
        let points = series(&[(50.0, 100.0), (45.0, 102.0)]);
        assert!(detect_divergence(&points, DIVERGENCE_THRESHOLD));

        // Tiny magnitudes still count.
        let points = series(&[(50.0, 100.0), (50.1, 99.99)]);
        assert!(detect_divergence(&points, DIVERGENCE_THRESHOLD));
    }

    #[test]
    fn divergence_not_flagged_when_aligned() {
        let points = series(&[(50.0, 100.0), (55.0, 102.0)]);
        assert!(!detect_divergence(&points, DIVERGENCE_THRESHOLD));

        let points = series(&[(50.0, 100.0), (45.0, 98.0)]);
        assert!(!detect_divergence(&points, DIVERGENCE_THRESHOLD));
    }

    #[test]
    fn strongly_negative_window_correlation_flags_divergence() {
        // Last two points move together, but across the window the big price
        // rallies land on the low-sentiment days.
        let points = series(&[
            (50.0, 100.0),
            (10.0, 105.0),
            (20.0, 109.2),
            (30.0, 112.48),
            (80.0, 107.98),
            (90.0, 102.58),
            (91.0, 102.68),
        ]);
        assert!(sentiment_price_correlation(&points) < -DIVERGENCE_THRESHOLD);
        assert!(detect_divergence(&points, DIVERGENCE_THRESHOLD));
    }

    #[test]
    fn rolling_correlation_short_series_collapses() {
        let points = series(&[(50.0, 100.0), (60.0, 105.0)]);
        let rolled = rolling_correlation(&points, 7);
        assert_eq!(rolled.len(), 1);
    }

    #[test]
    fn rolling_correlation_emits_one_value_per_window() {
        let points = series(&[
            (50.0, 100.0),
            (60.0, 105.0),
            (55.0, 103.0),
            (65.0, 108.0),
            (60.0, 106.0),
        ]);
        let rolled = rolling_correlation(&points, 3);
        assert_eq!(rolled.len(), 3);
    }

    #[test]
    fn cold_start_uses_flagged_placeholder() {
        let history = series(&[(50.0, 100.0), (55.0, 101.0)]);
        let signal = correlation_signal(&history, SeriesPoint { sentiment: 60.0, price: 102.0 });

        assert!(!signal.computed);
        assert!((-1.0..=1.0).contains(&signal.value));
    }

    #[test]
    fn sufficient_history_computes_for_real() {
        let history = series(&[
            (50.0, 100.0),
            (52.0, 101.0),
            (54.0, 102.0),
            (56.0, 103.0),
            (58.0, 104.0),
            (60.0, 105.0),
            (62.0, 106.0),
        ]);
        let signal = correlation_signal(&history, SeriesPoint { sentiment: 64.0, price: 107.0 });

        assert!(signal.computed);
        assert!((-1.0..=1.0).contains(&signal.value));
    }
}
