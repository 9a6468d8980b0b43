//! Composite sentiment blend and the indicators derived from it.
//!
//! All pure arithmetic over one asset's three source readings; the batch
//! pipeline feeds these from live fetches, tests feed them directly.

use rand::Rng;

use crate::models::{
    AssetCategory, Recommendation, RiskLevel, SentimentStatus, SourceBreakdown,
};

/// The forum source is the lowest-volume channel; it keeps at least this
/// share of the blend so high-volume channels cannot drown it out entirely.
pub const FORUM_WEIGHT_FLOOR: f64 = 0.10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceWeights {
    pub forum: f64,
    pub microblog: f64,
    pub news: f64,
}

/// Volume-proportional weights with the forum floor applied. `None` when
/// there is no volume at all (the blend is then defined as neutral 50).
pub fn source_weights(
    forum_volume: i64,
    microblog_volume: i64,
    news_volume: i64,
) -> Option<SourceWeights> {
    let total = forum_volume + microblog_volume + news_volume;
    if total <= 0 {
        return None;
    }

    let total = total as f64;
    let mut forum = forum_volume as f64 / total;
    let mut microblog = microblog_volume as f64 / total;
    let mut news = news_volume as f64 / total;

    if forum < FORUM_WEIGHT_FLOOR {
        forum = FORUM_WEIGHT_FLOOR;
        let other_total = microblog + news;
        if other_total > 0.0 {
            // Shrink the remaining weights proportionally so all three still sum to 1.
            let factor = (1.0 - forum) / other_total;
            microblog *= factor;
            news *= factor;
        }
    }

    Some(SourceWeights {
        forum,
        microblog,
        news,
    })
}

/// Weighted composite score, an integer in [0, 100].
pub fn composite_score(sources: &SourceBreakdown) -> i32 {
    let weights = match source_weights(
        sources.forum_mentions,
        sources.microblog_messages,
        sources.news_articles,
    ) {
        Some(w) => w,
        None => return 50,
    };

    let blended = sources.forum_sentiment as f64 * weights.forum
        + sources.microblog_sentiment as f64 * weights.microblog
        + sources.news_sentiment as f64 * weights.news;

    (blended.round() as i32).clamp(0, 100)
}

pub fn status_for(score: i32) -> SentimentStatus {
    if score >= 70 {
        SentimentStatus::Bullish
    } else if score >= 40 {
        SentimentStatus::Neutral
    } else {
        SentimentStatus::Bearish
    }
}

/// Confidence grows with total data volume: 50 + 15·log10(total+1),
/// bounded to [50, 95].
pub fn confidence_for(total_volume: i64) -> i32 {
    let raw = 50.0 + 15.0 * ((total_volume.max(0) as f64) + 1.0).log10();
    raw.clamp(50.0, 95.0).round() as i32
}

/// Day-over-day momentum: percentage change against yesterday's stored
/// score. Cold-start assets get a small seed in [-2.5, 2.5] so the
/// dashboard has a direction to show before history accumulates.
pub fn velocity(today: i32, yesterday: Option<i32>) -> f64 {
    match yesterday {
        Some(prev) if prev > 0 => (today - prev) as f64 / prev as f64 * 100.0,
        Some(_) => 0.0,
        None => rand::rng().random_range(-2.5..=2.5),
    }
}

/// Conviction indicator in [1, 5] blending score, confidence and the
/// absolute correlation.
pub fn signal_strength(score: i32, confidence: i32, correlation: f64) -> i32 {
    let raw =
        (score as f64 * 0.4 + confidence as f64 * 0.3 + correlation.abs() * 100.0 * 0.3) / 20.0;
    (raw.round() as i32).clamp(1, 5)
}

pub fn risk_level(category: AssetCategory, change_24h: f64) -> RiskLevel {
    let volatility = change_24h.abs();
    if category == AssetCategory::Crypto || volatility > 5.0 {
        RiskLevel::High
    } else if volatility < 2.0 {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

/// Heuristic classifier; rules are priority-ordered and the first match wins.
pub fn recommend(score: i32, velocity: f64, risk: RiskLevel) -> Recommendation {
    if score > 75 && velocity > 5.0 && risk != RiskLevel::High {
        Recommendation::Buy
    } else if score < 25 && velocity < -5.0 {
        Recommendation::Sell
    } else if score < 40 && velocity > 0.0 {
        Recommendation::Watch
    } else if score < 40 && velocity < -10.0 {
        Recommendation::Avoid
    } else {
        Recommendation::Hold
    }
}

/// Volume descriptor from the forum trending rank.
pub fn volume_signal(trending_rank: i32) -> &'static str {
    match trending_rank {
        1..=5 => "significantly increasing",
        6..=10 => "increasing",
        _ => "normal",
    }
}

/// Qualitative momentum descriptor for the metadata blob.
pub fn momentum_descriptor(status: SentimentStatus, confidence: i32) -> &'static str {
    match status {
        SentimentStatus::Bullish if confidence > 70 => "strong upward",
        SentimentStatus::Bearish => "weakening",
        _ => "steady",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breakdown(
        forum: (i32, i64),
        microblog: (i32, i64),
        news: (i32, i64),
    ) -> SourceBreakdown {
        SourceBreakdown {
            forum_sentiment: forum.0,
            forum_mentions: forum.1,
            microblog_sentiment: microblog.0,
            microblog_messages: microblog.1,
            news_sentiment: news.0,
            news_articles: news.1,
            sources_analyzed: 3,
            mentions_count: forum.1 + microblog.1 + news.1,
        }
    }

    #[test]
    fn zero_total_volume_blends_to_neutral() {
        let sources = breakdown((90, 0), (10, 0), (100, 0));
        assert_eq!(composite_score(&sources), 50);
    }

    #[test]
    fn proportional_weights_above_floor_are_untouched() {
        // Forum carries 20% of volume, comfortably above the floor.
        let weights = source_weights(20, 50, 30).unwrap();
        assert!((weights.forum - 0.20).abs() < 1e-9);
        assert!((weights.microblog - 0.50).abs() < 1e-9);
        assert!((weights.news - 0.30).abs() < 1e-9);

        // Composite equals the plain volume-weighted average.
        let sources = breakdown((80, 20), (60, 50), (40, 30));
        let expected = (80.0 * 0.20 + 60.0 * 0.50 + 40.0 * 0.30f64).round() as i32;
        assert_eq!(composite_score(&sources), expected);
    }

    #[test]
    fn floor_pins_forum_weight_and_rescales_the_rest() {
        // Forum is 5% proportionally; the floor lifts it to exactly 10%.
        let weights = source_weights(5, 70, 25).unwrap();
        assert!((weights.forum - 0.10).abs() < 1e-12);

        // Remaining 0.90 split proportionally over the 0.70:0.25 ratio.
        assert!((weights.microblog - 0.90 * (0.70 / 0.95)).abs() < 1e-9);
        assert!((weights.news - 0.90 * (0.25 / 0.95)).abs() < 1e-9);

        let sum = weights.forum + weights.microblog + weights.news;
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn floor_scenario_end_to_end() {
        // social(80, 5), micro(60, 70), news(40, 25): floor triggers and the
        // blend lands at 57, a neutral status.
        let sources = breakdown((80, 5), (60, 70), (40, 25));
        let score = composite_score(&sources);
        assert_eq!(score, 57);
        assert_eq!(status_for(score), SentimentStatus::Neutral);
    }

    #[test]
    fn composite_stays_within_bounds() {
        let all_high = breakdown((100, 1), (100, 1000), (100, 1));
        assert_eq!(composite_score(&all_high), 100);

        let all_low = breakdown((0, 1), (0, 1000), (0, 1));
        assert_eq!(composite_score(&all_low), 0);
    }

    #[test]
    fn status_thresholds_are_exact() {
        assert_eq!(status_for(70), SentimentStatus::Bullish);
        assert_eq!(status_for(69), SentimentStatus::Neutral);
        assert_eq!(status_for(40), SentimentStatus::Neutral);
        assert_eq!(status_for(39), SentimentStatus::Bearish);
        assert_eq!(status_for(0), SentimentStatus::Bearish);
        assert_eq!(status_for(100), SentimentStatus::Bullish);
    }

    #[test]
    fn confidence_is_bounded_and_grows_with_volume() {
        assert_eq!(confidence_for(0), 50);
        assert!(confidence_for(100) > confidence_for(10));
        assert_eq!(confidence_for(10_000_000), 95);

        // 99 mentions: 50 + 15*log10(100) = 80.
        assert_eq!(confidence_for(99), 80);
    }

    #[test]
    fn velocity_is_day_over_day_percentage() {
        assert!((velocity(60, Some(50)) - 20.0).abs() < 1e-9);
        assert!((velocity(40, Some(50)) + 20.0).abs() < 1e-9);
        // A zero yesterday cannot be divided through; momentum reads flat.
        assert_eq!(velocity(60, Some(0)), 0.0);
    }

    #[test]
    fn cold_start_velocity_stays_within_seed_bound() {
        for _ in 0..100 {
            let v = velocity(60, None);
            assert!((-2.5..=2.5).contains(&v), "seed {v} out of bound");
        }
    }

    #[test]
    fn signal_strength_clamps_to_one_through_five() {
        assert_eq!(signal_strength(0, 50, 0.0), 1);
        assert_eq!(signal_strength(100, 95, 1.0), 5);
        // (60*0.4 + 70*0.3 + 0.5*100*0.3) / 20 = 3
        assert_eq!(signal_strength(60, 70, 0.5), 3);
    }

    #[test]
    fn risk_follows_category_and_volatility() {
        assert_eq!(risk_level(AssetCategory::Crypto, 0.1), RiskLevel::High);
        assert_eq!(risk_level(AssetCategory::Stock, 6.0), RiskLevel::High);
        assert_eq!(risk_level(AssetCategory::Stock, -6.0), RiskLevel::High);
        assert_eq!(risk_level(AssetCategory::Stock, 1.5), RiskLevel::Low);
        assert_eq!(risk_level(AssetCategory::Stock, 3.0), RiskLevel::Medium);
    }

    #[test]
    fn recommendation_priority_is_respected() {
        assert_eq!(recommend(80, 6.0, RiskLevel::Medium), Recommendation::Buy);
        // High risk blocks the BUY branch even on a strong signal.
        assert_eq!(recommend(80, 6.0, RiskLevel::High), Recommendation::Hold);
        // SELL wins before any WATCH-level condition is considered.
        assert_eq!(recommend(20, -6.0, RiskLevel::Medium), Recommendation::Sell);
        assert_eq!(recommend(35, 1.0, RiskLevel::Low), Recommendation::Watch);
        assert_eq!(recommend(35, -11.0, RiskLevel::Low), Recommendation::Avoid);
        assert_eq!(recommend(55, 0.0, RiskLevel::Medium), Recommendation::Hold);
    }

    #[test]
    fn volume_signal_tiers_by_rank() {
        assert_eq!(volume_signal(1), "significantly increasing");
        assert_eq!(volume_signal(5), "significantly increasing");
        assert_eq!(volume_signal(6), "increasing");
        assert_eq!(volume_signal(10), "increasing");
        assert_eq!(volume_signal(0), "normal");
        assert_eq!(volume_signal(11), "normal");
    }
}
