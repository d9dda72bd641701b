use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::aggregate::{DayBucket, DayKind};

/// 生産性の安定度。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Consistency {
    High,
    Medium,
    Low,
}

impl Consistency {
    fn from_rate(rate: f64) -> Self {
        if rate >= 90.0 {
            Self::High
        } else if rate >= 70.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    /// 表示用のラベルを返す。
    pub fn label(self) -> &'static str {
        match self {
            Self::High => "Hoch",
            Self::Medium => "Mittel",
            Self::Low => "Niedrig",
        }
    }
}

/// 期間全体の生産性指標。
#[derive(Clone, Debug, PartialEq)]
pub struct ProductivityMetrics {
    /// 記録があり、かつ労働日に分類される日の数。
    pub productive_days: i64,
    pub workdays: i64,
    /// `productive_days / workdays * 100`。労働日が無い場合は0となる。
    pub rate: f64,
    /// 実績が最長の日とその秒数。記録が全く無い場合は`None`となる。
    pub best_day: Option<(NaiveDate, i64)>,
    pub consistency: Consistency,
}

/// 分類済みのバケツから生産性指標を計算する。
///
/// 最長の日は厳密な大小比較で更新するため、同じ実績の日が複数ある場合は
/// 日付順で先の日が採用される。
pub fn analyze(buckets: &BTreeMap<NaiveDate, DayBucket>) -> ProductivityMetrics {
    let workdays = buckets
        .values()
        .filter(|bucket| bucket.kind() == DayKind::Workday)
        .count() as i64;
    let productive_days = buckets
        .values()
        .filter(|bucket| bucket.total_seconds > 0 && bucket.kind() == DayKind::Workday)
        .count() as i64;
    let rate = if workdays > 0 {
        productive_days as f64 / workdays as f64 * 100.0
    } else {
        0.0
    };

    let mut best_day: Option<(NaiveDate, i64)> = None;
    for bucket in buckets.values() {
        let best_seconds = best_day.map_or(0, |(_, seconds)| seconds);
        if bucket.total_seconds > best_seconds {
            best_day = Some((bucket.date, bucket.total_seconds));
        }
    }

    ProductivityMetrics {
        productive_days,
        workdays,
        rate,
        best_day,
        consistency: Consistency::from_rate(rate),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;
    use rstest::rstest;

    use super::analyze;
    use super::Consistency;
    use crate::aggregate::DayBucket;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn bucket(day: u32, total_seconds: i64) -> (NaiveDate, DayBucket) {
        let mut bucket = DayBucket::empty(date(day));
        bucket.total_seconds = total_seconds;
        (date(day), bucket)
    }

    /// 記録のある労働日のみが生産的な日として数えられることを確認する。
    ///
    /// 2024年3月4日〜8日は月曜〜金曜となる。
    #[test]
    fn test_analyze_counts_productive_workdays() {
        // 3/2は土曜日のため、記録があっても生産的な日には数えない
        let buckets: BTreeMap<_, _> = [
            bucket(2, 3600),
            bucket(4, 28800),
            bucket(5, 14400),
            bucket(6, 0),
            bucket(7, 7200),
            bucket(8, 0),
        ]
        .into_iter()
        .collect();

        let metrics = analyze(&buckets);

        assert_eq!(metrics.workdays, 5);
        assert_eq!(metrics.productive_days, 3);
        assert_eq!(metrics.rate, 60.0);
        assert_eq!(metrics.consistency, Consistency::Low);
    }

    /// 祝日や休暇に分類された日が労働日に数えられないことを確認する。
    #[test]
    fn test_analyze_ignores_non_workdays() {
        let (monday, mut holiday_bucket) = bucket(4, 28800);
        holiday_bucket.is_holiday = true;
        let buckets: BTreeMap<_, _> = [(monday, holiday_bucket), bucket(5, 14400)]
            .into_iter()
            .collect();

        let metrics = analyze(&buckets);

        assert_eq!(metrics.workdays, 1);
        assert_eq!(metrics.productive_days, 1);
        assert_eq!(metrics.rate, 100.0);
    }

    /// 労働日が無い場合に比率が0になることを確認する。
    #[test]
    fn test_analyze_zero_workdays() {
        let buckets: BTreeMap<_, _> = [bucket(2, 3600), bucket(3, 0)].into_iter().collect();

        let metrics = analyze(&buckets);

        assert_eq!(metrics.workdays, 0);
        assert_eq!(metrics.rate, 0.0);
        assert_eq!(metrics.consistency, Consistency::Low);
    }

    /// 比率が常に0から100の範囲に収まることを確認する。
    #[test]
    fn test_analyze_rate_bounds() {
        let buckets: BTreeMap<_, _> = (4..=8).map(|day| bucket(day, 28800)).collect();

        let metrics = analyze(&buckets);

        assert!(metrics.rate >= 0.0 && metrics.rate <= 100.0);
        assert_eq!(metrics.rate, 100.0);
        assert_eq!(metrics.consistency, Consistency::High);
    }

    /// 最長の日が選ばれ、同じ実績では日付順で先の日が採用されることを確認する。
    #[test]
    fn test_analyze_best_day_first_on_tie() {
        let buckets: BTreeMap<_, _> = [bucket(4, 14400), bucket(5, 28800), bucket(6, 28800)]
            .into_iter()
            .collect();

        let metrics = analyze(&buckets);

        assert_eq!(metrics.best_day, Some((date(5), 28800)));
    }

    /// 記録が全く無い場合に最長の日が`None`になることを確認する。
    #[test]
    fn test_analyze_best_day_without_records() {
        let buckets: BTreeMap<_, _> = [bucket(4, 0), bucket(5, 0)].into_iter().collect();

        let metrics = analyze(&buckets);

        assert_eq!(metrics.best_day, None);
    }

    /// 安定度のしきい値を確認する。
    #[rstest]
    #[case(10, Consistency::High)]
    #[case(9, Consistency::High)]
    #[case(8, Consistency::Medium)]
    #[case(7, Consistency::Medium)]
    #[case(6, Consistency::Low)]
    fn test_consistency_thresholds(#[case] productive: usize, #[case] expected: Consistency) {
        // 3/4〜3/15は平日10日となる(3/9,10は週末)
        let buckets: BTreeMap<_, _> = (4..=15)
            .filter(|day| !matches!(day, 9 | 10))
            .enumerate()
            .map(|(i, day)| bucket(day, if i < productive { 3600 } else { 0 }))
            .collect();

        let metrics = analyze(&buckets);

        assert_eq!(metrics.workdays, 10);
        assert_eq!(metrics.consistency, expected);
    }
}
