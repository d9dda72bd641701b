use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};

use crate::aggregate::{DayBucket, DayKind};
use crate::datetime::iso_date;
use crate::holiday::HolidaySet;
use crate::vacation::VacationRegistry;

/// 労働日1日あたりの所定労働時間(8時間)。
pub const EXPECTED_DAY_SECONDS: i64 = 8 * 3600;

/// 実績時間と所定時間の差の状態。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VarianceStatus {
    Over,
    Under,
    Exact,
}

impl VarianceStatus {
    fn from_variance(variance_seconds: i64) -> Self {
        if variance_seconds > 0 {
            Self::Over
        } else if variance_seconds < 0 {
            Self::Under
        } else {
            Self::Exact
        }
    }
}

/// 1週間(月曜〜日曜)の集計結果。
#[derive(Clone, Debug, PartialEq)]
pub struct WeekSummary {
    pub iso_year: i32,
    pub iso_week: u32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub total_seconds: i64,
    pub workdays: i64,
    pub expected_seconds: i64,
    pub variance_seconds: i64,
    pub status: VarianceStatus,
    pub projects: BTreeMap<String, i64>,
}

/// 月内のISO週単位の集計。
///
/// 月の境界をまたぐ週はISO週のキーを保ったまま、その月に属する日のみを含む。
#[derive(Clone, Debug, PartialEq)]
pub struct WeekBreakdown {
    pub iso_year: i32,
    pub iso_week: u32,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    pub total_seconds: i64,
    pub workdays: i64,
    pub expected_seconds: i64,
    pub variance_seconds: i64,
    pub status: VarianceStatus,
}

/// プロジェクトごとの月間集計。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ProjectTotal {
    pub seconds: i64,
    /// そのプロジェクトの記録がある日数。
    pub active_days: i64,
}

/// 1ヶ月分の集計結果。
#[derive(Clone, Debug, PartialEq)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub calendar_days: i64,
    pub workdays: i64,
    pub holiday_days: i64,
    pub vacation_days: i64,
    pub weekend_days: i64,
    pub total_seconds: i64,
    pub expected_seconds: i64,
    pub variance_seconds: i64,
    pub status: VarianceStatus,
    /// 労働日あたりの平均実績。労働日が無い場合は0となる。
    pub average_workday_seconds: i64,
    pub weeks: Vec<WeekBreakdown>,
    pub projects: BTreeMap<String, ProjectTotal>,
}

/// 日付を分類する。
///
/// 祝日 > 休暇 > 週末 > 労働日の固定の優先順位で判定するため、
/// 祝日かつ休暇期間内の日は祝日として分類される。
pub fn classify_day(
    date: NaiveDate,
    holidays: &HolidaySet,
    vacations: &VacationRegistry,
) -> DayKind {
    if holidays.contains_key(&iso_date(date)) {
        DayKind::Holiday
    } else if vacations.find(date).is_some() {
        DayKind::Vacation
    } else if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        DayKind::Weekend
    } else {
        DayKind::Workday
    }
}

/// バケツに祝日と休暇のフラグを設定する。
///
/// 祝日が休暇より優先され、両方に該当する日は祝日のみが設定される。
/// 週末フラグはバケツ作成時に曜日から設定済みとなる。
pub fn classify_buckets(
    buckets: &mut BTreeMap<NaiveDate, DayBucket>,
    holidays: &HolidaySet,
    vacations: &VacationRegistry,
) {
    for bucket in buckets.values_mut() {
        match classify_day(bucket.date, holidays, vacations) {
            DayKind::Holiday => bucket.is_holiday = true,
            DayKind::Vacation => bucket.is_vacation = true,
            DayKind::Weekend | DayKind::Workday => {}
        }
    }
}

/// 指定日を含む週の月曜日と日曜日を返す。
pub fn week_range(reference: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday =
        reference - Duration::days(i64::from(reference.weekday().num_days_from_monday()));

    (monday, monday + Duration::days(6))
}

/// 指定した月の初日と末日を返す。月が1〜12の範囲外の場合は`None`を返す。
pub fn month_range(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    Some((first, next_month - Duration::days(1)))
}

/// 分類済みのバケツから週の集計を作成する。
///
/// 所定時間は労働日数 × 8時間となり、労働日の無い週では0となる。
pub fn summarize_week(buckets: &BTreeMap<NaiveDate, DayBucket>) -> WeekSummary {
    let first_day = buckets.keys().next().copied().unwrap_or_default();
    let last_day = buckets.keys().next_back().copied().unwrap_or(first_day);
    let iso = first_day.iso_week();

    let mut total_seconds = 0;
    let mut workdays = 0;
    let mut projects: BTreeMap<String, i64> = BTreeMap::new();
    for bucket in buckets.values() {
        total_seconds += bucket.total_seconds;
        if bucket.kind() == DayKind::Workday {
            workdays += 1;
        }
        for (project, seconds) in &bucket.projects {
            *projects.entry(project.clone()).or_insert(0) += seconds;
        }
    }

    let expected_seconds = workdays * EXPECTED_DAY_SECONDS;
    let variance_seconds = total_seconds - expected_seconds;

    WeekSummary {
        iso_year: iso.year(),
        iso_week: iso.week(),
        first_day,
        last_day,
        total_seconds,
        workdays,
        expected_seconds,
        variance_seconds,
        status: VarianceStatus::from_variance(variance_seconds),
        projects,
    }
}

/// 分類済みのバケツから月の集計を作成する。
///
/// 週ごとの内訳はISO週番号の`(年, 週)`のキーでまとめるため、
/// 月初や月末の週が前後の月のISO週に属する場合もキーはそのまま保たれる。
pub fn summarize_month(
    year: i32,
    month: u32,
    buckets: &BTreeMap<NaiveDate, DayBucket>,
) -> MonthSummary {
    let mut summary = MonthSummary {
        year,
        month,
        calendar_days: buckets.len() as i64,
        workdays: 0,
        holiday_days: 0,
        vacation_days: 0,
        weekend_days: 0,
        total_seconds: 0,
        expected_seconds: 0,
        variance_seconds: 0,
        status: VarianceStatus::Exact,
        average_workday_seconds: 0,
        weeks: vec![],
        projects: BTreeMap::new(),
    };

    let mut weeks: BTreeMap<(i32, u32), WeekBreakdown> = BTreeMap::new();
    for bucket in buckets.values() {
        summary.total_seconds += bucket.total_seconds;
        match bucket.kind() {
            DayKind::Holiday => summary.holiday_days += 1,
            DayKind::Vacation => summary.vacation_days += 1,
            DayKind::Weekend => summary.weekend_days += 1,
            DayKind::Workday => summary.workdays += 1,
        }

        for (project, seconds) in &bucket.projects {
            let project_total = summary.projects.entry(project.clone()).or_default();
            project_total.seconds += seconds;
            if *seconds > 0 {
                project_total.active_days += 1;
            }
        }

        let iso = bucket.date.iso_week();
        let week = weeks
            .entry((iso.year(), iso.week()))
            .or_insert_with(|| WeekBreakdown {
                iso_year: iso.year(),
                iso_week: iso.week(),
                first_day: bucket.date,
                last_day: bucket.date,
                total_seconds: 0,
                workdays: 0,
                expected_seconds: 0,
                variance_seconds: 0,
                status: VarianceStatus::Exact,
            });
        // バケツは日付順に処理されるため、最後に見た日がその週の末日となる
        week.last_day = bucket.date;
        week.total_seconds += bucket.total_seconds;
        if bucket.kind() == DayKind::Workday {
            week.workdays += 1;
        }
    }

    for week in weeks.values_mut() {
        week.expected_seconds = week.workdays * EXPECTED_DAY_SECONDS;
        week.variance_seconds = week.total_seconds - week.expected_seconds;
        week.status = VarianceStatus::from_variance(week.variance_seconds);
    }
    summary.weeks = weeks.into_values().collect();

    summary.expected_seconds = summary.workdays * EXPECTED_DAY_SECONDS;
    summary.variance_seconds = summary.total_seconds - summary.expected_seconds;
    summary.status = VarianceStatus::from_variance(summary.variance_seconds);
    if summary.workdays > 0 {
        summary.average_workday_seconds = summary.total_seconds / summary.workdays;
    }

    summary
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, TimeZone, Utc};
    use once_cell::sync::Lazy;
    use rstest::rstest;

    use super::classify_buckets;
    use super::classify_day;
    use super::month_range;
    use super::summarize_month;
    use super::summarize_week;
    use super::week_range;
    use super::VarianceStatus;
    use super::EXPECTED_DAY_SECONDS;
    use crate::aggregate::{aggregate, DayBucket, DayKind};
    use crate::holiday::{holidays_for, HolidaySet};
    use crate::time_entry::TimeEntry;
    use crate::vacation::VacationRegistry;

    /// 2024年5月1日(Tag der Arbeit)を含む休暇レジストリ。
    static VACATIONS: Lazy<VacationRegistry> = Lazy::new(|| {
        let mut registry = VacationRegistry::default();
        registry
            .add("2024-04-29", "2024-05-03", "Maiurlaub", "Urlaub")
            .unwrap();
        registry
    });

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn work_entry(day: u32, hours: u32) -> TimeEntry {
        TimeEntry {
            start: Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
            end: Some(Utc.with_ymd_and_hms(2024, 3, day, 8 + hours, 0, 0).unwrap()),
            tags: vec!["acme".to_string()],
        }
    }

    /// 祝日が休暇より優先して分類されることを確認する。
    ///
    /// 2024年5月1日は祝日であり、かつ休暇期間内でもある。
    #[test]
    fn test_classify_day_holiday_wins_over_vacation() {
        let holidays = holidays_for(2024, None);

        let kind = classify_day(date(2024, 5, 1), &holidays, &VACATIONS);

        assert_eq!(kind, DayKind::Holiday);
    }

    /// 分類の優先順位を日付ごとに確認する。
    #[rstest]
    #[case(date(2024, 5, 1), DayKind::Holiday)]
    #[case(date(2024, 4, 30), DayKind::Vacation)]
    #[case(date(2024, 5, 4), DayKind::Weekend)]
    #[case(date(2024, 5, 6), DayKind::Workday)]
    fn test_classify_day_priority(#[case] day: NaiveDate, #[case] expected: DayKind) {
        let holidays = holidays_for(2024, None);

        assert_eq!(classify_day(day, &holidays, &VACATIONS), expected);
    }

    /// バケツへ分類フラグが設定されることを確認する。
    #[test]
    fn test_classify_buckets_sets_flags() {
        let holidays = holidays_for(2024, None);
        let mut buckets = aggregate(&[], date(2024, 4, 29), date(2024, 5, 5));

        classify_buckets(&mut buckets, &holidays, &VACATIONS);

        let may_first = buckets.get(&date(2024, 5, 1)).unwrap();
        assert!(may_first.is_holiday);
        assert!(!may_first.is_vacation);
        let april_30 = buckets.get(&date(2024, 4, 30)).unwrap();
        assert!(april_30.is_vacation);
        let saturday = buckets.get(&date(2024, 5, 4)).unwrap();
        assert_eq!(saturday.kind(), DayKind::Weekend);
    }

    /// 週の範囲が月曜から日曜になることを確認する。
    #[rstest]
    #[case(date(2024, 3, 4), date(2024, 3, 4), date(2024, 3, 10))]
    #[case(date(2024, 3, 7), date(2024, 3, 4), date(2024, 3, 10))]
    #[case(date(2024, 3, 10), date(2024, 3, 4), date(2024, 3, 10))]
    fn test_week_range(
        #[case] reference: NaiveDate,
        #[case] expected_monday: NaiveDate,
        #[case] expected_sunday: NaiveDate,
    ) {
        assert_eq!(week_range(reference), (expected_monday, expected_sunday));
    }

    /// 月の範囲が初日から末日になることを確認する。
    #[rstest]
    #[case(2024, 2, date(2024, 2, 1), date(2024, 2, 29))]
    #[case(2024, 12, date(2024, 12, 1), date(2024, 12, 31))]
    #[case(2023, 2, date(2023, 2, 1), date(2023, 2, 28))]
    fn test_month_range(
        #[case] year: i32,
        #[case] month: u32,
        #[case] expected_first: NaiveDate,
        #[case] expected_last: NaiveDate,
    ) {
        assert_eq!(
            month_range(year, month),
            Some((expected_first, expected_last))
        );
    }

    /// 不正な月で`None`になることを確認する。
    #[test]
    fn test_month_range_invalid_month() {
        assert_eq!(month_range(2024, 13), None);
    }

    /// 労働日5日で毎日8時間の週の差分が0になることを確認する。
    #[test]
    fn test_summarize_week_exact() {
        let entries: Vec<_> = (4..=8).map(|day| work_entry(day, 8)).collect();
        let mut buckets = aggregate(&entries, date(2024, 3, 4), date(2024, 3, 10));
        classify_buckets(&mut buckets, &HolidaySet::new(), &VacationRegistry::default());

        let summary = summarize_week(&buckets);

        assert_eq!(summary.workdays, 5);
        assert_eq!(summary.total_seconds, 5 * 28800);
        assert_eq!(summary.expected_seconds, 5 * EXPECTED_DAY_SECONDS);
        assert_eq!(summary.variance_seconds, 0);
        assert_eq!(summary.status, VarianceStatus::Exact);
        assert_eq!(summary.iso_week, 10);
        assert_eq!(summary.iso_year, 2024);
    }

    /// 実績が所定時間を下回る週の状態を確認する。
    #[test]
    fn test_summarize_week_under() {
        let entries = vec![work_entry(4, 4)];
        let mut buckets = aggregate(&entries, date(2024, 3, 4), date(2024, 3, 10));
        classify_buckets(&mut buckets, &HolidaySet::new(), &VacationRegistry::default());

        let summary = summarize_week(&buckets);

        assert_eq!(summary.variance_seconds, 4 * 3600 - 5 * EXPECTED_DAY_SECONDS);
        assert_eq!(summary.status, VarianceStatus::Under);
        assert_eq!(*summary.projects.get("acme").unwrap(), 4 * 3600);
    }

    /// 全ての日が週末や祝日の場合に所定時間が0になることを確認する。
    #[test]
    fn test_summarize_week_without_workdays() {
        let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        buckets.insert(date(2024, 3, 9), DayBucket::empty(date(2024, 3, 9)));
        buckets.insert(date(2024, 3, 10), DayBucket::empty(date(2024, 3, 10)));

        let summary = summarize_week(&buckets);

        assert_eq!(summary.workdays, 0);
        assert_eq!(summary.expected_seconds, 0);
        assert_eq!(summary.status, VarianceStatus::Exact);
    }

    /// 月の集計で日の分類ごとの日数が数えられることを確認する。
    ///
    /// 2024年5月: 31日、祝日はTag der Arbeit(5/1)、Christi Himmelfahrt(5/9)、
    /// Pfingstmontag(5/20)の3日。休暇は5/2と5/3の2日(5/1は祝日が優先)。
    #[test]
    fn test_summarize_month_day_counts() {
        let holidays = holidays_for(2024, None);
        let mut buckets = aggregate(&[], date(2024, 5, 1), date(2024, 5, 31));
        classify_buckets(&mut buckets, &holidays, &VACATIONS);

        let summary = summarize_month(2024, 5, &buckets);

        assert_eq!(summary.calendar_days, 31);
        assert_eq!(summary.holiday_days, 3);
        assert_eq!(summary.vacation_days, 2);
        assert_eq!(summary.weekend_days, 8);
        assert_eq!(summary.workdays, 31 - 3 - 2 - 8);
    }

    /// 月の週内訳がISO週のキーでまとめられることを確認する。
    ///
    /// 2024年3月1日(金)は2月から続くISO週9に属し、月初の週内訳は3日間のみとなる。
    #[test]
    fn test_summarize_month_iso_week_boundaries() {
        let mut buckets = aggregate(&[], date(2024, 3, 1), date(2024, 3, 31));
        classify_buckets(&mut buckets, &HolidaySet::new(), &VacationRegistry::default());

        let summary = summarize_month(2024, 3, &buckets);

        let first_week = summary.weeks.first().unwrap();
        assert_eq!((first_week.iso_year, first_week.iso_week), (2024, 9));
        assert_eq!(first_week.first_day, date(2024, 3, 1));
        assert_eq!(first_week.last_day, date(2024, 3, 3));
        let last_week = summary.weeks.last().unwrap();
        assert_eq!((last_week.iso_year, last_week.iso_week), (2024, 13));
        assert_eq!(last_week.first_day, date(2024, 3, 25));
        assert_eq!(last_week.last_day, date(2024, 3, 31));
        assert_eq!(summary.weeks.len(), 5);
    }

    /// 月の実績と所定時間の差分、および平均が計算されることを確認する。
    #[test]
    fn test_summarize_month_variance_and_average() {
        let entries = vec![work_entry(4, 8), work_entry(5, 6)];
        let mut buckets = aggregate(&entries, date(2024, 3, 1), date(2024, 3, 31));
        classify_buckets(&mut buckets, &HolidaySet::new(), &VacationRegistry::default());

        let summary = summarize_month(2024, 3, &buckets);

        // 2024年3月は週末を除いて21日の労働日がある
        assert_eq!(summary.workdays, 21);
        assert_eq!(summary.total_seconds, 14 * 3600);
        assert_eq!(summary.expected_seconds, 21 * EXPECTED_DAY_SECONDS);
        assert_eq!(summary.status, VarianceStatus::Under);
        assert_eq!(summary.average_workday_seconds, 14 * 3600 / 21);
        assert_eq!(summary.projects.get("acme").unwrap().seconds, 14 * 3600);
        assert_eq!(summary.projects.get("acme").unwrap().active_days, 2);
    }

    /// 労働日が無い期間で平均が0になることを確認する。
    #[test]
    fn test_summarize_month_without_workdays() {
        let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
        buckets.insert(date(2024, 3, 2), DayBucket::empty(date(2024, 3, 2)));
        buckets.insert(date(2024, 3, 3), DayBucket::empty(date(2024, 3, 3)));

        let summary = summarize_month(2024, 3, &buckets);

        assert_eq!(summary.workdays, 0);
        assert_eq!(summary.expected_seconds, 0);
        assert_eq!(summary.average_workday_seconds, 0);
    }
}
