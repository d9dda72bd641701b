use anyhow::{Context, Result};
use chrono::Datelike;
use chrono::NaiveDate;
use log::info;

use crate::aggregate::{aggregate, DayKind};
use crate::datetime;
use crate::holiday::{holiday_name, HolidaySet};
use crate::productivity::{analyze, ProductivityMetrics};
use crate::summary::{classify_buckets, month_range, summarize_month, MonthSummary};
use crate::timew::TimewRepository;
use crate::vacation::VacationRegistry;

/// 月毎のレポートを出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct MonthlyArgs {
    #[clap(short = 'y', long = "year", help = "Year of the report (default: current year)")]
    year: Option<i32>,

    #[clap(
        short = 'm',
        long = "month",
        help = "Month of the report (1-12, default: current month)"
    )]
    month: Option<u32>,

    #[clap(long = "last-month", help = "Show the report for the previous month")]
    last_month: bool,

    #[clap(
        long = "months",
        default_value = "1",
        help = "Number of past months to show (oldest first)"
    )]
    months: u32,
}

/// 月内の祝日または休暇の1日。
#[derive(Clone, Debug, PartialEq)]
pub struct SpecialDay {
    pub date: NaiveDate,
    pub label: String,
}

/// 1ヶ月分のレポート。
#[derive(Clone, Debug, PartialEq)]
pub struct MonthlyReport {
    pub summary: MonthSummary,
    pub metrics: ProductivityMetrics,
    pub special_days: Vec<SpecialDay>,
}

/// `monthly`サブコマンドの処理を行う。
pub struct MonthlyCommand<'a, T: TimewRepository> {
    timew: &'a T,
}

impl<'a, T: TimewRepository> MonthlyCommand<'a, T> {
    /// 新しい`MonthlyCommand`を返す。
    pub fn new(timew: &'a T) -> Self {
        Self { timew }
    }

    /// 対象の月ごとにレポートを作成する。
    ///
    /// `--last-month`は今日を基準とした前の月を対象とし、他の指定より優先される。
    /// `--months N`(N > 1)は今月を含む直近Nヶ月を古い順に対象とし、
    /// 年月の指定より優先される。
    /// 年月が指定されていない場合は現在のUTC日付の年月を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `monthly`サブコマンドの引数
    /// * `holidays` - 祝日の集合
    /// * `vacations` - 休暇のレジストリ
    pub fn run(
        &self,
        args: MonthlyArgs,
        holidays: &HolidaySet,
        vacations: &VacationRegistry,
    ) -> Result<Vec<MonthlyReport>> {
        let today = datetime::today();
        let targets: Vec<(i32, u32)> = if args.last_month {
            vec![months_back(today.year(), today.month(), 1)]
        } else if args.months > 1 {
            (0..args.months)
                .rev()
                .map(|i| months_back(today.year(), today.month(), i))
                .collect()
        } else {
            vec![(
                args.year.unwrap_or_else(|| today.year()),
                args.month.unwrap_or_else(|| today.month()),
            )]
        };

        targets
            .into_iter()
            .map(|(year, month)| self.report_for(year, month, holidays, vacations))
            .collect()
    }

    /// 指定された月のレポートを作成する。
    fn report_for(
        &self,
        year: i32,
        month: u32,
        holidays: &HolidaySet,
        vacations: &VacationRegistry,
    ) -> Result<MonthlyReport> {
        let (first_day, last_day) = month_range(year, month)
            .with_context(|| format!("Invalid month: {}-{}", year, month))?;
        info!("Generating monthly report for {}-{:02}", year, month);

        let time_entries = self
            .timew
            .export(first_day, last_day)
            .context("Failed to retrieve time entries")?;
        let mut buckets = aggregate(&time_entries, first_day, last_day);
        classify_buckets(&mut buckets, holidays, vacations);

        let special_days = buckets
            .values()
            .filter_map(|bucket| match bucket.kind() {
                DayKind::Holiday => holiday_name(holidays, bucket.date).map(|name| SpecialDay {
                    date: bucket.date,
                    label: name.to_string(),
                }),
                DayKind::Vacation => vacations.find(bucket.date).map(|entry| SpecialDay {
                    date: bucket.date,
                    label: format!("{} ({})", entry.name, entry.kind),
                }),
                _ => None,
            })
            .collect();

        Ok(MonthlyReport {
            summary: summarize_month(year, month, &buckets),
            metrics: analyze(&buckets),
            special_days,
        })
    }
}

/// 指定した年月から`back`ヶ月前の年月を返す。年の境界をまたぐ場合も桁上がりする。
fn months_back(year: i32, month: u32, back: u32) -> (i32, u32) {
    let total = year * 12 + month as i32 - 1 - back as i32;

    (total.div_euclid(12), total.rem_euclid(12) as u32 + 1)
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDate, TimeZone, Utc};
    use rstest::rstest;

    use super::months_back;
    use super::MonthlyArgs;
    use super::MonthlyCommand;
    use crate::datetime::mock_datetime;
    use crate::holiday::{holidays_for, HolidaySet};
    use crate::time_entry::TimeEntry;
    use crate::timew::MockTimewRepository;
    use crate::vacation::VacationRegistry;

    fn args(year: i32, month: u32) -> MonthlyArgs {
        MonthlyArgs {
            year: Some(year),
            month: Some(month),
            last_month: false,
            months: 1,
        }
    }

    /// 月の範囲(初日〜末日)で時間記録が取得されることを確認する。
    #[test]
    fn test_monthly_command_requests_full_month() {
        let mut timew = MockTimewRepository::new();
        timew
            .expect_export()
            .times(1)
            .withf(|start, end| {
                *start == NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
                    && *end == NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
            })
            .returning(|_, _| Ok(vec![]));

        let command = MonthlyCommand::new(&timew);
        let reports = command
            .run(
                args(2024, 2),
                &HolidaySet::new(),
                &VacationRegistry::default(),
            )
            .unwrap();

        assert_eq!(reports.len(), 1);
    }

    /// 不正な月でエラーになることを確認する。
    #[test]
    fn test_monthly_command_invalid_month() {
        let timew = MockTimewRepository::new();

        let command = MonthlyCommand::new(&timew);
        let result = command.run(
            args(2024, 13),
            &HolidaySet::new(),
            &VacationRegistry::default(),
        );

        assert!(result.is_err());
    }

    /// `--last-month`で前の月のレポートが作成されることを確認する。年初は前年12月となる。
    #[test]
    fn test_monthly_command_last_month_at_year_boundary() {
        mock_datetime::set_mock_time(
            DateTime::parse_from_rfc3339("2024-01-15T12:00:00+00:00")
                .unwrap()
                .to_utc(),
        );
        let mut timew = MockTimewRepository::new();
        timew
            .expect_export()
            .times(1)
            .withf(|start, end| {
                *start == NaiveDate::from_ymd_opt(2023, 12, 1).unwrap()
                    && *end == NaiveDate::from_ymd_opt(2023, 12, 31).unwrap()
            })
            .returning(|_, _| Ok(vec![]));

        let command = MonthlyCommand::new(&timew);
        let mut reports = command
            .run(
                MonthlyArgs {
                    year: None,
                    month: None,
                    last_month: true,
                    months: 1,
                },
                &HolidaySet::new(),
                &VacationRegistry::default(),
            )
            .unwrap();

        let report = reports.remove(0);
        assert_eq!(report.summary.year, 2023);
        assert_eq!(report.summary.month, 12);

        mock_datetime::clear_mock_time();
    }

    /// `--months 2`で年の境界をまたぐ2ヶ月分のレポートが古い順に作成されることを確認する。
    #[test]
    fn test_monthly_command_multiple_months_across_year_boundary() {
        mock_datetime::set_mock_time(
            DateTime::parse_from_rfc3339("2024-01-15T12:00:00+00:00")
                .unwrap()
                .to_utc(),
        );
        let mut timew = MockTimewRepository::new();
        timew.expect_export().times(2).returning(|_, _| Ok(vec![]));

        let command = MonthlyCommand::new(&timew);
        let reports = command
            .run(
                MonthlyArgs {
                    year: None,
                    month: None,
                    last_month: false,
                    months: 2,
                },
                &HolidaySet::new(),
                &VacationRegistry::default(),
            )
            .unwrap();

        let targets: Vec<_> = reports
            .iter()
            .map(|report| (report.summary.year, report.summary.month))
            .collect();
        assert_eq!(targets, vec![(2023, 12), (2024, 1)]);

        mock_datetime::clear_mock_time();
    }

    /// 年月の桁上がりを確認する。
    #[rstest]
    #[case(2024, 6, 0, 2024, 6)]
    #[case(2024, 6, 5, 2024, 1)]
    #[case(2024, 6, 6, 2023, 12)]
    #[case(2024, 1, 13, 2022, 12)]
    fn test_months_back(
        #[case] year: i32,
        #[case] month: u32,
        #[case] back: u32,
        #[case] expected_year: i32,
        #[case] expected_month: u32,
    ) {
        assert_eq!(months_back(year, month, back), (expected_year, expected_month));
    }

    /// 祝日と休暇が特別な日としてまとめられることを確認する。
    #[test]
    fn test_monthly_command_collects_special_days() {
        let mut timew = MockTimewRepository::new();
        timew.expect_export().times(1).returning(|_, _| Ok(vec![]));
        let holidays = holidays_for(2024, None);
        let mut vacations = VacationRegistry::default();
        vacations
            .add("2024-05-02", "2024-05-03", "Brückentage", "Urlaub")
            .unwrap();

        let command = MonthlyCommand::new(&timew);
        let mut reports = command.run(args(2024, 5), &holidays, &vacations).unwrap();

        let report = reports.remove(0);
        let labels: Vec<_> = report
            .special_days
            .iter()
            .map(|day| day.label.as_str())
            .collect();
        assert!(labels.contains(&"Tag der Arbeit"));
        assert!(labels.contains(&"Brückentage (Urlaub)"));
        assert_eq!(report.summary.holiday_days, 3);
        assert_eq!(report.summary.vacation_days, 2);
    }

    /// 生産性指標がレポートへ含まれることを確認する。
    #[test]
    fn test_monthly_command_includes_productivity() {
        let mut timew = MockTimewRepository::new();
        timew.expect_export().times(1).returning(|_, _| {
            Ok(vec![TimeEntry {
                start: Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap(),
                end: Some(Utc.with_ymd_and_hms(2024, 3, 4, 16, 0, 0).unwrap()),
                tags: vec!["acme".to_string()],
            }])
        });

        let command = MonthlyCommand::new(&timew);
        let mut reports = command
            .run(
                args(2024, 3),
                &HolidaySet::new(),
                &VacationRegistry::default(),
            )
            .unwrap();

        let report = reports.remove(0);
        assert_eq!(report.metrics.productive_days, 1);
        assert_eq!(
            report.metrics.best_day,
            Some((NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(), 8 * 3600))
        );
    }
}
