use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use log::info;

use crate::aggregate::{aggregate, DayBucket, DayKind};
use crate::datetime;
use crate::holiday::{holiday_name, HolidaySet};
use crate::summary::classify_buckets;
use crate::timew::TimewRepository;
use crate::vacation::{VacationEntry, VacationRegistry};

/// 日毎のレポートを出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct DailyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(long = "yesterday", help = "Show the report for yesterday")]
    yesterday: bool,

    #[clap(long = "week", help = "Show reports for the last 7 days")]
    week: bool,
}

/// 1日分のレポート。
#[derive(Clone, Debug, PartialEq)]
pub struct DailyReport {
    pub date: NaiveDate,
    pub kind: DayKind,
    /// 祝日の場合の祝日名。
    pub holiday: Option<String>,
    /// 休暇期間内の場合の該当エントリ。
    pub vacation: Option<VacationEntry>,
    pub bucket: DayBucket,
}

/// `daily`サブコマンドの処理を行う。
pub struct DailyCommand<'a, T: TimewRepository> {
    timew: &'a T,
}

impl<'a, T: TimewRepository> DailyCommand<'a, T> {
    /// 新しい`DailyCommand`を返す。
    ///
    /// # Arguments
    /// * `timew` - Timewarriorから時間記録を取得するためのリポジトリ
    pub fn new(timew: &'a T) -> Self {
        Self { timew }
    }

    /// 対象の日付ごとに1日分のレポートを作成する。
    ///
    /// `--week`は直近7日間(今日を含む)を古い順に対象とし、
    /// `--yesterday`や日付指定より優先される。
    /// 日付が指定されていない場合は現在のUTC日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `daily`サブコマンドの引数
    /// * `holidays` - 祝日の集合
    /// * `vacations` - 休暇のレジストリ
    pub fn run(
        &self,
        args: DailyArgs,
        holidays: &HolidaySet,
        vacations: &VacationRegistry,
    ) -> Result<Vec<DailyReport>> {
        let today = datetime::today();
        let dates: Vec<NaiveDate> = if args.week {
            (0..7).rev().map(|i| today - Duration::days(i)).collect()
        } else if args.yesterday {
            vec![today - Duration::days(1)]
        } else {
            vec![args.date.unwrap_or(today)]
        };

        dates
            .into_iter()
            .map(|date| self.report_for(date, holidays, vacations))
            .collect()
    }

    /// 指定された日付の1日分のレポートを作成する。
    ///
    /// 祝日や休暇の日でも時間記録は取得し、記録があれば集計へ含める。
    fn report_for(
        &self,
        date: NaiveDate,
        holidays: &HolidaySet,
        vacations: &VacationRegistry,
    ) -> Result<DailyReport> {
        info!("Generating daily report for {}", date);

        let time_entries = self
            .timew
            .export(date, date)
            .context("Failed to retrieve time entries")?;
        let mut buckets = aggregate(&time_entries, date, date);
        classify_buckets(&mut buckets, holidays, vacations);
        let bucket = buckets
            .remove(&date)
            .context("Aggregation did not produce a bucket for the requested date")?;

        Ok(DailyReport {
            date,
            kind: bucket.kind(),
            holiday: holiday_name(holidays, date).map(str::to_string),
            vacation: vacations.find(date).cloned(),
            bucket,
        })
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))
}
