use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};
use log::info;

use crate::aggregate::{aggregate, DayBucket};
use crate::datetime;
use crate::holiday::HolidaySet;
use crate::summary::{classify_buckets, summarize_week, week_range, WeekSummary};
use crate::timew::TimewRepository;
use crate::vacation::VacationRegistry;

/// 週毎のレポートを出力するためのサブコマンド。
#[derive(Debug, clap::Args)]
pub struct WeeklyArgs {
    #[clap(
        short = 'd',
        long = "date",
        help = "Sets a custom date in the format YYYY-MM-DD",
        parse(try_from_str = parse_date),
    )]
    date: Option<NaiveDate>,

    #[clap(long = "last-week", help = "Show the report for the previous week")]
    last_week: bool,

    #[clap(
        long = "weeks",
        default_value = "1",
        help = "Number of past weeks to show (oldest first)"
    )]
    weeks: u32,
}

/// 1週間分のレポート。
#[derive(Clone, Debug, PartialEq)]
pub struct WeeklyReport {
    pub summary: WeekSummary,
    pub buckets: BTreeMap<NaiveDate, DayBucket>,
}

/// `weekly`サブコマンドの処理を行う。
pub struct WeeklyCommand<'a, T: TimewRepository> {
    timew: &'a T,
}

impl<'a, T: TimewRepository> WeeklyCommand<'a, T> {
    /// 新しい`WeeklyCommand`を返す。
    pub fn new(timew: &'a T) -> Self {
        Self { timew }
    }

    /// 対象の週ごとにレポートを作成する。
    ///
    /// `--weeks N`(N > 1)は今日を含む直近N週間を古い順に対象とし、
    /// `--last-week`や日付指定より優先される。`--last-week`は今日を基準とした
    /// 前の週を対象とし、日付指定より優先される。
    /// 日付が指定されていない場合は現在のUTC日付を利用する。
    ///
    /// # Arguments
    ///
    /// * `args` - `weekly`サブコマンドの引数
    /// * `holidays` - 祝日の集合
    /// * `vacations` - 休暇のレジストリ
    pub fn run(
        &self,
        args: WeeklyArgs,
        holidays: &HolidaySet,
        vacations: &VacationRegistry,
    ) -> Result<Vec<WeeklyReport>> {
        let today = datetime::today();
        let references: Vec<NaiveDate> = if args.weeks > 1 {
            (0..i64::from(args.weeks))
                .rev()
                .map(|i| today - Duration::weeks(i))
                .collect()
        } else if args.last_week {
            vec![today - Duration::weeks(1)]
        } else {
            vec![args.date.unwrap_or(today)]
        };

        references
            .into_iter()
            .map(|reference| self.report_for(reference, holidays, vacations))
            .collect()
    }

    /// 指定された日付を含む週(月曜〜日曜)のレポートを作成する。
    fn report_for(
        &self,
        reference: NaiveDate,
        holidays: &HolidaySet,
        vacations: &VacationRegistry,
    ) -> Result<WeeklyReport> {
        let (monday, sunday) = week_range(reference);
        info!("Generating weekly report for {} to {}", monday, sunday);

        let time_entries = self
            .timew
            .export(monday, sunday)
            .context("Failed to retrieve time entries")?;
        let mut buckets = aggregate(&time_entries, monday, sunday);
        classify_buckets(&mut buckets, holidays, vacations);

        Ok(WeeklyReport {
            summary: summarize_week(&buckets),
            buckets,
        })
    }
}

/// 日付をパースする。
fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Failed to parse date: {}", s))
}
