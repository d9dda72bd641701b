use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use log::warn;

use crate::time_entry::TimeEntry;

/// タグを持たないエントリに割り当てるプロジェクト名。
pub const NO_PROJECT: &str = "Ohne Projekt";

/// 1日の分類。優先順位は祝日 > 休暇 > 週末 > 労働日となる。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DayKind {
    Holiday,
    Vacation,
    Weekend,
    Workday,
}

/// 1日分の集計結果。
///
/// `is_weekend`は曜日から常に設定されるが、`is_holiday`と`is_vacation`は
/// ストアを参照する`classify_buckets`で設定される。
#[derive(Clone, Debug, PartialEq)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub total_seconds: i64,
    pub projects: BTreeMap<String, i64>,
    pub is_holiday: bool,
    pub is_vacation: bool,
    pub is_weekend: bool,
}

impl DayBucket {
    /// 記録を持たない空のバケツを作成する。
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            total_seconds: 0,
            projects: BTreeMap::new(),
            is_holiday: false,
            is_vacation: false,
            is_weekend: matches!(date.weekday(), Weekday::Sat | Weekday::Sun),
        }
    }

    /// 優先順位に従って1つの分類を返す。
    pub fn kind(&self) -> DayKind {
        if self.is_holiday {
            DayKind::Holiday
        } else if self.is_vacation {
            DayKind::Vacation
        } else if self.is_weekend {
            DayKind::Weekend
        } else {
            DayKind::Workday
        }
    }
}

/// 時間記録を日ごとのバケツへ集計する。
///
/// - 期間内の全ての日付に対してバケツを作成し、記録の無い日も0秒のバケツとして残す。
/// - `end`の無い記録(進行中)は集計しない。
/// - 日付をまたぐ記録も、開始時刻のUTC日付へ全体を割り当てて分割しない。
/// - プロジェクト名は先頭タグのみを利用し、タグが無い場合は`NO_PROJECT`とする。
/// - 期間外の日付から始まる記録は無視する。
///
/// # Arguments
///
/// * `entries` - 集計対象の時間記録
/// * `start` - 集計期間の開始日
/// * `end` - 集計期間の終了日(期間に含まれる)
pub fn aggregate(
    entries: &[TimeEntry],
    start: NaiveDate,
    end: NaiveDate,
) -> BTreeMap<NaiveDate, DayBucket> {
    let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    let mut date = start;
    while date <= end {
        buckets.insert(date, DayBucket::empty(date));
        date += Duration::days(1);
    }

    for entry in entries {
        let stop = match entry.end {
            Some(stop) => stop,
            None => continue,
        };
        let mut duration = (stop - entry.start).num_seconds();
        if duration < 0 {
            warn!(
                "entry starting at {} ends before it starts, counting as 0 seconds",
                entry.start
            );
            duration = 0;
        }

        let bucket = match buckets.get_mut(&entry.start.date_naive()) {
            Some(bucket) => bucket,
            None => continue,
        };

        let project = entry
            .tags
            .first()
            .map(String::as_str)
            .unwrap_or(NO_PROJECT);
        bucket.total_seconds += duration;
        *bucket.projects.entry(project.to_string()).or_insert(0) += duration;
    }

    buckets
}
