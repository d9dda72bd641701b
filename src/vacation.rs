use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::datetime;
use crate::error::TimewError;

/// 種類を指定しない場合の既定値。
pub const DEFAULT_KIND: &str = "Urlaub";

/// 休暇・病欠などの1件の不在期間。
///
/// `start`と`end`はISO形式の日付文字列で、`end`は期間に含まれる。
/// `days`は常に`(end - start) + 1`となる。
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct VacationEntry {
    pub start: String,
    pub end: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub days: i64,
    pub created: String,
}

impl VacationEntry {
    /// 指定日が期間に含まれるかを判定する。
    ///
    /// ISO形式の文字列は辞書順が日付順と一致するため、文字列のまま比較する。
    pub fn contains(&self, date: NaiveDate) -> bool {
        let key = datetime::iso_date(date);
        self.start.as_str() <= key.as_str() && key.as_str() <= self.end.as_str()
    }
}

/// 種類ごとの件数と合計日数。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct KindStats {
    pub count: usize,
    pub days: i64,
}

/// 不在期間の統計。
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VacationStats {
    pub by_kind: BTreeMap<String, KindStats>,
    pub total_entries: usize,
    pub total_days: i64,
}

/// 不在期間の一覧を管理するレジストリ。
///
/// 追加順を保持し、期間が重複する場合は先に追加されたエントリが優先される。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VacationRegistry {
    entries: Vec<VacationEntry>,
}

impl VacationRegistry {
    /// 永続化されたエントリの一覧からレジストリを作成する。
    pub fn new(entries: Vec<VacationEntry>) -> Self {
        Self { entries }
    }

    /// 追加順のエントリ一覧を返す。
    pub fn entries(&self) -> &[VacationEntry] {
        &self.entries
    }

    /// 新しい不在期間を追加する。
    ///
    /// 日数は終了日を含めて`(end - start) + 1`で計算する。
    /// 日付が不正な場合や終了日が開始日より前の場合はエラーを返す。
    /// 既存の期間との重複は検査しない。
    pub fn add(
        &mut self,
        start: &str,
        end: &str,
        name: &str,
        kind: &str,
    ) -> Result<&VacationEntry, TimewError> {
        let start_date = parse_date(start)?;
        let end_date = parse_date(end)?;
        if end_date < start_date {
            return Err(TimewError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }

        let entry = VacationEntry {
            start: datetime::iso_date(start_date),
            end: datetime::iso_date(end_date),
            name: name.to_string(),
            kind: kind.to_string(),
            days: (end_date - start_date).num_days() + 1,
            created: datetime::now().to_rfc3339(),
        };
        self.entries.push(entry);

        Ok(self.entries.last().expect("entry was just pushed"))
    }

    /// 指定した位置のエントリを削除する。範囲外の場合は`None`を返す。
    ///
    /// 位置は安定した識別子ではないため、一覧表示から削除までの間に
    /// 別の変更が入ると意図しないエントリを削除しうる。
    pub fn remove(&mut self, index: usize) -> Option<VacationEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// 指定日を含む最初のエントリを返す。
    ///
    /// 期間が重複している場合は、追加順で先のエントリが後のエントリを隠す。
    pub fn find(&self, date: NaiveDate) -> Option<&VacationEntry> {
        self.entries.iter().find(|entry| entry.contains(date))
    }

    /// 年や種類で絞り込んだ一覧を返す。
    ///
    /// 年は開始日の先頭4桁、種類は大文字小文字を区別せずに比較する。
    pub fn list(&self, year: Option<i32>, kind: Option<&str>) -> Vec<&VacationEntry> {
        self.entries
            .iter()
            .filter(|entry| {
                year.map_or(true, |year| entry.start.starts_with(&year.to_string()))
            })
            .filter(|entry| {
                kind.map_or(true, |kind| {
                    entry.kind.to_lowercase() == kind.to_lowercase()
                })
            })
            .collect()
    }

    /// 種類ごとの件数と合計日数を集計する。
    pub fn stats(&self, year: Option<i32>) -> VacationStats {
        let mut stats = VacationStats::default();
        for entry in self.list(year, None) {
            let kind_stats = stats.by_kind.entry(entry.kind.clone()).or_default();
            kind_stats.count += 1;
            kind_stats.days += entry.days;
            stats.total_entries += 1;
            stats.total_days += entry.days;
        }

        stats
    }

    /// 指定日より後に始まる次の不在期間を返す。
    pub fn next_after(&self, date: NaiveDate) -> Option<&VacationEntry> {
        let key = datetime::iso_date(date);
        self.entries
            .iter()
            .filter(|entry| entry.start.as_str() > key.as_str())
            .min_by(|a, b| a.start.cmp(&b.start))
    }
}

/// ISO形式の日付文字列を解析する。
fn parse_date(value: &str) -> Result<NaiveDate, TimewError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| TimewError::InvalidDate(value.to_string()))
}
