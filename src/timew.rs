use std::process::Command;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::{info, warn};
#[cfg(test)]
use mockall::automock;
use serde::Deserialize;

use crate::datetime::iso_date;
use crate::time_entry::TimeEntry;

/// `timew export`のJSONレコードをデシリアライズするための構造体。
#[derive(Debug, Deserialize)]
struct TimewRecord {
    start: String,
    end: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

/// Timewarriorから時間記録を取得するためのリポジトリ。
#[cfg_attr(test, automock)]
pub trait TimewRepository {
    /// 指定期間(両端を含む)の時間記録を取得する。
    ///
    /// # Arguments
    ///
    /// * `start` - 取得する期間の開始日
    /// * `end` - 取得する期間の終了日
    fn export(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<TimeEntry>>;
}

/// `timew`コマンドを実行して時間記録を取得するクライアント。
///
/// コマンドの実行失敗や出力の解析失敗は致命的なエラーとせず、
/// 警告を出した上で空の一覧として扱う。レポート生成は記録なしとして継続する。
///
/// # Examples
///
/// ```
/// let client = TimewClient::new();
/// let time_entries = client.export(start, end).unwrap();
/// ```
pub struct TimewClient {
    command: String,
}

impl TimewClient {
    /// 新しい`TimewClient`を返す。
    pub fn new() -> Self {
        Self {
            command: "timew".to_string(),
        }
    }
}

impl TimewRepository for TimewClient {
    fn export(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<TimeEntry>> {
        let start_str = iso_date(start);
        let end_str = iso_date(end);
        let mut command = Command::new(&self.command);
        command.arg("export").arg(&start_str);
        if start_str != end_str {
            command.arg("to").arg(&end_str);
        }

        let output = match command.output() {
            Ok(output) => output,
            Err(err) => {
                warn!("failed to run '{} export': {}", self.command, err);
                return Ok(vec![]);
            }
        };
        if !output.status.success() {
            warn!("'{} export' exited with {}", self.command, output.status);
            return Ok(vec![]);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        if stdout.trim().is_empty() {
            return Ok(vec![]);
        }

        let records: Vec<TimewRecord> = match serde_json::from_str(stdout.trim()) {
            Ok(records) => records,
            Err(err) => {
                warn!("failed to parse '{} export' output: {}", self.command, err);
                return Ok(vec![]);
            }
        };
        info!("length of time entries: {}", records.len());

        Ok(records.into_iter().filter_map(into_time_entry).collect())
    }
}

/// exportレコードを`TimeEntry`へ変換する。
///
/// 時刻を解析できないレコードは警告を出して除外する。
fn into_time_entry(record: TimewRecord) -> Option<TimeEntry> {
    let start = parse_timestamp(&record.start)?;
    let end = match record.end {
        Some(value) => Some(parse_timestamp(&value)?),
        None => None,
    };

    Some(TimeEntry {
        start,
        end,
        tags: record.tags,
    })
}

/// Timewarriorのコンパクト形式(`20240304T080000Z`)またはRFC 3339の時刻を解析する。
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y%m%dT%H%M%SZ") {
        return Some(datetime.and_utc());
    }

    match DateTime::parse_from_rfc3339(value) {
        Ok(datetime) => Some(datetime.to_utc()),
        Err(err) => {
            warn!("failed to parse timestamp '{}': {}", value, err);
            None
        }
    }
}
