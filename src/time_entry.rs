use chrono::{DateTime, Utc};

/// Timewarriorの1件の時間記録。
///
/// `end`が無いエントリは記録中であり、集計の対象外となる。
/// プロジェクト名としては先頭のタグのみを利用し、残りのタグは参考情報となる。
#[derive(Clone, Debug, PartialEq)]
pub struct TimeEntry {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}
