use chrono::{DateTime, NaiveDate, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// 現在のUTC日付を取得する。
pub fn today() -> NaiveDate {
    now().date_naive()
}

/// 日付をISO形式(`YYYY-MM-DD`)の文字列にする。
pub fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}


#[cfg(test)]
pub use mock_datetime::now;
