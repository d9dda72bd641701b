use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};

use crate::datetime::iso_date;
use crate::easter::easter_sunday;

/// ISO形式の日付文字列から祝日名への対応表。
///
/// 永続化されるJSONオブジェクトと同じ形で扱う。
pub type HolidaySet = BTreeMap<String, String>;

/// ドイツの16州のコードと名称。
pub const STATES: [(&str, &str); 16] = [
    ("BW", "Baden-Württemberg"),
    ("BY", "Bayern"),
    ("BE", "Berlin"),
    ("BB", "Brandenburg"),
    ("HB", "Bremen"),
    ("HH", "Hamburg"),
    ("HE", "Hessen"),
    ("MV", "Mecklenburg-Vorpommern"),
    ("NI", "Niedersachsen"),
    ("NW", "Nordrhein-Westfalen"),
    ("RP", "Rheinland-Pfalz"),
    ("SL", "Saarland"),
    ("SN", "Sachsen"),
    ("ST", "Sachsen-Anhalt"),
    ("SH", "Schleswig-Holstein"),
    ("TH", "Thüringen"),
];

/// 州固有の祝日名に含まれるキーワード。一覧表示で地域祝日の印を付けるために利用する。
const REGIONAL_MARKERS: [&str; 8] = [
    "Heilige Drei Könige",
    "Fronleichnam",
    "Mariä Himmelfahrt",
    "Reformationstag",
    "Allerheiligen",
    "Buß- und Bettag",
    "Frauentag",
    "regional",
];

/// 州コードに対応する州名を返す。未知のコードの場合は`None`を返す。
pub fn state_name(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(state_code, _)| *state_code == code)
        .map(|(_, name)| *name)
}

/// 指定した年と州の祝日一覧を生成する。
///
/// 州を指定しない場合は全国共通の祝日のみとなる。
/// ルールエンジン自体は州コードを検証せず、未知のコードでは追加ルールが見つからないだけとなる。
/// コードの検証は設定を受け付けるコマンド側で行う。
pub fn holidays_for(year: i32, state: Option<&str>) -> HolidaySet {
    let mut holidays = HolidaySet::new();

    // 全国共通の固定祝日
    holidays.insert(format!("{}-01-01", year), "Neujahr".to_string());
    holidays.insert(format!("{}-05-01", year), "Tag der Arbeit".to_string());
    holidays.insert(format!("{}-10-03", year), "Tag der Deutschen Einheit".to_string());
    holidays.insert(format!("{}-12-25", year), "1. Weihnachtsfeiertag".to_string());
    holidays.insert(format!("{}-12-26", year), "2. Weihnachtsfeiertag".to_string());

    // 復活祭を基準とする移動祝日
    let easter = easter_sunday(year);
    holidays.insert(iso_date(easter - Duration::days(2)), "Karfreitag".to_string());
    holidays.insert(iso_date(easter + Duration::days(1)), "Ostermontag".to_string());
    holidays.insert(
        iso_date(easter + Duration::days(39)),
        "Christi Himmelfahrt".to_string(),
    );
    holidays.insert(iso_date(easter + Duration::days(50)), "Pfingstmontag".to_string());

    // 州固有の祝日
    if let Some(state) = state {
        if matches!(state, "BW" | "BY" | "ST") {
            holidays.insert(format!("{}-01-06", year), "Heilige Drei Könige".to_string());
        }

        if matches!(state, "BW" | "BY" | "HE" | "NW" | "RP" | "SL") {
            holidays.insert(iso_date(easter + Duration::days(60)), "Fronleichnam".to_string());
        }

        // SachsenとThüringenでは一部地域のみのため、ラベルで区別する
        if matches!(state, "SN" | "TH") {
            holidays.insert(
                iso_date(easter + Duration::days(60)),
                "Fronleichnam (regional)".to_string(),
            );
        }

        if matches!(state, "BY" | "SL") {
            holidays.insert(format!("{}-08-15", year), "Mariä Himmelfahrt".to_string());
        }

        if matches!(
            state,
            "BB" | "HB" | "HH" | "MV" | "NI" | "SN" | "ST" | "SH" | "TH"
        ) {
            holidays.insert(format!("{}-10-31", year), "Reformationstag".to_string());
        }

        if matches!(state, "BW" | "BY" | "NW" | "RP" | "SL") {
            holidays.insert(format!("{}-11-01", year), "Allerheiligen".to_string());
        }

        if state == "SN" {
            holidays.insert(iso_date(repentance_day(year)), "Buß- und Bettag".to_string());
        }

        // Internationaler Frauentagは2019年からBerlinのみ
        if state == "BE" && year >= 2019 {
            holidays.insert(
                format!("{}-03-08", year),
                "Internationaler Frauentag".to_string(),
            );
        }
    }

    holidays
}

/// Buß- und Bettag(11月23日より前の直近の水曜日)を計算する。
///
/// 11月23日自身が水曜日の場合は、1週間前の水曜日となる。
fn repentance_day(year: i32) -> NaiveDate {
    use chrono::Datelike;

    let nov_23 = NaiveDate::from_ymd_opt(year, 11, 23).expect("November 23rd exists in every year");
    let mut days_back =
        (i64::from(nov_23.weekday().num_days_from_monday()) - 2).rem_euclid(7);
    if days_back == 0 {
        days_back = 7;
    }

    nov_23 - Duration::days(days_back)
}

/// 新しく生成した祝日を既存の祝日集合へ統合する。
///
/// 同じ日付のキーは新しい値で上書きされるため、州を変更して再生成すると
/// 既存の日付のラベルも更新される。
pub fn merge_holidays(existing: &mut HolidaySet, new: HolidaySet) {
    existing.extend(new);
}

/// 指定日の祝日名を返す。祝日でない場合は`None`を返す。
pub fn holiday_name(holidays: &HolidaySet, date: NaiveDate) -> Option<&str> {
    holidays.get(&iso_date(date)).map(String::as_str)
}

/// 指定日より後で最も近い祝日を返す。
pub fn next_holiday(holidays: &HolidaySet, after: NaiveDate) -> Option<(NaiveDate, &str)> {
    let key = iso_date(after);
    holidays
        .iter()
        .filter(|(date, _)| date.as_str() > key.as_str())
        .find_map(|(date, name)| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|date| (date, name.as_str()))
        })
}

/// 州固有の祝日名かどうかを判定する。
pub fn is_regional(name: &str) -> bool {
    REGIONAL_MARKERS.iter().any(|marker| name.contains(marker))
}
