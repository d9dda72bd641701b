use chrono::NaiveDate;

/// 指定した年のOstersonntag(復活祭の日曜日)を計算する。
///
/// グレゴリオ暦向けのGauss/Meeusの合同式を利用しており、1583年以降の任意の年で有効となる。
///
/// # Examples
///
/// ```
/// let easter = easter_sunday(2024); // 2024-03-31
/// ```
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;

    // 合同式の結果は常に3月22日から4月25日の範囲に収まる
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
        .expect("easter computation stays within March or April")
}
