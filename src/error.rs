use thiserror::Error;

/// コア処理で発生するエラーの種類。
///
/// 入力値の検証エラーは呼び出し元へそのまま返す。
/// ストア破損は`load_or_empty`で警告に落とすため、上位では通常発生しない。
#[derive(Debug, Error)]
pub enum TimewError {
    /// 日付文字列が`YYYY-MM-DD`形式ではない。
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// 終了日が開始日より前になっている。
    #[error("end date {end} is before start date {start}")]
    InvalidRange { start: String, end: String },

    /// 不明な州コードが指定された。
    #[error("unknown state code '{0}'")]
    UnknownState(String),

    /// 保存されたJSONが解析できない。
    #[error("store file {path} is corrupt: {source}")]
    CorruptStore {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
