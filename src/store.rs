use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use log::warn;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::datetime;
use crate::error::TimewError;
use crate::holiday::HolidaySet;
use crate::vacation::VacationEntry;

/// 州設定(`config/regional.json`)の内容。
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct RegionConfig {
    pub state: String,
    pub state_name: String,
    pub updated: String,
}

impl RegionConfig {
    /// 現在時刻を更新日時として新しい設定を作成する。
    pub fn new(state: &str, state_name: &str) -> Self {
        Self {
            state: state.to_string(),
            state_name: state_name.to_string(),
            updated: datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Timewarriorのデータディレクトリ(`~/.timewarrior/data`)を返す。
fn data_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to resolve home directory")?;

    Ok(home.join(".timewarrior").join("data"))
}

/// 1つのJSONファイルを読み込む。
///
/// ファイルが存在しない、または読み込めない場合は既定値を返す。
/// JSONとして解析できない場合のみ`CorruptStore`を返し、
/// 破損を空のストアと区別できるようにする。
fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, TimewError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(_) => return Ok(T::default()),
    };

    serde_json::from_str(&text).map_err(|source| TimewError::CorruptStore {
        path: path.display().to_string(),
        source,
    })
}

/// 1つのJSONファイルへ書き込む。親ディレクトリが無い場合は作成する。
///
/// 読み込みから書き込みまでの間はロックされないため、同じストアへの
/// 並行した更新は後勝ちとなり、先の更新が失われることがある。
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(value).context("Failed to serialize store")?;
    fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
}

/// 祝日ストア(`holidays/holidays.json`)。
pub struct HolidayStore {
    path: PathBuf,
}

impl HolidayStore {
    /// 既定の場所を参照するストアを返す。
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("holidays").join("holidays.json")))
    }

    /// 指定したパスを参照するストアを返す。
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// ストアを読み込む。ファイルが無い場合は空の集合を返す。
    pub fn load(&self) -> Result<HolidaySet, TimewError> {
        read_json(&self.path)
    }

    /// ストアを読み込み、破損している場合は警告を出して空として扱う。
    pub fn load_or_empty(&self) -> HolidaySet {
        self.load().unwrap_or_else(|err| {
            warn!("{}", err);
            HolidaySet::new()
        })
    }

    pub fn save(&self, holidays: &HolidaySet) -> Result<()> {
        write_json(&self.path, holidays)
    }
}

/// 休暇ストア(`vacation/vacation.json`)。
pub struct VacationStore {
    path: PathBuf,
}

impl VacationStore {
    /// 既定の場所を参照するストアを返す。
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("vacation").join("vacation.json")))
    }

    /// 指定したパスを参照するストアを返す。
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// ストアを読み込む。ファイルが無い場合は空の一覧を返す。
    pub fn load(&self) -> Result<Vec<VacationEntry>, TimewError> {
        read_json(&self.path)
    }

    /// ストアを読み込み、破損している場合は警告を出して空として扱う。
    pub fn load_or_empty(&self) -> Vec<VacationEntry> {
        self.load().unwrap_or_else(|err| {
            warn!("{}", err);
            vec![]
        })
    }

    pub fn save(&self, entries: &[VacationEntry]) -> Result<()> {
        write_json(&self.path, &entries)
    }
}

/// 州設定ストア(`config/regional.json`)。
pub struct RegionStore {
    path: PathBuf,
}

impl RegionStore {
    /// 既定の場所を参照するストアを返す。
    pub fn open_default() -> Result<Self> {
        Ok(Self::at(data_dir()?.join("config").join("regional.json")))
    }

    /// 指定したパスを参照するストアを返す。
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// 設定を読み込む。ファイルが無い場合は`None`を返す。
    pub fn load(&self) -> Result<Option<RegionConfig>, TimewError> {
        read_json(&self.path)
    }

    /// 設定を読み込み、破損している場合は警告を出して未設定として扱う。
    pub fn load_or_empty(&self) -> Option<RegionConfig> {
        self.load().unwrap_or_else(|err| {
            warn!("{}", err);
            None
        })
    }

    pub fn save(&self, config: &RegionConfig) -> Result<()> {
        write_json(&self.path, config)
    }
}
