use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use log::info;

use crate::datetime;
use crate::error::TimewError;
use crate::holiday::{
    holiday_name, holidays_for, merge_holidays, next_holiday, state_name, HolidaySet,
};
use crate::store::{HolidayStore, RegionConfig, RegionStore};

/// 祝日を管理するためのサブコマンド。
#[derive(Debug, clap::Subcommand)]
pub enum HolidayCommands {
    /// 祝日生成に利用する州を設定する。
    #[clap(about = "Set the state used for regional holidays")]
    SetState {
        #[clap(help = "State code, e.g. SN or BY")]
        state: String,
    },

    /// 既知の州コードの一覧を表示する。
    #[clap(about = "List all known state codes")]
    ShowStates,

    /// 指定した年の祝日を生成してストアへ統合する。
    #[clap(about = "Generate holidays for a year and merge them into the store")]
    Update {
        #[clap(short = 'y', long = "year", help = "Year to generate (default: current year)")]
        year: Option<i32>,
    },

    /// 保存済みの祝日の一覧を表示する。
    #[clap(about = "List stored holidays")]
    List {
        #[clap(short = 'y', long = "year", help = "Only show holidays of this year")]
        year: Option<i32>,
    },

    /// 今日が祝日かどうかを表示する。
    #[clap(about = "Check whether today is a holiday")]
    Today,
}

/// `holidays`サブコマンドの処理結果。
#[derive(Clone, Debug, PartialEq)]
pub enum HolidayOutcome {
    StateSet(RegionConfig),
    States { active: Option<String> },
    Updated { year: i32, state: Option<String>, total: usize },
    List(HolidaySet),
    Today {
        date: NaiveDate,
        name: Option<String>,
        next: Option<(NaiveDate, String)>,
    },
}

/// `holidays`サブコマンドの処理を行う。
pub struct HolidayCommand<'a> {
    store: &'a HolidayStore,
    region: &'a RegionStore,
}

impl<'a> HolidayCommand<'a> {
    /// 新しい`HolidayCommand`を返す。
    pub fn new(store: &'a HolidayStore, region: &'a RegionStore) -> Self {
        Self { store, region }
    }

    /// サブコマンドを実行する。
    pub fn run(&self, command: HolidayCommands) -> Result<HolidayOutcome> {
        match command {
            HolidayCommands::SetState { state } => self.set_state(&state),
            HolidayCommands::ShowStates => Ok(HolidayOutcome::States {
                active: self.region.load_or_empty().map(|config| config.state),
            }),
            HolidayCommands::Update { year } => self.update(year),
            HolidayCommands::List { year } => self.list(year),
            HolidayCommands::Today => self.today(),
        }
    }

    /// 州を検証して設定へ保存する。
    ///
    /// 州コードは大文字へ正規化して受け付ける。
    fn set_state(&self, state: &str) -> Result<HolidayOutcome> {
        let code = state.trim().to_uppercase();
        let name = state_name(&code).ok_or_else(|| TimewError::UnknownState(code.clone()))?;
        let config = RegionConfig::new(&code, name);
        self.region
            .save(&config)
            .context("Failed to save regional configuration")?;
        info!("Regional state set to {} ({})", code, name);

        Ok(HolidayOutcome::StateSet(config))
    }

    /// 祝日を生成してストアへ統合する。
    ///
    /// 州が設定されていない場合は全国共通の祝日のみを生成する。
    /// 既存の年の祝日は上書きされるため、州の変更後に再実行すると
    /// 保存済みのラベルも更新される。
    fn update(&self, year: Option<i32>) -> Result<HolidayOutcome> {
        let year = year.unwrap_or_else(|| datetime::today().year());
        let config = self.region.load_or_empty();
        let state = config.map(|config| config.state);
        let generated = holidays_for(year, state.as_deref());

        let mut stored = self.store.load_or_empty();
        merge_holidays(&mut stored, generated);
        self.store
            .save(&stored)
            .context("Failed to save holiday store")?;
        info!("Updated holidays for {} ({} entries stored)", year, stored.len());

        Ok(HolidayOutcome::Updated {
            year,
            state,
            total: stored.len(),
        })
    }

    /// 保存済みの祝日を年で絞り込んで返す。
    fn list(&self, year: Option<i32>) -> Result<HolidayOutcome> {
        let stored = self.store.load_or_empty();
        let holidays = match year {
            Some(year) => {
                let prefix = year.to_string();
                stored
                    .into_iter()
                    .filter(|(date, _)| date.starts_with(&prefix))
                    .collect()
            }
            None => stored,
        };

        Ok(HolidayOutcome::List(holidays))
    }

    /// 今日の祝日判定と次の祝日を返す。
    fn today(&self) -> Result<HolidayOutcome> {
        let date = datetime::today();
        let stored = self.store.load_or_empty();

        Ok(HolidayOutcome::Today {
            date,
            name: holiday_name(&stored, date).map(str::to_string),
            next: next_holiday(&stored, date).map(|(date, name)| (date, name.to_string())),
        })
    }
}
