use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use log::info;

use crate::datetime;
use crate::store::VacationStore;
use crate::vacation::{VacationEntry, VacationRegistry, VacationStats, DEFAULT_KIND};

/// 休暇を管理するためのサブコマンド。
#[derive(Debug, clap::Subcommand)]
pub enum VacationCommands {
    /// 新しい不在期間を登録する。
    #[clap(about = "Add a vacation period")]
    Add {
        #[clap(help = "First day in the format YYYY-MM-DD")]
        start: String,
        #[clap(help = "Last day (inclusive) in the format YYYY-MM-DD")]
        end: String,
        #[clap(help = "Name of the vacation")]
        name: String,
        #[clap(
            short = 't',
            long = "type",
            default_value = DEFAULT_KIND,
            help = "Kind of absence, e.g. Urlaub or Krankheit"
        )]
        kind: String,
    },

    /// 登録済みの不在期間を一覧表示する。
    #[clap(about = "List vacation periods")]
    List {
        #[clap(short = 'y', long = "year", help = "Only show entries starting in this year")]
        year: Option<i32>,
        #[clap(short = 't', long = "type", help = "Only show entries of this kind")]
        kind: Option<String>,
    },

    /// 一覧のインデックスで不在期間を削除する。
    #[clap(about = "Remove a vacation period by its list index")]
    Remove {
        #[clap(help = "Index as shown by the list command")]
        index: usize,
    },

    /// 種類ごとの統計を表示する。
    #[clap(about = "Show statistics per kind of absence")]
    Stats {
        #[clap(short = 'y', long = "year", help = "Only count entries starting in this year")]
        year: Option<i32>,
    },

    /// 今日が休暇中かどうかを表示する。
    #[clap(about = "Check whether today falls into a vacation period")]
    Today,
}

/// `vacation`サブコマンドの処理結果。
#[derive(Clone, Debug, PartialEq)]
pub enum VacationOutcome {
    Added(VacationEntry),
    /// 全体のリストにおけるインデックス付きの一覧。
    /// 絞り込み後もインデックスは削除に利用できる値のまま保たれる。
    List(Vec<(usize, VacationEntry)>),
    Removed(VacationEntry),
    Stats(VacationStats),
    Today {
        date: NaiveDate,
        current: Option<VacationEntry>,
        next: Option<VacationEntry>,
    },
}

/// `vacation`サブコマンドの処理を行う。
pub struct VacationCommand<'a> {
    store: &'a VacationStore,
}

impl<'a> VacationCommand<'a> {
    /// 新しい`VacationCommand`を返す。
    pub fn new(store: &'a VacationStore) -> Self {
        Self { store }
    }

    /// サブコマンドを実行する。
    pub fn run(&self, command: VacationCommands) -> Result<VacationOutcome> {
        let mut registry = VacationRegistry::new(self.store.load_or_empty());

        match command {
            VacationCommands::Add {
                start,
                end,
                name,
                kind,
            } => {
                let entry = registry.add(&start, &end, &name, &kind)?.clone();
                self.store
                    .save(registry.entries())
                    .context("Failed to save vacation store")?;
                info!("Added vacation '{}' ({} days)", entry.name, entry.days);

                Ok(VacationOutcome::Added(entry))
            }
            VacationCommands::List { year, kind } => {
                let entries = registry
                    .entries()
                    .iter()
                    .enumerate()
                    .filter(|(_, entry)| {
                        year.map_or(true, |year| entry.start.starts_with(&year.to_string()))
                    })
                    .filter(|(_, entry)| {
                        kind.as_deref().map_or(true, |kind| {
                            entry.kind.to_lowercase() == kind.to_lowercase()
                        })
                    })
                    .map(|(index, entry)| (index, entry.clone()))
                    .collect();

                Ok(VacationOutcome::List(entries))
            }
            VacationCommands::Remove { index } => {
                let removed = match registry.remove(index) {
                    Some(entry) => entry,
                    None => bail!("No vacation entry at index {}", index),
                };
                self.store
                    .save(registry.entries())
                    .context("Failed to save vacation store")?;
                info!("Removed vacation '{}'", removed.name);

                Ok(VacationOutcome::Removed(removed))
            }
            VacationCommands::Stats { year } => Ok(VacationOutcome::Stats(registry.stats(year))),
            VacationCommands::Today => {
                let date = datetime::today();

                Ok(VacationOutcome::Today {
                    date,
                    current: registry.find(date).cloned(),
                    next: registry.next_after(date).cloned(),
                })
            }
        }
    }
}
