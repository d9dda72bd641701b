use std::io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

mod aggregate;
mod console;
mod daily_command;
mod datetime;
mod easter;
mod error;
mod holiday;
mod holiday_command;
mod monthly_command;
mod productivity;
mod store;
mod summary;
mod time_entry;
mod timew;
mod vacation;
mod vacation_command;
mod weekly_command;

use console::ConsoleText;
use daily_command::{DailyArgs, DailyCommand};
use holiday::HolidaySet;
use holiday_command::{HolidayCommand, HolidayCommands, HolidayOutcome};
use monthly_command::{MonthlyArgs, MonthlyCommand};
use store::{HolidayStore, RegionStore, VacationStore};
use timew::TimewClient;
use vacation::VacationRegistry;
use vacation_command::{VacationCommand, VacationCommands, VacationOutcome};
use weekly_command::{WeeklyArgs, WeeklyCommand};

/// Timewarriorの記録を集計するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ cargo run -- daily
/// $ cargo run -- weekly --last-week
/// $ cargo run -- monthly
/// $ cargo run -- holidays update
/// $ cargo run -- vacation add 2024-07-15 2024-07-30 Sommerurlaub
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(subcommand)]
    subcommand: SubCommands,
}

/// サブコマンドを表す列挙型。
#[derive(Debug, Subcommand)]
enum SubCommands {
    #[clap(subcommand)]
    Holidays(HolidayCommands),
    #[clap(subcommand)]
    Vacation(VacationCommands),
    Daily(DailyArgs),
    Weekly(WeeklyArgs),
    Monthly(MonthlyArgs),
}

/// ロガーを初期化する。ログは標準エラーへ出力する。
fn setup_logger() -> Result<()> {
    let colors = fern::colors::ColoredLevelConfig::new();
    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{}] {}",
                colors.color(record.level()),
                message
            ))
        })
        .level(log::LevelFilter::Info)
        .chain(io::stderr())
        .apply()
        .context("Failed to initialize logger")?;

    Ok(())
}

/// レポート生成に必要な祝日と休暇をストアから読み込む。
///
/// 破損したストアは警告の上で空として扱い、レポート生成は継続する。
fn load_calendar() -> Result<(HolidaySet, VacationRegistry)> {
    let holidays = HolidayStore::open_default()?.load_or_empty();
    let vacations = VacationRegistry::new(VacationStore::open_default()?.load_or_empty());

    Ok((holidays, vacations))
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logger()?;

    let stdout = io::stdout();
    let mut writer = stdout.lock();

    match args.subcommand {
        SubCommands::Holidays(command) => {
            let store = HolidayStore::open_default()?;
            let region = RegionStore::open_default()?;
            let outcome = HolidayCommand::new(&store, &region).run(command)?;
            let mut console = ConsoleText::new(&mut writer);
            match outcome {
                HolidayOutcome::StateSet(config) => console.show_state_set(&config)?,
                HolidayOutcome::States { active } => console.show_states(active.as_deref())?,
                HolidayOutcome::Updated { year, state, total } => {
                    console.show_holidays_updated(year, state.as_deref(), total)?;
                }
                HolidayOutcome::List(holidays) => console.show_holidays(&holidays)?,
                HolidayOutcome::Today { date, name, next } => console.show_holiday_check(
                    date,
                    name.as_deref(),
                    next.as_ref().map(|(date, name)| (*date, name.as_str())),
                )?,
            }
        }
        SubCommands::Vacation(command) => {
            let store = VacationStore::open_default()?;
            let outcome = VacationCommand::new(&store).run(command)?;
            let mut console = ConsoleText::new(&mut writer);
            match outcome {
                VacationOutcome::Added(entry) => console.show_vacation_added(&entry)?,
                VacationOutcome::List(entries) => {
                    let entries: Vec<_> = entries
                        .iter()
                        .map(|(index, entry)| (*index, entry))
                        .collect();
                    console.show_vacations(&entries)?;
                }
                VacationOutcome::Removed(entry) => console.show_vacation_removed(&entry)?,
                VacationOutcome::Stats(stats) => console.show_vacation_stats(&stats)?,
                VacationOutcome::Today {
                    date,
                    current,
                    next,
                } => console.show_vacation_today(date, current.as_ref(), next.as_ref())?,
            }
        }
        SubCommands::Daily(daily) => {
            let (holidays, vacations) = load_calendar()?;
            let timew = TimewClient::new();
            let reports = DailyCommand::new(&timew).run(daily, &holidays, &vacations)?;
            let mut console = ConsoleText::new(&mut writer);
            for report in &reports {
                console.show_daily(report)?;
            }
        }
        SubCommands::Weekly(weekly) => {
            let (holidays, vacations) = load_calendar()?;
            let timew = TimewClient::new();
            let reports = WeeklyCommand::new(&timew).run(weekly, &holidays, &vacations)?;
            let mut console = ConsoleText::new(&mut writer);
            for report in &reports {
                console.show_weekly(report)?;
            }
        }
        SubCommands::Monthly(monthly) => {
            let (holidays, vacations) = load_calendar()?;
            let timew = TimewClient::new();
            let reports = MonthlyCommand::new(&timew).run(monthly, &holidays, &vacations)?;
            let mut console = ConsoleText::new(&mut writer);
            for report in &reports {
                console.show_monthly(report)?;
            }
        }
    }

    Ok(())
}
