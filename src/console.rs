use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Weekday};

use crate::aggregate::DayKind;
use crate::daily_command::DailyReport;
use crate::holiday::{is_regional, HolidaySet, STATES};
use crate::monthly_command::MonthlyReport;
use crate::store::RegionConfig;
use crate::summary::{VarianceStatus, EXPECTED_DAY_SECONDS};
use crate::vacation::{VacationEntry, VacationStats};
use crate::weekly_command::WeeklyReport;

/// 秒数を`H:MM`形式へ変換する。
pub fn format_duration(seconds: i64) -> String {
    let seconds = seconds.max(0);

    format!("{}:{:02}", seconds / 3600, (seconds % 3600) / 60)
}

/// 差分の秒数を符号付きの`H:MM`形式へ変換する。差が無い場合は`±0:00`となる。
pub fn format_variance(seconds: i64) -> String {
    match seconds {
        0 => "±0:00".to_string(),
        s if s > 0 => format!("+{}", format_duration(s)),
        s => format!("-{}", format_duration(-s)),
    }
}

/// 曜日のドイツ語名を返す。
fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Montag",
        Weekday::Tue => "Dienstag",
        Weekday::Wed => "Mittwoch",
        Weekday::Thu => "Donnerstag",
        Weekday::Fri => "Freitag",
        Weekday::Sat => "Samstag",
        Weekday::Sun => "Sonntag",
    }
}

/// 月のドイツ語名を返す。1〜12以外の月は数字のまま表示する。
fn month_name(month: u32) -> String {
    match month {
        1 => "Januar".to_string(),
        2 => "Februar".to_string(),
        3 => "März".to_string(),
        4 => "April".to_string(),
        5 => "Mai".to_string(),
        6 => "Juni".to_string(),
        7 => "Juli".to_string(),
        8 => "August".to_string(),
        9 => "September".to_string(),
        10 => "Oktober".to_string(),
        11 => "November".to_string(),
        12 => "Dezember".to_string(),
        other => other.to_string(),
    }
}

/// 日の分類の表示ラベルを返す。労働日はラベル無しとなる。
fn kind_label(kind: DayKind) -> Option<&'static str> {
    match kind {
        DayKind::Holiday => Some("Feiertag"),
        DayKind::Vacation => Some("Urlaub"),
        DayKind::Weekend => Some("Wochenende"),
        DayKind::Workday => None,
    }
}

/// 差分の状態の表示ラベルを返す。
fn status_label(status: VarianceStatus) -> &'static str {
    match status {
        VarianceStatus::Over => "Überstunden",
        VarianceStatus::Under => "Unterstunden",
        VarianceStatus::Exact => "Ausgeglichen",
    }
}

/// レポートをMarkdownのlist形式でConsoleに表示する。
pub struct ConsoleText<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleText<'a, W> {
    /// 新しい`ConsoleText`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }

    /// 1日分のレポートを表示する。
    pub fn show_daily(&mut self, report: &DailyReport) -> Result<()> {
        writeln!(
            self.writer,
            "# Tagesbericht {}, {}",
            weekday_name(report.date.weekday()),
            report.date
        )?;
        if let Some(name) = &report.holiday {
            writeln!(self.writer, "Feiertag: {}", name)?;
        }
        if let Some(entry) = &report.vacation {
            writeln!(self.writer, "Urlaub: {} ({})", entry.name, entry.kind)?;
        }
        writeln!(
            self.writer,
            "Gesamt: {}",
            format_duration(report.bucket.total_seconds)
        )?;
        if report.kind == DayKind::Workday {
            writeln!(
                self.writer,
                "Soll: {} | Differenz: {}",
                format_duration(EXPECTED_DAY_SECONDS),
                format_variance(report.bucket.total_seconds - EXPECTED_DAY_SECONDS)
            )?;
        }
        for (project, seconds) in &report.bucket.projects {
            writeln!(self.writer, "- {}: {}", project, format_duration(*seconds))
                .with_context(|| format!("Failed to write project line: {}", project))?;
        }

        Ok(())
    }

    /// 1週間分のレポートを表示する。
    pub fn show_weekly(&mut self, report: &WeeklyReport) -> Result<()> {
        let summary = &report.summary;
        writeln!(
            self.writer,
            "# Wochenbericht KW {:02}/{} ({} bis {})",
            summary.iso_week, summary.iso_year, summary.first_day, summary.last_day
        )?;
        writeln!(
            self.writer,
            "Gesamt: {} | Soll: {} | Differenz: {} ({})",
            format_duration(summary.total_seconds),
            format_duration(summary.expected_seconds),
            format_variance(summary.variance_seconds),
            status_label(summary.status)
        )?;
        writeln!(self.writer, "Arbeitstage: {}", summary.workdays)?;

        for bucket in report.buckets.values() {
            let label = kind_label(bucket.kind())
                .map(|label| format!(" [{}]", label))
                .unwrap_or_default();
            writeln!(
                self.writer,
                "- {} {}: {}{}",
                weekday_name(bucket.date.weekday()),
                bucket.date,
                format_duration(bucket.total_seconds),
                label
            )
            .with_context(|| format!("Failed to write day line: {}", bucket.date))?;
        }

        if !summary.projects.is_empty() {
            writeln!(self.writer, "Projekte:")?;
            for (project, seconds) in &summary.projects {
                writeln!(self.writer, "- {}: {}", project, format_duration(*seconds))?;
            }
        }

        Ok(())
    }

    /// 1ヶ月分のレポートを表示する。
    pub fn show_monthly(&mut self, report: &MonthlyReport) -> Result<()> {
        let summary = &report.summary;
        writeln!(
            self.writer,
            "# Monatsbericht {} {}",
            month_name(summary.month),
            summary.year
        )?;
        writeln!(
            self.writer,
            "Gesamt: {} | Soll: {} | Differenz: {} ({})",
            format_duration(summary.total_seconds),
            format_duration(summary.expected_seconds),
            format_variance(summary.variance_seconds),
            status_label(summary.status)
        )?;
        writeln!(
            self.writer,
            "Arbeitstage: {} | Feiertage: {} | Urlaubstage: {} | Wochenendtage: {}",
            summary.workdays, summary.holiday_days, summary.vacation_days, summary.weekend_days
        )?;
        writeln!(
            self.writer,
            "Durchschnitt pro Arbeitstag: {}",
            format_duration(summary.average_workday_seconds)
        )?;

        writeln!(self.writer, "Wochen:")?;
        for week in &summary.weeks {
            writeln!(
                self.writer,
                "- KW {:02} ({} bis {}): {} (Soll {}, {})",
                week.iso_week,
                week.first_day,
                week.last_day,
                format_duration(week.total_seconds),
                format_duration(week.expected_seconds),
                format_variance(week.variance_seconds)
            )
            .with_context(|| format!("Failed to write week line: KW {}", week.iso_week))?;
        }

        if !summary.projects.is_empty() {
            writeln!(self.writer, "Projekte:")?;
            for (project, total) in &summary.projects {
                writeln!(
                    self.writer,
                    "- {}: {} ({} Tage)",
                    project,
                    format_duration(total.seconds),
                    total.active_days
                )?;
            }
        }

        if !report.special_days.is_empty() {
            writeln!(self.writer, "Besondere Tage:")?;
            for day in &report.special_days {
                writeln!(self.writer, "- {}: {}", day.date, day.label)?;
            }
        }

        let metrics = &report.metrics;
        writeln!(self.writer, "Produktivität:")?;
        writeln!(
            self.writer,
            "- Produktive Tage: {} von {} ({:.1}%)",
            metrics.productive_days, metrics.workdays, metrics.rate
        )?;
        if let Some((date, seconds)) = metrics.best_day {
            writeln!(
                self.writer,
                "- Bester Tag: {} ({})",
                date,
                format_duration(seconds)
            )?;
        }
        writeln!(self.writer, "- Konstanz: {}", metrics.consistency.label())?;

        Ok(())
    }

    /// 祝日の一覧を表示する。州固有の祝日には`*`の印を付ける。
    ///
    /// 一覧が空の場合は更新コマンドへの案内を表示する。
    pub fn show_holidays(&mut self, holidays: &HolidaySet) -> Result<()> {
        if holidays.is_empty() {
            writeln!(
                self.writer,
                "Keine Feiertage gefunden. Führe 'holidays update' aus."
            )?;
            return Ok(());
        }
        for (date, name) in holidays {
            let marker = if is_regional(name) { " *" } else { "" };
            writeln!(self.writer, "- {}: {}{}", date, name, marker)
                .with_context(|| format!("Failed to write holiday line: {}", date))?;
        }

        Ok(())
    }

    /// 州コードの一覧を表示する。設定済みの州には印を付ける。
    pub fn show_states(&mut self, active: Option<&str>) -> Result<()> {
        for (code, name) in STATES {
            let marker = if active == Some(code) { " (aktiv)" } else { "" };
            writeln!(self.writer, "- {}: {}{}", code, name, marker)
                .with_context(|| format!("Failed to write state line: {}", code))?;
        }

        Ok(())
    }

    /// 指定日の祝日と次の祝日を表示する。
    pub fn show_holiday_check(
        &mut self,
        date: NaiveDate,
        name: Option<&str>,
        next: Option<(NaiveDate, &str)>,
    ) -> Result<()> {
        match name {
            Some(name) => writeln!(self.writer, "{} ist ein Feiertag: {}", date, name)?,
            None => writeln!(self.writer, "{} ist kein Feiertag", date)?,
        }
        if let Some((next_date, next_name)) = next {
            writeln!(
                self.writer,
                "Nächster Feiertag: {} ({})",
                next_date, next_name
            )?;
        }

        Ok(())
    }

    /// 設定された州を表示する。
    pub fn show_state_set(&mut self, config: &RegionConfig) -> Result<()> {
        writeln!(
            self.writer,
            "Bundesland gesetzt: {} ({})",
            config.state_name, config.state
        )?;

        Ok(())
    }

    /// 祝日の更新結果を表示する。州が未設定の場合は`bundesweit`と表示する。
    pub fn show_holidays_updated(
        &mut self,
        year: i32,
        state: Option<&str>,
        total: usize,
    ) -> Result<()> {
        writeln!(
            self.writer,
            "Feiertage für {} aktualisiert ({}, gesamt {} Einträge)",
            year,
            state.unwrap_or("bundesweit"),
            total
        )?;

        Ok(())
    }

    /// 追加された休暇を表示する。
    pub fn show_vacation_added(&mut self, entry: &VacationEntry) -> Result<()> {
        writeln!(
            self.writer,
            "Urlaub hinzugefügt: {} ({} Tage)",
            entry.name, entry.days
        )?;

        Ok(())
    }

    /// 削除された休暇を表示する。
    pub fn show_vacation_removed(&mut self, entry: &VacationEntry) -> Result<()> {
        writeln!(self.writer, "Eintrag entfernt: {}", entry.name)?;

        Ok(())
    }

    /// 指定日の休暇状況と次の休暇を表示する。
    pub fn show_vacation_today(
        &mut self,
        date: NaiveDate,
        current: Option<&VacationEntry>,
        next: Option<&VacationEntry>,
    ) -> Result<()> {
        match current {
            Some(entry) => writeln!(self.writer, "{}: {} (bis {})", date, entry.name, entry.end)?,
            None => writeln!(self.writer, "{}: kein Urlaub", date)?,
        }
        if let Some(entry) = next {
            writeln!(
                self.writer,
                "Nächster Urlaub: {} (ab {})",
                entry.name, entry.start
            )?;
        }

        Ok(())
    }

    /// 休暇の一覧をインデックス付きで表示する。
    pub fn show_vacations(&mut self, entries: &[(usize, &VacationEntry)]) -> Result<()> {
        for (index, entry) in entries {
            writeln!(
                self.writer,
                "- [{}] {} bis {}: {} ({}, {} Tage)",
                index, entry.start, entry.end, entry.name, entry.kind, entry.days
            )
            .with_context(|| format!("Failed to write vacation line: {}", entry.name))?;
        }

        Ok(())
    }

    /// 休暇の統計を表示する。
    pub fn show_vacation_stats(&mut self, stats: &VacationStats) -> Result<()> {
        writeln!(
            self.writer,
            "Gesamt: {} Einträge, {} Tage",
            stats.total_entries, stats.total_days
        )?;
        for (kind, kind_stats) in &stats.by_kind {
            writeln!(
                self.writer,
                "- {}: {} Einträge, {} Tage",
                kind, kind_stats.count, kind_stats.days
            )
            .with_context(|| format!("Failed to write stats line: {}", kind))?;
        }

        Ok(())
    }
}
