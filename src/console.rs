use std::collections::BTreeSet;
use std::io::Write;

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use thiserror::Error;

use crate::collection::{Collection, HOURS_IN_WORKDAY};
use crate::config::Config;
use crate::progress::Progress;
use crate::summary_command::week_dates;

/// エクスポート表を作れない場合のエラー。
#[derive(Debug, Error, PartialEq)]
pub enum ExportError {
    #[error("received dates from different ISO weeks: {first} and {other}")]
    MixedWeeks { first: NaiveDate, other: NaiveDate },

    #[error("no entries to export")]
    NoEntries,
}

/// Consoleに`Collection`を表示するためのtrait。
pub trait ConsolePresenter {
    /// `Collection`を表示する。
    ///
    /// # Arguments
    ///
    /// * `collection` - 表示する`Collection`
    fn show(&mut self, collection: &Collection) -> Result<()>;
}

/// 進捗の計算に使う今日の日付と現在時刻。
#[derive(Clone, Copy, Debug)]
pub struct Clock {
    pub today: NaiveDate,
    pub now: NaiveTime,
}

/// 進捗バーだけを表示する。
pub struct ConsoleProgress<'a, W: Write> {
    writer: &'a mut W,
    config: &'a Config,
    clock: Clock,
}

impl<'a, W: Write> ConsoleProgress<'a, W> {
    /// 新しい`ConsoleProgress`を返す。
    pub fn new(writer: &'a mut W, config: &'a Config, clock: Clock) -> Self {
        Self {
            writer,
            config,
            clock,
        }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleProgress<'a, W> {
    fn show(&mut self, collection: &Collection) -> Result<()> {
        write_progress(self.writer, collection, self.config, self.clock)
    }
}

/// 合計時間だけを表示する。
pub struct ConsoleTotal<'a, W: Write> {
    writer: &'a mut W,
}

impl<'a, W: Write> ConsoleTotal<'a, W> {
    /// 新しい`ConsoleTotal`を返す。
    pub fn new(writer: &'a mut W) -> Self {
        Self { writer }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleTotal<'a, W> {
    fn show(&mut self, collection: &Collection) -> Result<()> {
        writeln!(self.writer, "{:>32.2} hours", hours(collection.total()))
            .context("Failed to write total")?;
        Ok(())
    }
}

/// 作業時間を1件ずつ表示する。
///
/// `verbose`が2以上の場合は説明も表示する。
pub struct ConsoleIntervalList<'a, W: Write> {
    writer: &'a mut W,
    verbose: u8,
}

impl<'a, W: Write> ConsoleIntervalList<'a, W> {
    /// 新しい`ConsoleIntervalList`を返す。
    pub fn new(writer: &'a mut W, verbose: u8) -> Self {
        Self { writer, verbose }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleIntervalList<'a, W> {
    fn show(&mut self, collection: &Collection) -> Result<()> {
        let mut sorted = collection
            .intervals()
            .iter()
            .filter(|interval| !interval.is_placeholder)
            .collect::<Vec<_>>();
        sorted.sort_by_key(|interval| interval.start);

        for interval in sorted {
            let delta = format!("\u{0394}{:>8}", format_duration(interval.duration()));
            let mut line = format!(
                "{}-{}{:>23}",
                interval.start.format("%H:%M"),
                interval.stop.format("%H:%M"),
                delta
            );
            if self.verbose > 1 {
                if let Some(description) = &interval.description {
                    line.push_str("  ");
                    line.push_str(description);
                }
            }
            writeln!(self.writer, "{}", line)
                .with_context(|| format!("Failed to write interval: {:?}", interval))?;
        }
        writeln!(
            self.writer,
            "{:<11}{:>24}",
            "Total",
            format_duration(collection.total())
        )
        .context("Failed to write total")?;

        Ok(())
    }
}

/// 日毎の合計、労働日換算の合計、進捗バーを表示する。
pub struct ConsoleDailyReport<'a, W: Write> {
    writer: &'a mut W,
    config: &'a Config,
    clock: Clock,
}

impl<'a, W: Write> ConsoleDailyReport<'a, W> {
    /// 新しい`ConsoleDailyReport`を返す。
    pub fn new(writer: &'a mut W, config: &'a Config, clock: Clock) -> Self {
        Self {
            writer,
            config,
            clock,
        }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleDailyReport<'a, W> {
    fn show(&mut self, collection: &Collection) -> Result<()> {
        for date in collection.dates_covered() {
            let daily_total = collection.on_date(date).total();
            if daily_total > Duration::zero() {
                writeln!(
                    self.writer,
                    "{}{:>10}{}",
                    date.format("%a %b %d %Y"),
                    "",
                    format_duration(daily_total)
                )
                .with_context(|| format!("Failed to write daily total for {}", date))?;
            }
        }

        let full_days = collection.total_in_workdays().trunc();
        let remainder = collection.total() - Duration::hours((full_days * HOURS_IN_WORKDAY) as i64);
        writeln!(
            self.writer,
            "\nWeekly Total{:>7} days {}",
            full_days as i64,
            format_duration(remainder)
        )
        .context("Failed to write weekly total")?;

        write_progress(self.writer, collection, self.config, self.clock)
    }
}

/// タグのグループごとの合計時間を表示する。
pub struct ConsoleTagTable<'a, W: Write> {
    writer: &'a mut W,
    groups: &'a [Vec<String>],
}

impl<'a, W: Write> ConsoleTagTable<'a, W> {
    /// 新しい`ConsoleTagTable`を返す。
    ///
    /// # Arguments
    ///
    /// * `writer` - 出力先
    /// * `groups` - 1行にまとめるタグのグループ
    pub fn new(writer: &'a mut W, groups: &'a [Vec<String>]) -> Self {
        Self { writer, groups }
    }
}

impl<'a, W: Write> ConsolePresenter for ConsoleTagTable<'a, W> {
    fn show(&mut self, collection: &Collection) -> Result<()> {
        let dates = collection.dates_covered();
        let range = match (dates.first(), dates.last()) {
            (Some(first), Some(last)) => format!("{} --> {}", first, last),
            _ => "(no entries)".to_string(),
        };

        let totals = collection.tag_totals();
        let rows = apply_tag_groups(collection.tags(), self.groups)
            .into_iter()
            .map(|group| {
                let total = group
                    .iter()
                    .filter_map(|tag| totals.get(tag))
                    .fold(Duration::zero(), |acc, d| acc + *d);
                (group.join(","), format!("{:.2}", hours(total)))
            })
            .collect::<Vec<_>>();
        let width = rows
            .iter()
            .map(|(label, _)| label.chars().count())
            .max()
            .unwrap_or(0)
            .max(3);

        writeln!(self.writer, "{:<width$}  {}", "Tag", range, width = width)
            .context("Failed to write tag table header")?;
        writeln!(self.writer, "{}", "-".repeat(width + 2 + range.chars().count()))
            .context("Failed to write tag table header")?;
        for (label, total) in rows {
            writeln!(self.writer, "{:<width$}  {}", label, total, width = width)
                .with_context(|| format!("Failed to write tag row: {}", label))?;
        }

        Ok(())
    }
}

/// 週単位の固定レイアウトでタグごとの時間を表示する。
///
/// タイムシートへ転記するための形式で、1週間分のデータのみを受け付ける。
pub struct ConsoleWeeklyExport<'a, W: Write> {
    writer: &'a mut W,
    groups: &'a [Vec<String>],
}

impl<'a, W: Write> ConsoleWeeklyExport<'a, W> {
    /// 新しい`ConsoleWeeklyExport`を返す。
    pub fn new(writer: &'a mut W, groups: &'a [Vec<String>]) -> Self {
        Self { writer, groups }
    }
}

const DAY_COLUMN_WIDTH: usize = 10;

impl<'a, W: Write> ConsolePresenter for ConsoleWeeklyExport<'a, W> {
    fn show(&mut self, collection: &Collection) -> Result<()> {
        let dates = collection.dates_covered();
        let first = *dates.first().ok_or(ExportError::NoEntries)?;
        if let Some(other) = dates.iter().find(|date| date.iso_week() != first.iso_week()) {
            return Err(ExportError::MixedWeeks {
                first,
                other: *other,
            }
            .into());
        }
        let week = week_dates(first);

        let mut rows = Vec::new();
        for group in apply_tag_groups(collection.tags(), self.groups) {
            let filtered = collection.filter_by_tags(&group);
            let label = group.first().cloned().unwrap_or_default();

            writeln!(self.writer, "\nTag:  {} ----------------", label)
                .context("Failed to write tag heading")?;
            let details: BTreeSet<&str> =
                filtered.intervals().iter().filter_map(|i| i.detail()).collect();
            for detail in details {
                writeln!(self.writer, "{}", detail).context("Failed to write detail")?;
            }

            let covered = filtered.dates_covered();
            let cells = week
                .iter()
                .map(|date| {
                    if covered.contains(date) {
                        format!("{:.2}", hours(filtered.on_date(*date).total()))
                    } else {
                        String::new()
                    }
                })
                .collect::<Vec<_>>();
            rows.push((label, cells));
        }

        let total_cells = week
            .iter()
            .map(|date| format!("{:.2}", hours(collection.on_date(*date).total())))
            .collect::<Vec<_>>();
        let total_label = format!("\u{03a3}: {:.2}", hours(collection.total()));

        let width = rows
            .iter()
            .map(|(label, _)| label.chars().count())
            .chain([total_label.chars().count()])
            .max()
            .unwrap_or(0);
        let separator = "-".repeat(width + week.len() * (DAY_COLUMN_WIDTH + 2));

        writeln!(self.writer).context("Failed to write table")?;
        let names = week.iter().map(|d| d.format("%A").to_string()).collect::<Vec<_>>();
        self.write_row("", &names, width)?;
        let days = week.iter().map(|d| d.format("%D").to_string()).collect::<Vec<_>>();
        self.write_row("", &days, width)?;
        writeln!(self.writer, "{}", separator).context("Failed to write table")?;
        for (label, cells) in &rows {
            self.write_row(label, cells, width)?;
        }
        writeln!(self.writer, "{}", separator).context("Failed to write table")?;
        self.write_row(&total_label, &total_cells, width)
    }
}

impl<'a, W: Write> ConsoleWeeklyExport<'a, W> {
    fn write_row(&mut self, label: &str, cells: &[String], width: usize) -> Result<()> {
        let mut line = format!("{:<width$}", label, width = width);
        for cell in cells {
            line.push_str(&format!("  {:>w$}", cell, w = DAY_COLUMN_WIDTH));
        }
        writeln!(self.writer, "{}", line.trim_end())
            .with_context(|| format!("Failed to write table row: {}", label))?;
        Ok(())
    }
}

fn write_progress<W: Write>(
    writer: &mut W,
    collection: &Collection,
    config: &Config,
    clock: Clock,
) -> Result<()> {
    let progress = Progress::measure(collection, config, clock.today, clock.now);
    writeln!(writer, "{}", progress.render()).context("Failed to write progress bar")?;
    Ok(())
}

/// タグの一覧をグループの一覧に変換する。
///
/// グループに含まれるタグは単独のタグから除き、単独のタグとグループを合わせて並べ替える。
pub fn apply_tag_groups(tags: &BTreeSet<String>, groups: &[Vec<String>]) -> Vec<Vec<String>> {
    let grouped: BTreeSet<&str> = groups.iter().flatten().map(String::as_str).collect();
    let mut tag_groups = tags
        .iter()
        .filter(|tag| !grouped.contains(tag.as_str()))
        .map(|tag| vec![tag.clone()])
        .chain(groups.iter().filter(|group| !group.is_empty()).cloned())
        .collect::<Vec<_>>();
    tag_groups.sort();

    tag_groups
}

/// 時間を小数の時間数に変換する。
pub fn hours(duration: Duration) -> f64 {
    duration.num_seconds() as f64 / 3600.0
}

/// 時間を`H:MM:SS`形式にする。
pub fn format_duration(duration: Duration) -> String {
    let seconds = duration.num_seconds();
    let sign = if seconds < 0 { "-" } else { "" };
    let seconds = seconds.abs();
    format!(
        "{}{}:{:02}:{:02}",
        sign,
        seconds / 3600,
        seconds % 3600 / 60,
        seconds % 60
    )
}
