use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use log::{info, warn};

use crate::collection::Collection;
use crate::interval::Interval;
use crate::log_file::{date_from_filename, LogRepository};
use crate::parser::parse_log;

/// 集計対象の範囲。
#[derive(Clone, Debug, PartialEq)]
pub enum Scope {
    /// 1日分。ログファイルがなければ長さ0のプレースホルダーを返す。
    Day(NaiveDate),
    /// 明示的に指定されたログファイル。
    File(PathBuf),
    /// `date`を含む週から遡った`count`週分。
    Weeks { date: NaiveDate, count: u32 },
    /// `start`から`end`までの各日。
    Since { start: NaiveDate, end: NaiveDate },
}

pub struct SummaryCommand<'a, R: LogRepository> {
    repository: &'a R,
    fallback_year: i32,
    today: NaiveDate,
}

impl<'a, R: LogRepository> SummaryCommand<'a, R> {
    /// 新しい`SummaryCommand`を返す。
    ///
    /// # Arguments
    /// * `repository` - ログファイルを読み込むためのリポジトリ
    /// * `fallback_year` - 年を含まないファイル名に補う年
    /// * `today` - 設定したタイムゾーンでの今日の日付
    pub fn new(repository: &'a R, fallback_year: i32, today: NaiveDate) -> Self {
        Self {
            repository,
            fallback_year,
            today,
        }
    }

    /// 指定した範囲のログを読み込み、1つの`Collection`にまとめる。
    ///
    /// 範囲を走査する場合は存在しないログファイルを読み飛ばす。
    /// 明示的に指定したファイルが存在しない場合はエラーを返す。
    pub fn run(&self, scope: &Scope) -> Result<Collection> {
        match scope {
            Scope::Day(date) => self.read_day(*date),
            Scope::File(path) => self.read_file(path),
            Scope::Weeks { date, count } => {
                let dates: Vec<NaiveDate> = (0..*count)
                    .flat_map(|week| week_dates(*date - Duration::weeks(i64::from(week))))
                    .collect();
                self.gather(&dates)
            }
            Scope::Since { start, end } => {
                let dates: Vec<NaiveDate> = start.iter_days().take_while(|day| day <= end).collect();
                self.gather(&dates)
            }
        }
    }

    fn read_day(&self, date: NaiveDate) -> Result<Collection> {
        let text = self
            .repository
            .read_day(date)
            .with_context(|| format!("Failed to read log for {}", date))?;

        match text {
            Some(text) => Ok(parse_log(&text, date).collection),
            None => {
                info!("No log for {}, using an empty day", date);
                let midnight = date.and_time(NaiveTime::MIN);
                Ok(Collection::from_intervals(vec![Interval::placeholder(midnight)]))
            }
        }
    }

    fn read_file(&self, path: &Path) -> Result<Collection> {
        let text = self.repository.read_path(path)?;
        let date = date_from_filename(path, self.fallback_year).unwrap_or_else(|| {
            warn!(
                "Cannot tell the date of {}, using {}",
                path.display(),
                self.today
            );
            self.today
        });

        Ok(parse_log(&text, date).collection)
    }

    fn gather(&self, dates: &[NaiveDate]) -> Result<Collection> {
        let mut collection = Collection::new();
        let mut discarded = 0;
        for date in dates {
            let text = self
                .repository
                .read_day(*date)
                .with_context(|| format!("Failed to read log for {}", date))?;
            if let Some(text) = text {
                let outcome = parse_log(&text, *date);
                discarded += outcome.discarded;
                collection = collection.combine(&outcome.collection);
            }
        }
        info!(
            "Read {} intervals over {} days ({} undescribed entries skipped)",
            collection.intervals().len(),
            collection.dates_covered().len(),
            discarded
        );

        Ok(collection)
    }
}

/// `date`を含むISO週の月曜日から日曜日までの日付を返す。
pub fn week_dates(date: NaiveDate) -> Vec<NaiveDate> {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    monday.iter_days().take(7).collect()
}
