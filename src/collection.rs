use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};

use crate::interval::Interval;

/// 1日の標準労働時間。
pub const HOURS_IN_WORKDAY: f64 = 8.0;
const SECONDS_IN_HOUR: f64 = 60.0 * 60.0;

/// `Interval`の集まりと、それらのタグの集合。
///
/// 要素の追加は`add`のみで、絞り込みや結合は常に新しい`Collection`を返す。
/// タグは大文字小文字や空白を正規化せず、完全一致で比較する。
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    intervals: Vec<Interval>,
    tags: BTreeSet<String>,
}

impl Collection {
    /// 空の`Collection`を返す。
    pub fn new() -> Self {
        Self::default()
    }

    /// `Interval`の一覧から`Collection`を作る。タグの集合は要素から求める。
    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        let tags = intervals
            .iter()
            .filter_map(|interval| interval.tag.clone())
            .collect();

        Self { intervals, tags }
    }

    /// `Interval`を1件追加し、タグの集合を更新する。
    pub fn add(&mut self, interval: Interval) {
        if let Some(tag) = &interval.tag {
            self.tags.insert(tag.clone());
        }
        self.intervals.push(interval);
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// すべての`Interval`の経過時間の合計。
    pub fn total(&self) -> Duration {
        sum_durations(self.intervals.iter())
    }

    /// 合計を1日8時間の労働日数で返す。
    pub fn total_in_workdays(&self) -> f64 {
        self.total().num_seconds() as f64 / SECONDS_IN_HOUR / HOURS_IN_WORKDAY
    }

    /// 開始時刻の日付の集合。
    pub fn dates_covered(&self) -> BTreeSet<NaiveDate> {
        self.intervals.iter().map(Interval::date).collect()
    }

    /// タグごとの合計時間。
    pub fn tag_totals(&self) -> BTreeMap<String, Duration> {
        self.tags
            .iter()
            .map(|tag| {
                let total = sum_durations(
                    self.intervals
                        .iter()
                        .filter(|interval| interval.tag.as_ref() == Some(tag)),
                );
                (tag.clone(), total)
            })
            .collect()
    }

    /// 2つの`Collection`を結合した新しい`Collection`を返す。どちらも変更しない。
    pub fn combine(&self, other: &Collection) -> Collection {
        Collection {
            intervals: self
                .intervals
                .iter()
                .chain(other.intervals.iter())
                .cloned()
                .collect(),
            tags: self.tags.union(&other.tags).cloned().collect(),
        }
    }

    /// 日付が`[start, end]`に含まれる`Interval`だけを持つ`Collection`を返す。
    ///
    /// タグの集合は残った要素から求め直す。
    pub fn sub_range(&self, start: NaiveDate, end: NaiveDate) -> Collection {
        Collection::from_intervals(
            self.intervals
                .iter()
                .filter(|interval| (start..=end).contains(&interval.date()))
                .cloned()
                .collect(),
        )
    }

    /// 1日分の`Collection`を返す。
    pub fn on_date(&self, date: NaiveDate) -> Collection {
        self.sub_range(date, date)
    }

    /// 指定したタグを持つ`Interval`だけを持つ`Collection`を返す。
    ///
    /// このコレクションに存在しないタグは無視する。引数は変更しない。
    /// 有効なタグが1つもなければ空の`Collection`を返す。
    pub fn filter_by_tags<I, S>(&self, tags: I) -> Collection
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let effective: BTreeSet<&str> = tags
            .into_iter()
            .filter_map(|tag| self.tags.get(tag.as_ref()).map(String::as_str))
            .collect();
        if effective.is_empty() {
            return Collection::new();
        }

        Collection::from_intervals(
            self.intervals
                .iter()
                .filter(|interval| {
                    interval
                        .tag
                        .as_deref()
                        .map_or(false, |tag| effective.contains(tag))
                })
                .cloned()
                .collect(),
        )
    }
}

fn sum_durations<'a>(intervals: impl Iterator<Item = &'a Interval>) -> Duration {
    intervals.fold(Duration::zero(), |acc, interval| acc + interval.duration())
}
