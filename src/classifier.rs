use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::interval::Interval;

/// `H[:MM]-H[:MM]`形式の時刻範囲行。行頭のみ固定する。
static TIME_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})(?::(\d{1,2}))?-(\d{1,2})(?::(\d{1,2}))?").expect("valid time range regex")
});

/// `H[.MM]`形式の作業時間行。行全体に一致させる。
static DURATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})(?:\.(\d{1,2}))?$").expect("valid duration regex"));

/// 1行を分類した結果。
#[derive(Clone, Debug, PartialEq)]
pub enum Classified {
    /// `9:15-12:30`のような開始と終了の時刻。
    TimeRange(Interval),
    /// `2.30`のような0時からの作業時間。
    Duration(Interval),
    /// 上記以外のすべての行。
    Description { text: String, tag: String },
}

/// 1行を分類する。
///
/// 時刻範囲、作業時間、説明の順に判定し、最初に一致したものを返す。
/// 数字のように見えても時刻として成り立たない行は説明として扱う。
///
/// # Arguments
///
/// * `line` - ログファイルの1行
/// * `date` - ログファイルが表す日付
pub fn classify(line: &str, date: NaiveDate) -> Classified {
    if let Some(interval) = TIME_RANGE_RE.captures(line).and_then(|caps| time_range(&caps, date)) {
        return Classified::TimeRange(interval);
    }
    if let Some(interval) = DURATION_RE.captures(line).and_then(|caps| duration(&caps, date)) {
        return Classified::Duration(interval);
    }

    let text = line.trim();
    Classified::Description {
        text: text.to_string(),
        tag: derive_tag(text).to_string(),
    }
}

/// 説明の先頭から英字、`_`、`+`が続く部分をタグとして返す。
pub fn derive_tag(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '_' || c == '+'))
        .unwrap_or(text.len());
    &text[..end]
}

fn time_range(caps: &Captures, date: NaiveDate) -> Option<Interval> {
    let start = time_of(caps, 1, 2)?;
    let stop = time_of(caps, 3, 4)?;

    Some(Interval::new(date.and_time(start), date.and_time(stop)))
}

fn duration(caps: &Captures, date: NaiveDate) -> Option<Interval> {
    // 小数点以下の2桁は時間の端数ではなく分そのもの
    let offset = time_of(caps, 1, 2)?;
    let midnight = date.and_time(NaiveTime::MIN);
    let elapsed = offset - NaiveTime::MIN;

    Some(Interval::new(midnight, midnight + elapsed))
}

fn time_of(caps: &Captures, hour: usize, minute: usize) -> Option<NaiveTime> {
    let hour = caps.get(hour)?.as_str().parse().ok()?;
    let minute = match caps.get(minute) {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}
