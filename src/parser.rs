use std::fmt;

use chrono::NaiveDate;
use log::{debug, warn};

use crate::classifier::{classify, Classified};
use crate::collection::Collection;
use crate::interval::Interval;

/// 説明行を待っている候補の有無。
#[derive(Debug, Default)]
enum State {
    #[default]
    Empty,
    Pending(Interval),
}

/// 候補を捨てた位置。
#[derive(Clone, Copy, Debug, PartialEq)]
enum DiscardedAt {
    /// 指定した行の時刻行に置き換えられた。
    Line(usize),
    /// 説明行がないままファイルが終わった。
    EndOfFile,
}

impl fmt::Display for DiscardedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => write!(f, "before line {}", line),
            Self::EndOfFile => write!(f, "at end of file"),
        }
    }
}

/// 1ファイル分の解析結果。
#[derive(Debug)]
pub struct ParseOutcome {
    pub collection: Collection,
    /// 説明行が続かずに捨てた候補の数。
    pub discarded: usize,
}

/// 1日分のログを1行ずつ読み、時刻行と直後の説明行の組を`Interval`にする。
///
/// 時刻行を読むと候補を保持し、次の説明行で説明とタグを設定してコレクションに追加する。
/// 候補を保持したまま別の時刻行を読んだ場合や、ファイル末尾に達した場合は候補を捨てる。
pub struct LogParser {
    date: NaiveDate,
    state: State,
    collection: Collection,
    discarded: usize,
    line_number: usize,
}

impl LogParser {
    /// 新しい`LogParser`を返す。
    ///
    /// # Arguments
    ///
    /// * `date` - ログファイルが表す日付。時刻行はこの日付の時刻として扱う。
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            state: State::Empty,
            collection: Collection::new(),
            discarded: 0,
            line_number: 0,
        }
    }

    /// 1行を読み込む。
    pub fn feed(&mut self, line: &str) {
        self.line_number += 1;

        match classify(line, self.date) {
            Classified::TimeRange(candidate) | Classified::Duration(candidate) => {
                if let State::Pending(previous) = std::mem::take(&mut self.state) {
                    self.discard(&previous, DiscardedAt::Line(self.line_number));
                }
                self.state = State::Pending(candidate);
            }
            Classified::Description { text, tag } => match std::mem::take(&mut self.state) {
                State::Pending(candidate) => {
                    debug!("{}:{}: {} tagged '{}'", self.date, self.line_number, text, tag);
                    self.collection.add(candidate.describe(&text, &tag));
                }
                State::Empty => {}
            },
        }
    }

    /// 読み込みを終了し、解析結果を返す。
    pub fn finish(mut self) -> ParseOutcome {
        if let State::Pending(previous) = std::mem::take(&mut self.state) {
            self.discard(&previous, DiscardedAt::EndOfFile);
        }

        ParseOutcome {
            collection: self.collection,
            discarded: self.discarded,
        }
    }

    fn discard(&mut self, candidate: &Interval, at: DiscardedAt) {
        self.discarded += 1;
        warn!(
            "{}: time entry {}-{} {} has no description, skipped",
            self.date,
            candidate.start.format("%H:%M"),
            candidate.stop.format("%H:%M"),
            at,
        );
    }
}

/// ログファイルの内容全体を解析する。
///
/// # Arguments
///
/// * `text` - ログファイルの内容
/// * `date` - ログファイルが表す日付
pub fn parse_log(text: &str, date: NaiveDate) -> ParseOutcome {
    let mut parser = LogParser::new(date);
    text.lines().for_each(|line| parser.feed(line));

    parser.finish()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate};
    use rstest::rstest;

    use super::{parse_log, DiscardedAt};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()
    }

    #[test]
    fn test_parse_single_entry() {
        let outcome = parse_log("9-12\nproj_a build\n", date());

        let intervals = outcome.collection.intervals();
        assert_eq!(intervals.len(), 1);
        let interval = &intervals[0];
        assert_eq!(interval.start, date().and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(interval.stop, date().and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(interval.duration(), Duration::hours(3));
        assert_eq!(interval.tag.as_deref(), Some("proj_a"));
        assert_eq!(interval.description.as_deref(), Some("proj_a build"));
        assert!(outcome.collection.tags().contains("proj_a"));
        assert_eq!(outcome.discarded, 0);
    }

    /// 作業時間行の`.30`は30分として扱われることを確認する。
    #[test]
    fn test_parse_duration_entry() {
        let outcome = parse_log("2.30\nadm_x email", date());

        assert_eq!(outcome.collection.intervals().len(), 1);
        assert_eq!(outcome.collection.total(), Duration::minutes(150));
    }

    /// 候補の破棄と説明行の無視のパターンを確認する。
    #[rstest]
    #[case::consecutive_time_lines("9-10\n10-11\ntag desc", 1, Duration::hours(1), 1)]
    #[case::dangling_time_line("9-10\ntag desc\n13-15", 1, Duration::hours(1), 1)]
    #[case::only_time_lines("9-10\n10-11", 0, Duration::zero(), 2)]
    #[case::orphan_description("notes for today\n9-10\ntag desc", 1, Duration::hours(1), 0)]
    #[case::blank_description("9-10\n\ntag desc", 1, Duration::hours(1), 0)]
    #[case::empty_file("", 0, Duration::zero(), 0)]
    #[case::crlf("9-10\r\ntag desc\r\n10:30-12\r\nother x\r\n", 2, Duration::minutes(150), 0)]
    fn test_parse_pairing(
        #[case] text: &str,
        #[case] count: usize,
        #[case] total: Duration,
        #[case] discarded: usize,
    ) {
        let outcome = parse_log(text, date());

        assert_eq!(outcome.collection.intervals().len(), count);
        assert_eq!(outcome.collection.total(), total);
        assert_eq!(outcome.discarded, discarded);
    }

    /// 連続した時刻行では後の候補が説明行と組になることを確認する。
    #[test]
    fn test_parse_keeps_latest_candidate() {
        let outcome = parse_log("9-10\n10-11\ntag desc", date());

        let interval = &outcome.collection.intervals()[0];
        assert_eq!(interval.start, date().and_hms_opt(10, 0, 0).unwrap());
        assert_eq!(interval.description.as_deref(), Some("tag desc"));
    }

    /// 空行が説明行になった場合は空のタグが付くことを確認する。
    #[test]
    fn test_parse_blank_description_tag() {
        let outcome = parse_log("9-10\n\n", date());

        let interval = &outcome.collection.intervals()[0];
        assert_eq!(interval.tag.as_deref(), Some(""));
        assert!(outcome.collection.tags().contains(""));
    }

    #[test]
    fn test_parse_collects_tags() {
        let text = "9-10\nproj_a x\n10-11\nproj_b y\n11-12\nproj_a z\n";
        let outcome = parse_log(text, date());

        let tags: Vec<&str> = outcome.collection.tags().iter().map(String::as_str).collect();
        assert_eq!(tags, vec!["proj_a", "proj_b"]);
        assert_eq!(outcome.collection.dates_covered().len(), 1);
    }

    /// 捨てた候補の位置が行番号かファイル末尾かで表示されることを確認する。
    #[rstest]
    #[case::replaced_by_next_line(DiscardedAt::Line(2), "before line 2")]
    #[case::end_of_file(DiscardedAt::EndOfFile, "at end of file")]
    fn test_discarded_at_display(#[case] at: DiscardedAt, #[case] expected: &str) {
        assert_eq!(at.to_string(), expected);
    }
}
