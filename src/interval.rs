use chrono::{Duration, NaiveDate, NaiveDateTime};

/// 終了時刻が開始時刻より前になった場合に差し引く時間(秒)。
const HALF_DAY_SECONDS: i64 = 12 * 60 * 60;
const DAY_SECONDS: i64 = 24 * 60 * 60;

/// 1件の作業時間を表す構造体。
///
/// ログパーサーが時刻行を読んだ時点で作られ、次の説明行で説明とタグが設定される。
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
    pub start: NaiveDateTime,
    pub stop: NaiveDateTime,
    pub description: Option<String>,
    pub tag: Option<String>,
    pub is_placeholder: bool,
}

impl Interval {
    /// 新しい`Interval`を返す。
    pub fn new(start: NaiveDateTime, stop: NaiveDateTime) -> Self {
        Self {
            start,
            stop,
            description: None,
            tag: None,
            is_placeholder: false,
        }
    }

    /// 長さ0のプレースホルダーを返す。
    ///
    /// ログファイルが存在しない日でも、その日を集計対象の日付として扱うために使う。
    pub fn placeholder(at: NaiveDateTime) -> Self {
        Self {
            is_placeholder: true,
            ..Self::new(at, at)
        }
    }

    /// 説明と、説明から導出したタグを設定した`Interval`を返す。
    pub fn describe(mut self, description: &str, tag: &str) -> Self {
        self.description = Some(description.to_string());
        self.tag = Some(tag.to_string());
        self
    }

    /// 開始時刻の日付。
    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    /// 経過時間を返す。
    ///
    /// 終了時刻が開始時刻より前の場合は日をまたいだとはみなさず、
    /// 12時間未満の同日の区間として`(差分 + 24h) - 12h`を`[0, 12h)`に収めた値にする。
    pub fn duration(&self) -> Duration {
        let raw = (self.stop - self.start).num_seconds();
        if raw >= 0 {
            return Duration::seconds(raw);
        }

        let wrapped = (raw + DAY_SECONDS - HALF_DAY_SECONDS).clamp(0, HALF_DAY_SECONDS - 1);
        Duration::seconds(wrapped)
    }

    /// タグと区切り文字1文字を除いた説明の本文を返す。
    pub fn detail(&self) -> Option<&str> {
        let description = self.description.as_deref()?;
        let tag_len = self.tag.as_deref().map_or(0, str::len);
        let mut rest = description.get(tag_len..)?.chars();
        rest.next()?;
        let detail = rest.as_str();

        (!detail.is_empty()).then_some(detail)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime};
    use rstest::rstest;

    use super::Interval;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    /// 同日の区間では、終了と開始の差がそのまま経過時間になることを確認する。
    #[rstest]
    #[case::three_hours(at(9, 0), at(12, 0), Duration::hours(3))]
    #[case::with_minutes(at(9, 15), at(12, 30), Duration::minutes(195))]
    #[case::empty(at(10, 0), at(10, 0), Duration::zero())]
    fn test_duration_forward(
        #[case] start: NaiveDateTime,
        #[case] stop: NaiveDateTime,
        #[case] expected: Duration,
    ) {
        assert_eq!(Interval::new(start, stop).duration(), expected);
    }

    /// 終了時刻が開始時刻より前の場合に、12時間未満の区間として扱うことを確認する。
    #[rstest]
    #[case::afternoon_written_in_12h(at(11, 0), at(1, 0), Duration::hours(2))]
    #[case::one_hour_back(at(12, 0), at(11, 0), Duration::hours(11))]
    #[case::with_minutes(at(10, 30), at(1, 15), Duration::minutes(165))]
    #[case::twelve_hours_back_clamped(at(13, 0), at(1, 0), Duration::zero())]
    #[case::far_back_clamped(at(23, 0), at(0, 0), Duration::zero())]
    fn test_duration_backward(
        #[case] start: NaiveDateTime,
        #[case] stop: NaiveDateTime,
        #[case] expected: Duration,
    ) {
        let duration = Interval::new(start, stop).duration();

        assert_eq!(duration, expected);
        assert!(duration >= Duration::zero());
        assert!(duration < Duration::hours(12));
    }

    #[test]
    fn test_placeholder() {
        let interval = Interval::placeholder(at(0, 0));

        assert!(interval.is_placeholder);
        assert_eq!(interval.duration(), Duration::zero());
        assert_eq!(interval.tag, None);
        assert_eq!(interval.date(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    /// 説明本文はタグと区切り文字1文字を除いたものになることを確認する。
    #[rstest]
    #[case::with_detail("proj_a build", "proj_a", Some("build"))]
    #[case::tag_only("proj_a", "proj_a", None)]
    #[case::tag_and_separator("proj_a ", "proj_a", None)]
    #[case::no_tag("42 things", "", Some("2 things"))]
    #[case::multibyte_separator("mtg\u{3000}定例", "mtg", Some("定例"))]
    fn test_detail(#[case] description: &str, #[case] tag: &str, #[case] expected: Option<&str>) {
        let interval = Interval::new(at(9, 0), at(10, 0)).describe(description, tag);

        assert_eq!(interval.detail(), expected);
    }
}
