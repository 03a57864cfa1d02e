use chrono::{DateTime, FixedOffset, NaiveDate, Utc};

#[cfg(not(test))]
/// 現在のUTC時間を取得する。
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// テスト時に利用するモック時間を取得する。
#[cfg(test)]
pub mod mock_datetime {
    use std::cell::RefCell;

    use super::DateTime;
    use super::Utc;

    thread_local! {
        static MOCK_TIME: RefCell<Option<DateTime<Utc>>> = const { RefCell::new(None) };
    }

    /// モック時間を取得する。設定されていなければ現在時間を返す。
    pub fn now() -> DateTime<Utc> {
        MOCK_TIME.with(|cell| cell.borrow().as_ref().cloned().unwrap_or_else(Utc::now))
    }

    /// モック時間を設定する。
    pub fn set_mock_time(time: DateTime<Utc>) {
        MOCK_TIME.with(|cell| *cell.borrow_mut() = Some(time));
    }

    // 設定したモック時間をクリアする。
    pub fn clear_mock_time() {
        MOCK_TIME.with(|cell| *cell.borrow_mut() = None);
    }
}

#[cfg(test)]
pub use mock_datetime::now;

/// 指定したオフセットでの現在時刻を返す。
pub fn now_in(offset: &FixedOffset) -> DateTime<FixedOffset> {
    now().with_timezone(offset)
}

/// 指定したオフセットでの今日の日付を返す。
///
/// ログファイルの日付はこのタイムゾーンの暦で決まる。
pub fn today_in(offset: &FixedOffset) -> NaiveDate {
    now_in(offset).date_naive()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat, Utc};
    use rstest::rstest;

    use super::{mock_datetime, today_in};

    /// 何も設定しない場合は、現在時間が取得できることを確認する。
    #[test]
    fn test_now() {
        mock_datetime::clear_mock_time();

        assert_eq!(
            mock_datetime::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        );
    }

    /// オフセットによって今日の日付が変わることを確認する。
    #[rstest]
    #[case::phoenix_previous_day(-7, NaiveDate::from_ymd_opt(2024, 3, 3).unwrap())]
    #[case::utc(0, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())]
    #[case::tokyo(9, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap())]
    fn test_today_in(#[case] hours: i32, #[case] expected: NaiveDate) {
        mock_datetime::set_mock_time(
            DateTime::parse_from_rfc3339("2024-03-04T03:00:00+00:00")
                .unwrap()
                .to_utc(),
        );
        let offset = FixedOffset::east_opt(hours * 3600).unwrap();

        assert_eq!(today_in(&offset), expected);
        mock_datetime::clear_mock_time();
    }
}
