use chrono::{Duration, NaiveDate, NaiveTime};

use crate::collection::Collection;
use crate::config::Config;

/// 集計の単位(秒)。
pub const FIFTEEN_MINUTES: i64 = 15 * 60;
/// 進捗バーの最大幅。
const MAX_BAR_WIDTH: usize = 80;

const ON_TRACK: &str = "\x1b[30m\x1b[107m\x1b[1m#\x1b[0m";
const AHEAD: &str = "\x1b[32m\x1b[107m \x1b[0m";
const BEHIND: &str = "#\x1b[0m";
const LEFT: &str = " ";

/// 予定、実績、全体の作業量(15分単位)。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub expected: u32,
    pub done: u32,
    pub total: u32,
}

impl Progress {
    /// `Collection`と現在時刻から進捗を求める。
    ///
    /// 今日が集計対象に含まれる場合、今日の分は現在時刻までの予定作業量とし、他の日は1日分とする。
    pub fn measure(collection: &Collection, config: &Config, today: NaiveDate, now: NaiveTime) -> Self {
        let dates = collection.dates_covered();
        let days = dates.len() as u32;
        let per_day = config.units_per_day();
        let expected = if dates.contains(&today) {
            expected_units(config, now) + per_day * (days - 1)
        } else {
            per_day * days
        };

        Self {
            expected,
            done: (collection.total().num_seconds() / FIFTEEN_MINUTES) as u32,
            total: per_day * days,
        }
    }

    /// 進捗バーを描画する。
    ///
    /// 予定どおり、予定より進んでいる分、遅れている分、残りの順に並べ、実績の時間を後ろに付ける。
    pub fn render(&self) -> String {
        let (on_track, ahead, behind, left) = if self.expected <= self.done {
            (
                self.expected,
                self.done - self.expected,
                0,
                self.total.saturating_sub(self.done),
            )
        } else {
            (
                self.done,
                0,
                self.expected - self.done,
                self.total.saturating_sub(self.expected),
            )
        };

        let amounts = [on_track, ahead, behind, left];
        let sum: u32 = amounts.iter().sum();
        let scale = |amount: u32| -> usize {
            if sum as usize <= MAX_BAR_WIDTH {
                amount as usize
            } else {
                (amount as usize * MAX_BAR_WIDTH) / sum as usize
            }
        };

        let bar: String = amounts
            .iter()
            .zip([ON_TRACK, AHEAD, BEHIND, LEFT])
            .map(|(amount, marker)| marker.repeat(scale(*amount)))
            .collect();

        format!("|{}| {:>5.2} hours", bar, f64::from(self.done) / 4.0)
    }
}

/// 現在時刻までに終わっているはずの作業量(15分単位)を返す。
///
/// 始業時刻から数え、昼休みの時間を除き、1日の作業量を上限とする。
pub fn expected_units(config: &Config, now: NaiveTime) -> u32 {
    let elapsed = (now - config.workday_start).max(Duration::zero());
    let lunch = (now - config.lunch_start)
        .max(Duration::zero())
        .min(Duration::minutes(i64::from(config.lunch_minutes)));
    let working = elapsed - lunch;

    let units = (working.num_seconds() as f64 / FIFTEEN_MINUTES as f64).round();
    (units.max(0.0) as u32).min(config.units_per_day())
}
