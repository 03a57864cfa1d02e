use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveTime};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 設定値の検証エラー。
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid timezone '{value}', expected an offset like +09:00 or -07:00")]
    InvalidTimezone { value: String },
}

/// アプリケーションの設定。
///
/// 既定値、設定ファイル、環境変数`DAYSUM_*`の順に上書きして読み込む。
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// ログファイルを置くディレクトリ。
    pub log_root: PathBuf,
    /// UTCからのオフセット(`-07:00`など)。
    pub timezone: String,
    /// 1日の作業を始める時刻。
    pub workday_start: NaiveTime,
    /// 1日の作業時間。
    pub workday_hours: u32,
    /// 昼休みの開始時刻。
    pub lunch_start: NaiveTime,
    /// 昼休みの長さ(分)。
    pub lunch_minutes: u32,
    /// `logMM_DD.txt`形式のファイル名に補う年。
    pub fallback_year: i32,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_root: home.join("journal"),
            timezone: "-07:00".to_string(),
            workday_start: NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN),
            workday_hours: 8,
            lunch_start: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
            lunch_minutes: 60,
            fallback_year: 2021,
        }
    }
}

impl Config {
    /// 設定を読み込む。
    ///
    /// # Arguments
    ///
    /// * `config_path` - 追加で読み込む設定ファイル
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs::config_dir() {
            figment = figment.merge(Toml::file(config_dir.join("daysum").join("config.toml")));
        }
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment.merge(Env::prefixed("DAYSUM_")).extract()
    }

    /// `timezone`を`FixedOffset`に変換する。
    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        self.timezone
            .trim()
            .parse::<FixedOffset>()
            .map_err(|_| ConfigError::InvalidTimezone {
                value: self.timezone.clone(),
            })
    }

    /// 1日の作業量を15分単位で返す。
    pub fn units_per_day(&self) -> u32 {
        self.workday_hours * 4
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::{FixedOffset, NaiveTime};
    use rstest::rstest;

    use super::{Config, ConfigError};

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.workday_hours, 8);
        assert_eq!(config.units_per_day(), 32);
        assert_eq!(config.workday_start, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert!(config.log_root.ends_with("journal"));
    }

    /// 設定ファイルの値で既定値が上書きされることを確認する。
    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "log_root = \"/tmp/logs\"\ntimezone = \"+09:00\"\nworkday_hours = 6\nworkday_start = \"08:00:00\""
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();

        assert_eq!(config.log_root.to_str(), Some("/tmp/logs"));
        assert_eq!(config.timezone, "+09:00");
        assert_eq!(config.workday_hours, 6);
        assert_eq!(config.workday_start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(config.lunch_minutes, 60);
    }

    #[rstest]
    #[case::phoenix("-07:00", -7 * 3600)]
    #[case::tokyo("+09:00", 9 * 3600)]
    #[case::half_hour("+05:30", 5 * 3600 + 30 * 60)]
    #[case::utc("+00:00", 0)]
    fn test_offset(#[case] timezone: &str, #[case] seconds: i32) {
        let config = Config {
            timezone: timezone.to_string(),
            ..Config::default()
        };

        assert_eq!(config.offset(), Ok(FixedOffset::east_opt(seconds).unwrap()));
    }

    #[rstest]
    #[case::no_sign("07:00")]
    #[case::no_minutes("+7")]
    #[case::name("Phoenix")]
    #[case::minutes_out_of_range("+01:75")]
    #[case::hours_out_of_range("+25:00")]
    #[case::empty("")]
    #[case::double_sign_plus_minus("+-05:00")]
    #[case::double_sign_minus_plus("-+05:00")]
    fn test_offset_invalid(#[case] timezone: &str) {
        let config = Config {
            timezone: timezone.to_string(),
            ..Config::default()
        };

        assert_eq!(
            config.offset(),
            Err(ConfigError::InvalidTimezone {
                value: timezone.to_string()
            })
        );
    }
}
