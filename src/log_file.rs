use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// 年月ごとのディレクトリ名に付ける接尾辞。
const FOLDER_SUFFIX: &str = "_time_sheet";

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:19|20)\d{2}-[01]\d-[0-3]\d").expect("valid iso date regex"));
static LEGACY_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^log([01]\d)_([0-3]\d)\.txt").expect("valid legacy name regex"));

/// ログファイルの読み込みエラー。
#[derive(Debug, Error)]
pub enum LogError {
    #[error("log file {} does not exist", path.display())]
    NotFound { path: PathBuf, source: io::Error },

    #[error("failed to read log file {}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// ログファイルを読み込むためのtrait。
#[cfg_attr(test, mockall::automock)]
pub trait LogRepository {
    /// 指定した日付のログを読み込む。ファイルが存在しなければ`None`を返す。
    fn read_day(&self, date: NaiveDate) -> Result<Option<String>, LogError>;

    /// 明示的に指定されたログファイルを読み込む。
    ///
    /// ファイルが存在しない場合は`LogError::NotFound`を返す。
    fn read_path(&self, path: &Path) -> Result<String, LogError>;
}

/// `log_root/YYYY/Mon_time_sheet/logMM_DD.txt`に置かれたログファイルを読むリポジトリ。
pub struct FsLogRepository {
    root: PathBuf,
}

impl FsLogRepository {
    /// 新しい`FsLogRepository`を返す。
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl LogRepository for FsLogRepository {
    fn read_day(&self, date: NaiveDate) -> Result<Option<String>, LogError> {
        let path = log_path(&self.root, date);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("no log file at {}", path.display());
                Ok(None)
            }
            Err(source) => Err(LogError::Read { path, source }),
        }
    }

    fn read_path(&self, path: &Path) -> Result<String, LogError> {
        fs::read_to_string(path).map_err(|source| {
            let path = path.to_path_buf();
            if source.kind() == io::ErrorKind::NotFound {
                LogError::NotFound { path, source }
            } else {
                LogError::Read { path, source }
            }
        })
    }
}

/// 日付に対応するログファイルのパスを返す。
///
/// # Examples
///
/// ```
/// // ~/journal/2024/Mar_time_sheet/log03_04.txt
/// let path = log_path(&root, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
/// ```
pub fn log_path(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(date.format("%Y").to_string())
        .join(format!("{}{}", date.format("%b"), FOLDER_SUFFIX))
        .join(date.format("log%m_%d.txt").to_string())
}

/// ファイル名から日付を求める。
///
/// `YYYY-MM-DD`を含む名前を優先し、次に`logMM_DD.txt`を`fallback_year`の日付として扱う。
pub fn date_from_filename(path: &Path, fallback_year: i32) -> Option<NaiveDate> {
    let name = path.file_name()?.to_str()?;

    if let Some(found) = ISO_DATE_RE.find(name) {
        if let Ok(date) = NaiveDate::parse_from_str(found.as_str(), "%Y-%m-%d") {
            return Some(date);
        }
    }

    let caps = LEGACY_NAME_RE.captures(name)?;
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(fallback_year, month, day)
}
