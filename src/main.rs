use std::io;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::Parser;
use fern::colors::{Color, ColoredLevelConfig};
use log::{debug, info, LevelFilter};

mod classifier;
mod collection;
mod config;
mod console;
mod datetime;
mod interval;
mod log_file;
mod parser;
mod progress;
mod summary_command;

use config::Config;
use console::{
    Clock, ConsoleDailyReport, ConsoleIntervalList, ConsolePresenter, ConsoleProgress,
    ConsoleTagTable, ConsoleTotal, ConsoleWeeklyExport,
};
use log_file::FsLogRepository;
use summary_command::{Scope, SummaryCommand};

/// 日々の作業ログを集計するためのCLIアプリケーション。
///
/// # Examples
/// ```
/// $ daysum                 # 今日の進捗
/// $ daysum 3 4             # 今年の3月4日
/// $ daysum 3 4 2024 -w -t  # 2024年3月4日を含む週のタグ別集計
/// $ daysum ./log03_04.txt -v
/// ```
#[derive(Debug, Parser)]
#[clap(version, about)]
struct Args {
    #[clap(help = "Numeral of month OR path of a log file")]
    file_or_month: Option<String>,

    #[clap(help = "Numeral of day, when a month is given")]
    day: Option<u32>,

    #[clap(help = "Numeral of year, defaults to the current year")]
    year: Option<i32>,

    #[clap(
        short = 'v',
        long = "verbose",
        parse(from_occurrences),
        help = "Show each time entry, twice to add descriptions"
    )]
    verbose: u8,

    #[clap(short = 'q', long = "quiet", help = "Only show total hours")]
    quiet: bool,

    #[clap(
        short = 'w',
        long = "week",
        parse(from_occurrences),
        help = "Summarize whole weeks, repeat to go further back"
    )]
    week: u32,

    #[clap(short = 's', long = "since", help = "Summarize from the given date through today")]
    since: bool,

    #[clap(short = 't', long = "tag-sort", help = "Show totals organized by tag")]
    tag_sort: bool,

    #[clap(short = 'r', long = "report", help = "Show daily totals in report format")]
    report: bool,

    #[clap(
        short = 'e',
        long = "export",
        help = "Show a weekly table for transfer to the timesheet tool"
    )]
    export: bool,

    #[clap(
        short = 'g',
        long = "group",
        help = "Comma separated tags to show as one row in weekly formats"
    )]
    groups: Vec<String>,

    #[clap(short = 'c', long = "config", help = "Path to an additional config file")]
    config: Option<PathBuf>,

    #[clap(long = "log-level", default_value = "warn", help = "Log level written to stderr")]
    log_level: LevelFilter,
}

fn main() {
    let args = Args::parse();

    if let Err(err) = run(args) {
        eprintln!("Error: {:#}", err);
        process::exit(exit_code(&err));
    }
}

fn run(args: Args) -> Result<()> {
    setup_logger(args.log_level).context("Failed to set up logger")?;

    let config = Config::load_from(args.config.as_deref()).context("Failed to load configuration")?;
    debug!("Loaded configuration: {:?}", config);
    let offset = config.offset()?;
    let clock = Clock {
        today: datetime::today_in(&offset),
        now: datetime::now_in(&offset).time(),
    };

    let scope = resolve_scope(&args, clock.today)?;
    info!("Summarizing {:?}", scope);

    let repository = FsLogRepository::new(&config.log_root);
    let collection = SummaryCommand::new(&repository, config.fallback_year, clock.today)
        .run(&scope)
        .context("Failed to summarize time logs")?;

    let groups = parse_groups(&args.groups);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut presenter: Box<dyn ConsolePresenter + '_> = if args.report {
        Box::new(ConsoleDailyReport::new(&mut out, &config, clock))
    } else if args.export {
        Box::new(ConsoleWeeklyExport::new(&mut out, &groups))
    } else if args.tag_sort {
        Box::new(ConsoleTagTable::new(&mut out, &groups))
    } else if args.quiet {
        Box::new(ConsoleTotal::new(&mut out))
    } else if args.verbose > 0 {
        Box::new(ConsoleIntervalList::new(&mut out, args.verbose))
    } else {
        Box::new(ConsoleProgress::new(&mut out, &config, clock))
    };

    presenter.show(&collection)
}

/// 引数から集計対象の範囲を決める。
///
/// 最初の引数が数字であれば月として扱い、そうでなければログファイルのパスとして扱う。
fn resolve_scope(args: &Args, today: NaiveDate) -> Result<Scope> {
    let date = match &args.file_or_month {
        None => today,
        Some(value) => match value.parse::<u32>() {
            Ok(month) => {
                let day = args.day.context("A day is required when a month is given")?;
                let year = args.year.unwrap_or_else(|| today.year());
                NaiveDate::from_ymd_opt(year, month, day)
                    .with_context(|| format!("Invalid date: {}-{}-{}", year, month, day))?
            }
            Err(_) => return Ok(Scope::File(PathBuf::from(value))),
        },
    };

    // エクスポートは1週間分の表なので、週の指定がなければ1週間とする
    let weeks = if args.export && args.week == 0 {
        1
    } else {
        args.week
    };

    let scope = if weeks > 0 {
        Scope::Weeks { date, count: weeks }
    } else if args.since {
        Scope::Since {
            start: date,
            end: today,
        }
    } else {
        Scope::Day(date)
    };

    Ok(scope)
}

/// `-g a,b`の形式で指定されたタググループを解析する。
fn parse_groups(groups: &[String]) -> Vec<Vec<String>> {
    groups
        .iter()
        .map(|group| {
            group
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

fn setup_logger(level: LevelFilter) -> Result<()> {
    let colors = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                colors.color(record.level()),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()?;

    Ok(())
}

/// エラーの原因にOSのエラーコードがあればそれを、なければ1を返す。
fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<io::Error>())
        .and_then(io::Error::raw_os_error)
        .unwrap_or(1)
}
