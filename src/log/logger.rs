use crate::log::{
    appender::{
        ConsoleAppender, ConsoleAppenderConfig, FileAppender, FileAppenderConfig, LogAppender,
        RollingFileAppender, RollingFileAppenderConfig,
    },
    caller::CallerFrame,
    error::LogError,
    formatter::{HierarchyFormatter, HierarchyFormatterConfig, LogFormatter},
    level::LogLevel,
    record::LogRecord,
};
use anyhow::Result;
use chrono::{DateTime, Local};
use serde::Deserialize;
use smart_default::SmartDefault;
use std::fmt::Display;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::atomic::{AtomicU8, Ordering};

/// 未指定文件路径时使用的日志目录
pub const DEFAULT_LOG_DIR: &str = "./logs";

/// 默认日志文件名的时间格式：2024-01-15_10-30-00
pub const DEFAULT_FILE_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// 滚动策略：备份最长保留天数
pub const ROTATION_MAX_AGE_DAYS: u64 = 1;
/// 滚动策略：最大备份数量
pub const ROTATION_MAX_BACKUPS: usize = 30;
/// 滚动策略：单个文件最大大小（MB）
pub const ROTATION_MAX_SIZE_MB: u64 = 100;

/// 输出模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, SmartDefault)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 输出到标准输出，启用颜色
    #[default]
    Console,
    /// 输出到单个文件
    File,
    /// 输出到按大小滚动的文件
    Rolling,
}

impl FromStr for Mode {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "console" => Ok(Mode::Console),
            "file" => Ok(Mode::File),
            "rolling" => Ok(Mode::Rolling),
            _ => Err(LogError::InvalidConfig(format!("unknown mode: {}", s))),
        }
    }
}

/// Logger 配置
#[derive(Debug, Clone, Deserialize, SmartDefault, PartialEq)]
#[serde(default)]
pub struct LoggerConfig {
    /// 服务名，作为每行层级字符串的第一段
    pub service_name: String,

    /// 输出模式
    pub mode: Mode,

    /// 日志文件路径，file/rolling 模式下为空时自动生成
    pub file_path: Option<String>,

    /// 日志级别
    #[default = "info"]
    pub level: String,
}

impl FromStr for LoggerConfig {
    type Err = LogError;

    /// 从 json5 文本解析
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(json5::from_str(s)?)
    }
}

/// 输出目标
///
/// 初始化时由 [`Mode`] 一次性决定，之后不再改变。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Console,
    SingleFile {
        path: PathBuf,
    },
    Rotating {
        path: PathBuf,
        max_age_days: u64,
        max_backups: usize,
        max_size_mb: u64,
    },
}

impl Destination {
    /// 根据配置选择输出目标，文件路径为空时以 `now` 生成默认路径
    pub fn from_config(config: &LoggerConfig, now: DateTime<Local>) -> Self {
        let path = || match config.file_path.as_deref() {
            Some(path) if !path.is_empty() => PathBuf::from(path),
            _ => default_log_path(now),
        };

        match config.mode {
            Mode::Console => Destination::Console,
            Mode::File => Destination::SingleFile { path: path() },
            Mode::Rolling => Destination::Rotating {
                path: path(),
                max_age_days: ROTATION_MAX_AGE_DAYS,
                max_backups: ROTATION_MAX_BACKUPS,
                max_size_mb: ROTATION_MAX_SIZE_MB,
            },
        }
    }

    /// 文件类目标的路径
    pub fn path(&self) -> Option<&Path> {
        match self {
            Destination::Console => None,
            Destination::SingleFile { path } | Destination::Rotating { path, .. } => Some(path),
        }
    }
}

/// 默认日志文件路径：`./logs/<YYYY-MM-DD_hh-mm-ss>.log`
pub fn default_log_path(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!(
        "{}/{}.log",
        DEFAULT_LOG_DIR,
        now.format(DEFAULT_FILE_TIME_FORMAT)
    ))
}

/// 核心日志器
///
/// 负责日志的级别控制、格式化和输出。由调用方持有，可同时存在多个独立配置的实例。
pub struct Logger {
    level: AtomicU8,
    formatter: Box<dyn LogFormatter>,
    appender: Box<dyn LogAppender>,
    destination: Option<Destination>,
    colored: bool,
}

impl Logger {
    /// 从配置创建 Logger
    ///
    /// 初始化过程中的问题（目录创建失败、文件打开失败）不会中断创建：
    /// 前者仅产生警告，后者回退到终端输出并关闭颜色。
    pub fn new(config: LoggerConfig) -> Self {
        let level = config.level.parse::<LogLevel>().unwrap_or(LogLevel::Info);
        let mut warnings = Vec::new();

        let destination = Destination::from_config(&config, Local::now());
        if let Some(dir) = destination.path().and_then(Path::parent) {
            if !dir.as_os_str().is_empty() {
                if let Err(err) = std::fs::create_dir_all(dir) {
                    warnings.push(format!(
                        "failed to create log directory '{}': {}",
                        dir.display(),
                        err
                    ));
                }
            }
        }

        let (destination, appender, colored) = match open_destination(destination) {
            Ok(opened) => opened,
            Err((destination, err)) => {
                let path = destination
                    .path()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default();
                warnings.push(format!(
                    "failed to open log file '{}', using console: {:#}",
                    path, err
                ));
                (Destination::Console, console_appender(), false)
            }
        };

        let formatter = HierarchyFormatter::new(HierarchyFormatterConfig {
            service_name: config.service_name,
            colored,
        });

        let logger = Self {
            level: AtomicU8::new(level as u8),
            formatter: Box::new(formatter),
            appender,
            destination: Some(destination),
            colored,
        };

        for warning in warnings {
            ::log::warn!("{}", warning);
            logger.log(
                LogRecord::new(LogLevel::Warn, warning)
                    .with_caller(CallerFrame::new(crate::function_path!(), line!())),
            );
        }

        logger
    }

    /// 使用自定义的格式化器和输出器创建 Logger
    pub fn with_parts(
        formatter: impl LogFormatter + 'static,
        appender: impl LogAppender + 'static,
        level: LogLevel,
    ) -> Self {
        Self {
            level: AtomicU8::new(level as u8),
            formatter: Box::new(formatter),
            appender: Box::new(appender),
            destination: None,
            colored: false,
        }
    }

    /// 初始化时选定的输出目标，自定义输出器时为 None
    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    /// 是否启用了颜色输出
    pub fn colored(&self) -> bool {
        self.colored
    }

    /// 设置日志级别
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level as u8, Ordering::Relaxed);
    }

    /// 获取当前日志级别
    pub fn level(&self) -> LogLevel {
        LogLevel::from_u8(self.level.load(Ordering::Relaxed)).unwrap_or(LogLevel::Info)
    }

    /// 该级别的日志是否会被输出
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.level()
    }

    /// 记录日志，返回写入错误
    ///
    /// 记录上没有调用点行号时，补上调用本方法的源码行号。
    #[track_caller]
    pub fn try_log(&self, record: LogRecord) -> Result<()> {
        if !self.enabled(record.level) {
            return Ok(());
        }

        let record = match record.call_line {
            Some(_) => record,
            None => record.with_call_line(Location::caller().line()),
        };

        let line = self.formatter.format(&record);
        self.appender.append(line.as_bytes())
    }

    /// 记录日志
    ///
    /// 写入失败时仅在标准错误上提示，不影响调用方。
    #[track_caller]
    pub fn log(&self, record: LogRecord) {
        if let Err(err) = self.try_log(record) {
            eprintln!("failed to write log: {:#}", err);
        }
    }

    /// 刷新输出器
    pub fn flush(&self) {
        if let Err(err) = self.appender.flush() {
            eprintln!("failed to flush log: {:#}", err);
        }
    }

    /// 记录 DEBUG 级别日志
    #[track_caller]
    pub fn debug(&self, message: impl Display) {
        self.log(LogRecord::new(LogLevel::Debug, message.to_string()))
    }

    /// 记录 INFO 级别日志
    #[track_caller]
    pub fn info(&self, message: impl Display) {
        self.log(LogRecord::new(LogLevel::Info, message.to_string()))
    }

    /// 记录 WARN 级别日志
    #[track_caller]
    pub fn warn(&self, message: impl Display) {
        self.log(LogRecord::new(LogLevel::Warn, message.to_string()))
    }

    /// 记录 ERROR 级别日志
    #[track_caller]
    pub fn error(&self, message: impl Display) {
        self.log(LogRecord::new(LogLevel::Error, message.to_string()))
    }
}

impl From<LoggerConfig> for Logger {
    fn from(config: LoggerConfig) -> Self {
        Logger::new(config)
    }
}

fn console_appender() -> Box<dyn LogAppender> {
    Box::new(ConsoleAppender::new(ConsoleAppenderConfig::default()))
}

/// 打开输出目标，返回 (目标, 输出器, 是否启用颜色)
fn open_destination(
    destination: Destination,
) -> std::result::Result<(Destination, Box<dyn LogAppender>, bool), (Destination, anyhow::Error)> {
    let appender: Box<dyn LogAppender> = match &destination {
        Destination::Console => return Ok((destination, console_appender(), true)),
        Destination::SingleFile { path } => {
            match FileAppender::open(FileAppenderConfig {
                file_path: path.to_string_lossy().to_string(),
            }) {
                Ok(appender) => Box::new(appender),
                Err(err) => return Err((destination, err)),
            }
        }
        Destination::Rotating {
            path,
            max_age_days,
            max_backups,
            max_size_mb,
        } => {
            match RollingFileAppender::open(RollingFileAppenderConfig {
                file_path: path.to_string_lossy().to_string(),
                max_size: max_size_mb * crate::log::appender::MEGABYTE,
                max_backups: *max_backups,
                max_age_days: *max_age_days,
                local_time: true,
                compress: false,
            }) {
                Ok(appender) => Box::new(appender),
                Err(err) => return Err((destination, err)),
            }
        }
    };
    Ok((destination, appender, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    /// 把输出收集到内存中的测试输出器
    #[derive(Clone, Default)]
    struct MemoryAppender(Arc<Mutex<Vec<u8>>>);

    impl MemoryAppender {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl LogAppender for MemoryAppender {
        fn append(&self, line: &[u8]) -> Result<()> {
            self.0.lock().unwrap().extend_from_slice(line);
            Ok(())
        }
    }

    fn memory_logger(level: LogLevel) -> (Logger, MemoryAppender) {
        let appender = MemoryAppender::default();
        let formatter = HierarchyFormatter::new(HierarchyFormatterConfig {
            service_name: "svc".to_string(),
            colored: false,
        });
        (Logger::with_parts(formatter, appender.clone(), level), appender)
    }

    #[test]
    fn test_logger_config_default() {
        let config = LoggerConfig::default();
        assert_eq!(config.service_name, "");
        assert_eq!(config.mode, Mode::Console);
        assert_eq!(config.file_path, None);
        assert_eq!(config.level, "info");
    }

    #[test]
    fn test_logger_config_from_str() -> Result<()> {
        let config: LoggerConfig = r#"
            {
                service_name: "my_cool_app",
                mode: "rolling",
                file_path: "/var/log/app.log",
                level: "debug",
            }
        "#
        .parse()?;

        assert_eq!(config.service_name, "my_cool_app");
        assert_eq!(config.mode, Mode::Rolling);
        assert_eq!(config.file_path.as_deref(), Some("/var/log/app.log"));
        assert_eq!(config.level, "debug");
        Ok(())
    }

    #[test]
    fn test_logger_config_invalid_mode() {
        let result = r#"{ mode: "syslog" }"#.parse::<LoggerConfig>();
        assert!(matches!(result, Err(LogError::InvalidConfig(_))));
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("console".parse::<Mode>().unwrap(), Mode::Console);
        assert_eq!("FILE".parse::<Mode>().unwrap(), Mode::File);
        assert_eq!("rolling".parse::<Mode>().unwrap(), Mode::Rolling);
        assert!("syslog".parse::<Mode>().is_err());
    }

    #[test]
    fn test_default_log_path() {
        let now = Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
        assert_eq!(
            default_log_path(now),
            PathBuf::from("./logs/2024-01-15_10-30-00.log")
        );
    }

    #[test]
    fn test_destination_from_config() {
        let now = Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();

        let console = LoggerConfig::default();
        assert_eq!(Destination::from_config(&console, now), Destination::Console);

        let file = LoggerConfig {
            mode: Mode::File,
            file_path: Some("/tmp/app.log".to_string()),
            ..Default::default()
        };
        assert_eq!(
            Destination::from_config(&file, now),
            Destination::SingleFile {
                path: PathBuf::from("/tmp/app.log")
            }
        );

        let rolling = LoggerConfig {
            mode: Mode::Rolling,
            file_path: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(
            Destination::from_config(&rolling, now),
            Destination::Rotating {
                path: PathBuf::from("./logs/2024-01-15_10-30-00.log"),
                max_age_days: 1,
                max_backups: 30,
                max_size_mb: 100,
            }
        );
    }

    #[test]
    fn test_console_logger_is_colored() {
        let logger = Logger::new(LoggerConfig::default());
        assert_eq!(logger.destination(), Some(&Destination::Console));
        assert!(logger.colored());
        assert_eq!(logger.level(), LogLevel::Info);
    }

    #[test]
    fn test_file_logger_writes_plain_lines() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let log_path = temp_dir.path().join("nested").join("app.log");

        let logger = Logger::new(LoggerConfig {
            service_name: "svc".to_string(),
            mode: Mode::File,
            file_path: Some(log_path.to_string_lossy().to_string()),
            ..Default::default()
        });
        assert!(!logger.colored());
        assert_eq!(
            logger.destination(),
            Some(&Destination::SingleFile {
                path: log_path.clone()
            })
        );

        logger.try_log(
            LogRecord::new(LogLevel::Info, "hi")
                .with_timestamp(Local.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap())
                .with_caller(CallerFrame::new("github.com/acme/pkgA.Func", 7)),
        )?;
        logger.flush();

        let contents = std::fs::read_to_string(&log_path)?;
        assert_eq!(contents, "[INFO] 2024.01.15 10:30:00 svc:pkgA: :Func:7: hi\n");
        Ok(())
    }

    #[test]
    fn test_file_logger_falls_back_to_console() -> Result<()> {
        // 父路径是普通文件，目录创建和文件打开都会失败
        let blocker = tempfile::NamedTempFile::new()?;
        let log_path = blocker.path().join("app.log");

        let logger = Logger::new(LoggerConfig {
            mode: Mode::File,
            file_path: Some(log_path.to_string_lossy().to_string()),
            ..Default::default()
        });

        assert_eq!(logger.destination(), Some(&Destination::Console));
        assert!(!logger.colored());
        Ok(())
    }

    #[test]
    fn test_rolling_logger() -> Result<()> {
        let temp_dir = tempfile::TempDir::new()?;
        let log_path = temp_dir.path().join("app.log");

        let logger = Logger::new(LoggerConfig {
            mode: Mode::Rolling,
            file_path: Some(log_path.to_string_lossy().to_string()),
            level: "debug".to_string(),
            ..Default::default()
        });
        assert!(!logger.colored());
        assert!(matches!(
            logger.destination(),
            Some(Destination::Rotating { max_backups: 30, .. })
        ));

        logger.debug("rolling");
        logger.flush();

        let contents = std::fs::read_to_string(&log_path)?;
        assert!(contents.starts_with("[DEBUG] "));
        assert!(contents.ends_with(": rolling\n"));
        Ok(())
    }

    #[test]
    fn test_logger_level_filtering() {
        let (logger, appender) = memory_logger(LogLevel::Info);

        logger.debug("debug msg");
        assert_eq!(appender.contents(), "");

        logger.info("info msg");
        assert!(appender.contents().ends_with(": info msg\n"));
    }

    #[test]
    fn test_logger_set_level() {
        let (logger, appender) = memory_logger(LogLevel::Info);

        logger.set_level(LogLevel::Debug);
        assert_eq!(logger.level(), LogLevel::Debug);

        logger.debug("now visible");
        assert!(appender.contents().starts_with("[DEBUG] "));
    }

    #[test]
    fn test_logger_entry_points() {
        let (logger, appender) = memory_logger(LogLevel::Debug);

        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error(format_args!("e{}", 1));

        let contents = appender.contents();
        let labels: Vec<&str> = contents
            .lines()
            .map(|line| line.split(' ').next().unwrap())
            .collect();
        assert_eq!(labels, vec!["[DEBUG]", "[INFO]", "[WARN]", "[ERROR]"]);
        assert!(contents.lines().last().unwrap().ends_with(": e1"));
    }

    #[test]
    fn test_logger_invalid_level_defaults_to_info() {
        let logger = Logger::new(LoggerConfig {
            level: "verbose".to_string(),
            ..Default::default()
        });
        assert_eq!(logger.level(), LogLevel::Info);
    }

    /// 记下每条记录的调用点行号
    #[derive(Clone, Default)]
    struct LineRecorder(Arc<Mutex<Vec<Option<u32>>>>);

    impl LogFormatter for LineRecorder {
        fn format(&self, record: &LogRecord) -> String {
            self.0.lock().unwrap().push(record.call_line);
            String::new()
        }
    }

    #[test]
    fn test_entry_points_record_call_line() {
        let recorder = LineRecorder::default();
        let logger = Logger::with_parts(
            recorder.clone(),
            MemoryAppender::default(),
            LogLevel::Debug,
        );

        let first = line!() + 1;
        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");
        logger.log(LogRecord::new(LogLevel::Info, "record"));
        logger.try_log(LogRecord::new(LogLevel::Info, "try")).unwrap();
        logger.log(LogRecord::new(LogLevel::Info, "explicit").with_call_line(5));
        logger.set_level(LogLevel::Info);
        logger.debug("filtered");

        let expected: Vec<Option<u32>> = (0..6)
            .map(|offset| Some(first + offset))
            .chain([Some(5)])
            .collect();
        assert_eq!(*recorder.0.lock().unwrap(), expected);
    }

    #[test]
    fn test_logger_method_reports_call_line() {
        let (logger, appender) = memory_logger(LogLevel::Info);

        logger.info("walked");
        let line = line!() - 1;

        let contents = appender.contents();
        assert!(
            contents.ends_with(&format!(":{}: walked\n", line)),
            "unexpected line: {}",
            contents
        );
    }

    #[test]
    fn test_logger_concurrent_writes() {
        let (logger, appender) = memory_logger(LogLevel::Info);
        let logger = Arc::new(logger);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let logger = Arc::clone(&logger);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        logger.log(
                            LogRecord::new(LogLevel::Info, format!("thread {} line {}", t, i))
                                .with_caller(CallerFrame::new("app::worker::run", 1)),
                        );
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = appender.contents();
        assert_eq!(contents.lines().count(), 200);
        assert!(contents
            .lines()
            .all(|line| line.contains(" svc:worker: :run:1: thread ")));
    }

    #[test]
    fn test_independent_loggers() {
        let (first, first_out) = memory_logger(LogLevel::Info);
        let (second, second_out) = memory_logger(LogLevel::Error);

        first.warn("first");
        second.warn("second");

        assert!(first_out.contents().contains("first"));
        assert_eq!(second_out.contents(), "");
    }
}
