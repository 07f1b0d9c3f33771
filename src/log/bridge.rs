//! `log` crate 适配
//!
//! 把 [`Logger`] 注册为 `log` crate 的后端后，`log::info!` 等宏的输出也会经过
//! 层级格式化器。这类记录没有附带调用点，格式化时通过栈回溯定位调用者，
//! 行号缺失时使用 `log::Record` 上的行号。

use crate::log::error::LogError;
use crate::log::level::LogLevel;
use crate::log::logger::Logger;
use crate::log::record::LogRecord;

impl ::log::Log for Logger {
    fn enabled(&self, metadata: &::log::Metadata) -> bool {
        Logger::enabled(self, metadata.level().into())
    }

    fn log(&self, record: &::log::Record) {
        let level = LogLevel::from(record.level());
        if !Logger::enabled(self, level) {
            return;
        }
        Logger::log(
            self,
            LogRecord::new(level, record.args().to_string())
                .with_call_line(record.line().unwrap_or(0)),
        );
    }

    fn flush(&self) {
        Logger::flush(self)
    }
}

/// 与日志级别对应的 `log` crate 过滤级别
pub fn level_filter(level: LogLevel) -> ::log::LevelFilter {
    match level {
        LogLevel::Trace => ::log::LevelFilter::Trace,
        LogLevel::Debug => ::log::LevelFilter::Debug,
        LogLevel::Info => ::log::LevelFilter::Info,
        LogLevel::Warn => ::log::LevelFilter::Warn,
        LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => ::log::LevelFilter::Error,
    }
}

/// 把 Logger 注册为 `log` crate 的后端
///
/// 每个进程只能注册一次，重复注册返回 [`LogError::AlreadyInstalled`]。
pub fn install(logger: Logger) -> Result<(), LogError> {
    let filter = level_filter(logger.level());
    ::log::set_boxed_logger(Box::new(logger))?;
    ::log::set_max_level(filter);
    Ok(())
}
