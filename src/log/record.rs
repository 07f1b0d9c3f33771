use chrono::{DateTime, Local};

use crate::log::caller::CallerFrame;
use crate::log::level::LogLevel;

/// 日志记录
///
/// 每次日志调用生成一条，构造完成后不再修改。
#[derive(Debug, Clone)]
pub struct LogRecord {
    /// 日志级别
    pub level: LogLevel,
    /// 时间戳
    pub timestamp: DateTime<Local>,
    /// 日志消息
    pub message: String,
    /// 调用点，None 时由格式化器回溯调用栈
    pub caller: Option<CallerFrame>,
    /// 调用点行号，回溯得到的栈帧没有行号时使用
    pub call_line: Option<u32>,
}

impl LogRecord {
    /// 创建新的日志记录，时间戳取当前时间
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            message: message.into(),
            caller: None,
            call_line: None,
        }
    }

    /// 设置调用点（全限定函数名和行号）
    pub fn with_caller(mut self, caller: CallerFrame) -> Self {
        self.caller = Some(caller);
        self
    }

    /// 设置调用点行号
    pub fn with_call_line(mut self, line: u32) -> Self {
        self.call_line = Some(line);
        self
    }

    /// 设置时间戳
    pub fn with_timestamp(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
