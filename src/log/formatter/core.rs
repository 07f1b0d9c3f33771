use crate::log::record::LogRecord;

/// 日志格式化器 trait
///
/// 负责将 LogRecord 格式化为一行完整的文本（包含结尾换行符）
pub trait LogFormatter: Send + Sync {
    /// 格式化日志记录
    fn format(&self, record: &LogRecord) -> String;
}
