use crate::log::caller::{CallerResolver, ResolvedCaller};
use crate::log::formatter::LogFormatter;
use crate::log::level::LogLevel;
use crate::log::record::LogRecord;
use serde::Deserialize;
use smart_default::SmartDefault;
use std::fmt::Write;

/// 时间戳格式：2024.01.15 10:30:00
pub const TIMESTAMP_FORMAT: &str = "%Y.%m.%d %H:%M:%S";

/// 颜色重置序列
pub const COLOR_RESET: &str = "\x1b[0m";

/// HierarchyFormatter 配置
#[derive(Debug, Clone, Deserialize, SmartDefault, PartialEq)]
#[serde(default)]
pub struct HierarchyFormatterConfig {
    /// 服务名，作为层级字符串的第一段
    pub service_name: String,

    /// 是否启用颜色输出
    #[default = false]
    pub colored: bool,
}

/// 层级格式化器
///
/// 输出格式：
///
/// ```text
/// [INFO] 2024.01.15 10:30:00 svc:pkg:Type:func:42: message
/// ```
///
/// 启用颜色时，`[INFO]` 被级别颜色包裹，其余部分不变。
pub struct HierarchyFormatter {
    config: HierarchyFormatterConfig,
    resolver: CallerResolver,
}

impl HierarchyFormatter {
    pub fn new(config: HierarchyFormatterConfig) -> Self {
        Self::with_resolver(config, CallerResolver::default())
    }

    /// 使用自定义的调用者解析器
    pub fn with_resolver(config: HierarchyFormatterConfig, resolver: CallerResolver) -> Self {
        Self { config, resolver }
    }

    pub fn config(&self) -> &HierarchyFormatterConfig {
        &self.config
    }

    /// 使用已解析的调用者信息格式化
    pub fn format_resolved(&self, record: &LogRecord, caller: &ResolvedCaller) -> String {
        let label = level_label(record.level);
        let capacity = 48
            + self.config.service_name.len()
            + caller.package.len()
            + caller.type_name.len()
            + caller.function.len()
            + record.message.len();
        let mut result = String::with_capacity(capacity);

        if self.config.colored {
            result.push_str(level_color(record.level));
            result.push('[');
            result.push_str(label);
            result.push(']');
            result.push_str(COLOR_RESET);
        } else {
            result.push('[');
            result.push_str(label);
            result.push(']');
        }
        result.push(' ');

        let _ = write!(result, "{}", record.timestamp.format(TIMESTAMP_FORMAT));
        result.push(' ');

        // service:package:type:function:line
        let _ = write!(
            result,
            "{}:{}:{}:{}:{}",
            self.config.service_name, caller.package, caller.type_name, caller.function, caller.line
        );

        result.push_str(": ");
        result.push_str(&record.message);
        result.push('\n');
        result
    }
}

impl LogFormatter for HierarchyFormatter {
    fn format(&self, record: &LogRecord) -> String {
        let caller = self.resolver.resolve_record(record);
        self.format_resolved(record, &caller)
    }
}

/// 级别标签
///
/// Fatal 和 Panic 与 Error 共用 `ERROR`，Trace 与 Debug 共用 `DEBUG`。
pub fn level_label(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace | LogLevel::Debug => "DEBUG",
        LogLevel::Info => "INFO",
        LogLevel::Warn => "WARN",
        LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => "ERROR",
    }
}

/// 级别颜色
pub fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace | LogLevel::Debug => "\x1b[36m",                  // 青色
        LogLevel::Info => "\x1b[32m",                                     // 绿色
        LogLevel::Warn => "\x1b[33m",                                     // 黄色
        LogLevel::Error | LogLevel::Fatal | LogLevel::Panic => "\x1b[31m", // 红色
    }
}

crate::impl_from!(HierarchyFormatterConfig => HierarchyFormatter);
