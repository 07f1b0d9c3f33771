//! 日志模块
//!
//! 为每行日志渲染级别、时间戳、`服务:包:类型:函数:行号` 形式的调用者层级和消息，
//! 可选 ANSI 颜色；输出到终端、单个文件或按大小滚动的文件。
//!
//! # 快速开始
//!
//! ```rust,no_run
//! use hierlog::log::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config: LoggerConfig = r#"
//!         {
//!             service_name: "my_cool_app",
//!             mode: "console",
//!         }
//!     "#.parse()?;
//!
//!     let logger = Logger::new(config);
//!
//!     logger.info("App is booting up");
//!     hierlog::error!(logger, "connection error: {}", "timeout");
//!
//!     Ok(())
//! }
//! ```
//!
//! 输出：
//!
//! ```text
//! [INFO] 2024.01.15 10:30:00 my_cool_app:my_cool_app: :main:11: App is booting up
//! [ERROR] 2024.01.15 10:30:00 my_cool_app:my_cool_app: :main:12: connection error: timeout
//! ```

pub mod appender;
pub mod bridge;
pub mod caller;
pub mod error;
pub mod formatter;
pub mod level;
pub mod logger;
pub mod macros;
pub mod record;

// 重新导出核心类型
pub use appender::{
    ConsoleAppender, ConsoleAppenderConfig, FileAppender, FileAppenderConfig, LogAppender,
    RollingFileAppender, RollingFileAppenderConfig, Target,
};
pub use bridge::install;
pub use caller::{CallerFrame, CallerResolver, ResolvedCaller};
pub use error::LogError;
pub use formatter::{HierarchyFormatter, HierarchyFormatterConfig, LogFormatter};
pub use level::LogLevel;
pub use logger::{default_log_path, Destination, Logger, LoggerConfig, Mode};
pub use record::LogRecord;
