//! hierlog - 带调用者层级的日志门面
//!
//! 每行日志形如：
//!
//! ```text
//! [INFO] 2024.01.15 10:30:00 my_cool_app:db:MyDatabase:connect:15: started...
//! ```
//!
//! ## 模块
//!
//! - **log**: 日志模块（调用者解析、层级格式化、终端/文件/滚动文件输出）

mod macros;

pub mod log;

// 重新导出主要的公共 API
pub use crate::log::{
    CallerFrame, Destination, LogAppender, LogError, LogFormatter, LogLevel, LogRecord, Logger,
    LoggerConfig, Mode, ResolvedCaller,
};
