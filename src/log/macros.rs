//! 日志宏模块
//!
//! 在调用点捕获所在函数的全限定路径和行号，附加到日志记录上。
//!
//! # 示例
//!
//! ```ignore
//! use hierlog::log::{Logger, LoggerConfig};
//!
//! let logger = Logger::new(LoggerConfig::default());
//!
//! hierlog::info!(logger, "application started");
//! hierlog::error!(logger, "connection failed: {}", err);
//! ```

/// 当前所在函数的全限定路径，例如 `app::db::MyDatabase::connect`
///
/// 在闭包或 async 块中使用时，路径会带有 `{{closure}}` 后缀，解析时会被去掉。
#[macro_export]
macro_rules! function_path {
    () => {{
        fn __caller_marker() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let name = __type_name_of(__caller_marker);
        name.strip_suffix("::__caller_marker").unwrap_or(name)
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log(
            $crate::log::LogRecord::new($level, ::std::format!($($arg)+))
                .with_caller($crate::log::CallerFrame::new($crate::function_path!(), ::std::line!()))
        )
    };
}

/// 记录 DEBUG 级别日志
///
/// ```ignore
/// debug!(logger, "processing request");
/// debug!(logger, "processing {} {}", method, endpoint);
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log!($logger, $crate::log::LogLevel::Debug, $($arg)+)
    };
}

/// 记录 INFO 级别日志
///
/// ```ignore
/// info!(logger, "user logged in");
/// info!(logger, "user {} logged in", user_id);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log!($logger, $crate::log::LogLevel::Info, $($arg)+)
    };
}

/// 记录 WARN 级别日志
///
/// ```ignore
/// warn!(logger, "high memory usage: {}MB", usage);
/// ```
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log!($logger, $crate::log::LogLevel::Warn, $($arg)+)
    };
}

/// 记录 ERROR 级别日志
///
/// ```ignore
/// error!(logger, "query failed: {}", err);
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::__log!($logger, $crate::log::LogLevel::Error, $($arg)+)
    };
}
