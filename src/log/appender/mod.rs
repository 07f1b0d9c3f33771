mod console_appender;
mod file_appender;
mod rolling_file_appender;
mod trait_;

pub use console_appender::{ConsoleAppender, ConsoleAppenderConfig, Target};
pub use file_appender::{FileAppender, FileAppenderConfig};
pub use rolling_file_appender::{RollingFileAppender, RollingFileAppenderConfig, MEGABYTE};
pub use trait_::LogAppender;
