use thiserror::Error;

/// 日志配置错误
#[derive(Error, Debug)]
pub enum LogError {
    #[error("invalid log level: {0}")]
    InvalidLevel(String),

    #[error("invalid logger config: {0}")]
    InvalidConfig(String),

    #[error("logger already installed: {0}")]
    AlreadyInstalled(#[from] ::log::SetLoggerError),
}

impl From<json5::Error> for LogError {
    fn from(err: json5::Error) -> Self {
        LogError::InvalidConfig(err.to_string())
    }
}
