//! 注册为 `log` crate 后端后的集成测试
//!
//! 全局后端每个进程只能注册一次，所以这里只有一个测试用例。

use anyhow::Result;
use hierlog::log::{
    install, HierarchyFormatter, HierarchyFormatterConfig, LogAppender, LogError, LogLevel, Logger,
    LoggerConfig,
};
use std::sync::{Arc, Mutex};

#[derive(Clone, Default)]
struct MemoryAppender(Arc<Mutex<Vec<u8>>>);

impl MemoryAppender {
    fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().unwrap().clone())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl LogAppender for MemoryAppender {
    fn append(&self, line: &[u8]) -> Result<()> {
        self.0.lock().unwrap().extend_from_slice(line);
        Ok(())
    }
}

#[test]
fn test_install_routes_log_macros() -> Result<()> {
    let appender = MemoryAppender::default();
    let formatter = HierarchyFormatter::new(HierarchyFormatterConfig {
        service_name: "svc".to_string(),
        colored: false,
    });
    install(Logger::with_parts(formatter, appender.clone(), LogLevel::Info))?;

    log::debug!("filtered");
    log::info!("bridged {}", 42);
    let line = line!() - 1;
    log::error!("failure");

    let lines = appender.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("[INFO] "));
    assert!(
        lines[0].ends_with(&format!(":{}: bridged 42", line)),
        "unexpected line: {}",
        lines[0]
    );

    // 函数名来自栈回溯，依赖调试信息
    #[cfg(debug_assertions)]
    assert!(
        lines[0].contains(" svc:log_bridge: :test_install_routes_log_macros:"),
        "unexpected line: {}",
        lines[0]
    );
    assert!(lines[1].starts_with("[ERROR] "));

    let second = install(Logger::new(LoggerConfig::default()));
    assert!(matches!(second, Err(LogError::AlreadyInstalled(_))));

    Ok(())
}
