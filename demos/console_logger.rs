//! 终端 Logger 使用示例
//!
//! 演示如何在启动时创建一次 Logger，然后在各处记录带调用者层级的日志

use hierlog::log::*;
// 宏定义在 crate root，需要单独导入
use hierlog::{debug, error, info, warn};

struct MyDatabase<'a> {
    logger: &'a Logger,
}

impl MyDatabase<'_> {
    fn connect(&self) {
        // 行首会显示 my_cool_app:console_logger:MyDatabase:connect:<行号>
        info!(self.logger, "started...");
        error!(self.logger, "connection error!");
    }
}

fn main() -> anyhow::Result<()> {
    println!("=== 终端 Logger 使用示例 ===\n");

    // 1. 启动时初始化一次
    let config: LoggerConfig = r#"
        {
            service_name: "my_cool_app",
            mode: "console",
            level: "debug",
        }
    "#
    .parse()?;
    let logger = Logger::new(config);

    // 2. 使用宏记录日志，调用点在编译期确定
    println!("1. 使用宏记录日志:");
    info!(logger, "App is booting up");
    debug!(logger, "loaded {} plugins", 3);
    warn!(logger, "cache is {}% full", 87);

    let db = MyDatabase { logger: &logger };
    db.connect();

    // 3. 直接调用方法，调用者通过回溯调用栈获得
    println!("\n2. 使用方法记录日志:");
    logger.info("shutting down");

    // 4. 调整级别
    println!("\n3. 调整日志级别为 warn:");
    logger.set_level(LogLevel::Warn);
    info!(logger, "this line is filtered");
    warn!(logger, "only warnings and errors from now on");

    Ok(())
}
