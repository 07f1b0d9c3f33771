//! 文件 Logger 使用示例
//!
//! 演示单文件输出、滚动文件输出，以及接入 `log` crate 的宏

use hierlog::log::*;
use hierlog::{error, info};

fn main() -> anyhow::Result<()> {
    println!("=== 文件 Logger 使用示例 ===\n");

    let temp_dir = std::env::temp_dir().join("hierlog_demo");

    // 1. 单文件模式，路径不存在的目录会被自动创建
    println!("1. 单文件模式:");
    let file_path = temp_dir.join("app.log");
    let logger = Logger::new(LoggerConfig {
        service_name: "file_demo".to_string(),
        mode: Mode::File,
        file_path: Some(file_path.to_string_lossy().to_string()),
        ..Default::default()
    });
    info!(logger, "written to {}", file_path.display());
    error!(logger, "file lines carry no color codes");
    logger.flush();
    print!("{}", std::fs::read_to_string(&file_path)?);

    // 2. 滚动模式，超过 100MB 时自动切分
    println!("\n2. 滚动模式:");
    let rolling_path = temp_dir.join("rolling.log");
    let logger = Logger::new(LoggerConfig {
        service_name: "file_demo".to_string(),
        mode: Mode::Rolling,
        file_path: Some(rolling_path.to_string_lossy().to_string()),
        ..Default::default()
    });
    println!("destination: {:?}", logger.destination());
    info!(logger, "rolling file logger ready");
    logger.flush();
    print!("{}", std::fs::read_to_string(&rolling_path)?);

    // 3. 安装为 log crate 的全局实现
    println!("\n3. 接入 log crate:");
    install(Logger::new(LoggerConfig {
        service_name: "file_demo".to_string(),
        ..Default::default()
    }))?;
    ::log::info!("hello from the log crate");
    ::log::warn!("warnings are routed as well");

    Ok(())
}
