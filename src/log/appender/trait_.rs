use anyhow::Result;

/// 日志输出器 trait
///
/// 负责将格式化后的日志行写入目标介质。实现需自行保证并发写入安全。
pub trait LogAppender: Send + Sync {
    /// 输出一行日志（已包含结尾换行符）
    fn append(&self, line: &[u8]) -> Result<()>;

    /// 刷新缓冲区（默认实现为空操作）
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}
