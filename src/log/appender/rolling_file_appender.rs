use crate::log::appender::file_appender::open_append;
use crate::log::appender::LogAppender;
use anyhow::{anyhow, Result};
use chrono::{Local, NaiveDateTime, Utc};
use smart_default::SmartDefault;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// 备份文件名中的时间格式：2024-01-15T10-30-00.000
const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const BACKUP_TIME_LEN: usize = 23;

pub const MEGABYTE: u64 = 1024 * 1024;

/// RollingFileAppender 配置
#[derive(Debug, Clone, serde::Deserialize, SmartDefault, PartialEq)]
#[serde(default)]
pub struct RollingFileAppenderConfig {
    /// 当前日志文件路径
    #[default("app.log".to_string())]
    pub file_path: String,

    /// 单个文件最大大小（字节）
    #[default(100 * MEGABYTE)]
    pub max_size: u64,

    /// 保留的最大备份数量，0 表示不按数量清理
    #[default = 30]
    pub max_backups: usize,

    /// 备份最长保留天数，0 表示不按时间清理
    #[default = 1]
    pub max_age_days: u64,

    /// 备份文件名使用本地时间，否则使用 UTC
    #[default = true]
    pub local_time: bool,

    /// 是否压缩备份文件
    #[default = false]
    pub compress: bool,
}

/// 当前文件信息
struct CurrentFile {
    file: File,
    size: u64,
}

/// 备份文件信息
#[derive(Debug)]
struct Backup {
    path: PathBuf,
    timestamp: NaiveDateTime,
    sequence: usize,
    compressed: bool,
}

/// 滚动文件输出器
///
/// 写入前若当前文件将超过 `max_size`，把当前文件重命名为
/// `<文件名>-<时间><扩展名>` 并重新打开，随后按数量和时间清理备份。
pub struct RollingFileAppender {
    config: RollingFileAppenderConfig,
    current: Mutex<CurrentFile>,
    cleanup: Mutex<()>,
    path: PathBuf,
    base_path: PathBuf,
    file_stem: String,
    extension: String,
}

impl RollingFileAppender {
    /// 打开日志文件，父目录不存在时创建
    pub fn open(config: RollingFileAppenderConfig) -> Result<Self> {
        let path = PathBuf::from(&config.file_path);
        let base_path = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&base_path)?;

        let file_stem = path
            .file_stem()
            .ok_or_else(|| anyhow!("invalid log file path: {}", config.file_path))?
            .to_string_lossy()
            .to_string();
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let file = open_append(&path)?;
        let size = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            config,
            current: Mutex::new(CurrentFile { file, size }),
            cleanup: Mutex::new(()),
            path,
            base_path,
            file_stem,
            extension,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &RollingFileAppenderConfig {
        &self.config
    }

    fn now(&self) -> NaiveDateTime {
        if self.config.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }

    /// 生成备份文件路径，同一毫秒内多次切分时追加序号
    fn backup_path(&self, timestamp: NaiveDateTime) -> PathBuf {
        let time = timestamp.format(BACKUP_TIME_FORMAT).to_string();
        let mut sequence = 0;
        loop {
            let filename = if sequence == 0 {
                format!("{}-{}{}", self.file_stem, time, self.extension)
            } else {
                format!("{}-{}-{}{}", self.file_stem, time, sequence, self.extension)
            };
            let path = self.base_path.join(&filename);
            let compressed = self.base_path.join(format!("{}.gz", filename));
            if !path.exists() && !compressed.exists() {
                return path;
            }
            sequence += 1;
        }
    }

    /// 执行切分
    fn rotate(&self, current: &mut CurrentFile) -> Result<()> {
        current.file.flush()?;

        let backup = self.backup_path(self.now());
        fs::rename(&self.path, &backup)?;

        current.file = open_append(&self.path)?;
        current.size = 0;
        Ok(())
    }

    /// 从文件名解析备份信息
    fn parse_backup(&self, path: &Path) -> Option<Backup> {
        let filename = path.file_name()?.to_str()?;
        let rest = filename.strip_prefix(&self.file_stem)?.strip_prefix('-')?;
        let (rest, compressed) = match rest.strip_suffix(".gz") {
            Some(rest) => (rest, true),
            None => (rest, false),
        };
        let rest = rest.strip_suffix(self.extension.as_str())?;

        let time = rest.get(..BACKUP_TIME_LEN)?;
        let timestamp = NaiveDateTime::parse_from_str(time, BACKUP_TIME_FORMAT).ok()?;
        let sequence = match &rest[BACKUP_TIME_LEN..] {
            "" => 0,
            suffix => suffix.strip_prefix('-')?.parse().ok()?,
        };

        Some(Backup {
            path: path.to_path_buf(),
            timestamp,
            sequence,
            compressed,
        })
    }

    /// 查找所有备份文件，最新的在前
    fn find_backups(&self) -> Result<Vec<Backup>> {
        let mut backups = Vec::new();
        for entry in fs::read_dir(&self.base_path)? {
            let path = entry?.path();
            if let Some(backup) = self.parse_backup(&path) {
                backups.push(backup);
            }
        }
        backups.sort_by(|a, b| (b.timestamp, b.sequence).cmp(&(a.timestamp, a.sequence)));
        Ok(backups)
    }

    /// 清理旧文件，并按需压缩剩余备份
    fn cleanup_old_files(&self) -> Result<()> {
        let _guard = self
            .cleanup
            .lock()
            .map_err(|_| anyhow!("log cleanup lock poisoned"))?;

        let backups = self.find_backups()?;
        let cutoff = (self.config.max_age_days > 0)
            .then(|| self.now() - chrono::Duration::days(self.config.max_age_days as i64));

        let mut remaining = Vec::new();
        for (index, backup) in backups.into_iter().enumerate() {
            let over_count = self.config.max_backups > 0 && index >= self.config.max_backups;
            let too_old = cutoff.is_some_and(|cutoff| backup.timestamp < cutoff);
            if over_count || too_old {
                fs::remove_file(&backup.path).ok();
            } else {
                remaining.push(backup);
            }
        }

        if self.config.compress {
            for backup in remaining.iter().filter(|backup| !backup.compressed) {
                compress_file(&backup.path)?;
            }
        }

        Ok(())
    }
}

/// 压缩文件
fn compress_file(path: &Path) -> Result<()> {
    let compressed_path = PathBuf::from(format!("{}.gz", path.display()));

    let content = fs::read(path)?;

    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&content)?;
    let compressed = encoder.finish()?;

    fs::write(&compressed_path, compressed)?;
    fs::remove_file(path)?;

    Ok(())
}

impl LogAppender for RollingFileAppender {
    fn append(&self, line: &[u8]) -> Result<()> {
        let line_size = line.len() as u64;

        let rotated = {
            let mut current = self
                .current
                .lock()
                .map_err(|_| anyhow!("log file lock poisoned: {}", self.config.file_path))?;

            // 空文件上写入超长的行时不切分
            let rotate = current.size > 0 && current.size + line_size > self.config.max_size;
            if rotate {
                self.rotate(&mut current)?;
            }

            current.file.write_all(line)?;
            current.size += line_size;
            rotate
        };

        if rotated {
            self.cleanup_old_files()?;
        }

        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut current = self
            .current
            .lock()
            .map_err(|_| anyhow!("log file lock poisoned: {}", self.config.file_path))?;
        current.file.flush()?;
        Ok(())
    }
}
