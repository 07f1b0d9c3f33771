//! 调用者解析
//!
//! 在日志调用发生时找到第一个属于业务代码的栈帧，并把它的全限定函数名拆分为
//! 包名、类型名、函数名和行号。
//!
//! 全限定函数名的规范形式为 `<导入路径>/<包名>.[<类型名>.]<函数名>`。Rust 的
//! `a::b::Type::method` 形式的路径会先被转换为规范形式再拆分。

use crate::log::record::LogRecord;

/// 无法解析时的包名、函数名占位符
pub const UNKNOWN: &str = "unknown";

/// 没有类型名时的占位符
pub const NO_TYPE: &str = " ";

/// 日志门面自身的模块名
pub const FACADE_MODULE: &str = "hierlog";

/// 底层日志引擎（`log` crate）的分发路径
pub const ENGINE_MODULE: &str = "log::__private_api";

/// 栈捕获函数自身占用的帧数
pub const SKIP_FRAMES: usize = 1;

/// 类型名两端需要去除的修饰字符（方法值、指针接收者）
const TYPE_DECORATIONS: &[char] = &['(', ')', '*'];

/// 一个栈帧：全限定函数名和行号
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerFrame {
    /// 全限定函数名
    pub function: String,
    /// 源码行号，没有调试信息时为 0
    pub line: u32,
}

impl CallerFrame {
    pub fn new(function: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            line,
        }
    }
}

/// 解析后的调用者信息
///
/// 所有字段要么来自同一个栈帧，要么全部是占位符。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCaller {
    pub package: String,
    pub type_name: String,
    pub function: String,
    pub line: u32,
}

impl Default for ResolvedCaller {
    fn default() -> Self {
        Self {
            package: UNKNOWN.to_string(),
            type_name: NO_TYPE.to_string(),
            function: UNKNOWN.to_string(),
            line: 0,
        }
    }
}

impl ResolvedCaller {
    /// 从单个栈帧解析
    pub fn from_frame(frame: &CallerFrame) -> Self {
        decompose(&frame.function, frame.line)
    }
}

/// 拆分全限定函数名
///
/// 只保留最后一个 `/` 之后的部分，再按 `.` 切分：
/// - 3 段：`包名.类型名.函数名`，类型名两端的 `(`、`)`、`*` 会被去掉
/// - 2 段：`包名.函数名`，类型名为 [`NO_TYPE`]
/// - 其他：全部使用占位符
///
/// 含有 `::` 的 Rust 路径会先经过 [`qualified_name`] 转换。
pub fn decompose(identifier: &str, line: u32) -> ResolvedCaller {
    let canonical;
    let identifier = if identifier.contains("::") {
        canonical = qualified_name(identifier);
        canonical.as_str()
    } else {
        identifier
    };

    let last = identifier.rsplit('/').next().unwrap_or(identifier);
    let parts: Vec<&str> = last.split('.').collect();

    match parts.as_slice() {
        [package, type_name, function] => ResolvedCaller {
            package: package.to_string(),
            type_name: type_name.trim_matches(TYPE_DECORATIONS).to_string(),
            function: function.to_string(),
            line,
        },
        [package, function] => ResolvedCaller {
            package: package.to_string(),
            type_name: NO_TYPE.to_string(),
            function: function.to_string(),
            line,
        },
        _ => ResolvedCaller::default(),
    }
}

/// 把 Rust 路径转换为规范形式
///
/// `app::net::Client::connect` => `app/net.Client.connect`，
/// `app::net::connect` => `app/net.connect`。
///
/// 最后一段是函数名；倒数第二段以大写字母开头时视为类型名，它前面的一段是包名；
/// 否则倒数第二段就是包名。闭包段、符号哈希和泛型参数会被去掉，
/// `<Type as Trait>` 会被替换为 `Type`。
pub fn qualified_name(path: &str) -> String {
    let mut segments: Vec<String> = path_segments(path)
        .into_iter()
        .filter(|segment| !segment.starts_with("{{") && !is_symbol_hash(segment))
        .filter(|segment| !segment.is_empty())
        .collect();

    let Some(function) = segments.pop() else {
        return String::new();
    };
    let Some(previous) = segments.pop() else {
        return function;
    };

    let starts_upper = previous.chars().next().is_some_and(|c| c.is_ascii_uppercase());
    let (package, type_name) = match segments.pop() {
        Some(package) if starts_upper => (package, Some(previous)),
        Some(parent) => {
            segments.push(parent);
            (previous, None)
        }
        None => (previous, None),
    };

    let mut name = String::with_capacity(path.len());
    for segment in &segments {
        name.push_str(segment);
        name.push('/');
    }
    name.push_str(&package);
    name.push('.');
    if let Some(type_name) = type_name {
        name.push_str(&type_name);
        name.push('.');
    }
    name.push_str(&function);
    name
}

/// 按尖括号外的 `::` 切分路径，展开 `<Type as Trait>`，去掉泛型参数
fn path_segments(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    for raw in split_top_level(path, "::") {
        let raw = raw.trim();
        if let Some(inner) = raw.strip_prefix('<').and_then(|s| s.strip_suffix('>')) {
            let self_type = match find_top_level(inner, " as ") {
                Some(index) => &inner[..index],
                None => inner,
            };
            segments.extend(path_segments(strip_type_modifiers(self_type)));
        } else {
            let end = raw.find('<').unwrap_or(raw.len());
            segments.push(raw[..end].to_string());
        }
    }
    segments
}

/// 去掉引用、裸指针和 `dyn` 前缀
fn strip_type_modifiers(ty: &str) -> &str {
    let mut ty = ty.trim().trim_start_matches(['&', '*']);
    for prefix in ["mut ", "const ", "dyn "] {
        if let Some(rest) = ty.strip_prefix(prefix) {
            ty = rest.trim_start();
        }
    }
    ty
}

fn split_top_level<'a>(s: &'a str, separator: &str) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut rest = s;
    while let Some(index) = find_top_level(rest, separator) {
        parts.push(&rest[..index]);
        rest = &rest[index + separator.len()..];
    }
    parts.push(rest);
    parts
}

/// 查找不在尖括号内的 `pattern`，`->` 中的 `>` 不计入嵌套
fn find_top_level(s: &str, pattern: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut index = 0;
    while index < bytes.len() {
        match bytes[index] {
            b'<' => depth += 1,
            b'>' if index > 0 && bytes[index - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[index..].starts_with(pattern.as_bytes()) => {
                return Some(index)
            }
            _ => {}
        }
        index += 1;
    }
    None
}

/// 符号哈希形如 `h0123456789abcdef`
fn is_symbol_hash(segment: &str) -> bool {
    segment.len() == 17
        && segment.starts_with('h')
        && segment[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// 调用者解析器
///
/// 跳过固定数量的最内层帧，然后返回第一个函数名不包含门面模块名和引擎模块名的帧。
/// 不缓存任何结果，同样的栈形状总是得到同样的结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerResolver {
    skip: usize,
    exclusions: [&'static str; 2],
}

impl Default for CallerResolver {
    fn default() -> Self {
        Self::new(SKIP_FRAMES, [FACADE_MODULE, ENGINE_MODULE])
    }
}

impl CallerResolver {
    pub fn new(skip: usize, exclusions: [&'static str; 2]) -> Self {
        Self { skip, exclusions }
    }

    fn is_excluded(&self, function: &str) -> bool {
        self.exclusions
            .iter()
            .any(|exclusion| function.contains(exclusion))
    }

    /// 在由内向外排列的栈帧中查找第一个业务代码帧
    pub fn find_frame<'a>(&self, frames: &'a [CallerFrame]) -> Option<&'a CallerFrame> {
        frames
            .iter()
            .skip(self.skip)
            .find(|frame| !self.is_excluded(&frame.function))
    }

    /// 解析栈帧，找不到时返回占位符
    pub fn resolve(&self, frames: &[CallerFrame]) -> ResolvedCaller {
        self.find_frame(frames)
            .map(ResolvedCaller::from_frame)
            .unwrap_or_default()
    }

    /// 捕获当前调用栈并解析
    pub fn resolve_current(&self) -> ResolvedCaller {
        self.resolve(&capture_stack())
    }

    /// 解析栈帧；找到的帧没有行号时使用 `fallback_line`
    ///
    /// 优化构建中内联和缺少调试信息都会让栈帧丢失行号，此时用调用点记录的行号补齐。
    pub fn resolve_with_line(
        &self,
        frames: &[CallerFrame],
        fallback_line: Option<u32>,
    ) -> ResolvedCaller {
        let Some(frame) = self.find_frame(frames) else {
            return ResolvedCaller::default();
        };

        let mut caller = ResolvedCaller::from_frame(frame);
        if caller.line == 0 && caller != ResolvedCaller::default() {
            caller.line = fallback_line.unwrap_or(0);
        }
        caller
    }

    /// 优先使用记录上附带的调用者信息，没有时回退到栈回溯
    pub fn resolve_record(&self, record: &LogRecord) -> ResolvedCaller {
        match &record.caller {
            Some(frame) => ResolvedCaller::from_frame(frame),
            None => self.resolve_with_line(&capture_stack(), record.call_line),
        }
    }
}

/// 捕获当前调用栈，由内向外排列
///
/// 回溯机制自身的帧已被去掉，第一帧是 `capture_stack` 本身。
/// 内联展开的函数各自占一帧；无法解析符号的帧被忽略。
pub fn capture_stack() -> Vec<CallerFrame> {
    let mut frames = Vec::new();
    backtrace::trace(|frame| {
        backtrace::resolve_frame(frame, |symbol| {
            if let Some(name) = symbol.name() {
                frames.push(CallerFrame::new(
                    format!("{:#}", name),
                    symbol.lineno().unwrap_or(0),
                ));
            }
        });
        true
    });
    drop_machinery_frames(frames)
}

/// 去掉最后一个回溯机制帧及其内侧的所有帧
fn drop_machinery_frames(mut frames: Vec<CallerFrame>) -> Vec<CallerFrame> {
    let start = frames
        .iter()
        .rposition(|frame| is_backtrace_machinery(&frame.function))
        .map_or(0, |index| index + 1);
    frames.split_off(start)
}

fn is_backtrace_machinery(function: &str) -> bool {
    function.starts_with("backtrace::")
        || function.starts_with("std::backtrace")
        || function.contains("backtrace_rs::")
}
