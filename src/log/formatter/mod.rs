mod core;
mod hierarchy_formatter;

pub use core::LogFormatter;
pub use hierarchy_formatter::{
    level_color, level_label, HierarchyFormatter, HierarchyFormatterConfig, COLOR_RESET,
    TIMESTAMP_FORMAT,
};
