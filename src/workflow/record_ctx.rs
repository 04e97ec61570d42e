//! 记录处理上下文
//!
//! 封装"我正在处理哪个分组的哪条记录"这一信息

use std::fmt::Display;

/// 记录处理上下文
///
/// 包含评测单条记录所需的所有上下文信息
#[derive(Debug, Clone)]
pub struct RecordCtx {
    /// 记录所属的分组键
    pub group_key: String,

    /// 记录在工作列表中的索引（从1开始，仅用于日志显示）
    pub record_index: usize,

    /// 工作列表总长度（仅用于日志显示）
    pub total_records: usize,
}

impl RecordCtx {
    /// 创建新的记录上下文
    pub fn new(group_key: String, record_index: usize, total_records: usize) -> Self {
        Self {
            group_key,
            record_index,
            total_records,
        }
    }
}

impl Display for RecordCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[组 {} 记录 {}/{}]",
            self.group_key, self.record_index, self.total_records
        )
    }
}
