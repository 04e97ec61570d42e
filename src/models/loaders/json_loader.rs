//! 数据集加载与结果落盘
//!
//! 输入文件是一个 JSON 对象：分组键 → QA 记录数组。
//! 输出文件同样是 JSON 对象：分组键 → 评分结果数组，4 空格缩进。

use crate::error::{AppError, FileError};
use crate::models::record::{EvaluationResults, GroupedDataset};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tokio::fs;

/// 从 JSON 文件加载分组数据集
///
/// 文件不存在或 JSON 非法都是启动期致命错误，不会进入评测阶段。
pub async fn load_dataset(input_file: &str) -> Result<GroupedDataset> {
    if !Path::new(input_file).exists() {
        return Err(AppError::File(FileError::NotFound {
            path: input_file.to_string(),
        })
        .into());
    }

    let content = fs::read_to_string(input_file)
        .await
        .with_context(|| format!("无法读取输入文件: {}", input_file))?;

    let dataset: GroupedDataset = serde_json::from_str(&content)
        .map_err(|e| AppError::File(FileError::JsonParseFailed {
            path: input_file.to_string(),
            source: Box::new(e),
        }))
        .with_context(|| format!("无法解析输入文件: {}", input_file))?;

    let total: usize = dataset.values().map(|v| v.len()).sum();
    tracing::info!("成功加载 {} 个分组，共 {} 条记录", dataset.len(), total);

    Ok(dataset)
}

/// 将评测结果写入 JSON 文件（4 空格缩进）
pub async fn save_results(results: &EvaluationResults, output_file: &str) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    results
        .serialize(&mut serializer)
        .context("序列化评测结果失败")?;

    fs::write(output_file, buf)
        .await
        .map_err(|e| AppError::File(FileError::WriteFailed {
            path: output_file.to_string(),
            source: Box::new(e),
        }))
        .with_context(|| format!("无法写入输出文件: {}", output_file))?;

    Ok(())
}
