//! # RAG Eval
//!
//! 一个用于批量评测 RAG 问答结果的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 数据层（Models）
//! - `models/` - 定义评测数据结构和数据集读写
//! - `QaRecord` - 单条待评测记录（问题 / 标准答案 / 预测答案 / 类别）
//! - `ScoreBundle` - 单条记录的评分结果
//! - `loaders` - JSON 数据集加载与结果落盘
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单条记录
//! - `text_metrics` - 词汇重叠 F1 / n-gram 精确率能力
//! - `JudgeService` - LLM 评委打分能力（`Judge` trait 的默认实现）
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一条记录"的完整评分流程
//! - `RecordCtx` - 上下文封装（group_key + record_index）
//! - `ScoreFlow` - 流程编排（排除规则 → 本地指标 → LLM 评委 → 组装）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 批量评测处理器，管理并发和结果聚合
//!
//! ## 模块结构

pub mod config;
pub mod error;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    load_dataset, save_results, EvaluationResults, GroupedDataset, QaRecord, ScoreBundle,
};
pub use orchestrator::{run_batch, App};
pub use services::{Judge, JudgeService};
pub use workflow::{RecordCtx, ScoreFlow, ScoreOutcome};
