//! 单条记录评分流程 - 流程层
//!
//! 核心职责：定义"一条记录"的完整评分流程
//!
//! 流程顺序：
//! 1. 排除规则判断（命中直接跳过，不做任何评分）
//! 2. 本地指标计算（词汇重叠 + n-gram 精确率，同步）
//! 3. LLM 评委打分（唯一一次网络调用）
//! 4. 组装 ScoreBundle

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::models::record::{QaRecord, ScoreBundle};
use crate::services::{calculate_bleu_scores, calculate_metrics, Judge, JudgeService};
use crate::utils::logging::truncate_text;
use crate::workflow::record_ctx::RecordCtx;

/// 命中该类别的记录整条跳过，不评分也不进入输出
pub const EXCLUDED_CATEGORY: &str = "5";

/// 排除策略
///
/// 显式的谓词值，让"跳过哪些记录"可见、可测、可替换，
/// 不用改动协调器就能换规则。
pub type ExclusionPolicy = Arc<dyn Fn(&QaRecord) -> bool + Send + Sync>;

/// 默认排除策略：category 与 [`EXCLUDED_CATEGORY`] 精确匹配
pub fn category_exclusion_policy() -> ExclusionPolicy {
    Arc::new(|record: &QaRecord| record.category == EXCLUDED_CATEGORY)
}

/// 单条记录的评分结果
#[derive(Debug, Clone)]
pub enum ScoreOutcome {
    /// 评分成功
    Scored(ScoreBundle),
    /// 命中排除规则，整条丢弃
    Excluded,
}

/// 记录评分流程
///
/// - 编排单条记录的完整评分流程
/// - 决定何时过滤、何时计算指标、何时调用评委
/// - 不持有结果集合
/// - 只依赖业务能力（services）
pub struct ScoreFlow {
    judge: Arc<dyn Judge>,
    exclusion: ExclusionPolicy,
    verbose_logging: bool,
}

impl ScoreFlow {
    /// 创建新的评分流程
    pub fn new(config: &Config) -> Self {
        Self {
            judge: Arc::new(JudgeService::new(config)),
            exclusion: category_exclusion_policy(),
            verbose_logging: config.verbose_logging,
        }
    }

    /// 使用自定义评委创建流程（测试注入用）
    pub fn with_judge(judge: Arc<dyn Judge>) -> Self {
        Self {
            judge,
            exclusion: category_exclusion_policy(),
            verbose_logging: false,
        }
    }

    /// 替换排除策略
    pub fn exclusion_policy(mut self, policy: ExclusionPolicy) -> Self {
        self.exclusion = policy;
        self
    }

    /// 评分单条记录
    ///
    /// 任何一个协作者失败都会让这一条记录整体失败，
    /// 由调用方决定如何处置（批处理器会让整个批次失败）。
    pub async fn run(&self, record: &QaRecord, ctx: &RecordCtx) -> Result<ScoreOutcome> {
        // ========== 流程 1: 排除规则 ==========
        if (self.exclusion)(record) {
            info!(
                "{} 命中排除规则 (category={})，跳过",
                ctx, record.category
            );
            return Ok(ScoreOutcome::Excluded);
        }

        if self.verbose_logging {
            self.log_record(ctx, record);
        }

        // ========== 流程 2: 本地指标 ==========
        let lexical = calculate_metrics(&record.response, &record.answer)?;
        let bleu = calculate_bleu_scores(&record.response, &record.answer)?;

        // ========== 流程 3: LLM 评委 ==========
        let llm_score = self
            .judge
            .evaluate(&record.question, &record.answer, &record.response)
            .await?;

        // ========== 流程 4: 组装结果 ==========
        Ok(ScoreOutcome::Scored(ScoreBundle {
            question: record.question.clone(),
            answer: record.answer.clone(),
            response: record.response.clone(),
            category: record.category.clone(),
            bleu_score: bleu.bleu1,
            f1_score: lexical.f1,
            llm_score,
        }))
    }

    // ========== 日志辅助方法 ==========

    /// 显示记录预览
    fn log_record(&self, ctx: &RecordCtx, record: &QaRecord) {
        info!("{} 问题: {}", ctx, truncate_text(&record.question, 80));
    }
}
