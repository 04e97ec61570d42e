//! 批量评测处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责批量评测的调度和结果聚合。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：创建评分流程（ScoreFlow）
//! 2. **数据集加载**：读取分组数据集（分组键 → Vec<QaRecord>）
//! 3. **扁平化**：把分组结构摊平成 (group_key, QaRecord) 工作列表
//! 4. **并发控制**：使用 Semaphore 限制同时评测的记录数量
//! 5. **结果聚合**：按完成顺序把存活结果按原分组键重新聚合
//! 6. **全局统计**：汇总评分/排除数量
//!
//! ## 设计特点
//!
//! - **顶层编排**：不处理单条记录的评分细节
//! - **消息传递**：worker 把完成事件发到 mpsc 通道，
//!   唯一的消费循环独占结果集合，完全不需要锁
//! - **快速失败**：任何一条记录评分失败，整个批次失败，
//!   不写出任何结果文件
//! - **向下委托**：委托 workflow::ScoreFlow 评分单条记录

use crate::config::Config;
use crate::models::record::{EvaluationResults, GroupedDataset, QaRecord};
use crate::models::{load_dataset, save_results};
use crate::utils::logging;
use crate::workflow::{RecordCtx, ScoreFlow, ScoreOutcome};
use anyhow::{Context, Result};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::warn;

/// 应用主结构
pub struct App {
    config: Config,
    flow: Arc<ScoreFlow>,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Self {
        logging::log_startup(config.max_workers);

        let flow = Arc::new(ScoreFlow::new(&config));

        Self { config, flow }
    }

    /// 使用自定义评分流程初始化（测试注入用）
    pub fn with_flow(config: Config, flow: Arc<ScoreFlow>) -> Self {
        Self { config, flow }
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        // 加载数据集
        let dataset = load_dataset(&self.config.input_file).await?;
        let total: usize = dataset.values().map(|v| v.len()).sum();

        if total == 0 {
            warn!("⚠️ 输入数据集为空，将写出空结果");
        }

        logging::log_dataset_loaded(dataset.len(), total);

        // 并发评测所有记录
        let results = run_batch(self.flow.clone(), dataset, self.config.max_workers).await?;

        // 结果落盘
        save_results(&results, &self.config.output_file).await?;

        // 输出最终统计
        let scored: usize = results.values().map(|v| v.len()).sum();
        logging::print_final_stats(scored, total - scored, total, &self.config.output_file);

        Ok(())
    }
}

/// 并发评测整个数据集
///
/// # 参数
/// - `flow`: 单条记录的评分流程
/// - `dataset`: 分组数据集
/// - `max_workers`: 同时评测的记录数上限
///
/// # 返回
/// 分组键 → 存活结果列表；组内顺序为完成顺序。
/// 整组都被排除的分组键不会出现在返回值里。
pub async fn run_batch(
    flow: Arc<ScoreFlow>,
    dataset: GroupedDataset,
    max_workers: usize,
) -> Result<EvaluationResults> {
    // ========== 步骤 1: 扁平化 ==========
    let work_items: Vec<(String, QaRecord)> = dataset
        .into_iter()
        .flat_map(|(key, records)| records.into_iter().map(move |r| (key.clone(), r)))
        .collect();

    let total = work_items.len();
    let semaphore = Arc::new(Semaphore::new(max_workers));
    let (tx, mut rx) = mpsc::unbounded_channel();

    // ========== 步骤 2: 派发 ==========
    let mut handles = Vec::new();

    for (index, (group_key, record)) in work_items.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        let flow = flow.clone();
        let tx = tx.clone();

        let handle = tokio::spawn(async move {
            // 许可在任务内部获取，同时执行的单元数不超过 max_workers
            let _permit = semaphore.acquire_owned().await.context("信号量已关闭")?;

            let ctx = RecordCtx::new(group_key.clone(), index + 1, total);
            let outcome = flow.run(&record, &ctx).await;

            // 消费端提前退出（快速失败）后发送失败是正常情况
            let _ = tx.send((group_key, outcome));

            Ok::<(), anyhow::Error>(())
        });
        handles.push(handle);
    }
    drop(tx);

    // ========== 步骤 3: 收集 ==========
    // 唯一的消费循环独占结果集合，按完成顺序处理，无需加锁
    let mut results = EvaluationResults::new();
    let mut done = 0usize;

    while let Some((group_key, outcome)) = rx.recv().await {
        done += 1;

        // 第一个失败让整个批次失败，不保留部分结果
        match outcome? {
            ScoreOutcome::Scored(bundle) => {
                results.entry(group_key).or_default().push(bundle);
            }
            ScoreOutcome::Excluded => {}
        }

        logging::log_progress(done, total);
    }

    // ========== 步骤 4: 回收任务 ==========
    for join_result in join_all(handles).await {
        join_result.context("评测任务异常退出")??;
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::Judge;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// 固定分数的假评委
    struct StaticJudge;

    #[async_trait]
    impl Judge for StaticJudge {
        async fn evaluate(&self, _q: &str, _r: &str, _p: &str) -> Result<f64> {
            Ok(1.0)
        }
    }

    /// 统计并发进入数量的假评委
    struct ConcurrencyProbeJudge {
        current: AtomicUsize,
        max_seen: AtomicUsize,
    }

    impl ConcurrencyProbeJudge {
        fn new() -> Self {
            Self {
                current: AtomicUsize::new(0),
                max_seen: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Judge for ConcurrencyProbeJudge {
        async fn evaluate(&self, _q: &str, _r: &str, _p: &str) -> Result<f64> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_seen.fetch_max(now, Ordering::SeqCst);

            tokio::time::sleep(Duration::from_millis(20)).await;

            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(0.5)
        }
    }

    /// 第 n 次调用失败的假评委
    struct FailOnNthJudge {
        calls: AtomicUsize,
        fail_on: usize,
    }

    #[async_trait]
    impl Judge for FailOnNthJudge {
        async fn evaluate(&self, _q: &str, _r: &str, _p: &str) -> Result<f64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                anyhow::bail!("评委服务在第 {} 次调用时失败", call)
            }
            Ok(1.0)
        }
    }

    fn record(question: &str, answer: &str, response: &str, category: &str) -> QaRecord {
        QaRecord {
            question: question.to_string(),
            answer: answer.to_string(),
            response: response.to_string(),
            category: category.to_string(),
        }
    }

    fn flow_with(judge: impl Judge + 'static) -> Arc<ScoreFlow> {
        Arc::new(ScoreFlow::with_judge(Arc::new(judge)))
    }

    #[tokio::test]
    async fn test_scenario_single_group_with_exclusion() {
        let mut dataset = GroupedDataset::new();
        dataset.insert(
            "g1".to_string(),
            vec![record("Q", "A", "A", "1"), record("Q2", "B", "C", "5")],
        );

        let results = run_batch(flow_with(StaticJudge), dataset, 2).await.unwrap();

        assert_eq!(results.len(), 1);
        let bundles = &results["g1"];
        assert_eq!(bundles.len(), 1, "category 5 的记录应该被排除");
        assert_eq!(bundles[0].question, "Q");
        assert_eq!(bundles[0].answer, "A");
        assert_eq!(bundles[0].response, "A");
    }

    #[tokio::test]
    async fn test_scenario_two_groups() {
        let mut dataset = GroupedDataset::new();
        dataset.insert("g1".to_string(), vec![record("Q1", "A", "A", "1")]);
        dataset.insert("g2".to_string(), vec![record("Q2", "B", "B", "2")]);

        let results = run_batch(flow_with(StaticJudge), dataset, 2).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results["g1"].len(), 1);
        assert_eq!(results["g2"].len(), 1);
    }

    #[tokio::test]
    async fn test_fully_excluded_group_absent() {
        let mut dataset = GroupedDataset::new();
        dataset.insert(
            "all_excluded".to_string(),
            vec![record("Q1", "A", "A", "5"), record("Q2", "B", "B", "5")],
        );
        dataset.insert("kept".to_string(), vec![record("Q3", "C", "C", "1")]);

        let results = run_batch(flow_with(StaticJudge), dataset, 4).await.unwrap();

        // 整组被排除的键不应该出现，连空数组都不应该有
        assert!(!results.contains_key("all_excluded"));
        assert_eq!(results.len(), 1);
        assert_eq!(results["kept"].len(), 1);
    }

    #[tokio::test]
    async fn test_completeness_every_record_once() {
        let mut dataset = GroupedDataset::new();
        for g in 0..3 {
            let records: Vec<QaRecord> = (0..5)
                .map(|i| record(&format!("Q{}-{}", g, i), "A", "A", "1"))
                .collect();
            dataset.insert(format!("g{}", g), records);
        }

        let results = run_batch(flow_with(StaticJudge), dataset, 4).await.unwrap();

        for g in 0..3 {
            let bundles = &results[&format!("g{}", g)];
            assert_eq!(bundles.len(), 5);

            let mut questions: Vec<&str> = bundles.iter().map(|b| b.question.as_str()).collect();
            questions.sort_unstable();
            let expected: Vec<String> = (0..5).map(|i| format!("Q{}-{}", g, i)).collect();
            assert_eq!(
                questions,
                expected.iter().map(|s| s.as_str()).collect::<Vec<_>>()
            );
        }
    }

    #[tokio::test]
    async fn test_idempotence_set_equality() {
        let build_dataset = || {
            let mut dataset = GroupedDataset::new();
            dataset.insert(
                "g1".to_string(),
                (0..8)
                    .map(|i| record(&format!("Q{}", i), "A", "A", "1"))
                    .collect(),
            );
            dataset
        };

        let first = run_batch(flow_with(StaticJudge), build_dataset(), 4)
            .await
            .unwrap();
        let second = run_batch(flow_with(StaticJudge), build_dataset(), 4)
            .await
            .unwrap();

        // 两次运行的组内顺序可能不同，但多重集必须相同
        let normalize = |results: &EvaluationResults| -> BTreeMap<String, Vec<String>> {
            results
                .iter()
                .map(|(k, v)| {
                    let mut questions: Vec<String> =
                        v.iter().map(|b| b.question.clone()).collect();
                    questions.sort_unstable();
                    (k.clone(), questions)
                })
                .collect()
        };

        assert_eq!(normalize(&first), normalize(&second));
    }

    #[tokio::test]
    async fn test_concurrency_bound_respected() {
        let judge = Arc::new(ConcurrencyProbeJudge::new());
        let flow = Arc::new(ScoreFlow::with_judge(judge.clone()));

        let mut dataset = GroupedDataset::new();
        dataset.insert(
            "g1".to_string(),
            (0..20)
                .map(|i| record(&format!("Q{}", i), "A", "A", "1"))
                .collect(),
        );

        let results = run_batch(flow, dataset, 5).await.unwrap();

        assert_eq!(results["g1"].len(), 20);
        let max_seen = judge.max_seen.load(Ordering::SeqCst);
        assert!(
            max_seen <= 5,
            "同时进入评委的数量 {} 超过并发上限 5",
            max_seen
        );
        assert!(
            max_seen >= 2,
            "评测应该真的并发执行，实际最大并发 {}",
            max_seen
        );
    }

    #[tokio::test]
    async fn test_fail_fast_on_judge_failure() {
        let flow = flow_with(FailOnNthJudge {
            calls: AtomicUsize::new(0),
            fail_on: 2,
        });

        let mut dataset = GroupedDataset::new();
        dataset.insert(
            "g1".to_string(),
            (0..6)
                .map(|i| record(&format!("Q{}", i), "A", "A", "1"))
                .collect(),
        );

        let result = run_batch(flow, dataset, 2).await;

        assert!(result.is_err(), "单条记录失败应该让整个批次失败");
    }

    #[tokio::test]
    async fn test_empty_dataset() {
        let results = run_batch(flow_with(StaticJudge), GroupedDataset::new(), 2)
            .await
            .unwrap();

        assert!(results.is_empty());
    }
}
