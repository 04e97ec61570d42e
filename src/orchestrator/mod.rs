//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量调度和结果聚合，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 批量评测处理器
//! - 管理应用生命周期（初始化、运行、统计）
//! - 扁平化分组数据集（Vec<(group_key, QaRecord)>）
//! - 控制并发数量（Semaphore）
//! - 在唯一的消费循环中聚合完成事件（mpsc）
//! - 输出全局统计信息
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 GroupedDataset)
//!     ↓
//! workflow::ScoreFlow (处理单条 QaRecord)
//!     ↓
//! services (能力层：text_metrics / judge)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：batch_processor 只管批量，单条评分交给 workflow
//! 2. **结果独占**：只有收集循环持有结果集合，避免共享可变状态
//! 3. **向下依赖**：编排层 → workflow → services
//! 4. **无业务逻辑**：只做调度和统计，不做具体评分判断

pub mod batch_processor;

// 重新导出主要类型
pub use batch_processor::{run_batch, App};
