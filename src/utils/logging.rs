/// 日志工具模块
///
/// 提供 tracing 初始化和日志格式化输出的辅助函数
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化日志订阅器
///
/// 默认 info 级别，可通过 RUST_LOG 环境变量覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `max_workers`: 最大并发数
pub fn log_startup(max_workers: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 并发评测模式");
    info!("📊 最大并发数: {}", max_workers);
    info!("{}", "=".repeat(60));
}

/// 记录数据集加载信息
///
/// # 参数
/// - `groups`: 分组数量
/// - `total`: 记录总数
pub fn log_dataset_loaded(groups: usize, total: usize) {
    info!("✓ 找到 {} 个分组，共 {} 条待评测记录", groups, total);
    info!("💡 完成顺序即为组内结果顺序\n");
}

/// 记录评测进度
///
/// # 参数
/// - `done`: 已完成数量
/// - `total`: 总数
pub fn log_progress(done: usize, total: usize) {
    info!("⏳ 评测进度: {}/{}", done, total);
}

/// 打印最终统计信息
///
/// # 参数
/// - `scored`: 成功评分数量
/// - `excluded`: 被排除数量
/// - `total`: 总数
/// - `output_file`: 结果文件路径
pub fn print_final_stats(scored: usize, excluded: usize, total: usize, output_file: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部评测完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已评分: {}/{}", scored, total);
    info!("⏭️ 已排除: {}", excluded);
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", output_file);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
