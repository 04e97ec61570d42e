use anyhow::Result;
use clap::Parser;

use rag_eval::config::Config;
use rag_eval::orchestrator::App;
use rag_eval::utils::logging;

/// 批量评测 RAG 问答结果
#[derive(Parser, Debug)]
#[command(name = "rag_eval", about = "Evaluate RAG results")]
struct Args {
    /// 输入数据集文件路径
    #[arg(long = "input_file", default_value = "results/rag_results_500_k1.json")]
    input_file: String,

    /// 评测结果输出文件路径
    #[arg(long = "output_file", default_value = "evaluation_metrics.json")]
    output_file: String,

    /// 并发评测的最大 worker 数量
    #[arg(long = "max_workers", default_value_t = 10)]
    max_workers: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    let args = Args::parse();

    // 加载配置（LLM 凭据来自环境变量），命令行参数优先
    let mut config = Config::from_env();
    config.input_file = args.input_file;
    config.output_file = args.output_file;
    config.max_workers = args.max_workers;

    // 初始化并运行应用
    App::initialize(config).run().await?;

    Ok(())
}
