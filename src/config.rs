/// 程序配置文件
#[derive(Clone, Debug)]
pub struct Config {
    /// 输入数据集文件路径
    pub input_file: String,
    /// 评测结果输出文件路径
    pub output_file: String,
    /// 并发评测的最大 worker 数量
    pub max_workers: usize,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 评委配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_file: "results/rag_results_500_k1.json".to_string(),
            output_file: "evaluation_metrics.json".to_string(),
            max_workers: 10,
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let default = Self::default();
        Self {
            input_file: std::env::var("INPUT_FILE").unwrap_or(default.input_file),
            output_file: std::env::var("OUTPUT_FILE").unwrap_or(default.output_file),
            max_workers: std::env::var("MAX_WORKERS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.max_workers),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        }
    }
}
